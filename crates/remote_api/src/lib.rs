//! Boundary of the remote editor process.
//!
//! Every method is one request/response round trip; implementations may fail
//! any call independently. Encoding and transport live behind this trait.

use async_trait::async_trait;
use serde_json::Value;
use shared::{
    domain::{BufferHandle, CursorPosition, GridSize, TabpageHandle, WindowHandle},
    error::RpcError,
};

pub type RpcResult<T> = Result<T, RpcError>;

/// Names of the remote calls, used in error reports and call logs.
pub mod calls {
    pub const GET_CURRENT_BUFFER: &str = "get-current-buffer-handle";
    pub const LIST_BUFFERS: &str = "list-buffer-handles";
    pub const GET_BUFFER_INFO: &str = "get-buffer-info";
    pub const GET_CURRENT_WINDOW: &str = "get-current-window-handle";
    pub const GET_WINDOW_BUFFER: &str = "get-window-buffer";
    pub const SET_CURRENT_WINDOW: &str = "set-current-window";
    pub const GET_CURRENT_TAB: &str = "get-current-tab-handle";
    pub const LIST_TABS: &str = "list-tab-handles";
    pub const GET_TAB_CURRENT_WINDOW: &str = "get-tab-current-window";
    pub const LIST_TAB_WINDOWS: &str = "list-tab-windows";
    pub const EXECUTE_COMMAND: &str = "execute-command";
    pub const EXECUTE_COMMAND_CAPTURING_OUTPUT: &str = "execute-command-capturing-output";
    pub const SET_WINDOW_CURSOR: &str = "set-window-cursor";
    pub const NOTIFY_FOCUS: &str = "notify-focus";
    pub const RESIZE_UI: &str = "resize-ui";
}

#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn get_current_buf(&self) -> RpcResult<BufferHandle>;
    async fn list_bufs(&self) -> RpcResult<Vec<BufferHandle>>;
    /// Raw info dictionary; expected to carry `filename`, `modified`,
    /// `buftype` and `buflisted`.
    async fn buf_get_info(&self, buffer: BufferHandle) -> RpcResult<Value>;

    async fn get_current_win(&self) -> RpcResult<WindowHandle>;
    async fn win_get_buf(&self, window: WindowHandle) -> RpcResult<BufferHandle>;
    async fn set_current_win(&self, window: WindowHandle) -> RpcResult<()>;

    async fn get_current_tabpage(&self) -> RpcResult<TabpageHandle>;
    async fn list_tabpages(&self) -> RpcResult<Vec<TabpageHandle>>;
    async fn tabpage_get_win(&self, tabpage: TabpageHandle) -> RpcResult<WindowHandle>;
    async fn tabpage_list_wins(&self, tabpage: TabpageHandle) -> RpcResult<Vec<WindowHandle>>;

    async fn command(&self, command: &str, expects_return_value: bool) -> RpcResult<()>;
    async fn command_output(&self, command: &str) -> RpcResult<String>;

    async fn win_set_cursor(&self, window: WindowHandle, position: CursorPosition)
        -> RpcResult<()>;

    async fn focus_gained(&self, gained: bool) -> RpcResult<()>;
    async fn resize_ui(&self, size: GridSize) -> RpcResult<()>;
}
