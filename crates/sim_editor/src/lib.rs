//! # Simulated Editor
//!
//! An in-process editor session implementing [`RemoteApi`], so the mirror
//! can be exercised without a real editor process:
//! - deterministic handle numbering
//! - every remote call is logged in issue order
//! - faults (failures or hangs) can be injected per call name
//! - optional per-call latency, to observe fan-out behaviour
//!
//! It understands only the ex commands the mirror itself issues.

mod ex;
mod state;

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use remote_api::{calls, RemoteApi, RpcResult};
use serde_json::Value;
use shared::{
    domain::{BufferHandle, CursorPosition, GridSize, TabpageHandle, WindowHandle},
    error::{RpcError, RpcErrorCode},
};
use tracing::debug;

use state::EditorState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    GetCurrentBuf,
    ListBufs,
    BufGetInfo(BufferHandle),
    GetCurrentWin,
    WinGetBuf(WindowHandle),
    SetCurrentWin(WindowHandle),
    GetCurrentTabpage,
    ListTabpages,
    TabpageGetWin(TabpageHandle),
    TabpageListWins(TabpageHandle),
    Command {
        text: String,
        expects_return_value: bool,
    },
    CommandOutput(String),
    WinSetCursor(WindowHandle, CursorPosition),
    FocusGained(bool),
    ResizeUi(GridSize),
}

impl RemoteCall {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetCurrentBuf => calls::GET_CURRENT_BUFFER,
            Self::ListBufs => calls::LIST_BUFFERS,
            Self::BufGetInfo(_) => calls::GET_BUFFER_INFO,
            Self::GetCurrentWin => calls::GET_CURRENT_WINDOW,
            Self::WinGetBuf(_) => calls::GET_WINDOW_BUFFER,
            Self::SetCurrentWin(_) => calls::SET_CURRENT_WINDOW,
            Self::GetCurrentTabpage => calls::GET_CURRENT_TAB,
            Self::ListTabpages => calls::LIST_TABS,
            Self::TabpageGetWin(_) => calls::GET_TAB_CURRENT_WINDOW,
            Self::TabpageListWins(_) => calls::LIST_TAB_WINDOWS,
            Self::Command { .. } => calls::EXECUTE_COMMAND,
            Self::CommandOutput(_) => calls::EXECUTE_COMMAND_CAPTURING_OUTPUT,
            Self::WinSetCursor(..) => calls::SET_WINDOW_CURSOR,
            Self::FocusGained(_) => calls::NOTIFY_FOCUS,
            Self::ResizeUi(_) => calls::RESIZE_UI,
        }
    }

    /// True for calls that change the remote session.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::SetCurrentWin(_)
                | Self::Command { .. }
                | Self::CommandOutput(_)
                | Self::WinSetCursor(..)
                | Self::FocusGained(_)
                | Self::ResizeUi(_)
        )
    }
}

#[derive(Debug, Clone)]
pub enum Fault {
    Fail(RpcError),
    /// The call never completes.
    Hang,
}

struct Inner {
    state: EditorState,
    calls: Vec<RemoteCall>,
    faults: HashMap<&'static str, Fault>,
    stripped_fields: HashMap<BufferHandle, &'static str>,
}

pub struct SimulatedEditor {
    inner: Mutex<Inner>,
    latency: Option<Duration>,
}

impl Default for SimulatedEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedEditor {
    /// A fresh session: one tab, one window, one unnamed buffer.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: EditorState::new(),
                calls: Vec::new(),
                faults: HashMap::new(),
                stripped_fields: HashMap::new(),
            }),
            latency: None,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs an ex command directly, without logging it as a remote call.
    pub fn script(&self, line: &str) -> RpcResult<()> {
        ex::execute(&mut self.lock().state, line)
    }

    pub fn add_buffer(&self, name: &str, buftype: &str, listed: bool) -> BufferHandle {
        self.lock().state.create_buffer(name, buftype, listed)
    }

    pub fn set_modified(&self, buffer: BufferHandle, modified: bool) -> RpcResult<()> {
        self.lock().state.buffer_mut(buffer)?.modified = modified;
        Ok(())
    }

    pub fn inject_fault(&self, call: &'static str, fault: Fault) {
        self.lock().faults.insert(call, fault);
    }

    pub fn clear_faults(&self) {
        self.lock().faults.clear();
    }

    /// Drops `field` from the info dictionary reported for `buffer`.
    pub fn strip_info_field(&self, buffer: BufferHandle, field: &'static str) {
        self.lock().stripped_fields.insert(buffer, field);
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    pub fn mutations(&self) -> Vec<RemoteCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.is_mutation())
            .cloned()
            .collect()
    }

    pub fn commands(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                RemoteCall::Command { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn current_buffer(&self) -> RpcResult<BufferHandle> {
        self.lock().state.current_buffer()
    }

    pub fn current_window(&self) -> RpcResult<WindowHandle> {
        self.lock().state.current_window()
    }

    pub fn cursor(&self, window: WindowHandle) -> Option<CursorPosition> {
        self.lock().state.cursors.get(&window).copied()
    }

    pub fn written(&self) -> Vec<PathBuf> {
        self.lock().state.written.clone()
    }

    pub fn is_focused(&self) -> bool {
        self.lock().state.focused
    }

    pub fn grid_size(&self) -> Option<GridSize> {
        self.lock().state.grid
    }

    pub fn has_exited(&self) -> bool {
        self.lock().state.exited
    }

    /// Logs the call, then applies faults, latency and the exited check.
    async fn enter(&self, call: RemoteCall) -> RpcResult<()> {
        let name = call.name();
        let fault = {
            let mut inner = self.lock();
            debug!(call = name, "simulated remote call");
            inner.calls.push(call);
            inner.faults.get(name).cloned()
        };

        match fault {
            Some(Fault::Fail(err)) => return Err(err),
            Some(Fault::Hang) => futures::future::pending::<()>().await,
            None => {}
        }

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.lock().state.exited {
            return Err(RpcError::new(
                RpcErrorCode::Transport,
                "remote editor has exited",
            ));
        }
        Ok(())
    }

    async fn with_state<T>(
        &self,
        call: RemoteCall,
        f: impl FnOnce(&mut EditorState) -> RpcResult<T>,
    ) -> RpcResult<T> {
        self.enter(call).await?;
        f(&mut self.lock().state)
    }
}

#[async_trait]
impl RemoteApi for SimulatedEditor {
    async fn get_current_buf(&self) -> RpcResult<BufferHandle> {
        self.with_state(RemoteCall::GetCurrentBuf, |state| state.current_buffer())
            .await
    }

    async fn list_bufs(&self) -> RpcResult<Vec<BufferHandle>> {
        self.with_state(RemoteCall::ListBufs, |state| {
            Ok(state.buffers.iter().map(|buf| buf.handle).collect())
        })
        .await
    }

    async fn buf_get_info(&self, buffer: BufferHandle) -> RpcResult<Value> {
        self.enter(RemoteCall::BufGetInfo(buffer)).await?;
        let inner = self.lock();
        let mut info = inner.state.info(buffer)?;
        if let (Some(field), Some(map)) = (inner.stripped_fields.get(&buffer), info.as_object_mut())
        {
            map.remove(*field);
        }
        Ok(info)
    }

    async fn get_current_win(&self) -> RpcResult<WindowHandle> {
        self.with_state(RemoteCall::GetCurrentWin, |state| state.current_window())
            .await
    }

    async fn win_get_buf(&self, window: WindowHandle) -> RpcResult<BufferHandle> {
        self.with_state(RemoteCall::WinGetBuf(window), |state| {
            state.window_buffer(window)
        })
        .await
    }

    async fn set_current_win(&self, window: WindowHandle) -> RpcResult<()> {
        self.with_state(RemoteCall::SetCurrentWin(window), |state| {
            state.set_current_window(window)
        })
        .await
    }

    async fn get_current_tabpage(&self) -> RpcResult<TabpageHandle> {
        self.with_state(RemoteCall::GetCurrentTabpage, |state| Ok(state.current_tab))
            .await
    }

    async fn list_tabpages(&self) -> RpcResult<Vec<TabpageHandle>> {
        self.with_state(RemoteCall::ListTabpages, |state| {
            Ok(state.tabs.iter().map(|tab| tab.handle).collect())
        })
        .await
    }

    async fn tabpage_get_win(&self, tabpage: TabpageHandle) -> RpcResult<WindowHandle> {
        self.with_state(RemoteCall::TabpageGetWin(tabpage), |state| {
            Ok(state.tab(tabpage)?.current)
        })
        .await
    }

    async fn tabpage_list_wins(&self, tabpage: TabpageHandle) -> RpcResult<Vec<WindowHandle>> {
        self.with_state(RemoteCall::TabpageListWins(tabpage), |state| {
            Ok(state.tab(tabpage)?.windows.clone())
        })
        .await
    }

    async fn command(&self, command: &str, expects_return_value: bool) -> RpcResult<()> {
        let call = RemoteCall::Command {
            text: command.to_string(),
            expects_return_value,
        };
        self.with_state(call, |state| ex::execute(state, command))
            .await
    }

    async fn command_output(&self, command: &str) -> RpcResult<String> {
        self.with_state(RemoteCall::CommandOutput(command.to_string()), |state| {
            ex::execute_capturing(state, command)
        })
        .await
    }

    async fn win_set_cursor(
        &self,
        window: WindowHandle,
        position: CursorPosition,
    ) -> RpcResult<()> {
        self.with_state(RemoteCall::WinSetCursor(window, position), |state| {
            state.window_buffer(window)?;
            state.cursors.insert(window, position);
            Ok(())
        })
        .await
    }

    async fn focus_gained(&self, gained: bool) -> RpcResult<()> {
        self.with_state(RemoteCall::FocusGained(gained), |state| {
            state.focused = gained;
            Ok(())
        })
        .await
    }

    async fn resize_ui(&self, size: GridSize) -> RpcResult<()> {
        self.with_state(RemoteCall::ResizeUi(size), |state| {
            state.grid = Some(size);
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
