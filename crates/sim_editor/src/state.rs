use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use remote_api::RpcResult;
use serde_json::{json, Value};
use shared::{
    domain::{BufferHandle, CursorPosition, GridSize, TabpageHandle, WindowHandle},
    error::{RpcError, RpcErrorCode},
};

#[derive(Debug, Clone)]
pub(crate) struct SimBuffer {
    pub handle: BufferHandle,
    pub name: String,
    pub buftype: String,
    pub modified: bool,
    pub listed: bool,
}

impl SimBuffer {
    fn is_transient(&self) -> bool {
        self.name.is_empty() && self.buftype.is_empty() && !self.modified
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SimTab {
    pub handle: TabpageHandle,
    pub windows: Vec<WindowHandle>,
    pub current: WindowHandle,
}

/// Tabs, windows and buffers of the simulated session. Handles follow the
/// numbering of a fresh editor: buffers and tabs from 1, windows from 1000.
#[derive(Debug)]
pub(crate) struct EditorState {
    next_buffer: i64,
    next_window: i64,
    next_tab: i64,
    pub buffers: Vec<SimBuffer>,
    pub windows: HashMap<WindowHandle, BufferHandle>,
    pub tabs: Vec<SimTab>,
    pub current_tab: TabpageHandle,
    pub cursors: HashMap<WindowHandle, CursorPosition>,
    pub written: Vec<PathBuf>,
    pub focused: bool,
    pub grid: Option<GridSize>,
    pub exited: bool,
}

fn invalid(what: &str, id: i64) -> RpcError {
    RpcError::new(RpcErrorCode::InvalidHandle, format!("Invalid {what} id: {id}"))
}

fn command_failed(message: impl Into<String>) -> RpcError {
    RpcError::new(RpcErrorCode::CommandFailed, message)
}

impl EditorState {
    pub fn new() -> Self {
        let mut state = Self {
            next_buffer: 1,
            next_window: 1000,
            next_tab: 1,
            buffers: Vec::new(),
            windows: HashMap::new(),
            tabs: Vec::new(),
            current_tab: TabpageHandle(0),
            cursors: HashMap::new(),
            written: Vec::new(),
            focused: false,
            grid: None,
            exited: false,
        };
        let buffer = state.create_buffer("", "", true);
        let window = state.create_window(buffer);
        let tab = state.create_tab(window);
        state.tabs.push(tab);
        state.current_tab = state.tabs[0].handle;
        state
    }

    pub fn create_buffer(&mut self, name: &str, buftype: &str, listed: bool) -> BufferHandle {
        let handle = BufferHandle(self.next_buffer);
        self.next_buffer += 1;
        self.buffers.push(SimBuffer {
            handle,
            name: name.to_string(),
            buftype: buftype.to_string(),
            modified: false,
            listed,
        });
        handle
    }

    fn create_window(&mut self, buffer: BufferHandle) -> WindowHandle {
        let handle = WindowHandle(self.next_window);
        self.next_window += 1;
        self.windows.insert(handle, buffer);
        handle
    }

    fn create_tab(&mut self, window: WindowHandle) -> SimTab {
        let handle = TabpageHandle(self.next_tab);
        self.next_tab += 1;
        SimTab {
            handle,
            windows: vec![window],
            current: window,
        }
    }

    pub fn buffer(&self, handle: BufferHandle) -> RpcResult<&SimBuffer> {
        self.buffers
            .iter()
            .find(|buf| buf.handle == handle)
            .ok_or_else(|| invalid("buffer", handle.0))
    }

    pub fn buffer_mut(&mut self, handle: BufferHandle) -> RpcResult<&mut SimBuffer> {
        self.buffers
            .iter_mut()
            .find(|buf| buf.handle == handle)
            .ok_or_else(|| invalid("buffer", handle.0))
    }

    pub fn tab(&self, handle: TabpageHandle) -> RpcResult<&SimTab> {
        self.tabs
            .iter()
            .find(|tab| tab.handle == handle)
            .ok_or_else(|| invalid("tabpage", handle.0))
    }

    fn current_tab_index(&self) -> usize {
        self.tabs
            .iter()
            .position(|tab| tab.handle == self.current_tab)
            .unwrap_or(0)
    }

    pub fn current_window(&self) -> RpcResult<WindowHandle> {
        Ok(self.tab(self.current_tab)?.current)
    }

    pub fn current_buffer(&self) -> RpcResult<BufferHandle> {
        self.window_buffer(self.current_window()?)
    }

    pub fn window_buffer(&self, window: WindowHandle) -> RpcResult<BufferHandle> {
        self.windows
            .get(&window)
            .copied()
            .ok_or_else(|| invalid("window", window.0))
    }

    pub fn set_current_window(&mut self, window: WindowHandle) -> RpcResult<()> {
        let tab = self
            .tabs
            .iter_mut()
            .find(|tab| tab.windows.contains(&window))
            .ok_or_else(|| invalid("window", window.0))?;
        tab.current = window;
        self.current_tab = tab.handle;
        Ok(())
    }

    pub fn info(&self, handle: BufferHandle) -> RpcResult<Value> {
        let buf = self.buffer(handle)?;
        Ok(json!({
            "filename": buf.name,
            "modified": buf.modified,
            "buftype": buf.buftype,
            "buflisted": buf.listed,
        }))
    }

    fn buffer_for_path(&mut self, path: &Path) -> BufferHandle {
        let name = path.to_string_lossy();
        if let Some(buf) = self.buffers.iter_mut().find(|buf| buf.name == name) {
            buf.listed = true;
            return buf.handle;
        }
        self.create_buffer(&name, "", true)
    }

    fn open_tab_with(&mut self, buffer: BufferHandle) {
        let window = self.create_window(buffer);
        let tab = self.create_tab(window);
        let handle = tab.handle;
        let index = self.current_tab_index() + 1;
        self.tabs.insert(index.min(self.tabs.len()), tab);
        self.current_tab = handle;
    }

    pub fn new_tab(&mut self) {
        let buffer = self.create_buffer("", "", true);
        self.open_tab_with(buffer);
    }

    pub fn tab_edit(&mut self, path: &Path) {
        let buffer = self.buffer_for_path(path);
        self.open_tab_with(buffer);
    }

    /// Editing into an unnamed, untouched buffer names it in place.
    pub fn edit(&mut self, path: &Path) -> RpcResult<()> {
        let window = self.current_window()?;
        let current = self.window_buffer(window)?;
        let name = path.to_string_lossy();

        let existing = self.buffers.iter().any(|buf| buf.name == name);
        if !existing && self.buffer(current)?.is_transient() {
            self.buffer_mut(current)?.name = name.into_owned();
            return Ok(());
        }

        let target = self.buffer_for_path(path);
        self.windows.insert(window, target);
        Ok(())
    }

    pub fn split(&mut self, path: &Path) -> RpcResult<()> {
        let buffer = self.buffer_for_path(path);
        let window = self.create_window(buffer);
        let index = self.current_tab_index();
        let tab = &mut self.tabs[index];
        let at = tab
            .windows
            .iter()
            .position(|win| *win == tab.current)
            .unwrap_or(0);
        tab.windows.insert(at, window);
        tab.current = window;
        Ok(())
    }

    pub fn tab_switch_to_buffer(&mut self, buffer: BufferHandle) -> RpcResult<()> {
        if self.buffer(buffer).is_err() {
            return Err(command_failed(format!(
                "E86: Buffer {} does not exist",
                buffer.0
            )));
        }
        self.buffer_mut(buffer)?.listed = true;
        self.open_tab_with(buffer);
        Ok(())
    }

    pub fn quit(&mut self, force: bool) -> RpcResult<()> {
        let window = self.current_window()?;
        let buffer = self.window_buffer(window)?;
        let shown_elsewhere = self
            .windows
            .iter()
            .any(|(win, buf)| *win != window && *buf == buffer);
        if !force && !shown_elsewhere && self.buffer(buffer)?.modified {
            return Err(command_failed(
                "E37: No write since last change (add ! to override)",
            ));
        }

        self.windows.remove(&window);
        self.cursors.remove(&window);

        let index = self.current_tab_index();
        let tab = &mut self.tabs[index];
        let at = tab
            .windows
            .iter()
            .position(|win| *win == window)
            .unwrap_or(0);
        tab.windows.retain(|win| *win != window);

        if let Some(next) = tab.windows.get(at.min(tab.windows.len().saturating_sub(1))) {
            tab.current = *next;
            return Ok(());
        }

        self.tabs.remove(index);
        match self.tabs.get(index.min(self.tabs.len().saturating_sub(1))) {
            Some(tab) => self.current_tab = tab.handle,
            None => self.exited = true,
        }
        Ok(())
    }

    pub fn write(&mut self, path: Option<&Path>) -> RpcResult<()> {
        let current = self.current_buffer()?;
        let buf = self.buffer_mut(current)?;
        let target = match path {
            Some(path) => {
                if buf.name.is_empty() {
                    buf.name = path.to_string_lossy().into_owned();
                }
                path.to_path_buf()
            }
            None if buf.name.is_empty() => return Err(command_failed("E32: No file name")),
            None => PathBuf::from(&buf.name),
        };
        buf.modified = false;
        self.written.push(target);
        Ok(())
    }

    pub fn quit_all(&mut self) {
        self.tabs.clear();
        self.windows.clear();
        self.exited = true;
    }

    pub fn list_buffers(&self) -> String {
        let current = self.current_buffer().ok();
        self.buffers
            .iter()
            .filter(|buf| buf.listed)
            .map(|buf| {
                let marker = if Some(buf.handle) == current { "%a" } else { "  " };
                let modified = if buf.modified { "+" } else { " " };
                let name = if buf.name.is_empty() {
                    "[No Name]"
                } else {
                    buf.name.as_str()
                };
                format!("{:>3} {marker} {modified} \"{name}\"", buf.handle.0)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
