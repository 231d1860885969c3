use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

macro_rules! handle_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

handle_newtype!(BufferHandle);
handle_newtype!(WindowHandle);
handle_newtype!(TabpageHandle);

/// A point-in-time copy of one remote buffer.
///
/// `is_current` is relative to the snapshot the buffer was assembled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buffer {
    pub handle: BufferHandle,
    pub url: Option<PathBuf>,
    pub kind: String,
    pub is_dirty: bool,
    pub is_current: bool,
    pub is_listed: bool,
}

impl Buffer {
    /// An unnamed, unmodified, non-special buffer that can be replaced by
    /// editing a file into it.
    pub fn is_transient(&self) -> bool {
        self.kind.is_empty() && self.url.is_none() && !self.is_dirty
    }

    pub fn shows(&self, url: &Path) -> bool {
        self.url.as_deref() == Some(url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub handle: WindowHandle,
    pub buffer: Buffer,
    pub is_current_in_tab: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tabpage {
    pub handle: TabpageHandle,
    pub windows: Vec<Window>,
    pub is_current: bool,
}

impl Tabpage {
    pub fn current_window(&self) -> Option<&Window> {
        self.windows.iter().find(|win| win.is_current_in_tab)
    }
}

/// All tabs in remote order, consistent with one observation of what is
/// current. Never updated in place; the next action assembles a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tabs: Vec<Tabpage>,
}

impl Snapshot {
    pub fn new(tabs: Vec<Tabpage>) -> Self {
        Self { tabs }
    }

    pub fn current_tab(&self) -> Option<&Tabpage> {
        self.tabs.iter().find(|tab| tab.is_current)
    }

    pub fn windows(&self) -> impl Iterator<Item = &Window> {
        self.tabs.iter().flat_map(|tab| tab.windows.iter())
    }

    pub fn buffers(&self) -> impl Iterator<Item = &Buffer> {
        self.windows().map(|win| &win.buffer)
    }

    pub fn current_buffer(&self) -> Option<&Buffer> {
        self.buffers().find(|buf| buf.is_current)
    }

    pub fn window_showing_url(&self, url: &Path) -> Option<&Window> {
        self.windows().find(|win| win.buffer.shows(url))
    }

    pub fn window_showing_buffer(&self, handle: BufferHandle) -> Option<&Window> {
        self.windows().find(|win| win.buffer.handle == handle)
    }
}

/// Row and column passed verbatim to the remote set-window-cursor call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub row: i64,
    pub column: i64,
}

impl CursorPosition {
    pub fn new(row: i64, column: i64) -> Self {
        Self { row, column }
    }
}

/// Size of the remote UI grid in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}
