use std::path::{Path, PathBuf};

use remote_api::calls;
use shared::{
    domain::{Buffer, CursorPosition, GridSize, Snapshot, WindowHandle},
    protocol::EditorCommand,
};
use tracing::debug;

use crate::{EditorMirror, MirrorResult};

/// One remote effect decided by [`plan_open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenStep {
    Focus(WindowHandle),
    Command(EditorCommand),
}

/// Decides, for each url in order, how to bring it on screen.
///
/// Every decision is taken against the same snapshot, so a transient current
/// buffer is treated as reusable for all urls of one call.
pub fn plan_open(snapshot: &Snapshot, urls: &[PathBuf]) -> Vec<OpenStep> {
    let current_is_transient = snapshot
        .current_buffer()
        .map(Buffer::is_transient)
        .unwrap_or(false);

    urls.iter()
        .map(|url| {
            if let Some(win) = snapshot.window_showing_url(url) {
                OpenStep::Focus(win.handle)
            } else if current_is_transient {
                OpenStep::Command(EditorCommand::Edit(url.clone()))
            } else {
                OpenStep::Command(EditorCommand::TabEdit(url.clone()))
            }
        })
        .collect()
}

impl EditorMirror {
    pub async fn execute(&self, command: &EditorCommand) -> MirrorResult<()> {
        let line = command.command_line();
        debug!(command = %line, "issuing remote command");
        self.call(
            calls::EXECUTE_COMMAND,
            self.api.command(&line, command.expects_return_value()),
        )
        .await
    }

    pub async fn focus_window(&self, window: WindowHandle) -> MirrorResult<()> {
        debug!(%window, "focusing window");
        self.call(calls::SET_CURRENT_WINDOW, self.api.set_current_win(window))
            .await
    }

    /// Opens are applied one after another; a failure stops the sequence but
    /// leaves already issued opens in effect.
    pub async fn open(&self, urls: &[PathBuf]) -> MirrorResult<()> {
        let snapshot = self.all_tabs().await?;
        for step in plan_open(&snapshot, urls) {
            match step {
                OpenStep::Focus(window) => self.focus_window(window).await?,
                OpenStep::Command(command) => self.execute(&command).await?,
            }
        }
        Ok(())
    }

    pub async fn open_in_new_tab(&self, urls: &[PathBuf]) -> MirrorResult<()> {
        self.execute_each(urls, EditorCommand::TabEdit).await
    }

    pub async fn open_in_current_tab(&self, url: &Path) -> MirrorResult<()> {
        self.execute(&EditorCommand::Edit(url.to_path_buf())).await
    }

    pub async fn open_in_horizontal_split(&self, urls: &[PathBuf]) -> MirrorResult<()> {
        self.execute_each(urls, EditorCommand::Split).await
    }

    pub async fn open_in_vertical_split(&self, urls: &[PathBuf]) -> MirrorResult<()> {
        self.execute_each(urls, EditorCommand::VerticalSplit).await
    }

    async fn execute_each(
        &self,
        urls: &[PathBuf],
        command: fn(PathBuf) -> EditorCommand,
    ) -> MirrorResult<()> {
        for url in urls {
            self.execute(&command(url.clone())).await?;
        }
        Ok(())
    }

    pub async fn select(&self, buffer: &Buffer) -> MirrorResult<()> {
        let snapshot = self.all_tabs().await?;
        match snapshot.window_showing_buffer(buffer.handle) {
            Some(win) => self.focus_window(win.handle).await,
            None => {
                self.execute(&EditorCommand::TabSwitchToBuffer(buffer.handle))
                    .await
            }
        }
    }

    pub async fn new_tab(&self) -> MirrorResult<()> {
        self.execute(&EditorCommand::NewTab).await
    }

    /// Closes the current window.
    pub async fn close_current_tab(&self) -> MirrorResult<()> {
        self.execute(&EditorCommand::Quit).await
    }

    pub async fn close_current_tab_without_saving(&self) -> MirrorResult<()> {
        self.execute(&EditorCommand::QuitForce).await
    }

    pub async fn save_current_tab(&self) -> MirrorResult<()> {
        self.execute(&EditorCommand::Write).await
    }

    pub async fn save_current_tab_to(&self, url: &Path) -> MirrorResult<()> {
        self.execute(&EditorCommand::WriteTo(url.to_path_buf()))
            .await
    }

    pub async fn quit_without_saving(&self) -> MirrorResult<()> {
        self.execute(&EditorCommand::QuitAllForce).await
    }

    pub async fn command_output(&self, command: &str) -> MirrorResult<String> {
        self.call(
            calls::EXECUTE_COMMAND_CAPTURING_OUTPUT,
            self.api.command_output(command),
        )
        .await
    }

    pub async fn cursor_go(&self, position: CursorPosition) -> MirrorResult<()> {
        let window = self
            .call(calls::GET_CURRENT_WINDOW, self.api.get_current_win())
            .await?;
        self.call(
            calls::SET_WINDOW_CURSOR,
            self.api.win_set_cursor(window, position),
        )
        .await
    }

    pub async fn focus_gained(&self, gained: bool) -> MirrorResult<()> {
        self.call(calls::NOTIFY_FOCUS, self.api.focus_gained(gained))
            .await
    }

    pub fn enter_resize_mode(&self) {
        self.set_resizing(true);
    }

    /// Resize mode is left only once the remote has accepted the new size.
    pub async fn exit_resize_mode(&self, size: GridSize) -> MirrorResult<()> {
        self.call(calls::RESIZE_UI, self.api.resize_ui(size)).await?;
        self.set_resizing(false);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
