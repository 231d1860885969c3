//! Fan-out/fan-in assembly of consistent multi-entity views.
//!
//! Independent calls are joined concurrently and the first failure aborts the
//! whole assembly; no partial snapshot is ever returned.

use futures::future::try_join_all;
use remote_api::calls;
use shared::domain::{Buffer, Snapshot};
use tracing::debug;

use crate::{EditorMirror, MirrorResult};

impl EditorMirror {
    pub async fn current_buffer(&self) -> MirrorResult<Buffer> {
        let current = self
            .call(calls::GET_CURRENT_BUFFER, self.api.get_current_buf())
            .await?;
        self.build_buffer(current, current).await
    }

    pub async fn is_current_buffer_dirty(&self) -> MirrorResult<bool> {
        Ok(self.current_buffer().await?.is_dirty)
    }

    pub async fn all_buffers(&self) -> MirrorResult<Vec<Buffer>> {
        let (current, handles) = futures::try_join!(
            self.call(calls::GET_CURRENT_BUFFER, self.api.get_current_buf()),
            self.call(calls::LIST_BUFFERS, self.api.list_bufs()),
        )?;

        try_join_all(handles.into_iter().map(|buf| self.build_buffer(buf, current))).await
    }

    /// Tabs come back in the order the remote lists them.
    pub async fn all_tabs(&self) -> MirrorResult<Snapshot> {
        let (current_buffer, current_tab, handles) = futures::try_join!(
            self.call(calls::GET_CURRENT_BUFFER, self.api.get_current_buf()),
            self.call(calls::GET_CURRENT_TAB, self.api.get_current_tabpage()),
            self.call(calls::LIST_TABS, self.api.list_tabpages()),
        )?;

        let tabs = try_join_all(
            handles
                .into_iter()
                .map(|tab| self.build_tab(tab, current_tab, current_buffer)),
        )
        .await?;

        debug!(tabs = tabs.len(), "assembled snapshot");
        Ok(Snapshot::new(tabs))
    }
}

#[cfg(test)]
#[path = "tests/snapshot_tests.rs"]
mod tests;
