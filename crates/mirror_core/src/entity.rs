use futures::future::try_join_all;
use remote_api::calls;
use shared::{
    domain::{Buffer, BufferHandle, Tabpage, TabpageHandle, Window, WindowHandle},
    protocol::BufferInfo,
};

use crate::{EditorMirror, MirrorResult};

impl EditorMirror {
    /// `current_buffer` is threaded in by the caller so that every entity
    /// of one assembly pass agrees on which buffer is current.
    pub(crate) async fn build_buffer(
        &self,
        handle: BufferHandle,
        current_buffer: BufferHandle,
    ) -> MirrorResult<Buffer> {
        let raw = self
            .call(calls::GET_BUFFER_INFO, self.api.buf_get_info(handle))
            .await?;
        let info = BufferInfo::decode(handle, &raw)?;

        Ok(Buffer {
            handle,
            url: info.url(),
            kind: info.buftype,
            is_dirty: info.modified,
            is_current: handle == current_buffer,
            is_listed: info.buflisted,
        })
    }

    pub(crate) async fn build_window(
        &self,
        handle: WindowHandle,
        current_window: WindowHandle,
        current_buffer: BufferHandle,
    ) -> MirrorResult<Window> {
        let buffer_handle = self
            .call(calls::GET_WINDOW_BUFFER, self.api.win_get_buf(handle))
            .await?;
        let buffer = self.build_buffer(buffer_handle, current_buffer).await?;

        Ok(Window {
            handle,
            buffer,
            is_current_in_tab: handle == current_window,
        })
    }

    pub(crate) async fn build_tab(
        &self,
        handle: TabpageHandle,
        current_tab: TabpageHandle,
        current_buffer: BufferHandle,
    ) -> MirrorResult<Tabpage> {
        let (current_window, window_handles) = futures::try_join!(
            self.call(calls::GET_TAB_CURRENT_WINDOW, self.api.tabpage_get_win(handle)),
            self.call(calls::LIST_TAB_WINDOWS, self.api.tabpage_list_wins(handle)),
        )?;

        let windows = try_join_all(
            window_handles
                .into_iter()
                .map(|win| self.build_window(win, current_window, current_buffer)),
        )
        .await?;

        Ok(Tabpage {
            handle,
            windows,
            is_current: handle == current_tab,
        })
    }
}
