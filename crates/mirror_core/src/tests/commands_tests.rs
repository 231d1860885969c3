use std::{path::PathBuf, sync::Arc};

use remote_api::calls;
use shared::{
    domain::{BufferHandle, CursorPosition, GridSize, WindowHandle},
    error::{MirrorError, RpcError, RpcErrorCode},
    protocol::EditorCommand,
};
use sim_editor::{Fault, RemoteCall, SimulatedEditor};

use super::{plan_open, OpenStep};
use crate::EditorMirror;

fn session() -> (Arc<SimulatedEditor>, EditorMirror) {
    let editor = Arc::new(SimulatedEditor::new());
    let mirror = EditorMirror::new(editor.clone());
    (editor, mirror)
}

fn paths(raw: &[&str]) -> Vec<PathBuf> {
    raw.iter().map(PathBuf::from).collect()
}

fn command(text: &str, expects_return_value: bool) -> RemoteCall {
    RemoteCall::Command {
        text: text.to_string(),
        expects_return_value,
    }
}

#[tokio::test]
async fn open_focuses_existing_window_then_opens_the_rest() {
    let (editor, mirror) = session();
    editor.script("e /src/a.rs").expect("edit");
    editor.script("tabe /src/other.rs").expect("tabe");
    editor.clear_calls();

    mirror
        .open(&paths(&["/src/a.rs", "/src/b.rs"]))
        .await
        .expect("open");

    assert_eq!(
        editor.mutations(),
        vec![
            RemoteCall::SetCurrentWin(WindowHandle(1000)),
            command("tabe /src/b.rs", false),
        ]
    );
}

#[tokio::test]
async fn open_edits_in_place_when_current_buffer_is_transient() {
    let (editor, mirror) = session();

    mirror.open(&paths(&["/src/a.rs"])).await.expect("open");

    assert_eq!(editor.commands(), vec!["e /src/a.rs".to_string()]);
    assert_eq!(editor.current_buffer().expect("current"), BufferHandle(1));
}

#[tokio::test]
async fn open_uses_new_tab_when_current_buffer_is_not_transient() {
    let (editor, mirror) = session();
    editor.set_modified(BufferHandle(1), true).expect("modify");

    mirror.open(&paths(&["/src/a.rs"])).await.expect("open");

    assert_eq!(editor.commands(), vec!["tabe /src/a.rs".to_string()]);
}

#[tokio::test]
async fn open_decides_every_url_against_one_snapshot() {
    let (editor, mirror) = session();

    mirror
        .open(&paths(&["/src/a.rs", "/src/b.rs"]))
        .await
        .expect("open");

    assert_eq!(
        editor.commands(),
        vec!["e /src/a.rs".to_string(), "e /src/b.rs".to_string()]
    );
    // one assembly, not one per url
    let list_tabs = editor
        .calls()
        .iter()
        .filter(|call| matches!(call, RemoteCall::ListTabpages))
        .count();
    assert_eq!(list_tabs, 1);
}

#[tokio::test]
async fn failed_open_keeps_earlier_opens_and_stops() {
    let (editor, mirror) = session();
    editor.set_modified(BufferHandle(1), true).expect("modify");
    editor.script("tabe /src/a.rs").expect("tabe");
    editor.clear_calls();
    editor.inject_fault(
        calls::SET_CURRENT_WINDOW,
        Fault::Fail(RpcError::new(RpcErrorCode::InvalidHandle, "Invalid window id")),
    );

    let err = mirror
        .open(&paths(&["/src/new.rs", "/src/a.rs", "/src/later.rs"]))
        .await
        .expect_err("focus fails");

    assert!(matches!(
        err,
        MirrorError::Remote { call, .. } if call == calls::SET_CURRENT_WINDOW
    ));
    assert_eq!(editor.commands(), vec!["tabe /src/new.rs".to_string()]);
}

#[test]
fn plan_open_without_current_buffer_opens_tabs() {
    let steps = plan_open(&Default::default(), &paths(&["/x"]));
    assert_eq!(
        steps,
        vec![OpenStep::Command(EditorCommand::TabEdit(PathBuf::from("/x")))]
    );
}

#[tokio::test]
async fn open_variants_issue_one_command_per_url_in_order() {
    let (editor, mirror) = session();
    let urls = paths(&["/a", "/b"]);

    mirror.open_in_new_tab(&urls).await.expect("tabs");
    mirror.open_in_horizontal_split(&urls).await.expect("splits");
    mirror.open_in_vertical_split(&urls).await.expect("vsplits");
    mirror
        .open_in_current_tab(&PathBuf::from("/c"))
        .await
        .expect("edit");

    assert_eq!(
        editor.commands(),
        vec!["tabe /a", "tabe /b", "sp /a", "sp /b", "vsp /a", "vsp /b", "e /c"]
    );
}

#[tokio::test]
async fn select_focuses_window_showing_the_buffer() {
    let (editor, mirror) = session();
    editor.script("e /a").expect("edit");
    editor.script("tabe /b").expect("tabe");
    let target = mirror
        .all_buffers()
        .await
        .expect("buffers")
        .into_iter()
        .find(|buf| buf.handle == BufferHandle(1))
        .expect("buffer 1");
    editor.clear_calls();

    mirror.select(&target).await.expect("select");

    assert_eq!(
        editor.mutations(),
        vec![RemoteCall::SetCurrentWin(WindowHandle(1000))]
    );
    assert_eq!(editor.current_window().expect("current"), WindowHandle(1000));
    assert_eq!(editor.current_buffer().expect("current"), BufferHandle(1));
}

#[tokio::test]
async fn select_hidden_buffer_opens_it_in_a_new_tab() {
    let (editor, mirror) = session();
    let hidden = editor.add_buffer("/hidden.rs", "", true);
    let target = mirror
        .all_buffers()
        .await
        .expect("buffers")
        .into_iter()
        .find(|buf| buf.handle == hidden)
        .expect("hidden buffer");

    mirror.select(&target).await.expect("select");

    assert_eq!(editor.commands(), vec![format!("tab sb {}", hidden.0)]);
    assert_eq!(editor.current_buffer().expect("current"), hidden);
}

#[tokio::test]
async fn passthroughs_issue_exactly_one_command() {
    let (editor, mirror) = session();
    editor.script("tabe /keep.rs").expect("tabe");

    mirror.new_tab().await.expect("new tab");
    mirror
        .save_current_tab_to(&PathBuf::from("/out.txt"))
        .await
        .expect("save to");
    mirror.save_current_tab().await.expect("save");
    mirror.close_current_tab().await.expect("close");
    mirror.close_current_tab_without_saving().await.expect("close!");
    mirror.quit_without_saving().await.expect("quit");

    assert_eq!(
        editor.mutations(),
        vec![
            command("tabe", false),
            command("w /out.txt", true),
            command("w", true),
            command("q", true),
            command("q!", true),
            command("qa!", true),
        ]
    );
    assert!(editor.has_exited());
}

#[tokio::test]
async fn passthrough_failure_surfaces_unchanged() {
    let (editor, mirror) = session();

    let err = mirror.save_current_tab().await.expect_err("no file name");
    match err {
        MirrorError::Remote { call, source } => {
            assert_eq!(call, calls::EXECUTE_COMMAND);
            assert_eq!(source.code, RpcErrorCode::CommandFailed);
            assert!(source.message.contains("E32"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(editor.written().is_empty());
}

#[tokio::test]
async fn cursor_go_targets_the_current_window() {
    let (editor, mirror) = session();
    editor.script("tabe /a").expect("tabe");
    editor.clear_calls();

    mirror
        .cursor_go(CursorPosition::new(12, 4))
        .await
        .expect("cursor");

    assert_eq!(
        editor.calls(),
        vec![
            RemoteCall::GetCurrentWin,
            RemoteCall::WinSetCursor(WindowHandle(1001), CursorPosition::new(12, 4)),
        ]
    );
    assert_eq!(
        editor.cursor(WindowHandle(1001)),
        Some(CursorPosition::new(12, 4))
    );
}

#[tokio::test]
async fn command_output_is_captured() {
    let (_editor, mirror) = session();
    let output = mirror.command_output("echo hello").await.expect("output");
    assert_eq!(output, "hello");
}

#[tokio::test]
async fn resize_mode_and_focus_reach_the_remote() {
    let (editor, mirror) = session();

    mirror.enter_resize_mode();
    assert!(mirror.is_resizing());
    assert!(editor.calls().is_empty());

    let size = GridSize {
        width: 120,
        height: 40,
    };
    mirror.exit_resize_mode(size).await.expect("resize");
    assert!(!mirror.is_resizing());
    assert_eq!(editor.grid_size(), Some(size));

    mirror.focus_gained(true).await.expect("focus");
    assert!(editor.is_focused());
    mirror.focus_gained(false).await.expect("blur");
    assert!(!editor.is_focused());
}

#[tokio::test]
async fn rejected_resize_stays_in_resize_mode() {
    let (editor, mirror) = session();
    editor.inject_fault(
        calls::RESIZE_UI,
        Fault::Fail(RpcError::new(RpcErrorCode::Transport, "resize rejected")),
    );

    mirror.enter_resize_mode();
    let size = GridSize {
        width: 80,
        height: 24,
    };
    let err = mirror.exit_resize_mode(size).await.expect_err("rejected");

    assert!(matches!(
        err,
        MirrorError::Remote { call, .. } if call == calls::RESIZE_UI
    ));
    assert!(mirror.is_resizing());
    assert_eq!(editor.grid_size(), None);

    editor.clear_faults();
    mirror.exit_resize_mode(size).await.expect("accepted");
    assert!(!mirror.is_resizing());
    assert_eq!(editor.grid_size(), Some(size));
}
