use std::{path::PathBuf, sync::Arc, time::Duration};

use remote_api::calls;
use shared::{
    domain::{BufferHandle, Snapshot, TabpageHandle},
    error::{MirrorError, RpcError, RpcErrorCode},
};
use sim_editor::{Fault, RemoteCall, SimulatedEditor};

use crate::{EditorMirror, MirrorSettings};

fn mirror_over(editor: &Arc<SimulatedEditor>) -> EditorMirror {
    EditorMirror::new(editor.clone())
}

#[tokio::test]
async fn current_buffer_is_always_flagged_current() {
    let editor = Arc::new(SimulatedEditor::new());
    let mirror = mirror_over(&editor);

    let buffer = mirror.current_buffer().await.expect("current buffer");
    assert_eq!(buffer.handle, BufferHandle(1));
    assert!(buffer.is_current);
    assert!(buffer.is_transient());
}

fn assert_current_flags_are_consistent(snapshot: &Snapshot, layout: &[&str]) {
    assert_eq!(
        snapshot.tabs.iter().filter(|tab| tab.is_current).count(),
        1,
        "exactly one current tab after {layout:?}"
    );
    for tab in &snapshot.tabs {
        assert_eq!(
            tab.windows.iter().filter(|win| win.is_current_in_tab).count(),
            1,
            "tab {} must have exactly one current window after {layout:?}",
            tab.handle
        );
    }

    let current = snapshot.current_buffer().expect("a current buffer");
    let shown_in_current_window = snapshot
        .current_tab()
        .and_then(|tab| tab.current_window())
        .map(|win| win.buffer.handle);
    assert_eq!(shown_in_current_window, Some(current.handle));
    assert!(snapshot
        .buffers()
        .filter(|buf| buf.is_current)
        .all(|buf| buf.handle == current.handle));
}

#[tokio::test]
async fn all_tabs_has_exactly_one_current_tab_and_window_per_tab() {
    let layouts: &[&[&str]] = &[
        &[],
        &["e /src/main.rs"],
        &[
            "e /src/main.rs",
            "tabe /src/lib.rs",
            "sp /src/util.rs",
            "vsp /src/cli.rs",
            "tabe /README.md",
        ],
        &["tabe /a", "sp /b", "q"],
        &["tabe /a", "tabe /b", "q", "sp /c", "vsp /d"],
        &["e /a", "tabe /b", "tab sb 1", "sp /c"],
        &["tabe /a", "sp /b", "sp /c", "q", "tabe", "tab sb 3"],
        &["tabe /a", "tabe /b", "tabe /c", "q", "q"],
    ];

    for layout in layouts {
        let editor = Arc::new(SimulatedEditor::new());
        for line in *layout {
            editor.script(line).expect("layout command");
        }
        let mirror = mirror_over(&editor);

        let snapshot = mirror.all_tabs().await.expect("snapshot");
        assert_current_flags_are_consistent(&snapshot, layout);
    }
}

#[tokio::test]
async fn snapshot_reports_the_last_opened_buffer_as_current() {
    let editor = Arc::new(SimulatedEditor::new());
    editor.script("e /src/main.rs").expect("edit");
    editor.script("tabe /src/lib.rs").expect("tabe");
    editor.script("tabe /README.md").expect("tabe");
    let mirror = mirror_over(&editor);

    let snapshot = mirror.all_tabs().await.expect("snapshot");
    assert_eq!(snapshot.tabs.len(), 3);
    let current = snapshot.current_buffer().expect("a current buffer");
    assert_eq!(current.url, Some(PathBuf::from("/README.md")));
}

#[tokio::test]
async fn tabs_keep_remote_order() {
    let editor = Arc::new(SimulatedEditor::new());
    editor.script("tabe /a").expect("tabe");
    editor.script("tabe /b").expect("tabe");
    editor.script("q").expect("close /b");
    editor.script("tabe /c").expect("tabe");
    let mirror = mirror_over(&editor);

    let handles: Vec<_> = mirror
        .all_tabs()
        .await
        .expect("snapshot")
        .tabs
        .iter()
        .map(|tab| tab.handle)
        .collect();
    assert_eq!(
        handles,
        vec![TabpageHandle(1), TabpageHandle(2), TabpageHandle(4)]
    );
}

#[tokio::test]
async fn buffer_urls_follow_name_and_kind() {
    let editor = Arc::new(SimulatedEditor::new());
    let help = editor.add_buffer("/usr/share/doc/help.txt", "help", false);
    let named = editor.add_buffer("/src/main.rs", "", true);
    let mirror = mirror_over(&editor);

    let buffers = mirror.all_buffers().await.expect("buffers");
    assert_eq!(buffers.len(), 3);

    let by_handle = |handle| buffers.iter().find(|buf| buf.handle == handle).expect("buffer");
    assert_eq!(by_handle(BufferHandle(1)).url, None);
    assert_eq!(by_handle(help).url, None);
    assert_eq!(by_handle(help).kind, "help");
    assert!(!by_handle(help).is_listed);
    assert_eq!(by_handle(named).url, Some(PathBuf::from("/src/main.rs")));

    assert!(by_handle(BufferHandle(1)).is_current);
    assert!(!by_handle(named).is_current);
}

#[tokio::test]
async fn transient_requires_unnamed_unmodified_normal_buffer() {
    let editor = Arc::new(SimulatedEditor::new());
    let named = editor.add_buffer("/src/main.rs", "", true);
    let special = editor.add_buffer("", "nofile", true);
    let dirty = editor.add_buffer("", "", true);
    editor.set_modified(dirty, true).expect("modify");
    let mirror = mirror_over(&editor);

    let buffers = mirror.all_buffers().await.expect("buffers");
    let transient = |handle| {
        buffers
            .iter()
            .find(|buf| buf.handle == handle)
            .expect("buffer")
            .is_transient()
    };
    assert!(transient(BufferHandle(1)));
    assert!(!transient(named));
    assert!(!transient(special));
    assert!(!transient(dirty));
    assert!(!mirror.is_current_buffer_dirty().await.expect("dirty flag"));
}

#[tokio::test]
async fn missing_info_field_fails_the_whole_assembly() {
    let editor = Arc::new(SimulatedEditor::new());
    let broken = editor.add_buffer("/src/broken.rs", "", true);
    editor.strip_info_field(broken, "modified");
    let mirror = mirror_over(&editor);

    let err = mirror.all_buffers().await.expect_err("no partial result");
    assert!(matches!(
        err,
        MirrorError::MissingField { handle, field: "modified", .. } if handle == broken
    ));
    assert!(err.is_protocol_error());

    editor.strip_info_field(BufferHandle(1), "buflisted");
    let err = mirror.current_buffer().await.expect_err("current is broken too");
    assert!(matches!(err, MirrorError::MissingField { field: "buflisted", .. }));
}

#[tokio::test]
async fn remote_failure_in_any_sub_call_aborts_all_tabs() {
    let editor = Arc::new(SimulatedEditor::new());
    editor.script("tabe /a").expect("tabe");
    editor.inject_fault(
        calls::LIST_TAB_WINDOWS,
        Fault::Fail(RpcError::new(RpcErrorCode::InvalidHandle, "Invalid tabpage id: 2")),
    );
    let mirror = mirror_over(&editor);

    match mirror.all_tabs().await {
        Err(MirrorError::Remote { call, source }) => {
            assert_eq!(call, calls::LIST_TAB_WINDOWS);
            assert_eq!(source.code, RpcErrorCode::InvalidHandle);
        }
        other => panic!("expected remote failure, got {other:?}"),
    }
}

#[tokio::test]
async fn assembly_issues_no_mutations() {
    let editor = Arc::new(SimulatedEditor::new());
    editor.script("tabe /a").expect("tabe");
    let mirror = mirror_over(&editor);

    mirror.all_tabs().await.expect("snapshot");
    mirror.all_buffers().await.expect("buffers");

    assert!(editor.mutations().is_empty());
    assert!(editor
        .calls()
        .iter()
        .any(|call| matches!(call, RemoteCall::TabpageListWins(TabpageHandle(2)))));
}

#[tokio::test(start_paused = true)]
async fn fan_out_latency_is_bounded_by_call_depth() {
    let latency = Duration::from_millis(10);
    let editor = Arc::new(SimulatedEditor::new().with_latency(latency));
    for i in 0..4 {
        editor.script(&format!("tabe /file{i}")).expect("tabe");
        editor.script(&format!("sp /split{i}")).expect("split");
    }
    let mirror = mirror_over(&editor);

    let started = tokio::time::Instant::now();
    let snapshot = mirror.all_tabs().await.expect("snapshot");
    let elapsed = started.elapsed();

    assert_eq!(snapshot.tabs.len(), 5);
    // handles, tab windows, window buffer, buffer info
    assert!(
        elapsed < latency * 5,
        "assembly took {elapsed:?}, expected about four round trips"
    );
    assert!(editor.calls().len() > 20);
}

#[tokio::test(start_paused = true)]
async fn configured_timeout_bounds_a_hung_call() {
    let editor = Arc::new(SimulatedEditor::new());
    editor.inject_fault(calls::GET_BUFFER_INFO, Fault::Hang);
    let settings = MirrorSettings {
        call_timeout: Some(Duration::from_millis(250)),
        ..MirrorSettings::default()
    };
    let mirror = EditorMirror::with_settings(editor.clone(), &settings);
    assert_eq!(mirror.call_timeout(), Some(Duration::from_millis(250)));

    let err = mirror.all_tabs().await.expect_err("timed out");
    assert!(matches!(
        err,
        MirrorError::Timeout { call, .. } if call == calls::GET_BUFFER_INFO
    ));
}
