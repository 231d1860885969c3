//! The handful of ex commands the mirror issues, interpreted against
//! [`EditorState`].

use remote_api::RpcResult;
use shared::{
    domain::BufferHandle,
    error::{RpcError, RpcErrorCode},
    protocol::unescape_path,
};

use crate::state::EditorState;

fn not_a_command(line: &str) -> RpcError {
    RpcError::new(
        RpcErrorCode::CommandFailed,
        format!("E492: Not an editor command: {line}"),
    )
}

pub(crate) fn execute(state: &mut EditorState, line: &str) -> RpcResult<()> {
    let line = line.trim();
    let (cmd, arg) = match line.split_once(' ') {
        Some((cmd, arg)) => (cmd, Some(arg.trim_start())),
        None => (line, None),
    };

    match (cmd, arg) {
        ("tabe" | "tabedit" | "tabnew", None) => state.new_tab(),
        ("tabe" | "tabedit" | "tabnew", Some(path)) => state.tab_edit(&unescape_path(path)),
        ("e" | "edit", Some(path)) => state.edit(&unescape_path(path))?,
        ("sp" | "split" | "vsp" | "vsplit", Some(path)) => state.split(&unescape_path(path))?,
        ("tab", Some(rest)) => match rest.split_once(' ') {
            Some(("sb" | "sbuffer", number)) => {
                let handle = number
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| not_a_command(line))?;
                state.tab_switch_to_buffer(BufferHandle(handle))?
            }
            _ => return Err(not_a_command(line)),
        },
        ("q" | "quit" | "clo" | "close", None) => state.quit(false)?,
        ("q!" | "quit!", None) => state.quit(true)?,
        ("w" | "write", None) => state.write(None)?,
        ("w" | "write", Some(path)) => state.write(Some(&unescape_path(path)))?,
        ("qa!" | "qall!", None) => state.quit_all(),
        _ => return Err(not_a_command(line)),
    }
    Ok(())
}

/// Like [`execute`], but captures what the command prints.
pub(crate) fn execute_capturing(state: &mut EditorState, line: &str) -> RpcResult<String> {
    let trimmed = line.trim();
    if let Some(text) = trimmed.strip_prefix("echo ") {
        return Ok(text.trim().trim_matches(|c| c == '"' || c == '\'').to_string());
    }
    if matches!(trimmed, "ls" | "buffers" | "files") {
        return Ok(state.list_buffers());
    }
    execute(state, trimmed)?;
    Ok(String::new())
}
