use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{domain::BufferHandle, error::MirrorError};

/// Decoded reply of the remote get-buffer-info call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferInfo {
    pub filename: String,
    pub modified: bool,
    pub buftype: String,
    pub buflisted: bool,
}

impl BufferInfo {
    pub fn decode(handle: BufferHandle, raw: &Value) -> Result<Self, MirrorError> {
        Ok(Self {
            filename: string_field(handle, raw, "filename")?,
            modified: bool_field(handle, raw, "modified")?,
            buftype: string_field(handle, raw, "buftype")?,
            buflisted: bool_field(handle, raw, "buflisted")?,
        })
    }

    /// Special buffers never get a filesystem url, even when they carry a name.
    pub fn url(&self) -> Option<PathBuf> {
        if self.filename.is_empty() || !self.buftype.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.filename))
        }
    }
}

fn string_field(
    handle: BufferHandle,
    raw: &Value,
    field: &'static str,
) -> Result<String, MirrorError> {
    raw.get(field)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(MirrorError::MissingField {
            handle,
            field,
            expected: "string",
        })
}

fn bool_field(
    handle: BufferHandle,
    raw: &Value,
    field: &'static str,
) -> Result<bool, MirrorError> {
    raw.get(field)
        .and_then(Value::as_bool)
        .ok_or(MirrorError::MissingField {
            handle,
            field,
            expected: "bool",
        })
}

/// Ex commands issued on behalf of the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum EditorCommand {
    NewTab,
    Edit(PathBuf),
    TabEdit(PathBuf),
    Split(PathBuf),
    VerticalSplit(PathBuf),
    TabSwitchToBuffer(BufferHandle),
    Quit,
    QuitForce,
    Write,
    WriteTo(PathBuf),
    QuitAllForce,
}

impl EditorCommand {
    pub fn command_line(&self) -> String {
        match self {
            Self::NewTab => "tabe".to_string(),
            Self::Edit(path) => with_path("e", path),
            Self::TabEdit(path) => with_path("tabe", path),
            Self::Split(path) => with_path("sp", path),
            Self::VerticalSplit(path) => with_path("vsp", path),
            Self::TabSwitchToBuffer(handle) => format!("tab sb {handle}"),
            Self::Quit => "q".to_string(),
            Self::QuitForce => "q!".to_string(),
            Self::Write => "w".to_string(),
            Self::WriteTo(path) => with_path("w", path),
            Self::QuitAllForce => "qa!".to_string(),
        }
    }

    /// Quit and write commands report back whether the editor accepted them.
    pub fn expects_return_value(&self) -> bool {
        matches!(
            self,
            Self::Quit | Self::QuitForce | Self::Write | Self::WriteTo(_) | Self::QuitAllForce
        )
    }
}

fn with_path(cmd: &str, path: &Path) -> String {
    let mut line = String::with_capacity(cmd.len() + 1 + path.as_os_str().len());
    line.push_str(cmd);
    line.push(' ');
    line.push_str(&escape_path(path));
    line
}

/// Escapes characters the ex command line would otherwise expand or
/// interpret, including wildcards and a leading `+`/`-`.
pub fn escape_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut escaped = String::with_capacity(raw.len());
    for (i, ch) in raw.chars().enumerate() {
        let special = matches!(
            ch,
            ' ' | '\t'
                | '\n'
                | '\\'
                | '%'
                | '#'
                | '|'
                | '"'
                | '\''
                | '*'
                | '?'
                | '['
                | '{'
                | '$'
                | '`'
                | '!'
        );
        if special || (i == 0 && matches!(ch, '+' | '-' | '>')) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Inverse of [`escape_path`], for consumers that read command lines back.
pub fn unescape_path(raw: &str) -> PathBuf {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    PathBuf::from(out)
}
