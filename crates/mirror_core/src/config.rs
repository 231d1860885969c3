use std::{collections::HashMap, fs, path::Path, time::Duration};

use tracing::warn;

pub const DEFAULT_SETTINGS_FILE: &str = "mirror.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorSettings {
    /// `None` leaves remote calls unbounded: a hung call hangs whatever
    /// assembly or command depends on it.
    pub call_timeout: Option<Duration>,
    pub state_channel_capacity: usize,
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self {
            call_timeout: None,
            state_channel_capacity: 256,
        }
    }
}

pub fn load_settings() -> MirrorSettings {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE))
}

/// Settings file first, then `MIRROR_*` / `APP__*` environment overrides.
pub fn load_settings_from(path: &Path) -> MirrorSettings {
    let mut settings = settings_from_file(path);
    apply_overrides(&mut settings, |key| {
        std::env::var(format!("MIRROR_{}", key.to_ascii_uppercase()))
            .or_else(|_| std::env::var(format!("APP__{}", key.to_ascii_uppercase())))
            .ok()
    });
    settings
}

fn settings_from_file(path: &Path) -> MirrorSettings {
    let mut settings = MirrorSettings::default();
    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, String>>(&raw) {
            Ok(file_cfg) => apply_overrides(&mut settings, |key| file_cfg.get(key).cloned()),
            Err(err) => warn!(path = %path.display(), %err, "ignoring unreadable settings file"),
        }
    }
    settings
}

fn apply_overrides(settings: &mut MirrorSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("call_timeout_ms") {
        match v.trim().parse::<u64>() {
            Ok(0) => settings.call_timeout = None,
            Ok(ms) => settings.call_timeout = Some(Duration::from_millis(ms)),
            Err(_) => warn!(value = %v, "invalid call_timeout_ms"),
        }
    }

    if let Some(v) = lookup("state_capacity") {
        match v.trim().parse::<usize>() {
            Ok(capacity) if capacity > 0 => settings.state_channel_capacity = capacity,
            _ => warn!(value = %v, "invalid state_capacity"),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
