use std::path::{Path, PathBuf};

use crate::parse::Trigger;

/// Relative path of the per-project opt-in marker. A zero-byte sentinel:
/// existence is the entire state, content is never read.
pub const MARKER_RELATIVE: &str = ".skald/enabled";

/// Check whether uploads are opted in for the project at `cwd`.
/// Local filesystem only; an empty `cwd` falls back to the process cwd.
pub fn upload_enabled(cwd: &str) -> bool {
    marker_path(cwd).exists()
}

/// The marker path for a working directory.
pub fn marker_path(cwd: &str) -> PathBuf {
    let base = if cwd.is_empty() {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    } else {
        PathBuf::from(cwd)
    };
    base.join(MARKER_RELATIVE)
}

/// Which triggers the marker gates. Deployment-configurable: host variants
/// disagree on whether per-tool uploads should be gated too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePolicy {
    /// Only the session-end trigger checks the marker (default).
    SessionEndOnly,
    /// Every trigger checks the marker (`SKALD_GATE_ALL=1`).
    AllTriggers,
}

impl GatePolicy {
    pub fn from_env() -> Self {
        match std::env::var("SKALD_GATE_ALL").ok().as_deref() {
            Some("1") | Some("true") => GatePolicy::AllTriggers,
            _ => GatePolicy::SessionEndOnly,
        }
    }

    pub fn applies_to(&self, trigger: Trigger) -> bool {
        match self {
            GatePolicy::SessionEndOnly => trigger == Trigger::SessionEnd,
            GatePolicy::AllTriggers => true,
        }
    }
}

/// Create the marker (used by `skald enable`).
pub fn write_marker(cwd: &str) -> anyhow::Result<PathBuf> {
    let path = marker_path(cwd);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::File::create(&path)?;
    Ok(path)
}

/// Remove the marker if present (used by `skald disable`).
pub fn remove_marker(cwd: &str) -> anyhow::Result<bool> {
    let path = marker_path(cwd);
    if path.exists() {
        std::fs::remove_file(&path)?;
        Ok(true)
    } else {
        Ok(false)
    }
}
