use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// Where hook activity lands: `SKALD_HOOK_LOG` override, else
/// `<data dir>/skald/hook.log`, else the temp dir.
pub fn log_path() -> PathBuf {
    if let Some(path) = std::env::var_os("SKALD_HOOK_LOG") {
        return PathBuf::from(path);
    }
    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("skald").join("hook.log");
    }
    std::env::temp_dir().join("skald-hook.log")
}

/// Append one phase line: `[<ts>] <session> <phase> <outcome> (<n> ms)`.
/// Best-effort: a failed write is swallowed, never surfaced.
pub fn log_phase(session_id: &str, phase: &str, outcome: &str, elapsed: Duration) {
    let path = log_path();
    append_line(&path, session_id, phase, outcome, elapsed);
}

fn append_line(
    path: &std::path::Path,
    session_id: &str,
    phase: &str,
    outcome: &str,
    elapsed: Duration,
) {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Ok(mut f) = std::fs::OpenOptions::new().create(true).append(true).open(path) {
        let ts = skald_core::now_rfc3339();
        let sid = if session_id.is_empty() { "-" } else { session_id };
        let _ = writeln!(f, "[{ts}] {sid} {phase} {outcome} ({} ms)", elapsed.as_millis());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_line_is_human_readable() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("hook.log");

        append_line(&path, "s1", "dispatch", "delivered id=rec_1", Duration::from_millis(42));
        append_line(&path, "", "gate", "skipped (marker absent)", Duration::from_millis(0));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("s1 dispatch delivered id=rec_1 (42 ms)"));
        assert!(lines[1].contains("- gate skipped (marker absent)"));
        assert!(lines[0].starts_with('['));
    }

    #[test]
    fn unwritable_path_is_swallowed() {
        // Parent is a file, so the append can only fail.
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let path = blocker.join("hook.log");
        append_line(&path, "s1", "dispatch", "ok", Duration::ZERO);
    }
}
