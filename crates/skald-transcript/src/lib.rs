use std::path::Path;

use skald_core::TranscriptEntry;

/// Load a newline-delimited-JSON transcript, tolerating absence.
///
/// A missing file is the normal short-session case and yields an empty
/// sequence. Parse failures abort the whole load: one malformed line means
/// the entire call returns empty (the file is parsed eagerly, so there is
/// no partial result to salvage). Callers that need the error itself use
/// [`try_load`].
pub fn load(path: &Path) -> Vec<TranscriptEntry> {
    match try_load(path) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "transcript load aborted");
            Vec::new()
        }
    }
}

/// Load a transcript, surfacing the first parse failure.
///
/// Missing file is still an empty `Ok`: absence is not an error. Blank
/// lines are skipped; every remaining line must parse as one JSON object.
pub fn try_load(path: &Path) -> anyhow::Result<Vec<TranscriptEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entry: TranscriptEntry = serde_json::from_str(line)
            .map_err(|e| anyhow::anyhow!("line {}: {e}", lineno + 1))?;
        entries.push(entry);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_transcript(dir: &Path, lines: &[&str]) -> PathBuf {
        let path = dir.join("transcript.jsonl");
        let mut f = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
        path
    }

    #[test]
    fn load_returns_entries_in_file_order() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_transcript(
            tmp.path(),
            &[
                r#"{"type":"user","timestamp":"t1","message":{"content":"hello"}}"#,
                r#"{"type":"assistant","timestamp":"t2"}"#,
                r#"{"type":"tool_use","timestamp":"t3","name":"Bash"}"#,
            ],
        );

        let entries = load(&path);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].kind, "user");
        assert_eq!(entries[1].kind, "assistant");
        assert_eq!(entries[2].kind, "tool_use");
        assert_eq!(entries[2].extra["name"], "Bash");
    }

    #[test]
    fn missing_file_is_empty_not_error() {
        let entries = try_load(Path::new("/nonexistent/transcript.jsonl")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn blank_lines_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_transcript(
            tmp.path(),
            &[r#"{"type":"user"}"#, "", "   ", r#"{"type":"assistant"}"#],
        );
        assert_eq!(load(&path).len(), 2);
    }

    #[test]
    fn malformed_line_aborts_whole_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_transcript(
            tmp.path(),
            &[
                r#"{"type":"user","timestamp":"t1"}"#,
                "{not json",
                r#"{"type":"assistant","timestamp":"t2"}"#,
            ],
        );

        let err = try_load(&path).unwrap_err();
        assert!(err.to_string().contains("line 2"));
        // Lenient entry point maps the abort to an empty sequence.
        assert!(load(&path).is_empty());
    }

    #[test]
    fn line_without_type_is_malformed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_transcript(tmp.path(), &[r#"{"timestamp":"t1"}"#]);
        assert!(try_load(&path).is_err());
        assert!(load(&path).is_empty());
    }
}
