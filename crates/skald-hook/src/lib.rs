pub mod dispatch;
pub mod gate;
pub mod hooklog;
pub mod parse;

use std::time::Instant;

use skald_core::UploadPayload;

pub use dispatch::{dispatch, DispatchConfig, DispatchOutcome, DISPATCH_TIMEOUT, EXIT_GRACE};
pub use gate::{upload_enabled, GatePolicy, MARKER_RELATIVE};
pub use parse::{parse_hook_stdin, HookInput, Trigger};

/// Everything the pipeline needs besides stdin. Split from the env so the
/// CLI reads the environment once and tests inject their own.
#[derive(Debug, Clone)]
pub struct HookOptions {
    pub gate_policy: GatePolicy,
    pub api: Option<DispatchConfig>,
}

impl HookOptions {
    pub fn from_env() -> Self {
        Self {
            gate_policy: GatePolicy::from_env(),
            api: DispatchConfig::from_env(),
        }
    }
}

/// How one hook invocation ended. Informational only; the hook process
/// exits 0 whatever this says.
#[derive(Debug, Clone, PartialEq)]
pub enum HookStatus {
    /// Empty or unparseable stdin; nothing to do.
    NoInput,
    /// A trigger this pipeline does not handle.
    Ignored,
    /// Enable marker absent; terminated before any network activity.
    GateSkipped,
    /// No `SKALD_API_URL` configured.
    NotConfigured,
    /// A delivery attempt ran to one of its terminal outcomes.
    Dispatched(DispatchOutcome),
}

#[derive(Debug, Clone)]
pub struct HookSummary {
    pub status: HookStatus,
    pub transcript_entries: usize,
}

/// Run the whole CLI pipeline for one hook invocation: parse stdin, apply
/// the enable gate, load the transcript, dispatch. Never returns an error;
/// every failure mode collapses into a logged [`HookStatus`] so the host
/// tool is never blocked or failed by upload problems.
pub fn run_hook_from_stdin(stdin: &str) -> HookSummary {
    run_hook(stdin, &HookOptions::from_env())
}

pub fn run_hook(stdin: &str, opts: &HookOptions) -> HookSummary {
    let started = Instant::now();

    if stdin.trim().is_empty() {
        return HookSummary {
            status: HookStatus::NoInput,
            transcript_entries: 0,
        };
    }
    let input = match parse_hook_stdin(stdin) {
        Ok(input) => input,
        Err(e) => {
            hooklog::log_phase("", "parse", &format!("failed: {e}"), started.elapsed());
            return HookSummary {
                status: HookStatus::NoInput,
                transcript_entries: 0,
            };
        }
    };

    let trigger = input.trigger();
    if trigger == Trigger::Other {
        return HookSummary {
            status: HookStatus::Ignored,
            transcript_entries: 0,
        };
    }

    // On a gate skip the pipeline must end here, before any network
    // activity, and still count as success for the host.
    if opts.gate_policy.applies_to(trigger) && !upload_enabled(&input.cwd) {
        hooklog::log_phase(
            &input.session_id,
            "gate",
            "skipped (marker absent)",
            started.elapsed(),
        );
        return HookSummary {
            status: HookStatus::GateSkipped,
            transcript_entries: 0,
        };
    }

    let load_start = Instant::now();
    let entries = skald_transcript::load(std::path::Path::new(&input.transcript_path));
    hooklog::log_phase(
        &input.session_id,
        "load",
        &format!("{} entries", entries.len()),
        load_start.elapsed(),
    );

    let entry_count = entries.len();
    let payload = build_payload(&input, entries);

    let Some(api) = &opts.api else {
        hooklog::log_phase(
            &input.session_id,
            "dispatch",
            "skipped (no SKALD_API_URL)",
            started.elapsed(),
        );
        return HookSummary {
            status: HookStatus::NotConfigured,
            transcript_entries: entry_count,
        };
    };

    let dispatch_start = Instant::now();
    let outcome = dispatch(&payload, api);
    hooklog::log_phase(
        &input.session_id,
        "dispatch",
        &outcome.to_string(),
        dispatch_start.elapsed(),
    );

    HookSummary {
        status: HookStatus::Dispatched(outcome),
        transcript_entries: entry_count,
    }
}

/// Assemble the wire payload: every non-empty contextual field rides along,
/// absent ones are omitted entirely.
fn build_payload(input: &HookInput, transcript: Vec<skald_core::TranscriptEntry>) -> UploadPayload {
    let opt = |s: &str| {
        if s.is_empty() {
            None
        } else {
            Some(s.to_string())
        }
    };
    UploadPayload {
        session_id: input.session_id.clone(),
        tool_use_id: opt(&input.tool_use_id),
        tool_name: opt(&input.tool_name),
        tool_input: input.tool_input.clone(),
        cwd: opt(&input.cwd),
        hook_event: opt(&input.hook_event_name),
        reason: opt(&input.reason),
        transcript,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn wire_payload_for_session_end_with_missing_transcript() {
        let input = parse_hook_stdin(
            r#"{"session_id":"s1","transcript_path":"/tmp/missing.jsonl","reason":"clear"}"#,
        )
        .unwrap();
        let entries = skald_transcript::load(std::path::Path::new(&input.transcript_path));
        let payload = build_payload(&input, entries);

        let wire = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            wire,
            serde_json::json!({"session_id": "s1", "transcript": [], "reason": "clear"})
        );
    }

    #[test]
    fn wire_payload_for_tool_call_carries_tool_fields() {
        let input = parse_hook_stdin(
            r#"{"session_id":"s2","hook_event_name":"PostToolUse","tool_name":"Bash","tool_use_id":"tu1","tool_input":{"command":"ls"},"cwd":"/work"}"#,
        )
        .unwrap();
        let payload = build_payload(&input, Vec::new());

        let wire = serde_json::to_value(&payload).unwrap();
        assert_eq!(wire["tool_name"], "Bash");
        assert_eq!(wire["tool_use_id"], "tu1");
        assert_eq!(wire["tool_input"]["command"], "ls");
        assert_eq!(wire["cwd"], "/work");
        assert_eq!(wire["hook_event"], "PostToolUse");
        assert!(wire.get("reason").is_none());
    }

    #[test]
    fn missing_marker_terminates_without_network() {
        let tmp = tempfile::tempdir().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/api/transcripts", listener.local_addr().unwrap());

        let stdin = format!(
            r#"{{"session_id":"s1","transcript_path":"/tmp/missing.jsonl","reason":"clear","cwd":"{}"}}"#,
            tmp.path().display()
        );
        let opts = HookOptions {
            gate_policy: GatePolicy::SessionEndOnly,
            api: Some(DispatchConfig::new(url)),
        };
        let summary = run_hook(&stdin, &opts);
        assert_eq!(summary.status, HookStatus::GateSkipped);

        // No connection ever reached the would-be endpoint.
        listener.set_nonblocking(true).unwrap();
        assert!(matches!(
            listener.accept(),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock
        ));
    }

    #[test]
    fn tool_call_trigger_is_ungated_by_default() {
        let tmp = tempfile::tempdir().unwrap();
        // No marker — but the per-tool trigger does not check it.
        let stdin = format!(
            r#"{{"session_id":"s1","hook_event_name":"PostToolUse","cwd":"{}"}}"#,
            tmp.path().display()
        );
        let opts = HookOptions {
            gate_policy: GatePolicy::SessionEndOnly,
            api: None,
        };
        let summary = run_hook(&stdin, &opts);
        assert_eq!(summary.status, HookStatus::NotConfigured);
    }

    #[test]
    fn end_to_end_session_upload() {
        let tmp = tempfile::tempdir().unwrap();
        gate::write_marker(tmp.path().to_str().unwrap()).unwrap();

        // One-shot server capturing the request and answering 200.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/api/transcripts", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            let mut byte = [0u8; 1];
            while !buf.ends_with(b"\r\n\r\n") {
                if stream.read(&mut byte).unwrap_or(0) == 0 {
                    break;
                }
                buf.push(byte[0]);
            }
            let headers = String::from_utf8_lossy(&buf).to_lowercase();
            let len: usize = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0);
            let mut body = vec![0u8; len];
            let _ = stream.read_exact(&mut body);
            let _ = tx.send((headers, String::from_utf8_lossy(&body).to_string()));
            let resp_body = r#"{"success":true,"id":"rec_e2e"}"#;
            let resp = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{resp_body}",
                resp_body.len()
            );
            let _ = stream.write_all(resp.as_bytes());
        });

        let mut api = DispatchConfig::new(url);
        api.api_key = Some("sekrit".into());
        api.grace = Duration::from_secs(2);
        let opts = HookOptions {
            gate_policy: GatePolicy::SessionEndOnly,
            api: Some(api),
        };

        let stdin = format!(
            r#"{{"session_id":"s1","transcript_path":"/tmp/missing.jsonl","reason":"clear","cwd":"{}"}}"#,
            tmp.path().display()
        );
        let summary = run_hook(&stdin, &opts);
        assert_eq!(
            summary.status,
            HookStatus::Dispatched(DispatchOutcome::Delivered { id: "rec_e2e".into() })
        );

        let (headers, body) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(headers.contains("content-type: application/json"));
        assert!(headers.contains("x-api-key: sekrit"));
        let sent: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(sent["session_id"], "s1");
        assert_eq!(sent["reason"], "clear");
        assert_eq!(sent["transcript"], serde_json::json!([]));
    }

    #[test]
    fn garbage_stdin_is_no_input() {
        let opts = HookOptions {
            gate_policy: GatePolicy::SessionEndOnly,
            api: None,
        };
        assert_eq!(run_hook("", &opts).status, HookStatus::NoInput);
        assert_eq!(run_hook("{broken", &opts).status, HookStatus::NoInput);
    }

    #[test]
    fn unhandled_event_is_ignored() {
        let opts = HookOptions {
            gate_policy: GatePolicy::SessionEndOnly,
            api: None,
        };
        let summary = run_hook(
            r#"{"session_id":"s1","hook_event_name":"UserPromptSubmit"}"#,
            &opts,
        );
        assert_eq!(summary.status, HookStatus::Ignored);
    }
}
