use std::sync::mpsc;
use std::time::Duration;

use skald_core::UploadPayload;

/// Client-side abort for the in-flight POST. An abort is benign and logged,
/// distinct from a true network error.
pub const DISPATCH_TIMEOUT: Duration = Duration::from_secs(4);

/// How long the caller waits for the worker before handing control back.
/// The hook runs under a hard external timeout, so it never blocks on the
/// full request/response cycle; past this window the request is left to
/// finish or die with the process.
pub const EXIT_GRACE: Duration = Duration::from_millis(50);

/// Destination settings for the upload POST.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub grace: Duration,
}

impl DispatchConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            timeout: DISPATCH_TIMEOUT,
            grace: EXIT_GRACE,
        }
    }

    /// `SKALD_API_URL` / `SKALD_API_KEY`. No URL means uploads are simply
    /// not configured: a skip, not an error.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("SKALD_API_URL").ok().filter(|u| !u.is_empty())?;
        Some(Self {
            api_key: std::env::var("SKALD_API_KEY").ok().filter(|k| !k.is_empty()),
            ..Self::new(url)
        })
    }
}

/// Terminal state of one delivery attempt. Exactly one attempt is ever
/// made; every variant is logged and none is fatal to the hook.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// 2xx with the server-returned identifier (record id or object key).
    Delivered { id: String },
    /// Non-2xx status from the endpoint.
    Rejected { status: u16 },
    /// Client-side abort after [`DispatchConfig::timeout`].
    TimedOut,
    /// Connect/transport failure.
    Failed { error: String },
    /// The grace window elapsed with the request still in flight.
    Detached,
}

impl std::fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchOutcome::Delivered { id } => write!(f, "delivered id={id}"),
            DispatchOutcome::Rejected { status } => write!(f, "rejected status={status}"),
            DispatchOutcome::TimedOut => write!(f, "timed out"),
            DispatchOutcome::Failed { error } => write!(f, "failed: {error}"),
            DispatchOutcome::Detached => write!(f, "detached (still in flight)"),
        }
    }
}

/// Attempt delivery within the grace budget and return control promptly.
///
/// The POST runs on a detached worker thread. The caller blocks at most
/// `config.grace`; if the worker has not finished by then the outcome is
/// [`DispatchOutcome::Detached`] and the request races process exit: it
/// either completes in the background or is dropped at teardown. At most
/// one attempt, no retries, no queue.
pub fn dispatch(payload: &UploadPayload, config: &DispatchConfig) -> DispatchOutcome {
    let body = match serde_json::to_string(payload) {
        Ok(b) => b,
        Err(e) => {
            return DispatchOutcome::Failed {
                error: format!("serialize: {e}"),
            }
        }
    };

    let (tx, rx) = mpsc::channel();
    let worker_config = config.clone();
    std::thread::spawn(move || {
        // Receiver may be gone if the caller already moved on.
        let _ = tx.send(send_once(&body, &worker_config));
    });

    match rx.recv_timeout(config.grace) {
        Ok(outcome) => outcome,
        Err(_) => DispatchOutcome::Detached,
    }
}

fn send_once(body: &str, config: &DispatchConfig) -> DispatchOutcome {
    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(config.timeout))
        .build()
        .new_agent();

    let mut request = agent
        .post(&config.url)
        .header("Content-Type", "application/json");
    if let Some(key) = &config.api_key {
        request = request.header("x-api-key", key);
    }

    match request.send(body) {
        Ok(mut resp) => {
            let id = resp
                .body_mut()
                .read_to_string()
                .ok()
                .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok())
                .and_then(|json| {
                    json.get("id")
                        .or_else(|| json.get("key"))
                        .and_then(|v| v.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_default();
            DispatchOutcome::Delivered { id }
        }
        Err(ureq::Error::StatusCode(status)) => DispatchOutcome::Rejected { status },
        Err(ureq::Error::Timeout(_)) => DispatchOutcome::TimedOut,
        Err(e) => DispatchOutcome::Failed {
            error: e.to_string(),
        },
    }
}
