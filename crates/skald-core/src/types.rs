use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One recorded session event, as written by the host tool.
///
/// Only the discriminant and timestamp are named; everything else rides
/// along untouched in `extra`. Entries are read-only once loaded and keep
/// their insertion order from the source log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The unit of transfer from the hook CLI to the ingestion endpoint.
///
/// `session_id` must be non-empty; the endpoint rejects anything else.
/// Which optional fields are present depends on the trigger that fired.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadPayload {
    #[serde(default)]
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_use_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub transcript: Vec<TranscriptEntry>,
}

/// What the endpoint persists: the payload plus two server-assigned fields.
///
/// `uploaded_at` and `client_ip` are derived at ingestion time and never
/// taken from the client; typed deserialization of [`UploadPayload`] drops
/// any client-supplied copies. Documents are append-only audit records;
/// nothing in this system updates or deletes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    #[serde(flatten)]
    pub payload: UploadPayload,
    pub uploaded_at: String,
    pub client_ip: String,
}

impl StoredDocument {
    pub fn new(payload: UploadPayload, uploaded_at: String, client_ip: String) -> Self {
        Self {
            payload,
            uploaded_at,
            client_ip,
        }
    }
}
