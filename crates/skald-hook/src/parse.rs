use serde_json::Value;

/// Contextual input one hook invocation receives on stdin.
///
/// Fields default to empty when the host omits them; which ones carry data
/// depends on the trigger that fired.
#[derive(Debug, Clone, Default)]
pub struct HookInput {
    pub session_id: String,
    pub transcript_path: String,
    pub cwd: String,
    pub hook_event_name: String,
    pub reason: String,
    pub tool_name: String,
    pub tool_use_id: String,
    pub tool_input: Option<Value>,
}

/// Which upload trigger fired, derived from the hook input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Session wound down (`SessionEnd`/`Stop`, or a bare `reason` field
    /// from older host versions that only sent that).
    SessionEnd,
    /// One tool call completed (`PostToolUse`).
    ToolCall,
    /// Anything else, which the hook ignores.
    Other,
}

impl HookInput {
    pub fn trigger(&self) -> Trigger {
        match self.hook_event_name.as_str() {
            "SessionEnd" | "Stop" => Trigger::SessionEnd,
            "PostToolUse" => Trigger::ToolCall,
            "" if !self.reason.is_empty() => Trigger::SessionEnd,
            _ => Trigger::Other,
        }
    }
}

/// Parse the hook stdin JSON into a [`HookInput`].
pub fn parse_hook_stdin(stdin: &str) -> anyhow::Result<HookInput> {
    let raw: Value = serde_json::from_str(stdin)?;
    Ok(HookInput {
        session_id: get_str(&raw, "session_id"),
        transcript_path: get_str(&raw, "transcript_path"),
        cwd: get_str(&raw, "cwd"),
        hook_event_name: get_str(&raw, "hook_event_name"),
        reason: get_str(&raw, "reason"),
        tool_name: get_str(&raw, "tool_name"),
        tool_use_id: get_str(&raw, "tool_use_id"),
        tool_input: get_value(&raw, "tool_input"),
    })
}

/// Get a string field from JSON, trying snake_case first then camelCase.
/// Claude Code sends camelCase (e.g. `hookEventName`); internal tests and
/// older host versions use snake_case.
fn get_str(v: &Value, snake_key: &str) -> String {
    if let Some(s) = v.get(snake_key).and_then(|x| x.as_str()) {
        return s.to_string();
    }
    let camel = snake_to_camel(snake_key);
    v.get(&camel)
        .and_then(|x| x.as_str())
        .unwrap_or("")
        .to_string()
}

fn get_value(v: &Value, snake_key: &str) -> Option<Value> {
    if let Some(val) = v.get(snake_key) {
        if !val.is_null() {
            return Some(val.clone());
        }
    }
    let camel = snake_to_camel(snake_key);
    v.get(&camel).filter(|val| !val.is_null()).cloned()
}

fn snake_to_camel(s: &str) -> String {
    let mut result = String::new();
    let mut capitalize_next = false;
    for ch in s.chars() {
        if ch == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.extend(ch.to_uppercase());
            capitalize_next = false;
        } else {
            result.push(ch);
        }
    }
    result
}
