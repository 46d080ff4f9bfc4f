//! Converters whose upstream speaks the Responses-style Codex dialect.
//!
//! `openai` serves Chat Completions clients and `claude` serves Messages
//! clients. Both share the request envelope built here.

pub mod claude;
pub mod instructions;
pub mod openai;

use serde_json::{json, Value};

use super::json_path::JsonPath;

/// Reasoning payload Codex must echo back across turns.
pub const INCLUDE_ENCRYPTED_REASONING: &str = "reasoning.encrypted_content";

/// Terminal event types of a Responses stream.
pub(crate) const TERMINAL_EVENTS: [&str; 2] = ["response.completed", "response.incomplete"];

/// Fresh Codex request envelope with the provider-mandated constants.
///
/// Writes `stream`, `reasoning.effort`, `reasoning.summary`,
/// `parallel_tool_calls`, `include`, `model`, `instructions` and an empty
/// `input` array, in that order. Callers add `store: false` last.
pub(crate) fn request_envelope(model: &str, stream: bool, effort: &str, instructions: &str) -> Value {
    let mut out = json!({});
    out.set_path("stream", json!(stream));
    out.set_path("reasoning.effort", json!(effort));
    out.set_path("reasoning.summary", json!("auto"));
    out.set_path("parallel_tool_calls", json!(true));
    out.set_path("include", json!([INCLUDE_ENCRYPTED_REASONING]));
    out.set_path("model", json!(model));
    out.set_path("instructions", json!(instructions));
    out.set_path("input", json!([]));
    out
}

/// Serialize a finished request document.
pub(crate) fn finish_request(mut out: Value) -> Vec<u8> {
    out.set_path("store", json!(false));
    serde_json::to_vec(&out).unwrap_or_default()
}

/// Codex input message item with a typed text part.
pub(crate) fn text_part(role: &str, text: &str) -> Value {
    let kind = if role == "assistant" {
        "output_text"
    } else {
        "input_text"
    };
    json!({"type": kind, "text": text})
}

/// The `response` object of a terminal document, or `None` when `doc` is not
/// a terminal Responses event.
pub(crate) fn terminal_response(doc: &Value) -> Option<&Value> {
    let kind = doc.str_at("type")?;
    if !TERMINAL_EVENTS.contains(&kind) {
        return None;
    }
    doc.at("response").filter(|response| response.is_object())
}

/// Concatenated reasoning text of a `reasoning` output item: summary text
/// first, raw content text when no summary is present.
pub(crate) fn reasoning_text(item: &Value) -> String {
    let mut text = collect_text(item.at("summary"));
    if text.is_empty() {
        text = collect_text(item.at("content"));
    }
    text
}

/// Non-empty `output_text` strings of a `message` output item, in order. A
/// plain string `content` counts as one part.
pub(crate) fn message_texts(item: &Value) -> Vec<String> {
    match item.at("content") {
        Some(Value::Array(parts)) => parts
            .iter()
            .filter(|part| part.str_at("type") == Some("output_text"))
            .map(|part| part.text_at("text"))
            .filter(|text| !text.is_empty())
            .collect(),
        Some(other) => Some(other.text_at(""))
            .filter(|text| !text.is_empty())
            .into_iter()
            .collect(),
        None => Vec::new(),
    }
}

/// Error code and message of a `response.failed` or `error` event.
pub(crate) fn failure_details(doc: &Value) -> (String, String) {
    if doc.str_at("type") == Some("response.failed") {
        (
            doc.text_at("response.error.code"),
            doc.text_at("response.error.message"),
        )
    } else {
        (doc.text_at("code"), doc.text_at("message"))
    }
}

/// `(status, incomplete reason)` of a terminal `response` object.
pub(crate) fn terminal_status(response: &Value) -> (&str, &str) {
    (
        response.str_at("status").unwrap_or_default(),
        response.str_at("incomplete_details.reason").unwrap_or_default(),
    )
}

fn collect_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(parts)) => parts
            .iter()
            .map(|part| match part.at("text") {
                Some(text) => text.text_at(""),
                None => part.text_at(""),
            })
            .collect(),
        Some(other) => other.text_at(""),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_field_order() {
        let out = finish_request(request_envelope("gpt-5", true, "low", "be brief"));
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(
            text,
            r#"{"stream":true,"reasoning":{"effort":"low","summary":"auto"},"parallel_tool_calls":true,"include":["reasoning.encrypted_content"],"model":"gpt-5","instructions":"be brief","input":[],"store":false}"#
        );
    }

    #[test]
    fn test_terminal_response_detection() {
        let done = json!({"type": "response.completed", "response": {"id": "r"}});
        assert_eq!(terminal_response(&done).and_then(|r| r.str_at("id")), Some("r"));
        let partial = json!({"type": "response.output_text.delta", "delta": "x"});
        assert!(terminal_response(&partial).is_none());
        assert!(terminal_response(&json!({"type": "response.completed"})).is_none());
    }

    #[test]
    fn test_reasoning_text_prefers_summary() {
        let item = json!({
            "type": "reasoning",
            "summary": [{"type": "summary_text", "text": "a"}, {"type": "summary_text", "text": "b"}],
            "content": [{"type": "reasoning_text", "text": "raw"}]
        });
        assert_eq!(reasoning_text(&item), "ab");
        let raw_only = json!({"type": "reasoning", "summary": [], "content": [{"text": "raw"}]});
        assert_eq!(reasoning_text(&raw_only), "raw");
        assert_eq!(reasoning_text(&json!({"type": "reasoning"})), "");
    }

    #[test]
    fn test_message_texts_drop_empty_parts() {
        let item = json!({
            "type": "message",
            "content": [
                {"type": "output_text", "text": "Hello"},
                {"type": "output_text", "text": ""},
                {"type": "refusal", "refusal": "no"}
            ]
        });
        assert_eq!(message_texts(&item), vec!["Hello".to_string()]);
        assert_eq!(message_texts(&json!({"content": "plain"})), vec!["plain".to_string()]);
        assert!(message_texts(&json!({"content": ""})).is_empty());
    }

    #[test]
    fn test_failure_details() {
        let failed = json!({"type": "response.failed", "response": {"error": {"code": "rate_limit", "message": "slow down"}}});
        assert_eq!(failure_details(&failed), ("rate_limit".into(), "slow down".into()));
        let error = json!({"type": "error", "code": "bad", "message": "oops"});
        assert_eq!(failure_details(&error), ("bad".into(), "oops".into()));
    }
}
