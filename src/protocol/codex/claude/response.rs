//! Codex terminal document -> Messages `message` object.

use serde_json::{json, Value};

use super::{usage_counts, TOOLS_PATH, TOOL_NAME_PATH};
use crate::protocol::codex::{message_texts, reasoning_text, terminal_response, terminal_status};
use crate::protocol::json_path::{parse_document, JsonPath};
use crate::protocol::mapping::codex_status_to_claude_stop;
use crate::protocol::tool_names::reverse_map_for;
use crate::protocol::ResponseContext;

/// Convert a terminal Codex document into a Messages response.
///
/// Returns `None` when `raw` is not a terminal Responses event, which callers
/// must tell apart from a terminal document with no content.
#[must_use]
pub fn convert_codex_response_to_claude(ctx: &ResponseContext<'_>, raw: &[u8]) -> Option<String> {
    let doc = parse_document(raw);
    let response = terminal_response(&doc)?;
    let names = reverse_map_for(
        &parse_document(ctx.original_request),
        TOOLS_PATH,
        TOOL_NAME_PATH,
    );

    let mut content = Vec::new();
    let mut has_tool_call = false;
    for item in response.array_at("output") {
        match item.str_at("type") {
            Some("reasoning") => {
                let thinking = reasoning_text(item);
                if !thinking.is_empty() {
                    content.push(json!({"type": "thinking", "thinking": thinking}));
                }
            }
            Some("message") => {
                for text in message_texts(item) {
                    content.push(json!({"type": "text", "text": text}));
                }
            }
            Some("function_call") => {
                has_tool_call = true;
                let short = item.text_at("name");
                let name = names.get(&short).cloned().unwrap_or(short);
                content.push(json!({
                    "type": "tool_use",
                    "id": item.text_at("call_id"),
                    "name": name,
                    "input": tool_input(&item.text_at("arguments")),
                }));
            }
            _ => {}
        }
    }

    let stop_reason = match response.str_at("stop_reason").filter(|r| !r.is_empty()) {
        Some(reason) => reason,
        None => {
            let (status, reason) = terminal_status(response);
            codex_status_to_claude_stop(status, reason, has_tool_call)
        }
    };
    let stop_sequence = response
        .at("stop_sequence")
        .filter(|seq| !seq.text_at("").is_empty())
        .cloned()
        .unwrap_or(Value::Null);

    let (input, output, cached) = usage_counts(response.at("usage"));
    let mut usage = json!({"input_tokens": input, "output_tokens": output});
    if cached > 0 {
        usage.set_path("cache_read_input_tokens", json!(cached));
    }

    let out = json!({
        "id": response.text_at("id"),
        "type": "message",
        "role": "assistant",
        "model": response.text_at("model"),
        "content": content,
        "stop_reason": stop_reason,
        "stop_sequence": stop_sequence,
        "usage": usage,
    });
    serde_json::to_string(&out).ok()
}

/// Structured `input` for a tool call's JSON-string arguments; anything that
/// does not parse to an object becomes `{}`.
fn tool_input(arguments: &str) -> Value {
    if arguments.is_empty() {
        return json!({});
    }
    match serde_json::from_str::<Value>(arguments) {
        Ok(value @ Value::Object(_)) => value,
        _ => {
            tracing::warn!(arguments, "unparsable tool call arguments, using empty input");
            json!({})
        }
    }
}
