//! Codex terminal document -> `chat.completion`.

use serde_json::{json, Value};

use super::{created_at, openai_usage, TOOLS_PATH, TOOL_NAME_PATH};
use crate::protocol::codex::{message_texts, reasoning_text, terminal_response, terminal_status};
use crate::protocol::json_path::{parse_document, JsonPath};
use crate::protocol::mapping::codex_status_to_openai_finish;
use crate::protocol::tool_names::reverse_map_for;
use crate::protocol::ResponseContext;

/// Convert a terminal Codex document into a `chat.completion` object.
///
/// Returns `None` when `raw` is not a `response.completed` or
/// `response.incomplete` event.
#[must_use]
pub fn convert_codex_response_to_openai(ctx: &ResponseContext<'_>, raw: &[u8]) -> Option<String> {
    let doc = parse_document(raw);
    let response = terminal_response(&doc)?;
    let names = reverse_map_for(
        &parse_document(ctx.original_request),
        TOOLS_PATH,
        TOOL_NAME_PATH,
    );

    let mut content = String::new();
    let mut reasoning = String::new();
    let mut tool_calls = Vec::new();
    for item in response.array_at("output") {
        match item.str_at("type") {
            Some("reasoning") => reasoning.push_str(&reasoning_text(item)),
            Some("message") => {
                for text in message_texts(item) {
                    content.push_str(&text);
                }
            }
            Some("function_call") => {
                let short = item.text_at("name");
                let name = names.get(&short).cloned().unwrap_or(short);
                tool_calls.push(json!({
                    "id": item.text_at("call_id"),
                    "type": "function",
                    "function": {"name": name, "arguments": item.text_at("arguments")},
                }));
            }
            _ => {}
        }
    }

    let has_tool_call = !tool_calls.is_empty();
    let mut message = json!({"role": "assistant"});
    message.set_path(
        "content",
        if content.is_empty() {
            Value::Null
        } else {
            json!(content)
        },
    );
    if !reasoning.is_empty() {
        message.set_path("reasoning_content", json!(reasoning));
    }
    if has_tool_call {
        message.set_path("tool_calls", Value::Array(tool_calls));
    }

    let (status, reason) = terminal_status(response);
    let model = response
        .str_at("model")
        .filter(|model| !model.is_empty())
        .unwrap_or(ctx.model);
    let mut out = json!({
        "id": response.text_at("id"),
        "object": "chat.completion",
        "created": created_at(response),
        "model": model,
        "choices": [{
            "index": 0,
            "message": message,
            "finish_reason": codex_status_to_openai_finish(status, reason, has_tool_call),
        }],
    });
    if let Some(usage) = response.at("usage").filter(|usage| usage.is_object()) {
        out.set_path("usage", openai_usage(usage));
    }
    serde_json::to_string(&out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(original: &Value, upstream: &Value) -> Option<Value> {
        let original = original.to_string();
        let upstream = upstream.to_string();
        let ctx = ResponseContext::new("gpt-5", original.as_bytes(), b"{}");
        convert_codex_response_to_openai(&ctx, upstream.as_bytes())
            .map(|text| serde_json::from_str(&text).expect("json"))
    }

    #[test]
    fn test_complete_document() {
        let out = convert(
            &json!({}),
            &json!({"type": "response.completed", "response": {
                "id": "resp_1",
                "model": "gpt-5",
                "created_at": 1_700_000_000,
                "status": "completed",
                "output": [
                    {"type": "reasoning", "summary": [{"type": "summary_text", "text": "thinking"}]},
                    {"type": "message", "content": [{"type": "output_text", "text": "Hello"}, {"type": "output_text", "text": ""}]}
                ],
                "usage": {"input_tokens": 4, "output_tokens": 2, "total_tokens": 6}
            }}),
        )
        .expect("terminal");
        assert_eq!(out["object"], json!("chat.completion"));
        assert_eq!(out["id"], json!("resp_1"));
        assert_eq!(
            out["choices"][0]["message"],
            json!({"role": "assistant", "content": "Hello", "reasoning_content": "thinking"})
        );
        assert_eq!(out["choices"][0]["finish_reason"], json!("stop"));
        assert_eq!(out["usage"], json!({"prompt_tokens": 4, "completion_tokens": 2, "total_tokens": 6}));
    }

    #[test]
    fn test_tool_calls_restore_names() {
        let long = format!("mcp__git__{}", "commit_everything_".repeat(5));
        let short = crate::protocol::tool_names::shorten_name_if_needed(&long);
        let out = convert(
            &json!({"tools": [{"type": "function", "function": {"name": long}}]}),
            &json!({"type": "response.completed", "response": {
                "status": "completed",
                "output": [{"type": "function_call", "call_id": "call_1", "name": short, "arguments": "{\"x\":1}"}]
            }}),
        )
        .expect("terminal");
        let message = &out["choices"][0]["message"];
        assert_eq!(message["content"], Value::Null);
        assert_eq!(message["tool_calls"][0]["function"]["name"], json!(long));
        assert_eq!(message["tool_calls"][0]["function"]["arguments"], json!("{\"x\":1}"));
        assert_eq!(out["choices"][0]["finish_reason"], json!("tool_calls"));
        assert_eq!(out["model"], json!("gpt-5"));
    }

    #[test]
    fn test_non_terminal_is_none() {
        assert!(convert(&json!({}), &json!({"type": "response.output_text.delta", "delta": "x"})).is_none());
        let ctx = ResponseContext::new("gpt-5", b"", b"");
        assert!(convert_codex_response_to_openai(&ctx, b"garbage").is_none());
    }
}
