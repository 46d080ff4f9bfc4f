//! Codex SSE -> `chat.completion.chunk` SSE.

use serde_json::{json, Value};

use super::{created_at, openai_usage, TOOLS_PATH, TOOL_NAME_PATH};
use crate::protocol::codex::{failure_details, terminal_status};
use crate::protocol::json_path::JsonPath;
use crate::protocol::mapping::codex_status_to_openai_finish;
use crate::protocol::sse::{data_payload, Fragments, SseFragment};
use crate::protocol::state::StreamState;
use crate::protocol::ResponseContext;
use crate::util::{push_json_string_escaped, push_u64_decimal, unix_now_secs};

/// Convert one upstream Codex stream line into Chat Completions chunks.
///
/// Lines without a `data:` JSON payload and unknown event types yield
/// nothing. Completion emits the finish chunk followed by `data: [DONE]`.
pub fn convert_codex_stream_to_openai(
    ctx: &ResponseContext<'_>,
    line: &[u8],
    state: &mut StreamState,
) -> Fragments {
    let mut out = Fragments::new();
    let Some(payload) = data_payload(line) else {
        return out;
    };
    let Ok(event) = serde_json::from_slice::<Value>(payload) else {
        return out;
    };

    let kind = event.str_at("type").unwrap_or_default();
    if kind == "response.created" {
        state.response_id = event.text_at("response.id");
        state.model = event
            .str_at("response.model")
            .filter(|model| !model.is_empty())
            .unwrap_or(ctx.model)
            .to_string();
        state.created = event.at("response").map_or_else(unix_now_secs, created_at);
        state.role_sent = true;
        out.push(chunk(state, &json!({"role": "assistant"}), None, None));
        return out;
    }

    if state.model.is_empty() {
        state.model = ctx.model.to_string();
    }
    if state.created == 0 {
        state.created = unix_now_secs();
    }

    match kind {
        "response.output_text.delta" => {
            out.push(chunk(state, &json!({"content": event.text_at("delta")}), None, None));
        }
        "response.reasoning_summary_text.delta" => {
            out.push(chunk(
                state,
                &json!({"reasoning_content": event.text_at("delta")}),
                None,
                None,
            ));
        }
        "response.output_item.added" => {
            if event.str_at("item.type") != Some("function_call") {
                return out;
            }
            state.has_tool_call = true;
            let slot = state.tool_slot(event.i64_at("output_index"));
            let name = state.restore_tool_name(
                &event.text_at("item.name"),
                ctx.original_request,
                TOOLS_PATH,
                TOOL_NAME_PATH,
            );
            let delta = json!({"tool_calls": [{
                "index": slot,
                "id": event.text_at("item.call_id"),
                "type": "function",
                "function": {"name": name, "arguments": ""},
            }]});
            out.push(chunk(state, &delta, None, None));
        }
        "response.function_call_arguments.delta" => {
            let slot = state.tool_slot(event.i64_at("output_index"));
            let delta = json!({"tool_calls": [{
                "index": slot,
                "function": {"arguments": event.text_at("delta")},
            }]});
            out.push(chunk(state, &delta, None, None));
        }
        "response.completed" | "response.incomplete" => {
            let response = event.at("response").unwrap_or(&Value::Null);
            let (status, reason) = terminal_status(response);
            let finish = codex_status_to_openai_finish(status, reason, state.has_tool_call);
            let usage = response
                .at("usage")
                .filter(|usage| usage.is_object())
                .map(openai_usage);
            out.push(chunk(state, &json!({}), Some(finish), usage.as_ref()));
            out.push(SseFragment::done());
        }
        "response.failed" | "error" => {
            let (code, message) = failure_details(&event);
            tracing::warn!(code = %code, message = %message, "codex stream reported failure");
            let body = json!({"error": {"message": message, "type": "server_error", "code": code}});
            out.push(SseFragment::data(body.to_string()));
        }
        other => {
            tracing::trace!(event_type = other, "ignoring codex stream event");
        }
    }
    out
}

fn chunk(
    state: &StreamState,
    delta: &Value,
    finish_reason: Option<&str>,
    usage: Option<&Value>,
) -> SseFragment {
    let mut json = String::with_capacity(192);
    json.push_str("{\"id\":");
    push_json_string_escaped(&mut json, &state.response_id);
    json.push_str(",\"object\":\"chat.completion.chunk\",\"created\":");
    push_u64_decimal(&mut json, state.created);
    json.push_str(",\"model\":");
    push_json_string_escaped(&mut json, &state.model);
    json.push_str(",\"choices\":[{\"index\":0,\"delta\":");
    json.push_str(&delta.to_string());
    json.push_str(",\"finish_reason\":");
    match finish_reason {
        Some(reason) => push_json_string_escaped(&mut json, reason),
        None => json.push_str("null"),
    }
    json.push_str("}]");
    if let Some(usage) = usage {
        json.push_str(",\"usage\":");
        json.push_str(&usage.to_string());
    }
    json.push('}');
    SseFragment::data(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(ctx: &ResponseContext<'_>, state: &mut StreamState, event: Value) -> Vec<Value> {
        let line = format!("data: {event}");
        convert_codex_stream_to_openai(ctx, line.as_bytes(), state)
            .into_iter()
            .map(|fragment| {
                assert!(fragment.event.is_none());
                if fragment.data == "[DONE]" {
                    Value::String("[DONE]".into())
                } else {
                    serde_json::from_str(&fragment.data).expect("chunk json")
                }
            })
            .collect()
    }

    #[test]
    fn test_text_stream() {
        let ctx = ResponseContext::new("gpt-5", b"{}", b"{}");
        let mut state = StreamState::new();

        let start = feed(
            &ctx,
            &mut state,
            json!({"type": "response.created", "response": {"id": "resp_1", "model": "gpt-5-2025", "created_at": 1_700_000_000}}),
        );
        assert_eq!(start.len(), 1);
        assert_eq!(start[0]["id"], json!("resp_1"));
        assert_eq!(start[0]["object"], json!("chat.completion.chunk"));
        assert_eq!(start[0]["created"], json!(1_700_000_000));
        assert_eq!(start[0]["model"], json!("gpt-5-2025"));
        assert_eq!(start[0]["choices"][0]["delta"], json!({"role": "assistant"}));
        assert_eq!(start[0]["choices"][0]["finish_reason"], Value::Null);

        let text = feed(&ctx, &mut state, json!({"type": "response.output_text.delta", "output_index": 0, "delta": "Hi \"there\""}));
        assert_eq!(text[0]["choices"][0]["delta"], json!({"content": "Hi \"there\""}));

        let thought = feed(&ctx, &mut state, json!({"type": "response.reasoning_summary_text.delta", "delta": "hmm"}));
        assert_eq!(thought[0]["choices"][0]["delta"], json!({"reasoning_content": "hmm"}));

        let done = feed(
            &ctx,
            &mut state,
            json!({"type": "response.completed", "response": {"status": "completed", "usage": {"input_tokens": 3, "output_tokens": 2, "total_tokens": 5}}}),
        );
        assert_eq!(done.len(), 2);
        assert_eq!(done[0]["choices"][0]["finish_reason"], json!("stop"));
        assert_eq!(done[0]["usage"]["total_tokens"], json!(5));
        assert_eq!(done[1], json!("[DONE]"));
    }

    #[test]
    fn test_tool_call_stream_restores_name() {
        let long = format!("mcp__server__{}", "lookup_".repeat(12));
        let original = json!({"tools": [{"type": "function", "function": {"name": long}}]}).to_string();
        let short = crate::protocol::tool_names::shorten_name_if_needed(&long);
        let ctx = ResponseContext::new("gpt-5", original.as_bytes(), b"{}");
        let mut state = StreamState::new();

        let added = feed(
            &ctx,
            &mut state,
            json!({"type": "response.output_item.added", "output_index": 2, "item": {"type": "function_call", "call_id": "call_9", "name": short}}),
        );
        let call = &added[0]["choices"][0]["delta"]["tool_calls"][0];
        assert_eq!(call["index"], json!(0));
        assert_eq!(call["id"], json!("call_9"));
        assert_eq!(call["function"]["name"], json!(long));

        let args = feed(&ctx, &mut state, json!({"type": "response.function_call_arguments.delta", "output_index": 2, "delta": "{\"q\":"}));
        assert_eq!(args[0]["choices"][0]["delta"]["tool_calls"][0]["function"]["arguments"], json!("{\"q\":"));
        assert_eq!(args[0]["choices"][0]["delta"]["tool_calls"][0]["index"], json!(0));

        let done = feed(&ctx, &mut state, json!({"type": "response.completed", "response": {"status": "completed"}}));
        assert_eq!(done[0]["choices"][0]["finish_reason"], json!("tool_calls"));
        assert!(done[0].get("usage").is_none());
    }

    #[test]
    fn test_incomplete_maps_to_length() {
        let ctx = ResponseContext::new("gpt-5", b"{}", b"{}");
        let mut state = StreamState::new();
        let done = feed(
            &ctx,
            &mut state,
            json!({"type": "response.incomplete", "response": {"status": "incomplete", "incomplete_details": {"reason": "max_output_tokens"}}}),
        );
        assert_eq!(done[0]["choices"][0]["finish_reason"], json!("length"));
        assert_eq!(done[0]["model"], json!("gpt-5"));
    }

    #[test]
    fn test_ignored_lines() {
        let ctx = ResponseContext::new("gpt-5", b"{}", b"{}");
        let mut state = StreamState::new();
        for line in [&b""[..], b"event: response.created", b"data: [DONE]", b"data: {oops", b"data: {\"type\":\"response.in_progress\"}"] {
            assert!(convert_codex_stream_to_openai(&ctx, line, &mut state).is_empty());
        }
    }

    #[test]
    fn test_failure_becomes_error_chunk() {
        let ctx = ResponseContext::new("gpt-5", b"{}", b"{}");
        let mut state = StreamState::new();
        let out = feed(&ctx, &mut state, json!({"type": "error", "code": "overloaded", "message": "busy"}));
        assert_eq!(out[0]["error"]["message"], json!("busy"));
        assert_eq!(out[0]["error"]["code"], json!("overloaded"));
    }
}
