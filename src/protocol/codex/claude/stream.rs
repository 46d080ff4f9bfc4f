//! Codex SSE -> Messages SSE.
//!
//! | upstream `type` | emitted |
//! |---|---|
//! | `response.created` | `message_start` |
//! | `response.reasoning_summary_part.added` | `content_block_start` (thinking) |
//! | `response.reasoning_summary_text.delta` | `content_block_delta` (`thinking_delta`) |
//! | `response.reasoning_summary_part.done` | `content_block_stop` |
//! | `response.content_part.added` | `content_block_start` (text) |
//! | `response.output_text.delta` | `content_block_delta` (`text_delta`) |
//! | `response.content_part.done` | `content_block_stop` |
//! | `response.output_item.added` (function call) | `content_block_start` (`tool_use`) + empty `input_json_delta` |
//! | `response.function_call_arguments.delta` | `content_block_delta` (`input_json_delta`) |
//! | `response.output_item.done` (function call) | `content_block_stop` |
//! | `response.completed` / `response.incomplete` | `message_delta` + `message_stop` |
//! | `response.failed` / `error` | `error` |
//!
//! At most one block is open at a time. Opening a block while another is
//! open stops the previous one first; a stop for a block that is not open is
//! dropped.

use serde_json::Value;

use super::{usage_counts, TOOLS_PATH, TOOL_NAME_PATH};
use crate::protocol::codex::{failure_details, terminal_status};
use crate::protocol::json_path::JsonPath;
use crate::protocol::mapping::codex_status_to_claude_stop;
use crate::protocol::sse::{data_payload, Fragments, SseFragment};
use crate::protocol::state::{ResponseType, StreamState};
use crate::protocol::ResponseContext;
use crate::util::{push_json_string_escaped, push_u64_decimal};

/// Convert one upstream Codex stream line into Messages SSE events.
pub fn convert_codex_stream_to_claude(
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
    let index = event.i64_at("output_index");

    match event.str_at("type").unwrap_or_default() {
        "response.created" => {
            state.response_id = event.text_at("response.id");
            state.model = event
                .str_at("response.model")
                .filter(|model| !model.is_empty())
                .unwrap_or(ctx.model)
                .to_string();
            out.push(message_start(&state.response_id, &state.model));
        }
        "response.reasoning_summary_part.added" => {
            open(&mut out, state, ResponseType::Thinking, index);
        }
        "response.reasoning_summary_text.delta" => {
            ensure_open(&mut out, state, ResponseType::Thinking, index);
            out.push(text_delta(state.open_index, "thinking_delta", "thinking", &event.text_at("delta")));
        }
        "response.reasoning_summary_part.done" => {
            stop(&mut out, state, ResponseType::Thinking);
        }
        "response.content_part.added" => {
            open(&mut out, state, ResponseType::Content, index);
        }
        "response.output_text.delta" => {
            ensure_open(&mut out, state, ResponseType::Content, index);
            out.push(text_delta(state.open_index, "text_delta", "text", &event.text_at("delta")));
        }
        "response.content_part.done" => {
            stop(&mut out, state, ResponseType::Content);
        }
        "response.output_item.added" => {
            if event.str_at("item.type") != Some("function_call") {
                return out;
            }
            state.has_tool_call = true;
            open(&mut out, state, ResponseType::Function, index);
            let name = state.restore_tool_name(
                &event.text_at("item.name"),
                ctx.original_request,
                TOOLS_PATH,
                TOOL_NAME_PATH,
            );
            out.push(tool_use_start(index, &event.text_at("item.call_id"), &name));
            out.push(input_json_delta(index, ""));
        }
        "response.function_call_arguments.delta" => {
            if state.open != ResponseType::Function {
                tracing::debug!(output_index = index, "argument delta without an open tool_use block");
                return out;
            }
            out.push(input_json_delta(state.open_index, &event.text_at("delta")));
        }
        "response.output_item.done" => {
            if event.str_at("item.type") == Some("function_call") {
                stop(&mut out, state, ResponseType::Function);
            }
        }
        "response.completed" | "response.incomplete" => {
            if state.open != ResponseType::None {
                let open_kind = state.open;
                stop(&mut out, state, open_kind);
            }
            let response = event.at("response");
            let (status, reason) = response.map_or(("", ""), terminal_status);
            let stop_reason = codex_status_to_claude_stop(status, reason, state.has_tool_call);
            out.push(message_delta(stop_reason, usage_counts(response.and_then(|r| r.at("usage")))));
            out.push(SseFragment::named(
                "message_stop",
                "{\"type\":\"message_stop\"}".to_string(),
            ));
        }
        "response.failed" | "error" => {
            let (code, message) = failure_details(&event);
            tracing::warn!(code = %code, message = %message, "codex stream reported failure");
            let mut json = String::with_capacity(64 + message.len());
            json.push_str("{\"type\":\"error\",\"error\":{\"type\":\"api_error\",\"message\":");
            push_json_string_escaped(&mut json, &message);
            json.push_str("}}");
            out.push(SseFragment::named("error", json));
        }
        other => {
            tracing::trace!(event_type = other, "ignoring codex stream event");
        }
    }
    out
}

/// Open a block of `kind`, stopping whatever block is still open.
fn open(out: &mut Fragments, state: &mut StreamState, kind: ResponseType, index: i64) {
    if state.open != ResponseType::None {
        tracing::debug!(
            open = ?state.open,
            next = ?kind,
            "upstream opened a block while another was open, closing it"
        );
        let open_kind = state.open;
        stop(out, state, open_kind);
    }
    state.open_block_at(kind, index);
    match kind {
        ResponseType::Thinking => out.push(block_start(index, "{\"type\":\"thinking\",\"thinking\":\"\"}")),
        ResponseType::Content => out.push(block_start(index, "{\"type\":\"text\",\"text\":\"\"}")),
        ResponseType::Function | ResponseType::None => {}
    }
}

/// Open a block of `kind` unless it is already the open one.
fn ensure_open(out: &mut Fragments, state: &mut StreamState, kind: ResponseType, index: i64) {
    if state.open != kind {
        open(out, state, kind, index);
    }
}

fn stop(out: &mut Fragments, state: &mut StreamState, kind: ResponseType) {
    if state.open != kind || kind == ResponseType::None {
        tracing::debug!(open = ?state.open, stopping = ?kind, "dropping stop for a block that is not open");
        return;
    }
    let mut json = String::with_capacity(48);
    json.push_str("{\"type\":\"content_block_stop\",\"index\":");
    push_index(&mut json, state.open_index);
    json.push('}');
    out.push(SseFragment::named("content_block_stop", json));
    state.close_block();
}

fn push_index(out: &mut String, index: i64) {
    push_u64_decimal(out, u64::try_from(index).unwrap_or_default());
}

fn message_start(id: &str, model: &str) -> SseFragment {
    let mut json = String::with_capacity(256);
    json.push_str("{\"type\":\"message_start\",\"message\":{\"id\":");
    push_json_string_escaped(&mut json, id);
    json.push_str(",\"type\":\"message\",\"role\":\"assistant\",\"model\":");
    push_json_string_escaped(&mut json, model);
    json.push_str(
        ",\"stop_sequence\":null,\"usage\":{\"input_tokens\":0,\"output_tokens\":0},\"content\":[],\"stop_reason\":null}}",
    );
    SseFragment::named("message_start", json)
}

fn block_start(index: i64, content_block: &str) -> SseFragment {
    let mut json = String::with_capacity(96);
    json.push_str("{\"type\":\"content_block_start\",\"index\":");
    push_index(&mut json, index);
    json.push_str(",\"content_block\":");
    json.push_str(content_block);
    json.push('}');
    SseFragment::named("content_block_start", json)
}

fn tool_use_start(index: i64, call_id: &str, name: &str) -> SseFragment {
    let mut json = String::with_capacity(128);
    json.push_str("{\"type\":\"content_block_start\",\"index\":");
    push_index(&mut json, index);
    json.push_str(",\"content_block\":{\"type\":\"tool_use\",\"id\":");
    push_json_string_escaped(&mut json, call_id);
    json.push_str(",\"name\":");
    push_json_string_escaped(&mut json, name);
    json.push_str(",\"input\":{}}}");
    SseFragment::named("content_block_start", json)
}

fn text_delta(index: i64, delta_type: &str, field: &str, text: &str) -> SseFragment {
    let mut json = String::with_capacity(80 + text.len());
    json.push_str("{\"type\":\"content_block_delta\",\"index\":");
    push_index(&mut json, index);
    json.push_str(",\"delta\":{\"type\":\"");
    json.push_str(delta_type);
    json.push_str("\",\"");
    json.push_str(field);
    json.push_str("\":");
    push_json_string_escaped(&mut json, text);
    json.push_str("}}");
    SseFragment::named("content_block_delta", json)
}

fn input_json_delta(index: i64, partial: &str) -> SseFragment {
    text_delta(index, "input_json_delta", "partial_json", partial)
}

fn message_delta(stop_reason: &str, (input, output, cached): (i64, i64, i64)) -> SseFragment {
    let mut json = String::with_capacity(160);
    json.push_str("{\"type\":\"message_delta\",\"delta\":{\"stop_reason\":");
    push_json_string_escaped(&mut json, stop_reason);
    json.push_str(",\"stop_sequence\":null},\"usage\":{\"input_tokens\":");
    push_index(&mut json, input);
    json.push_str(",\"output_tokens\":");
    push_index(&mut json, output);
    if cached > 0 {
        json.push_str(",\"cache_read_input_tokens\":");
        push_index(&mut json, cached);
    }
    json.push_str("}}");
    SseFragment::named("message_delta", json)
}
