//! Gemini `streamGenerateContent` chunks -> `chat.completion.chunk` SSE.

use serde_json::{json, Map, Value};

use super::{completion_id, openai_usage, CandidateContent, TOOLS_PATH, TOOL_NAME_PATH};
use crate::protocol::gemini::unwrap_envelope;
use crate::protocol::json_path::JsonPath;
use crate::protocol::mapping::gemini_finish_to_openai;
use crate::protocol::sse::{data_payload, Fragments, SseFragment};
use crate::protocol::state::StreamState;
use crate::protocol::ResponseContext;
use crate::util::unix_now_secs;

/// Convert one upstream Gemini stream line into Chat Completions chunks.
///
/// Accepts `data:` lines as well as bare JSON lines. The chunk carrying a
/// `finishReason` is followed by `data: [DONE]`.
pub fn convert_gemini_stream_to_openai(
    ctx: &ResponseContext<'_>,
    line: &[u8],
    state: &mut StreamState,
) -> Fragments {
    let mut out = Fragments::new();
    let Some(payload) = chunk_payload(line) else {
        return out;
    };
    let Ok(doc) = serde_json::from_slice::<Value>(payload) else {
        return out;
    };
    let root = unwrap_envelope(&doc);
    let Some(candidate) = root.array_at("candidates").first() else {
        return out;
    };

    if state.response_id.is_empty() {
        state.response_id = completion_id(root);
        state.model = root
            .str_at("modelVersion")
            .filter(|model| !model.is_empty())
            .unwrap_or(ctx.model)
            .to_string();
        state.created = unix_now_secs();
    }

    let mut next_tool_index = state.next_tool_index;
    let collected = CandidateContent::collect(candidate, &mut next_tool_index, |short| {
        state.restore_tool_name(short, ctx.original_request, TOOLS_PATH, TOOL_NAME_PATH)
    });
    state.next_tool_index = next_tool_index;
    state.has_tool_call |= collected.has_tool_call();

    let finish = candidate
        .str_at("finishReason")
        .filter(|reason| !reason.is_empty())
        .map(|reason| gemini_finish_to_openai(reason, state.has_tool_call));

    if collected.is_empty() && finish.is_none() && state.role_sent {
        return out;
    }

    let mut delta = Map::new();
    if !state.role_sent {
        delta.insert("role".into(), json!("assistant"));
        state.role_sent = true;
    }
    collected.into_fields(&mut delta, false);

    let mut chunk = json!({
        "id": state.response_id,
        "object": "chat.completion.chunk",
        "created": state.created,
        "model": state.model,
        "choices": [{
            "index": 0,
            "delta": Value::Object(delta),
            "finish_reason": finish,
        }],
    });
    if finish.is_some() {
        if let Some(meta) = root.at("usageMetadata").filter(|meta| meta.is_object()) {
            chunk.set_path("usage", openai_usage(meta));
        }
    }
    out.push(SseFragment::data(chunk.to_string()));
    if finish.is_some() {
        out.push(SseFragment::done());
    }
    out
}

fn chunk_payload(line: &[u8]) -> Option<&[u8]> {
    if line.starts_with(b"data:") {
        return data_payload(line);
    }
    let trimmed = line.trim_ascii();
    trimmed.starts_with(b"{").then_some(trimmed)
}
