//! Gemini `generateContent` response -> `chat.completion`.

use serde_json::{json, Map, Value};

use super::{completion_id, openai_usage, CandidateContent, TOOLS_PATH, TOOL_NAME_PATH};
use crate::protocol::gemini::unwrap_envelope;
use crate::protocol::json_path::{parse_document, JsonPath};
use crate::protocol::mapping::gemini_finish_to_openai;
use crate::protocol::tool_names::reverse_map_for;
use crate::protocol::ResponseContext;
use crate::util::unix_now_secs;

/// Convert a complete Gemini response into a `chat.completion` object.
///
/// Returns `None` when the document carries no `candidates` array. Every
/// candidate becomes one choice.
#[must_use]
pub fn convert_gemini_response_to_openai(ctx: &ResponseContext<'_>, raw: &[u8]) -> Option<String> {
    let doc = parse_document(raw);
    let root = unwrap_envelope(&doc);
    let candidates = root.at("candidates").and_then(Value::as_array)?;
    let names = reverse_map_for(
        &parse_document(ctx.original_request),
        TOOLS_PATH,
        TOOL_NAME_PATH,
    );

    let mut choices = Vec::with_capacity(candidates.len());
    for (position, candidate) in candidates.iter().enumerate() {
        let mut next_tool_index = 0;
        let collected = CandidateContent::collect(candidate, &mut next_tool_index, |short| {
            names.get(short).cloned().unwrap_or_else(|| short.to_string())
        });
        let has_tool_call = collected.has_tool_call();
        let mut message = Map::new();
        message.insert("role".into(), json!("assistant"));
        collected.into_fields(&mut message, true);

        let index = candidate
            .at("index")
            .and_then(Value::as_u64)
            .unwrap_or(position as u64);
        let finish = gemini_finish_to_openai(
            candidate.str_at("finishReason").unwrap_or_default(),
            has_tool_call,
        );
        choices.push(json!({
            "index": index,
            "message": Value::Object(message),
            "finish_reason": finish,
        }));
    }

    let model = root
        .str_at("modelVersion")
        .filter(|model| !model.is_empty())
        .unwrap_or(ctx.model);
    let mut out = json!({
        "id": completion_id(root),
        "object": "chat.completion",
        "created": unix_now_secs(),
        "model": model,
        "choices": choices,
    });
    if let Some(meta) = root.at("usageMetadata").filter(|meta| meta.is_object()) {
        out.set_path("usage", openai_usage(meta));
    }
    serde_json::to_string(&out).ok()
}
