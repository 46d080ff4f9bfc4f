//! Chat Completions client, Gemini upstream.

mod request;
mod response;
mod stream;

pub use request::convert_openai_request_to_gemini;
pub use response::convert_gemini_response_to_openai;
pub use stream::convert_gemini_stream_to_openai;

use std::sync::atomic::AtomicU64;

use serde_json::{json, Map, Value};

use crate::protocol::json_path::JsonPath;
use crate::protocol::mapping::data_url;
use crate::util::{next_call_id, next_generated_id};

pub(crate) const TOOLS_PATH: &str = "tools";
pub(crate) const TOOL_NAME_PATH: &str = "function.name";

static COMPLETION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// `chatcmpl-<hex>` id for responses whose upstream carries no `responseId`.
pub(crate) fn completion_id(root: &Value) -> String {
    root.str_at("responseId")
        .filter(|id| !id.is_empty())
        .map_or_else(
            || next_generated_id("chatcmpl-", &COMPLETION_ID_COUNTER),
            |id| format!("chatcmpl-{id}"),
        )
}

/// What one Gemini candidate contributes to an assistant message.
#[derive(Debug, Default)]
pub(crate) struct CandidateContent {
    pub(crate) content: String,
    pub(crate) reasoning: String,
    pub(crate) tool_calls: Vec<Value>,
    pub(crate) images: Vec<Value>,
}

impl CandidateContent {
    /// Walk `candidate.content.parts`, numbering tool calls from
    /// `next_tool_index` and restoring each short function name with `restore`.
    pub(crate) fn collect(
        candidate: &Value,
        next_tool_index: &mut usize,
        mut restore: impl FnMut(&str) -> String,
    ) -> Self {
        let mut out = Self::default();
        for part in candidate.array_at("content.parts") {
            if let Some(call) = part.at("functionCall") {
                let args = call.at("args").map_or_else(|| "{}".to_string(), Value::to_string);
                out.tool_calls.push(json!({
                    "index": *next_tool_index,
                    "id": next_call_id(),
                    "type": "function",
                    "function": {
                        "name": restore(&call.text_at("name")),
                        "arguments": args,
                    },
                }));
                *next_tool_index += 1;
            } else if let Some(inline) = part.at("inlineData") {
                let mime = inline
                    .str_at("mimeType")
                    .or_else(|| inline.str_at("mime_type"))
                    .unwrap_or("image/png");
                let url = data_url(mime, &inline.text_at("data"));
                out.images.push(json!({
                    "type": "image_url",
                    "index": out.images.len(),
                    "image_url": {"url": url},
                }));
            } else if let Some(text) = part.str_at("text") {
                if part.at("thought").and_then(Value::as_bool) == Some(true) {
                    out.reasoning.push_str(text);
                } else {
                    out.content.push_str(text);
                }
            }
        }
        out
    }

    pub(crate) fn has_tool_call(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.content.is_empty()
            && self.reasoning.is_empty()
            && self.tool_calls.is_empty()
            && self.images.is_empty()
    }

    /// Fields of a stream `delta` or a complete `message`. `content` is
    /// written as `null` only when `null_content` is set and no text arrived.
    pub(crate) fn into_fields(self, fields: &mut Map<String, Value>, null_content: bool) {
        if !self.content.is_empty() {
            fields.insert("content".into(), json!(self.content));
        } else if null_content {
            fields.insert("content".into(), Value::Null);
        }
        if !self.reasoning.is_empty() {
            fields.insert("reasoning_content".into(), json!(self.reasoning));
        }
        if !self.tool_calls.is_empty() {
            fields.insert("tool_calls".into(), Value::Array(self.tool_calls));
        }
        if !self.images.is_empty() {
            fields.insert("images".into(), Value::Array(self.images));
        }
    }
}

/// Chat Completions `usage` object for a Gemini `usageMetadata` object.
pub(crate) fn openai_usage(meta: &Value) -> Value {
    let prompt = meta.i64_at("promptTokenCount");
    let thoughts = meta.i64_at("thoughtsTokenCount");
    let completion = meta.i64_at("candidatesTokenCount") + thoughts;
    let total = match meta.at("totalTokenCount") {
        Some(_) => meta.i64_at("totalTokenCount"),
        None => prompt + completion,
    };
    let mut usage = json!({
        "prompt_tokens": prompt,
        "completion_tokens": completion,
        "total_tokens": total,
    });
    if thoughts > 0 {
        usage.set_path("completion_tokens_details.reasoning_tokens", json!(thoughts));
    }
    let cached = meta.i64_at("cachedContentTokenCount");
    if cached > 0 {
        usage.set_path("prompt_tokens_details.cached_tokens", json!(cached));
    }
    usage
}
