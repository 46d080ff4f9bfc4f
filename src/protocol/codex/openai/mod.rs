//! Chat Completions client, Codex upstream.

mod request;
mod response;
mod stream;

pub use request::convert_openai_request_to_codex;
pub use response::convert_codex_response_to_openai;
pub use stream::convert_codex_stream_to_openai;

use serde_json::{json, Value};

use crate::protocol::json_path::JsonPath;
use crate::util::unix_now_secs;

/// Where the client request declares its tools and their names.
pub(crate) const TOOLS_PATH: &str = "tools";
pub(crate) const TOOL_NAME_PATH: &str = "function.name";

/// Chat Completions `usage` object for a Responses `usage` object.
pub(crate) fn openai_usage(usage: &Value) -> Value {
    let prompt = usage.i64_at("input_tokens");
    let completion = usage.i64_at("output_tokens");
    let total = match usage.at("total_tokens") {
        Some(_) => usage.i64_at("total_tokens"),
        None => prompt + completion,
    };
    let mut out = json!({
        "prompt_tokens": prompt,
        "completion_tokens": completion,
        "total_tokens": total,
    });
    let cached = usage.i64_at("input_tokens_details.cached_tokens");
    if cached > 0 {
        out.set_path("prompt_tokens_details.cached_tokens", json!(cached));
    }
    let reasoning = usage.i64_at("output_tokens_details.reasoning_tokens");
    if reasoning > 0 {
        out.set_path("completion_tokens_details.reasoning_tokens", json!(reasoning));
    }
    out
}

/// Creation timestamp of a Responses object, or now when absent.
pub(crate) fn created_at(response: &Value) -> u64 {
    u64::try_from(response.i64_at("created_at"))
        .ok()
        .filter(|&secs| secs > 0)
        .unwrap_or_else(unix_now_secs)
}
