//! Messages client, Codex upstream.

mod request;
mod response;
mod stream;

pub use request::convert_claude_request_to_codex;
pub use response::convert_codex_response_to_claude;
pub use stream::convert_codex_stream_to_claude;

use serde_json::Value;

use crate::protocol::json_path::JsonPath;

/// Messages tools carry their name at the top level of each entry.
pub(crate) const TOOLS_PATH: &str = "tools";
pub(crate) const TOOL_NAME_PATH: &str = "name";

/// Token-count reply body in the Messages dialect.
#[must_use]
pub fn claude_token_count(count: u64) -> String {
    format!(r#"{{"input_tokens":{count}}}"#)
}

/// `(input, output, cache read)` token counts of a Responses `usage` object.
pub(crate) fn usage_counts(usage: Option<&Value>) -> (i64, i64, i64) {
    match usage {
        Some(usage) => (
            usage.i64_at("input_tokens"),
            usage.i64_at("output_tokens"),
            usage.i64_at("input_tokens_details.cached_tokens"),
        ),
        None => (0, 0, 0),
    }
}
