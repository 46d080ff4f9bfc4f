// ---------------------------------------------------------------------------
// Reasoning controls
// ---------------------------------------------------------------------------

/// Reasoning effort sent upstream when the client did not ask for one.
pub const DEFAULT_REASONING_EFFORT: &str = "low";

/// Gemini `thinkingBudget` for an OpenAI `reasoning_effort` level.
///
/// `-1` lets the model decide; `none` disables thinking entirely.
#[must_use]
pub fn thinking_budget_for_effort(effort: &str) -> i64 {
    match effort {
        "none" => 0,
        "low" => 1024,
        "medium" => 8192,
        "high" => 24576,
        _ => -1,
    }
}

/// Responses `reasoning.effort` for a Messages `thinking.budget_tokens`.
#[must_use]
pub fn effort_for_thinking_budget(budget: i64) -> &'static str {
    match budget {
        i64::MIN..=-1 => "medium",
        0..=1024 => "low",
        1025..=8192 => "medium",
        _ => "high",
    }
}

// ---------------------------------------------------------------------------
// Stop reasons
// ---------------------------------------------------------------------------

/// Chat Completions `finish_reason` for a Gemini `finishReason`.
#[must_use]
pub fn gemini_finish_to_openai(reason: &str, has_tool_call: bool) -> &'static str {
    match reason {
        "MAX_TOKENS" => "length",
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" => "content_filter",
        _ if has_tool_call => "tool_calls",
        _ => "stop",
    }
}

/// Messages `stop_reason` for a Responses terminal status.
#[must_use]
pub fn codex_status_to_claude_stop(
    status: &str,
    incomplete_reason: &str,
    has_tool_call: bool,
) -> &'static str {
    if status == "incomplete" && incomplete_reason == "max_output_tokens" {
        "max_tokens"
    } else if has_tool_call {
        "tool_use"
    } else {
        "end_turn"
    }
}

/// Chat Completions `finish_reason` for a Responses terminal status.
#[must_use]
pub fn codex_status_to_openai_finish(
    status: &str,
    incomplete_reason: &str,
    has_tool_call: bool,
) -> &'static str {
    if status == "incomplete" {
        match incomplete_reason {
            "content_filter" => "content_filter",
            _ => "length",
        }
    } else if has_tool_call {
        "tool_calls"
    } else {
        "stop"
    }
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

/// MIME type for a lower-case filename extension, if the attachment kind is
/// one upstreams accept inline.
#[must_use]
pub fn mime_type_for_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "xml" => "text/xml",
        "rtf" => "text/rtf",
        "js" => "application/x-javascript",
        "py" => "application/x-python",
        "json" => "application/json",
        "mp3" => "audio/mp3",
        "wav" => "audio/wav",
        "aac" => "audio/aac",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "mp4" => "video/mp4",
        "mpeg" | "mpg" => "video/mpeg",
        "mov" => "video/mov",
        "avi" => "video/avi",
        "webm" => "video/webm",
        _ => return None,
    };
    Some(mime)
}

/// Extension of `filename` (text after the last `.`), if any.
#[must_use]
pub fn file_extension(filename: &str) -> Option<&str> {
    let (stem, ext) = filename.rsplit_once('.')?;
    (!stem.is_empty() || !ext.is_empty()).then_some(ext)
}

/// Split a `data:<mime>;base64,<payload>` URL into MIME type and payload.
#[must_use]
pub fn parse_data_url(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("data:")?;
    let (meta, data) = rest.split_once(',')?;
    let mime = meta.split(';').next().unwrap_or_default();
    if mime.is_empty() || data.is_empty() {
        return None;
    }
    Some((mime, data))
}

/// Build a base64 data URL.
#[must_use]
pub fn data_url(mime: &str, data: &str) -> String {
    format!("data:{mime};base64,{data}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
