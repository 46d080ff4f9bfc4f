//! Converters whose upstream speaks Gemini `generateContent`.

pub mod openai;

use serde_json::Value;

use super::json_path::JsonPath;

/// The generateContent payload of an upstream document: the `response`
/// object of an envelope, or the document itself.
pub(crate) fn unwrap_envelope(doc: &Value) -> &Value {
    doc.at("response")
        .filter(|inner| inner.is_object())
        .unwrap_or(doc)
}
