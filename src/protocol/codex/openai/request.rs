//! Chat Completions request -> Codex request.
//!
//! Reads `reasoning_effort`, `messages[].{role,content,tool_calls,tool_call_id}`,
//! `tools[].function.{name,description,parameters,strict}`, `tool_choice`,
//! `response_format` and `text.verbosity`. Writes the shared Codex envelope
//! plus `input[]`, `text.{format,verbosity}`, `tools[]`, `tool_choice` and
//! `store`.

use serde_json::{json, Value};

use super::{TOOLS_PATH, TOOL_NAME_PATH};
use crate::protocol::codex::instructions::instructions_for_model;
use crate::protocol::codex::{finish_request, request_envelope, text_part};
use crate::protocol::json_path::{parse_document, JsonPath};
use crate::protocol::mapping::{
    data_url, file_extension, mime_type_for_extension, DEFAULT_REASONING_EFFORT,
};
use crate::protocol::tool_names::{short_name_map_for, shortened, ToolNameMap};

/// Sampling controls Codex rejects; they are dropped instead of forwarded.
const UNSUPPORTED_CONTROLS: [&str; 5] = [
    "temperature",
    "top_p",
    "top_k",
    "max_tokens",
    "max_completion_tokens",
];

/// Convert a Chat Completions request into a Codex request.
///
/// Never fails: unreadable input produces an envelope with empty `input`.
#[must_use]
pub fn convert_openai_request_to_codex(model: &str, raw: &[u8], stream: bool) -> Vec<u8> {
    let root = parse_document(raw);

    let effort = root
        .str_at("reasoning_effort")
        .unwrap_or(DEFAULT_REASONING_EFFORT);
    let mut out = request_envelope(model, stream, effort, instructions_for_model(model));

    for control in UNSUPPORTED_CONTROLS {
        if root.at(control).is_some() {
            tracing::debug!(control, "dropping sampling control unsupported by codex");
        }
    }

    let names = short_name_map_for(&root, TOOLS_PATH, TOOL_NAME_PATH);

    for message in root.array_at("messages") {
        append_message(&mut out, message, &names);
    }

    map_text_controls(&mut out, &root);
    map_tools(&mut out, &root, &names);
    map_tool_choice(&mut out, &root, &names);

    finish_request(out)
}

fn append_message(out: &mut Value, message: &Value, names: &ToolNameMap) {
    let role = message.str_at("role").unwrap_or_default();

    if role == "tool" {
        out.push_path(
            "input",
            json!({
                "type": "function_call_output",
                "call_id": message.text_at("tool_call_id"),
                "output": tool_output_text(message.at("content")),
            }),
        );
        return;
    }

    let item_role = if role == "system" { "user" } else { role };
    let mut parts: Vec<Value> = Vec::new();
    match message.at("content") {
        Some(Value::String(text)) if !text.is_empty() => parts.push(text_part(role, text)),
        Some(Value::Array(items)) => {
            for item in items {
                if let Some(part) = content_part(role, item) {
                    parts.push(part);
                }
            }
        }
        _ => {}
    }

    if !parts.is_empty() {
        out.push_path(
            "input",
            json!({"type": "message", "role": item_role, "content": parts}),
        );
    }

    if role != "assistant" {
        return;
    }
    for call in message.array_at("tool_calls") {
        if call.str_at("type") != Some("function") {
            continue;
        }
        out.push_path(
            "input",
            json!({
                "type": "function_call",
                "call_id": call.text_at("id"),
                "name": shortened(names, &call.text_at("function.name")),
                "arguments": call.text_at("function.arguments"),
            }),
        );
    }
}

fn content_part(role: &str, item: &Value) -> Option<Value> {
    match item.str_at("type")? {
        "text" => Some(text_part(role, &item.text_at("text"))),
        "image_url" if role == "user" => {
            let mut part = json!({"type": "input_image"});
            if let Some(url) = item.at("image_url.url") {
                part.set_path("image_url", json!(url.text_at("")));
            }
            Some(part)
        }
        "file" if role == "user" => file_part(item),
        other => {
            tracing::debug!(part_type = other, role, "skipping content part codex cannot take");
            None
        }
    }
}

fn file_part(item: &Value) -> Option<Value> {
    if let Some(file_id) = item.str_at("file.file_id") {
        return Some(json!({"type": "input_file", "file_id": file_id}));
    }
    let filename = item.text_at("file.filename");
    let data = item.text_at("file.file_data");
    if data.starts_with("data:") {
        return Some(json!({"type": "input_file", "filename": filename, "file_data": data}));
    }
    let ext = file_extension(&filename).unwrap_or_default();
    let Some(mime) = mime_type_for_extension(ext) else {
        tracing::warn!(extension = ext, "unknown file name extension in user message, skipping");
        return None;
    };
    Some(json!({
        "type": "input_file",
        "filename": filename,
        "file_data": data_url(mime, &data),
    }))
}

fn tool_output_text(content: Option<&Value>) -> String {
    match content {
        Some(Value::Array(parts)) => parts
            .iter()
            .filter(|part| part.str_at("type").map_or(true, |kind| kind == "text"))
            .map(|part| part.text_at("text"))
            .collect(),
        Some(other) => other.text_at(""),
        None => String::new(),
    }
}

fn map_text_controls(out: &mut Value, root: &Value) {
    if let Some(format) = root.at("response_format") {
        out.set_path("text", json!({}));
        match format.str_at("type") {
            Some("text") => out.set_path("text.format.type", json!("text")),
            Some("json_object") => out.set_path("text.format.type", json!("json_object")),
            Some("json_schema") => {
                if let Some(schema) = format.at("json_schema") {
                    out.set_path("text.format.type", json!("json_schema"));
                    for field in ["name", "strict", "schema"] {
                        if let Some(value) = schema.at(field) {
                            out.set_path(&format!("text.format.{field}"), value.clone());
                        }
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(verbosity) = root.at("text.verbosity") {
        out.set_path("text.verbosity", verbosity.clone());
    }
}

fn map_tools(out: &mut Value, root: &Value, names: &ToolNameMap) {
    let tools = root.array_at("tools");
    if tools.is_empty() {
        return;
    }
    out.set_path("tools", json!([]));
    for tool in tools {
        if tool.str_at("type") != Some("function") {
            continue;
        }
        let mut item = json!({"type": "function"});
        if let Some(function) = tool.at("function") {
            if let Some(name) = function.str_at("name") {
                item.set_path("name", json!(shortened(names, name)));
            }
            for field in ["description", "parameters", "strict"] {
                if let Some(value) = function.at(field) {
                    item.set_path(field, value.clone());
                }
            }
        }
        out.push_path("tools", item);
    }
}

fn map_tool_choice(out: &mut Value, root: &Value, names: &ToolNameMap) {
    match root.at("tool_choice") {
        Some(Value::String(choice)) => out.set_path("tool_choice", json!(choice)),
        Some(choice @ Value::Object(_)) => {
            if choice.str_at("type") == Some("function") {
                let name = choice.text_at("function.name");
                out.set_path(
                    "tool_choice",
                    json!({"type": "function", "name": shortened(names, &name)}),
                );
            }
        }
        _ => {}
    }
}
