//! Chat Completions request -> Gemini `generateContent` request.
//!
//! Reads `reasoning_effort`, `temperature`, `top_p`, `top_k`, `max_tokens`,
//! `max_completion_tokens`, `stop`, `n`, `modalities`, `image_config`,
//! `response_format`, `messages[]`, `tools[]` and `tool_choice`. Writes
//! `contents[]`, `generationConfig.*`, `model`, `system_instruction`,
//! `tools[0].functionDeclarations[]` and `toolConfig`.

use rustc_hash::FxHashMap;
use serde_json::{json, Value};

use super::{TOOLS_PATH, TOOL_NAME_PATH};
use crate::protocol::json_path::{parse_document, rename_key, JsonPath};
use crate::protocol::mapping::{
    file_extension, mime_type_for_extension, parse_data_url, thinking_budget_for_effort,
};
use crate::protocol::tool_names::{short_name_map_for, shortened, ToolNameMap};

/// Convert a Chat Completions request into a Gemini request.
#[must_use]
pub fn convert_openai_request_to_gemini(model: &str, raw: &[u8], _stream: bool) -> Vec<u8> {
    let root = parse_document(raw);
    let mut out = json!({
        "contents": [],
        "generationConfig": {"thinkingConfig": {"include_thoughts": true}},
    });
    out.set_path("model", json!(model));

    map_generation_config(&mut out, &root);

    let names = short_name_map_for(&root, TOOLS_PATH, TOOL_NAME_PATH);
    map_messages(&mut out, root.array_at("messages"), &names);
    map_tools(&mut out, &root, &names);
    map_tool_choice(&mut out, &root, &names);

    serde_json::to_vec(&out).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Generation controls
// ---------------------------------------------------------------------------

fn map_generation_config(out: &mut Value, root: &Value) {
    match root.at("reasoning_effort").map(|effort| effort.text_at("")) {
        Some(effort) if effort == "none" => {
            out.delete_path("generationConfig.thinkingConfig.include_thoughts");
            out.set_path("generationConfig.thinkingConfig.thinkingBudget", json!(0));
        }
        Some(effort) => out.set_path(
            "generationConfig.thinkingConfig.thinkingBudget",
            json!(thinking_budget_for_effort(&effort)),
        ),
        None => out.set_path("generationConfig.thinkingConfig.thinkingBudget", json!(-1)),
    }

    for (from, to) in [
        ("temperature", "temperature"),
        ("top_p", "topP"),
        ("top_k", "topK"),
        ("max_tokens", "maxOutputTokens"),
        ("max_completion_tokens", "maxOutputTokens"),
        ("n", "candidateCount"),
    ] {
        if let Some(value) = root.at(from).filter(|value| value.is_number()) {
            out.set_path(&format!("generationConfig.{to}"), value.clone());
        }
    }

    match root.at("stop") {
        Some(Value::String(stop)) => {
            out.set_path("generationConfig.stopSequences", json!([stop]));
        }
        Some(Value::Array(stops)) if !stops.is_empty() => {
            out.set_path("generationConfig.stopSequences", Value::Array(stops.clone()));
        }
        _ => {}
    }

    let modalities: Vec<&str> = root
        .array_at("modalities")
        .iter()
        .filter_map(|modality| match modality.text_at("").to_ascii_lowercase().as_str() {
            "text" => Some("TEXT"),
            "image" => Some("IMAGE"),
            _ => None,
        })
        .collect();
    if !modalities.is_empty() {
        out.set_path("generationConfig.responseModalities", json!(modalities));
    }

    if let Some(ratio) = root.str_at("image_config.aspect_ratio") {
        out.set_path("generationConfig.imageConfig.aspectRatio", json!(ratio));
    }

    match root.str_at("response_format.type") {
        Some("json_object") => {
            out.set_path("generationConfig.responseMimeType", json!("application/json"));
        }
        Some("json_schema") => {
            out.set_path("generationConfig.responseMimeType", json!("application/json"));
            if let Some(schema) = root.at("response_format.json_schema.schema") {
                out.set_path("generationConfig.responseJsonSchema", schema.clone());
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

fn map_messages(out: &mut Value, messages: &[Value], names: &ToolNameMap) {
    // Call id -> original function name, from every assistant turn.
    let mut call_names: FxHashMap<String, String> = FxHashMap::default();
    for message in messages {
        if message.str_at("role") != Some("assistant") {
            continue;
        }
        for call in message.array_at("tool_calls") {
            let id = call.text_at("id");
            let name = call.text_at("function.name");
            if call.str_at("type") == Some("function") && !id.is_empty() && !name.is_empty() {
                call_names.insert(id, name);
            }
        }
    }

    let mut tool_responses: FxHashMap<String, String> = FxHashMap::default();
    for message in messages {
        if message.str_at("role") != Some("tool") {
            continue;
        }
        let id = message.text_at("tool_call_id");
        if id.is_empty() {
            continue;
        }
        match message.at("content") {
            Some(Value::String(text)) => {
                tool_responses.insert(id, text.clone());
            }
            Some(Value::Array(parts)) => {
                let text: String = parts
                    .iter()
                    .filter(|part| part.str_at("type") == Some("text"))
                    .map(|part| part.text_at("text"))
                    .collect();
                tool_responses.insert(id, text);
            }
            Some(part) if part.str_at("type") == Some("text") => {
                tool_responses.insert(id, part.text_at("text"));
            }
            _ => {}
        }
    }

    let lone = messages.len() == 1;
    for message in messages {
        let role = message.str_at("role").unwrap_or_default();
        match role {
            "system" if !lone => {
                if let Some(text) = system_text(message.at("content")) {
                    out.set_path("system_instruction.role", json!("user"));
                    out.push_path("system_instruction.parts", json!({"text": text}));
                }
            }
            "user" | "system" => {
                let parts = content_parts(message.at("content"), true);
                out.push_path("contents", json!({"role": "user", "parts": parts}));
            }
            "assistant" => {
                let mut parts = content_parts(message.at("content"), false);
                let mut call_ids = Vec::new();
                for call in message.array_at("tool_calls") {
                    if call.str_at("type") != Some("function") {
                        continue;
                    }
                    let name = shortened(names, &call.text_at("function.name"));
                    parts.push(json!({"functionCall": {
                        "name": name,
                        "args": parse_arguments(&call.text_at("function.arguments")),
                    }}));
                    if let Some(id) = call.str_at("id").filter(|id| !id.is_empty()) {
                        call_ids.push(id);
                    }
                }
                if !parts.is_empty() {
                    out.push_path("contents", json!({"role": "model", "parts": parts}));
                }

                let responses: Vec<Value> = call_ids
                    .into_iter()
                    .filter_map(|id| {
                        let name = call_names.get(id)?;
                        let body = tool_responses.get(id).map_or("", String::as_str);
                        Some(function_response(&shortened(names, name), body))
                    })
                    .collect();
                if !responses.is_empty() {
                    out.push_path("contents", json!({"role": "function", "parts": responses}));
                }
            }
            "tool" => {
                let id = message.text_at("tool_call_id");
                if call_names.contains_key(&id) {
                    continue;
                }
                tracing::debug!(tool_call_id = %id, "tool result without a matching call, naming it by call id");
                let body = tool_responses.get(&id).map_or("", String::as_str);
                out.push_path(
                    "contents",
                    json!({"role": "function", "parts": [function_response(&id, body)]}),
                );
            }
            _ => {}
        }
    }
}

fn system_text(content: Option<&Value>) -> Option<String> {
    match content? {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let text: String = parts
                .iter()
                .filter(|part| part.str_at("type") == Some("text"))
                .map(|part| part.text_at("text"))
                .collect();
            (!text.is_empty()).then_some(text)
        }
        part if part.str_at("type") == Some("text") => Some(part.text_at("text")),
        _ => None,
    }
}

fn content_parts(content: Option<&Value>, from_user: bool) -> Vec<Value> {
    match content {
        Some(Value::String(text)) => vec![json!({"text": text})],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item.str_at("type")? {
                "text" => Some(json!({"text": item.text_at("text")})),
                "image_url" => image_part(&item.text_at("image_url.url"), from_user),
                "file" if from_user => file_part(item),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn image_part(url: &str, from_user: bool) -> Option<Value> {
    if let Some((mime, data)) = parse_data_url(url) {
        return Some(json!({"inlineData": {"mime_type": mime, "data": data}}));
    }
    if !from_user || !(url.starts_with("https://") || url.starts_with("http://")) {
        return None;
    }
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let filename = path.rsplit('/').next().unwrap_or_default();
    let mime = file_extension(filename).and_then(mime_type_for_extension)?;
    Some(json!({"fileData": {"mimeType": mime, "fileUri": url}}))
}

fn file_part(item: &Value) -> Option<Value> {
    let filename = item.text_at("file.filename");
    let ext = file_extension(&filename).unwrap_or_default();
    let Some(mime) = mime_type_for_extension(ext) else {
        tracing::warn!(extension = ext, "unknown file name extension in user message, skipping");
        return None;
    };
    Some(json!({"inlineData": {"mime_type": mime, "data": item.text_at("file.file_data")}}))
}

fn parse_arguments(arguments: &str) -> Value {
    match serde_json::from_str::<Value>(arguments) {
        Ok(value @ Value::Object(_)) => value,
        _ => {
            if !arguments.trim().is_empty() {
                tracing::warn!(arguments, "unparsable tool call arguments, sending empty args");
            }
            json!({})
        }
    }
}

/// `functionResponse` part; JSON object/array bodies are embedded as-is,
/// anything else is sent as a string.
fn function_response(name: &str, body: &str) -> Value {
    let body = body.trim();
    let result = if body.is_empty() {
        json!({})
    } else if body.starts_with(['{', '[']) {
        serde_json::from_str(body).unwrap_or_else(|_| json!(body))
    } else {
        json!(body)
    };
    json!({"functionResponse": {"name": name, "response": {"result": result}}})
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

fn map_tools(out: &mut Value, root: &Value, names: &ToolNameMap) {
    let tools = root.array_at("tools");
    if tools.is_empty() {
        return;
    }
    out.set_path("tools", json!([{"functionDeclarations": []}]));
    for tool in tools {
        if tool.str_at("type") != Some("function") {
            continue;
        }
        let Some(function) = tool.at("function").filter(|f| f.is_object()) else {
            continue;
        };
        let mut declaration = function.clone();
        rename_key(&mut declaration, "parameters", "parametersJsonSchema");
        declaration.delete_path("strict");
        if let Some(name) = function.str_at("name") {
            declaration.set_path("name", json!(shortened(names, name)));
        }
        out.push_path("tools.0.functionDeclarations", declaration);
    }
}

fn map_tool_choice(out: &mut Value, root: &Value, names: &ToolNameMap) {
    let mode = match root.at("tool_choice") {
        Some(Value::String(choice)) => match choice.as_str() {
            "none" => "NONE",
            "auto" => "AUTO",
            "required" => "ANY",
            _ => return,
        },
        Some(choice) if choice.str_at("type") == Some("function") => {
            let name = shortened(names, &choice.text_at("function.name"));
            out.set_path(
                "toolConfig.functionCallingConfig.allowedFunctionNames",
                json!([name]),
            );
            "ANY"
        }
        _ => return,
    };
    out.set_path("toolConfig.functionCallingConfig.mode", json!(mode));
}
