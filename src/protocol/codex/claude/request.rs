//! Messages request -> Codex request.
//!
//! Reads `system`, `messages[].{role,content}` (blocks `text`, `image`,
//! `tool_use`, `tool_result`, `thinking`), `tools[].{name,description,input_schema}`,
//! `tool_choice` and `thinking.{type,budget_tokens}`. Writes the shared Codex
//! envelope plus `input[]`, `tools[]`, `tool_choice` and `store`.

use serde_json::{json, Value};

use super::{TOOLS_PATH, TOOL_NAME_PATH};
use crate::protocol::codex::instructions::{instructions_for_model, is_official_instructions};
use crate::protocol::codex::{finish_request, request_envelope, text_part};
use crate::protocol::json_path::{parse_document, JsonPath};
use crate::protocol::mapping::{data_url, effort_for_thinking_budget, DEFAULT_REASONING_EFFORT};
use crate::protocol::tool_names::{short_name_map_for, shortened, ToolNameMap};

/// Convert a Messages request into a Codex request.
#[must_use]
pub fn convert_claude_request_to_codex(model: &str, raw: &[u8], stream: bool) -> Vec<u8> {
    let root = parse_document(raw);

    let effort = match root.str_at("thinking.type") {
        Some("enabled") if root.at("thinking.budget_tokens").is_some() => {
            effort_for_thinking_budget(root.i64_at("thinking.budget_tokens"))
        }
        _ => DEFAULT_REASONING_EFFORT,
    };

    let system = system_texts(&root);
    let joined = system.join("\n");
    let official = is_official_instructions(&joined);
    let instructions = if official {
        joined.as_str()
    } else {
        instructions_for_model(model)
    };
    let mut out = request_envelope(model, stream, effort, instructions);

    if !system.is_empty() && !official {
        let parts: Vec<Value> = system.iter().map(|text| text_part("user", text)).collect();
        out.push_path(
            "input",
            json!({"type": "message", "role": "user", "content": parts}),
        );
    }

    let names = short_name_map_for(&root, TOOLS_PATH, TOOL_NAME_PATH);
    for message in root.array_at("messages") {
        append_message(&mut out, message, &names);
    }

    map_tools(&mut out, &root, &names);
    map_tool_choice(&mut out, &root, &names);

    finish_request(out)
}

fn system_texts(root: &Value) -> Vec<String> {
    match root.at("system") {
        Some(Value::String(text)) if !text.is_empty() => vec![text.clone()],
        Some(Value::Array(blocks)) => blocks
            .iter()
            .filter(|block| block.str_at("type") == Some("text"))
            .map(|block| block.text_at("text"))
            .filter(|text| !text.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Accumulates the typed parts of one Codex message item; tool blocks flush
/// it so calls and results keep their position in the transcript.
struct PendingMessage<'a> {
    role: &'a str,
    parts: Vec<Value>,
}

impl PendingMessage<'_> {
    fn flush(&mut self, out: &mut Value) {
        if self.parts.is_empty() {
            return;
        }
        let parts = std::mem::take(&mut self.parts);
        out.push_path(
            "input",
            json!({"type": "message", "role": self.role, "content": parts}),
        );
    }
}

fn append_message(out: &mut Value, message: &Value, names: &ToolNameMap) {
    let role = message.str_at("role").unwrap_or("user");
    let mut pending = PendingMessage {
        role,
        parts: Vec::new(),
    };

    match message.at("content") {
        Some(Value::String(text)) if !text.is_empty() => {
            pending.parts.push(text_part(role, text));
        }
        Some(Value::Array(blocks)) => {
            for block in blocks {
                match block.str_at("type").unwrap_or_default() {
                    "text" => {
                        let text = block.text_at("text");
                        if !text.is_empty() {
                            pending.parts.push(text_part(role, &text));
                        }
                    }
                    "image" if role == "user" => {
                        if let Some(url) = image_url(block) {
                            pending
                                .parts
                                .push(json!({"type": "input_image", "image_url": url}));
                        }
                    }
                    "tool_use" => {
                        pending.flush(out);
                        let arguments = block
                            .at("input")
                            .map_or_else(|| "{}".to_string(), |input| input.to_string());
                        out.push_path(
                            "input",
                            json!({
                                "type": "function_call",
                                "call_id": block.text_at("id"),
                                "name": shortened(names, &block.text_at("name")),
                                "arguments": arguments,
                            }),
                        );
                    }
                    "tool_result" => {
                        pending.flush(out);
                        out.push_path(
                            "input",
                            json!({
                                "type": "function_call_output",
                                "call_id": block.text_at("tool_use_id"),
                                "output": tool_result_text(block.at("content")),
                            }),
                        );
                    }
                    other => {
                        tracing::debug!(block_type = other, role, "skipping content block codex cannot take");
                    }
                }
            }
        }
        _ => {}
    }
    pending.flush(out);
}

fn image_url(block: &Value) -> Option<String> {
    match block.str_at("source.type")? {
        "base64" => Some(data_url(
            block.str_at("source.media_type").unwrap_or("image/png"),
            &block.text_at("source.data"),
        )),
        "url" => block.str_at("source.url").map(str::to_string),
        _ => None,
    }
}

fn tool_result_text(content: Option<&Value>) -> String {
    match content {
        Some(Value::Array(blocks)) => blocks
            .iter()
            .filter(|block| block.str_at("type") == Some("text"))
            .map(|block| block.text_at("text"))
            .collect(),
        Some(other) => other.text_at(""),
        None => String::new(),
    }
}

fn map_tools(out: &mut Value, root: &Value, names: &ToolNameMap) {
    let tools = root.array_at("tools");
    if tools.is_empty() {
        return;
    }
    out.set_path("tools", json!([]));
    for tool in tools {
        if tool
            .str_at("type")
            .is_some_and(|kind| kind.starts_with("web_search"))
        {
            out.push_path("tools", json!({"type": "web_search"}));
            continue;
        }
        let Some(name) = tool.str_at("name").filter(|name| !name.is_empty()) else {
            continue;
        };
        let mut item = json!({"type": "function", "name": shortened(names, name)});
        if let Some(description) = tool.at("description") {
            item.set_path("description", description.clone());
        }
        if let Some(schema) = tool.at("input_schema") {
            let mut schema = schema.clone();
            schema.delete_path("$schema");
            item.set_path("parameters", schema);
        }
        item.set_path("strict", json!(false));
        out.push_path("tools", item);
    }
}

fn map_tool_choice(out: &mut Value, root: &Value, names: &ToolNameMap) {
    let Some(choice) = root.at("tool_choice") else {
        return;
    };
    let mapped = match choice.str_at("type") {
        Some("auto") => json!("auto"),
        Some("any") => json!("required"),
        Some("none") => json!("none"),
        Some("tool") => json!({
            "type": "function",
            "name": shortened(names, &choice.text_at("name")),
        }),
        _ => return,
    };
    out.set_path("tool_choice", mapped);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codex::instructions::instructions_for_model;

    fn convert(request: &Value) -> Value {
        let raw = serde_json::to_vec(request).expect("serialize");
        let out = convert_claude_request_to_codex("gpt-5", &raw, true);
        serde_json::from_slice(&out).expect("valid json")
    }

    #[test]
    fn test_system_becomes_leading_user_message() {
        let out = convert(&json!({
            "system": [{"type": "text", "text": "be terse"}],
            "messages": [{"role": "user", "content": "hi"}]
        }));
        assert_eq!(out["instructions"], json!(instructions_for_model("gpt-5")));
        assert_eq!(
            out["input"],
            json!([
                {"type": "message", "role": "user", "content": [{"type": "input_text", "text": "be terse"}]},
                {"type": "message", "role": "user", "content": [{"type": "input_text", "text": "hi"}]}
            ])
        );
        assert_eq!(out["store"], json!(false));
    }

    #[test]
    fn test_official_system_forwarded_as_instructions() {
        let system = format!("{}\nrepo notes", instructions_for_model("gpt-5"));
        let out = convert(&json!({"system": system, "messages": []}));
        assert_eq!(out["instructions"], json!(system));
        assert_eq!(out["input"], json!([]));
    }

    #[test]
    fn test_thinking_budget_to_effort() {
        let out = convert(&json!({"thinking": {"type": "enabled", "budget_tokens": 20000}, "messages": []}));
        assert_eq!(out["reasoning"]["effort"], json!("high"));
        let out = convert(&json!({"thinking": {"type": "disabled"}, "messages": []}));
        assert_eq!(out["reasoning"]["effort"], json!("low"));
    }

    #[test]
    fn test_tool_blocks_keep_transcript_order() {
        let out = convert(&json!({
            "messages": [
                {"role": "assistant", "content": [
                    {"type": "text", "text": "checking"},
                    {"type": "tool_use", "id": "toolu_1", "name": "search", "input": {"q": "rust"}},
                    {"type": "thinking", "thinking": "hidden"}
                ]},
                {"role": "user", "content": [
                    {"type": "tool_result", "tool_use_id": "toolu_1", "content": [{"type": "text", "text": "found"}]},
                    {"type": "text", "text": "thanks"},
                    {"type": "image", "source": {"type": "base64", "media_type": "image/jpeg", "data": "QUJD"}}
                ]}
            ]
        }));
        assert_eq!(
            out["input"],
            json!([
                {"type": "message", "role": "assistant", "content": [{"type": "output_text", "text": "checking"}]},
                {"type": "function_call", "call_id": "toolu_1", "name": "search", "arguments": "{\"q\":\"rust\"}"},
                {"type": "function_call_output", "call_id": "toolu_1", "output": "found"},
                {"type": "message", "role": "user", "content": [
                    {"type": "input_text", "text": "thanks"},
                    {"type": "input_image", "image_url": "data:image/jpeg;base64,QUJD"}
                ]}
            ])
        );
    }

    #[test]
    fn test_tools_and_choice() {
        let long = format!("mcp__browser__{}", "navigate_".repeat(8));
        let out = convert(&json!({
            "messages": [],
            "tools": [
                {"name": long, "description": "go", "input_schema": {"$schema": "http://json-schema.org/draft-07/schema#", "type": "object"}},
                {"type": "web_search_20250305", "name": "web_search"}
            ],
            "tool_choice": {"type": "tool", "name": long}
        }));
        let name = out["tools"][0]["name"].as_str().expect("name");
        assert!(name.len() <= 64);
        assert_eq!(out["tools"][0]["parameters"], json!({"type": "object"}));
        assert_eq!(out["tools"][1], json!({"type": "web_search"}));
        assert_eq!(out["tool_choice"], json!({"type": "function", "name": name}));

        let any = convert(&json!({"messages": [], "tool_choice": {"type": "any"}}));
        assert_eq!(any["tool_choice"], json!("required"));
    }
}
