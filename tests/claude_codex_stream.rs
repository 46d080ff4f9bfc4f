use chatwire::protocol::sse::lines;
use chatwire::{render, Format, ResponseContext, StreamState, TranslatorRegistry};
use serde_json::{json, Value};

fn upstream_line(event: &Value) -> String {
    format!("data: {event}")
}

/// Feed every event through the claude <- codex stream converter and collect
/// `(event name, data)` pairs in emission order.
fn run(original: &[u8], events: &[Value]) -> Vec<(String, Value)> {
    let registry = TranslatorRegistry::with_defaults();
    let translator = registry
        .lookup(Format::Claude, Format::Codex)
        .expect("claude->codex registered");
    let ctx = ResponseContext::new("gpt-5", original, b"{}");
    let mut state = StreamState::new();

    let mut out = Vec::new();
    for event in events {
        let line = upstream_line(event);
        for fragment in translator.translate_stream(&ctx, line.as_bytes(), &mut state) {
            let name = fragment.event.expect("messages events are named").to_string();
            let data: Value = serde_json::from_str(&fragment.data).expect("event data is json");
            assert_eq!(data["type"], json!(name), "event name matches data type");
            out.push((name, data));
        }
    }
    out
}

fn text_session(extra: Vec<Value>) -> Vec<Value> {
    let mut events = vec![
        json!({"type": "response.created", "response": {"id": "resp_abc", "model": "gpt-5"}}),
        json!({"type": "response.content_part.added", "output_index": 0, "content_index": 0}),
        json!({"type": "response.output_text.delta", "output_index": 0, "delta": "Hi"}),
        json!({"type": "response.content_part.done", "output_index": 0, "content_index": 0}),
    ];
    events.extend(extra);
    events.push(json!({
        "type": "response.completed",
        "response": {"id": "resp_abc", "status": "completed", "usage": {"input_tokens": 11, "output_tokens": 2}}
    }));
    events
}

#[test]
fn text_session_produces_messages_event_sequence() {
    let out = run(b"{}", &text_session(Vec::new()));
    let names: Vec<&str> = out.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "message_start",
            "content_block_start",
            "content_block_delta",
            "content_block_stop",
            "message_delta",
            "message_stop"
        ]
    );
    assert_eq!(out[0].1["message"]["id"], json!("resp_abc"));
    assert_eq!(out[0].1["message"]["model"], json!("gpt-5"));
    assert_eq!(out[1].1["content_block"], json!({"type": "text", "text": ""}));
    assert_eq!(out[2].1["delta"], json!({"type": "text_delta", "text": "Hi"}));
    assert_eq!(out[4].1["delta"]["stop_reason"], json!("end_turn"));
    assert_eq!(out[4].1["usage"], json!({"input_tokens": 11, "output_tokens": 2}));
}

#[test]
fn function_call_sets_tool_use_stop_reason() {
    let out = run(
        b"{}",
        &text_session(vec![
            json!({"type": "response.output_item.added", "output_index": 1, "item": {"type": "function_call", "call_id": "call_7", "name": "read_file", "arguments": ""}}),
            json!({"type": "response.function_call_arguments.delta", "output_index": 1, "delta": "{\"path\":"}),
            json!({"type": "response.function_call_arguments.delta", "output_index": 1, "delta": "\"a.txt\"}"}),
            json!({"type": "response.output_item.done", "output_index": 1, "item": {"type": "function_call"}}),
        ]),
    );

    let tool_start = out
        .iter()
        .find(|(_, data)| data["content_block"]["type"] == json!("tool_use"))
        .expect("tool_use block");
    assert_eq!(tool_start.1["index"], json!(1));
    assert_eq!(tool_start.1["content_block"]["id"], json!("call_7"));
    assert_eq!(tool_start.1["content_block"]["name"], json!("read_file"));

    let partials: String = out
        .iter()
        .filter(|(_, data)| data["delta"]["type"] == json!("input_json_delta"))
        .map(|(_, data)| data["delta"]["partial_json"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(partials, "{\"path\":\"a.txt\"}");

    let (_, message_delta) = out
        .iter()
        .find(|(name, _)| name == "message_delta")
        .expect("message_delta");
    assert_eq!(message_delta["delta"]["stop_reason"], json!("tool_use"));
    assert_eq!(out.last().map(|(name, _)| name.as_str()), Some("message_stop"));
}

#[test]
fn tool_start_is_followed_by_empty_input_delta() {
    let out = run(
        b"{}",
        &[json!({"type": "response.output_item.added", "output_index": 0, "item": {"type": "function_call", "call_id": "c", "name": "f"}})],
    );
    assert_eq!(out.len(), 2);
    assert_eq!(out[1].1["delta"], json!({"type": "input_json_delta", "partial_json": ""}));
    assert_eq!(out[1].1["index"], json!(0));
}

#[test]
fn wire_output_matches_messages_grammar() {
    let body = [
        r#"data: {"type":"response.created","response":{"id":"resp_1","model":"gpt-5"}}"#,
        "",
        r#"data: {"type":"response.content_part.added","output_index":0}"#,
        "",
        r#"data: {"type":"response.output_text.delta","output_index":0,"delta":"a\"b"}"#,
        "",
    ]
    .join("\r\n");

    let registry = TranslatorRegistry::with_defaults();
    let translator = registry.lookup(Format::Claude, Format::Codex).expect("registered");
    let ctx = ResponseContext::new("gpt-5", b"{}", b"{}");
    let mut state = StreamState::new();
    let mut fragments = Vec::new();
    for line in lines(body.as_bytes()) {
        fragments.extend(translator.translate_stream(&ctx, line, &mut state));
    }

    let wire = render(&fragments);
    assert!(wire.starts_with("event: message_start\ndata: {\"type\":\"message_start\""));
    assert!(wire.ends_with(
        "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"a\\\"b\"}}\n\n"
    ));
    assert_eq!(wire.matches("\n\n").count(), 3);
}

#[test]
fn unknown_and_malformed_lines_yield_nothing() {
    let out = run(
        b"{}",
        &[
            json!({"type": "response.in_progress"}),
            json!({"type": "response.output_item.added", "output_index": 0, "item": {"type": "message"}}),
            json!({"no_type": true}),
        ],
    );
    assert!(out.is_empty());
}

#[test]
fn sessions_do_not_share_state() {
    let registry = TranslatorRegistry::with_defaults();
    let translator = registry.lookup(Format::Claude, Format::Codex).expect("registered");
    let ctx = ResponseContext::new("gpt-5", b"{}", b"{}");

    let mut with_tool = StreamState::new();
    let added = upstream_line(&json!({"type": "response.output_item.added", "output_index": 0, "item": {"type": "function_call", "call_id": "c", "name": "f"}}));
    translator.translate_stream(&ctx, added.as_bytes(), &mut with_tool);
    assert!(with_tool.has_tool_call());

    let mut plain = StreamState::new();
    let done = upstream_line(&json!({"type": "response.completed", "response": {"status": "completed"}}));
    let out = translator.translate_stream(&ctx, done.as_bytes(), &mut plain);
    let delta: Value = serde_json::from_str(&out[0].data).expect("json");
    assert_eq!(delta["delta"]["stop_reason"], json!("end_turn"));
}
