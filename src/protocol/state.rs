use rustc_hash::FxHashMap;

use super::json_path::parse_document;
use super::tool_names::{reverse_map_for, ToolNameMap};

/// Which content block is currently open in the client-facing stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseType {
    #[default]
    None,
    Content,
    Thinking,
    Function,
}

/// Per-session state threaded through every stream converter call.
///
/// Created empty by the caller when a streaming response starts, passed by
/// `&mut` with each upstream line in arrival order, and dropped when the
/// session ends. Never shared between sessions.
#[derive(Debug, Default)]
pub struct StreamState {
    pub(crate) has_tool_call: bool,
    pub(crate) open: ResponseType,
    pub(crate) open_index: i64,
    pub(crate) response_id: String,
    pub(crate) model: String,
    pub(crate) created: u64,
    pub(crate) role_sent: bool,
    /// Upstream output index (or call id order) -> client tool-call index.
    pub(crate) tool_slots: FxHashMap<i64, usize>,
    pub(crate) next_tool_index: usize,
    reverse_names: Option<ToolNameMap>,
}

impl StreamState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a tool/function call block was opened during this session.
    #[must_use]
    pub fn has_tool_call(&self) -> bool {
        self.has_tool_call
    }

    /// The block kind currently open, if any.
    #[must_use]
    pub fn open_block(&self) -> ResponseType {
        self.open
    }

    pub(crate) fn open_block_at(&mut self, kind: ResponseType, index: i64) {
        self.open = kind;
        self.open_index = index;
    }

    pub(crate) fn close_block(&mut self) {
        self.open = ResponseType::None;
    }

    /// Client tool-call index for an upstream slot, allocating the next one.
    pub(crate) fn tool_slot(&mut self, upstream: i64) -> usize {
        if let Some(&slot) = self.tool_slots.get(&upstream) {
            return slot;
        }
        let slot = self.next_tool_index;
        self.next_tool_index += 1;
        self.tool_slots.insert(upstream, slot);
        slot
    }

    /// Original tool name for `short`, derived once per session from the
    /// client's original request.
    pub(crate) fn restore_tool_name(
        &mut self,
        short: &str,
        original_request: &[u8],
        tools_path: &str,
        name_path: &str,
    ) -> String {
        let reverse = self.reverse_names.get_or_insert_with(|| {
            reverse_map_for(&parse_document(original_request), tools_path, name_path)
        });
        reverse
            .get(short)
            .cloned()
            .unwrap_or_else(|| short.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_slots_are_stable_and_dense() {
        let mut state = StreamState::new();
        assert_eq!(state.tool_slot(3), 0);
        assert_eq!(state.tool_slot(7), 1);
        assert_eq!(state.tool_slot(3), 0);
        assert_eq!(state.next_tool_index, 2);
    }

    #[test]
    fn test_restore_tool_name_uses_original_request() {
        let long = format!("mcp__fs__{}", "read_file_with_a_really_long_descriptive_name_beyond_limit");
        let original = serde_json::json!({"tools": [{"name": long}]}).to_string();
        let short = crate::protocol::tool_names::shorten_name_if_needed(&long);
        assert_ne!(short, long);

        let mut state = StreamState::new();
        assert_eq!(
            state.restore_tool_name(&short, original.as_bytes(), "tools", "name"),
            long
        );
        assert_eq!(
            state.restore_tool_name("unknown", original.as_bytes(), "tools", "name"),
            "unknown"
        );
    }
}
