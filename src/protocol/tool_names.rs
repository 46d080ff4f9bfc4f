//! Deterministic shortening of tool/function names to the provider limit.
//!
//! Upstreams reject function names longer than [`TOOL_NAME_LIMIT`]. Long MCP
//! names (`mcp__<server>__<tool>`) keep their prefix and final segment; other
//! names are truncated. Collisions inside one request are resolved with `~1`,
//! `~2`, ... suffixes. The mapping is a pure function of the ordered input
//! names, so the response path can invert it by recomputing it over the
//! original request instead of storing it.
//!
//! Lengths are measured in bytes; truncation backs off to the nearest UTF-8
//! character boundary so the result is always valid and within the limit.

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;

use super::json_path::JsonPath;

/// Maximum tool/function name length accepted by upstream providers.
pub const TOOL_NAME_LIMIT: usize = 64;

const MCP_PREFIX: &str = "mcp__";
const MCP_SEPARATOR: &str = "__";

/// Mapping from original tool name to the name sent upstream.
pub type ToolNameMap = FxHashMap<String, String>;

/// Shorten a single name without collision handling.
#[must_use]
pub fn shorten_name_if_needed(name: &str) -> String {
    if name.len() <= TOOL_NAME_LIMIT {
        return name.to_string();
    }
    if name.starts_with(MCP_PREFIX) {
        if let Some(idx) = name.rfind(MCP_SEPARATOR).filter(|&idx| idx > 0) {
            let mut candidate = String::with_capacity(TOOL_NAME_LIMIT);
            candidate.push_str(MCP_PREFIX);
            candidate.push_str(&name[idx + MCP_SEPARATOR.len()..]);
            return truncate_to(&candidate, TOOL_NAME_LIMIT).to_string();
        }
    }
    truncate_to(name, TOOL_NAME_LIMIT).to_string()
}

/// Build the collision-free short-name map for `names`.
///
/// Every input name gets an entry. Repeated names map to the value assigned
/// on their last occurrence, exactly as the response path will recompute it.
#[must_use]
pub fn build_short_name_map<S: AsRef<str>>(names: &[S]) -> ToolNameMap {
    let mut used: FxHashSet<String> = FxHashSet::default();
    let mut map = ToolNameMap::default();
    map.reserve(names.len());

    for name in names {
        let name = name.as_ref();
        let unique = make_unique(shorten_name_if_needed(name), &used);
        used.insert(unique.clone());
        map.insert(name.to_string(), unique);
    }
    map
}

/// Invert a forward map (short name -> original name).
#[must_use]
pub fn reverse_map(forward: &ToolNameMap) -> ToolNameMap {
    forward
        .iter()
        .map(|(original, short)| (short.clone(), original.clone()))
        .collect()
}

/// Forward map for the tool names declared by `request` under `name_paths`.
///
/// `tools_path` addresses the declaration array and `name_path` the name
/// inside each entry (e.g. `tools` + `function.name` for Chat Completions,
/// `tools` + `name` for Messages). Entries without a non-empty name are
/// skipped; for Chat Completions only `type == "function"` entries count.
#[must_use]
pub fn short_name_map_for(request: &Value, tools_path: &str, name_path: &str) -> ToolNameMap {
    let names = declared_tool_names(request, tools_path, name_path);
    if names.is_empty() {
        ToolNameMap::default()
    } else {
        build_short_name_map(&names)
    }
}

/// Reverse map recomputed from the original (pre-translation) request.
#[must_use]
pub fn reverse_map_for(request: &Value, tools_path: &str, name_path: &str) -> ToolNameMap {
    reverse_map(&short_name_map_for(request, tools_path, name_path))
}

/// Short name for `name`, falling back to plain shortening for names that
/// were not declared.
#[must_use]
pub fn shortened(map: &ToolNameMap, name: &str) -> String {
    map.get(name)
        .cloned()
        .unwrap_or_else(|| shorten_name_if_needed(name))
}

fn declared_tool_names<'a>(request: &'a Value, tools_path: &str, name_path: &str) -> Vec<&'a str> {
    request
        .array_at(tools_path)
        .iter()
        .filter(|tool| match tool.str_at("type") {
            // Chat Completions declarations are typed; Messages tools may omit it.
            Some(kind) => kind == "function" || !name_path.contains('.'),
            None => true,
        })
        .filter_map(|tool| tool.str_at(name_path))
        .filter(|name| !name.is_empty())
        .collect()
}

fn make_unique(candidate: String, used: &FxHashSet<String>) -> String {
    if !used.contains(&candidate) {
        return candidate;
    }
    let mut i: u64 = 1;
    loop {
        let suffix = format!("~{i}");
        let allowed = TOOL_NAME_LIMIT.saturating_sub(suffix.len());
        let mut attempt = truncate_to(&candidate, allowed).to_string();
        attempt.push_str(&suffix);
        if !used.contains(&attempt) {
            return attempt;
        }
        i += 1;
    }
}

fn truncate_to(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
