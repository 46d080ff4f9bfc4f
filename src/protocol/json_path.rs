//! Dotted-path access over untyped JSON documents.
//!
//! Converters read and assemble provider payloads through paths such as
//! `generationConfig.thinkingConfig.thinkingBudget` or `input.-1` instead of
//! per-provider structs, so unknown fields survive and missing ones are simply
//! absent.
//!
//! Path grammar: segments separated by `.`. A segment made of ASCII digits
//! addresses an array element when the container is (or will become) an array;
//! `-1` as the last segment of a write appends. Reads never panic and report
//! absence as `None`.

use serde_json::{Map, Value};

/// Parse a raw document, degrading to `Value::Null` on malformed input.
#[must_use]
pub fn parse_document(raw: &[u8]) -> Value {
    serde_json::from_slice(raw).unwrap_or(Value::Null)
}

/// Read/write access to a JSON tree by dotted path.
pub trait JsonPath {
    /// Value at `path`, if present.
    fn at(&self, path: &str) -> Option<&Value>;

    /// String value at `path` (only JSON strings).
    fn str_at(&self, path: &str) -> Option<&str> {
        self.at(path).and_then(Value::as_str)
    }

    /// Lenient text rendering of the value at `path`.
    ///
    /// Strings are returned as-is, numbers and booleans in their JSON form,
    /// objects and arrays as compact JSON, and `null`/absent as empty.
    fn text_at(&self, path: &str) -> String {
        match self.at(path) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Lenient integer read: numbers (truncated) and numeric strings, else 0.
    fn i64_at(&self, path: &str) -> i64 {
        match self.at(path) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_u64().and_then(|u| i64::try_from(u).ok()))
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    /// Array elements at `path`; empty when absent or not an array.
    fn array_at(&self, path: &str) -> &[Value] {
        match self.at(path) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// Set `value` at `path`, creating intermediate objects/arrays.
    fn set_path(&mut self, path: &str, value: Value);

    /// Append `value` to the array at `path`, creating it when absent.
    fn push_path(&mut self, path: &str, value: Value) {
        if path.is_empty() {
            self.set_path("-1", value);
        } else {
            self.set_path(&format!("{path}.-1"), value);
        }
    }

    /// Remove and return the value at `path`.
    fn delete_path(&mut self, path: &str) -> Option<Value>;
}

impl JsonPath for Value {
    fn at(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(self);
        }
        let mut current = self;
        for segment in path.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    fn set_path(&mut self, path: &str, value: Value) {
        let segments: Vec<&str> = path.split('.').collect();
        set_segments(self, &segments, value);
    }

    fn delete_path(&mut self, path: &str) -> Option<Value> {
        let (parent_path, last) = match path.rfind('.') {
            Some(idx) => (&path[..idx], &path[idx + 1..]),
            None => ("", path),
        };
        let parent = at_mut(self, parent_path)?;
        match parent {
            Value::Object(map) => map.shift_remove(last),
            Value::Array(items) => {
                let idx = last.parse::<usize>().ok()?;
                (idx < items.len()).then(|| items.remove(idx))
            }
            _ => None,
        }
    }
}

/// Rename `from` to `to` inside the object at `value`, keeping its position.
///
/// Returns `false` when `value` is not an object or has no `from` key.
pub fn rename_key(value: &mut Value, from: &str, to: &str) -> bool {
    let Value::Object(map) = value else {
        return false;
    };
    if !map.contains_key(from) {
        return false;
    }
    let renamed: Map<String, Value> = std::mem::take(map)
        .into_iter()
        .map(|(k, v)| if k == from { (to.to_string(), v) } else { (k, v) })
        .collect();
    *map = renamed;
    true
}

fn at_mut<'a>(value: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    if path.is_empty() {
        return Some(value);
    }
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get_mut(segment)?,
            Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn is_index_segment(segment: &str) -> bool {
    segment == "-1" || (!segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))
}

fn set_segments(target: &mut Value, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *target = value;
        return;
    };

    if is_index_segment(head) && !matches!(target, Value::Object(_)) {
        if !target.is_array() {
            *target = Value::Array(Vec::new());
        }
        let Value::Array(items) = target else {
            return;
        };
        let idx = if *head == "-1" {
            items.len()
        } else {
            head.parse::<usize>().unwrap_or(items.len())
        };
        while items.len() <= idx {
            items.push(Value::Null);
        }
        set_segments(&mut items[idx], rest, value);
        return;
    }

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(map) = target {
        let slot = map.entry((*head).to_string()).or_insert(Value::Null);
        set_segments(slot, rest, value);
    }
}
