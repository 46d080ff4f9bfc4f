//! Server-Sent-Event fragments produced by the stream converters, plus the
//! line-level helpers used to read upstream event streams.

use std::fmt;

use memchr::memchr_iter;
use smallvec::SmallVec;

const DATA_TAG: &[u8] = b"data:";
const DONE_PAYLOAD: &str = "[DONE]";

/// Fragments emitted for one upstream line, in forwarding order.
pub type Fragments = SmallVec<[SseFragment; 2]>;

/// One self-contained SSE unit: optional `event:` line plus one `data:` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFragment {
    pub event: Option<&'static str>,
    pub data: String,
}

impl SseFragment {
    /// Named event (`event: {name}\ndata: {data}\n\n`), as Messages streams use.
    #[must_use]
    pub fn named(event: &'static str, data: String) -> Self {
        Self {
            event: Some(event),
            data,
        }
    }

    /// Anonymous data event (`data: {data}\n\n`), as Chat Completions streams use.
    #[must_use]
    pub fn data(data: String) -> Self {
        Self { event: None, data }
    }

    /// Chat Completions end-of-stream sentinel.
    #[must_use]
    pub fn done() -> Self {
        Self::data(DONE_PAYLOAD.to_string())
    }

    /// Append the wire form of this fragment to `out`.
    pub fn write_to(&self, out: &mut String) {
        if let Some(event) = self.event {
            out.push_str("event: ");
            out.push_str(event);
            out.push('\n');
        }
        out.push_str("data: ");
        out.push_str(&self.data);
        out.push_str("\n\n");
    }
}

impl fmt::Display for SseFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(event) = self.event {
            writeln!(f, "event: {event}")?;
        }
        write!(f, "data: {}\n\n", self.data)
    }
}

/// Concatenate the wire form of `fragments`.
#[must_use]
pub fn render(fragments: &[SseFragment]) -> String {
    let capacity = fragments.iter().map(|f| f.data.len() + 32).sum();
    let mut out = String::with_capacity(capacity);
    for fragment in fragments {
        fragment.write_to(&mut out);
    }
    out
}

/// JSON payload of an upstream `data:` line.
///
/// Returns `None` for blank lines, comments, `event:` lines, lines without the
/// data marker and the `[DONE]` sentinel.
#[must_use]
pub fn data_payload(line: &[u8]) -> Option<&[u8]> {
    let rest = line.strip_prefix(DATA_TAG)?;
    let payload = rest.trim_ascii();
    if payload.is_empty() || payload == DONE_PAYLOAD.as_bytes() {
        return None;
    }
    Some(payload)
}

/// Split a buffered upstream body into lines, stripping `\r\n` endings.
///
/// A trailing line without terminator is yielded as well.
pub fn lines(body: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut start = 0;
    let mut ends = memchr_iter(b'\n', body).chain(std::iter::once(body.len()));
    std::iter::from_fn(move || loop {
        let end = ends.next()?;
        if start > body.len() {
            return None;
        }
        let mut line = &body[start..end];
        start = end + 1;
        if let Some(stripped) = line.strip_suffix(b"\r") {
            line = stripped;
        }
        if end == body.len() && line.is_empty() {
            continue;
        }
        return Some(line);
    })
}
