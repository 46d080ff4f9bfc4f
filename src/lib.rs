//! Translation engine between LLM chat wire dialects.
//!
//! Request converters turn a client payload into the upstream dialect; stream
//! converters turn upstream SSE lines into client SSE fragments one line at a
//! time; non-stream converters turn a terminal upstream document into a client
//! document. The [`TranslatorRegistry`] maps each `(client, upstream)` pair to
//! its converter set. Nothing here performs I/O.

pub mod config;
pub mod error;
pub mod observability;
pub mod protocol;
pub mod registry;

mod util;

pub use error::TranslatorError;
pub use protocol::sse::{render, Fragments, SseFragment};
pub use protocol::state::StreamState;
pub use protocol::{Format, ResponseContext, TranslationKey};
pub use registry::{Translator, TranslatorRegistry};
