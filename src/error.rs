use crate::protocol::Format;

/// Error type for the few fallible operations of the engine.
///
/// Converters themselves never fail; malformed payloads degrade to omitted
/// fields or empty output. Only registry resolution and configuration can
/// surface an error to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslatorError {
    #[error("no translator registered for {from} -> {to}")]
    UnsupportedPair { from: Format, to: Format },
    #[error("unknown wire format: {0}")]
    UnknownFormat(String),
    #[error("Config error: {0}")]
    Config(String),
}
