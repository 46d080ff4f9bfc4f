pub mod codex;
pub mod gemini;
pub mod json_path;
pub mod mapping;
pub mod sse;
pub mod state;
pub mod tool_names;

use std::fmt;
use std::str::FromStr;

use crate::error::TranslatorError;

/// A wire dialect spoken either by a client or by an upstream provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Format {
    /// `OpenAI` Chat Completions.
    OpenAi,
    /// Anthropic Messages.
    Claude,
    /// Gemini `generateContent` / `streamGenerateContent`.
    Gemini,
    /// Responses-style API used by Codex.
    Codex,
}

impl Format {
    pub const ALL: [Format; 4] = [Format::OpenAi, Format::Claude, Format::Gemini, Format::Codex];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Format::OpenAi => "openai",
            Format::Claude => "claude",
            Format::Gemini => "gemini",
            Format::Codex => "codex",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = TranslatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Format::OpenAi),
            "claude" | "anthropic" => Ok(Format::Claude),
            "gemini" => Ok(Format::Gemini),
            "codex" => Ok(Format::Codex),
            other => Err(TranslatorError::UnknownFormat(other.to_string())),
        }
    }
}

/// Ordered (client dialect, upstream dialect) pair keying the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TranslationKey {
    pub source: Format,
    pub target: Format,
}

impl TranslationKey {
    #[must_use]
    pub const fn new(source: Format, target: Format) -> Self {
        Self { source, target }
    }
}

impl fmt::Display for TranslationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}

/// Request-side inputs a response converter may consult.
///
/// `original_request` is the client's payload before translation; tool names
/// are restored by re-deriving the short-name map from it.
#[derive(Debug, Clone, Copy)]
pub struct ResponseContext<'a> {
    pub model: &'a str,
    pub original_request: &'a [u8],
    pub translated_request: &'a [u8],
}

impl<'a> ResponseContext<'a> {
    #[must_use]
    pub fn new(model: &'a str, original_request: &'a [u8], translated_request: &'a [u8]) -> Self {
        Self {
            model,
            original_request,
            translated_request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse_and_display() {
        for format in Format::ALL {
            assert_eq!(format.as_str().parse::<Format>(), Ok(format));
        }
        assert_eq!(" Anthropic ".parse::<Format>(), Ok(Format::Claude));
        assert_eq!(
            "bedrock".parse::<Format>(),
            Err(TranslatorError::UnknownFormat("bedrock".into()))
        );
        assert_eq!(
            TranslationKey::new(Format::Claude, Format::Codex).to_string(),
            "claude->codex"
        );
    }
}
