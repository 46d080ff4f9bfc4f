//! Translator registry: (client dialect, upstream dialect) -> converter set.
//!
//! Built once by the composition root through [`RegistryBuilder`] and then
//! only read, so lookups need no locking and the registry can be shared by
//! reference across request handlers.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::config::TranslationConfig;
use crate::error::TranslatorError;
use crate::protocol::codex::{claude as codex_claude, openai as codex_openai};
use crate::protocol::gemini::openai as gemini_openai;
use crate::protocol::sse::Fragments;
use crate::protocol::state::StreamState;
use crate::protocol::{Format, ResponseContext, TranslationKey};

/// Client request -> upstream request.
pub type RequestTransform = fn(model: &str, raw: &[u8], stream: bool) -> Vec<u8>;
/// One upstream stream line -> client SSE fragments.
pub type StreamTransform = fn(&ResponseContext<'_>, &[u8], &mut StreamState) -> Fragments;
/// Terminal upstream document -> client document; `None` when not terminal.
pub type NonStreamTransform = fn(&ResponseContext<'_>, &[u8]) -> Option<String>;
/// Token count -> client token-count reply body.
pub type TokenCountTransform = fn(u64) -> String;

/// Response-side converters of one pair.
#[derive(Clone, Copy)]
pub struct ResponseTransforms {
    pub stream: StreamTransform,
    pub non_stream: NonStreamTransform,
    pub token_count: Option<TokenCountTransform>,
}

/// The converter set registered for one [`TranslationKey`].
#[derive(Clone, Copy)]
pub struct Translator {
    key: TranslationKey,
    request: RequestTransform,
    response: ResponseTransforms,
}

impl Translator {
    #[must_use]
    pub fn key(&self) -> TranslationKey {
        self.key
    }

    #[must_use]
    pub fn translate_request(&self, model: &str, raw: &[u8], stream: bool) -> Vec<u8> {
        (self.request)(model, raw, stream)
    }

    /// Feed one upstream line. Lines must arrive in upstream order and the
    /// returned fragments be forwarded in the order given.
    pub fn translate_stream(
        &self,
        ctx: &ResponseContext<'_>,
        line: &[u8],
        state: &mut StreamState,
    ) -> Fragments {
        (self.response.stream)(ctx, line, state)
    }

    #[must_use]
    pub fn translate_non_stream(&self, ctx: &ResponseContext<'_>, raw: &[u8]) -> Option<String> {
        (self.response.non_stream)(ctx, raw)
    }

    /// Token-count reply, for pairs whose client dialect has one.
    #[must_use]
    pub fn token_count(&self, count: u64) -> Option<String> {
        self.response.token_count.map(|transform| transform(count))
    }
}

impl fmt::Debug for Translator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Translator")
            .field("key", &self.key)
            .field("token_count", &self.response.token_count.is_some())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Built-in converter sets
// ---------------------------------------------------------------------------

/// Every pair with a built-in converter set.
pub const BUILTIN_PAIRS: [TranslationKey; 3] = [
    TranslationKey::new(Format::OpenAi, Format::Codex),
    TranslationKey::new(Format::Claude, Format::Codex),
    TranslationKey::new(Format::OpenAi, Format::Gemini),
];

/// The built-in `(request, responses)` converters for `key`.
#[must_use]
pub fn builtin(key: TranslationKey) -> Option<(RequestTransform, ResponseTransforms)> {
    let set: (RequestTransform, ResponseTransforms) = match (key.source, key.target) {
        (Format::OpenAi, Format::Codex) => (
            codex_openai::convert_openai_request_to_codex,
            ResponseTransforms {
                stream: codex_openai::convert_codex_stream_to_openai,
                non_stream: codex_openai::convert_codex_response_to_openai,
                token_count: None,
            },
        ),
        (Format::Claude, Format::Codex) => (
            codex_claude::convert_claude_request_to_codex,
            ResponseTransforms {
                stream: codex_claude::convert_codex_stream_to_claude,
                non_stream: codex_claude::convert_codex_response_to_claude,
                token_count: Some(codex_claude::claude_token_count),
            },
        ),
        (Format::OpenAi, Format::Gemini) => (
            gemini_openai::convert_openai_request_to_gemini,
            ResponseTransforms {
                stream: gemini_openai::convert_gemini_stream_to_openai,
                non_stream: gemini_openai::convert_gemini_response_to_openai,
                token_count: None,
            },
        ),
        _ => return None,
    };
    Some(set)
}

// ---------------------------------------------------------------------------
// Builder / registry
// ---------------------------------------------------------------------------

/// Collects registrations before the registry is frozen.
#[derive(Default)]
pub struct RegistryBuilder {
    table: FxHashMap<TranslationKey, Translator>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the converter set for `(source, target)`. Registering the
    /// same key again replaces the earlier set.
    pub fn register(
        &mut self,
        source: Format,
        target: Format,
        request: RequestTransform,
        response: ResponseTransforms,
    ) -> &mut Self {
        let key = TranslationKey::new(source, target);
        let translator = Translator {
            key,
            request,
            response,
        };
        if self.table.insert(key, translator).is_some() {
            tracing::debug!(pair = %key, "replacing registered translator");
        }
        self
    }

    /// Register the built-in converter set for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`TranslatorError::UnsupportedPair`] when no built-in set exists.
    pub fn register_builtin(&mut self, key: TranslationKey) -> Result<&mut Self, TranslatorError> {
        let (request, response) = builtin(key).ok_or(TranslatorError::UnsupportedPair {
            from: key.source,
            to: key.target,
        })?;
        Ok(self.register(key.source, key.target, request, response))
    }

    #[must_use]
    pub fn build(self) -> TranslatorRegistry {
        TranslatorRegistry { table: self.table }
    }
}

/// Immutable lookup table of converter sets.
pub struct TranslatorRegistry {
    table: FxHashMap<TranslationKey, Translator>,
}

impl TranslatorRegistry {
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Registry holding every built-in pair.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut builder = RegistryBuilder::new();
        for key in BUILTIN_PAIRS {
            if let Some((request, response)) = builtin(key) {
                builder.register(key.source, key.target, request, response);
            }
        }
        builder.build()
    }

    /// Registry holding the pairs named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TranslatorError::UnknownFormat`] for an unrecognised format
    /// name and [`TranslatorError::UnsupportedPair`] for a pair without a
    /// built-in converter set.
    pub fn from_config(config: &TranslationConfig) -> Result<Self, TranslatorError> {
        let mut builder = RegistryBuilder::new();
        for pair in &config.pairs {
            builder.register_builtin(pair.key()?)?;
        }
        let registry = builder.build();
        tracing::debug!(pairs = registry.len(), "translator registry built");
        Ok(registry)
    }

    /// Converter set for `(source, target)`.
    ///
    /// # Errors
    ///
    /// Returns [`TranslatorError::UnsupportedPair`] when nothing is registered
    /// for the pair.
    pub fn lookup(&self, source: Format, target: Format) -> Result<&Translator, TranslatorError> {
        self.table
            .get(&TranslationKey::new(source, target))
            .ok_or(TranslatorError::UnsupportedPair {
                from: source,
                to: target,
            })
    }

    #[must_use]
    pub fn contains(&self, source: Format, target: Format) -> bool {
        self.table.contains_key(&TranslationKey::new(source, target))
    }

    /// Registered keys in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<TranslationKey> {
        let mut keys: Vec<_> = self.table.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl fmt::Debug for TranslatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}
