/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::sync::Arc;

use crate::{
    charsets::{CharsetCodec, CharsetRegistry},
    core::parameters::DEFAULT_LANGUAGE,
    encodings::{TransferEncoding, TransferEncodingRegistry},
    parsers::{parse_field, DefaultGrammar, GrammarParser, ParseTree},
    FieldKind, Result,
};

/// Registries and settings shared by every parse and encode call.
///
/// A context is built once, then passed by reference. It is never mutated
/// after construction, so it can be shared freely between threads.
pub struct Context {
    charsets: CharsetRegistry,
    transfer_encodings: TransferEncodingRegistry,
    grammar: Box<dyn GrammarParser>,
    default_charset: String,
    parameter_language: String,
}

impl Context {
    /// Create a new context using the default settings.
    ///
    /// The default settings are:
    ///
    /// * Charset codecs: base rules, plus ISO-2022-JP with the `full_encoding` feature.
    /// * Transfer encodings: `7bit`, `8bit`, `binary`, `base64`, `quoted-printable`
    ///   and `x-uuencode`.
    /// * Fields are parsed with [`DefaultGrammar`].
    /// * Non-ASCII text is encoded as `utf-8`, parameters are tagged as `en`.
    ///
    pub fn new() -> Self {
        Self {
            charsets: CharsetRegistry::new(),
            transfer_encodings: TransferEncodingRegistry::new(),
            grammar: Box::new(DefaultGrammar),
            default_charset: "utf-8".to_string(),
            parameter_language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Parse fields with a different grammar engine.
    pub fn with_grammar(mut self, grammar: impl GrammarParser + 'static) -> Self {
        self.grammar = Box::new(grammar);
        self
    }

    /// Register a charset codec under `name`.
    pub fn with_charset_codec(mut self, name: &str, codec: Arc<dyn CharsetCodec>) -> Self {
        self.charsets.register(name, codec);
        self
    }

    /// Register a transfer encoding under `name`.
    pub fn with_transfer_encoding(
        mut self,
        name: &str,
        encoding: Arc<dyn TransferEncoding>,
    ) -> Self {
        self.transfer_encodings.register(name, encoding);
        self
    }

    /// Charset used for non-ASCII header text when a field has none.
    pub fn with_default_charset(mut self, charset: impl Into<String>) -> Self {
        self.default_charset = charset.into();
        self
    }

    /// Language tag written in RFC 2231 encoded parameters.
    pub fn with_parameter_language(mut self, language: impl Into<String>) -> Self {
        self.parameter_language = language.into();
        self
    }

    pub fn charsets(&self) -> &CharsetRegistry {
        &self.charsets
    }

    pub fn transfer_encodings(&self) -> &TransferEncodingRegistry {
        &self.transfer_encodings
    }

    pub fn grammar(&self) -> &dyn GrammarParser {
        self.grammar.as_ref()
    }

    pub fn default_charset(&self) -> &str {
        &self.default_charset
    }

    pub fn parameter_language(&self) -> &str {
        &self.parameter_language
    }

    /// Parses `raw` with this context's grammar.
    pub fn parse<'x>(&self, kind: FieldKind, raw: &'x str) -> Result<ParseTree<'x>> {
        parse_field(self.grammar.as_ref(), kind, raw)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
