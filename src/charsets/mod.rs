/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::{borrow::Cow, sync::Arc};

use crate::{core::registry::Registry, decoders::encoded_word::decode_encoded_words, FieldText};

use self::base::BaseCodec;

pub mod base;
pub mod iso_2022_jp;

/// The message property a codec may read and set.
pub trait MessageCharset {
    fn charset(&self) -> Option<&str>;

    fn set_charset(&mut self, charset: &str);
}

/// Renders and reads the text form of an address field.
pub trait AddressCodec {
    fn decode(&self, text: &str) -> String;

    fn encode(&self, text: &str, field_name: &str) -> String;
}

/// Charset-specific transformation rules applied to header text.
///
/// Every method defaults to the identity behaviour, so a codec overrides only
/// the rules that differ for its charset.
pub trait CharsetCodec: Send + Sync {
    /// Substitutes code points the charset cannot round-trip.
    fn remap_characters<'x>(&self, text: &'x str) -> Cow<'x, str> {
        text.into()
    }

    /// Assigns the codec's charset to `message`.
    fn set_charset_on(&self, _message: Option<&mut dyn MessageCharset>) {}

    fn preprocess<'x>(&self, text: &'x str) -> Cow<'x, str> {
        text.into()
    }

    fn preprocess_body_raw<'x>(&self, data: &'x [u8]) -> Cow<'x, [u8]> {
        data.into()
    }

    fn force_regexp_compatibility_on<'x>(&self, text: &'x str) -> Cow<'x, str> {
        text.into()
    }

    fn encode<'x>(&self, value: FieldText<'x>) -> FieldText<'x> {
        value
    }

    fn encode_address<'x>(&self, value: FieldText<'x>) -> FieldText<'x> {
        value
    }

    /// Escapes CR as `=0D` and LF as `=0A`.
    fn encode_crlf(&self, data: &[u8]) -> Vec<u8> {
        escape_crlf(data)
    }

    /// Decodes RFC 2047 encoded words, returning `None` for blank text.
    fn decode_unstructured_field(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            None
        } else {
            Some(decode_encoded_words(text).into_owned())
        }
    }

    fn decode_common_address(&self, codec: &dyn AddressCodec, text: &str) -> String {
        codec.decode(text)
    }

    fn encode_common_address(
        &self,
        codec: &dyn AddressCodec,
        text: &str,
        field_name: &str,
    ) -> String {
        codec.encode(text, field_name)
    }
}

pub fn escape_crlf(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());

    for &ch in data {
        match ch {
            b'\r' => result.extend_from_slice(b"=0D"),
            b'\n' => result.extend_from_slice(b"=0A"),
            _ => result.push(ch),
        }
    }

    result
}

/// Registration table of charset codecs, keyed by canonical name.
#[derive(Clone)]
pub struct CharsetRegistry {
    codecs: Registry<dyn CharsetCodec>,
    base: Arc<dyn CharsetCodec>,
}

impl CharsetRegistry {
    /// Creates a registry holding the built-in codecs.
    pub fn new() -> Self {
        #[allow(unused_mut)]
        let mut codecs: Registry<dyn CharsetCodec> = Registry::new();

        #[cfg(feature = "full_encoding")]
        {
            codecs.register("iso-2022-jp", Arc::new(iso_2022_jp::Iso2022JpCodec));
            codecs.register_alias("csiso2022jp", "iso-2022-jp");
        }

        CharsetRegistry {
            codecs,
            base: Arc::new(BaseCodec),
        }
    }

    /// Registers a codec, replacing any previous one with the same name.
    pub fn register(&mut self, name: &str, codec: Arc<dyn CharsetCodec>) {
        self.codecs.register(name, codec);
    }

    pub fn register_alias(&mut self, alias: &str, target: &str) -> bool {
        self.codecs.register_alias(alias, target)
    }

    /// Looks up the codec for `charset`, falling back to the identity codec.
    pub fn get(&self, charset: &str) -> &dyn CharsetCodec {
        self.codecs.get(charset).unwrap_or_else(|| {
            log::debug!("No codec registered for charset {charset:?}, using base rules");
            self.base.as_ref()
        })
    }

    pub fn contains(&self, charset: &str) -> bool {
        self.codecs.contains(charset)
    }
}

impl Default for CharsetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::{borrow::Cow, sync::Arc};

    use crate::FieldText;

    use super::{AddressCodec, BaseCodec, CharsetCodec, CharsetRegistry};

    struct Upper;

    impl AddressCodec for Upper {
        fn decode(&self, text: &str) -> String {
            text.to_lowercase()
        }

        fn encode(&self, text: &str, field_name: &str) -> String {
            format!("{field_name}: {}", text.to_uppercase())
        }
    }

    struct Shouting;

    impl CharsetCodec for Shouting {
        fn preprocess<'x>(&self, text: &'x str) -> Cow<'x, str> {
            text.to_uppercase().into()
        }
    }

    #[test]
    fn base_codec() {
        let codec = BaseCodec;

        assert_eq!(codec.remap_characters("a\u{2014}b"), "a\u{2014}b");
        assert_eq!(codec.preprocess("text"), "text");
        assert_eq!(codec.force_regexp_compatibility_on("text"), "text");
        assert_eq!(codec.preprocess_body_raw(b"\x1b$B"), &b"\x1b$B"[..]);
        assert_eq!(
            codec.encode(FieldText::from(vec!["a", "b"])),
            FieldText::from(vec!["a", "b"])
        );
        assert_eq!(
            codec.encode_address(FieldText::from("ü <a@b.c>")),
            FieldText::from("ü <a@b.c>")
        );
        codec.set_charset_on(None);

        for (input, expected) in [
            (&b"line one\r\nline two"[..], &b"line one=0D=0Aline two"[..]),
            (&b"bare\nlf and bare\rcr"[..], &b"bare=0Alf and bare=0Dcr"[..]),
            (&b"no breaks"[..], &b"no breaks"[..]),
            (&b""[..], &b""[..]),
        ] {
            assert_eq!(codec.encode_crlf(input), expected, "Failed for {:?}", input);
        }

        for (input, expected) in [
            ("", None),
            ("  \t ", None),
            ("plain text", Some("plain text")),
            ("=?utf-8?q?caf=C3=A9?= au lait", Some("café au lait")),
        ] {
            assert_eq!(
                codec.decode_unstructured_field(input).as_deref(),
                expected,
                "Failed for {:?}",
                input
            );
        }

        assert_eq!(codec.decode_common_address(&Upper, "A@B.C"), "a@b.c");
        assert_eq!(codec.encode_common_address(&Upper, "a@b.c", "To"), "To: A@B.C");
    }

    #[test]
    fn registry_dispatch() {
        let mut registry = CharsetRegistry::new();

        assert_eq!(
            registry.get("x-unknown").remap_characters("\u{2014}"),
            "\u{2014}"
        );
        assert!(!registry.contains("shouting"));

        registry.register("x-shouting", Arc::new(Shouting));
        assert!(registry.register_alias("x_shouting_alias", "X-SHOUTING"));
        assert!(!registry.register_alias("alias", "missing"));
        assert_eq!(registry.get("X_Shouting").preprocess("hey"), "HEY");
        assert_eq!(registry.get("x-shouting-alias").preprocess("hey"), "HEY");

        #[cfg(feature = "full_encoding")]
        for name in ["iso-2022-jp", "ISO_2022_JP", "Iso-2022-Jp", "csISO2022JP"] {
            assert!(registry.contains(name), "Failed for {:?}", name);
            assert_eq!(
                registry.get(name).remap_characters("\u{2014}"),
                "\u{2015}",
                "Failed for {:?}",
                name
            );
        }
    }
}
