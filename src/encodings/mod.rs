/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::{fmt::Display, sync::Arc};

use crate::{core::registry::Registry, Mechanism};

use self::{
    base64::Base64,
    identity::{Binary, EightBit, SevenBit},
    quoted_printable::QuotedPrintable,
    uuencode::UuEncode,
};

pub mod base64;
pub mod identity;
pub mod quoted_printable;
pub mod uuencode;

/// Longest line allowed by RFC 5322, excluding the CRLF.
pub const MAX_LINE_OCTETS: usize = 998;

/// A byte-level reversible content transformation.
pub trait TransferEncoding: Send + Sync {
    fn mechanism(&self) -> Mechanism;

    fn name(&self) -> &str {
        self.mechanism().as_str()
    }

    /// Transport priority, lower values cover a narrower byte range.
    /// `None` for variants outside the identity ordering.
    fn priority(&self) -> Option<u8> {
        self.mechanism().priority()
    }

    fn encode(&self, data: &[u8]) -> Vec<u8>;

    fn decode(&self, data: &[u8]) -> Vec<u8>;

    /// Relative cost of carrying `data` under this encoding, as the ratio of
    /// encoded to raw octets. `f64::INFINITY` when the data cannot be carried.
    fn cost(&self, data: &[u8]) -> f64;

    /// Returns `true` if content already declared under `candidate` can be
    /// carried unmodified under this encoding.
    fn can_transport(&self, candidate: &dyn TransferEncoding) -> bool {
        candidate.mechanism().lineage().contains(&self.mechanism())
    }
}

impl Mechanism {
    /// Parses a transfer encoding name, ignoring case and `-`/`_` separators.
    pub fn parse(name: &str) -> Option<Mechanism> {
        let name = crate::core::registry::canonical_name(name);
        hashify::tiny_map_ignore_case!(name.as_bytes(),
            "7bit" => Mechanism::SevenBit,
            "8bit" => Mechanism::EightBit,
            "Binary" => Mechanism::Binary,
            "Base64" => Mechanism::Base64,
            "QuotedPrintable" => Mechanism::QuotedPrintable,
            "Uuencode" => Mechanism::UuEncode,
            "XUuencode" => Mechanism::UuEncode,
            "XUue" => Mechanism::UuEncode,
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mechanism::SevenBit => "7bit",
            Mechanism::EightBit => "8bit",
            Mechanism::Binary => "binary",
            Mechanism::Base64 => "base64",
            Mechanism::QuotedPrintable => "quoted-printable",
            Mechanism::UuEncode => "x-uuencode",
        }
    }

    pub fn priority(&self) -> Option<u8> {
        match self {
            Mechanism::SevenBit => Some(1),
            Mechanism::Base64 => Some(3),
            Mechanism::EightBit => Some(4),
            Mechanism::Binary => Some(5),
            Mechanism::QuotedPrintable | Mechanism::UuEncode => None,
        }
    }

    /// The mechanism followed by every mechanism it is a subtype of.
    pub fn lineage(&self) -> &'static [Mechanism] {
        match self {
            Mechanism::Base64 => &[
                Mechanism::Base64,
                Mechanism::SevenBit,
                Mechanism::EightBit,
                Mechanism::Binary,
            ],
            Mechanism::QuotedPrintable => &[
                Mechanism::QuotedPrintable,
                Mechanism::SevenBit,
                Mechanism::EightBit,
                Mechanism::Binary,
            ],
            Mechanism::SevenBit => &[Mechanism::SevenBit, Mechanism::EightBit, Mechanism::Binary],
            Mechanism::EightBit => &[Mechanism::EightBit, Mechanism::Binary],
            Mechanism::Binary => &[Mechanism::Binary],
            Mechanism::UuEncode => &[Mechanism::UuEncode],
        }
    }
}

impl Display for Mechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rewrites bare CR, bare LF and CRLF line breaks as CRLF.
pub fn to_crlf(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len() + data.len() / 32);
    let mut iter = data.iter().peekable();

    while let Some(&ch) = iter.next() {
        match ch {
            b'\r' => {
                result.extend_from_slice(b"\r\n");
                iter.next_if_eq(&&b'\n');
            }
            b'\n' => result.extend_from_slice(b"\r\n"),
            _ => result.push(ch),
        }
    }

    result
}

/// Rewrites CRLF and bare CR line breaks as LF.
pub fn to_lf(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut iter = data.iter().peekable();

    while let Some(&ch) = iter.next() {
        if ch == b'\r' {
            result.push(b'\n');
            iter.next_if_eq(&&b'\n');
        } else {
            result.push(ch);
        }
    }

    result
}

/// Length of the longest line in `data`, not counting line terminators.
pub(crate) fn longest_line(data: &[u8]) -> usize {
    data.split(|&ch| ch == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line).len())
        .max()
        .unwrap_or(0)
}

/// Registration table of transfer encodings, keyed by canonical name.
#[derive(Clone)]
pub struct TransferEncodingRegistry {
    encodings: Registry<dyn TransferEncoding>,
    fallback: Arc<dyn TransferEncoding>,
}

impl TransferEncodingRegistry {
    /// Creates a registry holding the built-in encodings.
    pub fn new() -> Self {
        let mut encodings: Registry<dyn TransferEncoding> = Registry::new();
        encodings.register("7bit", Arc::new(SevenBit));
        encodings.register("8bit", Arc::new(EightBit));
        encodings.register("binary", Arc::new(Binary));
        encodings.register("base64", Arc::new(Base64));
        encodings.register("quoted-printable", Arc::new(QuotedPrintable));
        encodings.register("x-uuencode", Arc::new(UuEncode));
        encodings.register_alias("uuencode", "x-uuencode");
        encodings.register_alias("x-uue", "x-uuencode");

        TransferEncodingRegistry {
            encodings,
            fallback: Arc::new(Binary),
        }
    }

    /// Registers an encoding, replacing any previous one with the same name.
    pub fn register(&mut self, name: &str, encoding: Arc<dyn TransferEncoding>) {
        self.encodings.register(name, encoding);
    }

    pub fn register_alias(&mut self, alias: &str, target: &str) -> bool {
        self.encodings.register_alias(alias, target)
    }

    pub fn get(&self, name: &str) -> Option<&dyn TransferEncoding> {
        self.encodings.get(name)
    }

    /// Looks up an encoding, falling back to the transparent `binary`
    /// encoding for unknown names.
    pub fn resolve(&self, name: &str) -> &dyn TransferEncoding {
        self.encodings.get(name).unwrap_or_else(|| {
            log::debug!("Unknown transfer encoding {name:?}, using binary");
            self.fallback.as_ref()
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.encodings.contains(name)
    }

    /// Iterates over the registered encodings, skipping aliases.
    pub fn iter(&self) -> impl Iterator<Item = &dyn TransferEncoding> {
        self.encodings.iter()
    }

    /// Returns `true` if content declared under `candidate` can be carried
    /// unmodified under `target`.
    pub fn can_transport(&self, target: &str, candidate: &str) -> bool {
        self.resolve(target).can_transport(self.resolve(candidate))
    }

    /// Picks the encoding to use when `data`, currently declared under
    /// `source`, has to travel through a channel restricted to `target`.
    ///
    /// The source encoding is kept when the target can carry it. Otherwise the
    /// cheapest encoding the target can carry wins, ties going to the lower
    /// priority. Falls back to `target` itself when nothing fits.
    pub fn best_compatible(&self, target: &str, source: &str, data: &[u8]) -> &dyn TransferEncoding {
        let target = self.resolve(target);
        let source = self.resolve(source);

        if target.can_transport(source) {
            return source;
        }

        self.encodings
            .iter()
            .filter(|encoding| target.can_transport(*encoding))
            .map(|encoding| (encoding, encoding.cost(data)))
            .filter(|(_, cost)| cost.is_finite())
            .min_by(|(a, a_cost), (b, b_cost)| {
                a_cost.total_cmp(b_cost).then_with(|| {
                    a.priority()
                        .unwrap_or(u8::MAX)
                        .cmp(&b.priority().unwrap_or(u8::MAX))
                })
            })
            .map(|(encoding, _)| encoding)
            .unwrap_or(target)
    }
}

impl Default for TransferEncodingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::Mechanism;

    use super::{longest_line, to_crlf, to_lf, TransferEncodingRegistry};

    #[test]
    fn parse_mechanism() {
        for (input, expected) in [
            ("7bit", Some(Mechanism::SevenBit)),
            ("8BIT", Some(Mechanism::EightBit)),
            ("Binary", Some(Mechanism::Binary)),
            ("base64", Some(Mechanism::Base64)),
            ("Quoted-Printable", Some(Mechanism::QuotedPrintable)),
            ("quoted_printable", Some(Mechanism::QuotedPrintable)),
            ("x-uuencode", Some(Mechanism::UuEncode)),
            ("uuencode", Some(Mechanism::UuEncode)),
            ("X-UUE", Some(Mechanism::UuEncode)),
            (" base64 ", Some(Mechanism::Base64)),
            ("gzip", None),
            ("", None),
        ] {
            assert_eq!(Mechanism::parse(input), expected, "Failed for {:?}", input);
        }
    }

    #[test]
    fn line_endings() {
        for (input, crlf, lf) in [
            ("", "", ""),
            ("a\nb", "a\r\nb", "a\nb"),
            ("a\rb", "a\r\nb", "a\nb"),
            ("a\r\nb", "a\r\nb", "a\nb"),
            ("a\r\n\r\nb\n\n", "a\r\n\r\nb\r\n\r\n", "a\n\nb\n\n"),
            ("a\n\rb", "a\r\n\r\nb", "a\n\nb"),
        ] {
            assert_eq!(to_crlf(input.as_bytes()), crlf.as_bytes(), "Failed for {:?}", input);
            assert_eq!(to_lf(input.as_bytes()), lf.as_bytes(), "Failed for {:?}", input);
            assert_eq!(to_crlf(crlf.as_bytes()), crlf.as_bytes(), "Failed for {:?}", input);
        }
        assert_eq!(longest_line(b"ab\r\nabcd\nabc"), 4);
        assert_eq!(longest_line(b""), 0);
    }

    #[test]
    fn registry_lookup() {
        let registry = TransferEncodingRegistry::new();

        for (name, expected) in [
            ("7bit", Mechanism::SevenBit),
            ("8Bit", Mechanism::EightBit),
            ("BINARY", Mechanism::Binary),
            ("Base64", Mechanism::Base64),
            ("quoted_printable", Mechanism::QuotedPrintable),
            ("x-uuencode", Mechanism::UuEncode),
            ("uuencode", Mechanism::UuEncode),
            ("x-uue", Mechanism::UuEncode),
        ] {
            assert_eq!(
                registry.get(name).map(|encoding| encoding.mechanism()),
                Some(expected),
                "Failed for {:?}",
                name
            );
        }

        assert!(registry.get("gzip").is_none());
        assert_eq!(registry.resolve("gzip").mechanism(), Mechanism::Binary);
        assert_eq!(registry.iter().count(), 6);
        assert_eq!(
            registry
                .iter()
                .map(|encoding| encoding.name())
                .collect::<Vec<_>>(),
            vec!["7bit", "8bit", "binary", "base64", "quoted-printable", "x-uuencode"]
        );
    }

    #[test]
    fn priorities() {
        let registry = TransferEncodingRegistry::new();
        let priority = |name| registry.resolve(name).priority();

        assert_eq!(priority("7bit"), Some(1));
        assert_eq!(priority("base64"), Some(3));
        assert_eq!(priority("8bit"), Some(4));
        assert_eq!(priority("binary"), Some(5));
        assert_eq!(priority("quoted-printable"), None);
        assert_eq!(priority("x-uuencode"), None);
    }

    #[test]
    fn can_transport() {
        let registry = TransferEncodingRegistry::new();

        for (target, candidate, expected) in [
            ("7bit", "7bit", true),
            ("7bit", "base64", true),
            ("7bit", "quoted-printable", true),
            ("7bit", "8bit", false),
            ("7bit", "binary", false),
            ("8bit", "7bit", true),
            ("8bit", "base64", true),
            ("8bit", "binary", false),
            ("binary", "8bit", true),
            ("binary", "quoted-printable", true),
            ("base64", "7bit", false),
            ("base64", "base64", true),
            ("quoted-printable", "base64", false),
            ("binary", "x-uuencode", false),
            ("x-uuencode", "uuencode", true),
        ] {
            assert_eq!(
                registry.can_transport(target, candidate),
                expected,
                "Failed for {} carrying {}",
                target,
                candidate
            );
        }
    }

    #[test]
    fn best_compatible() {
        let registry = TransferEncodingRegistry::new();

        for (target, source, data, expected) in [
            ("7bit", "7bit", b"plain text".to_vec(), Mechanism::SevenBit),
            ("8bit", "7bit", b"plain text".to_vec(), Mechanism::SevenBit),
            ("7bit", "8bit", b"plain text".to_vec(), Mechanism::SevenBit),
            (
                "7bit",
                "8bit",
                "Hello from K\u{f6}ln, see you tomorrow at the station"
                    .as_bytes()
                    .to_vec(),
                Mechanism::QuotedPrintable,
            ),
            (
                "7bit",
                "binary",
                b"\x00\x01\x02\xff\xfe\xfd".to_vec(),
                Mechanism::Base64,
            ),
            ("8bit", "binary", "caf\u{e9}".as_bytes().to_vec(), Mechanism::EightBit),
            ("8bit", "binary", b"\x00\x01\x02".to_vec(), Mechanism::Base64),
        ] {
            assert_eq!(
                registry.best_compatible(target, source, &data).mechanism(),
                expected,
                "Failed for {} from {} with {:?}",
                target,
                source,
                data
            );
        }
    }
}
