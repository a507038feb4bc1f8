/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use crate::{decoders::quoted_printable::decode_quoted_printable, Mechanism};

use super::{to_crlf, to_lf, TransferEncoding};

/// Encoded octets after which a soft line break is inserted.
pub const LINE_LEN: usize = 72;

static HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

#[derive(Debug, Default, Clone, Copy)]
pub struct QuotedPrintable;

#[inline(always)]
fn needs_escape(ch: u8) -> bool {
    ch > 126 || (ch < 32 && ch != b'\n' && ch != b'\t') || ch == b'='
}

impl TransferEncoding for QuotedPrintable {
    fn mechanism(&self) -> Mechanism {
        Mechanism::QuotedPrintable
    }

    fn encode(&self, data: &[u8]) -> Vec<u8> {
        let data = to_lf(data);
        let mut result = Vec::with_capacity(data.len() + data.len() / 2);
        let mut line_len = 0;
        let mut prev = None;

        for &ch in &data {
            if needs_escape(ch) {
                result.push(b'=');
                result.push(HEX_CHARS[(ch >> 4) as usize]);
                result.push(HEX_CHARS[(ch & 0x0f) as usize]);
                line_len += 3;
                prev = None;
            } else if ch == b'\n' {
                // Whitespace may not end an encoded line
                if matches!(prev, Some(b' ' | b'\t')) {
                    result.extend_from_slice(b"=\n");
                }
                result.push(b'\n');
                line_len = 0;
                prev = Some(ch);
            } else {
                result.push(ch);
                line_len += 1;
                prev = Some(ch);
            }

            if line_len > LINE_LEN {
                result.extend_from_slice(b"=\n");
                line_len = 0;
            }
        }

        if line_len > 0 {
            result.extend_from_slice(b"=\n");
        }

        to_crlf(&result)
    }

    fn decode(&self, data: &[u8]) -> Vec<u8> {
        to_lf(&decode_quoted_printable(&to_crlf(data), false))
    }

    fn cost(&self, data: &[u8]) -> f64 {
        if data.is_empty() {
            return 1.0;
        }

        let escaped = data.iter().filter(|&&ch| needs_escape(ch)).count();
        (escaped * 3 + data.len() - escaped) as f64 / data.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use crate::encodings::TransferEncoding;

    use super::QuotedPrintable;

    #[test]
    fn encode_quoted_printable() {
        for (input, expected) in [
            ("This is\na test", "This is\r\na test=\r\n"),
            ("", ""),
            ("plain\n", "plain\r\n"),
            ("caf\u{e9}", "caf=C3=A9=\r\n"),
            ("a=b", "a=3Db=\r\n"),
            ("tab\there", "tab\there=\r\n"),
            ("trailing \nspace", "trailing =\r\n\r\nspace=\r\n"),
            ("nul\x00", "nul=00=\r\n"),
            (
                "This line is long enough that it needs to be broken into two separate lines of text",
                concat!(
                    "This line is long enough that it needs to be broken into two separate lin=\r\n",
                    "es of text=\r\n"
                ),
            ),
        ] {
            assert_eq!(
                String::from_utf8(QuotedPrintable.encode(input.as_bytes())).unwrap(),
                expected,
                "Failed for {:?}",
                input
            );
        }
    }

    #[test]
    fn decode_quoted_printable() {
        for (input, expected) in [
            ("This is\r\na test", "This is\na test"),
            ("This is\na test", "This is\na test"),
            ("caf=C3=A9=\r\n", "caf\u{e9}"),
            ("soft=\r\nbreak", "softbreak"),
            ("soft=\nbreak", "softbreak"),
            ("crlf=0D=0Aescaped", "crlf\nescaped"),
            ("literal=\rcr", "literalcr"),
        ] {
            assert_eq!(
                String::from_utf8(QuotedPrintable.decode(input.as_bytes())).unwrap(),
                expected,
                "Failed for {:?}",
                input
            );
        }
    }

    #[test]
    fn quoted_printable_round_trip() {
        let high_bytes = (128..=255u8).collect::<Vec<_>>();

        for input in [
            &b""[..],
            &[0u8; 100][..],
            &high_bytes[..],
            "Gr\u{fc}\u{df}e aus K\u{f6}ln\nund M\u{fc}nchen  \n\tEnde".as_bytes(),
            "=".repeat(80).as_bytes(),
        ] {
            assert_eq!(
                QuotedPrintable.decode(&QuotedPrintable.encode(input)),
                input,
                "Failed for {:?}",
                input
            );
        }
    }

    #[test]
    fn quoted_printable_cost() {
        assert_eq!(QuotedPrintable.cost(b""), 1.0);
        assert_eq!(QuotedPrintable.cost(b"plain"), 1.0);
        assert_eq!(QuotedPrintable.cost(b"\xff\xff"), 3.0);
        assert_eq!(QuotedPrintable.cost(b"a=b\xff"), 2.0);
    }
}
