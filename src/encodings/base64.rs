/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::{decoders::base64::decode_base64, Mechanism};

use super::TransferEncoding;

/// Encoded characters per output line.
pub const LINE_LEN: usize = 60;

#[derive(Debug, Default, Clone, Copy)]
pub struct Base64;

impl TransferEncoding for Base64 {
    fn mechanism(&self) -> Mechanism {
        Mechanism::Base64
    }

    /// Standard alphabet, wrapped every 60 characters, every line ending in `\n`.
    fn encode(&self, data: &[u8]) -> Vec<u8> {
        let encoded = STANDARD.encode(data);
        let mut result = Vec::with_capacity(encoded.len() + encoded.len() / LINE_LEN + 1);

        for line in encoded.as_bytes().chunks(LINE_LEN) {
            result.extend_from_slice(line);
            result.push(b'\n');
        }

        result
    }

    fn decode(&self, data: &[u8]) -> Vec<u8> {
        decode_base64(data)
    }

    fn cost(&self, _data: &[u8]) -> f64 {
        4.0 / 3.0
    }
}

#[cfg(test)]
mod tests {
    use crate::encodings::TransferEncoding;

    use super::Base64;

    #[test]
    fn encode_base64() {
        for (input, expected) in [
            ("This is a test", "VGhpcyBpcyBhIHRlc3Q=\n"),
            ("", ""),
            ("A", "QQ==\n"),
            (
                "The quick brown fox jumps over the lazy dog, twice over, really.",
                concat!(
                    "VGhlIHF1aWNrIGJyb3duIGZveCBqdW1wcyBvdmVyIHRoZSBsYXp5IGRvZywg\n",
                    "dHdpY2Ugb3ZlciwgcmVhbGx5Lg==\n"
                ),
            ),
        ] {
            assert_eq!(
                String::from_utf8(Base64.encode(input.as_bytes())).unwrap(),
                expected,
                "Failed for {:?}",
                input
            );
            assert_eq!(
                Base64.decode(expected.as_bytes()),
                input.as_bytes(),
                "Failed for {:?}",
                expected
            );
        }
    }

    #[test]
    fn base64_round_trip() {
        let all_bytes = (0..=255u8).collect::<Vec<_>>();

        for input in [&b""[..], &[0u8; 64][..], &all_bytes[..], "ハロー".as_bytes()] {
            assert_eq!(Base64.decode(&Base64.encode(input)), input, "Failed for {:?}", input);
        }

        let encoded = Base64.encode(&all_bytes);
        assert!(encoded
            .split(|&ch| ch == b'\n')
            .all(|line| line.len() <= super::LINE_LEN));
        assert_eq!(Base64.cost(&all_bytes), 4.0 / 3.0);
    }
}
