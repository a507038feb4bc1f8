/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use crate::Mechanism;

use super::{longest_line, to_crlf, TransferEncoding, MAX_LINE_OCTETS};

/// US-ASCII text with CRLF line breaks.
#[derive(Debug, Default, Clone, Copy)]
pub struct SevenBit;

/// 8-bit text with CRLF line breaks.
#[derive(Debug, Default, Clone, Copy)]
pub struct EightBit;

/// Arbitrary octets, carried untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct Binary;

impl TransferEncoding for SevenBit {
    fn mechanism(&self) -> Mechanism {
        Mechanism::SevenBit
    }

    fn encode(&self, data: &[u8]) -> Vec<u8> {
        to_crlf(data)
    }

    fn decode(&self, data: &[u8]) -> Vec<u8> {
        to_crlf(data)
    }

    fn cost(&self, data: &[u8]) -> f64 {
        if data.iter().any(|&ch| ch == 0 || ch > 0x7f) || longest_line(data) > MAX_LINE_OCTETS {
            f64::INFINITY
        } else {
            1.0
        }
    }
}

impl TransferEncoding for EightBit {
    fn mechanism(&self) -> Mechanism {
        Mechanism::EightBit
    }

    fn encode(&self, data: &[u8]) -> Vec<u8> {
        to_crlf(data)
    }

    fn decode(&self, data: &[u8]) -> Vec<u8> {
        to_crlf(data)
    }

    fn cost(&self, data: &[u8]) -> f64 {
        if data.contains(&0) || longest_line(data) > MAX_LINE_OCTETS {
            f64::INFINITY
        } else {
            1.0
        }
    }
}

impl TransferEncoding for Binary {
    fn mechanism(&self) -> Mechanism {
        Mechanism::Binary
    }

    fn encode(&self, data: &[u8]) -> Vec<u8> {
        data.to_vec()
    }

    fn decode(&self, data: &[u8]) -> Vec<u8> {
        data.to_vec()
    }

    fn cost(&self, _data: &[u8]) -> f64 {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use crate::encodings::TransferEncoding;

    use super::{Binary, EightBit, SevenBit};

    #[test]
    fn identity_encodings() {
        let encodings: [&dyn TransferEncoding; 3] = [&SevenBit, &EightBit, &Binary];

        for input in [
            &b""[..],
            &b"\x00\x00\x00\x00"[..],
            &b"plain text"[..],
            &b"line one\r\nline two\r\n"[..],
            "caf\u{e9}\r\n".as_bytes(),
        ] {
            for encoding in encodings {
                assert_eq!(
                    encoding.decode(&encoding.encode(input)),
                    input,
                    "Failed for {:?} with {}",
                    input,
                    encoding.name()
                );
            }
        }

        assert_eq!(SevenBit.encode(b"a\nb\rc\r\n"), b"a\r\nb\r\nc\r\n");
        assert_eq!(EightBit.decode(b"a\nb"), b"a\r\nb");
        assert_eq!(Binary.encode(b"a\nb\rc"), b"a\nb\rc");
    }

    #[test]
    fn identity_costs() {
        let long_line = vec![b'a'; 999];

        for (input, seven, eight) in [
            (&b"plain text"[..], 1.0, 1.0),
            ("caf\u{e9}".as_bytes(), f64::INFINITY, 1.0),
            (&b"nul\x00byte"[..], f64::INFINITY, f64::INFINITY),
            (&long_line[..], f64::INFINITY, f64::INFINITY),
            (&long_line[..998], 1.0, 1.0),
        ] {
            assert_eq!(SevenBit.cost(input), seven, "Failed for {:?}", input);
            assert_eq!(EightBit.cost(input), eight, "Failed for {:?}", input);
            assert_eq!(Binary.cost(input), 1.0, "Failed for {:?}", input);
        }
    }
}
