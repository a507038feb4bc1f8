/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use super::hex::hex_value;

#[derive(PartialEq, Debug)]
enum QuotedPrintableState {
    None,
    Eq,
    EqCr,
    Hex1(u8, u8),
}

/// Decodes quoted-printable data.
///
/// When `is_word` is set the RFC 2047 `Q` rules apply: `_` stands for a space
/// and line breaks are not expected. Otherwise `=` at the end of a line is a
/// soft line break. Malformed escapes are copied verbatim.
pub fn decode_quoted_printable(src: &[u8], is_word: bool) -> Vec<u8> {
    let mut state = QuotedPrintableState::None;
    let mut result = Vec::with_capacity(src.len());

    for &ch in src {
        state = match state {
            QuotedPrintableState::None => match ch {
                b'=' => QuotedPrintableState::Eq,
                b'_' if is_word => {
                    result.push(b' ');
                    QuotedPrintableState::None
                }
                _ => {
                    result.push(ch);
                    QuotedPrintableState::None
                }
            },
            QuotedPrintableState::Eq => match ch {
                b'\n' if !is_word => QuotedPrintableState::None,
                b'\r' if !is_word => QuotedPrintableState::EqCr,
                _ => match hex_value(ch) {
                    Some(hex1) => QuotedPrintableState::Hex1(hex1, ch),
                    None => {
                        result.push(b'=');
                        restart(&mut result, ch, is_word)
                    }
                },
            },
            QuotedPrintableState::EqCr => {
                if ch == b'\n' {
                    QuotedPrintableState::None
                } else {
                    result.extend_from_slice(b"=\r");
                    restart(&mut result, ch, is_word)
                }
            }
            QuotedPrintableState::Hex1(hex1, raw) => match hex_value(ch) {
                Some(hex2) => {
                    result.push((hex1 << 4) | hex2);
                    QuotedPrintableState::None
                }
                None => {
                    result.push(b'=');
                    result.push(raw);
                    restart(&mut result, ch, is_word)
                }
            },
        };
    }

    match state {
        QuotedPrintableState::None => (),
        QuotedPrintableState::Eq => result.push(b'='),
        QuotedPrintableState::EqCr => result.extend_from_slice(b"=\r"),
        QuotedPrintableState::Hex1(_, raw) => {
            result.push(b'=');
            result.push(raw);
        }
    }

    result
}

#[inline(always)]
fn restart(result: &mut Vec<u8>, ch: u8, is_word: bool) -> QuotedPrintableState {
    match ch {
        b'=' => QuotedPrintableState::Eq,
        b'_' if is_word => {
            result.push(b' ');
            QuotedPrintableState::None
        }
        _ => {
            result.push(ch);
            QuotedPrintableState::None
        }
    }
}
