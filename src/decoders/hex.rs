/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

#[inline(always)]
pub fn hex_value(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        _ => None,
    }
}

#[derive(PartialEq, Debug)]
enum HexState {
    None,
    Percent,
    Hex1(u8, u8),
}

/// Decodes `%XX` escapes. Malformed escapes are copied verbatim.
pub fn decode_hex(src: &[u8]) -> Vec<u8> {
    let mut state = HexState::None;
    let mut result = Vec::with_capacity(src.len());

    for &ch in src {
        state = match state {
            HexState::None => {
                if ch == b'%' {
                    HexState::Percent
                } else {
                    result.push(ch);
                    HexState::None
                }
            }
            HexState::Percent => match hex_value(ch) {
                Some(hex1) => HexState::Hex1(hex1, ch),
                None => {
                    result.push(b'%');
                    if ch == b'%' {
                        HexState::Percent
                    } else {
                        result.push(ch);
                        HexState::None
                    }
                }
            },
            HexState::Hex1(hex1, raw) => match hex_value(ch) {
                Some(hex2) => {
                    result.push((hex1 << 4) | hex2);
                    HexState::None
                }
                None => {
                    result.push(b'%');
                    result.push(raw);
                    if ch == b'%' {
                        HexState::Percent
                    } else {
                        result.push(ch);
                        HexState::None
                    }
                }
            },
        };
    }

    match state {
        HexState::None => (),
        HexState::Percent => result.push(b'%'),
        HexState::Hex1(_, raw) => {
            result.push(b'%');
            result.push(raw);
        }
    }

    result
}
