/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

static HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

#[inline(always)]
fn is_attribute_char(ch: u8) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(
            ch,
            b'!' | b'#' | b'$' | b'&' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
        )
}

/// Percent-encodes `bytes` for use in an RFC 2231 extended parameter value.
pub fn encode_hex(bytes: &[u8]) -> String {
    let mut result = String::with_capacity(bytes.len() * 3);

    for &ch in bytes {
        if is_attribute_char(ch) {
            result.push(ch as char);
        } else {
            result.push('%');
            result.push(HEX_CHARS[(ch >> 4) as usize] as char);
            result.push(HEX_CHARS[(ch & 0x0f) as usize] as char);
        }
    }

    result
}
