/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::borrow::Cow;

use super::{
    base64::decode_base64, charsets::charset_decode_lossy,
    quoted_printable::decode_quoted_printable,
};

/// Decodes every RFC 2047 encoded word found in `text`.
///
/// Whitespace separating two adjacent encoded words is dropped. Malformed
/// words are left untouched.
pub fn decode_encoded_words(text: &str) -> Cow<'_, str> {
    if !text.contains("=?") {
        return Cow::Borrowed(text);
    }

    let mut result = String::with_capacity(text.len());
    let mut copied_to = 0;
    let mut search_from = 0;
    let mut after_word = false;

    while let Some(offset) = text[search_from..].find("=?") {
        let start = search_from + offset;

        if let Some((decoded, len)) = parse_encoded_word(&text[start..]) {
            let gap = &text[copied_to..start];
            if !after_word || !gap.chars().all(char::is_whitespace) {
                result.push_str(gap);
            }
            result.push_str(&decoded);
            copied_to = start + len;
            search_from = copied_to;
            after_word = true;
        } else {
            search_from = start + 2;
        }
    }

    result.push_str(&text[copied_to..]);
    Cow::Owned(result)
}

/// Parses one encoded word at the start of `text`, returning the decoded
/// string and the number of bytes consumed.
pub fn parse_encoded_word(text: &str) -> Option<(String, usize)> {
    let rest = text.strip_prefix("=?")?;

    let charset_end = rest.find('?')?;
    let charset = &rest[..charset_end];
    if !(1..=45).contains(&charset.len())
        || charset.bytes().any(|ch| ch.is_ascii_whitespace() || ch == b'=')
    {
        return None;
    }
    // RFC 2231 language suffix
    let charset = charset.split_once('*').map_or(charset, |(charset, _)| charset);

    let rest = &rest[charset_end + 1..];
    let is_q = match rest.as_bytes() {
        [b'q' | b'Q', b'?', ..] => true,
        [b'b' | b'B', b'?', ..] => false,
        _ => return None,
    };

    let payload = &rest[2..];
    let payload_end = payload.find("?=")?;
    let payload = &payload[..payload_end];
    if payload.contains(['\r', '\n']) {
        return None;
    }

    let bytes = if is_q {
        decode_quoted_printable(payload.as_bytes(), true)
    } else {
        decode_base64(payload.as_bytes())
    };

    Some((
        charset_decode_lossy(charset, &bytes),
        2 + charset_end + 1 + 2 + payload_end + 2,
    ))
}
