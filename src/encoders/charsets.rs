/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::borrow::Cow;

/// Encodes `text` into the named charset.
///
/// Returns `None` when the charset is unknown or cannot represent every
/// character of `text`.
#[cfg(feature = "full_encoding")]
pub fn charset_encode<'x>(charset: &str, text: &'x str) -> Option<Cow<'x, [u8]>> {
    let charset = charset.trim();
    // encoding_rs maps US-ASCII to windows-1252.
    if charset.eq_ignore_ascii_case("us-ascii") || charset.eq_ignore_ascii_case("ascii") {
        return text.is_ascii().then_some(Cow::Borrowed(text.as_bytes()));
    }

    let encoding = encoding_rs::Encoding::for_label(charset.as_bytes())?;

    // UTF-16 labels encode to UTF-8 in encoding_rs.
    if encoding.output_encoding() != encoding {
        return None;
    }

    let (bytes, _, had_errors) = encoding.encode(text);
    if !had_errors {
        Some(bytes)
    } else {
        None
    }
}

#[cfg(not(feature = "full_encoding"))]
pub fn charset_encode<'x>(charset: &str, text: &'x str) -> Option<Cow<'x, [u8]>> {
    match charset.trim().to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" => Some(Cow::Borrowed(text.as_bytes())),
        "us-ascii" | "ascii" if text.is_ascii() => Some(Cow::Borrowed(text.as_bytes())),
        "iso-8859-1" | "iso_8859-1" | "latin1" if text.chars().all(|ch| (ch as u32) < 0x100) => {
            Some(Cow::Owned(text.chars().map(|ch| ch as u8).collect()))
        }
        _ => None,
    }
}
