/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

/// Decodes `bytes` from the named charset into a Rust string.
///
/// Returns `None` when the charset is not recognized.
#[cfg(feature = "full_encoding")]
pub fn charset_decode(charset: &str, bytes: &[u8]) -> Option<String> {
    encoding_rs::Encoding::for_label(charset.trim().as_bytes())
        .map(|encoding| encoding.decode(bytes).0.into_owned())
}

#[cfg(not(feature = "full_encoding"))]
pub fn charset_decode(charset: &str, bytes: &[u8]) -> Option<String> {
    hashify::tiny_map_ignore_case!(charset.trim().as_bytes(),
        "utf-8" => NativeCharset::Utf8,
        "utf8" => NativeCharset::Utf8,
        "us-ascii" => NativeCharset::Ascii,
        "ascii" => NativeCharset::Ascii,
        "iso-8859-1" => NativeCharset::Latin1,
        "iso_8859-1" => NativeCharset::Latin1,
        "latin1" => NativeCharset::Latin1,
    )
    .map(|charset| match charset {
        NativeCharset::Utf8 | NativeCharset::Ascii => String::from_utf8_lossy(bytes).into_owned(),
        NativeCharset::Latin1 => bytes.iter().map(|&ch| ch as char).collect(),
    })
}

#[cfg(not(feature = "full_encoding"))]
#[derive(Clone, Copy)]
enum NativeCharset {
    Utf8,
    Ascii,
    Latin1,
}

/// Decodes `bytes` from the named charset, falling back to lossy UTF-8.
pub fn charset_decode_lossy(charset: &str, bytes: &[u8]) -> String {
    charset_decode(charset, bytes).unwrap_or_else(|| {
        log::trace!("Unknown charset {charset:?}, decoding as UTF-8");
        String::from_utf8_lossy(bytes).into_owned()
    })
}
