/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::borrow::Cow;

/// Removes the line breaks that fold a header value, keeping the whitespace
/// that follows them.
pub fn unfold(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['\r', '\n']) {
        return raw.into();
    }

    let mut result = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find(['\r', '\n']) {
        let break_len = if rest[pos..].starts_with("\r\n") { 2 } else { 1 };
        result.push_str(&rest[..pos]);
        if !rest[pos + break_len..].starts_with([' ', '\t']) {
            result.push_str(&rest[pos..pos + break_len]);
        }
        rest = &rest[pos + break_len..];
    }
    result.push_str(rest);

    result.into()
}
