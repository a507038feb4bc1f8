/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use crate::Mechanism;

/// Parses a `Content-Transfer-Encoding` value, ignoring comments and
/// surrounding whitespace.
pub fn parse_transfer_encoding(raw: &str) -> Result<Mechanism, String> {
    let mut name = String::with_capacity(raw.len());
    let mut depth = 0usize;

    for ch in raw.chars() {
        match ch {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            ' ' | '\t' | '\r' | '\n' => (),
            _ if depth == 0 => name.push(ch),
            _ => (),
        }
    }

    if depth > 0 {
        Err("unterminated comment".to_string())
    } else {
        Mechanism::parse(&name).ok_or_else(|| format!("unknown transfer encoding {name:?}"))
    }
}
