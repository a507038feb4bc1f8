/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

/// Longest header line, in octets, produced by folding.
pub const MAX_LINE_LEN: usize = 78;

/// Splits a rendered `Name: value` line into the segments of its folded form.
///
/// Each segment ends before the last whitespace run that fits in the line
/// limit. Continuation lines carry a leading tab, so their limit is one octet
/// shorter. A token longer than the limit is never cut; it is emitted whole on
/// its own line.
pub fn fold_segments(line: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut rest = line;
    let mut limit = MAX_LINE_LEN;

    while rest.len() > limit {
        let bytes = rest.as_bytes();
        let is_break = |pos: usize| is_wsp(bytes[pos]) && !is_wsp(bytes[pos - 1]);

        let cut = (1..=limit)
            .rev()
            .find(|&pos| is_break(pos))
            .or_else(|| (limit + 1..bytes.len()).find(|&pos| is_break(pos)));

        let Some(cut) = cut else {
            break;
        };

        segments.push(&rest[..cut]);
        rest = rest[cut..].trim_start_matches([' ', '\t']);
        limit = MAX_LINE_LEN - 1;
    }

    if !rest.is_empty() {
        segments.push(rest);
    }

    segments
}

/// Folds a rendered `Name: value` line, joining segments with `CRLF TAB`.
pub fn fold(line: &str) -> String {
    fold_segments(line).join("\r\n\t")
}

#[inline(always)]
fn is_wsp(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t')
}
