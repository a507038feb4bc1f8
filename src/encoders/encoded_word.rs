/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use base64::{engine::general_purpose::STANDARD, Engine};

use super::charsets::charset_encode;

/// Longest encoded word allowed by RFC 2047.
pub const MAX_WORD_LEN: usize = 75;

static HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

/// RFC 2047 encoding scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scheme {
    B,
    Q,
}

impl Scheme {
    fn tag(&self) -> char {
        match self {
            Scheme::B => 'B',
            Scheme::Q => 'Q',
        }
    }

    fn encode_into(&self, bytes: &[u8], buf: &mut String) {
        match self {
            Scheme::B => STANDARD.encode_string(bytes, buf),
            Scheme::Q => {
                for &ch in bytes {
                    if is_q_safe(ch) {
                        buf.push(ch as char);
                    } else if ch == b' ' {
                        buf.push('_');
                    } else {
                        buf.push('=');
                        buf.push(HEX_CHARS[(ch >> 4) as usize] as char);
                        buf.push(HEX_CHARS[(ch & 0x0f) as usize] as char);
                    }
                }
            }
        }
    }
}

// Running size of an encoded word payload.
#[derive(Debug, Default, Clone, Copy)]
struct PayloadLen {
    octets: usize,
    q_len: usize,
}

impl PayloadLen {
    fn with(self, bytes: &[u8]) -> Self {
        PayloadLen {
            octets: self.octets + bytes.len(),
            q_len: self.q_len
                + bytes
                    .iter()
                    .map(|&ch| if is_q_safe(ch) || ch == b' ' { 1 } else { 3 })
                    .sum::<usize>(),
        }
    }

    fn encoded(&self, scheme: Scheme) -> usize {
        match scheme {
            Scheme::B => self.octets.div_ceil(3) * 4,
            Scheme::Q => self.q_len,
        }
    }
}

#[inline(always)]
fn is_q_safe(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, b'!' | b'*' | b'+' | b'-' | b'/')
}

/// Encodes `text` as one or more RFC 2047 encoded words separated by spaces.
///
/// Every word is at most 75 octets long and is transcoded on its own, so
/// stateful charsets such as ISO-2022-JP return to ASCII at the end of each
/// word. When `charset` cannot represent `text`, UTF-8 is used instead.
pub fn encode_word(text: &str, charset: &str, scheme: Scheme) -> String {
    let charset = if charset_encode(charset, text).is_some() {
        charset.trim().to_ascii_uppercase()
    } else {
        log::trace!("Charset {charset:?} cannot encode {text:?}, using UTF-8");
        "UTF-8".to_string()
    };
    let available = MAX_WORD_LEN.saturating_sub(charset.len() + 7).max(4);

    let mut result = String::with_capacity(text.len() * 2);
    let mut chunk_start = 0;
    let mut payload = PayloadLen::default();

    // Characters are measured one at a time. For stateful charsets this
    // overestimates the chunk, never underestimates it.
    for (pos, ch) in text.char_indices() {
        let bytes = encode_bytes(&charset, ch.encode_utf8(&mut [0; 4]));
        let next = payload.with(&bytes);

        if next.encoded(scheme) > available && pos > chunk_start {
            push_word(
                &mut result,
                &charset,
                scheme,
                &encode_bytes(&charset, &text[chunk_start..pos]),
            );
            chunk_start = pos;
            payload = PayloadLen::default().with(&bytes);
        } else {
            payload = next;
        }
    }

    if chunk_start < text.len() || result.is_empty() {
        push_word(
            &mut result,
            &charset,
            scheme,
            &encode_bytes(&charset, &text[chunk_start..]),
        );
    }

    result
}

fn encode_bytes(charset: &str, text: &str) -> Vec<u8> {
    charset_encode(charset, text)
        .map(|bytes| bytes.into_owned())
        .unwrap_or_else(|| text.as_bytes().to_vec())
}

fn push_word(result: &mut String, charset: &str, scheme: Scheme, bytes: &[u8]) {
    if !result.is_empty() {
        result.push(' ');
    }
    result.push_str("=?");
    result.push_str(charset);
    result.push('?');
    result.push(scheme.tag());
    result.push('?');
    scheme.encode_into(bytes, result);
    result.push_str("?=");
}

/// Encodes `text` as base64 (`B`) encoded words.
pub fn encode_b(text: &str, charset: &str) -> String {
    encode_word(text, charset, Scheme::B)
}

/// Encodes `text` as quoted-printable (`Q`) encoded words.
pub fn encode_q(text: &str, charset: &str) -> String {
    encode_word(text, charset, Scheme::Q)
}

/// Encodes `text` with whichever of the `Q` and `B` schemes yields the
/// shorter result, preferring `Q` on ties.
pub fn encode_shortest(text: &str, charset: &str) -> String {
    let q = encode_word(text, charset, Scheme::Q);
    let b = encode_word(text, charset, Scheme::B);
    if b.len() < q.len() {
        b
    } else {
        q
    }
}

/// Replaces every run of non-ASCII words in `text` with encoded words,
/// leaving ASCII words untouched.
///
/// When `scheme` is `None` the shortest encoding is picked for every run.
pub fn encode_non_ascii_runs(text: &str, charset: &str, scheme: Option<Scheme>) -> String {
    if text.is_ascii() {
        return text.to_string();
    }

    let encode = |run: &str| match scheme {
        Some(scheme) => encode_word(run, charset, scheme),
        None => encode_shortest(run, charset),
    };

    let mut result = String::with_capacity(text.len() * 2);
    let mut copied_to = 0;
    let mut run: Option<(usize, usize)> = None;

    for (start, end) in word_ranges(text) {
        if text[start..end].is_ascii() {
            if let Some((run_start, run_end)) = run.take() {
                result.push_str(&text[copied_to..run_start]);
                result.push_str(&encode(&text[run_start..run_end]));
                copied_to = run_end;
            }
        } else {
            run = Some(match run {
                Some((run_start, _)) => (run_start, end),
                None => (start, end),
            });
        }
    }

    if let Some((run_start, run_end)) = run {
        result.push_str(&text[copied_to..run_start]);
        result.push_str(&encode(&text[run_start..run_end]));
        copied_to = run_end;
    }
    result.push_str(&text[copied_to..]);

    result
}

fn word_ranges(text: &str) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut word_start = None;

    for (pos, ch) in text.char_indices() {
        match (ch.is_whitespace(), word_start) {
            (true, Some(start)) => {
                ranges.push((start, pos));
                word_start = None;
            }
            (false, None) => word_start = Some(pos),
            _ => (),
        }
    }
    if let Some(start) = word_start {
        ranges.push((start, text.len()));
    }

    ranges
}
