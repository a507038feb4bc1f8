/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::borrow::Cow;

use crate::{
    decoders::{charsets::charset_decode_lossy, hex::decode_hex},
    encoders::hex::encode_hex,
    ParameterHash,
};

/// Longest `name=value` segment emitted by [`ParameterHash::encoded`], leaving
/// room for the leading tab and trailing `;` of a folded parameter line.
pub const MAX_SEGMENT_LEN: usize = 76;

pub const DEFAULT_LANGUAGE: &str = "en";

struct Segment<'x> {
    index: Option<u32>,
    is_extended: bool,
    value: &'x str,
}

impl ParameterHash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` verbatim under `key`, replacing any entry whose key is
    /// equal ignoring case.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            *entry = (key, value);
        } else {
            self.entries.push((key, value));
        }
    }

    /// Returns the fully assembled value of parameter `key`.
    ///
    /// An entry named exactly `key` wins. Otherwise every `key*`, `key*N` and
    /// `key*N*` segment is joined in index order, extended segments are
    /// percent-decoded and the result is transcoded from the charset named
    /// in the `charset'language'` prefix of the first segment.
    pub fn get(&self, key: &str) -> Option<Cow<'_, str>> {
        if let Some((_, value)) = self
            .entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
        {
            return Some(value.as_str().into());
        }

        let mut segments = self
            .entries
            .iter()
            .filter_map(|(k, value)| {
                let suffix = segment_suffix(k, key)?;
                let (index, is_extended) = match suffix {
                    "" => (Some(0), true),
                    suffix => match suffix.strip_suffix('*') {
                        Some(index) => (index.parse().ok(), true),
                        None => (suffix.parse().ok(), false),
                    },
                };
                Some(Segment {
                    index,
                    is_extended,
                    value,
                })
            })
            .collect::<Vec<_>>();

        if segments.is_empty() {
            return None;
        }
        segments.sort_by_key(|segment| segment.index.unwrap_or(u32::MAX));

        let mut charset = None;
        let mut bytes = Vec::new();
        for (pos, segment) in segments.iter().enumerate() {
            if segment.is_extended {
                let mut value = segment.value;
                if pos == 0 {
                    if let Some((tag, rest)) = split_charset_tag(value) {
                        charset = Some(tag).filter(|tag| !tag.is_empty());
                        value = rest;
                    }
                }
                bytes.extend_from_slice(&decode_hex(value.as_bytes()));
            } else {
                bytes.extend_from_slice(segment.value.as_bytes());
            }
        }

        Some(
            match charset {
                Some(charset) => charset_decode_lossy(charset, &bytes),
                None => String::from_utf8_lossy(&bytes).into_owned(),
            }
            .into(),
        )
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case(key) || segment_suffix(k, key).is_some())
    }

    /// Removes parameter `key` together with all of its segments.
    pub fn remove(&mut self, key: &str) -> bool {
        let len = self.entries.len();
        self.entries
            .retain(|(k, _)| !k.eq_ignore_ascii_case(key) && segment_suffix(k, key).is_none());
        self.entries.len() != len
    }

    /// Logical parameter names in ascending order, segment suffixes removed.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(self.entries.len());
        for (key, _) in &self.entries {
            let name = key.split_once('*').map_or(key.as_str(), |(name, _)| name);
            if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                names.push(name);
            }
        }
        names.sort_by_key(|name| name.to_ascii_lowercase());
        names
    }

    /// Raw entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders every parameter as `name=value`, fully decoded, joined by `; `.
    pub fn decoded(&self) -> String {
        self.names()
            .into_iter()
            .filter_map(|name| self.get(name).map(|value| format!("{name}={value}")))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Renders the parameters for the wire using the default language tag.
    pub fn encoded(&self) -> String {
        self.encoded_with(DEFAULT_LANGUAGE)
    }

    /// Renders the parameters for the wire.
    ///
    /// ASCII values are quoted, other values and values holding control
    /// characters are percent-encoded as UTF-8 with `language` in the RFC 2231
    /// tag. Values that do not fit in one
    /// segment are split into numbered continuations. Segments are joined by
    /// `;\r\n\t`.
    pub fn encoded_with(&self, language: &str) -> String {
        let mut segments = Vec::new();

        for name in self.names() {
            let Some(value) = self.get(name) else {
                continue;
            };

            if value.is_ascii() && !value.bytes().any(|ch| ch.is_ascii_control() && ch != b'\t') {
                let units = value
                    .chars()
                    .map(|ch| match ch {
                        '"' | '\\' => format!("\\{ch}"),
                        _ => ch.to_string(),
                    })
                    .collect::<Vec<_>>();
                let single = format!("{name}=\"{}\"", units.concat());
                if single.len() <= MAX_SEGMENT_LEN {
                    segments.push(single);
                } else {
                    push_continuations(&mut segments, name, units, None);
                }
            } else {
                let prefix = format!("utf-8'{language}'");
                let units = value
                    .chars()
                    .map(|ch| encode_hex(ch.encode_utf8(&mut [0; 4]).as_bytes()))
                    .collect::<Vec<_>>();
                let single = format!("{name}*={prefix}{}", units.concat());
                if single.len() <= MAX_SEGMENT_LEN {
                    segments.push(single);
                } else {
                    push_continuations(&mut segments, name, units, Some(&prefix));
                }
            }
        }

        segments.join(";\r\n\t")
    }
}

// Returns the text after `name*` when `key` is a segment key of `name`.
fn segment_suffix<'x>(key: &'x str, name: &str) -> Option<&'x str> {
    let prefix = key.as_bytes().get(..name.len())?;
    if prefix.eq_ignore_ascii_case(name.as_bytes()) && key.as_bytes().get(name.len()) == Some(&b'*')
    {
        Some(&key[name.len() + 1..])
    } else {
        None
    }
}

fn split_charset_tag(value: &str) -> Option<(&str, &str)> {
    let (charset, rest) = value.split_once('\'')?;
    let (_language, rest) = rest.split_once('\'')?;

    charset
        .bytes()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, b'-' | b'_' | b'.' | b':'))
        .then_some((charset, rest))
}

// Quoted continuations when `prefix` is None, extended ones otherwise.
fn push_continuations(
    segments: &mut Vec<String>,
    name: &str,
    units: Vec<String>,
    prefix: Option<&str>,
) {
    let head = |index: usize| match prefix {
        Some(prefix) if index == 0 => format!("{name}*{index}*={prefix}"),
        Some(_) => format!("{name}*{index}*="),
        None => format!("{name}*{index}="),
    };
    let quotes = if prefix.is_some() { 0 } else { 2 };
    let emit = |index: usize, text: &str| match prefix {
        Some(_) => format!("{}{text}", head(index)),
        None => format!("{}\"{text}\"", head(index)),
    };

    let mut index = 0;
    let mut current = String::new();
    for unit in units {
        if !current.is_empty()
            && head(index).len() + quotes + current.len() + unit.len() > MAX_SEGMENT_LEN
        {
            segments.push(emit(index, &current));
            current.clear();
            index += 1;
        }
        current.push_str(&unit);
    }
    segments.push(emit(index, &current));
}
