/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::borrow::Cow;

use crate::{
    encoders::encoded_word::{encode_word, Scheme},
    FieldText,
};

use super::{AddressCodec, CharsetCodec, MessageCharset};

pub const CHARSET: &str = "iso-2022-jp";

/// Rules for ISO-2022-JP (RFC 1468) mail.
#[derive(Debug, Default, Clone, Copy)]
pub struct Iso2022JpCodec;

#[inline(always)]
fn remap(ch: char) -> Option<char> {
    match ch {
        '\u{301C}' => Some('\u{FF5E}'), // wave dash
        '\u{2212}' => Some('\u{FF0D}'), // minus sign
        '\u{2014}' => Some('\u{2015}'), // em dash
        '\u{2016}' => Some('\u{2225}'), // double vertical line
        _ => None,
    }
}

impl Iso2022JpCodec {
    fn encode_text(&self, text: &str) -> String {
        let text = self.remap_characters(text);
        if text.is_ascii() {
            text.into_owned()
        } else {
            encode_word(&text, CHARSET, Scheme::B)
        }
    }

    fn encode_address_text(&self, text: &str) -> String {
        match split_angle_suffix(text) {
            Some((display_name, suffix)) => {
                let mut result = self.encode_text(display_name);
                result.push_str(suffix);
                result
            }
            None => self.encode_text(text),
        }
    }
}

// Splits `Name <local@domain>` before the space preceding an all-ASCII
// angle address.
fn split_angle_suffix(text: &str) -> Option<(&str, &str)> {
    let start = text.rfind(" <")?;
    let spec = text[start + 2..].strip_suffix('>')?;
    let (local, domain) = spec.split_once('@')?;

    [local, domain]
        .iter()
        .all(|part| {
            !part.is_empty()
                && part
                    .bytes()
                    .all(|ch| ch.is_ascii_graphic() && !matches!(ch, b'<' | b'>' | b'@'))
        })
        .then(|| text.split_at(start))
}

impl CharsetCodec for Iso2022JpCodec {
    fn remap_characters<'x>(&self, text: &'x str) -> Cow<'x, str> {
        let mut result: Option<String> = None;

        for (pos, ch) in text.char_indices() {
            if let Some(result) = &mut result {
                result.push(remap(ch).unwrap_or(ch));
            } else if let Some(ch) = remap(ch) {
                let mut remapped = String::with_capacity(text.len() + 4);
                remapped.push_str(&text[..pos]);
                remapped.push(ch);
                result = Some(remapped);
            }
        }

        result.map_or(Cow::Borrowed(text), Cow::Owned)
    }

    fn set_charset_on(&self, message: Option<&mut dyn MessageCharset>) {
        if let Some(message) = message {
            if message.charset().is_none() {
                message.set_charset(CHARSET);
            }
        }
    }

    fn encode<'x>(&self, value: FieldText<'x>) -> FieldText<'x> {
        match value {
            FieldText::Text(text) => FieldText::Text(self.encode_text(&text).into()),
            FieldText::TextList(list) => FieldText::TextList(
                list.iter()
                    .map(|text| self.encode_text(text).into())
                    .collect(),
            ),
        }
    }

    fn encode_address<'x>(&self, value: FieldText<'x>) -> FieldText<'x> {
        match value {
            FieldText::Text(text) => FieldText::Text(self.encode_address_text(&text).into()),
            FieldText::TextList(list) => FieldText::TextList(
                list.iter()
                    .map(|text| self.encode_address_text(text).into())
                    .collect(),
            ),
        }
    }

    fn decode_unstructured_field(&self, text: &str) -> Option<String> {
        Some(text.to_string())
    }

    fn decode_common_address(&self, _codec: &dyn AddressCodec, text: &str) -> String {
        text.to_string()
    }
}
