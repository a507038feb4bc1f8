/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use crate::{ContentType, ParameterHash};

#[derive(Clone, Copy, PartialEq, Debug)]
enum ContentState {
    Type,
    SubType,
    AttributeName,
    AttributeValue,
    AttributeQuotedValue,
    AttributeEnd,
    Comment,
}

struct ContentTypeParser {
    state: ContentState,
    state_stack: Vec<ContentState>,
    comment_depth: usize,

    c_type: String,
    c_subtype: Option<String>,

    attr_name: String,
    attr_value: String,
    attributes: ParameterHash,

    is_escaped: bool,
}

impl ContentTypeParser {
    fn add_attribute(&mut self) {
        let name = self.attr_name.trim();
        if !name.is_empty() {
            self.attributes
                .insert(name, self.attr_value.trim_end_matches([' ', '\t']));
        }
        self.attr_name.clear();
        self.attr_value.clear();
    }
}

/// Parses a `Content-Type` or `Content-Disposition` value.
///
/// The type and subtype are lowercased. Parameter names are stored as they
/// appear, RFC 2231 section suffixes included, so that [`ParameterHash::get`]
/// can reassemble them. Parameters lacking a value are ignored.
pub fn parse_content_type(raw: &str) -> Result<ContentType<'static>, String> {
    let mut parser = ContentTypeParser {
        state: ContentState::Type,
        state_stack: Vec::new(),
        comment_depth: 0,
        c_type: String::new(),
        c_subtype: None,
        attr_name: String::new(),
        attr_value: String::new(),
        attributes: ParameterHash::new(),
        is_escaped: false,
    };

    for ch in raw.chars() {
        if matches!(ch, '\r' | '\n') {
            continue;
        }

        match parser.state {
            ContentState::Type | ContentState::SubType | ContentState::AttributeName
            | ContentState::AttributeValue | ContentState::AttributeEnd
                if ch == '(' =>
            {
                parser.state_stack.push(parser.state);
                parser.state = ContentState::Comment;
                parser.comment_depth = 1;
            }
            ContentState::Type => match ch {
                '/' => {
                    parser.c_subtype = Some(String::new());
                    parser.state = ContentState::SubType;
                }
                ';' => parser.state = ContentState::AttributeName,
                ' ' | '\t' => (),
                _ => parser.c_type.push(ch.to_ascii_lowercase()),
            },
            ContentState::SubType => match ch {
                ';' => parser.state = ContentState::AttributeName,
                ' ' | '\t' => (),
                _ => {
                    if let Some(subtype) = &mut parser.c_subtype {
                        subtype.push(ch.to_ascii_lowercase());
                    }
                }
            },
            ContentState::AttributeName => match ch {
                '=' => parser.state = ContentState::AttributeValue,
                ';' => parser.attr_name.clear(),
                ' ' | '\t' => (),
                _ => parser.attr_name.push(ch),
            },
            ContentState::AttributeValue => match ch {
                ';' => {
                    parser.add_attribute();
                    parser.state = ContentState::AttributeName;
                }
                '"' if parser.attr_value.is_empty() => {
                    parser.state = ContentState::AttributeQuotedValue;
                }
                ' ' | '\t' if parser.attr_value.is_empty() => (),
                _ => parser.attr_value.push(ch),
            },
            ContentState::AttributeQuotedValue => match ch {
                '\\' if !parser.is_escaped => parser.is_escaped = true,
                '"' if !parser.is_escaped => {
                    let value = std::mem::take(&mut parser.attr_value);
                    let name = std::mem::take(&mut parser.attr_name);
                    let name = name.trim();
                    if !name.is_empty() {
                        parser.attributes.insert(name, value);
                    }
                    parser.state = ContentState::AttributeEnd;
                }
                _ => {
                    parser.is_escaped = false;
                    parser.attr_value.push(ch);
                }
            },
            ContentState::AttributeEnd => {
                if ch == ';' {
                    parser.state = ContentState::AttributeName;
                }
            }
            ContentState::Comment => match ch {
                '\\' if !parser.is_escaped => parser.is_escaped = true,
                '(' if !parser.is_escaped => parser.comment_depth += 1,
                ')' if !parser.is_escaped => {
                    parser.comment_depth -= 1;
                    if parser.comment_depth == 0 {
                        parser.state = parser.state_stack.pop().unwrap_or(ContentState::Type);
                    }
                }
                _ => parser.is_escaped = false,
            },
        }
    }

    match parser.state {
        ContentState::AttributeQuotedValue => {
            return Err("unterminated quoted string".to_string());
        }
        ContentState::Comment => return Err("unterminated comment".to_string()),
        ContentState::AttributeValue => parser.add_attribute(),
        _ => (),
    }

    if parser.c_type.is_empty() {
        return Err("missing content type".to_string());
    }

    Ok(ContentType {
        c_type: parser.c_type.into(),
        c_subtype: parser
            .c_subtype
            .filter(|subtype| !subtype.is_empty())
            .map(Into::into),
        attributes: parser.attributes,
    })
}
