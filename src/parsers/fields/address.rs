/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::borrow::Cow;

use crate::{AddrSpec, AddressNode, MailboxNode};

#[derive(Debug, Clone, PartialEq)]
enum Token<'x> {
    Word(&'x str),
    Quoted { raw: &'x str, text: Cow<'x, str> },
    Space,
    LAngle,
    RAngle,
    Comma,
    Colon,
    Semicolon,
}

#[derive(PartialEq, Clone, Copy, Debug)]
enum AddressState {
    Name,
    Address,
}

struct AddressParser<'x> {
    state: AddressState,
    phrase: Vec<Token<'x>>,
    angle: Vec<Token<'x>>,
    has_angle: bool,
    group: Option<(Cow<'x, str>, Vec<MailboxNode<'x>>)>,
    result: Vec<AddressNode<'x>>,
}

/// Parses an RFC 5322 address list into mailbox and group nodes.
///
/// Comments are skipped, empty list elements are ignored and a group missing
/// its closing `;` is accepted. Display names are returned undecoded.
pub fn parse_address_list(raw: &str) -> Result<Vec<AddressNode<'_>>, String> {
    let mut parser = AddressParser {
        state: AddressState::Name,
        phrase: Vec::new(),
        angle: Vec::new(),
        has_angle: false,
        group: None,
        result: Vec::new(),
    };

    for token in tokenize(raw)? {
        match parser.state {
            AddressState::Name => match token {
                Token::Word(_) | Token::Quoted { .. } if parser.has_angle => {
                    return Err("unexpected text after angle address".to_string());
                }
                Token::Word(_) | Token::Quoted { .. } | Token::Space => parser.phrase.push(token),
                Token::LAngle => {
                    if parser.has_angle {
                        return Err("multiple angle addresses in mailbox".to_string());
                    }
                    parser.has_angle = true;
                    parser.state = AddressState::Address;
                }
                Token::RAngle => return Err("unexpected '>'".to_string()),
                Token::Comma => add_mailbox(&mut parser)?,
                Token::Colon => {
                    if parser.has_angle {
                        return Err("unexpected ':' after angle address".to_string());
                    } else if parser.group.is_some() {
                        return Err("nested group".to_string());
                    }
                    let name = phrase_text(std::mem::take(&mut parser.phrase));
                    if name.is_empty() {
                        return Err("missing group name".to_string());
                    }
                    parser.group = Some((name, Vec::new()));
                }
                Token::Semicolon => {
                    add_mailbox(&mut parser)?;
                    add_group(&mut parser);
                }
            },
            AddressState::Address => match token {
                Token::RAngle => parser.state = AddressState::Name,
                Token::LAngle => return Err("nested angle address".to_string()),
                Token::Semicolon => return Err("unexpected ';' in angle address".to_string()),
                Token::Space => (),
                _ => parser.angle.push(token),
            },
        }
    }

    if parser.state == AddressState::Address {
        return Err("unterminated angle address".to_string());
    }
    add_mailbox(&mut parser)?;
    add_group(&mut parser);

    Ok(parser.result)
}

fn add_mailbox(parser: &mut AddressParser<'_>) -> Result<(), String> {
    let phrase = std::mem::take(&mut parser.phrase);

    let mailbox = if parser.has_angle {
        parser.has_angle = false;
        let spec = concat_raw(std::mem::take(&mut parser.angle));
        if spec.is_empty() {
            return Err("empty angle address".to_string());
        }
        let display_name = phrase_text(phrase);

        MailboxNode::Bracketed {
            display_name: (!display_name.is_empty()).then_some(display_name),
            spec: split_spec(strip_route(spec))?,
        }
    } else {
        let first = phrase.iter().position(|t| *t != Token::Space);
        let last = phrase.iter().rposition(|t| *t != Token::Space);
        match (first, last) {
            (Some(first), Some(last)) => {
                if phrase[first..=last].contains(&Token::Space) {
                    return Err("phrase without angle address".to_string());
                }
                MailboxNode::Bare(split_spec(concat_raw(phrase))?)
            }
            _ => return Ok(()),
        }
    };

    match &mut parser.group {
        Some((_, members)) => members.push(mailbox),
        None => parser.result.push(AddressNode::Mailbox(mailbox)),
    }

    Ok(())
}

fn add_group(parser: &mut AddressParser<'_>) {
    if let Some((name, members)) = parser.group.take() {
        parser.result.push(AddressNode::Group { name, members });
    }
}

fn phrase_text(tokens: Vec<Token<'_>>) -> Cow<'_, str> {
    let mut words = tokens.into_iter().filter_map(|token| match token {
        Token::Word(word) => Some(Cow::Borrowed(word)),
        Token::Quoted { text, .. } => Some(text),
        _ => None,
    });

    match (words.next(), words.next()) {
        (None, _) => Cow::Borrowed(""),
        (Some(word), None) => word,
        (Some(first), Some(second)) => {
            let mut text = String::with_capacity(first.len() + second.len() + 16);
            text.push_str(&first);
            for word in std::iter::once(second).chain(words) {
                text.push(' ');
                text.push_str(&word);
            }
            text.into()
        }
    }
}

fn concat_raw(tokens: Vec<Token<'_>>) -> Cow<'_, str> {
    let mut parts = tokens.into_iter().filter_map(|token| match token {
        Token::Word(word) => Some(word),
        Token::Quoted { raw, .. } => Some(raw),
        Token::Comma => Some(","),
        Token::Colon => Some(":"),
        _ => None,
    });

    match (parts.next(), parts.next()) {
        (None, _) => Cow::Borrowed(""),
        (Some(part), None) => Cow::Borrowed(part),
        (Some(first), Some(second)) => {
            let mut text = String::from(first);
            text.push_str(second);
            parts.for_each(|part| text.push_str(part));
            text.into()
        }
    }
}

// Obsolete source routes: <@a.example,@b.example:user@c.example>
fn strip_route(spec: Cow<'_, str>) -> Cow<'_, str> {
    match spec.rfind(':') {
        Some(pos) => match spec {
            Cow::Borrowed(spec) => Cow::Borrowed(&spec[pos + 1..]),
            Cow::Owned(spec) => Cow::Owned(spec[pos + 1..].to_string()),
        },
        None => spec,
    }
}

fn split_spec(spec: Cow<'_, str>) -> Result<AddrSpec<'_>, String> {
    let at = spec
        .rfind('@')
        .ok_or_else(|| format!("missing '@' in address {spec:?}"))?;

    let (local, domain): (Cow<str>, Cow<str>) = match spec {
        Cow::Borrowed(spec) => (spec[..at].into(), spec[at + 1..].into()),
        Cow::Owned(spec) => (spec[..at].to_string().into(), spec[at + 1..].to_string().into()),
    };

    if local.trim().is_empty() {
        Err("empty local part".to_string())
    } else if domain.trim().is_empty() {
        Err("empty domain".to_string())
    } else {
        Ok(AddrSpec { local, domain })
    }
}

fn tokenize(raw: &str) -> Result<Vec<Token<'_>>, String> {
    let bytes = raw.as_bytes();
    let mut tokens = Vec::new();
    let mut word_start = None;
    let mut pos = 0;

    while let Some(&ch) = bytes.get(pos) {
        if !matches!(
            ch,
            b' ' | b'\t' | b'\r' | b'\n' | b'"' | b'(' | b'<' | b'>' | b',' | b':' | b';'
        ) {
            word_start.get_or_insert(pos);
            pos += 1;
            continue;
        }

        if let Some(start) = word_start.take() {
            tokens.push(Token::Word(&raw[start..pos]));
        }

        match ch {
            b' ' | b'\t' | b'\r' | b'\n' => {
                if tokens.last() != Some(&Token::Space) {
                    tokens.push(Token::Space);
                }
                pos += 1;
            }
            b'"' => {
                let end = find_quote_end(bytes, pos)?;
                tokens.push(Token::Quoted {
                    raw: &raw[pos..end],
                    text: unquote(&raw[pos + 1..end - 1]),
                });
                pos = end;
            }
            b'(' => pos = find_comment_end(bytes, pos)?,
            b'<' => {
                tokens.push(Token::LAngle);
                pos += 1;
            }
            b'>' => {
                tokens.push(Token::RAngle);
                pos += 1;
            }
            b',' => {
                tokens.push(Token::Comma);
                pos += 1;
            }
            b':' => {
                tokens.push(Token::Colon);
                pos += 1;
            }
            _ => {
                tokens.push(Token::Semicolon);
                pos += 1;
            }
        }
    }

    if let Some(start) = word_start {
        tokens.push(Token::Word(&raw[start..]));
    }

    Ok(tokens)
}

// Returns the position after the closing quote.
fn find_quote_end(bytes: &[u8], start: usize) -> Result<usize, String> {
    let mut pos = start + 1;

    while let Some(&ch) = bytes.get(pos) {
        match ch {
            b'\\' => pos += 2,
            b'"' => return Ok(pos + 1),
            _ => pos += 1,
        }
    }

    Err("unterminated quoted string".to_string())
}

// Returns the position after the closing parenthesis.
fn find_comment_end(bytes: &[u8], start: usize) -> Result<usize, String> {
    let mut depth = 0;
    let mut pos = start;

    while let Some(&ch) = bytes.get(pos) {
        match ch {
            b'\\' => pos += 1,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(pos + 1);
                }
            }
            _ => (),
        }
        pos += 1;
    }

    Err("unterminated comment".to_string())
}

fn unquote(text: &str) -> Cow<'_, str> {
    if !text.contains(['\\', '\r', '\n']) {
        return text.into();
    }

    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(ch) = chars.next() {
                    result.push(ch);
                }
            }
            '\r' | '\n' => (),
            _ => result.push(ch),
        }
    }
    result.into()
}

#[cfg(test)]
mod tests {
    use crate::{AddrSpec, AddressNode, MailboxNode};

    use super::parse_address_list;

    fn bare<'x>(local: &'x str, domain: &'x str) -> MailboxNode<'x> {
        MailboxNode::Bare(AddrSpec {
            local: local.into(),
            domain: domain.into(),
        })
    }

    fn bracketed<'x>(name: Option<&'x str>, local: &'x str, domain: &'x str) -> MailboxNode<'x> {
        MailboxNode::Bracketed {
            display_name: name.map(Into::into),
            spec: AddrSpec {
                local: local.into(),
                domain: domain.into(),
            },
        }
    }

    #[test]
    fn parse_addresses() {
        let inputs = [
            (
                "mikel@test.lindsaar.net",
                vec![AddressNode::Mailbox(bare("mikel", "test.lindsaar.net"))],
            ),
            (
                "Mikel Lindsaar <mikel@test.lindsaar.net>",
                vec![AddressNode::Mailbox(bracketed(
                    Some("Mikel Lindsaar"),
                    "mikel",
                    "test.lindsaar.net",
                ))],
            ),
            (
                "\"Lindsaar, \\\"Mikel\\\"\" <mikel@test.lindsaar.net>",
                vec![AddressNode::Mailbox(bracketed(
                    Some("Lindsaar, \"Mikel\""),
                    "mikel",
                    "test.lindsaar.net",
                ))],
            ),
            (
                "<mikel@test.lindsaar.net>",
                vec![AddressNode::Mailbox(bracketed(None, "mikel", "test.lindsaar.net"))],
            ),
            (
                "a@b.c, , d@e.f,",
                vec![
                    AddressNode::Mailbox(bare("a", "b.c")),
                    AddressNode::Mailbox(bare("d", "e.f")),
                ],
            ),
            (
                "Pete(A nice \\) chap) <pete(his account)@silly.test(his host)>",
                vec![AddressNode::Mailbox(bracketed(Some("Pete"), "pete", "silly.test"))],
            ),
            (
                "pete(his account)@silly.test",
                vec![AddressNode::Mailbox(bare("pete", "silly.test"))],
            ),
            (
                "\"John Doe\"@example.com",
                vec![AddressNode::Mailbox(bare("\"John Doe\"", "example.com"))],
            ),
            (
                "<@route.one,@route.two:user@example.com>",
                vec![AddressNode::Mailbox(bracketed(None, "user", "example.com"))],
            ),
            (
                "=?utf-8?q?J=C3=B6rg?= <jorg@example.de>",
                vec![AddressNode::Mailbox(bracketed(
                    Some("=?utf-8?q?J=C3=B6rg?="),
                    "jorg",
                    "example.de",
                ))],
            ),
            (
                "A Group:Ed Jones <c@a.test>,joe@where.test,John <jdoe@one.test>;",
                vec![AddressNode::Group {
                    name: "A Group".into(),
                    members: vec![
                        bracketed(Some("Ed Jones"), "c", "a.test"),
                        bare("joe", "where.test"),
                        bracketed(Some("John"), "jdoe", "one.test"),
                    ],
                }],
            ),
            (
                "Undisclosed recipients:;",
                vec![AddressNode::Group {
                    name: "Undisclosed recipients".into(),
                    members: vec![],
                }],
            ),
            (
                "sam@me.com, my_group: mikel@me.com, bob@you.com;",
                vec![
                    AddressNode::Mailbox(bare("sam", "me.com")),
                    AddressNode::Group {
                        name: "my_group".into(),
                        members: vec![bare("mikel", "me.com"), bare("bob", "you.com")],
                    },
                ],
            ),
            (
                "team: a@b.c, d@e.f",
                vec![AddressNode::Group {
                    name: "team".into(),
                    members: vec![bare("a", "b.c"), bare("d", "e.f")],
                }],
            ),
            (
                "Mary Smith <mary@x.test>,\r\n\tjdoe@example.org",
                vec![
                    AddressNode::Mailbox(bracketed(Some("Mary Smith"), "mary", "x.test")),
                    AddressNode::Mailbox(bare("jdoe", "example.org")),
                ],
            ),
            (
                "\"Giant; \\\"Big\\\" Box\" <sysservices@example.net>",
                vec![AddressNode::Mailbox(bracketed(
                    Some("Giant; \"Big\" Box"),
                    "sysservices",
                    "example.net",
                ))],
            ),
            (
                "José Müller <jose@müller.example>",
                vec![AddressNode::Mailbox(bracketed(
                    Some("José Müller"),
                    "jose",
                    "müller.example",
                ))],
            ),
            ("", vec![]),
        ];

        for input in inputs {
            assert_eq!(
                parse_address_list(input.0),
                Ok(input.1),
                "Failed for {:?}",
                input.0
            );
        }
    }

    #[test]
    fn reject_addresses() {
        for (input, reason) in [
            ("\"unterminated <a@b.c>", "unterminated quoted string"),
            ("Name (comment <a@b.c>", "unterminated comment"),
            ("Name <a@b.c", "unterminated angle address"),
            ("just a phrase", "phrase without angle address"),
            ("sam", "missing '@' in address \"sam\""),
            ("@me.com", "empty local part"),
            ("sam@", "empty domain"),
            ("<>", "empty angle address"),
            ("Name <a@b.c> trailing", "unexpected text after angle address"),
            ("a: b: c@d.e;", "nested group"),
            (": a@b.c;", "missing group name"),
            ("a@b.c>", "unexpected '>'"),
            ("<a<b@c.d>>", "nested angle address"),
        ] {
            assert_eq!(
                parse_address_list(input),
                Err(reason.to_string()),
                "Failed for {:?}",
                input
            );
        }
    }
}
