/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::borrow::Cow;

use crate::{
    charsets::{AddressCodec, CharsetCodec, MessageCharset},
    core::{
        address::quote_phrase,
        context::Context,
        fold::fold,
    },
    decoders::encoded_word::decode_encoded_words,
    encoders::encoded_word::{encode_non_ascii_runs, encode_shortest},
    parsers::{fields::unstructured::unfold, ParseTree},
    Address, AddressList, AddressNode, ContentType, FieldElement, FieldKind, FieldState, FieldText,
    HeaderField, MailboxNode, MessageHeaders, ParseError, Result,
};

impl FieldKind {
    /// Classifies a header by name, ignoring case.
    pub fn from_name(name: &str) -> FieldKind {
        hashify::tiny_map_ignore_case!(name.trim().as_bytes(),
            "From" => FieldKind::Address,
            "Sender" => FieldKind::Address,
            "Reply-To" => FieldKind::Address,
            "To" => FieldKind::Address,
            "Cc" => FieldKind::Address,
            "Bcc" => FieldKind::Address,
            "Resent-From" => FieldKind::Address,
            "Resent-Sender" => FieldKind::Address,
            "Resent-To" => FieldKind::Address,
            "Resent-Cc" => FieldKind::Address,
            "Resent-Bcc" => FieldKind::Address,
            "Return-Receipt-To" => FieldKind::Address,
            "Disposition-Notification-To" => FieldKind::Address,
            "Content-Type" => FieldKind::ContentType,
            "Content-Disposition" => FieldKind::ContentDisposition,
            "Content-Transfer-Encoding" => FieldKind::ContentTransferEncoding,
        )
        .unwrap_or(FieldKind::Unstructured)
    }

    pub fn is_structured(&self) -> bool {
        !matches!(self, FieldKind::Unstructured)
    }
}

impl From<ParseTree<'_>> for FieldElement {
    fn from(tree: ParseTree<'_>) -> Self {
        match tree {
            ParseTree::AddressList(nodes) => {
                FieldElement::AddressList(AddressList::from_nodes(nodes).into_owned())
            }
            ParseTree::ContentType(content_type) => {
                FieldElement::ContentType(content_type.into_owned())
            }
            ParseTree::Mechanism(mechanism) => FieldElement::Mechanism(mechanism),
            ParseTree::Unstructured(text) => FieldElement::Unstructured(text.into_owned()),
        }
    }
}

impl HeaderField {
    /// Creates an empty field, classifying it by name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        HeaderField {
            kind: FieldKind::from_name(&name),
            name,
            value: None,
            charset: None,
            element: None,
            encoded: None,
        }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut field = Self::new(name);
        field.set_value(value);
        field
    }

    /// Replaces the raw value, dropping the cached element and wire form.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
        self.element = None;
        self.encoded = None;
    }

    /// Sets the charset used for non-ASCII text, dropping the cached wire form.
    pub fn set_charset(&mut self, charset: impl Into<String>) {
        self.charset = Some(charset.into());
        self.encoded = None;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    pub fn state(&self) -> FieldState {
        if self.value.is_none() {
            FieldState::Unset
        } else if self.encoded.is_some() {
            FieldState::Encoded
        } else if self.element.is_some() {
            FieldState::Parsed
        } else {
            FieldState::ValueSet
        }
    }

    /// Returns the parsed value, parsing it on first access.
    pub fn element(&mut self, ctx: &Context) -> Result<&FieldElement> {
        if self.element.is_none() {
            let value = self.value.as_deref().ok_or_else(|| self.unset_error())?;
            let element = FieldElement::from(ctx.parse(self.kind, value)?);
            self.element = Some(element);
        }

        self.element.as_ref().ok_or_else(|| self.unset_error())
    }

    /// Returns the folded wire form, `CRLF` terminated, encoding it on first
    /// access.
    pub fn encoded(&mut self, ctx: &Context) -> Result<&str> {
        if self.encoded.is_none() {
            if self.kind.is_structured() {
                self.element(ctx)?;
            }
            let encoded = self.render(ctx)?;
            self.encoded = Some(encoded);
        }

        self.encoded.as_deref().ok_or_else(|| self.unset_error())
    }

    /// Returns the human readable value with encoded words and parameter
    /// encodings resolved.
    pub fn decoded(&mut self, ctx: &Context) -> Result<String> {
        if self.kind.is_structured() {
            self.element(ctx)?;
        }
        let value = self.value.as_deref().ok_or_else(|| self.unset_error())?;
        let codec = ctx.charsets().get(self.effective_charset(ctx));

        Ok(match &self.element {
            Some(FieldElement::AddressList(list)) => codec.decode_common_address(
                &AddressFieldCodec {
                    list,
                    codec,
                    charset: self.effective_charset(ctx),
                },
                value,
            ),
            Some(FieldElement::ContentType(content_type)) => {
                let mut decoded = content_type_name(content_type);
                if !content_type.attributes.is_empty() {
                    decoded.push_str("; ");
                    decoded.push_str(&content_type.attributes.decoded());
                }
                decoded
            }
            Some(FieldElement::Mechanism(mechanism)) => mechanism.as_str().to_string(),
            Some(FieldElement::Unstructured(text)) => {
                codec.decode_unstructured_field(text).unwrap_or_default()
            }
            None => codec
                .decode_unstructured_field(&unfold(value))
                .unwrap_or_default(),
        })
    }

    fn effective_charset<'x>(&'x self, ctx: &'x Context) -> &'x str {
        self.charset.as_deref().unwrap_or(ctx.default_charset())
    }

    fn unset_error(&self) -> ParseError {
        ParseError::new("", format!("header {:?} has no value", self.name))
    }

    fn render(&self, ctx: &Context) -> Result<String> {
        let value = self.value.as_deref().ok_or_else(|| self.unset_error())?;
        let charset = self.effective_charset(ctx);
        let codec = ctx.charsets().get(charset);

        let line = match (&self.element, self.kind) {
            (_, FieldKind::Unstructured) | (Some(FieldElement::Unstructured(_)), _) => {
                fold(&format!(
                    "{}: {}",
                    self.name,
                    encode_unstructured(codec, value, charset)
                ))
            }
            (Some(FieldElement::AddressList(list)), _) => {
                let rendered = codec.encode_common_address(
                    &AddressFieldCodec {
                        list,
                        codec,
                        charset,
                    },
                    value,
                    &self.name,
                );
                fold(&format!("{}: {}", self.name, rendered))
            }
            (Some(FieldElement::ContentType(content_type)), _) => {
                let mut line = format!("{}: {}", self.name, content_type_name(content_type));
                if !content_type.attributes.is_empty() {
                    line.push_str(";\r\n\t");
                    line.push_str(
                        &content_type
                            .attributes
                            .encoded_with(ctx.parameter_language()),
                    );
                }
                line
            }
            (Some(FieldElement::Mechanism(mechanism)), _) => {
                format!("{}: {}", self.name, mechanism.as_str())
            }
            (None, _) => return Err(self.unset_error()),
        };

        Ok(line + "\r\n")
    }
}

fn content_type_name(content_type: &ContentType<'_>) -> String {
    match content_type.subtype() {
        Some(subtype) => format!("{}/{}", content_type.ctype(), subtype),
        None => content_type.ctype().to_string(),
    }
}

fn encode_unstructured(codec: &dyn CharsetCodec, value: &str, charset: &str) -> String {
    let value = unfold(value);
    let value = codec.remap_characters(&value);
    let value = codec.preprocess(&value);

    let encoded = codec.encode(FieldText::Text(Cow::Borrowed(&value)));
    let encoded = encoded.as_list().join(" ");

    if encoded.is_ascii() {
        encoded
    } else {
        encode_non_ascii_runs(&encoded, charset, None)
    }
}

/// Renders a parsed address list for the wire.
struct AddressFieldCodec<'x> {
    list: &'x AddressList<'static>,
    codec: &'x dyn CharsetCodec,
    charset: &'x str,
}

impl AddressFieldCodec<'_> {
    fn render_mailbox(&self, mailbox: &MailboxNode<'_>) -> String {
        let address = Address::new(mailbox.clone());
        let formatted = address.format();
        if formatted.is_ascii() {
            return formatted;
        }

        let formatted = self
            .codec
            .encode_address(FieldText::Text(formatted.into()))
            .as_list()
            .join(", ");
        if formatted.is_ascii() {
            return formatted;
        }

        match address.display_name() {
            Some(name) if !name.is_ascii() => {
                format!("{} <{}>", encode_shortest(name, self.charset), address.address())
            }
            _ => formatted,
        }
    }

    fn render_phrase(&self, phrase: &str) -> String {
        if phrase.is_ascii() {
            quote_phrase(phrase).into_owned()
        } else {
            encode_shortest(phrase, self.charset)
        }
    }
}

impl AddressCodec for AddressFieldCodec<'_> {
    fn decode(&self, text: &str) -> String {
        decode_encoded_words(&unfold(text)).into_owned()
    }

    fn encode(&self, text: &str, field_name: &str) -> String {
        if self.list.is_empty() {
            log::trace!("Empty address list in {field_name:?}, encoding text as is");
            return encode_non_ascii_runs(&unfold(text), self.charset, None);
        }

        let mut rendered = String::with_capacity(text.len() + 16);
        for (pos, node) in self.list.address_nodes().iter().enumerate() {
            if pos > 0 {
                rendered.push_str(", ");
            }
            match node {
                AddressNode::Mailbox(mailbox) => rendered.push_str(&self.render_mailbox(mailbox)),
                AddressNode::Group { name, members } => {
                    rendered.push_str(&self.render_phrase(name));
                    rendered.push(':');
                    for (pos, member) in members.iter().enumerate() {
                        rendered.push_str(if pos > 0 { ", " } else { " " });
                        rendered.push_str(&self.render_mailbox(member));
                    }
                    rendered.push(';');
                }
            }
        }
        rendered
    }
}

impl MessageHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of header `name`, replacing the first field with that
    /// name or appending a new one. New fields inherit the message charset.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut HeaderField {
        let pos = match self
            .fields
            .iter()
            .position(|field| field.name.eq_ignore_ascii_case(name))
        {
            Some(pos) => {
                self.fields[pos].set_value(value);
                pos
            }
            None => {
                let mut field = HeaderField::with_value(name, value);
                if let Some(charset) = &self.charset {
                    field.set_charset(charset.as_str());
                }
                self.fields.push(field);
                self.fields.len() - 1
            }
        };

        &mut self.fields[pos]
    }

    pub fn get(&self, name: &str) -> Option<&HeaderField> {
        self.fields
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut HeaderField> {
        self.fields
            .iter_mut()
            .find(|field| field.name.eq_ignore_ascii_case(name))
    }

    pub fn remove(&mut self, name: &str) -> Option<HeaderField> {
        let pos = self
            .fields
            .iter()
            .position(|field| field.name.eq_ignore_ascii_case(name))?;
        Some(self.fields.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeaderField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Renders every field for the wire, in insertion order.
    pub fn encoded(&mut self, ctx: &Context) -> Result<String> {
        let mut encoded = String::new();
        for field in &mut self.fields {
            encoded.push_str(field.encoded(ctx)?);
        }
        Ok(encoded)
    }
}

impl MessageCharset for MessageHeaders {
    fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    fn set_charset(&mut self, charset: &str) {
        self.charset = Some(charset.to_string());
        for field in &mut self.fields {
            field.set_charset(charset);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        charsets::MessageCharset, Context, FieldElement, FieldKind, FieldState, HeaderField,
        Mechanism, MessageHeaders,
    };

    #[test]
    fn classify_fields() {
        for (name, expected) in [
            ("From", FieldKind::Address),
            ("reply-to", FieldKind::Address),
            ("RESENT-BCC", FieldKind::Address),
            ("Disposition-Notification-To", FieldKind::Address),
            ("Content-Type", FieldKind::ContentType),
            ("content-disposition", FieldKind::ContentDisposition),
            ("Content-Transfer-Encoding", FieldKind::ContentTransferEncoding),
            ("Subject", FieldKind::Unstructured),
            ("X-Mailer", FieldKind::Unstructured),
            ("Resent-Date", FieldKind::Unstructured),
        ] {
            assert_eq!(FieldKind::from_name(name), expected, "Failed for {:?}", name);
        }
    }

    #[test]
    fn field_states() {
        let ctx = Context::new();
        let mut field = HeaderField::new("To");
        assert_eq!(field.state(), FieldState::Unset);
        assert!(field.element(&ctx).is_err());
        assert!(field.encoded(&ctx).is_err());

        field.set_value("a@b.c");
        assert_eq!(field.state(), FieldState::ValueSet);

        assert!(matches!(
            field.element(&ctx),
            Ok(FieldElement::AddressList(list)) if list.len() == 1
        ));
        assert_eq!(field.state(), FieldState::Parsed);

        assert_eq!(field.encoded(&ctx).unwrap(), "To: a@b.c\r\n");
        assert_eq!(field.state(), FieldState::Encoded);

        field.set_charset("iso-8859-1");
        assert_eq!(field.state(), FieldState::Parsed);
        assert_eq!(field.charset(), Some("iso-8859-1"));

        field.set_value("d@e.f, g@h.i");
        assert_eq!(field.state(), FieldState::ValueSet);
        assert_eq!(field.encoded(&ctx).unwrap(), "To: d@e.f, g@h.i\r\n");

        let mut subject = HeaderField::with_value("Subject", "Hello");
        assert_eq!(subject.encoded(&ctx).unwrap(), "Subject: Hello\r\n");
        assert_eq!(subject.state(), FieldState::Encoded);
    }

    #[test]
    fn encode_fields() {
        let ctx = Context::new();

        for (name, value, expected) in [
            ("Subject", "Hello World", "Subject: Hello World\r\n"),
            ("Subject", "folded\r\n subject", "Subject: folded subject\r\n"),
            (
                "Subject",
                "Grüße aus Köln",
                "Subject: =?UTF-8?B?R3LDvMOfZQ==?= aus =?UTF-8?B?S8O2bG4=?=\r\n",
            ),
            (
                "To",
                "Joe Q. Public <john.q.public@example.com>",
                "To: \"Joe Q. Public\" <john.q.public@example.com>\r\n",
            ),
            (
                "Cc",
                "a@x.org, team: b@x.org, c@y.org;, <d@z.org>",
                "Cc: a@x.org, team: b@x.org, c@y.org;, d@z.org\r\n",
            ),
            ("Bcc", "Undisclosed recipients:;", "Bcc: Undisclosed recipients:;\r\n"),
            (
                "To",
                "Dept. Sales: a@x.org;, Grüne Liste: b@x.org;",
                "To: \"Dept. Sales\": a@x.org;, =?UTF-8?Q?Gr=C3=BCne_Liste?=: b@x.org;\r\n",
            ),
            (
                "From",
                "=?utf-8?q?a.b?= <ab@example.com>",
                "From: =?utf-8?q?a.b?= <ab@example.com>\r\n",
            ),
            (
                "From",
                "Jörg <jorg@example.de>",
                "From: =?UTF-8?B?SsO2cmc=?= <jorg@example.de>\r\n",
            ),
            (
                "From",
                "\"Müller, Hans\" <hans@example.de>",
                "From: =?UTF-8?Q?M=C3=BCller=2C_Hans?= <hans@example.de>\r\n",
            ),
            ("Content-Type", "text/html", "Content-Type: text/html\r\n"),
            (
                "Content-Type",
                "Text/Plain; charset=us-ascii",
                "Content-Type: text/plain;\r\n\tcharset=\"us-ascii\"\r\n",
            ),
            (
                "Content-Disposition",
                "attachment; filename=\"résumé.pdf\"",
                "Content-Disposition: attachment;\r\n\tfilename*=utf-8'en'r%C3%A9sum%C3%A9.pdf\r\n",
            ),
            (
                "Content-Transfer-Encoding",
                " BASE64 ",
                "Content-Transfer-Encoding: base64\r\n",
            ),
        ] {
            let mut field = HeaderField::with_value(name, value);
            assert_eq!(
                field.encoded(&ctx).unwrap(),
                expected,
                "Failed for {:?}",
                value
            );
        }
    }

    #[test]
    fn encode_long_fields() {
        let ctx = Context::new();
        let subject = "Ünïcödé sübjéct wörds ".repeat(8);
        let recipients = (0..12)
            .map(|i| format!("Recipient Number {i} <recipient.{i}@example.com>"))
            .collect::<Vec<_>>()
            .join(", ");

        for (name, value) in [
            ("To", recipients.as_str()),
            ("Subject", subject.as_str()),
        ] {
            let mut field = HeaderField::with_value(name, value);
            let encoded = field.encoded(&ctx).unwrap().to_string();
            assert!(encoded.is_ascii(), "Failed for {:?}", name);
            for line in encoded.trim_end().split("\r\n") {
                assert!(line.len() <= 78, "Line too long: {:?}", line);
            }
            assert_eq!(
                field.decoded(&ctx).unwrap().split_whitespace().collect::<Vec<_>>(),
                value.split_whitespace().collect::<Vec<_>>(),
                "Failed for {:?}",
                name
            );
        }
    }

    #[test]
    fn decode_fields() {
        let ctx = Context::new();

        for (name, value, expected) in [
            ("Subject", "=?utf-8?q?caf=C3=A9?= au lait", "café au lait"),
            ("Subject", "   ", ""),
            ("To", "=?utf-8?q?J=C3=B6rg?= <j@x.de>", "Jörg <j@x.de>"),
            (
                "Content-Type",
                "application/x-stuff; title*0*=us-ascii'en'This%20is%20even%20more%20; title*1*=%2A%2A%2Afun%2A%2A%2A%20; title*2=\"isn't it\"",
                "application/x-stuff; title=This is even more ***fun*** isn't it",
            ),
            ("Content-Transfer-Encoding", "Quoted-Printable", "quoted-printable"),
        ] {
            let mut field = HeaderField::with_value(name, value);
            assert_eq!(
                field.decoded(&ctx).unwrap(),
                expected,
                "Failed for {:?}",
                value
            );
        }
    }

    #[test]
    fn surface_parse_errors() {
        let ctx = Context::new();

        for (name, value, reason) in [
            ("To", "sam@", "empty domain"),
            ("Content-Type", "; name=x", "missing content type"),
            ("Content-Transfer-Encoding", "gzip", "unknown transfer encoding \"gzip\""),
        ] {
            let mut field = HeaderField::with_value(name, value);
            let err = field.encoded(&ctx).unwrap_err();
            assert_eq!(err.input(), value, "Failed for {:?}", value);
            assert_eq!(err.reason(), reason, "Failed for {:?}", value);
            assert_eq!(field.state(), FieldState::ValueSet);
        }
    }

    #[test]
    fn message_headers() {
        let ctx = Context::new();
        let mut headers = MessageHeaders::new();
        assert!(headers.is_empty());

        headers.set("From", "a@b.c");
        headers.set("Subject", "first");
        headers.set("subject", "second");
        headers.set("Content-Transfer-Encoding", "8bit");

        assert_eq!(headers.len(), 3);
        assert_eq!(headers.get("SUBJECT").and_then(|f| f.value()), Some("second"));
        assert_eq!(
            headers.encoded(&ctx).unwrap(),
            "From: a@b.c\r\nSubject: second\r\nContent-Transfer-Encoding: 8bit\r\n"
        );

        assert_eq!(
            headers
                .get_mut("content-transfer-encoding")
                .map(|field| field.element(&ctx).cloned()),
            Some(Ok(FieldElement::Mechanism(Mechanism::EightBit)))
        );
        assert!(headers.remove("From").is_some());
        assert!(headers.remove("From").is_none());
        assert_eq!(
            headers.iter().map(|field| field.name()).collect::<Vec<_>>(),
            vec!["Subject", "Content-Transfer-Encoding"]
        );

        headers.set_charset("iso-8859-1");
        assert_eq!(headers.charset(), Some("iso-8859-1"));
        assert_eq!(headers.get("Subject").and_then(|f| f.charset()), Some("iso-8859-1"));
        assert_eq!(
            headers.set("To", "x@y.z").charset(),
            Some("iso-8859-1")
        );

        headers.set("Subject", "café");
        assert_eq!(
            headers.get_mut("Subject").unwrap().encoded(&ctx).unwrap(),
            "Subject: =?ISO-8859-1?Q?caf=E9?=\r\n"
        );
    }
}
