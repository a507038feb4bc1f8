/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

//! # mail-fields
//!
//! _mail-fields_ is the structured-field and content-transcoding engine of an Internet mail
//! library. It turns raw header text into typed values and renders those values back into
//! wire-compliant header lines and bodies, following _RFC 5322_ and the MIME standards
//! (_RFC 2045 - 2047_, _RFC 2231_).
//!
//! The crate covers:
//!
//! - **Addresses**: address lists with individual and group recipients, display names and
//!   angle addresses ([`AddressList`], [`Address`]).
//! - **Charset codecs**: per-charset transformation rules applied before text reaches the wire,
//!   with an identity [`BaseCodec`] and an ISO-2022-JP specialization, looked up by canonical
//!   name through a [`CharsetRegistry`].
//! - **Transfer encodings**: `7bit`, `8bit`, `binary`, `base64`, `quoted-printable` and
//!   `x-uuencode`, with transport compatibility checks and cost-based selection
//!   ([`TransferEncodingRegistry`]).
//! - **MIME parameters**: RFC 2231 continuations, charset tags and percent encoding
//!   ([`ParameterHash`]).
//! - **Header folding**: RFC 5322 line folding at 78 octets.
//! - **Header fields**: the glue that binds a raw value to its parsed element and its cached
//!   wire form ([`HeaderField`], [`MessageHeaders`]).
//!
//! Raw field text is parsed by a [`GrammarParser`]. The crate ships [`DefaultGrammar`], a
//! permissive parser for address lists, content types and transfer encodings, and any other
//! grammar engine can be plugged in through [`Context::with_grammar`].
//!
//! Character set conversion for legacy charsets such as ISO-2022-JP, Shift_JIS or KOI8-R is
//! provided by the optional dependency [encoding_rs](https://crates.io/crates/encoding_rs),
//! enabled by the default `full_encoding` feature.
//!
//! ## Usage Example
//!
//! ```
//! use mail_fields::*;
//!
//! let ctx = Context::new();
//!
//! // Address lists keep individual and group recipients apart
//! let list = AddressList::parse("sam@me.com, my_group: mikel@me.com, bob@you.com;").unwrap();
//! assert_eq!(list.addresses().len(), 3);
//! assert_eq!(list.group_names(), vec!["my_group"]);
//!
//! // RFC 2231 continuations are assembled on lookup
//! let mut params = ParameterHash::new();
//! params.insert("title*0*", "us-ascii'en'This%20is%20even%20more%20");
//! params.insert("title*1*", "%2A%2A%2Afun%2A%2A%2A%20");
//! params.insert("title*2", "isn't it");
//! assert_eq!(params.get("title").unwrap(), "This is even more ***fun*** isn't it");
//!
//! // Header fields render to folded wire lines
//! let mut headers = MessageHeaders::new();
//! headers.set("Subject", "Grüße aus Köln");
//! headers.set("To", "Joe Q. Public <john.q.public@example.com>");
//! print!("{}", headers.encoded(&ctx).unwrap());
//!
//! // Transfer encodings are negotiated by cost
//! let encoding = ctx
//!     .transfer_encodings()
//!     .best_compatible("7bit", "binary", b"\x00\x01\x02\x03");
//! assert_eq!(encoding.mechanism(), Mechanism::Base64);
//! ```

pub mod charsets;
pub mod core;
pub mod decoders;
pub mod encoders;
pub mod encodings;
pub mod parsers;

use std::{borrow::Cow, cell::OnceCell};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use crate::{
    charsets::{
        base::BaseCodec, iso_2022_jp::Iso2022JpCodec, AddressCodec, CharsetCodec,
        CharsetRegistry, MessageCharset,
    },
    core::{
        context::Context,
        error::{ParseError, Result},
    },
    encoders::encoded_word::Scheme,
    encodings::{TransferEncoding, TransferEncodingRegistry},
    parsers::{DefaultGrammar, GrammarParser, ParseTree},
};

/// An RFC 5322 `addr-spec`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AddrSpec<'x> {
    pub local: Cow<'x, str>,
    pub domain: Cow<'x, str>,
}

/// A single mailbox, either in angle-address form or as a bare `addr-spec`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MailboxNode<'x> {
    /// `[display-name] <local@domain>`
    Bracketed {
        #[cfg_attr(feature = "serde", serde(default))]
        #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
        display_name: Option<Cow<'x, str>>,
        spec: AddrSpec<'x>,
    },
    /// `local@domain`
    Bare(AddrSpec<'x>),
}

/// An element of an address list as returned by the grammar adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AddressNode<'x> {
    Mailbox(MailboxNode<'x>),
    Group {
        name: Cow<'x, str>,
        members: Vec<MailboxNode<'x>>,
    },
}

/// An individual address, wrapping one mailbox node.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Address<'x> {
    pub(crate) node: MailboxNode<'x>,
}

/// A parsed address list.
///
/// Holds the nodes returned by the grammar adapter in source order; the
/// flattened list of addresses is built on first access and cached.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AddressList<'x> {
    pub(crate) nodes: Vec<AddressNode<'x>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) addresses: OnceCell<Vec<Address<'x>>>,
}

/// MIME parameters, looked up case-insensitively with RFC 2231 continuations
/// and charset tags resolved transparently.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParameterHash {
    pub(crate) entries: Vec<(String, String)>,
}

/// A `Content-Type` or `Content-Disposition` value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContentType<'x> {
    pub c_type: Cow<'x, str>,
    #[cfg_attr(feature = "serde", serde(default))]
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub c_subtype: Option<Cow<'x, str>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub attributes: ParameterHash,
}

/// A text value or a list of text values handed to a charset codec.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FieldText<'x> {
    Text(Cow<'x, str>),
    TextList(Vec<Cow<'x, str>>),
}

/// Content transfer encoding mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mechanism {
    SevenBit,
    EightBit,
    Binary,
    Base64,
    QuotedPrintable,
    UuEncode,
}

/// The grammar used to parse a header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FieldKind {
    Address,
    ContentType,
    ContentDisposition,
    ContentTransferEncoding,
    Unstructured,
}

/// Cache state of a [`HeaderField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldState {
    Unset,
    ValueSet,
    Parsed,
    Encoded,
}

/// The parsed form of a header field value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FieldElement {
    AddressList(AddressList<'static>),
    ContentType(ContentType<'static>),
    Mechanism(Mechanism),
    Unstructured(String),
}

/// A header field: its raw value plus the lazily derived element and wire form.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderField {
    pub(crate) name: String,
    pub(crate) kind: FieldKind,
    pub(crate) value: Option<String>,
    pub(crate) charset: Option<String>,
    pub(crate) element: Option<FieldElement>,
    pub(crate) encoded: Option<String>,
}

/// An ordered collection of header fields sharing a message charset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MessageHeaders {
    pub(crate) fields: Vec<HeaderField>,
    pub(crate) charset: Option<String>,
}

impl<'x> AddressNode<'x> {
    pub fn into_owned(self) -> AddressNode<'static> {
        match self {
            AddressNode::Mailbox(mailbox) => AddressNode::Mailbox(mailbox.into_owned()),
            AddressNode::Group { name, members } => AddressNode::Group {
                name: name.into_owned().into(),
                members: members.into_iter().map(|m| m.into_owned()).collect(),
            },
        }
    }
}

impl<'x> MailboxNode<'x> {
    pub fn into_owned(self) -> MailboxNode<'static> {
        match self {
            MailboxNode::Bracketed { display_name, spec } => MailboxNode::Bracketed {
                display_name: display_name.map(|name| name.into_owned().into()),
                spec: spec.into_owned(),
            },
            MailboxNode::Bare(spec) => MailboxNode::Bare(spec.into_owned()),
        }
    }
}

impl<'x> AddrSpec<'x> {
    pub fn into_owned(self) -> AddrSpec<'static> {
        AddrSpec {
            local: self.local.into_owned().into(),
            domain: self.domain.into_owned().into(),
        }
    }
}

impl<'x> Address<'x> {
    pub fn into_owned(self) -> Address<'static> {
        Address {
            node: self.node.into_owned(),
        }
    }
}

impl<'x> ContentType<'x> {
    pub fn into_owned(self) -> ContentType<'static> {
        ContentType {
            c_type: self.c_type.into_owned().into(),
            c_subtype: self.c_subtype.map(|s| s.into_owned().into()),
            attributes: self.attributes,
        }
    }
}

impl<'x> FieldText<'x> {
    pub fn into_owned(self) -> FieldText<'static> {
        match self {
            FieldText::Text(text) => FieldText::Text(text.into_owned().into()),
            FieldText::TextList(list) => {
                FieldText::TextList(list.into_iter().map(|t| t.into_owned().into()).collect())
            }
        }
    }

    /// Returns the scalar text, or `None` for a list.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldText::Text(text) => Some(text.as_ref()),
            FieldText::TextList(_) => None,
        }
    }

    /// Returns the value as a slice of texts, a scalar being a list of one.
    pub fn as_list(&self) -> Vec<&str> {
        match self {
            FieldText::Text(text) => vec![text.as_ref()],
            FieldText::TextList(list) => list.iter().map(|t| t.as_ref()).collect(),
        }
    }
}

impl<'x> From<&'x str> for FieldText<'x> {
    fn from(text: &'x str) -> Self {
        FieldText::Text(text.into())
    }
}

impl From<String> for FieldText<'static> {
    fn from(text: String) -> Self {
        FieldText::Text(text.into())
    }
}

impl<'x> From<Vec<&'x str>> for FieldText<'x> {
    fn from(list: Vec<&'x str>) -> Self {
        FieldText::TextList(list.into_iter().map(Cow::Borrowed).collect())
    }
}

impl<'x> ContentType<'x> {
    pub fn ctype(&self) -> &str {
        &self.c_type
    }

    pub fn subtype(&self) -> Option<&str> {
        self.c_subtype.as_deref()
    }

    pub fn attribute(&self, name: &str) -> Option<Cow<'_, str>> {
        self.attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.get(name).is_some()
    }

    pub fn is_text(&self) -> bool {
        self.c_type.eq_ignore_ascii_case("text")
    }
}
