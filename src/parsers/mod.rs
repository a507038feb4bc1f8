/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::borrow::Cow;

use crate::{
    AddressNode, ContentType, FieldKind, Mechanism, ParseError, Result,
};

use self::fields::{
    address::parse_address_list, content_type::parse_content_type,
    transfer_encoding::parse_transfer_encoding, unstructured::unfold,
};

pub mod fields;

/// The typed result of parsing one header field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseTree<'x> {
    AddressList(Vec<AddressNode<'x>>),
    ContentType(ContentType<'x>),
    Mechanism(Mechanism),
    Unstructured(Cow<'x, str>),
}

/// A grammar engine turning raw field text into a [`ParseTree`].
///
/// Failures are reported as a human readable reason, which callers wrap into
/// a [`ParseError`] together with the raw input.
pub trait GrammarParser: Send + Sync {
    fn parse<'x>(&self, kind: FieldKind, raw: &'x str) -> std::result::Result<ParseTree<'x>, String>;
}

/// The built-in grammar adapter.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultGrammar;

impl GrammarParser for DefaultGrammar {
    fn parse<'x>(&self, kind: FieldKind, raw: &'x str) -> std::result::Result<ParseTree<'x>, String> {
        match kind {
            FieldKind::Address => parse_address_list(raw).map(ParseTree::AddressList),
            FieldKind::ContentType | FieldKind::ContentDisposition => {
                parse_content_type(raw).map(ParseTree::ContentType)
            }
            FieldKind::ContentTransferEncoding => {
                parse_transfer_encoding(raw).map(ParseTree::Mechanism)
            }
            FieldKind::Unstructured => Ok(ParseTree::Unstructured(unfold(raw))),
        }
    }
}

impl<'x> ParseTree<'x> {
    pub fn into_owned(self) -> ParseTree<'static> {
        match self {
            ParseTree::AddressList(nodes) => {
                ParseTree::AddressList(nodes.into_iter().map(|n| n.into_owned()).collect())
            }
            ParseTree::ContentType(ct) => ParseTree::ContentType(ct.into_owned()),
            ParseTree::Mechanism(mechanism) => ParseTree::Mechanism(mechanism),
            ParseTree::Unstructured(text) => ParseTree::Unstructured(text.into_owned().into()),
        }
    }
}

/// Runs `grammar` over `raw`, wrapping a failure into a [`ParseError`].
pub fn parse_field<'x>(
    grammar: &dyn GrammarParser,
    kind: FieldKind,
    raw: &'x str,
) -> Result<ParseTree<'x>> {
    grammar.parse(kind, raw).map_err(|reason| {
        log::trace!("Failed to parse {kind:?} field {raw:?}: {reason}");
        ParseError::new(raw, reason)
    })
}
