/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::{cell::OnceCell, fmt::Display};

use crate::{
    decoders::encoded_word::parse_encoded_word,
    parsers::{parse_field, DefaultGrammar, GrammarParser, ParseTree},
    AddrSpec, Address, AddressList, AddressNode, FieldKind, MailboxNode, ParseError, Result,
};

impl<'x> AddressList<'x> {
    /// Parses an address list with the default grammar.
    pub fn parse(raw: &'x str) -> Result<Self> {
        Self::parse_with(&DefaultGrammar, raw)
    }

    /// Parses an address list with the given grammar adapter.
    pub fn parse_with(grammar: &dyn GrammarParser, raw: &'x str) -> Result<Self> {
        match parse_field(grammar, FieldKind::Address, raw)? {
            ParseTree::AddressList(nodes) => Ok(Self::from_nodes(nodes)),
            _ => Err(ParseError::new(raw, "grammar did not return an address list")),
        }
    }

    pub fn from_nodes(nodes: Vec<AddressNode<'x>>) -> Self {
        AddressList {
            nodes,
            addresses: OnceCell::new(),
        }
    }

    /// Returns the nodes in the order the grammar adapter produced them.
    pub fn address_nodes(&self) -> &[AddressNode<'x>] {
        &self.nodes
    }

    /// Returns every address: individual recipients first, followed by the
    /// members of every group.
    pub fn addresses(&self) -> &[Address<'x>] {
        self.addresses.get_or_init(|| {
            let individuals = self
                .individual_recipients()
                .into_iter()
                .filter_map(|node| match node {
                    AddressNode::Mailbox(mailbox) => Some(Address::new(mailbox.clone())),
                    AddressNode::Group { .. } => None,
                });
            let members = self
                .group_recipients()
                .into_iter()
                .filter_map(|node| match node {
                    AddressNode::Group { members, .. } => Some(members),
                    AddressNode::Mailbox(_) => None,
                })
                .flatten()
                .map(|mailbox| Address::new(mailbox.clone()));

            individuals.chain(members).collect()
        })
    }

    /// Returns the group nodes.
    pub fn group_recipients(&self) -> Vec<&AddressNode<'x>> {
        self.nodes
            .iter()
            .filter(|node| matches!(node, AddressNode::Group { .. }))
            .collect()
    }

    /// Returns every node that is not a group.
    pub fn individual_recipients(&self) -> Vec<&AddressNode<'x>> {
        let groups = self.group_recipients();
        self.nodes
            .iter()
            .filter(|node| !groups.iter().any(|group| std::ptr::eq(*group, *node)))
            .collect()
    }

    /// Returns the names of all groups, in order.
    pub fn group_names(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                AddressNode::Group { name, .. } => Some(name.as_ref()),
                AddressNode::Mailbox(_) => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.addresses().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn into_owned(self) -> AddressList<'static> {
        AddressList::from_nodes(self.nodes.into_iter().map(|n| n.into_owned()).collect())
    }
}

impl PartialEq for AddressList<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl<'x> MailboxNode<'x> {
    pub fn spec(&self) -> &AddrSpec<'x> {
        match self {
            MailboxNode::Bracketed { spec, .. } => spec,
            MailboxNode::Bare(spec) => spec,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        match self {
            MailboxNode::Bracketed { display_name, .. } => display_name.as_deref(),
            MailboxNode::Bare(_) => None,
        }
    }
}

impl<'x> Address<'x> {
    pub fn new(node: MailboxNode<'x>) -> Self {
        Address { node }
    }

    pub fn node(&self) -> &MailboxNode<'x> {
        &self.node
    }

    pub fn local(&self) -> &str {
        self.node.spec().local.trim()
    }

    pub fn domain(&self) -> &str {
        self.node.spec().domain.trim()
    }

    /// Returns `local@domain`.
    pub fn address(&self) -> String {
        format!("{}@{}", self.local(), self.domain())
    }

    pub fn display_name(&self) -> Option<&str> {
        self.node.display_name()
    }

    /// Comments are skipped by the address grammar, so this is always `None`.
    pub fn comments(&self) -> Option<&str> {
        None
    }

    /// Returns the display name, or the comments when there is none.
    pub fn name(&self) -> Option<&str> {
        self.display_name().or_else(|| self.comments())
    }

    /// Renders the address as `display-name <local@domain>`, or as the bare
    /// address when there is no display name.
    pub fn format(&self) -> String {
        match self.display_name() {
            Some(name) => format!("{} <{}>", quote_phrase(name), self.address()),
            None => self.address(),
        }
    }
}

impl Display for Address<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format())
    }
}

/// Quotes a display name when it contains RFC 5322 specials.
///
/// Words that are already RFC 2047 encoded words are not inspected, since an
/// encoded word inside a quoted string is never decoded.
pub fn quote_phrase(phrase: &str) -> std::borrow::Cow<'_, str> {
    if phrase
        .split_whitespace()
        .filter(|word| !is_encoded_word(word))
        .flat_map(str::chars)
        .any(|ch| {
            matches!(
                ch,
                '(' | ')' | '<' | '>' | '[' | ']' | ':' | ';' | '@' | '\\' | ',' | '.' | '"'
            )
        })
    {
        let mut quoted = String::with_capacity(phrase.len() + 2);
        quoted.push('"');
        for ch in phrase.chars() {
            if matches!(ch, '"' | '\\') {
                quoted.push('\\');
            }
            quoted.push(ch);
        }
        quoted.push('"');
        quoted.into()
    } else {
        phrase.into()
    }
}

fn is_encoded_word(word: &str) -> bool {
    parse_encoded_word(word).is_some_and(|(_, len)| len == word.len())
}
