/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::sync::Arc;

/// Canonicalizes a charset or transfer encoding name for registry lookups.
///
/// The name is split on `-` and `_`, every segment is capitalized and the
/// segments are concatenated, so `iso-2022-jp`, `ISO_2022_JP` and `Iso-2022-Jp`
/// all map to `Iso2022Jp`.
pub fn canonical_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());

    for segment in name.trim().split(['-', '_']) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.extend(chars.flat_map(char::to_lowercase));
        }
    }

    result
}

/// Registration table keyed by canonical name.
///
/// Entries keep their registration order, which makes iteration (and
/// therefore tie-breaking between entries) deterministic.
pub struct Registry<T: ?Sized> {
    entries: Vec<(String, Arc<T>)>,
}

impl<T: ?Sized> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registers `item` under `name`, replacing any entry with the same canonical name.
    pub fn register(&mut self, name: &str, item: Arc<T>) {
        let name = canonical_name(name);
        if let Some(entry) = self.entries.iter_mut().find(|(key, _)| *key == name) {
            entry.1 = item;
        } else {
            self.entries.push((name, item));
        }
    }

    /// Registers `alias` as another name for the entry registered under `target`.
    pub fn register_alias(&mut self, alias: &str, target: &str) -> bool {
        match self.get_arc(target) {
            Some(item) => {
                self.register(alias, item);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        let name = canonical_name(name);
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, item)| item.as_ref())
    }

    fn get_arc(&self, name: &str) -> Option<Arc<T>> {
        let name = canonical_name(name);
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, item)| item.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates over the distinct registered items, skipping aliases.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(pos, (_, item))| {
                !self.entries[..*pos]
                    .iter()
                    .any(|(_, prev)| Arc::ptr_eq(prev, item))
            })
            .map(|(_, (_, item))| item.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}
