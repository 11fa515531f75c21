//! Flat header view over the platform's multimap.
//!
//! Only the first record per name is read. A second value under the same
//! name is dropped here, which loses information if the platform ever sends
//! semantically distinct duplicates.

use crate::event::HeaderMultimap;
use std::collections::BTreeMap;

/// Lower-cased name to first value.
pub fn project(multimap: &HeaderMultimap) -> BTreeMap<String, String> {
    let mut flat = BTreeMap::new();

    for (name, entries) in multimap {
        if let Some(first) = entries.first() {
            flat.entry(name.to_ascii_lowercase())
                .or_insert_with(|| first.value.clone());
        }
    }

    flat
}

/// Replace the first value of an existing header. Returns false when the
/// header is absent or has no records.
pub fn set_first_value(multimap: &mut HeaderMultimap, name: &str, value: &str) -> bool {
    let entries = multimap
        .iter_mut()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, entries)| entries);

    match entries.and_then(|entries| entries.first_mut()) {
        Some(first) => {
            first.value = value.to_string();
            true
        }
        None => false,
    }
}

/// Case-insensitive get/set/remove over a flat header set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderView {
    entries: BTreeMap<String, String>,
}

impl HeaderView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.entries.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.remove(&name.to_ascii_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overlay every header in `other`; `other` wins on collision.
    pub fn merge(&mut self, other: HeaderView) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Name/value pairs, as forwarded upstream.
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.entries.into_iter().collect()
    }
}

impl From<&HeaderMultimap> for HeaderView {
    fn from(multimap: &HeaderMultimap) -> Self {
        Self {
            entries: project(multimap),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderView {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut view = Self::new();
        for (name, value) in iter {
            let name: String = name.into();
            view.set(&name, value);
        }
        view
    }
}
