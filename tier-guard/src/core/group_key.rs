//! Group key normalization.
//!
//! Group values reach the engine as numbers, numeric strings, or padded
//! strings depending on the source file. Every place that builds a group key
//! goes through [`GroupKey::from_value`], which trims text and prints numbers
//! in their shortest form, so `1`, `"1"` and `" 1 "` share a key while
//! `"007"` and `"7"` stay distinct.
//!
//! Numeric equality is only a lookup fallback in [`GroupKeyIndex`]. Digit
//! strings longer than [`MAX_NUMERIC_DIGITS`] are identifiers and never
//! compared as `f64`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::value::format_number;
use super::Value;

/// Separator for composite keys. Not expected to appear in data.
pub const KEY_SEPARATOR: char = '|';

/// Longest digit run an `f64` represents exactly enough to compare keys.
pub const MAX_NUMERIC_DIGITS: usize = 15;

/// Canonical string form of one or more group values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(String);

impl GroupKey {
    /// Canonicalizes a single value.
    ///
    /// Null becomes the empty string, numbers use their shortest form and
    /// text is trimmed.
    pub fn from_value(value: &Value) -> Self {
        let canonical = match value {
            Value::Null => String::new(),
            Value::Number(n) if n.is_finite() => format_number(*n),
            Value::Number(_) => String::new(),
            Value::Text(s) => s.trim().to_string(),
        };
        Self(canonical)
    }

    /// Canonicalizes a tuple of values into one composite key.
    pub fn composite<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let parts: Vec<String> = values
            .into_iter()
            .map(|v| Self::from_value(v).0)
            .collect();
        Self(parts.join(&KEY_SEPARATOR.to_string()))
    }

    /// The canonical string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn folded(&self) -> String {
        self.0.to_lowercase()
    }

    /// Shortest numeric form of the key, if it reads as a number of at most
    /// [`MAX_NUMERIC_DIGITS`] digits.
    fn numeric(&self) -> Option<String> {
        let digits = self.0.bytes().filter(|b| b.is_ascii_digit()).count();
        if digits == 0 || digits > MAX_NUMERIC_DIGITS {
            return None;
        }
        self.0
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(format_number)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Value> for GroupKey {
    fn from(value: &Value) -> Self {
        Self::from_value(value)
    }
}

/// How a lookup in a [`GroupKeyIndex`] was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMatch {
    /// Canonical keys are identical.
    Exact,
    /// Keys differ only by letter case.
    CaseInsensitive,
    /// Keys are different spellings of the same number.
    Numeric,
}

/// Insertion-ordered map from group keys to entries, with case-insensitive
/// and numeric secondary lookups.
///
/// Inserts always key on the exact canonical string; the secondary maps
/// remember the first entry for each folded or numeric form.
#[derive(Debug, Clone)]
pub struct GroupKeyIndex<T> {
    entries: Vec<(GroupKey, T)>,
    exact: HashMap<GroupKey, usize>,
    folded: HashMap<String, usize>,
    numeric: HashMap<String, usize>,
}

impl<T> Default for GroupKeyIndex<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            exact: HashMap::new(),
            folded: HashMap::new(),
            numeric: HashMap::new(),
        }
    }
}

impl<T> GroupKeyIndex<T> {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `key`.
    pub fn insert(&mut self, key: GroupKey, entry: T) {
        match self.exact.get(&key) {
            Some(&idx) => self.entries[idx].1 = entry,
            None => {
                self.push(key, entry);
            }
        }
    }

    fn push(&mut self, key: GroupKey, entry: T) -> usize {
        let idx = self.entries.len();
        self.folded.entry(key.folded()).or_insert(idx);
        if let Some(numeric) = key.numeric() {
            self.numeric.entry(numeric).or_insert(idx);
        }
        self.exact.insert(key.clone(), idx);
        self.entries.push((key, entry));
        idx
    }

    /// Returns true if `key` is present under its exact canonical form.
    pub fn contains(&self, key: &GroupKey) -> bool {
        self.exact.contains_key(key)
    }

    /// Looks up an entry by canonical key, falling back to a case-insensitive
    /// match and then to numeric equality.
    pub fn lookup(&self, key: &GroupKey) -> Option<(&T, KeyMatch)> {
        if let Some(&idx) = self.exact.get(key) {
            return Some((&self.entries[idx].1, KeyMatch::Exact));
        }
        if let Some(&idx) = self.folded.get(&key.folded()) {
            return Some((&self.entries[idx].1, KeyMatch::CaseInsensitive));
        }
        key.numeric()
            .and_then(|n| self.numeric.get(&n))
            .map(|&idx| (&self.entries[idx].1, KeyMatch::Numeric))
    }

    /// Looks up the entry for a raw value.
    pub fn lookup_value(&self, value: &Value) -> Option<(&T, KeyMatch)> {
        self.lookup(&GroupKey::from_value(value))
    }

    /// Returns the entry for `key`, inserting one built by `make` if absent.
    pub fn get_or_insert_with(&mut self, key: GroupKey, make: impl FnOnce() -> T) -> &mut T {
        let idx = match self.exact.get(&key) {
            Some(&idx) => idx,
            None => self.push(key, make()),
        };
        &mut self.entries[idx].1
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &T)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Consumes the index, yielding entries in insertion order.
    pub fn into_entries(self) -> Vec<(GroupKey, T)> {
        self.entries
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_and_trimmed_text_share_a_key() {
        let keys: Vec<GroupKey> = [Value::from(1.0), Value::from("1"), Value::from(" 1 ")]
            .iter()
            .map(GroupKey::from_value)
            .collect();
        assert!(keys.iter().all(|k| k.as_str() == "1"));
    }

    #[test]
    fn test_padded_and_long_digit_strings_keep_their_text() {
        let key = |s: &str| GroupKey::from_value(&Value::from(s));
        assert_eq!(key("007").as_str(), "007");
        assert_eq!(key(" 1.0 ").as_str(), "1.0");
        assert_ne!(key("110101199003071234"), key("110101199003071235"));
    }

    #[test]
    fn test_text_is_trimmed_not_folded() {
        assert_eq!(GroupKey::from_value(&Value::from("  North ")).as_str(), "North");
        assert_eq!(GroupKey::from_value(&Value::Null).as_str(), "");
    }

    #[test]
    fn test_composite_key() {
        let a = Value::from("A");
        let b = Value::from(2.0);
        assert_eq!(GroupKey::composite([&a, &b]).as_str(), "A|2");
    }

    #[test]
    fn test_index_lookup_kinds() {
        let mut index = GroupKeyIndex::new();
        index.insert(GroupKey::from_value(&Value::from("North")), 1);
        index.insert(GroupKey::from_value(&Value::from(7.0)), 2);

        assert_eq!(
            index.lookup_value(&Value::from("North ")),
            Some((&1, KeyMatch::Exact))
        );
        assert_eq!(
            index.lookup_value(&Value::from("NORTH")),
            Some((&1, KeyMatch::CaseInsensitive))
        );
        assert_eq!(index.lookup_value(&Value::from("7")), Some((&2, KeyMatch::Exact)));
        assert_eq!(
            index.lookup_value(&Value::from("007")),
            Some((&2, KeyMatch::Numeric))
        );
        assert_eq!(
            index.lookup_value(&Value::from(" 7.0")),
            Some((&2, KeyMatch::Numeric))
        );
        assert_eq!(index.lookup_value(&Value::from("south")), None);
    }

    #[test]
    fn test_long_ids_never_match_numerically() {
        let mut index = GroupKeyIndex::new();
        index.insert(GroupKey::from_value(&Value::from("110101199003071234")), 1);

        assert_eq!(
            index.lookup_value(&Value::from("110101199003071235")),
            None
        );
        assert_eq!(
            index.lookup_value(&Value::from(" 110101199003071234 ")),
            Some((&1, KeyMatch::Exact))
        );
        assert!(!index.contains(&GroupKey::from_value(&Value::from("110101199003071235"))));
    }

    #[test]
    fn test_exact_keys_do_not_merge_on_insert() {
        let mut index: GroupKeyIndex<u32> = GroupKeyIndex::new();
        for (id, n) in [("007", 10), ("7", 20), ("7.0", 30)] {
            *index.get_or_insert_with(GroupKey::from_value(&Value::from(id)), || 0) += n;
        }
        assert_eq!(index.len(), 3);
        assert_eq!(index.lookup_value(&Value::from(7.0)), Some((&20, KeyMatch::Exact)));
        // Numeric lookups resolve to the first spelling inserted.
        assert_eq!(
            index.lookup_value(&Value::from("07")),
            Some((&10, KeyMatch::Numeric))
        );
    }

    #[test]
    fn test_get_or_insert_preserves_order() {
        let mut index: GroupKeyIndex<Vec<i32>> = GroupKeyIndex::new();
        index
            .get_or_insert_with(GroupKey::from_value(&Value::from("b")), Vec::new)
            .push(1);
        index
            .get_or_insert_with(GroupKey::from_value(&Value::from("a")), Vec::new)
            .push(2);
        index
            .get_or_insert_with(GroupKey::from_value(&Value::from("b")), Vec::new)
            .push(3);
        let entries = index.into_entries();
        assert_eq!(entries[0].0.as_str(), "b");
        assert_eq!(entries[0].1, vec![1, 3]);
        assert_eq!(entries[1].0.as_str(), "a");
    }
}
