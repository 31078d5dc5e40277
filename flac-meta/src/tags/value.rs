//! Heterogeneous tag values and the canonical tag map they live in.

use std::collections::BTreeMap;
use std::collections::btree_map;

/// A single tag's value: scalar string, integer, ordered string list, or blob.
///
/// Mirrors the "tagged variant" design note for the distilled tag universe:
/// Vorbis comments are usually scalar strings, but some vendors emit
/// multi-valued fields, and a few fields (`BPM`, `TRACKNUM`, `COVER_LENGTH`)
/// are numeric throughout the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub enum TagValue {
    Str(String),
    Int(i64),
    List(Vec<String>),
    Bytes(Vec<u8>),
}

impl TagValue {
    /// Borrow the value as a string, if it holds one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Borrow the value as a byte slice, if it holds one.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            TagValue::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// Borrow the value as an integer, if it holds one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            TagValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Borrow the value as an ordered string list, if it holds one.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            TagValue::List(l) => Some(l.as_slice()),
            _ => None,
        }
    }

    /// Render the value as a human-displayable string, for tags that are
    /// logically scalar but may have arrived as a list (e.g. `DATE`).
    pub fn display_string(&self) -> String {
        match self {
            TagValue::Str(s) => s.clone(),
            TagValue::Int(i) => i.to_string(),
            TagValue::List(l) => l.join(", "),
            TagValue::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }

    /// Byte length, as used by `COVER_LENGTH` bookkeeping.
    pub fn byte_len(&self) -> usize {
        match self {
            TagValue::Bytes(b) => b.len(),
            TagValue::Str(s) => s.len(),
            TagValue::Int(_) => 0,
            TagValue::List(l) => l.iter().map(|s| s.len()).sum(),
        }
    }
}

impl From<&str> for TagValue {
    fn from(s: &str) -> Self {
        TagValue::Str(s.to_string())
    }
}

impl From<String> for TagValue {
    fn from(s: String) -> Self {
        TagValue::Str(s)
    }
}

impl From<i64> for TagValue {
    fn from(i: i64) -> Self {
        TagValue::Int(i)
    }
}

impl From<bool> for TagValue {
    fn from(b: bool) -> Self {
        TagValue::Str(if b { "1".to_string() } else { "0".to_string() })
    }
}

impl From<f64> for TagValue {
    /// `TagValue` has no float variant (§3.1); floating fields such as
    /// `SECS` are stored as their canonical string rendering.
    fn from(f: f64) -> Self {
        TagValue::Str(format!("{f}"))
    }
}

impl TagValue {
    /// Reads back a value stored via `TagValue::from(f64)`.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_str()?.parse().ok()
    }
}

/// A canonical tag map: uppercase keys to heterogeneous values.
///
/// Iteration order is deterministic (`BTreeMap` underneath) so tests that
/// assert exact output don't depend on hash-map ordering.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TagMap(BTreeMap<String, TagValue>);

impl TagMap {
    pub fn new() -> Self {
        TagMap(BTreeMap::new())
    }

    /// Insert a value under `key`, upper-casing the key first.
    pub fn set(&mut self, key: impl AsRef<str>, value: impl Into<TagValue>) {
        self.0.insert(key.as_ref().to_uppercase(), value.into());
    }

    /// Remove `key` (case-insensitively upper-cased) and return its value.
    pub fn remove(&mut self, key: impl AsRef<str>) -> Option<TagValue> {
        self.0.remove(&key.as_ref().to_uppercase())
    }

    pub fn get(&self, key: impl AsRef<str>) -> Option<&TagValue> {
        self.0.get(&key.as_ref().to_uppercase())
    }

    pub fn contains(&self, key: impl AsRef<str>) -> bool {
        self.0.contains_key(&key.as_ref().to_uppercase())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Move `key` from `self` to `dest` under `new_key`, if present.
    ///
    /// This is the renaming primitive used throughout the tag mapper: the
    /// destination receives the value, the source is removed, and absence
    /// of the source key is a silent no-op (§4.2).
    pub fn rename(&mut self, key: &str, new_key: &str) {
        if let Some(value) = self.remove(key) {
            self.set(new_key, value);
        }
    }

    /// Set `key` only if it is not already present.
    pub fn set_if_absent(&mut self, key: impl AsRef<str>, value: impl Into<TagValue>) {
        let key = key.as_ref().to_uppercase();
        self.0.entry(key).or_insert_with(|| value.into());
    }

    /// Copy every entry from `other` into `self` that `self` does not
    /// already have. Used by the strategy fallback and by strategy D's
    /// "copy any unset top-level tag" step.
    pub fn fill_missing_from(&mut self, other: &TagMap) {
        for (k, v) in other.iter() {
            self.0.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }

    /// Overlay `other` atop `self`, with `other`'s values winning on
    /// conflicts. Used for the "existing wins" / "per-track wins" merges
    /// in §4.5.
    pub fn merge_winner(&mut self, winner: &TagMap) {
        for (k, v) in winner.iter() {
            self.0.insert(k.clone(), v.clone());
        }
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, TagValue> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a TagMap {
    type Item = (&'a String, &'a TagValue);
    type IntoIter = btree_map::Iter<'a, String, TagValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, TagValue)> for TagMap {
    fn from_iter<T: IntoIterator<Item = (String, TagValue)>>(iter: T) -> Self {
        let mut map = TagMap::new();
        for (k, v) in iter {
            map.set(k, v);
        }
        map
    }
}
