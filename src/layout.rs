use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One desktop icon, identified by its label, at pixel coordinates.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRecord {
    pub name: String,
    pub x: i32,
    pub y: i32,
    /// Accepts the older `path` key when reading.
    #[serde(default, alias = "path", skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
}

impl LayoutRecord {
    pub fn new(name: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            source_path: None,
        }
    }

    pub fn with_source_path(mut self, path: impl Into<String>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    pub fn key(&self) -> String {
        name_key(&self.name)
    }
}

impl std::fmt::Display for LayoutRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.x, self.y)
    }
}

/// Case-insensitive identity of an icon label.
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}

/// Ordered capture of icon positions from a single scan.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct LayoutSet {
    records: Vec<LayoutRecord>,
}

/// Name-keyed view over a saved set.
#[derive(Debug, Default)]
pub struct NameLookup<'a> {
    by_key: HashMap<String, &'a LayoutRecord>,
    /// Records replaced by a later record with the same key.
    pub shadowed: usize,
}

impl<'a> NameLookup<'a> {
    pub fn get(&self, name: &str) -> Option<&'a LayoutRecord> {
        self.by_key.get(&name_key(name)).copied()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl LayoutSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: LayoutRecord) {
        self.records.push(record);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LayoutRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[LayoutRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<LayoutRecord> {
        self.records
    }

    /// Build the restore lookup. When two records share a key the later one
    /// wins and the earlier one is counted in [`NameLookup::shadowed`].
    pub fn lookup_by_name(&self) -> NameLookup<'_> {
        let mut lookup = NameLookup::default();
        for record in &self.records {
            if lookup.by_key.insert(record.key(), record).is_some() {
                lookup.shadowed += 1;
            }
        }
        lookup
    }
}

impl From<Vec<LayoutRecord>> for LayoutSet {
    fn from(records: Vec<LayoutRecord>) -> Self {
        Self { records }
    }
}

impl FromIterator<LayoutRecord> for LayoutSet {
    fn from_iter<I: IntoIterator<Item = LayoutRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for LayoutSet {
    type Item = LayoutRecord;
    type IntoIter = std::vec::IntoIter<LayoutRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a LayoutSet {
    type Item = &'a LayoutRecord;
    type IntoIter = std::slice::Iter<'a, LayoutRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
