//! Genealogy graph values received from the graph-building service.
//!
//! The service sends `nodes` as a JSON object keyed by the record id in text
//! form. [`Nodes`] decodes those keys back to integer ids and keeps the
//! entries in the order they arrived, which is the order dot output uses.

use std::collections::HashMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Mathematics Genealogy Project record identifier.
pub type RecordId = u64;

/// A single mathematician record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub name: String,
    pub institution: Option<String>,
    pub year: Option<i32>,
    /// May contain duplicates and ids absent from the graph.
    #[serde(default)]
    pub descendants: Vec<RecordId>,
    /// May contain duplicates and ids absent from the graph.
    #[serde(default)]
    pub advisors: Vec<RecordId>,
}

/// Whether the service reached natural closure or stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphStatus {
    Complete,
    Truncated,
}

/// Insertion-ordered map from record id to record. Keys are unique and
/// always equal to the `id` of their record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Nodes {
    entries: Vec<(RecordId, Record)>,
    /// Position of each id in `entries`.
    index: HashMap<RecordId, usize>,
}

impl Nodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record keyed by its own id. Returns false, leaving the map
    /// unchanged, if the id is already present.
    pub fn insert(&mut self, record: Record) -> bool {
        if self.contains(record.id) {
            return false;
        }
        self.index.insert(record.id, self.entries.len());
        self.entries.push((record.id, record));
        true
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.index.get(&id).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.iter().map(|(_, r)| r)
    }
}

impl FromIterator<Record> for Nodes {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut nodes = Nodes::new();
        for record in iter {
            nodes.insert(record);
        }
        nodes
    }
}

impl Serialize for Nodes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, record) in &self.entries {
            map.serialize_entry(&id.to_string(), record)?;
        }
        map.end()
    }
}

struct NodesVisitor;

impl<'de> Visitor<'de> for NodesVisitor {
    type Value = Nodes;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map from record id to record")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Nodes, A::Error> {
        let capacity = access.size_hint().unwrap_or(0);
        let mut nodes = Nodes {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        };

        while let Some((key, record)) = access.next_entry::<String, Record>()? {
            let id: RecordId = key
                .parse()
                .map_err(|_| de::Error::custom(format!("node key {key:?} is not a record id")))?;
            if id != record.id {
                return Err(de::Error::custom(format!(
                    "node key {id} does not match record id {}",
                    record.id
                )));
            }
            if !nodes.insert(record) {
                return Err(de::Error::custom(format!("duplicate node key {id}")));
            }
        }

        Ok(nodes)
    }
}

impl<'de> Deserialize<'de> for Nodes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(NodesVisitor)
    }
}

/// A finished graph as produced by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geneagraph {
    #[serde(rename = "start_nodes", alias = "startNodes")]
    pub start_nodes: Vec<RecordId>,
    pub nodes: Nodes,
    pub status: GraphStatus,
}

impl Geneagraph {
    pub fn is_truncated(&self) -> bool {
        self.status == GraphStatus::Truncated
    }
}
