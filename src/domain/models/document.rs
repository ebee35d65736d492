use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::models::{Artwork, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentLayout {
    /// Insertion-ordered list of records
    List,
    /// Records keyed by id
    Map,
}

/// The persisted unit of a namespace. Always read and written as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", content = "records", rename_all = "lowercase")]
pub enum CollectionDocument {
    List(Vec<Record>),
    Map(BTreeMap<String, Record>),
}

impl CollectionDocument {
    pub fn empty(layout: DocumentLayout) -> Self {
        match layout {
            DocumentLayout::List => CollectionDocument::List(Vec::new()),
            DocumentLayout::Map => CollectionDocument::Map(BTreeMap::new()),
        }
    }

    pub fn layout(&self) -> DocumentLayout {
        match self {
            CollectionDocument::List(_) => DocumentLayout::List,
            CollectionDocument::Map(_) => DocumentLayout::Map,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CollectionDocument::List(records) => records.len(),
            CollectionDocument::Map(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        match self {
            CollectionDocument::List(records) => records.iter().find(|r| r.id() == id),
            CollectionDocument::Map(records) => records.get(id),
        }
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Record> {
        match self {
            CollectionDocument::List(records) => records.iter_mut().find(|r| r.id() == id),
            CollectionDocument::Map(records) => records.get_mut(id),
        }
    }

    /// Records in document order (insertion order for lists, id order for maps)
    pub fn records(&self) -> Vec<&Record> {
        match self {
            CollectionDocument::List(records) => records.iter().collect(),
            CollectionDocument::Map(records) => records.values().collect(),
        }
    }

    /// Adds the record, handing it back if its id is already taken
    pub fn insert(&mut self, record: Record) -> Result<(), Record> {
        if self.contains(record.id()) {
            return Err(record);
        }
        match self {
            CollectionDocument::List(records) => records.push(record),
            CollectionDocument::Map(records) => {
                records.insert(record.id().to_string(), record);
            }
        }
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<Record> {
        match self {
            CollectionDocument::List(records) => {
                let idx = records.iter().position(|r| r.id() == id)?;
                Some(records.remove(idx))
            }
            CollectionDocument::Map(records) => records.remove(id),
        }
    }

    /// Every artwork of the document, in document order
    pub fn artworks_mut(&mut self) -> Vec<&mut Artwork> {
        fn artworks(record: &mut Record) -> Option<&mut Artwork> {
            match record {
                Record::Artwork(artwork) => Some(artwork),
                _ => None,
            }
        }
        match self {
            CollectionDocument::List(records) => records.iter_mut().filter_map(artworks).collect(),
            CollectionDocument::Map(records) => {
                records.values_mut().filter_map(artworks).collect()
            }
        }
    }
}

/// Optimistic-concurrency token of a stored document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentVersion {
    /// Nothing stored yet; the next write must create the document
    Absent,
    /// Entity tag of the stored object the caller read
    Tagged(String),
}

impl DocumentVersion {
    pub fn as_tag(&self) -> Option<&str> {
        match self {
            DocumentVersion::Absent => None,
            DocumentVersion::Tagged(tag) => Some(tag),
        }
    }
}

/// A document together with the version it was read at
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedDocument {
    pub document: CollectionDocument,
    pub version: DocumentVersion,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        models::{RecordFields, TextPost},
        value_objects::Namespace,
    };
    use chrono::Utc;

    fn text_post(id: &str) -> Record {
        Record::TextPost(TextPost {
            id: id.to_string(),
            title: format!("Essay {}", id),
            year: None,
            description: None,
            assets: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    #[test]
    fn list_keeps_insertion_order_and_rejects_duplicates() {
        let mut doc = CollectionDocument::empty(DocumentLayout::List);
        doc.insert(text_post("b")).unwrap();
        doc.insert(text_post("a")).unwrap();
        assert!(doc.insert(text_post("a")).is_err());

        let ids: Vec<&str> = doc.records().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["b", "a"]);

        assert!(doc.remove("b").is_some());
        assert!(doc.remove("b").is_none());
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn document_round_trips_through_json() {
        let mut doc = CollectionDocument::empty(DocumentLayout::Map);
        let fields = RecordFields {
            name: Some("Ada Painter".to_string()),
            biography: Some("Born in 1980.".to_string()),
            ..Default::default()
        };
        let profile = Record::from_fields(
            Namespace::Cv,
            "profile".to_string(),
            &fields,
            Vec::new(),
            Utc::now(),
        )
        .unwrap();
        doc.insert(profile).unwrap();

        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"layout\":\"map\""));
        let back: CollectionDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }
}
