//! A small embedded document engine: one collection of JSON objects, queried
//! with filters and mutated with `$set`-style field merges.
//!
//! Documents are keyed by their `_id` string field. A file-backed collection
//! rewrites its file after every mutation; a mutation that cannot be persisted
//! leaves the collection unchanged.

mod collection;

use regex::Regex;
use serde_json::{Map, Value};

pub use collection::Collection;

pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "_id";

#[derive(Debug, thiserror::Error)]
pub enum DocDbError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("document has no string _id")]
    MissingId,
    #[error("duplicate _id: {0}")]
    DuplicateKey(String),
}

pub type DocResult<T> = Result<T, DocDbError>;

#[derive(Clone, Debug)]
pub enum Filter {
    All,
    IdEq(String),
    /// Matches when any string element of the array at `field` matches `pattern`.
    ElemMatch { field: String, pattern: Regex },
}

impl Filter {
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::IdEq(id) => document_id(doc) == Some(id.as_str()),
            Filter::ElemMatch { field, pattern } => doc
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| {
                    items.iter().filter_map(Value::as_str).any(|s| pattern.is_match(s))
                }),
        }
    }
}

pub fn document_id(doc: &Document) -> Option<&str> {
    doc.get(ID_FIELD).and_then(Value::as_str)
}
