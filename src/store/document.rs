use async_trait::async_trait;
use regex::RegexBuilder;
use serde_json::Value;
use tracing::debug;

use super::MovieStore;
use crate::{
    docdb::{Collection, DocDbError, Document, Filter, ID_FIELD},
    error::{StoreError, StoreResult},
    identifier::{IdScheme, ObjectIds},
    models::{Movie, MoviePatch, NewMovie},
};

const GENRE_FIELD: &str = "genre";

/// Movies as documents in a [`Collection`], keyed by ObjectId-style hex ids.
pub struct DocumentStore {
    collection: Collection,
    ids: ObjectIds,
}

impl DocumentStore {
    pub fn new(collection: Collection) -> Self {
        if let Some(path) = collection.path() {
            debug!(path = %path.display(), "document store backed by file");
        }
        Self { collection, ids: ObjectIds::default() }
    }

    pub fn in_memory() -> Self {
        Self::new(Collection::in_memory())
    }

    fn id_filter(&self, id: &str) -> Option<Filter> {
        self.ids.from_external(id).map(|key| Filter::IdEq(self.ids.to_external(&key)))
    }
}

fn to_document(fields: &impl serde::Serialize) -> StoreResult<Document> {
    match serde_json::to_value(fields).map_err(DocDbError::from)? {
        Value::Object(doc) => Ok(doc),
        other => Err(StoreError::Corrupt(format!("expected an object, got {other}"))),
    }
}

fn from_document(mut doc: Document) -> StoreResult<Movie> {
    let id = doc
        .remove(ID_FIELD)
        .ok_or_else(|| StoreError::Corrupt(format!("document without {ID_FIELD}")))?;
    doc.insert("id".to_string(), id);
    serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn from_documents(docs: Vec<Document>) -> StoreResult<Vec<Movie>> {
    docs.into_iter().map(from_document).collect()
}

#[async_trait]
impl MovieStore for DocumentStore {
    async fn list_all(&self) -> StoreResult<Vec<Movie>> {
        from_documents(self.collection.find(&Filter::All).await)
    }

    async fn list_by_genre(&self, genre: &str) -> StoreResult<Vec<Movie>> {
        let pattern = RegexBuilder::new(&regex::escape(genre))
            .case_insensitive(true)
            .build()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let filter = Filter::ElemMatch { field: GENRE_FIELD.to_string(), pattern };
        from_documents(self.collection.find(&filter).await)
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Movie>> {
        let Some(filter) = self.id_filter(id) else {
            return Ok(None);
        };
        self.collection.find_one(&filter).await.map(from_document).transpose()
    }

    async fn create(&self, movie: NewMovie) -> StoreResult<Movie> {
        let id = self.ids.to_external(&self.ids.generate());
        let mut doc = to_document(&movie)?;
        doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));

        self.collection.insert_one(doc).await?;
        debug!(id = %id, "inserted movie document");
        Ok(movie.with_id(id))
    }

    async fn update(&self, id: &str, patch: &MoviePatch) -> StoreResult<Option<Movie>> {
        let Some(filter) = self.id_filter(id) else {
            return Ok(None);
        };
        let set = to_document(patch)?;
        self.collection.find_one_and_update(&filter, set).await?.map(from_document).transpose()
    }

    async fn delete(&self, id: &str) -> StoreResult<Option<Movie>> {
        let Some(filter) = self.id_filter(id) else {
            return Ok(None);
        };
        self.collection.find_one_and_delete(&filter).await?.map(from_document).transpose()
    }
}
