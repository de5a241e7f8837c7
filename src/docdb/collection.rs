use std::path::{Path, PathBuf};

use tokio::sync::RwLock;
use tracing::debug;

use super::{DocDbError, DocResult, Document, Filter, ID_FIELD, document_id};

pub struct Collection {
    docs: RwLock<Vec<Document>>,
    path: Option<PathBuf>,
}

impl Collection {
    pub fn in_memory() -> Self {
        Self { docs: RwLock::new(Vec::new()), path: None }
    }

    /// Opens a file-backed collection, starting empty when the file does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> DocResult<Self> {
        let path = path.into();
        let docs = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Vec<Document>>(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        for doc in &docs {
            document_id(doc).ok_or(DocDbError::MissingId)?;
        }
        debug!(path = %path.display(), documents = docs.len(), "opened document collection");
        Ok(Self { docs: RwLock::new(docs), path: Some(path) })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn count(&self) -> usize {
        self.docs.read().await.len()
    }

    /// Matching documents in insertion order.
    pub async fn find(&self, filter: &Filter) -> Vec<Document> {
        self.docs.read().await.iter().filter(|d| filter.matches(d)).cloned().collect()
    }

    pub async fn find_one(&self, filter: &Filter) -> Option<Document> {
        self.docs.read().await.iter().find(|d| filter.matches(d)).cloned()
    }

    pub async fn insert_one(&self, doc: Document) -> DocResult<()> {
        let id = document_id(&doc).ok_or(DocDbError::MissingId)?.to_string();

        let mut docs = self.docs.write().await;
        if docs.iter().any(|d| document_id(d) == Some(id.as_str())) {
            return Err(DocDbError::DuplicateKey(id));
        }

        let mut next = docs.clone();
        next.push(doc);
        self.persist(&next).await?;
        *docs = next;
        Ok(())
    }

    /// Sets every field of `set` on the first matching document (never `_id`)
    /// and returns the document as it is after the update.
    pub async fn find_one_and_update(
        &self,
        filter: &Filter,
        set: Document,
    ) -> DocResult<Option<Document>> {
        let mut docs = self.docs.write().await;
        let Some(index) = docs.iter().position(|d| filter.matches(d)) else {
            return Ok(None);
        };
        if set.keys().all(|k| k == ID_FIELD) {
            return Ok(Some(docs[index].clone()));
        }

        let mut next = docs.clone();
        let target = &mut next[index];
        for (key, value) in set {
            if key != ID_FIELD {
                target.insert(key, value);
            }
        }
        let updated = target.clone();

        self.persist(&next).await?;
        *docs = next;
        Ok(Some(updated))
    }

    /// Removes the first matching document and returns it.
    pub async fn find_one_and_delete(&self, filter: &Filter) -> DocResult<Option<Document>> {
        let mut docs = self.docs.write().await;
        let Some(index) = docs.iter().position(|d| filter.matches(d)) else {
            return Ok(None);
        };

        let mut next = docs.clone();
        let removed = next.remove(index);

        self.persist(&next).await?;
        *docs = next;
        Ok(Some(removed))
    }

    async fn persist(&self, docs: &[Document]) -> DocResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(docs)?;
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}
