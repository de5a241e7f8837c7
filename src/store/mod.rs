//! The storage contract every backend satisfies identically.
//!
//! Not-found is an `Ok(None)`, including for ids the backend cannot even parse.
//! `Err` is reserved for backend faults.

mod document;
mod memory;
mod relational;

use async_trait::async_trait;

pub use document::DocumentStore;
pub use memory::MemoryStore;
pub use relational::RelationalStore;

use crate::{
    error::StoreResult,
    models::{Movie, MoviePatch, NewMovie},
};

#[async_trait]
pub trait MovieStore: Send + Sync + 'static {
    /// Every movie, in an order that is stable for the lifetime of the store.
    async fn list_all(&self) -> StoreResult<Vec<Movie>>;

    /// Movies with a genre matching `genre` case-insensitively. Unknown tokens match nothing.
    async fn list_by_genre(&self, genre: &str) -> StoreResult<Vec<Movie>>;

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Movie>>;

    /// Persists validated fields under a freshly generated id.
    async fn create(&self, movie: NewMovie) -> StoreResult<Movie>;

    /// Applies `patch` to the stored movie and returns the merged record.
    async fn update(&self, id: &str, patch: &MoviePatch) -> StoreResult<Option<Movie>>;

    /// Removes the movie and returns it as it was just before deletion.
    async fn delete(&self, id: &str) -> StoreResult<Option<Movie>>;
}
