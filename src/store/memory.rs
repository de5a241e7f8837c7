use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::MovieStore;
use crate::{
    error::StoreResult,
    identifier::{IdScheme, TokenIds},
    models::{Movie, MoviePatch, NewMovie},
};

/// An owned, ordered in-process list. Every mutation takes the single write lock.
#[derive(Default)]
pub struct MemoryStore {
    movies: RwLock<Vec<Movie>>,
    ids: TokenIds,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing catalogue; ids are kept as given.
    pub fn with_movies(movies: Vec<Movie>) -> Self {
        Self { movies: RwLock::new(movies), ids: TokenIds }
    }
}

#[async_trait]
impl MovieStore for MemoryStore {
    async fn list_all(&self) -> StoreResult<Vec<Movie>> {
        Ok(self.movies.read().await.clone())
    }

    async fn list_by_genre(&self, genre: &str) -> StoreResult<Vec<Movie>> {
        let movies = self.movies.read().await;
        Ok(movies.iter().filter(|m| m.has_genre(genre)).cloned().collect())
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Movie>> {
        let Some(id) = self.ids.from_external(id) else {
            return Ok(None);
        };
        Ok(self.movies.read().await.iter().find(|m| m.id == id).cloned())
    }

    async fn create(&self, movie: NewMovie) -> StoreResult<Movie> {
        let mut movies = self.movies.write().await;
        let mut id = self.ids.generate();
        while movies.iter().any(|m| m.id == id) {
            id = self.ids.generate();
        }

        let movie = movie.with_id(self.ids.to_external(&id));
        movies.push(movie.clone());
        debug!(id = %movie.id, total = movies.len(), "created movie");
        Ok(movie)
    }

    async fn update(&self, id: &str, patch: &MoviePatch) -> StoreResult<Option<Movie>> {
        let Some(id) = self.ids.from_external(id) else {
            return Ok(None);
        };
        let mut movies = self.movies.write().await;
        let Some(movie) = movies.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        movie.apply(patch);
        Ok(Some(movie.clone()))
    }

    async fn delete(&self, id: &str) -> StoreResult<Option<Movie>> {
        let Some(id) = self.ids.from_external(id) else {
            return Ok(None);
        };
        let mut movies = self.movies.write().await;
        let Some(index) = movies.iter().position(|m| m.id == id) else {
            return Ok(None);
        };
        Ok(Some(movies.remove(index)))
    }
}
