use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::{
    error::{ServiceError, ServiceResult},
    models::Movie,
    store::MovieStore,
    validation::Validator,
};

/// The five movie operations, independent of which backend holds the data.
/// Validation always runs before the store is touched.
#[derive(Clone)]
pub struct MovieService {
    store: Arc<dyn MovieStore>,
    validator: Validator,
}

impl MovieService {
    pub fn new(store: Arc<dyn MovieStore>, validator: Validator) -> Self {
        Self { store, validator }
    }

    /// Lists all movies, or only those in `genre` when a non-empty filter is given.
    pub async fn list(&self, genre: Option<&str>) -> ServiceResult<Vec<Movie>> {
        let movies = match genre.filter(|g| !g.is_empty()) {
            Some(genre) => self.store.list_by_genre(genre).await?,
            None => self.store.list_all().await?,
        };
        debug!(count = movies.len(), genre = ?genre, "listed movies");
        Ok(movies)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Movie> {
        self.store.get_by_id(id).await?.ok_or(ServiceError::NotFound)
    }

    pub async fn create(&self, payload: &Value) -> ServiceResult<Movie> {
        let fields = self.validator.validate_create(payload)?;
        let movie = self.store.create(fields).await?;
        debug!(id = %movie.id, title = %movie.title, "created movie");
        Ok(movie)
    }

    pub async fn update(&self, id: &str, payload: &Value) -> ServiceResult<Movie> {
        let patch = self.validator.validate_update(payload)?;
        let movie = self.store.update(id, &patch).await?.ok_or(ServiceError::NotFound)?;
        debug!(id = %movie.id, "updated movie");
        Ok(movie)
    }

    /// Deletes a movie and returns it as it was just before removal.
    pub async fn delete(&self, id: &str) -> ServiceResult<Movie> {
        let movie = self.store.delete(id).await?.ok_or(ServiceError::NotFound)?;
        debug!(id = %movie.id, "deleted movie");
        Ok(movie)
    }
}
