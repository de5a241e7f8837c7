pub mod config;
pub mod db;
pub mod docdb;
pub mod entities;
pub mod error;
pub mod identifier;
pub mod models;
pub mod routes;
pub mod seed;
pub mod service;
pub mod store;
pub mod validation;

use std::sync::Arc;

use anyhow::Context;

use crate::{
    config::{Backend, Config},
    docdb::Collection,
    service::MovieService,
    store::{DocumentStore, MemoryStore, MovieStore, RelationalStore},
    validation::Validator,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub movies: MovieService,
}

impl AppState {
    pub fn new(config: Arc<Config>, store: Arc<dyn MovieStore>) -> Self {
        let movies = MovieService::new(store, Validator::new(config.max_year));
        Self { config, movies }
    }
}

/// Builds the configured backend and loads the seed catalogue into it.
pub async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn MovieStore>> {
    let validator = Validator::new(config.max_year);
    let seed = match &config.seed_path {
        Some(path) => seed::load(path, &validator).await?,
        None => Vec::new(),
    };
    let seeded = seed.len();

    let store: Arc<dyn MovieStore> = match config.backend {
        Backend::Memory => Arc::new(MemoryStore::with_movies(seed::into_movies(seed))),
        Backend::Document => {
            let collection = Collection::open(&config.document_path)
                .await
                .with_context(|| format!("opening {}", config.document_path.display()))?;
            let store = Arc::new(DocumentStore::new(collection));
            seed::import(store.as_ref(), seed).await?;
            store
        },
        Backend::Relational => {
            let db = db::connect_and_migrate(&config.database_url)
                .await
                .context("connecting to relational database")?;
            let store = Arc::new(RelationalStore::new(db));
            seed::import(store.as_ref(), seed).await?;
            store
        },
    };

    tracing::info!(backend = ?config.backend, seeded, "movie store ready");
    Ok(store)
}
