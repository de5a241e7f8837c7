use std::{collections::HashSet, path::Path};

use anyhow::{Context, bail};
use serde_json::Value;
use tracing::info;

use crate::{
    identifier::{IdScheme, TokenIds},
    models::{Movie, NewMovie},
    store::MovieStore,
    validation::Validator,
};

#[derive(Clone, Debug)]
pub struct SeedMovie {
    pub id: Option<String>,
    pub fields: NewMovie,
}

/// Reads a JSON array of movies, validating every entry like a create request.
pub async fn load(path: &Path, validator: &Validator) -> anyhow::Result<Vec<SeedMovie>> {
    let bytes = tokio::fs::read(path).await.with_context(|| format!("reading {}", path.display()))?;
    let entries: Vec<Value> =
        serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))?;
    parse(entries, validator)
}

pub fn parse(entries: Vec<Value>, validator: &Validator) -> anyhow::Result<Vec<SeedMovie>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let id = match entry.get("id") {
            None => None,
            Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
            Some(other) => bail!("seed entry {index}: id must be a non-empty string, got {other}"),
        };
        if let Some(id) = &id {
            if !seen.insert(id.clone()) {
                bail!("seed entry {index}: duplicate id {id}");
            }
        }
        let fields = validator
            .validate_create(&entry)
            .with_context(|| format!("seed entry {index}"))?;
        out.push(SeedMovie { id, fields });
    }

    Ok(out)
}

/// Builds the volatile store's starting list, minting ids for entries without one.
pub fn into_movies(seed: Vec<SeedMovie>) -> Vec<Movie> {
    let ids = TokenIds;
    let mut taken: HashSet<String> = seed.iter().filter_map(|s| s.id.clone()).collect();
    seed.into_iter()
        .map(|s| {
            let id = s.id.unwrap_or_else(|| {
                let mut id = ids.generate();
                while taken.contains(&id) {
                    id = ids.generate();
                }
                taken.insert(id.clone());
                id
            });
            s.fields.with_id(id)
        })
        .collect()
}

/// Creates every seed movie through the store, but only when it holds nothing yet.
/// Stores mint their own ids, so seed ids are not carried over.
pub async fn import(store: &dyn MovieStore, seed: Vec<SeedMovie>) -> anyhow::Result<usize> {
    if !store.list_all().await?.is_empty() {
        info!("store already populated, skipping seed");
        return Ok(0);
    }
    let count = seed.len();
    for entry in seed {
        store.create(entry.fields).await?;
    }
    Ok(count)
}
