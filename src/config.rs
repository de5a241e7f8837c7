use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    str::FromStr,
};

use anyhow::Context;

use crate::validation::DEFAULT_MAX_YEAR;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Backend {
    Memory,
    Document,
    Relational,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Backend::Memory),
            "document" => Ok(Backend::Document),
            "sqlite" | "relational" => Ok(Backend::Relational),
            other => anyhow::bail!("unknown backend {other:?} (expected memory, document or sqlite)"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub backend: Backend,
    pub database_url: String,
    pub document_path: PathBuf,
    pub seed_path: Option<PathBuf>,
    pub max_year: i32,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host: IpAddr =
            var("HOST").as_deref().unwrap_or("0.0.0.0").trim().parse().context("HOST")?;
        let port: u16 = var("PORT").unwrap_or_else(|| "3000".to_string()).parse().context("PORT")?;

        let backend: Backend =
            var("MOVIES_BACKEND").as_deref().unwrap_or("memory").parse().context("MOVIES_BACKEND")?;

        let database_url =
            var("DATABASE_URL").unwrap_or_else(|| "sqlite://moviesd.db?mode=rwc".to_string());

        let document_path =
            PathBuf::from(var("DOCUMENT_PATH").unwrap_or_else(|| "movies.documents.json".to_string()));

        let seed_path = match var("MOVIES_SEED_PATH") {
            Some(path) if path.trim().is_empty() => None,
            Some(path) => Some(PathBuf::from(path)),
            None => Some(PathBuf::from("data/movies.json")).filter(|p| p.exists()),
        };

        let max_year: i32 = match var("MOVIES_MAX_YEAR") {
            Some(raw) => raw.parse().context("MOVIES_MAX_YEAR")?,
            None => DEFAULT_MAX_YEAR,
        };

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:8080".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            addr: SocketAddr::new(host, port),
            backend,
            database_url,
            document_path,
            seed_path,
            max_year,
            cors_origins,
        })
    }
}
