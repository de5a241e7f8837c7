use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderValue, Method, StatusCode, header},
    response::Response,
    routing::get,
};
use serde::Deserialize;
use serde_json::Value;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    AppState,
    error::{self, AppResult},
    models::Movie,
};

pub fn router(state: Arc<AppState>) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring malformed CORS origin");
                None
            },
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/movies", get(list).post(create))
        .route("/movies/{id}", get(show).patch(update).delete(destroy))
        .fallback(fallback)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    genre: Option<String>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ListQuery>,
) -> AppResult<Json<Vec<Movie>>> {
    Ok(Json(state.movies.list(q.genre.as_deref()).await?))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Movie>> {
    Ok(Json(state.movies.get(&id).await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    let movie = state.movies.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> AppResult<Json<Movie>> {
    Ok(Json(state.movies.update(&id, &payload).await?))
}

pub async fn destroy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Movie>> {
    Ok(Json(state.movies.delete(&id).await?))
}

async fn fallback() -> Response {
    error::not_found()
}
