use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use shop_http::error::AppError;
use uuid::Uuid;

use super::error::PublisherError;
use super::models::{self, Publisher};
use super::repository::PublisherRepository;
use crate::utils;

type Repository = Arc<dyn PublisherRepository>;

pub fn router(repository: Repository) -> Router {
    Router::new()
        .route("/", get(list_publishers).post(create_publisher))
        .route("/health", get(health_check))
        .route("/{id}", get(retrieve_publisher).delete(delete_publisher))
        .with_state(repository)
}

async fn health_check() -> &'static str {
    "publishers module is healthy"
}

async fn list_publishers(
    State(repository): State<Repository>,
) -> Result<Json<Vec<Publisher>>, AppError> {
    let publishers = repository.list().await.map_err(PublisherError::from)?;
    Ok(Json(publishers))
}

async fn retrieve_publisher(
    State(repository): State<Repository>,
    Path(id): Path<String>,
) -> Result<Json<Publisher>, AppError> {
    let id = path_id(&id)?;
    let publisher = repository
        .get(id)
        .await
        .map_err(PublisherError::from)?
        .ok_or(PublisherError::NotFound(id))?;
    Ok(Json(publisher))
}

async fn create_publisher(
    State(repository): State<Repository>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Publisher>), AppError> {
    let Json(body) = body?;
    let name = models::parse_new_publisher(&body).map_err(PublisherError::from)?;

    let publisher = repository
        .insert(Publisher::new(name))
        .await
        .map_err(PublisherError::from)?;
    tracing::info!(publisher_id = %publisher.id, "registered publisher");

    Ok((StatusCode::CREATED, Json(publisher)))
}

async fn delete_publisher(
    State(repository): State<Repository>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = path_id(&id)?;
    let (publisher, detached) = repository.delete(id).await.map_err(PublisherError::from)?;
    tracing::info!(
        publisher_id = %publisher.id,
        detached_books = detached,
        "deleted publisher"
    );
    Ok(StatusCode::NO_CONTENT)
}

fn path_id(raw: &str) -> Result<Uuid, AppError> {
    utils::parse_path_id(raw).ok_or_else(|| AppError::not_found("Not found."))
}
