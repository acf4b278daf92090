use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use shop_http::error::AppError;
use uuid::Uuid;

use super::models::Book;
use super::payload::BookPayload;
use super::service::BookService;
use crate::utils;

type BookResult<T> = Result<T, AppError>;

/// HTTP routes for the books resource, relative to the module mount point.
pub fn router(service: Arc<BookService>) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/health", get(health_check))
        .route(
            "/{id}",
            get(retrieve_book)
                .put(update_book)
                .patch(partial_update_book)
                .delete(delete_book),
        )
        .with_state(service)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn list_books(
    State(service): State<Arc<BookService>>,
    Query(params): Query<Vec<(String, String)>>,
) -> BookResult<Json<Vec<Book>>> {
    Ok(Json(service.list(params).await?))
}

async fn retrieve_book(
    State(service): State<Arc<BookService>>,
    Path(id): Path<String>,
) -> BookResult<Json<Book>> {
    let id = path_id(&id)?;
    Ok(Json(service.retrieve(id).await?))
}

async fn create_book(
    State(service): State<Arc<BookService>>,
    body: Result<Json<Value>, JsonRejection>,
) -> BookResult<(StatusCode, Json<Book>)> {
    let Json(body) = body?;
    let payload = BookPayload::from_json(&body)?;
    let book = service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    State(service): State<Arc<BookService>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> BookResult<Json<Book>> {
    write_book(&service, &id, body, false).await
}

async fn partial_update_book(
    State(service): State<Arc<BookService>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> BookResult<Json<Book>> {
    write_book(&service, &id, body, true).await
}

async fn delete_book(
    State(service): State<Arc<BookService>>,
    Path(id): Path<String>,
) -> BookResult<StatusCode> {
    let id = path_id(&id)?;
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn write_book(
    service: &BookService,
    id: &str,
    body: Result<Json<Value>, JsonRejection>,
    partial: bool,
) -> BookResult<Json<Book>> {
    // An unknown id wins over a bad body.
    let current = service.retrieve(path_id(id)?).await?;

    let Json(body) = body?;
    let payload = BookPayload::from_json(&body)?;
    Ok(Json(service.apply_update(current, payload, partial).await?))
}

fn path_id(raw: &str) -> BookResult<Uuid> {
    utils::parse_path_id(raw).ok_or_else(|| AppError::not_found("Not found."))
}
