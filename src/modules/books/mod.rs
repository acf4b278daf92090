pub mod models;
pub mod payload;
pub mod repository;
pub mod routes;
pub mod service;
pub mod validation;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use shop_kernel::{InitCtx, Module};

use repository::BookRepository;
use service::BookService;

/// Books module: CRUD over the book resource
pub struct BooksModule {
    service: Arc<BookService>,
}

impl BooksModule {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self {
            service: Arc::new(BookService::new(repository)),
        }
    }

    pub fn service(&self) -> &Arc<BookService> {
        &self.service
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn openapi() -> serde_json::Value {
    let error = |description: &str| {
        serde_json::json!({
            "description": description,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                }
            }
        })
    };
    let book = |description: &str| {
        serde_json::json!({
            "description": description,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/Book" }
                }
            }
        })
    };
    let input = serde_json::json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/BookInput" }
            }
        }
    });
    let id_param = serde_json::json!([{
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string", "format": "uuid" }
    }]);

    serde_json::json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "description": "Query parameters filter by field, e.g. `price__lt=3000` or `title__icontains=rust`.",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "Books in insertion order",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            }
                        },
                        "400": error("Invalid filter criteria")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": input.clone(),
                    "responses": {
                        "201": book("Created book"),
                        "400": error("Validation error")
                    }
                }
            },
            "/{id}": {
                "parameters": id_param,
                "get": {
                    "summary": "Retrieve a book",
                    "tags": ["Books"],
                    "responses": {
                        "200": book("The book"),
                        "404": error("No book with this id")
                    }
                },
                "put": {
                    "summary": "Replace every mutable field of a book",
                    "tags": ["Books"],
                    "requestBody": input.clone(),
                    "responses": {
                        "200": book("Updated book"),
                        "400": error("Validation error"),
                        "404": error("No book with this id")
                    }
                },
                "patch": {
                    "summary": "Update the supplied fields of a book",
                    "tags": ["Books"],
                    "requestBody": input,
                    "responses": {
                        "200": book("Updated book"),
                        "400": error("Validation error"),
                        "404": error("No book with this id")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "responses": {
                        "204": { "description": "Deleted" },
                        "404": error("No book with this id")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "format": "uuid" },
                        "title": { "type": "string", "maxLength": 20 },
                        "price": { "type": "integer", "nullable": true },
                        "publisher_id": { "type": "string", "format": "uuid", "nullable": true },
                        "created_at": { "type": "string", "format": "date-time" }
                    },
                    "required": ["id", "title", "price", "publisher_id", "created_at"]
                },
                "BookInput": {
                    "type": "object",
                    "properties": {
                        "title": {
                            "type": "string",
                            "maxLength": 20,
                            "description": "Unique; must not contain \"Java\""
                        },
                        "price": {
                            "type": "integer",
                            "nullable": true,
                            "description": "At most 3000 when the title contains 薄い本"
                        },
                        "publisher_id": { "type": "string", "format": "uuid", "nullable": true }
                    }
                }
            }
        }
    })
}

/// Create a new instance of the books module
pub fn create_module(repository: Arc<dyn BookRepository>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(repository))
}
