pub mod error;
pub mod models;
pub mod repository;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use shop_kernel::Module;

use repository::PublisherRepository;

/// Publishers module: the entities books point at
pub struct PublishersModule {
    repository: Arc<dyn PublisherRepository>,
}

impl PublishersModule {
    pub fn new(repository: Arc<dyn PublisherRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Module for PublishersModule {
    fn name(&self) -> &'static str {
        "publishers"
    }

    fn routes(&self) -> Router {
        routes::router(self.repository.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let publisher = serde_json::json!({
            "description": "Publisher",
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/Publisher" } }
            }
        });
        let not_found = serde_json::json!({
            "description": "No publisher with this id",
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
            }
        });

        Some(serde_json::json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List publishers",
                        "tags": ["Publishers"],
                        "responses": {
                            "200": {
                                "description": "Publishers in insertion order",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Publisher" }
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Create a publisher",
                        "tags": ["Publishers"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": { "name": { "type": "string", "maxLength": 20 } },
                                        "required": ["name"]
                                    }
                                }
                            }
                        },
                        "responses": { "201": publisher.clone() }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Retrieve a publisher",
                        "tags": ["Publishers"],
                        "responses": { "200": publisher, "404": not_found.clone() }
                    },
                    "delete": {
                        "summary": "Delete a publisher; books referencing it keep existing with no publisher",
                        "tags": ["Publishers"],
                        "responses": { "204": { "description": "Deleted" }, "404": not_found }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Publisher": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "name": { "type": "string", "maxLength": 20 },
                            "created_at": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "name", "created_at"]
                    }
                }
            }
        }))
    }
}

pub fn create_module(repository: Arc<dyn PublisherRepository>) -> Arc<dyn Module> {
    Arc::new(PublishersModule::new(repository))
}
