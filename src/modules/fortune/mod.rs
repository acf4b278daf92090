pub mod calculator;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use shop_kernel::{settings::FortuneSettings, InitCtx, Module};
use time::UtcOffset;

/// Fortune module: a daily omikuji drawn from birth date and blood type
pub struct FortuneModule {
    offset: UtcOffset,
}

impl FortuneModule {
    pub fn new(settings: &FortuneSettings) -> anyhow::Result<Self> {
        let offset = settings.utc_offset()?;
        Ok(Self { offset })
    }
}

#[async_trait]
impl Module for FortuneModule {
    fn name(&self) -> &'static str {
        "fortune"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            offset = %self.offset,
            today = %calculator::today(self.offset),
            "fortune module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.offset)
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Draw today's fortune",
                        "tags": ["Fortune"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "birth_date": { "type": "string", "format": "date" },
                                            "blood_type": { "type": "string", "enum": ["A", "B", "O", "AB"] }
                                        },
                                        "required": ["birth_date", "blood_type"]
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Fortune for today",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/FortuneReading" }
                                    }
                                }
                            },
                            "400": {
                                "description": "Validation error",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "FortuneReading": {
                        "type": "object",
                        "properties": {
                            "birth_date": { "type": "string", "format": "date" },
                            "blood_type": { "type": "string", "enum": ["A", "B", "O", "AB"] },
                            "current_date": { "type": "string", "format": "date" },
                            "fortune": { "type": "string", "enum": ["great_luck", "middle_luck", "small_luck"] },
                            "label": { "type": "string", "enum": ["大吉", "中吉", "小吉"] }
                        },
                        "required": ["birth_date", "blood_type", "current_date", "fortune", "label"]
                    }
                }
            }
        }))
    }
}

pub fn create_module(settings: &FortuneSettings) -> anyhow::Result<Arc<dyn Module>> {
    Ok(Arc::new(FortuneModule::new(settings)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_offsets_beyond_a_day() {
        let settings = FortuneSettings {
            utc_offset_minutes: 26 * 60,
        };
        assert!(FortuneModule::new(&settings).is_err());
    }

    #[test]
    fn rejects_offsets_that_overflow_seconds() {
        let settings = FortuneSettings {
            utc_offset_minutes: i32::MAX,
        };
        assert!(FortuneModule::new(&settings).is_err());
    }

    #[test]
    fn accepts_japan_standard_time() {
        let settings = FortuneSettings {
            utc_offset_minutes: 9 * 60,
        };
        let module = FortuneModule::new(&settings).unwrap();
        assert_eq!(module.offset, UtcOffset::from_hms(9, 0, 0).unwrap());
    }
}
