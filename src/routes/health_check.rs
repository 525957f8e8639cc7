use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;

use crate::storage::Storage;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub database: &'static str,
    pub database_url_configured: bool,
    pub timestamp: String,
}

/// Endpoint used by clients to know if the server is working and whether subscriptions are
/// being persisted.
#[tracing::instrument(name = "Health Check handler", skip(storage))]
pub async fn health_check(storage: web::Data<Storage>) -> HttpResponse {
    let database = if storage.is_connected().await {
        "connected"
    } else {
        "disconnected"
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "OK",
        message: "Coming Soon server is running",
        database,
        database_url_configured: storage.is_configured(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
