//! REST API routes for playstats

pub mod genres;
pub mod stats;

use actix_web::{get, web, HttpResponse, Responder};
use serde_json::json;

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({"status": "ok"}))
}

/// Configure all API routes
pub fn configure(cfg: &mut web::ServiceConfig, upload_limit: usize) {
    cfg.service(health)
        // Genre lookup
        .configure(genres::configure)
        // History upload
        .configure(|cfg| stats::configure(cfg, upload_limit));
}
