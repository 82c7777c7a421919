//! History upload route
//!
//! Accepts a raw CSV export and answers with the rendered statistics.

use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::warn;

use crate::config::DEFAULT_TOP_N;
use crate::core::aggregator::summarize;
use crate::core::GenreResolver;
use crate::models::ErrorResponse;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    #[serde(default = "default_top")]
    pub top: usize,
}

fn default_top() -> usize {
    DEFAULT_TOP_N
}

pub async fn post_stats(
    resolver: web::Data<GenreResolver>,
    query: web::Query<StatsQuery>,
    body: web::Bytes,
) -> impl Responder {
    if body.iter().all(u8::is_ascii_whitespace) {
        return HttpResponse::BadRequest().json(ErrorResponse::new("Empty history file"));
    }

    // rows that are not UTF-8 are skipped like any other malformed row
    let resolver = resolver.get_ref();
    match summarize(&body[..], resolver, resolver.max_concurrent(), query.top).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => {
            warn!("Rejected history upload: {}", e);
            HttpResponse::BadRequest().json(ErrorResponse::new(e.to_string()))
        }
    }
}

/// Configure stats routes, accepting uploads up to `upload_limit` bytes
pub fn configure(cfg: &mut web::ServiceConfig, upload_limit: usize) {
    cfg.service(
        web::resource("/stats")
            .app_data(web::PayloadConfig::new(upload_limit))
            .route(web::post().to(post_stats)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserConfig;
    use crate::core::resolver::tests::{resolver_with, FakeCatalog};
    use crate::models::StatsSummary;
    use actix_web::{dev::ServiceResponse, http::StatusCode, test, App};
    use std::sync::Arc;

    const HISTORY: &str = "Track Name,Artist Name,Milliseconds Played\n\
                           A,X,200000\n\
                           A,X,200000\n\
                           B,Y,100000\n";

    async fn upload(catalog: FakeCatalog, uri: &str, payload: Vec<u8>) -> ServiceResponse {
        let resolver = web::Data::new(resolver_with(Arc::new(catalog)).await);
        let limit = UserConfig::default().max_upload_bytes;
        let app = test::init_service(
            App::new()
                .app_data(resolver)
                .configure(|cfg| configure(cfg, limit)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri(uri)
            .set_payload(payload)
            .to_request();
        test::call_service(&app, req).await
    }

    #[actix_web::test]
    async fn test_upload_history() {
        let catalog = FakeCatalog::with(&[("X", &["synthpop"]), ("Y", &["synthpop", "disco"])]);
        let resp = upload(catalog, "/stats?top=1", HISTORY.as_bytes().to_vec()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let summary: StatsSummary = test::read_body_json(resp).await;

        assert_eq!(summary.total_songs, 3);
        assert_eq!(summary.total_minutes, 8);
        assert_eq!(summary.top_songs, vec!["A (2 plays)"]);
        assert_eq!(summary.top_genres, vec!["synthpop (3 plays)"]);
        assert_eq!(summary.unique_genres, 2);
        assert_eq!(summary.new_songs_percentage, 66.67);
    }

    #[actix_web::test]
    async fn test_full_size_export_is_accepted() {
        let mut history = String::from("Track Name,Artist Name,Album Name,Milliseconds Played\n");
        for i in 0..10_000 {
            history.push_str(&format!(
                "Some Fairly Long Track Title {},Artist {},Album Number {},{}\n",
                i % 700,
                i % 40,
                i % 90,
                120_000 + i
            ));
        }
        assert!(history.len() > 256 * 1024);

        let resp = upload(FakeCatalog::default(), "/stats", history.into_bytes()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let summary: StatsSummary = test::read_body_json(resp).await;
        assert_eq!(summary.total_songs, 10_000);
        assert_eq!(summary.unique_artists, 40);
        assert_eq!(summary.skipped_rows, 0);
    }

    #[actix_web::test]
    async fn test_upload_over_limit_is_rejected() {
        let resolver = web::Data::new(resolver_with(Arc::new(FakeCatalog::default())).await);
        let app = test::init_service(
            App::new()
                .app_data(resolver)
                .configure(|cfg| configure(cfg, 64)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/stats")
            .set_payload(HISTORY.repeat(4))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[actix_web::test]
    async fn test_non_utf8_row_is_skipped() {
        let mut payload = HISTORY.as_bytes().to_vec();
        payload.extend_from_slice(b"Caf\xe9,X,1000\n");

        let resp = upload(FakeCatalog::default(), "/stats", payload).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let summary: StatsSummary = test::read_body_json(resp).await;
        assert_eq!(summary.total_songs, 3);
        assert_eq!(summary.skipped_rows, 1);
    }

    #[actix_web::test]
    async fn test_rejects_bad_bodies() {
        for payload in [Vec::new(), b" \n".to_vec(), vec![0xff, 0xfe, b',', b'\n']] {
            let resp = upload(FakeCatalog::default(), "/stats", payload).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
    }
}
