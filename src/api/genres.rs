//! Genre lookup route

use actix_web::{get, web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::error;

use crate::core::{GenreResolver, ResolveError};
use crate::models::{ErrorResponse, GenresResponse};

#[derive(Debug, Deserialize)]
pub struct GenresQuery {
    #[serde(default)]
    pub artist: Option<String>,
}

/// Map a resolution failure onto a response
pub fn error_response(err: &ResolveError) -> HttpResponse {
    match err {
        ResolveError::ArtistNotFound(_) => {
            HttpResponse::NotFound().json(ErrorResponse::new("Artist not found"))
        }
        _ => HttpResponse::InternalServerError().json(ErrorResponse::new(format!(
            "An error occurred while fetching genres: {}",
            err
        ))),
    }
}

#[get("/genres")]
pub async fn get_genres(
    resolver: web::Data<GenreResolver>,
    query: web::Query<GenresQuery>,
) -> impl Responder {
    let artist = match query.artist.as_deref() {
        Some(artist) if !artist.is_empty() => artist,
        _ => return HttpResponse::BadRequest().json(ErrorResponse::new("Missing artist parameter")),
    };

    match resolver.resolve_genres(artist).await {
        Ok(genres) => HttpResponse::Ok().json(GenresResponse { genres }),
        Err(e) => {
            if !matches!(e, ResolveError::ArtistNotFound(_)) {
                error!("Failed to resolve genres for '{}': {}", artist, e);
            }
            error_response(&e)
        }
    }
}

/// Every cached artist with its genres
#[get("/genres/cache")]
pub async fn get_cached_genres(resolver: web::Data<GenreResolver>) -> impl Responder {
    match resolver.cache().all().await {
        Ok(entries) => HttpResponse::Ok().json(entries),
        Err(e) => {
            error!("Failed to list genre cache: {}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new(format!("Failed to read genre cache: {}", e)))
        }
    }
}

/// Configure genre routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_cached_genres).service(get_genres);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resolver::tests::{resolver_with, FakeCatalog};
    use crate::plugins::CatalogError;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::Value;
    use std::sync::Arc;

    async fn call(catalog: FakeCatalog, uris: &[&str]) -> Vec<(StatusCode, Value)> {
        let resolver = web::Data::new(resolver_with(Arc::new(catalog)).await);
        let app = test::init_service(App::new().app_data(resolver).configure(configure)).await;

        let mut out = Vec::new();
        for uri in uris {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            let status = resp.status();
            let body: Value = test::read_body_json(resp).await;
            out.push((status, body));
        }
        out
    }

    #[actix_web::test]
    async fn test_found_artist() {
        let out = call(
            FakeCatalog::with(&[("Daft Punk", &["filter house", "french house"])]),
            &["/genres?artist=Daft%20Punk", "/genres?artist=Daft%20Punk"],
        )
        .await;

        for (status, body) in out {
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["genres"], serde_json::json!(["filter house", "french house"]));
        }
    }

    #[actix_web::test]
    async fn test_missing_parameter() {
        let out = call(FakeCatalog::default(), &["/genres", "/genres?artist="]).await;

        for (status, body) in out {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "Missing artist parameter");
        }
    }

    #[actix_web::test]
    async fn test_unknown_artist() {
        let out = call(FakeCatalog::default(), &["/genres?artist=Nobody"]).await;
        assert_eq!(out[0].0, StatusCode::NOT_FOUND);
        assert_eq!(out[0].1["error"], "Artist not found");
    }

    #[actix_web::test]
    async fn test_exhausted_upstream() {
        let limited = || CatalogError::RateLimited { retry_after: None };
        let catalog = FakeCatalog::with(&[("Muse", &["rock"])])
            .fail_search(vec![limited(), limited(), limited()]);

        let out = call(catalog, &["/genres?artist=Muse"]).await;
        assert_eq!(out[0].0, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(out[0].1["error"].as_str().unwrap().contains("3 attempts"));
    }

    #[actix_web::test]
    async fn test_cache_listing() {
        let out = call(
            FakeCatalog::with(&[("Zola", &["french hip hop"]), ("Abba", &[])]),
            &["/genres?artist=Zola", "/genres?artist=Abba", "/genres/cache"],
        )
        .await;

        assert_eq!(out[2].0, StatusCode::OK);
        assert_eq!(
            out[2].1,
            serde_json::json!([
                {"artist": "Abba", "genres": []},
                {"artist": "Zola", "genres": ["french hip hop"]},
            ])
        );
    }
}
