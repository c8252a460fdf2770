//! API layer - routes and handlers

pub mod contract;
pub mod handlers;

use crate::state::AppState;
use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1/patients", patient_routes())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// CORS layer from the configured origin list. An empty list keeps the
/// permissive default; a non-empty list restricts browsers to exactly
/// those origins.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let mut allowed = Vec::with_capacity(origins.len());
    for origin in origins {
        if let Ok(value) = HeaderValue::from_str(origin) {
            allowed.push(value);
        }
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

fn patient_routes() -> Router<AppState> {
    use axum::routing::post;

    Router::new()
        .route(
            "/",
            post(handlers::create_patient).get(handlers::search_patients),
        )
        .route(
            "/:id",
            get(handlers::get_patient)
                .put(handlers::update_patient)
                .delete(handlers::delete_patient),
        )
}

async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "patients-server"
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use tower::ServiceExt;

    fn router_with_cors(origins: &[String]) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(cors_layer(origins))
    }

    async fn allow_origin_header(origins: &[String], origin: &str) -> Option<String> {
        let response = router_with_cors(origins)
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/")
                    .header(header::ORIGIN, origin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn empty_origin_list_allows_any_origin() {
        let header = allow_origin_header(&[], "https://anywhere.example.com").await;
        assert_eq!(header.as_deref(), Some("*"));
    }

    #[tokio::test]
    async fn configured_origins_are_enforced() {
        let origins = vec!["https://app.example.com".to_string()];

        let allowed = allow_origin_header(&origins, "https://app.example.com").await;
        assert_eq!(allowed.as_deref(), Some("https://app.example.com"));

        let denied = allow_origin_header(&origins, "https://other.example.com").await;
        assert_eq!(denied, None);
    }
}
