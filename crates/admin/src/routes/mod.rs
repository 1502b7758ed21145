//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health               - Health check
//!
//! # Auth (backend email/password)
//! POST   /login                - Sign in
//! POST   /logout               - Sign out
//!
//! # Products (admin session required)
//! GET    /products             - Product listing
//! POST   /products             - Create product
//! GET    /products/{id}        - Product as editor form
//! PUT    /products/{id}        - Update product (emails leads on price drop)
//! DELETE /products/{id}        - Delete product
//! POST   /products/images      - Upload image (multipart `file` field)
//! ```

pub mod auth;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware;
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/images",
            post(products::upload_image).layer(DefaultBodyLimit::max(products::MAX_IMAGE_BYTES)),
        )
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
}

/// Create all routes for the admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .nest("/products", product_routes())
}

/// The full admin application. Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::backend::AdminBackend;
    use crate::config::AdminConfig;

    fn test_app() -> Router {
        let config = AdminConfig::from_lookup(|key| match key {
            "BACKEND_URL" => Some("http://127.0.0.1:9".to_string()),
            "BACKEND_SERVICE_KEY" => Some(
                "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.c2VydmljZV9yb2xl.Qm9kZ3lTaWc".to_string(),
            ),
            _ => None,
        })
        .unwrap();
        let backend = AdminBackend::new(&config.backend).unwrap();
        app(AppState::new(config, backend, None))
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_product_routes_need_admin() {
        for (method, uri) in [
            ("GET", "/products"),
            ("GET", "/products/1"),
            ("DELETE", "/products/1"),
        ] {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let response = test_app().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let request = Request::post("/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"email": " ", "password": "x"}"#))
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
