//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Catalog
//! GET  /products               - Filtered catalog (?size=M,L&color=Negro&max_price=80&sort=price_asc&category=...)
//! GET  /products/{id}          - Product detail with resolved variants (?color=...)
//!
//! # Cart
//! GET  /cart                   - Lines, count and total
//! GET  /cart/count             - Item count only
//! POST /cart/add               - Add a product in a size and color
//! POST /cart/update            - Set a line's quantity (0 removes)
//! POST /cart/remove            - Remove a line
//! POST /cart/clear             - Empty the cart
//!
//! # Checkout
//! GET  /checkout               - Redirect to the WhatsApp order link
//!
//! # Favorites
//! GET  /favorites              - Favorites and saved contact
//! POST /favorites/toggle       - Save or remove a favorite
//! POST /favorites/contact      - Save contact and submit favorites as leads
//! ```
//!
//! Cart and favorites are kept in the visitor's session. Handlers load the
//! keys they need into a [`SessionStorage`], mutate through the managers and
//! flush before responding.

pub mod cart;
pub mod favorites;
pub mod products;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tower_sessions::Session;

use crate::cart::CartManager;
use crate::favorites::FavoritesManager;
use crate::leads::LeadQueue;
use crate::middleware;
use crate::state::AppState;
use crate::storage::{CART_KEY, FAVORITES_KEY, SessionStorage, StateStore};

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the favorites routes router.
pub fn favorites_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(favorites::show))
        .route("/toggle", post(favorites::toggle))
        .route("/contact", post(favorites::save_contact))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", get(cart::checkout))
        .nest("/favorites", favorites_routes())
}

/// The full application: routes, health check, session, security headers
/// and tracing. Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .layer(axum_middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

// =============================================================================
// Session Helpers
// =============================================================================

pub(crate) type SessionCart = CartManager<SessionStorage>;
pub(crate) type SessionFavorites = FavoritesManager<SessionStorage>;

async fn load_cart(session: Session) -> SessionCart {
    let storage = SessionStorage::load(session, &[CART_KEY]).await;
    CartManager::load(StateStore::new(storage))
}

async fn save_cart(cart: SessionCart) -> Result<(), tower_sessions::session::Error> {
    cart.into_store().into_storage().flush().await
}

async fn load_favorites(session: Session, leads: LeadQueue) -> SessionFavorites {
    let storage = SessionStorage::load(session, &[FAVORITES_KEY]).await;
    FavoritesManager::load(StateStore::new(storage), leads)
}

async fn save_favorites(
    favorites: SessionFavorites,
) -> Result<(), tower_sessions::session::Error> {
    favorites.into_store().into_storage().flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::backend::BackendClient;
    use crate::config::StorefrontConfig;

    const VARS: &[(&str, &str)] = &[
        ("BACKEND_URL", "http://127.0.0.1:9"),
        ("BACKEND_ANON_KEY", "anon-key"),
        ("WHATSAPP_PHONE", "+54 9 11 5555 0000"),
    ];

    fn test_app() -> Router {
        let config = StorefrontConfig::from_lookup(|key| {
            VARS.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        })
        .unwrap();
        let backend = BackendClient::new(&config.backend).unwrap();
        let (leads, _rx) = LeadQueue::channel();
        app(AppState::new(config, backend, leads))
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_carries_security_headers() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store, max-age=0");
    }

    #[tokio::test]
    async fn test_new_visitor_has_empty_cart() {
        let response = test_app()
            .oneshot(Request::get("/cart").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["count"], 0);
        assert_eq!(body["lines"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_checkout_of_empty_cart_is_rejected() {
        let response = test_app()
            .oneshot(Request::get("/checkout").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("empty"));
    }

    #[tokio::test]
    async fn test_removing_missing_line_is_ok() {
        let request = Request::post("/cart/remove")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"key": "1-M-Negro"}"#))
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["count"], 0);
    }
}
