//! Cart route handlers.
//!
//! The cart lives in the visitor's session under the cart key. Every
//! mutation writes the full snapshot back before the response is sent.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tienda_core::{Price, ProductId};
use tower_sessions::Session;
use tracing::instrument;

use super::{SessionCart, load_cart, save_cart};
use crate::cart::CartLine;
use crate::checkout::whatsapp_order;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;
use crate::variants::VariantResolver;

/// Cart display data.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub count: u32,
    pub total: Price,
}

impl From<&SessionCart> for CartView {
    fn from(cart: &SessionCart) -> Self {
        Self {
            lines: cart.cart().lines().to_vec(),
            count: cart.count(),
            total: cart.total(),
        }
    }
}

/// Add to cart request. Missing size or color falls back to the product's
/// default selection.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Update quantity request.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub key: String,
    pub quantity: u32,
}

/// Remove line request.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub key: String,
}

/// Cart count badge.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
}

/// Display cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Json<CartView> {
    let cart = load_cart(session).await;
    Json(CartView::from(&cart))
}

/// Cart count badge.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Json<CartCount> {
    let cart = load_cart(session).await;
    Json(CartCount {
        count: cart.count(),
    })
}

/// Add a product to the cart in the chosen size and color.
///
/// Sold-out colors and unavailable sizes are rejected; the price recorded on
/// the line is the product's effective price right now.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let product = state.backend().get_product(&request.product_id).await?;
    let chosen = VariantResolver::new(&product)
        .choose(request.size.as_deref(), request.color.as_deref())?;

    let line = CartLine::from_product(&product, &chosen.size, &chosen.color);
    add_breadcrumb("cart", "Added to cart", Some(&[("key", line.key.as_str())]));

    let mut cart = load_cart(session).await;
    cart.add(line);
    let view = CartView::from(&cart);
    save_cart(cart).await?;
    Ok(Json(view))
}

/// Set a line's quantity; zero removes the line.
#[instrument(skip(session))]
pub async fn update(
    session: Session,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(session).await;
    if !cart.set_quantity(&request.key, request.quantity) {
        return Err(AppError::NotFound(format!("Cart line {}", request.key)));
    }
    let view = CartView::from(&cart);
    save_cart(cart).await?;
    Ok(Json(view))
}

/// Remove a line. Removing a line that is not there is not an error.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(session).await;
    cart.remove(&request.key);
    let view = CartView::from(&cart);
    save_cart(cart).await?;
    Ok(Json(view))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    let mut cart = load_cart(session).await;
    cart.clear();
    let view = CartView::from(&cart);
    save_cart(cart).await?;
    Ok(Json(view))
}

/// Redirect to the WhatsApp order link for the current cart.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Result<Response> {
    let cart = load_cart(session).await;
    let order = whatsapp_order(cart.cart(), &state.config().whatsapp_phone)?;
    Ok(Redirect::to(&order.link).into_response())
}
