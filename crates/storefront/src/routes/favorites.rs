//! Favorites route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tienda_core::ProductId;
use tower_sessions::Session;
use tracing::instrument;

use super::{load_favorites, save_favorites};
use crate::error::{Result, add_breadcrumb};
use crate::favorites::{FavoriteItem, FavoriteToggle, FavoritesSnapshot, UserContact};
use crate::state::AppState;

/// Toggle request.
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub product_id: ProductId,
}

/// What the toggle did, plus the new count for the header badge.
#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub status: FavoriteToggle,
    pub count: usize,
}

/// Contact form. Either field may be blank, not both.
#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Favorites and the saved contact.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Json<FavoritesSnapshot> {
    let favorites = load_favorites(session, state.leads().clone()).await;
    Json(favorites.snapshot().clone())
}

/// Save or remove a favorite.
#[instrument(skip(state, session))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>> {
    let product = state.backend().get_product(&request.product_id).await?;

    let mut favorites = load_favorites(session, state.leads().clone()).await;
    let status = favorites.toggle(FavoriteItem::from_product(&product));
    let count = favorites.items().len();
    save_favorites(favorites).await?;

    add_breadcrumb(
        "favorites",
        "Toggled favorite",
        Some(&[("product_id", request.product_id.as_str())]),
    );
    Ok(Json(ToggleResponse { status, count }))
}

/// Save the shopper's contact and submit every favorite as a lead.
#[instrument(skip(state, session, request))]
pub async fn save_contact(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<ContactRequest>,
) -> Result<Json<FavoritesSnapshot>> {
    let contact = UserContact::parse(request.email.as_deref(), request.phone.as_deref())?;

    let mut favorites = load_favorites(session, state.leads().clone()).await;
    favorites.save_user_contact(contact);
    let snapshot = favorites.snapshot().clone();
    save_favorites(favorites).await?;
    Ok(Json(snapshot))
}
