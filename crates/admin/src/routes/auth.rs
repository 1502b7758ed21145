//! Admin sign-in and sign-out.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{CurrentAdmin, clear_current_admin, set_current_admin};
use crate::state::AppState;

/// Login form.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Check credentials against the backend and start an admin session.
#[instrument(skip(state, session, request), fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<CurrentAdmin>> {
    let email = request.email.trim();
    if email.is_empty() || request.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let signed_in = state.backend().sign_in(email, &request.password).await?;
    let admin = CurrentAdmin {
        user_id: signed_in.user_id,
        email: signed_in.email,
    };
    set_current_admin(&session, &admin).await?;
    set_sentry_user(&admin.user_id, &admin.email);

    tracing::info!(user_id = %admin.user_id, "Admin signed in");
    Ok(Json(admin))
}

/// End the admin session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> StatusCode {
    if let Err(e) = clear_current_admin(&session).await {
        tracing::warn!(error = %e, "Failed to clear admin session");
    }
    clear_sentry_user();
    StatusCode::NO_CONTENT
}
