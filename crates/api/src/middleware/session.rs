//! Session identity extractors.
//!
//! Authentication happens outside this daemon; the UI forwards the
//! signed-in user id in the `x-owner-id` header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use itemkeeper_core::error::CoreError;
use itemkeeper_core::types::{is_guest, OwnerId, GUEST_OWNER};

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the session owner id.
pub const OWNER_HEADER: &str = "x-owner-id";

/// The caller's owner identity. A missing or blank header is the guest.
///
/// ```ignore
/// async fn handler(session: Session) -> AppResult<Json<()>> {
///     tracing::info!(owner = %session.owner_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Session {
    pub owner_id: OwnerId,
}

impl Session {
    pub fn is_guest(&self) -> bool {
        is_guest(&self.owner_id)
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let owner_id = match parts.headers.get(OWNER_HEADER) {
            None => GUEST_OWNER.to_string(),
            Some(value) => value
                .to_str()
                .map_err(|_| AppError::BadRequest(format!("{OWNER_HEADER} must be valid ASCII")))?
                .trim()
                .to_string(),
        };
        let owner_id = if owner_id.is_empty() {
            GUEST_OWNER.to_string()
        } else {
            owner_id
        };
        Ok(Session { owner_id })
    }
}

/// Requires a signed-in owner. Rejects the guest with 401 Unauthorized.
pub struct RequireOwner(pub Session);

impl FromRequestParts<AppState> for RequireOwner {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        if session.is_guest() {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Sign in to use cloud sync".into(),
            )));
        }
        Ok(RequireOwner(session))
    }
}
