//! Request identity. Token issuance lives in the gateway in front of this
//! service; requests arrive with a resolved `x-user-id` header, which is
//! checked against the users table on every call.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::sync::Arc;

use crate::db::{self, User};
use crate::error::ApiError;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";

pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<i64>().ok())
            .ok_or_else(|| ApiError::forbidden("Missing or invalid x-user-id header"))?;

        let user = db::users::get_user(state.pool.as_ref(), id)
            .await?
            .ok_or_else(|| ApiError::forbidden("Unknown user"))?;

        Ok(CurrentUser(user))
    }
}

/// Chief-editor-only endpoints.
pub struct Editor(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Editor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_editor() {
            return Err(ApiError::forbidden("Editor role required"));
        }
        Ok(Editor(user))
    }
}

/// Reviewer endpoints require an approved (active) reviewer account.
pub struct ActiveReviewer(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for ActiveReviewer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_reviewer() || !user.active {
            return Err(ApiError::forbidden("Approved reviewer account required"));
        }
        Ok(ActiveReviewer(user))
    }
}
