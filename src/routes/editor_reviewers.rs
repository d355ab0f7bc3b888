use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::Editor;
use crate::db::{self, users::ReviewerFilter};
use crate::error::{ApiError, FieldErrors};
use crate::pagination::{Page, PageParams};
use crate::routes::{message, ok};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ReviewerListQuery {
    pub science_field_id: Option<i64>,
    pub created_on: Option<NaiveDate>,
    pub deleted_on: Option<NaiveDate>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ReviewerListQuery {
    fn filter(&self, active: Option<bool>, archived: bool) -> ReviewerFilter {
        ReviewerFilter {
            active,
            archived,
            science_field_id: self.science_field_id,
            created_on: self.created_on,
            deleted_on: self.deleted_on,
            sort_desc: self.sort.as_deref() != Some("asc"),
        }
    }
}

async fn listing(
    state: &AppState,
    query: &ReviewerListQuery,
    active: Option<bool>,
    archived: bool,
) -> Result<Json<Value>, ApiError> {
    let params = PageParams { page: query.page, per_page: query.per_page };
    let (rows, total) =
        db::users::list_reviewers(state.pool.as_ref(), &query.filter(active, archived), params)
            .await?;
    let data: Vec<Value> = rows.iter().map(|row| row.to_json()).collect();
    Ok(ok(json!(Page::new(data, total, params))))
}

/// Registered reviewers waiting for approval.
pub async fn pending(
    State(state): State<Arc<AppState>>,
    _editor: Editor,
    Query(query): Query<ReviewerListQuery>,
) -> Result<Json<Value>, ApiError> {
    listing(&state, &query, Some(false), false).await
}

pub async fn approved(
    State(state): State<Arc<AppState>>,
    _editor: Editor,
    Query(query): Query<ReviewerListQuery>,
) -> Result<Json<Value>, ApiError> {
    listing(&state, &query, Some(true), false).await
}

pub async fn archived(
    State(state): State<Arc<AppState>>,
    _editor: Editor,
    Query(query): Query<ReviewerListQuery>,
) -> Result<Json<Value>, ApiError> {
    listing(&state, &query, None, true).await
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    _editor: Editor,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let reviewer = db::users::get_reviewer(state.pool.as_ref(), id, false)
        .await?
        .ok_or_else(|| ApiError::not_found("Reviewer not found"))?;
    Ok(ok(reviewer.to_json()))
}

pub async fn show_archived(
    State(state): State<Arc<AppState>>,
    _editor: Editor,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let reviewer = db::users::get_reviewer(state.pool.as_ref(), id, true)
        .await?
        .ok_or_else(|| ApiError::not_found("Reviewer not found"))?;
    Ok(ok(reviewer.to_json()))
}

pub async fn approve(
    State(state): State<Arc<AppState>>,
    _editor: Editor,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.as_ref();
    let user = db::users::get_user(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Reviewer not found"))?;
    if !user.is_reviewer() {
        return Err(ApiError::BadRequest("User is not a reviewer".to_string()));
    }
    if user.active {
        return Err(ApiError::BadRequest(
            "Reviewer is already approved".to_string(),
        ));
    }

    db::users::set_active(pool, id, true).await?;
    tracing::info!(reviewer_id = id, "reviewer approved");

    Ok(message("Reviewer approved"))
}

#[derive(Deserialize)]
pub struct RejectPayload {
    pub reason: Option<String>,
}

/// Rejection records the reason on the reviewer's document and archives the
/// account; the email can register again later.
pub async fn reject(
    State(state): State<Arc<AppState>>,
    _editor: Editor,
    Path(id): Path<i64>,
    Json(payload): Json<RejectPayload>,
) -> Result<Json<Value>, ApiError> {
    let reason = payload.reason.as_deref().map(str::trim).unwrap_or("");
    let mut errors = FieldErrors::new();
    if reason.is_empty() {
        errors.add("reason", "reason is required");
    } else if reason.chars().count() > 1000 {
        errors.add("reason", "reason must not exceed 1000 characters");
    }
    errors.into_result()?;

    let pool = state.pool.as_ref();
    let user = db::users::get_user(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Reviewer not found"))?;
    if !user.is_reviewer() {
        return Err(ApiError::BadRequest("User is not a reviewer".to_string()));
    }

    db::users::set_rejection_reason(pool, id, reason).await?;
    db::users::soft_delete_user(pool, id).await?;
    tracing::info!(reviewer_id = id, "reviewer rejected and archived");

    Ok(message("Reviewer rejected"))
}
