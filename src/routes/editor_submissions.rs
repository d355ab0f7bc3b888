use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::Editor;
use crate::db::{self, submissions::SubmissionFilter};
use crate::error::{ApiError, FieldErrors};
use crate::pagination::{Page, PageParams};
use crate::routes::{classify_reviewer, message, ok, ok_with_message, ReviewerDisposition};
use crate::state::AppState;
use crate::status::SubmissionStatus;

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    _editor: Editor,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.as_ref();
    let counts = db::submissions::status_counts(pool).await?;
    let active_reviewers = db::users::count_reviewers(pool, true).await?;
    let pending_reviewers = db::users::count_reviewers(pool, false).await?;
    let recent = db::submissions::recent(pool, 5).await?;

    Ok(ok(json!({
        "statistics": {
            "total_submissions": counts.total_submissions,
            "pending_submissions": counts.pending_submissions,
            "under_review": counts.under_review,
            "accepted": counts.accepted,
            "rejected": counts.rejected,
            "revisions_required": counts.revisions_required,
            "active_reviewers": active_reviewers,
            "pending_reviewers": pending_reviewers,
        },
        "recent_submissions": recent,
    })))
}

#[derive(Deserialize)]
pub struct SubmissionListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    _editor: Editor,
    Query(query): Query<SubmissionListQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter = SubmissionFilter {
        status: query.status.filter(|s| !s.is_empty() && s != "all"),
        search: query.search.filter(|s| !s.is_empty()),
        date_from: query.date_from,
        date_to: query.date_to,
        sort_by: query.sort_by,
        sort_desc: query.sort.as_deref() != Some("asc"),
    };
    let params = PageParams { page: query.page, per_page: query.per_page };
    let (rows, total) = db::submissions::list(state.pool.as_ref(), &filter, params).await?;
    Ok(ok(json!(Page::new(rows, total, params))))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    _editor: Editor,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.as_ref();
    let submission = db::submissions::get(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Submission not found"))?;
    let assignments = db::submissions::list_assignments_for_submission(pool, id).await?;
    let reviews = db::submissions::list_reviews_for_submission(pool, id).await?;

    Ok(ok(json!({
        "submission": submission,
        "assignments": assignments,
        "reviews": reviews,
    })))
}

#[derive(Deserialize)]
pub struct AssignPayload {
    pub reviewer_id: Option<i64>,
    pub deadline: Option<DateTime<Utc>>,
}

/// Assigning the first reviewer moves a pending submission under review.
pub async fn assign(
    State(state): State<Arc<AppState>>,
    Editor(editor): Editor,
    Path(id): Path<i64>,
    Json(payload): Json<AssignPayload>,
) -> Result<Json<Value>, ApiError> {
    let mut errors = FieldErrors::new();
    if payload.reviewer_id.is_none() {
        errors.add("reviewer_id", "reviewer_id is required");
    }
    if let Some(deadline) = payload.deadline {
        if deadline <= Utc::now() {
            errors.add("deadline", "deadline must be in the future");
        }
    }
    errors.into_result()?;
    let reviewer_id = payload.reviewer_id.unwrap_or_default();

    let pool = state.pool.as_ref();
    let submission = db::submissions::get(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Submission not found"))?;

    let user = db::users::get_user(pool, reviewer_id).await?;
    let already_assigned = db::submissions::get_assignment(pool, id, reviewer_id)
        .await?
        .is_some();
    match classify_reviewer(user.as_ref(), already_assigned) {
        ReviewerDisposition::Eligible => {}
        ReviewerDisposition::AlreadyAssigned => {
            return Err(ApiError::unprocessable(
                "This reviewer is already assigned to the submission",
            ));
        }
        ReviewerDisposition::Unapproved | ReviewerDisposition::Missing => {
            return Err(ApiError::unprocessable(
                "Selected user is not an approved reviewer",
            ));
        }
    }

    let assignment =
        db::submissions::create_assignment(pool, id, reviewer_id, editor.id, payload.deadline)
            .await?;

    if SubmissionStatus::parse(&submission.status)
        .map_or(false, |s| s.can_transition(SubmissionStatus::UnderReview))
    {
        db::submissions::set_status(pool, id, SubmissionStatus::UnderReview.as_str()).await?;
    }

    Ok(ok_with_message("Reviewer assigned", json!(assignment)))
}

pub async fn remove_assignment(
    State(state): State<Arc<AppState>>,
    _editor: Editor,
    Path((id, assignment_id)): Path<(i64, i64)>,
) -> Result<Json<Value>, ApiError> {
    let removed =
        db::submissions::delete_assignment(state.pool.as_ref(), id, assignment_id).await?;
    if removed == 0 {
        return Err(ApiError::not_found("Assignment not found"));
    }
    Ok(message("Assignment removed"))
}

#[derive(Deserialize)]
pub struct StatusPayload {
    pub status: Option<String>,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    _editor: Editor,
    Path(id): Path<i64>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<Value>, ApiError> {
    let next = payload
        .status
        .as_deref()
        .and_then(SubmissionStatus::parse)
        .ok_or_else(|| {
            ApiError::Validation(json!({
                "status": ["status must be one of pending, under_review, accepted, rejected, revisions_required"]
            }))
        })?;

    let pool = state.pool.as_ref();
    let submission = db::submissions::get(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Submission not found"))?;

    let current = SubmissionStatus::parse(&submission.status)
        .ok_or_else(|| ApiError::unprocessable("Submission is in an unknown state"))?;
    if !current.can_transition(next) {
        return Err(ApiError::unprocessable(format!(
            "Cannot move submission from {} to {}",
            current.as_str(),
            next.as_str()
        )));
    }

    let updated = db::submissions::set_status(pool, id, next.as_str()).await?;
    tracing::info!(submission_id = id, status = next.as_str(), "submission status updated");

    Ok(ok_with_message("Submission status updated", json!(updated)))
}

pub async fn destroy(
    State(state): State<Arc<AppState>>,
    _editor: Editor,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let deleted = db::submissions::delete(state.pool.as_ref(), id).await?;
    if deleted == 0 {
        return Err(ApiError::not_found("Submission not found"));
    }
    Ok(message("Submission deleted"))
}
