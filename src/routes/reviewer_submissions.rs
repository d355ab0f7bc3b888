use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::ActiveReviewer;
use crate::db::{self, submissions::ReviewInput};
use crate::error::{ApiError, FieldErrors};
use crate::pagination::{Page, PageParams};
use crate::routes::{ok, ok_with_message};
use crate::state::AppState;
use crate::status::AssignmentStatus;

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    ActiveReviewer(reviewer): ActiveReviewer,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.as_ref();
    let counts = db::submissions::reviewer_counts(pool, reviewer.id).await?;
    let recent = db::submissions::recent_assignments_for_reviewer(pool, reviewer.id, 5).await?;

    Ok(ok(json!({
        "statistics": counts,
        "recent_assignments": recent,
    })))
}

#[derive(Deserialize)]
pub struct AssignmentListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    ActiveReviewer(reviewer): ActiveReviewer,
    Query(query): Query<AssignmentListQuery>,
) -> Result<Json<Value>, ApiError> {
    let params = PageParams { page: query.page, per_page: query.per_page };
    let (rows, total) = db::submissions::list_assignments_for_reviewer(
        state.pool.as_ref(),
        reviewer.id,
        query.status.as_deref().filter(|s| !s.is_empty() && *s != "all"),
        query.search.as_deref().filter(|s| !s.is_empty()),
        params,
    )
    .await?;
    Ok(ok(json!(Page::new(rows, total, params))))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    ActiveReviewer(reviewer): ActiveReviewer,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.as_ref();
    let submission = db::submissions::get(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Submission not found"))?;
    let assignment = db::submissions::get_assignment(pool, id, reviewer.id)
        .await?
        .ok_or_else(|| ApiError::forbidden("You are not assigned to this submission"))?;

    Ok(ok(json!({
        "submission": submission,
        "assignment": assignment,
    })))
}

/// Reviewer explicitly takes the submission on.
pub async fn start(
    State(state): State<Arc<AppState>>,
    ActiveReviewer(reviewer): ActiveReviewer,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.as_ref();
    let assignment = db::submissions::get_assignment(pool, id, reviewer.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Assignment not found"))?;

    if assignment.status != AssignmentStatus::Assigned.as_str() {
        return Err(ApiError::unprocessable(format!(
            "Cannot start a review in status {}",
            assignment.status
        )));
    }

    let updated = db::submissions::start_assignment(pool, assignment.id).await?;
    Ok(ok_with_message("Review started", json!(updated)))
}

#[derive(Deserialize)]
pub struct SubmissionReviewPayload {
    pub originality_score: Option<i16>,
    pub methodology_score: Option<i16>,
    pub argumentation_score: Option<i16>,
    pub structure_score: Option<i16>,
    pub significance_score: Option<i16>,
    pub general_recommendation: Option<String>,
    pub comments: Option<String>,
    pub files: Option<Value>,
}

fn validate_review(payload: &SubmissionReviewPayload) -> Result<ReviewInput, ApiError> {
    let mut errors = FieldErrors::new();

    let mut score = |field: &str, value: Option<i16>| -> i16 {
        match value {
            Some(score) if (1..=5).contains(&score) => score,
            Some(_) => {
                errors.add(field, format!("{field} must be between 1 and 5"));
                0
            }
            None => {
                errors.add(field, format!("{field} is required"));
                0
            }
        }
    };

    let originality = score("originality_score", payload.originality_score);
    let methodology = score("methodology_score", payload.methodology_score);
    let argumentation = score("argumentation_score", payload.argumentation_score);
    let structure = score("structure_score", payload.structure_score);
    let significance = score("significance_score", payload.significance_score);

    let recommendation = match payload.general_recommendation.as_deref().map(str::trim) {
        None | Some("") => {
            errors.add("general_recommendation", "general_recommendation is required");
            String::new()
        }
        Some(text) if text.chars().count() > 1000 => {
            errors.add(
                "general_recommendation",
                "general_recommendation must not exceed 1000 characters",
            );
            String::new()
        }
        Some(text) => text.to_string(),
    };
    if payload.comments.as_deref().map_or(false, |c| c.chars().count() > 2000) {
        errors.add("comments", "comments must not exceed 2000 characters");
    }

    errors.into_result()?;

    Ok(ReviewInput {
        originality_score: originality,
        methodology_score: methodology,
        argumentation_score: argumentation,
        structure_score: structure,
        significance_score: significance,
        general_recommendation: recommendation,
        comments: payload.comments.clone(),
        files: payload.files.clone().unwrap_or_else(|| json!([])),
    })
}

/// Submitting from `assigned` starts the assignment implicitly; either way
/// the assignment completes and the review is stored.
pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    ActiveReviewer(reviewer): ActiveReviewer,
    Path(id): Path<i64>,
    Json(payload): Json<SubmissionReviewPayload>,
) -> Result<Json<Value>, ApiError> {
    let review_input = validate_review(&payload)?;

    let pool = state.pool.as_ref();
    db::submissions::get(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Submission not found"))?;
    let assignment = db::submissions::get_assignment(pool, id, reviewer.id)
        .await?
        .ok_or_else(|| ApiError::forbidden("You are not assigned to this submission"))?;

    let open = matches!(
        AssignmentStatus::parse(&assignment.status),
        Some(AssignmentStatus::Assigned) | Some(AssignmentStatus::InProgress)
    );
    if !open {
        return Err(ApiError::unprocessable(format!(
            "Cannot submit a review in status {}",
            assignment.status
        )));
    }

    let review = db::submissions::upsert_review(pool, id, reviewer.id, &review_input).await?;
    db::submissions::complete_assignment(pool, assignment.id).await?;

    tracing::info!(submission_id = id, reviewer_id = reviewer.id, "submission review submitted");

    Ok(ok_with_message("Review submitted", json!(review)))
}

/// A reviewer may revise their own submitted review.
pub async fn update_review(
    State(state): State<Arc<AppState>>,
    ActiveReviewer(reviewer): ActiveReviewer,
    Path(id): Path<i64>,
    Json(payload): Json<SubmissionReviewPayload>,
) -> Result<Json<Value>, ApiError> {
    let review_input = validate_review(&payload)?;

    let pool = state.pool.as_ref();
    db::submissions::get_review_for_reviewer(pool, id, reviewer.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Review not found"))?;

    let review = db::submissions::update_review(pool, id, &review_input).await?;
    Ok(ok_with_message("Review updated", json!(review)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> SubmissionReviewPayload {
        SubmissionReviewPayload {
            originality_score: Some(4),
            methodology_score: Some(3),
            argumentation_score: Some(5),
            structure_score: Some(4),
            significance_score: Some(2),
            general_recommendation: Some("Accept with minor revisions".into()),
            comments: Some("Solid methodology.".into()),
            files: None,
        }
    }

    #[test]
    fn complete_review_passes() {
        let review = validate_review(&valid_payload()).unwrap();
        assert_eq!(review.originality_score, 4);
        assert_eq!(review.files, json!([]));
    }

    #[test]
    fn scores_outside_one_to_five_fail() {
        let payload = SubmissionReviewPayload {
            originality_score: Some(0),
            significance_score: Some(6),
            ..valid_payload()
        };
        match validate_review(&payload).unwrap_err() {
            ApiError::Validation(value) => {
                assert!(value.get("originality_score").is_some());
                assert!(value.get("significance_score").is_some());
                assert!(value.get("methodology_score").is_none());
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn missing_recommendation_fails() {
        let payload = SubmissionReviewPayload {
            general_recommendation: Some("  ".into()),
            ..valid_payload()
        };
        assert!(validate_review(&payload).is_err());
    }
}
