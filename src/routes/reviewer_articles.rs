use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::ActiveReviewer;
use crate::db::{self, assignments::CompletedReview, assignments::DraftInput, ReviewCriterion};
use crate::error::{ApiError, FieldErrors};
use crate::pagination::{Page, PageParams};
use crate::routes::{message, ok, ok_with_message, score_breakdown};
use crate::state::AppState;
use crate::status::{AssignmentStatus, Recommendation};

#[derive(Deserialize)]
pub struct AssignmentListQuery {
    pub search: Option<String>,
    pub created_on: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

async fn listing(
    state: &AppState,
    reviewer_id: i64,
    status: AssignmentStatus,
    query: AssignmentListQuery,
) -> Result<Json<Value>, ApiError> {
    let params = PageParams { page: query.page, per_page: query.per_page };
    let (rows, total) = db::assignments::list_for_reviewer(
        state.pool.as_ref(),
        reviewer_id,
        status.as_str(),
        query.search.as_deref().filter(|s| !s.is_empty()),
        query.created_on,
        params,
    )
    .await?;
    Ok(ok(json!(Page::new(rows, total, params))))
}

pub async fn assigned(
    State(state): State<Arc<AppState>>,
    ActiveReviewer(reviewer): ActiveReviewer,
    Query(query): Query<AssignmentListQuery>,
) -> Result<Json<Value>, ApiError> {
    listing(&state, reviewer.id, AssignmentStatus::Assigned, query).await
}

pub async fn in_progress(
    State(state): State<Arc<AppState>>,
    ActiveReviewer(reviewer): ActiveReviewer,
    Query(query): Query<AssignmentListQuery>,
) -> Result<Json<Value>, ApiError> {
    listing(&state, reviewer.id, AssignmentStatus::InProgress, query).await
}

pub async fn completed(
    State(state): State<Arc<AppState>>,
    ActiveReviewer(reviewer): ActiveReviewer,
    Query(query): Query<AssignmentListQuery>,
) -> Result<Json<Value>, ApiError> {
    listing(&state, reviewer.id, AssignmentStatus::Completed, query).await
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    ActiveReviewer(reviewer): ActiveReviewer,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.as_ref();
    let assignment = db::assignments::get_for_reviewer(pool, id, reviewer.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Assignment not found"))?;
    let article = db::articles::get_review_article(pool, assignment.article_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Article not found"))?;

    Ok(ok(json!({
        "assignment": {
            "id": assignment.id,
            "status": assignment.status,
            "assigned_at": assignment.assigned_at,
            "deadline": assignment.deadline,
            "comment": assignment.comment,
            "in_progress_at": assignment.in_progress_at,
            "completed_at": assignment.completed_at,
            "has_draft": assignment.has_draft(),
        },
        "article": {
            "id": article.id,
            "title": article.title,
            "author_name": article.author_name,
            "description": article.description,
            "file_path": article.active_file_path(),
        },
    })))
}

#[derive(Deserialize)]
pub struct DecisionPayload {
    pub action: Option<String>,
    pub comment: Option<String>,
}

/// Reviewer accepts or declines the assignment. Both moves are only valid
/// while the assignment is still in `assigned`; declining needs a comment.
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    ActiveReviewer(reviewer): ActiveReviewer,
    Path(id): Path<i64>,
    Json(payload): Json<DecisionPayload>,
) -> Result<Json<Value>, ApiError> {
    let action = payload.action.as_deref().unwrap_or_default();
    let mut errors = FieldErrors::new();
    if !matches!(action, "accept" | "reject") {
        errors.add("action", "action must be accept or reject");
    }
    if action == "reject" {
        match payload.comment.as_deref().map(str::trim) {
            None | Some("") => errors.add("comment", "comment is required when declining"),
            Some(comment) if comment.chars().count() > 500 => {
                errors.add("comment", "comment must not exceed 500 characters")
            }
            _ => {}
        }
    }
    errors.into_result()?;

    let pool = state.pool.as_ref();
    let assignment = db::assignments::get_for_reviewer(pool, id, reviewer.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Assignment not found"))?;

    let current = AssignmentStatus::parse(&assignment.status)
        .ok_or_else(|| ApiError::unprocessable("Assignment is in an unknown state"))?;
    let next = if action == "accept" {
        AssignmentStatus::InProgress
    } else {
        AssignmentStatus::Refused
    };
    if !current.can_transition(next) {
        return Err(ApiError::unprocessable(format!(
            "Cannot {} a review in status {}",
            action,
            current.as_str()
        )));
    }

    let updated = if next == AssignmentStatus::InProgress {
        db::assignments::set_in_progress(pool, assignment.id).await?
    } else {
        let comment = payload.comment.as_deref().unwrap_or_default().trim();
        db::assignments::set_refused(pool, assignment.id, comment).await?
    };

    tracing::info!(
        assignment_id = assignment.id,
        status = updated.status.as_str(),
        "assignment decision recorded"
    );

    Ok(ok_with_message(
        if action == "accept" { "Review accepted" } else { "Review declined" },
        json!(updated),
    ))
}

/// Checks a criterion-id-keyed score map against the active criteria. Every
/// active criterion needs a score within `0..=max_score`; unknown keys fail.
fn validate_criteria_scores(
    criteria: &[ReviewCriterion],
    scores: &Value,
    errors: &mut FieldErrors,
) {
    let map = match scores.as_object() {
        Some(map) => map,
        None => {
            errors.add("criteria_scores", "criteria_scores must be an object");
            return;
        }
    };

    for criterion in criteria {
        let key = criterion.id.to_string();
        match map.get(&key).and_then(Value::as_f64) {
            Some(score) if score >= 0.0 && score <= criterion.max_score => {}
            Some(_) => errors.add(
                &format!("criteria_scores.{key}"),
                format!("score must be between 0 and {}", criterion.max_score),
            ),
            None => errors.add(
                &format!("criteria_scores.{key}"),
                format!("score for '{}' is required", criterion.name),
            ),
        }
    }

    for key in map.keys() {
        if !criteria.iter().any(|c| c.id.to_string() == *key) {
            errors.add(
                &format!("criteria_scores.{key}"),
                "unknown review criterion",
            );
        }
    }
}

#[derive(Deserialize)]
pub struct SubmitReviewPayload {
    pub criteria_scores: Option<Value>,
    pub general_recommendation: Option<String>,
    pub review_comments: Option<String>,
    pub review_files: Option<Value>,
}

pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    ActiveReviewer(reviewer): ActiveReviewer,
    Path(id): Path<i64>,
    Json(payload): Json<SubmitReviewPayload>,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.as_ref();
    let assignment = db::assignments::get_for_reviewer(pool, id, reviewer.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Assignment not found"))?;

    let current = AssignmentStatus::parse(&assignment.status)
        .ok_or_else(|| ApiError::unprocessable("Assignment is in an unknown state"))?;
    if !current.can_transition(AssignmentStatus::Completed) {
        return Err(ApiError::unprocessable(format!(
            "Cannot submit a review in status {}",
            current.as_str()
        )));
    }

    let mut errors = FieldErrors::new();
    let recommendation = payload
        .general_recommendation
        .as_deref()
        .and_then(Recommendation::parse);
    if recommendation.is_none() {
        errors.add(
            "general_recommendation",
            "general_recommendation must be one of accept, after_revision, reject",
        );
    }
    match payload.review_comments.as_deref().map(str::trim) {
        None | Some("") => errors.add("review_comments", "review_comments is required"),
        Some(comments) if comments.chars().count() > 5000 => {
            errors.add("review_comments", "review_comments must not exceed 5000 characters")
        }
        _ => {}
    }
    let criteria = db::criteria::list_active_criteria(pool).await?;
    match &payload.criteria_scores {
        Some(scores) => validate_criteria_scores(&criteria, scores, &mut errors),
        None => errors.add("criteria_scores", "criteria_scores is required"),
    }
    errors.into_result()?;

    let review = CompletedReview {
        general_recommendation: recommendation
            .map(|r| r.as_str().to_string())
            .unwrap_or_default(),
        review_comments: payload
            .review_comments
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_string(),
        review_files: payload.review_files.unwrap_or_else(|| json!([])),
        criteria_scores: payload.criteria_scores.unwrap_or_else(|| json!({})),
    };
    let updated = db::assignments::complete(pool, assignment.id, &review).await?;

    tracing::info!(assignment_id = assignment.id, "review submitted");

    Ok(ok_with_message(
        "Review submitted",
        json!({
            "id": updated.id,
            "status": updated.status,
            "completed_at": updated.completed_at,
            "scores": score_breakdown(&criteria, updated.criteria_scores.as_ref()),
            "general_recommendation": updated.general_recommendation,
        }),
    ))
}

#[derive(Deserialize)]
pub struct DraftPayload {
    pub criteria_scores: Option<Value>,
    pub general_recommendation: Option<String>,
    pub review_comments: Option<String>,
}

/// Saves work in progress. Drafts carry an expiry; the maintenance sweep
/// clears them once it passes.
pub async fn save_draft(
    State(state): State<Arc<AppState>>,
    ActiveReviewer(reviewer): ActiveReviewer,
    Path(id): Path<i64>,
    Json(payload): Json<DraftPayload>,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.as_ref();
    let assignment = db::assignments::get_for_reviewer(pool, id, reviewer.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Assignment not found"))?;

    if assignment.status != AssignmentStatus::InProgress.as_str() {
        return Err(ApiError::unprocessable(
            "Drafts can only be saved while the review is in progress",
        ));
    }

    if let Some(scores) = &payload.criteria_scores {
        if !scores.is_object() {
            return Err(ApiError::Validation(json!({
                "criteria_scores": ["criteria_scores must be an object"]
            })));
        }
    }

    let expires_at = Utc::now() + Duration::days(state.config.draft_ttl_days);
    let draft = DraftInput {
        criteria_scores: payload.criteria_scores,
        general_recommendation: payload.general_recommendation,
        review_comments: payload.review_comments,
    };
    let updated = db::assignments::save_draft(pool, assignment.id, &draft, expires_at).await?;

    Ok(ok_with_message(
        "Draft saved",
        json!({
            "draft_last_saved_at": updated.draft_last_saved_at,
            "draft_expires_at": updated.draft_expires_at,
        }),
    ))
}

pub async fn get_draft(
    State(state): State<Arc<AppState>>,
    ActiveReviewer(reviewer): ActiveReviewer,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let assignment = db::assignments::get_for_reviewer(state.pool.as_ref(), id, reviewer.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Assignment not found"))?;

    if !assignment.has_draft() || assignment.draft_expired(Utc::now()) {
        return Err(ApiError::not_found("No draft saved"));
    }

    Ok(ok(json!({
        "criteria_scores": assignment.draft_criteria_scores,
        "general_recommendation": assignment.draft_general_recommendation,
        "review_comments": assignment.draft_review_comments,
        "draft_last_saved_at": assignment.draft_last_saved_at,
        "draft_expires_at": assignment.draft_expires_at,
    })))
}

pub async fn delete_draft(
    State(state): State<Arc<AppState>>,
    ActiveReviewer(reviewer): ActiveReviewer,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.as_ref();
    let assignment = db::assignments::get_for_reviewer(pool, id, reviewer.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Assignment not found"))?;

    db::assignments::clear_draft(pool, assignment.id).await?;
    Ok(message("Draft discarded"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn criterion(id: i64, max_score: f64) -> ReviewCriterion {
        ReviewCriterion {
            id,
            name: format!("criterion-{id}"),
            name_ru: String::new(),
            name_uz: String::new(),
            name_en: String::new(),
            max_score,
            is_active: true,
            sort_order: id as i32,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn check(criteria: &[ReviewCriterion], scores: Value) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        validate_criteria_scores(criteria, &scores, &mut errors);
        errors.into_result()
    }

    #[test]
    fn full_score_map_passes() {
        let criteria = vec![criterion(1, 5.0), criterion(2, 10.0)];
        assert!(check(&criteria, json!({ "1": 4.5, "2": 10 })).is_ok());
    }

    #[test]
    fn missing_and_out_of_range_scores_fail() {
        let criteria = vec![criterion(1, 5.0), criterion(2, 10.0)];
        match check(&criteria, json!({ "1": 6.0 })).unwrap_err() {
            ApiError::Validation(value) => {
                assert!(value.get("criteria_scores.1").is_some());
                assert!(value.get("criteria_scores.2").is_some());
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_criterion_keys_fail() {
        let criteria = vec![criterion(1, 5.0)];
        match check(&criteria, json!({ "1": 3.0, "99": 1.0 })).unwrap_err() {
            ApiError::Validation(value) => {
                assert!(value.get("criteria_scores.99").is_some());
                assert!(value.get("criteria_scores.1").is_none());
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn non_object_score_payload_fails() {
        let criteria = vec![criterion(1, 5.0)];
        assert!(check(&criteria, json!([1, 2])).is_err());
    }
}
