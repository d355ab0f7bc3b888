use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::Editor;
use crate::db::{self, articles::NewReviewArticle};
use crate::error::{ApiError, FieldErrors};
use crate::pagination::{Page, PageParams};
use crate::routes::{classify_reviewer, ok, ok_with_message, score_breakdown, ReviewerDisposition};
use crate::state::AppState;
use crate::status::{ArticleStatus, AssignmentStatus, IncomingStatus};

#[derive(Deserialize)]
pub struct ArticleListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Merged listing: incoming articles still awaiting consideration plus the
/// review pipeline, newest first.
pub async fn index(
    State(state): State<Arc<AppState>>,
    _editor: Editor,
    Query(query): Query<ArticleListQuery>,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.as_ref();
    let status = query.status.as_deref().unwrap_or("all");
    let search = query.search.as_deref().filter(|s| !s.is_empty());

    let mut entries: Vec<(DateTime<Utc>, Value)> = Vec::new();

    if status == "all" || status == "not_assigned" {
        for article in db::articles::list_incoming_not_assigned(pool, search).await? {
            entries.push((
                article.created_at,
                json!({
                    "id": article.id,
                    "title": article.article_title,
                    "author_name": article.author_name,
                    "deadline": Value::Null,
                    "status": article.status,
                    "created_at": article.created_at,
                    "type": "external",
                }),
            ));
        }
    }

    let article_status = (status != "all").then_some(status);
    for article in db::articles::list_review_articles(pool, article_status, search).await? {
        entries.push((
            article.created_at,
            json!({
                "id": article.id,
                "title": article.title,
                "author_name": article.author_name,
                "deadline": article.deadline,
                "status": article.status,
                "created_at": article.created_at,
                "type": "internal",
            }),
        ));
    }

    entries.sort_by(|a, b| b.0.cmp(&a.0));
    let merged: Vec<Value> = entries.into_iter().map(|(_, value)| value).collect();
    let params = PageParams { page: query.page, per_page: query.per_page };

    Ok(ok(json!(Page::slice(merged, params))))
}

#[derive(Deserialize)]
pub struct StoreArticlePayload {
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub file_path: Option<String>,
    pub edited_file_path: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

fn validate_store(payload: &StoreArticlePayload) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();
    match payload.title.as_deref().map(str::trim) {
        None | Some("") => errors.add("title", "title is required"),
        Some(title) if title.chars().count() > 500 => {
            errors.add("title", "title must not exceed 500 characters")
        }
        _ => {}
    }
    match payload.author_name.as_deref().map(str::trim) {
        None | Some("") => errors.add("author_name", "author_name is required"),
        Some(name) if name.chars().count() > 255 => {
            errors.add("author_name", "author_name must not exceed 255 characters")
        }
        _ => {}
    }
    if payload.file_path.as_deref().map_or(true, |p| p.trim().is_empty()) {
        errors.add("file_path", "file_path is required");
    }
    if let Some(deadline) = payload.deadline {
        if deadline <= Utc::now() {
            errors.add("deadline", "deadline must be in the future");
        }
    }
    if payload.description.as_deref().map_or(false, |d| d.chars().count() > 2000) {
        errors.add("description", "description must not exceed 2000 characters");
    }
    errors.into_result()
}

pub async fn store(
    State(state): State<Arc<AppState>>,
    Editor(editor): Editor,
    Json(payload): Json<StoreArticlePayload>,
) -> Result<Json<Value>, ApiError> {
    validate_store(&payload)?;

    let article = db::articles::create_review_article(
        state.pool.as_ref(),
        &NewReviewArticle {
            title: payload.title.unwrap_or_default().trim().to_string(),
            author_name: payload.author_name.unwrap_or_default().trim().to_string(),
            description: payload.description,
            file_path: payload.file_path,
            edited_file_path: payload.edited_file_path,
            deadline: payload.deadline,
            status: ArticleStatus::NotAssigned.as_str().to_string(),
            created_by: Some(editor.id),
            ..Default::default()
        },
    )
    .await?;

    Ok(ok_with_message("Article added", json!(article)))
}

#[derive(Deserialize)]
pub struct ConvertPayload {
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub edited_file_path: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

/// Converts an incoming article into a review article, snapshotting the
/// original metadata and keeping the original creation date.
pub async fn convert(
    State(state): State<Arc<AppState>>,
    Editor(editor): Editor,
    Path(id): Path<i64>,
    Json(payload): Json<ConvertPayload>,
) -> Result<Json<Value>, ApiError> {
    let mut errors = FieldErrors::new();
    if payload.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
        errors.add("title", "title is required");
    }
    if payload.author_name.as_deref().map_or(true, |n| n.trim().is_empty()) {
        errors.add("author_name", "author_name is required");
    }
    if payload
        .edited_file_path
        .as_deref()
        .map_or(true, |p| p.trim().is_empty())
    {
        errors.add("edited_file_path", "edited_file_path is required");
    }
    errors.into_result()?;

    let pool = state.pool.as_ref();
    let incoming = db::articles::get_incoming(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Article not found"))?;

    let article = db::articles::create_review_article(
        pool,
        &NewReviewArticle {
            title: payload.title.unwrap_or_default().trim().to_string(),
            author_name: payload.author_name.unwrap_or_default().trim().to_string(),
            description: payload.description,
            file_path: incoming.article_file.clone(),
            edited_file_path: payload.edited_file_path,
            deadline: payload.deadline,
            status: ArticleStatus::NotAssigned.as_str().to_string(),
            created_by: Some(editor.id),
            source_article_id: Some(incoming.id),
            source_author_name: Some(incoming.author_name.clone()),
            source_article_file: incoming.article_file.clone(),
            source_title: Some(incoming.article_title.clone()),
            created_at: Some(incoming.created_at),
        },
    )
    .await?;

    db::articles::set_incoming_status(pool, incoming.id, IncomingStatus::Converted.as_str())
        .await?;

    Ok(ok_with_message(
        "Article converted for review",
        json!({
            "id": article.id,
            "title": article.title,
            "author_name": article.author_name,
            "file_path": article.file_path,
            "edited_file_path": article.edited_file_path,
            "deadline": article.deadline,
            "status": article.status,
            "type": "internal",
            "created_at": article.created_at,
            "conversion_date": Utc::now(),
        }),
    ))
}

#[derive(Deserialize)]
pub struct EditedFilePayload {
    pub edited_file_path: Option<String>,
}

pub async fn update_edited_file(
    State(state): State<Arc<AppState>>,
    _editor: Editor,
    Path(id): Path<i64>,
    Json(payload): Json<EditedFilePayload>,
) -> Result<Json<Value>, ApiError> {
    let path = match payload.edited_file_path.as_deref().map(str::trim) {
        Some(path) if !path.is_empty() => path.to_string(),
        _ => {
            return Err(ApiError::Validation(json!({
                "edited_file_path": ["edited_file_path is required"]
            })))
        }
    };

    let article = db::articles::update_edited_file(state.pool.as_ref(), id, &path)
        .await?
        .ok_or_else(|| ApiError::not_found("Article not found"))?;

    Ok(ok(json!({
        "id": article.id,
        "edited_file_path": article.edited_file_path,
        "updated_at": article.updated_at,
    })))
}

#[derive(Deserialize)]
pub struct SendPayload {
    pub reviewers: Option<Vec<i64>>,
    pub deadline: Option<DateTime<Utc>>,
    pub reviewer_deadlines: Option<Vec<Option<DateTime<Utc>>>>,
    pub description: Option<String>,
}

/// Sends an article to a set of reviewers. Accepts either a review article
/// id or an incoming article id; the latter is converted on the fly and the
/// incoming record is marked `appointed`.
pub async fn send_to_reviewers(
    State(state): State<Arc<AppState>>,
    Editor(editor): Editor,
    Path(id): Path<i64>,
    Json(payload): Json<SendPayload>,
) -> Result<Json<Value>, ApiError> {
    let reviewer_ids = payload.reviewers.clone().unwrap_or_default();
    let mut errors = FieldErrors::new();
    if reviewer_ids.is_empty() {
        errors.add("reviewers", "at least one reviewer is required");
    }
    if let Some(deadline) = payload.deadline {
        if deadline <= Utc::now() {
            errors.add("deadline", "deadline must be in the future");
        }
    }
    errors.into_result()?;

    let pool = state.pool.as_ref();

    for reviewer_id in &reviewer_ids {
        let approved = db::users::get_user(pool, *reviewer_id)
            .await?
            .map_or(false, |u| u.is_reviewer() && u.active);
        if !approved {
            return Err(ApiError::unprocessable(format!(
                "Reviewer {} is not an approved reviewer",
                reviewer_id
            )));
        }
    }

    let article = match db::articles::get_review_article(pool, id).await? {
        Some(article) => {
            db::articles::mark_article_sent(
                pool,
                article.id,
                payload.deadline,
                payload.description.as_deref(),
            )
            .await?
        }
        None => {
            let incoming = db::articles::get_incoming(pool, id)
                .await?
                .ok_or_else(|| ApiError::not_found("Article not found"))?;

            let created = db::articles::create_review_article(
                pool,
                &NewReviewArticle {
                    title: incoming.article_title.clone(),
                    author_name: incoming.author_name.clone(),
                    description: payload.description.clone(),
                    file_path: incoming.article_file.clone(),
                    deadline: payload.deadline,
                    status: ArticleStatus::Assigned.as_str().to_string(),
                    created_by: Some(editor.id),
                    source_article_id: Some(incoming.id),
                    source_author_name: Some(incoming.author_name.clone()),
                    source_article_file: incoming.article_file.clone(),
                    source_title: Some(incoming.article_title.clone()),
                    ..Default::default()
                },
            )
            .await?;
            db::articles::set_incoming_status(pool, incoming.id, IncomingStatus::Appointed.as_str())
                .await?;
            created
        }
    };

    let mut assignments = Vec::new();
    for (index, reviewer_id) in reviewer_ids.iter().enumerate() {
        if db::assignments::get_by_article_and_reviewer(pool, article.id, *reviewer_id)
            .await?
            .is_some()
        {
            return Err(ApiError::unprocessable(format!(
                "Reviewer {} is already assigned to this article",
                reviewer_id
            )));
        }
        let deadline = payload
            .reviewer_deadlines
            .as_ref()
            .and_then(|list| list.get(index).copied().flatten())
            .or(payload.deadline);
        let assignment =
            db::assignments::create(pool, article.id, *reviewer_id, deadline, None).await?;
        assignments.push(assignment);
    }

    tracing::info!(
        article_id = article.id,
        reviewers = assignments.len(),
        "article sent to reviewers"
    );

    Ok(ok_with_message(
        "Article sent to reviewers",
        json!({ "article": article, "assignments": assignments }),
    ))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    _editor: Editor,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.as_ref();

    if let Some(article) = db::articles::get_review_article(pool, id).await? {
        let assignments = db::assignments::list_for_article_with_reviewers(pool, id).await?;

        let count_by = |status: AssignmentStatus| {
            assignments
                .iter()
                .filter(|a| a.status == status.as_str())
                .count()
        };
        let summary = json!({
            "total_reviewers": assignments.len(),
            "assigned": count_by(AssignmentStatus::Assigned),
            "in_progress": count_by(AssignmentStatus::InProgress),
            "overdue": count_by(AssignmentStatus::Overdue),
            "completed": count_by(AssignmentStatus::Completed),
            "refused": count_by(AssignmentStatus::Refused),
            "pending_reviews": assignments.len() - count_by(AssignmentStatus::Completed),
            "has_extended_deadlines": assignments.iter().any(|a| a.deadline_extended_at.is_some()),
        });

        return Ok(ok(json!({
            "id": article.id,
            "article_title": article.title,
            "authors_name": article.author_name,
            "file_path": article.file_path,
            "edited_file_path": article.edited_file_path,
            "active_file_path": article.active_file_path(),
            "deadline": article.deadline,
            "status": article.status,
            "type": "internal",
            "assignments": assignments,
            "summary": summary,
        })));
    }

    let incoming = db::articles::get_incoming(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Article not found"))?;

    Ok(ok(json!({
        "id": incoming.id,
        "article_title": incoming.article_title,
        "authors_name": incoming.author_name,
        "file_path": incoming.article_file,
        "deadline": Value::Null,
        "status": incoming.status,
        "type": "external",
        "created_at": incoming.created_at,
        "updated_at": incoming.updated_at,
    })))
}

/// One reviewer's state on an article; the payload shape follows the
/// assignment status.
pub async fn reviewer_review(
    State(state): State<Arc<AppState>>,
    _editor: Editor,
    Path((article_id, reviewer_id)): Path<(i64, i64)>,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.as_ref();

    db::articles::get_review_article(pool, article_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Article not found"))?;

    let assignment = db::assignments::get_by_article_and_reviewer(pool, article_id, reviewer_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Reviewer not found"))?;

    let reviewer = db::users::get_user(pool, reviewer_id).await?;

    let review_data = match AssignmentStatus::parse(&assignment.status) {
        Some(AssignmentStatus::Completed) => {
            let criteria = db::criteria::list_active_criteria(pool).await?;
            json!({
                "scores": score_breakdown(&criteria, assignment.criteria_scores.as_ref()),
                "general_recommendation": assignment.general_recommendation,
                "review_comments": assignment.review_comments,
                "review_files": assignment.review_files,
                "completed_at": assignment.completed_at,
            })
        }
        Some(AssignmentStatus::Refused) => json!({ "comment": assignment.comment }),
        Some(AssignmentStatus::InProgress) => json!({
            "draft_saved": assignment.has_draft(),
            "draft_last_saved_at": assignment.draft_last_saved_at,
            "draft_expires_at": assignment.draft_expires_at,
            "in_progress_at": assignment.in_progress_at,
            "deadline": assignment.deadline,
        }),
        _ => json!({
            "type": "assigned_review",
            "assigned_at": assignment.assigned_at,
            "deadline": assignment.deadline,
        }),
    };

    Ok(ok(json!({
        "id": reviewer_id,
        "name": reviewer.map(|u| u.name),
        "current_status": assignment.status,
        "review_data": review_data,
        "status_dates": {
            "created_at": assignment.created_at,
            "assigned_at": assignment.assigned_at,
            "in_progress_at": assignment.in_progress_at,
            "refused_at": assignment.refused_at,
            "completed_at": assignment.completed_at,
            "status_changed_at": assignment.status_changed_at,
            "deadline": assignment.deadline,
            "extension_date": assignment.deadline_extended_at,
        },
    })))
}

#[derive(Deserialize)]
pub struct DeadlineExtensionPayload {
    pub reviewers: Option<Vec<ExtensionEntry>>,
}

#[derive(Deserialize)]
pub struct ExtensionEntry {
    pub reviewer_id: i64,
    pub new_deadline: DateTime<Utc>,
}

pub async fn deadline_extension(
    State(state): State<Arc<AppState>>,
    _editor: Editor,
    Path(id): Path<i64>,
    Json(payload): Json<DeadlineExtensionPayload>,
) -> Result<Json<Value>, ApiError> {
    let entries = payload.reviewers.unwrap_or_default();
    let mut errors = FieldErrors::new();
    if entries.is_empty() {
        errors.add("reviewers", "at least one reviewer is required");
    }
    for (index, entry) in entries.iter().enumerate() {
        if entry.new_deadline <= Utc::now() {
            errors.add(
                &format!("reviewers.{index}.new_deadline"),
                "new_deadline must be in the future",
            );
        }
    }
    errors.into_result()?;

    let pool = state.pool.as_ref();
    let article = db::articles::get_review_article(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Article not found"))?;

    let extension_date = Utc::now();
    let mut updated = Vec::new();
    let mut failures = Vec::new();

    for entry in &entries {
        let previous =
            db::assignments::get_by_article_and_reviewer(pool, article.id, entry.reviewer_id)
                .await?;

        match previous {
            Some(previous) => {
                let extension = db::assignments::DeadlineExtension::plan(
                    &previous,
                    entry.new_deadline,
                    extension_date,
                );
                let assignment =
                    db::assignments::extend_deadline(pool, previous.id, &extension).await?;
                updated.push(json!({
                    "reviewer_id": assignment.reviewer_id,
                    "old_deadline": previous.deadline,
                    "new_deadline": assignment.deadline,
                    "status": assignment.status,
                    "extended_at": assignment.deadline_extended_at,
                }));
            }
            None => failures.push(json!({
                "reviewer_id": entry.reviewer_id,
                "error": "Reviewer is not assigned to this article",
            })),
        }
    }

    Ok(ok(json!({
        "article": { "id": article.id, "title": article.title },
        "extension_date": extension_date,
        "updated_count": updated.len(),
        "error_count": failures.len(),
        "updated_assignments": updated,
        "errors": failures,
    })))
}

#[derive(Deserialize)]
pub struct AddReviewersPayload {
    pub reviewers: Option<Vec<AddReviewerEntry>>,
}

#[derive(Deserialize)]
pub struct AddReviewerEntry {
    pub reviewer_id: i64,
    pub deadline: Option<DateTime<Utc>>,
    pub comment: Option<String>,
}

/// Adds reviewers to an article one by one, reporting duplicates and
/// unapproved accounts instead of failing the whole batch.
pub async fn add_reviewers(
    State(state): State<Arc<AppState>>,
    _editor: Editor,
    Path(id): Path<i64>,
    Json(payload): Json<AddReviewersPayload>,
) -> Result<Json<Value>, ApiError> {
    let entries = payload.reviewers.unwrap_or_default();
    let mut errors = FieldErrors::new();
    if entries.is_empty() {
        errors.add("reviewers", "at least one reviewer is required");
    }
    for (index, entry) in entries.iter().enumerate() {
        match entry.deadline {
            Some(deadline) if deadline > Utc::now() => {}
            _ => errors.add(
                &format!("reviewers.{index}.deadline"),
                "deadline is required and must be in the future",
            ),
        }
        if entry.comment.as_deref().map_or(false, |c| c.chars().count() > 500) {
            errors.add(
                &format!("reviewers.{index}.comment"),
                "comment must not exceed 500 characters",
            );
        }
    }
    errors.into_result()?;

    let pool = state.pool.as_ref();
    let article = db::articles::get_review_article(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Article not found"))?;

    let mut added = Vec::new();
    let mut duplicates = Vec::new();
    let mut unapproved = Vec::new();

    for entry in &entries {
        let user = db::users::get_user(pool, entry.reviewer_id).await?;
        let existing =
            db::assignments::get_by_article_and_reviewer(pool, article.id, entry.reviewer_id)
                .await?;

        match (classify_reviewer(user.as_ref(), existing.is_some()), user) {
            (ReviewerDisposition::Eligible, Some(user)) => {
                let assignment = db::assignments::create(
                    pool,
                    article.id,
                    user.id,
                    entry.deadline,
                    entry.comment.as_deref(),
                )
                .await?;

                added.push(json!({
                    "assignment_id": assignment.id,
                    "reviewer_id": user.id,
                    "reviewer_name": user.name,
                    "reviewer_email": user.email,
                    "deadline": assignment.deadline,
                    "status": assignment.status,
                    "assigned_at": assignment.assigned_at,
                }));
            }
            (ReviewerDisposition::AlreadyAssigned, Some(user)) => {
                let (current_status, current_deadline) = existing
                    .map(|a| (Some(a.status), a.deadline))
                    .unwrap_or((None, None));
                duplicates.push(json!({
                    "reviewer_id": user.id,
                    "reviewer_name": user.name,
                    "current_status": current_status,
                    "current_deadline": current_deadline,
                    "message": "This reviewer is already assigned",
                }));
            }
            (ReviewerDisposition::Unapproved, Some(user)) => unapproved.push(json!({
                "reviewer_id": user.id,
                "reviewer_name": user.name,
                "email": user.email,
                "message": "Not approved by the chief editor",
            })),
            _ => unapproved.push(json!({
                "reviewer_id": entry.reviewer_id,
                "message": "Reviewer not found",
            })),
        }
    }

    if !added.is_empty() && article.status == ArticleStatus::NotAssigned.as_str() {
        db::articles::set_article_status(pool, article.id, ArticleStatus::Assigned.as_str())
            .await?;
    }

    let mut parts = Vec::new();
    if !added.is_empty() {
        parts.push(format!("{} reviewer(s) added", added.len()));
    }
    if !duplicates.is_empty() {
        parts.push(format!("{} already assigned", duplicates.len()));
    }
    if !unapproved.is_empty() {
        parts.push(format!("{} not approved", unapproved.len()));
    }
    let msg = if parts.is_empty() {
        "No changes".to_string()
    } else {
        parts.join(", ")
    };

    Ok(ok_with_message(
        &msg,
        json!({
            "article": { "id": article.id, "title": article.title },
            "added_reviewers": added,
            "duplicates": duplicates,
            "unapproved": unapproved,
            "summary": {
                "added_count": added.len(),
                "duplicate_count": duplicates.len(),
                "unapproved_count": unapproved.len(),
            },
        }),
    ))
}

pub async fn available_reviewers(
    State(state): State<Arc<AppState>>,
    _editor: Editor,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.as_ref();

    let known = db::articles::get_review_article(pool, id).await?.is_some()
        || db::articles::get_incoming(pool, id).await?.is_some();
    if !known {
        return Err(ApiError::not_found("Article not found"));
    }

    let reviewers = db::users::list_available_reviewers(pool, id).await?;
    Ok(ok(json!(reviewers)))
}

pub async fn reviews(
    State(state): State<Arc<AppState>>,
    _editor: Editor,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.as_ref();
    let article = db::articles::get_review_article(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Article not found"))?;

    let criteria = db::criteria::list_active_criteria(pool).await?;
    let completed = db::assignments::list_completed_with_reviewers(pool, id).await?;

    let reviews: Vec<Value> = completed
        .iter()
        .map(|row| {
            json!({
                "reviewer": {
                    "id": row.reviewer_id,
                    "name": row.reviewer_name,
                    "email": row.reviewer_email,
                },
                "scores": score_breakdown(&criteria, row.criteria_scores.as_ref()),
                "general_recommendation": row.general_recommendation,
                "review_comments": row.review_comments,
                "review_files": row.review_files,
                "completed_at": row.completed_at,
            })
        })
        .collect();

    Ok(ok(json!({
        "article": { "id": article.id, "title": article.title },
        "reviews": reviews,
        "total_reviews": reviews.len(),
    })))
}
