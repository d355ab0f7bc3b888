use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::ReviewAssignment;
use crate::pagination::PageParams;
use crate::status::AssignmentStatus;

pub async fn create(
    pool: &PgPool,
    article_id: i64,
    reviewer_id: i64,
    deadline: Option<DateTime<Utc>>,
    comment: Option<&str>,
) -> Result<ReviewAssignment, sqlx::Error> {
    sqlx::query_as::<_, ReviewAssignment>(
        r#"
        INSERT INTO review_assignments
            (article_id, reviewer_id, status, assigned_at, deadline, comment, status_changed_at)
        VALUES ($1, $2, 'assigned', now(), $3, $4, now())
        RETURNING *
        "#,
    )
    .bind(article_id)
    .bind(reviewer_id)
    .bind(deadline)
    .bind(comment)
    .fetch_one(pool)
    .await
}

pub async fn get_for_reviewer(
    pool: &PgPool,
    id: i64,
    reviewer_id: i64,
) -> Result<Option<ReviewAssignment>, sqlx::Error> {
    sqlx::query_as::<_, ReviewAssignment>(
        "SELECT * FROM review_assignments WHERE id = $1 AND reviewer_id = $2",
    )
    .bind(id)
    .bind(reviewer_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_by_article_and_reviewer(
    pool: &PgPool,
    article_id: i64,
    reviewer_id: i64,
) -> Result<Option<ReviewAssignment>, sqlx::Error> {
    sqlx::query_as::<_, ReviewAssignment>(
        "SELECT * FROM review_assignments WHERE article_id = $1 AND reviewer_id = $2",
    )
    .bind(article_id)
    .bind(reviewer_id)
    .fetch_optional(pool)
    .await
}

/// Assignment joined with the reviewer, for the editor's article views.
#[derive(Debug, FromRow, Serialize)]
pub struct ArticleAssignmentRow {
    pub id: i64,
    pub reviewer_id: i64,
    pub reviewer_name: String,
    pub reviewer_email: String,
    pub status: String,
    pub assigned_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub deadline_extended_at: Option<DateTime<Utc>>,
    pub general_recommendation: Option<String>,
}

pub async fn list_for_article_with_reviewers(
    pool: &PgPool,
    article_id: i64,
) -> Result<Vec<ArticleAssignmentRow>, sqlx::Error> {
    sqlx::query_as::<_, ArticleAssignmentRow>(
        r#"
        SELECT a.id, a.reviewer_id, u.name AS reviewer_name, u.email AS reviewer_email,
               a.status, a.assigned_at, a.deadline, a.completed_at,
               a.deadline_extended_at, a.general_recommendation
        FROM review_assignments a
        JOIN users u ON u.id = a.reviewer_id
        WHERE a.article_id = $1
        ORDER BY a.assigned_at
        "#,
    )
    .bind(article_id)
    .fetch_all(pool)
    .await
}

/// Completed review joined with the reviewer, for the editor's review roundup.
#[derive(Debug, FromRow, Serialize)]
pub struct CompletedReviewRow {
    pub reviewer_id: i64,
    pub reviewer_name: String,
    pub reviewer_email: String,
    pub general_recommendation: Option<String>,
    pub review_comments: Option<String>,
    pub review_files: Option<serde_json::Value>,
    pub criteria_scores: Option<serde_json::Value>,
    pub completed_at: Option<DateTime<Utc>>,
}

pub async fn list_completed_with_reviewers(
    pool: &PgPool,
    article_id: i64,
) -> Result<Vec<CompletedReviewRow>, sqlx::Error> {
    sqlx::query_as::<_, CompletedReviewRow>(
        r#"
        SELECT a.reviewer_id, u.name AS reviewer_name, u.email AS reviewer_email,
               a.general_recommendation, a.review_comments, a.review_files,
               a.criteria_scores, a.completed_at
        FROM review_assignments a
        JOIN users u ON u.id = a.reviewer_id
        WHERE a.article_id = $1 AND a.status = 'completed'
        ORDER BY a.completed_at
        "#,
    )
    .bind(article_id)
    .fetch_all(pool)
    .await
}

/// Row for the reviewer's own listings, joined with the article.
#[derive(Debug, FromRow, Serialize)]
pub struct AssignmentListRow {
    pub id: i64,
    pub article_id: i64,
    pub title: String,
    pub author_name: String,
    pub status: String,
    pub assigned_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

pub async fn list_for_reviewer(
    pool: &PgPool,
    reviewer_id: i64,
    status: &str,
    search: Option<&str>,
    created_on: Option<NaiveDate>,
    params: PageParams,
) -> Result<(Vec<AssignmentListRow>, i64), sqlx::Error> {
    // Completed work sorts by completion date, open work by assignment date.
    let order = if status == "completed" {
        "a.completed_at DESC NULLS LAST"
    } else {
        "a.assigned_at DESC"
    };

    let where_clause = r#"
        WHERE a.reviewer_id = $1 AND a.status = $2
          AND ($3::text IS NULL OR r.title ILIKE '%' || $3 || '%'
               OR r.author_name ILIKE '%' || $3 || '%')
          AND ($4::date IS NULL OR (a.created_at AT TIME ZONE 'UTC')::date = $4)
    "#;

    let rows = sqlx::query_as::<_, AssignmentListRow>(&format!(
        r#"
        SELECT a.id, a.article_id, r.title, r.author_name, a.status,
               a.assigned_at, a.deadline, a.completed_at
        FROM review_assignments a
        JOIN review_articles r ON r.id = a.article_id
        {where_clause}
        ORDER BY {order}
        LIMIT $5 OFFSET $6
        "#,
    ))
    .bind(reviewer_id)
    .bind(status)
    .bind(search)
    .bind(created_on)
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(&format!(
        r#"
        SELECT count(*)
        FROM review_assignments a
        JOIN review_articles r ON r.id = a.article_id
        {where_clause}
        "#,
    ))
    .bind(reviewer_id)
    .bind(status)
    .bind(search)
    .bind(created_on)
    .fetch_one(pool)
    .await?;

    Ok((rows, total))
}

pub async fn set_in_progress(pool: &PgPool, id: i64) -> Result<ReviewAssignment, sqlx::Error> {
    sqlx::query_as::<_, ReviewAssignment>(
        r#"
        UPDATE review_assignments
        SET status = 'in_progress', comment = NULL, in_progress_at = now(),
            status_changed_at = now(), updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn set_refused(
    pool: &PgPool,
    id: i64,
    comment: &str,
) -> Result<ReviewAssignment, sqlx::Error> {
    sqlx::query_as::<_, ReviewAssignment>(
        r#"
        UPDATE review_assignments
        SET status = 'refused', comment = $2, refused_at = now(),
            status_changed_at = now(), updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(comment)
    .fetch_one(pool)
    .await
}

pub struct CompletedReview {
    pub general_recommendation: String,
    pub review_comments: String,
    pub review_files: serde_json::Value,
    pub criteria_scores: serde_json::Value,
}

/// Submitting the review also discards any saved draft.
pub async fn complete(
    pool: &PgPool,
    id: i64,
    review: &CompletedReview,
) -> Result<ReviewAssignment, sqlx::Error> {
    sqlx::query_as::<_, ReviewAssignment>(
        r#"
        UPDATE review_assignments
        SET status = 'completed', completed_at = now(), status_changed_at = now(),
            general_recommendation = $2, review_comments = $3,
            review_files = $4, criteria_scores = $5,
            draft_criteria_scores = NULL, draft_general_recommendation = NULL,
            draft_review_comments = NULL, draft_expires_at = NULL,
            draft_last_saved_at = NULL, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&review.general_recommendation)
    .bind(&review.review_comments)
    .bind(&review.review_files)
    .bind(&review.criteria_scores)
    .fetch_one(pool)
    .await
}

/// Column changes for one reviewer's deadline extension. An assignment the
/// sweep already marked `overdue` goes back to its open status so the
/// reviewer can resume the work.
pub struct DeadlineExtension {
    pub new_deadline: DateTime<Utc>,
    pub extended_at: DateTime<Utc>,
    pub reopen_as: Option<AssignmentStatus>,
}

impl DeadlineExtension {
    pub fn plan(
        assignment: &ReviewAssignment,
        new_deadline: DateTime<Utc>,
        extended_at: DateTime<Utc>,
    ) -> Self {
        let reopen_as = AssignmentStatus::parse(&assignment.status)
            .and_then(|status| status.reopened(assignment.in_progress_at.is_some()));
        DeadlineExtension {
            new_deadline,
            extended_at,
            reopen_as,
        }
    }
}

pub async fn extend_deadline(
    pool: &PgPool,
    id: i64,
    extension: &DeadlineExtension,
) -> Result<ReviewAssignment, sqlx::Error> {
    sqlx::query_as::<_, ReviewAssignment>(
        r#"
        UPDATE review_assignments
        SET deadline = $2, deadline_extended_at = $3,
            status = COALESCE($4, status),
            status_changed_at = CASE WHEN $4 IS NULL THEN status_changed_at ELSE now() END,
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(extension.new_deadline)
    .bind(extension.extended_at)
    .bind(extension.reopen_as.map(AssignmentStatus::as_str))
    .fetch_one(pool)
    .await
}

pub struct DraftInput {
    pub criteria_scores: Option<serde_json::Value>,
    pub general_recommendation: Option<String>,
    pub review_comments: Option<String>,
}

pub async fn save_draft(
    pool: &PgPool,
    id: i64,
    draft: &DraftInput,
    expires_at: DateTime<Utc>,
) -> Result<ReviewAssignment, sqlx::Error> {
    sqlx::query_as::<_, ReviewAssignment>(
        r#"
        UPDATE review_assignments
        SET draft_criteria_scores = $2, draft_general_recommendation = $3,
            draft_review_comments = $4, draft_expires_at = $5,
            draft_last_saved_at = now(), updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&draft.criteria_scores)
    .bind(&draft.general_recommendation)
    .bind(&draft.review_comments)
    .bind(expires_at)
    .fetch_one(pool)
    .await
}

pub async fn clear_draft(pool: &PgPool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE review_assignments
        SET draft_criteria_scores = NULL, draft_general_recommendation = NULL,
            draft_review_comments = NULL, draft_expires_at = NULL,
            draft_last_saved_at = NULL, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Sweep: open assignments past their deadline become `overdue`.
pub async fn mark_overdue(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE review_assignments
        SET status = 'overdue', status_changed_at = now(), updated_at = now()
        WHERE status IN ('assigned', 'in_progress')
          AND deadline IS NOT NULL AND deadline < now()
        "#,
    )
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Sweep: drop drafts past their expiry.
pub async fn clear_expired_drafts(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE review_assignments
        SET draft_criteria_scores = NULL, draft_general_recommendation = NULL,
            draft_review_comments = NULL, draft_expires_at = NULL,
            draft_last_saved_at = NULL, updated_at = now()
        WHERE draft_expires_at IS NOT NULL AND draft_expires_at < now()
        "#,
    )
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn assignment(status: &str, in_progress_at: Option<DateTime<Utc>>) -> ReviewAssignment {
        let now = Utc::now();
        ReviewAssignment {
            id: 1,
            article_id: 10,
            reviewer_id: 20,
            status: status.to_string(),
            assigned_at: now - Duration::days(14),
            deadline: Some(now - Duration::days(2)),
            comment: None,
            in_progress_at,
            refused_at: None,
            completed_at: None,
            status_changed_at: Some(now - Duration::days(2)),
            deadline_extended_at: None,
            general_recommendation: None,
            review_comments: None,
            review_files: None,
            criteria_scores: None,
            draft_criteria_scores: None,
            draft_general_recommendation: None,
            draft_review_comments: None,
            draft_expires_at: None,
            draft_last_saved_at: None,
            created_at: now - Duration::days(14),
            updated_at: now,
        }
    }

    #[test]
    fn extension_carries_deadline_and_marker_together() {
        let now = Utc::now();
        let new_deadline = now + Duration::days(7);
        let plan = DeadlineExtension::plan(&assignment("assigned", None), new_deadline, now);
        assert_eq!(plan.new_deadline, new_deadline);
        assert_eq!(plan.extended_at, now);
        assert_eq!(plan.reopen_as, None);
    }

    #[test]
    fn extension_reopens_overdue_assignments() {
        let now = Utc::now();
        let new_deadline = now + Duration::days(7);
        let started = assignment("overdue", Some(now - Duration::days(5)));
        let plan = DeadlineExtension::plan(&started, new_deadline, now);
        assert_eq!(plan.reopen_as, Some(AssignmentStatus::InProgress));

        let untouched = assignment("overdue", None);
        let plan = DeadlineExtension::plan(&untouched, new_deadline, now);
        assert_eq!(plan.reopen_as, Some(AssignmentStatus::Assigned));
    }

    #[test]
    fn extension_leaves_finished_work_alone() {
        let now = Utc::now();
        let done = assignment("completed", Some(now - Duration::days(5)));
        let plan = DeadlineExtension::plan(&done, now + Duration::days(7), now);
        assert_eq!(plan.reopen_as, None);
    }

    #[test]
    fn draft_expiry_is_visible_before_the_sweep_runs() {
        let now = Utc::now();
        let mut with_draft = assignment("in_progress", Some(now - Duration::days(1)));
        with_draft.draft_last_saved_at = Some(now - Duration::hours(1));
        with_draft.draft_expires_at = Some(now + Duration::days(7));
        assert!(with_draft.has_draft());
        assert!(!with_draft.draft_expired(now));

        with_draft.draft_expires_at = Some(now - Duration::hours(1));
        assert!(with_draft.draft_expired(now));

        let no_draft = assignment("in_progress", None);
        assert!(!no_draft.has_draft());
        assert!(!no_draft.draft_expired(now));
    }
}
