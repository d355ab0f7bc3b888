use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::{Submission, SubmissionAssignment, SubmissionReview};
use crate::pagination::PageParams;

pub async fn get(pool: &PgPool, id: i64) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>("SELECT * FROM submissions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

#[derive(Debug, Default)]
pub struct SubmissionFilter {
    pub status: Option<String>,
    pub search: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub sort_desc: bool,
}

pub async fn list(
    pool: &PgPool,
    filter: &SubmissionFilter,
    params: PageParams,
) -> Result<(Vec<Submission>, i64), sqlx::Error> {
    // Sort column comes from the client; only known columns pass through.
    let sort_by = match filter.sort_by.as_deref() {
        Some("title") => "title",
        Some("status") => "status",
        Some("updated_at") => "updated_at",
        _ => "created_at",
    };
    let direction = if filter.sort_desc { "DESC" } else { "ASC" };

    let where_clause = r#"
        WHERE ($1::text IS NULL OR status = $1)
          AND ($2::text IS NULL OR title ILIKE '%' || $2 || '%'
               OR abstract ILIKE '%' || $2 || '%')
          AND ($3::date IS NULL OR (created_at AT TIME ZONE 'UTC')::date >= $3)
          AND ($4::date IS NULL OR (created_at AT TIME ZONE 'UTC')::date <= $4)
    "#;

    let rows = sqlx::query_as::<_, Submission>(&format!(
        "SELECT * FROM submissions {where_clause} ORDER BY {sort_by} {direction} LIMIT $5 OFFSET $6",
    ))
    .bind(&filter.status)
    .bind(&filter.search)
    .bind(filter.date_from)
    .bind(filter.date_to)
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await?;

    let total: i64 =
        sqlx::query_scalar(&format!("SELECT count(*) FROM submissions {where_clause}"))
            .bind(&filter.status)
            .bind(&filter.search)
            .bind(filter.date_from)
            .bind(filter.date_to)
            .fetch_one(pool)
            .await?;

    Ok((rows, total))
}

pub async fn recent(pool: &PgPool, limit: i64) -> Result<Vec<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        "SELECT * FROM submissions ORDER BY created_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

#[derive(Debug, FromRow, Serialize)]
pub struct SubmissionCounts {
    pub total_submissions: i64,
    pub pending_submissions: i64,
    pub under_review: i64,
    pub accepted: i64,
    pub rejected: i64,
    pub revisions_required: i64,
}

pub async fn status_counts(pool: &PgPool) -> Result<SubmissionCounts, sqlx::Error> {
    sqlx::query_as::<_, SubmissionCounts>(
        r#"
        SELECT count(*) AS total_submissions,
               count(*) FILTER (WHERE status = 'pending') AS pending_submissions,
               count(*) FILTER (WHERE status = 'under_review') AS under_review,
               count(*) FILTER (WHERE status = 'accepted') AS accepted,
               count(*) FILTER (WHERE status = 'rejected') AS rejected,
               count(*) FILTER (WHERE status = 'revisions_required') AS revisions_required
        FROM submissions
        "#,
    )
    .fetch_one(pool)
    .await
}

pub async fn set_status(pool: &PgPool, id: i64, status: &str) -> Result<Submission, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        "UPDATE submissions SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM submissions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

// --- assignments ---

pub async fn create_assignment(
    pool: &PgPool,
    submission_id: i64,
    reviewer_id: i64,
    assigned_by: i64,
    deadline: Option<DateTime<Utc>>,
) -> Result<SubmissionAssignment, sqlx::Error> {
    sqlx::query_as::<_, SubmissionAssignment>(
        r#"
        INSERT INTO submission_assignments
            (submission_id, reviewer_id, assigned_by, status, assigned_at, deadline)
        VALUES ($1, $2, $3, 'assigned', now(), $4)
        RETURNING *
        "#,
    )
    .bind(submission_id)
    .bind(reviewer_id)
    .bind(assigned_by)
    .bind(deadline)
    .fetch_one(pool)
    .await
}

pub async fn get_assignment(
    pool: &PgPool,
    submission_id: i64,
    reviewer_id: i64,
) -> Result<Option<SubmissionAssignment>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionAssignment>(
        "SELECT * FROM submission_assignments WHERE submission_id = $1 AND reviewer_id = $2",
    )
    .bind(submission_id)
    .bind(reviewer_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_assignment(
    pool: &PgPool,
    submission_id: i64,
    assignment_id: i64,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM submission_assignments WHERE id = $1 AND submission_id = $2")
            .bind(assignment_id)
            .bind(submission_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}

pub async fn list_assignments_for_submission(
    pool: &PgPool,
    submission_id: i64,
) -> Result<Vec<SubmissionAssignment>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionAssignment>(
        "SELECT * FROM submission_assignments WHERE submission_id = $1 ORDER BY assigned_at",
    )
    .bind(submission_id)
    .fetch_all(pool)
    .await
}

/// Reviewer's own assignment listing, joined with the submission.
#[derive(Debug, FromRow, Serialize)]
pub struct ReviewerAssignmentRow {
    pub id: i64,
    pub submission_id: i64,
    pub title: String,
    pub status: String,
    pub assigned_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

pub async fn list_assignments_for_reviewer(
    pool: &PgPool,
    reviewer_id: i64,
    status: Option<&str>,
    search: Option<&str>,
    params: PageParams,
) -> Result<(Vec<ReviewerAssignmentRow>, i64), sqlx::Error> {
    let where_clause = r#"
        WHERE a.reviewer_id = $1
          AND ($2::text IS NULL OR a.status = $2)
          AND ($3::text IS NULL OR s.title ILIKE '%' || $3 || '%'
               OR s.abstract ILIKE '%' || $3 || '%')
    "#;

    let rows = sqlx::query_as::<_, ReviewerAssignmentRow>(&format!(
        r#"
        SELECT a.id, a.submission_id, s.title, a.status, a.assigned_at,
               a.deadline, a.completed_at
        FROM submission_assignments a
        JOIN submissions s ON s.id = a.submission_id
        {where_clause}
        ORDER BY a.created_at DESC
        LIMIT $4 OFFSET $5
        "#,
    ))
    .bind(reviewer_id)
    .bind(status)
    .bind(search)
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(&format!(
        r#"
        SELECT count(*)
        FROM submission_assignments a
        JOIN submissions s ON s.id = a.submission_id
        {where_clause}
        "#,
    ))
    .bind(reviewer_id)
    .bind(status)
    .bind(search)
    .fetch_one(pool)
    .await?;

    Ok((rows, total))
}

pub async fn recent_assignments_for_reviewer(
    pool: &PgPool,
    reviewer_id: i64,
    limit: i64,
) -> Result<Vec<ReviewerAssignmentRow>, sqlx::Error> {
    sqlx::query_as::<_, ReviewerAssignmentRow>(
        r#"
        SELECT a.id, a.submission_id, s.title, a.status, a.assigned_at,
               a.deadline, a.completed_at
        FROM submission_assignments a
        JOIN submissions s ON s.id = a.submission_id
        WHERE a.reviewer_id = $1
        ORDER BY a.created_at DESC
        LIMIT $2
        "#,
    )
    .bind(reviewer_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

#[derive(Debug, FromRow, Serialize)]
pub struct ReviewerCounts {
    pub total_assigned: i64,
    pub pending_review: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub overdue: i64,
}

pub async fn reviewer_counts(
    pool: &PgPool,
    reviewer_id: i64,
) -> Result<ReviewerCounts, sqlx::Error> {
    sqlx::query_as::<_, ReviewerCounts>(
        r#"
        SELECT count(*) AS total_assigned,
               count(*) FILTER (WHERE status = 'assigned') AS pending_review,
               count(*) FILTER (WHERE status = 'in_progress') AS in_progress,
               count(*) FILTER (WHERE status = 'completed') AS completed,
               count(*) FILTER (WHERE status NOT IN ('completed', 'refused')
                                AND deadline IS NOT NULL AND deadline < now()) AS overdue
        FROM submission_assignments
        WHERE reviewer_id = $1
        "#,
    )
    .bind(reviewer_id)
    .fetch_one(pool)
    .await
}

pub async fn start_assignment(
    pool: &PgPool,
    id: i64,
) -> Result<SubmissionAssignment, sqlx::Error> {
    sqlx::query_as::<_, SubmissionAssignment>(
        r#"
        UPDATE submission_assignments
        SET status = 'in_progress', updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn complete_assignment(
    pool: &PgPool,
    id: i64,
) -> Result<SubmissionAssignment, sqlx::Error> {
    sqlx::query_as::<_, SubmissionAssignment>(
        r#"
        UPDATE submission_assignments
        SET status = 'completed', completed_at = now(), updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await
}

// --- reviews ---

#[derive(Debug)]
pub struct ReviewInput {
    pub originality_score: i16,
    pub methodology_score: i16,
    pub argumentation_score: i16,
    pub structure_score: i16,
    pub significance_score: i16,
    pub general_recommendation: String,
    pub comments: Option<String>,
    pub files: serde_json::Value,
}

pub async fn upsert_review(
    pool: &PgPool,
    submission_id: i64,
    reviewer_id: i64,
    review: &ReviewInput,
) -> Result<SubmissionReview, sqlx::Error> {
    sqlx::query_as::<_, SubmissionReview>(
        r#"
        INSERT INTO submission_reviews
            (submission_id, reviewer_id, originality_score, methodology_score,
             argumentation_score, structure_score, significance_score,
             general_recommendation, comments, files, status, submitted_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'submitted', now())
        ON CONFLICT (submission_id, reviewer_id) DO UPDATE SET
            originality_score = EXCLUDED.originality_score,
            methodology_score = EXCLUDED.methodology_score,
            argumentation_score = EXCLUDED.argumentation_score,
            structure_score = EXCLUDED.structure_score,
            significance_score = EXCLUDED.significance_score,
            general_recommendation = EXCLUDED.general_recommendation,
            comments = EXCLUDED.comments,
            files = EXCLUDED.files,
            status = 'submitted',
            submitted_at = now(),
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(submission_id)
    .bind(reviewer_id)
    .bind(review.originality_score)
    .bind(review.methodology_score)
    .bind(review.argumentation_score)
    .bind(review.structure_score)
    .bind(review.significance_score)
    .bind(&review.general_recommendation)
    .bind(&review.comments)
    .bind(&review.files)
    .fetch_one(pool)
    .await
}

pub async fn get_review_for_reviewer(
    pool: &PgPool,
    review_id: i64,
    reviewer_id: i64,
) -> Result<Option<SubmissionReview>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionReview>(
        "SELECT * FROM submission_reviews WHERE id = $1 AND reviewer_id = $2",
    )
    .bind(review_id)
    .bind(reviewer_id)
    .fetch_optional(pool)
    .await
}

pub async fn update_review(
    pool: &PgPool,
    review_id: i64,
    review: &ReviewInput,
) -> Result<SubmissionReview, sqlx::Error> {
    sqlx::query_as::<_, SubmissionReview>(
        r#"
        UPDATE submission_reviews
        SET originality_score = $2, methodology_score = $3, argumentation_score = $4,
            structure_score = $5, significance_score = $6, general_recommendation = $7,
            comments = $8, files = $9, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(review_id)
    .bind(review.originality_score)
    .bind(review.methodology_score)
    .bind(review.argumentation_score)
    .bind(review.structure_score)
    .bind(review.significance_score)
    .bind(&review.general_recommendation)
    .bind(&review.comments)
    .bind(&review.files)
    .fetch_one(pool)
    .await
}

pub async fn list_reviews_for_submission(
    pool: &PgPool,
    submission_id: i64,
) -> Result<Vec<SubmissionReview>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionReview>(
        "SELECT * FROM submission_reviews WHERE submission_id = $1 ORDER BY created_at",
    )
    .bind(submission_id)
    .fetch_all(pool)
    .await
}
