use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::{ReviewerRow, User, UserDocument};
use crate::pagination::PageParams;

const REVIEWER_SELECT: &str = r#"
    SELECT u.id, u.name, u.email, u.created_at, u.updated_at, u.deleted_at,
           d.id AS document_id, d.institutional_phone, d.academic_degree,
           d.work_place, d.position, d.science_field_id, d.diploma_file,
           d.diploma_issued_by, d.orcid, d.rejection_reason,
           s.title_uz AS science_title_uz, s.title_ru AS science_title_ru,
           s.title_en AS science_title_en
    FROM users u
    LEFT JOIN user_documents d ON d.user_id = u.id
    LEFT JOIN scientific_activities s ON s.id = d.science_field_id
"#;

pub async fn get_user(pool: &PgPool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Looks the user up even when soft-deleted (re-registration flow).
pub async fn get_user_by_email_any(
    pool: &PgPool,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn create_reviewer(pool: &PgPool, name: &str, email: &str) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, role, active)
        VALUES ($1, $2, 'reviewer', false)
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(email)
    .fetch_one(pool)
    .await
}

/// Restores a soft-deleted account: back to pending, new name, old email.
pub async fn restore_reviewer(pool: &PgPool, id: i64, name: &str) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET deleted_at = NULL, active = false, name = $2, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .fetch_one(pool)
    .await
}

pub async fn update_name(pool: &PgPool, id: i64, name: &str) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET name = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(name)
    .fetch_one(pool)
    .await
}

pub async fn get_document(
    pool: &PgPool,
    user_id: i64,
) -> Result<Option<UserDocument>, sqlx::Error> {
    sqlx::query_as::<_, UserDocument>("SELECT * FROM user_documents WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn set_active(pool: &PgPool, id: i64, active: bool) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET active = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(active)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn soft_delete_user(pool: &PgPool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET deleted_at = now(), updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

#[derive(Debug, Default)]
pub struct DocumentInput {
    pub institutional_phone: Option<String>,
    pub academic_degree: Option<String>,
    pub work_place: Option<String>,
    pub position: Option<String>,
    pub science_field_id: Option<i64>,
    pub diploma_file: Option<String>,
    pub diploma_issued_by: Option<String>,
    pub orcid: Option<String>,
}

pub async fn upsert_document(
    pool: &PgPool,
    user_id: i64,
    doc: &DocumentInput,
) -> Result<UserDocument, sqlx::Error> {
    sqlx::query_as::<_, UserDocument>(
        r#"
        INSERT INTO user_documents
            (user_id, institutional_phone, academic_degree, work_place, position,
             science_field_id, diploma_file, diploma_issued_by, orcid, rejection_reason)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NULL)
        ON CONFLICT (user_id) DO UPDATE SET
            institutional_phone = EXCLUDED.institutional_phone,
            academic_degree = EXCLUDED.academic_degree,
            work_place = EXCLUDED.work_place,
            position = EXCLUDED.position,
            science_field_id = EXCLUDED.science_field_id,
            diploma_file = EXCLUDED.diploma_file,
            diploma_issued_by = EXCLUDED.diploma_issued_by,
            orcid = EXCLUDED.orcid,
            rejection_reason = NULL,
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&doc.institutional_phone)
    .bind(&doc.academic_degree)
    .bind(&doc.work_place)
    .bind(&doc.position)
    .bind(doc.science_field_id)
    .bind(&doc.diploma_file)
    .bind(&doc.diploma_issued_by)
    .bind(&doc.orcid)
    .fetch_one(pool)
    .await
}

pub async fn set_rejection_reason(
    pool: &PgPool,
    user_id: i64,
    reason: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO user_documents (user_id, rejection_reason)
        VALUES ($1, $2)
        ON CONFLICT (user_id)
            DO UPDATE SET rejection_reason = EXCLUDED.rejection_reason, updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(reason)
    .execute(pool)
    .await?;
    Ok(())
}

/// Filters for the editor's reviewer listings.
#[derive(Debug, Default)]
pub struct ReviewerFilter {
    /// `Some(true)` approved, `Some(false)` pending, `None` either.
    pub active: Option<bool>,
    /// Soft-deleted accounts only.
    pub archived: bool,
    pub science_field_id: Option<i64>,
    pub created_on: Option<NaiveDate>,
    pub deleted_on: Option<NaiveDate>,
    pub sort_desc: bool,
}

pub async fn list_reviewers(
    pool: &PgPool,
    filter: &ReviewerFilter,
    params: PageParams,
) -> Result<(Vec<ReviewerRow>, i64), sqlx::Error> {
    let order_column = if filter.archived { "u.deleted_at" } else { "u.created_at" };
    let direction = if filter.sort_desc { "DESC" } else { "ASC" };

    let where_clause = r#"
        WHERE u.role = 'reviewer'
          AND (($1 AND u.deleted_at IS NOT NULL) OR (NOT $1 AND u.deleted_at IS NULL))
          AND ($2::boolean IS NULL OR u.active = $2)
          AND ($3::bigint IS NULL OR d.science_field_id = $3)
          AND ($4::date IS NULL OR (u.created_at AT TIME ZONE 'UTC')::date = $4)
          AND ($5::date IS NULL OR (u.deleted_at AT TIME ZONE 'UTC')::date = $5)
    "#;

    let rows = sqlx::query_as::<_, ReviewerRow>(&format!(
        "{REVIEWER_SELECT} {where_clause} ORDER BY {order_column} {direction} LIMIT $6 OFFSET $7",
    ))
    .bind(filter.archived)
    .bind(filter.active)
    .bind(filter.science_field_id)
    .bind(filter.created_on)
    .bind(filter.deleted_on)
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(&format!(
        r#"
        SELECT count(*)
        FROM users u
        LEFT JOIN user_documents d ON d.user_id = u.id
        {where_clause}
        "#,
    ))
    .bind(filter.archived)
    .bind(filter.active)
    .bind(filter.science_field_id)
    .bind(filter.created_on)
    .bind(filter.deleted_on)
    .fetch_one(pool)
    .await?;

    Ok((rows, total))
}

pub async fn get_reviewer(
    pool: &PgPool,
    id: i64,
    archived: bool,
) -> Result<Option<ReviewerRow>, sqlx::Error> {
    sqlx::query_as::<_, ReviewerRow>(&format!(
        r#"
        {REVIEWER_SELECT}
        WHERE u.role = 'reviewer' AND u.id = $1
          AND (($2 AND u.deleted_at IS NOT NULL) OR (NOT $2 AND u.deleted_at IS NULL))
        "#,
    ))
    .bind(id)
    .bind(archived)
    .fetch_optional(pool)
    .await
}

#[derive(Debug, FromRow, Serialize)]
pub struct ReviewerName {
    pub id: i64,
    pub name: String,
}

pub async fn list_active_reviewer_names(pool: &PgPool) -> Result<Vec<ReviewerName>, sqlx::Error> {
    sqlx::query_as::<_, ReviewerName>(
        r#"
        SELECT id, name FROM users
        WHERE role = 'reviewer' AND active AND deleted_at IS NULL
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Approved reviewers not yet assigned to the article.
pub async fn list_available_reviewers(
    pool: &PgPool,
    article_id: i64,
) -> Result<Vec<ReviewerName>, sqlx::Error> {
    sqlx::query_as::<_, ReviewerName>(
        r#"
        SELECT id, name FROM users
        WHERE role = 'reviewer' AND active AND deleted_at IS NULL
          AND id NOT IN (SELECT reviewer_id FROM review_assignments WHERE article_id = $1)
        ORDER BY name
        "#,
    )
    .bind(article_id)
    .fetch_all(pool)
    .await
}

pub async fn count_reviewers(pool: &PgPool, active: bool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT count(*) FROM users WHERE role = 'reviewer' AND active = $1 AND deleted_at IS NULL",
    )
    .bind(active)
    .fetch_one(pool)
    .await
}
