use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{IncomingArticle, ReviewArticle};

pub async fn get_incoming(pool: &PgPool, id: i64) -> Result<Option<IncomingArticle>, sqlx::Error> {
    sqlx::query_as::<_, IncomingArticle>("SELECT * FROM incoming_articles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_incoming_not_assigned(
    pool: &PgPool,
    search: Option<&str>,
) -> Result<Vec<IncomingArticle>, sqlx::Error> {
    sqlx::query_as::<_, IncomingArticle>(
        r#"
        SELECT * FROM incoming_articles
        WHERE status = 'not_assigned'
          AND ($1::text IS NULL OR article_title ILIKE '%' || $1 || '%'
               OR author_name ILIKE '%' || $1 || '%')
        ORDER BY created_at DESC
        "#,
    )
    .bind(search)
    .fetch_all(pool)
    .await
}

pub async fn set_incoming_status(pool: &PgPool, id: i64, status: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE incoming_articles SET status = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;
    Ok(())
}

#[derive(Debug, Default)]
pub struct NewReviewArticle {
    pub title: String,
    pub author_name: String,
    pub description: Option<String>,
    pub file_path: Option<String>,
    pub edited_file_path: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: String,
    pub created_by: Option<i64>,
    pub source_article_id: Option<i64>,
    pub source_author_name: Option<String>,
    pub source_article_file: Option<String>,
    pub source_title: Option<String>,
    /// Conversion keeps the incoming article's original creation date.
    pub created_at: Option<DateTime<Utc>>,
}

pub async fn create_review_article(
    pool: &PgPool,
    article: &NewReviewArticle,
) -> Result<ReviewArticle, sqlx::Error> {
    sqlx::query_as::<_, ReviewArticle>(
        r#"
        INSERT INTO review_articles
            (title, author_name, description, file_path, edited_file_path, deadline,
             status, created_by, source_article_id, source_author_name,
             source_article_file, source_title, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, COALESCE($13, now()))
        RETURNING *
        "#,
    )
    .bind(&article.title)
    .bind(&article.author_name)
    .bind(&article.description)
    .bind(&article.file_path)
    .bind(&article.edited_file_path)
    .bind(article.deadline)
    .bind(&article.status)
    .bind(article.created_by)
    .bind(article.source_article_id)
    .bind(&article.source_author_name)
    .bind(&article.source_article_file)
    .bind(&article.source_title)
    .bind(article.created_at)
    .fetch_one(pool)
    .await
}

pub async fn get_review_article(
    pool: &PgPool,
    id: i64,
) -> Result<Option<ReviewArticle>, sqlx::Error> {
    sqlx::query_as::<_, ReviewArticle>("SELECT * FROM review_articles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_review_articles(
    pool: &PgPool,
    status: Option<&str>,
    search: Option<&str>,
) -> Result<Vec<ReviewArticle>, sqlx::Error> {
    sqlx::query_as::<_, ReviewArticle>(
        r#"
        SELECT * FROM review_articles
        WHERE ($1::text IS NULL OR status = $1)
          AND ($2::text IS NULL OR title ILIKE '%' || $2 || '%'
               OR author_name ILIKE '%' || $2 || '%')
        ORDER BY created_at DESC
        "#,
    )
    .bind(status)
    .bind(search)
    .fetch_all(pool)
    .await
}

pub async fn update_edited_file(
    pool: &PgPool,
    id: i64,
    edited_file_path: &str,
) -> Result<Option<ReviewArticle>, sqlx::Error> {
    sqlx::query_as::<_, ReviewArticle>(
        r#"
        UPDATE review_articles
        SET edited_file_path = $2, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(edited_file_path)
    .fetch_optional(pool)
    .await
}

pub async fn set_article_status(pool: &PgPool, id: i64, status: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE review_articles SET status = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;
    Ok(())
}

/// Assignment to reviewers also records the article-level deadline/notes.
pub async fn mark_article_sent(
    pool: &PgPool,
    id: i64,
    deadline: Option<DateTime<Utc>>,
    description: Option<&str>,
) -> Result<ReviewArticle, sqlx::Error> {
    sqlx::query_as::<_, ReviewArticle>(
        r#"
        UPDATE review_articles
        SET status = 'assigned',
            deadline = $2,
            description = COALESCE($3, description),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(deadline)
    .bind(description)
    .fetch_one(pool)
    .await
}
