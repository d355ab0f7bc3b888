use sqlx::PgPool;

use super::{ReviewCriterion, ScientificActivity};

pub async fn list_active_criteria(pool: &PgPool) -> Result<Vec<ReviewCriterion>, sqlx::Error> {
    sqlx::query_as::<_, ReviewCriterion>(
        "SELECT * FROM review_criteria WHERE is_active ORDER BY sort_order",
    )
    .fetch_all(pool)
    .await
}

pub async fn list_criteria(pool: &PgPool) -> Result<Vec<ReviewCriterion>, sqlx::Error> {
    sqlx::query_as::<_, ReviewCriterion>("SELECT * FROM review_criteria ORDER BY sort_order")
        .fetch_all(pool)
        .await
}

pub async fn get_scientific_activity(
    pool: &PgPool,
    id: i64,
) -> Result<Option<ScientificActivity>, sqlx::Error> {
    sqlx::query_as::<_, ScientificActivity>("SELECT * FROM scientific_activities WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_scientific_activities(
    pool: &PgPool,
) -> Result<Vec<ScientificActivity>, sqlx::Error> {
    sqlx::query_as::<_, ScientificActivity>(
        "SELECT * FROM scientific_activities ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await
}
