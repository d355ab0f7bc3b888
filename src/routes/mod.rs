pub mod editor_articles;
pub mod editor_reviewers;
pub mod editor_submissions;
pub mod reference;
pub mod reviewer_articles;
pub mod reviewer_submissions;

use axum::Json;
use serde_json::{json, Value};

use crate::db::{ReviewCriterion, User};

pub(crate) fn ok(data: Value) -> Json<Value> {
    Json(json!({ "status": true, "data": data }))
}

pub(crate) fn ok_with_message(msg: &str, data: Value) -> Json<Value> {
    Json(json!({ "status": true, "message": msg, "data": data }))
}

pub(crate) fn message(msg: &str) -> Json<Value> {
    Json(json!({ "status": true, "message": msg }))
}

/// Disposition of one requested reviewer when an editor hands out work.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ReviewerDisposition {
    Eligible,
    AlreadyAssigned,
    Unapproved,
    Missing,
}

/// Only approved reviewer accounts without an existing assignment for the
/// same article or submission get a new one.
pub(crate) fn classify_reviewer(
    user: Option<&User>,
    already_assigned: bool,
) -> ReviewerDisposition {
    match user {
        None => ReviewerDisposition::Missing,
        Some(user) if !user.is_reviewer() || !user.active => ReviewerDisposition::Unapproved,
        Some(_) if already_assigned => ReviewerDisposition::AlreadyAssigned,
        Some(_) => ReviewerDisposition::Eligible,
    }
}

/// Looks up a saved score by criterion id in a JSON score map.
pub(crate) fn saved_score(scores: Option<&Value>, criterion_id: i64) -> Value {
    scores
        .and_then(|map| map.get(criterion_id.to_string()))
        .cloned()
        .unwrap_or(Value::Null)
}

/// Per-criterion score breakdown for review detail responses.
pub(crate) fn score_breakdown(criteria: &[ReviewCriterion], scores: Option<&Value>) -> Vec<Value> {
    criteria
        .iter()
        .map(|criterion| {
            json!({
                "id": criterion.id,
                "name": criterion.name,
                "name_ru": criterion.name_ru,
                "name_uz": criterion.name_uz,
                "name_en": criterion.name_en,
                "max_score": criterion.max_score,
                "score": saved_score(scores, criterion.id),
            })
        })
        .collect()
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

    #[test]
    fn breakdown_pairs_scores_with_criteria() {
        let criteria = vec![criterion(1, 5.0), criterion(2, 10.0)];
        let scores = json!({ "1": 4.5 });
        let breakdown = score_breakdown(&criteria, Some(&scores));

        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0]["score"], json!(4.5));
        assert_eq!(breakdown[1]["score"], Value::Null);
        assert_eq!(breakdown[1]["max_score"], json!(10.0));
    }

    #[test]
    fn missing_score_map_yields_nulls() {
        let criteria = vec![criterion(1, 5.0)];
        let breakdown = score_breakdown(&criteria, None);
        assert_eq!(breakdown[0]["score"], Value::Null);
    }

    fn user(role: &str, active: bool) -> User {
        User {
            id: 7,
            name: "Dilnoza Karimova".to_string(),
            email: "dilnoza@example.uz".to_string(),
            role: role.to_string(),
            active,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn duplicate_assignment_is_rejected() {
        let reviewer = user("reviewer", true);
        assert_eq!(
            classify_reviewer(Some(&reviewer), true),
            ReviewerDisposition::AlreadyAssigned
        );
        assert_eq!(
            classify_reviewer(Some(&reviewer), false),
            ReviewerDisposition::Eligible
        );
    }

    #[test]
    fn unapproved_or_unknown_reviewers_get_no_assignment() {
        assert_eq!(
            classify_reviewer(Some(&user("reviewer", false)), false),
            ReviewerDisposition::Unapproved
        );
        assert_eq!(
            classify_reviewer(Some(&user("editor", true)), false),
            ReviewerDisposition::Unapproved
        );
        assert_eq!(classify_reviewer(None, false), ReviewerDisposition::Missing);
    }
}
