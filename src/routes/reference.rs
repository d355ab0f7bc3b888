use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::db::{self, users::DocumentInput};
use crate::error::{ApiError, FieldErrors};
use crate::routes::ok;
use crate::state::AppState;

pub async fn scientific_activities(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let activities = db::criteria::list_scientific_activities(state.pool.as_ref()).await?;
    Ok(ok(json!(activities)))
}

pub async fn review_criteria(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let criteria = db::criteria::list_criteria(state.pool.as_ref()).await?;
    Ok(ok(json!(criteria)))
}

pub async fn active_reviewers(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let reviewers = db::users::list_active_reviewer_names(state.pool.as_ref()).await?;
    Ok(ok(json!(reviewers)))
}

#[derive(Deserialize)]
pub struct RegisterPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub institutional_phone: Option<String>,
    pub academic_degree: Option<String>,
    pub work_place: Option<String>,
    pub position: Option<String>,
    pub science_field_id: Option<i64>,
    pub diploma_file: Option<String>,
    pub diploma_issued_by: Option<String>,
    pub orcid: Option<String>,
}

fn validate_register(payload: &RegisterPayload) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();

    match payload.name.as_deref().map(str::trim) {
        None | Some("") => errors.add("name", "name is required"),
        Some(name) if name.chars().count() > 255 => {
            errors.add("name", "name must not exceed 255 characters")
        }
        _ => {}
    }
    match payload.email.as_deref().map(str::trim) {
        None | Some("") => errors.add("email", "email is required"),
        Some(email) if !email.contains('@') => errors.add("email", "email must be a valid address"),
        _ => {}
    }
    for (field, value) in [
        ("academic_degree", &payload.academic_degree),
        ("work_place", &payload.work_place),
        ("position", &payload.position),
        ("diploma_file", &payload.diploma_file),
        ("diploma_issued_by", &payload.diploma_issued_by),
    ] {
        match value.as_deref().map(str::trim) {
            None | Some("") => errors.add(field, format!("{field} is required")),
            _ => {}
        }
    }
    if payload.science_field_id.is_none() {
        errors.add("science_field_id", "science_field_id is required");
    }

    errors.into_result()
}

/// Reviewer self-registration. The account stays inactive until a chief
/// editor approves it; re-registering a soft-deleted email restores the
/// old account into the pending state.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterPayload>,
) -> Result<Json<Value>, ApiError> {
    validate_register(&payload)?;
    let pool = state.pool.as_ref();

    let science_field_id = payload.science_field_id.unwrap_or_default();
    let known_field = db::criteria::get_scientific_activity(pool, science_field_id)
        .await?
        .is_some();
    if !known_field {
        return Err(ApiError::Validation(json!({
            "science_field_id": ["unknown scientific activity"]
        })));
    }

    let name = payload.name.as_deref().unwrap_or_default().trim().to_string();
    let email = payload.email.as_deref().unwrap_or_default().trim().to_string();

    let doc = DocumentInput {
        institutional_phone: payload.institutional_phone.clone(),
        academic_degree: payload.academic_degree.clone(),
        work_place: payload.work_place.clone(),
        position: payload.position.clone(),
        science_field_id: Some(science_field_id),
        diploma_file: payload.diploma_file.clone(),
        diploma_issued_by: payload.diploma_issued_by.clone(),
        orcid: payload.orcid.clone(),
    };

    let (user, msg) = match db::users::get_user_by_email_any(pool, &email).await? {
        Some(existing) if existing.deleted_at.is_some() => {
            let restored = db::users::restore_reviewer(pool, existing.id, &name).await?;
            (restored, "Account restored; awaiting chief editor approval")
        }
        Some(_) => {
            return Err(ApiError::BadRequest(
                "This email is already registered".to_string(),
            ))
        }
        None => {
            let created = db::users::create_reviewer(pool, &name, &email).await?;
            (created, "Reviewer registered; awaiting chief editor approval")
        }
    };

    let document = db::users::upsert_document(pool, user.id, &doc).await?;

    Ok(super::ok_with_message(
        msg,
        json!({ "user": user, "user_document": document }),
    ))
}

/// The signed-in user's account together with the reviewer document.
pub async fn profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.as_ref();

    let document = db::users::get_document(pool, user.id).await?;
    let science_field = match document.as_ref().and_then(|d| d.science_field_id) {
        Some(id) => db::criteria::get_scientific_activity(pool, id).await?,
        None => None,
    };

    Ok(ok(json!({
        "user": user,
        "user_document": document,
        "science_field": science_field,
    })))
}

#[derive(Deserialize)]
pub struct ProfilePayload {
    pub name: Option<String>,
    pub institutional_phone: Option<String>,
    pub academic_degree: Option<String>,
    pub work_place: Option<String>,
    pub position: Option<String>,
    pub science_field_id: Option<i64>,
    pub diploma_file: Option<String>,
    pub diploma_issued_by: Option<String>,
    pub orcid: Option<String>,
}

fn validate_profile(payload: &ProfilePayload) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();

    match payload.name.as_deref().map(str::trim) {
        None | Some("") => errors.add("name", "name is required"),
        Some(name) if name.chars().count() > 255 => {
            errors.add("name", "name must not exceed 255 characters")
        }
        _ => {}
    }
    for (field, value) in [
        ("academic_degree", &payload.academic_degree),
        ("work_place", &payload.work_place),
        ("position", &payload.position),
        ("diploma_file", &payload.diploma_file),
        ("diploma_issued_by", &payload.diploma_issued_by),
    ] {
        match value.as_deref().map(str::trim) {
            None | Some("") => errors.add(field, format!("{field} is required")),
            _ => {}
        }
    }
    if payload.science_field_id.is_none() {
        errors.add("science_field_id", "science_field_id is required");
    }

    errors.into_result()
}

/// Replaces the signed-in user's name and reviewer document. The email stays;
/// changing it means registering again.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ProfilePayload>,
) -> Result<Json<Value>, ApiError> {
    validate_profile(&payload)?;
    let pool = state.pool.as_ref();

    let science_field_id = payload.science_field_id.unwrap_or_default();
    let known_field = db::criteria::get_scientific_activity(pool, science_field_id)
        .await?
        .is_some();
    if !known_field {
        return Err(ApiError::Validation(json!({
            "science_field_id": ["unknown scientific activity"]
        })));
    }

    let name = payload.name.as_deref().unwrap_or_default().trim().to_string();
    let updated = db::users::update_name(pool, user.id, &name).await?;

    let doc = DocumentInput {
        institutional_phone: payload.institutional_phone.clone(),
        academic_degree: payload.academic_degree.clone(),
        work_place: payload.work_place.clone(),
        position: payload.position.clone(),
        science_field_id: Some(science_field_id),
        diploma_file: payload.diploma_file.clone(),
        diploma_issued_by: payload.diploma_issued_by.clone(),
        orcid: payload.orcid.clone(),
    };
    let document = db::users::upsert_document(pool, user.id, &doc).await?;

    Ok(super::ok_with_message(
        "Profile updated",
        json!({ "user": updated, "user_document": document }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> RegisterPayload {
        RegisterPayload {
            name: Some("Reviewer".into()),
            email: Some("reviewer@example.org".into()),
            institutional_phone: None,
            academic_degree: Some("PhD".into()),
            work_place: Some("University".into()),
            position: Some("Professor".into()),
            science_field_id: Some(1),
            diploma_file: Some("diplomas/1.pdf".into()),
            diploma_issued_by: Some("Ministry".into()),
            orcid: None,
        }
    }

    #[test]
    fn complete_payload_passes() {
        assert!(validate_register(&valid_payload()).is_ok());
    }

    #[test]
    fn missing_required_fields_are_reported_together() {
        let payload = RegisterPayload {
            name: None,
            email: Some("not-an-email".into()),
            academic_degree: Some(" ".into()),
            ..valid_payload()
        };
        match validate_register(&payload).unwrap_err() {
            ApiError::Validation(errors) => {
                assert!(errors.get("name").is_some());
                assert!(errors.get("email").is_some());
                assert!(errors.get("academic_degree").is_some());
                assert!(errors.get("work_place").is_none());
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn long_cyrillic_names_count_characters_not_bytes() {
        // 240 characters, well over 255 bytes of UTF-8
        let payload = RegisterPayload {
            name: Some("Абдуллаева".repeat(24)),
            ..valid_payload()
        };
        assert!(validate_register(&payload).is_ok());
    }

    fn valid_profile_payload() -> ProfilePayload {
        ProfilePayload {
            name: Some("Reviewer".into()),
            institutional_phone: None,
            academic_degree: Some("PhD".into()),
            work_place: Some("University".into()),
            position: Some("Professor".into()),
            science_field_id: Some(1),
            diploma_file: Some("diplomas/1.pdf".into()),
            diploma_issued_by: Some("Ministry".into()),
            orcid: None,
        }
    }

    #[test]
    fn complete_profile_update_passes() {
        assert!(validate_profile(&valid_profile_payload()).is_ok());
    }

    #[test]
    fn profile_update_requires_name_and_document_fields() {
        let payload = ProfilePayload {
            name: Some(" ".into()),
            work_place: None,
            ..valid_profile_payload()
        };
        match validate_profile(&payload).unwrap_err() {
            ApiError::Validation(errors) => {
                assert!(errors.get("name").is_some());
                assert!(errors.get("work_place").is_some());
                assert!(errors.get("position").is_none());
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
