use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_editor(&self) -> bool {
        self.role == "editor"
    }

    pub fn is_reviewer(&self) -> bool {
        self.role == "reviewer"
    }
}

#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct UserDocument {
    pub id: i64,
    pub user_id: i64,
    pub institutional_phone: Option<String>,
    pub academic_degree: Option<String>,
    pub work_place: Option<String>,
    pub position: Option<String>,
    pub science_field_id: Option<i64>,
    pub diploma_file: Option<String>,
    pub diploma_issued_by: Option<String>,
    pub orcid: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct ScientificActivity {
    pub id: i64,
    pub title_uz: String,
    pub title_ru: String,
    pub title_en: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct ReviewCriterion {
    pub id: i64,
    pub name: String,
    pub name_ru: String,
    pub name_uz: String,
    pub name_en: String,
    pub max_score: f64,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Externally submitted manuscript awaiting editor consideration.
#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct IncomingArticle {
    pub id: i64,
    pub article_title: String,
    pub author_name: String,
    pub email: Option<String>,
    pub article_file: Option<String>,
    pub message: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Manuscript prepared by an editor for the peer-review pipeline.
#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct ReviewArticle {
    pub id: i64,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReviewArticle {
    /// The edited copy supersedes the original upload when present.
    pub fn active_file_path(&self) -> Option<&str> {
        self.edited_file_path
            .as_deref()
            .or(self.file_path.as_deref())
    }
}

/// One reviewer's assignment to a review article, including the submitted
/// review payload and the draft sub-state.
#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct ReviewAssignment {
    pub id: i64,
    pub article_id: i64,
    pub reviewer_id: i64,
    pub status: String,
    pub assigned_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub comment: Option<String>,
    pub in_progress_at: Option<DateTime<Utc>>,
    pub refused_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status_changed_at: Option<DateTime<Utc>>,
    pub deadline_extended_at: Option<DateTime<Utc>>,
    pub general_recommendation: Option<String>,
    pub review_comments: Option<String>,
    pub review_files: Option<serde_json::Value>,
    pub criteria_scores: Option<serde_json::Value>,
    pub draft_criteria_scores: Option<serde_json::Value>,
    pub draft_general_recommendation: Option<String>,
    pub draft_review_comments: Option<String>,
    pub draft_expires_at: Option<DateTime<Utc>>,
    pub draft_last_saved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReviewAssignment {
    pub fn has_draft(&self) -> bool {
        self.draft_last_saved_at.is_some()
    }

    /// An expired draft is treated as gone even before the sweep clears it.
    pub fn draft_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.draft_expires_at, Some(at) if at < now)
    }
}

#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub title: String,
    #[sqlx(rename = "abstract")]
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub keywords: Option<serde_json::Value>,
    pub file_path: Option<String>,
    pub author_id: Option<i64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct SubmissionAssignment {
    pub id: i64,
    pub submission_id: i64,
    pub reviewer_id: i64,
    pub assigned_by: Option<i64>,
    pub status: String,
    pub assigned_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct SubmissionReview {
    pub id: i64,
    pub submission_id: i64,
    pub reviewer_id: i64,
    pub originality_score: i16,
    pub methodology_score: i16,
    pub argumentation_score: i16,
    pub structure_score: i16,
    pub significance_score: i16,
    pub general_recommendation: Option<String>,
    pub comments: Option<String>,
    pub files: Option<serde_json::Value>,
    pub status: String,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reviewer listing row: user joined with document and science field.
#[derive(Debug, FromRow, Serialize)]
pub struct ReviewerRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub document_id: Option<i64>,
    pub institutional_phone: Option<String>,
    pub academic_degree: Option<String>,
    pub work_place: Option<String>,
    pub position: Option<String>,
    pub science_field_id: Option<i64>,
    pub diploma_file: Option<String>,
    pub diploma_issued_by: Option<String>,
    pub orcid: Option<String>,
    pub rejection_reason: Option<String>,
    pub science_title_uz: Option<String>,
    pub science_title_ru: Option<String>,
    pub science_title_en: Option<String>,
}

impl ReviewerRow {
    pub fn to_json(&self) -> serde_json::Value {
        let science_field = self.science_field_id.map(|id| {
            serde_json::json!({
                "id": id,
                "title_uz": self.science_title_uz,
                "title_ru": self.science_title_ru,
                "title_en": self.science_title_en,
            })
        });
        serde_json::json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "created_at": self.created_at,
            "updated_at": self.updated_at,
            "deleted_at": self.deleted_at,
            "user_document_id": self.document_id,
            "institutional_phone": self.institutional_phone,
            "academic_degree": self.academic_degree,
            "work_place": self.work_place,
            "position": self.position,
            "science_field_id": self.science_field_id,
            "diploma_file": self.diploma_file,
            "diploma_issued_by": self.diploma_issued_by,
            "orcid": self.orcid,
            "rejection_reason": self.rejection_reason,
            "scientific_activity": science_field,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(file: Option<&str>, edited: Option<&str>) -> ReviewArticle {
        ReviewArticle {
            id: 1,
            title: "Title".into(),
            author_name: "Author".into(),
            description: None,
            file_path: file.map(Into::into),
            edited_file_path: edited.map(Into::into),
            deadline: None,
            status: "not_assigned".into(),
            created_by: None,
            source_article_id: None,
            source_author_name: None,
            source_article_file: None,
            source_title: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn edited_file_wins_over_original() {
        assert_eq!(
            article(Some("a.pdf"), Some("a_edited.pdf")).active_file_path(),
            Some("a_edited.pdf")
        );
        assert_eq!(article(Some("a.pdf"), None).active_file_path(), Some("a.pdf"));
        assert_eq!(article(None, None).active_file_path(), None);
    }

    #[test]
    fn reviewer_row_json_nests_science_field() {
        let row = ReviewerRow {
            id: 7,
            name: "R".into(),
            email: "r@example.org".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
            document_id: Some(3),
            institutional_phone: None,
            academic_degree: Some("PhD".into()),
            work_place: None,
            position: None,
            science_field_id: Some(2),
            diploma_file: None,
            diploma_issued_by: None,
            orcid: None,
            rejection_reason: None,
            science_title_uz: Some("uz".into()),
            science_title_ru: Some("ru".into()),
            science_title_en: Some("en".into()),
        };
        let value = row.to_json();
        assert_eq!(value["scientific_activity"]["title_en"], "en");
        assert_eq!(value["user_document_id"], 3);

        let none = ReviewerRow { science_field_id: None, ..row };
        assert!(none.to_json()["scientific_activity"].is_null());
    }
}
