//! Status enums for the review workflow. Stored as plain text columns;
//! handlers parse on read and check transitions before writing.

use serde::{Deserialize, Serialize};

/// Status of one reviewer's assignment to an article or submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    InProgress,
    Refused,
    Completed,
    Overdue,
}

impl AssignmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "assigned",
            AssignmentStatus::InProgress => "in_progress",
            AssignmentStatus::Refused => "refused",
            AssignmentStatus::Completed => "completed",
            AssignmentStatus::Overdue => "overdue",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "assigned" => Some(AssignmentStatus::Assigned),
            "in_progress" => Some(AssignmentStatus::InProgress),
            "refused" => Some(AssignmentStatus::Refused),
            "completed" => Some(AssignmentStatus::Completed),
            "overdue" => Some(AssignmentStatus::Overdue),
            _ => None,
        }
    }

    /// Allowed transitions. `refused` and `completed` are terminal; the
    /// maintenance sweep moves anything not finished past its deadline to
    /// `overdue`, and a deadline extension takes it back out via [`reopened`].
    ///
    /// [`reopened`]: AssignmentStatus::reopened
    pub fn can_transition(self, next: AssignmentStatus) -> bool {
        use AssignmentStatus::*;
        matches!(
            (self, next),
            (Assigned, InProgress)
                | (Assigned, Refused)
                | (Assigned, Overdue)
                | (InProgress, Completed)
                | (InProgress, Overdue)
        )
    }

    /// Status an `overdue` assignment returns to when its deadline is
    /// extended: work that had started resumes `in_progress`, otherwise the
    /// reviewer is back to `assigned`.
    pub fn reopened(self, started: bool) -> Option<AssignmentStatus> {
        use AssignmentStatus::*;
        match self {
            Overdue if started => Some(InProgress),
            Overdue => Some(Assigned),
            _ => None,
        }
    }
}

/// Status of an article prepared for peer review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    NotAssigned,
    Assigned,
    InProgress,
    Overdue,
    Completed,
}

impl ArticleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ArticleStatus::NotAssigned => "not_assigned",
            ArticleStatus::Assigned => "assigned",
            ArticleStatus::InProgress => "in_progress",
            ArticleStatus::Overdue => "overdue",
            ArticleStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_assigned" => Some(ArticleStatus::NotAssigned),
            "assigned" => Some(ArticleStatus::Assigned),
            "in_progress" => Some(ArticleStatus::InProgress),
            "overdue" => Some(ArticleStatus::Overdue),
            "completed" => Some(ArticleStatus::Completed),
            _ => None,
        }
    }
}

/// Status of an externally submitted article awaiting editor consideration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomingStatus {
    NotAssigned,
    Appointed,
    Converted,
}

impl IncomingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IncomingStatus::NotAssigned => "not_assigned",
            IncomingStatus::Appointed => "appointed",
            IncomingStatus::Converted => "converted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_assigned" => Some(IncomingStatus::NotAssigned),
            "appointed" => Some(IncomingStatus::Appointed),
            "converted" => Some(IncomingStatus::Converted),
            _ => None,
        }
    }
}

/// Editorial status of a direct submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    UnderReview,
    Accepted,
    Rejected,
    RevisionsRequired,
}

impl SubmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::UnderReview => "under_review",
            SubmissionStatus::Accepted => "accepted",
            SubmissionStatus::Rejected => "rejected",
            SubmissionStatus::RevisionsRequired => "revisions_required",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SubmissionStatus::Pending),
            "under_review" => Some(SubmissionStatus::UnderReview),
            "accepted" => Some(SubmissionStatus::Accepted),
            "rejected" => Some(SubmissionStatus::Rejected),
            "revisions_required" => Some(SubmissionStatus::RevisionsRequired),
            _ => None,
        }
    }

    /// Final decisions are only taken while a submission is being reviewed.
    pub fn can_transition(self, next: SubmissionStatus) -> bool {
        use SubmissionStatus::*;
        matches!(
            (self, next),
            (Pending, UnderReview)
                | (UnderReview, Accepted)
                | (UnderReview, Rejected)
                | (UnderReview, RevisionsRequired)
                | (RevisionsRequired, UnderReview)
        )
    }
}

/// Overall recommendation a reviewer gives for an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Accept,
    AfterRevision,
    Reject,
}

impl Recommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::Accept => "accept",
            Recommendation::AfterRevision => "after_revision",
            Recommendation::Reject => "reject",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "accept" => Some(Recommendation::Accept),
            "after_revision" => Some(Recommendation::AfterRevision),
            "reject" => Some(Recommendation::Reject),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AssignmentStatus::*;

    #[test]
    fn assignment_accept_and_refuse_only_from_assigned() {
        assert!(Assigned.can_transition(InProgress));
        assert!(Assigned.can_transition(Refused));
        assert!(!InProgress.can_transition(Refused));
        assert!(!Completed.can_transition(InProgress));
        assert!(!Refused.can_transition(InProgress));
    }

    #[test]
    fn assignment_completion_requires_in_progress() {
        assert!(InProgress.can_transition(Completed));
        assert!(!Assigned.can_transition(Completed));
        assert!(!Overdue.can_transition(Completed));
    }

    #[test]
    fn overdue_reachable_from_open_states_only() {
        assert!(Assigned.can_transition(Overdue));
        assert!(InProgress.can_transition(Overdue));
        assert!(!Completed.can_transition(Overdue));
        assert!(!Refused.can_transition(Overdue));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for next in [Assigned, InProgress, Refused, Completed, Overdue] {
            assert!(!Completed.can_transition(next));
            assert!(!Refused.can_transition(next));
        }
    }

    #[test]
    fn extending_an_overdue_deadline_reopens_the_assignment() {
        assert_eq!(Overdue.reopened(true), Some(InProgress));
        assert_eq!(Overdue.reopened(false), Some(Assigned));
        for status in [Assigned, InProgress, Refused, Completed] {
            assert_eq!(status.reopened(true), None);
            assert_eq!(status.reopened(false), None);
        }
        // once reopened, the review can run to completion again
        assert!(Overdue.reopened(true).is_some_and(|s| s.can_transition(Completed)));
    }

    #[test]
    fn submission_decisions_only_under_review() {
        use SubmissionStatus::*;
        assert!(Pending.can_transition(UnderReview));
        assert!(UnderReview.can_transition(Accepted));
        assert!(UnderReview.can_transition(Rejected));
        assert!(UnderReview.can_transition(RevisionsRequired));
        assert!(RevisionsRequired.can_transition(UnderReview));
        assert!(!Pending.can_transition(Accepted));
        assert!(!Accepted.can_transition(Rejected));
    }

    #[test]
    fn status_strings_round_trip() {
        for s in ["assigned", "in_progress", "refused", "completed", "overdue"] {
            assert_eq!(AssignmentStatus::parse(s).unwrap().as_str(), s);
        }
        assert!(AssignmentStatus::parse("archived").is_none());
        for s in ["not_assigned", "assigned", "in_progress", "overdue", "completed"] {
            assert_eq!(ArticleStatus::parse(s).unwrap().as_str(), s);
        }
        assert_eq!(IncomingStatus::parse("appointed"), Some(IncomingStatus::Appointed));
        assert_eq!(Recommendation::parse("after_revision"), Some(Recommendation::AfterRevision));
        assert!(SubmissionStatus::parse("").is_none());
    }
}
