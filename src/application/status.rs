use serde::{Deserialize, Serialize};

/// Lifecycle status of the application. Owned by the remote store; the
/// client caches it for gating and treats the remote value as
/// authoritative. Absence of any persisted record implies `Draft`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// The editable form is rendered iff this is true. Visibility is
    /// derived from status alone and never settable on its own.
    pub const fn form_visible(self) -> bool {
        matches!(self, ApplicationStatus::Draft)
    }

    /// Client-initiated submit is only allowed while drafting.
    pub const fn can_submit(self) -> bool {
        matches!(self, ApplicationStatus::Draft)
    }

    /// The "start a new application" reset is only offered after a
    /// rejection; no other state can reach `Draft` again.
    pub const fn can_reset(self) -> bool {
        matches!(self, ApplicationStatus::Rejected)
    }

    /// Whether the remote store may report `next` as the successor of
    /// `self`. Reviewer-driven transitions arrive via refetch; everything
    /// else is client-initiated.
    pub fn accepts(self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        match (self, next) {
            (current, observed) if current == observed => true,
            (Draft, Submitted) => true,
            (Submitted, UnderReview | Approved | Rejected) => true,
            (UnderReview, Approved | Rejected) => true,
            // Only an explicit client reset leaves `Rejected`, handled by
            // the service rather than by observation.
            _ => false,
        }
    }
}

/// Reviewer feedback attached to an externally decided application. After
/// a rejection reset it stays visible read-only until a new submission
/// succeeds and overwrites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewComment {
    pub status: ApplicationStatus,
    pub comment: String,
}
