//! Application draft and submission engine.
//!
//! The engine owns the multi-section draft, keeps a derived completion
//! report current across every mutation, stages binary attachments for
//! deferred upload, synchronizes with the remote persistence service
//! (with an offline fallback), and drives the draft → submitted →
//! reviewed status lifecycle. Page chrome, charts, and profile editing
//! are external collaborators reached only through the `store` traits.

pub mod attachments;
pub mod checklist;
pub mod completion;
pub mod draft;
pub mod memory;
pub mod router;
pub mod service;
pub mod status;
pub mod store;
pub mod submission;
pub mod sync;

#[cfg(test)]
mod tests;

pub use attachments::{
    AttachmentError, AttachmentPolicy, AttachmentSlot, AttachmentStaging, SlotKind,
    StagedAttachment,
};
pub use checklist::{ChecklistEntry, ChecklistGroup, CHECKLIST};
pub use completion::{score, CompletionReport};
pub use draft::{
    Address, ApplicationDetails, ApplicationDetailsPatch, CollegeIdPatch, CollegeIdProof, Draft,
    Education, EducationPatch, IdentityDocumentType, IdentityProof, IdentityProofPatch,
    PersonalInfo, PersonalInfoPatch, StudentProfile, Technical, TechnicalPatch, UserContext,
    UserId,
};
pub use router::{application_router, SharedService, StageRequest};
pub use service::{ApplicationService, ApplicationView, EngineError, EnginePolicy};
pub use status::{ApplicationStatus, ReviewComment};
pub use store::{
    ApplicationStore, DocumentUpload, Notifier, ProfileDirectory, RemoteApplication,
    SnapshotError, SnapshotStore, StoreError, ValidationFailures,
};
pub use submission::{PreconditionError, SubmissionPolicy, SubmitError};
pub use sync::{FallbackSnapshot, LoadedApplication, SaveOutcome, SyncError};
