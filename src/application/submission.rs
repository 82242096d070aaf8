//! Submission gating and the submit transaction.
//!
//! The controller checks completion and attachment preconditions before
//! touching the network, hands the fully assembled draft (encoded
//! attachments included) to the store in one transaction, and translates
//! field-keyed server failures into user-facing text.

use std::collections::BTreeSet;

use tracing::{info, warn};

use super::attachments::{AttachmentSlot, AttachmentStaging};
use super::checklist::label_for_path;
use super::completion::CompletionReport;
use super::draft::{Draft, UserContext};
use super::store::{
    ApplicationStore, DocumentUpload, RemoteApplication, StoreError, ValidationFailures,
};

/// Display policy for server validation failures. With at most
/// `max_listed_failures` distinct fields they are listed individually;
/// beyond that only the count is shown.
#[derive(Debug, Clone)]
pub struct SubmissionPolicy {
    pub max_listed_failures: usize,
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self {
            max_listed_failures: 3,
        }
    }
}

/// Client-side precondition failures; raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    #[error("application is {percentage}% complete; fill the remaining {} field(s) first", .missing.len())]
    Incomplete {
        percentage: u8,
        missing: Vec<String>,
    },
    #[error("{slot} is missing; attach it before submitting")]
    MissingDocument { slot: &'static str },
}

/// Submission failure taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    #[error("{message}")]
    Rejected {
        message: String,
        failures: ValidationFailures,
    },
    // No offline submission exists; connectivity failures are fatal to the
    // attempt and the user retries once back online.
    #[error("submission failed, check your connection and try again: {0}")]
    Network(String),
    #[error("{slot} upload failed; the file is still attached, try again")]
    Upload {
        slot: &'static str,
        #[source]
        source: StoreError,
    },
    #[error(transparent)]
    Store(StoreError),
}

/// Completion plus both document slots must pass before the store is
/// contacted at all.
pub fn check_preconditions(
    report: &CompletionReport,
    staging: &AttachmentStaging,
) -> Result<(), PreconditionError> {
    if !report.is_complete() {
        return Err(PreconditionError::Incomplete {
            percentage: report.percentage,
            missing: report.missing_fields.clone(),
        });
    }
    if !staging.identity.has_image() {
        return Err(PreconditionError::MissingDocument {
            slot: "Identity document image",
        });
    }
    if !staging.college_id.has_image() {
        return Err(PreconditionError::MissingDocument {
            slot: "College ID image",
        });
    }
    Ok(())
}

/// Submit the application as one transaction from the caller's point of
/// view: still-staged documents are finalized through the upload
/// endpoints, already-persisted ones are reused verbatim, then the full
/// draft is handed off. A failed upload leaves the slot staged so the user
/// retries without re-selecting the file.
pub async fn submit<S: ApplicationStore>(
    store: &S,
    policy: &SubmissionPolicy,
    user: &UserContext,
    draft: &mut Draft,
    staging: &mut AttachmentStaging,
    report: &CompletionReport,
) -> Result<RemoteApplication, SubmitError> {
    check_preconditions(report, staging)?;

    if let AttachmentSlot::Staged(staged) = &staging.identity {
        let upload = DocumentUpload {
            filename: staged.filename.clone(),
            content_type: staged.content_type.clone(),
            document_number: draft.identity_proof.document_number.clone(),
            bytes: staged.bytes.clone(),
        };
        let uri = store
            .upload_identity(user, upload)
            .await
            .map_err(|source| SubmitError::Upload {
                slot: "Identity document",
                source,
            })?;
        draft.identity_proof.document_image = uri.clone();
        staging.identity = AttachmentSlot::Persisted { uri };
    }

    if let AttachmentSlot::Staged(staged) = &staging.college_id {
        let upload = DocumentUpload {
            filename: staged.filename.clone(),
            content_type: staged.content_type.clone(),
            document_number: draft.college_id_proof.document_number.clone(),
            bytes: staged.bytes.clone(),
        };
        let uri = store
            .upload_college_id(user, upload)
            .await
            .map_err(|source| SubmitError::Upload {
                slot: "College ID",
                source,
            })?;
        draft.college_id_proof.document_image = uri.clone();
        staging.college_id = AttachmentSlot::Persisted { uri };
    }

    match store.submit(user, draft).await {
        Ok(remote) => {
            info!(status = remote.status.label(), "application submitted");
            Ok(remote)
        }
        Err(StoreError::Validation(failures)) => {
            let message = describe_failures(&failures, policy);
            warn!(rejected = failures.len(), "server validation failed");
            Err(SubmitError::Rejected { message, failures })
        }
        Err(StoreError::Network(reason)) => Err(SubmitError::Network(reason)),
        Err(other) => Err(SubmitError::Store(other)),
    }
}

/// Turn raw field-path failure keys into a user-facing summary. Structural
/// prefixes are stripped (`education.year` becomes `year`) and the key is
/// mapped through the checklist labels where one exists.
pub fn describe_failures(failures: &ValidationFailures, policy: &SubmissionPolicy) -> String {
    let fields: BTreeSet<String> = failures
        .0
        .keys()
        .map(|path| {
            label_for_path(path).map(str::to_string).unwrap_or_else(|| {
                path.rsplit('.').next().unwrap_or(path).to_string()
            })
        })
        .collect();

    if fields.is_empty() {
        return "the server rejected the application".to_string();
    }

    if fields.len() <= policy.max_listed_failures {
        let listed = fields.into_iter().collect::<Vec<_>>().join(", ");
        format!("please correct: {listed}")
    } else {
        format!("{} fields need attention", fields.len())
    }
}
