use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::attachments::{
    self, AttachmentError, AttachmentPolicy, AttachmentSlot, AttachmentStaging, SlotKind,
};
use super::completion::{self, CompletionReport};
use super::draft::{
    ApplicationDetailsPatch, CollegeIdPatch, Draft, EducationPatch, IdentityProofPatch,
    PersonalInfoPatch, TechnicalPatch, UserContext,
};
use super::status::{ApplicationStatus, ReviewComment};
use super::store::{ApplicationStore, Notifier, ProfileDirectory, SnapshotStore};
use super::submission::{self, SubmissionPolicy, SubmitError};
use super::sync::{self, SaveOutcome, SyncError};

/// Policy knobs for the engine, assembled by configuration.
#[derive(Debug, Clone, Default)]
pub struct EnginePolicy {
    pub attachments: AttachmentPolicy,
    pub submission: SubmissionPolicy,
}

/// Error raised by the engine facade.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("the application is {0}; the form is read-only")]
    ReadOnly(&'static str),
    #[error("a new application can only be started after a rejection")]
    ResetUnavailable,
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}

/// Everything the surrounding UI needs to render the flow.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub draft: Draft,
    pub status: &'static str,
    pub form_visible: bool,
    pub completion: CompletionReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewComment>,
}

/// Facade composing the scorer, stager, synchronizer, submission
/// controller, and status machine over one draft.
///
/// All mutating operations take `&mut self`, so overlapping save/submit on
/// the same draft cannot happen by construction; the HTTP layer surfaces a
/// busy signal instead of queueing a second one.
pub struct ApplicationService<S, P, L, N> {
    store: Arc<S>,
    profiles: Arc<P>,
    snapshots: Arc<L>,
    notifier: Arc<N>,
    policy: EnginePolicy,
    user: UserContext,
    draft: Draft,
    staging: AttachmentStaging,
    status: ApplicationStatus,
    review: Option<ReviewComment>,
    report: CompletionReport,
}

impl<S, P, L, N> ApplicationService<S, P, L, N>
where
    S: ApplicationStore,
    P: ProfileDirectory,
    L: SnapshotStore,
    N: Notifier,
{
    pub fn new(
        store: Arc<S>,
        profiles: Arc<P>,
        snapshots: Arc<L>,
        notifier: Arc<N>,
        policy: EnginePolicy,
        user: UserContext,
    ) -> Self {
        let draft = Draft::default();
        let staging = AttachmentStaging::default();
        let report = completion::score(&draft, &staging);
        Self {
            store,
            profiles,
            snapshots,
            notifier,
            policy,
            user,
            draft,
            staging,
            status: ApplicationStatus::Draft,
            review: None,
            report,
        }
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn staging(&self) -> &AttachmentStaging {
        &self.staging
    }

    pub fn report(&self) -> &CompletionReport {
        &self.report
    }

    pub fn status(&self) -> ApplicationStatus {
        self.status
    }

    pub fn form_visible(&self) -> bool {
        self.status.form_visible()
    }

    pub fn review(&self) -> Option<&ReviewComment> {
        self.review.as_ref()
    }

    pub fn view(&self) -> ApplicationView {
        ApplicationView {
            draft: self.draft.clone(),
            status: self.status.label(),
            form_visible: self.form_visible(),
            completion: self.report.clone(),
            review: self.review.clone(),
        }
    }

    /// Fetch-or-create. A remote record always wins over profile defaults;
    /// the profile only seeds a draft when no record exists at all.
    pub async fn load(&mut self) -> Result<&CompletionReport, EngineError> {
        self.ensure_signed_in()?;
        let loaded = sync::load(self.store.as_ref(), self.profiles.as_ref(), &self.user).await?;
        self.draft = loaded.draft;
        self.staging = loaded.staging;
        self.status = loaded.status;
        self.review = loaded.review;
        self.rescore();
        Ok(&self.report)
    }

    pub fn update_personal_info(
        &mut self,
        patch: PersonalInfoPatch,
    ) -> Result<&CompletionReport, EngineError> {
        self.ensure_editable()?;
        self.draft.apply_personal_info(patch);
        self.rescore();
        Ok(&self.report)
    }

    pub fn update_education(
        &mut self,
        patch: EducationPatch,
    ) -> Result<&CompletionReport, EngineError> {
        self.ensure_editable()?;
        self.draft.apply_education(patch);
        self.rescore();
        Ok(&self.report)
    }

    pub fn update_technical(
        &mut self,
        patch: TechnicalPatch,
    ) -> Result<&CompletionReport, EngineError> {
        self.ensure_editable()?;
        self.draft.apply_technical(patch);
        self.rescore();
        Ok(&self.report)
    }

    pub fn update_identity_proof(
        &mut self,
        patch: IdentityProofPatch,
    ) -> Result<&CompletionReport, EngineError> {
        self.ensure_editable()?;
        self.draft.apply_identity_proof(patch);
        self.rescore();
        Ok(&self.report)
    }

    pub fn update_college_id(
        &mut self,
        patch: CollegeIdPatch,
    ) -> Result<&CompletionReport, EngineError> {
        self.ensure_editable()?;
        self.draft.apply_college_id(patch);
        self.rescore();
        Ok(&self.report)
    }

    pub fn update_application_details(
        &mut self,
        patch: ApplicationDetailsPatch,
    ) -> Result<&CompletionReport, EngineError> {
        self.ensure_editable()?;
        self.draft.apply_application_details(patch);
        self.rescore();
        Ok(&self.report)
    }

    /// Validate and stage a picked file into its document slot. On success
    /// the data URI lands in the draft's image field and the slot flips to
    /// staged; on failure nothing changes.
    pub fn stage_document(
        &mut self,
        kind: SlotKind,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<&CompletionReport, EngineError> {
        self.ensure_editable()?;
        let (image_field, slot) = match kind {
            SlotKind::Identity => (
                &mut self.draft.identity_proof.document_image,
                &mut self.staging.identity,
            ),
            SlotKind::CollegeId => (
                &mut self.draft.college_id_proof.document_image,
                &mut self.staging.college_id,
            ),
            SlotKind::ProfilePicture => {
                return Err(AttachmentError::NoSlot(kind.label()).into());
            }
        };
        let staged =
            attachments::stage(&self.policy.attachments, kind, filename, content_type, bytes)?;
        *image_field = staged.encoded.clone();
        *slot = AttachmentSlot::Staged(staged);
        self.notifier
            .info(&format!("{} attached", kind.label()));
        self.rescore();
        Ok(&self.report)
    }

    /// Persist the draft. Offline saves degrade to the fallback snapshot
    /// and a distinct "saved locally" notice.
    pub async fn save(&mut self) -> Result<SaveOutcome, EngineError> {
        self.ensure_editable()?;
        let outcome = sync::save(
            self.store.as_ref(),
            self.snapshots.as_ref(),
            &self.user,
            &self.draft,
            &self.staging,
        )
        .await;

        match outcome {
            Ok(SaveOutcome::Persisted { draft, status }) => {
                // The server copy is canonical for normalized values.
                self.draft = draft.clone();
                self.status = status;
                self.rescore();
                self.notifier.success("Application saved");
                Ok(SaveOutcome::Persisted { draft, status })
            }
            Ok(SaveOutcome::SavedLocally { at }) => {
                self.notifier
                    .info("You appear to be offline; the draft was saved on this device");
                Ok(SaveOutcome::SavedLocally { at })
            }
            Err(err) => {
                self.notifier.error("The draft could not be saved");
                Err(err.into())
            }
        }
    }

    /// Gate on completion and attachments, finalize still-staged documents,
    /// and hand the application off in one transaction.
    pub async fn submit(&mut self) -> Result<ApplicationStatus, EngineError> {
        self.ensure_signed_in()?;
        if !self.status.can_submit() {
            return Err(EngineError::ReadOnly(self.status.label()));
        }

        let result = submission::submit(
            self.store.as_ref(),
            &self.policy.submission,
            &self.user,
            &mut self.draft,
            &mut self.staging,
            &self.report,
        )
        .await;

        match result {
            Ok(remote) => {
                self.draft = remote.draft;
                self.status = remote.status;
                // A successful submission overwrites the previous attempt's
                // review trail.
                self.review = None;
                self.rescore();
                self.notifier.success("Application submitted");
                Ok(self.status)
            }
            Err(err) => {
                self.notifier.error(&err.to_string());
                Err(err.into())
            }
        }
    }

    /// Observe reviewer-driven status changes from the remote store.
    pub async fn refresh(&mut self) -> Result<ApplicationStatus, EngineError> {
        self.ensure_signed_in()?;
        match self.store.fetch(&self.user).await {
            Ok(remote) => {
                if self.status.accepts(remote.status) {
                    self.status = remote.status;
                    self.review = remote.review_comment.map(|comment| ReviewComment {
                        status: remote.status,
                        comment,
                    });
                } else {
                    warn!(
                        local = self.status.label(),
                        remote = remote.status.label(),
                        "ignoring unexpected status transition"
                    );
                }
                Ok(self.status)
            }
            Err(super::store::StoreError::NotFound) => Ok(self.status),
            Err(err) => Err(SyncError::from(err).into()),
        }
    }

    /// Start over after a rejection: clear every section and slot, then
    /// seed from the profile, the same path a first-time load takes. The
    /// rejection's review comment stays visible until a new submission
    /// succeeds.
    pub async fn reset_after_rejection(&mut self) -> Result<&CompletionReport, EngineError> {
        self.ensure_signed_in()?;
        if !self.status.can_reset() {
            return Err(EngineError::ResetUnavailable);
        }
        let profile = self
            .profiles
            .profile(&self.user)
            .await
            .map_err(SyncError::from)?
            .unwrap_or_default();
        self.draft = Draft::from_profile(&profile);
        self.staging.clear();
        self.status = ApplicationStatus::Draft;
        self.rescore();
        self.notifier.info("Started a new application");
        Ok(&self.report)
    }

    /// Consult the server-side scorer as a secondary source of truth,
    /// falling back to the local report on any failure.
    pub async fn refresh_completion(&mut self) -> &CompletionReport {
        if !self.user.authenticated {
            self.rescore();
            return &self.report;
        }
        match self.store.completion(&self.user).await {
            Ok(remote) => {
                self.report = remote;
            }
            Err(err) => {
                debug!(error = %err, "server scorer unavailable, keeping local report");
                self.rescore();
            }
        }
        &self.report
    }

    fn ensure_signed_in(&self) -> Result<(), EngineError> {
        if self.user.authenticated {
            Ok(())
        } else {
            Err(SyncError::SignInRequired.into())
        }
    }

    fn ensure_editable(&self) -> Result<(), EngineError> {
        self.ensure_signed_in()?;
        if self.form_visible() {
            Ok(())
        } else {
            Err(EngineError::ReadOnly(self.status.label()))
        }
    }

    fn rescore(&mut self) {
        self.report = completion::score(&self.draft, &self.staging);
    }
}
