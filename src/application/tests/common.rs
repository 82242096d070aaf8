use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::application::attachments::SlotKind;
use crate::application::completion::CompletionReport;
use crate::application::draft::{Draft, IdentityDocumentType, StudentProfile, UserContext, UserId};
use crate::application::memory::{MemoryProfiles, MemorySnapshots, MemoryStore};
use crate::application::service::{ApplicationService, EnginePolicy};
use crate::application::store::{
    ApplicationStore, DocumentUpload, Notifier, ProfileDirectory, RemoteApplication, StoreError,
};

pub(super) fn user() -> UserContext {
    UserContext {
        user_id: UserId("stu-001".to_string()),
        email: "priya@example.edu".to_string(),
        authenticated: true,
    }
}

pub(super) fn anonymous() -> UserContext {
    UserContext {
        authenticated: false,
        ..user()
    }
}

pub(super) fn profile() -> StudentProfile {
    StudentProfile {
        full_name: "Priya Raman".to_string(),
        email: "priya@example.edu".to_string(),
        phone: "+1 515 555 0100".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(2002, 3, 14),
        gender: "female".to_string(),
        institution: "Example Institute of Technology".to_string(),
        program: "Computer Science".to_string(),
    }
}

/// Draft with every checklist field filled except the two document images,
/// which are staged separately through the attachment stager.
pub(super) fn complete_draft() -> Draft {
    let mut draft = Draft::from_profile(&profile());
    draft.personal_info.address.street = "12 College Ave".to_string();
    draft.personal_info.address.city = "Ames".to_string();
    draft.personal_info.address.state = "IA".to_string();
    draft.personal_info.address.postal_code = "50010".to_string();
    draft.personal_info.address.country = "USA".to_string();
    draft.education.degree = "BSc".to_string();
    draft.education.year = 3;
    draft.technical.skills.insert("Rust".to_string());
    draft.technical.github_url = "https://github.com/priya".to_string();
    draft.identity_proof.document_type = IdentityDocumentType::Passport;
    draft.identity_proof.document_number = "P1234567".to_string();
    draft.college_id_proof.document_number = "EIT-2023-114".to_string();
    draft.application_details.motivation = "I build systems software.".to_string();
    draft.application_details.goals = "Ship reliable tools.".to_string();
    draft
}

pub(super) fn png_upload(kind: SlotKind) -> (&'static str, &'static str, Vec<u8>) {
    let filename = match kind {
        SlotKind::Identity => "passport.png",
        SlotKind::CollegeId => "college-id.png",
        SlotKind::ProfilePicture => "avatar.png",
    };
    (filename, "image/png", vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3])
}

/// Notifier that records every message for assertions.
#[derive(Default)]
pub(super) struct CollectingNotifier {
    messages: Mutex<Vec<(&'static str, String)>>,
}

impl CollectingNotifier {
    pub(super) fn messages(&self) -> Vec<(&'static str, String)> {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn record(&self, kind: &'static str, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((kind, message.to_string()));
    }
}

impl Notifier for CollectingNotifier {
    fn success(&self, message: &str) {
        self.record("success", message);
    }

    fn error(&self, message: &str) {
        self.record("error", message);
    }

    fn info(&self, message: &str) {
        self.record("info", message);
    }
}

/// Store wrapper counting network-visible calls so tests can assert that
/// precondition failures never reach the wire.
#[derive(Default)]
pub(super) struct CountingStore {
    pub inner: MemoryStore,
    pub fetches: AtomicUsize,
    pub saves: AtomicUsize,
    pub submits: AtomicUsize,
    pub identity_uploads: AtomicUsize,
    pub college_uploads: AtomicUsize,
}

impl CountingStore {
    pub(super) fn network_calls(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
            + self.saves.load(Ordering::Relaxed)
            + self.submits.load(Ordering::Relaxed)
            + self.identity_uploads.load(Ordering::Relaxed)
            + self.college_uploads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ApplicationStore for CountingStore {
    async fn fetch(&self, user: &UserContext) -> Result<RemoteApplication, StoreError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.inner.fetch(user).await
    }

    async fn save(
        &self,
        user: &UserContext,
        draft: &Draft,
    ) -> Result<RemoteApplication, StoreError> {
        self.saves.fetch_add(1, Ordering::Relaxed);
        self.inner.save(user, draft).await
    }

    async fn submit(
        &self,
        user: &UserContext,
        draft: &Draft,
    ) -> Result<RemoteApplication, StoreError> {
        self.submits.fetch_add(1, Ordering::Relaxed);
        self.inner.submit(user, draft).await
    }

    async fn upload_identity(
        &self,
        user: &UserContext,
        upload: DocumentUpload,
    ) -> Result<String, StoreError> {
        self.identity_uploads.fetch_add(1, Ordering::Relaxed);
        self.inner.upload_identity(user, upload).await
    }

    async fn upload_college_id(
        &self,
        user: &UserContext,
        upload: DocumentUpload,
    ) -> Result<String, StoreError> {
        self.college_uploads.fetch_add(1, Ordering::Relaxed);
        self.inner.upload_college_id(user, upload).await
    }

    async fn completion(&self, user: &UserContext) -> Result<CompletionReport, StoreError> {
        self.inner.completion(user).await
    }
}

/// Store that behaves as if the network were down.
#[derive(Default)]
pub(super) struct OfflineStore;

#[async_trait]
impl ApplicationStore for OfflineStore {
    async fn fetch(&self, _user: &UserContext) -> Result<RemoteApplication, StoreError> {
        Err(StoreError::Network("connection refused".to_string()))
    }

    async fn save(
        &self,
        _user: &UserContext,
        _draft: &Draft,
    ) -> Result<RemoteApplication, StoreError> {
        Err(StoreError::Network("connection refused".to_string()))
    }

    async fn submit(
        &self,
        _user: &UserContext,
        _draft: &Draft,
    ) -> Result<RemoteApplication, StoreError> {
        Err(StoreError::Network("connection refused".to_string()))
    }

    async fn upload_identity(
        &self,
        _user: &UserContext,
        _upload: DocumentUpload,
    ) -> Result<String, StoreError> {
        Err(StoreError::Network("connection refused".to_string()))
    }

    async fn upload_college_id(
        &self,
        _user: &UserContext,
        _upload: DocumentUpload,
    ) -> Result<String, StoreError> {
        Err(StoreError::Network("connection refused".to_string()))
    }

    async fn completion(&self, _user: &UserContext) -> Result<CompletionReport, StoreError> {
        Err(StoreError::Network("connection refused".to_string()))
    }
}

/// Store whose upload endpoint is down while everything else works.
#[derive(Default)]
pub(super) struct FailingUploadStore {
    pub inner: MemoryStore,
}

#[async_trait]
impl ApplicationStore for FailingUploadStore {
    async fn fetch(&self, user: &UserContext) -> Result<RemoteApplication, StoreError> {
        self.inner.fetch(user).await
    }

    async fn save(
        &self,
        user: &UserContext,
        draft: &Draft,
    ) -> Result<RemoteApplication, StoreError> {
        self.inner.save(user, draft).await
    }

    async fn submit(
        &self,
        user: &UserContext,
        draft: &Draft,
    ) -> Result<RemoteApplication, StoreError> {
        self.inner.submit(user, draft).await
    }

    async fn upload_identity(
        &self,
        _user: &UserContext,
        _upload: DocumentUpload,
    ) -> Result<String, StoreError> {
        Err(StoreError::Unavailable("document store is down".to_string()))
    }

    async fn upload_college_id(
        &self,
        _user: &UserContext,
        _upload: DocumentUpload,
    ) -> Result<String, StoreError> {
        Err(StoreError::Unavailable("document store is down".to_string()))
    }

    async fn completion(&self, user: &UserContext) -> Result<CompletionReport, StoreError> {
        self.inner.completion(user).await
    }
}

/// Profile directory with no entries at all.
#[derive(Default)]
pub(super) struct EmptyProfiles;

#[async_trait]
impl ProfileDirectory for EmptyProfiles {
    async fn profile(&self, _user: &UserContext) -> Result<Option<StudentProfile>, StoreError> {
        Ok(None)
    }
}

pub(super) type TestService<S> =
    ApplicationService<S, MemoryProfiles, MemorySnapshots, CollectingNotifier>;

pub(super) struct TestHarness<S> {
    pub store: Arc<S>,
    pub snapshots: Arc<MemorySnapshots>,
    pub notifier: Arc<CollectingNotifier>,
    pub service: TestService<S>,
}

pub(super) fn harness<S: ApplicationStore>(store: S) -> TestHarness<S> {
    harness_for(store, user())
}

pub(super) fn harness_for<S: ApplicationStore>(store: S, user: UserContext) -> TestHarness<S> {
    let store = Arc::new(store);
    let profiles = Arc::new(MemoryProfiles::with_profile(&user, profile()));
    let snapshots = Arc::new(MemorySnapshots::default());
    let notifier = Arc::new(CollectingNotifier::default());
    let service = ApplicationService::new(
        store.clone(),
        profiles,
        snapshots.clone(),
        notifier.clone(),
        EnginePolicy::default(),
        user,
    );
    TestHarness {
        store,
        snapshots,
        notifier,
        service,
    }
}

/// Drive a harness to a fully staged, fully filled draft ready to submit.
pub(super) async fn ready_to_submit<S: ApplicationStore>(harness: &mut TestHarness<S>) {
    harness.service.load().await.expect("load succeeds");
    apply_complete_draft(&mut harness.service);
}

pub(super) fn apply_complete_draft<S: ApplicationStore>(service: &mut TestService<S>) {
    use crate::application::draft::{
        ApplicationDetailsPatch, EducationPatch, IdentityProofPatch, PersonalInfoPatch,
        TechnicalPatch,
    };
    use std::collections::BTreeSet;

    let target = complete_draft();
    service
        .update_personal_info(PersonalInfoPatch {
            full_name: Some(target.personal_info.full_name.clone()),
            email: Some(target.personal_info.email.clone()),
            phone: Some(target.personal_info.phone.clone()),
            date_of_birth: Some(target.personal_info.date_of_birth),
            gender: Some(target.personal_info.gender.clone()),
            street: Some(target.personal_info.address.street.clone()),
            city: Some(target.personal_info.address.city.clone()),
            state: Some(target.personal_info.address.state.clone()),
            postal_code: Some(target.personal_info.address.postal_code.clone()),
            country: Some(target.personal_info.address.country.clone()),
        })
        .expect("personal info patch applies");
    service
        .update_education(EducationPatch {
            institution: Some(target.education.institution.clone()),
            program: Some(target.education.program.clone()),
            degree: Some(target.education.degree.clone()),
            year: Some(target.education.year),
            ..EducationPatch::default()
        })
        .expect("education patch applies");
    service
        .update_technical(TechnicalPatch {
            skills: Some(BTreeSet::from(["Rust".to_string()])),
            github_url: Some(target.technical.github_url.clone()),
            ..TechnicalPatch::default()
        })
        .expect("technical patch applies");
    service
        .update_identity_proof(IdentityProofPatch {
            document_type: Some(IdentityDocumentType::Passport),
            document_number: Some(target.identity_proof.document_number.clone()),
        })
        .expect("identity patch applies");
    service
        .update_college_id(crate::application::draft::CollegeIdPatch {
            document_number: Some(target.college_id_proof.document_number.clone()),
        })
        .expect("college id patch applies");
    service
        .update_application_details(ApplicationDetailsPatch {
            motivation: Some(target.application_details.motivation.clone()),
            goals: Some(target.application_details.goals.clone()),
            achievements: Some(vec!["Dean's list".to_string()]),
        })
        .expect("details patch applies");

    for kind in [SlotKind::Identity, SlotKind::CollegeId] {
        let (filename, content_type, bytes) = png_upload(kind);
        service
            .stage_document(kind, filename, content_type, bytes)
            .expect("document stages");
    }
}

pub(super) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("body is json")
}
