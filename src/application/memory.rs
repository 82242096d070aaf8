//! In-memory collaborator implementations backing the demo server and the
//! test suites. They mimic the remote store's observable behavior: upsert
//! keyed by user, server-side validation on submit, and opaque storage
//! URIs for uploaded documents.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use super::attachments::{AttachmentSlot, AttachmentStaging};
use super::completion::{self, CompletionReport};
use super::draft::{Draft, StudentProfile, UserContext};
use super::status::ApplicationStatus;
use super::store::{
    ApplicationStore, DocumentUpload, Notifier, ProfileDirectory, RemoteApplication,
    SnapshotError, SnapshotStore, StoreError, ValidationFailures,
};

/// In-memory stand-in for the remote application store.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, RemoteApplication>>,
    upload_sequence: AtomicU64,
}

impl MemoryStore {
    /// Reviewer action: decide a submitted application out of band, the way
    /// the real store changes status between refetches.
    pub fn decide(&self, user: &UserContext, status: ApplicationStatus, comment: &str) {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(record) = records.get_mut(&user.user_id.0) {
            record.status = status;
            record.review_comment = Some(comment.to_string());
        }
    }

    fn next_uri(&self, user: &UserContext, slot: &str) -> String {
        let id = self.upload_sequence.fetch_add(1, Ordering::Relaxed);
        format!("store://documents/{}/{slot}-{id:04}", user.user_id.0)
    }

    fn validate(draft: &Draft) -> ValidationFailures {
        let mut failures = BTreeMap::new();
        if !draft.personal_info.email.contains('@') {
            failures.insert(
                "personal_info.email".to_string(),
                "must be a valid email address".to_string(),
            );
        }
        if draft.education.year > 8 {
            failures.insert(
                "education.year".to_string(),
                "must be a plausible academic year".to_string(),
            );
        }
        ValidationFailures(failures)
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn fetch(&self, user: &UserContext) -> Result<RemoteApplication, StoreError> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records
            .get(&user.user_id.0)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn save(
        &self,
        user: &UserContext,
        draft: &Draft,
    ) -> Result<RemoteApplication, StoreError> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let entry = records
            .entry(user.user_id.0.clone())
            .or_insert_with(|| RemoteApplication {
                draft: Draft::default(),
                status: ApplicationStatus::Draft,
                review_comment: None,
            });
        entry.draft = draft.clone();
        Ok(entry.clone())
    }

    async fn submit(
        &self,
        user: &UserContext,
        draft: &Draft,
    ) -> Result<RemoteApplication, StoreError> {
        let failures = Self::validate(draft);
        if !failures.is_empty() {
            return Err(StoreError::Validation(failures));
        }

        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let record = RemoteApplication {
            draft: draft.clone(),
            status: ApplicationStatus::Submitted,
            review_comment: None,
        };
        records.insert(user.user_id.0.clone(), record.clone());
        Ok(record)
    }

    async fn upload_identity(
        &self,
        user: &UserContext,
        _upload: DocumentUpload,
    ) -> Result<String, StoreError> {
        Ok(self.next_uri(user, "identity"))
    }

    async fn upload_college_id(
        &self,
        user: &UserContext,
        _upload: DocumentUpload,
    ) -> Result<String, StoreError> {
        Ok(self.next_uri(user, "college-id"))
    }

    async fn completion(&self, user: &UserContext) -> Result<CompletionReport, StoreError> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let record = records.get(&user.user_id.0).ok_or(StoreError::NotFound)?;
        let staging = AttachmentStaging {
            identity: AttachmentSlot::from_persisted_field(
                &record.draft.identity_proof.document_image,
            ),
            college_id: AttachmentSlot::from_persisted_field(
                &record.draft.college_id_proof.document_image,
            ),
        };
        Ok(completion::score(&record.draft, &staging))
    }
}

/// Fixed profile directory for prefill.
#[derive(Default)]
pub struct MemoryProfiles {
    profiles: HashMap<String, StudentProfile>,
}

impl MemoryProfiles {
    pub fn with_profile(user: &UserContext, profile: StudentProfile) -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(user.user_id.0.clone(), profile);
        Self { profiles }
    }
}

#[async_trait]
impl ProfileDirectory for MemoryProfiles {
    async fn profile(&self, user: &UserContext) -> Result<Option<StudentProfile>, StoreError> {
        Ok(self.profiles.get(&user.user_id.0).cloned())
    }
}

/// Durable-storage stand-in for the offline fallback snapshot.
#[derive(Default)]
pub struct MemorySnapshots {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySnapshots {
    pub fn keys(&self) -> Vec<String> {
        let blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        blobs.keys().cloned().collect()
    }
}

impl SnapshotStore for MemorySnapshots {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), SnapshotError> {
        let mut blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        blobs.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SnapshotError> {
        let blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        Ok(blobs.get(key).cloned())
    }
}

/// Notification surface that forwards messages to the log.
#[derive(Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!(kind = "success", message, "notification");
    }

    fn error(&self, message: &str) {
        info!(kind = "error", message, "notification");
    }

    fn info(&self, message: &str) {
        info!(kind = "info", message, "notification");
    }
}
