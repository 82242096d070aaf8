//! External collaborator seams: the remote application store, the
//! read-only profile directory, the durable snapshot store, and the
//! notification surface. Services stay generic over these so every flow
//! can be exercised against in-memory implementations.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::completion::CompletionReport;
use super::draft::{Draft, StudentProfile, UserContext};
use super::status::ApplicationStatus;

/// Application record as echoed by the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteApplication {
    pub draft: Draft,
    pub status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_comment: Option<String>,
}

/// Metadata accompanying a document upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUpload {
    pub filename: String,
    pub content_type: String,
    pub document_number: String,
    pub bytes: Vec<u8>,
}

/// Field-keyed validation failures returned by the remote store. Keys are
/// raw field paths (`education.year`); values are server messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailures(pub BTreeMap<String, String>);

impl ValidationFailures {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} field(s) rejected", self.0.len())
    }
}

/// Error enumeration for remote store failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("no application on record")]
    NotFound,
    #[error("application store unreachable: {0}")]
    Network(String),
    #[error("server validation failed: {0}")]
    Validation(ValidationFailures),
    #[error("application store unavailable: {0}")]
    Unavailable(String),
}

/// Error writing or reading the durable local snapshot.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SnapshotError {
    #[error("local storage rejected the snapshot: {0}")]
    Storage(String),
    #[error("snapshot could not be encoded: {0}")]
    Encoding(String),
}

/// Remote persistence service for the application record. One record per
/// user; `save` is an idempotent upsert keyed by user identity, so there
/// is no client-generated request id to manage.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn fetch(&self, user: &UserContext) -> Result<RemoteApplication, StoreError>;

    async fn save(
        &self,
        user: &UserContext,
        draft: &Draft,
    ) -> Result<RemoteApplication, StoreError>;

    async fn submit(
        &self,
        user: &UserContext,
        draft: &Draft,
    ) -> Result<RemoteApplication, StoreError>;

    async fn upload_identity(
        &self,
        user: &UserContext,
        upload: DocumentUpload,
    ) -> Result<String, StoreError>;

    async fn upload_college_id(
        &self,
        user: &UserContext,
        upload: DocumentUpload,
    ) -> Result<String, StoreError>;

    /// Optional server-side completion scorer; callers fall back to the
    /// local scorer when this fails.
    async fn completion(&self, user: &UserContext) -> Result<CompletionReport, StoreError>;
}

/// Read-only directory of general student profiles, used to pre-populate
/// a brand new draft.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn profile(&self, user: &UserContext) -> Result<Option<StudentProfile>, StoreError>;
}

/// Durable key-value blob store holding the offline fallback snapshot.
/// Only the synchronizer writes it, and only on the offline-save path.
pub trait SnapshotStore: Send + Sync {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), SnapshotError>;
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SnapshotError>;
}

/// Fire-and-forget notification surface. The engine decides what to say
/// and when; rendering is the surrounding UI's concern.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn info(&self, message: &str);
}
