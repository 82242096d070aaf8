//! Fetch-or-create, save, and offline-fallback logic for the draft.
//!
//! Date-valued fields coming off the wire are normalized field by field in
//! the draft's serde layer (`draft::flexible_date`), so everything this
//! module touches is already canonical `NaiveDate`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::attachments::{AttachmentSlot, AttachmentStaging};
use super::draft::{Draft, UserContext};
use super::status::{ApplicationStatus, ReviewComment};
use super::store::{
    ApplicationStore, ProfileDirectory, SnapshotError, SnapshotStore, StoreError,
};

/// Result of the fetch-or-create load path.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedApplication {
    pub draft: Draft,
    pub staging: AttachmentStaging,
    pub status: ApplicationStatus,
    pub review: Option<ReviewComment>,
    /// True when no remote record existed and the draft was seeded from
    /// the general profile instead.
    pub seeded_from_profile: bool,
}

/// Outcome of a save: either the server's canonical echo, or a local
/// fallback when the store was unreachable.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Persisted {
        draft: Draft,
        status: ApplicationStatus,
    },
    SavedLocally {
        at: DateTime<Utc>,
    },
}

/// Advisory offline copy of the draft. Written only on the offline-save
/// path and never auto-restored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackSnapshot {
    pub draft: Draft,
    pub staging: AttachmentStaging,
    pub saved_at: DateTime<Utc>,
}

pub fn snapshot_key(user: &UserContext) -> String {
    format!("applyflow.fallback.{}", user.user_id.0)
}

/// Errors surfaced by the synchronizer.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("sign-in required")]
    SignInRequired,
    #[error("no application or profile on record")]
    NothingToLoad,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Fetch the remote application if one exists; otherwise seed a fresh
/// draft from the general profile. The remote record always wins over
/// profile defaults.
pub async fn load<S, P>(
    store: &S,
    profiles: &P,
    user: &UserContext,
) -> Result<LoadedApplication, SyncError>
where
    S: ApplicationStore,
    P: ProfileDirectory,
{
    match store.fetch(user).await {
        Ok(remote) => {
            let staging = AttachmentStaging {
                identity: AttachmentSlot::from_persisted_field(
                    &remote.draft.identity_proof.document_image,
                ),
                college_id: AttachmentSlot::from_persisted_field(
                    &remote.draft.college_id_proof.document_image,
                ),
            };
            let review = remote.review_comment.map(|comment| ReviewComment {
                status: remote.status,
                comment,
            });
            info!(status = remote.status.label(), "loaded remote application");
            Ok(LoadedApplication {
                draft: remote.draft,
                staging,
                status: remote.status,
                review,
                seeded_from_profile: false,
            })
        }
        Err(StoreError::NotFound) => {
            let profile = profiles
                .profile(user)
                .await?
                .ok_or(SyncError::NothingToLoad)?;
            info!("no remote application; seeding draft from profile");
            Ok(LoadedApplication {
                draft: Draft::from_profile(&profile),
                staging: AttachmentStaging::default(),
                status: ApplicationStatus::Draft,
                review: None,
                seeded_from_profile: true,
            })
        }
        Err(other) => Err(other.into()),
    }
}

/// Idempotent upsert of the draft. When the store is unreachable the draft
/// stays untouched in memory and exactly one timestamped fallback snapshot
/// is written to durable local storage instead.
pub async fn save<S, L>(
    store: &S,
    snapshots: &L,
    user: &UserContext,
    draft: &Draft,
    staging: &AttachmentStaging,
) -> Result<SaveOutcome, SyncError>
where
    S: ApplicationStore,
    L: SnapshotStore,
{
    match store.save(user, draft).await {
        Ok(remote) => {
            info!(status = remote.status.label(), "draft persisted remotely");
            Ok(SaveOutcome::Persisted {
                draft: remote.draft,
                status: remote.status,
            })
        }
        Err(StoreError::Network(reason)) => {
            warn!(%reason, "store unreachable, writing fallback snapshot");
            let at = write_fallback(snapshots, user, draft, staging)?;
            Ok(SaveOutcome::SavedLocally { at })
        }
        Err(other) => Err(other.into()),
    }
}

fn write_fallback<L: SnapshotStore>(
    snapshots: &L,
    user: &UserContext,
    draft: &Draft,
    staging: &AttachmentStaging,
) -> Result<DateTime<Utc>, SnapshotError> {
    let saved_at = Utc::now();
    let snapshot = FallbackSnapshot {
        draft: draft.clone(),
        staging: staging.clone(),
        saved_at,
    };
    let encoded = serde_json::to_vec(&snapshot)
        .map_err(|err| SnapshotError::Encoding(err.to_string()))?;
    snapshots.put(&snapshot_key(user), &encoded)?;
    Ok(saved_at)
}
