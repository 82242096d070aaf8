use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use mime::Mime;
use serde::{Deserialize, Serialize};

/// Document slots the engine stages files for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Identity,
    CollegeId,
    ProfilePicture,
}

impl SlotKind {
    pub const fn label(self) -> &'static str {
        match self {
            SlotKind::Identity => "Identity Document",
            SlotKind::CollegeId => "College ID",
            SlotKind::ProfilePicture => "Profile Picture",
        }
    }
}

const MIB: usize = 1024 * 1024;

/// Upload constraints; a policy dial rather than per-call constants so the
/// limits can be tuned through configuration.
#[derive(Debug, Clone)]
pub struct AttachmentPolicy {
    pub document_max_bytes: usize,
    pub profile_picture_max_bytes: usize,
}

impl AttachmentPolicy {
    pub fn max_bytes(&self, kind: SlotKind) -> usize {
        match kind {
            SlotKind::Identity | SlotKind::CollegeId => self.document_max_bytes,
            SlotKind::ProfilePicture => self.profile_picture_max_bytes,
        }
    }

    /// Raster-image types the stager accepts, shared by every slot.
    pub fn allowed_types(&self) -> &'static [Mime] {
        static ALLOWED: [Mime; 4] = [
            mime::IMAGE_JPEG,
            mime::IMAGE_PNG,
            mime::IMAGE_GIF,
            mime::IMAGE_BMP,
        ];
        &ALLOWED
    }
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self {
            document_max_bytes: 2 * MIB,
            profile_picture_max_bytes: 5 * MIB,
        }
    }
}

/// Validation errors raised while staging a file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttachmentError {
    #[error("unsupported file type '{found}'; accepted: {accepted}")]
    UnsupportedType { found: String, accepted: String },
    #[error("file is {found} bytes, above the {limit} byte limit for {slot}")]
    TooLarge {
        slot: &'static str,
        limit: usize,
        found: usize,
    },
    #[error("file is empty")]
    Empty,
    #[error("{0} has no staging slot on the application")]
    NoSlot(&'static str),
}

/// A validated local file, held until submission uploads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedAttachment {
    pub filename: String,
    pub content_type: String,
    /// Raw bytes; kept around so a failed upload can be retried without the
    /// user re-selecting the file.
    pub bytes: Vec<u8>,
    /// Lossless `data:` URI placed into the draft and used as the preview.
    pub encoded: String,
}

/// Lifecycle of one document slot. The tag carries only the fields valid
/// for that state, so "user picked a file" can never be conflated with
/// "server has the file".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AttachmentSlot {
    #[default]
    Empty,
    Staged(StagedAttachment),
    Persisted { uri: String },
}

impl AttachmentSlot {
    /// True once a valid image is attached, staged or already persisted.
    pub fn has_image(&self) -> bool {
        match self {
            AttachmentSlot::Empty => false,
            AttachmentSlot::Staged(staged) => !staged.encoded.is_empty(),
            AttachmentSlot::Persisted { uri } => !uri.is_empty(),
        }
    }

    pub fn is_staged(&self) -> bool {
        matches!(self, AttachmentSlot::Staged(_))
    }

    /// Slot state for an image field loaded from a previously saved record.
    pub fn from_persisted_field(field: &str) -> Self {
        if field.trim().is_empty() {
            AttachmentSlot::Empty
        } else {
            AttachmentSlot::Persisted {
                uri: field.to_string(),
            }
        }
    }
}

/// Per-document staging state carried alongside the draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentStaging {
    pub identity: AttachmentSlot,
    pub college_id: AttachmentSlot,
}

impl AttachmentStaging {
    pub fn clear(&mut self) {
        self.identity = AttachmentSlot::Empty;
        self.college_id = AttachmentSlot::Empty;
    }
}

/// Validate and encode a picked file. Nothing is mutated on failure; the
/// caller moves the returned attachment into the slot and mirrors the data
/// URI into the draft's image field.
pub fn stage(
    policy: &AttachmentPolicy,
    kind: SlotKind,
    filename: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<StagedAttachment, AttachmentError> {
    if bytes.is_empty() {
        return Err(AttachmentError::Empty);
    }

    let accepted = || {
        policy
            .allowed_types()
            .iter()
            .map(Mime::essence_str)
            .collect::<Vec<_>>()
            .join(", ")
    };

    let parsed: Mime = content_type
        .parse()
        .map_err(|_| AttachmentError::UnsupportedType {
            found: content_type.to_string(),
            accepted: accepted(),
        })?;

    let allowed = policy
        .allowed_types()
        .iter()
        .any(|mime| mime.essence_str() == parsed.essence_str());
    if !allowed {
        return Err(AttachmentError::UnsupportedType {
            found: parsed.essence_str().to_string(),
            accepted: accepted(),
        });
    }

    let limit = policy.max_bytes(kind);
    if bytes.len() > limit {
        return Err(AttachmentError::TooLarge {
            slot: kind.label(),
            limit,
            found: bytes.len(),
        });
    }

    let encoded = format!(
        "data:{};base64,{}",
        parsed.essence_str(),
        BASE64.encode(&bytes)
    );

    Ok(StagedAttachment {
        filename: filename.to_string(),
        content_type: parsed.essence_str().to_string(),
        bytes,
        encoded,
    })
}
