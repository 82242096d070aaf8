use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier wrapper for the applicant as known to the session provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Current user as supplied by the identity/session provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: UserId,
    pub email: String,
    pub authenticated: bool,
}

/// The mutable in-progress application record.
///
/// Every leaf value is either unset (empty string, zero, `None`) or
/// meaningfully filled; sections are always fully structured, never
/// null-with-one-field-set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Draft {
    pub personal_info: PersonalInfo,
    pub education: Education,
    pub technical: Technical,
    pub identity_proof: IdentityProof,
    pub college_id_proof: CollegeIdProof,
    pub application_details: ApplicationDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(deserialize_with = "flexible_date")]
    pub date_of_birth: Option<NaiveDate>,
    pub gender: String,
    pub address: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub institution: String,
    pub program: String,
    pub degree: String,
    /// Academic year; zero means "not provided" (a zero year is
    /// deliberately counted as missing by the checklist).
    pub year: u16,
    pub cgpa: Option<f32>,
    pub percentage: Option<f32>,
    #[serde(deserialize_with = "flexible_date")]
    pub expected_graduation: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Technical {
    /// Skill names; set semantics keep entries unique regardless of the
    /// order the UI adds them in.
    pub skills: BTreeSet<String>,
    pub github_url: String,
    pub linkedin_url: String,
    pub portfolio_url: String,
}

/// Accepted identity document kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityDocumentType {
    #[default]
    Unspecified,
    Passport,
    NationalId,
    DriversLicense,
}

impl IdentityDocumentType {
    pub const fn label(self) -> &'static str {
        match self {
            IdentityDocumentType::Unspecified => "",
            IdentityDocumentType::Passport => "Passport",
            IdentityDocumentType::NationalId => "National ID",
            IdentityDocumentType::DriversLicense => "Driver's License",
        }
    }

    pub const fn is_set(self) -> bool {
        !matches!(self, IdentityDocumentType::Unspecified)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityProof {
    pub document_type: IdentityDocumentType,
    pub document_number: String,
    /// Data URI once staged locally, or the store URI once persisted.
    pub document_image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollegeIdProof {
    pub document_number: String,
    pub document_image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationDetails {
    pub motivation: String,
    pub goals: String,
    pub achievements: Vec<String>,
}

/// Read-only profile record used to pre-populate a brand new draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentProfile {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(deserialize_with = "flexible_date")]
    pub date_of_birth: Option<NaiveDate>,
    pub gender: String,
    pub institution: String,
    pub program: String,
}

impl Draft {
    /// Fresh draft seeded from the user's general profile. Used only when
    /// no remote application record exists at all.
    pub fn from_profile(profile: &StudentProfile) -> Self {
        let mut draft = Draft::default();
        draft.personal_info.full_name = profile.full_name.clone();
        draft.personal_info.email = profile.email.clone();
        draft.personal_info.phone = profile.phone.clone();
        draft.personal_info.date_of_birth = profile.date_of_birth;
        draft.personal_info.gender = profile.gender.clone();
        draft.education.institution = profile.institution.clone();
        draft.education.program = profile.program.clone();
        draft
    }
}

/// Section patches. Each field is optional so UI handlers can send only
/// what changed; applying a patch is the single mutation path per section,
/// which keeps the completion report recompute in one place.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PersonalInfoPatch {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(deserialize_with = "flexible_date_patch")]
    pub date_of_birth: Option<Option<NaiveDate>>,
    pub gender: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EducationPatch {
    pub institution: Option<String>,
    pub program: Option<String>,
    pub degree: Option<String>,
    pub year: Option<u16>,
    pub cgpa: Option<Option<f32>>,
    pub percentage: Option<Option<f32>>,
    #[serde(deserialize_with = "flexible_date_patch")]
    pub expected_graduation: Option<Option<NaiveDate>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TechnicalPatch {
    pub skills: Option<BTreeSet<String>>,
    pub add_skill: Option<String>,
    pub remove_skill: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdentityProofPatch {
    pub document_type: Option<IdentityDocumentType>,
    pub document_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CollegeIdPatch {
    pub document_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApplicationDetailsPatch {
    pub motivation: Option<String>,
    pub goals: Option<String>,
    pub achievements: Option<Vec<String>>,
}

impl Draft {
    pub fn apply_personal_info(&mut self, patch: PersonalInfoPatch) {
        let section = &mut self.personal_info;
        if let Some(value) = patch.full_name {
            section.full_name = value;
        }
        if let Some(value) = patch.email {
            section.email = value;
        }
        if let Some(value) = patch.phone {
            section.phone = value;
        }
        if let Some(value) = patch.date_of_birth {
            section.date_of_birth = value;
        }
        if let Some(value) = patch.gender {
            section.gender = value;
        }
        if let Some(value) = patch.street {
            section.address.street = value;
        }
        if let Some(value) = patch.city {
            section.address.city = value;
        }
        if let Some(value) = patch.state {
            section.address.state = value;
        }
        if let Some(value) = patch.postal_code {
            section.address.postal_code = value;
        }
        if let Some(value) = patch.country {
            section.address.country = value;
        }
    }

    pub fn apply_education(&mut self, patch: EducationPatch) {
        let section = &mut self.education;
        if let Some(value) = patch.institution {
            section.institution = value;
        }
        if let Some(value) = patch.program {
            section.program = value;
        }
        if let Some(value) = patch.degree {
            section.degree = value;
        }
        if let Some(value) = patch.year {
            section.year = value;
        }
        if let Some(value) = patch.cgpa {
            section.cgpa = value;
        }
        if let Some(value) = patch.percentage {
            section.percentage = value;
        }
        if let Some(value) = patch.expected_graduation {
            section.expected_graduation = value;
        }
    }

    pub fn apply_technical(&mut self, patch: TechnicalPatch) {
        let section = &mut self.technical;
        if let Some(skills) = patch.skills {
            section.skills = skills;
        }
        if let Some(skill) = patch.add_skill {
            let trimmed = skill.trim().to_string();
            if !trimmed.is_empty() {
                section.skills.insert(trimmed);
            }
        }
        if let Some(skill) = patch.remove_skill {
            section.skills.remove(skill.trim());
        }
        if let Some(value) = patch.github_url {
            section.github_url = value;
        }
        if let Some(value) = patch.linkedin_url {
            section.linkedin_url = value;
        }
        if let Some(value) = patch.portfolio_url {
            section.portfolio_url = value;
        }
    }

    pub fn apply_identity_proof(&mut self, patch: IdentityProofPatch) {
        let section = &mut self.identity_proof;
        if let Some(value) = patch.document_type {
            section.document_type = value;
        }
        if let Some(value) = patch.document_number {
            section.document_number = value;
        }
    }

    pub fn apply_college_id(&mut self, patch: CollegeIdPatch) {
        if let Some(value) = patch.document_number {
            self.college_id_proof.document_number = value;
        }
    }

    pub fn apply_application_details(&mut self, patch: ApplicationDetailsPatch) {
        let section = &mut self.application_details;
        if let Some(value) = patch.motivation {
            section.motivation = value;
        }
        if let Some(value) = patch.goals {
            section.goals = value;
        }
        if let Some(value) = patch.achievements {
            section.achievements = value;
        }
    }
}

/// Flexible wire form for date-valued fields.
///
/// Remote records and profile data alternate between ISO strings (with or
/// without a time component) and structured `{year, month, day}` objects;
/// both collapse to [`NaiveDate`], applied to each field independently.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum DateInput {
    Text(String),
    Parts { year: i32, month: u32, day: u32 },
}

fn normalize_date(input: DateInput) -> Option<NaiveDate> {
    match input {
        DateInput::Text(raw) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            let date_part = raw.split('T').next().unwrap_or(raw);
            NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
        }
        DateInput::Parts { year, month, day } => NaiveDate::from_ymd_opt(year, month, day),
    }
}

pub(crate) fn flexible_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let input = Option::<DateInput>::deserialize(deserializer)?;
    Ok(input.and_then(normalize_date))
}

fn flexible_date_patch<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error>
where
    D: Deserializer<'de>,
{
    let input = Option::<DateInput>::deserialize(deserializer)?;
    Ok(Some(input.and_then(normalize_date)))
}
