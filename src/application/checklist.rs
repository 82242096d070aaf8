use serde::Serialize;

use super::attachments::AttachmentStaging;
use super::draft::Draft;

/// Checklist sections, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistGroup {
    Personal,
    Education,
    Technical,
    Identity,
    CollegeId,
    ApplicationDetails,
}

/// One required field: a human-readable label plus an explicit filled
/// predicate. Predicates are spelled out per entry rather than inferred
/// from value types, so "zero year counts as missing" stays a deliberate
/// rule and not an accident of truthiness.
pub struct ChecklistEntry {
    pub label: &'static str,
    pub group: ChecklistGroup,
    pub is_filled: fn(&Draft, &AttachmentStaging) -> bool,
}

fn filled(text: &str) -> bool {
    !text.trim().is_empty()
}

/// The fixed, ordered checklist the completion score is computed over.
/// Order matters: missing-field lists follow this order in the UI.
pub const CHECKLIST: [ChecklistEntry; 23] = [
    ChecklistEntry {
        label: "Full Name",
        group: ChecklistGroup::Personal,
        is_filled: |draft, _| filled(&draft.personal_info.full_name),
    },
    ChecklistEntry {
        label: "Email",
        group: ChecklistGroup::Personal,
        is_filled: |draft, _| filled(&draft.personal_info.email),
    },
    ChecklistEntry {
        label: "Phone Number",
        group: ChecklistGroup::Personal,
        is_filled: |draft, _| filled(&draft.personal_info.phone),
    },
    ChecklistEntry {
        label: "Date of Birth",
        group: ChecklistGroup::Personal,
        is_filled: |draft, _| draft.personal_info.date_of_birth.is_some(),
    },
    ChecklistEntry {
        label: "Gender",
        group: ChecklistGroup::Personal,
        is_filled: |draft, _| filled(&draft.personal_info.gender),
    },
    ChecklistEntry {
        label: "Street Address",
        group: ChecklistGroup::Personal,
        is_filled: |draft, _| filled(&draft.personal_info.address.street),
    },
    ChecklistEntry {
        label: "City",
        group: ChecklistGroup::Personal,
        is_filled: |draft, _| filled(&draft.personal_info.address.city),
    },
    ChecklistEntry {
        label: "State",
        group: ChecklistGroup::Personal,
        is_filled: |draft, _| filled(&draft.personal_info.address.state),
    },
    ChecklistEntry {
        label: "Postal Code",
        group: ChecklistGroup::Personal,
        is_filled: |draft, _| filled(&draft.personal_info.address.postal_code),
    },
    ChecklistEntry {
        label: "Country",
        group: ChecklistGroup::Personal,
        is_filled: |draft, _| filled(&draft.personal_info.address.country),
    },
    ChecklistEntry {
        label: "Institution",
        group: ChecklistGroup::Education,
        is_filled: |draft, _| filled(&draft.education.institution),
    },
    ChecklistEntry {
        label: "Program",
        group: ChecklistGroup::Education,
        is_filled: |draft, _| filled(&draft.education.program),
    },
    ChecklistEntry {
        label: "Degree",
        group: ChecklistGroup::Education,
        is_filled: |draft, _| filled(&draft.education.degree),
    },
    ChecklistEntry {
        label: "Academic Year",
        group: ChecklistGroup::Education,
        // Zero means "not provided"; year 1 upward counts.
        is_filled: |draft, _| draft.education.year > 0,
    },
    ChecklistEntry {
        label: "Skills",
        group: ChecklistGroup::Technical,
        is_filled: |draft, _| !draft.technical.skills.is_empty(),
    },
    ChecklistEntry {
        label: "GitHub Profile",
        group: ChecklistGroup::Technical,
        is_filled: |draft, _| filled(&draft.technical.github_url),
    },
    ChecklistEntry {
        label: "Identity Document Type",
        group: ChecklistGroup::Identity,
        is_filled: |draft, _| draft.identity_proof.document_type.is_set(),
    },
    ChecklistEntry {
        label: "Identity Document Number",
        group: ChecklistGroup::Identity,
        is_filled: |draft, _| filled(&draft.identity_proof.document_number),
    },
    ChecklistEntry {
        label: "Identity Document Image",
        group: ChecklistGroup::Identity,
        is_filled: |_, staging| staging.identity.has_image(),
    },
    ChecklistEntry {
        label: "College ID Number",
        group: ChecklistGroup::CollegeId,
        is_filled: |draft, _| filled(&draft.college_id_proof.document_number),
    },
    ChecklistEntry {
        label: "College ID Image",
        group: ChecklistGroup::CollegeId,
        is_filled: |_, staging| staging.college_id.has_image(),
    },
    ChecklistEntry {
        label: "Motivation",
        group: ChecklistGroup::ApplicationDetails,
        is_filled: |draft, _| filled(&draft.application_details.motivation),
    },
    ChecklistEntry {
        label: "Goals",
        group: ChecklistGroup::ApplicationDetails,
        is_filled: |draft, _| filled(&draft.application_details.goals),
    },
];

/// Checklist label for a field-path failure key (`education.year`,
/// `college_id_proof.document_number`). The section prefix disambiguates
/// the document fields shared by the identity and college-id sections.
pub fn label_for_path(path: &str) -> Option<&'static str> {
    let mut parts = path.rsplit('.');
    let bare = parts.next().unwrap_or(path);
    let section = parts.next().unwrap_or("");

    if section.starts_with("college") {
        match bare {
            "document_number" | "documentNumber" => return Some("College ID Number"),
            "document_image" | "documentImage" => return Some("College ID Image"),
            _ => {}
        }
    }
    label_for_field(bare)
}

/// Checklist label for a bare server-side field key, used when translating
/// field-keyed validation failures into user-facing text.
pub fn label_for_field(field: &str) -> Option<&'static str> {
    let label = match field {
        "full_name" | "fullName" => "Full Name",
        "email" => "Email",
        "phone" => "Phone Number",
        "date_of_birth" | "dateOfBirth" => "Date of Birth",
        "gender" => "Gender",
        "street" => "Street Address",
        "city" => "City",
        "state" => "State",
        "postal_code" | "postalCode" => "Postal Code",
        "country" => "Country",
        "institution" => "Institution",
        "program" => "Program",
        "degree" => "Degree",
        "year" => "Academic Year",
        "skills" => "Skills",
        "github_url" | "githubUrl" => "GitHub Profile",
        "document_type" | "documentType" => "Identity Document Type",
        "document_number" | "documentNumber" => "Identity Document Number",
        "document_image" | "documentImage" => "Identity Document Image",
        "motivation" => "Motivation",
        "goals" => "Goals",
        _ => return None,
    };
    Some(label)
}
