use serde::{Deserialize, Serialize};

use super::attachments::AttachmentStaging;
use super::checklist::CHECKLIST;
use super::draft::Draft;

/// Derived completion summary. Never persisted; recomputed after every
/// draft or staging mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub percentage: u8,
    pub missing_fields: Vec<String>,
    pub completed_count: usize,
    pub total_count: usize,
}

impl CompletionReport {
    pub fn is_complete(&self) -> bool {
        self.percentage == 100
    }
}

/// Evaluate the fixed checklist against a draft. Pure and allocation-light;
/// this runs on every keystroke-level change, so it must stay O(fields)
/// with no I/O.
pub fn score(draft: &Draft, staging: &AttachmentStaging) -> CompletionReport {
    let total_count = CHECKLIST.len();
    let mut completed_count = 0usize;
    let mut missing_fields = Vec::new();

    for entry in &CHECKLIST {
        if (entry.is_filled)(draft, staging) {
            completed_count += 1;
        } else {
            missing_fields.push(entry.label.to_string());
        }
    }

    CompletionReport {
        percentage: ratio_percent(completed_count, total_count),
        missing_fields,
        completed_count,
        total_count,
    }
}

/// Integer percentage, rounded half-up. Every field weighs the same.
fn ratio_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((completed * 200 + total) / (total * 2)) as u8
}
