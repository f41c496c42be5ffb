//! One-time repair of knowledge points written by older clients.
//!
//! Three independent fixes are applied to every record:
//!
//! 1. String ids (the old UUID-as-id format) get a fresh negative id.
//! 2. A learner sentence containing CJK ideographs was stored in the wrong
//!    field; it is swapped with the incorrect-phrase field and the latter is
//!    cleared, since its correct value cannot be recovered.
//! 3. A missing key point summary is backfilled from the subcategory.
//!
//! The transform is idempotent: a second run over its own output changes
//! nothing.

use crate::{LocalIdCounter, LocalKnowledgePoint, PointContent, PointId};
use serde::{Deserialize, Serialize};

/// Summary used when neither a key point summary nor a subcategory exists.
pub const KEY_POINT_PLACEHOLDER: &str = "General knowledge point";

/// Check for characters in the CJK Unified Ideographs block (U+4E00..U+9FFF).
///
/// Range membership only; mixed-language text counts as CJK as soon as one
/// ideograph appears.
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| ('\u{4E00}'..='\u{9FFF}').contains(&c))
}

/// What a migration run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    /// Records whose legacy string id was replaced
    pub ids_reassigned: usize,
    /// Records whose sentence fields were swapped
    pub sentences_swapped: usize,
    /// Records whose key point summary was backfilled
    pub summaries_backfilled: usize,
    /// Records touched by at least one fix
    pub records_changed: usize,
}

impl MigrationReport {
    /// Whether anything changed and the list has to be rewritten.
    pub fn changed(&self) -> bool {
        self.records_changed > 0
    }
}

/// Migrate all records in place, allocating new ids from `counter`.
pub fn migrate_records(
    records: &mut [LocalKnowledgePoint],
    counter: &mut LocalIdCounter,
) -> MigrationReport {
    let mut report = MigrationReport::default();

    for record in records.iter_mut() {
        let mut changed = false;

        if reassign_legacy_id(record, counter) {
            report.ids_reassigned += 1;
            changed = true;
        }
        if swap_misplaced_sentence(&mut record.content) {
            report.sentences_swapped += 1;
            changed = true;
        }
        if backfill_summary(&mut record.content) {
            report.summaries_backfilled += 1;
            changed = true;
        }

        if changed {
            report.records_changed += 1;
        }
    }

    report
}

fn reassign_legacy_id(record: &mut LocalKnowledgePoint, counter: &mut LocalIdCounter) -> bool {
    let PointId::Legacy(original) = &record.id else {
        return false;
    };

    record.local_id = original.clone();
    record.id = PointId::Numeric(counter.allocate());
    record.is_local = true;
    true
}

fn swap_misplaced_sentence(content: &mut PointContent) -> bool {
    let misplaced = content
        .user_context_sentence
        .as_deref()
        .is_some_and(contains_cjk);
    // Swapping CJK in from the sibling would leave the field misplaced.
    let sibling_is_cjk = content
        .incorrect_phrase_in_context
        .as_deref()
        .is_some_and(contains_cjk);

    if !misplaced || sibling_is_cjk {
        return false;
    }

    std::mem::swap(
        &mut content.user_context_sentence,
        &mut content.incorrect_phrase_in_context,
    );
    content.incorrect_phrase_in_context = Some(String::new());
    true
}

fn backfill_summary(content: &mut PointContent) -> bool {
    if PointContent::text(&content.key_point_summary).is_some() {
        return false;
    }

    let summary = PointContent::text(&content.subcategory).unwrap_or(KEY_POINT_PLACEHOLDER);
    content.key_point_summary = Some(summary.to_string());
    true
}
