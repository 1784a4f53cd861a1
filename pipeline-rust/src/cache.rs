use crate::{GeneratedArtifact, UserRecord};
use chrono::{DateTime, Utc};

/// Find a previously generated sheet by its `generated_at` key.
///
/// An absent identifier is always a miss. Hits never expire: a sheet stays
/// replayable for the life of the record.
#[must_use]
pub fn lookup(
    record: &UserRecord,
    generated_at: Option<DateTime<Utc>>,
) -> Option<&GeneratedArtifact> {
    let generated_at = generated_at?;
    record
        .generated_sheets
        .iter()
        .rev()
        .find(|sheet| sheet.generated_at == generated_at)
}
