use chrono::{DateTime, Utc};
use pkg_types::workload::Condition;

/// Latest activity recorded in a workload's status conditions.
///
/// Unset timestamps and timestamps at or before the Unix epoch (the
/// serialized form of a zero time) are ignored. `None` means activity is
/// unknown, which callers must not read as "idle".
pub fn resolve(conditions: &[Condition]) -> Option<DateTime<Utc>> {
    conditions
        .iter()
        .flat_map(|c| c.timestamps())
        .filter(|t| *t > DateTime::<Utc>::UNIX_EPOCH)
        .max()
}
