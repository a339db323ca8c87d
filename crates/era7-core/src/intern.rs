//! Interning for common segment ids
//!
//! Segment ids come from a small closed set in the common case. The
//! interner hands out shared `Arc<str>` values for the well-known ids
//! so repeated segments reuse one allocation; unknown ids (including
//! Z-segments) are stored unshared. The table is built once and only
//! read afterwards, so the happy path takes no lock.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

/// Segment ids that appear in virtually every production feed
const COMMON_IDS: &[&str] = &[
    "MSH", "MSA", "ERR", "EVN", "PID", "PD1", "NK1", "PV1", "PV2", "OBR", "OBX", "ORC", "NTE",
    "AL1", "DG1", "IN1", "IN2", "GT1", "QRD", "QRF", "QPD", "QAK", "RCP", "SCH", "TXA", "FT1",
    "RXA", "RXR", "SPM", "TQ1", "BHS", "BTS", "FHS", "FTS",
];

static TABLE: Lazy<HashMap<&'static str, Arc<str>>> = Lazy::new(|| {
    COMMON_IDS.iter().map(|&id| (id, Arc::from(id))).collect()
});

/// Whether `id` belongs to the well-known set
pub(crate) fn is_common(id: &str) -> bool {
    TABLE.contains_key(id)
}

/// Return a shared handle for `id`, reusing the static table when possible
pub(crate) fn intern(id: &str) -> Arc<str> {
    match TABLE.get(id) {
        Some(shared) => Arc::clone(shared),
        None => Arc::from(id),
    }
}
