use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since UNIX epoch. Used for relative ordering of results,
/// not for wall-clock precision.
pub type EpochMs = i64;

pub fn now_ms() -> EpochMs {
    let dur = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    dur.as_millis() as i64
}
