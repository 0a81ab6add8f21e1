use std::sync::atomic::{AtomicU64, Ordering};

// Starts at 1 and stays small so ids survive JSON number precision on clients.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a process-unique, monotonically increasing identifier.
pub fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}
