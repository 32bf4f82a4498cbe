use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const PREFIX: &str = "caaos";

/// Time-derived container identifiers, strictly increasing within the process.
///
/// The value doubles as the snapshot key, so a new run never reuses the name of a container
/// whose cleanup may still be in flight.
#[derive(Debug, Default)]
pub struct InstanceIds {
    last: AtomicU64,
}

impl InstanceIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);

        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev.saturating_add(1));
            match self.last.compare_exchange_weak(
                prev,
                candidate,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return format!("{PREFIX}-{candidate}"),
                Err(actual) => prev = actual,
            }
        }
    }
}
