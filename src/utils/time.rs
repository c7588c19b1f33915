use chrono::{DateTime, Utc};

/// Injectable time source so expiry semantics are testable without real
/// delays.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub fn now() -> DateTime<Utc> {
    Utc::now()
}
