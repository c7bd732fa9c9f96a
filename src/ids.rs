//! Identifier generation for new coaster records
//!
//! Every created record receives an id from an [`IdGenerator`]. Callers never
//! choose ids themselves, so the generator is the single source of identity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Produces identifiers that never repeat for the lifetime of the generator
pub trait IdGenerator: Send + Sync {
    /// Return the next unused identifier
    fn next_id(&self) -> String;
}

/// Thread-safe shared generator
pub type SharedIdGenerator = Arc<dyn IdGenerator>;

/// Strategy names accepted in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    #[default]
    Timestamp,
    Uuid,
}

impl IdStrategy {
    /// Build the generator for this strategy
    pub fn generator(&self) -> SharedIdGenerator {
        match self {
            Self::Timestamp => Arc::new(TimestampIdGenerator::new()),
            Self::Uuid => Arc::new(UuidIdGenerator),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Uuid => "uuid",
        }
    }
}

impl std::str::FromStr for IdStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "timestamp" => Ok(Self::Timestamp),
            "uuid" => Ok(Self::Uuid),
            other => Err(format!("unknown id strategy '{other}' (expected timestamp or uuid)")),
        }
    }
}

// ============================================================================
// Timestamp Generator
// ============================================================================

/// Nanosecond timestamps forced to be strictly increasing
///
/// Two calls landing on the same clock reading (or a clock stepping
/// backwards) still get distinct ids: each id is `max(now, last + 1)`.
#[derive(Debug, Default)]
pub struct TimestampIdGenerator {
    last: AtomicU64,
}

impl TimestampIdGenerator {
    pub fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    fn now_nanos() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    }

    fn next_value(&self) -> u64 {
        let now = Self::now_nanos();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}

impl IdGenerator for TimestampIdGenerator {
    fn next_id(&self) -> String {
        self.next_value().to_string()
    }
}

// ============================================================================
// UUID Generator
// ============================================================================

/// Random v4 UUIDs
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

// ============================================================================
// Sequential Generator
// ============================================================================

/// Deterministic `{prefix}{n}` ids, starting at 1
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}{}", self.prefix, n)
    }
}
