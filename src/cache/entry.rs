//! Cache entries and their lifetimes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// How long a freshly written entry stays valid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Valid for this long after `set`
    Finite(Duration),
    /// Never expires
    Infinite,
}

impl Ttl {
    /// `None` means infinite
    pub fn from_millis(ms: Option<u64>) -> Self {
        match ms {
            Some(ms) => Self::Finite(Duration::from_millis(ms)),
            None => Self::Infinite,
        }
    }

    /// Absolute deadline for an entry written at `now`
    ///
    /// A TTL too large to represent is treated as infinite.
    pub fn deadline_from(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Finite(ttl) => chrono::Duration::from_std(*ttl)
                .ok()
                .and_then(|delta| now.checked_add_signed(delta)),
            Self::Infinite => None,
        }
    }
}

/// When an entry stops being valid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    At(DateTime<Utc>),
    Never,
}

impl Expiry {
    pub fn is_never(&self) -> bool {
        matches!(self, Self::Never)
    }

    /// Milliseconds since the epoch; `None` for [`Expiry::Never`]
    pub fn timestamp_millis(&self) -> Option<i64> {
        match self {
            Self::At(at) => Some(at.timestamp_millis()),
            Self::Never => None,
        }
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(at) => write!(f, "{}", at.to_rfc3339()),
            Self::Never => write!(f, "never"),
        }
    }
}

/// A value plus its deadline, stored as `{"value": .., "validUntil": ms | null}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    pub value: V,

    /// `None` never expires
    #[serde(
        rename = "validUntil",
        with = "chrono::serde::ts_milliseconds_option",
        default
    )]
    pub valid_until: Option<DateTime<Utc>>,
}

impl<V> CacheEntry<V> {
    /// Wrap `value` with a deadline `ttl` after `now`
    pub fn new(value: V, ttl: Ttl, now: DateTime<Utc>) -> Self {
        Self {
            value,
            valid_until: ttl.deadline_from(now),
        }
    }

    /// Valid up to and including the deadline
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_none_or(|until| now <= until)
    }

    pub fn expiry(&self) -> Expiry {
        match self.valid_until {
            Some(at) => Expiry::At(at),
            None => Expiry::Never,
        }
    }
}
