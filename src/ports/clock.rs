//! Time source port.

use std::fmt;

use crate::domain::foundation::Timestamp;

/// Source of the current time.
///
/// Injected wherever expiry or period bounds are computed, so tests can
/// move time deterministically.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Timestamp;
}
