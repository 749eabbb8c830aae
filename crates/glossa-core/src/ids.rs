//! Typed identifiers and the monotone id manager.
//!
//! Every id is a `u64` newtype with a reserved `UNDEFINED` sentinel (zero)
//! and a `MINIMUM` first valid value. Ids are never reused within a process.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Common surface of the `u64`-backed id newtypes.
pub trait TypedId: Copy + Eq {
    /// Wrap a raw value.
    fn from_raw(raw: u64) -> Self;

    /// Unwrap to the raw value.
    fn raw(self) -> u64;
}

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Reserved "not assigned" sentinel.
            pub const UNDEFINED: Self = Self(0);
            /// First valid id value.
            pub const MINIMUM: Self = Self(1);

            /// Whether the id holds a valid (assigned) value.
            #[must_use]
            pub fn is_defined(self) -> bool {
                self != Self::UNDEFINED
            }
        }

        impl TypedId for $name {
            fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype! {
    /// One client connection as tracked by a session registry.
    ///
    /// A session carries many jobs; the id is unique within one process.
    SessionId
}

id_newtype! {
    /// A translation job id.
    ///
    /// Clients assign their own job ids (unique within a session); the
    /// balancer re-issues jobs under ids drawn from its own process-wide
    /// manager so that translator responses can be correlated.
    JobId
}

id_newtype! {
    /// Stable handle for one translation-server adapter on the balancer.
    ServerUid
}

id_newtype! {
    /// Stable integer for one vocabulary word of the language model.
    WordUid
}

impl WordUid {
    /// Uid of the out-of-vocabulary word.
    pub const UNKNOWN: Self = Self(1);
    /// First uid available to real vocabulary entries.
    pub const MIN_VALID: Self = Self(2);
}

/// Monotone issuer of typed ids.
///
/// Backed by an atomic counter; ids are handed out strictly increasing and
/// are never reused for the lifetime of the process.
#[derive(Debug)]
pub struct IdManager<T: TypedId> {
    next: AtomicU64,
    _id: PhantomData<T>,
}

impl<T: TypedId> IdManager<T> {
    /// Create a manager whose first issued id is `first`.
    #[must_use]
    pub fn new(first: T) -> Self {
        Self {
            next: AtomicU64::new(first.raw()),
            _id: PhantomData,
        }
    }

    /// Issue the next id.
    pub fn next_id(&self) -> T {
        T::from_raw(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_minimum_and_increase() {
        let mgr = IdManager::new(SessionId::MINIMUM);
        assert_eq!(mgr.next_id(), SessionId(1));
        assert_eq!(mgr.next_id(), SessionId(2));
        assert_eq!(mgr.next_id(), SessionId(3));
    }

    #[test]
    fn undefined_is_never_issued() {
        let mgr = IdManager::new(JobId::MINIMUM);
        for _ in 0..100 {
            assert!(mgr.next_id().is_defined());
        }
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = ServerUid(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
        let back: ServerUid = serde_json::from_str("7").unwrap();
        assert_eq!(back, id);
    }
}
