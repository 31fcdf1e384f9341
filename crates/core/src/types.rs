//! Worker identity and role types
//!
//! Both workers run the same routine and only learn which role they play
//! after racing for the role registry. The state machine each worker walks is:
//!
//! ```text
//! Unclaimed → {Producer | Observer} → Terminated
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a worker thread.
///
/// Assigned by the coordinator when the thread is spawned. Identities are
/// opaque; the only meaningful operation is equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(u64);

impl WorkerId {
    /// Create a worker identity from a raw value
    pub const fn new(raw: u64) -> Self {
        WorkerId(raw)
    }

    /// Raw identity value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role a worker plays after claiming the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Reads input lines and prepends them to the shared log
    Producer,
    /// Reports the latest entry and performs teardown
    Observer,
}

impl Role {
    /// Check if this is the producer role
    pub fn is_producer(&self) -> bool {
        matches!(self, Role::Producer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Producer => write!(f, "producer"),
            Role::Observer => write!(f, "observer"),
        }
    }
}

/// Per-worker state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Spawned, role not yet claimed
    #[default]
    Unclaimed,
    /// Running the producer loop
    Producer,
    /// Running the observer loop
    Observer,
    /// Loop finished; the worker is about to exit
    Terminated,
}

impl WorkerState {
    /// State a worker enters after claiming `role`
    pub fn claimed(role: Role) -> Self {
        match role {
            Role::Producer => WorkerState::Producer,
            Role::Observer => WorkerState::Observer,
        }
    }

    /// Check if `next` is a legal successor of this state
    ///
    /// Only `Unclaimed → Producer | Observer` and
    /// `Producer | Observer → Terminated` are allowed.
    pub fn can_advance_to(&self, next: WorkerState) -> bool {
        matches!(
            (self, next),
            (
                WorkerState::Unclaimed,
                WorkerState::Producer | WorkerState::Observer
            ) | (
                WorkerState::Producer | WorkerState::Observer,
                WorkerState::Terminated
            )
        )
    }

    /// Check if the worker reached the final state
    pub fn is_terminated(&self) -> bool {
        matches!(self, WorkerState::Terminated)
    }

    /// Role implied by this state, if one has been claimed and is still active
    pub fn role(&self) -> Option<Role> {
        match self {
            WorkerState::Producer => Some(Role::Producer),
            WorkerState::Observer => Some(Role::Observer),
            WorkerState::Unclaimed | WorkerState::Terminated => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_id_roundtrip() {
        let id = WorkerId::new(7);
        assert_eq!(id.as_u64(), 7);
        assert_eq!(id.to_string(), "7");
        assert_ne!(id, WorkerId::new(8));
    }

    #[test]
    fn test_state_transitions() {
        let state = WorkerState::default();
        assert_eq!(state, WorkerState::Unclaimed);
        assert_eq!(state.role(), None);

        let producer = WorkerState::claimed(Role::Producer);
        assert_eq!(producer.role(), Some(Role::Producer));
        assert!(!producer.is_terminated());

        let observer = WorkerState::claimed(Role::Observer);
        assert_eq!(observer.role(), Some(Role::Observer));

        assert!(WorkerState::Terminated.is_terminated());
        assert_eq!(WorkerState::Terminated.role(), None);
    }

    #[test]
    fn test_legal_transitions() {
        use WorkerState::*;
        assert!(Unclaimed.can_advance_to(Producer));
        assert!(Unclaimed.can_advance_to(Observer));
        assert!(Producer.can_advance_to(Terminated));
        assert!(Observer.can_advance_to(Terminated));

        assert!(!Unclaimed.can_advance_to(Terminated));
        assert!(!Producer.can_advance_to(Observer));
        assert!(!Observer.can_advance_to(Producer));
        assert!(!Terminated.can_advance_to(Producer));
        assert!(!Terminated.can_advance_to(Terminated));
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Producer.to_string(), "producer");
        assert_eq!(Role::Observer.to_string(), "observer");
        assert!(Role::Producer.is_producer());
        assert!(!Role::Observer.is_producer());
    }
}
