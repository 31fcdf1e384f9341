//! Role registry
//!
//! A single-assignment slot recording which worker is the producer. The
//! emptiness check and the write happen under one lock, so two workers can
//! never both observe "unclaimed" and both become producer.
//!
//! ## Lifecycle
//!
//! ```text
//! Vacant --claim_role--> Claimed(producer) --retire--> Retired(producer)
//! ```
//!
//! Once claimed the producer identity never changes. `retire` is the
//! teardown step and may happen exactly once.

use duolog_core::{Error, Result, Role, WorkerId};
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Vacant,
    Claimed(WorkerId),
    Retired(WorkerId),
}

/// Outcome of a role claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleClaim {
    role: Role,
    producer: WorkerId,
    allocated: bool,
}

impl RoleClaim {
    /// Role assigned to the caller
    pub fn role(&self) -> Role {
        self.role
    }

    /// Identity recorded as producer
    pub fn producer(&self) -> WorkerId {
        self.producer
    }

    /// True only for the call that filled the empty slot
    ///
    /// Exactly one claim per registry reports `true`; that caller emits the
    /// allocate event.
    pub fn allocated(&self) -> bool {
        self.allocated
    }
}

/// Single-assignment producer slot.
#[derive(Debug)]
pub struct RoleRegistry {
    slot: Mutex<SlotState>,
}

impl RoleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        RoleRegistry {
            slot: Mutex::new(SlotState::Vacant),
        }
    }

    /// Claim a role for `me`
    ///
    /// The first caller becomes `Producer`; every other identity gets
    /// `Observer`. A repeated claim by the producer returns `Producer` again
    /// without re-allocating.
    pub fn claim_role(&self, me: WorkerId) -> RoleClaim {
        let mut slot = self.slot.lock();
        match *slot {
            SlotState::Vacant => {
                *slot = SlotState::Claimed(me);
                tracing::debug!(worker = %me, "claimed producer role");
                RoleClaim {
                    role: Role::Producer,
                    producer: me,
                    allocated: true,
                }
            }
            SlotState::Claimed(producer) | SlotState::Retired(producer) => RoleClaim {
                role: if producer == me {
                    Role::Producer
                } else {
                    Role::Observer
                },
                producer,
                allocated: false,
            },
        }
    }

    /// Identity of the producer, if claimed
    pub fn producer(&self) -> Option<WorkerId> {
        match *self.slot.lock() {
            SlotState::Vacant => None,
            SlotState::Claimed(p) | SlotState::Retired(p) => Some(p),
        }
    }

    /// Check if the registry has been retired
    pub fn is_retired(&self) -> bool {
        matches!(*self.slot.lock(), SlotState::Retired(_))
    }

    /// Release the registry at teardown
    ///
    /// Only a non-producer may retire the registry, and only once.
    /// Returns the producer identity that was recorded.
    pub fn retire(&self, by: WorkerId) -> Result<WorkerId> {
        let mut slot = self.slot.lock();
        match *slot {
            SlotState::Vacant => Err(Error::ProtocolViolation(
                "role registry retired before any role was claimed".to_string(),
            )),
            SlotState::Retired(_) => Err(Error::ProtocolViolation(
                "role registry retired twice".to_string(),
            )),
            SlotState::Claimed(producer) if producer == by => Err(Error::ProtocolViolation(
                format!("producer {} cannot retire the role registry", by),
            )),
            SlotState::Claimed(producer) => {
                *slot = SlotState::Retired(producer);
                tracing::debug!(worker = %by, producer = %producer, "role registry retired");
                Ok(producer)
            }
        }
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
