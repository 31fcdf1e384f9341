//! Concurrency layer for duolog
//!
//! This crate implements the three shared resources of the producer/observer
//! protocol, each guarded by its own lock:
//! - RoleRegistry: single-assignment producer slot (first writer wins)
//! - TerminationLatch: one-way "producer is done" signal
//! - LogStore: most-recent-first stack of immutable entries with one-shot teardown

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod latch;
pub mod registry;
pub mod store;

pub use latch::{Completion, TerminationLatch};
pub use registry::{RoleClaim, RoleRegistry};
pub use store::{EntryHandle, LogStore, Observation, StoreWriter, Teardown};
