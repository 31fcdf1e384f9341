//! Protocol Integration Tests
//!
//! End-to-end runs of the two-worker session through the public facade:
//! role election, head reporting, sentinel handling, teardown, failures.

#[path = "../common/mod.rs"]
mod common;

mod failures;
mod properties;
mod scenarios;
