//! Aggregate reconciliation engine.
//!
//! # Responsibility
//! - Turn the change tags of one child collection into delete, insert and
//!   update calls against the persistence services.
//! - Report failures with enough context to tell how much of a save was
//!   already applied.
//!
//! # Invariants
//! - Calls are issued strictly in the order deletes, inserts, re-read,
//!   updates.
//! - Nothing already applied is rolled back; a failed save can leave the
//!   stored aggregate partially updated.

pub mod error;
pub mod reconcile;
