//! Domain model for music groups and their editable working copy.
//!
//! # Responsibility
//! - Define persisted read models (`MusicGroup`, `Album`, `Artist`).
//! - Define the in-memory edit session shape (`GroupDraft`) and the change
//!   tags that drive reconciliation.
//!
//! # Invariants
//! - Persistent identifiers are assigned by storage, never by the client.
//! - Temporary row identifiers are a distinct type and cannot reach a
//!   creation payload.

pub mod change;
pub mod draft;
pub mod group;
pub mod ids;
