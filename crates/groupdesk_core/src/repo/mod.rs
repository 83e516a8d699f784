//! Persistence services for the music group aggregate.
//!
//! # Responsibility
//! - Define the coarse create/read/update/delete contracts consumed by the
//!   save engine, one per entity kind.
//! - Keep SQL details inside the SQLite implementations.
//!
//! # Invariants
//! - Creation payloads carry no identifier; storage assigns it.
//! - Deleting an absent row succeeds.
//! - Updating an absent row fails with `RepoError::NotFound`.

pub mod admin_repo;
pub mod album_repo;
pub mod artist_repo;
pub mod common;
pub mod group_repo;
