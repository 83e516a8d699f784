//! Identifier types for groups and child rows.
//!
//! # Invariants
//! - `GroupId`, `AlbumId` and `ArtistId` are storage-assigned.
//! - `TempId` only lives inside an edit session; creation payloads carry no
//!   identifier field, so a `TempId` can never be persisted.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Storage-assigned music group identifier.
pub type GroupId = Uuid;

/// Storage-assigned album identifier.
pub type AlbumId = Uuid;

/// Storage-assigned artist identifier.
pub type ArtistId = Uuid;

/// Client-side identifier for a row that has not been persisted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempId(Uuid);

impl TempId {
    /// Generates a fresh temporary identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Display for TempId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "tmp-{}", self.0)
    }
}

/// Identifier the edit surface uses to address one child row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "id", rename_all = "snake_case")]
pub enum RowId {
    /// Row staged in this session, not yet known to storage.
    Temporary(TempId),
    /// Row loaded from (or written to) storage.
    Persisted(Uuid),
}

impl RowId {
    /// Returns the storage identifier, if this row is persisted.
    pub fn persisted(&self) -> Option<Uuid> {
        match self {
            Self::Temporary(_) => None,
            Self::Persisted(id) => Some(*id),
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }
}

impl Display for RowId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Temporary(id) => write!(f, "{id}"),
            Self::Persisted(id) => write!(f, "{id}"),
        }
    }
}

impl From<TempId> for RowId {
    fn from(value: TempId) -> Self {
        Self::Temporary(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{RowId, TempId};
    use uuid::Uuid;

    #[test]
    fn temporary_and_persisted_ids_never_compare_equal() {
        let raw = Uuid::new_v4();
        let temp = TempId(raw);
        assert_ne!(RowId::Temporary(temp), RowId::Persisted(raw));
        assert_eq!(RowId::Temporary(temp).persisted(), None);
        assert_eq!(RowId::Persisted(raw).persisted(), Some(raw));
    }

    #[test]
    fn temp_id_display_is_prefixed() {
        let temp = TempId::generate();
        assert!(temp.to_string().starts_with("tmp-"));
    }
}
