//! Change tags for rows of an edit session.
//!
//! # Invariants
//! - Rows only enter a session as `Unchanged` (loaded) or `Inserted` (staged),
//!   so there is no "unknown" tag to delete from.
//! - `Deleted` is absorbing: no transition leaves it.
//! - Editing an `Inserted` row keeps it `Inserted`.

use serde::{Deserialize, Serialize};

/// Lifecycle marker that decides what reconciliation does with a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTag {
    /// Loaded from storage and untouched.
    Unchanged,
    /// Staged in this session; storage has never seen it.
    Inserted,
    /// Loaded from storage and edited.
    Modified,
    /// Staged for removal.
    Deleted,
}

impl ChangeTag {
    /// Tag after an in-place edit has been committed.
    pub fn after_edit(self) -> Self {
        match self {
            Self::Inserted => Self::Inserted,
            Self::Deleted => Self::Deleted,
            Self::Unchanged | Self::Modified => Self::Modified,
        }
    }

    /// Tag after the row has been staged for deletion.
    pub fn after_delete(self) -> Self {
        Self::Deleted
    }

    /// Whether the row should still be shown on the edit surface.
    pub fn is_visible(self) -> bool {
        self != Self::Deleted
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Inserted => "inserted",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ChangeTag;

    const ALL: [ChangeTag; 4] = [
        ChangeTag::Unchanged,
        ChangeTag::Inserted,
        ChangeTag::Modified,
        ChangeTag::Deleted,
    ];

    #[test]
    fn deleted_is_absorbing() {
        let tag = ChangeTag::Deleted;
        assert_eq!(tag.after_edit(), ChangeTag::Deleted);
        assert_eq!(tag.after_delete(), ChangeTag::Deleted);
        assert_eq!(tag.after_edit().after_edit(), ChangeTag::Deleted);
    }

    #[test]
    fn inserted_never_becomes_modified() {
        assert_eq!(ChangeTag::Inserted.after_edit(), ChangeTag::Inserted);
        assert_eq!(
            ChangeTag::Inserted.after_edit().after_edit(),
            ChangeTag::Inserted
        );
    }

    #[test]
    fn edit_marks_persisted_rows_modified() {
        assert_eq!(ChangeTag::Unchanged.after_edit(), ChangeTag::Modified);
        assert_eq!(ChangeTag::Modified.after_edit(), ChangeTag::Modified);
    }

    #[test]
    fn delete_applies_from_every_tag() {
        for tag in ALL {
            assert_eq!(tag.after_delete(), ChangeTag::Deleted);
        }
    }
}
