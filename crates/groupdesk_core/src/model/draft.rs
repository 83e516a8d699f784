//! In-memory working copy of one music group being edited.
//!
//! # Responsibility
//! - Hold the editable root fields, both child collections and the
//!   "new row" inputs of the edit surface.
//! - Implement the per-row staging operations (insert/edit/delete). Staging
//!   never touches storage.
//!
//! # Invariants
//! - Rows are constructed either as loaded (`Unchanged`, persisted id) or as
//!   staged (`Inserted`, temporary id).
//! - A failed staging operation leaves every other row untouched.

use crate::model::change::ChangeTag;
use crate::model::group::{Album, Artist, Genre, MusicGroup};
use crate::model::ids::{GroupId, RowId, TempId};
use crate::validation::{
    validate_partial, AlbumField, ArtistField, FieldPath, RowSlot, ValidationReport,
    ValidationRules,
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use uuid::Uuid;

/// The two child collections owned by a music group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildCollection {
    Albums,
    Artists,
}

impl ChildCollection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Albums => "albums",
            Self::Artists => "artists",
        }
    }
}

impl Display for ChildCollection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editable scalar fields of an album row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumFields {
    pub name: String,
    pub release_year: i32,
    pub copies_sold: i64,
}

/// Editable scalar fields of an artist row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistFields {
    pub first_name: String,
    pub last_name: String,
    pub birth_day: Option<String>,
}

/// One row of a child collection inside an edit session.
///
/// `current` holds the values that will be saved, `pending` the values of an
/// in-place edit that has not been committed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditableRecord<F> {
    id: RowId,
    tag: ChangeTag,
    current: F,
    pub pending: F,
}

impl<F: Clone> EditableRecord<F> {
    /// Wraps a row read from storage.
    pub fn loaded(id: Uuid, fields: F) -> Self {
        Self {
            id: RowId::Persisted(id),
            tag: ChangeTag::Unchanged,
            pending: fields.clone(),
            current: fields,
        }
    }

    /// Stages a brand-new row under a fresh temporary id.
    pub fn mark_inserted(fields: F) -> Self {
        Self {
            id: RowId::Temporary(TempId::generate()),
            tag: ChangeTag::Inserted,
            pending: fields.clone(),
            current: fields,
        }
    }

    /// Stages the row for deletion. Idempotent.
    pub fn mark_deleted(&mut self) {
        self.tag = self.tag.after_delete();
    }

    /// Commits `pending` onto `current` and updates the tag.
    pub fn mark_modified_if_needed(&mut self) {
        self.tag = self.tag.after_edit();
        self.current = self.pending.clone();
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn tag(&self) -> ChangeTag {
        self.tag
    }

    pub fn current(&self) -> &F {
        &self.current
    }

    /// Replaces the temporary id once storage has created the row; the row
    /// now matches storage and is `Unchanged`.
    pub(crate) fn assign_persisted_id(&mut self, id: Uuid) {
        self.id = RowId::Persisted(id);
        self.tag = ChangeTag::Unchanged;
    }
}

/// Glue between one child collection and the generic edit/reconcile logic.
pub trait ChildFields: Clone + Default + PartialEq + Debug {
    /// Persisted record type returned by storage.
    type Record: Clone + Debug;
    /// Addressable field of this row kind.
    type Field: Copy + Eq + Debug + 'static;

    const COLLECTION: ChildCollection;

    /// Every field, in form order.
    const FIELDS: &'static [Self::Field];

    fn from_record(record: &Self::Record) -> Self;
    fn record_id(record: &Self::Record) -> Uuid;
    /// Writes these fields onto a freshly read record.
    fn overlay(&self, record: &mut Self::Record);
    fn children(group: &MusicGroup) -> &[Self::Record];

    fn rows(draft: &GroupDraft) -> &[EditableRecord<Self>];
    fn rows_mut(draft: &mut GroupDraft) -> &mut Vec<EditableRecord<Self>>;
    fn new_row_mut(draft: &mut GroupDraft) -> &mut Self;

    fn path(slot: RowSlot, field: Self::Field) -> FieldPath;

    /// Paths validated when the "new row" input is submitted.
    fn insert_paths() -> Vec<FieldPath> {
        Self::FIELDS
            .iter()
            .map(|field| Self::path(RowSlot::New, *field))
            .collect()
    }

    /// Paths validated when the row at `index` commits an in-place edit.
    fn edit_paths(index: usize) -> Vec<FieldPath> {
        Self::FIELDS
            .iter()
            .map(|field| Self::path(RowSlot::Pending(index), *field))
            .collect()
    }
}

impl ChildFields for AlbumFields {
    type Record = Album;
    type Field = AlbumField;

    const COLLECTION: ChildCollection = ChildCollection::Albums;
    const FIELDS: &'static [AlbumField] = &[AlbumField::Name, AlbumField::ReleaseYear];

    fn from_record(record: &Album) -> Self {
        Self {
            name: record.name.clone(),
            release_year: record.release_year,
            copies_sold: record.copies_sold,
        }
    }

    fn record_id(record: &Album) -> Uuid {
        record.album_id
    }

    fn overlay(&self, record: &mut Album) {
        record.name = self.name.clone();
        record.release_year = self.release_year;
        record.copies_sold = self.copies_sold;
    }

    fn children(group: &MusicGroup) -> &[Album] {
        &group.albums
    }

    fn rows(draft: &GroupDraft) -> &[EditableRecord<Self>] {
        &draft.albums
    }

    fn rows_mut(draft: &mut GroupDraft) -> &mut Vec<EditableRecord<Self>> {
        &mut draft.albums
    }

    fn new_row_mut(draft: &mut GroupDraft) -> &mut Self {
        &mut draft.new_album
    }

    fn path(slot: RowSlot, field: AlbumField) -> FieldPath {
        FieldPath::Album(slot, field)
    }
}

impl ChildFields for ArtistFields {
    type Record = Artist;
    type Field = ArtistField;

    const COLLECTION: ChildCollection = ChildCollection::Artists;
    const FIELDS: &'static [ArtistField] = &[ArtistField::FirstName, ArtistField::LastName];

    fn from_record(record: &Artist) -> Self {
        Self {
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            birth_day: record.birth_day.clone(),
        }
    }

    fn record_id(record: &Artist) -> Uuid {
        record.artist_id
    }

    fn overlay(&self, record: &mut Artist) {
        record.first_name = self.first_name.clone();
        record.last_name = self.last_name.clone();
        record.birth_day = self.birth_day.clone();
    }

    fn children(group: &MusicGroup) -> &[Artist] {
        &group.artists
    }

    fn rows(draft: &GroupDraft) -> &[EditableRecord<Self>] {
        &draft.artists
    }

    fn rows_mut(draft: &mut GroupDraft) -> &mut Vec<EditableRecord<Self>> {
        &mut draft.artists
    }

    fn new_row_mut(draft: &mut GroupDraft) -> &mut Self {
        &mut draft.new_artist
    }

    fn path(slot: RowSlot, field: ArtistField) -> FieldPath {
        FieldPath::Artist(slot, field)
    }
}

/// Errors from in-memory staging operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// The submitted fields failed validation; nothing was staged.
    Validation(ValidationReport),
    /// The addressed row is not part of this draft.
    UnknownRow {
        collection: ChildCollection,
        row: RowId,
    },
}

impl Display for StageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(report) => write!(f, "{report}"),
            Self::UnknownRow { collection, row } => {
                write!(f, "no row {row} in {collection}")
            }
        }
    }
}

impl Error for StageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(report) => Some(report),
            Self::UnknownRow { .. } => None,
        }
    }
}

/// Working copy of one music group and its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDraft {
    tag: ChangeTag,
    group_id: Option<GroupId>,
    pub name: String,
    pub established_year: i32,
    /// `None` until the user picks one; required on save.
    pub genre: Option<Genre>,
    albums: Vec<EditableRecord<AlbumFields>>,
    artists: Vec<EditableRecord<ArtistFields>>,
    /// Input row for the next album to stage.
    pub new_album: AlbumFields,
    /// Input row for the next artist to stage.
    pub new_artist: ArtistFields,
}

impl GroupDraft {
    /// Empty draft for a group that does not exist yet.
    pub fn new_group() -> Self {
        Self {
            tag: ChangeTag::Inserted,
            group_id: None,
            name: String::new(),
            established_year: 0,
            genre: None,
            albums: Vec::new(),
            artists: Vec::new(),
            new_album: AlbumFields::default(),
            new_artist: ArtistFields::default(),
        }
    }

    /// Draft mirroring a persisted group; every row starts `Unchanged`.
    pub fn from_group(group: &MusicGroup) -> Self {
        Self {
            tag: ChangeTag::Unchanged,
            group_id: Some(group.group_id),
            name: group.name.clone(),
            established_year: group.established_year,
            genre: Some(group.genre),
            albums: loaded_rows::<AlbumFields>(group),
            artists: loaded_rows::<ArtistFields>(group),
            new_album: AlbumFields::default(),
            new_artist: ArtistFields::default(),
        }
    }

    pub fn tag(&self) -> ChangeTag {
        self.tag
    }

    pub fn is_new(&self) -> bool {
        self.tag == ChangeTag::Inserted
    }

    pub fn group_id(&self) -> Option<GroupId> {
        self.group_id
    }

    pub fn albums(&self) -> &[EditableRecord<AlbumFields>] {
        &self.albums
    }

    pub fn artists(&self) -> &[EditableRecord<ArtistFields>] {
        &self.artists
    }

    /// Rows of one collection.
    pub fn rows<F: ChildFields>(&self) -> &[EditableRecord<F>] {
        F::rows(self)
    }

    /// Rows still shown on the edit surface (everything but `Deleted`).
    pub fn visible_rows<'a, F: ChildFields + 'a>(
        &'a self,
    ) -> impl Iterator<Item = &'a EditableRecord<F>> {
        F::rows(self).iter().filter(|row| row.tag().is_visible())
    }

    /// Position of a row inside its collection.
    pub fn row_index<F: ChildFields>(&self, row: RowId) -> Option<usize> {
        F::rows(self).iter().position(|item| item.id() == row)
    }

    /// Validates the "new row" input and stages it as an inserted row.
    ///
    /// On success the input row is cleared and the temporary id of the
    /// staged row is returned.
    pub fn stage_insert_child<F: ChildFields>(
        &mut self,
        rules: &ValidationRules,
    ) -> Result<RowId, StageError> {
        let report = validate_partial(self, &F::insert_paths(), rules);
        if !report.is_ok() {
            return Err(StageError::Validation(report));
        }

        let fields = std::mem::take(F::new_row_mut(self));
        let row = EditableRecord::mark_inserted(fields);
        let id = row.id();
        F::rows_mut(self).push(row);
        Ok(id)
    }

    /// Stages one row for deletion.
    pub fn stage_delete_child<F: ChildFields>(&mut self, row: RowId) -> Result<(), StageError> {
        let index = self.require_row::<F>(row)?;
        F::rows_mut(self)[index].mark_deleted();
        Ok(())
    }

    /// Commits an in-place edit of one row.
    ///
    /// `edited` is kept as the row's pending values even when validation
    /// fails, so the edit surface can re-display what the user typed.
    pub fn stage_edit_child<F: ChildFields>(
        &mut self,
        row: RowId,
        edited: F,
        rules: &ValidationRules,
    ) -> Result<(), StageError> {
        let index = self.require_row::<F>(row)?;
        F::rows_mut(self)[index].pending = edited;

        let report = validate_partial(self, &F::edit_paths(index), rules);
        if !report.is_ok() {
            return Err(StageError::Validation(report));
        }

        F::rows_mut(self)[index].mark_modified_if_needed();
        Ok(())
    }

    /// Records the storage id of a newly created group.
    pub(crate) fn assign_group_id(&mut self, group_id: GroupId) {
        self.group_id = Some(group_id);
        self.tag = ChangeTag::Unchanged;
    }

    fn require_row<F: ChildFields>(&self, row: RowId) -> Result<usize, StageError> {
        self.row_index::<F>(row).ok_or(StageError::UnknownRow {
            collection: F::COLLECTION,
            row,
        })
    }
}

fn loaded_rows<F: ChildFields>(group: &MusicGroup) -> Vec<EditableRecord<F>> {
    F::children(group)
        .iter()
        .map(|record| EditableRecord::loaded(F::record_id(record), F::from_record(record)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{AlbumFields, ArtistFields, EditableRecord, GroupDraft, StageError};
    use crate::model::change::ChangeTag;
    use crate::model::group::{Album, Genre, MusicGroup};
    use crate::model::ids::RowId;
    use crate::validation::ValidationRules;
    use uuid::Uuid;

    fn album(name: &str, year: i32) -> AlbumFields {
        AlbumFields {
            name: name.to_string(),
            release_year: year,
            copies_sold: 0,
        }
    }

    fn persisted_group() -> MusicGroup {
        let group_id = Uuid::new_v4();
        MusicGroup {
            group_id,
            name: "The Quiet".to_string(),
            established_year: 1990,
            genre: Genre::Rock,
            seeded: false,
            albums: vec![Album {
                album_id: Uuid::new_v4(),
                music_group_id: group_id,
                name: "First Light".to_string(),
                release_year: 1992,
                copies_sold: 1000,
                seeded: false,
            }],
            artists: Vec::new(),
        }
    }

    #[test]
    fn mark_inserted_assigns_temporary_id() {
        let row = EditableRecord::mark_inserted(album("New", 2000));
        assert_eq!(row.tag(), ChangeTag::Inserted);
        assert!(row.id().is_temporary());
    }

    #[test]
    fn mark_modified_if_needed_applies_pending_fields() {
        let mut row = EditableRecord::loaded(Uuid::new_v4(), album("Old", 2000));
        row.pending.name = "Renamed".to_string();
        row.mark_modified_if_needed();
        assert_eq!(row.tag(), ChangeTag::Modified);
        assert_eq!(row.current().name, "Renamed");
    }

    #[test]
    fn editing_inserted_row_keeps_it_inserted() {
        let mut row = EditableRecord::mark_inserted(album("New", 2000));
        row.pending.release_year = 2001;
        row.mark_modified_if_needed();
        assert_eq!(row.tag(), ChangeTag::Inserted);
        assert_eq!(row.current().release_year, 2001);
    }

    #[test]
    fn deleted_row_stays_deleted_after_edit() {
        let mut row = EditableRecord::loaded(Uuid::new_v4(), album("Old", 2000));
        row.mark_deleted();
        row.mark_deleted();
        row.mark_modified_if_needed();
        assert_eq!(row.tag(), ChangeTag::Deleted);
    }

    #[test]
    fn stage_insert_rejects_invalid_new_row_and_keeps_other_rows() {
        let rules = ValidationRules::default();
        let mut draft = GroupDraft::from_group(&persisted_group());
        let existing = draft.albums()[0].id();
        draft.stage_delete_child::<AlbumFields>(existing).unwrap();

        draft.new_album = album("", 1800);
        let err = draft
            .stage_insert_child::<AlbumFields>(&rules)
            .unwrap_err();
        match err {
            StageError::Validation(report) => assert_eq!(report.errors().len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(draft.albums().len(), 1);
        assert_eq!(draft.albums()[0].tag(), ChangeTag::Deleted);
    }

    #[test]
    fn stage_insert_clears_input_row() {
        let rules = ValidationRules::default();
        let mut draft = GroupDraft::from_group(&persisted_group());
        draft.new_album = album("Second Wind", 1995);

        let id = draft.stage_insert_child::<AlbumFields>(&rules).unwrap();
        assert!(id.is_temporary());
        assert_eq!(draft.new_album, AlbumFields::default());
        assert_eq!(draft.albums().len(), 2);
        assert_eq!(draft.albums()[1].current().name, "Second Wind");
    }

    #[test]
    fn stage_edit_validates_only_the_addressed_row() {
        let rules = ValidationRules::default();
        let mut draft = GroupDraft::from_group(&persisted_group());
        draft.name = String::new();
        let row = draft.albums()[0].id();

        draft
            .stage_edit_child(row, album("Reissue", 1993), &rules)
            .unwrap();
        assert_eq!(draft.albums()[0].tag(), ChangeTag::Modified);
        assert_eq!(draft.albums()[0].current().name, "Reissue");
    }

    #[test]
    fn stage_edit_failure_keeps_pending_values_and_tag() {
        let rules = ValidationRules::default();
        let mut draft = GroupDraft::from_group(&persisted_group());
        let row = draft.albums()[0].id();

        let err = draft
            .stage_edit_child(row, album("", 1993), &rules)
            .unwrap_err();
        assert!(matches!(err, StageError::Validation(_)));
        assert_eq!(draft.albums()[0].tag(), ChangeTag::Unchanged);
        assert_eq!(draft.albums()[0].pending.name, "");
        assert_eq!(draft.albums()[0].current().name, "First Light");
    }

    #[test]
    fn staging_unknown_row_is_rejected() {
        let mut draft = GroupDraft::new_group();
        let missing = RowId::Persisted(Uuid::new_v4());
        let err = draft
            .stage_delete_child::<ArtistFields>(missing)
            .unwrap_err();
        assert!(matches!(err, StageError::UnknownRow { row, .. } if row == missing));
    }

    #[test]
    fn visible_rows_hide_deleted_rows() {
        let mut draft = GroupDraft::from_group(&persisted_group());
        let row = draft.albums()[0].id();
        draft.stage_delete_child::<AlbumFields>(row).unwrap();
        assert_eq!(draft.visible_rows::<AlbumFields>().count(), 0);
    }
}
