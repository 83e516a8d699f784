//! Partial validation of a group draft.
//!
//! # Responsibility
//! - Validate only the fields named by the caller, so one sub-action (stage
//!   a row, edit a row, save the group) is never blocked by unrelated input.
//! - Address list elements through typed paths instead of strings.
//!
//! # Invariants
//! - Fields not named in the request are never reported.
//! - Each named path is reported at most once.

use crate::model::draft::{AlbumFields, ArtistFields, GroupDraft};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_MIN_YEAR: i32 = 1900;
const DEFAULT_MAX_YEAR: i32 = 2024;

/// Root-level group field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupField {
    Name,
    EstablishedYear,
    Genre,
}

/// Validated album field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlbumField {
    Name,
    ReleaseYear,
}

/// Validated artist field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtistField {
    FirstName,
    LastName,
}

/// Which copy of a row's fields a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowSlot {
    /// The "add new row" input.
    New,
    /// Committed values of the row at this index.
    Current(usize),
    /// In-place edit values of the row at this index.
    Pending(usize),
}

/// Typed address of one validated field in a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPath {
    Group(GroupField),
    Album(RowSlot, AlbumField),
    Artist(RowSlot, ArtistField),
}

impl FieldPath {
    /// Fields checked before a whole-group save.
    pub fn group_save() -> Vec<Self> {
        vec![
            Self::Group(GroupField::Name),
            Self::Group(GroupField::EstablishedYear),
            Self::Group(GroupField::Genre),
        ]
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Group(field) => {
                let name = match field {
                    GroupField::Name => "name",
                    GroupField::EstablishedYear => "established_year",
                    GroupField::Genre => "genre",
                };
                write!(f, "group.{name}")
            }
            Self::Album(slot, field) => {
                let name = match field {
                    AlbumField::Name => "name",
                    AlbumField::ReleaseYear => "release_year",
                };
                write_row_path(f, "album", *slot, name)
            }
            Self::Artist(slot, field) => {
                let name = match field {
                    ArtistField::FirstName => "first_name",
                    ArtistField::LastName => "last_name",
                };
                write_row_path(f, "artist", *slot, name)
            }
        }
    }
}

fn write_row_path(
    f: &mut Formatter<'_>,
    collection: &str,
    slot: RowSlot,
    field: &str,
) -> std::fmt::Result {
    match slot {
        RowSlot::New => write!(f, "new_{collection}.{field}"),
        RowSlot::Current(index) => write!(f, "{collection}s[{index}].{field}"),
        RowSlot::Pending(index) => write!(f, "{collection}s[{index}].pending.{field}"),
    }
}

/// Range rules shared by every year-valued field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    pub min_year: i32,
    pub max_year: i32,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_year: DEFAULT_MIN_YEAR,
            max_year: DEFAULT_MAX_YEAR,
        }
    }
}

impl ValidationRules {
    fn year_message(&self) -> String {
        format!(
            "You must provide a year between {} and {}",
            self.min_year, self.max_year
        )
    }

    fn year_in_range(&self, year: i32) -> bool {
        (self.min_year..=self.max_year).contains(&year)
    }
}

/// One failed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub path: FieldPath,
    pub message: String,
}

/// Outcome of a partial validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Messages reported for one path.
    pub fn messages_for(&self, path: FieldPath) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|error| error.path == path)
            .map(|error| error.message.as_str())
            .collect()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed")?;
        for (idx, error) in self.errors.iter().enumerate() {
            let sep = if idx == 0 { ": " } else { "; " };
            write!(f, "{sep}{}: {}", error.path, error.message)?;
        }
        Ok(())
    }
}

impl Error for ValidationReport {}

/// Validates only `paths` on `draft`.
pub fn validate_partial(
    draft: &GroupDraft,
    paths: &[FieldPath],
    rules: &ValidationRules,
) -> ValidationReport {
    let mut seen = HashSet::new();
    let mut errors = Vec::new();

    for path in paths {
        if !seen.insert(*path) {
            continue;
        }
        if let Some(message) = check_path(draft, *path, rules) {
            errors.push(FieldError {
                path: *path,
                message,
            });
        }
    }

    ValidationReport { errors }
}

fn check_path(draft: &GroupDraft, path: FieldPath, rules: &ValidationRules) -> Option<String> {
    match path {
        FieldPath::Group(GroupField::Name) => {
            required(&draft.name, "You must provide a group name")
        }
        FieldPath::Group(GroupField::EstablishedYear) => {
            (!rules.year_in_range(draft.established_year)).then(|| rules.year_message())
        }
        FieldPath::Group(GroupField::Genre) => draft
            .genre
            .is_none()
            .then(|| "You must select a music genre".to_string()),
        FieldPath::Album(slot, field) => match album_slot(draft, slot) {
            Some(fields) => check_album(fields, field, rules),
            None => Some(missing_row(slot)),
        },
        FieldPath::Artist(slot, field) => match artist_slot(draft, slot) {
            Some(fields) => check_artist(fields, field),
            None => Some(missing_row(slot)),
        },
    }
}

fn check_album(fields: &AlbumFields, field: AlbumField, rules: &ValidationRules) -> Option<String> {
    match field {
        AlbumField::Name => required(&fields.name, "You must enter an album name"),
        AlbumField::ReleaseYear => {
            (!rules.year_in_range(fields.release_year)).then(|| rules.year_message())
        }
    }
}

fn check_artist(fields: &ArtistFields, field: ArtistField) -> Option<String> {
    match field {
        ArtistField::FirstName => required(&fields.first_name, "You must provide a first name"),
        ArtistField::LastName => required(&fields.last_name, "You must provide a last name"),
    }
}

fn album_slot(draft: &GroupDraft, slot: RowSlot) -> Option<&AlbumFields> {
    match slot {
        RowSlot::New => Some(&draft.new_album),
        RowSlot::Current(index) => draft.albums().get(index).map(|row| row.current()),
        RowSlot::Pending(index) => draft.albums().get(index).map(|row| &row.pending),
    }
}

fn artist_slot(draft: &GroupDraft, slot: RowSlot) -> Option<&ArtistFields> {
    match slot {
        RowSlot::New => Some(&draft.new_artist),
        RowSlot::Current(index) => draft.artists().get(index).map(|row| row.current()),
        RowSlot::Pending(index) => draft.artists().get(index).map(|row| &row.pending),
    }
}

fn missing_row(slot: RowSlot) -> String {
    match slot {
        RowSlot::New => "No input row".to_string(),
        RowSlot::Current(index) | RowSlot::Pending(index) => {
            format!("No row at position {index}")
        }
    }
}

fn required(value: &str, message: &str) -> Option<String> {
    value.trim().is_empty().then(|| message.to_string())
}

#[cfg(test)]
mod tests {
    use super::{
        validate_partial, AlbumField, ArtistField, FieldPath, GroupField, RowSlot,
        ValidationRules,
    };
    use crate::model::draft::{AlbumFields, ArtistFields, GroupDraft};
    use crate::model::group::Genre;

    fn rules() -> ValidationRules {
        ValidationRules::default()
    }

    #[test]
    fn only_named_fields_are_reported() {
        let draft = GroupDraft::new_group();
        let report = validate_partial(&draft, &[FieldPath::Group(GroupField::Name)], &rules());
        assert_eq!(report.errors().len(), 1);
        assert_eq!(
            report.messages_for(FieldPath::Group(GroupField::Name)),
            vec!["You must provide a group name"]
        );
    }

    #[test]
    fn group_save_paths_report_all_root_violations() {
        let draft = GroupDraft::new_group();
        let report = validate_partial(&draft, &FieldPath::group_save(), &rules());
        assert_eq!(report.errors().len(), 3);
        assert_eq!(
            report.messages_for(FieldPath::Group(GroupField::EstablishedYear)),
            vec!["You must provide a year between 1900 and 2024"]
        );
        assert_eq!(
            report.messages_for(FieldPath::Group(GroupField::Genre)),
            vec!["You must select a music genre"]
        );
    }

    #[test]
    fn valid_root_passes() {
        let mut draft = GroupDraft::new_group();
        draft.name = "Northbound".to_string();
        draft.established_year = 1971;
        draft.genre = Some(Genre::Blues);
        assert!(validate_partial(&draft, &FieldPath::group_save(), &rules()).is_ok());
    }

    #[test]
    fn year_range_follows_rules() {
        let mut draft = GroupDraft::new_group();
        draft.new_album = AlbumFields {
            name: "Late".to_string(),
            release_year: 2030,
            copies_sold: 0,
        };
        let path = FieldPath::Album(RowSlot::New, AlbumField::ReleaseYear);
        assert!(!validate_partial(&draft, &[path], &rules()).is_ok());

        let widened = ValidationRules {
            min_year: 1900,
            max_year: 2030,
        };
        assert!(validate_partial(&draft, &[path], &widened).is_ok());
    }

    #[test]
    fn missing_row_index_is_reported() {
        let draft = GroupDraft::new_group();
        let path = FieldPath::Artist(RowSlot::Pending(3), ArtistField::FirstName);
        let report = validate_partial(&draft, &[path], &rules());
        assert_eq!(report.messages_for(path), vec!["No row at position 3"]);
    }

    #[test]
    fn duplicate_paths_are_reported_once() {
        let mut draft = GroupDraft::new_group();
        draft.new_artist = ArtistFields::default();
        let path = FieldPath::Artist(RowSlot::New, ArtistField::LastName);
        let report = validate_partial(&draft, &[path, path], &rules());
        assert_eq!(report.errors().len(), 1);
    }

    #[test]
    fn path_display_addresses_list_elements() {
        assert_eq!(
            FieldPath::Album(RowSlot::Pending(2), AlbumField::Name).to_string(),
            "albums[2].pending.name"
        );
        assert_eq!(
            FieldPath::Artist(RowSlot::New, ArtistField::FirstName).to_string(),
            "new_artist.first_name"
        );
    }
}
