//! Persisted music group aggregate and creation payloads.
//!
//! # Responsibility
//! - Define the read models returned by the persistence layer.
//! - Define id-less creation payloads used by create calls.
//!
//! # Invariants
//! - `MusicGroup::group_id` never changes once assigned.
//! - Every album belongs to exactly one group; artists may belong to several.
//! - `New*` payloads have no identifier field.

use crate::model::ids::{AlbumId, ArtistId, GroupId};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Closed set of genres a group can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Genre {
    Rock,
    Blues,
    Jazz,
    Metal,
}

impl Genre {
    pub const ALL: [Genre; 4] = [Genre::Rock, Genre::Blues, Genre::Jazz, Genre::Metal];

    /// Storage/text form of the genre.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rock => "rock",
            Self::Blues => "blues",
            Self::Jazz => "jazz",
            Self::Metal => "metal",
        }
    }

    /// Parses the storage/text form, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rock" => Some(Self::Rock),
            "blues" => Some(Self::Blues),
            "jazz" => Some(Self::Jazz),
            "metal" => Some(Self::Metal),
            _ => None,
        }
    }
}

impl Display for Genre {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub album_id: AlbumId,
    pub music_group_id: GroupId,
    pub name: String,
    pub release_year: i32,
    pub copies_sold: i64,
    pub seeded: bool,
}

/// Persisted artist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub artist_id: ArtistId,
    pub first_name: String,
    pub last_name: String,
    /// ISO-8601 calendar date, carried through untouched.
    pub birth_day: Option<String>,
    pub seeded: bool,
}

/// Persisted music group with both child collections populated.
///
/// Albums are ordered by `release_year, name, album_id`; artists by
/// `last_name, first_name, artist_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicGroup {
    pub group_id: GroupId,
    pub name: String,
    pub established_year: i32,
    pub genre: Genre,
    pub seeded: bool,
    pub albums: Vec<Album>,
    pub artists: Vec<Artist>,
}

/// Creation payload for a music group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMusicGroup {
    pub name: String,
    pub established_year: i32,
    pub genre: Genre,
    pub seeded: bool,
}

/// Creation payload for an album. The foreign key is mandatory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlbum {
    pub music_group_id: GroupId,
    pub name: String,
    pub release_year: i32,
    pub copies_sold: i64,
    pub seeded: bool,
}

/// Creation payload for an artist and the groups it joins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArtist {
    pub music_group_ids: Vec<GroupId>,
    pub first_name: String,
    pub last_name: String,
    pub birth_day: Option<String>,
    pub seeded: bool,
}

#[cfg(test)]
mod tests {
    use super::Genre;

    #[test]
    fn genre_text_form_round_trips_case_insensitively() {
        for genre in Genre::ALL {
            assert_eq!(Genre::parse(genre.as_str()), Some(genre));
        }
        assert_eq!(Genre::parse(" JAZZ "), Some(Genre::Jazz));
        assert_eq!(Genre::parse("polka"), None);
    }
}
