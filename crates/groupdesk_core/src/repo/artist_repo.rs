//! Artist persistence contract and SQLite implementation.
//!
//! # Invariants
//! - Group membership lives in `group_artists`; creating an artist links it
//!   to every group named in the payload within one transaction.
//! - Updating an artist never changes its memberships.
//! - `delete_artist` on an absent id is a successful no-op.

use crate::model::group::{Artist, NewArtist};
use crate::model::ids::{ArtistId, GroupId};
use crate::repo::common::{
    ensure_connection_ready, ensure_present, flag_to_int, parse_flag, parse_uuid, EntityKind,
    RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const ARTIST_SELECT_SQL: &str = "SELECT
    a.artist_uuid,
    a.first_name,
    a.last_name,
    a.birth_day,
    a.seeded
FROM artists a";

/// Persistence service for artists.
pub trait ArtistRepository {
    /// Creates one artist, links it to its groups, and returns it.
    fn create_artist(&self, artist: &NewArtist) -> RepoResult<Artist>;
    /// Loads one artist by id.
    fn get_artist(&self, artist_id: ArtistId) -> RepoResult<Option<Artist>>;
    /// Replaces the scalar fields of an existing artist.
    fn update_artist(&self, artist: &Artist) -> RepoResult<Artist>;
    /// Deletes one artist and its memberships; absent ids are ignored.
    fn delete_artist(&self, artist_id: ArtistId) -> RepoResult<()>;
}

/// SQLite-backed artist repository.
pub struct SqliteArtistRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteArtistRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["artists", "group_artists"])?;
        Ok(Self { conn })
    }
}

impl ArtistRepository for SqliteArtistRepository<'_> {
    fn create_artist(&self, artist: &NewArtist) -> RepoResult<Artist> {
        ensure_present(&artist.first_name, "artists.first_name")?;
        ensure_present(&artist.last_name, "artists.last_name")?;

        let artist_id = Uuid::new_v4();
        let artist_text = artist_id.to_string();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO artists (
                artist_uuid,
                first_name,
                last_name,
                birth_day,
                seeded
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                artist_text.as_str(),
                artist.first_name.as_str(),
                artist.last_name.as_str(),
                artist.birth_day.as_deref(),
                flag_to_int(artist.seeded),
            ],
        )?;
        for group_id in &artist.music_group_ids {
            tx.execute(
                "INSERT OR IGNORE INTO group_artists (group_uuid, artist_uuid) VALUES (?1, ?2);",
                params![group_id.to_string(), artist_text.as_str()],
            )?;
        }
        tx.commit()?;

        self.get_artist(artist_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("artist {artist_id} missing after insert"))
        })
    }

    fn get_artist(&self, artist_id: ArtistId) -> RepoResult<Option<Artist>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ARTIST_SELECT_SQL} WHERE a.artist_uuid = ?1;"))?;
        let mut rows = stmt.query([artist_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_artist_row(row)?));
        }
        Ok(None)
    }

    fn update_artist(&self, artist: &Artist) -> RepoResult<Artist> {
        ensure_present(&artist.first_name, "artists.first_name")?;
        ensure_present(&artist.last_name, "artists.last_name")?;

        let changed = self.conn.execute(
            "UPDATE artists
             SET
                first_name = ?2,
                last_name = ?3,
                birth_day = ?4
             WHERE artist_uuid = ?1;",
            params![
                artist.artist_id.to_string(),
                artist.first_name.as_str(),
                artist.last_name.as_str(),
                artist.birth_day.as_deref(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Artist, artist.artist_id));
        }

        self.get_artist(artist.artist_id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Artist, artist.artist_id))
    }

    fn delete_artist(&self, artist_id: ArtistId) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM artists WHERE artist_uuid = ?1;",
            [artist_id.to_string()],
        )?;
        Ok(())
    }
}

/// Loads the artists linked to one group in stable order.
pub(crate) fn load_artists_for_group(
    conn: &Connection,
    group_id: GroupId,
) -> RepoResult<Vec<Artist>> {
    let mut stmt = conn.prepare(&format!(
        "{ARTIST_SELECT_SQL}
         INNER JOIN group_artists ga ON ga.artist_uuid = a.artist_uuid
         WHERE ga.group_uuid = ?1
         ORDER BY a.last_name ASC, a.first_name ASC, a.artist_uuid ASC;"
    ))?;
    let mut rows = stmt.query([group_id.to_string()])?;
    let mut artists = Vec::new();
    while let Some(row) = rows.next()? {
        artists.push(parse_artist_row(row)?);
    }
    Ok(artists)
}

fn parse_artist_row(row: &Row<'_>) -> RepoResult<Artist> {
    let artist_text: String = row.get("artist_uuid")?;
    Ok(Artist {
        artist_id: parse_uuid(&artist_text, "artists.artist_uuid")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        birth_day: row.get("birth_day")?,
        seeded: parse_flag(row.get("seeded")?, "artists.seeded")?,
    })
}
