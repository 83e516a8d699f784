//! Album persistence contract and SQLite implementation.
//!
//! # Invariants
//! - Every album row references an existing group (`albums.group_uuid`).
//! - `delete_album` on an absent id is a successful no-op.

use crate::model::group::{Album, NewAlbum};
use crate::model::ids::{AlbumId, GroupId};
use crate::repo::common::{
    ensure_connection_ready, ensure_present, flag_to_int, parse_flag, parse_uuid, EntityKind,
    RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const ALBUM_SELECT_SQL: &str = "SELECT
    album_uuid,
    group_uuid,
    name,
    release_year,
    copies_sold,
    seeded
FROM albums";

/// Persistence service for albums.
pub trait AlbumRepository {
    /// Creates one album and returns it with its storage-assigned id.
    fn create_album(&self, album: &NewAlbum) -> RepoResult<Album>;
    /// Loads one album by id.
    fn get_album(&self, album_id: AlbumId) -> RepoResult<Option<Album>>;
    /// Replaces the scalar fields of an existing album.
    fn update_album(&self, album: &Album) -> RepoResult<Album>;
    /// Deletes one album; absent ids are ignored.
    fn delete_album(&self, album_id: AlbumId) -> RepoResult<()>;
}

/// SQLite-backed album repository.
pub struct SqliteAlbumRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAlbumRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["albums"])?;
        Ok(Self { conn })
    }
}

impl AlbumRepository for SqliteAlbumRepository<'_> {
    fn create_album(&self, album: &NewAlbum) -> RepoResult<Album> {
        ensure_present(&album.name, "albums.name")?;

        let album_id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO albums (
                album_uuid,
                group_uuid,
                name,
                release_year,
                copies_sold,
                seeded
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                album_id.to_string(),
                album.music_group_id.to_string(),
                album.name.as_str(),
                album.release_year,
                album.copies_sold,
                flag_to_int(album.seeded),
            ],
        )?;

        self.get_album(album_id)?
            .ok_or_else(|| RepoError::InvalidData(format!("album {album_id} missing after insert")))
    }

    fn get_album(&self, album_id: AlbumId) -> RepoResult<Option<Album>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ALBUM_SELECT_SQL} WHERE album_uuid = ?1;"))?;
        let mut rows = stmt.query([album_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_album_row(row)?));
        }
        Ok(None)
    }

    fn update_album(&self, album: &Album) -> RepoResult<Album> {
        ensure_present(&album.name, "albums.name")?;

        let changed = self.conn.execute(
            "UPDATE albums
             SET
                group_uuid = ?2,
                name = ?3,
                release_year = ?4,
                copies_sold = ?5
             WHERE album_uuid = ?1;",
            params![
                album.album_id.to_string(),
                album.music_group_id.to_string(),
                album.name.as_str(),
                album.release_year,
                album.copies_sold,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Album, album.album_id));
        }

        self.get_album(album.album_id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Album, album.album_id))
    }

    fn delete_album(&self, album_id: AlbumId) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM albums WHERE album_uuid = ?1;",
            [album_id.to_string()],
        )?;
        Ok(())
    }
}

/// Loads the albums of one group in stable order.
pub(crate) fn load_albums_for_group(
    conn: &Connection,
    group_id: GroupId,
) -> RepoResult<Vec<Album>> {
    let mut stmt = conn.prepare(&format!(
        "{ALBUM_SELECT_SQL}
         WHERE group_uuid = ?1
         ORDER BY release_year ASC, name ASC, album_uuid ASC;"
    ))?;
    let mut rows = stmt.query([group_id.to_string()])?;
    let mut albums = Vec::new();
    while let Some(row) = rows.next()? {
        albums.push(parse_album_row(row)?);
    }
    Ok(albums)
}

fn parse_album_row(row: &Row<'_>) -> RepoResult<Album> {
    let album_text: String = row.get("album_uuid")?;
    let group_text: String = row.get("group_uuid")?;
    Ok(Album {
        album_id: parse_uuid(&album_text, "albums.album_uuid")?,
        music_group_id: parse_uuid(&group_text, "albums.group_uuid")?,
        name: row.get("name")?,
        release_year: row.get("release_year")?,
        copies_sold: row.get("copies_sold")?,
        seeded: parse_flag(row.get("seeded")?, "albums.seeded")?,
    })
}
