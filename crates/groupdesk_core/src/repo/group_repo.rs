//! Music group persistence contract and SQLite implementation.
//!
//! # Responsibility
//! - Create, update and delete group rows.
//! - Read the whole aggregate (group plus albums plus artists) in one call.
//! - List groups with search and pagination.
//!
//! # Invariants
//! - `update_group` touches scalar columns only; children are owned by their
//!   own repositories.
//! - Deleting a group cascades to its albums and membership rows.

use crate::db::search_key;
use crate::model::group::{Genre, MusicGroup, NewMusicGroup};
use crate::model::ids::GroupId;
use crate::repo::album_repo::load_albums_for_group;
use crate::repo::artist_repo::load_artists_for_group;
use crate::repo::common::{
    ensure_connection_ready, ensure_present, flag_to_int, parse_flag, parse_uuid, EntityKind,
    RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

const GROUP_SELECT_SQL: &str = "SELECT
    group_uuid,
    name,
    established_year,
    genre,
    seeded
FROM music_groups";

/// Filter and window for group listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupListQuery {
    /// Restrict to seeded (`Some(true)`) or user-created (`Some(false)`) groups.
    pub seeded: Option<bool>,
    /// Case-insensitive substring matched against name and genre.
    pub search: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

/// One window of listed groups plus the unwindowed match count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPage {
    pub items: Vec<MusicGroup>,
    pub total: u64,
}

/// Persistence service for music groups.
pub trait MusicGroupRepository {
    /// Creates one group without children and returns it.
    fn create_group(&self, group: &NewMusicGroup) -> RepoResult<MusicGroup>;
    /// Reads one group with both child collections populated.
    fn get_group(&self, group_id: GroupId) -> RepoResult<Option<MusicGroup>>;
    /// Replaces the scalar fields of an existing group and returns the
    /// refreshed aggregate.
    fn update_group(&self, group: &MusicGroup) -> RepoResult<MusicGroup>;
    /// Deletes one group; absent ids are ignored.
    fn delete_group(&self, group_id: GroupId) -> RepoResult<()>;
    /// Lists groups sorted by name.
    fn list_groups(&self, query: &GroupListQuery) -> RepoResult<GroupPage>;
}

/// SQLite-backed music group repository.
pub struct SqliteMusicGroupRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMusicGroupRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["music_groups", "albums", "artists", "group_artists"])?;
        Ok(Self { conn })
    }
}

impl MusicGroupRepository for SqliteMusicGroupRepository<'_> {
    fn create_group(&self, group: &NewMusicGroup) -> RepoResult<MusicGroup> {
        ensure_present(&group.name, "music_groups.name")?;

        let group_id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO music_groups (
                group_uuid,
                name,
                established_year,
                genre,
                seeded,
                name_search
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                group_id.to_string(),
                group.name.as_str(),
                group.established_year,
                group.genre.as_str(),
                flag_to_int(group.seeded),
                search_key(&group.name),
            ],
        )?;

        self.get_group(group_id)?
            .ok_or_else(|| RepoError::InvalidData(format!("group {group_id} missing after insert")))
    }

    fn get_group(&self, group_id: GroupId) -> RepoResult<Option<MusicGroup>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{GROUP_SELECT_SQL} WHERE group_uuid = ?1;"))?;
        let mut rows = stmt.query([group_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_group_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn update_group(&self, group: &MusicGroup) -> RepoResult<MusicGroup> {
        ensure_present(&group.name, "music_groups.name")?;

        let changed = self.conn.execute(
            "UPDATE music_groups
             SET
                name = ?2,
                established_year = ?3,
                genre = ?4,
                name_search = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE group_uuid = ?1;",
            params![
                group.group_id.to_string(),
                group.name.as_str(),
                group.established_year,
                group.genre.as_str(),
                search_key(&group.name),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::MusicGroup, group.group_id));
        }

        self.get_group(group.group_id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::MusicGroup, group.group_id))
    }

    fn delete_group(&self, group_id: GroupId) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM music_groups WHERE group_uuid = ?1;",
            [group_id.to_string()],
        )?;
        Ok(())
    }

    fn list_groups(&self, query: &GroupListQuery) -> RepoResult<GroupPage> {
        let mut filter = String::from(" WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(seeded) = query.seeded {
            filter.push_str(" AND seeded = ?");
            bind_values.push(Value::Integer(flag_to_int(seeded)));
        }

        if let Some(search) = query.search.as_deref() {
            filter.push_str(" AND (instr(name_search, ?) > 0 OR instr(genre, ?) > 0)");
            let needle = search_key(search);
            bind_values.push(Value::Text(needle.clone()));
            bind_values.push(Value::Text(needle));
        }

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM music_groups{filter};"),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;

        let sql = format!(
            "{GROUP_SELECT_SQL}{filter} ORDER BY name COLLATE NOCASE ASC, group_uuid ASC \
             LIMIT ? OFFSET ?"
        );
        bind_values.push(Value::Integer(i64::from(query.limit)));
        bind_values.push(Value::Integer(i64::from(query.offset)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_group_row(self.conn, row)?);
        }

        Ok(GroupPage {
            items,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }
}

fn parse_group_row(conn: &Connection, row: &Row<'_>) -> RepoResult<MusicGroup> {
    let group_text: String = row.get("group_uuid")?;
    let group_id = parse_uuid(&group_text, "music_groups.group_uuid")?;

    let genre_text: String = row.get("genre")?;
    let genre = Genre::parse(&genre_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid genre `{genre_text}` in music_groups.genre"))
    })?;

    Ok(MusicGroup {
        group_id,
        name: row.get("name")?,
        established_year: row.get("established_year")?,
        genre,
        seeded: parse_flag(row.get("seeded")?, "music_groups.seeded")?,
        albums: load_albums_for_group(conn, group_id)?,
        artists: load_artists_for_group(conn, group_id)?,
    })
}
