//! Bulk seeding, seed removal and storage statistics.
//!
//! # Invariants
//! - A seed batch is written in one transaction; a failure leaves no rows.
//! - Removing seeds also removes artists left without any group.

use crate::db::search_key;
use crate::model::group::NewMusicGroup;
use crate::repo::common::{ensure_connection_ready, flag_to_int, RepoResult};
use rusqlite::{params, Connection};
use uuid::Uuid;

/// One generated group with its children, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedGroup {
    pub group: NewMusicGroup,
    /// `(name, release_year, copies_sold)` per album.
    pub albums: Vec<(String, i32, i64)>,
    /// `(first_name, last_name, birth_day)` per artist.
    pub artists: Vec<(String, String, Option<String>)>,
}

/// Row counts per table, split by seed flag where it matters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DbInfo {
    pub seeded_groups: u64,
    pub unseeded_groups: u64,
    pub albums: u64,
    pub artists: u64,
}

impl DbInfo {
    pub fn total_groups(&self) -> u64 {
        self.seeded_groups + self.unseeded_groups
    }
}

/// Administrative storage operations.
pub trait AdminRepository {
    /// Writes a generated batch; returns the number of groups written.
    fn insert_seed_batch(&self, batch: &[SeedGroup]) -> RepoResult<u64>;
    /// Removes seeded (`true`) or user-created (`false`) groups; returns the
    /// number of groups removed.
    fn remove_groups(&self, seeded: bool) -> RepoResult<u64>;
    fn info(&self) -> RepoResult<DbInfo>;
}

/// SQLite-backed administrative repository.
pub struct SqliteAdminRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAdminRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["music_groups", "albums", "artists", "group_artists"])?;
        Ok(Self { conn })
    }
}

impl AdminRepository for SqliteAdminRepository<'_> {
    fn insert_seed_batch(&self, batch: &[SeedGroup]) -> RepoResult<u64> {
        let tx = self.conn.unchecked_transaction()?;
        for seed in batch {
            let group_text = Uuid::new_v4().to_string();
            tx.execute(
                "INSERT INTO music_groups
                    (group_uuid, name, established_year, genre, seeded, name_search)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    group_text.as_str(),
                    seed.group.name.as_str(),
                    seed.group.established_year,
                    seed.group.genre.as_str(),
                    flag_to_int(seed.group.seeded),
                    search_key(&seed.group.name),
                ],
            )?;

            for (name, release_year, copies_sold) in &seed.albums {
                tx.execute(
                    "INSERT INTO albums (album_uuid, group_uuid, name, release_year, copies_sold, seeded)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                    params![
                        Uuid::new_v4().to_string(),
                        group_text.as_str(),
                        name.as_str(),
                        release_year,
                        copies_sold,
                        flag_to_int(seed.group.seeded),
                    ],
                )?;
            }

            for (first_name, last_name, birth_day) in &seed.artists {
                let artist_text = Uuid::new_v4().to_string();
                tx.execute(
                    "INSERT INTO artists (artist_uuid, first_name, last_name, birth_day, seeded)
                     VALUES (?1, ?2, ?3, ?4, ?5);",
                    params![
                        artist_text.as_str(),
                        first_name.as_str(),
                        last_name.as_str(),
                        birth_day.as_deref(),
                        flag_to_int(seed.group.seeded),
                    ],
                )?;
                tx.execute(
                    "INSERT INTO group_artists (group_uuid, artist_uuid) VALUES (?1, ?2);",
                    params![group_text.as_str(), artist_text.as_str()],
                )?;
            }
        }
        tx.commit()?;
        Ok(batch.len() as u64)
    }

    fn remove_groups(&self, seeded: bool) -> RepoResult<u64> {
        let flag = flag_to_int(seeded);
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM music_groups WHERE seeded = ?1;", [flag])?;
        tx.execute(
            "DELETE FROM artists
             WHERE seeded = ?1
               AND NOT EXISTS (
                 SELECT 1 FROM group_artists ga WHERE ga.artist_uuid = artists.artist_uuid
               );",
            [flag],
        )?;
        tx.commit()?;
        Ok(removed as u64)
    }

    fn info(&self) -> RepoResult<DbInfo> {
        let count = |sql: &str| -> RepoResult<u64> {
            let value: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
            Ok(u64::try_from(value).unwrap_or_default())
        };

        Ok(DbInfo {
            seeded_groups: count("SELECT COUNT(*) FROM music_groups WHERE seeded = 1;")?,
            unseeded_groups: count("SELECT COUNT(*) FROM music_groups WHERE seeded = 0;")?,
            albums: count("SELECT COUNT(*) FROM albums;")?,
            artists: count("SELECT COUNT(*) FROM artists;")?,
        })
    }
}
