//! Core domain logic for GroupDesk.
//! Edits a music group together with its albums and artists in memory and
//! reconciles the result against storage.

pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod validation;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use engine::error::{ConsistencyFailure, SaveError, SaveStage};
pub use engine::reconcile::{reconcile, ChildStore, ReconcilePlan};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::change::ChangeTag;
pub use model::draft::{
    AlbumFields, ArtistFields, ChildCollection, EditableRecord, GroupDraft, StageError,
};
pub use model::group::{Album, Artist, Genre, MusicGroup, NewAlbum, NewArtist, NewMusicGroup};
pub use model::ids::{AlbumId, ArtistId, GroupId, RowId, TempId};
pub use repo::admin_repo::{AdminRepository, DbInfo, SqliteAdminRepository};
pub use repo::album_repo::{AlbumRepository, SqliteAlbumRepository};
pub use repo::artist_repo::{ArtistRepository, SqliteArtistRepository};
pub use repo::common::{EntityKind, RepoError, RepoResult};
pub use repo::group_repo::{
    GroupListQuery, GroupPage, MusicGroupRepository, SqliteMusicGroupRepository,
};
pub use service::admin_service::{AdminService, AdminServiceError};
pub use service::catalog_service::{CatalogError, CatalogQuery, CatalogService, GroupListing};
pub use service::group_edit_service::{GroupEditError, GroupEditService, SaveKind, SaveOutcome};
pub use validation::{FieldPath, ValidationReport, ValidationRules};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
