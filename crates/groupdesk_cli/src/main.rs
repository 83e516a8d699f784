//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `groupdesk_core` wiring end to end: config, logging, storage,
//!   seeding, listing and one edit/save cycle.
//! - Keep output deterministic apart from generated ids.
//!
//! Usage: `groupdesk_cli [config.json]`

use groupdesk_core::{
    init_logging, open_db, open_db_in_memory, AdminService, AlbumFields, CatalogQuery,
    CatalogService, CoreConfig, GroupEditService, SqliteAdminRepository, SqliteAlbumRepository,
    SqliteArtistRepository, SqliteMusicGroupRepository,
};
use log::info;
use std::error::Error;
use std::process::ExitCode;

const DEMO_SEED_COUNT: u32 = 3;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("groupdesk: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir)?;
    }

    println!("groupdesk_core ping={}", groupdesk_core::ping());
    println!("groupdesk_core version={}", groupdesk_core::core_version());

    let conn = match config.db_path.as_deref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };

    let admin = AdminService::with_limits(
        SqliteAdminRepository::try_new(&conn)?,
        config.validation,
        config.max_seed_count,
    );
    admin.seed(DEMO_SEED_COUNT)?;

    let catalog = CatalogService::with_page_size(
        SqliteMusicGroupRepository::try_new(&conn)?,
        config.page_size,
    );
    let listing = catalog.list_groups(&CatalogQuery::default())?;
    println!(
        "groups total={} pages={}",
        listing.total, listing.pagination.page_count
    );

    let Some(first) = listing.items.first() else {
        return Ok(());
    };

    let editor = GroupEditService::new(
        SqliteMusicGroupRepository::try_new(&conn)?,
        SqliteAlbumRepository::try_new(&conn)?,
        SqliteArtistRepository::try_new(&conn)?,
    );
    let mut draft = editor.begin_edit(Some(first.group_id))?;
    draft.new_album = AlbumFields {
        name: "Live At Home".to_string(),
        release_year: config.validation.max_year,
        copies_sold: 0,
    };
    draft.stage_insert_child::<AlbumFields>(&config.validation)?;

    let outcome = editor.save(&mut draft, &config.validation)?;
    info!(
        "event=cli_demo module=cli status=ok group_id={} kind={}",
        outcome.group_id,
        outcome.kind.as_str()
    );
    println!(
        "saved group={} kind={} albums={} artists={}",
        outcome.group_id,
        outcome.kind.as_str(),
        outcome.group.albums.len(),
        outcome.group.artists.len()
    );

    let info = admin.info()?;
    println!(
        "db seeded_groups={} unseeded_groups={} albums={} artists={}",
        info.seeded_groups, info.unseeded_groups, info.albums, info.artists
    );
    Ok(())
}
