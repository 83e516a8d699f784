use groupdesk_core::db::open_db_in_memory;
use groupdesk_core::validation::validate_partial;
use groupdesk_core::{
    AdminService, AdminServiceError, CatalogError, CatalogQuery, CatalogService, FieldPath, Genre,
    GroupDraft, MusicGroupRepository, NewMusicGroup, SqliteAdminRepository,
    SqliteMusicGroupRepository, ValidationRules,
};
use rusqlite::Connection;
use uuid::Uuid;

fn user_group(conn: &Connection, name: &str, genre: Genre) -> Uuid {
    SqliteMusicGroupRepository::try_new(conn)
        .unwrap()
        .create_group(&NewMusicGroup {
            name: name.to_string(),
            established_year: 1990,
            genre,
            seeded: false,
        })
        .unwrap()
        .group_id
}

fn admin(conn: &Connection) -> AdminService<SqliteAdminRepository<'_>> {
    AdminService::with_limits(
        SqliteAdminRepository::try_new(conn).unwrap(),
        ValidationRules::default(),
        50,
    )
}

fn catalog(conn: &Connection, page_size: u32) -> CatalogService<SqliteMusicGroupRepository<'_>> {
    CatalogService::with_page_size(SqliteMusicGroupRepository::try_new(conn).unwrap(), page_size)
}

#[test]
fn seed_writes_requested_groups_with_children() {
    let conn = open_db_in_memory().unwrap();
    let admin = admin(&conn);

    assert_eq!(admin.seed(5).unwrap(), 5);

    let info = admin.info().unwrap();
    assert_eq!(info.seeded_groups, 5);
    assert_eq!(info.unseeded_groups, 0);
    assert!(info.albums >= 5);
    assert!(info.artists >= 10);
}

#[test]
fn seeded_groups_pass_save_validation() {
    let conn = open_db_in_memory().unwrap();
    admin(&conn).seed(20).unwrap();
    let listing = catalog(&conn, 50)
        .list_groups(&CatalogQuery::default())
        .unwrap();

    let rules = ValidationRules::default();
    for group in &listing.items {
        let draft = GroupDraft::from_group(group);
        assert!(validate_partial(&draft, &FieldPath::group_save(), &rules).is_ok());
        assert!(group.seeded);
    }
}

#[test]
fn seed_count_outside_limit_is_rejected_without_writes() {
    let conn = open_db_in_memory().unwrap();
    let admin = admin(&conn);

    for count in [0, 51] {
        let err = admin.seed(count).unwrap_err();
        assert!(matches!(
            err,
            AdminServiceError::InvalidSeedCount { requested, max: 50 } if requested == count
        ));
    }
    assert!(matches!(
        admin.reseed(0, true).unwrap_err(),
        AdminServiceError::InvalidSeedCount { .. }
    ));
    assert_eq!(admin.info().unwrap().total_groups(), 0);
}

#[test]
fn remove_seeds_keeps_user_groups_and_drops_orphaned_artists() {
    let conn = open_db_in_memory().unwrap();
    let admin = admin(&conn);
    admin.seed(4).unwrap();
    let kept = user_group(&conn, "Handmade", Genre::Blues);

    assert_eq!(admin.remove_seeds(true).unwrap(), 4);

    let info = admin.info().unwrap();
    assert_eq!(info.seeded_groups, 0);
    assert_eq!(info.unseeded_groups, 1);
    assert_eq!(info.albums, 0);
    assert_eq!(info.artists, 0);
    assert!(catalog(&conn, 10).view_group(kept).is_ok());
}

#[test]
fn reseed_with_removal_clears_both_kinds_first() {
    let conn = open_db_in_memory().unwrap();
    let admin = admin(&conn);
    admin.seed(2).unwrap();
    user_group(&conn, "Handmade", Genre::Jazz);

    let info = admin.reseed(3, true).unwrap();
    assert_eq!(info.seeded_groups, 3);
    assert_eq!(info.unseeded_groups, 0);

    let info = admin.reseed(1, false).unwrap();
    assert_eq!(info.seeded_groups, 4);
}

#[test]
fn seeding_is_deterministic_for_a_generator_seed() {
    let first_conn = open_db_in_memory().unwrap();
    let second_conn = open_db_in_memory().unwrap();
    admin(&first_conn).with_generator_seed(99).seed(6).unwrap();
    admin(&second_conn).with_generator_seed(99).seed(6).unwrap();

    let names = |conn: &Connection| -> Vec<String> {
        catalog(conn, 10)
            .list_groups(&CatalogQuery::default())
            .unwrap()
            .items
            .into_iter()
            .map(|group| group.name)
            .collect()
    };
    assert_eq!(names(&first_conn), names(&second_conn));
}

#[test]
fn list_groups_pages_and_clamps() {
    let conn = open_db_in_memory().unwrap();
    for name in ["Echo", "Alpha", "Delta", "Bravo", "Charlie"] {
        user_group(&conn, name, Genre::Rock);
    }
    let catalog = catalog(&conn, 2);

    let first = catalog.list_groups(&CatalogQuery::default()).unwrap();
    assert_eq!(first.total, 5);
    assert_eq!(first.pagination.page_count, 3);
    assert_eq!(first.pagination.next, 1);
    let names: Vec<_> = first.items.iter().map(|group| group.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Bravo"]);

    let beyond = catalog
        .list_groups(&CatalogQuery {
            page: 10,
            ..CatalogQuery::default()
        })
        .unwrap();
    assert_eq!(beyond.pagination.page, 2);
    assert_eq!(beyond.pagination.next, 2);
    assert_eq!(beyond.pagination.prev, 1);
    assert_eq!(beyond.items.len(), 1);
    assert_eq!(beyond.items[0].name, "Echo");
}

#[test]
fn search_matches_name_or_genre_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    user_group(&conn, "Blue Harbor", Genre::Jazz);
    user_group(&conn, "Iron Saints", Genre::Metal);
    user_group(&conn, "Harbor Lights", Genre::Blues);
    admin(&conn).seed(3).unwrap();
    let catalog = catalog(&conn, 10);

    let harbor = catalog
        .list_groups(&CatalogQuery {
            seeded: Some(false),
            search: Some("  HARBOR ".to_string()),
            page: 0,
        })
        .unwrap();
    let names: Vec<_> = harbor.items.iter().map(|group| group.name.as_str()).collect();
    assert_eq!(names, vec!["Blue Harbor", "Harbor Lights"]);

    let metal = catalog
        .list_groups(&CatalogQuery {
            seeded: Some(false),
            search: Some("Metal".to_string()),
            page: 0,
        })
        .unwrap();
    assert_eq!(metal.total, 1);
    assert_eq!(metal.items[0].name, "Iron Saints");

    let blank = catalog
        .list_groups(&CatalogQuery {
            seeded: Some(false),
            search: Some("   ".to_string()),
            page: 0,
        })
        .unwrap();
    assert_eq!(blank.total, 3);
}

#[test]
fn search_folds_non_ascii_letters() {
    let conn = open_db_in_memory().unwrap();
    let band = user_group(&conn, "Åsa Ödman Band", Genre::Jazz);
    user_group(&conn, "Asa Odman Trio", Genre::Jazz);
    let catalog = catalog(&conn, 10);
    let search = |needle: &str| {
        catalog
            .list_groups(&CatalogQuery {
                search: Some(needle.to_string()),
                ..CatalogQuery::default()
            })
            .unwrap()
    };

    for needle in ["Åsa", "ÅSA", "åsa ödman"] {
        let listing = search(needle);
        assert_eq!(listing.total, 1, "search {needle:?}");
        assert_eq!(listing.items[0].group_id, band);
    }

    let groups = SqliteMusicGroupRepository::try_new(&conn).unwrap();
    let mut renamed = groups.get_group(band).unwrap().unwrap();
    renamed.name = "ÖRESUND".to_string();
    groups.update_group(&renamed).unwrap();

    assert_eq!(search("Åsa").total, 0);
    assert_eq!(search("öresund").total, 1);
}

#[test]
fn seeded_groups_are_searchable_by_name() {
    let conn = open_db_in_memory().unwrap();
    admin(&conn).seed(3).unwrap();
    let catalog = catalog(&conn, 10);
    let first = catalog
        .list_groups(&CatalogQuery::default())
        .unwrap()
        .items
        .remove(0);

    let listing = catalog
        .list_groups(&CatalogQuery {
            search: Some(first.name.to_uppercase()),
            ..CatalogQuery::default()
        })
        .unwrap();
    assert!(listing.items.iter().any(|group| group.group_id == first.group_id));
}

#[test]
fn view_missing_group_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let missing = Uuid::new_v4();
    let err = catalog(&conn, 10).view_group(missing).unwrap_err();
    assert!(matches!(err, CatalogError::GroupNotFound(id) if id == missing));
}

#[test]
fn delete_group_returns_refreshed_page() {
    let conn = open_db_in_memory().unwrap();
    let doomed = user_group(&conn, "Alpha", Genre::Rock);
    user_group(&conn, "Bravo", Genre::Rock);
    user_group(&conn, "Charlie", Genre::Rock);
    let catalog = catalog(&conn, 2);
    let query = CatalogQuery {
        page: 1,
        ..CatalogQuery::default()
    };

    let listing = catalog.delete_group(doomed, &query).unwrap();

    assert_eq!(listing.total, 2);
    assert_eq!(listing.pagination.page, 0);
    let names: Vec<_> = listing.items.iter().map(|group| group.name.as_str()).collect();
    assert_eq!(names, vec!["Bravo", "Charlie"]);
    assert!(matches!(
        catalog.view_group(doomed).unwrap_err(),
        CatalogError::GroupNotFound(_)
    ));
}
