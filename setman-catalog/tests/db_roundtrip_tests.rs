//! Saving and loading catalog snapshots through SQLite

use setman_catalog::db::{load_rows, save_rows};
use setman_catalog::materials::{Element, ElementCategory};
use setman_catalog::{Catalog, MaterialRef, Status};
use setman_common::db::init_database;
use tempfile::TempDir;

fn populated(root: &std::path::Path) -> Catalog {
    for name in ["S01_C001_lo", "S01_C002_ka", "up/S01_C003_gs"] {
        std::fs::create_dir_all(root.join(name)).unwrap();
    }
    std::fs::write(root.join("S01_C001_lo").join("layout.clip"), b"clip").unwrap();

    let mut catalog = Catalog::new();
    let company = catalog.add_company("Studio", Some(root.to_path_buf()));
    let series = catalog
        .add_series(company, "ABC", "S{scene}_C{cut}_{stage}", 1)
        .unwrap();
    let mut hero = Element::new("Aoi", ElementCategory::Character);
    hero.add_alias("aoi");
    catalog.series_mut(series).unwrap().add_element(hero);

    let episode = catalog.add_episode(series, 1, root).unwrap();
    let report = catalog.scan_episode(episode).unwrap();
    assert_eq!(report.accepted(), 3);

    let ep = catalog.episode_mut(episode).unwrap();
    let first = report.added[0];
    ep.mark_cut(first, Status::InProgress).unwrap();
    ep.header_mut(MaterialRef::Cut(first)).unwrap().add_tag("aoi");
    ep.set_notes("deadline friday");

    catalog
}

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("ep01");
    let catalog = populated(&root);
    let rows = catalog.to_rows().unwrap();

    let pool = init_database(&dir.path().join("catalog.db")).await.unwrap();
    save_rows(&pool, &rows).await.unwrap();

    let loaded = load_rows(&pool).await.unwrap();
    let restored = Catalog::from_rows(&loaded).unwrap();
    assert_eq!(restored.to_rows().unwrap(), rows);

    let (_, company) = restored.companies().next().unwrap();
    let series = company.series()[0];
    let episode = restored.find_episode(series, 1).unwrap();
    let ep = restored.episode(episode).unwrap();
    assert_eq!(ep.notes(), "deadline friday");
    assert_eq!(ep.active().len(), 2);
    assert_eq!(ep.archived().len(), 1);
    assert_eq!(ep.find_status(Status::InProgress).len(), 1);
}

#[tokio::test]
async fn test_save_replaces_previous_snapshot() {
    let dir = TempDir::new().unwrap();
    let mut catalog = populated(&dir.path().join("ep01"));
    let pool = init_database(&dir.path().join("catalog.db")).await.unwrap();

    save_rows(&pool, &catalog.to_rows().unwrap()).await.unwrap();

    let (_, company) = catalog.companies().next().unwrap();
    let series = company.series()[0];
    let episode = catalog.find_episode(series, 1).unwrap();
    let ep = catalog.episode_mut(episode).unwrap();
    let cut = ep.active()[1];
    ep.mark_cut(cut, Status::Done).unwrap();

    save_rows(&pool, &catalog.to_rows().unwrap()).await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM materials WHERE type = 'cut_folder'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 3);

    let restored = Catalog::from_rows(&load_rows(&pool).await.unwrap()).unwrap();
    let ep = restored.episode(restored.find_episode(series, 1).unwrap()).unwrap();
    assert_eq!(ep.find_status(Status::Done).len(), 1);
}

#[tokio::test]
async fn test_element_mentions_after_load() {
    let dir = TempDir::new().unwrap();
    let catalog = populated(&dir.path().join("ep01"));
    let pool = init_database(&dir.path().join("catalog.db")).await.unwrap();
    save_rows(&pool, &catalog.to_rows().unwrap()).await.unwrap();

    let mut restored = Catalog::from_rows(&load_rows(&pool).await.unwrap()).unwrap();
    let (_, company) = restored.companies().next().unwrap();
    let series = company.series()[0];

    let hero = restored.series(series).unwrap().find_element("Aoi").unwrap();
    assert!(restored.series(series).unwrap().element(hero).unwrap().mentions().is_empty());

    restored.refresh_element_mentions(series).unwrap();
    assert_eq!(
        restored.series(series).unwrap().element(hero).unwrap().mentions().len(),
        1
    );
}
