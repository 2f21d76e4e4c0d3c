//! Episode scanning against real directory trees

use setman_catalog::{Catalog, EpisodeId, MaterialRef, Status};
use setman_common::Code;
use std::path::Path;
use tempfile::TempDir;

const TEMPLATE: &str = "{series}_{episode}_{scene}_{cut}{stage}";

fn make_dirs(root: &Path, names: &[&str]) {
    for name in names {
        std::fs::create_dir_all(root.join(name)).unwrap();
    }
}

fn catalog_for(root: &Path) -> (Catalog, EpisodeId) {
    let mut catalog = Catalog::new();
    let company = catalog.add_company("Studio", None);
    let series = catalog.add_series(company, "ABC", TEMPLATE, 1).unwrap();
    let episode = catalog.add_episode(series, 1, root).unwrap();
    (catalog, episode)
}

#[test]
fn test_scan_accepts_matching_folders_only() {
    let dir = TempDir::new().unwrap();
    make_dirs(
        dir.path(),
        &["ABC_01_02_003lo", "ABC_01_02_004ka", "references", "xABC_01_02_005lo", ".hidden"],
    );
    std::fs::write(dir.path().join("ABC_01_02_006lo"), b"a file, not a cut").unwrap();

    let (mut catalog, episode) = catalog_for(dir.path());
    let report = catalog.scan_episode(episode).unwrap();

    assert_eq!(report.added.len(), 2);
    assert!(report.archived.is_empty());
    assert!(report.rejected.is_empty());
    assert_eq!(report.ignored.len(), 3);

    let ep = catalog.episode(episode).unwrap();
    let names: Vec<_> = ep.active().iter().map(|&id| ep.cut(id).unwrap().name()).collect();
    assert_eq!(names, vec!["ABC_01_02_003lo", "ABC_01_02_004ka"]);
}

#[test]
fn test_same_name_scanned_twice_is_rejected_once() {
    let dir = TempDir::new().unwrap();
    make_dirs(dir.path(), &["ABC_01_02_003lo"]);

    let (mut catalog, episode) = catalog_for(dir.path());
    let first = catalog.scan_episode(episode).unwrap();
    let second = catalog.scan_episode(episode).unwrap();

    assert_eq!(first.accepted() + second.accepted(), 1);
    assert_eq!(second.rejected.len(), 1);
    assert_eq!(second.rejected[0].error.code(), Code::ExistingCutConflicts);
    assert_eq!(catalog.episode(episode).unwrap().cuts().count(), 1);
}

#[test]
fn test_case_variants_collide_first_wins() {
    let dir = TempDir::new().unwrap();
    make_dirs(dir.path(), &["ABC_01_02_003LO", "ABC_01_02_003lo", "ABC_01_02_003ka"]);

    let (mut catalog, episode) = catalog_for(dir.path());
    let report = catalog.scan_episode(episode).unwrap();

    assert_eq!(report.added.len(), 2);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(
        report.rejected[0].path.file_name().unwrap().to_string_lossy(),
        "ABC_01_02_003lo"
    );

    let ep = catalog.episode(episode).unwrap();
    assert_eq!(ep.find_cut(3).len(), 2);
    assert_eq!(ep.find_stage("lo").len(), 1);
}

#[test]
fn test_up_folder_cuts_are_archived() {
    let dir = TempDir::new().unwrap();
    make_dirs(dir.path(), &["ABC_01_01_001lo", "up/ABC_01_01_002lo", "up/ABC_01_01_001lo", "cels"]);

    let (mut catalog, episode) = catalog_for(dir.path());
    let report = catalog.scan_episode(episode).unwrap();

    assert_eq!(report.added.len(), 1);
    assert_eq!(report.archived.len(), 1);
    assert_eq!(report.rejected.len(), 1);

    let ep = catalog.episode(episode).unwrap();
    assert_eq!(ep.todo(), 1);
    let delivered = ep.cut(report.archived[0]).unwrap();
    assert_eq!(delivered.status(), Status::Up);
    assert_eq!(delivered.number(), 2);
    assert_eq!(ep.find_status(Status::Up), report.archived);
}

#[test]
fn test_cut_children_are_classified() {
    let dir = TempDir::new().unwrap();
    let cut_dir = dir.path().join("ABC_01_01_001lo");
    std::fs::create_dir_all(cut_dir.join("sub")).unwrap();
    std::fs::write(
        cut_dir.join("A0001.png"),
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0],
    )
    .unwrap();
    std::fs::write(cut_dir.join("c001.clip"), b"clip studio data").unwrap();

    let (mut catalog, episode) = catalog_for(dir.path());
    let report = catalog.scan_episode(episode).unwrap();

    let ep = catalog.episode(episode).unwrap();
    let cut = ep.cut(report.added[0]).unwrap();
    let labels: Vec<_> = cut
        .children()
        .iter()
        .map(|&id| ep.material(id).unwrap().type_label())
        .collect();
    assert_eq!(labels, vec!["image", "clipstudio", "folder"]);

    let header = ep.header(MaterialRef::Material(cut.children()[0])).unwrap();
    assert_eq!(header.name(), "A0001.png");
}
