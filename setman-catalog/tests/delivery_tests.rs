//! Cut lifecycle and delivery to the up folder

use setman_catalog::{Catalog, CutId, EpisodeId, Status};
use setman_common::Code;
use std::path::Path;
use tempfile::TempDir;

fn setup(root: &Path) -> (Catalog, EpisodeId, CutId) {
    std::fs::create_dir_all(root.join("c010_gs")).unwrap();
    std::fs::write(root.join("c010_gs").join("notes.txt"), b"retake scene 2").unwrap();

    let mut catalog = Catalog::new();
    let company = catalog.add_company("Studio", None);
    let series = catalog.add_series(company, "XYZ", "c{cut}_{stage}", 1).unwrap();
    let episode = catalog.add_episode(series, 4, root).unwrap();
    let report = catalog.scan_episode(episode).unwrap();
    (catalog, episode, report.added[0])
}

#[test]
fn test_not_done_and_missing_up_folder_are_distinct() {
    let dir = TempDir::new().unwrap();
    let (mut catalog, episode, cut) = setup(dir.path());
    let ep = catalog.episode_mut(episode).unwrap();

    ep.mark_cut(cut, Status::Finishing).unwrap();
    assert!(ep.ready_cut(cut).is_none());

    ep.mark_cut(cut, Status::Done).unwrap();
    let err = ep.ready_cut(cut).unwrap().deliver().unwrap_err();
    assert_eq!(err.code(), Code::UpFolderDoesntExist);
    assert!(dir.path().join("c010_gs").is_dir());
}

#[test]
fn test_full_lifecycle_to_delivery() {
    let dir = TempDir::new().unwrap();
    let (mut catalog, episode, cut) = setup(dir.path());
    let ep = catalog.episode_mut(episode).unwrap();
    ep.fill_project().unwrap();

    for status in [Status::Started, Status::InProgress, Status::Finishing, Status::Done] {
        ep.mark_cut(cut, status).unwrap();
    }
    ep.ready_cut(cut).unwrap().deliver().unwrap();

    let delivered = dir.path().join("up").join("c010_gs");
    assert!(delivered.join("notes.txt").is_file());
    assert!(!dir.path().join("c010_gs").exists());

    let c = ep.cut(cut).unwrap();
    assert_eq!(c.status(), Status::Up);
    assert_eq!(c.history().len(), 6);
    assert_eq!(c.header().path(), delivered);
    let child = ep.material(c.children()[0]).unwrap();
    assert_eq!(child.path(), delivered.join("notes.txt"));

    assert!(ep.active().is_empty());
    assert_eq!(ep.archived(), &[cut]);
    assert!(ep.ready_cut(cut).is_none());
    assert!(catalog.identifier_matches_name(episode, cut));
}

#[test]
fn test_delivery_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    let (mut catalog, episode, cut) = setup(dir.path());
    std::fs::create_dir_all(dir.path().join("up").join("c010_gs")).unwrap();

    let ep = catalog.episode_mut(episode).unwrap();
    ep.mark_cut(cut, Status::Done).unwrap();
    let err = ep.ready_cut(cut).unwrap().deliver().unwrap_err();
    assert_eq!(err.code(), Code::FileAlreadyExists);
    assert_eq!(ep.cut(cut).unwrap().status(), Status::Done);
    assert_eq!(ep.active(), &[cut]);
}
