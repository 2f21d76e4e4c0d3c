//! Directory population
//!
//! A scan walks the immediate children of an episode root (then of its up
//! folder) in name order. Directory names that parse under the series
//! convention become cuts; a name that parses but collides with a cut already
//! in the episode (including one accepted earlier in the same scan) is
//! rejected and reported. The first cut to claim a slot wins.

use super::{unknown_handle, Catalog, Episode};
use crate::cut::Cut;
use crate::identity::parse_cut_name;
use crate::ids::{CutId, EpisodeId, MaterialRef};
use crate::lifecycle::Status;
use crate::materials::Material;
use crate::naming::NamingConvention;
use setman_common::{Code, Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// A directory that parsed as a cut but could not be inserted
#[derive(Debug, Clone)]
pub struct ScanRejection {
    pub path: PathBuf,
    pub error: Error,
}

/// Outcome of one episode scan
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Cuts added to the active list
    pub added: Vec<CutId>,
    /// Cuts found in the up folder, added as delivered
    pub archived: Vec<CutId>,
    /// Entries that are not cut folders
    pub ignored: Vec<PathBuf>,
    pub rejected: Vec<ScanRejection>,
    /// Accepted cuts whose folder contents could not be fully read
    pub errors: Vec<ScanRejection>,
}

impl ScanReport {
    pub fn accepted(&self) -> usize {
        self.added.len() + self.archived.len()
    }
}

impl Catalog {
    /// Populate an episode from its root and up folders
    ///
    /// Fails with `folder_doesnt_exist` when the root is missing. A missing up
    /// folder is skipped.
    pub fn scan_episode(&mut self, episode: EpisodeId) -> Result<ScanReport> {
        let Catalog {
            series, episodes, ..
        } = self;
        let ep = episodes
            .get_mut(episode.0)
            .ok_or_else(|| unknown_handle("episode", episode.0))?;
        let convention = series[ep.series().0].naming_convention();

        let root = ep.root().to_path_buf();
        if !root.is_dir() {
            return Err(Error::with_message(
                Code::FolderDoesntExist,
                format!("{} does not exist", root.display()),
            ));
        }

        let mut report = ScanReport::default();
        scan_folder(ep, convention, &root, false, &mut report)?;

        let up = ep.up_folder().to_path_buf();
        if up.is_dir() {
            scan_folder(ep, convention, &up, true, &mut report)?;
        } else {
            debug!(up = %up.display(), "No up folder to scan");
        }

        info!(
            episode = ep.number(),
            added = report.added.len(),
            archived = report.archived.len(),
            ignored = report.ignored.len(),
            rejected = report.rejected.len(),
            errors = report.errors.len(),
            "Episode scan complete"
        );

        Ok(report)
    }
}

fn scan_folder(
    episode: &mut Episode,
    convention: &NamingConvention,
    folder: &Path,
    delivered: bool,
    report: &mut ScanReport,
) -> Result<()> {
    let skip = [episode.up_folder().to_path_buf(), episode.cels_folder().to_path_buf()];

    for path in sorted_entries(folder)? {
        if skip.contains(&path) {
            continue;
        }
        if !path.is_dir() {
            debug!(path = %path.display(), "Skipping file");
            report.ignored.push(path);
            continue;
        }

        let name = file_name(&path);
        let Some(identity) = parse_cut_name(convention, &name) else {
            debug!(path = %path.display(), "Not a cut folder");
            report.ignored.push(path);
            continue;
        };

        let inserted = Cut::new(episode.id(), &path, identity).and_then(|mut cut| {
            if delivered {
                cut.mark(Status::Up);
            }
            episode.insert_cut(cut)
        });

        match inserted {
            Ok(id) => {
                debug!(path = %path.display(), delivered, "Accepted cut");
                record_children(episode, id, &path, report);
                if delivered {
                    report.archived.push(id);
                } else {
                    report.added.push(id);
                }
            }
            Err(error) => {
                warn!(path = %path.display(), error = %error, "Rejected cut folder");
                report.rejected.push(ScanRejection { path, error });
            }
        }
    }

    Ok(())
}

/// Populate a freshly accepted cut, noting a failed read in the report
fn record_children(episode: &mut Episode, cut: CutId, folder: &Path, report: &mut ScanReport) {
    if let Err(error) = populate_children(episode, cut, folder) {
        warn!(path = %folder.display(), error = %error, "Could not read cut folder");
        report.errors.push(ScanRejection {
            path: folder.to_path_buf(),
            error,
        });
    }
}

/// Add the cut folder's immediate entries as its children
fn populate_children(episode: &mut Episode, cut: CutId, folder: &Path) -> Result<()> {
    for path in sorted_entries(folder)? {
        let material = Material::from_path(&path).unwrap_or_else(|e| {
            debug!(path = %path.display(), error = %e, "Could not sniff file, adding as plain file");
            Material::file(&path)
        });
        episode.add_child(MaterialRef::Cut(cut), material)?;
    }
    Ok(())
}

/// Non-hidden entries of `folder`, sorted by name
fn sorted_entries(folder: &Path) -> Result<Vec<PathBuf>> {
    WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .map(|entry| {
            entry.map(DirEntry::into_path).map_err(|e| {
                Error::with_message(
                    Code::FolderOpenFailed,
                    format!("Failed to read {}: {}", folder.display(), e),
                )
            })
        })
        .collect()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scan_missing_root() {
        let dir = TempDir::new().unwrap();
        let mut catalog = Catalog::new();
        let company = catalog.add_company("Studio", None);
        let series = catalog.add_series(company, "ABC", "c{cut}{stage}", 1).unwrap();
        let episode = catalog
            .add_episode(series, 1, dir.path().join("missing"))
            .unwrap();

        let err = catalog.scan_episode(episode).unwrap_err();
        assert_eq!(err.code(), Code::FolderDoesntExist);
    }

    #[test]
    fn test_sorted_entries_skips_hidden() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        std::fs::write(dir.path().join(".DS_Store"), b"").unwrap();

        let entries = sorted_entries(dir.path()).unwrap();
        assert_eq!(entries, vec![dir.path().join("a"), dir.path().join("b")]);
    }

    #[test]
    fn test_sorted_entries_of_hidden_folder() {
        let dir = TempDir::new().unwrap();
        let hidden = dir.path().join(".cache");
        std::fs::create_dir(&hidden).unwrap();
        std::fs::write(hidden.join("x.txt"), b"x").unwrap();

        assert_eq!(sorted_entries(&hidden).unwrap(), vec![hidden.join("x.txt")]);
    }

    #[test]
    fn test_sorted_entries_missing_folder() {
        let dir = TempDir::new().unwrap();
        let err = sorted_entries(&dir.path().join("gone")).unwrap_err();
        assert_eq!(err.code(), Code::FolderOpenFailed);
    }

    #[test]
    fn test_unreadable_cut_folder_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut catalog = Catalog::new();
        let company = catalog.add_company("Studio", None);
        let series = catalog.add_series(company, "ABC", "c{cut}{stage}", 1).unwrap();
        let episode = catalog.add_episode(series, 1, dir.path()).unwrap();
        let folder = dir.path().join("c003lo");
        let id = catalog.add_cut(episode, &folder).unwrap();

        let ep = catalog.episode_mut(episode).unwrap();
        let mut report = ScanReport::default();
        record_children(ep, id, &folder, &mut report);

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, folder);
        assert_eq!(report.errors[0].error.code(), Code::FolderOpenFailed);
        assert_eq!(ep.active(), &[id]);
        assert!(ep.cut(id).unwrap().children().is_empty());
    }
}
