//! Catalog hierarchy
//!
//! The [`Catalog`] owns every company, series and episode in flat arenas.
//! Children refer to their owners by handle ([`SeriesId`], [`EpisodeId`])
//! instead of holding references, and owners list their children by handle.

mod company;
mod episode;
mod scan;
mod series;

pub use company::Company;
pub use episode::{DoneCut, Episode, CELS_FOLDER_NAME, UP_FOLDER_NAME};
pub use scan::{ScanRejection, ScanReport};
pub use series::Series;

use crate::cut::Cut;
use crate::identity::CutIdentity;
use crate::ids::{CatalogRef, CompanyId, CutId, EpisodeId, MaterialRef, SeriesId};
use crate::materials::MaterialKind;
use crate::naming::NamingConvention;
use setman_common::{uuid_utils, Code, Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    companies: Vec<Company>,
    series: Vec<Series>,
    episodes: Vec<Episode>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    // Companies

    pub fn add_company(&mut self, name: impl Into<String>, root: Option<PathBuf>) -> CompanyId {
        self.add_company_with_uuid(uuid_utils::generate(), name.into(), root)
    }

    pub(crate) fn add_company_with_uuid(
        &mut self,
        uuid: Uuid,
        name: String,
        root: Option<PathBuf>,
    ) -> CompanyId {
        let id = CompanyId(self.companies.len());
        debug!(company = %name, "Added company");
        self.companies.push(Company::new(uuid, name, root));
        id
    }

    pub fn company(&self, id: CompanyId) -> Option<&Company> {
        self.companies.get(id.0)
    }

    pub fn company_mut(&mut self, id: CompanyId) -> Option<&mut Company> {
        self.companies.get_mut(id.0)
    }

    pub fn companies(&self) -> impl Iterator<Item = (CompanyId, &Company)> {
        self.companies
            .iter()
            .enumerate()
            .map(|(i, c)| (CompanyId(i), c))
    }

    pub fn find_company_by_uuid(&self, uuid: Uuid) -> Option<CompanyId> {
        self.companies
            .iter()
            .position(|c| c.uuid() == uuid)
            .map(CompanyId)
    }

    // Series

    /// Add a series with its naming convention template
    ///
    /// Fails with `parse_failed` when the template does not compile.
    pub fn add_series(
        &mut self,
        company: CompanyId,
        code: impl Into<String>,
        template: &str,
        season: u32,
    ) -> Result<SeriesId> {
        self.add_series_with_uuid(company, uuid_utils::generate(), code.into(), template, season)
    }

    pub(crate) fn add_series_with_uuid(
        &mut self,
        company: CompanyId,
        uuid: Uuid,
        code: String,
        template: &str,
        season: u32,
    ) -> Result<SeriesId> {
        if self.companies.get(company.0).is_none() {
            return Err(unknown_handle("company", company.0));
        }
        let convention = NamingConvention::compile(template)?;

        let id = SeriesId(self.series.len());
        debug!(series = %code, template = %template, "Added series");
        self.series
            .push(Series::new(uuid, company, code, season, convention));
        self.companies[company.0].series.push(id);
        Ok(id)
    }

    pub fn series(&self, id: SeriesId) -> Option<&Series> {
        self.series.get(id.0)
    }

    pub fn series_mut(&mut self, id: SeriesId) -> Option<&mut Series> {
        self.series.get_mut(id.0)
    }

    /// First series of `company` with this code
    pub fn find_series(&self, company: CompanyId, code: &str) -> Option<SeriesId> {
        self.company(company)?
            .series()
            .iter()
            .copied()
            .find(|id| self.series[id.0].code() == code)
    }

    pub fn find_series_by_uuid(&self, uuid: Uuid) -> Option<SeriesId> {
        self.series
            .iter()
            .position(|s| s.uuid() == uuid)
            .map(SeriesId)
    }

    // Episodes

    /// Add an episode rooted at `root`; its up and cels folders default to
    /// `root/up` and `root/cels`
    pub fn add_episode(
        &mut self,
        series: SeriesId,
        number: u32,
        root: impl Into<PathBuf>,
    ) -> Result<EpisodeId> {
        self.add_episode_with_uuid(series, uuid_utils::generate(), number, root.into())
    }

    pub(crate) fn add_episode_with_uuid(
        &mut self,
        series: SeriesId,
        uuid: Uuid,
        number: u32,
        root: PathBuf,
    ) -> Result<EpisodeId> {
        if self.series.get(series.0).is_none() {
            return Err(unknown_handle("series", series.0));
        }
        let id = EpisodeId(self.episodes.len());
        debug!(episode = number, root = %root.display(), "Added episode");
        self.episodes
            .push(Episode::new(id, uuid, series, number, root));
        self.series[series.0].episodes.push(id);
        Ok(id)
    }

    pub fn episode(&self, id: EpisodeId) -> Option<&Episode> {
        self.episodes.get(id.0)
    }

    pub fn episode_mut(&mut self, id: EpisodeId) -> Option<&mut Episode> {
        self.episodes.get_mut(id.0)
    }

    /// First episode of `series` with this number
    pub fn find_episode(&self, series: SeriesId, number: u32) -> Option<EpisodeId> {
        self.series(series)?
            .episodes()
            .iter()
            .copied()
            .find(|id| self.episodes[id.0].number() == number)
    }

    /// Existing episode of `series` with this number, or a new one at `root`
    ///
    /// A stored episode keeps its recorded root; a different `root` is
    /// logged and otherwise ignored so stored cut paths stay valid.
    pub fn open_episode(&mut self, series: SeriesId, number: u32, root: &Path) -> Result<EpisodeId> {
        let Some(id) = self.find_episode(series, number) else {
            return self.add_episode(series, number, root);
        };
        let stored = self.episodes[id.0].root();
        if stored != root {
            warn!(
                episode = number,
                stored = %stored.display(),
                requested = %root.display(),
                "Episode already recorded under another root; keeping the stored root"
            );
        }
        Ok(id)
    }

    pub fn find_episode_by_uuid(&self, uuid: Uuid) -> Option<EpisodeId> {
        self.episodes
            .iter()
            .position(|e| e.uuid() == uuid)
            .map(EpisodeId)
    }

    // Cuts

    /// Build a cut for `episode` from a folder path
    ///
    /// The folder name is parsed with the owning series' convention. Fails
    /// with `parse_failed` when it does not match or encodes no cut number,
    /// and with `existing_cut_conflicts` when an active or archived cut of
    /// the episode already holds the same slot and stage. The episode is not
    /// modified.
    pub fn build_cut(&self, episode: EpisodeId, path: &Path) -> Result<Cut> {
        let ep = self
            .episode(episode)
            .ok_or_else(|| unknown_handle("episode", episode.0))?;
        let series = &self.series[ep.series().0];

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let identity = series.parse_cut_name(&name).ok_or_else(|| {
            Error::with_message(
                Code::ParseFailed,
                format!(
                    "'{}' does not match naming convention '{}'",
                    name,
                    series.naming_convention().template()
                ),
            )
        })?;

        let cut = Cut::new(episode, path, identity)?;

        if let Some(existing) = ep.find_conflicts(&cut).first().and_then(|&id| ep.cut(id)) {
            return Err(Error::with_message(
                Code::ExistingCutConflicts,
                format!("{} conflicts with existing cut {}", name, existing.name()),
            ));
        }

        Ok(cut)
    }

    /// Build and insert a cut
    pub fn add_cut(&mut self, episode: EpisodeId, path: &Path) -> Result<CutId> {
        let cut = self.build_cut(episode, path)?;
        self.episodes[episode.0].insert_cut(cut)
    }

    /// The cut's identity with series code and episode number filled in
    /// from the hierarchy when the folder name does not encode them
    pub fn cut_identity(&self, episode: EpisodeId, cut: CutId) -> Option<CutIdentity> {
        let ep = self.episode(episode)?;
        let series = self.series(ep.series())?;
        let mut identity = ep.cut(cut)?.identifier().clone();
        identity.series.get_or_insert_with(|| series.code().to_string());
        identity.episode.get_or_insert(ep.number());
        Some(identity)
    }

    /// Whether re-parsing the cut's folder name gives back its identity
    pub fn identifier_matches_name(&self, episode: EpisodeId, cut: CutId) -> bool {
        let Some(ep) = self.episode(episode) else {
            return false;
        };
        let Some(cut) = ep.cut(cut) else {
            return false;
        };
        self.series[ep.series().0]
            .parse_cut_name(&cut.name())
            .map(|parsed| parsed.same_as(cut.identifier()))
            .unwrap_or(false)
    }

    pub fn find_cut_by_uuid(&self, uuid: Uuid) -> Option<(EpisodeId, CutId)> {
        self.episodes
            .iter()
            .find_map(|ep| ep.find_cut_by_uuid(uuid).map(|cut| (ep.id(), cut)))
    }

    /// Any tagged entry, cut or material, by uuid
    pub fn find_material_by_uuid(&self, uuid: Uuid) -> Option<CatalogRef> {
        self.episodes.iter().find_map(|ep| {
            let material = ep
                .find_cut_by_uuid(uuid)
                .map(MaterialRef::Cut)
                .or_else(|| ep.find_material_by_uuid(uuid).map(MaterialRef::Material))?;
            Some(CatalogRef {
                episode: ep.id(),
                material,
            })
        })
    }

    // Indices

    /// Rebuild the series tag index from every episode's cuts and materials
    pub fn refresh_series_tags(&mut self, series: SeriesId) -> Result<()> {
        let Catalog {
            series: all_series,
            episodes,
            ..
        } = self;
        let target = all_series
            .get_mut(series.0)
            .ok_or_else(|| unknown_handle("series", series.0))?;

        target.tags.clear();
        for &eid in &target.episodes {
            let episode = &episodes[eid.0];
            for (cut_id, cut) in episode.cuts() {
                for tag in cut.header().tags() {
                    target.tags.insert(
                        tag,
                        CatalogRef {
                            episode: eid,
                            material: MaterialRef::Cut(cut_id),
                        },
                    );
                }
            }
            for (material_id, material) in episode.materials() {
                for tag in material.tags() {
                    target.tags.insert(
                        tag,
                        CatalogRef {
                            episode: eid,
                            material: MaterialRef::Material(material_id),
                        },
                    );
                }
            }
        }

        debug!(series = %target.code(), tags = target.tags.len(), "Refreshed series tag index");
        Ok(())
    }

    /// Rebuild every element's mention set for a series
    ///
    /// A cut or material mentions an element when one of its tags equals the
    /// element's name or an alias, or when it is a reference listing the
    /// element as a subject.
    pub fn refresh_element_mentions(&mut self, series: SeriesId) -> Result<()> {
        let Catalog {
            series: all_series,
            episodes,
            ..
        } = self;
        let target = all_series
            .get_mut(series.0)
            .ok_or_else(|| unknown_handle("series", series.0))?;

        for element in &mut target.elements {
            element.clear_mentions();
        }

        for &eid in &target.episodes {
            let episode = &episodes[eid.0];

            for (cut_id, cut) in episode.cuts() {
                let at = CatalogRef {
                    episode: eid,
                    material: MaterialRef::Cut(cut_id),
                };
                for tag in cut.header().tags() {
                    for element in target.elements.iter_mut().filter(|e| e.is_named(tag)) {
                        element.add_mention(at);
                    }
                }
            }

            for (material_id, material) in episode.materials() {
                let at = CatalogRef {
                    episode: eid,
                    material: MaterialRef::Material(material_id),
                };
                for tag in material.tags() {
                    for element in target.elements.iter_mut().filter(|e| e.is_named(tag)) {
                        element.add_mention(at);
                    }
                }
                if let MaterialKind::Reference(reference) = material.kind() {
                    for subject in &reference.subjects {
                        if let Some(element) = target.elements.get_mut(subject.0) {
                            element.add_mention(at);
                        }
                    }
                }
            }
        }

        debug!(series = %target.code(), elements = target.elements.len(), "Refreshed element mentions");
        Ok(())
    }
}

fn unknown_handle(kind: &str, index: usize) -> Error {
    Error::with_message(Code::Generic, format!("Unknown {} handle {}", kind, index))
}
