//! Episode: cuts, generic materials and the episode tag index

use crate::conflict;
use crate::cut::Cut;
use crate::ids::{CutId, EpisodeId, MaterialId, MaterialRef, SeriesId};
use crate::lifecycle::Status;
use crate::materials::{Material, MaterialHeader};
use crate::tags::TagIndex;
use setman_common::{Code, Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Folder name of delivered cuts under the episode root
pub const UP_FOLDER_NAME: &str = "up";
/// Folder name of cel exports under the episode root
pub const CELS_FOLDER_NAME: &str = "cels";

/// One episode of a series
///
/// Cuts and materials live in per-episode arenas and are addressed by
/// [`CutId`] and [`MaterialId`]. Every cut is in exactly one of the active
/// and archived lists; archived holds the cuts whose current status is `up`.
///
/// The tag index is a cache. Call [`Episode::refresh_tags`] after changing
/// any tag before reading [`Episode::mentions_tag`].
#[derive(Debug, Clone)]
pub struct Episode {
    id: EpisodeId,
    uuid: Uuid,
    series: SeriesId,
    number: u32,
    root: PathBuf,
    up_folder: PathBuf,
    cels_folder: PathBuf,
    notes: String,
    cuts: Vec<Cut>,
    materials: Vec<Material>,
    active: Vec<CutId>,
    archived: Vec<CutId>,
    generic: Vec<MaterialId>,
    tags: TagIndex<MaterialRef>,
}

impl Episode {
    pub(crate) fn new(
        id: EpisodeId,
        uuid: Uuid,
        series: SeriesId,
        number: u32,
        root: PathBuf,
    ) -> Self {
        Self {
            id,
            uuid,
            series,
            number,
            up_folder: root.join(UP_FOLDER_NAME),
            cels_folder: root.join(CELS_FOLDER_NAME),
            root,
            notes: String::new(),
            cuts: Vec::new(),
            materials: Vec::new(),
            active: Vec::new(),
            archived: Vec::new(),
            generic: Vec::new(),
            tags: TagIndex::new(),
        }
    }

    pub fn id(&self) -> EpisodeId {
        self.id
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn series(&self) -> SeriesId {
        self.series
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn up_folder(&self) -> &Path {
        &self.up_folder
    }

    pub fn set_up_folder(&mut self, path: impl Into<PathBuf>) {
        self.up_folder = path.into();
    }

    pub fn cels_folder(&self) -> &Path {
        &self.cels_folder
    }

    pub fn set_cels_folder(&mut self, path: impl Into<PathBuf>) {
        self.cels_folder = path.into();
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    pub fn active(&self) -> &[CutId] {
        &self.active
    }

    pub fn archived(&self) -> &[CutId] {
        &self.archived
    }

    /// Top-level materials that are not cuts
    pub fn generic(&self) -> &[MaterialId] {
        &self.generic
    }

    pub fn cut(&self, id: CutId) -> Option<&Cut> {
        self.cuts.get(id.0)
    }

    /// Every cut, active and archived, in insertion order
    pub fn cuts(&self) -> impl Iterator<Item = (CutId, &Cut)> {
        self.cuts.iter().enumerate().map(|(i, c)| (CutId(i), c))
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.0)
    }

    /// Every material, cut children and folder children included
    pub fn materials(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(i, m)| (MaterialId(i), m))
    }

    pub fn header(&self, material: MaterialRef) -> Option<&MaterialHeader> {
        match material {
            MaterialRef::Cut(id) => self.cut(id).map(Cut::header),
            MaterialRef::Material(id) => self.material(id).map(Material::header),
        }
    }

    pub fn header_mut(&mut self, material: MaterialRef) -> Option<&mut MaterialHeader> {
        match material {
            MaterialRef::Cut(id) => self.cuts.get_mut(id.0).map(Cut::header_mut),
            MaterialRef::Material(id) => self.materials.get_mut(id.0).map(Material::header_mut),
        }
    }

    /// Cuts in this episode that conflict with `candidate`
    pub fn find_conflicts(&self, candidate: &Cut) -> Vec<CutId> {
        conflict::find_conflicts(self, candidate, None)
    }

    /// Other cuts in this episode that conflict with cut `id`
    pub fn conflicts_of(&self, id: CutId) -> Vec<CutId> {
        match self.cut(id) {
            Some(cut) => conflict::find_conflicts(self, cut, Some(id)),
            None => Vec::new(),
        }
    }

    /// Refuse a cut that would share a slot or a uuid with a stored cut
    fn check_insertable(&self, cut: &Cut) -> Result<()> {
        if cut.episode() != self.id {
            return Err(Error::with_message(
                Code::Generic,
                format!("Cut {} was built for another episode", cut.name()),
            ));
        }

        if let Some(existing) = self.find_cut_by_uuid(cut.header().uuid()) {
            return Err(Error::with_message(
                Code::ExistingCutConflicts,
                format!(
                    "{} is already stored as {}",
                    cut.header().uuid(),
                    self.cuts[existing.0].name()
                ),
            ));
        }

        let conflicts = self.find_conflicts(cut);
        if let Some(existing) = conflicts.first().and_then(|&id| self.cut(id)) {
            warn!(
                cut = %cut.name(),
                existing = %existing.name(),
                episode = self.number,
                "Cut conflicts with an existing cut"
            );
            return Err(Error::with_message(
                Code::ExistingCutConflicts,
                format!(
                    "{} conflicts with existing cut {}",
                    cut.name(),
                    existing.name()
                ),
            ));
        }
        Ok(())
    }

    /// Insert a cut built for this episode
    ///
    /// A conflict with any active or archived cut, or a uuid already in the
    /// episode, fails with `existing_cut_conflicts` and leaves the episode
    /// unchanged. Cuts whose status is already `up` are placed in the archived
    /// list.
    pub fn insert_cut(&mut self, cut: Cut) -> Result<CutId> {
        self.check_insertable(&cut)?;

        let id = CutId(self.cuts.len());
        let delivered = cut.status() == Status::Up;
        self.cuts.push(cut);
        if delivered {
            self.archived.push(id);
        } else {
            self.active.push(id);
        }
        Ok(id)
    }

    /// Active cuts with this number
    pub fn find_cut(&self, number: u32) -> Vec<CutId> {
        self.active
            .iter()
            .copied()
            .filter(|&id| self.cuts[id.0].number() == number)
            .collect()
    }

    pub fn find_cut_by_uuid(&self, uuid: Uuid) -> Option<CutId> {
        self.cuts
            .iter()
            .position(|c| c.header().uuid() == uuid)
            .map(CutId)
    }

    pub fn find_material_by_uuid(&self, uuid: Uuid) -> Option<MaterialId> {
        self.materials
            .iter()
            .position(|m| m.uuid() == uuid)
            .map(MaterialId)
    }

    /// Active and archived cuts whose current status is `status`
    pub fn find_status(&self, status: Status) -> Vec<CutId> {
        self.active
            .iter()
            .chain(&self.archived)
            .copied()
            .filter(|&id| self.cuts[id.0].status() == status)
            .collect()
    }

    /// Active and archived cuts with this stage label (ASCII case ignored)
    pub fn find_stage(&self, stage: &str) -> Vec<CutId> {
        self.active
            .iter()
            .chain(&self.archived)
            .copied()
            .filter(|&id| {
                self.cuts[id.0]
                    .stage()
                    .map(|s| s.eq_ignore_ascii_case(stage))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Order active cuts by scene, then number, then stage
    pub fn sort_by_ascending(&mut self) {
        let cuts = &self.cuts;
        self.active.sort_by(|a, b| {
            let (a, b) = (&cuts[a.0], &cuts[b.0]);
            (a.scene(), a.number(), a.stage().map(str::to_ascii_lowercase)).cmp(&(
                b.scene(),
                b.number(),
                b.stage().map(str::to_ascii_lowercase),
            ))
        });
    }

    /// Order active cuts by their latest status change, oldest first
    pub fn sort_by_last_updated(&mut self) {
        let cuts = &self.cuts;
        self.active
            .sort_by_key(|id| cuts[id.0].last_update().recorded_at);
    }

    /// Cuts not yet delivered
    pub fn todo(&self) -> usize {
        self.active.len()
    }

    /// Record a status change on a cut
    ///
    /// `up` is refused here; delivery goes through [`Episode::ready_cut`].
    /// Re-marking an archived cut moves it back to the active list. Its
    /// folder stays in the up folder, and a later delivery leaves it there.
    pub fn mark_cut(&mut self, id: CutId, status: Status) -> Result<()> {
        if status == Status::Up {
            return Err(Error::with_message(
                Code::Generic,
                "Cuts are delivered through ready_cut, not marked up",
            ));
        }

        let cut = self.cuts.get_mut(id.0).ok_or_else(|| unknown_cut(id))?;
        cut.mark(status);

        if let Some(pos) = self.archived.iter().position(|&c| c == id) {
            self.archived.remove(pos);
            self.active.push(id);
            debug!(cut = %self.cuts[id.0].name(), "Cut returned to active list");
        }
        Ok(())
    }

    /// Delivery handle for an active cut whose status is `done`
    ///
    /// `None` for any other cut. This is the only way to promote a cut to
    /// `up`.
    pub fn ready_cut(&mut self, id: CutId) -> Option<DoneCut<'_>> {
        let ready = self.active.contains(&id)
            && self.cuts.get(id.0).map(Cut::status) == Some(Status::Done);
        if ready {
            Some(DoneCut { episode: self, id })
        } else {
            None
        }
    }

    /// Add a top-level generic material
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = self.push_material(material);
        self.generic.push(id);
        id
    }

    /// Add a material inside a cut or folder
    pub fn add_child(&mut self, parent: MaterialRef, material: Material) -> Result<MaterialId> {
        match parent {
            MaterialRef::Cut(cut) => {
                if self.cuts.get(cut.0).is_none() {
                    return Err(unknown_cut(cut));
                }
                let id = self.push_material(material);
                self.cuts[cut.0].children.push(id);
                Ok(id)
            }
            MaterialRef::Material(folder) => {
                let is_directory = self
                    .material(folder)
                    .map(Material::is_directory)
                    .ok_or_else(|| unknown_material(folder))?;
                if !is_directory {
                    return Err(Error::with_message(
                        Code::FileNotValid,
                        format!(
                            "{} is not a folder",
                            self.materials[folder.0].path().display()
                        ),
                    ));
                }
                let id = self.push_material(material);
                self.materials[folder.0].push_child(id);
                Ok(id)
            }
        }
    }

    fn push_material(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.materials.len());
        self.materials.push(material);
        id
    }

    /// Rebuild the tag index from every cut and material
    pub fn refresh_tags(&mut self) {
        self.tags.clear();
        for (i, cut) in self.cuts.iter().enumerate() {
            for tag in cut.header().tags() {
                self.tags.insert(tag, MaterialRef::Cut(CutId(i)));
            }
        }
        for (i, material) in self.materials.iter().enumerate() {
            for tag in material.tags() {
                self.tags.insert(tag, MaterialRef::Material(MaterialId(i)));
            }
        }
        debug!(episode = self.number, tags = self.tags.len(), "Refreshed episode tag index");
    }

    /// Materials carrying `tag` as of the last refresh
    pub fn mentions_tag<'a>(&'a self, tag: &str) -> impl Iterator<Item = MaterialRef> + 'a {
        self.tags.mentions(tag)
    }

    /// Create the `cels` and `up` folders under the episode root
    ///
    /// Fails without creating anything when either folder is present.
    pub fn fill_project(&mut self) -> Result<()> {
        let cels = self.root.join(CELS_FOLDER_NAME);
        let up = self.root.join(UP_FOLDER_NAME);

        if cels.exists() {
            return Err(Error::with_message(
                Code::CelsFolderExists,
                format!("{} already exists", cels.display()),
            ));
        }
        if up.exists() {
            return Err(Error::with_message(
                Code::UpFolderExists,
                format!("{} already exists", up.display()),
            ));
        }

        for folder in [&cels, &up] {
            std::fs::create_dir_all(folder).map_err(|e| {
                Error::with_message(
                    Code::FileWriteFailed,
                    format!("Failed to create {}: {}", folder.display(), e),
                )
            })?;
        }

        info!(episode = self.number, root = %self.root.display(), "Created episode folders");
        self.cels_folder = cels;
        self.up_folder = up;
        Ok(())
    }

    /// Point materials under `old_root` at `new_root`, following folders
    fn rebase(&mut self, roots: &[MaterialId], old_root: &Path, new_root: &Path) {
        let mut pending: Vec<MaterialId> = roots.to_vec();
        while let Some(id) = pending.pop() {
            let Some(material) = self.materials.get_mut(id.0) else {
                continue;
            };
            let rebased = material
                .path()
                .strip_prefix(old_root)
                .ok()
                .map(|relative| new_root.join(relative));
            if let Some(rebased) = rebased {
                material.header_mut().set_path(rebased);
            }
            pending.extend_from_slice(material.children());
        }
    }

    /// Stored cuts go through the same slot and uuid checks as new ones
    pub(crate) fn restore_cut(&mut self, cut: Cut) -> Result<CutId> {
        self.insert_cut(cut)
    }

    pub(crate) fn restore_material(&mut self, material: Material) -> MaterialId {
        self.push_material(material)
    }

    pub(crate) fn attach_restored(&mut self, parent: Option<MaterialRef>, child: MaterialId) {
        match parent {
            Some(MaterialRef::Cut(cut)) => {
                if let Some(cut) = self.cuts.get_mut(cut.0) {
                    cut.children.push(child);
                }
            }
            Some(MaterialRef::Material(folder)) => {
                if let Some(folder) = self.materials.get_mut(folder.0) {
                    folder.push_child(child);
                }
            }
            None => self.generic.push(child),
        }
    }
}

/// An active cut whose status was `done` when the handle was taken
///
/// Holding the handle borrows the episode mutably, so the status cannot
/// change before [`DoneCut::deliver`].
pub struct DoneCut<'a> {
    episode: &'a mut Episode,
    id: CutId,
}

impl DoneCut<'_> {
    pub fn id(&self) -> CutId {
        self.id
    }

    pub fn cut(&self) -> &Cut {
        &self.episode.cuts[self.id.0]
    }

    /// Move the cut folder into the episode's up folder and mark it `up`
    ///
    /// Fails with `up_folder_doesnt_exist` when the up folder is missing, and
    /// with the move error when the rename fails; the cut is unchanged in
    /// both cases.
    pub fn deliver(self) -> Result<CutId> {
        let DoneCut { episode, id } = self;

        if !episode.up_folder.is_dir() {
            return Err(Error::with_message(
                Code::UpFolderDoesntExist,
                format!("{} does not exist", episode.up_folder.display()),
            ));
        }

        let up_folder = episode.up_folder.clone();
        let cut = &mut episode.cuts[id.0];
        // A re-opened cut keeps its folder in the up folder
        if cut.header().path().parent() != Some(up_folder.as_path()) {
            let previous = cut.header_mut().move_to(&up_folder)?;
            let delivered_path = cut.header().path().to_path_buf();
            let children = cut.children.clone();
            episode.rebase(&children, &previous, &delivered_path);
        }
        let cut = &mut episode.cuts[id.0];
        cut.mark(Status::Up);
        info!(
            cut = %cut.name(),
            to = %cut.header().path().display(),
            "Delivered cut"
        );

        episode.active.retain(|&c| c != id);
        episode.archived.push(id);
        Ok(id)
    }
}

fn unknown_cut(id: CutId) -> Error {
    Error::with_message(Code::Generic, format!("Unknown cut handle {}", id.0))
}

fn unknown_material(id: MaterialId) -> Error {
    Error::with_message(Code::Generic, format!("Unknown material handle {}", id.0))
}
