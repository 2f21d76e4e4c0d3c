//! Episode materials
//!
//! Every file or folder the catalog tracks shares a [`MaterialHeader`]
//! (uuid, path, tags, notes) and carries a per-variant [`MaterialKind`]
//! payload. Containers hold child handles into their episode's material
//! arena rather than owning their children.

pub mod element;
pub mod fs;
pub mod image;

pub use element::{Element, ElementCategory};
pub use image::{ImageInfo, Keyframe, Reference};

use crate::identity::Stage;
use crate::ids::{ElementId, MaterialId};
use setman_common::{uuid_utils, Code, Error, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Fields shared by every material, cuts included
#[derive(Debug, Clone)]
pub struct MaterialHeader {
    uuid: Uuid,
    path: PathBuf,
    tags: BTreeSet<String>,
    notes: String,
    alias: String,
}

impl MaterialHeader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_uuid(uuid_utils::generate(), path)
    }

    pub fn with_uuid(uuid: Uuid, path: impl Into<PathBuf>) -> Self {
        Self {
            uuid,
            path: path.into(),
            tags: BTreeSet::new(),
            notes: String::new(),
            alias: String::new(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last path component
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Add a tag. Tag indices are not updated until refreshed.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        self.tags.insert(tag.into())
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn set_alias(&mut self, alias: impl Into<String>) {
        self.alias = alias.into();
    }

    pub fn file_exists(&self) -> bool {
        self.path.exists()
    }

    pub fn disk_size(&self) -> Result<u64> {
        fs::disk_size_of(&self.path)
    }

    pub(crate) fn set_path(&mut self, path: PathBuf) {
        self.path = path;
    }

    /// Rename the backing file or folder into `parent_location`
    ///
    /// On failure the recorded path is left untouched. A failed rename is not
    /// rolled back at the OS level.
    pub fn move_to(&mut self, parent_location: &Path) -> Result<PathBuf> {
        let file_name = self.path.file_name().ok_or_else(|| {
            Error::with_message(
                Code::FileNotValid,
                format!("{} has no file name", self.path.display()),
            )
        })?;
        let destination = parent_location.join(file_name);

        if destination.exists() {
            return Err(Error::with_message(
                Code::FileAlreadyExists,
                format!("{} already exists", destination.display()),
            ));
        }

        std::fs::rename(&self.path, &destination).map_err(|e| {
            Error::with_message(
                Code::GenericFilesystemError,
                format!(
                    "Failed to move {} to {}: {}",
                    self.path.display(),
                    destination.display(),
                    e
                ),
            )
        })?;

        tracing::debug!(
            from = %self.path.display(),
            to = %destination.display(),
            "Moved material"
        );

        let previous = std::mem::replace(&mut self.path, destination);
        Ok(previous)
    }
}

/// What a plain file is used for, judged by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileRole {
    Generic,
    /// Clip Studio Paint project
    ClipStudio,
    /// PureRef board
    PureRef,
    Notes,
}

impl FileRole {
    pub fn from_path(path: &Path) -> Self {
        match fs::file_extension_of(path).as_deref() {
            Some("clip") => FileRole::ClipStudio,
            Some("pur") => FileRole::PureRef,
            Some("txt") | Some("md") => FileRole::Notes,
            _ => FileRole::Generic,
        }
    }
}

#[derive(Debug, Clone)]
pub enum MaterialKind {
    File(FileRole),
    Folder { children: Vec<MaterialId> },
    Image(ImageInfo),
    Keyframe(Keyframe),
    Reference(Reference),
}

#[derive(Debug, Clone)]
pub struct Material {
    header: MaterialHeader,
    kind: MaterialKind,
}

impl Material {
    pub fn new(header: MaterialHeader, kind: MaterialKind) -> Self {
        Self { header, kind }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let role = FileRole::from_path(&path);
        Self::new(MaterialHeader::new(path), MaterialKind::File(role))
    }

    pub fn folder(path: impl Into<PathBuf>) -> Self {
        Self::new(
            MaterialHeader::new(path),
            MaterialKind::Folder {
                children: Vec::new(),
            },
        )
    }

    pub fn image(path: impl Into<PathBuf>) -> Self {
        Self::new(MaterialHeader::new(path), MaterialKind::Image(ImageInfo::new()))
    }

    pub fn keyframe(path: impl Into<PathBuf>, cel: char, stage: Stage) -> Self {
        Self::new(
            MaterialHeader::new(path),
            MaterialKind::Keyframe(Keyframe::new(cel, stage)),
        )
    }

    pub fn reference(path: impl Into<PathBuf>, subjects: BTreeSet<ElementId>) -> Self {
        Self::new(
            MaterialHeader::new(path),
            MaterialKind::Reference(Reference::new(subjects)),
        )
    }

    /// Classify an existing path: directories become folders, files that
    /// sniff as images become images, anything else a plain file
    pub fn from_path(path: &Path) -> Result<Self> {
        if path.is_dir() {
            return Ok(Self::folder(path));
        }
        if fs::is_image(path)? {
            Ok(Self::image(path))
        } else {
            Ok(Self::file(path))
        }
    }

    pub fn header(&self) -> &MaterialHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut MaterialHeader {
        &mut self.header
    }

    pub fn kind(&self) -> &MaterialKind {
        &self.kind
    }

    pub fn uuid(&self) -> Uuid {
        self.header.uuid()
    }

    pub fn path(&self) -> &Path {
        self.header.path()
    }

    pub fn name(&self) -> String {
        self.header.name()
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        self.header.tags()
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, MaterialKind::Folder { .. })
    }

    /// Stable label stored in the `materials.type` column
    pub fn type_label(&self) -> &'static str {
        match &self.kind {
            MaterialKind::File(FileRole::Generic) => "file",
            MaterialKind::File(FileRole::ClipStudio) => "clipstudio",
            MaterialKind::File(FileRole::PureRef) => "pureref",
            MaterialKind::File(FileRole::Notes) => "notes",
            MaterialKind::Folder { .. } => "folder",
            MaterialKind::Image(_) => "image",
            MaterialKind::Keyframe(_) => "keyframe",
            MaterialKind::Reference(_) => "reference",
        }
    }

    pub fn children(&self) -> &[MaterialId] {
        match &self.kind {
            MaterialKind::Folder { children } => children,
            _ => &[],
        }
    }

    pub(crate) fn push_child(&mut self, child: MaterialId) -> bool {
        match &mut self.kind {
            MaterialKind::Folder { children } => {
                children.push(child);
                true
            }
            _ => false,
        }
    }

    /// Image payload for image-backed variants
    pub fn image_info(&self) -> Option<&ImageInfo> {
        match &self.kind {
            MaterialKind::Image(info) => Some(info),
            MaterialKind::Keyframe(kf) => Some(&kf.image),
            MaterialKind::Reference(reference) => Some(&reference.image),
            _ => None,
        }
    }

    pub fn as_keyframe(&self) -> Option<&Keyframe> {
        match &self.kind {
            MaterialKind::Keyframe(kf) => Some(kf),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match &self.kind {
            MaterialKind::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn as_reference_mut(&mut self) -> Option<&mut Reference> {
        match &mut self.kind {
            MaterialKind::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn width(&self) -> Result<u32> {
        Ok(self.dimensions()?.0)
    }

    pub fn height(&self) -> Result<u32> {
        Ok(self.dimensions()?.1)
    }

    fn dimensions(&self) -> Result<(u32, u32)> {
        let info = self.image_info().ok_or_else(|| {
            Error::with_message(
                Code::FileNotValid,
                format!("{} is not an image material", self.header.path().display()),
            )
        })?;
        info.dimensions(self.header.path())
    }

    pub fn extension(&self) -> Option<String> {
        fs::file_extension_of(self.header.path())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        fs::file_to_bytes(self.header.path())
    }

    pub fn to_base64(&self) -> Result<String> {
        fs::file_to_base64(self.header.path())
    }
}
