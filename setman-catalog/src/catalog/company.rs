use crate::ids::SeriesId;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Production company owning a set of series
#[derive(Debug, Clone)]
pub struct Company {
    uuid: Uuid,
    name: String,
    root: Option<PathBuf>,
    pub(crate) series: Vec<SeriesId>,
}

impl Company {
    pub(crate) fn new(uuid: Uuid, name: String, root: Option<PathBuf>) -> Self {
        Self {
            uuid,
            name,
            root,
            series: Vec::new(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn series(&self) -> &[SeriesId] {
        &self.series
    }
}
