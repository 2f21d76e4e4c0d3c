//! Image-backed material payloads

use crate::identity::Stage;
use crate::ids::ElementId;
use chrono::NaiveDate;
use once_cell::unsync::OnceCell;
use setman_common::{Code, Error, Result};
use std::collections::BTreeSet;
use std::path::Path;

/// Lazily probed image dimensions
///
/// Only a successful probe is cached; a failed probe is retried next call.
#[derive(Debug, Clone, Default)]
pub struct ImageInfo {
    dimensions: OnceCell<(u32, u32)>,
}

impl ImageInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(width, height)` read from the image header
    pub fn dimensions(&self, path: &Path) -> Result<(u32, u32)> {
        self.dimensions
            .get_or_try_init(|| {
                image::image_dimensions(path).map_err(|e| {
                    Error::with_message(
                        Code::FileNotValid,
                        format!("Could not determine image dimensions of {}: {}", path.display(), e),
                    )
                })
            })
            .copied()
    }

    pub fn is_cached(&self) -> bool {
        self.dimensions.get().is_some()
    }
}

/// A key drawing, tagged with its cel letter and pipeline stage
#[derive(Debug, Clone)]
pub struct Keyframe {
    pub image: ImageInfo,
    pub cel: char,
    pub stage: Stage,
}

impl Keyframe {
    pub fn new(cel: char, stage: Stage) -> Self {
        Self {
            image: ImageInfo::new(),
            cel,
            stage,
        }
    }

    /// File name with a leading cel letter removed
    pub fn identifier(&self, file_name: &str) -> String {
        match file_name.strip_prefix(self.cel) {
            Some(rest) => rest.to_string(),
            None => file_name.to_string(),
        }
    }
}

/// A reference board image and the elements it depicts
#[derive(Debug, Clone, Default)]
pub struct Reference {
    pub image: ImageInfo,
    pub date: Option<NaiveDate>,
    pub external_id: Option<String>,
    pub subjects: BTreeSet<ElementId>,
}

impl Reference {
    pub fn new(subjects: BTreeSet<ElementId>) -> Self {
        Self {
            subjects,
            ..Default::default()
        }
    }
}
