//! Arena handles
//!
//! The catalog owns every entity in flat vectors; these are the indices into
//! them. Handles are only meaningful for the catalog (or episode, for cut and
//! material handles) that issued them. Nothing is ever removed from an arena,
//! so a handle stays valid for the life of its owner.

use serde::{Deserialize, Serialize};

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub(crate) usize);

        impl $name {
            pub fn index(&self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(CompanyId);
arena_id!(SeriesId);
arena_id!(EpisodeId);
arena_id!(
    /// Series-scoped element handle
    ElementId
);
arena_id!(
    /// Episode-scoped cut handle
    CutId
);
arena_id!(
    /// Episode-scoped material handle
    MaterialId
);

/// Anything inside an episode that carries tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MaterialRef {
    Cut(CutId),
    Material(MaterialId),
}

/// A [`MaterialRef`] qualified by its episode, for series-wide indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CatalogRef {
    pub episode: EpisodeId,
    pub material: MaterialRef,
}
