//! setman catalog engine
//!
//! Organises anime production deliverables into a Company → Series → Episode
//! hierarchy, recognises cut folders through per-series naming conventions,
//! and tracks each cut's production status up to delivery.
//!
//! The engine is synchronous and single-writer. An embedding that shares a
//! [`Catalog`] between threads must serialise all mutation of an episode.

pub mod ai;
pub mod catalog;
pub mod conflict;
pub mod cut;
pub mod db;
pub mod identity;
pub mod ids;
pub mod lifecycle;
pub mod materials;
pub mod naming;
pub mod persist;
pub mod tags;

pub use catalog::{Catalog, DoneCut, Episode, ScanRejection, ScanReport, Series};
pub use cut::Cut;
pub use identity::{parse_cut_name, CutIdentity, Stage};
pub use ids::{CatalogRef, CompanyId, CutId, ElementId, EpisodeId, MaterialId, MaterialRef, SeriesId};
pub use lifecycle::{History, Status, StatusEntry};
pub use materials::{Element, ElementCategory, Material, MaterialHeader, MaterialKind};
pub use naming::{Field, NamingConvention};
pub use persist::CatalogRows;
pub use tags::TagIndex;
