//! Row models mirroring the relational catalog store
//!
//! One struct per table. UUIDs and timestamps are kept as text so the rows
//! can be bound to SQLite directly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRow {
    pub uuid: String,
    pub name: String,
    pub root: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRow {
    pub uuid: String,
    pub parent_company_uuid: String,
    /// Series code
    pub name: String,
    pub naming_convention: String,
    pub season: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRow {
    pub uuid: String,
    pub parent_series_uuid: String,
    pub number: i64,
    pub location: String,
    pub up_folder: Option<String>,
    pub cels_folder: Option<String>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRow {
    pub uuid: String,
    pub parent_episode_uuid: String,
    /// Containing folder or cut, when the material is a child
    pub parent_uuid: Option<String>,
    /// Variant label, e.g. `cut_folder`, `image`, `keyframe`
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
    /// Per-variant payload as JSON
    pub payload: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRow {
    pub material_uuid: String,
    pub tag: String,
}

/// One entry of a cut's status history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub material_uuid: String,
    pub seq: i64,
    pub status: String,
    pub recorded_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRow {
    pub uuid: String,
    pub parent_series_uuid: String,
    pub name: String,
    pub category: String,
    /// JSON array
    pub aliases: String,
    /// JSON array
    pub tags: String,
}
