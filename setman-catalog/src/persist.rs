//! Catalog snapshots as relational rows
//!
//! [`Catalog::to_rows`] flattens the arenas into the row shapes of the
//! catalog store; [`Catalog::from_rows`] rebuilds the arenas from them.
//! Derived state (tag indices, element mentions, cached image dimensions) is
//! not stored and must be refreshed after loading.

use crate::catalog::Catalog;
use crate::cut::Cut;
use crate::identity::{CutIdentity, Stage};
use crate::ids::{CompanyId, EpisodeId, MaterialId, MaterialRef, SeriesId};
use crate::lifecycle::{History, Status, StatusEntry};
use crate::materials::{
    Element, ElementCategory, FileRole, ImageInfo, Keyframe, Material, MaterialHeader,
    MaterialKind, Reference,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use setman_common::db::{
    CompanyRow, ElementRow, EpisodeRow, HistoryRow, MaterialRow, SeriesRow, TagRow,
};
use setman_common::{time, uuid_utils, Code, Error, Result};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use uuid::Uuid;

/// `materials.type` label of cut folders
pub const CUT_FOLDER_TYPE: &str = "cut_folder";

/// Full catalog snapshot, one vector per table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRows {
    pub companies: Vec<CompanyRow>,
    pub series: Vec<SeriesRow>,
    pub elements: Vec<ElementRow>,
    pub episodes: Vec<EpisodeRow>,
    pub materials: Vec<MaterialRow>,
    pub tags: Vec<TagRow>,
    pub history: Vec<HistoryRow>,
}

/// Per-variant fields stored in `materials.payload`
#[derive(Debug, Default, Serialize, Deserialize)]
struct Payload {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    notes: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    alias: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    identity: Option<CutIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cel: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stage: Option<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    external_id: Option<String>,
    /// Element uuids
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    subjects: Vec<Uuid>,
}

impl Payload {
    fn from_header(header: &MaterialHeader) -> Self {
        Self {
            notes: header.notes().to_string(),
            alias: header.alias().to_string(),
            ..Default::default()
        }
    }

    fn apply_to(&self, header: &mut MaterialHeader) {
        header.set_notes(self.notes.clone());
        header.set_alias(self.alias.clone());
    }
}

impl Catalog {
    /// Flatten the catalog into table rows
    pub fn to_rows(&self) -> Result<CatalogRows> {
        let mut rows = CatalogRows::default();

        for (_, company) in self.companies() {
            rows.companies.push(CompanyRow {
                uuid: company.uuid().to_string(),
                name: company.name().to_string(),
                root: company.root().map(|p| p.display().to_string()),
            });

            for &sid in company.series() {
                let Some(series) = self.series(sid) else {
                    continue;
                };
                rows.series.push(SeriesRow {
                    uuid: series.uuid().to_string(),
                    parent_company_uuid: company.uuid().to_string(),
                    name: series.code().to_string(),
                    naming_convention: series.naming_convention().template().to_string(),
                    season: i64::from(series.season()),
                });

                for (_, element) in series.elements() {
                    rows.elements.push(ElementRow {
                        uuid: element.uuid().to_string(),
                        parent_series_uuid: series.uuid().to_string(),
                        name: element.name().to_string(),
                        category: element.category().to_string(),
                        aliases: serde_json::to_string(element.aliases())?,
                        tags: serde_json::to_string(element.tags())?,
                    });
                }

                for &eid in series.episodes() {
                    self.episode_rows(series.uuid(), eid, &mut rows)?;
                }
            }
        }

        Ok(rows)
    }

    fn episode_rows(&self, series_uuid: Uuid, eid: EpisodeId, rows: &mut CatalogRows) -> Result<()> {
        let Some(episode) = self.episode(eid) else {
            return Ok(());
        };
        let episode_uuid = episode.uuid().to_string();

        rows.episodes.push(EpisodeRow {
            uuid: episode_uuid.clone(),
            parent_series_uuid: series_uuid.to_string(),
            number: i64::from(episode.number()),
            location: episode.root().display().to_string(),
            up_folder: Some(episode.up_folder().display().to_string()),
            cels_folder: Some(episode.cels_folder().display().to_string()),
            notes: episode.notes().to_string(),
        });

        let mut parents: HashMap<MaterialId, Uuid> = HashMap::new();

        for (_, cut) in episode.cuts() {
            let header = cut.header();
            let mut payload = Payload::from_header(header);
            payload.identity = Some(cut.identifier().clone());

            rows.materials.push(MaterialRow {
                uuid: header.uuid().to_string(),
                parent_episode_uuid: episode_uuid.clone(),
                parent_uuid: None,
                kind: CUT_FOLDER_TYPE.to_string(),
                path: header.path().display().to_string(),
                payload: Some(serde_json::to_string(&payload)?),
            });
            push_tags(header, &mut rows.tags);

            for (seq, entry) in cut.history().entries().iter().enumerate() {
                rows.history.push(HistoryRow {
                    material_uuid: header.uuid().to_string(),
                    seq: seq as i64,
                    status: entry.status.to_string(),
                    recorded_at: entry.recorded_at.to_rfc3339(),
                });
            }

            for &child in cut.children() {
                parents.insert(child, header.uuid());
            }
        }

        for (_, material) in episode.materials() {
            for &child in material.children() {
                parents.insert(child, material.uuid());
            }
        }

        for (id, material) in episode.materials() {
            let header = material.header();
            let mut payload = Payload::from_header(header);
            match material.kind() {
                MaterialKind::Keyframe(keyframe) => {
                    payload.cel = Some(keyframe.cel);
                    payload.stage = Some(keyframe.stage);
                }
                MaterialKind::Reference(reference) => {
                    payload.date = reference.date;
                    payload.external_id = reference.external_id.clone();
                    let series = self.series(episode.series());
                    payload.subjects = reference
                        .subjects
                        .iter()
                        .filter_map(|&e| series.and_then(|s| s.element(e)).map(Element::uuid))
                        .collect();
                }
                _ => {}
            }

            rows.materials.push(MaterialRow {
                uuid: header.uuid().to_string(),
                parent_episode_uuid: episode_uuid.clone(),
                parent_uuid: parents.get(&id).map(Uuid::to_string),
                kind: material.type_label().to_string(),
                path: header.path().display().to_string(),
                payload: Some(serde_json::to_string(&payload)?),
            });
            push_tags(header, &mut rows.tags);
        }

        Ok(())
    }

    /// Rebuild a catalog from table rows
    ///
    /// Naming conventions are recompiled, so a stored template that no longer
    /// compiles fails the load with `parse_failed`. Rows whose parent is
    /// missing fail with `database_error`.
    pub fn from_rows(rows: &CatalogRows) -> Result<Catalog> {
        let mut catalog = Catalog::new();

        let mut companies: HashMap<Uuid, CompanyId> = HashMap::new();
        for row in &rows.companies {
            let uuid = uuid_utils::parse(&row.uuid)?;
            let id = catalog.add_company_with_uuid(uuid, row.name.clone(), row.root.as_ref().map(PathBuf::from));
            companies.insert(uuid, id);
        }

        let mut series: HashMap<Uuid, SeriesId> = HashMap::new();
        for row in &rows.series {
            let uuid = uuid_utils::parse(&row.uuid)?;
            let company = lookup(&companies, &row.parent_company_uuid, "series", &row.uuid)?;
            let season = stored_number(row.season, "season of series", &row.uuid)?;
            let id = catalog.add_series_with_uuid(
                company,
                uuid,
                row.name.clone(),
                &row.naming_convention,
                season,
            )?;
            series.insert(uuid, id);
        }

        for row in &rows.elements {
            let sid = lookup(&series, &row.parent_series_uuid, "element", &row.uuid)?;
            let category = row
                .category
                .parse::<ElementCategory>()
                .unwrap_or(ElementCategory::Other);
            let mut element = Element::with_uuid(uuid_utils::parse(&row.uuid)?, row.name.clone(), category);
            for alias in serde_json::from_str::<Vec<String>>(&row.aliases)? {
                element.add_alias(alias);
            }
            for tag in serde_json::from_str::<Vec<String>>(&row.tags)? {
                element.add_tag(tag);
            }
            if let Some(s) = catalog.series_mut(sid) {
                s.add_element(element);
            }
        }

        let mut episodes: HashMap<Uuid, EpisodeId> = HashMap::new();
        for row in &rows.episodes {
            let uuid = uuid_utils::parse(&row.uuid)?;
            let sid = lookup(&series, &row.parent_series_uuid, "episode", &row.uuid)?;
            let number = stored_number(row.number, "number of episode", &row.uuid)?;
            let id = catalog.add_episode_with_uuid(sid, uuid, number, PathBuf::from(&row.location))?;
            if let Some(episode) = catalog.episode_mut(id) {
                if let Some(up) = &row.up_folder {
                    episode.set_up_folder(up);
                }
                if let Some(cels) = &row.cels_folder {
                    episode.set_cels_folder(cels);
                }
                episode.set_notes(row.notes.clone());
            }
            episodes.insert(uuid, id);
        }

        let mut tags: HashMap<&str, Vec<&str>> = HashMap::new();
        for row in &rows.tags {
            tags.entry(row.material_uuid.as_str())
                .or_default()
                .push(row.tag.as_str());
        }

        let mut history: HashMap<&str, Vec<&HistoryRow>> = HashMap::new();
        for row in &rows.history {
            history.entry(row.material_uuid.as_str()).or_default().push(row);
        }

        // First pass creates every entry, second pass links children
        let mut placed: HashMap<Uuid, (EpisodeId, MaterialRef)> = HashMap::new();
        let mut pending: Vec<(EpisodeId, MaterialId, Option<Uuid>)> = Vec::new();

        for row in &rows.materials {
            let uuid = uuid_utils::parse(&row.uuid)?;
            let eid = lookup(&episodes, &row.parent_episode_uuid, "material", &row.uuid)?;
            let payload: Payload = match &row.payload {
                Some(json) => serde_json::from_str(json)?,
                None => Payload::default(),
            };

            let mut header = MaterialHeader::with_uuid(uuid, PathBuf::from(&row.path));
            payload.apply_to(&mut header);
            for tag in tags.get(row.uuid.as_str()).into_iter().flatten() {
                header.add_tag(*tag);
            }

            if row.kind == CUT_FOLDER_TYPE {
                let entries = history
                    .get_mut(row.uuid.as_str())
                    .map(|rows| restore_history(rows))
                    .transpose()?
                    .unwrap_or_default();
                let identity = payload.identity.clone().unwrap_or_default();
                let cut = Cut::restore(header, eid, identity, History::from_entries(entries))?;
                let episode = catalog
                    .episode_mut(eid)
                    .ok_or_else(|| orphan("material", &row.uuid))?;
                let id = episode.restore_cut(cut)?;
                placed.insert(uuid, (eid, MaterialRef::Cut(id)));
                continue;
            }

            let kind = restore_kind(&catalog, eid, &row.kind, &payload)?;
            let episode = catalog
                .episode_mut(eid)
                .ok_or_else(|| orphan("material", &row.uuid))?;
            let id = episode.restore_material(Material::new(header, kind));
            placed.insert(uuid, (eid, MaterialRef::Material(id)));

            let parent = row.parent_uuid.as_deref().map(uuid_utils::parse).transpose()?;
            pending.push((eid, id, parent));
        }

        for (eid, id, parent) in pending {
            let parent = match parent {
                Some(uuid) => match placed.get(&uuid) {
                    Some(&(parent_episode, parent_ref)) if parent_episode == eid => Some(parent_ref),
                    _ => {
                        return Err(Error::with_message(
                            Code::DatabaseError,
                            format!("Material parent {} not found in its episode", uuid),
                        ))
                    }
                },
                None => None,
            };
            if let Some(episode) = catalog.episode_mut(eid) {
                episode.attach_restored(parent, id);
            }
        }

        tracing::info!(
            companies = rows.companies.len(),
            series = rows.series.len(),
            episodes = rows.episodes.len(),
            materials = rows.materials.len(),
            "Restored catalog from rows"
        );

        Ok(catalog)
    }
}

fn push_tags(header: &MaterialHeader, tags: &mut Vec<TagRow>) {
    for tag in header.tags() {
        tags.push(TagRow {
            material_uuid: header.uuid().to_string(),
            tag: tag.clone(),
        });
    }
}

fn restore_history(rows: &mut [&HistoryRow]) -> Result<Vec<StatusEntry>> {
    rows.sort_by_key(|r| r.seq);
    rows.iter()
        .map(|r| -> Result<StatusEntry> {
            Ok(StatusEntry {
                status: r.status.parse::<Status>()?,
                recorded_at: time::parse_rfc3339(&r.recorded_at)?,
            })
        })
        .collect()
}

fn restore_kind(catalog: &Catalog, eid: EpisodeId, label: &str, payload: &Payload) -> Result<MaterialKind> {
    let kind = match label {
        "file" => MaterialKind::File(FileRole::Generic),
        "clipstudio" => MaterialKind::File(FileRole::ClipStudio),
        "pureref" => MaterialKind::File(FileRole::PureRef),
        "notes" => MaterialKind::File(FileRole::Notes),
        "folder" => MaterialKind::Folder {
            children: Vec::new(),
        },
        "image" => MaterialKind::Image(ImageInfo::new()),
        "keyframe" => MaterialKind::Keyframe(Keyframe::new(
            payload.cel.unwrap_or('A'),
            payload.stage.unwrap_or(Stage::Other),
        )),
        "reference" => {
            let series = catalog
                .episode(eid)
                .and_then(|e| catalog.series(e.series()));
            let subjects: BTreeSet<_> = payload
                .subjects
                .iter()
                .filter_map(|&uuid| series.and_then(|s| s.find_element_by_uuid(uuid)))
                .collect();
            let mut reference = Reference::new(subjects);
            reference.date = payload.date;
            reference.external_id = payload.external_id.clone();
            MaterialKind::Reference(reference)
        }
        other => {
            return Err(Error::with_message(
                Code::ParseFailed,
                format!("Unknown material type '{}'", other),
            ))
        }
    };
    Ok(kind)
}

fn lookup<T: Copy>(ids: &HashMap<Uuid, T>, parent: &str, kind: &str, uuid: &str) -> Result<T> {
    uuid_utils::parse(parent)
        .ok()
        .and_then(|p| ids.get(&p).copied())
        .ok_or_else(|| orphan(kind, uuid))
}

fn orphan(kind: &str, uuid: &str) -> Error {
    Error::with_message(
        Code::DatabaseError,
        format!("Parent of {} {} not found", kind, uuid),
    )
}

fn stored_number(value: i64, what: &str, uuid: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        Error::with_message(
            Code::DatabaseError,
            format!("Invalid {} {}: {}", what, uuid, value),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::Material;
    use std::path::Path;

    fn sample() -> (Catalog, EpisodeId) {
        let mut catalog = Catalog::new();
        let company = catalog.add_company("Studio", Some(PathBuf::from("/prod")));
        let series = catalog
            .add_series(company, "ABC", "{series}_{episode}_{scene}_{cut}{stage}", 2)
            .unwrap();
        let hero = catalog
            .series_mut(series)
            .unwrap()
            .add_element(Element::new("Aoi", ElementCategory::Character));
        let episode = catalog.add_episode(series, 1, "/prod/abc/ep01").unwrap();

        let cut = catalog
            .add_cut(episode, Path::new("/prod/abc/ep01/ABC_01_02_003lo"))
            .unwrap();
        let ep = catalog.episode_mut(episode).unwrap();
        ep.mark_cut(cut, Status::InProgress).unwrap();
        ep.header_mut(MaterialRef::Cut(cut)).unwrap().add_tag("rain");
        ep.add_child(
            MaterialRef::Cut(cut),
            Material::keyframe("/prod/abc/ep01/ABC_01_02_003lo/A0001.png", 'A', Stage::Lo),
        )
        .unwrap();

        let folder = ep.add_material(Material::folder("/prod/abc/ep01/refs"));
        let subjects: BTreeSet<_> = [hero].into_iter().collect();
        ep.add_child(
            MaterialRef::Material(folder),
            Material::reference("/prod/abc/ep01/refs/aoi.png", subjects),
        )
        .unwrap();

        (catalog, episode)
    }

    #[test]
    fn test_rows_shape() {
        let (catalog, _) = sample();
        let rows = catalog.to_rows().unwrap();
        assert_eq!(rows.companies.len(), 1);
        assert_eq!(rows.series[0].naming_convention, "{series}_{episode}_{scene}_{cut}{stage}");
        assert_eq!(rows.materials.len(), 4);
        assert_eq!(rows.materials[0].kind, CUT_FOLDER_TYPE);
        assert_eq!(rows.history.len(), 2);
        assert_eq!(rows.tags.len(), 1);
        assert_eq!(rows.materials[1].parent_uuid.as_deref(), Some(rows.materials[0].uuid.as_str()));
    }

    #[test]
    fn test_rows_restore_catalog() {
        let (catalog, _) = sample();
        let rows = catalog.to_rows().unwrap();
        let restored = Catalog::from_rows(&rows).unwrap();

        assert_eq!(restored.to_rows().unwrap(), rows);

        let (_, company) = restored.companies().next().unwrap();
        let sid = company.series()[0];
        let eid = restored.find_episode(sid, 1).unwrap();
        let ep = restored.episode(eid).unwrap();
        let cut = ep.find_cut(3)[0];
        assert_eq!(ep.cut(cut).unwrap().status(), Status::InProgress);
        assert_eq!(ep.cut(cut).unwrap().children().len(), 1);
        assert!(restored.identifier_matches_name(eid, cut));

        let reference = ep
            .materials()
            .find_map(|(_, m)| m.as_reference())
            .unwrap();
        assert_eq!(reference.subjects.len(), 1);
    }

    #[test]
    fn test_delivered_cut_restores_archived() {
        let (mut catalog, episode) = sample();
        let ep = catalog.episode_mut(episode).unwrap();
        let mut delivered = Cut::new(
            episode,
            "/prod/abc/ep01/up/ABC_01_02_004lo",
            CutIdentity {
                scene: Some(2),
                number: Some(4),
                stage: Some("lo".into()),
                ..Default::default()
            },
        )
        .unwrap();
        delivered.mark(Status::Up);
        ep.insert_cut(delivered).unwrap();

        let restored = Catalog::from_rows(&catalog.to_rows().unwrap()).unwrap();
        let uuid = catalog.episode(episode).unwrap().uuid();
        let ep = restored
            .episode(restored.find_episode_by_uuid(uuid).unwrap())
            .unwrap();
        assert_eq!(ep.archived().len(), 1);
        assert_eq!(ep.active().len(), 1);
    }

    #[test]
    fn test_orphan_rows_rejected() {
        let (catalog, _) = sample();
        let mut rows = catalog.to_rows().unwrap();
        rows.episodes[0].parent_series_uuid = Uuid::new_v4().to_string();
        let err = Catalog::from_rows(&rows).unwrap_err();
        assert_eq!(err.code(), Code::DatabaseError);
    }

    #[test]
    fn test_negative_numbers_rejected() {
        let (catalog, _) = sample();
        let mut rows = catalog.to_rows().unwrap();
        rows.episodes[0].number = -1;
        let err = Catalog::from_rows(&rows).unwrap_err();
        assert_eq!(err.code(), Code::DatabaseError);

        let mut rows = catalog.to_rows().unwrap();
        rows.series[0].season = i64::from(u32::MAX) + 1;
        let err = Catalog::from_rows(&rows).unwrap_err();
        assert_eq!(err.code(), Code::DatabaseError);
    }

    #[test]
    fn test_conflicting_cut_rows_rejected() {
        let (catalog, _) = sample();
        let mut rows = catalog.to_rows().unwrap();
        let mut twin = rows.materials[0].clone();
        twin.uuid = Uuid::new_v4().to_string();
        twin.path = "/prod/abc/ep01/ABC_01_02_003LO".to_string();
        rows.materials.push(twin);

        let err = Catalog::from_rows(&rows).unwrap_err();
        assert_eq!(err.code(), Code::ExistingCutConflicts);
    }
}
