//! Series: naming convention, episodes and elements

use crate::identity::{self, CutIdentity};
use crate::ids::{CatalogRef, CompanyId, ElementId, EpisodeId};
use crate::materials::Element;
use crate::naming::NamingConvention;
use crate::tags::TagIndex;
use setman_common::Result;
use uuid::Uuid;

/// One series (season) of a company's production
///
/// The compiled convention is replaced only through
/// [`Series::set_naming_convention`], so it always matches the template.
#[derive(Debug, Clone)]
pub struct Series {
    uuid: Uuid,
    company: CompanyId,
    code: String,
    season: u32,
    convention: NamingConvention,
    pub(crate) episodes: Vec<EpisodeId>,
    pub(crate) elements: Vec<Element>,
    pub(crate) tags: TagIndex<CatalogRef>,
}

impl Series {
    pub(crate) fn new(
        uuid: Uuid,
        company: CompanyId,
        code: String,
        season: u32,
        convention: NamingConvention,
    ) -> Self {
        Self {
            uuid,
            company,
            code,
            season,
            convention,
            episodes: Vec::new(),
            elements: Vec::new(),
            tags: TagIndex::new(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn company(&self) -> CompanyId {
        self.company
    }

    /// Series code, unique within its company
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn season(&self) -> u32 {
        self.season
    }

    pub fn naming_convention(&self) -> &NamingConvention {
        &self.convention
    }

    /// Replace the template; the old convention stays when compilation fails
    pub fn set_naming_convention(&mut self, template: &str) -> Result<()> {
        self.convention = NamingConvention::compile(template)?;
        tracing::info!(series = %self.code, template = %template, "Naming convention updated");
        Ok(())
    }

    pub fn parse_cut_name(&self, name: &str) -> Option<CutIdentity> {
        identity::parse_cut_name(&self.convention, name)
    }

    pub fn episodes(&self) -> &[EpisodeId] {
        &self.episodes
    }

    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements
            .iter()
            .enumerate()
            .map(|(i, e)| (ElementId(i), e))
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id.0)
    }

    pub fn add_element(&mut self, element: Element) -> ElementId {
        let id = ElementId(self.elements.len());
        self.elements.push(element);
        id
    }

    /// First element whose name or alias equals `name`
    pub fn find_element(&self, name: &str) -> Option<ElementId> {
        self.elements
            .iter()
            .position(|e| e.is_named(name))
            .map(ElementId)
    }

    pub fn find_element_by_uuid(&self, uuid: Uuid) -> Option<ElementId> {
        self.elements
            .iter()
            .position(|e| e.uuid() == uuid)
            .map(ElementId)
    }

    /// Materials across all episodes carrying `tag`, as of the last
    /// [`crate::Catalog::refresh_series_tags`]
    pub fn mentions_tag<'a>(&'a self, tag: &str) -> impl Iterator<Item = CatalogRef> + 'a {
        self.tags.mentions(tag)
    }
}
