//! Production elements
//!
//! An element is a recurring subject (character, prop, background) owned by a
//! series. Its mention set is derived: it is rebuilt by
//! `Catalog::refresh_element_mentions` and is stale after any tag change.

use crate::ids::CatalogRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use setman_common::uuid_utils;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementCategory {
    Character,
    Background,
    Prop,
    Reference,
    Other,
}

impl ElementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementCategory::Character => "character",
            ElementCategory::Background => "background",
            ElementCategory::Prop => "prop",
            ElementCategory::Reference => "reference",
            ElementCategory::Other => "other",
        }
    }
}

impl fmt::Display for ElementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementCategory {
    type Err = std::convert::Infallible;

    /// Unknown labels fall back to `Other`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "character" => ElementCategory::Character,
            "background" => ElementCategory::Background,
            "prop" => ElementCategory::Prop,
            "reference" => ElementCategory::Reference,
            _ => ElementCategory::Other,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    uuid: Uuid,
    name: String,
    category: ElementCategory,
    aliases: Vec<String>,
    tags: Vec<String>,
    mentions: BTreeSet<CatalogRef>,
}

impl Element {
    pub fn new(name: impl Into<String>, category: ElementCategory) -> Self {
        Self::with_uuid(uuid_utils::generate(), name, category)
    }

    pub fn with_uuid(uuid: Uuid, name: impl Into<String>, category: ElementCategory) -> Self {
        Self {
            uuid,
            name: name.into(),
            category,
            aliases: Vec::new(),
            tags: Vec::new(),
            mentions: BTreeSet::new(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> ElementCategory {
        self.category
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Swap the name with the alias at `index`
    pub fn alias_to_name(&mut self, index: usize) -> bool {
        match self.aliases.get_mut(index) {
            Some(alias) => {
                std::mem::swap(alias, &mut self.name);
                true
            }
            None => false,
        }
    }

    // aliases

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn add_alias(&mut self, alias: impl Into<String>) {
        self.aliases.push(alias.into());
    }

    pub fn delete_alias(&mut self, index: usize) -> Option<String> {
        (index < self.aliases.len()).then(|| self.aliases.remove(index))
    }

    pub fn rename_alias(&mut self, index: usize, alias: impl Into<String>) -> bool {
        match self.aliases.get_mut(index) {
            Some(slot) => {
                *slot = alias.into();
                true
            }
            None => false,
        }
    }

    pub fn has_alias(&self, alias: &str) -> bool {
        self.aliases.iter().any(|a| a == alias)
    }

    // tags

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.push(tag.into());
    }

    pub fn delete_tag(&mut self, index: usize) -> Option<String> {
        (index < self.tags.len()).then(|| self.tags.remove(index))
    }

    pub fn rename_tag(&mut self, index: usize, tag: impl Into<String>) -> bool {
        match self.tags.get_mut(index) {
            Some(slot) => {
                *slot = tag.into();
                true
            }
            None => false,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    // mentions

    /// True if `tag` is this element's name or one of its aliases
    pub fn is_named(&self, tag: &str) -> bool {
        self.name == tag || self.has_alias(tag)
    }

    /// Materials naming this element, as of the last refresh
    pub fn mentions(&self) -> &BTreeSet<CatalogRef> {
        &self.mentions
    }

    pub(crate) fn clear_mentions(&mut self) {
        self.mentions.clear();
    }

    pub(crate) fn add_mention(&mut self, material: CatalogRef) {
        self.mentions.insert(material);
    }
}
