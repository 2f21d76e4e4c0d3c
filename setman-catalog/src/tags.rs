//! Pull-based tag index
//!
//! Maps a tag string to the set of materials carrying it. The index is a
//! snapshot: it is only valid until the next tag mutation on any indexed
//! material, and owners must call their `refresh_tags()` to rebuild it.

use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
pub struct TagIndex<R> {
    buckets: BTreeMap<String, BTreeSet<R>>,
}

impl<R: Ord + Copy> TagIndex<R> {
    pub fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    pub fn insert(&mut self, tag: &str, material: R) {
        self.buckets
            .entry(tag.to_string())
            .or_default()
            .insert(material);
    }

    /// Materials carrying `tag` as of the last rebuild
    pub fn mentions(&self, tag: &str) -> impl Iterator<Item = R> + '_ {
        self.buckets.get(tag).into_iter().flatten().copied()
    }

    pub fn get(&self, tag: &str) -> Option<&BTreeSet<R>> {
        self.buckets.get(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl<R: Ord + Copy> Default for TagIndex<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut index: TagIndex<u32> = TagIndex::new();
        index.insert("hero", 1);
        index.insert("hero", 2);
        index.insert("night", 2);

        assert_eq!(index.mentions("hero").collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(index.mentions("night").collect::<Vec<_>>(), vec![2]);
        assert_eq!(index.mentions("missing").count(), 0);
        assert_eq!(index.tags().collect::<Vec<_>>(), vec!["hero", "night"]);
    }

    #[test]
    fn test_duplicate_insert_is_idempotent() {
        let mut index: TagIndex<u32> = TagIndex::new();
        index.insert("a", 7);
        index.insert("a", 7);
        assert_eq!(index.get("a").map(|s| s.len()), Some(1));
    }

    #[test]
    fn test_clear_empties_index() {
        let mut index: TagIndex<u32> = TagIndex::new();
        index.insert("a", 1);
        index.clear();
        assert!(index.is_empty());
    }
}
