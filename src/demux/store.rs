//! Ordered tag storage

use crate::media::flv::{Tag, TagKind};

/// Per-kind tag counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagCounts {
    pub audio: usize,
    pub video: usize,
    pub script_data: usize,
}

impl TagCounts {
    pub fn total(&self) -> usize {
        self.audio + self.video + self.script_data
    }
}

/// Append-only, insertion-ordered collection of decoded tags
#[derive(Debug, Clone, Default)]
pub struct TagStore {
    tags: Vec<Tag>,
}

impl TagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tag; returns its index
    pub fn push(&mut self, tag: Tag) -> usize {
        self.tags.push(tag);
        self.tags.len() - 1
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tag> {
        self.tags.get(index)
    }

    pub fn last(&self) -> Option<&Tag> {
        self.tags.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.tags.iter()
    }

    /// Tags of one kind, in insertion order
    pub fn iter_kind(&self, kind: TagKind) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(move |tag| tag.kind == kind)
    }

    pub fn count(&self, kind: TagKind) -> usize {
        self.iter_kind(kind).count()
    }

    pub fn kind_counts(&self) -> TagCounts {
        self.tags
            .iter()
            .fold(TagCounts::default(), |mut counts, tag| {
                match tag.kind {
                    TagKind::Audio => counts.audio += 1,
                    TagKind::Video => counts.video += 1,
                    TagKind::ScriptData => counts.script_data += 1,
                }
                counts
            })
    }

    /// Sum of envelope and payload sizes of every stored tag
    pub fn total_tag_bytes(&self) -> u64 {
        self.tags.iter().map(Tag::tag_size).sum()
    }

    pub fn into_vec(self) -> Vec<Tag> {
        self.tags
    }
}

impl<'a> IntoIterator for &'a TagStore {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

impl IntoIterator for TagStore {
    type Item = Tag;
    type IntoIter = std::vec::IntoIter<Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.into_iter()
    }
}
