//! Byte-range index of replayable tags

use crate::demux::TagStore;
use crate::media::flv::{Tag, TagKind};

/// Location of one full tag (envelope + payload) in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRange {
    pub kind: TagKind,
    /// Offset of the tag type byte
    pub offset: u64,
    /// Envelope plus payload size
    pub size: u64,
    /// Composite timestamp in milliseconds
    pub timestamp: u32,
}

impl TagRange {
    pub fn from_tag(tag: &Tag) -> Self {
        Self {
            kind: tag.kind,
            offset: tag.envelope_offset(),
            size: tag.tag_size(),
            timestamp: tag.composite_timestamp(),
        }
    }

    /// Offset one past the last byte of the tag
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// Metadata tag plus every video tag, in stream order
#[derive(Debug, Clone, Default)]
pub struct ReplayIndex {
    metadata: Option<TagRange>,
    videos: Vec<TagRange>,
}

impl ReplayIndex {
    /// Index the first script data tag and all video tags of a scan
    pub fn from_store(store: &TagStore) -> Self {
        let metadata = store.iter_kind(TagKind::ScriptData).next().map(TagRange::from_tag);
        let videos: Vec<TagRange> = store
            .iter_kind(TagKind::Video)
            .map(TagRange::from_tag)
            .collect();

        tracing::debug!(
            has_metadata = metadata.is_some(),
            videos = videos.len(),
            "Replay index built"
        );

        Self { metadata, videos }
    }

    pub fn metadata(&self) -> Option<&TagRange> {
        self.metadata.as_ref()
    }

    pub fn videos(&self) -> &[TagRange] {
        &self.videos
    }

    pub fn video_count(&self) -> usize {
        self.videos.len()
    }

    /// True if there is nothing to pace
    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demux::FlvScanner;
    use crate::fixtures::{self, FlvBuilder};

    #[test]
    fn test_index_from_store() {
        let data = FlvBuilder::new()
            .audio(0, &[0xAF, 0x01])
            .script(&fixtures::metadata())
            .script(&fixtures::metadata())
            .video(0, &fixtures::avc_sequence_header(fixtures::SPS, fixtures::PPS))
            .video(40, &fixtures::avc_nalus(false, &[&[0x41]]))
            .finish();

        let mut scanner = FlvScanner::open(&data[..]).unwrap();
        scanner.scan().unwrap();
        let store = scanner.store();
        let index = ReplayIndex::from_store(store);

        // First script tag is the second tag in the file
        let second = store.get(1).unwrap();
        let meta = index.metadata().unwrap();
        assert_eq!(meta.kind, TagKind::ScriptData);
        assert_eq!(meta.offset, second.envelope_offset());
        assert_eq!(meta.size, second.tag_size());

        assert_eq!(index.video_count(), 2);
        assert_eq!(index.videos()[1].timestamp, 40);
        assert_eq!(index.videos()[1].end() + 4, data.len() as u64);
        assert!(!index.is_empty());
    }

    #[test]
    fn test_empty_index() {
        let data = FlvBuilder::new().audio(0, &[0xAF, 0x01]).finish();
        let mut scanner = FlvScanner::open(&data[..]).unwrap();
        scanner.scan().unwrap();
        let index = ReplayIndex::from_store(scanner.store());
        assert!(index.is_empty());
        assert!(index.metadata().is_none());
    }
}
