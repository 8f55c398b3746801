//! Tag-at-a-time FLV reader
//!
//! Each call to [`TagReader::read_tag`] consumes one PreviousTagSize field,
//! one 11-byte envelope and exactly `data_size` payload bytes.

use std::io::Read;

use crate::cursor::ByteCursor;
use crate::error::{CursorError, FlvError, Stage};
use crate::media::flv::{
    ContainerHeader, Tag, TagKind, TagPayload, VideoPayload, FLV_HEADER_SIZE,
    PREVIOUS_TAG_SIZE_LEN, TAG_HEADER_SIZE,
};

/// Sequential FLV tag reader over any byte source
#[derive(Debug)]
pub struct TagReader<R> {
    cursor: ByteCursor<R>,
}

impl<R: Read> TagReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            cursor: ByteCursor::new(inner),
        }
    }

    /// Absolute position in the source
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    pub fn into_inner(self) -> R {
        self.cursor.into_inner()
    }

    /// Read the 9-byte container header
    pub fn read_header(&mut self) -> Result<ContainerHeader, FlvError> {
        ContainerHeader::read(&mut self.cursor)
    }

    /// Skip forward to an absolute offset; offsets behind the cursor are ignored
    pub fn skip_to(&mut self, offset: u64) -> Result<(), FlvError> {
        let position = self.cursor.position();
        if offset <= position {
            return Ok(());
        }
        tracing::debug!(from = position, to = offset, "Skipping to data offset");
        self.cursor
            .skip(offset - position)
            .map_err(|e| FlvError::at(Stage::Header, e))
    }

    /// Skip to the header's data offset when it lies past the fixed header
    pub fn skip_to_data(&mut self, header: &ContainerHeader) -> Result<(), FlvError> {
        if header.data_offset as usize > FLV_HEADER_SIZE {
            self.skip_to(header.data_offset as u64)?;
        }
        Ok(())
    }

    /// Read the next tag
    ///
    /// Returns `Ok(None)` at a clean end of stream: the source ends inside or
    /// right after a PreviousTagSize field.
    pub fn read_tag(&mut self) -> Result<Option<Tag>, FlvError> {
        match self.cursor.read_array::<PREVIOUS_TAG_SIZE_LEN>() {
            Ok(_) => {}
            Err(CursorError::ShortRead { available, .. }) => {
                if available > 0 {
                    tracing::warn!(
                        bytes = available,
                        position = self.cursor.position(),
                        "Trailing bytes after last tag"
                    );
                }
                return Ok(None);
            }
            Err(e) => return Err(FlvError::at(Stage::TagEnvelope, e)),
        }

        let envelope_offset = self.cursor.position();
        let envelope = match self.cursor.read_array::<TAG_HEADER_SIZE>() {
            Ok(envelope) => envelope,
            Err(CursorError::ShortRead { available: 0, .. }) => return Ok(None),
            Err(e) => {
                return Err(FlvError::truncated(Stage::TagEnvelope, envelope_offset, e));
            }
        };

        let kind_byte = envelope[0];
        let data_size = u32::from_be_bytes([0, envelope[1], envelope[2], envelope[3]]);
        let timestamp = u32::from_be_bytes([0, envelope[4], envelope[5], envelope[6]]);
        let timestamp_extended = envelope[7];
        let stream_id = u32::from_be_bytes([0, envelope[8], envelope[9], envelope[10]]);

        let kind = TagKind::from_byte(kind_byte).ok_or(FlvError::UnknownTagKind {
            kind: kind_byte,
            offset: envelope_offset,
        })?;

        let byte_offset = self.cursor.position();

        tracing::debug!(
            kind = kind.name(),
            data_size,
            timestamp,
            timestamp_extended,
            stream_id,
            offset = byte_offset,
            "FLV tag"
        );

        let data = self
            .cursor
            .read_bytes(data_size as usize)
            .map_err(|e| FlvError::truncated(Stage::TagPayload, envelope_offset, e))?;

        let payload = match kind {
            TagKind::Audio => TagPayload::Audio(data),
            TagKind::Video => TagPayload::Video(VideoPayload::decode(data)?),
            TagKind::ScriptData => TagPayload::ScriptData(data),
        };

        Ok(Some(Tag {
            kind,
            data_size,
            timestamp,
            timestamp_extended,
            stream_id,
            byte_offset,
            payload,
        }))
    }
}
