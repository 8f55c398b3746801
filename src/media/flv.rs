//! FLV container types
//!
//! FLV File Structure:
//! ```text
//! +============+==================+==============+==================+
//! | FLV Header | PrevTagSize0 (0) | Tag 1        | PrevTagSize1 ... |
//! | (9 bytes)  | (4 bytes)        | (11+N bytes) | (4 bytes)        |
//! +============+==================+==============+==================+
//! ```
//!
//! FLV Tag Structure:
//! ```text
//! +--------+-------------+-----------+-------------+---------+
//! | Type(1)| DataSize(3) | TS(3+1)   | StreamID(3) | Data(N) |
//! +--------+-------------+-----------+-------------+---------+
//! ```
//!
//! Video Data:
//! ```text
//! +----------+----------+
//! | FrameType| CodecID  | CodecData...
//! | (4 bits) | (4 bits) |
//! +----------+----------+
//! ```

use std::io::Read;

use bytes::Bytes;

use super::h264::AvcPacket;
use crate::cursor::{extract_bits, ByteCursor};
use crate::error::{CursorError, FlvError, Stage};

/// FLV header is always 9 bytes
pub const FLV_HEADER_SIZE: usize = 9;

/// Tag envelope size (type + data size + timestamp + stream id)
pub const TAG_HEADER_SIZE: usize = 11;

/// Width of the PreviousTagSize field preceding every tag
pub const PREVIOUS_TAG_SIZE_LEN: usize = 4;

/// FLV file signature: "FLV" in ASCII
pub const FLV_SIGNATURE: [u8; 3] = [0x46, 0x4C, 0x56];

/// Fixed 9-byte FLV file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub signature: [u8; 3],
    pub version: u8,
    /// bit 0 = audio present, bit 2 = video present
    pub type_flags: u8,
    /// Offset of the first PreviousTagSize field
    pub data_offset: u32,
}

impl ContainerHeader {
    /// Read the header from the start of the source
    ///
    /// The signature and version are not validated.
    pub fn read<R: Read>(cursor: &mut ByteCursor<R>) -> Result<Self, FlvError> {
        let at = |e: CursorError| FlvError::at(Stage::Header, e);
        let signature = cursor.read_array::<3>().map_err(at)?;
        let version = cursor.read_u8().map_err(at)?;
        let type_flags = cursor.read_u8().map_err(at)?;
        let data_offset = cursor.read_u32().map_err(at)?;

        let header = ContainerHeader {
            signature,
            version,
            type_flags,
            data_offset,
        };

        tracing::debug!(
            version,
            has_audio = header.has_audio(),
            has_video = header.has_video(),
            data_offset,
            "FLV header"
        );

        Ok(header)
    }

    pub fn has_audio(&self) -> bool {
        extract_bits(self.type_flags, 0, 1) == 1
    }

    pub fn has_video(&self) -> bool {
        extract_bits(self.type_flags, 2, 1) == 1
    }

    /// Whether the signature reads "FLV" (diagnostic only)
    pub fn is_flv_signature(&self) -> bool {
        self.signature == FLV_SIGNATURE
    }
}

/// FLV tag kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Audio,
    Video,
    ScriptData,
}

impl TagKind {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            8 => Some(TagKind::Audio),
            9 => Some(TagKind::Video),
            18 => Some(TagKind::ScriptData),
            _ => None,
        }
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            TagKind::Audio => 8,
            TagKind::Video => 9,
            TagKind::ScriptData => 18,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TagKind::Audio => "audio",
            TagKind::Video => "video",
            TagKind::ScriptData => "script data",
        }
    }
}

/// Decoded FLV tag
#[derive(Debug, Clone)]
pub struct Tag {
    pub kind: TagKind,
    /// Exact payload byte count
    pub data_size: u32,
    /// Lower 24 bits of the timestamp in milliseconds
    pub timestamp: u32,
    /// Upper 8 bits of the timestamp
    pub timestamp_extended: u8,
    /// Always 0 in practice
    pub stream_id: u32,
    /// Source position of the first payload byte
    pub byte_offset: u64,
    pub payload: TagPayload,
}

/// Tag payload, by kind
#[derive(Debug, Clone)]
pub enum TagPayload {
    /// Opaque audio data
    Audio(Bytes),
    /// Decoded video data
    Video(VideoPayload),
    /// Raw AMF0 script data
    ScriptData(Bytes),
}

impl Tag {
    /// Full 32-bit timestamp in milliseconds
    pub fn composite_timestamp(&self) -> u32 {
        ((self.timestamp_extended as u32) << 24) | (self.timestamp & 0x00FF_FFFF)
    }

    /// Source position of the tag envelope (tag type byte)
    pub fn envelope_offset(&self) -> u64 {
        self.byte_offset.saturating_sub(TAG_HEADER_SIZE as u64)
    }

    /// Envelope plus payload size
    pub fn tag_size(&self) -> u64 {
        TAG_HEADER_SIZE as u64 + self.data_size as u64
    }

    /// Check if this is a video tag
    pub fn is_video(&self) -> bool {
        self.kind == TagKind::Video
    }

    /// Check if this is an audio tag
    pub fn is_audio(&self) -> bool {
        self.kind == TagKind::Audio
    }

    pub fn is_script_data(&self) -> bool {
        self.kind == TagKind::ScriptData
    }

    pub fn video(&self) -> Option<&VideoPayload> {
        match &self.payload {
            TagPayload::Video(video) => Some(video),
            _ => None,
        }
    }

    pub fn script_data(&self) -> Option<&Bytes> {
        match &self.payload {
            TagPayload::ScriptData(data) => Some(data),
            _ => None,
        }
    }

    /// Check if this is a keyframe
    pub fn is_keyframe(&self) -> bool {
        self.video()
            .map(|v| v.frame_type.is_keyframe())
            .unwrap_or(false)
    }
}

/// Video frame type (upper 4 bits of first byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFrameType {
    /// Keyframe (for AVC, a seekable frame)
    Keyframe,
    /// Inter frame (for AVC, a non-seekable frame)
    InterFrame,
    /// Disposable inter frame (H.263 only)
    DisposableInterFrame,
    /// Generated keyframe (reserved for server use)
    GeneratedKeyframe,
    /// Video info/command frame
    VideoInfoFrame,
    /// Value not defined by the format
    Reserved(u8),
}

impl VideoFrameType {
    pub fn from_bits(bits: u8) -> Self {
        match bits {
            1 => VideoFrameType::Keyframe,
            2 => VideoFrameType::InterFrame,
            3 => VideoFrameType::DisposableInterFrame,
            4 => VideoFrameType::GeneratedKeyframe,
            5 => VideoFrameType::VideoInfoFrame,
            other => VideoFrameType::Reserved(other),
        }
    }

    pub fn bits(&self) -> u8 {
        match self {
            VideoFrameType::Keyframe => 1,
            VideoFrameType::InterFrame => 2,
            VideoFrameType::DisposableInterFrame => 3,
            VideoFrameType::GeneratedKeyframe => 4,
            VideoFrameType::VideoInfoFrame => 5,
            VideoFrameType::Reserved(b) => *b,
        }
    }

    pub fn is_keyframe(&self) -> bool {
        matches!(
            self,
            VideoFrameType::Keyframe | VideoFrameType::GeneratedKeyframe
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            VideoFrameType::Keyframe => "keyframe",
            VideoFrameType::InterFrame => "inter frame",
            VideoFrameType::DisposableInterFrame => "disposable inter frame",
            VideoFrameType::GeneratedKeyframe => "generated keyframe",
            VideoFrameType::VideoInfoFrame => "video info/command frame",
            VideoFrameType::Reserved(_) => "not defined by standard",
        }
    }
}

/// Video codec ID (lower 4 bits of first byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    /// JPEG (currently unused)
    Jpeg,
    /// Sorenson H.263
    SorensonH263,
    /// Screen video
    ScreenVideo,
    /// VP6
    Vp6,
    /// VP6 with alpha
    Vp6Alpha,
    /// Screen video v2
    ScreenVideoV2,
    /// AVC (H.264)
    Avc,
    /// Value not defined by the format
    Other(u8),
}

impl VideoCodec {
    pub fn from_bits(bits: u8) -> Self {
        match bits {
            1 => VideoCodec::Jpeg,
            2 => VideoCodec::SorensonH263,
            3 => VideoCodec::ScreenVideo,
            4 => VideoCodec::Vp6,
            5 => VideoCodec::Vp6Alpha,
            6 => VideoCodec::ScreenVideoV2,
            7 => VideoCodec::Avc,
            other => VideoCodec::Other(other),
        }
    }

    pub fn bits(&self) -> u8 {
        match self {
            VideoCodec::Jpeg => 1,
            VideoCodec::SorensonH263 => 2,
            VideoCodec::ScreenVideo => 3,
            VideoCodec::Vp6 => 4,
            VideoCodec::Vp6Alpha => 5,
            VideoCodec::ScreenVideoV2 => 6,
            VideoCodec::Avc => 7,
            VideoCodec::Other(b) => *b,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VideoCodec::Jpeg => "JPEG",
            VideoCodec::SorensonH263 => "Sorenson H.263",
            VideoCodec::ScreenVideo => "Screen video",
            VideoCodec::Vp6 => "On2 VP6",
            VideoCodec::Vp6Alpha => "On2 VP6 with alpha channel",
            VideoCodec::ScreenVideoV2 => "Screen video version 2",
            VideoCodec::Avc => "AVC",
            VideoCodec::Other(_) => "not defined by standard",
        }
    }
}

/// Decoded video tag payload
#[derive(Debug, Clone)]
pub struct VideoPayload {
    pub frame_type: VideoFrameType,
    pub codec: VideoCodec,
    pub body: VideoBody,
}

/// Video payload body after the header byte
#[derive(Debug, Clone)]
pub enum VideoBody {
    /// AVC packet (codec id 7)
    Avc(AvcPacket),
    /// Any other codec, kept verbatim
    Opaque(Bytes),
}

impl VideoPayload {
    /// Decode a complete video tag payload
    pub fn decode(data: Bytes) -> Result<Self, FlvError> {
        let mut cursor = ByteCursor::new(&data[..]);
        let head = cursor
            .read_u8()
            .map_err(|e| FlvError::at(Stage::VideoPayload, e))?;

        let frame_type = VideoFrameType::from_bits(extract_bits(head, 4, 4));
        let codec = VideoCodec::from_bits(extract_bits(head, 0, 4));

        tracing::debug!(
            frame_type = frame_type.bits(),
            frame = frame_type.name(),
            codec_id = codec.bits(),
            codec = codec.name(),
            "Video tag"
        );

        let rest = data.slice(1..);
        let body = match codec {
            VideoCodec::Avc => VideoBody::Avc(AvcPacket::decode(rest)?),
            _ => VideoBody::Opaque(rest),
        };

        Ok(VideoPayload {
            frame_type,
            codec,
            body,
        })
    }

    pub fn avc(&self) -> Option<&AvcPacket> {
        match &self.body {
            VideoBody::Avc(packet) => Some(packet),
            VideoBody::Opaque(_) => None,
        }
    }

    /// Check if this is an AVC sequence header
    pub fn is_avc_sequence_header(&self) -> bool {
        self.avc().map(|p| p.is_sequence_header()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::h264::AvcPacketType;

    fn tag(kind: TagKind, payload: TagPayload) -> Tag {
        Tag {
            kind,
            data_size: 0,
            timestamp: 0,
            timestamp_extended: 0,
            stream_id: 0,
            byte_offset: 24,
            payload,
        }
    }

    #[test]
    fn test_read_header() {
        let data: &[u8] = &[0x46, 0x4C, 0x56, 0x01, 0x05, 0x00, 0x00, 0x00, 0x09];
        let mut cursor = ByteCursor::new(data);
        let header = ContainerHeader::read(&mut cursor).unwrap();
        assert!(header.is_flv_signature());
        assert_eq!(header.version, 1);
        assert!(header.has_audio());
        assert!(header.has_video());
        assert_eq!(header.data_offset, 9);
        assert_eq!(cursor.position(), FLV_HEADER_SIZE as u64);
    }

    #[test]
    fn test_read_header_permissive() {
        // Wrong signature, video only
        let data: &[u8] = &[0x00, 0x00, 0x00, 0x07, 0x04, 0x00, 0x00, 0x00, 0x0D];
        let header = ContainerHeader::read(&mut ByteCursor::new(data)).unwrap();
        assert!(!header.is_flv_signature());
        assert!(!header.has_audio());
        assert!(header.has_video());
        assert_eq!(header.data_offset, 13);
    }

    #[test]
    fn test_read_header_short() {
        let data: &[u8] = &[0x46, 0x4C, 0x56, 0x01];
        let err = ContainerHeader::read(&mut ByteCursor::new(data)).unwrap_err();
        assert!(matches!(
            err,
            FlvError::ShortRead {
                stage: Stage::Header,
                needed: 1,
                available: 0
            }
        ));
    }

    #[test]
    fn test_tag_kind() {
        assert_eq!(TagKind::from_byte(8), Some(TagKind::Audio));
        assert_eq!(TagKind::from_byte(9), Some(TagKind::Video));
        assert_eq!(TagKind::from_byte(18), Some(TagKind::ScriptData));
        assert_eq!(TagKind::from_byte(10), None);
        assert_eq!(TagKind::ScriptData.as_byte(), 18);
        assert_eq!(TagKind::ScriptData.name(), "script data");
    }

    #[test]
    fn test_video_frame_type_all_values() {
        assert_eq!(VideoFrameType::from_bits(1), VideoFrameType::Keyframe);
        assert_eq!(VideoFrameType::from_bits(2), VideoFrameType::InterFrame);
        assert_eq!(
            VideoFrameType::from_bits(3),
            VideoFrameType::DisposableInterFrame
        );
        assert_eq!(
            VideoFrameType::from_bits(4),
            VideoFrameType::GeneratedKeyframe
        );
        assert_eq!(VideoFrameType::from_bits(5), VideoFrameType::VideoInfoFrame);
        assert_eq!(VideoFrameType::from_bits(0), VideoFrameType::Reserved(0));
        assert_eq!(VideoFrameType::Reserved(6).bits(), 6);
        assert!(VideoFrameType::GeneratedKeyframe.is_keyframe());
        assert!(!VideoFrameType::InterFrame.is_keyframe());
    }

    #[test]
    fn test_video_codec_all_values() {
        assert_eq!(VideoCodec::from_bits(1), VideoCodec::Jpeg);
        assert_eq!(VideoCodec::from_bits(2), VideoCodec::SorensonH263);
        assert_eq!(VideoCodec::from_bits(3), VideoCodec::ScreenVideo);
        assert_eq!(VideoCodec::from_bits(4), VideoCodec::Vp6);
        assert_eq!(VideoCodec::from_bits(5), VideoCodec::Vp6Alpha);
        assert_eq!(VideoCodec::from_bits(6), VideoCodec::ScreenVideoV2);
        assert_eq!(VideoCodec::from_bits(7), VideoCodec::Avc);
        assert_eq!(VideoCodec::from_bits(12), VideoCodec::Other(12));
        assert_eq!(VideoCodec::Avc.name(), "AVC");
    }

    #[test]
    fn test_decode_avc_nalu_payload() {
        // 0x27 = inter frame (2) + AVC (7)
        let data = Bytes::from_static(&[0x27, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x41]);
        let video = VideoPayload::decode(data).unwrap();
        assert_eq!(video.frame_type, VideoFrameType::InterFrame);
        assert_eq!(video.codec, VideoCodec::Avc);
        let packet = video.avc().unwrap();
        assert_eq!(packet.packet_type, AvcPacketType::Nalu);
        assert_eq!(packet.nalus().unwrap().len(), 5);
        assert!(!video.is_avc_sequence_header());
    }

    #[test]
    fn test_decode_non_avc_opaque() {
        // 0x14 = keyframe (1) + VP6 (4)
        let data = Bytes::from_static(&[0x14, 0xDE, 0xAD]);
        let video = VideoPayload::decode(data).unwrap();
        assert_eq!(video.codec, VideoCodec::Vp6);
        assert!(video.avc().is_none());
        assert!(matches!(&video.body, VideoBody::Opaque(b) if b[..] == [0xDE, 0xAD]));
    }

    #[test]
    fn test_decode_empty_video_payload() {
        let err = VideoPayload::decode(Bytes::new()).unwrap_err();
        assert_eq!(err.stage(), Stage::VideoPayload);
    }

    #[test]
    fn test_decode_avc_header_truncated() {
        let err = VideoPayload::decode(Bytes::from_static(&[0x17, 0x00, 0x00])).unwrap_err();
        assert_eq!(err.stage(), Stage::AvcPacket);
    }

    #[test]
    fn test_composite_timestamp() {
        let mut t = tag(TagKind::Audio, TagPayload::Audio(Bytes::new()));
        t.timestamp = 0x00_12_34_56;
        t.timestamp_extended = 0x01;
        assert_eq!(t.composite_timestamp(), 0x01_12_34_56);
    }

    #[test]
    fn test_tag_ranges() {
        let mut t = tag(TagKind::ScriptData, TagPayload::ScriptData(Bytes::new()));
        t.data_size = 100;
        assert_eq!(t.envelope_offset(), 13);
        assert_eq!(t.tag_size(), 111);
        assert!(t.is_script_data());
        assert!(t.script_data().is_some());
        assert!(t.video().is_none());
        assert!(!t.is_keyframe());
    }

    #[test]
    fn test_tag_keyframe() {
        let video = VideoPayload::decode(Bytes::from_static(&[0x17, 0x02, 0x00, 0x00, 0x00])).unwrap();
        let t = tag(TagKind::Video, TagPayload::Video(video));
        assert!(t.is_video());
        assert!(t.is_keyframe());
    }
}
