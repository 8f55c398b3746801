//! H.264/AVC packet parsing
//!
//! FLV carries H.264 in AVCC format (length-prefixed NAL units).
//!
//! AVC Video Packet Structure (after the video tag header byte):
//! ```text
//! +-----------------+-----------------+------
//! | AVCPacketType   | CompositionTime | Data
//! | (1 byte)        | (3 bytes, SI24) |
//! +-----------------+-----------------+------
//! ```
//!
//! AVCPacketType:
//! - 0: AVC sequence header (AVCDecoderConfigurationRecord)
//! - 1: AVC NALU (one or more NALUs)
//! - 2: AVC end of sequence
//!
//! AVCDecoderConfigurationRecord (sequence header):
//! ```text
//! configurationVersion (1) | AVCProfileIndication (1) | profile_compatibility (1)
//! | AVCLevelIndication (1) | lengthSizeMinusOne (1, lower 2 bits)
//! | numOfSPS (1, lower 5 bits) | spsLength (2) | spsNALUnit
//! | numOfPPS (1) | ppsLength (2) | ppsNALUnit
//! ```
//!
//! Only records with exactly one SPS and one PPS are supported.

use bytes::Bytes;

use crate::cursor::{extract_bits, ByteCursor};
use crate::error::{CursorError, FlvError, ParameterSet, Stage};

/// Size of the AVC packet header (packet type + composition time)
pub const AVC_PACKET_HEADER_SIZE: usize = 4;

/// Width of the NAL length prefix inside a NALU run
pub const NALU_LENGTH_SIZE: usize = 4;

/// AVC packet type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvcPacketType {
    /// Sequence header (AVCDecoderConfigurationRecord)
    SequenceHeader,
    /// NAL units
    Nalu,
    /// End of sequence
    EndOfSequence,
    /// Value not defined by the format
    Reserved(u8),
}

impl AvcPacketType {
    pub fn from_byte(b: u8) -> Self {
        match b {
            0 => AvcPacketType::SequenceHeader,
            1 => AvcPacketType::Nalu,
            2 => AvcPacketType::EndOfSequence,
            other => AvcPacketType::Reserved(other),
        }
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            AvcPacketType::SequenceHeader => 0,
            AvcPacketType::Nalu => 1,
            AvcPacketType::EndOfSequence => 2,
            AvcPacketType::Reserved(b) => *b,
        }
    }

    /// Human-readable name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            AvcPacketType::SequenceHeader => "AVC sequence header",
            AvcPacketType::Nalu => "AVC NALU",
            AvcPacketType::EndOfSequence => "AVC end of sequence",
            AvcPacketType::Reserved(_) => "reserved",
        }
    }
}

/// NAL unit type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaluType {
    /// Non-IDR slice
    Slice = 1,
    /// Slice data partition A
    SlicePartA = 2,
    /// Slice data partition B
    SlicePartB = 3,
    /// Slice data partition C
    SlicePartC = 4,
    /// IDR slice (keyframe)
    Idr = 5,
    /// Supplemental enhancement information
    Sei = 6,
    /// Sequence parameter set
    Sps = 7,
    /// Picture parameter set
    Pps = 8,
    /// Access unit delimiter
    Aud = 9,
    /// End of sequence
    EndSeq = 10,
    /// End of stream
    EndStream = 11,
    /// Filler data
    Filler = 12,
}

impl NaluType {
    /// Classify from the first byte of a NAL unit
    pub fn from_byte(b: u8) -> Option<Self> {
        match extract_bits(b, 0, 5) {
            1 => Some(NaluType::Slice),
            2 => Some(NaluType::SlicePartA),
            3 => Some(NaluType::SlicePartB),
            4 => Some(NaluType::SlicePartC),
            5 => Some(NaluType::Idr),
            6 => Some(NaluType::Sei),
            7 => Some(NaluType::Sps),
            8 => Some(NaluType::Pps),
            9 => Some(NaluType::Aud),
            10 => Some(NaluType::EndSeq),
            11 => Some(NaluType::EndStream),
            12 => Some(NaluType::Filler),
            _ => None,
        }
    }

    pub fn is_keyframe(&self) -> bool {
        matches!(self, NaluType::Idr)
    }

    pub fn is_parameter_set(&self) -> bool {
        matches!(self, NaluType::Sps | NaluType::Pps)
    }
}

/// Decoded AVC packet
#[derive(Debug, Clone)]
pub struct AvcPacket {
    pub packet_type: AvcPacketType,
    /// Composition time offset in milliseconds (signed 24-bit)
    pub composition_time: i32,
    pub body: AvcBody,
}

/// Body of an AVC packet, by packet type
#[derive(Debug, Clone)]
pub enum AvcBody {
    /// Sequence header
    Config(AvcConfig),
    /// NAL units in AVCC framing
    Nalus(NaluRun),
    /// End of sequence or reserved packet type
    Opaque(Bytes),
}

impl AvcPacket {
    /// Decode from the video payload bytes following the video header byte
    pub fn decode(data: Bytes) -> Result<Self, FlvError> {
        let mut cursor = ByteCursor::new(&data[..]);
        let packet_type = cursor
            .read_u8()
            .map(AvcPacketType::from_byte)
            .map_err(|e| FlvError::at(Stage::AvcPacket, e))?;
        let composition_time = cursor
            .read_u24()
            .map(sign_extend_24)
            .map_err(|e| FlvError::at(Stage::AvcPacket, e))?;

        let rest = data.slice(AVC_PACKET_HEADER_SIZE..);

        tracing::debug!(
            packet_type = packet_type.as_byte(),
            name = packet_type.name(),
            composition_time,
            size = rest.len(),
            "AVC video packet"
        );

        let body = match packet_type {
            AvcPacketType::SequenceHeader => AvcBody::Config(AvcConfig::parse(rest)?),
            AvcPacketType::Nalu => AvcBody::Nalus(NaluRun::new(rest)),
            AvcPacketType::EndOfSequence | AvcPacketType::Reserved(_) => AvcBody::Opaque(rest),
        };

        Ok(AvcPacket {
            packet_type,
            composition_time,
            body,
        })
    }

    pub fn config(&self) -> Option<&AvcConfig> {
        match &self.body {
            AvcBody::Config(config) => Some(config),
            _ => None,
        }
    }

    pub fn nalus(&self) -> Option<&NaluRun> {
        match &self.body {
            AvcBody::Nalus(run) => Some(run),
            _ => None,
        }
    }

    /// Check if this is a sequence header
    pub fn is_sequence_header(&self) -> bool {
        matches!(self.body, AvcBody::Config(_))
    }
}

fn sign_extend_24(value: u32) -> i32 {
    ((value << 8) as i32) >> 8
}

/// AVC decoder configuration (from sequence header)
#[derive(Debug, Clone)]
pub struct AvcConfig {
    /// configurationVersion (always 1 in practice, not enforced)
    pub version: u8,
    /// AVC profile (66=Baseline, 77=Main, 100=High, etc.)
    pub profile: u8,
    /// Profile compatibility flags
    pub compatibility: u8,
    /// AVC level (e.g., 31 = 3.1)
    pub level: u8,
    /// NAL length size minus 1 (usually 3, meaning 4-byte lengths)
    pub length_size_minus_one: u8,
    /// Sequence Parameter Set
    pub sps: Bytes,
    /// Picture Parameter Set
    pub pps: Bytes,
    /// Raw AVCDecoderConfigurationRecord bytes
    pub raw: Bytes,
}

impl AvcConfig {
    /// Parse from AVCDecoderConfigurationRecord
    pub fn parse(data: Bytes) -> Result<Self, FlvError> {
        let at = |e: CursorError| FlvError::at(Stage::ConfigRecord, e);
        let mut cursor = ByteCursor::new(&data[..]);

        let version = cursor.read_u8().map_err(at)?;
        let profile = cursor.read_u8().map_err(at)?;
        let compatibility = cursor.read_u8().map_err(at)?;
        let level = cursor.read_u8().map_err(at)?;
        let length_size_minus_one = extract_bits(cursor.read_u8().map_err(at)?, 0, 2);

        let num_sps = extract_bits(cursor.read_u8().map_err(at)?, 0, 5);
        if num_sps != 1 {
            return Err(FlvError::UnsupportedParameterSetCount {
                set: ParameterSet::Sps,
                count: num_sps,
            });
        }
        let sps_len = cursor.read_u16().map_err(at)? as usize;
        let sps = cursor.read_bytes(sps_len).map_err(at)?;

        let num_pps = cursor.read_u8().map_err(at)?;
        if num_pps != 1 {
            return Err(FlvError::UnsupportedParameterSetCount {
                set: ParameterSet::Pps,
                count: num_pps,
            });
        }
        let pps_len = cursor.read_u16().map_err(at)? as usize;
        let pps = cursor.read_bytes(pps_len).map_err(at)?;

        let trailing = data.len() as u64 - cursor.position();
        if trailing > 0 {
            tracing::debug!(trailing, "Ignoring bytes after PPS in configuration record");
        }

        tracing::debug!(
            version,
            profile,
            compatibility,
            level,
            length_size_minus_one,
            sps_len,
            pps_len,
            "AVCDecoderConfigurationRecord"
        );
        tracing::trace!(sps = ?&sps[..], pps = ?&pps[..], "Parameter sets");

        Ok(AvcConfig {
            version,
            profile,
            compatibility,
            level,
            length_size_minus_one,
            sps,
            pps,
            raw: data,
        })
    }

    /// NAL length prefix width in bytes (1..=4)
    pub fn nalu_length_size(&self) -> usize {
        self.length_size_minus_one as usize + 1
    }

    /// Get profile name
    pub fn profile_name(&self) -> &'static str {
        match self.profile {
            66 => "Baseline",
            77 => "Main",
            88 => "Extended",
            100 => "High",
            110 => "High 10",
            122 => "High 4:2:2",
            244 => "High 4:4:4",
            _ => "Unknown",
        }
    }

    /// Get level as string (e.g., "3.1")
    pub fn level_string(&self) -> String {
        format!("{}.{}", self.level / 10, self.level % 10)
    }
}

/// Run of `[4-byte BE length][NAL unit]` entries, stored verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaluRun {
    data: Bytes,
}

impl NaluRun {
    pub fn new(data: Bytes) -> Self {
        Self { data }
    }

    /// Total run length in bytes, length prefixes included
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.data
    }

    /// Iterate over the NAL units, without their length prefixes
    pub fn iter(&self) -> NaluIterator {
        NaluIterator {
            data: self.data.clone(),
            offset: 0,
            failed: false,
        }
    }

    /// Check if the run contains an IDR slice
    pub fn contains_idr(&self) -> bool {
        self.iter()
            .map_while(|nalu| nalu.ok())
            .any(|nalu| nalu.first().and_then(|b| NaluType::from_byte(*b)) == Some(NaluType::Idr))
    }
}

impl<'a> IntoIterator for &'a NaluRun {
    type Item = Result<Bytes, FlvError>;
    type IntoIter = NaluIterator;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over NAL units in a [`NaluRun`]
///
/// Scanning continues while more than four bytes remain. A length prefix
/// that points past the end of the run yields one `ShortRead` error and ends
/// the iteration.
pub struct NaluIterator {
    data: Bytes,
    offset: usize,
    failed: bool,
}

impl Iterator for NaluIterator {
    type Item = Result<Bytes, FlvError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let remaining = self.data.len() - self.offset;
        if remaining <= NALU_LENGTH_SIZE {
            return None;
        }

        let prefix = &self.data[self.offset..self.offset + NALU_LENGTH_SIZE];
        let len = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        let start = self.offset + NALU_LENGTH_SIZE;
        let available = self.data.len() - start;

        if len > available {
            self.failed = true;
            return Some(Err(FlvError::ShortRead {
                stage: Stage::NaluRun,
                needed: len,
                available,
            }));
        }

        self.offset = start + len;
        Some(Ok(self.data.slice(start..start + len)))
    }
}
