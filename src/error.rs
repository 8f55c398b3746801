//! Error types
//!
//! Parsers return [`FlvError`], which always names the [`Stage`] that failed.
//! The crate-level [`Error`] wraps it together with AMF and I/O errors for
//! the outer surfaces (script data, Annex B output, replay).

use std::fmt;
use std::io;

use thiserror::Error;

/// Parse stage that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// 9-byte container header
    Header,
    /// 11-byte tag envelope (and the previous-tag-size before it)
    TagEnvelope,
    /// Declared tag payload bytes
    TagPayload,
    /// Video tag header byte
    VideoPayload,
    /// AVC packet header (packet type + composition time)
    AvcPacket,
    /// AVCDecoderConfigurationRecord
    ConfigRecord,
    /// Length-prefixed NAL unit run
    NaluRun,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Header => "header",
            Stage::TagEnvelope => "tag envelope",
            Stage::TagPayload => "tag payload",
            Stage::VideoPayload => "video payload",
            Stage::AvcPacket => "avc packet",
            Stage::ConfigRecord => "config record",
            Stage::NaluRun => "nalu run",
        };
        f.write_str(name)
    }
}

/// Parameter set kind carried by a configuration record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterSet {
    Sps,
    Pps,
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterSet::Sps => f.write_str("SPS"),
            ParameterSet::Pps => f.write_str("PPS"),
        }
    }
}

/// Low-level read failure from a [`ByteCursor`](crate::cursor::ByteCursor)
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("short read: needed {needed} bytes, {available} available")]
    ShortRead { needed: usize, available: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// FLV / AVC parse error
#[derive(Debug, Error)]
pub enum FlvError {
    /// Fewer bytes than a fixed-width field (or declared length) requires
    #[error("short read in {stage}: needed {needed} bytes, {available} available")]
    ShortRead {
        stage: Stage,
        needed: usize,
        available: usize,
    },

    /// Source ended inside a tag envelope or its declared payload
    #[error("truncated tag at offset {offset} ({stage}): needed {needed} bytes, {available} available")]
    TruncatedTag {
        stage: Stage,
        offset: u64,
        needed: usize,
        available: usize,
    },

    /// Tag kind outside {8, 9, 18}; payload length cannot be trusted
    #[error("unknown tag kind {kind} at offset {offset}")]
    UnknownTagKind { kind: u8, offset: u64 },

    /// Configuration record carries a parameter set count other than one
    #[error("unsupported {set} count {count} (exactly one is supported)")]
    UnsupportedParameterSetCount { set: ParameterSet, count: u8 },

    #[error("I/O error in {stage}: {source}")]
    Io {
        stage: Stage,
        #[source]
        source: io::Error,
    },
}

impl FlvError {
    /// Stage that failed
    pub fn stage(&self) -> Stage {
        match self {
            FlvError::ShortRead { stage, .. } => *stage,
            FlvError::TruncatedTag { stage, .. } => *stage,
            FlvError::UnknownTagKind { .. } => Stage::TagEnvelope,
            FlvError::UnsupportedParameterSetCount { .. } => Stage::ConfigRecord,
            FlvError::Io { stage, .. } => *stage,
        }
    }

    /// Attach a stage to a cursor failure
    pub(crate) fn at(stage: Stage, err: CursorError) -> Self {
        match err {
            CursorError::ShortRead { needed, available } => FlvError::ShortRead {
                stage,
                needed,
                available,
            },
            CursorError::Io(source) => FlvError::Io { stage, source },
        }
    }

    /// Attach a stage and tag offset to a cursor failure inside a tag
    pub(crate) fn truncated(stage: Stage, offset: u64, err: CursorError) -> Self {
        match err {
            CursorError::ShortRead { needed, available } => FlvError::TruncatedTag {
                stage,
                offset,
                needed,
                available,
            },
            CursorError::Io(source) => FlvError::Io { stage, source },
        }
    }
}

/// AMF decoding error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmfError {
    #[error("unexpected end of AMF data")]
    UnexpectedEof,

    #[error("unknown AMF marker 0x{0:02x}")]
    UnknownMarker(u8),

    #[error("invalid UTF-8 in AMF string")]
    InvalidUtf8,

    #[error("AMF nesting too deep")]
    NestingTooDeep,

    #[error("invalid AMF object end marker")]
    InvalidObjectEnd,
}

/// Crate-level error
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Flv(#[from] FlvError),

    #[error("AMF error: {0}")]
    Amf(#[from] AmfError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
