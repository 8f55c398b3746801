//! Media handling for FLV
//!
//! This module provides:
//! - FLV container header, tag and video payload types
//! - H.264/AVC packet, configuration record and NALU run parsing
//! - AVCC to Annex B conversion
//! - Script data (onMetaData) decoding

pub mod annexb;
pub mod flv;
pub mod h264;
pub mod script;

pub use annexb::{to_annex_b, AnnexBStats, AnnexBWriter, START_CODE};
pub use flv::{ContainerHeader, Tag, TagKind, TagPayload, VideoCodec, VideoFrameType, VideoPayload};
pub use h264::{AvcConfig, AvcPacket, AvcPacketType, NaluRun, NaluType};
pub use script::ScriptData;
