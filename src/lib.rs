//! FLV demuxer and H.264 elementary stream extractor
//!
//! Reads an FLV file tag by tag into a [`TagStore`], decodes video tags down
//! to AVC configuration records and NAL unit runs, and rewrites the H.264
//! stream in Annex B framing.
//!
//! ```no_run
//! use flv_rs::{to_annex_b, FlvScanner, ScanConfig};
//!
//! # fn main() -> flv_rs::Result<()> {
//! let mut scanner = FlvScanner::open_path("input.flv", ScanConfig::default())?;
//! scanner.scan()?;
//! let h264 = to_annex_b(scanner.store())?;
//! std::fs::write("out.h264", &h264)?;
//! # Ok(())
//! # }
//! ```

pub mod amf;
pub mod cursor;
pub mod demux;
pub mod error;
pub mod media;
pub mod replay;

#[cfg(test)]
pub(crate) mod fixtures;

pub use demux::{FlvScanner, ScanConfig, ScanOutcome, ScanSummary, TagReader, TagStore};
pub use error::{Error, FlvError, Result, Stage};
pub use media::annexb::{to_annex_b, AnnexBWriter};
pub use media::flv::{ContainerHeader, Tag, TagKind};
pub use media::script::ScriptData;
pub use replay::{replay, ReplayConfig, ReplayIndex, ReplaySource};
