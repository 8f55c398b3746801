//! Paced replay of demuxed tags
//!
//! After a scan, [`ReplayIndex`] records where the metadata and video tags
//! live in the source. [`replay`] re-reads those byte ranges and writes the
//! raw tags to any async sink at a fixed pace.

pub mod config;
pub mod index;
pub mod player;

pub use config::ReplayConfig;
pub use index::{ReplayIndex, TagRange};
pub use player::{replay, ReplaySource, ReplayStats};
