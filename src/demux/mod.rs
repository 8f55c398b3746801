//! FLV demuxing
//!
//! - [`TagReader`]: one tag per call over any `std::io::Read`
//! - [`TagStore`]: ordered storage for decoded tags
//! - [`FlvScanner`]: the scan loop, with cancellation and tag limits

pub mod config;
pub mod reader;
pub mod scanner;
pub mod store;

pub use config::ScanConfig;
pub use reader::TagReader;
pub use scanner::{FlvScanner, ScanOutcome, ScanSummary};
pub use store::{TagCounts, TagStore};
