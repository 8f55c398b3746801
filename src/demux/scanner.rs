//! Scan loop owning the reader position and the tag store

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use super::config::ScanConfig;
use super::reader::TagReader;
use super::store::TagStore;
use crate::error::{FlvError, Result};
use crate::media::flv::{ContainerHeader, Tag};

/// Why a scan stopped without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Clean end of stream
    Completed,
    /// Cancel flag observed between tags
    Cancelled,
    /// `max_tags` reached
    TagLimit,
}

/// Result of a scan run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    /// Tags in the store
    pub tags: usize,
    /// Bytes consumed from the source, header included
    pub bytes_consumed: u64,
    pub outcome: ScanOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Reading,
    Finished,
    LimitReached,
    Failed,
}

/// FLV scanner
///
/// Reads the header on open, then one tag per [`next_tag`](Self::next_tag)
/// call, appending every decoded tag to its [`TagStore`]. Once the stream has
/// ended or a read has failed, no further bytes are consumed.
#[derive(Debug)]
pub struct FlvScanner<R> {
    reader: TagReader<R>,
    header: ContainerHeader,
    store: TagStore,
    config: ScanConfig,
    state: ScanState,
}

impl<R: Read> FlvScanner<R> {
    /// Open with default configuration
    pub fn open(source: R) -> std::result::Result<Self, FlvError> {
        Self::with_config(source, ScanConfig::default())
    }

    pub fn with_config(source: R, config: ScanConfig) -> std::result::Result<Self, FlvError> {
        let mut reader = TagReader::new(source);
        let header = reader.read_header()?;
        if !header.is_flv_signature() {
            tracing::warn!(signature = ?header.signature, "Header signature is not FLV");
        }
        if config.skip_to_data_offset {
            reader.skip_to_data(&header)?;
        }

        Ok(Self {
            reader,
            header,
            store: TagStore::new(),
            config,
            state: ScanState::Reading,
        })
    }

    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Bytes consumed from the source so far
    pub fn position(&self) -> u64 {
        self.reader.position()
    }

    pub fn store(&self) -> &TagStore {
        &self.store
    }

    pub fn into_store(self) -> TagStore {
        self.store
    }

    /// Whether the scan can make no further progress
    pub fn is_finished(&self) -> bool {
        self.state != ScanState::Reading
    }

    /// Read one tag and append it to the store
    pub fn next_tag(&mut self) -> std::result::Result<Option<&Tag>, FlvError> {
        if self.state != ScanState::Reading {
            return Ok(None);
        }
        if let Some(max) = self.config.max_tags {
            if self.store.len() >= max {
                self.state = ScanState::LimitReached;
                return Ok(None);
            }
        }

        match self.reader.read_tag() {
            Ok(Some(tag)) => {
                let index = self.store.push(tag);
                Ok(self.store.get(index))
            }
            Ok(None) => {
                self.state = ScanState::Finished;
                Ok(None)
            }
            Err(e) => {
                self.state = ScanState::Failed;
                tracing::error!(
                    error = %e,
                    stage = %e.stage(),
                    tags = self.store.len(),
                    "Scan failed"
                );
                Err(e)
            }
        }
    }

    /// Read until end of stream, tag limit or error
    pub fn scan(&mut self) -> std::result::Result<ScanSummary, FlvError> {
        self.scan_until(&AtomicBool::new(false))
    }

    /// Like [`scan`](Self::scan), checking `cancel` between tags
    pub fn scan_until(&mut self, cancel: &AtomicBool) -> std::result::Result<ScanSummary, FlvError> {
        let outcome = loop {
            if cancel.load(Ordering::Relaxed) {
                break ScanOutcome::Cancelled;
            }
            if self.next_tag()?.is_none() {
                break match self.state {
                    ScanState::LimitReached => ScanOutcome::TagLimit,
                    _ => ScanOutcome::Completed,
                };
            }
        };

        let counts = self.store.kind_counts();
        let summary = ScanSummary {
            tags: self.store.len(),
            bytes_consumed: self.position(),
            outcome,
        };

        tracing::info!(
            tags = summary.tags,
            audio = counts.audio,
            video = counts.video,
            script_data = counts.script_data,
            bytes = summary.bytes_consumed,
            outcome = ?outcome,
            "Scan finished"
        );

        Ok(summary)
    }
}

impl FlvScanner<BufReader<File>> {
    /// Open a file with a buffered reader
    pub fn open_path(path: impl AsRef<Path>, config: ScanConfig) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::with_config(BufReader::new(file), config)?)
    }
}
