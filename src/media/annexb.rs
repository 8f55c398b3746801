//! AVCC to Annex B conversion
//!
//! FLV carries H.264 in AVCC framing: each NAL unit is preceded by a 4-byte
//! big-endian length. Annex B replaces every length with a start code:
//! ```text
//! AVCC:    [00 00 00 02][AB CD][00 00 00 01][EF]
//! Annex B: [00 00 00 01][AB CD][00 00 00 01][EF]
//! ```
//! SPS and PPS from the sequence header are emitted as two start-code units
//! at the point the sequence header appears in the tag stream.

use std::io::{self, Write};

use bytes::{BufMut, Bytes, BytesMut};

use super::flv::Tag;
use super::h264::{AvcBody, AvcConfig, NaluRun, NaluType};
use crate::demux::TagStore;
use crate::error::Result;

/// Annex B start code
pub const START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// Conversion statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnexBStats {
    /// SPS and PPS units written
    pub parameter_sets: usize,
    /// NAL units written from NALU packets
    pub nal_units: usize,
    /// Total bytes written, start codes included
    pub bytes_written: u64,
    /// Tags that contributed nothing (audio, script data, non-AVC video, ...)
    pub skipped_tags: usize,
    /// NALU runs cut short by an overlong length prefix
    pub malformed_runs: usize,
}

/// Writes an Annex B elementary stream to any byte sink
pub struct AnnexBWriter<W> {
    inner: W,
    stats: AnnexBStats,
}

impl<W: Write> AnnexBWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            stats: AnnexBStats::default(),
        }
    }

    pub fn stats(&self) -> AnnexBStats {
        self.stats
    }

    /// Write one start-code-prefixed unit
    pub fn write_unit(&mut self, unit: &[u8]) -> io::Result<()> {
        self.inner.write_all(&START_CODE)?;
        self.inner.write_all(unit)?;
        self.stats.bytes_written += (START_CODE.len() + unit.len()) as u64;
        Ok(())
    }

    /// Write SPS then PPS
    pub fn write_config(&mut self, config: &AvcConfig) -> io::Result<()> {
        if config.length_size_minus_one != 3 {
            tracing::warn!(
                nalu_length_size = config.nalu_length_size(),
                "Configuration announces a non-4-byte NAL length; using 4-byte framing"
            );
        }
        self.write_unit(&config.sps)?;
        self.write_unit(&config.pps)?;
        self.stats.parameter_sets += 2;
        Ok(())
    }

    /// Write every NAL unit of a run; returns the number written
    ///
    /// Units before a malformed length prefix are written before the error
    /// is returned.
    pub fn write_nalu_run(&mut self, run: &NaluRun) -> Result<usize> {
        let mut written = 0;
        for nalu in run {
            let nalu = nalu?;
            tracing::trace!(
                nal_type = ?nalu.first().and_then(|b| NaluType::from_byte(*b)),
                size = nalu.len(),
                "NAL unit"
            );
            self.write_unit(&nalu)?;
            self.stats.nal_units += 1;
            written += 1;
        }
        Ok(written)
    }

    /// Convert one tag; returns false if the tag carries nothing to write
    pub fn write_tag(&mut self, tag: &Tag) -> Result<bool> {
        let Some(packet) = tag.video().and_then(|v| v.avc()) else {
            self.stats.skipped_tags += 1;
            return Ok(false);
        };

        match &packet.body {
            AvcBody::Config(config) => {
                self.write_config(config)?;
                Ok(true)
            }
            AvcBody::Nalus(run) => {
                self.write_nalu_run(run)?;
                Ok(true)
            }
            AvcBody::Opaque(_) => {
                self.stats.skipped_tags += 1;
                Ok(false)
            }
        }
    }

    /// Convert every tag in insertion order
    ///
    /// A malformed NALU run is logged and conversion continues with the next
    /// tag; I/O errors abort.
    pub fn write_store(&mut self, store: &TagStore) -> Result<AnnexBStats> {
        for tag in store {
            match self.write_tag(tag) {
                Ok(_) => {}
                Err(crate::Error::Flv(e)) => {
                    tracing::warn!(
                        error = %e,
                        offset = tag.byte_offset,
                        timestamp = tag.composite_timestamp(),
                        "Malformed NALU run; remaining units in tag dropped"
                    );
                    self.stats.malformed_runs += 1;
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            parameter_sets = self.stats.parameter_sets,
            nal_units = self.stats.nal_units,
            bytes = self.stats.bytes_written,
            skipped = self.stats.skipped_tags,
            malformed = self.stats.malformed_runs,
            "Annex B conversion finished"
        );

        Ok(self.stats)
    }

    /// Flush and return the sink
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Convert a tag store into an in-memory Annex B stream
pub fn to_annex_b(store: &TagStore) -> Result<Bytes> {
    let mut writer = AnnexBWriter::new(BytesMut::new().writer());
    writer.write_store(store)?;
    Ok(writer.finish()?.into_inner().freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demux::FlvScanner;
    use crate::fixtures::{self, FlvBuilder};

    fn scan(data: &[u8]) -> TagStore {
        let mut scanner = FlvScanner::open(data).unwrap();
        scanner.scan().unwrap();
        scanner.into_store()
    }

    #[test]
    fn test_nalu_run_conversion() {
        let run = NaluRun::new(Bytes::from_static(&[
            0x00, 0x00, 0x00, 0x02, 0xAB, 0xCD, 0x00, 0x00, 0x00, 0x01, 0xEF,
        ]));
        let mut writer = AnnexBWriter::new(Vec::new());
        assert_eq!(writer.write_nalu_run(&run).unwrap(), 2);
        assert_eq!(writer.stats().nal_units, 2);
        assert_eq!(writer.stats().bytes_written, 11);
        assert_eq!(
            writer.finish().unwrap(),
            [0x00, 0x00, 0x00, 0x01, 0xAB, 0xCD, 0x00, 0x00, 0x00, 0x01, 0xEF]
        );
    }

    #[test]
    fn test_parameter_sets_first() {
        let data = FlvBuilder::new()
            .script(&fixtures::metadata())
            .video(0, &fixtures::avc_sequence_header(fixtures::SPS, fixtures::PPS))
            .audio(0, &[0xAF, 0x01, 0x00])
            .video(0, &fixtures::avc_nalus(true, &[&[0x65, 0x01]]))
            .video(40, &fixtures::avc_nalus(false, &[&[0x41, 0x02], &[0x41, 0x03]]))
            .finish();

        let out = to_annex_b(&scan(&data)).unwrap();

        let units: [&[u8]; 5] = [
            fixtures::SPS,
            fixtures::PPS,
            &[0x65, 0x01],
            &[0x41, 0x02],
            &[0x41, 0x03],
        ];
        let mut expected = Vec::new();
        for unit in units {
            expected.extend_from_slice(&START_CODE);
            expected.extend_from_slice(unit);
        }
        assert_eq!(&out[..], &expected[..]);
    }

    #[test]
    fn test_write_store_stats() {
        let data = FlvBuilder::new()
            .script(&fixtures::metadata())
            .video(0, &fixtures::avc_sequence_header(fixtures::SPS, fixtures::PPS))
            .audio(0, &[0xAF, 0x01, 0x00])
            .video(0, &fixtures::avc_nalus(true, &[&[0x65, 0x01]]))
            // VP6 keyframe, not converted
            .video(40, &[0x14, 0x00, 0x01])
            // AVC end of sequence
            .video(80, &[0x17, 0x02, 0x00, 0x00, 0x00])
            .finish();

        let mut writer = AnnexBWriter::new(Vec::new());
        let stats = writer.write_store(&scan(&data)).unwrap();
        assert_eq!(stats.parameter_sets, 2);
        assert_eq!(stats.nal_units, 1);
        assert_eq!(stats.skipped_tags, 4);
        assert_eq!(stats.malformed_runs, 0);
        assert_eq!(
            stats.bytes_written,
            (3 * 4 + fixtures::SPS.len() + fixtures::PPS.len() + 2) as u64
        );
    }

    #[test]
    fn test_malformed_run_keeps_going() {
        // First unit fine, second declares 9 bytes but has 1
        let mut bad = vec![0x27, 0x01, 0x00, 0x00, 0x00];
        bad.extend_from_slice(&[0x00, 0x00, 0x00, 0x01, 0x41]);
        bad.extend_from_slice(&[0x00, 0x00, 0x00, 0x09, 0x42]);

        let data = FlvBuilder::new()
            .video(0, &bad)
            .video(40, &fixtures::avc_nalus(false, &[&[0x41, 0x07]]))
            .finish();

        let mut writer = AnnexBWriter::new(Vec::new());
        let stats = writer.write_store(&scan(&data)).unwrap();
        assert_eq!(stats.malformed_runs, 1);
        assert_eq!(stats.nal_units, 2);
        assert_eq!(
            writer.finish().unwrap(),
            [0x00, 0x00, 0x00, 0x01, 0x41, 0x00, 0x00, 0x00, 0x01, 0x41, 0x07]
        );
    }

    #[test]
    fn test_trailing_short_remainder_ignored() {
        // Four trailing bytes are not enough for another unit
        let run = NaluRun::new(Bytes::from_static(&[
            0x00, 0x00, 0x00, 0x01, 0x09, 0x00, 0x00, 0x00, 0x05,
        ]));
        let mut writer = AnnexBWriter::new(Vec::new());
        assert_eq!(writer.write_nalu_run(&run).unwrap(), 1);
        assert_eq!(writer.finish().unwrap(), [0x00, 0x00, 0x00, 0x01, 0x09]);
    }

    #[test]
    fn test_empty_store() {
        let out = to_annex_b(&TagStore::new()).unwrap();
        assert!(out.is_empty());
    }
}
