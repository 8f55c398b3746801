//! Synthesized FLV byte streams for unit tests

use crate::media::flv::TAG_HEADER_SIZE;

pub(crate) const SPS: &[u8] = &[0x67, 0x64, 0x00, 0x1F, 0xAC];
pub(crate) const PPS: &[u8] = &[0x68, 0xEE, 0x3C, 0x80];

/// Builds a complete FLV file, PreviousTagSize fields included
pub(crate) struct FlvBuilder {
    data: Vec<u8>,
    last_tag_size: u32,
}

impl FlvBuilder {
    /// Audio + video header with data offset 9
    pub(crate) fn new() -> Self {
        Self::with_data_offset(9)
    }

    /// Header declaring `data_offset`; gap bytes are filled with 0xEE
    pub(crate) fn with_data_offset(data_offset: u32) -> Self {
        let mut data = vec![0x46, 0x4C, 0x56, 0x01, 0x05];
        data.extend_from_slice(&data_offset.to_be_bytes());
        while data.len() < data_offset as usize {
            data.push(0xEE);
        }
        Self {
            data,
            last_tag_size: 0,
        }
    }

    pub(crate) fn tag(mut self, kind: u8, timestamp: u32, payload: &[u8]) -> Self {
        self.data.extend_from_slice(&self.last_tag_size.to_be_bytes());
        self.data.push(kind);
        self.data
            .extend_from_slice(&(payload.len() as u32).to_be_bytes()[1..]);
        self.data.extend_from_slice(&timestamp.to_be_bytes()[1..]);
        self.data.push((timestamp >> 24) as u8);
        self.data.extend_from_slice(&[0, 0, 0]);
        self.data.extend_from_slice(payload);
        self.last_tag_size = (TAG_HEADER_SIZE + payload.len()) as u32;
        self
    }

    pub(crate) fn audio(self, timestamp: u32, payload: &[u8]) -> Self {
        self.tag(8, timestamp, payload)
    }

    pub(crate) fn video(self, timestamp: u32, payload: &[u8]) -> Self {
        self.tag(9, timestamp, payload)
    }

    pub(crate) fn script(self, payload: &[u8]) -> Self {
        self.tag(18, 0, payload)
    }

    /// Bytes so far, without the trailing PreviousTagSize
    pub(crate) fn bytes(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// Append the final PreviousTagSize and return the file
    pub(crate) fn finish(mut self) -> Vec<u8> {
        self.data.extend_from_slice(&self.last_tag_size.to_be_bytes());
        self.data
    }
}

/// Video payload carrying an AVC sequence header with one SPS and one PPS
pub(crate) fn avc_sequence_header(sps: &[u8], pps: &[u8]) -> Vec<u8> {
    let mut out = vec![0x17, 0x00, 0x00, 0x00, 0x00];
    out.extend_from_slice(&[0x01, 0x64, 0x00, 0x1F, 0xFF, 0xE1]);
    out.extend_from_slice(&(sps.len() as u16).to_be_bytes());
    out.extend_from_slice(sps);
    out.push(0x01);
    out.extend_from_slice(&(pps.len() as u16).to_be_bytes());
    out.extend_from_slice(pps);
    out
}

/// Video payload carrying an AVC NALU packet in 4-byte AVCC framing
pub(crate) fn avc_nalus(keyframe: bool, nalus: &[&[u8]]) -> Vec<u8> {
    let mut out = vec![if keyframe { 0x17 } else { 0x27 }, 0x01, 0x00, 0x00, 0x00];
    for nalu in nalus {
        out.extend_from_slice(&(nalu.len() as u32).to_be_bytes());
        out.extend_from_slice(nalu);
    }
    out
}

/// `onMetaData` script payload with width, height and duration
pub(crate) fn metadata() -> Vec<u8> {
    let mut out = vec![0x02, 0x00, 0x0A];
    out.extend_from_slice(b"onMetaData");
    out.extend_from_slice(&[0x08, 0x00, 0x00, 0x00, 0x03]);
    for (key, value) in [("width", 1280.0f64), ("height", 720.0), ("duration", 2.5)] {
        out.extend_from_slice(&(key.len() as u16).to_be_bytes());
        out.extend_from_slice(key.as_bytes());
        out.push(0x00);
        out.extend_from_slice(&value.to_be_bytes());
    }
    out.extend_from_slice(&[0x00, 0x00, 0x09]);
    out
}
