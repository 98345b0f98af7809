use crate::packet::Packet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Could not open capture file.")]
    Open(#[source] pcap::Error),
}

/// A pcap savefile, drained one frame at a time. Opening is the only
/// caller-visible failure; past that the capture yields frames until the
/// end (a read error ends the sequence the same way).
pub struct CaptureFile {
    capture: pcap::Capture<pcap::Offline>,
    link_type: pcap::Linktype,
}

impl CaptureFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        let capture = pcap::Capture::from_file(path).map_err(CaptureError::Open)?;
        let link_type = capture.get_datalink();

        Ok(Self { capture, link_type })
    }

    pub fn link_type(&self) -> pcap::Linktype {
        self.link_type
    }

    /// Next raw frame, `None` at end of capture.
    pub fn next_frame(&mut self) -> Option<OwnedFrame> {
        match self.capture.next_packet() {
            Ok(packet) => Some(OwnedFrame::from(packet)),
            Err(_) => None,
        }
    }

    /// Next frame, decoded. The frame is truncated to its capture length
    /// before dissection.
    pub fn next_packet(&mut self) -> Option<Packet> {
        let frame = self.next_frame()?;
        let boundary = (frame.info.capture_length as usize).min(frame.data.len());

        Some(Packet::parse(&frame.data[..boundary], &self.link_type))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedFrame {
    pub info: FrameInfo,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub tv_sec: i64,
    pub tv_usec: i64,
    pub capture_length: u32,
    pub length: u32,
}

impl<'a> From<pcap::Packet<'a>> for OwnedFrame {
    fn from(packet: pcap::Packet<'a>) -> Self {
        let header = packet.header;
        OwnedFrame {
            info: FrameInfo {
                tv_sec: i64::from(header.ts.tv_sec),
                tv_usec: i64::from(header.ts.tv_usec),
                capture_length: header.caplen,
                length: header.len,
            },
            data: packet.data.to_vec(),
        }
    }
}
