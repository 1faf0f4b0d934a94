//! Transport packet envelope
//!
//! A [`Packet`] carries one frame's payload bytes (or a backend-specific
//! buffer description) across a process boundary, together with timing,
//! coding flags, geometry and an out-of-band array of descriptor handles.
//! Packets own their byte buffer; descriptor handles are borrowed
//! references whose lifetime is managed by the hardware backend.

pub mod buffer;
pub mod flags;

pub use buffer::{PaddedBuffer, PACKET_PADDING};
pub use flags::{FrameType, PacketFlags};

use std::os::fd::RawFd;

use crate::error::{FramelinkError, Result};
use crate::video::format::{Rectangle, MAX_PLANES};

/// Sentinel for an unknown presentation timestamp
pub const TIME_UNDEFINED: i64 = i64::MIN;

/// Sentinel for an unknown timecode
pub const TIMECODE_UNDEFINED: i64 = i64::MIN;

/// Transport envelope for one coded or backend-described frame
#[derive(Debug, Clone)]
pub struct Packet {
    /// Payload bytes, always followed by a zeroed guard region
    pub data: PaddedBuffer,
    /// Presentation timestamp, [`TIME_UNDEFINED`] when unknown
    pub pts: i64,
    /// Duration in the same time units as `pts`
    pub duration: i64,
    /// SMPTE timecode, [`TIMECODE_UNDEFINED`] when unknown
    pub timecode: i64,
    /// Coding type and behavior flags
    pub flags: PacketFlags,
    /// Bytes of in-band header preceding the frame data
    pub header_size: u32,
    /// Offset of the second field for interlaced content, 0 if unused
    pub field2_offset: u32,
    /// Source crop rectangle
    pub src_rect: Rectangle,
    /// Destination offset
    pub dst_x: i32,
    /// Destination offset
    pub dst_y: i32,
    fds: [RawFd; MAX_PLANES],
    num_fds: usize,
}

impl Default for Packet {
    fn default() -> Self {
        Self {
            data: PaddedBuffer::new(),
            pts: TIME_UNDEFINED,
            duration: 0,
            timecode: TIMECODE_UNDEFINED,
            flags: PacketFlags::new(),
            header_size: 0,
            field2_offset: 0,
            src_rect: Rectangle::default(),
            dst_x: 0,
            dst_y: 0,
            fds: [-1; MAX_PLANES],
            num_fds: 0,
        }
    }
}

impl Packet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all metadata and drop the payload, keeping the allocation
    pub fn reset(&mut self) {
        let data = std::mem::take(&mut self.data);
        *self = Self::default();
        self.data = data;
        self.data.clear();
    }

    /// Copy payload and metadata from `src`, reusing this packet's buffer
    pub fn copy_from(&mut self, src: &Packet) {
        self.copy_metadata_from(src);
        self.data.set_from_slice(src.data.as_slice());
    }

    /// Copy everything except the payload bytes from `src`
    pub fn copy_metadata_from(&mut self, src: &Packet) {
        self.pts = src.pts;
        self.duration = src.duration;
        self.timecode = src.timecode;
        self.flags = src.flags;
        self.header_size = src.header_size;
        self.field2_offset = src.field2_offset;
        self.src_rect = src.src_rect;
        self.dst_x = src.dst_x;
        self.dst_y = src.dst_y;
        self.fds = src.fds;
        self.num_fds = src.num_fds;
    }

    /// Descriptor handles attached to this packet, in buffer-index order
    pub fn fds(&self) -> &[RawFd] {
        &self.fds[..self.num_fds]
    }

    /// Replace the descriptor-handle array
    pub fn set_fds(&mut self, fds: &[RawFd]) -> Result<()> {
        if fds.len() > MAX_PLANES {
            return Err(FramelinkError::invalid_parameter(
                "fds",
                format!("at most {} descriptor handles per packet", MAX_PLANES),
            ));
        }
        self.fds = [-1; MAX_PLANES];
        self.fds[..fds.len()].copy_from_slice(fds);
        self.num_fds = fds.len();
        Ok(())
    }

    /// Drop all descriptor handles
    pub fn clear_fds(&mut self) {
        self.fds = [-1; MAX_PLANES];
        self.num_fds = 0;
    }

    /// One-line summary in the classic packet-dump form
    pub fn dump(&self) -> String {
        let mut out = format!("sz: {} ", self.data.len());
        if self.pts != TIME_UNDEFINED {
            out.push_str(&format!("pts: {} ", self.pts));
        } else {
            out.push_str("pts: None ");
        }
        out.push_str(&format!(
            "dur: {} head: {}, f2: {} type: {}",
            self.duration,
            self.header_size,
            self.field2_offset,
            self.flags.frame_type().label()
        ));
        if self.flags.no_output() {
            out.push_str(" nooutput");
        }
        if self.flags.is_reference() {
            out.push_str(" ref");
        }
        if !self.src_rect.is_empty() {
            out.push_str(&format!(
                " src_rect: {}x{}+{}+{}",
                self.src_rect.w, self.src_rect.h, self.src_rect.x, self.src_rect.y
            ));
        }
        if self.dst_x != 0 || self.dst_y != 0 {
            out.push_str(&format!(" dst: {} {}", self.dst_x, self.dst_y));
        }
        if self.num_fds > 0 {
            out.push_str(&format!(" fds: {}", self.num_fds));
        }
        out
    }
}
