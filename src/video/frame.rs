//! Backend-native video frames

use crate::hw::dmabuf::DmaBufStorage;
use crate::hw::shm::ShmStorage;
use crate::packet::{Packet, TIMECODE_UNDEFINED, TIME_UNDEFINED};

use super::format::{Rectangle, MAX_PLANES};

/// Backend-specific storage behind a [`VideoFrame`]
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FrameStorage {
    /// No backing storage yet
    #[default]
    None,
    /// DMA-buffer plane table and descriptor handles
    DmaBuf(DmaBufStorage),
    /// Shared-memory plane table, paired with a pool segment
    Shm(ShmStorage),
}

/// One video buffer in a backend-native representation
///
/// The frame wrapper owns only geometry and timing; the pixel data lives
/// wherever the backend put it (a pool segment, a DMA buffer). Timing
/// fields pass through packet conversions unchanged, including the
/// undefined sentinels.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    /// Backend-native storage
    pub storage: FrameStorage,
    /// Bytes per row, one entry per plane
    pub strides: [i32; MAX_PLANES],
    /// Presentation timestamp
    pub timestamp: i64,
    /// Duration in the same units as `timestamp`
    pub duration: i64,
    /// SMPTE timecode
    pub timecode: i64,
    /// Source crop rectangle
    pub src_rect: Rectangle,
    /// Destination offset
    pub dst_x: i32,
    /// Destination offset
    pub dst_y: i32,
}

impl Default for VideoFrame {
    fn default() -> Self {
        Self {
            storage: FrameStorage::None,
            strides: [0; MAX_PLANES],
            timestamp: TIME_UNDEFINED,
            duration: 0,
            timecode: TIMECODE_UNDEFINED,
            src_rect: Rectangle::default(),
            dst_x: 0,
            dst_y: 0,
        }
    }
}

impl VideoFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy timing and geometry metadata from a packet into this frame
    pub fn apply_packet_metadata(&mut self, p: &Packet) {
        self.timestamp = p.pts;
        self.duration = p.duration;
        self.timecode = p.timecode;
        self.src_rect = p.src_rect;
        self.dst_x = p.dst_x;
        self.dst_y = p.dst_y;
    }

    /// Copy this frame's timing and geometry metadata into a packet
    pub fn write_packet_metadata(&self, p: &mut Packet) {
        p.pts = self.timestamp;
        p.duration = self.duration;
        p.timecode = self.timecode;
        p.src_rect = self.src_rect;
        p.dst_x = self.dst_x;
        p.dst_y = self.dst_y;
    }
}
