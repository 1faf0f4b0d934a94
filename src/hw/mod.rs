//! Hardware buffer backends and frame/packet marshalling
//!
//! A backend owns the native representation of a video buffer (a DMA
//! buffer, a shared-memory pool segment) and knows how to marshal it into
//! a [`Packet`] and back. Both variants share one wire layout for the
//! plane table; see [`PlaneRecord`]. Adding a backend means adding a
//! variant of [`HwType`] plus an implementation of [`HwBackend`].

pub mod dmabuf;
pub mod shm;

pub use dmabuf::{DmaBufBackend, DmaBufStorage, DmaPlane};
pub use shm::{ShmBackend, ShmStorage};

use std::any::Any;

use serde::{Deserialize, Serialize};

use crate::error::{FramelinkError, Result};
use crate::packet::Packet;
use crate::video::format::{PixelFormat, VideoFormat, MAX_PLANES};
use crate::video::frame::VideoFrame;

/// Backend can carry video frames
pub const SUPPORTS_VIDEO: u32 = 1 << 0;
/// Backend storage is shareable across processes
pub const SUPPORTS_SHARED: u32 = 1 << 1;

/// Closed set of hardware backend variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HwType {
    /// DMA-capable buffers referenced by descriptor handles
    DmaBuffer,
    /// POSIX shared-memory pool segments
    SharedMemory,
}

impl HwType {
    pub fn name(self) -> &'static str {
        match self {
            HwType::DmaBuffer => "dmabuf",
            HwType::SharedMemory => "shm",
        }
    }
}

/// One plane entry of the packet payload shared by all backends
///
/// Wire layout (little-endian): `buffer_index: i32`, `offset: i32`,
/// `stride: i32`. For the DMA backend `buffer_index` selects an entry of
/// the packet's descriptor-handle array; for the shared-memory backend it
/// is the pool segment id holding the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaneRecord {
    pub buffer_index: i32,
    pub offset: i32,
    pub stride: i32,
}

const PAYLOAD_HEADER_SIZE: usize = 8;
const PLANE_RECORD_SIZE: usize = 12;

/// Write the `{format_tag, plane_count, planes[]}` payload into a packet
pub(crate) fn encode_plane_payload(format_tag: u32, planes: &[PlaneRecord], packet: &mut Packet) {
    let len = PAYLOAD_HEADER_SIZE + planes.len() * PLANE_RECORD_SIZE;
    packet.data.alloc(len);
    let buf = packet.data.as_mut_slice();
    buf[0..4].copy_from_slice(&format_tag.to_le_bytes());
    buf[4..8].copy_from_slice(&(planes.len() as u32).to_le_bytes());
    for (i, plane) in planes.iter().enumerate() {
        let off = PAYLOAD_HEADER_SIZE + i * PLANE_RECORD_SIZE;
        buf[off..off + 4].copy_from_slice(&plane.buffer_index.to_le_bytes());
        buf[off + 4..off + 8].copy_from_slice(&plane.offset.to_le_bytes());
        buf[off + 8..off + 12].copy_from_slice(&plane.stride.to_le_bytes());
    }
}

fn read_u32(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes(buf[off..off + 4].try_into().unwrap())
}

fn read_i32(buf: &[u8], off: usize) -> i32 {
    i32::from_le_bytes(buf[off..off + 4].try_into().unwrap())
}

/// Inverse of [`encode_plane_payload`], with full bounds validation
pub(crate) fn decode_plane_payload(packet: &Packet) -> Result<(u32, Vec<PlaneRecord>)> {
    let buf = packet.data.as_slice();
    if buf.len() < PAYLOAD_HEADER_SIZE {
        return Err(FramelinkError::format("plane payload shorter than header"));
    }
    let format_tag = read_u32(buf, 0);
    let plane_count = read_u32(buf, 4) as usize;
    if plane_count == 0 || plane_count > MAX_PLANES {
        return Err(FramelinkError::format(format!(
            "plane count {} out of range 1..={}",
            plane_count, MAX_PLANES
        )));
    }
    let needed = PAYLOAD_HEADER_SIZE + plane_count * PLANE_RECORD_SIZE;
    if buf.len() < needed {
        return Err(FramelinkError::format(format!(
            "plane payload truncated: {} bytes, need {}",
            buf.len(),
            needed
        )));
    }

    let mut planes = Vec::with_capacity(plane_count);
    for i in 0..plane_count {
        let off = PAYLOAD_HEADER_SIZE + i * PLANE_RECORD_SIZE;
        planes.push(PlaneRecord {
            buffer_index: read_i32(buf, off),
            offset: read_i32(buf, off + 4),
            stride: read_i32(buf, off + 8),
        });
    }
    Ok((format_tag, planes))
}

/// Common contract implemented by every backend variant
///
/// Per frame/packet pair the lifecycle is strictly forward: a frame is
/// created, populated, marshalled into exactly one packet, carried by an
/// external transport, unmarshalled into exactly one frame, consumed and
/// released. Destroying a frame wrapper never releases a shared-memory
/// segment reference; the consumer does that explicitly.
pub trait HwBackend {
    /// Variant tag of this backend
    fn hw_type(&self) -> HwType;

    /// Capability flags (`SUPPORTS_VIDEO`, `SUPPORTS_SHARED`)
    fn support_flags(&self) -> u32;

    /// Pixel formats this backend can represent
    fn image_formats(&self) -> Vec<PixelFormat>;

    /// Allocate backend-native storage for a frame of `format`
    ///
    /// An unsupported pixel format is a configuration error surfaced to
    /// the caller, never retried.
    fn create_frame(&mut self, format: &VideoFormat) -> Result<VideoFrame>;

    /// Release the frame wrapper's backend-native storage
    ///
    /// Segment refcounting is driven by marshal/unmarshal, not by frame
    /// destruction.
    fn destroy_frame(&mut self, frame: VideoFrame) {
        drop(frame);
    }

    /// Marshal the frame's native geometry (and handles) into `packet`
    fn frame_to_packet(
        &mut self,
        format: &VideoFormat,
        frame: &VideoFrame,
        packet: &mut Packet,
    ) -> Result<()>;

    /// Reconstruct frame storage from a marshalled packet
    fn packet_to_frame(
        &mut self,
        format: &VideoFormat,
        packet: &Packet,
        frame: &mut VideoFrame,
    ) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A backend bound to its variant tag
pub struct HwContext {
    backend: Box<dyn HwBackend>,
}

impl HwContext {
    /// Context over the DMA-buffer backend
    pub fn dmabuf() -> Self {
        Self {
            backend: Box::new(DmaBufBackend::new()),
        }
    }

    /// Producer-side shared-memory context allocating `segment_size` segments
    pub fn shm_writer(segment_size: usize) -> Result<Self> {
        Ok(Self {
            backend: Box::new(ShmBackend::writer(segment_size)?),
        })
    }

    /// Consumer-side shared-memory context attaching to `owner_pid`'s segments
    pub fn shm_reader(segment_size: usize, owner_pid: u32) -> Result<Self> {
        Ok(Self {
            backend: Box::new(ShmBackend::reader(segment_size, owner_pid)?),
        })
    }

    pub fn hw_type(&self) -> HwType {
        self.backend.hw_type()
    }

    pub fn support_flags(&self) -> u32 {
        self.backend.support_flags()
    }

    /// Pixel formats usable for plain image frames
    pub fn image_formats(&self) -> Vec<PixelFormat> {
        self.backend.image_formats()
    }

    /// Pixel formats usable for overlays (alpha-capable subset)
    pub fn overlay_formats(&self) -> Vec<PixelFormat> {
        self.backend
            .image_formats()
            .into_iter()
            .filter(|f| f.has_alpha())
            .collect()
    }

    pub fn create_frame(&mut self, format: &VideoFormat) -> Result<VideoFrame> {
        self.backend.create_frame(format)
    }

    pub fn destroy_frame(&mut self, frame: VideoFrame) {
        self.backend.destroy_frame(frame)
    }

    pub fn frame_to_packet(
        &mut self,
        format: &VideoFormat,
        frame: &VideoFrame,
        packet: &mut Packet,
    ) -> Result<()> {
        self.backend.frame_to_packet(format, frame, packet)
    }

    pub fn packet_to_frame(
        &mut self,
        format: &VideoFormat,
        packet: &Packet,
        frame: &mut VideoFrame,
    ) -> Result<()> {
        self.backend.packet_to_frame(format, packet, frame)
    }

    /// Variant-specific access to the shared-memory backend
    pub fn as_shm_mut(&mut self) -> Option<&mut ShmBackend> {
        self.backend.as_any_mut().downcast_mut()
    }

    /// Variant-specific access to the DMA-buffer backend
    pub fn as_dmabuf_mut(&mut self) -> Option<&mut DmaBufBackend> {
        self.backend.as_any_mut().downcast_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_round_trip() {
        let planes = [
            PlaneRecord {
                buffer_index: 0,
                offset: 0,
                stride: 256,
            },
            PlaneRecord {
                buffer_index: 1,
                offset: 4096,
                stride: 128,
            },
        ];
        let mut packet = Packet::new();
        encode_plane_payload(0x3231_5559, &planes, &mut packet);
        let (tag, decoded) = decode_plane_payload(&packet).unwrap();
        assert_eq!(tag, 0x3231_5559);
        assert_eq!(decoded, planes);
    }

    #[test]
    fn test_payload_truncation_rejected() {
        let mut packet = Packet::new();
        encode_plane_payload(1, &[PlaneRecord::default(); 3], &mut packet);
        let full_len = packet.data.len();
        packet.data.alloc(full_len - 4);
        assert!(matches!(
            decode_plane_payload(&packet),
            Err(FramelinkError::Format { .. })
        ));
    }

    #[test]
    fn test_payload_plane_count_bounds() {
        let mut packet = Packet::new();
        packet.data.alloc(PAYLOAD_HEADER_SIZE);
        let buf = packet.data.as_mut_slice();
        buf[0..4].copy_from_slice(&1u32.to_le_bytes());
        buf[4..8].copy_from_slice(&9u32.to_le_bytes());
        assert!(decode_plane_payload(&packet).is_err());

        let buf = packet.data.as_mut_slice();
        buf[4..8].copy_from_slice(&0u32.to_le_bytes());
        assert!(decode_plane_payload(&packet).is_err());
    }

    #[test]
    fn test_overlay_formats_are_alpha_only() {
        let ctx = HwContext::dmabuf();
        for fmt in ctx.overlay_formats() {
            assert!(fmt.has_alpha());
        }
    }
}
