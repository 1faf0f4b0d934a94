//! DMA-buffer backend
//!
//! Frames are backed by DMA-capable buffers owned outside this crate and
//! referenced through descriptor handles (file descriptors). Marshalling
//! writes the plane table into the packet payload and copies one handle
//! per distinct backing buffer into the packet's out-of-band handle
//! array; the handles' validity window is owned by whatever transmits
//! them.

use std::any::Any;
use std::os::fd::RawFd;

use crate::error::{FramelinkError, Result};
use crate::packet::Packet;
use crate::video::format::{PixelFormat, VideoFormat, MAX_PLANES};
use crate::video::frame::{FrameStorage, VideoFrame};

use super::{
    decode_plane_payload, encode_plane_payload, HwBackend, HwType, PlaneRecord, SUPPORTS_VIDEO,
};

const fn fourcc(a: u8, b: u8, c: u8, d: u8) -> u32 {
    (a as u32) | ((b as u32) << 8) | ((c as u32) << 16) | ((d as u32) << 24)
}

pub const DRM_FORMAT_RGB888: u32 = fourcc(b'R', b'G', b'2', b'4');
pub const DRM_FORMAT_BGR888: u32 = fourcc(b'B', b'G', b'2', b'4');
pub const DRM_FORMAT_YUYV: u32 = fourcc(b'Y', b'U', b'Y', b'V');
pub const DRM_FORMAT_UYVY: u32 = fourcc(b'U', b'Y', b'V', b'Y');
pub const DRM_FORMAT_YUV411: u32 = fourcc(b'Y', b'U', b'1', b'1');
pub const DRM_FORMAT_YUV420: u32 = fourcc(b'Y', b'U', b'1', b'2');
pub const DRM_FORMAT_YUV422: u32 = fourcc(b'Y', b'U', b'1', b'6');
pub const DRM_FORMAT_YUV444: u32 = fourcc(b'Y', b'U', b'2', b'4');

static DRM_FORMATS: &[(u32, PixelFormat)] = &[
    (DRM_FORMAT_RGB888, PixelFormat::Rgb24),
    (DRM_FORMAT_BGR888, PixelFormat::Bgr24),
    (DRM_FORMAT_YUYV, PixelFormat::Yuy2),
    (DRM_FORMAT_UYVY, PixelFormat::Uyvy),
    (DRM_FORMAT_YUV411, PixelFormat::Yuv411P),
    (DRM_FORMAT_YUV420, PixelFormat::Yuv420P),
    (DRM_FORMAT_YUV422, PixelFormat::Yuv422P),
    (DRM_FORMAT_YUV444, PixelFormat::Yuv444P),
];

/// DRM fourcc for a pixel format, if one exists
pub fn drm_fourcc_from_pixelformat(fmt: PixelFormat) -> Option<u32> {
    DRM_FORMATS
        .iter()
        .find(|(_, f)| *f == fmt)
        .map(|(cc, _)| *cc)
}

/// Pixel format for a DRM fourcc, if known
pub fn pixelformat_from_drm_fourcc(cc: u32) -> Option<PixelFormat> {
    DRM_FORMATS.iter().find(|(c, _)| *c == cc).map(|(_, f)| *f)
}

/// One plane of a DMA-buffer frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DmaPlane {
    /// Index into the frame's buffer (and the packet's handle) table
    pub buf_idx: i32,
    /// Byte offset of the plane inside its buffer
    pub offset: i32,
}

/// Native storage of a DMA-buffer frame
#[derive(Debug, Clone, PartialEq)]
pub struct DmaBufStorage {
    /// DRM fourcc of the pixel layout
    pub fourcc: u32,
    /// Plane table, `num_planes` entries populated
    pub planes: [DmaPlane; MAX_PLANES],
    pub num_planes: usize,
    /// Descriptor handles, one per distinct backing buffer
    pub buffers: [RawFd; MAX_PLANES],
    pub num_buffers: usize,
}

impl Default for DmaBufStorage {
    fn default() -> Self {
        Self {
            fourcc: 0,
            planes: [DmaPlane::default(); MAX_PLANES],
            num_planes: 0,
            buffers: [-1; MAX_PLANES],
            num_buffers: 0,
        }
    }
}

impl DmaBufStorage {
    /// Populated plane entries
    pub fn planes(&self) -> &[DmaPlane] {
        &self.planes[..self.num_planes]
    }

    /// Descriptor handles in buffer-index order
    pub fn buffers(&self) -> &[RawFd] {
        &self.buffers[..self.num_buffers]
    }
}

/// Backend for DMA-capable buffers
#[derive(Debug, Default)]
pub struct DmaBufBackend;

impl DmaBufBackend {
    pub fn new() -> Self {
        Self
    }
}

impl HwBackend for DmaBufBackend {
    fn hw_type(&self) -> HwType {
        HwType::DmaBuffer
    }

    fn support_flags(&self) -> u32 {
        SUPPORTS_VIDEO
    }

    fn image_formats(&self) -> Vec<PixelFormat> {
        DRM_FORMATS.iter().map(|(_, f)| *f).collect()
    }

    fn create_frame(&mut self, format: &VideoFormat) -> Result<VideoFrame> {
        let fourcc = drm_fourcc_from_pixelformat(format.pixelformat).ok_or_else(|| {
            FramelinkError::invalid_parameter(
                "pixelformat",
                format!("{} has no DRM fourcc mapping", format.pixelformat.name()),
            )
        })?;

        let mut frame = VideoFrame::new();
        frame.storage = FrameStorage::DmaBuf(DmaBufStorage {
            fourcc,
            ..Default::default()
        });
        Ok(frame)
    }

    fn frame_to_packet(
        &mut self,
        _format: &VideoFormat,
        frame: &VideoFrame,
        packet: &mut Packet,
    ) -> Result<()> {
        let info = match &frame.storage {
            FrameStorage::DmaBuf(info) => info,
            _ => {
                return Err(FramelinkError::invalid_state(
                    "frame storage is not a DMA buffer",
                ))
            }
        };
        if info.num_planes == 0 {
            return Err(FramelinkError::invalid_state(
                "frame has no populated planes",
            ));
        }

        let mut records = Vec::with_capacity(info.num_planes);
        for (i, plane) in info.planes().iter().enumerate() {
            records.push(PlaneRecord {
                buffer_index: plane.buf_idx,
                offset: plane.offset,
                stride: frame.strides[i],
            });
        }
        encode_plane_payload(info.fourcc, &records, packet);
        packet.set_fds(info.buffers())?;
        frame.write_packet_metadata(packet);
        Ok(())
    }

    fn packet_to_frame(
        &mut self,
        _format: &VideoFormat,
        packet: &Packet,
        frame: &mut VideoFrame,
    ) -> Result<()> {
        match &frame.storage {
            FrameStorage::DmaBuf(_) => {}
            _ => {
                return Err(FramelinkError::invalid_state(
                    "frame storage is not a DMA buffer",
                ))
            }
        }

        let (fourcc, records) = decode_plane_payload(packet)?;
        if pixelformat_from_drm_fourcc(fourcc).is_none() {
            return Err(FramelinkError::format(format!(
                "unknown DRM fourcc {:#010x} in packet",
                fourcc
            )));
        }

        for (i, record) in records.iter().enumerate() {
            if record.buffer_index < 0 || record.buffer_index as usize >= packet.fds().len() {
                return Err(FramelinkError::format(format!(
                    "plane {} references handle {} but packet carries {}",
                    i,
                    record.buffer_index,
                    packet.fds().len()
                )));
            }
        }

        let mut info = DmaBufStorage {
            fourcc,
            num_planes: records.len(),
            ..Default::default()
        };
        for (i, record) in records.iter().enumerate() {
            info.planes[i] = DmaPlane {
                buf_idx: record.buffer_index,
                offset: record.offset,
            };
            frame.strides[i] = record.stride;
        }
        info.num_buffers = packet.fds().len();
        info.buffers[..info.num_buffers].copy_from_slice(packet.fds());

        frame.storage = FrameStorage::DmaBuf(info);
        frame.apply_packet_metadata(packet);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_table_is_bijective() {
        for &(cc, fmt) in DRM_FORMATS {
            assert_eq!(drm_fourcc_from_pixelformat(fmt), Some(cc));
            assert_eq!(pixelformat_from_drm_fourcc(cc), Some(fmt));
        }
        assert_eq!(drm_fourcc_from_pixelformat(PixelFormat::Rgba32), None);
        assert_eq!(pixelformat_from_drm_fourcc(0), None);
    }

    #[test]
    fn test_create_frame_rejects_unmapped_format() {
        let mut backend = DmaBufBackend::new();
        let format = VideoFormat::new(64, 64, PixelFormat::Rgba32);
        assert!(matches!(
            backend.create_frame(&format),
            Err(FramelinkError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_unmarshal_rejects_out_of_range_handle_index() {
        let mut backend = DmaBufBackend::new();
        let format = VideoFormat::new(64, 64, PixelFormat::Yuv420P);

        let mut frame = backend.create_frame(&format).unwrap();
        if let FrameStorage::DmaBuf(info) = &mut frame.storage {
            info.num_planes = 1;
            info.planes[0] = DmaPlane { buf_idx: 0, offset: 0 };
            info.num_buffers = 1;
            info.buffers[0] = 17;
        }
        let mut packet = Packet::new();
        backend.frame_to_packet(&format, &frame, &mut packet).unwrap();

        // A payload whose plane points past the handle array must not
        // produce storage referencing an unpopulated slot
        packet.clear_fds();
        let mut target = backend.create_frame(&format).unwrap();
        assert!(matches!(
            backend.packet_to_frame(&format, &packet, &mut target),
            Err(FramelinkError::Format { .. })
        ));
        match &target.storage {
            FrameStorage::DmaBuf(info) => assert_eq!(info.num_planes, 0),
            _ => panic!("expected dmabuf storage"),
        }
    }

    #[test]
    fn test_marshal_unpopulated_frame_is_invalid_state() {
        let mut backend = DmaBufBackend::new();
        let format = VideoFormat::new(64, 64, PixelFormat::Yuv420P);
        let frame = backend.create_frame(&format).unwrap();
        let mut packet = Packet::new();
        assert!(matches!(
            backend.frame_to_packet(&format, &frame, &mut packet),
            Err(FramelinkError::InvalidState { .. })
        ));
    }
}
