//! Shared-memory backend
//!
//! Frame pixel data lives in a pool segment, never in the frame wrapper.
//! A producer-side backend owns a writer [`SegmentPool`]; pairing a frame
//! with a segment takes the reference that stays elevated while the
//! packet is in transit. The consumer attaches the same segment through
//! its reader pool and drops the reference explicitly with
//! [`ShmBackend::release_segment`] once done; destroying the frame
//! wrapper alone never releases the segment.

use std::any::Any;

use crate::error::{FramelinkError, Result};
use crate::packet::Packet;
use crate::shm::{PoolMode, SegmentPool};
use crate::video::format::{PixelFormat, VideoFormat, MAX_PLANES};
use crate::video::frame::{FrameStorage, VideoFrame};

use super::{
    decode_plane_payload, encode_plane_payload, HwBackend, HwType, PlaneRecord, SUPPORTS_SHARED,
    SUPPORTS_VIDEO,
};

/// Native storage of a shared-memory frame
#[derive(Debug, Clone, PartialEq)]
pub struct ShmStorage {
    /// Pool segment holding the pixel data, `None` until paired
    pub segment_id: Option<u32>,
    /// Plane table, `num_planes` entries populated
    pub planes: [PlaneRecord; MAX_PLANES],
    pub num_planes: usize,
}

impl Default for ShmStorage {
    fn default() -> Self {
        Self {
            segment_id: None,
            planes: [PlaneRecord::default(); MAX_PLANES],
            num_planes: 0,
        }
    }
}

impl ShmStorage {
    /// Populated plane entries
    pub fn planes(&self) -> &[PlaneRecord] {
        &self.planes[..self.num_planes]
    }
}

/// Backend marshalling frames through a shared-memory segment pool
#[derive(Debug)]
pub struct ShmBackend {
    pool: SegmentPool,
}

impl ShmBackend {
    /// Producer-side backend allocating segments of `segment_size`
    pub fn writer(segment_size: usize) -> Result<Self> {
        Ok(Self {
            pool: SegmentPool::new_writer(segment_size)?,
        })
    }

    /// Consumer-side backend attaching to segments of `owner_pid`
    pub fn reader(segment_size: usize, owner_pid: u32) -> Result<Self> {
        Ok(Self {
            pool: SegmentPool::new_reader(segment_size, owner_pid)?,
        })
    }

    /// The underlying segment pool
    pub fn pool(&self) -> &SegmentPool {
        &self.pool
    }

    fn storage(frame: &VideoFrame) -> Result<&ShmStorage> {
        match &frame.storage {
            FrameStorage::Shm(storage) => Ok(storage),
            _ => Err(FramelinkError::invalid_state(
                "frame storage is not shared memory",
            )),
        }
    }

    fn storage_mut(frame: &mut VideoFrame) -> Result<&mut ShmStorage> {
        match &mut frame.storage {
            FrameStorage::Shm(storage) => Ok(storage),
            _ => Err(FramelinkError::invalid_state(
                "frame storage is not shared memory",
            )),
        }
    }

    fn paired_segment_id(frame: &VideoFrame) -> Result<u32> {
        Self::storage(frame)?.segment_id.ok_or_else(|| {
            FramelinkError::invalid_state("frame is not paired with a pool segment")
        })
    }

    /// Pair `frame` with a writable segment, incrementing its refcount
    ///
    /// The reference taken here stays elevated until the consumer calls
    /// [`release_segment`](Self::release_segment) for its copy of the
    /// frame. Returns the segment id encoded at marshal time. A frame
    /// that is already paired must be released first.
    pub fn acquire_segment(&mut self, frame: &mut VideoFrame) -> Result<u32> {
        if Self::storage(frame)?.segment_id.is_some() {
            return Err(FramelinkError::invalid_state(
                "frame is already paired with a pool segment",
            ));
        }
        let segment = self.pool.get_for_write()?;
        let id = segment.id();
        Self::storage_mut(frame)?.segment_id = Some(id);
        Ok(id)
    }

    /// Drop the frame's segment reference and unpair it
    pub fn release_segment(&mut self, frame: &mut VideoFrame) -> Result<()> {
        let id = Self::paired_segment_id(frame)?;
        let segment = self.pool.segment(id).ok_or_else(|| {
            FramelinkError::invalid_parameter("frame", format!("segment {} not held by pool", id))
        })?;
        segment.unref();
        Self::storage_mut(frame)?.segment_id = None;
        Ok(())
    }

    /// Pixel bytes of the frame's paired segment
    pub fn frame_data(&self, frame: &VideoFrame) -> Result<&[u8]> {
        let id = Self::paired_segment_id(frame)?;
        let segment = self.pool.segment(id).ok_or_else(|| {
            FramelinkError::invalid_parameter("frame", format!("segment {} not held by pool", id))
        })?;
        Ok(segment.data())
    }

    /// Mutable pixel bytes of the frame's paired segment
    pub fn frame_data_mut(&mut self, frame: &VideoFrame) -> Result<&mut [u8]> {
        let id = Self::paired_segment_id(frame)?;
        let segment = self.pool.segment_mut(id).ok_or_else(|| {
            FramelinkError::invalid_parameter("frame", format!("segment {} not held by pool", id))
        })?;
        Ok(segment.data_mut())
    }
}

impl HwBackend for ShmBackend {
    fn hw_type(&self) -> HwType {
        HwType::SharedMemory
    }

    fn support_flags(&self) -> u32 {
        SUPPORTS_VIDEO | SUPPORTS_SHARED
    }

    fn image_formats(&self) -> Vec<PixelFormat> {
        PixelFormat::all().to_vec()
    }

    fn create_frame(&mut self, format: &VideoFormat) -> Result<VideoFrame> {
        if format.image_size() > self.pool.segment_size() {
            return Err(FramelinkError::invalid_parameter(
                "format",
                format!(
                    "frame needs {} bytes, pool segments are {}",
                    format.image_size(),
                    self.pool.segment_size()
                ),
            ));
        }

        let layout = format.plane_layout();
        let mut storage = ShmStorage {
            num_planes: layout.len(),
            ..Default::default()
        };
        let mut frame = VideoFrame::new();
        for (i, plane) in layout.iter().enumerate() {
            storage.planes[i] = PlaneRecord {
                buffer_index: -1,
                offset: plane.offset as i32,
                stride: plane.stride as i32,
            };
            frame.strides[i] = plane.stride as i32;
        }
        frame.storage = FrameStorage::Shm(storage);
        Ok(frame)
    }

    fn frame_to_packet(
        &mut self,
        format: &VideoFormat,
        frame: &VideoFrame,
        packet: &mut Packet,
    ) -> Result<()> {
        let id = Self::paired_segment_id(frame)?;
        let storage = Self::storage(frame)?;

        let mut records = Vec::with_capacity(storage.num_planes);
        for (i, plane) in storage.planes().iter().enumerate() {
            records.push(PlaneRecord {
                buffer_index: id as i32,
                offset: plane.offset,
                stride: frame.strides[i],
            });
        }
        encode_plane_payload(format.pixelformat.tag(), &records, packet);
        packet.clear_fds();
        frame.write_packet_metadata(packet);
        Ok(())
    }

    fn packet_to_frame(
        &mut self,
        _format: &VideoFormat,
        packet: &Packet,
        frame: &mut VideoFrame,
    ) -> Result<()> {
        Self::storage(frame)?;

        let (tag, records) = decode_plane_payload(packet)?;
        if PixelFormat::from_tag(tag).is_none() {
            return Err(FramelinkError::format(format!(
                "unknown pixel format tag {} in packet",
                tag
            )));
        }
        if records[0].buffer_index < 0 {
            return Err(FramelinkError::format(
                "negative segment id in plane payload",
            ));
        }
        let id = records[0].buffer_index as u32;
        self.pool.get_for_read(id)?;

        {
            let storage = Self::storage_mut(frame)?;
            storage.num_planes = records.len();
            for (i, record) in records.iter().enumerate() {
                storage.planes[i] = *record;
            }
            storage.segment_id = Some(id);
        }
        for (i, record) in records.iter().enumerate() {
            frame.strides[i] = record.stride;
        }
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
