//! # Framelink - Zero-Copy Media Buffer Transport
//!
//! Framelink moves video/audio frame buffers between processes and
//! hardware domains without copying payload bytes, and provides the
//! packet/metadata envelope used to describe such buffers across process
//! boundaries.
//!
//! ## Features
//!
//! - **Shared-memory segment pools**: named POSIX objects with a
//!   cross-process reference counter embedded in each mapping
//! - **Hardware buffer backends**: DMA-buffer and shared-memory variants
//!   behind one marshalling contract
//! - **Packet envelope**: growable payload with a zeroed tail guard,
//!   timing/flags metadata and out-of-band descriptor handles
//! - **Header lacing**: the compact base-255 format for packing several
//!   codec header buffers into one blob
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │                  Framelink                     │
//! ├────────────────────────────────────────────────┤
//! │  hw backends            │  packet envelope     │
//! │  - dmabuf (fd passing)  │  - padded payload    │
//! │  - shm (segment pools)  │  - timing / flags    │
//! ├─────────────────────────┼──────────────────────┤
//! │  shm segments + pools   │  compression         │
//! │  - cross-process refcnt │  - lacing            │
//! │  - writer/reader modes  │  - codec registry    │
//! └─────────────────────────┴──────────────────────┘
//! ```
//!
//! How packets physically cross a process boundary (pipe, socket, RPC) is
//! up to the caller; Framelink only produces and consumes them.

pub mod compression;
pub mod error;
pub mod hw;
pub mod packet;
pub mod shm;
pub mod video;

// Main API re-exports
pub use compression::{CodecId, CompressionInfo};
pub use error::{FramelinkError, Result};
pub use hw::{DmaBufBackend, HwBackend, HwContext, HwType, PlaneRecord, ShmBackend};
pub use packet::{FrameType, Packet, PacketFlags, PaddedBuffer, PACKET_PADDING, TIMECODE_UNDEFINED, TIME_UNDEFINED};
pub use shm::{PoolMode, SegmentPool, SharedSegment};
pub use video::{FrameStorage, PixelFormat, Rectangle, VideoFormat, VideoFrame, MAX_PLANES};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
