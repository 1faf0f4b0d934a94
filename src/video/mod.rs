//! Video formats, geometry and frames

pub mod format;
pub mod frame;

pub use format::{PixelFormat, PlaneLayout, Rectangle, VideoFormat, MAX_PLANES, STRIDE_ALIGN};
pub use frame::{FrameStorage, VideoFrame};
