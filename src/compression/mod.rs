//! Codec metadata and multi-segment header lacing

pub mod info;
pub mod lacing;
pub mod registry;

pub use info::{compression_flags, CompressionInfo, BITRATE_VBR};
pub use registry::{codec_flags, CodecDescriptor, CodecId};
