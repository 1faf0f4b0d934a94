//! Per-stream compression metadata

use std::fmt;

use crate::error::Result;
use crate::packet::PaddedBuffer;

use super::{lacing, registry, CodecId};

/// Sentinel bitrate for variable-bitrate streams
pub const BITRATE_VBR: i32 = -1;

/// Stream-level compression flags
pub mod compression_flags {
    /// Stream contains P frames
    pub const HAS_P_FRAMES: u32 = 1 << 0;
    /// Stream contains B frames
    pub const HAS_B_FRAMES: u32 = 1 << 1;
    /// Spectral band replication (HE-AAC)
    pub const SBR: u32 = 1 << 2;
}

/// Metadata describing one compressed stream
///
/// The global header is kept in a padded buffer so decoders parsing it can
/// overread safely. Codecs emitting several logically distinct header
/// buffers store them laced; see [`append_laced_header`](Self::append_laced_header).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompressionInfo {
    pub id: CodecId,
    pub flags: u32,
    /// Bits per second, 0 when unknown, [`BITRATE_VBR`] for VBR
    pub bitrate: i32,
    /// Decoder samples to skip at stream start
    pub pre_skip: u32,
    pub palette_size: u32,
    /// Video buffering verifier size in bytes
    pub video_buffer_size: u32,
    pub max_ref_frames: u32,
    /// Upper bound on packet payload size, 0 when unknown
    pub max_packet_size: u32,
    global_header: PaddedBuffer,
}

impl CompressionInfo {
    pub fn new(id: CodecId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Replace the global header with a copy of `data`
    pub fn set_global_header(&mut self, data: &[u8]) {
        self.global_header.set_from_slice(data);
    }

    /// Append raw bytes to the global header
    pub fn append_global_header(&mut self, data: &[u8]) {
        self.global_header.append(data);
    }

    /// Append one laced segment to the global header
    ///
    /// Starts a new single-segment lace when the header is still empty.
    pub fn append_laced_header(&mut self, segment: &[u8]) -> Result<()> {
        let laced = lacing::append(self.global_header.as_slice(), segment)?;
        self.global_header.set_from_slice(&laced);
        Ok(())
    }

    /// Borrowed view of the laced header segment at `index`
    pub fn laced_header_segment(&self, index: usize) -> Result<&[u8]> {
        lacing::extract(self.global_header.as_slice(), index)
    }

    /// Global header bytes
    pub fn global_header(&self) -> &[u8] {
        self.global_header.as_slice()
    }

    pub fn has_global_header(&self) -> bool {
        !self.global_header.is_empty()
    }

    /// Mimetype of the stream, with the HE-AAC special case
    pub fn mimetype(&self) -> Option<&'static str> {
        if self.id == CodecId::Aac {
            return if self.flags & compression_flags::SBR != 0 {
                Some("audio/aacp")
            } else {
                Some("audio/aac")
            };
        }
        registry::descriptor(self.id).and_then(|c| c.mimetype)
    }
}

impl fmt::Display for CompressionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compression info")?;
        writeln!(
            f,
            "  Codec:           {} [{}]",
            registry::long_name(self.id).unwrap_or("unknown"),
            registry::short_name(self.id).unwrap_or("?")
        )?;
        match self.bitrate {
            BITRATE_VBR => writeln!(f, "  Bitrate:         Variable")?,
            0 => writeln!(f, "  Bitrate:         Unknown")?,
            b => writeln!(f, "  Bitrate:         {} bps", b)?,
        }
        if self.id.is_audio() {
            writeln!(f, "  pre_skip:        {}", self.pre_skip)?;
            writeln!(
                f,
                "  SBR:             {}",
                if self.flags & compression_flags::SBR != 0 {
                    "Yes"
                } else {
                    "No"
                }
            )?;
        }
        if self.id.is_video() {
            writeln!(f, "  Palette size:    {}", self.palette_size)?;
            writeln!(f, "  VBV size:        {} bytes", self.video_buffer_size)?;
            writeln!(f, "  max ref frames:  {}", self.max_ref_frames)?;
            let mut types = String::from("I");
            if self.flags & compression_flags::HAS_P_FRAMES != 0 {
                types.push_str(",P");
            }
            if self.flags & compression_flags::HAS_B_FRAMES != 0 {
                types.push_str(",B");
            }
            writeln!(f, "  Frame types:     {}", types)?;
        }
        match self.max_packet_size {
            0 => writeln!(f, "  max_packet_size: 0 (unknown)")?,
            n => writeln!(f, "  max_packet_size: {}", n)?,
        }
        write!(f, "  Global header:   {} bytes", self.global_header.len())
    }
}
