//! Static codec-identifier metadata registry
//!
//! A fixed table keyed by [`CodecId`]: file extension, short/long names,
//! mimetype and capability flags. Lookups for unknown identifiers return
//! `None`; a miss is a sentinel, never an error. The transport core
//! consults only the capability side (whether a codec needs pixel-format
//! negotiation); it never mutates the table.

use serde::{Deserialize, Serialize};

/// Codec identifiers. Audio codecs live below `0x10000`, video codecs in
/// `0x10000..0x20000`, subtitle codecs from `0x20000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum CodecId {
    #[default]
    None = 0,

    /* Audio */
    Alaw = 1,
    Ulaw,
    Mp2,
    Mp3,
    Ac3,
    Aac,
    Vorbis,
    Flac,
    Opus,
    Speex,
    Dts,

    /* Video */
    Jpeg = 0x10000,
    Png,
    Tiff,
    Tga,
    Mpeg1,
    Mpeg2,
    Mpeg4Asp,
    H264,
    Theora,
    Dirac,
    Dv,
    Vp8,
    Div3,

    /* Subtitles */
    DvdSub = 0x20000,
}

impl CodecId {
    pub fn is_audio(self) -> bool {
        let v = self as u32;
        v > 0 && v < 0x10000
    }

    pub fn is_video(self) -> bool {
        let v = self as u32;
        (0x10000..0x20000).contains(&v)
    }

    pub fn is_subtitle(self) -> bool {
        self as u32 >= 0x20000
    }
}

/// Codec capability flags
pub mod codec_flags {
    /// Payload must be stored in a separate container (image codecs)
    pub const SEPARATE: u32 = 1 << 0;
    /// Decoding requires out-of-band pixel-format negotiation
    pub const NEEDS_PIXELFORMAT: u32 = 1 << 1;
    /// Every packet decodes to the same number of samples
    pub const CONSTANT_FRAME_SAMPLES: u32 = 1 << 2;
}

/// One registry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecDescriptor {
    pub id: CodecId,
    pub extension: Option<&'static str>,
    /// Short name, guaranteed to contain no spaces
    pub short_name: &'static str,
    pub long_name: &'static str,
    pub mimetype: Option<&'static str>,
    pub flags: u32,
    /// Bytes per sample for uncompressed-ish audio codecs, 0 otherwise
    pub sample_size: u32,
}

use codec_flags::{CONSTANT_FRAME_SAMPLES as CFS, NEEDS_PIXELFORMAT as NEEDS_PF, SEPARATE};

#[rustfmt::skip]
static CODECS: &[CodecDescriptor] = &[
    /* Audio */
    CodecDescriptor { id: CodecId::Alaw,     extension: None,         short_name: "alaw",   long_name: "alaw",          mimetype: Some("audio/x-alaw"),   flags: 0,                  sample_size: 1 },
    CodecDescriptor { id: CodecId::Ulaw,     extension: None,         short_name: "ulaw",   long_name: "ulaw",          mimetype: Some("audio/x-mulaw"),  flags: 0,                  sample_size: 1 },
    CodecDescriptor { id: CodecId::Mp2,      extension: Some("mp2"),  short_name: "mp2",    long_name: "MPEG layer 2",  mimetype: Some("audio/mpeg"),     flags: CFS,                sample_size: 0 },
    CodecDescriptor { id: CodecId::Mp3,      extension: Some("mp3"),  short_name: "mp3",    long_name: "MPEG layer 3",  mimetype: Some("audio/mpeg"),     flags: CFS,                sample_size: 0 },
    CodecDescriptor { id: CodecId::Ac3,      extension: Some("ac3"),  short_name: "ac3",    long_name: "AC3",           mimetype: Some("audio/x-ac3"),    flags: CFS,                sample_size: 0 },
    CodecDescriptor { id: CodecId::Aac,      extension: None,         short_name: "aac",    long_name: "AAC",           mimetype: None,                   flags: CFS,                sample_size: 0 },
    CodecDescriptor { id: CodecId::Vorbis,   extension: None,         short_name: "vorbis", long_name: "Vorbis",        mimetype: Some("audio/x-vorbis"), flags: 0,                  sample_size: 0 },
    CodecDescriptor { id: CodecId::Flac,     extension: None,         short_name: "flac",   long_name: "Flac",          mimetype: Some("audio/x-flac"),   flags: 0,                  sample_size: 0 },
    CodecDescriptor { id: CodecId::Opus,     extension: None,         short_name: "opus",   long_name: "Opus",          mimetype: Some("audio/opus"),     flags: 0,                  sample_size: 0 },
    CodecDescriptor { id: CodecId::Speex,    extension: None,         short_name: "speex",  long_name: "Speex",         mimetype: Some("audio/x-speex"),  flags: CFS,                sample_size: 0 },
    CodecDescriptor { id: CodecId::Dts,      extension: None,         short_name: "dts",    long_name: "DTS",           mimetype: None,                   flags: 0,                  sample_size: 0 },

    /* Video */
    CodecDescriptor { id: CodecId::Jpeg,     extension: Some("jpg"),  short_name: "jpeg",   long_name: "JPEG image",    mimetype: Some("image/jpeg"),     flags: SEPARATE | NEEDS_PF, sample_size: 0 },
    CodecDescriptor { id: CodecId::Png,      extension: Some("png"),  short_name: "png",    long_name: "PNG image",     mimetype: Some("image/png"),      flags: SEPARATE | NEEDS_PF, sample_size: 0 },
    CodecDescriptor { id: CodecId::Tiff,     extension: Some("tif"),  short_name: "tiff",   long_name: "TIFF image",    mimetype: Some("image/tiff"),     flags: SEPARATE | NEEDS_PF, sample_size: 0 },
    CodecDescriptor { id: CodecId::Tga,      extension: Some("tga"),  short_name: "tga",    long_name: "TGA image",     mimetype: Some("image/x-tga"),    flags: SEPARATE | NEEDS_PF, sample_size: 0 },
    CodecDescriptor { id: CodecId::Mpeg1,    extension: Some("mpv"),  short_name: "mpeg1",  long_name: "MPEG-1",        mimetype: Some("video/mpeg"),     flags: 0,                  sample_size: 0 },
    CodecDescriptor { id: CodecId::Mpeg2,    extension: Some("mpv"),  short_name: "mpeg2",  long_name: "MPEG-2",        mimetype: Some("video/mpeg"),     flags: NEEDS_PF,           sample_size: 0 },
    CodecDescriptor { id: CodecId::Mpeg4Asp, extension: Some("m4v"),  short_name: "mpeg4",  long_name: "MPEG-4",        mimetype: None,                   flags: 0,                  sample_size: 0 },
    CodecDescriptor { id: CodecId::H264,     extension: Some("h264"), short_name: "h264",   long_name: "H.264",         mimetype: None,                   flags: 0,                  sample_size: 0 },
    CodecDescriptor { id: CodecId::Theora,   extension: None,         short_name: "theora", long_name: "Theora",        mimetype: None,                   flags: 0,                  sample_size: 0 },
    CodecDescriptor { id: CodecId::Dirac,    extension: None,         short_name: "dirac",  long_name: "Dirac",         mimetype: Some("video/x-dirac"),  flags: 0,                  sample_size: 0 },
    CodecDescriptor { id: CodecId::Dv,       extension: Some("dv"),   short_name: "dv",     long_name: "DV",            mimetype: None,                   flags: NEEDS_PF,           sample_size: 0 },
    CodecDescriptor { id: CodecId::Vp8,      extension: None,         short_name: "vp8",    long_name: "VP8",           mimetype: Some("video/x-vp8"),    flags: 0,                  sample_size: 0 },
    CodecDescriptor { id: CodecId::Div3,     extension: None,         short_name: "divx3",  long_name: "DivX 3",        mimetype: None,                   flags: 0,                  sample_size: 0 },

    /* Subtitles */
    CodecDescriptor { id: CodecId::DvdSub,   extension: None,         short_name: "dvdsub", long_name: "DVD subtitles", mimetype: None,                   flags: 0,                  sample_size: 0 },
];

/// Full descriptor for `id`, `None` for unregistered codecs
pub fn descriptor(id: CodecId) -> Option<&'static CodecDescriptor> {
    CODECS.iter().find(|c| c.id == id)
}

/// All registered descriptors, in table order
pub fn all() -> &'static [CodecDescriptor] {
    CODECS
}

/// File extension, if the codec has a canonical one
pub fn extension(id: CodecId) -> Option<&'static str> {
    descriptor(id).and_then(|c| c.extension)
}

/// Short name without spaces
pub fn short_name(id: CodecId) -> Option<&'static str> {
    descriptor(id).map(|c| c.short_name)
}

/// Human-readable name
pub fn long_name(id: CodecId) -> Option<&'static str> {
    descriptor(id).map(|c| c.long_name)
}

/// Reverse lookup by short name
pub fn from_short_name(name: &str) -> Option<CodecId> {
    CODECS.iter().find(|c| c.short_name == name).map(|c| c.id)
}

/// Whether the codec's payload belongs in a separate container
pub fn is_separate(id: CodecId) -> bool {
    descriptor(id).is_some_and(|c| c.flags & SEPARATE != 0)
}

/// Whether decoding requires pixel-format negotiation
pub fn needs_pixelformat(id: CodecId) -> bool {
    descriptor(id).is_some_and(|c| c.flags & NEEDS_PF != 0)
}

/// Whether every packet decodes to a constant number of samples
pub fn constant_frame_samples(id: CodecId) -> bool {
    descriptor(id).is_some_and(|c| c.flags & CFS != 0)
}

/// Bytes per sample, 0 when unknown or not applicable
pub fn sample_size(id: CodecId) -> u32 {
    descriptor(id).map_or(0, |c| c.sample_size)
}
