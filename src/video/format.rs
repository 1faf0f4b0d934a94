//! Pixel formats and frame geometry
//!
//! Only the narrow surface the buffer transport needs: a closed set of
//! pixel formats, alpha capability, and plane layout computation used to
//! size shared-memory frames.

use serde::{Deserialize, Serialize};

/// Number of bytes strides and plane offsets are rounded up to
pub const STRIDE_ALIGN: usize = 16;

/// Maximum number of planes a frame or packet payload can describe
pub const MAX_PLANES: usize = 4;

/// Closed set of pixel formats understood by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum PixelFormat {
    /// Packed RGB, 3 bytes per pixel
    Rgb24 = 1,
    /// Packed BGR, 3 bytes per pixel
    Bgr24 = 2,
    /// Packed RGBA, 4 bytes per pixel
    Rgba32 = 3,
    /// Packed YUV 4:2:2, Y0 U Y1 V ordering
    Yuy2 = 4,
    /// Packed YUV 4:2:2, U Y0 V Y1 ordering
    Uyvy = 5,
    /// Planar YUV 4:1:1
    Yuv411P = 6,
    /// Planar YUV 4:2:0
    Yuv420P = 7,
    /// Planar YUV 4:2:2
    Yuv422P = 8,
    /// Planar YUV 4:4:4
    Yuv444P = 9,
}

impl PixelFormat {
    /// All formats, in enumeration order
    pub fn all() -> &'static [PixelFormat] {
        &[
            PixelFormat::Rgb24,
            PixelFormat::Bgr24,
            PixelFormat::Rgba32,
            PixelFormat::Yuy2,
            PixelFormat::Uyvy,
            PixelFormat::Yuv411P,
            PixelFormat::Yuv420P,
            PixelFormat::Yuv422P,
            PixelFormat::Yuv444P,
        ]
    }

    /// Stable wire tag for this format
    pub fn tag(self) -> u32 {
        self as u32
    }

    /// Inverse of [`tag`](Self::tag); `None` for unknown tags
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            1 => Some(PixelFormat::Rgb24),
            2 => Some(PixelFormat::Bgr24),
            3 => Some(PixelFormat::Rgba32),
            4 => Some(PixelFormat::Yuy2),
            5 => Some(PixelFormat::Uyvy),
            6 => Some(PixelFormat::Yuv411P),
            7 => Some(PixelFormat::Yuv420P),
            8 => Some(PixelFormat::Yuv422P),
            9 => Some(PixelFormat::Yuv444P),
            _ => None,
        }
    }

    /// Whether the format carries an alpha channel
    pub fn has_alpha(self) -> bool {
        matches!(self, PixelFormat::Rgba32)
    }

    /// Number of planes a frame of this format occupies
    pub fn plane_count(self) -> usize {
        match self {
            PixelFormat::Rgb24
            | PixelFormat::Bgr24
            | PixelFormat::Rgba32
            | PixelFormat::Yuy2
            | PixelFormat::Uyvy => 1,
            PixelFormat::Yuv411P
            | PixelFormat::Yuv420P
            | PixelFormat::Yuv422P
            | PixelFormat::Yuv444P => 3,
        }
    }

    /// Bytes per pixel for packed formats
    fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb24 | PixelFormat::Bgr24 => 3,
            PixelFormat::Rgba32 => 4,
            PixelFormat::Yuy2 | PixelFormat::Uyvy => 2,
            _ => 1,
        }
    }

    /// Horizontal and vertical chroma subsampling for planar formats
    fn chroma_subsampling(self) -> (usize, usize) {
        match self {
            PixelFormat::Yuv411P => (4, 1),
            PixelFormat::Yuv420P => (2, 2),
            PixelFormat::Yuv422P => (2, 1),
            _ => (1, 1),
        }
    }

    /// Short display name
    pub fn name(self) -> &'static str {
        match self {
            PixelFormat::Rgb24 => "rgb24",
            PixelFormat::Bgr24 => "bgr24",
            PixelFormat::Rgba32 => "rgba32",
            PixelFormat::Yuy2 => "yuy2",
            PixelFormat::Uyvy => "uyvy",
            PixelFormat::Yuv411P => "yuv411p",
            PixelFormat::Yuv420P => "yuv420p",
            PixelFormat::Yuv422P => "yuv422p",
            PixelFormat::Yuv444P => "yuv444p",
        }
    }
}

/// Integer rectangle (source crop of a frame)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rectangle {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

/// Offset/stride/height of one plane inside a contiguous frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneLayout {
    /// Byte offset of the plane from the start of the buffer
    pub offset: usize,
    /// Bytes per row, aligned to [`STRIDE_ALIGN`]
    pub stride: usize,
    /// Rows in this plane
    pub height: usize,
}

/// Frame geometry: dimensions plus pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFormat {
    pub width: u32,
    pub height: u32,
    pub pixelformat: PixelFormat,
}

fn align_stride(n: usize) -> usize {
    (n + STRIDE_ALIGN - 1) / STRIDE_ALIGN * STRIDE_ALIGN
}

impl VideoFormat {
    pub fn new(width: u32, height: u32, pixelformat: PixelFormat) -> Self {
        Self {
            width,
            height,
            pixelformat,
        }
    }

    /// Layout of every plane when the frame is stored contiguously
    pub fn plane_layout(&self) -> Vec<PlaneLayout> {
        let width = self.width as usize;
        let height = self.height as usize;
        let mut planes = Vec::with_capacity(self.pixelformat.plane_count());

        if self.pixelformat.plane_count() == 1 {
            planes.push(PlaneLayout {
                offset: 0,
                stride: align_stride(width * self.pixelformat.bytes_per_pixel()),
                height,
            });
            return planes;
        }

        let (sub_h, sub_v) = self.pixelformat.chroma_subsampling();
        let luma_stride = align_stride(width);
        let chroma_stride = align_stride(width.div_ceil(sub_h));
        let chroma_height = height.div_ceil(sub_v);

        planes.push(PlaneLayout {
            offset: 0,
            stride: luma_stride,
            height,
        });
        let mut offset = luma_stride * height;
        for _ in 0..2 {
            planes.push(PlaneLayout {
                offset,
                stride: chroma_stride,
                height: chroma_height,
            });
            offset += chroma_stride * chroma_height;
        }
        planes
    }

    /// Total bytes a contiguous frame of this format occupies
    pub fn image_size(&self) -> usize {
        self.plane_layout()
            .iter()
            .map(|p| p.stride * p.height)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_layout() {
        let fmt = VideoFormat::new(100, 50, PixelFormat::Rgb24);
        let planes = fmt.plane_layout();
        assert_eq!(planes.len(), 1);
        // 100 * 3 = 300, rounded up to 304
        assert_eq!(planes[0].stride, 304);
        assert_eq!(fmt.image_size(), 304 * 50);
    }

    #[test]
    fn test_planar_420_layout() {
        let fmt = VideoFormat::new(64, 48, PixelFormat::Yuv420P);
        let planes = fmt.plane_layout();
        assert_eq!(planes.len(), 3);
        assert_eq!(planes[0].stride, 64);
        assert_eq!(planes[1].stride, 32);
        assert_eq!(planes[1].height, 24);
        assert_eq!(planes[2].offset, 64 * 48 + 32 * 24);
        assert_eq!(fmt.image_size(), 64 * 48 + 2 * 32 * 24);
    }

    #[test]
    fn test_tag_round_trip() {
        for &fmt in PixelFormat::all() {
            assert_eq!(PixelFormat::from_tag(fmt.tag()), Some(fmt));
        }
        assert_eq!(PixelFormat::from_tag(0), None);
        assert_eq!(PixelFormat::from_tag(1000), None);
    }

    #[test]
    fn test_alpha_formats() {
        let with_alpha: Vec<_> = PixelFormat::all()
            .iter()
            .filter(|f| f.has_alpha())
            .collect();
        assert_eq!(with_alpha, vec![&PixelFormat::Rgba32]);
    }
}
