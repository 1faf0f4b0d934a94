//! Xiph-style lacing of multi-segment header blobs
//!
//! Wire layout: one byte holding `segment_count - 1`, then a base-255
//! length prefix for each segment except the last (a run of `0xFF` bytes
//! each contributing 255, closed by a byte below 255), then all payloads
//! concatenated. The last segment's length is whatever remains, and must
//! be strictly positive.

use crate::error::{FramelinkError, Result};

/// Maximum number of segments one laced buffer can hold
pub const MAX_SEGMENTS: usize = 256;

/// Split a laced buffer into borrowed per-segment views
///
/// Declared lengths are validated cumulatively against the buffer; any
/// violation returns a [`FramelinkError::Format`] with no partial output.
pub fn decode(buffer: &[u8]) -> Result<Vec<&[u8]>> {
    if buffer.is_empty() {
        return Err(FramelinkError::format("empty lacing buffer"));
    }
    let num_segments = buffer[0] as usize + 1;
    let mut pos = 1usize;

    let mut lengths = Vec::with_capacity(num_segments - 1);
    for _ in 0..num_segments - 1 {
        let mut len = 0usize;
        loop {
            let byte = *buffer
                .get(pos)
                .ok_or_else(|| FramelinkError::format("length prefix overruns buffer"))?;
            pos += 1;
            len += byte as usize;
            if byte < 255 {
                break;
            }
        }
        lengths.push(len);
    }

    let mut segments = Vec::with_capacity(num_segments);
    for &len in &lengths {
        let end = pos
            .checked_add(len)
            .filter(|&end| end <= buffer.len())
            .ok_or_else(|| FramelinkError::format("segment overruns buffer"))?;
        segments.push(&buffer[pos..end]);
        pos = end;
    }

    if pos >= buffer.len() {
        return Err(FramelinkError::format("final segment is empty"));
    }
    segments.push(&buffer[pos..]);
    Ok(segments)
}

/// Pack `segments` into one laced buffer
///
/// Round-trip guarantee: `decode(&encode(segments)?)` reproduces
/// `segments` byte-for-byte for any non-empty sequence whose last element
/// is non-empty.
pub fn encode(segments: &[&[u8]]) -> Result<Vec<u8>> {
    if segments.is_empty() {
        return Err(FramelinkError::invalid_parameter(
            "segments",
            "at least one segment required",
        ));
    }
    if segments.len() > MAX_SEGMENTS {
        return Err(FramelinkError::invalid_parameter(
            "segments",
            format!("at most {} segments per laced buffer", MAX_SEGMENTS),
        ));
    }
    let last = segments[segments.len() - 1];
    if last.is_empty() {
        return Err(FramelinkError::format("final segment must be non-empty"));
    }

    let mut total = 1;
    for segment in &segments[..segments.len() - 1] {
        total += segment.len() / 255 + 1;
        total += segment.len();
    }
    total += last.len();

    let mut out = Vec::with_capacity(total);
    out.push((segments.len() - 1) as u8);
    for segment in &segments[..segments.len() - 1] {
        let mut len = segment.len();
        while len >= 255 {
            out.push(255);
            len -= 255;
        }
        out.push(len as u8);
    }
    for segment in segments {
        out.extend_from_slice(segment);
    }
    Ok(out)
}

/// Append one more segment to an already laced buffer
///
/// An empty `existing` buffer starts a new single-segment lace.
pub fn append(existing: &[u8], segment: &[u8]) -> Result<Vec<u8>> {
    if existing.is_empty() {
        return encode(&[segment]);
    }
    let mut segments = decode(existing)?;
    segments.push(segment);
    encode(&segments)
}

/// Borrowed view of the segment at `index`
pub fn extract(buffer: &[u8], index: usize) -> Result<&[u8]> {
    let segments = decode(buffer)?;
    segments.get(index).copied().ok_or_else(|| {
        FramelinkError::invalid_parameter(
            "index",
            format!("laced buffer has {} segments", segments.len()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_segment() {
        let laced = encode(&[b"hello"]).unwrap();
        assert_eq!(laced[0], 0);
        let segments = decode(&laced).unwrap();
        assert_eq!(segments, vec![b"hello".as_slice()]);
    }

    #[test]
    fn test_boundary_lengths() {
        // 255 encodes as [255, 0]; 254 as [254]; 256 as [255, 1]
        for len in [254usize, 255, 256, 510] {
            let seg = vec![0xAB; len];
            let laced = encode(&[&seg, b"tail"]).unwrap();
            let segments = decode(&laced).unwrap();
            assert_eq!(segments.len(), 2);
            assert_eq!(segments[0], seg.as_slice());
            assert_eq!(segments[1], b"tail");
        }
    }

    #[test]
    fn test_zero_length_non_final_segment() {
        let laced = encode(&[b"", b"x"]).unwrap();
        let segments = decode(&laced).unwrap();
        assert_eq!(segments[0], b"");
        assert_eq!(segments[1], b"x");
    }

    #[test]
    fn test_empty_final_segment_rejected() {
        assert!(encode(&[b"a", b""]).is_err());

        // Hand-built buffer whose remainder after the prefix is empty
        let bad = [1u8, 1, b'a'];
        assert!(matches!(
            decode(&bad),
            Err(FramelinkError::Format { .. })
        ));
    }

    #[test]
    fn test_declared_length_overrun_rejected() {
        // Claims a 200-byte first segment but only 3 payload bytes follow
        let bad = [1u8, 200, b'a', b'b', b'c'];
        assert!(matches!(
            decode(&bad),
            Err(FramelinkError::Format { .. })
        ));
    }

    #[test]
    fn test_length_prefix_overrun_rejected() {
        // The 0xFF run itself walks off the end
        let bad = [1u8, 255, 255];
        assert!(matches!(
            decode(&bad),
            Err(FramelinkError::Format { .. })
        ));
    }

    #[test]
    fn test_append_grows_lace() {
        let laced = append(&[], b"first").unwrap();
        let laced = append(&laced, b"second").unwrap();
        let laced = append(&laced, b"third").unwrap();
        let segments = decode(&laced).unwrap();
        assert_eq!(
            segments,
            vec![b"first".as_slice(), b"second".as_slice(), b"third".as_slice()]
        );
    }

    #[test]
    fn test_extract() {
        let laced = encode(&[b"a", b"bb", b"ccc"]).unwrap();
        assert_eq!(extract(&laced, 0).unwrap(), b"a");
        assert_eq!(extract(&laced, 2).unwrap(), b"ccc");
        assert!(extract(&laced, 3).is_err());
    }
}
