//! Integration tests for the lacing codec

use framelink::compression::lacing;
use framelink::FramelinkError;

/// Length grid from the boundary cases of the base-255 prefix encoding
const LENGTHS: &[usize] = &[0, 254, 255, 256, 510];

fn buf(len: usize, fill: u8) -> Vec<u8> {
    vec![fill; len]
}

#[test]
fn test_round_trip_all_position_combinations() {
    // Three segments over the full length grid; zero length only allowed
    // in non-final positions, the final segment must be non-empty.
    for &l0 in LENGTHS {
        for &l1 in LENGTHS {
            for &l2 in LENGTHS {
                if l2 == 0 {
                    continue;
                }
                let b0 = buf(l0, 0x11);
                let b1 = buf(l1, 0x22);
                let b2 = buf(l2, 0x33);
                let laced = lacing::encode(&[&b0, &b1, &b2]).unwrap();
                let segments = lacing::decode(&laced).unwrap();
                assert_eq!(segments.len(), 3, "lengths {} {} {}", l0, l1, l2);
                assert_eq!(segments[0], b0.as_slice());
                assert_eq!(segments[1], b1.as_slice());
                assert_eq!(segments[2], b2.as_slice());
            }
        }
    }
}

#[test]
fn test_round_trip_two_segments() {
    for &l0 in LENGTHS {
        for &l1 in LENGTHS {
            if l1 == 0 {
                continue;
            }
            let b0 = buf(l0, 0xAA);
            let b1 = buf(l1, 0xBB);
            let laced = lacing::encode(&[&b0, &b1]).unwrap();
            let segments = lacing::decode(&laced).unwrap();
            assert_eq!(segments, vec![b0.as_slice(), b1.as_slice()]);
        }
    }
}

#[test]
fn test_declared_overrun_is_format_error_not_panic() {
    // First declared length pushes the cumulative offset past the end
    let bad = [2u8, 250, 10, 1, 2, 3];
    assert!(matches!(
        lacing::decode(&bad),
        Err(FramelinkError::Format { .. })
    ));
}

#[test]
fn test_truncated_prefix_run() {
    let bad = [3u8, 255, 255, 255];
    assert!(matches!(
        lacing::decode(&bad),
        Err(FramelinkError::Format { .. })
    ));
}

#[test]
fn test_final_segment_must_have_positive_length() {
    // One 2-byte segment declared, payload exactly 2 bytes: remainder 0
    let bad = [1u8, 2, 0xCA, 0xFE];
    assert!(matches!(
        lacing::decode(&bad),
        Err(FramelinkError::Format { .. })
    ));
}

#[test]
fn test_empty_input() {
    assert!(lacing::decode(&[]).is_err());
    assert!(lacing::encode(&[]).is_err());
}

#[test]
fn test_incremental_append_equals_bulk_encode() {
    let parts: [&[u8]; 3] = [b"one", b"twotwo", b"threethree"];
    let bulk = lacing::encode(&parts).unwrap();

    let mut grown = Vec::new();
    for part in parts {
        grown = lacing::append(&grown, part).unwrap();
    }
    assert_eq!(grown, bulk);
}

#[test]
fn test_decode_views_borrow_from_input() {
    let laced = lacing::encode(&[b"abc", b"defg"]).unwrap();
    let segments = lacing::decode(&laced).unwrap();
    let base = laced.as_ptr() as usize;
    for segment in segments {
        let addr = segment.as_ptr() as usize;
        assert!(addr >= base && addr < base + laced.len());
    }
}

#[test]
fn test_laced_blob_survives_disk_round_trip() {
    use std::io::{Read, Write};

    let parts: [&[u8]; 3] = [b"ident", b"comment", b"setup-table"];
    let laced = lacing::encode(&parts).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("header.bin");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(&laced)
        .unwrap();

    let mut raw = Vec::new();
    std::fs::File::open(&path)
        .unwrap()
        .read_to_end(&mut raw)
        .unwrap();
    let segments = lacing::decode(&raw).unwrap();
    assert_eq!(segments, parts);
}
