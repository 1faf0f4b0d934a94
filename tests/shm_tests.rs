//! Integration tests for shared-memory segments and pools

use framelink::{FramelinkError, SegmentPool, SharedSegment};

#[test]
fn test_open_write_starts_unreferenced() {
    for size in [1usize, 16, 100, 4096] {
        let seg = SharedSegment::open_write(size).unwrap();
        assert_eq!(seg.refcount(), 0, "size {}", size);
        assert_eq!(seg.size(), size);
        assert!(seg.is_writer());
    }
}

#[test]
fn test_refcount_never_observed_negative_under_discipline() {
    let seg = SharedSegment::open_write(64).unwrap();
    seg.add_ref();
    seg.add_ref();
    seg.unref();
    assert_eq!(seg.refcount(), 1);
    seg.unref();
    assert_eq!(seg.refcount(), 0);
}

#[test]
fn test_cross_mapping_refcount_contention() {
    // Two separate mappings of the same object, hammered from two
    // threads, must agree on the final count.
    let writer = SharedSegment::open_write(64).unwrap();
    let reader = SharedSegment::open_read(writer.owner_pid(), writer.id(), writer.size()).unwrap();

    std::thread::scope(|s| {
        s.spawn(|| {
            for _ in 0..10_000 {
                writer.add_ref();
            }
        });
        s.spawn(|| {
            for _ in 0..10_000 {
                reader.add_ref();
            }
        });
    });
    assert_eq!(writer.refcount(), 20_000);
    assert_eq!(reader.refcount(), 20_000);
}

#[test]
fn test_writer_data_visible_through_reader_mapping() {
    let mut writer = SharedSegment::open_write(128).unwrap();
    writer.data_mut().copy_from_slice(&[0x5A; 128]);

    let reader = SharedSegment::open_read(writer.owner_pid(), writer.id(), writer.size()).unwrap();
    assert_eq!(reader.data(), &[0x5A; 128][..]);
}

#[test]
fn test_pool_write_distinct_then_reuse() {
    let mut pool = SegmentPool::new_writer(256).unwrap();

    let first = pool.get_for_write().unwrap().id();
    let second = pool.get_for_write().unwrap().id();
    assert_ne!(first, second);

    pool.segment(first).unwrap().unref();
    let third = pool.get_for_write().unwrap().id();
    assert_eq!(third, first);
    assert_eq!(pool.segment(first).unwrap().refcount(), 1);
}

#[test]
fn test_pool_read_returns_cached_identity() {
    let mut writer_pool = SegmentPool::new_writer(256).unwrap();
    let id = writer_pool.get_for_write().unwrap().id();

    let mut reader_pool = SegmentPool::new_reader(256, std::process::id()).unwrap();
    let first = reader_pool.get_for_read(id).unwrap() as *const SharedSegment;
    let second = reader_pool.get_for_read(id).unwrap() as *const SharedSegment;
    assert!(std::ptr::eq(first, second));
    assert_eq!(reader_pool.len(), 1);
}

#[test]
fn test_pool_read_attach_failure_is_recoverable() {
    let mut reader_pool = SegmentPool::new_reader(256, std::process::id()).unwrap();
    assert!(matches!(
        reader_pool.get_for_read(0x7FFF_0001),
        Err(FramelinkError::Attach { .. })
    ));

    // The pool keeps working for ids that do exist
    let mut writer_pool = SegmentPool::new_writer(256).unwrap();
    let id = writer_pool.get_for_write().unwrap().id();
    assert!(reader_pool.get_for_read(id).is_ok());
}

#[test]
fn test_pool_drop_unlinks_every_segment() {
    let mut pool = SegmentPool::new_writer(256).unwrap();
    let first = pool.get_for_write().unwrap().id();
    let second = pool.get_for_write().unwrap().id();
    let owner = std::process::id();

    // Both objects are attachable while the pool lives
    assert!(SharedSegment::open_read(owner, first, 256).is_ok());
    assert!(SharedSegment::open_read(owner, second, 256).is_ok());

    // Teardown is unconditional: the second segment still has refcount 1
    drop(pool);
    assert!(SharedSegment::open_read(owner, first, 256).is_err());
    assert!(SharedSegment::open_read(owner, second, 256).is_err());
}

#[test]
fn test_reader_drop_leaves_object_alive() {
    let writer = SharedSegment::open_write(64).unwrap();
    let owner = writer.owner_pid();
    let id = writer.id();

    let reader = SharedSegment::open_read(owner, id, 64).unwrap();
    drop(reader);

    // Only the writer unlinks; the object must still be attachable
    assert!(SharedSegment::open_read(owner, id, 64).is_ok());
    drop(writer);
    assert!(SharedSegment::open_read(owner, id, 64).is_err());
}
