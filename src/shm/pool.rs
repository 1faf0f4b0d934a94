//! Per-process pool of equally sized shared-memory segments

use log::debug;

use crate::error::{FramelinkError, Result};

use super::segment::SharedSegment;

/// Operating mode of a [`SegmentPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolMode {
    /// Allocates and reuses segments owned by this process
    Writer,
    /// Attaches to segments created by `owner_pid`
    Reader { owner_pid: u32 },
}

/// Per-process collection of [`SharedSegment`]s of one fixed size
///
/// The pool is the sole authority for a segment's OS lifetime: dropping
/// the pool closes every segment it holds, unconditionally and regardless
/// of live reference counts. Callers must guarantee that no frame
/// referencing a pool segment outlives the pool.
#[derive(Debug)]
pub struct SegmentPool {
    mode: PoolMode,
    segment_size: usize,
    segments: Vec<SharedSegment>,
}

impl SegmentPool {
    /// Create a writer-mode pool allocating segments of `segment_size`
    pub fn new_writer(segment_size: usize) -> Result<Self> {
        Self::new(PoolMode::Writer, segment_size)
    }

    /// Create a reader-mode pool attaching to segments of `owner_pid`
    pub fn new_reader(segment_size: usize, owner_pid: u32) -> Result<Self> {
        Self::new(PoolMode::Reader { owner_pid }, segment_size)
    }

    fn new(mode: PoolMode, segment_size: usize) -> Result<Self> {
        if segment_size == 0 {
            return Err(FramelinkError::invalid_parameter(
                "segment_size",
                "segment size must be positive",
            ));
        }
        Ok(Self {
            mode,
            segment_size,
            segments: Vec::new(),
        })
    }

    /// Pool mode
    pub fn mode(&self) -> PoolMode {
        self.mode
    }

    /// Fixed size of every segment in the pool
    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    /// Number of segments currently held
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the pool holds no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Hand out a writable segment with its reference count incremented
    ///
    /// Existing segments are scanned in creation order and the first one
    /// with a zero reference count is reused; otherwise a fresh segment is
    /// created and appended. The returned segment always carries exactly
    /// one new reference taken by this call.
    pub fn get_for_write(&mut self) -> Result<&mut SharedSegment> {
        if self.mode != PoolMode::Writer {
            return Err(FramelinkError::invalid_state(
                "get_for_write on a reader-mode pool",
            ));
        }

        let idx = match self.segments.iter().position(|s| s.refcount() == 0) {
            Some(idx) => idx,
            None => {
                let segment = SharedSegment::open_write(self.segment_size)?;
                debug!(
                    "pool grew to {} segments of {} bytes",
                    self.segments.len() + 1,
                    self.segment_size
                );
                self.segments.push(segment);
                self.segments.len() - 1
            }
        };

        let segment = &mut self.segments[idx];
        segment.add_ref();
        Ok(segment)
    }

    /// Return the segment with `id`, attaching it on first use
    ///
    /// At most one [`SharedSegment`] per distinct id ever exists in a
    /// reader pool; repeated calls with the same id return the cached
    /// mapping. An attach failure (the writer already destroyed the
    /// object) is returned as [`FramelinkError::Attach`] and poisons only
    /// this exchange, not the pool.
    pub fn get_for_read(&mut self, id: u32) -> Result<&SharedSegment> {
        let owner_pid = match self.mode {
            PoolMode::Reader { owner_pid } => owner_pid,
            PoolMode::Writer => {
                return Err(FramelinkError::invalid_state(
                    "get_for_read on a writer-mode pool",
                ))
            }
        };

        if let Some(idx) = self.segments.iter().position(|s| s.id() == id) {
            return Ok(&self.segments[idx]);
        }

        let segment = SharedSegment::open_read(owner_pid, id, self.segment_size)?;
        self.segments.push(segment);
        Ok(self.segments.last().unwrap())
    }

    /// Shared access to a held segment by id
    pub fn segment(&self, id: u32) -> Option<&SharedSegment> {
        self.segments.iter().find(|s| s.id() == id)
    }

    /// Mutable access to a held segment by id
    pub fn segment_mut(&mut self, id: u32) -> Option<&mut SharedSegment> {
        self.segments.iter_mut().find(|s| s.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_segment_size_rejected() {
        assert!(SegmentPool::new_writer(0).is_err());
        assert!(SegmentPool::new_reader(0, 1).is_err());
    }

    #[test]
    fn test_mode_mismatch() {
        let mut writer = SegmentPool::new_writer(64).unwrap();
        assert!(matches!(
            writer.get_for_read(1),
            Err(FramelinkError::InvalidState { .. })
        ));

        let mut reader = SegmentPool::new_reader(64, std::process::id()).unwrap();
        assert!(matches!(
            reader.get_for_write(),
            Err(FramelinkError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_write_segments_distinct_until_unreffed() {
        let mut pool = SegmentPool::new_writer(128).unwrap();
        let first_id = pool.get_for_write().unwrap().id();
        let second_id = pool.get_for_write().unwrap().id();
        assert_ne!(first_id, second_id);
        assert_eq!(pool.len(), 2);

        // Releasing the first segment makes it the first-fit candidate
        pool.segment(first_id).unwrap().unref();
        let reused_id = pool.get_for_write().unwrap().id();
        assert_eq!(reused_id, first_id);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_read_pool_caches_by_id() {
        let mut writer = SegmentPool::new_writer(128).unwrap();
        let id = writer.get_for_write().unwrap().id();

        let mut reader = SegmentPool::new_reader(128, std::process::id()).unwrap();
        let first = reader.get_for_read(id).unwrap() as *const SharedSegment;
        let second = reader.get_for_read(id).unwrap() as *const SharedSegment;
        assert_eq!(first, second);
        assert_eq!(reader.len(), 1);
    }

    #[test]
    fn test_read_attach_failure_is_isolated() {
        let mut reader = SegmentPool::new_reader(128, std::process::id()).unwrap();
        assert!(matches!(
            reader.get_for_read(0xBAD_1D),
            Err(FramelinkError::Attach { .. })
        ));
        assert!(reader.is_empty());
    }
}
