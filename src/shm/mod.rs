//! Shared-memory segments and segment pools
//!
//! A [`SharedSegment`] is one named POSIX shared-memory object with a
//! cross-process reference counter embedded in the mapping itself. A
//! [`SegmentPool`] manages a set of equally sized segments per process,
//! either allocating them (writer mode) or attaching to another process's
//! segments by id (reader mode).

pub mod pool;
pub mod segment;

pub use pool::{PoolMode, SegmentPool};
pub use segment::{SharedSegment, ALIGN_BYTES};
