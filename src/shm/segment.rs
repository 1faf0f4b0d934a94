//! Shared-memory segment with embedded cross-process reference counter
//!
//! Each segment is one named POSIX shared-memory object, mapped
//! read-write-shared. The requested data region is rounded up to 16 bytes
//! and a small refcounter record lives immediately after it, inside the
//! mapping, so every process attaching the same object contends on the
//! same counter.

use std::os::fd::OwnedFd;
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};

use log::{debug, error};
use memmap2::{MmapMut, MmapOptions};
use nix::fcntl::OFlag;
use nix::sys::mman::{shm_open, shm_unlink};
use nix::sys::stat::Mode;
use nix::unistd::ftruncate;

use crate::error::{FramelinkError, Result};

/// Alignment of the data region inside a segment
pub const ALIGN_BYTES: usize = 16;

/// Monotonic per-process segment id source. Ids restart at 1 for every
/// process; global uniqueness of segment names relies on the pid half of
/// the name, so names do not survive pid reuse across restarts.
static NEXT_SEGMENT_ID: AtomicU32 = AtomicU32::new(0);

/// Cross-process refcounter record embedded at the end of every mapping
///
/// The lock word is a spin lock driven by compare-and-swap, usable from
/// unrelated processes mapping the same object. All access to `count`
/// happens with the lock held.
#[repr(C)]
struct RefCounter {
    lock: AtomicU32,
    count: AtomicI32,
}

impl RefCounter {
    fn init(&self) {
        self.count.store(0, Ordering::Relaxed);
        self.lock.store(0, Ordering::Release);
    }

    fn acquire(&self) {
        while self
            .lock
            .compare_exchange_weak(0, 1, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            std::hint::spin_loop();
        }
    }

    fn release(&self) {
        self.lock.store(0, Ordering::Release);
    }

    fn add(&self, delta: i32) -> i32 {
        self.acquire();
        let new = self.count.load(Ordering::Relaxed) + delta;
        self.count.store(new, Ordering::Relaxed);
        self.release();
        new
    }

    fn get(&self) -> i32 {
        self.acquire();
        let val = self.count.load(Ordering::Relaxed);
        self.release();
        val
    }
}

fn align_size(size: usize) -> usize {
    (size + ALIGN_BYTES - 1) / ALIGN_BYTES * ALIGN_BYTES
}

fn real_size(size: usize) -> usize {
    align_size(size) + std::mem::size_of::<RefCounter>()
}

fn segment_name(pid: u32, id: u32) -> String {
    format!("/gavl-{:08x}-{:08x}", pid, id)
}

/// One named shared-memory mapping plus its embedded refcounter
#[derive(Debug)]
pub struct SharedSegment {
    mmap: MmapMut,
    name: String,
    size: usize,
    id: u32,
    owner_pid: u32,
    writer: bool,
}

impl SharedSegment {
    /// Create a new segment of `size` data bytes and map it
    ///
    /// A globally unique name is derived from the calling pid and a
    /// monotonically increasing id; benign name collisions with other
    /// writers are retried with a fresh id. Any failure after the name has
    /// been claimed unlinks the object before returning, so no OS object
    /// leaks.
    pub fn open_write(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(FramelinkError::invalid_parameter(
                "size",
                "segment size must be positive",
            ));
        }

        let pid = std::process::id();
        let total = real_size(size);
        let mode = Mode::S_IRUSR | Mode::S_IWUSR | Mode::S_IRGRP | Mode::S_IROTH;

        let (fd, id, name) = loop {
            let id = NEXT_SEGMENT_ID.fetch_add(1, Ordering::Relaxed) + 1;
            let name = segment_name(pid, id);
            match shm_open(
                name.as_str(),
                OFlag::O_RDWR | OFlag::O_CREAT | OFlag::O_EXCL,
                mode,
            ) {
                Ok(fd) => break (fd, id, name),
                Err(nix::errno::Errno::EEXIST) => continue,
                Err(e) => {
                    error!("shm_open of {} failed: {}", name, e.desc());
                    return Err(FramelinkError::resource_os("shm_open failed", e));
                }
            }
        };

        let mmap = match Self::size_and_map(&fd, total) {
            Ok(mmap) => mmap,
            Err(e) => {
                // The name is claimed; roll back before surfacing the error
                let _ = shm_unlink(name.as_str());
                return Err(e);
            }
        };
        drop(fd);

        let segment = Self {
            mmap,
            name,
            size,
            id,
            owner_pid: pid,
            writer: true,
        };
        segment.refcounter().init();

        debug!("created shm segment (write) {}", segment.name);
        Ok(segment)
    }

    /// Attach to an existing segment created by `owner_pid` with `id`
    ///
    /// The refcounter inside the mapping is already initialized by the
    /// writer and is left untouched.
    pub fn open_read(owner_pid: u32, id: u32, size: usize) -> Result<Self> {
        let name = segment_name(owner_pid, id);
        let total = real_size(size);

        let fd = shm_open(name.as_str(), OFlag::O_RDWR, Mode::empty()).map_err(|e| {
            FramelinkError::attach(format!("shm_open of {} failed: {}", name, e.desc()))
        })?;

        let mmap = unsafe { MmapOptions::new().len(total).map_mut(&fd) }
            .map_err(|e| FramelinkError::attach(format!("mmap of {} failed: {}", name, e)))?;
        drop(fd);

        debug!("attached shm segment (read) {}", name);
        Ok(Self {
            mmap,
            name,
            size,
            id,
            owner_pid,
            writer: false,
        })
    }

    fn size_and_map(fd: &OwnedFd, total: usize) -> Result<MmapMut> {
        ftruncate(fd, total as i64).map_err(|e| {
            error!("ftruncate failed: {}", e.desc());
            FramelinkError::resource_os("ftruncate failed", e)
        })?;

        unsafe { MmapOptions::new().len(total).map_mut(fd) }.map_err(|e| {
            error!("mmap failed: {}", e);
            FramelinkError::from_io(e, "mmap failed")
        })
    }

    fn refcounter(&self) -> &RefCounter {
        // The record lives past the aligned data region; the mapping was
        // sized to include it and page alignment satisfies the atomics.
        unsafe { &*(self.mmap.as_ptr().add(align_size(self.size)) as *const RefCounter) }
    }

    /// Requested data size in bytes (pre-alignment)
    pub fn size(&self) -> usize {
        self.size
    }

    /// Per-owner-process segment id
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Pid of the process that created the segment
    pub fn owner_pid(&self) -> u32 {
        self.owner_pid
    }

    /// Whether this handle created the segment (and will unlink it)
    pub fn is_writer(&self) -> bool {
        self.writer
    }

    /// Data region of the segment
    pub fn data(&self) -> &[u8] {
        &self.mmap[..self.size]
    }

    /// Mutable data region of the segment
    pub fn data_mut(&mut self) -> &mut [u8] {
        let size = self.size;
        &mut self.mmap[..size]
    }

    /// Increment the cross-process reference count
    pub fn add_ref(&self) {
        self.refcounter().add(1);
    }

    /// Decrement the cross-process reference count
    pub fn unref(&self) {
        self.refcounter().add(-1);
    }

    /// Snapshot of the cross-process reference count
    pub fn refcount(&self) -> i32 {
        self.refcounter().get()
    }
}

impl Drop for SharedSegment {
    fn drop(&mut self) {
        // Unmapping happens when the MmapMut drops; only the writer
        // removes the object from the OS namespace.
        if self.writer {
            if let Err(e) = shm_unlink(self.name.as_str()) {
                error!("shm_unlink of {} failed: {}", self.name, e.desc());
            } else {
                debug!("destroyed shm segment {}", self.name);
            }
        }
    }
}
