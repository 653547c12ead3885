//! Host/device mapped memory.
//!
//! A [`MappedBuffer`] is one allocation of `f32` values with two views: a host
//! slice the CPU writes through, and a [`DevicePtr`] handed to the accelerator.
//! Both refer to the same storage, so no copy happens between them.
//!
//! Allocation sits behind the [`MappedAllocator`] trait. [`HostAllocator`] is
//! the zero-copy implementation for unified-memory systems (integrated GPUs,
//! CPU inference), where the device address of a buffer is its host address.
//!
//! Ownership of a buffer moves to whoever receives it. Hand it back through
//! [`MappedAllocator::release`] when done, or just drop it: a buffer carries the
//! ledger of the allocator that made it and settles that ledger on drop, so
//! accounting stays right even for buffers released to the wrong allocator.

use std::fmt;
use std::mem::size_of;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AllocError {
    #[error("zero-sized allocation requested")]
    ZeroSized,
    #[error("{requested} bytes requested but only {available} bytes left in budget")]
    OverBudget { requested: usize, available: usize },
    #[error("out of memory allocating {requested} bytes")]
    OutOfMemory { requested: usize },
}

/// Device-side address of a mapped buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DevicePtr(u64);

impl DevicePtr {
    pub fn new(addr: u64) -> Self {
        Self(addr)
    }

    pub fn addr(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DevicePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// One allocation visible from host and device.
pub struct MappedBuffer {
    host: Box<[f32]>,
    device: DevicePtr,
    ledger: Option<Arc<AtomicUsize>>,
}

impl MappedBuffer {
    /// Assemble a buffer from host storage and the device address of that same
    /// storage. Allocator implementations are responsible for the pairing.
    pub fn from_parts(host: Box<[f32]>, device: DevicePtr) -> Self {
        Self {
            host,
            device,
            ledger: None,
        }
    }

    /// Like [`from_parts`](Self::from_parts), but the buffer subtracts its byte
    /// length from `ledger` when dropped.
    pub fn with_ledger(host: Box<[f32]>, device: DevicePtr, ledger: Arc<AtomicUsize>) -> Self {
        Self {
            host,
            device,
            ledger: Some(ledger),
        }
    }

    pub fn host(&self) -> &[f32] {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut [f32] {
        &mut self.host
    }

    pub fn device_ptr(&self) -> DevicePtr {
        self.device
    }

    /// Number of `f32` values.
    pub fn len(&self) -> usize {
        self.host.len()
    }

    pub fn is_empty(&self) -> bool {
        self.host.is_empty()
    }

    pub fn byte_len(&self) -> usize {
        self.host.len() * size_of::<f32>()
    }
}

impl Drop for MappedBuffer {
    fn drop(&mut self) {
        if let Some(ledger) = &self.ledger {
            ledger.fetch_sub(self.byte_len(), Ordering::AcqRel);
        }
    }
}

impl fmt::Debug for MappedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedBuffer")
            .field("len", &self.len())
            .field("device", &self.device)
            .finish()
    }
}

/// Source of host/device mapped buffers.
///
/// Implementations must be safe to share across threads; the loader itself
/// never calls an allocator concurrently.
pub trait MappedAllocator: Sync {
    /// Allocate `len` zeroed `f32` values.
    fn allocate(&self, len: usize) -> Result<MappedBuffer, AllocError>;

    /// Return a buffer to the allocator.
    fn release(&self, buffer: MappedBuffer);
}

impl<A: MappedAllocator + ?Sized> MappedAllocator for &A {
    fn allocate(&self, len: usize) -> Result<MappedBuffer, AllocError> {
        (**self).allocate(len)
    }

    fn release(&self, buffer: MappedBuffer) {
        (**self).release(buffer)
    }
}

/// Unified-memory allocator: host and device share one address space.
#[derive(Debug, Default)]
pub struct HostAllocator {
    max_bytes: Option<usize>,
    live_bytes: Arc<AtomicUsize>,
    allocations: AtomicUsize,
}

impl HostAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the bytes held by buffers that have not been released.
    pub fn with_budget(max_bytes: usize) -> Self {
        Self {
            max_bytes: Some(max_bytes),
            ..Self::default()
        }
    }

    pub fn max_bytes(&self) -> Option<usize> {
        self.max_bytes
    }

    /// Bytes held by buffers handed out and not yet released or dropped.
    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::Acquire)
    }

    /// Successful allocations over the allocator's lifetime.
    pub fn allocation_count(&self) -> usize {
        self.allocations.load(Ordering::Acquire)
    }

    fn reserve(&self, bytes: usize) -> Result<(), AllocError> {
        let Some(max) = self.max_bytes else {
            self.live_bytes.fetch_add(bytes, Ordering::AcqRel);
            return Ok(());
        };
        self.live_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                live.checked_add(bytes).filter(|&total| total <= max)
            })
            .map(|_| ())
            .map_err(|live| AllocError::OverBudget {
                requested: bytes,
                available: max.saturating_sub(live),
            })
    }
}

impl MappedAllocator for HostAllocator {
    fn allocate(&self, len: usize) -> Result<MappedBuffer, AllocError> {
        if len == 0 {
            return Err(AllocError::ZeroSized);
        }
        let bytes = len
            .checked_mul(size_of::<f32>())
            .ok_or(AllocError::OutOfMemory { requested: usize::MAX })?;
        self.reserve(bytes)?;

        let mut storage: Vec<f32> = Vec::new();
        if storage.try_reserve_exact(len).is_err() {
            self.live_bytes.fetch_sub(bytes, Ordering::AcqRel);
            return Err(AllocError::OutOfMemory { requested: bytes });
        }
        storage.resize(len, 0.0);
        let host = storage.into_boxed_slice();
        let device = DevicePtr::new(host.as_ptr() as u64);

        self.allocations.fetch_add(1, Ordering::AcqRel);
        log::debug!("mapped {bytes} bytes at {device}");
        Ok(MappedBuffer::with_ledger(
            host,
            device,
            Arc::clone(&self.live_bytes),
        ))
    }

    /// Drops the buffer; its ledger credits whichever allocator made it.
    fn release(&self, buffer: MappedBuffer) {
        log::debug!(
            "released {} bytes at {}",
            buffer.byte_len(),
            buffer.device_ptr()
        );
        drop(buffer);
    }
}
