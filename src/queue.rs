use alloc::boxed::Box;
use core::{
    fmt,
    mem::MaybeUninit,
    sync::atomic::Ordering,
};

use crossbeam_utils::{Backoff, CachePadded};

use crate::error::Full;
use crate::loom_exports::{
    cell::UnsafeCell,
    sync::atomic::AtomicUsize,
};
use crate::trace::{debug, trace};

/// One cell of the ring.
///
/// `sequence` alone decides who may touch `value`:
/// - `sequence == pos`: writable by the producer holding write cursor `pos`.
/// - `sequence == pos + 1`: readable by the consumer holding read cursor `pos`.
///
/// A consumer re-arms the cell for the next lap by storing `pos + capacity`.
struct Slot<T> {
    sequence: AtomicUsize,
    value: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Slot<T> {
    fn new(sequence: usize) -> Self {
        Self {
            sequence: AtomicUsize::new(sequence),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }
}

struct Ring<T> {
    slots: Box<[Slot<T>]>,
    mask: usize,
}

impl<T> Ring<T> {
    #[inline(always)]
    fn slot(&self, pos: usize) -> &Slot<T> {
        &self.slots[pos & self.mask]
    }

    #[inline(always)]
    fn capacity(&self) -> usize {
        self.mask + 1
    }
}

/// A fixed-capacity, lock-free, multi-producer multi-consumer FIFO queue.
///
/// Producers and consumers race for cells with a single compare-and-swap on their own
/// cursor. No operation blocks, takes a lock, or allocates; a full or empty ring is reported
/// to the caller instead of waited out.
///
/// The slot array and each cursor sit on their own cache line, so producer traffic on the
/// write cursor does not invalidate the line consumers spin on and vice versa.
pub struct Queue<T> {
    ring: CachePadded<Ring<T>>,
    write: CachePadded<AtomicUsize>,
    read: CachePadded<AtomicUsize>,
}

impl<T> Queue<T> {
    /// Create a queue holding at most `capacity` values.
    ///
    /// # Panics
    ///
    /// If `capacity` is less than 2 or not a power of two.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "capacity must be at least 2");
        assert!(capacity.is_power_of_two(), "capacity must be a power of two");

        let slots = (0..capacity)
            .map(Slot::new)
            .collect::<Box<[_]>>();

        debug!(capacity, "ring queue created");

        Self {
            ring: CachePadded::new(Ring {
                slots,
                mask: capacity - 1,
            }),
            write: CachePadded::new(AtomicUsize::new(0)),
            read: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// Maximum number of values the queue holds at once.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Append `value`, or hand it back inside [`Full`] if every cell is occupied.
    pub fn try_push(&self, value: T) -> Result<(), Full<T>> {
        let mut pos = self.write.load(Ordering::Relaxed);
        let backoff = Backoff::new();

        let slot = loop {
            let slot = self.ring.slot(pos);
            // Pairs with the Release store of the consumer that freed this cell, so its read
            // of the previous value happens before we overwrite it.
            let sequence = slot.sequence.load(Ordering::Acquire);
            let lag = sequence.wrapping_sub(pos) as isize;

            if lag == 0 {
                match self.write.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => break slot,
                    Err(current) => {
                        pos = current;
                        backoff.spin();
                    }
                }
            } else if lag < 0 {
                // The cell still holds the value written one lap ago.
                trace!(pos, "ring full");
                return Err(Full(value));
            } else {
                // Another producer already claimed `pos`.
                pos = self.write.load(Ordering::Relaxed);
            }

            #[cfg(loom)]
            loom::hint::spin_loop();
        };

        // SAFETY: winning the CAS on `pos` gives this thread the only access to the cell until
        // the sequence store below, and the cell is vacant (its last value was moved out).
        slot.value.with_mut(|value_ptr| unsafe {
            (*value_ptr).write(value);
        });
        slot.sequence.store(pos.wrapping_add(1), Ordering::Release);

        Ok(())
    }

    /// Remove the oldest value, or return `None` if there is nothing to take.
    pub fn try_pop(&self) -> Option<T> {
        let mut pos = self.read.load(Ordering::Relaxed);
        let backoff = Backoff::new();

        let slot = loop {
            let slot = self.ring.slot(pos);
            // Pairs with the producer's Release store of `pos + 1`, making its write of the
            // value visible here.
            let sequence = slot.sequence.load(Ordering::Acquire);
            let lag = sequence.wrapping_sub(pos.wrapping_add(1)) as isize;

            if lag == 0 {
                match self.read.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => break slot,
                    Err(current) => {
                        pos = current;
                        backoff.spin();
                    }
                }
            } else if lag < 0 {
                // Nothing has been published at `pos` yet.
                trace!(pos, "ring empty");
                return None;
            } else {
                // Another consumer already claimed `pos`.
                pos = self.read.load(Ordering::Relaxed);
            }

            #[cfg(loom)]
            loom::hint::spin_loop();
        };

        // SAFETY: winning the CAS on `pos` gives this thread the only access to the cell, and
        // the Acquire load above observed the producer's publication of an initialized value.
        let value = slot.value.with_mut(|value_ptr| unsafe {
            (*value_ptr).assume_init_read()
        });
        slot.sequence.store(pos.wrapping_add(self.ring.capacity()), Ordering::Release);

        Some(value)
    }

    /// Append `value`; `false` if the ring is full, in which case `value` is dropped.
    ///
    /// Use [`try_push`](Self::try_push) to get the value back instead.
    #[inline]
    pub fn enqueue(&self, value: T) -> bool {
        self.try_push(value).is_ok()
    }

    /// Move the oldest value into `out`; `false` if the ring is empty, in which case `out` is
    /// left as it was.
    #[inline]
    pub fn dequeue(&self, out: &mut T) -> bool {
        match self.try_pop() {
            Some(value) => {
                *out = value;
                true
            }
            None => false,
        }
    }
}

impl<T> Drop for Queue<T> {
    fn drop(&mut self) {
        // `&mut self` means every claimed cell has also been published or released, so the
        // live values are exactly those between the two cursors.
        let write = self.write.load(Ordering::Relaxed);
        let mut pos = self.read.load(Ordering::Relaxed);

        while pos != write {
            self.ring.slot(pos).value.with_mut(|value_ptr| unsafe {
                (*value_ptr).assume_init_drop();
            });
            pos = pos.wrapping_add(1);
        }
    }
}

impl<T> fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("capacity", &self.capacity())
            .field("write", &self.write.load(Ordering::Relaxed))
            .field("read", &self.read.load(Ordering::Relaxed))
            .finish()
    }
}

unsafe impl<T: Send> Send for Queue<T> { }
unsafe impl<T: Send> Sync for Queue<T> { }
