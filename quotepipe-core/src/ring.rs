//! Bounded single-producer/single-consumer ring buffer.
//!
//! A fixed-capacity, power-of-two, lock-free FIFO connecting exactly one producer
//! thread to exactly one consumer thread. Never blocks, never allocates after
//! construction, never panics on a full/empty ring — backpressure is reported to
//! the caller as a plain `bool`/`Option`.
//!
//! `head`/`tail` are each isolated to their own cache line via `CachePadded` so the
//! producer and consumer threads don't ping-pong a shared line under contention.

use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

struct Slots<T, const N: usize> {
    buf: Box<[UnsafeCell<MaybeUninit<T>>]>,
    head: CachePadded<AtomicU64>,
    tail: CachePadded<AtomicU64>,
}

// SAFETY: access to `buf` is only ever performed by the single producer (via
// `Producer::try_push`) or the single consumer (via `Consumer::try_pop`); the two
// never touch the same slot concurrently because `head`/`tail` gate which slots
// are "owned" by which side at any instant.
unsafe impl<T: Send, const N: usize> Sync for Slots<T, N> {}

/// Construct a ring of capacity `N`, returning split producer/consumer handles.
///
/// `N` must be a power of two; this is checked at construction (not at the type
/// level, since const-generic `where` bounds on arbitrary expressions aren't yet
/// stable) and panics otherwise — a capacity mismatch is a programming error, not
/// a runtime condition to recover from.
pub fn ring<T: Send, const N: usize>() -> (Producer<T, N>, Consumer<T, N>) {
    assert!(N > 0 && N.is_power_of_two(), "ring capacity must be a power of two");

    let mut buf = Vec::with_capacity(N);
    for _ in 0..N {
        buf.push(UnsafeCell::new(MaybeUninit::uninit()));
    }

    let slots = Arc::new(Slots {
        buf: buf.into_boxed_slice(),
        head: CachePadded::new(AtomicU64::new(0)),
        tail: CachePadded::new(AtomicU64::new(0)),
    });

    (
        Producer { slots: slots.clone() },
        Consumer { slots },
    )
}

/// Producer half of a [`ring`]. Not `Clone`: only one thread may hold this.
pub struct Producer<T: Send, const N: usize> {
    slots: Arc<Slots<T, N>>,
}

/// Consumer half of a [`ring`]. Not `Clone`: only one thread may hold this.
pub struct Consumer<T: Send, const N: usize> {
    slots: Arc<Slots<T, N>>,
}

// Producer/Consumer are moved into their respective stage threads once and never
// shared afterwards, so Send suffices; they deliberately do not implement Sync.
unsafe impl<T: Send, const N: usize> Send for Producer<T, N> {}
unsafe impl<T: Send, const N: usize> Send for Consumer<T, N> {}

impl<T: Send, const N: usize> Producer<T, N> {
    /// Push `value` onto the ring. Returns `false` (without mutating the ring) if full.
    pub fn try_push(&self, value: T) -> bool {
        let head = self.slots.head.load(Ordering::Relaxed);
        let tail = self.slots.tail.load(Ordering::Acquire);

        if head.wrapping_sub(tail) as usize == N {
            return false;
        }

        let idx = (head as usize) & (N - 1);
        // SAFETY: the consumer cannot read slot `idx` until `head` advances past it
        // (acquire-loaded above as `tail`'s distance), so we have exclusive write
        // access to this slot right now.
        unsafe {
            (*self.slots.buf[idx].get()).write(value);
        }

        self.slots.head.store(head.wrapping_add(1), Ordering::Release);
        true
    }

    /// Approximate current occupancy. Exact for the producer/consumer themselves,
    /// a momentary snapshot for any other observer.
    pub fn size(&self) -> usize {
        size(&self.slots)
    }

    pub fn capacity(&self) -> usize {
        N
    }
}

impl<T: Send, const N: usize> Consumer<T, N> {
    /// Pop the oldest value. Returns `None` (without mutating the ring) if empty.
    pub fn try_pop(&self) -> Option<T> {
        let tail = self.slots.tail.load(Ordering::Relaxed);
        let head = self.slots.head.load(Ordering::Acquire);

        if head == tail {
            return None;
        }

        let idx = (tail as usize) & (N - 1);
        // SAFETY: the producer will not touch slot `idx` again until `tail` (read by
        // it as part of its own full-check) advances past it, which only happens
        // via the release-store below.
        let value = unsafe { (*self.slots.buf[idx].get()).assume_init_read() };

        self.slots.tail.store(tail.wrapping_add(1), Ordering::Release);
        Some(value)
    }

    pub fn size(&self) -> usize {
        size(&self.slots)
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

fn size<T: Send, const N: usize>(slots: &Arc<Slots<T, N>>) -> usize {
    let head = slots.head.load(Ordering::Acquire);
    let tail = slots.tail.load(Ordering::Acquire);
    head.wrapping_sub(tail) as usize
}

impl<T: Send, const N: usize> Drop for Slots<T, N> {
    fn drop(&mut self) {
        // Any values still between tail and head were pushed but never popped;
        // drop them in place so producers storing non-trivial types don't leak.
        let head = *self.head.get_mut();
        let tail = *self.tail.get_mut();
        let mut cursor = tail;
        while cursor != head {
            let idx = (cursor as usize) & (N - 1);
            unsafe {
                (*self.buf[idx].get()).assume_init_drop();
            }
            cursor = cursor.wrapping_add(1);
        }
    }
}
