//! Buffer - Unbounded Multi-Producer Accumulator
//!
//! `Buffer<T>` is the shared collection producers append to and the
//! dispatcher empties on every tick. It does one thing: keep items in
//! insertion order until somebody takes all of them at once.
//!
//! # Drain Semantics
//!
//! [`Buffer::drain`] swaps the live `Vec` for a fresh empty one while holding
//! the lock, so a drain is a single indivisible step relative to concurrent
//! [`Buffer::enqueue`] calls. Every item lands in exactly one drained batch:
//!
//! ```text
//! enqueue(a) enqueue(b) │ drain() -> [a, b] │ enqueue(c) │ drain() -> [c]
//! ```
//!
//! The critical section never runs caller code and never performs I/O: an
//! enqueue is a `Vec::push`, a drain is a `mem::take`.
//!
//! # Poisoning
//!
//! Neither critical section can leave the `Vec` half-modified, so a poisoned
//! lock is recovered instead of propagated.

use crate::sync::{Mutex, MutexGuard};
use std::fmt;
use std::sync::PoisonError;

/// Unbounded FIFO buffer with atomic drain-all.
pub struct Buffer<T> {
    items: Mutex<Vec<T>>,
}

impl<T> Buffer<T> {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    /// Appends an item to the tail of the buffer.
    ///
    /// Never blocks beyond the short critical section shared with `drain`.
    pub fn enqueue(&self, item: T) {
        self.lock().push(item);
    }

    /// Takes every buffered item, leaving the buffer empty.
    ///
    /// Items are returned in enqueue order. The result may be empty.
    pub fn drain(&self) -> Vec<T> {
        std::mem::take(&mut *self.lock())
    }

    /// Returns the number of items waiting for the next drain.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing is waiting for the next drain.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for Buffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer").field("len", &self.len()).finish()
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new_buffer_is_empty() {
        let buffer = Buffer::<u32>::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn test_drain_preserves_enqueue_order() {
        let buffer = Buffer::new();
        buffer.enqueue("input1");
        buffer.enqueue("output1");
        buffer.enqueue("input2");

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.drain(), vec!["input1", "output1", "input2"]);
    }

    #[test]
    fn test_drain_resets_buffer() {
        let buffer = Buffer::new();
        for i in 0..5 {
            buffer.enqueue(i);
        }

        assert_eq!(buffer.drain().len(), 5);
        assert!(buffer.is_empty());
        assert!(buffer.drain().is_empty());

        // Items enqueued after a drain go to the next batch only
        buffer.enqueue(42);
        assert_eq!(buffer.drain(), vec![42]);
    }

    #[test]
    fn test_concurrent_producers_with_draining_consumer() {
        const PRODUCERS: u64 = 8;
        const PER_PRODUCER: u64 = 10_000;

        let buffer = Arc::new(Buffer::new());
        let handles: Vec<_> = (0..PRODUCERS)
            .map(|producer_id| {
                let buffer = Arc::clone(&buffer);
                thread::spawn(move || {
                    for seq in 0..PER_PRODUCER {
                        buffer.enqueue((producer_id, seq));
                    }
                })
            })
            .collect();

        let mut drained = Vec::new();
        while handles.iter().any(|h| !h.is_finished()) {
            drained.extend(buffer.drain());
            thread::yield_now();
        }
        for handle in handles {
            handle.join().unwrap();
        }
        drained.extend(buffer.drain());

        assert_eq!(drained.len() as u64, PRODUCERS * PER_PRODUCER);

        // Per-producer FIFO across all drained batches
        for producer_id in 0..PRODUCERS {
            let seqs: Vec<u64> = drained
                .iter()
                .filter(|(p, _)| *p == producer_id)
                .map(|(_, s)| *s)
                .collect();
            assert_eq!(seqs, (0..PER_PRODUCER).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let buffer = Arc::new(Buffer::new());
        buffer.enqueue(1);

        let poisoner = Arc::clone(&buffer);
        let result = thread::spawn(move || {
            let _guard = poisoner.items.lock().unwrap();
            panic!("poison the buffer lock");
        })
        .join();
        assert!(result.is_err());

        buffer.enqueue(2);
        assert_eq!(buffer.drain(), vec![1, 2]);
    }
}
