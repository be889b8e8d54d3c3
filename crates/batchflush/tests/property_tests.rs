//! Property-based tests for the buffer's drain semantics.
//!
//! Whatever the interleaving of enqueues and drains, the drained batches
//! concatenate to exactly the enqueued items, in order.

#![cfg(not(feature = "loom"))]

use batchflush::Buffer;
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone)]
enum Op {
    Enqueue(u32),
    Drain,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<u32>().prop_map(Op::Enqueue),
        1 => Just(Op::Drain),
    ]
}

proptest! {
    /// Sequential interleavings: no loss, no duplication, FIFO across batches
    #[test]
    fn prop_drains_concatenate_to_enqueued(ops in prop::collection::vec(op_strategy(), 0..200)) {
        let buffer = Buffer::new();
        let mut enqueued = Vec::new();
        let mut drained = Vec::new();

        for op in ops {
            match op {
                Op::Enqueue(v) => {
                    buffer.enqueue(v);
                    enqueued.push(v);
                }
                Op::Drain => {
                    let batch = buffer.drain();
                    prop_assert!(buffer.is_empty());
                    drained.extend(batch);
                }
            }
            prop_assert_eq!(buffer.len(), enqueued.len() - drained.len());
        }
        drained.extend(buffer.drain());

        prop_assert_eq!(drained, enqueued);
    }

    /// An empty drain is harmless at any point
    #[test]
    fn prop_repeated_drain_after_drain_is_empty(items in prop::collection::vec(any::<u8>(), 0..50)) {
        let buffer = Buffer::new();
        for item in &items {
            buffer.enqueue(*item);
        }

        prop_assert_eq!(buffer.drain(), items);
        prop_assert!(buffer.drain().is_empty());
        prop_assert!(buffer.drain().is_empty());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Concurrent producers against a draining consumer
    #[test]
    fn prop_concurrent_enqueue_and_drain(
        producers in 1usize..6,
        per_producer in 1u32..500,
    ) {
        let buffer = Arc::new(Buffer::new());
        let handles: Vec<_> = (0..producers)
            .map(|producer_id| {
                let buffer = Arc::clone(&buffer);
                thread::spawn(move || {
                    for seq in 0..per_producer {
                        buffer.enqueue((producer_id, seq));
                    }
                })
            })
            .collect();

        let mut batches = Vec::new();
        while handles.iter().any(|h| !h.is_finished()) {
            batches.push(buffer.drain());
        }
        for handle in handles {
            handle.join().unwrap();
        }
        batches.push(buffer.drain());

        let all: Vec<(usize, u32)> = batches.into_iter().flatten().collect();
        prop_assert_eq!(all.len(), producers * per_producer as usize);

        for producer_id in 0..producers {
            let seqs: Vec<u32> = all
                .iter()
                .filter(|(p, _)| *p == producer_id)
                .map(|(_, s)| *s)
                .collect();
            prop_assert_eq!(seqs, (0..per_producer).collect::<Vec<_>>());
        }
    }
}
