use batchflush::{Buffer, CancellationToken, NullHandler, PeriodicDispatcher};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const ITEMS_PER_PRODUCER: u64 = 100_000;

fn bench_enqueue(c: &mut Criterion) {
    let mut group = c.benchmark_group("enqueue");

    for num_producers in [1usize, 2, 4, 8] {
        group.throughput(Throughput::Elements(ITEMS_PER_PRODUCER * num_producers as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}P", num_producers)),
            &num_producers,
            |b, &num_producers| {
                b.iter(|| {
                    let buffer = Arc::new(Buffer::new());
                    let handles: Vec<_> = (0..num_producers)
                        .map(|_| {
                            let buffer = Arc::clone(&buffer);
                            thread::spawn(move || {
                                for i in 0..ITEMS_PER_PRODUCER {
                                    buffer.enqueue(black_box(i));
                                }
                            })
                        })
                        .collect();
                    for handle in handles {
                        handle.join().unwrap();
                    }
                    black_box(buffer.drain().len())
                });
            },
        );
    }

    group.finish();
}

fn bench_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("drain");

    for size in [1_000usize, 100_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let buffer = Buffer::new();
            b.iter(|| {
                for i in 0..size {
                    buffer.enqueue(i);
                }
                black_box(buffer.drain())
            });
        });
    }

    group.finish();
}

fn bench_dispatch_cycle(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(ITEMS_PER_PRODUCER));

    group.bench_function("enqueue_under_live_dispatcher", |b| {
        b.to_async(&runtime).iter(|| async {
            let buffer = Arc::new(Buffer::<u64>::new());
            let dispatcher = PeriodicDispatcher::new(Arc::clone(&buffer), Arc::new(NullHandler::new()));
            let shutdown = CancellationToken::new();
            let task = dispatcher
                .start(shutdown.clone(), Duration::from_micros(200))
                .unwrap();

            for i in 0..ITEMS_PER_PRODUCER {
                buffer.enqueue(i);
            }

            shutdown.cancel();
            task.await.unwrap();
            black_box(dispatcher.metrics().items_dispatched())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_enqueue, bench_drain, bench_dispatch_cycle);
criterion_main!(benches);
