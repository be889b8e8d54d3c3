//! # Periodic Batch Flush Demo
//!
//! Concurrent producers enqueue synthetic telemetry events into a shared
//! buffer while a `PeriodicDispatcher` flushes them to a simulated backend
//! that fails some of its batches. At the end the dispatch metrics are
//! printed, including the items lost to failures and to shutdown.
//!
//! ## Running
//!
//! ```bash
//! cargo run -p batchflush --features demo --bin demo --release
//!
//! # Unreliable backend, faster ticks
//! cargo run -p batchflush --features demo --bin demo -- --failure-rate 0.3 --period-ms 50
//!
//! # See every dispatch
//! RUST_LOG=batchflush=debug cargo run -p batchflush --features demo --bin demo
//! ```

use anyhow::Context;
use batchflush::{BatchHandler, Buffer, CancellationToken, DispatchError, PeriodicDispatcher};
use clap::Parser;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "demo", about = "Periodic batch flushing demo")]
struct Args {
    /// Number of concurrent producer tasks
    #[arg(long, default_value_t = 8)]
    producers: usize,

    /// Events enqueued by each producer
    #[arg(long, default_value_t = 500)]
    items: u64,

    /// Flush period in milliseconds
    #[arg(long, default_value_t = 100)]
    period_ms: u64,

    /// Probability that the simulated backend rejects a batch
    #[arg(long, default_value_t = 0.1)]
    failure_rate: f64,

    /// Simulated backend latency in milliseconds
    #[arg(long, default_value_t = 5)]
    latency_ms: u64,
}

#[derive(Debug)]
struct TelemetryEvent {
    producer_id: usize,
    seq: u64,
    created: Instant,
}

/// A simulated ingestion backend that occasionally rejects a batch.
struct SimulatedBackend {
    failure_rate: f64,
    latency: Duration,
    accepted: AtomicU64,
    max_age_micros: AtomicU64,
}

impl SimulatedBackend {
    fn new(failure_rate: f64, latency: Duration) -> Self {
        Self {
            failure_rate,
            latency,
            accepted: AtomicU64::new(0),
            max_age_micros: AtomicU64::new(0),
        }
    }
}

impl BatchHandler<TelemetryEvent> for SimulatedBackend {
    async fn handle(&self, batch: Vec<TelemetryEvent>) -> Result<(), DispatchError> {
        tokio::time::sleep(self.latency).await;

        let should_fail = rand::thread_rng().gen_bool(self.failure_rate);
        if should_fail {
            return Err(DispatchError::Rejected {
                status: 503,
                reason: format!("simulated outage ({} events)", batch.len()),
            });
        }

        let oldest = batch
            .iter()
            .map(|e| e.created.elapsed().as_micros() as u64)
            .max()
            .unwrap_or_default();
        self.max_age_micros.fetch_max(oldest, Ordering::Relaxed);
        self.accepted.fetch_add(batch.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    fn name(&self) -> &str {
        "simulated-ingestion"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    anyhow::ensure!(
        (0.0..=1.0).contains(&args.failure_rate),
        "--failure-rate must be within [0, 1]"
    );
    let period = Duration::from_millis(args.period_ms);

    info!(
        producers = args.producers,
        items = args.items,
        period_ms = args.period_ms,
        failure_rate = args.failure_rate,
        "starting demo"
    );

    let backend = Arc::new(SimulatedBackend::new(
        args.failure_rate,
        Duration::from_millis(args.latency_ms),
    ));
    let buffer = Arc::new(Buffer::new());
    let dispatcher = PeriodicDispatcher::new(Arc::clone(&buffer), backend.clone());
    let shutdown = CancellationToken::new();
    let loop_task = dispatcher
        .start(shutdown.clone(), period)
        .context("starting dispatcher")?;

    let started = Instant::now();
    let producers: Vec<_> = (0..args.producers)
        .map(|producer_id| {
            let buffer = Arc::clone(&buffer);
            let items = args.items;
            tokio::spawn(async move {
                for seq in 0..items {
                    buffer.enqueue(TelemetryEvent {
                        producer_id,
                        seq,
                        created: Instant::now(),
                    });
                    if seq % 50 == 0 {
                        tokio::time::sleep(Duration::from_millis(1)).await;
                    }
                }
            })
        })
        .collect();
    for producer in producers {
        producer.await.context("producer task failed")?;
    }

    // Give the loop a couple of ticks to pick up the tail, then enqueue one
    // more event that may be stranded by the shutdown
    tokio::time::sleep(period * 2).await;
    buffer.enqueue(TelemetryEvent {
        producer_id: args.producers,
        seq: 0,
        created: Instant::now(),
    });
    shutdown.cancel();
    loop_task.await.context("dispatch loop panicked")?;

    let snapshot = dispatcher.metrics().snapshot();
    let stranded = buffer.drain();
    let enqueued = args.producers as u64 * args.items + 1;
    println!();
    println!("=== Dispatch Summary ({:.2?}) ===", started.elapsed());
    println!("  enqueued:            {enqueued}");
    println!("  ticks:               {} ({} idle)", snapshot.ticks, snapshot.idle_ticks);
    println!("  batches dispatched:  {}", snapshot.batches_dispatched);
    println!("  items dispatched:    {}", snapshot.items_dispatched);
    println!("  backend accepted:    {}", backend.accepted.load(Ordering::Relaxed));
    println!("  failed batches:      {}", snapshot.dispatch_failures);
    println!("  items dropped:       {}", snapshot.items_dropped);
    println!("  left at shutdown:    {}", stranded.len());
    println!(
        "  worst enqueue->ack:  {} us",
        backend.max_age_micros.load(Ordering::Relaxed)
    );
    for event in &stranded {
        println!("    stranded: producer={} seq={}", event.producer_id, event.seq);
    }

    anyhow::ensure!(
        snapshot.items_attempted() + stranded.len() as u64 == enqueued,
        "event accounting mismatch: {} attempted + {} stranded != {} enqueued",
        snapshot.items_attempted(),
        stranded.len(),
        enqueued
    );
    Ok(())
}
