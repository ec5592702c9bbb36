// Copyright (c) 2025 - Cowboy AI, Inc.
//! Reactive Stream Demo
//!
//! Wires a small stream graph and drives it with simulated user input:
//! - A slider value is debounced and sampled
//! - A function model squares the settled value on the blocking pool
//! - A reactor logs each begin/change/end gesture
//!
//! Run with: cargo run --bin reactive-demo
//!
//! Scheduler settings are read from `CIM_REACTIVE_*` environment variables,
//! log filtering from `RUST_LOG`.

use anyhow::{Context, Result};
use cim_reactive::{
    DebounceStream, FuncStreamValueModel, MapStream, Observable, SampleStream, Scheduler,
    SchedulerConfig, SchedulerRuntime, StreamRef, StreamResult, StreamValueModel, StreamValues,
    ValueChangeQueue, ValueChangeStream, ValueChangeStreamReactor, ValueFn, ValueStream,
};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Quiet period for the debounced slider
const DEBOUNCE_PERIOD: Duration = Duration::from_millis(150);

/// Cadence of the sampled slider
const SAMPLE_PERIOD: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = SchedulerConfig::from_env().context("Invalid scheduler configuration")?;
    info!(
        flavor = ?config.flavor,
        worker_threads = config.worker_threads,
        max_blocking_threads = config.max_blocking_threads,
        "Configuration loaded"
    );

    let runtime = SchedulerRuntime::new(config).context("Failed to start scheduler runtime")?;
    let scheduler = runtime.scheduler();
    runtime.block_on(run(scheduler))
}

async fn run(scheduler: Scheduler) -> Result<()> {
    let slider = ValueStream::new(Some(0));
    let slider_ref: StreamRef<i32> = slider.clone();

    let debounced: StreamRef<i32> =
        DebounceStream::new(slider_ref.clone(), DEBOUNCE_PERIOD, &scheduler);
    let sampled: StreamRef<i32> = SampleStream::new(slider_ref.clone(), SAMPLE_PERIOD, &scheduler);

    let settled = StreamValueModel::new(debounced.clone());
    let _settled_listener = settled.property_changed_event().listen(|name: &String| {
        debug!(property = %name, "Settled value changed");
    });

    // Functions are not comparable; every settled value yields a new one.
    let square: StreamRef<ValueFn<i64>> = MapStream::with_cmp(
        debounced.clone(),
        |value: &Option<i32>| {
            value.map(|v| {
                let f: ValueFn<i64> = Arc::new(move || Some(i64::from(v) * i64::from(v)));
                f
            })
        },
        Arc::new(|_: &Option<ValueFn<i64>>, _: &Option<ValueFn<i64>>| false),
    );
    let squared = FuncStreamValueModel::new(square, &scheduler);

    let gestures = ValueChangeStream::new(slider_ref.clone());
    let reactor = ValueChangeStreamReactor::new(gestures.clone(), &scheduler);
    reactor.run(log_gestures);

    let mut samples = StreamValues::new(&sampled);

    gestures.begin();
    for value in 1..=10 {
        slider.set_value(Some(value));
        scheduler.sleep(Duration::from_millis(40)).await;
    }
    gestures.end();

    scheduler.sleep(DEBOUNCE_PERIOD * 2).await;
    squared
        .run_until_complete()
        .await
        .context("Square evaluation failed")?;

    samples.close();
    let mut sample_count = 0;
    while let Some(value) = samples.next().await {
        sample_count += 1;
        debug!(?value, "Sampled");
    }

    info!(
        settled = ?settled.value(),
        squared = ?squared.value(),
        sampled = ?sampled.value(),
        sample_count,
        "Demo complete"
    );

    reactor.close();
    squared.close();
    settled.close();
    Ok(())
}

/// Log every gesture the reactor sees until the reactor is closed
async fn log_gestures(queue: Arc<ValueChangeQueue<i32>>) -> StreamResult<()> {
    loop {
        queue.begin().await?;
        info!("Gesture started");
        loop {
            let change = queue.next_value_change().await?;
            if change.is_end() {
                info!(value = ?change.value, "Gesture finished");
                break;
            }
            debug!(value = ?change.value, "Gesture moved");
        }
    }
}
