use std::sync::Arc;

use anyhow::Context;
use rtprobe::config::{ProbeConfig, TelemetryOutput};
use rtprobe::finalizer::FinalizerChain;
use rtprobe::keymap::{self, ProbeRecord, StructuralKeyMap};
use rtprobe::telemetry::{JsonSink, TelemetrySink, TracingSink};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    // 2. Config (optional JSON file as the only argument)
    let config = match std::env::args().nth(1) {
        Some(path) => ProbeConfig::load(&path).with_context(|| format!("loading {}", path))?,
        None => ProbeConfig::default(),
    };
    tracing::info!(?config, "rtprobe starting");

    // 3. Map probe
    let mut map = StructuralKeyMap::<16, u8>::with_capacity_hint(config.keymap.capacity_hint);
    if let Some(seed) = config.keymap.seed {
        map.put(ProbeRecord::zeroed(), seed);
    }
    keymap::populate_probe(&mut map);
    println!("{}", map);
    tracing::info!(size = map.size(), "map probe done");

    // 4. Finalizer chain
    let sink: Arc<dyn TelemetrySink> = match config.telemetry {
        TelemetryOutput::Json => Arc::new(JsonSink::stdout()),
        TelemetryOutput::Tracing => Arc::new(TracingSink),
    };
    let handle = FinalizerChain::new(sink, config.chain.payload).spawn(&config.chain);

    tracing::info!("Finalizer chain active. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await.context("waiting for Ctrl+C")?;

    let passes = handle.stop().await;
    tracing::info!(passes, "rtprobe exiting");
    Ok(())
}
