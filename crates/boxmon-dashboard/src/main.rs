//! Monitor binary.

use std::sync::Arc;

use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use boxmon_client::ApiClient;
use boxmon_dashboard::{Dashboard, DecodedFrame, FramePainter, FrameRenderer, MonitorConfig};
use boxmon_transport::ChannelClient;

/// Paints frames by reporting them to the log at a sampled rate. Stands
/// in for a real surface; the decode contract is the same.
#[derive(Default)]
struct TracingPainter {
    painted: u64,
}

impl FramePainter for TracingPainter {
    fn paint(&mut self, frame: &DecodedFrame) {
        self.painted += 1;
        if self.painted % 30 == 1 {
            debug!(
                frame = frame.frame_count,
                bytes = frame.bytes.len(),
                source = %frame.source,
                "painted frame"
            );
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("boxmon=info".parse().expect("valid directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting boxmon");

    let config = MonitorConfig::from_env();
    info!(
        "Monitor config: api={}, channel={}",
        config.api_base_url, config.channel_url
    );

    let client = ApiClient::new(&config.api_base_url)?;
    let channel = Arc::new(ChannelClient::with_reconnect(config.reconnect()));
    let dashboard = Dashboard::new(client.clone(), Arc::clone(&channel));

    FrameRenderer::spawn(dashboard.frame_slot(), Box::new(TracingPainter::default()));

    channel.connect(&config.channel_url)?;

    // Initial population; both calls are recoverable if the server is
    // not up yet.
    match client.list_video_sources().await {
        Ok(sources) => info!("Available video sources: {:?}", sources),
        Err(e) => warn!("Failed to list video sources: {}", e),
    }
    match dashboard.refresh_statistics().await {
        Ok(stats) => info!(
            "Initial statistics: {} total detections, {} pending boxes",
            stats.total_detections, stats.pending_boxes
        ),
        Err(e) => warn!("Initial statistics fetch failed: {}", e),
    }

    tokio::select! {
        _ = dashboard.run() => {
            warn!("push channel closed");
        }
        _ = shutdown_signal() => {}
    }

    channel.shutdown();
    info!("Monitor shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Received shutdown signal");
}
