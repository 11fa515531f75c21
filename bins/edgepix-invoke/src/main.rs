//! edgepix-invoke: run the interceptor once against an event.

use anyhow::Context;
use clap::Parser;
use edgepix_core::EdgeConfig;
use edgepix_edge::Handler;
use edgepix_origin_client::{HttpOriginClient, OriginClientConfig};
use edgepix_telemetry::TelemetryConfig;
use std::io::Read;
use std::path::PathBuf;

#[cfg(feature = "avif")]
const FORMATS_HELP: &str = "Output formats: AVIF, WebP, PNG (this build includes the AVIF encoder).";

#[cfg(not(feature = "avif"))]
const FORMATS_HELP: &str = "Output formats: WebP, PNG. AVIF is skipped in this build; \
rebuild with `--features avif` to serve it.";

#[derive(Parser)]
#[command(name = "edgepix-invoke")]
#[command(about = "Run the edge image interceptor against one platform event")]
#[command(after_help = FORMATS_HELP)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to edgepix.toml if present)
    #[arg(long, short, env = "EDGEPIX_CONFIG")]
    config: Option<PathBuf>,

    /// Event JSON file; reads stdin when omitted
    event: Option<PathBuf>,

    /// Print outcome counters to stderr when done
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = EdgeConfig::load(cli.config.as_deref().and_then(|p| p.to_str()))?;
    config.apply_env_overrides()?;

    edgepix_telemetry::init_with_config(TelemetryConfig::from(&config.logging))?;
    tracing::debug!(avif = cfg!(feature = "avif"), "Encoders compiled in");

    let raw = match &cli.event {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read event from stdin")?;
            buf
        }
    };
    let event: serde_json::Value = serde_json::from_str(&raw).context("Event is not valid JSON")?;

    let client = HttpOriginClient::with_config(OriginClientConfig::from(&config))?;
    let handler = Handler::new(client, config);

    let output = handler.handle(&event).await;
    println!("{}", serde_json::to_string_pretty(&output)?);

    if cli.metrics {
        eprintln!("{}", serde_json::to_string_pretty(&edgepix_telemetry::metrics().snapshot())?);
    }

    tracing::debug!("Invocation finished");
    Ok(())
}
