use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use eventwatch_adapters::msam::MsamClient;
use eventwatch_cache::{detect, listener, FileSettings, PollerService, MAX_INTERVAL_SECS};
use eventwatch_types::GroupedEvent;

mod app_config;

use app_config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "eventwatch")]
#[command(about = "Poll channel alarm and idle state and print every change")]
struct Args {
    /// Config file with connection settings (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Status API base URL
    #[arg(short, long)]
    endpoint: Option<String>,

    /// API key for the status API
    #[arg(long)]
    api_key: Option<String>,

    /// Poll interval in seconds; persisted for later runs
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..=MAX_INTERVAL_SECS))]
    interval: Option<u64>,

    /// File the update interval is persisted in
    #[arg(long)]
    settings_file: Option<PathBuf>,

    /// Poll once, print any change and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load(args.config.as_deref())?;

    let endpoint = args
        .endpoint
        .or(config.endpoint.clone())
        .context("no endpoint configured; pass --endpoint or set EVENTWATCH_ENDPOINT")?;
    let api_key = args.api_key.or(config.api_key.clone()).unwrap_or_default();
    let settings_file = args.settings_file.unwrap_or_else(|| config.settings_file());

    let mut client = MsamClient::builder().endpoint(endpoint).api_key(api_key);
    if let Some(secs) = config.timeout_secs {
        client = client.timeout(Duration::from_secs(secs));
    }
    let client = client.build()?;

    let poller = PollerService::builder(Arc::new(client))
        .settings(Arc::new(FileSettings::new(settings_file.clone())))
        .build();

    poller.add_callback(listener(|current, previous| {
        if let Some(line) = change_summary(current, previous) {
            println!("{}", line);
        }
    }));

    if args.once {
        let outcome = poller.poll_once().await?;
        let cached = poller.get_cached_events();
        info!(
            changed = outcome.is_changed(),
            events = cached.current.len(),
            "poll complete"
        );
        return Ok(());
    }

    let stored = poller
        .load_interval()
        .await
        .with_context(|| format!("reading {}", settings_file.display()))?;

    match (args.interval, stored) {
        (Some(seconds), _) => poller.set_update_interval(seconds).await?,
        (None, Some(_)) => poller.start()?,
        (None, None) => bail!(
            "no update interval stored in {}; pass --interval",
            settings_file.display()
        ),
    }

    info!(
        source = poller.source_description(),
        interval_ms = poller.get_update_interval(),
        "polling"
    );

    tokio::signal::ctrl_c().await?;
    poller.stop();
    info!("stopped");
    Ok(())
}

/// One JSON line describing what changed between two polls, or `None` if
/// nothing worth reporting did.
fn change_summary(current: &[GroupedEvent], previous: &[GroupedEvent]) -> Option<String> {
    let delta = detect(current, previous)?;
    let alarms = |events: &[GroupedEvent]| -> Vec<serde_json::Value> {
        events
            .iter()
            .map(|e| {
                json!({
                    "resource_arn": e.resource_arn,
                    "alarm_id": e.alarm_id,
                    "idle_state": e.detail.idle_state,
                    "degraded": e.detail.degraded,
                })
            })
            .collect()
    };

    let line = json!({
        "changed": delta.key.path(),
        "events": current.len(),
        "added": alarms(&delta.added),
        "removed": alarms(&delta.removed),
    });
    Some(line.to_string())
}
