mod cli;
mod logging;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use monitor_core::{parse_target_url, ConfigChange, MonitorConfig, RelevanceScorer};
use monitor_engine::{
    bridge_channel, load_settings, save_settings, spawn_settings_reloader, ConfigHandle,
    EventSocket, FilterFeedback, ForwardSettings, FrameTap, InterceptingFactory, Relay,
    RelayStats, ReqwestForwarder, SocketEvent, SocketFactory, TungsteniteFactory,
};
use monitor_logging::{monitor_debug, monitor_error, monitor_info, monitor_warn};
use tokio::sync::mpsc;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.log.into(), LevelFilter::Info);

    let mut config = load_settings(&cli.settings);
    if apply_overrides(&mut config, &cli)? {
        let path = save_settings(&cli.settings, &config)
            .with_context(|| format!("saving settings to {:?}", cli.settings))?;
        monitor_info!("Settings saved to {:?}", path);
    }
    match &config.target_url {
        Some(url) => monitor_info!("Forwarding relevant messages to {}", url),
        None => monitor_warn!("No target url configured; messages will only be logged"),
    }

    let handle = ConfigHandle::new(config);
    let (bridge_tx, bridge_rx) = bridge_channel();
    let scorer = Arc::new(RelevanceScorer::new().context("compiling relevance patterns")?);
    let forwarder = Arc::new(
        ReqwestForwarder::new(forward_settings(&cli)).context("building http client")?,
    );

    let (feedback_tx, feedback_rx) = mpsc::unbounded_channel();
    let relay = Relay::new(scorer, forwarder, handle.clone()).with_feedback(feedback_tx);
    let stats = relay.stats();
    tokio::spawn(relay.run(bridge_rx));
    tokio::spawn(log_feedback(feedback_rx));

    let reloader = (cli.reload_secs > 0).then(|| {
        spawn_settings_reloader(
            cli.settings.clone(),
            handle.clone(),
            Duration::from_secs(cli.reload_secs),
        )
    });

    let factory = InterceptingFactory::new(
        TungsteniteFactory::new(cli.binary_type.into()),
        FrameTap::new(handle.clone(), bridge_tx),
    );
    for url in &cli.sockets {
        let socket = match factory.open(url, &cli.protocols) {
            Ok(socket) => Arc::new(socket),
            Err(err) => {
                monitor_error!("Could not open {}: {}", url, err);
                continue;
            }
        };
        let socket_url = socket.url().to_string();
        socket.add_listener(Box::new(move |event| log_app_event(&socket_url, event)));
        tokio::spawn(async move {
            if let Err(err) = socket.run().await {
                monitor_error!("Socket {} failed: {}", socket.url(), err);
            }
        });
    }

    tokio::signal::ctrl_c()
        .await
        .context("waiting for ctrl-c")?;
    if let Some(reloader) = reloader {
        reloader.abort();
    }
    log_stats(&stats);
    Ok(())
}

/// Fold command-line overrides into the loaded settings. Returns whether
/// anything changed and should be persisted.
fn apply_overrides(config: &mut MonitorConfig, cli: &Cli) -> anyhow::Result<bool> {
    let before = config.clone();
    if let Some(raw) = &cli.target_url {
        let url = parse_target_url(raw).context("invalid --target-url")?;
        config.apply(ConfigChange::TargetUrl(Some(url)));
    }
    if cli.clear_target_url {
        config.apply(ConfigChange::TargetUrl(None));
    }
    if let Some(flag) = cli.only_filtered {
        config.apply(ConfigChange::OnlyLogFiltered(flag));
    }
    if let Some(host) = &cli.target_host {
        config.apply(ConfigChange::TargetHost(host.trim().to_string()));
    }
    Ok(*config != before)
}

fn forward_settings(cli: &Cli) -> ForwardSettings {
    ForwardSettings {
        connect_timeout: cli.connect_timeout_secs.map(Duration::from_secs),
        user_agent: Some(concat!("bat-chat-monitor/", env!("CARGO_PKG_VERSION")).to_string()),
    }
}

fn log_app_event(url: &str, event: &SocketEvent) {
    match event {
        SocketEvent::Message(_) => monitor_debug!("Frame received on {}", url),
        SocketEvent::Close { code, .. } => monitor_debug!("{} closed ({:?})", url, code),
        _ => {}
    }
}

async fn log_feedback(mut feedback: mpsc::UnboundedReceiver<FilterFeedback>) {
    let mut total = 0u64;
    let mut filtered = 0u64;
    while let Some(result) = feedback.recv().await {
        total += 1;
        if result.is_trading {
            filtered += 1;
        }
        monitor_debug!(
            "Filter result score {} trading {} [{}]; {}/{} relevant so far",
            result.score,
            result.is_trading,
            result.reasons.join(", "),
            filtered,
            total
        );
    }
}

fn log_stats(stats: &RelayStats) {
    let snapshot = stats.snapshot();
    monitor_info!(
        "Shutting down: {} messages, {} relevant, {} forwarded, {} delivered, {} failed, {} skipped",
        snapshot.total,
        snapshot.relevant,
        snapshot.forwarded,
        snapshot.delivered,
        snapshot.failed,
        snapshot.skipped
    );
}
