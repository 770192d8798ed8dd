//! Consumes bridge events: scores, gates and delivers intercepted messages.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use monitor_core::{decide, GateDecision, OutboundPayload, RelevanceScorer, SkipReason};
use monitor_logging::{
    clip_for_log, monitor_debug, monitor_info, monitor_info_unless, monitor_warn,
};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::bridge::{BridgeEvent, BridgeEventKind, BridgeReceiver, InterceptedMessage, BRIDGE_ID};
use crate::forward::Forwarder;
use crate::settings::ConfigHandle;
use crate::{DeliveryError, DeliveryReport, FilterFeedback};

#[derive(Debug, Default)]
pub struct RelayStats {
    total: AtomicU64,
    relevant: AtomicU64,
    forwarded: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    monitoring_active: AtomicBool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub total: u64,
    pub relevant: u64,
    pub forwarded: u64,
    pub delivered: u64,
    pub failed: u64,
    pub skipped: u64,
    pub monitoring_active: bool,
}

impl RelayStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            relevant: self.relevant.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            monitoring_active: self.monitoring_active.load(Ordering::Relaxed),
        }
    }
}

pub struct Relay {
    scorer: Arc<RelevanceScorer>,
    forwarder: Arc<dyn Forwarder>,
    config: ConfigHandle,
    stats: Arc<RelayStats>,
    feedback: Option<UnboundedSender<FilterFeedback>>,
}

impl Relay {
    pub fn new(
        scorer: Arc<RelevanceScorer>,
        forwarder: Arc<dyn Forwarder>,
        config: ConfigHandle,
    ) -> Self {
        Self {
            scorer,
            forwarder,
            config,
            stats: Arc::new(RelayStats::default()),
            feedback: None,
        }
    }

    pub fn with_feedback(mut self, feedback: UnboundedSender<FilterFeedback>) -> Self {
        self.feedback = Some(feedback);
        self
    }

    pub fn stats(&self) -> Arc<RelayStats> {
        Arc::clone(&self.stats)
    }

    /// Drain the bridge until every sender is gone. Deliveries still in
    /// flight at that point are not awaited.
    pub async fn run(self, mut bridge: BridgeReceiver) {
        while let Some(event) = bridge.recv().await {
            self.handle_event(event);
        }
        monitor_info!("Bridge closed; relay stopping");
    }

    /// Process one event. Returns the delivery task when the message was forwarded.
    pub fn handle_event(
        &self,
        event: BridgeEvent,
    ) -> Option<JoinHandle<Result<DeliveryReport, DeliveryError>>> {
        if event.bridge_id != BRIDGE_ID {
            monitor_debug!("Ignoring event from foreign bridge {:?}", event.bridge_id);
            return None;
        }
        match event.kind {
            BridgeEventKind::Ready { url, timestamp } => {
                self.stats.monitoring_active.store(true, Ordering::Relaxed);
                monitor_info!("Monitoring active on {} since {}", url, timestamp);
                None
            }
            BridgeEventKind::Message(intercepted) => self.handle_message(*intercepted),
        }
    }

    fn handle_message(
        &self,
        intercepted: InterceptedMessage,
    ) -> Option<JoinHandle<Result<DeliveryReport, DeliveryError>>> {
        let InterceptedMessage { frame, message } = intercepted;
        let config = self.config.snapshot();
        let quiet = config.only_log_filtered_messages;
        self.stats.total.fetch_add(1, Ordering::Relaxed);

        let assessment = message
            .relevance_text()
            .map(|text| self.scorer.assess(Some(text)));
        if let Some(assessment) = &assessment {
            if assessment.is_trading {
                self.stats.relevant.fetch_add(1, Ordering::Relaxed);
            }
            if let Some(feedback) = &self.feedback {
                let _ = feedback.send(FilterFeedback {
                    url: frame.url.clone(),
                    timestamp: frame.timestamp_utc.clone(),
                    is_trading: assessment.is_trading,
                    score: assessment.score,
                    reasons: assessment.reasons.clone(),
                });
            }
        }

        let decision = decide(&message, assessment.as_ref(), &config);
        let target = match (&decision, config.target_url.as_ref()) {
            (GateDecision::Forward(_), Some(target)) => target.clone(),
            (GateDecision::Skip(SkipReason::NoDestination), _) => {
                self.stats.skipped.fetch_add(1, Ordering::Relaxed);
                monitor_info_unless!(
                    quiet,
                    "No target url configured; dropping message from {}",
                    frame.url
                );
                return None;
            }
            _ => {
                self.stats.skipped.fetch_add(1, Ordering::Relaxed);
                let score = assessment.as_ref().map(|a| a.score).unwrap_or_default();
                monitor_info_unless!(
                    quiet,
                    "Skipping message from {} ({}, score {}): {}",
                    frame.url,
                    decision,
                    score,
                    clip_for_log(&message.text_preview)
                );
                return None;
            }
        };

        self.stats.forwarded.fetch_add(1, Ordering::Relaxed);
        let payload = OutboundPayload::build(&frame, &message, assessment.as_ref());
        monitor_info!("Forwarding message ({}) to {}: {}", decision, target, payload.log_preview());

        let forwarder = Arc::clone(&self.forwarder);
        let stats = Arc::clone(&self.stats);
        Some(tokio::spawn(async move {
            let result = forwarder.deliver(&target, &payload).await;
            match &result {
                Ok(report) => {
                    stats.delivered.fetch_add(1, Ordering::Relaxed);
                    monitor_debug!("Delivered to {} (status {})", target, report.status);
                }
                Err(err) => {
                    stats.failed.fetch_add(1, Ordering::Relaxed);
                    monitor_warn!("Delivery to {} failed: {}", target, err);
                }
            }
            result
        }))
    }
}
