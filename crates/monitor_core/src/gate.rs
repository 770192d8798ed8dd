use std::fmt;

use crate::config::MonitorConfig;
use crate::frame::ClassifiedMessage;
use crate::relevance::RelevanceAssessment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardReason {
    /// Text scored at or above the trading threshold.
    Relevant,
    /// No text to score; the filter cannot apply, so the message passes.
    UndecidableRelevance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoDestination,
    NotRelevant,
    /// Neither bytes nor text were recovered.
    EmptyPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Forward(ForwardReason),
    Skip(SkipReason),
}

impl ForwardReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForwardReason::Relevant => "relevant",
            ForwardReason::UndecidableRelevance => "undecidable-relevance",
        }
    }
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NoDestination => "no-destination",
            SkipReason::NotRelevant => "not-relevant",
            SkipReason::EmptyPayload => "empty-payload",
        }
    }
}

impl fmt::Display for GateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateDecision::Forward(reason) => write!(f, "forward ({})", reason.as_str()),
            GateDecision::Skip(reason) => write!(f, "skip ({})", reason.as_str()),
        }
    }
}

impl GateDecision {
    pub fn is_forward(&self) -> bool {
        matches!(self, GateDecision::Forward(_))
    }
}

/// Final, per-message forwarding decision. A missing destination wins over
/// everything else; text messages pass only when judged trading-relevant.
pub fn decide(
    message: &ClassifiedMessage,
    assessment: Option<&RelevanceAssessment>,
    config: &MonitorConfig,
) -> GateDecision {
    if config.target_url.is_none() {
        return GateDecision::Skip(SkipReason::NoDestination);
    }
    if message.is_empty() {
        return GateDecision::Skip(SkipReason::EmptyPayload);
    }
    if message.relevance_text().is_none() {
        return GateDecision::Forward(ForwardReason::UndecidableRelevance);
    }
    match assessment {
        Some(assessment) if assessment.is_trading => GateDecision::Forward(ForwardReason::Relevant),
        _ => GateDecision::Skip(SkipReason::NotRelevant),
    }
}
