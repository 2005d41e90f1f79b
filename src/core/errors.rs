//! Error taxonomy shared by the orchestration components.
//!
//! None of these are fatal: every producer logs the error and degrades to a
//! no-op so a single misbehaving interaction cannot stall the frame loop.
use thiserror::Error;

use crate::{
    bus::SubscriptionHandle,
    interaction::types::{RequestId, TargetId},
    mode::TransitionRejection,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrchestrationError {
    /// Interaction has no descriptor; the gate lets it through.
    #[error("interaction `{name}` has no configuration; allowing by default")]
    ConfigurationMissing { name: String },

    /// Gate rejection, surfaced as a reason list.
    #[error("interaction `{name}` denied: {}", .reasons.join("; "))]
    ConditionDenied { name: String, reasons: Vec<String> },

    #[error("interaction `{name}` on {target} ignored: request {in_flight} still in flight")]
    ConcurrentRequestIgnored {
        name: String,
        target: TargetId,
        in_flight: RequestId,
    },

    #[error("transition rejected: {0}")]
    TransitionRejected(#[from] TransitionRejection),

    #[error("subscriber {handle} failed while handling `{event}`: {message}")]
    SubscriberFailure {
        event: String,
        handle: SubscriptionHandle,
        message: String,
    },
}
