//! Interaction lifecycle notifications carried over the event bus.
use crate::mode::state::{InteractionMode, SceneMode};

use super::types::{InteractionRequest, RequestId, StatDelta, TargetId};

/// Gate passed; the request is in flight until `InteractionCompleted`.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionStarted {
    pub request: InteractionRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionDenied {
    pub name: String,
    pub target: TargetId,
    pub reasons: Vec<String>,
}

/// True values have been written; display animation begins.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionApplied {
    pub request_id: RequestId,
    pub name: String,
    pub deltas: Vec<StatDelta>,
    pub message: String,
}

/// Display animation finished (or was snapped). Clears the in-flight mark.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionCompleted {
    pub request: InteractionRequest,
    pub success: bool,
    pub message: String,
    pub travel_to: Option<SceneMode>,
    pub enter_mode: Option<InteractionMode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayStarted {
    pub day: u32,
}
