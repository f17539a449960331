//! World event model
//!
//! Events apply their effects immediately on creation and record an
//! original-value snapshot per affected entity. Positive outcomes revert
//! every recorded effect exactly once; negative terminal outcomes leave the
//! effects in place permanently. The `is_active` flag guards cleanup so a
//! second pass is a no-op.

use crate::models::lane::RiskLevel;
use crate::models::EntityRef;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// World event category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Economic,
    Weather,
    Carrier,
    Regulatory,
    Customer,
    Criminal,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Economic,
        EventKind::Weather,
        EventKind::Carrier,
        EventKind::Regulatory,
        EventKind::Customer,
        EventKind::Criminal,
    ];

    /// Outcome for a player response, per the event-kind response table.
    /// Unknown responses yield `None` (the event stays active/ongoing).
    pub fn outcome_for_response(self, response: &str) -> Option<EventOutcome> {
        match (self, response) {
            (EventKind::Economic, "adapt_pricing") => Some(EventOutcome::Resolved),
            (EventKind::Economic, "hedge") => Some(EventOutcome::Mitigated),
            (EventKind::Weather, "wait_out") => Some(EventOutcome::Resolved),
            (EventKind::Weather, "reroute") => Some(EventOutcome::Mitigated),
            (EventKind::Carrier, "renegotiate") => Some(EventOutcome::Resolved),
            (EventKind::Carrier, "replace_carrier") => Some(EventOutcome::Mitigated),
            (EventKind::Regulatory, "comply") => Some(EventOutcome::Resolved),
            (EventKind::Regulatory, "contest") => Some(EventOutcome::Enforced),
            (EventKind::Customer, "compensate") => Some(EventOutcome::Resolved),
            (EventKind::Customer, "apologize") => Some(EventOutcome::Mitigated),
            (EventKind::Customer, "dismiss") => Some(EventOutcome::CustomerDissatisfied),
            (EventKind::Criminal, "hire_security") => Some(EventOutcome::CrimePrevented),
            (EventKind::Criminal, "report") => Some(EventOutcome::Mitigated),
            (EventKind::Criminal, "ignore") => Some(EventOutcome::SuccessfulCrime),
            _ => None,
        }
    }

    /// Outcome applied when the event expires without a player response.
    pub fn default_outcome(self) -> EventOutcome {
        match self {
            EventKind::Economic | EventKind::Weather | EventKind::Carrier => EventOutcome::Expired,
            EventKind::Regulatory => EventOutcome::Enforced,
            EventKind::Customer => EventOutcome::CustomerDissatisfied,
            EventKind::Criminal => EventOutcome::SuccessfulCrime,
        }
    }
}

/// Terminal (or ongoing) classification of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventOutcome {
    /// Player response fixed the situation; effects are reverted
    Resolved,
    /// Player response softened the situation; effects are reverted
    Mitigated,
    /// Ran out without a response; effects are reverted
    Expired,
    /// Criminal event prevented; effects are reverted
    CrimePrevented,
    /// Negative terminal: effects stay in place
    ResolvedNegatively,
    /// Negative terminal (regulatory): effects stay in place
    Enforced,
    /// Negative terminal (customer): effects stay in place
    CustomerDissatisfied,
    /// Negative terminal (criminal): effects stay in place
    SuccessfulCrime,
    /// Not terminal: event stays active awaiting a response
    Ongoing,
}

impl EventOutcome {
    pub fn is_terminal(self) -> bool {
        self != EventOutcome::Ongoing
    }

    /// True when the outcome reverts the event's recorded effects.
    pub fn triggers_cleanup(self) -> bool {
        matches!(
            self,
            EventOutcome::Resolved
                | EventOutcome::Mitigated
                | EventOutcome::Expired
                | EventOutcome::CrimePrevented
        )
    }
}

/// A single applied effect with everything needed to reverse it: the
/// original value is captured at apply time and restored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum AppliedEffect {
    /// A price modifier was registered; reversal removes it
    AddedPriceModifier {
        target: EntityRef,
        modifier_id: String,
    },
    /// Lane congestion was set directly; reversal restores the original
    SetLaneCongestion { target: EntityRef, original: f64 },
    /// Lane risk was stepped; reversal restores the original level
    SetLaneRisk { target: EntityRef, original: RiskLevel },
    /// Lane was blocked; reversal lifts the block
    BlockedLane { target: EntityRef },
    /// Carrier blacklist flag was set; reversal restores the original
    SetCarrierBlacklist { target: EntityRef, original: bool },
    /// Carrier reputation was adjusted; reversal restores the original
    AdjustedCarrierReputation { target: EntityRef, original: f64 },
    /// Customer trust was adjusted; reversal restores the original
    AdjustedCustomerTrust { target: EntityRef, original: f64 },
}

impl AppliedEffect {
    pub fn target(&self) -> &EntityRef {
        match self {
            AppliedEffect::AddedPriceModifier { target, .. }
            | AppliedEffect::SetLaneCongestion { target, .. }
            | AppliedEffect::SetLaneRisk { target, .. }
            | AppliedEffect::BlockedLane { target }
            | AppliedEffect::SetCarrierBlacklist { target, .. }
            | AppliedEffect::AdjustedCarrierReputation { target, .. }
            | AppliedEffect::AdjustedCustomerTrust { target, .. } => target,
        }
    }
}

/// World event errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorldEventError {
    #[error("Event not found: {0}")]
    NotFound(String),

    #[error("Player response already set")]
    ResponseAlreadySet,

    #[error("Event is already resolved")]
    AlreadyResolved,
}

/// An active or resolved world event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldEvent {
    id: String,
    kind: EventKind,
    name: String,
    start_time: f64,
    end_time: f64,
    /// Severity, 0..1; scales effect magnitudes
    severity: f64,
    /// Entities this event touches
    targets: Vec<EntityRef>,
    /// Cleanup guard: flips false exactly once
    is_active: bool,
    /// Set at most once
    player_response: Option<String>,
    outcome: Option<EventOutcome>,
    /// Effects applied at creation, recorded for reversal
    effects: Vec<AppliedEffect>,
    /// Reversal guard: flips true exactly once
    effects_reverted: bool,
}

impl WorldEvent {
    pub fn new(
        id: impl Into<String>,
        kind: EventKind,
        name: impl Into<String>,
        start_time: f64,
        end_time: f64,
        severity: f64,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            start_time,
            end_time,
            severity: severity.clamp(0.0, 1.0),
            targets: Vec::new(),
            is_active: true,
            player_response: None,
            outcome: None,
            effects: Vec::new(),
            effects_reverted: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn severity(&self) -> f64 {
        self.severity
    }

    pub fn targets(&self) -> &[EntityRef] {
        &self.targets
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn player_response(&self) -> Option<&str> {
        self.player_response.as_deref()
    }

    pub fn outcome(&self) -> Option<EventOutcome> {
        self.outcome
    }

    pub fn effects(&self) -> &[AppliedEffect] {
        &self.effects
    }

    pub fn is_expired(&self, now: f64) -> bool {
        now >= self.end_time
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn add_target(&mut self, target: EntityRef) {
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }
    }

    pub fn record_effect(&mut self, effect: AppliedEffect) {
        self.effects.push(effect);
    }

    /// Record the player response. A second response is rejected.
    pub fn set_response(&mut self, response: impl Into<String>) -> Result<(), WorldEventError> {
        if self.player_response.is_some() {
            return Err(WorldEventError::ResponseAlreadySet);
        }
        if !self.is_active {
            return Err(WorldEventError::AlreadyResolved);
        }
        self.player_response = Some(response.into());
        Ok(())
    }

    /// Set the terminal outcome and deactivate the event.
    ///
    /// Returns true only on the first call — the guard the engine uses to
    /// make resolution exactly-once.
    pub fn finalize(&mut self, outcome: EventOutcome) -> bool {
        if !self.is_active {
            return false;
        }
        debug_assert!(outcome.is_terminal(), "finalize requires a terminal outcome");
        self.outcome = Some(outcome);
        self.is_active = false;
        true
    }

    pub fn effects_reverted(&self) -> bool {
        self.effects_reverted
    }

    /// Mark the effects as reverted. Returns true only on the first call —
    /// the guard that makes cleanup idempotent.
    pub fn mark_effects_reverted(&mut self) -> bool {
        if self.effects_reverted {
            return false;
        }
        self.effects_reverted = true;
        true
    }
}
