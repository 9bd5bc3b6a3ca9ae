//! Negotiation session state machine
//!
//! Transport-free: the driver feeds it decoded actions and it answers with
//! the next [`Step`]. Decisions themselves come from outside.

use crate::config::SessionConfig;
use crate::error::{BargainError, Result};
use crate::types::{format_price, Product, Role};
use std::sync::Arc;

use super::context::NegotiationContext;
use super::types::{Action, SessionOutcome, SessionState};

/// Round bounds applied to one session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundLimits {
    pub max_rounds: u32,
    pub min_exchanges: u32,
}

impl Default for RoundLimits {
    fn default() -> Self {
        Self {
            max_rounds: 10,
            min_exchanges: 3,
        }
    }
}

impl From<&SessionConfig> for RoundLimits {
    fn from(config: &SessionConfig) -> Self {
        Self {
            max_rounds: config.max_rounds,
            min_exchanges: config.min_exchanges,
        }
    }
}

/// What the driver must do after a message is received
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Produce this side's answer to `offer` and pass it to
    /// [`NegotiationSession::respond`]
    Decide { offer: u64, message: String },
    /// The session is over. Send `reply` if present, then stop.
    Finished {
        outcome: SessionOutcome,
        reply: Option<Action>,
    },
}

/// One side of a negotiation between a buyer and a seller
#[derive(Clone, Debug)]
pub struct NegotiationSession {
    local_role: Role,
    product: Arc<Product>,
    /// Buyer budget or seller floor
    limit: u64,
    limits: RoundLimits,
    state: SessionState,
    context: Option<NegotiationContext>,
    outcome: Option<SessionOutcome>,
    /// Seller's opening, copied into the transcript once a context exists
    opening: Option<Action>,
    /// This side already sent an accept or reject and waits for the ack
    closing: Option<Action>,
    /// A `Step::Decide` was handed out and not answered yet
    pending_decision: bool,
}

impl NegotiationSession {
    /// Create a seller session by emitting its opening offer
    pub fn open_as_seller(
        product: Arc<Product>,
        floor: u64,
        limits: RoundLimits,
        opening: Action,
    ) -> Result<(Self, Action)> {
        if !matches!(opening, Action::Offer { .. }) {
            return Err(BargainError::ProtocolViolation(format!(
                "seller must open with an offer, not {}",
                opening.kind()
            )));
        }

        let session = Self {
            local_role: Role::Seller,
            product,
            limit: floor,
            limits,
            state: SessionState::AwaitingCounterpartReply,
            context: None,
            outcome: None,
            opening: Some(opening.clone()),
            closing: None,
            pending_decision: false,
        };
        Ok((session, opening))
    }

    /// Create a buyer session waiting for the seller's opening
    pub fn new_buyer(product: Arc<Product>, budget: u64, limits: RoundLimits) -> Self {
        Self {
            local_role: Role::Buyer,
            product,
            limit: budget,
            limits,
            state: SessionState::AwaitingOpening,
            context: None,
            outcome: None,
            opening: None,
            closing: None,
            pending_decision: false,
        }
    }

    /// Get local role
    pub fn role(&self) -> Role {
        self.local_role
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn limits(&self) -> RoundLimits {
        self.limits
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// History, once the first counterpart message has arrived
    pub fn context(&self) -> Option<&NegotiationContext> {
        self.context.as_ref()
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    pub fn round(&self) -> u32 {
        self.context.as_ref().map(|c| c.round()).unwrap_or(0)
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Process one message from the counterpart
    pub fn receive(&mut self, action: Action) -> Result<Step> {
        if self.state.is_terminal() {
            return Err(BargainError::ProtocolViolation(format!(
                "{} received after the session ended",
                action.kind()
            )));
        }
        if self.pending_decision {
            return Err(BargainError::ProtocolViolation(format!(
                "{} received while a decision is outstanding",
                action.kind()
            )));
        }
        if self.local_role == Role::Seller && matches!(action, Action::Offer { .. }) {
            return Err(BargainError::ProtocolViolation(
                "only the seller may send an opening offer".to_string(),
            ));
        }

        if let Some(own) = self.closing.clone() {
            return self.receive_acknowledgement(&own, action);
        }

        if self.round() + 1 > self.limits.max_rounds {
            tracing::info!(
                role = %self.local_role,
                max_rounds = self.limits.max_rounds,
                "Round limit reached, rejecting"
            );
            let reply = Action::reject(format!(
                "No agreement after {} rounds. Ending the negotiation.",
                self.limits.max_rounds
            ));
            return Ok(self.finish(SessionOutcome::RoundLimitExceeded, Some(reply)));
        }

        if let Action::Accept { price, .. } | Action::Confirm { price, .. } = &action {
            let standing = self.standing_offer();
            if standing != Some(*price) {
                return Err(BargainError::ProtocolViolation(format!(
                    "{} at {} does not match this side's standing offer {:?}",
                    action.kind(),
                    price,
                    standing
                )));
            }
        }

        if self.state == SessionState::AwaitingOpening {
            self.state = SessionState::AwaitingCounterpartReply;
        }

        let round = self.context_mut().record_counterpart(&action)?;
        tracing::debug!(role = %self.local_role, round, received = %action, "Message recorded");

        match action {
            Action::Accept { price, message } | Action::Confirm { price, message }
                if round < self.limits.min_exchanges =>
            {
                tracing::debug!(
                    role = %self.local_role,
                    round,
                    min_exchanges = self.limits.min_exchanges,
                    "Early agreement from counterpart, continuing"
                );
                self.pending_decision = true;
                Ok(Step::Decide {
                    offer: price,
                    message,
                })
            }
            Action::Accept { price, .. } => {
                let reply = Action::confirm(
                    price,
                    "Deal confirmed! Pleasure doing business with you.",
                );
                Ok(self.finish(SessionOutcome::DealConfirmed { price }, Some(reply)))
            }
            Action::Confirm { price, .. } => {
                Ok(self.finish(SessionOutcome::DealConfirmed { price }, None))
            }
            Action::Reject { message } => {
                let reply = Action::reject("Understood. If you change your mind, let me know.");
                Ok(self.finish(SessionOutcome::Rejected { reason: message }, Some(reply)))
            }
            Action::Offer { price, message } | Action::Counter { price, message } => {
                self.pending_decision = true;
                Ok(Step::Decide {
                    offer: price,
                    message,
                })
            }
        }
    }

    /// Record this side's decision and return the action to send.
    ///
    /// An accept before `min_exchanges` rounds have passed is held back as a
    /// counter at the same price.
    pub fn respond(&mut self, action: Action) -> Result<Action> {
        if !self.pending_decision {
            return Err(BargainError::ProtocolViolation(
                "no decision is outstanding".to_string(),
            ));
        }
        if matches!(action, Action::Offer { .. } | Action::Confirm { .. }) {
            return Err(BargainError::ProtocolViolation(format!(
                "{} is not a valid reply",
                action.kind()
            )));
        }

        let action = match action {
            Action::Accept { price, .. } if self.round() < self.limits.min_exchanges => {
                tracing::debug!(
                    role = %self.local_role,
                    round = self.round(),
                    min_exchanges = self.limits.min_exchanges,
                    "Holding back early agreement"
                );
                Action::counter(
                    price,
                    format!(
                        "We're close. Let's settle on {} and confirm the details.",
                        format_price(price)
                    ),
                )
            }
            other => other,
        };

        self.context_mut().record_own(&action)?;
        self.pending_decision = false;

        if action.is_terminal() {
            self.closing = Some(action.clone());
        }
        Ok(action)
    }

    /// The transport closed, failed or timed out
    pub fn disconnect(&mut self) -> SessionOutcome {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }
        self.finish(SessionOutcome::PeerDisconnected, None);
        SessionOutcome::PeerDisconnected
    }

    /// The counterpart answered our accept or reject
    fn receive_acknowledgement(&mut self, own: &Action, action: Action) -> Result<Step> {
        let outcome = match (own, &action) {
            (Action::Accept { price, .. }, Action::Confirm { .. } | Action::Accept { .. }) => {
                SessionOutcome::DealConfirmed { price: *price }
            }
            (Action::Accept { .. }, Action::Reject { message }) => SessionOutcome::Rejected {
                reason: message.clone(),
            },
            (Action::Reject { message }, _) => SessionOutcome::Rejected {
                reason: message.clone(),
            },
            _ => {
                return Err(BargainError::ProtocolViolation(format!(
                    "unexpected {} while waiting for acknowledgement of {}",
                    action.kind(),
                    own.kind()
                )))
            }
        };

        Ok(self.finish(outcome, None))
    }

    /// The last price this side put on the table: its latest counter, or the
    /// seller's opening
    fn standing_offer(&self) -> Option<u64> {
        self.context
            .as_ref()
            .and_then(|c| c.last_own_offer())
            .or_else(|| self.opening.as_ref().and_then(|o| o.price()))
    }

    fn finish(&mut self, outcome: SessionOutcome, reply: Option<Action>) -> Step {
        if let Some(context) = self.context.as_mut() {
            context.freeze();
        }
        self.state = SessionState::TerminalReached;
        self.pending_decision = false;
        self.outcome = Some(outcome.clone());
        tracing::info!(role = %self.local_role, round = self.round(), %outcome, "Session finished");
        Step::Finished { outcome, reply }
    }

    fn context_mut(&mut self) -> &mut NegotiationContext {
        let role = self.local_role;
        let product = &self.product;
        let limit = self.limit;
        let opening = &self.opening;
        self.context.get_or_insert_with(|| {
            let mut context = NegotiationContext::new(role, Arc::clone(product), limit);
            if let Some(opening) = opening {
                context.push_own_line(opening.message());
            }
            context
        })
    }
}
