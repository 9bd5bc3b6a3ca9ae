//! Negotiation types and state machine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of an [`Action`], as written in the `kind` field on the wire
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Offer,
    Counter,
    Accept,
    Reject,
    #[serde(rename = "deal_confirmed")]
    Confirm,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Offer => "offer",
            ActionKind::Counter => "counter",
            ActionKind::Accept => "accept",
            ActionKind::Reject => "reject",
            ActionKind::Confirm => "deal_confirmed",
        }
    }

    /// Parse a discriminant, normalizing anything unrecognized by prefix:
    /// `acc*` is an accept, `rej*` a reject, everything else a counter.
    pub fn normalize(raw: &str) -> Self {
        let lowered = raw.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "offer" => ActionKind::Offer,
            "counter" => ActionKind::Counter,
            "accept" => ActionKind::Accept,
            "reject" => ActionKind::Reject,
            "deal_confirmed" => ActionKind::Confirm,
            other if other.starts_with("acc") => ActionKind::Accept,
            other if other.starts_with("rej") => ActionKind::Reject,
            _ => ActionKind::Counter,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One negotiation move
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Opening price, sent by the seller only
    Offer { price: u64, message: String },
    Counter { price: u64, message: String },
    Accept { price: u64, message: String },
    /// Walk away. Carries no price.
    Reject { message: String },
    /// Acknowledges the counterpart's accept
    Confirm { price: u64, message: String },
}

impl Action {
    pub fn offer(price: u64, message: impl Into<String>) -> Self {
        Action::Offer {
            price,
            message: message.into(),
        }
    }

    pub fn counter(price: u64, message: impl Into<String>) -> Self {
        Action::Counter {
            price,
            message: message.into(),
        }
    }

    pub fn accept(price: u64, message: impl Into<String>) -> Self {
        Action::Accept {
            price,
            message: message.into(),
        }
    }

    pub fn reject(message: impl Into<String>) -> Self {
        Action::Reject {
            message: message.into(),
        }
    }

    pub fn confirm(price: u64, message: impl Into<String>) -> Self {
        Action::Confirm {
            price,
            message: message.into(),
        }
    }

    /// Build an action from its discriminant. `price` is dropped for rejects.
    pub fn from_parts(kind: ActionKind, price: u64, message: String) -> Self {
        match kind {
            ActionKind::Offer => Action::Offer { price, message },
            ActionKind::Counter => Action::Counter { price, message },
            ActionKind::Accept => Action::Accept { price, message },
            ActionKind::Reject => Action::Reject { message },
            ActionKind::Confirm => Action::Confirm { price, message },
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Offer { .. } => ActionKind::Offer,
            Action::Counter { .. } => ActionKind::Counter,
            Action::Accept { .. } => ActionKind::Accept,
            Action::Reject { .. } => ActionKind::Reject,
            Action::Confirm { .. } => ActionKind::Confirm,
        }
    }

    /// Offered price, or `None` for a reject
    pub fn price(&self) -> Option<u64> {
        match self {
            Action::Offer { price, .. }
            | Action::Counter { price, .. }
            | Action::Accept { price, .. }
            | Action::Confirm { price, .. } => Some(*price),
            Action::Reject { .. } => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Action::Offer { message, .. }
            | Action::Counter { message, .. }
            | Action::Accept { message, .. }
            | Action::Reject { message }
            | Action::Confirm { message, .. } => message,
        }
    }

    /// Accepts and rejects end the sender's side of the negotiation
    pub fn is_terminal(&self) -> bool {
        matches!(self, Action::Accept { .. } | Action::Reject { .. })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.price() {
            Some(price) => write!(f, "{} @ {}", self.kind(), price),
            None => write!(f, "{}", self.kind()),
        }
    }
}

/// Negotiation state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Buyer is waiting for the seller's opening offer
    AwaitingOpening,
    /// A message has been sent and the counterpart's reply is pending
    AwaitingCounterpartReply,
    /// Outcome recorded; absorbing
    TerminalReached,
}

impl SessionState {
    /// Check if negotiation is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::TerminalReached)
    }
}

/// How a session ended
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SessionOutcome {
    DealConfirmed { price: u64 },
    Rejected { reason: String },
    RoundLimitExceeded,
    PeerDisconnected,
}

impl SessionOutcome {
    pub fn is_deal(&self) -> bool {
        matches!(self, SessionOutcome::DealConfirmed { .. })
    }

    pub fn agreed_price(&self) -> Option<u64> {
        match self {
            SessionOutcome::DealConfirmed { price } => Some(*price),
            _ => None,
        }
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOutcome::DealConfirmed { price } => write!(f, "deal confirmed at {}", price),
            SessionOutcome::Rejected { reason } => write!(f, "rejected: {}", reason),
            SessionOutcome::RoundLimitExceeded => write!(f, "round limit exceeded"),
            SessionOutcome::PeerDisconnected => write!(f, "peer disconnected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_terminal() {
        assert!(SessionState::TerminalReached.is_terminal());
        assert!(!SessionState::AwaitingOpening.is_terminal());
        assert!(!SessionState::AwaitingCounterpartReply.is_terminal());
    }

    #[test]
    fn test_kind_normalization() {
        assert_eq!(ActionKind::normalize("counter"), ActionKind::Counter);
        assert_eq!(ActionKind::normalize(" Accept "), ActionKind::Accept);
        assert_eq!(ActionKind::normalize("accepted"), ActionKind::Accept);
        assert_eq!(ActionKind::normalize("REJECTING"), ActionKind::Reject);
        assert_eq!(ActionKind::normalize("deal_confirmed"), ActionKind::Confirm);
        assert_eq!(ActionKind::normalize("haggle"), ActionKind::Counter);
        assert_eq!(ActionKind::normalize(""), ActionKind::Counter);
    }

    #[test]
    fn test_reject_has_no_price() {
        let reject = Action::from_parts(ActionKind::Reject, 500, "no".to_string());
        assert_eq!(reject, Action::reject("no"));
        assert_eq!(reject.price(), None);
        assert!(reject.is_terminal());
    }

    #[test]
    fn test_action_accessors() {
        let counter = Action::counter(150_000, "ok");
        assert_eq!(counter.kind(), ActionKind::Counter);
        assert_eq!(counter.price(), Some(150_000));
        assert_eq!(counter.message(), "ok");
        assert!(!counter.is_terminal());
        assert_eq!(counter.to_string(), "counter @ 150000");
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = SessionOutcome::DealConfirmed { price: 160_000 };
        let serialized = serde_json::to_string(&outcome).unwrap();
        assert_eq!(serialized, r#"{"outcome":"deal_confirmed","price":160000}"#);

        let deserialized: SessionOutcome = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized.agreed_price(), Some(160_000));
    }
}
