//! Per-side record of one negotiation's history

use crate::error::{BargainError, Result};
use crate::types::{Product, Role};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::types::Action;

/// A line of the negotiation transcript
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Role,
    pub text: String,
}

/// One side's view of a session. Never shared between buyer and seller.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NegotiationContext {
    role: Role,
    product: Arc<Product>,
    /// Buyer budget or seller floor
    limit: u64,
    round: u32,
    counterpart_offers: Vec<u64>,
    own_offers: Vec<u64>,
    transcript: Vec<TranscriptEntry>,
    frozen: bool,
}

impl NegotiationContext {
    pub fn new(role: Role, product: Arc<Product>, limit: u64) -> Self {
        Self {
            role,
            product,
            limit,
            round: 0,
            counterpart_offers: Vec::new(),
            own_offers: Vec::new(),
            transcript: Vec::new(),
            frozen: false,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    /// Buyer's maximum or seller's minimum acceptable price
    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn counterpart_offers(&self) -> &[u64] {
        &self.counterpart_offers
    }

    pub fn own_offers(&self) -> &[u64] {
        &self.own_offers
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn last_own_offer(&self) -> Option<u64> {
        self.own_offers.last().copied()
    }

    /// Record a message from the counterpart and advance the round.
    /// Rejects carry no price and add nothing to the offer history.
    pub fn record_counterpart(&mut self, action: &Action) -> Result<u32> {
        self.ensure_open()?;

        self.round += 1;
        if let Some(price) = action.price() {
            self.counterpart_offers.push(price);
        }
        self.transcript.push(TranscriptEntry {
            speaker: self.role.counterpart(),
            text: action.message().to_string(),
        });

        Ok(self.round)
    }

    /// Record this side's outgoing move. Terminal moves freeze the context.
    pub fn record_own(&mut self, action: &Action) -> Result<()> {
        self.ensure_open()?;

        if let Action::Counter { price, .. } = action {
            self.own_offers.push(*price);
        }
        self.push_own_line(action.message());

        if action.is_terminal() {
            self.freeze();
        }
        Ok(())
    }

    /// Note this side's words without touching the offer history
    pub fn push_own_line(&mut self, text: &str) {
        if !self.frozen {
            self.transcript.push(TranscriptEntry {
                speaker: self.role,
                text: text.to_string(),
            });
        }
    }

    /// No further appends after this
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    fn ensure_open(&self) -> Result<()> {
        if self.frozen {
            return Err(BargainError::ProtocolViolation(
                "Negotiation context is frozen".to_string(),
            ));
        }
        Ok(())
    }
}
