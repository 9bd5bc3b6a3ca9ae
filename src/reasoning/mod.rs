//! External reasoning
//!
//! A [`ReasoningAdapter`] may propose this side's next move. Its output is
//! never trusted as-is: [`sanitize`] validates it against the side's hard
//! limit before the session sees it, and any failure falls back to the
//! deterministic policy.

pub mod ollama;
pub mod prompt;

use async_trait::async_trait;

use crate::error::{BargainError, Result};
use crate::negotiation::{Action, NegotiationContext};
use crate::types::Role;

pub use ollama::{OllamaAdapter, OllamaConfig};

/// Optional collaborator that proposes an action for one decision point
#[async_trait]
pub trait ReasoningAdapter: Send + Sync {
    /// Adapter name for logs
    fn name(&self) -> &str;

    /// Propose the next action given the history and the counterpart's latest message
    async fn propose(
        &self,
        context: &NegotiationContext,
        offer: u64,
        message: &str,
    ) -> Result<Action>;
}

/// Check a proposed action against the side's hard limit.
///
/// An accept always names the counterpart's offer.
/// Seller: counters are raised to the floor, and accepting an offer below the
/// floor becomes a counter at the floor.
/// Buyer: counters are capped at the budget and accepting an offer above the
/// budget is refused.
pub fn sanitize(context: &NegotiationContext, offer: u64, proposed: Action) -> Result<Action> {
    let limit = context.limit();

    match (context.role(), proposed) {
        (_, Action::Confirm { .. }) => Err(BargainError::AdapterFailure(
            "adapter may not confirm a deal".to_string(),
        )),
        (_, reject @ Action::Reject { .. }) => Ok(reject),

        (Role::Seller, Action::Offer { price, message })
        | (Role::Seller, Action::Counter { price, message }) => {
            Ok(Action::counter(price.max(limit), message))
        }
        (Role::Seller, Action::Accept { price, message }) => {
            if offer >= limit {
                Ok(Action::accept(offer, message))
            } else {
                Ok(Action::counter(price.max(limit), message))
            }
        }

        (Role::Buyer, Action::Offer { price, message })
        | (Role::Buyer, Action::Counter { price, message }) => {
            Ok(Action::counter(price.min(limit), message))
        }
        (Role::Buyer, Action::Accept { message, .. }) => {
            if offer > limit {
                return Err(BargainError::AdapterFailure(format!(
                    "accepting {} exceeds the budget of {}",
                    offer, limit
                )));
            }
            Ok(Action::accept(offer, message))
        }
    }
}
