//! Deterministic decision policies
//!
//! Each side falls back to one of these whenever no reasoning adapter is
//! configured, or the adapter fails or times out.

use crate::config::{BuyerConfig, SellerConfig};
use crate::types::{format_price, scale, Product};

use super::context::NegotiationContext;
use super::types::Action;

/// Computes this side's next move from the session history
pub trait DecisionPolicy: Send {
    /// Decide how to answer the counterpart's latest priced message
    fn decide(&mut self, context: &NegotiationContext, offer: u64, message: &str) -> Action;

    /// Observe a move that was produced elsewhere (e.g. by a reasoning adapter)
    fn observe(&mut self, _action: &Action) {}
}

/// Seller fallback: accept generous offers, otherwise concede toward the floor
#[derive(Clone, Debug)]
pub struct SellerPolicy {
    config: SellerConfig,
    product_name: String,
    quality_grade: String,
    asking_price: u64,
}

impl SellerPolicy {
    pub fn new(config: SellerConfig, product: &Product) -> Self {
        let asking_price = product.price_at(config.opening_markup).max(config.floor);
        Self {
            config,
            product_name: product.name.clone(),
            quality_grade: product.quality_grade.clone(),
            asking_price,
        }
    }

    pub fn floor(&self) -> u64 {
        self.config.floor
    }

    /// Current listed price
    pub fn asking_price(&self) -> u64 {
        self.asking_price
    }

    /// The opening offer that seeds the buyer's first round
    pub fn opening_offer(&self) -> Action {
        Action::offer(
            self.asking_price,
            format!(
                "Welcome! I have premium {} grade {}. My asking price is {}. \
                 These are high-quality products worth every rupee.",
                self.quality_grade,
                self.product_name,
                format_price(self.asking_price)
            ),
        )
    }

    /// Offers at or above this are accepted outright
    pub fn accept_threshold(&self) -> u64 {
        scale(self.config.floor, self.config.accept_ratio)
    }
}

impl DecisionPolicy for SellerPolicy {
    fn decide(&mut self, context: &NegotiationContext, offer: u64, _message: &str) -> Action {
        if offer >= self.accept_threshold() {
            return Action::accept(
                offer,
                format!(
                    "Excellent. I accept your offer of {}. Pleasure doing business.",
                    format_price(offer)
                ),
            );
        }

        if offer == 0 {
            return Action::counter(
                self.asking_price,
                format!(
                    "My asking price remains {}. These are premium {} grade {}.",
                    format_price(self.asking_price),
                    self.quality_grade,
                    self.product_name
                ),
            );
        }

        let round = context.round();
        let multiplier = self.config.concession_for(round);
        let price = scale(offer, multiplier).max(self.config.floor);

        let message = if multiplier < self.config.base_concession
            && self
                .config
                .concessions
                .iter()
                .all(|step| multiplier <= step.multiplier)
        {
            format!(
                "This is my final offer: {}. Take it or leave it.",
                format_price(price)
            )
        } else if multiplier < self.config.base_concession {
            format!(
                "I'm coming down to {}. That's really pushing my limits.",
                format_price(price)
            )
        } else {
            format!(
                "I appreciate your interest; I can come down to {}. Quality costs money.",
                format_price(price)
            )
        };

        self.asking_price = price;
        Action::counter(price, message)
    }

    fn observe(&mut self, action: &Action) {
        if let Action::Counter { price, .. } = action {
            self.asking_price = (*price).max(self.config.floor);
        }
    }
}

/// Buyer fallback: accept within budget, walk away from outrageous asks,
/// otherwise escalate from the previous counter
#[derive(Clone, Debug)]
pub struct BuyerPolicy {
    config: BuyerConfig,
}

impl BuyerPolicy {
    pub fn new(config: BuyerConfig) -> Self {
        Self { config }
    }

    pub fn budget(&self) -> u64 {
        self.config.budget
    }

    /// Asks above this are rejected outright
    pub fn reject_threshold(&self) -> u64 {
        scale(self.config.budget, self.config.reject_ratio)
    }

    /// Lowest counter the buyer will make once engaged
    pub fn counter_floor(&self) -> u64 {
        scale(self.config.budget, self.config.budget_floor_ratio)
    }
}

impl DecisionPolicy for BuyerPolicy {
    fn decide(&mut self, context: &NegotiationContext, offer: u64, _message: &str) -> Action {
        let budget = self.config.budget;

        if offer <= budget {
            return Action::accept(offer, "That works for me. Deal accepted.");
        }

        if offer > self.reject_threshold() {
            return Action::reject("Too expensive, I cannot proceed.");
        }

        let last = context
            .last_own_offer()
            .unwrap_or_else(|| context.product().price_at(self.config.anchor_ratio));
        let price = scale(last, self.config.step_ratio)
            .max(self.counter_floor())
            .min(budget);

        Action::counter(price, format!("I can offer {}.", format_price(price)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiation::types::ActionKind;
    use crate::types::Role;
    use std::sync::Arc;

    fn seller() -> (SellerPolicy, NegotiationContext) {
        let product = Arc::new(Product::default());
        let policy = SellerPolicy::new(SellerConfig::default(), &product);
        let ctx = NegotiationContext::new(Role::Seller, product, 144_000);
        (policy, ctx)
    }

    fn buyer() -> (BuyerPolicy, NegotiationContext) {
        let product = Arc::new(Product::default());
        let policy = BuyerPolicy::new(BuyerConfig::default());
        let ctx = NegotiationContext::new(Role::Buyer, product, 200_000);
        (policy, ctx)
    }

    fn advance(ctx: &mut NegotiationContext, rounds: u32, price: u64) {
        for _ in 0..rounds {
            ctx.record_counterpart(&Action::counter(price, "")).unwrap();
        }
    }

    #[test]
    fn test_seller_opening_offer() {
        let (policy, _) = seller();
        let opening = policy.opening_offer();
        assert_eq!(opening.kind(), ActionKind::Offer);
        assert_eq!(opening.price(), Some(252_000));
        assert!(opening.message().contains("Alphonso Mangoes"));
    }

    #[test]
    fn test_seller_counters_below_threshold() {
        // floor 144000 -> threshold 158400; 150000 falls short
        let (mut policy, mut ctx) = seller();
        advance(&mut ctx, 1, 150_000);

        let action = policy.decide(&ctx, 150_000, "how about this");

        assert_eq!(action.kind(), ActionKind::Counter);
        assert_eq!(action.price(), Some(177_000));
        assert_eq!(policy.asking_price(), 177_000);
    }

    #[test]
    fn test_seller_accepts_generous_offer() {
        let (mut policy, mut ctx) = seller();
        advance(&mut ctx, 1, 170_000);

        let action = policy.decide(&ctx, 170_000, "final");

        assert_eq!(action, Action::accept(170_000, action.message().to_string()));
    }

    #[test]
    fn test_seller_accepts_exactly_at_threshold() {
        let (mut policy, mut ctx) = seller();
        advance(&mut ctx, 1, 158_400);

        assert_eq!(policy.decide(&ctx, 158_400, "").kind(), ActionKind::Accept);
        assert_eq!(policy.decide(&ctx, 158_399, "").kind(), ActionKind::Counter);
    }

    #[test]
    fn test_seller_repeats_ask_on_zero_offer() {
        let (mut policy, mut ctx) = seller();
        advance(&mut ctx, 1, 0);

        let action = policy.decide(&ctx, 0, "");

        assert_eq!(action.kind(), ActionKind::Counter);
        assert_eq!(action.price(), Some(252_000));
        assert_eq!(policy.asking_price(), 252_000);
    }

    #[test]
    fn test_seller_concessions_shrink_with_rounds() {
        let offer = 130_000;
        let mut prices = Vec::new();
        for rounds in [1, 6, 8] {
            let (mut policy, mut ctx) = seller();
            advance(&mut ctx, rounds, offer);
            prices.push(policy.decide(&ctx, offer, "").price().unwrap());
        }

        // 130000 * 1.18, * 1.12, * 1.05 clamped to the floor
        assert_eq!(prices, vec![153_400, 145_600, 144_000]);
        assert!(prices.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_seller_never_counters_below_floor() {
        let (mut policy, mut ctx) = seller();
        for round in 1..=10u32 {
            let offer = 1_000 * round as u64;
            ctx.record_counterpart(&Action::counter(offer, "")).unwrap();
            let action = policy.decide(&ctx, offer, "");
            assert!(action.price().unwrap() >= 144_000);
        }
    }

    #[test]
    fn test_seller_final_offer_wording() {
        let (mut policy, mut ctx) = seller();
        advance(&mut ctx, 8, 150_000);
        let action = policy.decide(&ctx, 150_000, "");
        assert!(action.message().starts_with("This is my final offer"));

        let (mut policy, mut ctx) = seller();
        advance(&mut ctx, 6, 150_000);
        let action = policy.decide(&ctx, 150_000, "");
        assert!(action.message().starts_with("I'm coming down to"));
    }

    #[test]
    fn test_seller_observes_adapter_counters() {
        let (mut policy, _) = seller();
        policy.observe(&Action::counter(200_000, "from the model"));
        assert_eq!(policy.asking_price(), 200_000);

        policy.observe(&Action::counter(10, "too low"));
        assert_eq!(policy.asking_price(), 144_000);

        policy.observe(&Action::accept(300_000, "ignored"));
        assert_eq!(policy.asking_price(), 144_000);
    }

    #[test]
    fn test_buyer_accepts_within_budget() {
        let (mut policy, mut ctx) = buyer();
        advance(&mut ctx, 1, 195_000);

        let action = policy.decide(&ctx, 195_000, "");
        assert_eq!(action.kind(), ActionKind::Accept);
        assert_eq!(action.price(), Some(195_000));
    }

    #[test]
    fn test_buyer_rejects_outrageous_ask() {
        // 320000 > 200000 * 1.5
        let (mut policy, mut ctx) = buyer();
        advance(&mut ctx, 1, 320_000);

        let action = policy.decide(&ctx, 320_000, "premium!");
        assert_eq!(action.kind(), ActionKind::Reject);
        assert_eq!(action.price(), None);
    }

    #[test]
    fn test_buyer_boundary_at_reject_threshold() {
        let (mut policy, mut ctx) = buyer();
        advance(&mut ctx, 1, 300_000);
        assert_eq!(policy.decide(&ctx, 300_000, "").kind(), ActionKind::Counter);
        assert_eq!(policy.decide(&ctx, 300_001, "").kind(), ActionKind::Reject);
    }

    #[test]
    fn test_buyer_first_counter_uses_budget_floor() {
        // anchor 180000 * 0.65 = 117000, * 1.07 = 125190 < 160000
        let (mut policy, mut ctx) = buyer();
        advance(&mut ctx, 1, 252_000);

        let action = policy.decide(&ctx, 252_000, "");
        assert_eq!(action.kind(), ActionKind::Counter);
        assert_eq!(action.price(), Some(160_000));
    }

    #[test]
    fn test_buyer_escalates_from_last_counter() {
        let (mut policy, mut ctx) = buyer();
        advance(&mut ctx, 1, 252_000);
        ctx.record_own(&Action::counter(170_000, "")).unwrap();
        advance(&mut ctx, 1, 240_000);

        let action = policy.decide(&ctx, 240_000, "");
        assert_eq!(action.price(), Some(181_900));
    }

    #[test]
    fn test_buyer_counter_never_exceeds_budget() {
        let (mut policy, mut ctx) = buyer();
        advance(&mut ctx, 1, 252_000);
        ctx.record_own(&Action::counter(195_000, "")).unwrap();
        advance(&mut ctx, 1, 250_000);

        let action = policy.decide(&ctx, 250_000, "");
        assert_eq!(action.price(), Some(200_000));
    }

    #[test]
    fn test_buyer_counter_respects_budget_floor() {
        let (mut policy, mut ctx) = buyer();
        for offer in [290_000u64, 280_000, 260_000, 240_000, 220_000] {
            ctx.record_counterpart(&Action::counter(offer, "")).unwrap();
            let action = policy.decide(&ctx, offer, "");
            let price = action.price().unwrap();
            assert!(price >= policy.counter_floor());
            ctx.record_own(&action).unwrap();
        }
    }
}
