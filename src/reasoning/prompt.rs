//! Prompt construction for generative reasoning backends

use crate::negotiation::NegotiationContext;
use crate::types::{format_price, Role};

/// Persona the buyer speaks with
pub const BUYER_PERSONA: &str = "I am a Market Analyst buyer. I always provide clear, \
professional reasoning, cite market benchmarks, and respect budget discipline. I speak in \
full sentences, offer constructive counter-offers, and adapt tone as negotiations progress.";

/// Persona the seller speaks with
pub const SELLER_PERSONA: &str = "I am a proud producer of premium goods. I stress quality, \
freshness and rarity, keep my messages brief, and never sell below my minimum price.";

const RESPONSE_FORMAT: &str = r#"Respond ONLY with JSON in this format:
{"kind": "accept" | "reject" | "counter", "price": <integer>, "message": "<short persuasive message>"}"#;

/// Build the prompt for one decision point
pub fn build(context: &NegotiationContext, offer: u64, message: &str) -> String {
    match context.role() {
        Role::Buyer => buyer_prompt(context, offer, message),
        Role::Seller => seller_prompt(context, offer, message),
    }
}

fn buyer_prompt(context: &NegotiationContext, offer: u64, message: &str) -> String {
    let product = context.product();
    let budget = format_price(context.limit());

    format!(
        "You are a BUYER negotiating for {name}.\n\n\
         Persona & Strategy:\n{persona}\n\n\
         Negotiation Context:\n\
         - Round: {round}\n\
         - Seller offer: {offer}\n\
         - Seller says: \"{message}\"\n\
         - Your budget: {budget}\n\
         - Market price: {market}\n\
         - Previous offers: {history}\n\n\
         Rules:\n\
         - Stay within budget (never exceed {budget}).\n\
         - Always negotiate realistically, consistent with persona.\n\
         - {format}\n",
        name = product.name,
        persona = BUYER_PERSONA,
        round = context.round(),
        offer = format_price(offer),
        message = message,
        budget = budget,
        market = format_price(product.base_market_price),
        history = price_list(context.own_offers()),
        format = RESPONSE_FORMAT,
    )
}

fn seller_prompt(context: &NegotiationContext, offer: u64, message: &str) -> String {
    let product = context.product();
    let floor = format_price(context.limit());
    let current = context
        .own_offers()
        .last()
        .map(|p| format_price(*p))
        .unwrap_or_else(|| "not yet countered".to_string());

    format!(
        "You are a SELLER negotiating for premium {name} (grade {grade}, {origin}).\n\n\
         Persona:\n{persona}\n\n\
         Context:\n\
         - Market price: {market}\n\
         - Your minimum acceptable price: {floor}\n\
         - Your last counter: {current}\n\
         - Buyer's last offer: {offer}\n\
         - Round number: {round}\n\n\
         Buyer said: \"{message}\"\n\n\
         Goal:\n\
         - Maximize selling price but do not go below {floor}.\n\
         - Use persuasive, brief language (quality, freshness, rarity).\n\
         - If the buyer's offer is at or above your minimum, consider accepting.\n\
         - Otherwise, propose a counter (never below {floor}).\n\n\
         {format}\n",
        name = product.name,
        grade = product.quality_grade,
        origin = product.origin,
        persona = SELLER_PERSONA,
        market = format_price(product.base_market_price),
        floor = floor,
        current = current,
        offer = format_price(offer),
        round = context.round(),
        message = message,
        format = RESPONSE_FORMAT,
    )
}

fn price_list(prices: &[u64]) -> String {
    if prices.is_empty() {
        return "none".to_string();
    }
    prices
        .iter()
        .map(|p| format_price(*p))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiation::Action;
    use crate::types::Product;
    use std::sync::Arc;

    #[test]
    fn test_buyer_prompt_mentions_budget_and_history() {
        let mut ctx = NegotiationContext::new(Role::Buyer, Arc::new(Product::default()), 200_000);
        ctx.record_counterpart(&Action::offer(252_000, "Welcome")).unwrap();
        ctx.record_own(&Action::counter(160_000, "")).unwrap();

        let prompt = build(&ctx, 240_000, "Best quality");

        assert!(prompt.contains("BUYER"));
        assert!(prompt.contains("₹200,000"));
        assert!(prompt.contains("₹240,000"));
        assert!(prompt.contains("₹160,000"));
        assert!(prompt.contains("Market Analyst"));
        assert!(prompt.contains("\"kind\""));
    }

    #[test]
    fn test_seller_prompt_mentions_floor() {
        let ctx = NegotiationContext::new(Role::Seller, Arc::new(Product::default()), 144_000);

        let prompt = build(&ctx, 150_000, "Is that your best?");

        assert!(prompt.contains("SELLER"));
        assert!(prompt.contains("₹144,000"));
        assert!(prompt.contains("Is that your best?"));
        assert!(prompt.contains("not yet countered"));
    }
}
