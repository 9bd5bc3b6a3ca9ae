//! Two-party demo: a seller and a buyer negotiating over local TCP
//!
//! 1. Both sides run the deterministic fallback policies and reach a deal
//! 2. A buyer with a small budget walks away from the opening offer
//!
//! Run with: cargo run --example two_party_demo

use bargain::cli::{summarize, BargainApp};
use bargain::{format_price, NegotiationConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info,bargain=debug")
        .init();

    println!("\n╔══════════════════════════════════════════════╗");
    println!("║   Bargain Two-Party Demo                     ║");
    println!("║   Seller and buyer over local TCP            ║");
    println!("╚══════════════════════════════════════════════╝\n");

    let mut config = NegotiationConfig::default();
    config.network.port = 0;

    let product = &config.product;
    println!(
        "📦 Product: {} {} (grade {}, {})",
        product.quantity, product.name, product.quality_grade, product.origin
    );
    println!("   Market price: {}", format_price(product.base_market_price));
    println!("   Seller floor: {}", format_price(config.seller.floor));
    println!("   Buyer budget: {}\n", format_price(config.buyer.budget));

    // =========================================================================
    // Scenario 1: Deal
    // =========================================================================
    println!("┌─────────────────────────────────────────────┐");
    println!("│ Scenario 1: Fallback policies reach a deal  │");
    println!("└─────────────────────────────────────────────┘");

    let (seller, buyer) = BargainApp::new(config.clone()).run_demo().await?;
    println!("{}\n", summarize(&seller));
    println!("{}\n", summarize(&buyer));

    // =========================================================================
    // Scenario 2: Walk away
    // =========================================================================
    println!("┌─────────────────────────────────────────────┐");
    println!("│ Scenario 2: Budget far below the asking     │");
    println!("└─────────────────────────────────────────────┘");

    config.buyer.budget = 120_000;
    println!("💸 Buyer budget lowered to {}", format_price(config.buyer.budget));

    let (seller, buyer) = BargainApp::new(config).run_demo().await?;
    println!("{}\n", summarize(&seller));
    println!("{}\n", summarize(&buyer));

    println!("✅ Demo complete");
    Ok(())
}
