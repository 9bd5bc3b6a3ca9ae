//! Bargain
//!
//! Two autonomous parties, a buyer and a seller, negotiate the price of a
//! single product over one TCP connection. This library provides:
//! - A noise-tolerant codec for negotiation records
//! - The round-bounded session state machine shared by both sides
//! - Deterministic buyer and seller fallback policies
//! - An async engine with an optional, time-bounded reasoning adapter

pub mod cli;
pub mod config;
pub mod error;
pub mod negotiation;
pub mod reasoning;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use config::NegotiationConfig;
pub use error::{BargainError, Result};
pub use negotiation::{
    Action, ActionKind, BuyerPolicy, DecisionPolicy, NegotiationContext, NegotiationSession,
    Negotiator, SellerPolicy, SessionHandle, SessionOutcome, SessionReport, SessionState,
};
pub use reasoning::ReasoningAdapter;
pub use transport::{ActionCodec, WireRecord};
pub use types::{format_price, Product, Role};
