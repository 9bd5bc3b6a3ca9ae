//! Negotiation module: session state machine, fallback policies and the
//! async engine that drives them

pub mod context;
pub mod engine;
pub mod policy;
pub mod session;
pub mod types;

pub use context::{NegotiationContext, TranscriptEntry};
pub use engine::{Negotiator, SessionHandle, SessionReport};
pub use policy::{BuyerPolicy, DecisionPolicy, SellerPolicy};
pub use session::{NegotiationSession, RoundLimits, Step};
pub use types::{Action, ActionKind, SessionOutcome, SessionState};
