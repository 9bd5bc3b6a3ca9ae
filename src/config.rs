//! Session parameters
//!
//! Every tunable of a negotiation lives here and is passed into session
//! construction. Values load from a TOML file, then environment overrides,
//! then command-line flags.

use crate::error::{BargainError, Result};
use crate::types::Product;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding the Ollama base URL
pub const ENV_OLLAMA_URL: &str = "BARGAIN_OLLAMA_URL";
/// Environment variable overriding the Ollama model
pub const ENV_OLLAMA_MODEL: &str = "BARGAIN_OLLAMA_MODEL";

/// Root configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NegotiationConfig {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub product: Product,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub buyer: BuyerConfig,

    #[serde(default)]
    pub seller: SellerConfig,

    #[serde(default)]
    pub reasoning: ReasoningConfig,
}

/// Where the seller listens and the buyer connects
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl NetworkConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Round bounds and timeouts shared by both sides
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Received messages allowed before the session gives up
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Rounds that must pass before this side agrees to a price
    #[serde(default = "default_min_exchanges")]
    pub min_exchanges: u32,

    #[serde(default = "default_receive_timeout_ms")]
    pub receive_timeout_ms: u64,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl SessionConfig {
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            min_exchanges: default_min_exchanges(),
            receive_timeout_ms: default_receive_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// Buyer fallback policy tunables
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuyerConfig {
    /// Highest price the buyer will pay
    #[serde(default = "default_budget")]
    pub budget: u64,

    /// Offers above `budget * reject_ratio` end the negotiation
    #[serde(default = "default_reject_ratio")]
    pub reject_ratio: f64,

    /// First counter anchors at `base_market_price * anchor_ratio`
    #[serde(default = "default_anchor_ratio")]
    pub anchor_ratio: f64,

    /// Growth applied to the previous counter
    #[serde(default = "default_step_ratio")]
    pub step_ratio: f64,

    /// Counters never go below `budget * budget_floor_ratio`
    #[serde(default = "default_budget_floor_ratio")]
    pub budget_floor_ratio: f64,
}

impl Default for BuyerConfig {
    fn default() -> Self {
        Self {
            budget: default_budget(),
            reject_ratio: default_reject_ratio(),
            anchor_ratio: default_anchor_ratio(),
            step_ratio: default_step_ratio(),
            budget_floor_ratio: default_budget_floor_ratio(),
        }
    }
}

/// A concession multiplier that applies from `from_round` onward
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConcessionStep {
    pub from_round: u32,
    pub multiplier: f64,
}

/// Seller fallback policy tunables
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SellerConfig {
    /// Lowest price the seller will take
    #[serde(default = "default_floor")]
    pub floor: u64,

    /// Opening ask is `base_market_price * opening_markup`
    #[serde(default = "default_opening_markup")]
    pub opening_markup: f64,

    /// Offers at or above `floor * accept_ratio` are accepted outright
    #[serde(default = "default_accept_ratio")]
    pub accept_ratio: f64,

    /// Multiplier used before any concession step applies
    #[serde(default = "default_base_concession")]
    pub base_concession: f64,

    #[serde(default = "default_concessions")]
    pub concessions: Vec<ConcessionStep>,
}

impl SellerConfig {
    /// Multiplier for the given round: the latest step already reached wins
    pub fn concession_for(&self, round: u32) -> f64 {
        self.concessions
            .iter()
            .filter(|step| round >= step.from_round)
            .max_by_key(|step| step.from_round)
            .map(|step| step.multiplier)
            .unwrap_or(self.base_concession)
    }
}

impl Default for SellerConfig {
    fn default() -> Self {
        Self {
            floor: default_floor(),
            opening_markup: default_opening_markup(),
            accept_ratio: default_accept_ratio(),
            base_concession: default_base_concession(),
            concessions: default_concessions(),
        }
    }
}

/// External reasoning service settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReasoningConfig {
    /// Consult the model before falling back to the rule-based policy
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    #[serde(default = "default_ollama_model")]
    pub model: String,

    #[serde(default = "default_adapter_timeout_ms")]
    pub timeout_ms: u64,
}

impl ReasoningConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_ollama_url(),
            model: default_ollama_model(),
            timeout_ms: default_adapter_timeout_ms(),
        }
    }
}

impl NegotiationConfig {
    /// Load from a TOML file, apply environment overrides and validate
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BargainError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from a file when given, otherwise start from defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENV_OLLAMA_URL) {
            self.reasoning.base_url = url;
        }
        if let Ok(model) = std::env::var(ENV_OLLAMA_MODEL) {
            self.reasoning.model = model;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.product.base_market_price == 0 {
            return Err(BargainError::InvalidConfig(
                "product.base_market_price must be positive".to_string(),
            ));
        }
        if self.session.max_rounds == 0 {
            return Err(BargainError::InvalidConfig(
                "session.max_rounds must be at least 1".to_string(),
            ));
        }
        if self.session.min_exchanges > self.session.max_rounds {
            return Err(BargainError::InvalidConfig(format!(
                "session.min_exchanges ({}) exceeds session.max_rounds ({})",
                self.session.min_exchanges, self.session.max_rounds
            )));
        }
        if self.session.receive_timeout_ms == 0 || self.session.connect_timeout_ms == 0 {
            return Err(BargainError::InvalidConfig(
                "session timeouts must be positive".to_string(),
            ));
        }
        if self.buyer.budget == 0 {
            return Err(BargainError::InvalidConfig(
                "buyer.budget must be positive".to_string(),
            ));
        }
        if self.seller.floor == 0 {
            return Err(BargainError::InvalidConfig(
                "seller.floor must be positive".to_string(),
            ));
        }

        let ratios = [
            ("buyer.reject_ratio", self.buyer.reject_ratio),
            ("buyer.anchor_ratio", self.buyer.anchor_ratio),
            ("buyer.step_ratio", self.buyer.step_ratio),
            ("buyer.budget_floor_ratio", self.buyer.budget_floor_ratio),
            ("seller.opening_markup", self.seller.opening_markup),
            ("seller.accept_ratio", self.seller.accept_ratio),
            ("seller.base_concession", self.seller.base_concession),
        ];
        for (name, value) in ratios {
            if !value.is_finite() || value <= 0.0 {
                return Err(BargainError::InvalidConfig(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if self.buyer.budget_floor_ratio > 1.0 {
            return Err(BargainError::InvalidConfig(
                "buyer.budget_floor_ratio cannot exceed 1.0".to_string(),
            ));
        }
        if let Some(step) = self
            .seller
            .concessions
            .iter()
            .find(|step| !step.multiplier.is_finite() || step.multiplier <= 0.0)
        {
            return Err(BargainError::InvalidConfig(format!(
                "seller concession from round {} has invalid multiplier {}",
                step.from_round, step.multiplier
            )));
        }
        if self.reasoning.enabled && self.reasoning.timeout_ms == 0 {
            return Err(BargainError::InvalidConfig(
                "reasoning.timeout_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    65432
}

fn default_max_rounds() -> u32 {
    10
}

fn default_min_exchanges() -> u32 {
    3
}

fn default_receive_timeout_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_budget() -> u64 {
    200_000
}

fn default_reject_ratio() -> f64 {
    1.5
}

fn default_anchor_ratio() -> f64 {
    0.65
}

fn default_step_ratio() -> f64 {
    1.07
}

fn default_budget_floor_ratio() -> f64 {
    0.8
}

fn default_floor() -> u64 {
    144_000
}

fn default_opening_markup() -> f64 {
    1.4
}

fn default_accept_ratio() -> f64 {
    1.1
}

fn default_base_concession() -> f64 {
    1.18
}

fn default_concessions() -> Vec<ConcessionStep> {
    vec![
        ConcessionStep {
            from_round: 6,
            multiplier: 1.12,
        },
        ConcessionStep {
            from_round: 8,
            multiplier: 1.05,
        },
    ]
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2".to_string()
}

fn default_adapter_timeout_ms() -> u64 {
    60_000
}
