//! Bargain application wiring configuration, transport and negotiators

use std::sync::Arc;

use crate::config::NegotiationConfig;
use crate::error::{BargainError, Result};
use crate::negotiation::{Negotiator, SessionHandle, SessionReport};
use crate::reasoning::{OllamaAdapter, OllamaConfig, ReasoningAdapter};
use crate::transport;
use crate::types::{format_price, Role};

/// Main Bargain application
#[derive(Clone, Debug)]
pub struct BargainApp {
    config: NegotiationConfig,
}

impl BargainApp {
    pub fn new(config: NegotiationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NegotiationConfig {
        &self.config
    }

    /// Listen on the configured address and negotiate with the first buyer
    pub async fn run_seller(&self) -> Result<SessionReport> {
        let listener = transport::listen(&self.config.network.address()).await?;
        let stream =
            transport::accept_one(&listener, self.config.session.receive_timeout()).await?;

        self.negotiator(Role::Seller)?.run(stream).await
    }

    /// Connect to `addr`, or the configured address, and negotiate as buyer
    pub async fn run_buyer(&self, addr: Option<&str>) -> Result<SessionReport> {
        let addr = addr
            .map(str::to_string)
            .unwrap_or_else(|| self.config.network.address());
        let stream = transport::connect(&addr, self.config.session.connect_timeout()).await?;

        self.negotiator(Role::Buyer)?.run(stream).await
    }

    /// Both sides in one process, each on its own task
    pub async fn run_demo(&self) -> Result<(SessionReport, SessionReport)> {
        let listener = transport::listen(&self.config.network.address()).await?;
        let addr = listener
            .local_addr()
            .map_err(|e| BargainError::NetworkConnection(e.to_string()))?
            .to_string();

        let buyer_stream =
            transport::connect(&addr, self.config.session.connect_timeout()).await?;
        let seller_stream =
            transport::accept_one(&listener, self.config.session.connect_timeout()).await?;

        let seller = self.negotiator(Role::Seller)?;
        let buyer = self.negotiator(Role::Buyer)?;
        let seller = SessionHandle::spawn(seller, seller_stream);
        let buyer = SessionHandle::spawn(buyer, buyer_stream);

        let (seller_report, buyer_report) = tokio::join!(seller.outcome(), buyer.outcome());
        Ok((seller_report?, buyer_report?))
    }

    fn negotiator(&self, role: Role) -> Result<Negotiator> {
        let negotiator = match role {
            Role::Seller => Negotiator::seller(&self.config)?,
            Role::Buyer => Negotiator::buyer(&self.config),
        };

        Ok(match self.adapter() {
            Some(adapter) => {
                tracing::info!(
                    %role,
                    adapter = adapter.name(),
                    model = %self.config.reasoning.model,
                    "Reasoning adapter enabled"
                );
                negotiator.with_adapter(adapter)
            }
            None => negotiator,
        })
    }

    fn adapter(&self) -> Option<Arc<dyn ReasoningAdapter>> {
        if !self.config.reasoning.enabled {
            return None;
        }
        let adapter = OllamaAdapter::new(OllamaConfig::from(&self.config.reasoning));
        Some(Arc::new(adapter))
    }
}

/// Human-readable summary of one side's session
pub fn summarize(report: &SessionReport) -> String {
    let mut lines = vec![format!(
        "{} finished after {} round(s): {}",
        report.role, report.rounds, report.outcome
    )];

    if let Some(price) = report.outcome.agreed_price() {
        lines.push(format!("  agreed price: {}", format_price(price)));
    }

    if let Some(context) = &report.context {
        for entry in context.transcript() {
            lines.push(format!("  {:>6}: {}", entry.speaker.as_str(), entry.text));
        }
    }

    lines.join("\n")
}
