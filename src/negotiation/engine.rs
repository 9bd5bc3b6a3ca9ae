//! Negotiation engine drives one side of a session over a framed transport

use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

use crate::config::NegotiationConfig;
use crate::error::{BargainError, Result};
use crate::reasoning::{self, ReasoningAdapter};
use crate::transport::{ActionCodec, WireRecord};
use crate::types::Role;

use super::context::NegotiationContext;
use super::policy::{BuyerPolicy, DecisionPolicy, SellerPolicy};
use super::session::{NegotiationSession, RoundLimits, Step};
use super::types::{Action, SessionOutcome};

/// Final record of one side's session
#[derive(Clone, Debug, Serialize)]
pub struct SessionReport {
    pub role: Role,
    pub outcome: SessionOutcome,
    pub rounds: u32,
    pub context: Option<NegotiationContext>,
}

/// Runs a [`NegotiationSession`] against a counterpart.
///
/// Each decision point consults the reasoning adapter at most once, bounded
/// by `adapter_timeout`, and falls back to the deterministic policy when the
/// adapter is absent, fails or times out.
pub struct Negotiator {
    session: NegotiationSession,
    policy: Box<dyn DecisionPolicy>,
    adapter: Option<Arc<dyn ReasoningAdapter>>,
    opening: Option<Action>,
    receive_timeout: Duration,
    adapter_timeout: Duration,
}

impl Negotiator {
    /// Seller side: prepares the opening offer sent as soon as the session runs
    pub fn seller(config: &NegotiationConfig) -> Result<Self> {
        let product = Arc::new(config.product.clone());
        let policy = SellerPolicy::new(config.seller.clone(), &product);
        let (session, opening) = NegotiationSession::open_as_seller(
            product,
            config.seller.floor,
            RoundLimits::from(&config.session),
            policy.opening_offer(),
        )?;

        Ok(Self {
            session,
            policy: Box::new(policy),
            adapter: None,
            opening: Some(opening),
            receive_timeout: config.session.receive_timeout(),
            adapter_timeout: config.reasoning.timeout(),
        })
    }

    /// Buyer side: waits for the seller's opening
    pub fn buyer(config: &NegotiationConfig) -> Self {
        let product = Arc::new(config.product.clone());
        let session = NegotiationSession::new_buyer(
            product,
            config.buyer.budget,
            RoundLimits::from(&config.session),
        );

        Self {
            session,
            policy: Box::new(BuyerPolicy::new(config.buyer.clone())),
            adapter: None,
            opening: None,
            receive_timeout: config.session.receive_timeout(),
            adapter_timeout: config.reasoning.timeout(),
        }
    }

    /// Consult an external reasoning adapter before the fallback policy
    pub fn with_adapter(mut self, adapter: Arc<dyn ReasoningAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    pub fn role(&self) -> Role {
        self.session.role()
    }

    pub fn session(&self) -> &NegotiationSession {
        &self.session
    }

    /// Run the session to its terminal state
    pub async fn run<T>(mut self, mut framed: Framed<T, ActionCodec>) -> Result<SessionReport>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let role = self.session.role();
        tracing::info!(%role, product = %self.session.product().name, "Negotiation started");

        if let Some(opening) = self.opening.take() {
            tracing::info!(%role, sent = %opening, "Sending opening offer");
            if let Err(e) = framed.send(WireRecord::new(&opening, 0)).await {
                tracing::warn!(%role, "Failed to send opening offer: {}", e);
                self.session.disconnect();
                return Ok(self.into_report());
            }
        }

        loop {
            let record = match next_record(&mut framed, self.receive_timeout).await {
                Ok(record) => record,
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(%role, "Discarding message: {}", e);
                    continue;
                }
                Err(e) if e.is_transport() => {
                    tracing::warn!(%role, "Ending session: {}", e);
                    self.session.disconnect();
                    break;
                }
                Err(e) => return Err(e),
            };

            tracing::debug!(%role, peer_round = record.round, kind = %record.kind, price = record.price, "Received");

            let step = match self.session.receive(record.into_action()) {
                Ok(step) => step,
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(%role, "Discarding message: {}", e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            match step {
                Step::Decide { offer, message } => {
                    let proposed = self.decide(offer, &message).await?;
                    let action = self.session.respond(proposed)?;
                    let round = self.session.round();
                    tracing::info!(%role, round, sent = %action, "Responding");

                    if let Err(e) = framed.send(WireRecord::new(&action, round)).await {
                        tracing::warn!(%role, "Failed to send: {}", e);
                        self.session.disconnect();
                        break;
                    }
                }
                Step::Finished { reply, .. } => {
                    if let Some(reply) = reply {
                        let round = self.session.round();
                        if let Err(e) = framed.send(WireRecord::new(&reply, round)).await {
                            tracing::debug!(%role, "Final reply not delivered: {}", e);
                        }
                    }
                    break;
                }
            }
        }

        Ok(self.into_report())
    }

    /// One decision point: adapter first, policy on any failure
    async fn decide(&mut self, offer: u64, message: &str) -> Result<Action> {
        let context = self.session.context().ok_or_else(|| {
            BargainError::Internal("decision requested before any message was recorded".into())
        })?;

        if let Some(adapter) = &self.adapter {
            let attempt =
                tokio::time::timeout(self.adapter_timeout, adapter.propose(context, offer, message))
                    .await;

            let proposed = match attempt {
                Ok(Ok(proposed)) => reasoning::sanitize(context, offer, proposed),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(BargainError::AdapterTimeout(
                    self.adapter_timeout.as_millis() as u64,
                )),
            };

            match proposed {
                Ok(action) => {
                    tracing::debug!(adapter = adapter.name(), proposed = %action, "Adapter decision");
                    self.policy.observe(&action);
                    return Ok(action);
                }
                Err(e) => {
                    tracing::warn!(
                        adapter = adapter.name(),
                        error = %e,
                        "Adapter unavailable, using fallback policy"
                    );
                }
            }
        }

        Ok(self.policy.decide(context, offer, message))
    }

    fn into_report(self) -> SessionReport {
        SessionReport {
            role: self.session.role(),
            outcome: self
                .session
                .outcome()
                .cloned()
                .unwrap_or(SessionOutcome::PeerDisconnected),
            rounds: self.session.round(),
            context: self.session.context().cloned(),
        }
    }
}

/// Wait for the next record. A silent or closed peer is a transport error.
async fn next_record<T>(framed: &mut Framed<T, ActionCodec>, wait: Duration) -> Result<WireRecord>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    match tokio::time::timeout(wait, framed.next()).await {
        Err(_) => Err(BargainError::PeerTimeout(format!(
            "no message within {}ms",
            wait.as_millis()
        ))),
        Ok(None) => Err(BargainError::CounterpartyDisconnected(
            "connection closed".to_string(),
        )),
        Ok(Some(Err(e))) => Err(e),
        Ok(Some(Ok(record))) => record,
    }
}

/// A negotiator running on its own task
pub struct SessionHandle {
    role: Role,
    task: JoinHandle<Result<SessionReport>>,
}

impl SessionHandle {
    pub fn spawn<T>(negotiator: Negotiator, framed: Framed<T, ActionCodec>) -> Self
    where
        T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let role = negotiator.role();
        let task = tokio::spawn(negotiator.run(framed));
        Self { role, task }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Wait for the session to end
    pub async fn outcome(self) -> Result<SessionReport> {
        let role = self.role;
        self.task
            .await
            .map_err(|e| BargainError::Internal(format!("{} session task failed: {}", role, e)))?
    }
}
