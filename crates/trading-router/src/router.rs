//! Trade routing: credential selection and concurrent broker dispatch.

use futures::stream::{FuturesUnordered, StreamExt};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use trading_broker::AdapterRegistry;
use trading_core::error::{BrokerError, PublishError};
use trading_core::traits::{publish_json, BrokerAdapter, EventPublisher, SecretStore};
use trading_core::{
    BrokerOrderRequest, BrokerResponse, CustomerCredential, GenericErrorEvent, Topic, TradeTrigger,
};

use crate::dedupe::DedupeLedger;
use crate::error::RouterError;
use crate::report::{DispatchOutcome, OutcomeRecord, RouteReport};
use crate::sizing::{resolve_size, validate_levels};

/// Router settings resolved at startup.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Name of the credential secret
    pub credentials_name: String,
    /// Upper bound on one broker dispatch
    pub dispatch_timeout: Duration,
    pub dedupe_redeliveries: bool,
    /// Reported as `originatingService` on error events
    pub service_name: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            credentials_name: "customer-broker-credentials".to_string(),
            dispatch_timeout: Duration::from_secs(30),
            dedupe_redeliveries: true,
            service_name: "trade-router".to_string(),
        }
    }
}

/// Routes trade triggers to every broker account of the trigger's customer.
///
/// One dispatch runs per matching credential. Dispatches run as separate
/// tasks; each publishes its own response as soon as it completes, so a slow
/// or failing broker never holds back the others.
pub struct TradeRouter {
    secrets: Arc<dyn SecretStore>,
    adapters: AdapterRegistry,
    publisher: Arc<dyn EventPublisher>,
    config: RouterConfig,
    ledger: Arc<DedupeLedger>,
}

/// Identity of a dispatch, kept outside the task so a panic can be reported.
struct Dispatch {
    account: String,
    broker: String,
    idempotency_key: String,
}

impl TradeRouter {
    pub fn new(
        secrets: Arc<dyn SecretStore>,
        adapters: AdapterRegistry,
        publisher: Arc<dyn EventPublisher>,
        config: RouterConfig,
    ) -> Self {
        Self {
            secrets,
            adapters,
            publisher,
            config,
            ledger: Arc::new(DedupeLedger::new()),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn ledger(&self) -> &DedupeLedger {
        &self.ledger
    }

    /// Route one trigger.
    ///
    /// Credential-store failures fail the whole call. Broker failures become
    /// failed responses in the report; publish failures are recorded per
    /// outcome (see [`RouteReport::into_result`]).
    pub async fn route(&self, trigger: &TradeTrigger) -> Result<RouteReport, RouterError> {
        trigger.validate().map_err(RouterError::InvalidTrigger)?;

        let trigger_key = trigger.key();
        let mut report = RouteReport::new(&trigger_key);

        let credentials = self.secrets.credentials(&self.config.credentials_name).await?;
        let matched: Vec<CustomerCredential> = credentials
            .into_iter()
            .filter(|c| c.account_name == trigger.account_name)
            .collect();

        if matched.is_empty() {
            warn!(
                account = %trigger.account_name,
                trigger = %trigger_key,
                "No credentials match trigger account, nothing to route"
            );
            report
                .warnings
                .push(format!("no credentials for account {}", trigger.account_name));
            return Ok(report);
        }

        info!(
            account = %trigger.account_name,
            instrument = %trigger.instrument,
            trigger = %trigger_key,
            dispatches = matched.len(),
            "Routing trigger"
        );

        let input_event = serde_json::to_string(trigger).unwrap_or_default();
        let mut pending = FuturesUnordered::new();

        for credential in matched {
            let (order, precheck) = prepare_order(trigger, &credential);

            if self.config.dedupe_redeliveries && !self.ledger.claim(&order.idempotency_key).await {
                info!(
                    account = %order.account_name,
                    broker = %order.broker,
                    key = %order.idempotency_key,
                    "Skipping redelivered dispatch"
                );
                report.skipped.push(order.idempotency_key);
                continue;
            }

            let dispatch = Dispatch {
                account: order.account_name.clone(),
                broker: order.broker.to_string(),
                idempotency_key: order.idempotency_key.clone(),
            };
            let adapter = self.adapters.get(&credential.broker);
            let publisher = Arc::clone(&self.publisher);
            let timeout = self.config.dispatch_timeout;

            let handle = tokio::spawn(async move {
                let response = dispatch_order(adapter, credential, order, precheck, timeout).await;
                let published = publish_json(&*publisher, Topic::TradeBrokerResponse, &response).await;
                (response, published)
            });
            pending.push(async move { (dispatch, handle.await) });
        }

        while let Some((dispatch, joined)) = pending.next().await {
            let record = match joined {
                Ok((response, published)) => {
                    self.settle(&response).await;
                    log_outcome(&response, &published);
                    OutcomeRecord {
                        account: dispatch.account,
                        broker: dispatch.broker,
                        outcome: DispatchOutcome::Responded(response),
                        published,
                    }
                }
                Err(join_error) => self.abort(dispatch, join_error, &input_event).await,
            };
            report.outcomes.push(record);
        }

        Ok(report)
    }

    /// Release the ledger key when the broker failure may clear on redelivery.
    ///
    /// Timeouts and network faults keep the key: the order may already be
    /// at the broker.
    async fn settle(&self, response: &BrokerResponse) {
        let retryable = response
            .error
            .as_ref()
            .is_some_and(|e| e.retryable && !e.is_ambiguous());
        if self.config.dedupe_redeliveries && retryable {
            self.ledger.release(&response.idempotency_key).await;
        }
    }

    async fn abort(
        &self,
        dispatch: Dispatch,
        join_error: tokio::task::JoinError,
        input_event: &str,
    ) -> OutcomeRecord {
        let description = if join_error.is_panic() {
            format!("{} adapter panicked during dispatch", dispatch.broker)
        } else {
            format!("{} dispatch was cancelled", dispatch.broker)
        };
        error!(
            account = %dispatch.account,
            broker = %dispatch.broker,
            error = %join_error,
            "Dispatch aborted"
        );

        if self.config.dedupe_redeliveries {
            self.ledger.release(&dispatch.idempotency_key).await;
        }

        let event = GenericErrorEvent::new(
            dispatch.account.clone(),
            self.config.service_name.clone(),
            input_event,
            description,
        );
        let published = publish_json(&*self.publisher, Topic::GenericErrorEvent, &event).await;
        if let Err(e) = &published {
            error!(account = %dispatch.account, error = %e, "Failed to publish error event");
        }

        OutcomeRecord {
            account: dispatch.account,
            broker: dispatch.broker,
            outcome: DispatchOutcome::Aborted(event),
            published,
        }
    }
}

/// Build the order for one credential and run the local checks.
fn prepare_order(
    trigger: &TradeTrigger,
    credential: &CustomerCredential,
) -> (BrokerOrderRequest, Result<(), BrokerError>) {
    match resolve_size(trigger, credential) {
        Ok(size) => {
            let order = BrokerOrderRequest::from_trigger(trigger, credential, size);
            let check = validate_levels(&order);
            (order, check)
        }
        Err(e) => (BrokerOrderRequest::from_trigger(trigger, credential, Decimal::ZERO), Err(e)),
    }
}

async fn dispatch_order(
    adapter: Option<Arc<dyn BrokerAdapter>>,
    credential: CustomerCredential,
    order: BrokerOrderRequest,
    precheck: Result<(), BrokerError>,
    timeout: Duration,
) -> BrokerResponse {
    if let Err(e) = precheck {
        return BrokerResponse::failure(&order, &e);
    }
    let Some(adapter) = adapter else {
        let err = BrokerError::UnsupportedBroker(order.broker.to_string());
        return BrokerResponse::failure(&order, &err);
    };

    debug!(
        account = %order.account_name,
        broker = %order.broker,
        instrument = %order.instrument,
        side = %order.side,
        size = %order.size,
        "Dispatching order"
    );

    match tokio::time::timeout(timeout, adapter.place_order(&credential, &order)).await {
        Ok(response) => response,
        Err(_) => BrokerResponse::failure(&order, &BrokerError::Timeout(timeout.as_secs())),
    }
}

fn log_outcome(response: &BrokerResponse, published: &Result<String, PublishError>) {
    match &response.error {
        None => info!(
            account = %response.account,
            broker = %response.broker,
            order_id = ?response.broker_order_id,
            "Order placed"
        ),
        Some(detail) => warn!(
            account = %response.account,
            broker = %response.broker,
            kind = %detail.kind,
            error = %detail.message,
            "Order failed"
        ),
    }
    if let Err(e) = published {
        error!(
            account = %response.account,
            broker = %response.broker,
            error = %e,
            "Failed to publish broker response"
        );
    }
}
