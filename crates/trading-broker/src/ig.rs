//! IG broker integration.

use async_trait::async_trait;
use reqwest::{header, Client};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use trading_core::error::BrokerError;
use trading_core::traits::BrokerAdapter;
use trading_core::types::{BrokerKind, BrokerOrderRequest, CustomerCredential, Placement, TradeAction};

use crate::http::{status_error, transport_error, CONTENT_TYPE};
use crate::resolver::MarketIdResolver;

/// IG REST API configuration.
#[derive(Debug, Clone)]
pub struct IgConfig {
    pub base_url: String,
    /// API version header sent with order requests
    pub api_version: String,
    pub timeout_secs: u64,
}

impl Default for IgConfig {
    fn default() -> Self {
        Self {
            base_url: "https://demo-api.ig.com/gateway/deal".to_string(),
            api_version: "2".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Serialize)]
struct SessionRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    account_id: String,
    oauth_token: OauthToken,
}

#[derive(Debug, Deserialize)]
struct OauthToken {
    access_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePositionRequest {
    epic: String,
    expiry: String,
    direction: String,
    size: Decimal,
    order_type: String,
    time_in_force: String,
    guaranteed_stop: bool,
    force_open: bool,
    currency_code: String,
    deal_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_level: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit_level: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DealReferenceResponse {
    deal_reference: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DealConfirmation {
    deal_status: String,
    #[serde(default)]
    deal_id: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

/// Authenticated session for one account.
struct Session {
    base_url: String,
    access_token: String,
    account_id: String,
}

/// IG broker client.
///
/// Each order opens a fresh session with the account's credential, so no
/// token state is shared between concurrent dispatches.
pub struct IgBroker {
    config: IgConfig,
    client: Client,
    resolver: MarketIdResolver,
}

impl IgBroker {
    /// Create a new IG client.
    pub fn new(config: IgConfig) -> Result<Self, BrokerError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static(CONTENT_TYPE));
        headers.insert(header::ACCEPT, header::HeaderValue::from_static(CONTENT_TYPE));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BrokerError::Configuration(e.to_string()))?;

        Ok(Self {
            config,
            client,
            resolver: MarketIdResolver::new(),
        })
    }

    async fn login(&self, credential: &CustomerCredential) -> Result<Session, BrokerError> {
        let base_url = credential
            .base_url
            .clone()
            .unwrap_or_else(|| self.config.base_url.clone());
        let url = format!("{}/session", base_url.trim_end_matches('/'));

        let resp = self
            .client
            .post(&url)
            .header("Version", "3")
            .header("X-IG-API-KEY", credential.api_key.expose())
            .json(&SessionRequest {
                identifier: &credential.identifier,
                password: credential.password.expose(),
            })
            .send()
            .await
            .map_err(|e| transport_error(e, self.config.timeout_secs))?;

        if !resp.status().is_success() {
            return Err(match status_error(resp).await {
                BrokerError::ApiError(msg) => BrokerError::AuthenticationError(msg),
                other => other,
            });
        }

        let session: SessionResponse = resp
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;

        debug!(account = %credential.account_name, "IG session established");
        Ok(Session {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: session.oauth_token.access_token,
            account_id: session.account_id,
        })
    }

    fn authed(&self, request: reqwest::RequestBuilder, session: &Session, credential: &CustomerCredential, version: &str) -> reqwest::RequestBuilder {
        request
            .header("Version", version)
            .header("X-IG-API-KEY", credential.api_key.expose())
            .header(header::AUTHORIZATION, format!("Bearer {}", session.access_token))
            .header("IG-ACCOUNT-ID", &session.account_id)
    }

    async fn confirm(
        &self,
        session: &Session,
        credential: &CustomerCredential,
        deal_reference: &str,
    ) -> Result<DealConfirmation, BrokerError> {
        let url = format!("{}/confirms/{}", session.base_url, deal_reference);
        let resp = self
            .authed(self.client.get(&url), session, credential, "1")
            .send()
            .await
            .map_err(|e| transport_error(e, self.config.timeout_secs))?;

        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }

        resp.json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))
    }
}

#[async_trait]
impl BrokerAdapter for IgBroker {
    fn kind(&self) -> BrokerKind {
        BrokerKind::Ig
    }

    async fn submit(
        &self,
        credential: &CustomerCredential,
        order: &BrokerOrderRequest,
    ) -> Result<Placement, BrokerError> {
        let epic = self.resolver.ig_epic(&order.instrument)?;
        let session = self.login(credential).await?;

        let create_req = CreatePositionRequest {
            epic: epic.to_string(),
            expiry: "-".to_string(),
            direction: order.side.to_string(),
            size: order.size,
            order_type: "MARKET".to_string(),
            time_in_force: "FILL_OR_KILL".to_string(),
            guaranteed_stop: false,
            force_open: order.action == TradeAction::Open,
            currency_code: credential.currency.clone().unwrap_or_else(|| "AUD".to_string()),
            deal_reference: order.client_reference(30),
            stop_level: order.stop,
            limit_level: order.limit,
        };

        debug!(account = %order.account_name, epic, "Submitting IG position: {:?}", create_req);

        let url = format!("{}/positions/otc", session.base_url);
        let resp = self
            .authed(self.client.post(&url), &session, credential, &self.config.api_version)
            .json(&create_req)
            .send()
            .await
            .map_err(|e| transport_error(e, self.config.timeout_secs))?;

        if !resp.status().is_success() {
            return Err(match status_error(resp).await {
                BrokerError::ApiError(msg) => BrokerError::OrderRejected(msg),
                other => other,
            });
        }

        let reference: DealReferenceResponse = resp
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;

        let confirmation = self.confirm(&session, credential, &reference.deal_reference).await?;
        if confirmation.deal_status != "ACCEPTED" {
            return Err(BrokerError::OrderRejected(
                confirmation
                    .reason
                    .unwrap_or_else(|| confirmation.deal_status.clone()),
            ));
        }

        info!(
            account = %order.account_name,
            epic,
            side = %order.side,
            size = %order.size,
            deal_reference = %reference.deal_reference,
            "IG position opened"
        );

        Ok(Placement {
            broker_order_id: confirmation.deal_id,
            deal_reference: Some(reference.deal_reference),
        })
    }

    fn name(&self) -> &str {
        "IG"
    }
}
