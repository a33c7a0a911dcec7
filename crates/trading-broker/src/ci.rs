//! City Index broker integration.

use async_trait::async_trait;
use reqwest::{header, Client};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use trading_core::error::BrokerError;
use trading_core::traits::BrokerAdapter;
use trading_core::types::{BrokerKind, BrokerOrderRequest, CustomerCredential, Placement, Side};

use crate::http::{status_error, transport_error, CONTENT_TYPE};
use crate::resolver::MarketIdResolver;

/// City Index Trading API configuration.
#[derive(Debug, Clone)]
pub struct CiConfig {
    pub base_url: String,
    pub app_version: String,
    pub timeout_secs: u64,
}

impl Default for CiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ciapi.cityindex.com/TradingAPI".to_string(),
            app_version: "1".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct LogOnRequest<'a> {
    user_name: &'a str,
    password: &'a str,
    app_key: &'a str,
    app_version: &'a str,
    app_comments: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LogOnResponse {
    session: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ClientAndTradingAccount {
    trading_accounts: Vec<TradingAccount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TradingAccount {
    trading_account_id: u64,
    #[serde(default)]
    trading_account_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct NewTradeOrderRequest {
    market_id: u64,
    direction: &'static str,
    quantity: Decimal,
    trading_account_id: u64,
    position_method_id: u8,
    reference: String,
    auto_rollover: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    bid_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offer_price: Option<Decimal>,
    if_done: Vec<IfDone>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct IfDone {
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<IfDoneLeg>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<IfDoneLeg>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct IfDoneLeg {
    trigger_price: Decimal,
    direction: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NewTradeOrderResponse {
    order_id: u64,
    #[serde(default)]
    status_reason: Option<i64>,
    #[serde(default)]
    status: Option<i64>,
}

struct Session {
    base_url: String,
    token: String,
}

fn direction(side: Side) -> &'static str {
    match side {
        Side::Buy => "buy",
        Side::Sell => "sell",
    }
}

/// City Index broker client.
pub struct CiBroker {
    config: CiConfig,
    client: Client,
    resolver: MarketIdResolver,
}

impl CiBroker {
    /// Create a new City Index client.
    pub fn new(config: CiConfig) -> Result<Self, BrokerError> {
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
            .as_deref()
            .unwrap_or(&self.config.base_url)
            .trim_end_matches('/')
            .to_string();

        let resp = self
            .client
            .post(format!("{}/session", base_url))
            .json(&LogOnRequest {
                user_name: &credential.identifier,
                password: credential.password.expose(),
                app_key: credential.api_key.expose(),
                app_version: &self.config.app_version,
                app_comments: "",
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

        let logon: LogOnResponse = resp
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;
        if logon.session.is_empty() {
            return Err(BrokerError::AuthenticationError("empty session token".to_string()));
        }

        debug!(account = %credential.account_name, "CI session established");
        Ok(Session {
            base_url,
            token: logon.session,
        })
    }

    async fn trading_account(&self, session: &Session, credential: &CustomerCredential) -> Result<u64, BrokerError> {
        let resp = self
            .client
            .get(format!("{}/useraccount/ClientAndTradingAccount", session.base_url))
            .header("UserName", &credential.identifier)
            .header("Session", &session.token)
            .send()
            .await
            .map_err(|e| transport_error(e, self.config.timeout_secs))?;

        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }

        let accounts: ClientAndTradingAccount = resp
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;

        // Prefer the CFD account when a client holds several
        accounts
            .trading_accounts
            .iter()
            .find(|a| a.trading_account_type.as_deref() == Some("CFD"))
            .or_else(|| accounts.trading_accounts.first())
            .map(|a| a.trading_account_id)
            .ok_or_else(|| BrokerError::Configuration("no trading account".to_string()))
    }
}

#[async_trait]
impl BrokerAdapter for CiBroker {
    fn kind(&self) -> BrokerKind {
        BrokerKind::Ci
    }

    async fn submit(
        &self,
        credential: &CustomerCredential,
        order: &BrokerOrderRequest,
    ) -> Result<Placement, BrokerError> {
        let market_id = self.resolver.ci_market_id(&order.instrument)?;
        let session = self.login(credential).await?;
        let trading_account_id = self.trading_account(&session, credential).await?;

        let exit = direction(order.side.opposite());
        let if_done = if order.stop.is_some() || order.limit.is_some() {
            vec![IfDone {
                stop: order.stop.map(|p| IfDoneLeg { trigger_price: p, direction: exit }),
                limit: order.limit.map(|p| IfDoneLeg { trigger_price: p, direction: exit }),
            }]
        } else {
            vec![]
        };

        let new_order = NewTradeOrderRequest {
            market_id,
            direction: direction(order.side),
            quantity: order.size,
            trading_account_id,
            position_method_id: 1,
            reference: order.client_reference(50),
            auto_rollover: false,
            bid_price: order.reference_price,
            offer_price: order.reference_price,
            if_done,
        };

        debug!(account = %order.account_name, market_id, "Submitting CI order: {:?}", new_order);

        let resp = self
            .client
            .post(format!("{}/order/newtradeorder", session.base_url))
            .header("UserName", &credential.identifier)
            .header("Session", &session.token)
            .json(&new_order)
            .send()
            .await
            .map_err(|e| transport_error(e, self.config.timeout_secs))?;

        if !resp.status().is_success() {
            return Err(match status_error(resp).await {
                BrokerError::ApiError(msg) => BrokerError::OrderRejected(msg),
                other => other,
            });
        }

        let placed: NewTradeOrderResponse = resp
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;

        if placed.order_id == 0 {
            return Err(BrokerError::OrderRejected(format!(
                "status {:?}, reason {:?}",
                placed.status, placed.status_reason
            )));
        }

        info!(
            account = %order.account_name,
            market_id,
            side = %order.side,
            size = %order.size,
            order_id = placed.order_id,
            "CI order placed"
        );

        Ok(Placement {
            broker_order_id: Some(placed.order_id.to_string()),
            deal_reference: Some(new_order.reference),
        })
    }

    fn name(&self) -> &str {
        "CI"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use trading_core::types::{Direction, Secret, TradeAction, TradeTrigger};
    use wiremock::matchers::{body_partial_json, header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credential(base_url: &str) -> CustomerCredential {
        CustomerCredential {
            account_name: "CI_ROBOTICFUND".to_string(),
            broker: BrokerKind::Ci,
            identifier: "ci-user".to_string(),
            password: Secret::new("pw"),
            api_key: Secret::new("app-key"),
            base_url: Some(base_url.to_string()),
            currency: None,
            position_size: Default::default(),
        }
    }

    fn order(credential: &CustomerCredential) -> BrokerOrderRequest {
        let trigger = TradeTrigger::new("CI_ROBOTICFUND", "EUR/USD", Direction::Long, TradeAction::Close)
            .with_levels(Some(dec!(1.05)), None);
        BrokerOrderRequest::from_trigger(&trigger, credential, dec!(1000))
    }

    async fn mount_session(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/session"))
            .and(body_partial_json(serde_json::json!({ "UserName": "ci-user", "AppKey": "app-key" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "Session": "sess-1" })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/useraccount/ClientAndTradingAccount"))
            .and(header_eq("Session", "sess-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "TradingAccounts": [
                    { "TradingAccountId": 11, "TradingAccountType": "Spread Betting" },
                    { "TradingAccountId": 42, "TradingAccountType": "CFD" }
                ]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_place_order_success() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        Mock::given(method("POST"))
            .and(path("/order/newtradeorder"))
            .and(body_partial_json(serde_json::json!({
                "MarketId": 154290,
                "Direction": "sell",
                "TradingAccountId": 42
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "OrderId": 5551234, "Status": 1, "StatusReason": 1
            })))
            .mount(&server)
            .await;

        let broker = CiBroker::new(CiConfig::default()).unwrap();
        let credential = credential(&server.uri());
        let response = broker.place_order(&credential, &order(&credential)).await;

        assert!(response.is_success(), "{:?}", response.error);
        assert_eq!(response.broker, "CI");
        assert_eq!(response.broker_order_id.as_deref(), Some("5551234"));
    }

    #[tokio::test]
    async fn test_zero_order_id_is_rejection() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        Mock::given(method("POST"))
            .and(path("/order/newtradeorder"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "OrderId": 0, "Status": 2, "StatusReason": 24
            })))
            .mount(&server)
            .await;

        let broker = CiBroker::new(CiConfig::default()).unwrap();
        let credential = credential(&server.uri());
        let response = broker.place_order(&credential, &order(&credential)).await;

        assert_eq!(response.error.unwrap().kind, "rejected");
    }

    #[tokio::test]
    async fn test_server_error_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let broker = CiBroker::new(CiConfig::default()).unwrap();
        let credential = credential(&server.uri());
        let response = broker.place_order(&credential, &order(&credential)).await;

        let error = response.error.unwrap();
        assert_eq!(error.kind, "connection");
        assert!(error.retryable);
    }
}
