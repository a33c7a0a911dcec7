//! Customer credentials and per-account trade configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Broker identifier.
///
/// Unrecognized broker strings are kept as [`BrokerKind::Other`] so that a
/// credential set naming a broker we cannot trade with still decodes; those
/// entries are routed to an unsupported-broker failure instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BrokerKind {
    /// IG Markets
    Ig,
    /// City Index
    Ci,
    Other(String),
}

impl BrokerKind {
    pub fn as_str(&self) -> &str {
        match self {
            BrokerKind::Ig => "IG",
            BrokerKind::Ci => "CI",
            BrokerKind::Other(name) => name,
        }
    }
}

impl From<String> for BrokerKind {
    fn from(value: String) -> Self {
        match value.trim().to_uppercase().as_str() {
            "IG" => BrokerKind::Ig,
            "CI" => BrokerKind::Ci,
            _ => BrokerKind::Other(value),
        }
    }
}

impl From<&str> for BrokerKind {
    fn from(value: &str) -> Self {
        BrokerKind::from(value.to_string())
    }
}

impl From<BrokerKind> for String {
    fn from(value: BrokerKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for BrokerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque secret string. Never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Secret::new(value)
    }
}

/// Position sizing configuration attached to a credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PositionSizeConfig {
    /// Size used when neither the trigger nor `per_instrument` names one
    pub default_size: Decimal,
    /// Hard cap applied to every resolved size
    #[serde(default)]
    pub max_size: Option<Decimal>,
    #[serde(default)]
    pub per_instrument: HashMap<String, Decimal>,
    /// Named sizing policies a trigger can reference
    #[serde(default)]
    pub policies: HashMap<String, Decimal>,
}

/// One customer account at one broker.
///
/// Immutable for the lifetime of a routing operation; fetched fresh from the
/// secret store on every invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCredential {
    pub account_name: String,
    pub broker: BrokerKind,
    /// Login identifier at the broker
    pub identifier: String,
    pub password: Secret,
    pub api_key: Secret,
    /// Overrides the configured broker base URL (demo vs live endpoints)
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub position_size: PositionSizeConfig,
}

impl CustomerCredential {
    /// Decode the credential secret blob: a JSON array of credentials.
    pub fn decode_set(payload: &str) -> Result<Vec<CustomerCredential>, String> {
        let credentials: Vec<CustomerCredential> =
            serde_json::from_str(payload).map_err(|e| e.to_string())?;

        for (idx, credential) in credentials.iter().enumerate() {
            if credential.account_name.trim().is_empty() {
                return Err(format!("credential #{} has an empty accountName", idx));
            }
            if credential.position_size.default_size < Decimal::ZERO {
                return Err(format!(
                    "credential {} has a negative defaultSize",
                    credential.account_name
                ));
            }
        }

        Ok(credentials)
    }
}
