//! Generic error event for centralized diagnostics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericErrorEvent {
    pub datetime: DateTime<Utc>,
    pub account_name: String,
    pub originating_service: String,
    pub input_event: String,
    pub error_description: String,
}

impl GenericErrorEvent {
    pub fn new(
        account_name: impl Into<String>,
        originating_service: impl Into<String>,
        input_event: impl Into<String>,
        error_description: impl Into<String>,
    ) -> Self {
        Self {
            datetime: Utc::now(),
            account_name: account_name.into(),
            originating_service: originating_service.into(),
            input_event: input_event.into(),
            error_description: error_description.into(),
        }
    }
}
