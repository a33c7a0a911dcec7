//! Instrument to broker market-id resolution.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use trading_core::error::BrokerError;

/// Broker identifiers for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketIds {
    /// IG epic
    pub ig_epic: &'static str,
    /// City Index market id
    pub ci_market_id: u64,
}

const MARKETS: &[(&str, MarketIds)] = &[
    ("AUD/USD", MarketIds { ig_epic: "CS.D.AUDUSD.MINI.IP", ci_market_id: 400494179 }),
    ("EUR/USD", MarketIds { ig_epic: "CS.D.EURUSD.MINI.IP", ci_market_id: 154290 }),
    ("USD/JPY", MarketIds { ig_epic: "CS.D.USDJPY.MINI.IP", ci_market_id: 154303 }),
    ("ANZ", MarketIds { ig_epic: "AA.D.ANZ.CASH.IP", ci_market_id: 101471 }),
    ("BHP", MarketIds { ig_epic: "AA.D.BHP.CASH.IP", ci_market_id: 101475 }),
    ("CBA", MarketIds { ig_epic: "AA.D.CBA.CASH.IP", ci_market_id: 101506 }),
    ("FMG", MarketIds { ig_epic: "AA.D.FMG.CASH.IP", ci_market_id: 101652 }),
    ("NAB", MarketIds { ig_epic: "AA.D.NAB.CASH.IP", ci_market_id: 101634 }),
    ("WES", MarketIds { ig_epic: "AA.D.WES.CASH.IP", ci_market_id: 101671 }),
];

/// Maps pipeline instrument names (`AUD/USD`, `AUDUSD`, `BHP`) to broker ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketIdResolver;

impl MarketIdResolver {
    pub fn new() -> Self {
        Self
    }

    /// Canonical instrument name, e.g. `audusd` -> `AUD/USD`.
    pub fn canonical(instrument: &str) -> Option<&'static str> {
        let wanted: String = instrument
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        MARKETS
            .iter()
            .map(|(name, _)| *name)
            .find(|name| name.replace('/', "") == wanted)
    }

    pub fn resolve(&self, instrument: &str) -> Result<MarketIds, BrokerError> {
        Self::canonical(instrument)
            .and_then(|name| MARKETS.iter().find(|(n, _)| *n == name))
            .map(|(_, ids)| *ids)
            .ok_or_else(|| BrokerError::MarketNotFound(instrument.to_string()))
    }

    pub fn ig_epic(&self, instrument: &str) -> Result<&'static str, BrokerError> {
        self.resolve(instrument).map(|ids| ids.ig_epic)
    }

    pub fn ci_market_id(&self, instrument: &str) -> Result<u64, BrokerError> {
        self.resolve(instrument).map(|ids| ids.ci_market_id)
    }

    pub fn instruments(&self) -> impl Iterator<Item = &'static str> {
        MARKETS.iter().map(|(name, _)| *name)
    }
}

/// Smallest quoted price increment: 0.01 for JPY pairs, 0.0001 otherwise.
pub fn pip_size(instrument: &str) -> Decimal {
    if instrument.to_ascii_uppercase().contains("JPY") {
        dec!(0.01)
    } else {
        dec!(0.0001)
    }
}
