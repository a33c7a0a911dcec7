//! Order size resolution and level checks.

use rust_decimal::Decimal;
use trading_broker::pip_size;
use trading_core::error::BrokerError;
use trading_core::{BrokerOrderRequest, CustomerCredential, PositionSizeConfig, SizeSpec, TradeTrigger};

/// Resolve the order size for one credential.
///
/// Precedence: explicit trigger size, named policy, per-instrument size,
/// default size. `max_size` caps the result.
pub fn resolve_size(trigger: &TradeTrigger, credential: &CustomerCredential) -> Result<Decimal, BrokerError> {
    let config = &credential.position_size;

    let size = match &trigger.size {
        Some(SizeSpec::Explicit(size)) => *size,
        Some(SizeSpec::Policy { policy }) => *config.policies.get(policy).ok_or_else(|| {
            BrokerError::InvalidOrder(format!(
                "sizing policy '{}' not configured for {}",
                policy, credential.account_name
            ))
        })?,
        None => per_instrument_size(config, &trigger.instrument).unwrap_or(config.default_size),
    };

    let size = match config.max_size {
        Some(max) if size > max => max,
        _ => size,
    };

    if size <= Decimal::ZERO {
        return Err(BrokerError::InvalidOrder(format!(
            "resolved size {} for {} is not positive",
            size, credential.account_name
        )));
    }
    Ok(size)
}

/// Per-instrument size, matching `AUD/USD`, `AUDUSD` and `audusd` alike.
fn per_instrument_size(config: &PositionSizeConfig, instrument: &str) -> Option<Decimal> {
    if let Some(size) = config.per_instrument.get(instrument) {
        return Some(*size);
    }
    let wanted = instrument_symbol(instrument);
    config
        .per_instrument
        .iter()
        .find(|(name, _)| instrument_symbol(name) == wanted)
        .map(|(_, size)| *size)
}

fn instrument_symbol(instrument: &str) -> String {
    instrument
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Stop and limit must sit at least one pip away from the reference price.
pub fn validate_levels(order: &BrokerOrderRequest) -> Result<(), BrokerError> {
    let Some(reference) = order.reference_price else {
        return Ok(());
    };
    let pip = pip_size(&order.instrument);

    for (name, level) in [("stop", order.stop), ("limit", order.limit)] {
        if let Some(level) = level {
            if (level - reference).abs() < pip {
                return Err(BrokerError::InvalidOrder(format!(
                    "{} {} is less than one pip from reference {}",
                    name, level, reference
                )));
            }
        }
    }
    Ok(())
}
