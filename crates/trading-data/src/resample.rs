//! Aggregate fine bars into coarser resolutions.

use chrono::{DateTime, TimeZone, Utc};
use trading_core::{MarketDataEvent, Resolution};

/// Finer resolution a feed can serve that divides `target` evenly.
pub fn base_resolution(target: Resolution) -> Option<Resolution> {
    match target {
        Resolution::Minute10 | Resolution::Minute15 | Resolution::Minute30 => Some(Resolution::Minute5),
        Resolution::Hour4 => Some(Resolution::Hour1),
        _ => None,
    }
}

fn bucket_start(at: DateTime<Utc>, secs: i64) -> Option<DateTime<Utc>> {
    let ts = at.timestamp();
    Utc.timestamp_opt(ts - ts.rem_euclid(secs), 0).single()
}

/// Aggregate `events` (sorted, all at one finer resolution) into `target` bars.
///
/// Buckets are aligned to multiples of the target period. Only buckets that
/// hold every expected source bar are emitted, so a bucket still forming is
/// never published early.
pub fn resample(events: &[MarketDataEvent], target: Resolution) -> Vec<MarketDataEvent> {
    let Some(first) = events.first() else {
        return Vec::new();
    };
    let source_secs = first.resolution.as_secs();
    let target_secs = target.as_secs();
    if source_secs == 0 || target_secs % source_secs != 0 || target_secs <= source_secs {
        return Vec::new();
    }
    let expected = (target_secs / source_secs) as usize;

    let mut out = Vec::new();
    let mut current: Option<(DateTime<Utc>, MarketDataEvent, usize)> = None;

    for event in events {
        let Some(start) = bucket_start(event.snapshot_time_utc, target_secs as i64) else {
            continue;
        };
        match current.as_mut() {
            Some((bucket, bar, count)) if *bucket == start => {
                bar.high_price = bar.high_price.max(event.high_price);
                bar.low_price = bar.low_price.min(event.low_price);
                bar.close_price = event.close_price;
                bar.volume += event.volume;
                bar.insert_stamp = event.insert_stamp;
                *count += 1;
            }
            _ => {
                if let Some((_, bar, count)) = current.take() {
                    if count == expected {
                        out.push(bar);
                    }
                }
                let bar = MarketDataEvent {
                    datetime: start,
                    snapshot_time_utc: start,
                    resolution: target,
                    ..event.clone()
                };
                current = Some((start, bar, 1));
            }
        }
    }

    if let Some((_, bar, count)) = current {
        if count == expected {
            out.push(bar);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn five_minute(index: i64, close: Decimal) -> MarketDataEvent {
        let at = Utc.with_ymd_and_hms(2023, 11, 3, 8, 0, 0).unwrap() + Duration::minutes(5 * index);
        MarketDataEvent {
            instrument: "BHP".to_string(),
            datetime: at,
            snapshot_time_utc: at,
            resolution: Resolution::Minute5,
            open_price: close - dec!(0.01),
            close_price: close,
            high_price: close + dec!(0.05),
            low_price: close - dec!(0.05),
            volume: dec!(10),
            insert_stamp: at,
        }
    }

    #[test]
    fn test_ten_minute_buckets() {
        let events: Vec<_> = (0..5).map(|i| five_minute(i, dec!(45) + Decimal::from(i))).collect();
        let bars = resample(&events, Resolution::Minute10);

        // The fifth bar opens a bucket that is not complete yet
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].snapshot_time_utc, events[0].snapshot_time_utc);
        assert_eq!(bars[0].open_price, dec!(44.99));
        assert_eq!(bars[0].close_price, dec!(46));
        assert_eq!(bars[0].high_price, dec!(46.05));
        assert_eq!(bars[0].low_price, dec!(44.95));
        assert_eq!(bars[0].volume, dec!(20));
        assert_eq!(bars[1].resolution, Resolution::Minute10);
    }

    #[test]
    fn test_gap_drops_partial_bucket() {
        let events = vec![five_minute(0, dec!(45)), five_minute(3, dec!(46)), five_minute(4, dec!(47))];
        let bars = resample(&events, Resolution::Minute10);
        assert_eq!(bars.len(), 0);

        let bars = resample(&events, Resolution::Minute30);
        assert!(bars.is_empty());
    }

    #[test]
    fn test_base_resolution() {
        assert_eq!(base_resolution(Resolution::Minute30), Some(Resolution::Minute5));
        assert_eq!(base_resolution(Resolution::Minute5), None);
    }
}
