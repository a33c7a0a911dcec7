//! High-water marks of published bars.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;
use trading_core::error::DataError;
use trading_core::Resolution;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Mark {
    instrument: String,
    resolution: Resolution,
    published_through: DateTime<Utc>,
}

/// Newest bar time published per instrument and resolution.
///
/// With a state file the marks survive restarts, so a restarted producer does
/// not republish history.
#[derive(Debug, Default)]
pub struct PublishedCache {
    marks: HashMap<(String, Resolution), DateTime<Utc>>,
    state_file: Option<PathBuf>,
}

impl PublishedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load marks from `path` if it exists; later [`save`](Self::save)s write there.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, DataError> {
        let path = path.into();
        let marks = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => {
                let entries: Vec<Mark> =
                    serde_json::from_str(&raw).map_err(|e| DataError::ParseError(e.to_string()))?;
                entries
                    .into_iter()
                    .map(|m| ((m.instrument, m.resolution), m.published_through))
                    .collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(DataError::Internal(e.to_string())),
        };
        debug!(path = %path.display(), marks = marks.len(), "Loaded publish marks");

        Ok(Self {
            marks,
            state_file: Some(path),
        })
    }

    pub fn published_through(&self, instrument: &str, resolution: Resolution) -> Option<DateTime<Utc>> {
        self.marks.get(&(instrument.to_string(), resolution)).copied()
    }

    /// Advance the mark. Never moves backwards.
    pub fn mark(&mut self, instrument: &str, resolution: Resolution, at: DateTime<Utc>) {
        let entry = self
            .marks
            .entry((instrument.to_string(), resolution))
            .or_insert(at);
        if at > *entry {
            *entry = at;
        }
    }

    pub fn clear(&mut self, instrument: &str) {
        self.marks.retain(|(i, _), _| i != instrument);
    }

    /// Write marks to the state file, if one is set.
    pub async fn save(&self) -> Result<(), DataError> {
        let Some(path) = &self.state_file else {
            return Ok(());
        };
        let mut entries: Vec<Mark> = self
            .marks
            .iter()
            .map(|((instrument, resolution), at)| Mark {
                instrument: instrument.clone(),
                resolution: *resolution,
                published_through: *at,
            })
            .collect();
        entries.sort_by(|a, b| (&a.instrument, a.resolution).cmp(&(&b.instrument, b.resolution)));

        let raw = serde_json::to_string_pretty(&entries).map_err(|e| DataError::Internal(e.to_string()))?;
        tokio::fs::write(path, raw)
            .await
            .map_err(|e| DataError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_mark_is_monotonic() {
        let mut cache = PublishedCache::new();
        let t1 = Utc.with_ymd_and_hms(2023, 11, 3, 8, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2023, 11, 3, 8, 10, 0).unwrap();

        cache.mark("BHP", Resolution::Minute10, t2);
        cache.mark("BHP", Resolution::Minute10, t1);
        assert_eq!(cache.published_through("BHP", Resolution::Minute10), Some(t2));
        assert_eq!(cache.published_through("BHP", Resolution::Minute30), None);

        cache.clear("BHP");
        assert_eq!(cache.published_through("BHP", Resolution::Minute10), None);
    }

    #[tokio::test]
    async fn test_state_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marks.json");
        let at = Utc.with_ymd_and_hms(2023, 11, 3, 8, 0, 0).unwrap();

        let mut cache = PublishedCache::load(&path).await.unwrap();
        assert_eq!(cache.published_through("AUD/USD", Resolution::Minute10), None);
        cache.mark("AUD/USD", Resolution::Minute10, at);
        cache.save().await.unwrap();

        let reloaded = PublishedCache::load(&path).await.unwrap();
        assert_eq!(reloaded.published_through("AUD/USD", Resolution::Minute10), Some(at));
    }
}
