//! Response DTOs for the frontend API
//!
//! Defines the JSON bodies returned by the `/api` endpoints.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::{ByteView, GroupStats};
use crate::error::CacheError;

/// Response body for `GET /api/stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Group counters and usage
    #[serde(flatten)]
    pub stats: GroupStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from a stats snapshot
    pub fn new(stats: GroupStats) -> Self {
        let hit_rate = stats.hit_rate();
        Self { stats, hit_rate }
    }
}

/// Response body for `GET /api/healthz`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status, always "ok"
    pub status: String,
    /// Group served by this API
    pub group: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Group counters and usage
    pub stats: GroupStats,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn ok(stats: GroupStats) -> Self {
        Self {
            status: "ok".to_string(),
            group: stats.name.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            stats,
        }
    }
}

/// Response body for `GET /api/batch`
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResponse {
    /// Values found, by key
    pub data: BTreeMap<String, String>,
    /// Failures by key, omitted when every key resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

impl BatchResponse {
    /// Builds the body from `Group::get_many` output.
    pub fn new<V, E>(values: V, errors: E) -> Self
    where
        V: IntoIterator<Item = (String, ByteView)>,
        E: IntoIterator<Item = (String, CacheError)>,
    {
        let data = values
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect();
        let errors: BTreeMap<String, String> = errors
            .into_iter()
            .map(|(key, err)| (key, err.to_string()))
            .collect();

        Self {
            data,
            errors: (!errors.is_empty()).then_some(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_response_flattens() {
        let stats = GroupStats {
            name: "scores".to_string(),
            hits: 8,
            misses: 2,
            ..Default::default()
        };
        let json = serde_json::to_value(StatsResponse::new(stats)).unwrap();
        assert_eq!(json["name"], "scores");
        assert_eq!(json["hits"], 8);
        assert!((json["hit_rate"].as_f64().unwrap() - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::ok(GroupStats {
            name: "scores".to_string(),
            ..Default::default()
        });
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["group"], "scores");
        assert!(json.get("timestamp").is_some());
        assert_eq!(json["stats"]["entries"], 0);
    }

    #[test]
    fn test_batch_response_omits_empty_errors() {
        let resp = BatchResponse::new(
            vec![("a".to_string(), ByteView::from("1"))],
            Vec::<(String, CacheError)>::new(),
        );
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"data":{"a":"1"}}"#);
    }

    #[test]
    fn test_batch_response_with_errors() {
        let resp = BatchResponse::new(
            Vec::new(),
            vec![("x".to_string(), CacheError::NotFound("x".to_string()))],
        );
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["errors"]["x"], "key not found: x");
    }
}
