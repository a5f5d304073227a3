use crate::adapters::http::get_json_with_retry;
use crate::adapters::retry::RetryPolicy;
use crate::domain::model::{Coordinate, GeoBounds};
use crate::utils::error::{EtlError, Result};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

/// Queries like "Ephrata, WA" already name a state and must not get another
/// one appended.
fn state_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",\s*[A-Z]{2}\b").expect("valid regex literal"))
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Coordinate,
}

/// Geocoding client with a per-run memoization cache. Failures are cached
/// alongside successes so a bad query costs at most one network call.
pub struct GeocodeClient {
    client: Client,
    endpoint: String,
    api_key: String,
    bounds: GeoBounds,
    delay: Duration,
    policy: RetryPolicy,
    cache: HashMap<String, std::result::Result<Coordinate, String>>,
    network_calls: usize,
}

impl GeocodeClient {
    pub fn new(
        client: Client,
        endpoint: String,
        api_key: String,
        bounds: GeoBounds,
        delay: Duration,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            bounds,
            delay,
            policy: RetryPolicy::maps_api(),
            cache: HashMap::new(),
            network_calls: 0,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Outbound calls made so far; cache hits don't count.
    pub fn network_calls(&self) -> usize {
        self.network_calls
    }

    fn cache_key(query: &str, state: &str) -> String {
        format!("{}|{}", normalize(query), state.trim().to_lowercase())
    }

    /// Resolve a free-text location (zip or city) to a coordinate within the
    /// configured bounds. `Err(GeocodeError)` covers zero results, a non-OK
    /// upstream status, and out-of-bounds hits; the caller decides whether
    /// that is fatal.
    pub async fn geocode(&mut self, query: &str, state: &str) -> Result<Coordinate> {
        let key = Self::cache_key(query, state);
        if let Some(cached) = self.cache.get(&key) {
            return match cached {
                Ok(coordinate) => Ok(*coordinate),
                Err(status) => Err(EtlError::GeocodeError {
                    query: query.to_string(),
                    status: status.clone(),
                }),
            };
        }

        let full_query = if state_suffix_re().is_match(query) {
            query.trim().to_string()
        } else {
            format!("{}, {}, USA", query.trim(), state.trim())
        };

        tracing::debug!(query = %full_query, "geocoding");
        self.network_calls += 1;
        let response: GeocodeResponse = get_json_with_retry(
            &self.client,
            &self.endpoint,
            &[
                ("address", full_query.clone()),
                ("key", self.api_key.clone()),
            ],
            &self.policy,
        )
        .await?;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let outcome = self.evaluate(&full_query, response);
        self.cache.insert(key, outcome.clone());
        match outcome {
            Ok(coordinate) => Ok(coordinate),
            Err(status) => Err(EtlError::GeocodeError {
                query: query.to_string(),
                status,
            }),
        }
    }

    fn evaluate(
        &self,
        full_query: &str,
        response: GeocodeResponse,
    ) -> std::result::Result<Coordinate, String> {
        if response.status != "OK" {
            tracing::warn!(query = %full_query, status = %response.status, "geocoding failed");
            return Err(response.status);
        }
        let Some(result) = response.results.first() else {
            tracing::warn!(query = %full_query, "geocoding returned no results");
            return Err("ZERO_RESULTS".to_string());
        };
        let coordinate = result.geometry.location;
        if !self.bounds.contains(&coordinate) {
            tracing::warn!(
                query = %full_query,
                lat = coordinate.lat,
                lng = coordinate.lng,
                "geocode outside configured bounds"
            );
            return Err("OUT_OF_BOUNDS".to_string());
        }
        tracing::debug!(
            query = %full_query,
            lat = coordinate.lat,
            lng = coordinate.lng,
            "geocoded"
        );
        Ok(coordinate)
    }
}

fn normalize(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn wa_bounds() -> GeoBounds {
        GeoBounds {
            lat_min: 45.0,
            lat_max: 49.5,
            lng_min: -125.0,
            lng_max: -116.0,
        }
    }

    fn client_for(server: &MockServer) -> GeocodeClient {
        GeocodeClient::new(
            Client::new(),
            server.url("/geocode"),
            "test-key".to_string(),
            wa_bounds(),
            Duration::ZERO,
        )
        .with_policy(RetryPolicy::immediate())
    }

    fn ok_body(lat: f64, lng: f64) -> serde_json::Value {
        serde_json::json!({
            "status": "OK",
            "results": [{"geometry": {"location": {"lat": lat, "lng": lng}}}]
        })
    }

    #[tokio::test]
    async fn test_equivalent_queries_hit_network_once() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/geocode")
                .query_param("address", "Anacortes, WA, USA");
            then.status(200).json_body(ok_body(48.5126, -122.6127));
        });

        let mut geocoder = client_for(&server);
        let first = geocoder.geocode("Anacortes", "WA").await.unwrap();
        let second = geocoder.geocode("  anacortes ", "WA").await.unwrap();

        mock.assert_hits(1);
        assert_eq!(geocoder.network_calls(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_existing_state_suffix_not_doubled() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/geocode")
                .query_param("address", "Ephrata, WA");
            then.status(200).json_body(ok_body(47.3176, -119.5536));
        });

        let mut geocoder = client_for(&server);
        geocoder.geocode("Ephrata, WA", "WA").await.unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_zero_results_cached_as_failure() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/geocode");
            then.status(200)
                .json_body(serde_json::json!({"status": "ZERO_RESULTS", "results": []}));
        });

        let mut geocoder = client_for(&server);
        let first = geocoder.geocode("Nowhere", "WA").await;
        let second = geocoder.geocode("Nowhere", "WA").await;

        mock.assert_hits(1);
        assert!(matches!(
            first,
            Err(EtlError::GeocodeError { ref status, .. }) if status == "ZERO_RESULTS"
        ));
        assert!(matches!(second, Err(EtlError::GeocodeError { .. })));
    }

    #[tokio::test]
    async fn test_out_of_bounds_result_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/geocode");
            // Spokane, Missouri
            then.status(200).json_body(ok_body(36.8665, -93.2905));
        });

        let mut geocoder = client_for(&server);
        let result = geocoder.geocode("Spokane", "MO").await;
        assert!(matches!(
            result,
            Err(EtlError::GeocodeError { ref status, .. }) if status == "OUT_OF_BOUNDS"
        ));
    }
}
