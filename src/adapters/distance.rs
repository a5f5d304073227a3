use crate::adapters::http::get_json_with_retry;
use crate::adapters::retry::RetryPolicy;
use crate::domain::model::{Coordinate, OneWay};
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const METERS_PER_MILE: f64 = 1609.34;
const SECONDS_PER_HOUR: f64 = 3600.0;

/// One-way legs longer than this are almost certainly a geocoding problem.
const LONG_LEG_MILES: f64 = 500.0;

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<MatrixValue>,
    duration: Option<MatrixValue>,
}

#[derive(Debug, Deserialize)]
struct MatrixValue {
    value: f64,
}

/// Distance-matrix client memoized by ordered (origin, destination) pair.
/// The system only ever asks team→venue, so pairs are not symmetrized.
pub struct DistanceClient {
    client: Client,
    endpoint: String,
    api_key: String,
    delay: Duration,
    policy: RetryPolicy,
    cache: HashMap<String, std::result::Result<OneWay, String>>,
    network_calls: usize,
}

impl DistanceClient {
    pub fn new(client: Client, endpoint: String, api_key: String, delay: Duration) -> Self {
        Self {
            client,
            endpoint,
            api_key,
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

    pub fn network_calls(&self) -> usize {
        self.network_calls
    }

    fn pair_key(origin: &Coordinate, destination: &Coordinate) -> String {
        format!(
            "{:.6},{:.6}|{:.6},{:.6}",
            origin.lat, origin.lng, destination.lat, destination.lng
        )
    }

    fn point(coordinate: &Coordinate) -> String {
        format!("{},{}", coordinate.lat, coordinate.lng)
    }

    /// One-way miles/hours between two coordinates. A pair the upstream
    /// cannot route yields `Err(DistanceUnavailableError)`; the failure is
    /// cached so the pair is asked at most once per run.
    pub async fn one_way(
        &mut self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<OneWay> {
        let key = Self::pair_key(origin, destination);
        if let Some(cached) = self.cache.get(&key) {
            return match cached {
                Ok(one_way) => Ok(*one_way),
                Err(status) => Err(self.unavailable(origin, destination, status.clone())),
            };
        }

        tracing::debug!(
            origin = %Self::point(origin),
            destination = %Self::point(destination),
            "querying distance matrix"
        );
        self.network_calls += 1;
        let response: MatrixResponse = get_json_with_retry(
            &self.client,
            &self.endpoint,
            &[
                ("origins", Self::point(origin)),
                ("destinations", Self::point(destination)),
                ("units", "imperial".to_string()),
                ("key", self.api_key.clone()),
            ],
            &self.policy,
        )
        .await?;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let outcome = evaluate(response);
        self.cache.insert(key, outcome.clone());
        match outcome {
            Ok(one_way) => {
                if one_way.miles > LONG_LEG_MILES {
                    tracing::warn!(
                        origin = %Self::point(origin),
                        destination = %Self::point(destination),
                        miles = one_way.miles,
                        "very long one-way leg"
                    );
                }
                Ok(one_way)
            }
            Err(status) => Err(self.unavailable(origin, destination, status)),
        }
    }

    fn unavailable(&self, origin: &Coordinate, destination: &Coordinate, status: String) -> EtlError {
        EtlError::DistanceUnavailableError {
            origin: Self::point(origin),
            destination: Self::point(destination),
            status,
        }
    }
}

fn evaluate(response: MatrixResponse) -> std::result::Result<OneWay, String> {
    if response.status != "OK" {
        return Err(response.status);
    }
    let element = response
        .rows
        .first()
        .and_then(|row| row.elements.first())
        .ok_or_else(|| "MALFORMED_RESPONSE".to_string())?;
    if element.status != "OK" {
        return Err(element.status.clone());
    }
    match (&element.distance, &element.duration) {
        (Some(distance), Some(duration)) => Ok(OneWay {
            miles: distance.value / METERS_PER_MILE,
            hours: duration.value / SECONDS_PER_HOUR,
        }),
        _ => Err("MALFORMED_RESPONSE".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> DistanceClient {
        DistanceClient::new(
            Client::new(),
            server.url("/distance"),
            "test-key".to_string(),
            Duration::ZERO,
        )
        .with_policy(RetryPolicy::immediate())
    }

    fn matrix_body(meters: f64, seconds: f64) -> serde_json::Value {
        serde_json::json!({
            "status": "OK",
            "rows": [{"elements": [{
                "status": "OK",
                "distance": {"value": meters},
                "duration": {"value": seconds}
            }]}]
        })
    }

    const ORIGIN: Coordinate = Coordinate {
        lat: 48.5,
        lng: -122.6,
    };
    const DESTINATION: Coordinate = Coordinate {
        lat: 47.2,
        lng: -120.3,
    };

    #[tokio::test]
    async fn test_converts_meters_and_seconds() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/distance")
                .query_param("origins", "48.5,-122.6")
                .query_param("destinations", "47.2,-120.3")
                .query_param("units", "imperial");
            then.status(200).json_body(matrix_body(16093.4, 1800.0));
        });

        let mut distances = client_for(&server);
        let one_way = distances.one_way(&ORIGIN, &DESTINATION).await.unwrap();
        assert!((one_way.miles - 10.0).abs() < 1e-9);
        assert!((one_way.hours - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_pair_resolved_once_per_run() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/distance");
            then.status(200).json_body(matrix_body(16093.4, 1800.0));
        });

        let mut distances = client_for(&server);
        distances.one_way(&ORIGIN, &DESTINATION).await.unwrap();
        distances.one_way(&ORIGIN, &DESTINATION).await.unwrap();

        mock.assert_hits(1);
        assert_eq!(distances.network_calls(), 1);
    }

    #[tokio::test]
    async fn test_no_route_cached_as_failure() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/distance");
            then.status(200).json_body(serde_json::json!({
                "status": "OK",
                "rows": [{"elements": [{"status": "NOT_FOUND"}]}]
            }));
        });

        let mut distances = client_for(&server);
        let first = distances.one_way(&ORIGIN, &DESTINATION).await;
        let second = distances.one_way(&ORIGIN, &DESTINATION).await;

        mock.assert_hits(1);
        assert!(matches!(
            first,
            Err(EtlError::DistanceUnavailableError { ref status, .. }) if status == "NOT_FOUND"
        ));
        assert!(matches!(
            second,
            Err(EtlError::DistanceUnavailableError { .. })
        ));
    }

    #[tokio::test]
    async fn test_top_level_error_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/distance");
            then.status(200)
                .json_body(serde_json::json!({"status": "OVER_QUERY_LIMIT", "rows": []}));
        });

        let mut distances = client_for(&server);
        let result = distances.one_way(&ORIGIN, &DESTINATION).await;
        assert!(matches!(
            result,
            Err(EtlError::DistanceUnavailableError { ref status, .. }) if status == "OVER_QUERY_LIMIT"
        ));
    }
}
