use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Malformed input: {message}")]
    DataFormatError { message: String },

    #[error("Geocoding failed for '{query}': {status}")]
    GeocodeError { query: String, status: String },

    #[error("No route from {origin} to {destination}: {status}")]
    DistanceUnavailableError {
        origin: String,
        destination: String,
        status: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl EtlError {
    pub fn data_format(message: impl Into<String>) -> Self {
        EtlError::DataFormatError {
            message: message.into(),
        }
    }

    /// Per-entity failures are collected as warnings and the run continues;
    /// everything else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EtlError::GeocodeError { .. } | EtlError::DistanceUnavailableError { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        let geocode = EtlError::GeocodeError {
            query: "Anacortes, WA, USA".to_string(),
            status: "ZERO_RESULTS".to_string(),
        };
        assert!(geocode.is_recoverable());

        let distance = EtlError::DistanceUnavailableError {
            origin: "48.5,-122.6".to_string(),
            destination: "47.2,-120.3".to_string(),
            status: "NOT_FOUND".to_string(),
        };
        assert!(distance.is_recoverable());

        assert!(!EtlError::data_format("missing column 'Year'").is_recoverable());
    }
}
