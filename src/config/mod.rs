pub mod storage;

use crate::domain::model::GeoBounds;
use crate::domain::ports::ConfigProvider;
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_string, validate_range, validate_required_field,
    validate_url, Validate,
};
use crate::utils::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "league-miles")]
#[command(about = "Geocode league teams and venues, compute round-trip travel, export leaderboard JSON")]
pub struct CliConfig {
    /// Directory containing the input CSVs; the output JSON lands here too.
    #[arg(long, default_value = ".")]
    pub data_dir: String,

    /// Teams CSV (columns: Team,City,State,Zip), relative to --data-dir.
    #[arg(long, default_value = "teams.csv")]
    pub teams_csv: String,

    /// Events CSV (columns: Year,Date,City,Venue), relative to --data-dir.
    #[arg(long, default_value = "races.csv")]
    pub events_csv: String,

    /// Output JSON file name, relative to --data-dir.
    #[arg(long, default_value = "league_data.json")]
    pub output_json: String,

    #[arg(long, env = "GOOGLE_MAPS_API_KEY", default_value = "")]
    pub api_key: String,

    #[arg(long, default_value = "https://maps.googleapis.com/maps/api/geocode/json")]
    pub geocode_endpoint: String,

    #[arg(
        long,
        default_value = "https://maps.googleapis.com/maps/api/distancematrix/json"
    )]
    pub distance_endpoint: String,

    /// State appended to geocode queries that carry no state of their own.
    #[arg(long, default_value = "WA")]
    pub state: String,

    // WA/ID-ish window; geocodes outside it are rejected.
    #[arg(long, default_value = "45.0")]
    pub lat_min: f64,
    #[arg(long, default_value = "49.5")]
    pub lat_max: f64,
    #[arg(long, default_value = "-125.0")]
    pub lng_min: f64,
    #[arg(long, default_value = "-116.0")]
    pub lng_max: f64,

    /// Politeness delay between outbound API calls, in milliseconds.
    #[arg(long, default_value = "100")]
    pub request_delay_ms: u64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ConfigProvider for CliConfig {
    fn data_dir(&self) -> &str {
        &self.data_dir
    }

    fn api_key(&self) -> &str {
        &self.api_key
    }

    fn geocode_endpoint(&self) -> &str {
        &self.geocode_endpoint
    }

    fn distance_endpoint(&self) -> &str {
        &self.distance_endpoint
    }

    fn teams_file(&self) -> &str {
        &self.teams_csv
    }

    fn events_file(&self) -> &str {
        &self.events_csv
    }

    fn output_file(&self) -> &str {
        &self.output_json
    }

    fn default_state(&self) -> &str {
        &self.state
    }

    fn bounds(&self) -> GeoBounds {
        GeoBounds {
            lat_min: self.lat_min,
            lat_max: self.lat_max,
            lng_min: self.lng_min,
            lng_max: self.lng_max,
        }
    }

    fn request_delay_ms(&self) -> u64 {
        self.request_delay_ms
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_required_field("api_key", &self.api_key)?;
        validate_url("geocode_endpoint", &self.geocode_endpoint)?;
        validate_url("distance_endpoint", &self.distance_endpoint)?;
        validate_file_extension("teams_csv", &self.teams_csv, &["csv"])?;
        validate_file_extension("events_csv", &self.events_csv, &["csv"])?;
        validate_file_extension("output_json", &self.output_json, &["json"])?;
        validate_non_empty_string("state", &self.state)?;
        validate_range("lat_min", self.lat_min, -90.0, 90.0)?;
        validate_range("lat_max", self.lat_max, self.lat_min, 90.0)?;
        validate_range("lng_min", self.lng_min, -180.0, 180.0)?;
        validate_range("lng_max", self.lng_max, self.lng_min, 180.0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CliConfig {
        CliConfig {
            data_dir: ".".to_string(),
            teams_csv: "teams.csv".to_string(),
            events_csv: "races.csv".to_string(),
            output_json: "league_data.json".to_string(),
            api_key: "test-key".to_string(),
            geocode_endpoint: "https://maps.googleapis.com/maps/api/geocode/json".to_string(),
            distance_endpoint: "https://maps.googleapis.com/maps/api/distancematrix/json"
                .to_string(),
            state: "WA".to_string(),
            lat_min: 45.0,
            lat_max: 49.5,
            lng_min: -125.0,
            lng_max: -116.0,
            request_delay_ms: 0,
            verbose: false,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let mut config = test_config();
        config.api_key = "".to_string();
        assert!(matches!(
            config.validate(),
            Err(crate::utils::error::EtlError::MissingConfigError { ref field }) if field == "api_key"
        ));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut config = test_config();
        config.lat_max = 40.0; // below lat_min
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_csv_input_rejected() {
        let mut config = test_config();
        config.teams_csv = "teams.xlsx".to_string();
        assert!(config.validate().is_err());
    }
}
