use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A geocoded point, as returned by the geocoding service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

/// Sanity window for geocode results. Hits outside the window are treated as
/// failed geocodes so a wayward match in another state cannot skew totals.
#[derive(Debug, Clone, Copy)]
pub struct GeoBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl GeoBounds {
    pub fn contains(&self, c: &Coordinate) -> bool {
        (self.lat_min..=self.lat_max).contains(&c.lat)
            && (self.lng_min..=self.lng_max).contains(&c.lng)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Season {
    Spring,
    Fall,
    Other,
}

impl Season {
    pub const ALL: [Season; 3] = [Season::Spring, Season::Fall, Season::Other];

    /// Mar-Jun race in the spring series, Sep-Nov in the fall series.
    pub fn from_month(month: u32) -> Season {
        match month {
            3..=6 => Season::Spring,
            9..=11 => Season::Fall,
            _ => Season::Other,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    pub location_key: String,
    pub city: String,
    pub venue: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub season: Season,
    pub date: NaiveDate,
    pub location_key: String,
}

/// One-way figures straight from the distance service. Never serialized;
/// everything user-facing is round trip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OneWay {
    pub miles: f64,
    pub hours: f64,
}

/// Round-trip travel for one (team, venue) pair: exactly double the one-way
/// response, miles to one decimal and hours to two.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundTrip {
    pub miles: f64,
    pub hours: f64,
}

impl RoundTrip {
    pub fn from_one_way(one_way: OneWay) -> Self {
        Self {
            miles: round1(one_way.miles * 2.0),
            hours: round2(one_way.hours * 2.0),
        }
    }
}

/// Accumulating miles/hours bucket used for team and venue totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TravelTotal {
    pub miles: f64,
    pub hours: f64,
}

impl TravelTotal {
    pub fn add(&mut self, trip: &RoundTrip) {
        self.miles += trip.miles;
        self.hours += trip.hours;
    }

    pub fn add_weighted(&mut self, trip: &RoundTrip, count: u32) {
        self.miles += trip.miles * count as f64;
        self.hours += trip.hours * count as f64;
    }

    pub fn rounded(self) -> Self {
        Self {
            miles: round1(self.miles),
            hours: round2(self.hours),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamDistanceSummary {
    pub venues: BTreeMap<String, RoundTrip>,
    pub total_miles_events: f64,
    pub total_hours_events: f64,
    pub season_totals: BTreeMap<Season, TravelTotal>,
}

impl TeamDistanceSummary {
    pub fn new() -> Self {
        Self {
            venues: BTreeMap::new(),
            total_miles_events: 0.0,
            total_hours_events: 0.0,
            season_totals: Season::ALL
                .iter()
                .map(|s| (*s, TravelTotal::default()))
                .collect(),
        }
    }
}

impl Default for TeamDistanceSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// League-wide per-venue rollups, overall and per season.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Aggregates {
    pub venue_event_counts: BTreeMap<String, u32>,
    pub venue_event_counts_by_season: BTreeMap<Season, BTreeMap<String, u32>>,
    pub venue_total_miles: BTreeMap<String, f64>,
    pub venue_total_hours: BTreeMap<String, f64>,
    pub venue_total_miles_by_season: BTreeMap<Season, BTreeMap<String, f64>>,
    pub venue_total_hours_by_season: BTreeMap<Season, BTreeMap<String, f64>>,
}

/// Per-entity failures surfaced in the output instead of aborting the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunWarning {
    TeamNotGeocoded { team: String, query: String },
    VenueNotGeocoded { location_key: String, query: String },
    RouteUnavailable {
        team: String,
        location_key: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub generated_at: String,
    pub total_teams: usize,
    pub total_venues: usize,
    pub total_events: usize,
}

/// The single JSON document the leaderboard page fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueData {
    pub teams: Vec<Team>,
    pub venues: Vec<Venue>,
    pub events: Vec<Event>,
    pub distances: BTreeMap<String, TeamDistanceSummary>,
    pub aggregates: Aggregates,
    pub warnings: Vec<RunWarning>,
    pub metadata: Metadata,
}

/// Validated in-memory records from the two input files.
#[derive(Debug, Clone)]
pub struct ParsedInputs {
    pub teams: Vec<Team>,
    pub venues: Vec<Venue>,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub teams_geocoded: usize,
    pub venues_geocoded: usize,
    pub pairs_resolved: usize,
    pub pairs_failed: usize,
    pub warnings: usize,
}

#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub document: LeagueData,
    pub summary: RunSummary,
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
