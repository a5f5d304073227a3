use crate::domain::model::{Event, Season, Team, Venue};
use crate::utils::error::{EtlError, Result};
use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

/// Venue spellings that vary across seasons of the events file, mapped to one
/// canonical name so they share a single location_key.
const VENUE_STANDARDIZATION: &[(&str, &str)] = &[
    ("360 Trails Park", "360 Trails"),
    ("360 Trails (State Championship and Relay)", "360 Trails"),
    ("Squilchuck (Race + Camping)", "Squilchuck State Park"),
    ("Squilchuck (State Park)", "Squilchuck State Park"),
    ("Riverside (State Park)", "Riverside State Park"),
    ("Cle Elum-Roslyn High School", "Roslyn High School"),
];

/// Known host venues for events listed only as "(local venue)". Ephrata maps
/// to its own city center rather than the generic default.
const LOCAL_VENUE_OVERRIDES: &[(&str, &str)] = &[
    ("Spokane", "Riverside State Park"),
    ("Winthrop", "Liberty Bell High School"),
    ("Ephrata", "Ephrata, WA"),
];

const LOCAL_VENUE_DEFAULT: &str = "Riverside State Park";

#[derive(Debug, serde::Deserialize)]
struct TeamRow {
    #[serde(rename = "Team", default)]
    team: String,
    #[serde(rename = "City", default)]
    city: String,
    #[serde(rename = "State", default)]
    state: String,
    #[serde(rename = "Zip", default)]
    zip: String,
}

#[derive(Debug, serde::Deserialize)]
struct EventRow {
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "Date", default)]
    date: String,
    #[serde(rename = "City", default)]
    city: String,
    #[serde(rename = "Venue", default)]
    venue: String,
}

pub fn parse_teams(data: &[u8], default_state: &str) -> Result<Vec<Team>> {
    let mut reader = csv::Reader::from_reader(data);
    require_columns(reader.headers()?, &["Team", "City", "State", "Zip"], "teams file")?;

    let mut teams = Vec::new();
    for (index, result) in reader.deserialize::<TeamRow>().enumerate() {
        let row = result
            .map_err(|e| EtlError::data_format(format!("teams file row {}: {}", index + 2, e)))?;

        let name = row.team.trim().to_string();
        if name.is_empty() {
            tracing::debug!(row = index + 2, "skipping teams row with empty name");
            continue;
        }

        let state = match row.state.trim() {
            "" => default_state.to_string(),
            s => s.to_string(),
        };
        let city = clean_city_field(&name, row.city.trim());

        teams.push(Team {
            name,
            city,
            state,
            zip: row.zip.trim().to_string(),
            coordinate: None,
        });
    }
    Ok(teams)
}

/// Parses the events file into dated events plus the deduplicated venue set
/// (first-seen input order, coordinates unresolved).
pub fn parse_events(data: &[u8]) -> Result<(Vec<Venue>, Vec<Event>)> {
    let mut reader = csv::Reader::from_reader(data);
    require_columns(reader.headers()?, &["Year", "Date", "City", "Venue"], "events file")?;

    let mut venues: Vec<Venue> = Vec::new();
    let mut seen_keys: HashSet<String> = HashSet::new();
    let mut events = Vec::new();

    for (index, result) in reader.deserialize::<EventRow>().enumerate() {
        let row_number = index + 2;
        let row = result
            .map_err(|e| EtlError::data_format(format!("events file row {}: {}", row_number, e)))?;

        let city = row.city.trim().to_string();
        let venue_in = row.venue.trim();
        let date_in = row.date.trim();
        let year_in = row.year.trim();
        if city.is_empty() || venue_in.is_empty() || date_in.is_empty() || year_in.is_empty() {
            tracing::debug!(row = row_number, "skipping incomplete events row");
            continue;
        }

        let year: i32 = year_in.parse().map_err(|_| {
            EtlError::data_format(format!(
                "events file row {}: non-numeric year '{}'",
                row_number, year_in
            ))
        })?;
        let (month, day) = parse_month_day(date_in, row_number)?;
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            EtlError::data_format(format!(
                "events file row {}: {}-{:02}-{:02} is not a valid calendar date",
                row_number, year, month, day
            ))
        })?;

        let venue = standardize_venue_name(&city, venue_in);
        let location_key = format!("{}, {}", city, venue);

        if seen_keys.insert(location_key.clone()) {
            venues.push(Venue {
                location_key: location_key.clone(),
                city: city.clone(),
                venue: venue.clone(),
                coordinate: None,
            });
        }

        events.push(Event {
            event_id: format!("{}_{}_{}", date, city, underscore_whitespace(&venue)),
            year,
            month,
            day,
            season: Season::from_month(month),
            date,
            location_key,
        });
    }

    Ok((venues, events))
}

fn require_columns(headers: &csv::StringRecord, required: &[&str], file: &str) -> Result<()> {
    for column in required {
        if !headers.iter().any(|h| h.trim() == *column) {
            return Err(EtlError::data_format(format!(
                "{}: missing required column '{}'",
                file, column
            )));
        }
    }
    Ok(())
}

fn parse_month_day(date: &str, row_number: usize) -> Result<(u32, u32)> {
    let bad = || {
        EtlError::data_format(format!(
            "events file row {}: date '{}' is not in M/D form",
            row_number, date
        ))
    };
    let (month, day) = date.split_once('/').ok_or_else(bad)?;
    let month: u32 = month.trim().parse().map_err(|_| bad())?;
    let day: u32 = day.trim().parse().map_err(|_| bad())?;
    Ok((month, day))
}

pub fn standardize_venue_name(city: &str, venue: &str) -> String {
    let venue = venue.trim();
    if venue == "(local venue)" {
        let city_lower = city.to_lowercase();
        for (known_city, host_venue) in LOCAL_VENUE_OVERRIDES {
            if city_lower.contains(&known_city.to_lowercase()) {
                return host_venue.to_string();
            }
        }
        return LOCAL_VENUE_DEFAULT.to_string();
    }
    VENUE_STANDARDIZATION
        .iter()
        .find(|(raw, _)| *raw == venue)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| venue.to_string())
}

/// Strips a team name that leaked into the city field ("Anacortes Composite
/// Anacortes" style duplication in the source data).
pub fn clean_city_field(team_name: &str, city: &str) -> String {
    if city.is_empty() {
        return city.to_string();
    }
    let Ok(name_re) = RegexBuilder::new(&regex::escape(team_name))
        .case_insensitive(true)
        .build()
    else {
        return city.to_string();
    };
    let stripped = name_re.replace_all(city, "");
    let collapsed = collapse_spaces(stripped.trim());
    if collapsed.is_empty() {
        city.to_string()
    } else {
        collapsed
    }
}

fn collapse_spaces(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn underscore_whitespace(value: &str) -> String {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex literal"));
    re.replace_all(value, "_").into_owned()
}
