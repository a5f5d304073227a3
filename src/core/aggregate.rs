use crate::domain::model::{
    round1, round2, Aggregates, Event, Season, TeamDistanceSummary, TravelTotal,
};
use std::collections::BTreeMap;

/// Folds resolved pair results into per-team totals (overall and by season)
/// and league-wide per-venue rollups. Pure summation: a pair missing from a
/// team's venues map contributes nothing, and iteration over ordered maps
/// keeps the output deterministic.
pub fn derive_aggregates(
    distances: &mut BTreeMap<String, TeamDistanceSummary>,
    events: &[Event],
) -> Aggregates {
    let mut aggregates = Aggregates::default();

    for event in events {
        *aggregates
            .venue_event_counts
            .entry(event.location_key.clone())
            .or_insert(0) += 1;
        *aggregates
            .venue_event_counts_by_season
            .entry(event.season)
            .or_default()
            .entry(event.location_key.clone())
            .or_insert(0) += 1;
    }

    // Team totals: one round trip per event held at a venue the team can reach.
    for summary in distances.values_mut() {
        let mut overall = TravelTotal::default();
        let mut by_season: BTreeMap<Season, TravelTotal> = Season::ALL
            .iter()
            .map(|s| (*s, TravelTotal::default()))
            .collect();

        for event in events {
            if let Some(trip) = summary.venues.get(&event.location_key) {
                overall.add(trip);
                if let Some(total) = by_season.get_mut(&event.season) {
                    total.add(trip);
                }
            }
        }

        summary.total_miles_events = round1(overall.miles);
        summary.total_hours_events = round2(overall.hours);
        summary.season_totals = by_season
            .into_iter()
            .map(|(season, total)| (season, total.rounded()))
            .collect();
    }

    // Venue totals: every team travels there once per event held at the venue.
    for (location_key, count) in &aggregates.venue_event_counts {
        let mut total = TravelTotal::default();
        for summary in distances.values() {
            if let Some(trip) = summary.venues.get(location_key) {
                total.add_weighted(trip, *count);
            }
        }
        aggregates
            .venue_total_miles
            .insert(location_key.clone(), round1(total.miles));
        aggregates
            .venue_total_hours
            .insert(location_key.clone(), round2(total.hours));
    }

    for (season, counts) in &aggregates.venue_event_counts_by_season {
        let mut miles_for_season = BTreeMap::new();
        let mut hours_for_season = BTreeMap::new();
        for (location_key, count) in counts {
            let mut total = TravelTotal::default();
            for summary in distances.values() {
                if let Some(trip) = summary.venues.get(location_key) {
                    total.add_weighted(trip, *count);
                }
            }
            miles_for_season.insert(location_key.clone(), round1(total.miles));
            hours_for_season.insert(location_key.clone(), round2(total.hours));
        }
        aggregates
            .venue_total_miles_by_season
            .insert(*season, miles_for_season);
        aggregates
            .venue_total_hours_by_season
            .insert(*season, hours_for_season);
    }

    aggregates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::RoundTrip;
    use chrono::NaiveDate;

    fn event(year: i32, month: u32, day: u32, location_key: &str) -> Event {
        Event {
            event_id: format!("{}-{:02}-{:02}_{}", year, month, day, location_key),
            year,
            month,
            day,
            season: Season::from_month(month),
            date: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
            location_key: location_key.to_string(),
        }
    }

    fn summary_with(venue: &str, trip: RoundTrip) -> TeamDistanceSummary {
        let mut summary = TeamDistanceSummary::new();
        summary.venues.insert(venue.to_string(), trip);
        summary
    }

    #[test]
    fn test_two_teams_one_venue_two_seasons() {
        let key = "Wenatchee, Squilchuck State Park";
        let trip = RoundTrip {
            miles: 20.0,
            hours: 1.0,
        };
        let mut distances = BTreeMap::new();
        distances.insert("Team A".to_string(), summary_with(key, trip));
        distances.insert("Team B".to_string(), summary_with(key, trip));

        let events = vec![event(2024, 3, 16, key), event(2024, 10, 5, key)];
        let aggregates = derive_aggregates(&mut distances, &events);

        for summary in distances.values() {
            assert_eq!(summary.total_miles_events, 40.0);
            assert_eq!(summary.total_hours_events, 2.0);
            assert_eq!(summary.season_totals[&Season::Spring].miles, 20.0);
            assert_eq!(summary.season_totals[&Season::Fall].miles, 20.0);
            assert_eq!(summary.season_totals[&Season::Other].miles, 0.0);
        }

        assert_eq!(aggregates.venue_event_counts[key], 2);
        assert_eq!(aggregates.venue_total_miles[key], 80.0);
        assert_eq!(aggregates.venue_total_hours[key], 4.0);
        assert_eq!(
            aggregates.venue_event_counts_by_season[&Season::Spring][key],
            1
        );
        assert_eq!(
            aggregates.venue_total_miles_by_season[&Season::Spring][key],
            40.0
        );
    }

    #[test]
    fn test_event_counts_sum_to_input_events() {
        let mut distances = BTreeMap::new();
        distances.insert("Team A".to_string(), TeamDistanceSummary::new());

        let events = vec![
            event(2024, 4, 13, "A, X"),
            event(2024, 5, 4, "A, X"),
            event(2024, 9, 21, "B, Y"),
        ];
        let aggregates = derive_aggregates(&mut distances, &events);

        let total: u32 = aggregates.venue_event_counts.values().sum();
        assert_eq!(total as usize, events.len());
    }

    #[test]
    fn test_missing_pair_contributes_zero_but_team_remains() {
        let key_near = "Near, Venue";
        let key_far = "Far, Venue";
        let mut distances = BTreeMap::new();
        // Team B only resolved the near venue; the far pair failed.
        distances.insert(
            "Team A".to_string(),
            {
                let mut s = summary_with(key_near, RoundTrip { miles: 10.0, hours: 0.5 });
                s.venues
                    .insert(key_far.to_string(), RoundTrip { miles: 100.0, hours: 2.0 });
                s
            },
        );
        distances.insert(
            "Team B".to_string(),
            summary_with(key_near, RoundTrip { miles: 30.0, hours: 1.0 }),
        );

        let events = vec![event(2024, 4, 13, key_near), event(2024, 4, 27, key_far)];
        let aggregates = derive_aggregates(&mut distances, &events);

        assert_eq!(distances["Team A"].total_miles_events, 110.0);
        assert_eq!(distances["Team B"].total_miles_events, 30.0);
        assert_eq!(aggregates.venue_total_miles[key_far], 100.0);
        assert!(distances.contains_key("Team B"));
    }

    #[test]
    fn test_team_with_no_resolved_venues_totals_zero() {
        let mut distances = BTreeMap::new();
        distances.insert("Stranded".to_string(), TeamDistanceSummary::new());

        let events = vec![event(2024, 4, 13, "A, X")];
        derive_aggregates(&mut distances, &events);

        let summary = &distances["Stranded"];
        assert_eq!(summary.total_miles_events, 0.0);
        assert_eq!(summary.total_hours_events, 0.0);
        assert!(summary.venues.is_empty());
    }
}
