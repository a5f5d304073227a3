use crate::core::Pipeline;
use crate::domain::model::{LeagueData, RunSummary};
use crate::utils::error::Result;
use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_path: String,
    pub summary: RunSummary,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<RunReport> {
        tracing::info!("Loading teams and events");
        let inputs = self.pipeline.extract().await?;
        tracing::info!(
            teams = inputs.teams.len(),
            venues = inputs.venues.len(),
            events = inputs.events.len(),
            "Inputs loaded"
        );

        tracing::info!("Geocoding and resolving team-venue distances");
        let output = self.pipeline.transform(inputs).await?;
        let summary = output.summary;
        tracing::info!(
            teams_geocoded = summary.teams_geocoded,
            venues_geocoded = summary.venues_geocoded,
            pairs_resolved = summary.pairs_resolved,
            pairs_failed = summary.pairs_failed,
            warnings = summary.warnings,
            "Transform complete"
        );
        log_leaders(&output.document);

        let output_path = self.pipeline.load(output).await?;
        tracing::info!(path = %output_path, "Output written");

        Ok(RunReport {
            output_path,
            summary,
        })
    }
}

fn log_leaders(document: &LeagueData) {
    let mut venues: Vec<_> = document
        .aggregates
        .venue_total_miles
        .iter()
        .map(|(key, miles)| (key, *miles))
        .collect();
    venues.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    for (rank, (location_key, miles)) in venues.into_iter().take(5).enumerate() {
        tracing::info!(rank = rank + 1, %location_key, miles, "Top venue by total miles");
    }

    let mut teams: Vec<_> = document
        .distances
        .iter()
        .map(|(name, summary)| (name, summary.total_miles_events))
        .collect();
    teams.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    for (rank, (name, miles)) in teams.into_iter().take(5).enumerate() {
        tracing::info!(rank = rank + 1, team = %name, miles, "Top team by total miles");
    }
}
