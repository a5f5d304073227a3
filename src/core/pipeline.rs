use crate::adapters::{DistanceClient, GeocodeClient};
use crate::core::aggregate::derive_aggregates;
use crate::core::loader;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{
    LeagueData, Metadata, ParsedInputs, RoundTrip, RunSummary, RunWarning, TeamDistanceSummary,
    TransformOutput,
};
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub struct LeaguePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
}

impl<S: Storage, C: ConfigProvider> LeaguePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            storage,
            config,
            client,
        })
    }

    fn geocoder(&self) -> GeocodeClient {
        GeocodeClient::new(
            self.client.clone(),
            self.config.geocode_endpoint().to_string(),
            self.config.api_key().to_string(),
            self.config.bounds(),
            Duration::from_millis(self.config.request_delay_ms()),
        )
    }

    fn distance_client(&self) -> DistanceClient {
        DistanceClient::new(
            self.client.clone(),
            self.config.distance_endpoint().to_string(),
            self.config.api_key().to_string(),
            Duration::from_millis(self.config.request_delay_ms()),
        )
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for LeaguePipeline<S, C> {
    async fn extract(&self) -> Result<ParsedInputs> {
        let teams_data = self.storage.read_file(self.config.teams_file()).await?;
        let teams = loader::parse_teams(&teams_data, self.config.default_state())?;
        if teams.is_empty() {
            return Err(EtlError::data_format(format!(
                "{}: no teams loaded",
                self.config.teams_file()
            )));
        }

        let events_data = self.storage.read_file(self.config.events_file()).await?;
        let (venues, events) = loader::parse_events(&events_data)?;
        if venues.is_empty() || events.is_empty() {
            return Err(EtlError::data_format(format!(
                "{}: no events loaded",
                self.config.events_file()
            )));
        }

        Ok(ParsedInputs {
            teams,
            venues,
            events,
        })
    }

    async fn transform(&self, inputs: ParsedInputs) -> Result<TransformOutput> {
        let ParsedInputs {
            mut teams,
            mut venues,
            events,
        } = inputs;

        let mut geocoder = self.geocoder();
        let mut router = self.distance_client();
        let mut warnings: Vec<RunWarning> = Vec::new();
        let mut counts = RunSummary::default();

        // Teams geocode by zip with a city fallback; an unresolvable team
        // stays in the output with no coordinate.
        for team in &mut teams {
            let mut resolved = None;
            let mut last_query = String::new();
            for query in [team.zip.as_str(), team.city.as_str()] {
                if query.trim().is_empty() {
                    continue;
                }
                last_query = query.to_string();
                match geocoder.geocode(query, &team.state).await {
                    Ok(coordinate) => {
                        resolved = Some(coordinate);
                        break;
                    }
                    Err(e) if e.is_recoverable() => {
                        tracing::debug!(team = %team.name, %query, error = %e, "geocode attempt failed");
                    }
                    Err(e) => return Err(e),
                }
            }
            team.coordinate = resolved;
            if team.coordinate.is_some() {
                counts.teams_geocoded += 1;
            } else {
                tracing::warn!(team = %team.name, city = %team.city, "team could not be geocoded");
                warnings.push(RunWarning::TeamNotGeocoded {
                    team: team.name.clone(),
                    query: last_query,
                });
            }
        }

        // Each unique venue geocodes once; events keep referencing a failed
        // venue, it just carries no coordinate.
        for venue in &mut venues {
            let query = format!("{}, {}", venue.venue, venue.city);
            match geocoder.geocode(&query, self.config.default_state()).await {
                Ok(coordinate) => {
                    venue.coordinate = Some(coordinate);
                    counts.venues_geocoded += 1;
                }
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(location_key = %venue.location_key, error = %e, "venue could not be geocoded");
                    warnings.push(RunWarning::VenueNotGeocoded {
                        location_key: venue.location_key.clone(),
                        query,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        // Team x venue pairs, each resolved at most once. Teams without a
        // coordinate still get a (zeroed) summary entry.
        let mut distances: BTreeMap<String, TeamDistanceSummary> = BTreeMap::new();
        for team in &teams {
            let entry = distances
                .entry(team.name.clone())
                .or_insert_with(TeamDistanceSummary::new);
            let Some(origin) = team.coordinate else {
                continue;
            };
            for venue in &venues {
                let Some(destination) = venue.coordinate else {
                    continue;
                };
                match router.one_way(&origin, &destination).await {
                    Ok(one_way) => {
                        counts.pairs_resolved += 1;
                        entry
                            .venues
                            .insert(venue.location_key.clone(), RoundTrip::from_one_way(one_way));
                    }
                    Err(e) if e.is_recoverable() => {
                        counts.pairs_failed += 1;
                        tracing::warn!(
                            team = %team.name,
                            location_key = %venue.location_key,
                            error = %e,
                            "pair excluded from totals"
                        );
                        warnings.push(RunWarning::RouteUnavailable {
                            team: team.name.clone(),
                            location_key: venue.location_key.clone(),
                            reason: e.to_string(),
                        });
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        let aggregates = derive_aggregates(&mut distances, &events);
        counts.warnings = warnings.len();

        let metadata = Metadata {
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            total_teams: teams.len(),
            total_venues: venues.len(),
            total_events: events.len(),
        };

        Ok(TransformOutput {
            document: LeagueData {
                teams,
                venues,
                events,
                distances,
                aggregates,
                warnings,
                metadata,
            },
            summary: counts,
        })
    }

    async fn load(&self, output: TransformOutput) -> Result<String> {
        let json = serde_json::to_vec_pretty(&output.document)?;
        tracing::debug!(bytes = json.len(), "writing output document");
        self.storage
            .write_file(self.config.output_file(), &json)
            .await?;
        Ok(format!(
            "{}/{}",
            self.config.data_dir(),
            self.config.output_file()
        ))
    }
}
