//! Remote F1 data client
//!
//! Issues unauthenticated GET requests against a fixed set of Ergast-style
//! endpoints and extracts the record list each command renders. No retries
//! happen here; callers decide what to do with a [`FetchError`].

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, Instrument};

use crate::api_errors::FetchError;
use crate::config::ApiConfig;
use crate::errors::error_logging;
use crate::observability;

/// One step of the fixed JSON path leading to a record list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSegment {
    Key(&'static str),
    Index(usize),
}

use PathSegment::{Index, Key};

/// Read-only endpoints consumed by the data commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Drivers,
    Constructors,
    Schedule,
    Qualifying,
    LastRace,
    Sprint,
    NextRace,
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Drivers => "drivers",
            Endpoint::Constructors => "constructors",
            Endpoint::Schedule => "schedule",
            Endpoint::Qualifying => "qualifying",
            Endpoint::LastRace => "last_race",
            Endpoint::Sprint => "sprint",
            Endpoint::NextRace => "next_race",
        }
    }

    /// Full request URL for this endpoint under the given configuration
    pub fn url(&self, config: &ApiConfig) -> String {
        let base = config.base();
        let season = &config.season;
        let round = &config.round;
        match self {
            Endpoint::Drivers => format!("{}/{}/drivers.json", base, season),
            Endpoint::Constructors => format!("{}/{}/constructors.json", base, season),
            Endpoint::Schedule => format!("{}/{}.json", base, season),
            Endpoint::Qualifying => format!("{}/{}/{}/qualifying.json", base, season, round),
            Endpoint::LastRace => format!("{}/{}/{}/results.json", base, season, round),
            Endpoint::Sprint => format!("{}/{}/{}/sprint.json", base, season, round),
            Endpoint::NextRace => format!("{}/current/next.json", base),
        }
    }

    /// JSON path from the response root to the record list
    pub fn path(&self) -> &'static [PathSegment] {
        match self {
            Endpoint::Drivers => &[Key("MRData"), Key("DriverTable"), Key("Drivers")],
            Endpoint::Constructors => {
                &[Key("MRData"), Key("ConstructorTable"), Key("Constructors")]
            }
            Endpoint::Schedule | Endpoint::NextRace => {
                &[Key("MRData"), Key("RaceTable"), Key("Races")]
            }
            Endpoint::Qualifying => &[
                Key("MRData"),
                Key("RaceTable"),
                Key("Races"),
                Index(0),
                Key("QualifyingResults"),
            ],
            Endpoint::LastRace => &[
                Key("MRData"),
                Key("RaceTable"),
                Key("Races"),
                Index(0),
                Key("Results"),
            ],
            Endpoint::Sprint => &[
                Key("MRData"),
                Key("RaceTable"),
                Key("Races"),
                Index(0),
                Key("SprintResults"),
            ],
        }
    }
}

/// Follow `path` through `root` and deserialize the array found there.
///
/// A missing array element (no race for the round yet) yields an empty list;
/// a missing object key or a non-array target is a decode error.
pub fn extract_list<T: DeserializeOwned>(
    root: &Value,
    path: &[PathSegment],
) -> Result<Vec<T>, FetchError> {
    let mut current = root;
    for segment in path {
        current = match segment {
            Key(key) => current
                .get(*key)
                .ok_or_else(|| FetchError::Decode(format!("missing field '{}'", key)))?,
            Index(index) => {
                let items = current.as_array().ok_or_else(|| {
                    FetchError::Decode(format!("expected a list before index {}", index))
                })?;
                match items.get(*index) {
                    Some(item) => item,
                    None => return Ok(Vec::new()),
                }
            }
        };
    }

    let items = current
        .as_array()
        .ok_or_else(|| FetchError::Decode("record list is not an array".to_string()))?;

    items
        .iter()
        .map(|item| serde_json::from_value(item.clone()).map_err(FetchError::from))
        .collect()
}

/// HTTP client for the F1 data API
#[derive(Debug, Clone)]
pub struct F1ApiClient {
    client: Client,
    config: ApiConfig,
}

impl F1ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    /// GET the endpoint and parse the body as JSON
    pub async fn fetch(&self, endpoint: Endpoint) -> Result<Value, FetchError> {
        let url = endpoint.url(&self.config);
        let span = observability::api_span(endpoint.name());
        let start = Instant::now();

        let result = async {
            debug!(url = %url, "Fetching F1 data");
            let response = self.client.get(&url).send().await?.error_for_status()?;
            let body = response.text().await?;
            serde_json::from_str::<Value>(&body).map_err(FetchError::from)
        }
        .instrument(span)
        .await;

        observability::record_fetch_metrics(endpoint.name(), result.is_ok(), start.elapsed());
        if let Err(e) = &result {
            error_logging::log_network_error(e, "fetch", Some(&url), Some(1));
        }
        result
    }

    /// Fetch the endpoint and deserialize the records at its fixed path
    pub async fn fetch_list<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
    ) -> Result<Vec<T>, FetchError> {
        let value = self.fetch(endpoint).await?;
        extract_list(&value, endpoint.path())
    }
}
