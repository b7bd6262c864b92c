//! Read-only records deserialized from the Ergast-compatible F1 API.
//!
//! Only the fields the bot renders are modelled. Anything the upstream may
//! omit is an `Option` and renders as a placeholder.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub given_name: String,
    pub family_name: String,
    pub permanent_number: Option<String>,
    pub nationality: Option<String>,
    pub date_of_birth: Option<String>,
}

impl Driver {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Constructor {
    pub name: String,
    pub nationality: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Location {
    pub locality: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Circuit {
    pub circuit_name: Option<String>,
    #[serde(rename = "Location")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Race {
    pub race_name: String,
    pub round: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    #[serde(rename = "Circuit")]
    pub circuit: Option<Circuit>,
}

impl Race {
    /// "locality, country" when both parts are known
    pub fn location(&self) -> Option<String> {
        let location = self.circuit.as_ref()?.location.as_ref()?;
        match (&location.locality, &location.country) {
            (Some(locality), Some(country)) => Some(format!("{}, {}", locality, country)),
            (Some(only), None) | (None, Some(only)) => Some(only.clone()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct QualifyingResult {
    pub position: Option<String>,
    #[serde(rename = "Driver")]
    pub driver: Driver,
    #[serde(rename = "Constructor")]
    pub constructor: Constructor,
    #[serde(rename = "Q1")]
    pub q1: Option<String>,
    #[serde(rename = "Q2")]
    pub q2: Option<String>,
    #[serde(rename = "Q3")]
    pub q3: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ResultTime {
    pub time: Option<String>,
}

/// Entry of a race or sprint classification
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RaceResult {
    pub position: Option<String>,
    #[serde(rename = "Driver")]
    pub driver: Driver,
    #[serde(rename = "Constructor")]
    pub constructor: Constructor,
    #[serde(rename = "Time")]
    pub time: Option<ResultTime>,
    pub status: Option<String>,
}

impl RaceResult {
    pub fn finishing_time(&self) -> Option<&str> {
        self.time.as_ref()?.time.as_deref()
    }
}
