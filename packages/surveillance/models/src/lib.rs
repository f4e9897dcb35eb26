#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Surveillance observation types and metric definitions.
//!
//! This crate defines the canonical row shape of a malaria surveillance
//! dataset and the closed set of metrics that can be analyzed or
//! forecast. Every loader normalizes its input into [`Observation`]s.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Label shown for the "no region filter" selection.
pub const ALL_REGIONS_LABEL: &str = "All Regions";

/// Column holding the observation date.
pub const DATE_COLUMN: &str = "date";
/// Column holding the region name.
pub const REGION_COLUMN: &str = "region";
/// Column holding the county name.
pub const COUNTY_COLUMN: &str = "county";

/// Every column a surveillance file must carry, in canonical order.
pub const REQUIRED_COLUMNS: &[&str] = &[
    DATE_COLUMN,
    REGION_COLUMN,
    COUNTY_COLUMN,
    "total_cases",
    "severe_cases",
    "deaths",
    "mosquito_density",
];

/// One row of surveillance data: a single reporting week for one county.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// Reporting date.
    pub date: NaiveDate,
    /// Region the county belongs to.
    pub region: String,
    /// County name.
    pub county: String,
    /// All confirmed malaria cases.
    pub total_cases: f64,
    /// Cases classified as severe.
    pub severe_cases: f64,
    /// Malaria deaths.
    pub deaths: f64,
    /// Vector density index from entomological sampling.
    pub mosquito_density: f64,
}

/// A single dated value of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    /// Observation date.
    pub date: NaiveDate,
    /// Metric value on that date.
    pub value: f64,
}

/// Numeric column that can be summarized, charted, or forecast.
///
/// Parsing accepts the column name (`total_cases`) or the display label
/// (`Total Cases`), case-insensitively. Anything else is rejected.
/// Deserialization goes through the same parser; serialization writes the
/// column name.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case", try_from = "String")]
#[strum(ascii_case_insensitive)]
pub enum Metric {
    /// All confirmed cases.
    #[default]
    #[strum(to_string = "total_cases", serialize = "Total Cases")]
    TotalCases,
    /// Severe cases.
    #[strum(to_string = "severe_cases", serialize = "Severe Cases")]
    SevereCases,
    /// Deaths.
    #[strum(to_string = "deaths", serialize = "Deaths")]
    Deaths,
    /// Mosquito density index.
    #[strum(to_string = "mosquito_density", serialize = "Mosquito Density")]
    MosquitoDensity,
}

impl Metric {
    /// Returns the source column this metric reads from.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::TotalCases => "total_cases",
            Self::SevereCases => "severe_cases",
            Self::Deaths => "deaths",
            Self::MosquitoDensity => "mosquito_density",
        }
    }

    /// Returns the human-readable label used in titles and menus.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TotalCases => "Total Cases",
            Self::SevereCases => "Severe Cases",
            Self::Deaths => "Deaths",
            Self::MosquitoDensity => "Mosquito Density",
        }
    }

    /// Reads this metric's value from an observation.
    #[must_use]
    pub const fn value(self, observation: &Observation) -> f64 {
        match self {
            Self::TotalCases => observation.total_cases,
            Self::SevereCases => observation.severe_cases,
            Self::Deaths => observation.deaths,
            Self::MosquitoDensity => observation.mosquito_density,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::TotalCases,
            Self::SevereCases,
            Self::Deaths,
            Self::MosquitoDensity,
        ]
    }
}

impl TryFrom<String> for Metric {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Region filter: either every region or exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegionSelection {
    /// No region filter.
    #[default]
    AllRegions,
    /// Only rows from this region.
    Region(String),
}

impl RegionSelection {
    /// Builds a selection from an optional region name. `None`, an empty
    /// string, and the [`ALL_REGIONS_LABEL`] sentinel all mean "no filter".
    #[must_use]
    pub fn from_option(region: Option<&str>) -> Self {
        match region.map(str::trim) {
            None | Some("") => Self::AllRegions,
            Some(name) if name.eq_ignore_ascii_case(ALL_REGIONS_LABEL) => Self::AllRegions,
            Some(name) => Self::Region(name.to_string()),
        }
    }

    /// Returns `true` if an observation from `region` passes this filter.
    #[must_use]
    pub fn matches(&self, region: &str) -> bool {
        match self {
            Self::AllRegions => true,
            Self::Region(name) => name == region,
        }
    }

    /// Returns the selected region name, or `None` for all regions.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        match self {
            Self::AllRegions => None,
            Self::Region(name) => Some(name),
        }
    }
}

impl std::fmt::Display for RegionSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AllRegions => f.write_str(ALL_REGIONS_LABEL),
            Self::Region(name) => f.write_str(name),
        }
    }
}
