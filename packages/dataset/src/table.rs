//! The in-memory, date-ordered surveillance table.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use malaria_forecast_surveillance_models::{ALL_REGIONS_LABEL, Observation, RegionSelection};

/// A loaded surveillance dataset, sorted ascending by date.
///
/// Rows that share a date keep their original file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    observations: Vec<Observation>,
}

impl Dataset {
    /// Builds a dataset from observations in any order.
    #[must_use]
    pub fn new(mut observations: Vec<Observation>) -> Self {
        // `sort_by_key` is stable.
        observations.sort_by_key(|o| o.date);
        Self { observations }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Returns `true` if the dataset has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// All rows in date order.
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// First and last observation dates, or `None` if empty.
    #[must_use]
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.observations.first()?;
        let last = self.observations.last()?;
        Some((first.date, last.date))
    }

    /// Distinct regions in order of first appearance.
    #[must_use]
    pub fn regions(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.observations
            .iter()
            .filter(|o| seen.insert(o.region.as_str()))
            .map(|o| o.region.clone())
            .collect()
    }

    /// Region menu options: the "All Regions" sentinel followed by
    /// [`Self::regions`].
    #[must_use]
    pub fn region_options(&self) -> Vec<String> {
        std::iter::once(ALL_REGIONS_LABEL.to_string())
            .chain(self.regions())
            .collect()
    }

    /// Distinct counties within `region`, sorted ascending.
    #[must_use]
    pub fn counties(&self, region: &RegionSelection) -> Vec<String> {
        self.observations
            .iter()
            .filter(|o| region.matches(&o.region))
            .map(|o| o.county.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(String::from)
            .collect()
    }
}
