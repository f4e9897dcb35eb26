//! Region / county / metric selection.

use chrono::NaiveDate;
use malaria_forecast_surveillance_models::{Metric, Observation, RegionSelection, SeriesPoint};
use serde::{Deserialize, Serialize};

use crate::Dataset;

/// The user's current filter choices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Region filter.
    pub region: RegionSelection,
    /// County name (always applied).
    pub county: String,
    /// Column to extract.
    pub metric: Metric,
}

/// One metric narrowed to one region/county selection, in date order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredSeries {
    /// The selection that produced this series.
    pub selection: Selection,
    /// Dated values, non-decreasing by date.
    pub points: Vec<SeriesPoint>,
}

impl FilteredSeries {
    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if no rows matched the selection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The metric this series holds.
    #[must_use]
    pub const fn metric(&self) -> Metric {
        self.selection.metric
    }

    /// Values only, in date order.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Dates only, in order.
    #[must_use]
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Date of the most recent observation.
    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

/// Returns the rows matching `region` (when set) and `county`, in table
/// order.
#[must_use]
pub fn matching_rows<'a>(
    dataset: &'a Dataset,
    region: &RegionSelection,
    county: &str,
) -> Vec<&'a Observation> {
    dataset
        .observations()
        .iter()
        .filter(|o| region.matches(&o.region) && o.county == county)
        .collect()
}

/// Narrows `dataset` to `selection` and extracts the selected metric.
///
/// A selection that matches nothing (for example a county outside the
/// selected region) yields an empty series; consumers decide whether
/// that is an error.
#[must_use]
pub fn select(dataset: &Dataset, selection: &Selection) -> FilteredSeries {
    let points: Vec<SeriesPoint> = matching_rows(dataset, &selection.region, &selection.county)
        .into_iter()
        .map(|o| SeriesPoint {
            date: o.date,
            value: selection.metric.value(o),
        })
        .collect();

    log::debug!(
        "Selected {} point(s) of {} for {} / {}",
        points.len(),
        selection.metric,
        selection.region,
        selection.county
    );

    FilteredSeries {
        selection: selection.clone(),
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(date: &str, region: &str, county: &str, cases: f64, deaths: f64) -> Observation {
        Observation {
            date: date.parse().unwrap(),
            region: region.to_string(),
            county: county.to_string(),
            total_cases: cases,
            severe_cases: cases / 10.0,
            deaths,
            mosquito_density: 1.0,
        }
    }

    fn sample() -> Dataset {
        Dataset::new(vec![
            obs("2024-01-21", "Coast", "Kilifi", 130.0, 3.0),
            obs("2024-01-07", "Coast", "Kilifi", 110.0, 1.0),
            obs("2024-01-07", "Nyanza", "Kisumu", 300.0, 9.0),
            obs("2024-01-14", "Coast", "Kilifi", 120.0, 2.0),
            obs("2024-01-14", "Western", "Kilifi", 5.0, 0.0),
        ])
    }

    fn selection(region: Option<&str>, county: &str, metric: Metric) -> Selection {
        Selection {
            region: RegionSelection::from_option(region),
            county: county.to_string(),
            metric,
        }
    }

    #[test]
    fn filters_by_region_and_county_in_date_order() {
        let dataset = sample();
        let series = select(&dataset, &selection(Some("Coast"), "Kilifi", Metric::TotalCases));
        assert_eq!(series.values(), [110.0, 120.0, 130.0]);
        assert_eq!(series.last_date().unwrap().to_string(), "2024-01-21");
    }

    #[test]
    fn all_regions_only_filters_county() {
        let dataset = sample();
        let series = select(&dataset, &selection(None, "Kilifi", Metric::TotalCases));
        assert_eq!(series.values(), [110.0, 120.0, 5.0, 130.0]);
    }

    #[test]
    fn extracts_selected_metric() {
        let dataset = sample();
        let series = select(&dataset, &selection(Some("Coast"), "Kilifi", Metric::Deaths));
        assert_eq!(series.values(), [1.0, 2.0, 3.0]);
        assert_eq!(series.metric(), Metric::Deaths);
    }

    #[test]
    fn county_outside_region_yields_empty_series() {
        let dataset = sample();
        let series = select(&dataset, &selection(Some("Nyanza"), "Kilifi", Metric::TotalCases));
        assert!(series.is_empty());
        assert!(series.last_date().is_none());
    }

    #[test]
    fn matching_rows_only_returns_matches() {
        let dataset = sample();
        let region = RegionSelection::Region("Coast".to_string());
        let rows = matching_rows(&dataset, &region, "Kilifi");
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|o| o.region == "Coast" && o.county == "Kilifi"));
    }
}
