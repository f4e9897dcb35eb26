//! Weekly cadence checks for forecast input.

use chrono::NaiveDate;
use malaria_forecast_analytics_models::CadencePolicy;

use crate::AnalyticsError;

/// Expected spacing between consecutive observations, in days.
pub const WEEK_DAYS: i64 = 7;

/// Finds the first pair of consecutive dates that are not exactly one week
/// apart. Returns the index of the later date and the gap in days.
#[must_use]
pub fn first_irregular_gap(dates: &[NaiveDate]) -> Option<(usize, i64)> {
    dates
        .windows(2)
        .enumerate()
        .map(|(i, w)| (i + 1, (w[1] - w[0]).num_days()))
        .find(|&(_, gap)| gap != WEEK_DAYS)
}

/// Applies `policy` to the dates of a series about to be forecast.
///
/// # Errors
///
/// Returns [`AnalyticsError::IrregularCadence`] under
/// [`CadencePolicy::Strict`] if any gap differs from seven days, including
/// duplicated dates.
pub fn check_cadence(dates: &[NaiveDate], policy: CadencePolicy) -> Result<(), AnalyticsError> {
    if policy == CadencePolicy::Ignore {
        return Ok(());
    }

    let Some((index, gap_days)) = first_irregular_gap(dates) else {
        return Ok(());
    };
    let previous = dates[index - 1];
    let current = dates[index];

    match policy {
        CadencePolicy::Strict => Err(AnalyticsError::IrregularCadence {
            index,
            previous,
            current,
            gap_days,
        }),
        CadencePolicy::Warn => {
            log::warn!(
                "Series is not weekly: {previous} to {current} is {gap_days} day(s); forecasting anyway"
            );
            Ok(())
        }
        CadencePolicy::Ignore => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekly(start: &str, n: i64) -> Vec<NaiveDate> {
        let start: NaiveDate = start.parse().unwrap();
        (0..n).map(|i| start + chrono::Duration::weeks(i)).collect()
    }

    #[test]
    fn weekly_series_passes_every_policy() {
        let dates = weekly("2024-01-07", 10);
        for policy in [CadencePolicy::Strict, CadencePolicy::Warn, CadencePolicy::Ignore] {
            assert!(check_cadence(&dates, policy).is_ok());
        }
    }

    #[test]
    fn short_series_has_no_gaps() {
        assert!(check_cadence(&[], CadencePolicy::Strict).is_ok());
        assert!(check_cadence(&weekly("2024-01-07", 1), CadencePolicy::Strict).is_ok());
    }

    #[test]
    fn strict_rejects_missing_week() {
        let mut dates = weekly("2024-01-07", 5);
        dates.remove(2);
        let err = check_cadence(&dates, CadencePolicy::Strict).unwrap_err();
        match err {
            AnalyticsError::IrregularCadence {
                index,
                previous,
                current,
                gap_days,
            } => {
                assert_eq!(index, 2);
                assert_eq!(previous.to_string(), "2024-01-14");
                assert_eq!(current.to_string(), "2024-01-28");
                assert_eq!(gap_days, 14);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn strict_rejects_duplicate_dates() {
        let mut dates = weekly("2024-01-07", 3);
        dates.insert(1, dates[0]);
        assert_eq!(first_irregular_gap(&dates), Some((1, 0)));
        assert!(check_cadence(&dates, CadencePolicy::Strict).is_err());
    }

    #[test]
    fn lenient_policies_accept_gaps() {
        let mut dates = weekly("2024-01-07", 5);
        dates.remove(3);
        assert!(check_cadence(&dates, CadencePolicy::Warn).is_ok());
        assert!(check_cadence(&dates, CadencePolicy::Ignore).is_ok());
    }
}
