//! Usage forecasting from recent daily totals.
//!
//! The [`Estimator`] trait is a seam: the core ships a simple moving
//! average and hosts may plug in heavier models without touching anything
//! else. Estimators see only a day-ordered series of totals and produce an
//! opaque one-day-ahead estimate.

use crate::libs::ledger::DayTotal;
use chrono::{Duration, NaiveDate};

/// Point confidence reported by the moving-average estimator.
const MOVING_AVERAGE_CONFIDENCE_PCT: u8 = 60;

/// A one-day-ahead usage estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    /// Estimated usage for the next day, in whole minutes.
    pub minutes: u64,
    /// The same estimate in hours, rounded to one decimal.
    pub hours: f64,
    /// Point confidence in percent.
    pub confidence_pct: u8,
    /// Lower bound of the estimate interval, in minutes.
    pub lower_minutes: u64,
    /// Upper bound of the estimate interval, in minutes.
    pub upper_minutes: u64,
    /// The day the estimate is for.
    pub next_date: NaiveDate,
}

/// Produces usage estimates from a day-ordered series of totals.
pub trait Estimator: Send + Sync {
    /// Estimates the day after the last entry of `series`. Returns `None`
    /// when the series is empty.
    fn forecast(&self, series: &[DayTotal]) -> Option<Forecast>;
}

/// Moving-average estimator over the trailing days of the series.
///
/// Each day's seconds are rounded to whole minutes, the last up-to-
/// `lookback` days are averaged, and the estimate interval widens the
/// point estimate by 30 percent in both directions.
pub struct MovingAverageEstimator {
    lookback: usize,
}

impl MovingAverageEstimator {
    pub fn new(lookback: usize) -> Self {
        Self { lookback: lookback.max(1) }
    }
}

impl Default for MovingAverageEstimator {
    fn default() -> Self {
        Self::new(7)
    }
}

impl Estimator for MovingAverageEstimator {
    fn forecast(&self, series: &[DayTotal]) -> Option<Forecast> {
        let last = series.last()?;
        let window = &series[series.len().saturating_sub(self.lookback)..];
        let minute_sum: f64 = window.iter().map(|day| (day.seconds as f64 / 60.0).round()).sum();
        let average = minute_sum / window.len() as f64;
        let minutes = average.round() as u64;
        let predicted = minutes as f64;
        Some(Forecast {
            minutes,
            hours: (predicted / 60.0 * 10.0).round() / 10.0,
            confidence_pct: MOVING_AVERAGE_CONFIDENCE_PCT,
            lower_minutes: (predicted * 0.7).round() as u64,
            upper_minutes: (predicted * 1.3).round() as u64,
            next_date: last.date + Duration::days(1),
        })
    }
}
