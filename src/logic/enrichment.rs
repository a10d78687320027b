use super::calculations::{dew_point, gdd, hargreaves_eto, round_to, vpd};
use crate::error::Result;
use crate::models::{DailyForecast, EnrichedDay, PlotProfile};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Attach VPD, GDD, ETo and dew point to one raw day.
///
/// `raw.plot` is rewritten to the profile's canonical id. Any domain error
/// (inverted temperatures, out-of-range humidity) aborts.
pub fn enrich_day(raw: &DailyForecast, profile: &PlotProfile, gdd_base: f64) -> Result<EnrichedDay> {
    raw.validate()?;

    let mean_temp = raw.mean_temp();
    let eto = hargreaves_eto(raw.temp_max, raw.temp_min, profile.latitude, raw.date)?;
    let gdd_raw = gdd(raw.temp_max, raw.temp_min, gdd_base);

    let mut forecast = raw.clone();
    forecast.plot = profile.id.clone();

    Ok(EnrichedDay {
        forecast,
        vpd: vpd(mean_temp, raw.relative_humidity),
        gdd: round_to(gdd_raw, 2),
        eto,
        dew_point: dew_point(mean_temp, raw.relative_humidity).ok(),
        gdd_raw,
    })
}

/// Enrich a plot's rows in date order.
pub fn enrich_series(
    rows: &[DailyForecast],
    profile: &PlotProfile,
    gdd_base: f64,
) -> Result<Vec<EnrichedDay>> {
    let mut days = rows
        .iter()
        .map(|row| enrich_day(row, profile, gdd_base))
        .collect::<Result<Vec<_>>>()?;
    days.sort_by_key(|d| d.date());
    Ok(days)
}

/// A raw row tagged with whether its plot reference resolved to a known plot.
#[derive(Debug, Clone)]
pub struct SourcedRow {
    pub row: DailyForecast,
    pub resolved: bool,
}

impl SourcedRow {
    pub fn new(row: DailyForecast, resolved: bool) -> Self {
        Self { row, resolved }
    }

    /// Resolved beats fallback, then any timestamp beats none, then newer wins.
    fn rank(&self) -> (bool, Option<DateTime<Utc>>) {
        (self.resolved, self.row.fetched_at)
    }
}

/// Collapse duplicate `(plot, date)` rows.
///
/// A row from a resolved reference always beats one that landed on the plot
/// through fallback. Among equals, a timestamped row beats an untimestamped
/// one and the latest `fetched_at` wins; remaining ties go to the row
/// encountered last.
pub fn dedup_forecasts(rows: Vec<SourcedRow>) -> Vec<DailyForecast> {
    let mut by_key: BTreeMap<(String, NaiveDate), SourcedRow> = BTreeMap::new();

    for candidate in rows {
        let key = (candidate.row.plot.clone(), candidate.row.date);
        match by_key.get(&key) {
            Some(existing) if candidate.rank() < existing.rank() => {
                tracing::warn!("Ignoring duplicate forecast for {} on {}", key.0, key.1);
            }
            Some(_) => {
                tracing::warn!("Replacing duplicate forecast for {} on {}", key.0, key.1);
                by_key.insert(key, candidate);
            }
            None => {
                by_key.insert(key, candidate);
            }
        }
    }

    by_key.into_values().map(|c| c.row).collect()
}

/// Keep only rows within `horizon_days` of the earliest row.
pub fn limit_horizon(rows: Vec<DailyForecast>, horizon_days: u32) -> Vec<DailyForecast> {
    let Some(start) = rows.iter().map(|r| r.date).min() else {
        return rows;
    };
    let Some(end) = start.checked_add_signed(Duration::days(i64::from(horizon_days))) else {
        return rows;
    };

    let before = rows.len();
    let kept: Vec<DailyForecast> = rows.into_iter().filter(|r| r.date < end).collect();
    if kept.len() < before {
        tracing::debug!(
            "Dropped {} forecast rows beyond the {}-day horizon",
            before - kept.len(),
            horizon_days
        );
    }
    kept
}
