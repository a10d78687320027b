use crate::error::{OrchardOpsError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One plot, one calendar day of forecast as delivered by the fetch layer.
///
/// `plot` may be a canonical slug or free text; the engine resolves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub plot: String,
    pub date: NaiveDate,
    pub temp_max: f64,
    pub temp_min: f64,
    pub relative_humidity: f64,
    pub rain_probability: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rain_mm: Option<f64>,
    /// W/m²
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortwave_radiation_down: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
}

impl DailyForecast {
    pub fn new(plot: impl Into<String>, date: NaiveDate, temp_max: f64, temp_min: f64) -> Self {
        Self {
            plot: plot.into(),
            date,
            temp_max,
            temp_min,
            relative_humidity: 70.0,
            rain_probability: 0.0,
            rain_mm: None,
            shortwave_radiation_down: None,
            fetched_at: None,
        }
    }

    pub fn with_humidity(mut self, rh: f64) -> Self {
        self.relative_humidity = rh;
        self
    }

    pub fn with_rain(mut self, mm: f64) -> Self {
        self.rain_mm = Some(mm);
        self
    }

    pub fn with_rain_probability(mut self, pct: f64) -> Self {
        self.rain_probability = pct;
        self
    }

    pub fn with_radiation(mut self, w_m2: f64) -> Self {
        self.shortwave_radiation_down = Some(w_m2);
        self
    }

    pub fn with_fetched_at(mut self, at: DateTime<Utc>) -> Self {
        self.fetched_at = Some(at);
        self
    }

    pub fn mean_temp(&self) -> f64 {
        (self.temp_max + self.temp_min) / 2.0
    }

    /// Reject rows that would turn into NaN or nonsense downstream.
    pub fn validate(&self) -> Result<()> {
        let context = || format!("{} on {}", self.plot, self.date);

        if !self.temp_max.is_finite() || !self.temp_min.is_finite() {
            return Err(OrchardOpsError::Domain(format!(
                "non-finite temperature for {}",
                context()
            )));
        }
        if !(0.0..=100.0).contains(&self.relative_humidity) {
            return Err(OrchardOpsError::Domain(format!(
                "relative humidity {} outside 0-100% for {}",
                self.relative_humidity,
                context()
            )));
        }
        if !(0.0..=100.0).contains(&self.rain_probability) {
            return Err(OrchardOpsError::Domain(format!(
                "rain probability {} outside 0-100% for {}",
                self.rain_probability,
                context()
            )));
        }
        if let Some(rain) = self.rain_mm {
            if !rain.is_finite() || rain < 0.0 {
                return Err(OrchardOpsError::Domain(format!(
                    "rain amount {} mm invalid for {}",
                    rain,
                    context()
                )));
            }
        }
        if let Some(radiation) = self.shortwave_radiation_down {
            if !radiation.is_finite() || radiation < 0.0 {
                return Err(OrchardOpsError::Domain(format!(
                    "shortwave radiation {} W/m² invalid for {}",
                    radiation,
                    context()
                )));
            }
        }
        Ok(())
    }
}

/// A forecast day with derived agronomic metrics attached.
///
/// Derived values are rounded to 2 decimals (dew point to 1). `gdd_raw` keeps
/// the unrounded value for accumulation and is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedDay {
    #[serde(flatten)]
    pub forecast: DailyForecast,
    /// kPa
    pub vpd: f64,
    /// °C-days
    pub gdd: f64,
    /// mm/day
    pub eto: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dew_point: Option<f64>,
    #[serde(skip)]
    pub gdd_raw: f64,
}

impl EnrichedDay {
    pub fn date(&self) -> NaiveDate {
        self.forecast.date
    }

    pub fn humidity(&self) -> f64 {
        self.forecast.relative_humidity
    }

    pub fn temp_max(&self) -> f64 {
        self.forecast.temp_max
    }

    pub fn rain_mm(&self) -> Option<f64> {
        self.forecast.rain_mm
    }

    pub fn radiation(&self) -> Option<f64> {
        self.forecast.shortwave_radiation_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> DailyForecast {
        DailyForecast::new(
            "durian-hill",
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            34.0,
            24.0,
        )
    }

    #[test]
    fn mean_temp_is_midpoint() {
        assert!((day().mean_temp() - 29.0).abs() < 1e-9);
    }

    #[test]
    fn validate_accepts_ordinary_row() {
        assert!(day().with_humidity(55.0).with_rain(3.2).validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_humidity() {
        let err = day().with_humidity(104.0).validate().unwrap_err();
        assert!(matches!(err, OrchardOpsError::Domain(_)));
    }

    #[test]
    fn validate_rejects_nan_temperature() {
        let mut row = day();
        row.temp_max = f64::NAN;
        assert!(row.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_rain() {
        assert!(day().with_rain(-1.0).validate().is_err());
    }

    #[test]
    fn deserializes_without_optional_fields() {
        let json = r#"{
            "plot": "nursery",
            "date": "2026-03-02",
            "temp_max": 31.5,
            "temp_min": 22.0,
            "relative_humidity": 64,
            "rain_probability": 20
        }"#;
        let row: DailyForecast = serde_json::from_str(json).unwrap();
        assert_eq!(row.rain_mm, None);
        assert_eq!(row.shortwave_radiation_down, None);
        assert_eq!(row.fetched_at, None);
    }
}
