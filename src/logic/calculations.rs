//! Closed-form agronomic formulas. All temperatures in °C.

use crate::error::{OrchardOpsError, Result};
use chrono::{Datelike, NaiveDate};
use std::f64::consts::PI;

/// Default base temperature for tropical fruit trees.
pub const GDD_BASE_TEMP_C: f64 = 10.0;

/// Solar constant, MJ m⁻² min⁻¹.
const SOLAR_CONSTANT: f64 = 0.0820;

/// MJ m⁻² day⁻¹ to equivalent evaporation in mm/day.
const MJ_TO_MM: f64 = 0.408;

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Growing Degree Days for one day, floored at zero. Unrounded.
pub fn gdd(temp_max: f64, temp_min: f64, base_temp: f64) -> f64 {
    ((temp_max + temp_min) / 2.0 - base_temp).max(0.0)
}

/// Saturation vapor pressure (kPa), Tetens approximation.
pub fn saturation_vapor_pressure(temp: f64) -> f64 {
    0.6108 * ((17.27 * temp) / (temp + 237.3)).exp()
}

/// Vapor Pressure Deficit in kPa, rounded to 2 decimals.
///
/// Never negative for humidity in 0-100%.
pub fn vpd(mean_temp: f64, relative_humidity: f64) -> f64 {
    let svp = saturation_vapor_pressure(mean_temp);
    let avp = svp * (relative_humidity / 100.0);
    round_to((svp - avp).max(0.0), 2)
}

/// Extraterrestrial radiation for a latitude and day, expressed as mm/day of
/// equivalent evaporation.
pub fn extraterrestrial_radiation(latitude_deg: f64, date: NaiveDate) -> f64 {
    let day_of_year = date.ordinal() as f64;
    let phi = latitude_deg.to_radians();

    let inverse_distance = 1.0 + 0.033 * (2.0 * PI / 365.0 * day_of_year).cos();
    let declination = 0.409 * (2.0 * PI / 365.0 * day_of_year - 1.39).sin();

    // Clamped so polar day/night stays defined.
    let cos_ws = (-phi.tan() * declination.tan()).clamp(-1.0, 1.0);
    let sunset_angle = cos_ws.acos();

    let ra_mj = (24.0 * 60.0 / PI)
        * SOLAR_CONSTANT
        * inverse_distance
        * (sunset_angle * phi.sin() * declination.sin()
            + phi.cos() * declination.cos() * sunset_angle.sin());

    (ra_mj * MJ_TO_MM).max(0.0)
}

/// Hargreaves reference evapotranspiration in mm/day, floored at zero and
/// rounded to 2 decimals.
///
/// Requires `temp_max >= temp_min`; anything else is a domain error.
pub fn hargreaves_eto(
    temp_max: f64,
    temp_min: f64,
    latitude_deg: f64,
    date: NaiveDate,
) -> Result<f64> {
    if !temp_max.is_finite() || !temp_min.is_finite() || !latitude_deg.is_finite() {
        return Err(OrchardOpsError::Domain(format!(
            "non-finite ETo input (max {}, min {}, lat {})",
            temp_max, temp_min, latitude_deg
        )));
    }
    if temp_max < temp_min {
        return Err(OrchardOpsError::Domain(format!(
            "temp_max {:.2}°C is below temp_min {:.2}°C on {}",
            temp_max, temp_min, date
        )));
    }
    if !(-90.0..=90.0).contains(&latitude_deg) {
        return Err(OrchardOpsError::Domain(format!(
            "latitude {} outside -90..90",
            latitude_deg
        )));
    }

    let mean_temp = (temp_max + temp_min) / 2.0;
    let ra = extraterrestrial_radiation(latitude_deg, date);
    let eto = 0.0023 * (mean_temp + 17.8) * (temp_max - temp_min).sqrt() * ra;

    Ok(round_to(eto.max(0.0), 2))
}

/// Dew point (Magnus formula), rounded to 1 decimal.
pub fn dew_point(temp: f64, relative_humidity: f64) -> Result<f64> {
    if !(relative_humidity > 0.0 && relative_humidity <= 100.0) || !temp.is_finite() {
        return Err(OrchardOpsError::Domain(format!(
            "dew point undefined for {}°C at {}% RH",
            temp, relative_humidity
        )));
    }
    let alpha = (17.27 * temp) / (237.7 + temp) + (relative_humidity / 100.0).ln();
    Ok(round_to((237.7 * alpha) / (17.27 - alpha), 1))
}
