use crate::error::{OrchardOpsError, Result};
use crate::models::{ActivityRecord, DailyForecast, InsightOverride};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Path value that means "read standard input".
pub const STDIN_MARKER: &str = "-";

// Input files are either a bare array or an object wrapping it under a key
// named for the row type, as exported by the fetch layer.
fn parse_rows<T: DeserializeOwned>(content: &str, what: &str, key: &str) -> Result<Vec<T>> {
    if content.trim().is_empty() {
        return Err(OrchardOpsError::InvalidData(format!("{} input is empty", what)));
    }

    let rows = match serde_json::from_str::<Value>(content)? {
        rows @ Value::Array(_) => rows,
        Value::Object(mut wrapper) => wrapper.remove(key).ok_or_else(|| {
            OrchardOpsError::InvalidData(format!(
                "{} input must be an array or an object with a '{}' array",
                what, key
            ))
        })?,
        _ => {
            return Err(OrchardOpsError::InvalidData(format!(
                "{} input must be a JSON array",
                what
            )))
        }
    };

    let rows: Vec<T> = serde_json::from_value(rows)?;
    tracing::debug!("Parsed {} {} rows", rows.len(), what);
    Ok(rows)
}

pub fn parse_forecasts(content: &str) -> Result<Vec<DailyForecast>> {
    parse_rows(content, "forecast", "forecasts")
}

pub fn parse_activities(content: &str) -> Result<Vec<ActivityRecord>> {
    parse_rows(content, "activity", "activities")
}

pub fn parse_overrides(content: &str) -> Result<Vec<InsightOverride>> {
    parse_rows(content, "override", "overrides")
}

/// Read a file, or standard input when `path` is `-`.
pub async fn read_source(path: &Path) -> Result<String> {
    if path.as_os_str() == STDIN_MARKER {
        let mut content = String::new();
        tokio::io::stdin().read_to_string(&mut content).await?;
        return Ok(content);
    }

    tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            OrchardOpsError::NotFound(format!("input file {}", path.display()))
        } else {
            OrchardOpsError::Io(e)
        }
    })
}

pub async fn load_forecasts(path: &Path) -> Result<Vec<DailyForecast>> {
    parse_forecasts(&read_source(path).await?)
}

pub async fn load_activities(path: &Path) -> Result<Vec<ActivityRecord>> {
    parse_activities(&read_source(path).await?)
}

pub async fn load_overrides(path: &Path) -> Result<Vec<InsightOverride>> {
    parse_overrides(&read_source(path).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityType, InsightStatus, Mode};
    use chrono::NaiveDate;

    #[test]
    fn parses_bare_forecast_array() {
        let json = r#"[
            {"plot": "สวนมะขาม", "date": "2026-03-01", "temp_max": 34.5, "temp_min": 23.0,
             "relative_humidity": 48, "rain_probability": 10, "rain_mm": 0.0,
             "shortwave_radiation_down": 640.0, "fetched_at": "2026-03-01T00:30:00Z"}
        ]"#;
        let rows = parse_forecasts(json).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].plot, "สวนมะขาม");
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(rows[0].rain_mm, Some(0.0));
        assert!(rows[0].fetched_at.is_some());
    }

    #[test]
    fn parses_wrapped_forecasts_with_optional_fields_missing() {
        let json = r#"{"forecasts": [
            {"plot": "nursery", "date": "2026-03-02", "temp_max": 31, "temp_min": 22,
             "relative_humidity": 80, "rain_probability": 60}
        ]}"#;
        let rows = parse_forecasts(json).unwrap();
        assert_eq!(rows[0].rain_mm, None);
        assert_eq!(rows[0].shortwave_radiation_down, None);
    }

    #[test]
    fn parses_activities_with_pending_action() {
        let json = r#"{"activities": [
            {"date": "2026-02-27", "type": "spraying", "plot": "durian-hill",
             "notes": "copper oxychloride",
             "pending_action": {"action_text": "Re-spray after rain", "status": "pending"}}
        ]}"#;
        let rows = parse_activities(json).unwrap();
        assert_eq!(rows[0].activity_type, ActivityType::Spraying);
        assert!(rows[0].is_pending());
    }

    #[test]
    fn parses_overrides() {
        let json = r#"[{"plot": "durian-hill", "status": "critical",
                        "headline": "Phytophthora confirmed", "mode": "rain"}]"#;
        let rows = parse_overrides(json).unwrap();
        assert_eq!(rows[0].status, InsightStatus::Critical);
        assert_eq!(rows[0].mode, Some(Mode::Rain));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            parse_forecasts("  \n"),
            Err(OrchardOpsError::InvalidData(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(
            parse_forecasts(r#"[{"plot": "x"}]"#),
            Err(OrchardOpsError::Json(_))
        ));
    }

    #[test]
    fn wrapper_key_must_match_row_type() {
        let json = r#"{"forecasts": [
            {"date": "2026-03-01", "type": "watering", "plot": "nursery"}
        ]}"#;
        assert!(matches!(
            parse_activities(json),
            Err(OrchardOpsError::InvalidData(_))
        ));
    }

    #[test]
    fn field_errors_name_the_field() {
        let err = parse_forecasts(r#"{"forecasts": [{"plot": "nursery", "date": "2026-03-01"}]}"#)
            .unwrap_err();
        assert!(matches!(err, OrchardOpsError::Json(_)));
        assert!(err.to_string().contains("temp_max"), "{}", err);
    }

    #[test]
    fn scalar_input_is_rejected() {
        assert!(matches!(
            parse_overrides("42"),
            Err(OrchardOpsError::InvalidData(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = load_forecasts(Path::new("/nonexistent/orchardops/forecast.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchardOpsError::NotFound(_)));
    }

    #[tokio::test]
    async fn loads_from_file() {
        let path = std::env::temp_dir().join(format!("orchardops-{}.json", std::process::id()));
        tokio::fs::write(
            &path,
            r#"[{"date": "2026-03-01", "type": "watering", "plot": "nursery"}]"#,
        )
        .await
        .unwrap();
        let rows = load_activities(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();
        assert_eq!(rows[0].notes, "");
    }
}
