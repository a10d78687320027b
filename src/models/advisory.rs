use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryCategory {
    Irrigation,
    Disease,
    Physiology,
    Pest,
}

impl AdvisoryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdvisoryCategory::Irrigation => "irrigation",
            AdvisoryCategory::Disease => "disease",
            AdvisoryCategory::Physiology => "physiology",
            AdvisoryCategory::Pest => "pest",
        }
    }
}

impl std::fmt::Display for AdvisoryCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered: `Info < Optimal < Warning < Critical`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Info,
    Optimal,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Optimal => "optimal",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One rule family's verdict for one plot-day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub plot_id: String,
    pub target_date: NaiveDate,
    pub category: AdvisoryCategory,
    pub severity: Severity,
    /// Identifier of the condition that fired, e.g. `irrigation.low_humidity`.
    pub rule_id: String,
    pub message: String,
    /// Inputs that fired the rule, kept for audit.
    pub trigger_data: BTreeMap<String, serde_json::Value>,
}

impl Advisory {
    pub fn new(
        plot_id: impl Into<String>,
        target_date: NaiveDate,
        category: AdvisoryCategory,
        severity: Severity,
        rule_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            plot_id: plot_id.into(),
            target_date,
            category,
            severity,
            rule_id: rule_id.into(),
            message: message.into(),
            trigger_data: BTreeMap::new(),
        }
    }

    pub fn with_trigger(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.trigger_data.insert(key.to_string(), value.into());
        self
    }

    pub fn trigger_f64(&self, key: &str) -> Option<f64> {
        self.trigger_data.get(key).and_then(|v| v.as_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(Severity::Info < Severity::Optimal);
        assert!(Severity::Optimal < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
        assert_eq!(
            [Severity::Warning, Severity::Info, Severity::Critical]
                .into_iter()
                .max(),
            Some(Severity::Critical)
        );
    }

    #[test]
    fn trigger_data_is_recorded() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let advisory = Advisory::new(
            "nursery",
            date,
            AdvisoryCategory::Irrigation,
            Severity::Warning,
            "irrigation.low_humidity",
            "Humidity low",
        )
        .with_trigger("rh", 45.0)
        .with_trigger("soil", "loamy");

        assert_eq!(advisory.trigger_f64("rh"), Some(45.0));
        assert_eq!(
            advisory.trigger_data.get("soil").and_then(|v| v.as_str()),
            Some("loamy")
        );
        assert_eq!(advisory.trigger_f64("missing"), None);
    }

    #[test]
    fn serializes_enums_in_snake_case() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let advisory = Advisory::new(
            "nursery",
            date,
            AdvisoryCategory::Pest,
            Severity::Optimal,
            "pest.zero_rain",
            "Thrips watch",
        );
        let json = serde_json::to_value(&advisory).unwrap();
        assert_eq!(json["category"], "pest");
        assert_eq!(json["severity"], "optimal");
        assert_eq!(json["target_date"], "2026-03-01");
    }
}
