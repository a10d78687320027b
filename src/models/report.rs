use super::activity::ActivityRecord;
use super::advisory::{Advisory, AdvisoryCategory, Severity};
use super::forecast::EnrichedDay;
use super::plot_profile::PlotProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metric family that drives a plot's (or the system's) primary chart and headline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Vpd,
    Rain,
    Temp,
    #[default]
    Default,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Vpd => "vpd",
            Mode::Rain => "rain",
            Mode::Temp => "temp",
            Mode::Default => "default",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a plot's resolved mode came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeSource {
    Profile,
    #[default]
    Global,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightStatus {
    #[default]
    Normal,
    Watch,
    Critical,
}

/// Upstream flag attached to a plot before aggregation, e.g. a manual
/// agronomist override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightOverride {
    pub plot: String,
    pub status: InsightStatus,
    pub headline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
}

/// Data freshness, ordered from best to worst.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataIntegrity {
    Fresh,
    #[default]
    Stale,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapAnalysis {
    pub integrity: DataIntegrity,
    pub external_search_needed: bool,
    pub covers_today: bool,
    pub missing_plots: Vec<String>,
    /// Whole hours between now and the earliest forecast date present.
    pub last_update_hours: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimaryMetric {
    pub label: String,
    pub value: Option<f64>,
    pub unit: String,
}

impl PrimaryMetric {
    pub fn new(label: &str, value: Option<f64>, unit: &str) -> Self {
        Self {
            label: label.to_string(),
            value,
            unit: unit.to_string(),
        }
    }
}

/// Horizon-wide figures for one plot. Sums are accumulated unrounded and
/// rounded to 2 decimals for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotSummary {
    pub days: usize,
    pub cumulative_gdd: f64,
    pub total_rain_mm: f64,
    pub total_eto_mm: f64,
    pub water_balance_mm: f64,
    pub max_rain_mm: f64,
    pub max_vpd: f64,
    pub peak_severity: Option<Severity>,
    pub advisory_counts: BTreeMap<AdvisoryCategory, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotInsight {
    pub status: InsightStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    /// Mode carried by an upstream override, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_mode: Option<Mode>,
    pub mode: Mode,
    pub mode_source: ModeSource,
    pub primary_metric: PrimaryMetric,
    pub summary: PlotSummary,
}

/// Per-plot situation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sitrep {
    pub profile: PlotProfile,
    /// Input references that did not match and fell back onto this plot.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved_refs: Vec<String>,
    pub forecast: Vec<EnrichedDay>,
    pub advisories: Vec<Advisory>,
    pub recent_activities: Vec<ActivityRecord>,
    pub pending_actions: Vec<ActivityRecord>,
    pub insight: PlotInsight,
}

impl Sitrep {
    pub fn new(profile: PlotProfile) -> Self {
        Self {
            profile,
            unresolved_refs: Vec::new(),
            forecast: Vec::new(),
            advisories: Vec::new(),
            recent_activities: Vec::new(),
            pending_actions: Vec::new(),
            insight: PlotInsight::default(),
        }
    }

    pub fn plot_id(&self) -> &str {
        &self.profile.id
    }

    pub fn has_forecast(&self) -> bool {
        !self.forecast.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalInsight {
    pub emergency: bool,
    pub mode: Mode,
    pub headline: String,
    pub severity: Severity,
    pub max_rain_mm: f64,
    pub max_vpd: f64,
    /// Plot whose critical flag decided the headline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_plot: Option<String>,
    pub notes: Vec<String>,
}

/// Root aggregate returned by one engine invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemReport {
    pub generated_at: DateTime<Utc>,
    pub horizon_days: u32,
    pub gap_analysis: GapAnalysis,
    pub global: GlobalInsight,
    pub plots: BTreeMap<String, Sitrep>,
}

impl SystemReport {
    pub fn plot(&self, id: &str) -> Option<&Sitrep> {
        self.plots.get(id)
    }

    pub fn advisory_count(&self) -> usize {
        self.plots.values().map(|s| s.advisories.len()).sum()
    }
}
