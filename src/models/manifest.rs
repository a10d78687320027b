use super::activity::ActivityType;
use super::advisory::Severity;
use super::report::{InsightStatus, Mode, PrimaryMetric};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    EmergencyRed,
    DroughtOrange,
    NominalGreen,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::EmergencyRed => "emergency-red",
            Theme::DroughtOrange => "drought-orange",
            Theme::NominalGreen => "nominal-green",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Grid,
    Focus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Line,
    Bar,
    Combo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Line,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub kind: SeriesKind,
    pub unit: String,
    pub values: Vec<Option<f64>>,
}

impl Dataset {
    pub fn new(label: &str, kind: SeriesKind, unit: &str, values: Vec<Option<f64>>) -> Self {
        Self {
            label: label.to_string(),
            kind,
            unit: unit.to_string(),
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub mode: Mode,
    pub title: String,
    /// One label per forecast day (ISO dates).
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityNote {
    pub date: NaiveDate,
    pub activity_type: ActivityType,
    pub notes: String,
}

/// Typed visual descriptor consumed by the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "component", rename_all = "snake_case")]
pub enum Component {
    InsightBanner {
        emergency: bool,
        severity: Severity,
        headline: String,
        notes: Vec<String>,
    },
    PlotCard {
        plot_id: String,
        title: String,
        tags: Vec<String>,
        status: InsightStatus,
        primary_metric: PrimaryMetric,
        chart: ChartSpec,
        notes: Vec<ActivityNote>,
    },
    AdvisoryTable {
        plot_id: String,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub generated_at: DateTime<Utc>,
    pub theme: Theme,
    pub layout: Layout,
    pub components: Vec<Component>,
}

impl Manifest {
    pub fn plot_cards(&self) -> impl Iterator<Item = &Component> {
        self.components
            .iter()
            .filter(|c| matches!(c, Component::PlotCard { .. }))
    }

    pub fn has_banner(&self) -> bool {
        self.components
            .iter()
            .any(|c| matches!(c, Component::InsightBanner { .. }))
    }
}
