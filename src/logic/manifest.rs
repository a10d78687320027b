use crate::error::{OrchardOpsError, Result};
use crate::models::{
    ActivityNote, ChartSpec, ChartType, Component, Dataset, EnrichedDay, Layout, Manifest, Mode,
    SeriesKind, Sitrep, SystemReport, Theme,
};

/// VPD (kPa) above which the dashboard switches to the drought palette.
/// Independent of the transpiration-alert threshold used for mode selection.
pub const DROUGHT_THEME_VPD_KPA: f64 = 1.5;

const MAX_ACTIVITY_NOTES: usize = 2;

const ADVISORY_COLUMNS: [&str; 4] = ["date", "category", "severity", "message"];

/// Maps an aggregated report onto ordered visual descriptors.
pub struct ManifestAssembler<'a> {
    report: &'a SystemReport,
    focus: Option<&'a str>,
}

impl<'a> ManifestAssembler<'a> {
    pub fn new(report: &'a SystemReport) -> Self {
        Self {
            report,
            focus: None,
        }
    }

    /// Render only this plot (canonical id); drops the global banner.
    pub fn with_focus(mut self, plot_id: Option<&'a str>) -> Self {
        self.focus = plot_id;
        self
    }

    pub fn assemble(&self) -> Result<Manifest> {
        let global = &self.report.global;
        let mut components = Vec::new();

        let plots: Vec<&Sitrep> = match self.focus {
            Some(id) => {
                let sitrep = self.report.plot(id).ok_or_else(|| {
                    OrchardOpsError::NotFound(format!("plot '{}' is not in the report", id))
                })?;
                vec![sitrep]
            }
            None => {
                components.push(Component::InsightBanner {
                    emergency: global.emergency,
                    severity: global.severity,
                    headline: global.headline.clone(),
                    notes: global.notes.clone(),
                });
                self.report.plots.values().collect()
            }
        };

        for sitrep in plots {
            components.push(plot_card(sitrep));
            if !sitrep.advisories.is_empty() {
                components.push(advisory_table(sitrep));
            }
        }

        let layout = if self.focus.is_some() {
            Layout::Focus
        } else {
            Layout::Grid
        };

        tracing::debug!(
            "Assembled manifest: {} components, layout {:?}",
            components.len(),
            layout
        );

        Ok(Manifest {
            generated_at: self.report.generated_at,
            theme: theme_for(self.report),
            layout,
            components,
        })
    }
}

pub fn theme_for(report: &SystemReport) -> Theme {
    if report.global.emergency {
        Theme::EmergencyRed
    } else if report.global.max_vpd > DROUGHT_THEME_VPD_KPA {
        Theme::DroughtOrange
    } else {
        Theme::NominalGreen
    }
}

fn plot_card(sitrep: &Sitrep) -> Component {
    let insight = &sitrep.insight;

    let notes = sitrep
        .recent_activities
        .iter()
        .take(MAX_ACTIVITY_NOTES)
        .map(|a| ActivityNote {
            date: a.date,
            activity_type: a.activity_type,
            notes: a.notes.clone(),
        })
        .collect();

    Component::PlotCard {
        plot_id: sitrep.plot_id().to_string(),
        title: sitrep.profile.name_local.clone(),
        tags: sitrep.profile.tags(),
        status: insight.status,
        primary_metric: insight.primary_metric.clone(),
        chart: chart_for(insight.mode, &sitrep.forecast),
        notes,
    }
}

/// Chart descriptor for one plot, shaped by its resolved mode.
pub fn chart_for(mode: Mode, days: &[EnrichedDay]) -> ChartSpec {
    let labels = days.iter().map(|d| d.date().to_string()).collect();
    let series = |f: fn(&EnrichedDay) -> Option<f64>| days.iter().map(f).collect::<Vec<_>>();

    let (chart_type, title, datasets) = match mode {
        Mode::Vpd => (
            ChartType::Line,
            "Vapor pressure deficit",
            vec![Dataset::new(
                "VPD",
                SeriesKind::Line,
                "kPa",
                series(|d| Some(d.vpd)),
            )],
        ),
        Mode::Rain => (
            ChartType::Bar,
            "Rain vs. evapotranspiration",
            vec![
                Dataset::new("Rain", SeriesKind::Bar, "mm", series(|d| d.rain_mm())),
                Dataset::new("ETo", SeriesKind::Line, "mm", series(|d| Some(d.eto))),
            ],
        ),
        Mode::Temp => (
            ChartType::Line,
            "Temperature range",
            vec![
                Dataset::new(
                    "Max temp",
                    SeriesKind::Line,
                    "°C",
                    series(|d| Some(d.forecast.temp_max)),
                ),
                Dataset::new(
                    "Min temp",
                    SeriesKind::Line,
                    "°C",
                    series(|d| Some(d.forecast.temp_min)),
                ),
            ],
        ),
        Mode::Default => (
            ChartType::Combo,
            "Temperature and rain chance",
            vec![
                Dataset::new(
                    "Max temp",
                    SeriesKind::Line,
                    "°C",
                    series(|d| Some(d.forecast.temp_max)),
                ),
                Dataset::new(
                    "Rain chance",
                    SeriesKind::Bar,
                    "%",
                    series(|d| Some(d.forecast.rain_probability)),
                ),
            ],
        ),
    };

    ChartSpec {
        chart_type,
        mode,
        title: title.to_string(),
        labels,
        datasets,
    }
}

fn advisory_table(sitrep: &Sitrep) -> Component {
    let rows = sitrep
        .advisories
        .iter()
        .map(|a| {
            vec![
                a.target_date.to_string(),
                a.category.to_string(),
                a.severity.to_string(),
                a.message.clone(),
            ]
        })
        .collect();

    Component::AdvisoryTable {
        plot_id: sitrep.plot_id().to_string(),
        columns: ADVISORY_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    }
}
