use super::aggregator::Aggregator;
use super::clock::Clock;
use super::context::{PlotResolver, ProfileTable};
use super::enrichment::{dedup_forecasts, enrich_series, limit_horizon, SourcedRow};
use super::rules::RulesEngine;
use crate::config::{Config, EngineSettings};
use crate::error::Result;
use crate::models::{
    ActivityRecord, DailyForecast, InsightOverride, PlotResolution, Sitrep, SystemReport,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Input records for one engine invocation, already fetched by the caller.
#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    pub forecasts: Vec<DailyForecast>,
    pub activities: Vec<ActivityRecord>,
    pub overrides: Vec<InsightOverride>,
    /// Plot references to report on. Empty means every plot that has data.
    pub plots: Vec<String>,
}

impl ReportRequest {
    pub fn new(forecasts: Vec<DailyForecast>) -> Self {
        Self {
            forecasts,
            ..Self::default()
        }
    }

    pub fn with_activities(mut self, activities: Vec<ActivityRecord>) -> Self {
        self.activities = activities;
        self
    }

    pub fn with_overrides(mut self, overrides: Vec<InsightOverride>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_plots(mut self, plots: Vec<String>) -> Self {
        self.plots = plots;
        self
    }
}

/// Runs the full pipeline: resolve, enrich, evaluate, aggregate.
///
/// Holds no state between calls; output depends only on the request and the
/// injected clock.
pub struct InsightEngine {
    resolver: Arc<dyn PlotResolver>,
    clock: Arc<dyn Clock>,
    rules: RulesEngine,
    settings: EngineSettings,
}

impl InsightEngine {
    pub fn new(
        resolver: Arc<dyn PlotResolver>,
        clock: Arc<dyn Clock>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            resolver,
            clock,
            rules: RulesEngine::new(),
            settings,
        }
    }

    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let table = ProfileTable::from_config(config)?;
        Ok(Self::new(Arc::new(table), clock, config.engine.clone()))
    }

    pub async fn resolve(&self, plot_ref: &str) -> PlotResolution {
        self.resolver.resolve(plot_ref).await
    }

    pub async fn run(&self, request: ReportRequest) -> Result<SystemReport> {
        let offset = self.settings.offset()?;
        let now = self.clock.now();

        let resolutions = self.resolve_all(&request).await;
        let canonical = |plot_ref: &str| resolutions.get(plot_ref).map(|r| r.plot_id());
        let profile_of = |id: &str| {
            resolutions
                .values()
                .find(|r| r.plot_id() == id)
                .map(|r| r.profile.clone())
        };

        // Rewrite every row onto its canonical plot before de-duplication.
        let mut unresolved: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut rows = Vec::with_capacity(request.forecasts.len());
        for mut row in request.forecasts {
            let Some(resolution) = resolutions.get(&row.plot) else {
                continue;
            };
            if !resolution.resolved {
                unresolved
                    .entry(resolution.plot_id().to_string())
                    .or_default()
                    .insert(row.plot.clone());
            }
            row.plot = resolution.plot_id().to_string();
            rows.push(SourcedRow::new(row, resolution.resolved));
        }

        let mut by_plot: BTreeMap<String, Vec<DailyForecast>> = BTreeMap::new();
        for row in dedup_forecasts(rows) {
            by_plot.entry(row.plot.clone()).or_default().push(row);
        }

        let requested: Vec<String> = request
            .plots
            .iter()
            .filter_map(|r| canonical(r).map(str::to_string))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let wanted = |id: &str| requested.is_empty() || requested.iter().any(|r| r == id);

        let mut plots: BTreeMap<String, Sitrep> = BTreeMap::new();
        for (plot_id, plot_rows) in by_plot {
            if !wanted(&plot_id) {
                tracing::debug!("Skipping {}: not requested", plot_id);
                continue;
            }
            let Some(profile) = profile_of(&plot_id) else {
                continue;
            };

            let plot_rows = limit_horizon(plot_rows, self.settings.horizon_days);
            let days = enrich_series(&plot_rows, &profile, self.settings.gdd_base_temp_c)?;
            let advisories = self.rules.evaluate_series(&days, Some(&profile));

            tracing::debug!(
                "{}: {} days enriched, {} advisories",
                plot_id,
                days.len(),
                advisories.len()
            );

            let mut sitrep = Sitrep::new(profile);
            sitrep.forecast = days;
            sitrep.advisories = advisories;
            sitrep.unresolved_refs = unresolved
                .remove(&plot_id)
                .map(|refs| refs.into_iter().collect())
                .unwrap_or_default();
            plots.insert(plot_id, sitrep);
        }

        for plot_id in &requested {
            if !plots.contains_key(plot_id) {
                if let Some(profile) = profile_of(plot_id) {
                    plots.insert(plot_id.clone(), Sitrep::new(profile));
                }
            }
        }

        self.attach_activities(&mut plots, request.activities, &resolutions);
        self.apply_overrides(&mut plots, request.overrides, &resolutions, &wanted);

        let aggregate = Aggregator::new(now, offset).aggregate(plots, &requested);

        Ok(SystemReport {
            generated_at: now,
            horizon_days: self.settings.horizon_days,
            gap_analysis: aggregate.gap_analysis,
            global: aggregate.global,
            plots: aggregate.plots,
        })
    }

    /// One resolver call per distinct reference across all inputs.
    async fn resolve_all(&self, request: &ReportRequest) -> BTreeMap<String, PlotResolution> {
        let refs: BTreeSet<&str> = request
            .forecasts
            .iter()
            .map(|f| f.plot.as_str())
            .chain(request.activities.iter().map(|a| a.plot.as_str()))
            .chain(request.overrides.iter().map(|o| o.plot.as_str()))
            .chain(request.plots.iter().map(String::as_str))
            .collect();

        let mut resolutions = BTreeMap::new();
        for plot_ref in refs {
            let resolution = self.resolver.resolve(plot_ref).await;
            resolutions.insert(plot_ref.to_string(), resolution);
        }
        resolutions
    }

    /// Most recent first, capped; pending actions listed separately.
    fn attach_activities(
        &self,
        plots: &mut BTreeMap<String, Sitrep>,
        activities: Vec<ActivityRecord>,
        resolutions: &BTreeMap<String, PlotResolution>,
    ) {
        let mut by_plot: BTreeMap<String, Vec<ActivityRecord>> = BTreeMap::new();
        for mut activity in activities {
            let Some(resolution) = resolutions.get(&activity.plot) else {
                continue;
            };
            activity.plot = resolution.plot_id().to_string();
            by_plot.entry(activity.plot.clone()).or_default().push(activity);
        }

        for (plot_id, mut records) in by_plot {
            let Some(sitrep) = plots.get_mut(&plot_id) else {
                continue;
            };
            records.sort_by(|a, b| b.date.cmp(&a.date));
            sitrep.pending_actions = records.iter().filter(|a| a.is_pending()).cloned().collect();
            records.truncate(self.settings.recent_activity_limit);
            sitrep.recent_activities = records;
        }
    }

    fn apply_overrides(
        &self,
        plots: &mut BTreeMap<String, Sitrep>,
        overrides: Vec<InsightOverride>,
        resolutions: &BTreeMap<String, PlotResolution>,
        wanted: &dyn Fn(&str) -> bool,
    ) {
        for ov in overrides {
            let Some(resolution) = resolutions.get(&ov.plot) else {
                continue;
            };
            if !resolution.resolved {
                tracing::warn!("Ignoring insight override for unknown plot '{}'", ov.plot);
                continue;
            }
            let plot_id = resolution.plot_id().to_string();
            if !wanted(&plot_id) {
                continue;
            }

            let sitrep = plots
                .entry(plot_id)
                .or_insert_with(|| Sitrep::new(resolution.profile.clone()));
            tracing::info!(
                "Override on {}: {:?} '{}'",
                sitrep.plot_id(),
                ov.status,
                ov.headline
            );
            sitrep.insight.status = ov.status;
            sitrep.insight.headline = Some(ov.headline);
            sitrep.insight.override_mode = ov.mode;
        }
    }
}
