//! Reduces per-plot situation reports into freshness diagnostics, a single
//! global mode and headline, and per-plot focus.

use super::calculations::round_to;
use crate::models::{
    CriticalAsset, DataIntegrity, GapAnalysis, GlobalInsight, GrowthStage, InsightStatus, Mode,
    ModeSource, PlotProfile, PlotSummary, PrimaryMetric, Severity, Sitrep, SoilType,
};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Rain (mm/day) above which the whole system goes into flood emergency.
pub const FLOOD_RAIN_MM: f64 = 50.0;

/// VPD (kPa) above which the system foregrounds transpiration stress.
pub const TRANSPIRATION_VPD_KPA: f64 = 2.0;

const FLOOD_SENSITIVITY_THRESHOLD: u8 = 7;

pub const NOMINAL_HEADLINE: &str = "Conditions nominal across all plots";

pub struct Aggregator {
    now: DateTime<Utc>,
    offset: FixedOffset,
}

#[derive(Debug, Clone)]
pub struct Aggregate {
    pub gap_analysis: GapAnalysis,
    pub global: GlobalInsight,
    pub plots: BTreeMap<String, Sitrep>,
}

impl Aggregator {
    pub fn new(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self { now, offset }
    }

    pub fn today(&self) -> NaiveDate {
        self.now.with_timezone(&self.offset).date_naive()
    }

    /// `requested` holds canonical ids the caller asked for explicitly.
    pub fn aggregate(&self, mut plots: BTreeMap<String, Sitrep>, requested: &[String]) -> Aggregate {
        let gap_analysis = self.gap_analysis(&plots, requested);

        for sitrep in plots.values_mut() {
            sitrep.insight.summary = summarize(sitrep);
        }

        let global = self.global_insight(&plots);
        let today = self.today();

        for sitrep in plots.values_mut() {
            let (mode, source) = resolve_plot_mode(&sitrep.profile, global.mode);
            sitrep.insight.mode = mode;
            sitrep.insight.mode_source = source;
            sitrep.insight.primary_metric = primary_metric(sitrep, mode, today);
        }

        tracing::info!(
            "Aggregated {} plots: mode={} emergency={} integrity={:?}",
            plots.len(),
            global.mode,
            global.emergency,
            gap_analysis.integrity
        );

        Aggregate {
            gap_analysis,
            global,
            plots,
        }
    }

    pub fn gap_analysis(
        &self,
        plots: &BTreeMap<String, Sitrep>,
        requested: &[String],
    ) -> GapAnalysis {
        let today = self.today();
        let dates = plots
            .values()
            .flat_map(|s| s.forecast.iter().map(|d| d.date()));

        let mut earliest: Option<NaiveDate> = None;
        let mut covers_today = false;
        for date in dates {
            covers_today |= date == today;
            earliest = Some(earliest.map_or(date, |e| e.min(date)));
        }

        let mut integrity = if covers_today {
            DataIntegrity::Fresh
        } else {
            DataIntegrity::Stale
        };

        let mut missing_plots: Vec<String> = requested
            .iter()
            .filter(|id| plots.get(id.as_str()).map_or(true, |s| !s.has_forecast()))
            .cloned()
            .collect();
        missing_plots.sort();
        missing_plots.dedup();

        if !missing_plots.is_empty() {
            tracing::warn!("No forecast coverage for requested plots: {:?}", missing_plots);
            integrity = integrity.max(DataIntegrity::Stale);
        }

        let last_update_hours = earliest.and_then(|date| self.hours_since(date));

        GapAnalysis {
            integrity,
            external_search_needed: integrity == DataIntegrity::Stale,
            covers_today,
            missing_plots,
            last_update_hours,
        }
    }

    /// Whole hours from local midnight of `date` until now, floored.
    fn hours_since(&self, date: NaiveDate) -> Option<i64> {
        let midnight = date
            .and_hms_opt(0, 0, 0)?
            .and_local_timezone(self.offset)
            .single()?
            .with_timezone(&Utc);
        Some((self.now - midnight).num_minutes().div_euclid(60))
    }

    /// Strict priority chain: critical flag, flood, transpiration, nominal.
    pub fn global_insight(&self, plots: &BTreeMap<String, Sitrep>) -> GlobalInsight {
        let max_rain_mm = plots
            .values()
            .map(|s| s.insight.summary.max_rain_mm)
            .fold(0.0, f64::max);
        let max_vpd = plots
            .values()
            .map(|s| s.insight.summary.max_vpd)
            .fold(0.0, f64::max);

        let flagged = plots
            .values()
            .find(|s| s.insight.status == InsightStatus::Critical);

        let (emergency, mode, headline, source_plot) = if let Some(sitrep) = flagged {
            let headline = sitrep.insight.headline.clone().unwrap_or_else(|| {
                format!("Critical condition flagged on {}", sitrep.profile.name_local)
            });
            (
                true,
                sitrep.insight.override_mode.unwrap_or_default(),
                headline,
                Some(sitrep.plot_id().to_string()),
            )
        } else if max_rain_mm > FLOOD_RAIN_MM {
            (
                true,
                Mode::Rain,
                format!(
                    "Flood alert: up to {:.1} mm of rain forecast. Clear drainage and secure low rows.",
                    max_rain_mm
                ),
                None,
            )
        } else if max_vpd > TRANSPIRATION_VPD_KPA {
            (
                false,
                Mode::Vpd,
                format!(
                    "Transpiration alert: VPD peaks at {:.2} kPa. Expect leaf wilt at mid-day.",
                    max_vpd
                ),
                None,
            )
        } else {
            (false, Mode::Default, NOMINAL_HEADLINE.to_string(), None)
        };

        let peak = plots
            .values()
            .filter_map(|s| s.insight.summary.peak_severity)
            .max();
        let severity = if emergency {
            Severity::Critical
        } else if mode == Mode::Vpd {
            peak.map_or(Severity::Warning, |p| p.max(Severity::Warning))
        } else {
            peak.unwrap_or(Severity::Info)
        };

        GlobalInsight {
            emergency,
            mode,
            headline,
            severity,
            max_rain_mm: round_to(max_rain_mm, 2),
            max_vpd: round_to(max_vpd, 2),
            source_plot,
            notes: collect_notes(plots),
        }
    }
}

/// A plot's own focus, overriding the global mode where its biology demands.
pub fn resolve_plot_mode(profile: &PlotProfile, global: Mode) -> (Mode, ModeSource) {
    let personality = &profile.personality;

    if personality.critical_asset == CriticalAsset::Durian
        || profile.is_stage(&[GrowthStage::Bloom, GrowthStage::Pollination])
    {
        (Mode::Vpd, ModeSource::Profile)
    } else if personality.flood_sensitivity > FLOOD_SENSITIVITY_THRESHOLD
        || profile.soil_type == SoilType::ClayeyFilled
    {
        (Mode::Rain, ModeSource::Profile)
    } else if personality.critical_asset == CriticalAsset::Seedling {
        (Mode::Temp, ModeSource::Profile)
    } else {
        (global, ModeSource::Global)
    }
}

/// Cumulative rain for rain-focused plots, otherwise GDD for the day
/// nearest to today.
pub fn primary_metric(sitrep: &Sitrep, mode: Mode, today: NaiveDate) -> PrimaryMetric {
    if mode == Mode::Rain {
        let value = sitrep
            .has_forecast()
            .then_some(sitrep.insight.summary.total_rain_mm);
        return PrimaryMetric::new("Cumulative rain", value, "mm");
    }

    let nearest = sitrep
        .forecast
        .iter()
        .min_by_key(|d| ((d.date() - today).num_days().abs(), d.date()));
    PrimaryMetric::new("GDD today", nearest.map(|d| d.gdd), "°C-days")
}

/// Horizon totals and peaks for one plot.
pub fn summarize(sitrep: &Sitrep) -> PlotSummary {
    let days = &sitrep.forecast;

    let gdd_sum: f64 = days.iter().map(|d| d.gdd_raw).sum();
    let rain_sum: f64 = days.iter().filter_map(|d| d.rain_mm()).sum();
    let eto_sum: f64 = days.iter().map(|d| d.eto).sum();

    let mut advisory_counts = BTreeMap::new();
    for advisory in &sitrep.advisories {
        *advisory_counts.entry(advisory.category).or_insert(0) += 1;
    }

    PlotSummary {
        days: days.len(),
        cumulative_gdd: round_to(gdd_sum, 2),
        total_rain_mm: round_to(rain_sum, 2),
        total_eto_mm: round_to(eto_sum, 2),
        water_balance_mm: round_to(rain_sum - eto_sum, 2),
        max_rain_mm: days
            .iter()
            .filter_map(|d| d.rain_mm())
            .fold(0.0, f64::max),
        max_vpd: days.iter().map(|d| d.vpd).fold(0.0, f64::max),
        peak_severity: sitrep.advisories.iter().map(|a| a.severity).max(),
        advisory_counts,
    }
}

fn collect_notes(plots: &BTreeMap<String, Sitrep>) -> Vec<String> {
    let mut notes = Vec::new();

    for sitrep in plots.values() {
        let name = &sitrep.profile.name_local;

        if sitrep.insight.status != InsightStatus::Normal {
            if let Some(headline) = &sitrep.insight.headline {
                notes.push(format!("{}: {}", name, headline));
            }
        }

        let Some(peak) = sitrep.insight.summary.peak_severity else {
            continue;
        };
        if peak < Severity::Warning {
            continue;
        }
        if let Some(advisory) = sitrep.advisories.iter().find(|a| a.severity == peak) {
            notes.push(format!(
                "{} ({}): {}",
                name, advisory.target_date, advisory.message
            ));
        }
    }

    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Advisory, AdvisoryCategory, DailyForecast, EnrichedDay, Personality, PlotProfile,
    };
    use chrono::TimeZone;

    fn bangkok() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    /// 09:00 local on 2026-03-01.
    fn aggregator() -> Aggregator {
        Aggregator::new(Utc.with_ymd_and_hms(2026, 3, 1, 2, 0, 0).unwrap(), bangkok())
    }

    fn enriched(plot: &str, d: NaiveDate, rain: f64, vpd: f64, gdd: f64) -> EnrichedDay {
        EnrichedDay {
            forecast: DailyForecast::new(plot, d, 32.0, 23.0).with_rain(rain),
            vpd,
            gdd,
            eto: 4.0,
            dew_point: None,
            gdd_raw: gdd,
        }
    }

    fn plain_profile(id: &str) -> PlotProfile {
        PlotProfile::new(id, id, 13.7, 100.5)
            .with_stage(GrowthStage::Harvest)
            .with_soil(SoilType::Loamy)
    }

    fn sitrep(profile: PlotProfile, days: Vec<EnrichedDay>) -> Sitrep {
        let mut s = Sitrep::new(profile);
        s.forecast = days;
        s
    }

    fn map(sitreps: Vec<Sitrep>) -> BTreeMap<String, Sitrep> {
        sitreps
            .into_iter()
            .map(|s| (s.plot_id().to_string(), s))
            .collect()
    }

    #[test]
    fn today_respects_offset() {
        // 20:00 UTC is already the next day in Bangkok.
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 20, 0, 0).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(Aggregator::new(now, bangkok()).today(), date(2));
        assert_eq!(Aggregator::new(now, utc).today(), date(1));
    }

    #[test]
    fn gap_analysis_fresh_when_today_covered() {
        let plots = map(vec![sitrep(
            plain_profile("a"),
            vec![enriched("a", date(1), 0.0, 1.0, 15.0)],
        )]);
        let gap = aggregator().gap_analysis(&plots, &[]);
        assert_eq!(gap.integrity, DataIntegrity::Fresh);
        assert!(!gap.external_search_needed);
        assert!(gap.covers_today);
        // Local midnight 2026-03-01 to 09:00 local.
        assert_eq!(gap.last_update_hours, Some(9));
    }

    #[test]
    fn gap_analysis_stale_without_data() {
        let gap = aggregator().gap_analysis(&BTreeMap::new(), &[]);
        assert_eq!(gap.integrity, DataIntegrity::Stale);
        assert!(gap.external_search_needed);
        assert_eq!(gap.last_update_hours, None);
    }

    #[test]
    fn gap_analysis_stale_when_today_missing() {
        let plots = map(vec![sitrep(
            plain_profile("a"),
            vec![enriched("a", date(3), 0.0, 1.0, 15.0)],
        )]);
        let gap = aggregator().gap_analysis(&plots, &[]);
        assert_eq!(gap.integrity, DataIntegrity::Stale);
        // Forecast starts in the future: negative hours, floored.
        assert_eq!(gap.last_update_hours, Some(-39));
    }

    #[test]
    fn gap_analysis_lists_missing_requested_plots() {
        let plots = map(vec![
            sitrep(
                plain_profile("a"),
                vec![enriched("a", date(1), 0.0, 1.0, 15.0)],
            ),
            sitrep(plain_profile("b"), vec![]),
        ]);
        let requested = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let gap = aggregator().gap_analysis(&plots, &requested);
        assert_eq!(gap.missing_plots, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(gap.integrity, DataIntegrity::Stale);
        assert!(gap.external_search_needed);
    }

    #[test]
    fn critical_flag_beats_flood() {
        let mut flagged = sitrep(
            plain_profile("b-flagged"),
            vec![enriched("b-flagged", date(1), 0.0, 1.0, 15.0)],
        );
        flagged.insight.status = InsightStatus::Critical;
        flagged.insight.headline = Some("Root rot confirmed in block 3".into());

        let flooded = sitrep(
            plain_profile("a-flooded"),
            vec![enriched("a-flooded", date(1), 80.0, 1.0, 15.0)],
        );

        let result = aggregator().aggregate(map(vec![flooded, flagged]), &[]);
        assert!(result.global.emergency);
        assert_eq!(result.global.headline, "Root rot confirmed in block 3");
        assert_eq!(result.global.source_plot.as_deref(), Some("b-flagged"));
        assert_eq!(result.global.max_rain_mm, 80.0);
        assert_eq!(result.global.severity, Severity::Critical);
    }

    #[test]
    fn flood_sets_rain_mode() {
        let plots = map(vec![sitrep(
            plain_profile("a"),
            vec![enriched("a", date(1), 62.5, 2.6, 15.0)],
        )]);
        let result = aggregator().aggregate(plots, &[]);
        assert!(result.global.emergency);
        assert_eq!(result.global.mode, Mode::Rain);
        assert!(result.global.headline.starts_with("Flood alert"));
    }

    #[test]
    fn high_vpd_sets_vpd_mode_without_emergency() {
        let plots = map(vec![sitrep(
            plain_profile("a"),
            vec![enriched("a", date(1), 0.0, 2.3, 15.0)],
        )]);
        let result = aggregator().aggregate(plots, &[]);
        assert!(!result.global.emergency);
        assert_eq!(result.global.mode, Mode::Vpd);
        assert!(result.global.headline.starts_with("Transpiration alert"));
        assert_eq!(result.global.severity, Severity::Warning);
    }

    #[test]
    fn nominal_default() {
        let plots = map(vec![sitrep(
            plain_profile("a"),
            vec![enriched("a", date(1), 50.0, 2.0, 15.0)],
        )]);
        let result = aggregator().aggregate(plots, &[]);
        assert!(!result.global.emergency);
        assert_eq!(result.global.mode, Mode::Default);
        assert_eq!(result.global.headline, NOMINAL_HEADLINE);
        assert_eq!(result.global.severity, Severity::Info);
    }

    #[test]
    fn plot_mode_priority() {
        let durian = plain_profile("d").with_personality(Personality {
            critical_asset: CriticalAsset::Durian,
            flood_sensitivity: 9,
            ..Personality::default()
        });
        assert_eq!(
            resolve_plot_mode(&durian, Mode::Rain),
            (Mode::Vpd, ModeSource::Profile)
        );

        let pollinating = plain_profile("p").with_stage(GrowthStage::Pollination);
        assert_eq!(resolve_plot_mode(&pollinating, Mode::Default).0, Mode::Vpd);

        let filled = plain_profile("f").with_soil(SoilType::ClayeyFilled);
        assert_eq!(resolve_plot_mode(&filled, Mode::Vpd).0, Mode::Rain);

        let flood_prone = plain_profile("r").with_personality(Personality {
            flood_sensitivity: 8,
            critical_asset: CriticalAsset::Seedling,
            ..Personality::default()
        });
        assert_eq!(resolve_plot_mode(&flood_prone, Mode::Vpd).0, Mode::Rain);

        let seedling = plain_profile("s").with_personality(Personality {
            flood_sensitivity: 7,
            critical_asset: CriticalAsset::Seedling,
            ..Personality::default()
        });
        assert_eq!(resolve_plot_mode(&seedling, Mode::Vpd).0, Mode::Temp);

        assert_eq!(
            resolve_plot_mode(&plain_profile("x"), Mode::Vpd),
            (Mode::Vpd, ModeSource::Global)
        );
    }

    #[test]
    fn primary_metric_rain_mode_sums_rain() {
        let mut s = sitrep(
            plain_profile("a"),
            vec![
                enriched("a", date(1), 12.5, 1.0, 15.0),
                enriched("a", date(2), 7.25, 1.0, 16.0),
            ],
        );
        s.insight.summary = summarize(&s);
        let metric = primary_metric(&s, Mode::Rain, date(1));
        assert_eq!(metric.value, Some(19.75));
        assert_eq!(metric.unit, "mm");
    }

    #[test]
    fn primary_metric_uses_gdd_nearest_today() {
        let s = sitrep(
            plain_profile("a"),
            vec![
                enriched("a", date(2), 0.0, 1.0, 16.0),
                enriched("a", date(4), 0.0, 1.0, 18.0),
            ],
        );
        let metric = primary_metric(&s, Mode::Default, date(1));
        assert_eq!(metric.value, Some(16.0));

        // Equidistant days resolve to the earlier one.
        let metric = primary_metric(&s, Mode::Default, date(3));
        assert_eq!(metric.value, Some(16.0));

        let empty = sitrep(plain_profile("b"), vec![]);
        assert_eq!(primary_metric(&empty, Mode::Default, date(1)).value, None);
    }

    #[test]
    fn summary_accumulates_unrounded_gdd() {
        let days: Vec<_> = (1..=3)
            .map(|d| {
                let mut day = enriched("a", date(d), 1.0, 1.0, 0.0);
                day.gdd_raw = 10.004;
                day.gdd = 10.0;
                day
            })
            .collect();
        let summary = summarize(&sitrep(plain_profile("a"), days));
        assert_eq!(summary.cumulative_gdd, 30.01);
        assert_eq!(summary.total_rain_mm, 3.0);
        assert_eq!(summary.water_balance_mm, -9.0);
    }

    #[test]
    fn notes_collect_warning_and_above() {
        let mut s = sitrep(
            plain_profile("a"),
            vec![enriched("a", date(1), 0.0, 1.0, 15.0)],
        );
        s.advisories = vec![
            Advisory::new(
                "a",
                date(1),
                AdvisoryCategory::Pest,
                Severity::Info,
                "pest.thrips",
                "routine",
            ),
            Advisory::new(
                "a",
                date(1),
                AdvisoryCategory::Disease,
                Severity::Warning,
                "disease.leaf_blight",
                "blight",
            ),
        ];
        let result = aggregator().aggregate(map(vec![s]), &[]);
        assert_eq!(result.global.notes, vec!["a (2026-03-01): blight".to_string()]);
        assert_eq!(result.global.severity, Severity::Warning);
    }
}
