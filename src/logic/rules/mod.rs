pub mod disease;
pub mod engine;
pub mod irrigation;
pub mod pest;
pub mod physiology;

pub use engine::RulesEngine;

use crate::models::{
    Advisory, AdvisoryCategory, EnrichedDay, GrowthStage, PlotProfile, Severity, SoilType,
};

/// What a rule sees for one plot-day. `profile` is `None` when the caller has
/// no plot context; stage- and soil-aware adjustments then never apply.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub day: &'a EnrichedDay,
    pub profile: Option<&'a PlotProfile>,
}

impl<'a> RuleInput<'a> {
    pub fn new(day: &'a EnrichedDay, profile: Option<&'a PlotProfile>) -> Self {
        Self { day, profile }
    }

    pub fn rh(&self) -> f64 {
        self.day.humidity()
    }

    pub fn temp_max(&self) -> f64 {
        self.day.temp_max()
    }

    pub fn rain(&self) -> Option<f64> {
        self.day.rain_mm()
    }

    pub fn radiation(&self) -> Option<f64> {
        self.day.radiation()
    }

    pub fn stage(&self) -> Option<GrowthStage> {
        self.profile.map(|p| p.growth_stage)
    }

    pub fn soil(&self) -> Option<SoilType> {
        self.profile.map(|p| p.soil_type)
    }

    pub fn stage_in(&self, stages: &[GrowthStage]) -> bool {
        self.stage().map(|s| stages.contains(&s)).unwrap_or(false)
    }

    pub fn is_sandy(&self) -> bool {
        self.soil() == Some(SoilType::Sandy)
    }

    /// Measured rain of exactly zero. Missing rain is not "dry".
    pub fn is_rainless(&self) -> bool {
        matches!(self.rain(), Some(r) if r == 0.0)
    }

    pub fn rain_above(&self, mm: f64) -> bool {
        matches!(self.rain(), Some(r) if r > mm)
    }

    pub fn radiation_above(&self, w_m2: f64) -> bool {
        matches!(self.radiation(), Some(r) if r > w_m2)
    }

    pub fn radiation_below(&self, w_m2: f64) -> bool {
        matches!(self.radiation(), Some(r) if r < w_m2)
    }
}

/// Result of a condition that fired.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub severity: Severity,
    pub message: String,
    pub triggers: Vec<(&'static str, serde_json::Value)>,
}

impl Outcome {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            triggers: Vec::new(),
        }
    }

    pub fn trigger(mut self, key: &'static str, value: impl Into<serde_json::Value>) -> Self {
        self.triggers.push((key, value.into()));
        self
    }
}

/// One guarded threshold check inside a rule family.
pub struct Condition {
    pub id: &'static str,
    pub applies: fn(&RuleInput) -> bool,
    pub outcome: fn(&RuleInput) -> Outcome,
}

/// Returns the first condition whose guard holds; later ones are not evaluated.
pub fn first_match<'c>(conditions: &'c [Condition], input: &RuleInput) -> Option<&'c Condition> {
    conditions.iter().find(|c| (c.applies)(input))
}

/// A hazard family: an ordered condition table, most specific first.
pub trait Rule: Send + Sync {
    /// Unique identifier for this rule
    fn id(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    fn category(&self) -> AdvisoryCategory;

    fn conditions(&self) -> &'static [Condition];

    /// At most one advisory per plot-day.
    fn evaluate(&self, day: &EnrichedDay, profile: Option<&PlotProfile>) -> Option<Advisory> {
        let input = RuleInput::new(day, profile);
        let condition = first_match(self.conditions(), &input)?;
        let outcome = (condition.outcome)(&input);

        let advisory = Advisory::new(
            day.forecast.plot.clone(),
            day.date(),
            self.category(),
            outcome.severity,
            condition.id,
            outcome.message,
        );
        Some(
            outcome
                .triggers
                .into_iter()
                .fold(advisory, |adv, (key, value)| adv.with_trigger(key, value)),
        )
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{DailyForecast, EnrichedDay, GrowthStage, PlotProfile, SoilType};
    use chrono::NaiveDate;

    pub fn day(temp_max: f64, rh: f64) -> EnrichedDay {
        let forecast = DailyForecast::new(
            "test-plot",
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            temp_max,
            temp_max - 10.0,
        )
        .with_humidity(rh);
        EnrichedDay {
            forecast,
            vpd: 0.0,
            gdd: 0.0,
            eto: 0.0,
            dew_point: None,
            gdd_raw: 0.0,
        }
    }

    pub fn with_rain(mut day: EnrichedDay, mm: f64) -> EnrichedDay {
        day.forecast.rain_mm = Some(mm);
        day
    }

    pub fn with_radiation(mut day: EnrichedDay, w_m2: f64) -> EnrichedDay {
        day.forecast.shortwave_radiation_down = Some(w_m2);
        day
    }

    pub fn profile(stage: GrowthStage, soil: SoilType) -> PlotProfile {
        PlotProfile::new("test-plot", "Test", 13.7, 100.5)
            .with_stage(stage)
            .with_soil(soil)
    }
}
