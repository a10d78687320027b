use super::{Condition, Outcome, Rule, RuleInput};
use crate::models::{AdvisoryCategory, GrowthStage, Severity};

/// Pest pressure rule
///
/// Conditions (first match wins):
/// - Hot and dry (max temp >33°C, RH <50%): spider mites (warning)
/// - Zero rain: thrips; critical during bloom/preparing_leaf, info otherwise
pub struct PestRule;

const MITE_TEMP_C: f64 = 33.0;
const MITE_RH: f64 = 50.0;

const THRIPS_STAGES: [GrowthStage; 2] = [GrowthStage::Bloom, GrowthStage::PreparingLeaf];

static CONDITIONS: [Condition; 2] = [
    Condition {
        id: "pest.mites",
        applies: mites_applies,
        outcome: mites_outcome,
    },
    Condition {
        id: "pest.thrips",
        applies: thrips_applies,
        outcome: thrips_outcome,
    },
];

fn mites_applies(input: &RuleInput) -> bool {
    input.temp_max() > MITE_TEMP_C && input.rh() < MITE_RH
}

fn mites_outcome(input: &RuleInput) -> Outcome {
    let temp = input.temp_max();
    let rh = input.rh();
    Outcome::new(
        Severity::Warning,
        format!(
            "Hot and dry ({:.1}°C, {:.0}% RH): spider mite build-up likely. \
             Check leaf undersides and wash the canopy.",
            temp, rh
        ),
    )
    .trigger("temp_max", temp)
    .trigger("rh", rh)
}

fn thrips_applies(input: &RuleInput) -> bool {
    input.is_rainless()
}

fn thrips_outcome(input: &RuleInput) -> Outcome {
    let outcome = if input.stage_in(&THRIPS_STAGES) {
        Outcome::new(
            Severity::Critical,
            "No rain at a thrips-sensitive stage: flush and flowers are exposed. \
             Set blue sticky traps and spray if counts climb.",
        )
    } else {
        Outcome::new(
            Severity::Info,
            "No rain forecast: keep routine thrips monitoring.",
        )
    };

    let outcome = outcome.trigger("rain_mm", 0.0);
    match input.stage() {
        Some(stage) => outcome.trigger("stage", stage.as_str()),
        None => outcome,
    }
}

impl Rule for PestRule {
    fn id(&self) -> &'static str {
        "pest"
    }

    fn name(&self) -> &'static str {
        "Pest Pressure"
    }

    fn category(&self) -> AdvisoryCategory {
        AdvisoryCategory::Pest
    }

    fn conditions(&self) -> &'static [Condition] {
        &CONDITIONS
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::models::SoilType;

    #[test]
    fn hot_dry_day_warns_of_mites() {
        let d = with_rain(day(34.0, 42.0), 0.0);
        let p = profile(GrowthStage::Bloom, SoilType::Loamy);
        let adv = PestRule.evaluate(&d, Some(&p)).unwrap();
        assert_eq!(adv.rule_id, "pest.mites");
        assert_eq!(adv.severity, Severity::Warning);
    }

    #[test]
    fn zero_rain_critical_for_sensitive_stages() {
        let d = with_rain(day(30.0, 70.0), 0.0);
        for stage in THRIPS_STAGES {
            let p = profile(stage, SoilType::Loamy);
            let adv = PestRule.evaluate(&d, Some(&p)).unwrap();
            assert_eq!(adv.rule_id, "pest.thrips");
            assert_eq!(adv.severity, Severity::Critical);
        }
    }

    #[test]
    fn zero_rain_is_info_otherwise() {
        let d = with_rain(day(30.0, 70.0), 0.0);
        let p = profile(GrowthStage::Harvest, SoilType::Loamy);
        let info = PestRule.evaluate(&d, Some(&p)).unwrap();
        assert_eq!(info.severity, Severity::Info);

        let bloom = profile(GrowthStage::Bloom, SoilType::Loamy);
        let critical = PestRule.evaluate(&d, Some(&bloom)).unwrap();
        assert_ne!(info.message, critical.message);
    }

    #[test]
    fn unknown_rain_is_quiet() {
        assert!(PestRule.evaluate(&day(30.0, 70.0), None).is_none());
    }
}
