use super::{Condition, Outcome, Rule, RuleInput};
use crate::models::{AdvisoryCategory, GrowthStage, Severity};

/// Irrigation rule - decides whether a plot needs water on a given day
///
/// Conditions (first match wins):
/// - Low humidity: RH below 50%, or below 60% on sandy soil
/// - Heat stress: max temp >35°C under radiation >600 W/m²
/// - Low radiation: radiation <300 W/m², evaporative demand is low
///
/// Severity levels:
/// - Critical: sandy soil with RH <50%, or heat stress during bloom
/// - Warning: other low-humidity and heat-stress days
/// - Optimal: low radiation (informational)
pub struct IrrigationRule;

const NORMAL_RH_THRESHOLD: f64 = 50.0;
const SANDY_RH_THRESHOLD: f64 = 60.0;
const HEAT_TEMP_C: f64 = 35.0;
const HIGH_RADIATION: f64 = 600.0;
const LOW_RADIATION: f64 = 300.0;

static CONDITIONS: [Condition; 3] = [
    Condition {
        id: "irrigation.low_humidity",
        applies: low_humidity_applies,
        outcome: low_humidity_outcome,
    },
    Condition {
        id: "irrigation.heat_stress",
        applies: heat_stress_applies,
        outcome: heat_stress_outcome,
    },
    Condition {
        id: "irrigation.low_radiation",
        applies: low_radiation_applies,
        outcome: low_radiation_outcome,
    },
];

fn humidity_threshold(input: &RuleInput) -> f64 {
    if input.is_sandy() {
        SANDY_RH_THRESHOLD
    } else {
        NORMAL_RH_THRESHOLD
    }
}

fn low_humidity_applies(input: &RuleInput) -> bool {
    input.rh() < humidity_threshold(input)
}

fn low_humidity_outcome(input: &RuleInput) -> Outcome {
    let rh = input.rh();
    let threshold = humidity_threshold(input);
    // Sandy soil and genuinely dry air compound.
    let compounding = input.is_sandy() && rh < NORMAL_RH_THRESHOLD;

    let outcome = if compounding {
        Outcome::new(
            Severity::Critical,
            format!(
                "Humidity {:.0}% on sandy soil - root zone dries fast. \
                 Irrigate deeply today and mulch the drip line.",
                rh
            ),
        )
    } else {
        Outcome::new(
            Severity::Warning,
            format!(
                "Humidity {:.0}% is below the {:.0}% threshold. \
                 Schedule irrigation and check soil moisture at 20 cm.",
                rh, threshold
            ),
        )
    };

    let outcome = outcome.trigger("rh", rh).trigger("threshold", threshold);
    match input.soil() {
        Some(soil) => outcome.trigger("soil", soil.as_str()),
        None => outcome,
    }
}

fn heat_stress_applies(input: &RuleInput) -> bool {
    input.temp_max() > HEAT_TEMP_C && input.radiation_above(HIGH_RADIATION)
}

fn heat_stress_outcome(input: &RuleInput) -> Outcome {
    let temp = input.temp_max();
    let radiation = input.radiation().unwrap_or_default();

    let outcome = if input.stage_in(&[GrowthStage::Bloom]) {
        Outcome::new(
            Severity::Critical,
            format!(
                "Heat stress during bloom: {:.1}°C under {:.0} W/m². \
                 Mist the canopy mid-day to protect open flowers.",
                temp, radiation
            ),
        )
    } else {
        Outcome::new(
            Severity::Warning,
            format!(
                "Heat stress: {:.1}°C under {:.0} W/m². \
                 Water early morning and avoid mid-day work in the rows.",
                temp, radiation
            ),
        )
    };

    let outcome = outcome
        .trigger("temp_max", temp)
        .trigger("radiation", radiation);
    match input.stage() {
        Some(stage) => outcome.trigger("stage", stage.as_str()),
        None => outcome,
    }
}

fn low_radiation_applies(input: &RuleInput) -> bool {
    input.radiation_below(LOW_RADIATION)
}

fn low_radiation_outcome(input: &RuleInput) -> Outcome {
    let radiation = input.radiation().unwrap_or_default();
    Outcome::new(
        Severity::Optimal,
        format!(
            "Low radiation ({:.0} W/m²) keeps evaporative demand down. \
             Irrigation volume can be reduced.",
            radiation
        ),
    )
    .trigger("radiation", radiation)
}

impl Rule for IrrigationRule {
    fn id(&self) -> &'static str {
        "irrigation"
    }

    fn name(&self) -> &'static str {
        "Irrigation Need"
    }

    fn category(&self) -> AdvisoryCategory {
        AdvisoryCategory::Irrigation
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
    fn sandy_soil_raises_threshold_to_sixty() {
        let p = profile(GrowthStage::Induction, SoilType::Sandy);
        let adv = IrrigationRule.evaluate(&day(30.0, 55.0), Some(&p)).unwrap();
        assert_eq!(adv.rule_id, "irrigation.low_humidity");
        assert_eq!(adv.severity, Severity::Warning);
        assert_eq!(adv.trigger_f64("threshold"), Some(60.0));
    }

    #[test]
    fn loamy_soil_keeps_fifty_threshold() {
        let p = profile(GrowthStage::Induction, SoilType::Loamy);
        assert!(IrrigationRule.evaluate(&day(30.0, 55.0), Some(&p)).is_none());

        let adv = IrrigationRule.evaluate(&day(30.0, 45.0), Some(&p)).unwrap();
        assert_eq!(adv.severity, Severity::Warning);
    }

    #[test]
    fn sandy_and_dry_is_critical() {
        let p = profile(GrowthStage::Induction, SoilType::Sandy);
        let adv = IrrigationRule.evaluate(&day(30.0, 45.0), Some(&p)).unwrap();
        assert_eq!(adv.severity, Severity::Critical);
        assert_eq!(adv.trigger_f64("rh"), Some(45.0));
        assert_eq!(adv.category, AdvisoryCategory::Irrigation);
    }

    #[test]
    fn first_match_wins_over_heat_stress() {
        let p = profile(GrowthStage::Bloom, SoilType::Sandy);
        let d = with_radiation(day(37.0, 45.0), 750.0);
        let adv = IrrigationRule.evaluate(&d, Some(&p)).unwrap();
        assert_eq!(adv.rule_id, "irrigation.low_humidity");
        assert_eq!(adv.severity, Severity::Critical);
        assert!(adv.trigger_data.get("radiation").is_none());
    }

    #[test]
    fn heat_stress_escalates_in_bloom() {
        let d = with_radiation(day(36.5, 65.0), 700.0);

        let bloom = profile(GrowthStage::Bloom, SoilType::Loamy);
        let adv = IrrigationRule.evaluate(&d, Some(&bloom)).unwrap();
        assert_eq!(adv.rule_id, "irrigation.heat_stress");
        assert_eq!(adv.severity, Severity::Critical);

        let harvest = profile(GrowthStage::Harvest, SoilType::Loamy);
        let adv = IrrigationRule.evaluate(&d, Some(&harvest)).unwrap();
        assert_eq!(adv.severity, Severity::Warning);
    }

    #[test]
    fn heat_stress_needs_radiation_reading() {
        assert!(IrrigationRule.evaluate(&day(38.0, 65.0), None).is_none());
    }

    #[test]
    fn low_radiation_is_optimal() {
        let d = with_radiation(day(29.0, 70.0), 180.0);
        let adv = IrrigationRule.evaluate(&d, None).unwrap();
        assert_eq!(adv.rule_id, "irrigation.low_radiation");
        assert_eq!(adv.severity, Severity::Optimal);
    }

    #[test]
    fn no_profile_uses_plain_threshold() {
        let adv = IrrigationRule.evaluate(&day(30.0, 45.0), None).unwrap();
        assert_eq!(adv.severity, Severity::Warning);
        assert!(adv.trigger_data.get("soil").is_none());
    }
}
