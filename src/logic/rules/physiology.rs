use super::{Condition, Outcome, Rule, RuleInput};
use crate::models::{AdvisoryCategory, GrowthStage, Severity};

/// Physiology rule - tree-level responses to light, water and heat
///
/// Conditions (first match wins):
/// - Nutrient lock: radiation >600 W/m² with RH <50%
/// - Rain after drought: rain >5 mm
/// - Induction heat: zero rain with max temp >32°C, only for
///   induction/preparing_leaf (optimal) or bloom (warning)
///
/// Rain after drought is critical in every stage, but its meaning flips:
/// during bloom the rain damages open flowers, otherwise it relieves stress
/// and opens a fertigation window.
pub struct PhysiologyRule;

const HIGH_RADIATION: f64 = 600.0;
const DRY_RH: f64 = 50.0;
const BREAKING_RAIN_MM: f64 = 5.0;
const INDUCTION_TEMP_C: f64 = 32.0;

const LOCK_STAGES: [GrowthStage; 2] = [GrowthStage::Bloom, GrowthStage::FruitSet];
const INDUCTION_STAGES: [GrowthStage; 2] = [GrowthStage::Induction, GrowthStage::PreparingLeaf];

static CONDITIONS: [Condition; 3] = [
    Condition {
        id: "physiology.nutrient_lock",
        applies: nutrient_lock_applies,
        outcome: nutrient_lock_outcome,
    },
    Condition {
        id: "physiology.rain_after_drought",
        applies: drought_break_applies,
        outcome: drought_break_outcome,
    },
    Condition {
        id: "physiology.induction_heat",
        applies: induction_heat_applies,
        outcome: induction_heat_outcome,
    },
];

fn nutrient_lock_applies(input: &RuleInput) -> bool {
    input.radiation_above(HIGH_RADIATION) && input.rh() < DRY_RH
}

fn nutrient_lock_outcome(input: &RuleInput) -> Outcome {
    let radiation = input.radiation().unwrap_or_default();
    let rh = input.rh();

    let outcome = if input.stage_in(&LOCK_STAGES) {
        Outcome::new(
            Severity::Critical,
            format!(
                "Nutrient lock risk at a sensitive stage: {:.0} W/m² with {:.0}% RH. \
                 Stomata close and calcium/boron uptake stalls. Foliar feed at dusk.",
                radiation, rh
            ),
        )
    } else {
        Outcome::new(
            Severity::Warning,
            format!(
                "Nutrient lock risk: {:.0} W/m² with {:.0}% RH. \
                 Hold granular fertilizer until humidity recovers.",
                radiation, rh
            ),
        )
    };

    outcome.trigger("radiation", radiation).trigger("rh", rh)
}

fn drought_break_applies(input: &RuleInput) -> bool {
    input.rain_above(BREAKING_RAIN_MM)
}

fn drought_break_outcome(input: &RuleInput) -> Outcome {
    let rain = input.rain().unwrap_or_default();

    let outcome = if input.stage_in(&[GrowthStage::Bloom]) {
        Outcome::new(
            Severity::Critical,
            format!(
                "{:.1} mm of rain on open bloom: pollen wash-off and flower drop. \
                 Prepare to hand-pollinate and clear standing water.",
                rain
            ),
        )
    } else {
        Outcome::new(
            Severity::Critical,
            format!(
                "{:.1} mm of rain breaks the dry spell: stress relief. \
                 Use the moist window for fertigation.",
                rain
            ),
        )
    };

    let outcome = outcome.trigger("rain_mm", rain);
    match input.stage() {
        Some(stage) => outcome.trigger("stage", stage.as_str()),
        None => outcome,
    }
}

fn induction_heat_applies(input: &RuleInput) -> bool {
    input.is_rainless()
        && input.temp_max() > INDUCTION_TEMP_C
        && (input.stage_in(&INDUCTION_STAGES) || input.stage_in(&[GrowthStage::Bloom]))
}

fn induction_heat_outcome(input: &RuleInput) -> Outcome {
    let temp = input.temp_max();

    let outcome = if input.stage_in(&[GrowthStage::Bloom]) {
        Outcome::new(
            Severity::Warning,
            format!(
                "Bloom stress: dry and {:.1}°C. Flowers may abort; \
                 keep light irrigation going.",
                temp
            ),
        )
    } else {
        Outcome::new(
            Severity::Optimal,
            format!(
                "Ideal induction weather: dry and {:.1}°C. \
                 Keep withholding water to push flowering.",
                temp
            ),
        )
    };

    outcome.trigger("rain_mm", 0.0).trigger("temp_max", temp)
}

impl Rule for PhysiologyRule {
    fn id(&self) -> &'static str {
        "physiology"
    }

    fn name(&self) -> &'static str {
        "Tree Physiology"
    }

    fn category(&self) -> AdvisoryCategory {
        AdvisoryCategory::Physiology
    }

    fn conditions(&self) -> &'static [Condition] {
        &CONDITIONS
    }
}
