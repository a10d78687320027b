use super::{Condition, Outcome, Rule, RuleInput};
use crate::models::{AdvisoryCategory, Severity};

/// Disease pressure rule - fungal risk from wet, saturated days
///
/// Conditions (first match wins):
/// - Heavy rain >10 mm with RH >80%: Phytophthora root rot / fungal flush (critical)
/// - RH >90% regardless of rain: mildew and leaf blight (warning)
pub struct DiseaseRule;

const HEAVY_RAIN_MM: f64 = 10.0;
const WET_RH: f64 = 80.0;
const SATURATED_RH: f64 = 90.0;

static CONDITIONS: [Condition; 2] = [
    Condition {
        id: "disease.root_rot",
        applies: root_rot_applies,
        outcome: root_rot_outcome,
    },
    Condition {
        id: "disease.leaf_blight",
        applies: leaf_blight_applies,
        outcome: leaf_blight_outcome,
    },
];

fn root_rot_applies(input: &RuleInput) -> bool {
    input.rain_above(HEAVY_RAIN_MM) && input.rh() > WET_RH
}

fn root_rot_outcome(input: &RuleInput) -> Outcome {
    let rain = input.rain().unwrap_or_default();
    let rh = input.rh();
    Outcome::new(
        Severity::Critical,
        format!(
            "{:.1} mm of rain with {:.0}% RH: high fungal and root-rot risk. \
             Open drainage channels and apply phosphonate after the rain.",
            rain, rh
        ),
    )
    .trigger("rain_mm", rain)
    .trigger("rh", rh)
}

fn leaf_blight_applies(input: &RuleInput) -> bool {
    input.rh() > SATURATED_RH
}

fn leaf_blight_outcome(input: &RuleInput) -> Outcome {
    let rh = input.rh();
    Outcome::new(
        Severity::Warning,
        format!(
            "Humidity {:.0}%: mildew and leaf blight conditions. \
             Thin the inner canopy for airflow and scout young flush.",
            rh
        ),
    )
    .trigger("rh", rh)
}

impl Rule for DiseaseRule {
    fn id(&self) -> &'static str {
        "disease"
    }

    fn name(&self) -> &'static str {
        "Disease Pressure"
    }

    fn category(&self) -> AdvisoryCategory {
        AdvisoryCategory::Disease
    }

    fn conditions(&self) -> &'static [Condition] {
        &CONDITIONS
    }
}
