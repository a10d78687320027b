use super::{
    disease::DiseaseRule, irrigation::IrrigationRule, pest::PestRule, physiology::PhysiologyRule,
    Rule,
};
use crate::models::{Advisory, EnrichedDay, PlotProfile};

pub struct RulesEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl RulesEngine {
    pub fn new() -> Self {
        let rules: Vec<Box<dyn Rule>> = vec![
            Box::new(IrrigationRule),
            Box::new(DiseaseRule),
            Box::new(PhysiologyRule),
            Box::new(PestRule),
        ];

        Self { rules }
    }

    /// Every family's verdict for one day; at most one advisory per family.
    pub fn evaluate(&self, day: &EnrichedDay, profile: Option<&PlotProfile>) -> Vec<Advisory> {
        self.rules
            .iter()
            .filter_map(|rule| rule.evaluate(day, profile))
            .collect()
    }

    /// Advisories for a whole series, in date order then family order.
    pub fn evaluate_series(
        &self,
        days: &[EnrichedDay],
        profile: Option<&PlotProfile>,
    ) -> Vec<Advisory> {
        days.iter()
            .flat_map(|day| self.evaluate(day, profile))
            .collect()
    }

    pub fn list_rules(&self) -> Vec<(&'static str, &'static str)> {
        self.rules.iter().map(|r| (r.id(), r.name())).collect()
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new()
    }
}
