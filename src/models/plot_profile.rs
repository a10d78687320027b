use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStage {
    PreparingLeaf,
    Induction,
    Bloom,
    /// Legacy records tag the open-flower window separately from bloom.
    Pollination,
    FruitSet,
    Harvest,
    Seedling,
}

impl GrowthStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrowthStage::PreparingLeaf => "preparing_leaf",
            GrowthStage::Induction => "induction",
            GrowthStage::Bloom => "bloom",
            GrowthStage::Pollination => "pollination",
            GrowthStage::FruitSet => "fruit_set",
            GrowthStage::Harvest => "harvest",
            GrowthStage::Seedling => "seedling",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GrowthStage::PreparingLeaf => "Preparing Leaf",
            GrowthStage::Induction => "Flower Induction",
            GrowthStage::Bloom => "Bloom",
            GrowthStage::Pollination => "Pollination",
            GrowthStage::FruitSet => "Fruit Set",
            GrowthStage::Harvest => "Harvest",
            GrowthStage::Seedling => "Seedling",
        }
    }
}

impl std::fmt::Display for GrowthStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoilType {
    Sandy,
    Loamy,
    LoamySandy,
    Clayey,
    ClayeyFilled,
}

impl SoilType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoilType::Sandy => "sandy",
            SoilType::Loamy => "loamy",
            SoilType::LoamySandy => "loamy_sandy",
            SoilType::Clayey => "clayey",
            SoilType::ClayeyFilled => "clayey_filled",
        }
    }
}

impl std::fmt::Display for SoilType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Irrigation water source. Carried on the profile; no rule gates on it yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterSourceQuality {
    #[default]
    Normal,
    HighMineral,
    CleanMountain,
    Brackish,
}

impl WaterSourceQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaterSourceQuality::Normal => "normal",
            WaterSourceQuality::HighMineral => "high_mineral",
            WaterSourceQuality::CleanMountain => "clean_mountain",
            WaterSourceQuality::Brackish => "brackish",
        }
    }
}

impl std::fmt::Display for WaterSourceQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a plot is valued for. Unknown tags are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalAsset {
    Durian,
    Mangosteen,
    Showcase,
    Seedling,
    #[default]
    Mixed,
    #[serde(untagged)]
    Other(String),
}

impl CriticalAsset {
    pub fn as_str(&self) -> &str {
        match self {
            CriticalAsset::Durian => "durian",
            CriticalAsset::Mangosteen => "mangosteen",
            CriticalAsset::Showcase => "showcase",
            CriticalAsset::Seedling => "seedling",
            CriticalAsset::Mixed => "mixed",
            CriticalAsset::Other(tag) => tag,
        }
    }
}

impl std::fmt::Display for CriticalAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-plot risk weighting. Sensitivities run 0-10.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub drought_sensitivity: u8,
    pub flood_sensitivity: u8,
    pub critical_asset: CriticalAsset,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotProfile {
    pub id: String,
    pub name_local: String,
    pub latitude: f64,
    pub longitude: f64,
    pub growth_stage: GrowthStage,
    pub soil_type: SoilType,
    #[serde(default)]
    pub water_source_quality: WaterSourceQuality,
    #[serde(default)]
    pub personality: Personality,
}

impl PlotProfile {
    pub fn new(
        id: impl Into<String>,
        name_local: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name_local: name_local.into(),
            latitude,
            longitude,
            growth_stage: GrowthStage::PreparingLeaf,
            soil_type: SoilType::Loamy,
            water_source_quality: WaterSourceQuality::Normal,
            personality: Personality::default(),
        }
    }

    pub fn with_stage(mut self, stage: GrowthStage) -> Self {
        self.growth_stage = stage;
        self
    }

    pub fn with_soil(mut self, soil: SoilType) -> Self {
        self.soil_type = soil;
        self
    }

    pub fn with_water(mut self, quality: WaterSourceQuality) -> Self {
        self.water_source_quality = quality;
        self
    }

    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = personality;
        self
    }

    pub fn is_stage(&self, stages: &[GrowthStage]) -> bool {
        stages.contains(&self.growth_stage)
    }

    /// Short descriptive tags used on report cards.
    pub fn tags(&self) -> Vec<String> {
        vec![
            self.growth_stage.label().to_string(),
            self.soil_type.as_str().to_string(),
            self.personality.critical_asset.as_str().to_string(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Alias,
    Fallback,
}

/// Outcome of resolving a free-text plot reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotResolution {
    pub query: String,
    pub profile: PlotProfile,
    /// False when the default profile was substituted for an unknown reference.
    pub resolved: bool,
    pub matched_by: MatchKind,
}

impl PlotResolution {
    pub fn plot_id(&self) -> &str {
        &self.profile.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_deserializes_with_snake_case_enums() {
        let json = r#"{
            "id": "durian-hill",
            "name_local": "สวนทุเรียน",
            "latitude": 12.6,
            "longitude": 102.1,
            "growth_stage": "fruit_set",
            "soil_type": "clayey_filled",
            "water_source_quality": "clean_mountain",
            "personality": {
                "drought_sensitivity": 8,
                "flood_sensitivity": 9,
                "critical_asset": "durian"
            }
        }"#;
        let profile: PlotProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.growth_stage, GrowthStage::FruitSet);
        assert_eq!(profile.soil_type, SoilType::ClayeyFilled);
        assert_eq!(
            profile.water_source_quality,
            WaterSourceQuality::CleanMountain
        );
        assert_eq!(profile.personality.critical_asset, CriticalAsset::Durian);
        assert!(profile.personality.notes.is_empty());
    }

    #[test]
    fn unknown_critical_asset_is_kept_as_tag() {
        let personality: Personality = serde_json::from_str(
            r#"{"drought_sensitivity": 2, "flood_sensitivity": 3, "critical_asset": "rambutan"}"#,
        )
        .unwrap();
        assert_eq!(
            personality.critical_asset,
            CriticalAsset::Other("rambutan".into())
        );
        assert_eq!(personality.critical_asset.as_str(), "rambutan");
        assert_eq!(
            serde_json::to_value(&personality.critical_asset).unwrap(),
            serde_json::json!("rambutan")
        );

        let known: CriticalAsset = serde_json::from_str(r#""seedling""#).unwrap();
        assert_eq!(known, CriticalAsset::Seedling);
    }

    #[test]
    fn profile_stage_membership() {
        let profile = PlotProfile::new("p", "Plot", 13.0, 100.0).with_stage(GrowthStage::Bloom);
        assert!(profile.is_stage(&[GrowthStage::Bloom, GrowthStage::FruitSet]));
        assert!(!profile.is_stage(&[GrowthStage::Induction]));
    }
}
