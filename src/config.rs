use crate::error::{OrchardOpsError, Result};
use crate::logic::calculations::GDD_BASE_TEMP_C;
use crate::logic::context::normalize;
use crate::models::{
    CriticalAsset, GrowthStage, Personality, PlotProfile, SoilType, WaterSourceQuality,
};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Longest forecast horizon the engine will carry.
pub const MAX_HORIZON_DAYS: u32 = 14;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub plots: Vec<PlotProfile>,
    #[serde(default)]
    pub aliases: Vec<AliasConfig>,
    pub default_plot: String,
    #[serde(default)]
    pub engine: EngineSettings,
}

/// Keyword that maps free text (legacy names, transliterations, Thai
/// spellings) onto a canonical plot id.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AliasConfig {
    pub keyword: String,
    pub plot: String,
}

impl AliasConfig {
    pub fn new(keyword: &str, plot: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            plot: plot.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineSettings {
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
    #[serde(default = "default_recent_activity_limit")]
    pub recent_activity_limit: usize,
    #[serde(default = "default_gdd_base")]
    pub gdd_base_temp_c: f64,
    /// Local civil time of the orchards, used to decide "today".
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

fn default_horizon_days() -> u32 {
    7
}

fn default_recent_activity_limit() -> usize {
    5
}

fn default_gdd_base() -> f64 {
    GDD_BASE_TEMP_C
}

fn default_utc_offset_hours() -> i32 {
    7
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon_days(),
            recent_activity_limit: default_recent_activity_limit(),
            gdd_base_temp_c: default_gdd_base(),
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

impl EngineSettings {
    pub fn offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            OrchardOpsError::Config(format!(
                "utc_offset_hours {} is out of range",
                self.utc_offset_hours
            ))
        })
    }
}

impl Config {
    /// Load from the override path or the standard locations, falling back to
    /// the built-in plot table when no file exists.
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => {
                if !p.exists() {
                    return Err(OrchardOpsError::Config(format!(
                        "Config file not found at {:?}",
                        p
                    )));
                }
                p
            }
            None => match Self::find_config_path() {
                Some(p) => p,
                None => {
                    tracing::info!("No config file found - using built-in plot table");
                    return Ok(Self::default());
                }
            },
        };

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| OrchardOpsError::Config(format!("Failed to read config: {}", e)))?;

        let config = Self::from_yaml(&config_str)?;
        tracing::debug!(
            "Loaded {} plots from {}",
            config.plots.len(),
            config_path.display()
        );
        Ok(config)
    }

    /// Parse YAML after `${VAR}` substitution, then validate.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let content = Self::substitute_env_vars(content)?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| OrchardOpsError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Search for config.yaml in standard locations.
    fn find_config_path() -> Option<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir()
            .map(|dir| dir.join("orchardops").join("config.yaml"))
            .filter(|p| p.exists())
    }

    pub fn validate(&self) -> Result<()> {
        if self.plots.is_empty() {
            return Err(OrchardOpsError::Config("No plots configured".into()));
        }

        let mut seen = HashSet::new();
        for plot in &self.plots {
            if plot.id.trim().is_empty() {
                return Err(OrchardOpsError::Config("Plot with empty id".into()));
            }
            if !seen.insert(plot.id.as_str()) {
                return Err(OrchardOpsError::Config(format!(
                    "Duplicate plot id '{}'",
                    plot.id
                )));
            }
            if !(-90.0..=90.0).contains(&plot.latitude)
                || !(-180.0..=180.0).contains(&plot.longitude)
            {
                return Err(OrchardOpsError::Config(format!(
                    "Plot '{}' has invalid coordinates ({}, {})",
                    plot.id, plot.latitude, plot.longitude
                )));
            }
            let p = &plot.personality;
            if p.drought_sensitivity > 10 || p.flood_sensitivity > 10 {
                return Err(OrchardOpsError::Config(format!(
                    "Plot '{}' sensitivities must be 0-10",
                    plot.id
                )));
            }
        }

        if !seen.contains(self.default_plot.as_str()) {
            return Err(OrchardOpsError::Config(format!(
                "default_plot '{}' is not a configured plot",
                self.default_plot
            )));
        }

        for alias in &self.aliases {
            if normalize(&alias.keyword).is_empty() {
                return Err(OrchardOpsError::Config(format!(
                    "Alias keyword '{}' for plot '{}' is empty after normalisation",
                    alias.keyword, alias.plot
                )));
            }
            if !seen.contains(alias.plot.as_str()) {
                return Err(OrchardOpsError::Config(format!(
                    "Alias '{}' points at unknown plot '{}'",
                    alias.keyword, alias.plot
                )));
            }
        }

        if self.engine.horizon_days == 0 || self.engine.horizon_days > MAX_HORIZON_DAYS {
            return Err(OrchardOpsError::Config(format!(
                "horizon_days must be 1-{}",
                MAX_HORIZON_DAYS
            )));
        }
        if !self.engine.gdd_base_temp_c.is_finite() {
            return Err(OrchardOpsError::Config("gdd_base_temp_c must be finite".into()));
        }
        self.engine.offset()?;

        Ok(())
    }

    fn substitute_env_vars(content: &str) -> Result<String> {
        let mut result = content.to_string();

        let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| OrchardOpsError::Config(format!("Bad substitution pattern: {}", e)))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        Ok(result)
    }
}

#[allow(clippy::too_many_arguments)]
fn seed_plot(
    id: &str,
    name_local: &str,
    coords: (f64, f64),
    stage: GrowthStage,
    soil: SoilType,
    water: WaterSourceQuality,
    sensitivities: (u8, u8),
    asset: CriticalAsset,
    notes: &str,
) -> PlotProfile {
    PlotProfile::new(id, name_local, coords.0, coords.1)
        .with_stage(stage)
        .with_soil(soil)
        .with_water(water)
        .with_personality(Personality {
            drought_sensitivity: sensitivities.0,
            flood_sensitivity: sensitivities.1,
            critical_asset: asset,
            notes: notes.to_string(),
        })
}

impl Default for Config {
    fn default() -> Self {
        let plots = vec![
            seed_plot(
                "durian-hill",
                "สวนทุเรียนเนินเขา",
                (12.61, 102.10),
                GrowthStage::FruitSet,
                SoilType::ClayeyFilled,
                WaterSourceQuality::CleanMountain,
                (8, 9),
                CriticalAsset::Durian,
                "Terraced fill over clay; drains slowly after storms",
            ),
            seed_plot(
                "mangosteen-valley",
                "สวนมังคุด",
                (12.58, 102.16),
                GrowthStage::Induction,
                SoilType::Loamy,
                WaterSourceQuality::Normal,
                (5, 6),
                CriticalAsset::Mangosteen,
                "",
            ),
            seed_plot(
                "tamarind-grove",
                "สวนมะขาม",
                (16.43, 101.15),
                GrowthStage::PreparingLeaf,
                SoilType::Sandy,
                WaterSourceQuality::HighMineral,
                (7, 2),
                CriticalAsset::Mixed,
                "Sweet tamarind on sandy upland",
            ),
            seed_plot(
                "showcase-garden",
                "สวนโชว์",
                (13.74, 100.52),
                GrowthStage::Bloom,
                SoilType::LoamySandy,
                WaterSourceQuality::Normal,
                (4, 4),
                CriticalAsset::Showcase,
                "Visitor-facing rows",
            ),
            seed_plot(
                "nursery",
                "แปลงเพาะกล้า",
                (13.74, 100.53),
                GrowthStage::Seedling,
                SoilType::Loamy,
                WaterSourceQuality::Normal,
                (9, 5),
                CriticalAsset::Seedling,
                "",
            ),
            seed_plot(
                "home-mixed",
                "สวนหลังบ้าน",
                (13.73, 100.52),
                GrowthStage::Harvest,
                SoilType::Clayey,
                WaterSourceQuality::Brackish,
                (3, 3),
                CriticalAsset::Mixed,
                "Catch-all plot",
            ),
        ];

        let aliases = [
            ("suan-makham", "tamarind-grove"),
            ("makham", "tamarind-grove"),
            ("มะขาม", "tamarind-grove"),
            ("thurian", "durian-hill"),
            ("durian", "durian-hill"),
            ("ทุเรียน", "durian-hill"),
            ("mangkhut", "mangosteen-valley"),
            ("mangosteen", "mangosteen-valley"),
            ("มังคุด", "mangosteen-valley"),
            ("showcase", "showcase-garden"),
            ("โชว์", "showcase-garden"),
            ("seedling", "nursery"),
            ("กล้า", "nursery"),
            ("backyard", "home-mixed"),
            ("หลังบ้าน", "home-mixed"),
        ]
        .into_iter()
        .map(|(keyword, plot)| AliasConfig::new(keyword, plot))
        .collect();

        Self {
            plots,
            aliases,
            default_plot: "home-mixed".into(),
            engine: EngineSettings::default(),
        }
    }
}
