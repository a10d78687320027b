use crate::config::Config;
use crate::error::{OrchardOpsError, Result};
use crate::models::{MatchKind, PlotProfile, PlotResolution};
use async_trait::async_trait;

/// Maps a plot reference to a canonical profile.
///
/// Implementations may be backed by a cache or a database and may suspend;
/// they never fail. Unknown references come back as the default profile with
/// `resolved == false`.
#[async_trait]
pub trait PlotResolver: Send + Sync {
    async fn resolve(&self, plot_ref: &str) -> PlotResolution;
}

/// In-memory profile table with an ordered alias list.
#[derive(Debug, Clone)]
pub struct ProfileTable {
    profiles: Vec<PlotProfile>,
    aliases: Vec<(String, usize)>,
    default_index: usize,
}

pub(crate) fn normalize(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

impl ProfileTable {
    pub fn new(
        profiles: Vec<PlotProfile>,
        aliases: &[(String, String)],
        default_plot: &str,
    ) -> Result<Self> {
        let index_of = |id: &str| profiles.iter().position(|p| p.id == id);

        let default_index = index_of(default_plot).ok_or_else(|| {
            OrchardOpsError::NotFound(format!("default plot '{}'", default_plot))
        })?;

        let aliases = aliases
            .iter()
            .map(|(keyword, plot)| {
                let keyword = normalize(keyword);
                if keyword.is_empty() {
                    return Err(OrchardOpsError::Config(format!(
                        "alias for '{}' has an empty keyword",
                        plot
                    )));
                }
                index_of(plot)
                    .map(|idx| (keyword, idx))
                    .ok_or_else(|| OrchardOpsError::NotFound(format!("alias target '{}'", plot)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            profiles,
            aliases,
            default_index,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let aliases: Vec<(String, String)> = config
            .aliases
            .iter()
            .map(|a| (a.keyword.clone(), a.plot.clone()))
            .collect();
        Self::new(config.plots.clone(), &aliases, &config.default_plot)
    }

    pub fn profiles(&self) -> &[PlotProfile] {
        &self.profiles
    }

    pub fn default_profile(&self) -> &PlotProfile {
        &self.profiles[self.default_index]
    }

    /// Exact slug, then alias keyword contained in the reference, then the
    /// default profile.
    pub fn lookup(&self, plot_ref: &str) -> PlotResolution {
        let needle = normalize(plot_ref);

        if let Some(profile) = self.profiles.iter().find(|p| normalize(&p.id) == needle) {
            return PlotResolution {
                query: plot_ref.to_string(),
                profile: profile.clone(),
                resolved: true,
                matched_by: MatchKind::Exact,
            };
        }

        if !needle.is_empty() {
            if let Some((keyword, idx)) = self
                .aliases
                .iter()
                .find(|(keyword, _)| needle.contains(keyword.as_str()))
            {
                tracing::debug!(
                    "Plot ref '{}' matched alias '{}' -> {}",
                    plot_ref,
                    keyword,
                    self.profiles[*idx].id
                );
                return PlotResolution {
                    query: plot_ref.to_string(),
                    profile: self.profiles[*idx].clone(),
                    resolved: true,
                    matched_by: MatchKind::Alias,
                };
            }
        }

        let fallback = self.default_profile();
        tracing::warn!(
            "Unknown plot ref '{}' - falling back to default plot '{}'",
            plot_ref,
            fallback.id
        );
        PlotResolution {
            query: plot_ref.to_string(),
            profile: fallback.clone(),
            resolved: false,
            matched_by: MatchKind::Fallback,
        }
    }
}

#[async_trait]
impl PlotResolver for ProfileTable {
    async fn resolve(&self, plot_ref: &str) -> PlotResolution {
        self.lookup(plot_ref)
    }
}
