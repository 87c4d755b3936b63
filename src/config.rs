use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use anyhow::Context;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoidsConfig {
    pub weights: ForceWeights,
    pub rules: RuleKnobs,
    pub resolver: ResolverKnobs,
    pub run: RunKnobs,
}

/// Blend factors for the three rules. Read once when the simulator is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceWeights {
    pub separation: f32, // 1.5
    pub alignment: f32,  // 1.0
    pub cohesion: f32,   // 1.2
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleKnobs {
    pub separation_threshold: f32, // neighbors closer than this repel
    pub epsilon: f32,              // guards division when vectors coincide
    pub neighbor_window: usize,    // preceding words considered
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverKnobs {
    pub top_k: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunKnobs {
    pub iterations: usize,
    pub seed: Option<u64>,
    pub separator: String,
}

impl Default for ForceWeights {
    fn default() -> Self {
        Self {
            separation: 1.5,
            alignment: 1.0,
            cohesion: 1.2,
        }
    }
}

impl Default for RuleKnobs {
    fn default() -> Self {
        Self {
            separation_threshold: 0.5,
            epsilon: 1e-6,
            neighbor_window: 5,
        }
    }
}

impl Default for ResolverKnobs {
    fn default() -> Self {
        Self { top_k: 10 }
    }
}

impl Default for RunKnobs {
    fn default() -> Self {
        Self {
            iterations: 20,
            seed: None,
            separator: " ".to_string(),
        }
    }
}

impl BoidsConfig {
    /// Missing file means defaults. A present but malformed file is an error.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }
}
