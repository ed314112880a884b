//! Session settings loaded from a JSON file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use manip_types::GraspConfig;
use manip_valve::SessionOptions;
use serde::{Deserialize, Serialize};

/// Contents of a `--config` file. Missing fields keep their defaults.
///
/// Without a `session` table the demo executes on the simulated robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Grasp configuration the session starts from.
    pub grasp: GraspConfig,
    /// Session switches.
    pub session: SessionOptions,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            grasp: GraspConfig::default(),
            session: SessionOptions::live(),
        }
    }
}

impl DemoConfig {
    /// Applies `--vis-only` when it was given; the file value stands otherwise.
    #[must_use]
    pub fn with_vis_only_flag(mut self, flag: Option<bool>) -> Self {
        if let Some(vis_only) = flag {
            self.session.vis_only = vis_only;
        }
        self
    }

    /// Reads and validates a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config
            .grasp
            .validate()
            .with_context(|| format!("Invalid grasp config in {}", path.display()))?;
        Ok(config)
    }
}
