//! Battle packages: a setup plus engine configuration in one JSON file.

use anyhow::{Context, Result};
use hexfleet_core::manager::GameSetup;
use hexfleet_core::EngineConfig;
use serde::Deserialize;
use std::path::Path;

/// On-disk format read by `run` and `check`.
#[derive(Debug, Deserialize)]
pub(crate) struct BattlePackage {
    #[serde(flatten)]
    pub(crate) setup: GameSetup,
    #[serde(default)]
    pub(crate) config: EngineConfig,
}

impl BattlePackage {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }
}
