use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Exporter configuration file.
///
/// Only the fields this crate needs are decoded; the rest of each program
/// definition belongs to the program loader and is ignored here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub programs: Vec<ProgramConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProgramConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading config file {}", path.display());

        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(raw)
            .map_err(|e| Error::Config(format!("Error reading config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn program_names(&self) -> Vec<String> {
        self.programs.iter().map(|p| p.name.clone()).collect()
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for program in &self.programs {
            if program.name.trim().is_empty() {
                return Err(Error::Config("program with empty name".to_string()));
            }
            if !seen.insert(program.name.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate program name: {}",
                    program.name
                )));
            }
        }

        Ok(())
    }
}
