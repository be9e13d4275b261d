use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
    animal::Species,
    cell::LandscapeType,
    engine::{Simulation, SimulationBuilder},
    error::BioSimError,
    island::PopulationSpec,
    rng::DEFAULT_SEED,
};

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_years() -> u32 {
    10
}

/// A complete run configuration, usually read from YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    /// Free-form note for whoever reads the scenario file; not used by the run.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub years: Option<u32>,
    pub map: String,
    /// Landscape code or name to parameter overrides, e.g. `L: {f_max: 700}`.
    #[serde(default)]
    pub landscape: BTreeMap<String, BTreeMap<String, f64>>,
    /// Species name to parameter overrides, e.g. `Herbivore: {mu: 0.3}`.
    #[serde(default)]
    pub species: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    pub populations: Vec<PopulationSpec>,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        Scenario::from_yaml(&data).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

impl Scenario {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(text)?;
        Ok(scenario)
    }

    pub fn years(&self, override_years: Option<u32>) -> u32 {
        override_years.or(self.years).unwrap_or_else(default_years)
    }

    pub fn builder(&self) -> Result<SimulationBuilder, BioSimError> {
        let mut builder = Simulation::builder(self.map.as_str()).seed(self.seed);
        for (name, overrides) in &self.landscape {
            let landscape: LandscapeType = name.parse()?;
            builder = builder.landscape_parameters(landscape, overrides.clone());
        }
        for (name, overrides) in &self.species {
            let species: Species = name
                .parse()
                .map_err(|_| BioSimError::InvalidParameters(format!("unknown species '{name}'")))?;
            builder = builder.species_parameters(species, overrides.clone());
        }
        Ok(builder.populations(self.populations.iter().cloned()))
    }

    pub fn build_simulation(&self) -> Result<Simulation, BioSimError> {
        self.builder()?.build()
    }
}
