//! Immutable per-species constants and per-landscape fodder amounts.
//!
//! Both tables are built with defaults, optionally overridden by name before
//! the first simulated year, and read-only afterwards.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::animal::Species;
use crate::cell::LandscapeType;
use crate::error::{BioSimError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesParameters {
    /// Mean birth weight.
    pub w_birth: f64,
    /// Standard deviation of birth weight.
    pub sigma_birth: f64,
    /// Weight gained per unit of food eaten.
    pub beta: f64,
    /// Fraction of weight lost every year.
    pub eta: f64,
    pub a_half: f64,
    pub phi_age: f64,
    pub w_half: f64,
    pub phi_weight: f64,
    /// Migration probability scale, multiplied by fitness.
    pub mu: f64,
    /// Birth-rate scale.
    pub gamma: f64,
    /// Reproduction weight threshold, as a multiple of `w_birth + sigma_birth`.
    pub zeta: f64,
    /// Parent weight lost per unit of offspring weight.
    pub xi: f64,
    /// Death-probability base rate.
    pub omega: f64,
    /// Appetite: food sought per year.
    pub f: f64,
    /// Fitness advantage at which a kill is certain. Carnivores only.
    pub delta_phi_max: Option<f64>,
}

impl SpeciesParameters {
    pub fn herbivore() -> Self {
        Self {
            w_birth: 8.0,
            sigma_birth: 1.5,
            beta: 0.9,
            eta: 0.05,
            a_half: 40.0,
            phi_age: 0.6,
            w_half: 10.0,
            phi_weight: 0.1,
            mu: 0.25,
            gamma: 0.2,
            zeta: 3.5,
            xi: 1.2,
            omega: 0.4,
            f: 10.0,
            delta_phi_max: None,
        }
    }

    pub fn carnivore() -> Self {
        Self {
            w_birth: 6.0,
            sigma_birth: 1.0,
            beta: 0.75,
            eta: 0.125,
            a_half: 40.0,
            phi_age: 0.3,
            w_half: 4.0,
            phi_weight: 0.4,
            mu: 0.4,
            gamma: 0.8,
            zeta: 3.5,
            xi: 1.1,
            omega: 0.8,
            f: 50.0,
            delta_phi_max: Some(10.0),
        }
    }

    /// Minimum parent weight for attempting a birth.
    pub fn birth_weight_threshold(&self) -> f64 {
        self.zeta * (self.w_birth + self.sigma_birth)
    }

    /// Fitness advantage at which a kill becomes certain; unbounded for species that never hunt.
    pub fn max_kill_advantage(&self) -> f64 {
        self.delta_phi_max.unwrap_or(f64::INFINITY)
    }

    /// Applies named overrides. Either every entry is accepted or nothing changes.
    pub fn apply_overrides(
        &mut self,
        species: Species,
        overrides: &BTreeMap<String, f64>,
    ) -> Result<()> {
        let mut candidate = self.clone();
        for (name, &value) in overrides {
            let slot = match name.as_str() {
                "w_birth" => &mut candidate.w_birth,
                "sigma_birth" => &mut candidate.sigma_birth,
                "beta" => &mut candidate.beta,
                "eta" => &mut candidate.eta,
                "a_half" => &mut candidate.a_half,
                "phi_age" => &mut candidate.phi_age,
                "w_half" => &mut candidate.w_half,
                "phi_weight" => &mut candidate.phi_weight,
                "mu" => &mut candidate.mu,
                "gamma" => &mut candidate.gamma,
                "zeta" => &mut candidate.zeta,
                "xi" => &mut candidate.xi,
                "omega" => &mut candidate.omega,
                "F" => &mut candidate.f,
                "DeltaPhiMax" if species == Species::Carnivore => {
                    candidate.delta_phi_max = Some(value);
                    continue;
                }
                other => {
                    return Err(BioSimError::InvalidParameters(format!(
                        "unknown {species} parameter '{other}'"
                    )))
                }
            };
            *slot = value;
        }
        candidate.validate(species)?;
        *self = candidate;
        Ok(())
    }

    pub fn validate(&self, species: Species) -> Result<()> {
        let named = [
            ("w_birth", self.w_birth),
            ("sigma_birth", self.sigma_birth),
            ("beta", self.beta),
            ("eta", self.eta),
            ("a_half", self.a_half),
            ("phi_age", self.phi_age),
            ("w_half", self.w_half),
            ("phi_weight", self.phi_weight),
            ("mu", self.mu),
            ("gamma", self.gamma),
            ("zeta", self.zeta),
            ("xi", self.xi),
            ("omega", self.omega),
            ("F", self.f),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(BioSimError::InvalidParameters(format!(
                    "{species} parameter '{name}' must be a finite non-negative number, got {value}"
                )));
            }
        }
        if self.w_birth <= 0.0 {
            return Err(BioSimError::InvalidParameters(format!(
                "{species} parameter 'w_birth' must be positive"
            )));
        }
        if self.eta > 1.0 {
            return Err(BioSimError::InvalidParameters(format!(
                "{species} parameter 'eta' must not exceed 1, got {}",
                self.eta
            )));
        }
        match (species, self.delta_phi_max) {
            (Species::Carnivore, Some(max)) if max.is_finite() && max > 0.0 => Ok(()),
            (Species::Carnivore, other) => Err(BioSimError::InvalidParameters(format!(
                "carnivore parameter 'DeltaPhiMax' must be positive, got {other:?}"
            ))),
            (Species::Herbivore, None) => Ok(()),
            (Species::Herbivore, Some(_)) => Err(BioSimError::InvalidParameters(
                "herbivores have no 'DeltaPhiMax' parameter".into(),
            )),
        }
    }
}

/// The two species tables, looked up by species tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterTable {
    pub herbivore: SpeciesParameters,
    pub carnivore: SpeciesParameters,
}

impl ParameterTable {
    pub fn get(&self, species: Species) -> &SpeciesParameters {
        match species {
            Species::Herbivore => &self.herbivore,
            Species::Carnivore => &self.carnivore,
        }
    }

    pub fn apply_overrides(
        &mut self,
        species: Species,
        overrides: &BTreeMap<String, f64>,
    ) -> Result<()> {
        let params = match species {
            Species::Herbivore => &mut self.herbivore,
            Species::Carnivore => &mut self.carnivore,
        };
        params.apply_overrides(species, overrides)
    }

    pub fn validate(&self) -> Result<()> {
        self.herbivore.validate(Species::Herbivore)?;
        self.carnivore.validate(Species::Carnivore)
    }
}

impl Default for ParameterTable {
    fn default() -> Self {
        Self {
            herbivore: SpeciesParameters::herbivore(),
            carnivore: SpeciesParameters::carnivore(),
        }
    }
}

/// Annual fodder regrowth per landscape type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LandscapeParameters {
    pub lowland_f_max: f64,
    pub highland_f_max: f64,
}

impl LandscapeParameters {
    pub fn fodder_max(&self, landscape: LandscapeType) -> f64 {
        match landscape {
            LandscapeType::Lowland => self.lowland_f_max,
            LandscapeType::Highland => self.highland_f_max,
            LandscapeType::Desert | LandscapeType::Water => 0.0,
        }
    }

    pub fn apply_overrides(
        &mut self,
        landscape: LandscapeType,
        overrides: &BTreeMap<String, f64>,
    ) -> Result<()> {
        let mut candidate = *self;
        for (name, &value) in overrides {
            if name != "f_max" {
                return Err(BioSimError::InvalidParameters(format!(
                    "unknown {landscape} parameter '{name}'"
                )));
            }
            match landscape {
                LandscapeType::Lowland => candidate.lowland_f_max = value,
                LandscapeType::Highland => candidate.highland_f_max = value,
                LandscapeType::Desert | LandscapeType::Water => {
                    return Err(BioSimError::InvalidParameters(format!(
                        "{landscape} never grows fodder"
                    )))
                }
            }
        }
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.highland_f_max.is_finite() || self.highland_f_max < 0.0 {
            return Err(BioSimError::InvalidParameters(format!(
                "highland f_max must be a finite non-negative number, got {}",
                self.highland_f_max
            )));
        }
        if !self.lowland_f_max.is_finite() || self.lowland_f_max <= self.highland_f_max {
            return Err(BioSimError::InvalidParameters(format!(
                "lowland f_max ({}) must exceed highland f_max ({})",
                self.lowland_f_max, self.highland_f_max
            )));
        }
        Ok(())
    }
}

impl Default for LandscapeParameters {
    fn default() -> Self {
        Self {
            lowland_f_max: 800.0,
            highland_f_max: 300.0,
        }
    }
}
