use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BioSimError, Result};
use crate::params::SpeciesParameters;
use crate::rng::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Species {
    Herbivore,
    Carnivore,
}

impl Species {
    pub const ALL: [Species; 2] = [Species::Herbivore, Species::Carnivore];
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Species::Herbivore => write!(f, "Herbivore"),
            Species::Carnivore => write!(f, "Carnivore"),
        }
    }
}

impl FromStr for Species {
    type Err = BioSimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Herbivore" | "herbivore" => Ok(Species::Herbivore),
            "Carnivore" | "carnivore" => Ok(Species::Carnivore),
            other => Err(BioSimError::InvalidAnimalSpec(format!(
                "unknown species '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnimalId(u64);

impl AnimalId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Hands out unique ids for the lifetime of one island.
#[derive(Debug, Clone, Default)]
pub(crate) struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub(crate) fn allocate(&mut self) -> AnimalId {
        let id = AnimalId(self.next);
        self.next += 1;
        id
    }
}

/// Product of a logistic term rising with weight and one falling with age.
/// Non-positive weight always gives zero.
pub fn fitness(age: u32, weight: f64, params: &SpeciesParameters) -> f64 {
    if weight <= 0.0 {
        return 0.0;
    }
    let age_part = 1.0 / (1.0 + (params.phi_age * (age as f64 - params.a_half)).exp());
    let weight_part = 1.0 / (1.0 + (-params.phi_weight * (weight - params.w_half)).exp());
    (age_part * weight_part).clamp(0.0, 1.0)
}

/// Chance that a predator with `predator` fitness kills prey with `prey` fitness.
pub fn kill_probability(predator: f64, prey: f64, delta_phi_max: f64) -> f64 {
    let advantage = predator - prey;
    if advantage <= 0.0 {
        0.0
    } else if advantage >= delta_phi_max {
        1.0
    } else {
        advantage / delta_phi_max
    }
}

/// Gaussian birth weight, redrawn until positive. `w_birth > 0` guarantees termination.
pub fn draw_birth_weight(params: &SpeciesParameters, rng: &mut RandomSource) -> f64 {
    loop {
        let weight = rng.gaussian(params.w_birth, params.sigma_birth);
        if weight > 0.0 {
            return weight;
        }
    }
}

/// One individual. Fitness is recomputed by every method that changes age or weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Animal {
    id: AnimalId,
    species: Species,
    age: u32,
    weight: f64,
    fitness: f64,
}

impl Animal {
    pub fn new(
        id: AnimalId,
        species: Species,
        age: u32,
        weight: f64,
        params: &SpeciesParameters,
    ) -> Self {
        Self {
            id,
            species,
            age,
            weight,
            fitness: fitness(age, weight, params),
        }
    }

    pub fn id(&self) -> AnimalId {
        self.id
    }

    pub fn species(&self) -> Species {
        self.species
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn is_dead(&self) -> bool {
        self.weight <= 0.0
    }

    fn refresh_fitness(&mut self, params: &SpeciesParameters) {
        self.fitness = fitness(self.age, self.weight, params);
    }

    /// Eats `amount` of food and returns the weight gained.
    pub fn feed(&mut self, amount: f64, params: &SpeciesParameters) -> f64 {
        let gain = params.beta * amount.max(0.0);
        self.weight += gain;
        self.refresh_fitness(params);
        gain
    }

    pub fn lose_weight(&mut self, amount: f64, params: &SpeciesParameters) {
        self.weight = (self.weight - amount).max(0.0);
        self.refresh_fitness(params);
    }

    pub fn annual_weight_loss(&mut self, params: &SpeciesParameters) {
        let loss = params.eta * self.weight;
        self.lose_weight(loss, params);
    }

    pub fn grow_older(&mut self, params: &SpeciesParameters) {
        self.age = self.age.saturating_add(1);
        self.refresh_fitness(params);
    }

    /// Newborn of `species` with a positive weight drawn from the birth-weight distribution.
    pub(crate) fn newborn(
        id: AnimalId,
        species: Species,
        params: &SpeciesParameters,
        rng: &mut RandomSource,
    ) -> Self {
        let weight = draw_birth_weight(params, rng);
        Self::new(id, species, 0, weight, params)
    }

    pub fn can_attempt_birth(&self, params: &SpeciesParameters) -> bool {
        self.weight >= params.birth_weight_threshold()
    }

    /// `min(1, gamma * fitness * (n - 1))` for `n` same-species animals in the cell.
    pub fn birth_probability(&self, population: usize, params: &SpeciesParameters) -> f64 {
        let others = population.saturating_sub(1) as f64;
        (params.gamma * self.fitness * others).min(1.0)
    }

    pub fn migration_probability(&self, params: &SpeciesParameters) -> f64 {
        (params.mu * self.fitness).min(1.0)
    }

    pub fn death_probability(&self, params: &SpeciesParameters) -> f64 {
        if self.is_dead() {
            1.0
        } else {
            (params.omega * (1.0 - self.fitness)).min(1.0)
        }
    }
}

/// One animal in a population injection payload. Missing age means newborn,
/// missing weight means a draw from the birth-weight distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalSpec {
    pub species: String,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub weight: Option<f64>,
}

impl AnimalSpec {
    pub fn new(species: impl Into<String>, age: Option<i64>, weight: Option<f64>) -> Self {
        Self {
            species: species.into(),
            age,
            weight,
        }
    }

    pub fn herbivore(age: i64, weight: f64) -> Self {
        Self::new("Herbivore", Some(age), Some(weight))
    }

    pub fn carnivore(age: i64, weight: f64) -> Self {
        Self::new("Carnivore", Some(age), Some(weight))
    }

    pub(crate) fn validate(&self) -> Result<(Species, u32, Option<f64>)> {
        let species: Species = self.species.parse()?;
        let age = match self.age {
            None => 0,
            Some(age) if age < 0 => {
                return Err(BioSimError::InvalidAnimalSpec(format!(
                    "age must be non-negative, got {age}"
                )))
            }
            Some(age) => u32::try_from(age).map_err(|_| {
                BioSimError::InvalidAnimalSpec(format!("age {age} is out of range"))
            })?,
        };
        if let Some(weight) = self.weight {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(BioSimError::InvalidAnimalSpec(format!(
                    "weight must be a positive number, got {weight}"
                )));
            }
        }
        Ok((species, age, self.weight))
    }
}
