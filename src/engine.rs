//! Year-step orchestration.
//!
//! A [`Simulation`] owns the island, the parameter tables and the single
//! random source. Each call to [`Simulation::advance_one_year`] runs the six
//! annual phases in a fixed order; every phase finishes on the whole island
//! before the next one starts.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::animal::Species;
use crate::cell::LandscapeType;
use crate::error::{BioSimError, Result};
use crate::island::{Island, PopulationSpec};
use crate::params::{LandscapeParameters, ParameterTable, SpeciesParameters};
use crate::rng::{RandomSource, DEFAULT_SEED};
use crate::snapshot::{AnimalSnapshot, CellSnapshot, IslandSnapshot, PopulationCounts, YearRecord};
use crate::systems::{
    AgingSystem, FeedingSystem, MigrationSystem, MortalitySystem, RegrowthSystem,
    ReproductionSystem,
};

pub struct SystemContext<'a> {
    pub year: u32,
    pub params: &'a ParameterTable,
}

/// One phase of the annual cycle.
pub trait System {
    fn name(&self) -> &'static str;
    fn run(
        &mut self,
        ctx: &SystemContext<'_>,
        island: &mut Island,
        rng: &mut RandomSource,
    ) -> Result<PhaseOutcome>;
}

/// Event counts produced by a phase. Phases leave irrelevant fields at zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseOutcome {
    pub fodder_eaten: f64,
    pub kills: usize,
    pub births: usize,
    pub moves: usize,
    pub deaths: usize,
}

impl PhaseOutcome {
    fn absorb(&mut self, other: &PhaseOutcome) {
        self.fodder_eaten += other.fodder_eaten;
        self.kills += other.kills;
        self.births += other.births;
        self.moves += other.moves;
        self.deaths += other.deaths;
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PhaseReport {
    pub name: &'static str,
    pub duration_ms: f64,
    pub outcome: PhaseOutcome,
}

#[derive(Clone, Debug, Serialize)]
pub struct YearSummary {
    pub year: u32,
    pub phases: Vec<PhaseReport>,
    pub totals: PhaseOutcome,
    pub counts: PopulationCounts,
}

/// Runs its systems in insertion order and checks the island invariants
/// after each one.
pub struct Scheduler {
    systems: Vec<Box<dyn System>>,
}

impl Scheduler {
    pub fn annual_cycle() -> Self {
        let mut scheduler = Self {
            systems: Vec::new(),
        };
        scheduler.add_system(Box::new(RegrowthSystem::new()));
        scheduler.add_system(Box::new(FeedingSystem::new()));
        scheduler.add_system(Box::new(ReproductionSystem::new()));
        scheduler.add_system(Box::new(MigrationSystem::new()));
        scheduler.add_system(Box::new(AgingSystem::new()));
        scheduler.add_system(Box::new(MortalitySystem::new()));
        scheduler
    }

    fn add_system(&mut self, system: Box<dyn System>) {
        self.systems.push(system);
    }

    pub fn phase_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|system| system.name()).collect()
    }

    pub fn run(
        &mut self,
        ctx: &SystemContext<'_>,
        island: &mut Island,
        rng: &mut RandomSource,
    ) -> Result<Vec<PhaseReport>> {
        let mut reports = Vec::with_capacity(self.systems.len());
        for system in self.systems.iter_mut() {
            let start = Instant::now();
            let outcome = system.run(ctx, island, rng)?;
            island
                .check_invariants()
                .map_err(|reason| BioSimError::InvariantViolation {
                    phase: system.name().to_string(),
                    reason,
                })?;
            let duration_ms = start.elapsed().as_secs_f64() * 1_000.0;
            debug!(year = ctx.year, phase = system.name(), duration_ms, "phase complete");
            reports.push(PhaseReport {
                name: system.name(),
                duration_ms,
                outcome,
            });
        }
        Ok(reports)
    }
}

/// Collects configuration and initial populations, then validates everything at once.
pub struct SimulationBuilder {
    map: String,
    seed: u64,
    params: ParameterTable,
    landscape: LandscapeParameters,
    species_overrides: Vec<(Species, BTreeMap<String, f64>)>,
    landscape_overrides: Vec<(LandscapeType, BTreeMap<String, f64>)>,
    populations: Vec<PopulationSpec>,
}

impl SimulationBuilder {
    pub fn new(map: impl Into<String>) -> Self {
        Self {
            map: map.into(),
            seed: DEFAULT_SEED,
            params: ParameterTable::default(),
            landscape: LandscapeParameters::default(),
            species_overrides: Vec::new(),
            landscape_overrides: Vec::new(),
            populations: Vec::new(),
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn species_parameters(mut self, species: Species, overrides: BTreeMap<String, f64>) -> Self {
        self.species_overrides.push((species, overrides));
        self
    }

    pub fn landscape_parameters(
        mut self,
        landscape: LandscapeType,
        overrides: BTreeMap<String, f64>,
    ) -> Self {
        self.landscape_overrides.push((landscape, overrides));
        self
    }

    pub fn population(mut self, population: PopulationSpec) -> Self {
        self.populations.push(population);
        self
    }

    pub fn populations(mut self, populations: impl IntoIterator<Item = PopulationSpec>) -> Self {
        self.populations.extend(populations);
        self
    }

    pub fn build(mut self) -> Result<Simulation> {
        for (species, overrides) in &self.species_overrides {
            self.params.apply_overrides(*species, overrides)?;
        }
        for (landscape, overrides) in &self.landscape_overrides {
            self.landscape.apply_overrides(*landscape, overrides)?;
        }
        let island = Island::from_map(&self.map, self.landscape)?;
        let mut simulation = Simulation {
            island,
            params: self.params,
            rng: RandomSource::new(self.seed),
            scheduler: Scheduler::annual_cycle(),
            year: 0,
            history: Vec::new(),
        };
        simulation.add_population(&self.populations)?;
        Ok(simulation)
    }
}

pub struct Simulation {
    island: Island,
    params: ParameterTable,
    rng: RandomSource,
    scheduler: Scheduler,
    year: u32,
    history: Vec<YearRecord>,
}

impl Simulation {
    pub fn new(map: &str, seed: u64) -> Result<Self> {
        SimulationBuilder::new(map).seed(seed).build()
    }

    pub fn builder(map: impl Into<String>) -> SimulationBuilder {
        SimulationBuilder::new(map)
    }

    fn ensure_not_started(&self, what: &str) -> Result<()> {
        if self.year > 0 {
            return Err(BioSimError::InvalidParameters(format!(
                "{what} can only change before the first year, simulation is at year {}",
                self.year
            )));
        }
        Ok(())
    }

    pub fn set_animal_parameters(
        &mut self,
        species: Species,
        overrides: &BTreeMap<String, f64>,
    ) -> Result<()> {
        self.ensure_not_started("species parameters")?;
        self.params.apply_overrides(species, overrides)
    }

    pub fn set_landscape_parameters(
        &mut self,
        landscape: LandscapeType,
        overrides: &BTreeMap<String, f64>,
    ) -> Result<()> {
        self.ensure_not_started("landscape parameters")?;
        let mut updated = *self.island.landscape_parameters();
        updated.apply_overrides(landscape, overrides)?;
        self.island.set_landscape_parameters(updated);
        Ok(())
    }

    /// Places animals; any invalid entry rejects the whole payload.
    pub fn add_population(&mut self, populations: &[PopulationSpec]) -> Result<usize> {
        let added = self
            .island
            .add_population(populations, &self.params, &mut self.rng)?;
        debug!(added, "population injected");
        Ok(added)
    }

    /// Runs one annual cycle. On failure the island and random stream are
    /// restored to their state before the year started.
    pub fn advance_one_year(&mut self) -> Result<YearSummary> {
        self.params.validate()?;
        let island_checkpoint = self.island.clone();
        let rng_checkpoint = self.rng.clone();
        let year = self.year + 1;
        let ctx = SystemContext {
            year,
            params: &self.params,
        };
        let phases = match self.scheduler.run(&ctx, &mut self.island, &mut self.rng) {
            Ok(phases) => phases,
            Err(err) => {
                warn!(year, error = %err, "year aborted, restoring previous state");
                self.island = island_checkpoint;
                self.rng = rng_checkpoint;
                return Err(err);
            }
        };

        self.year = year;
        let counts = self.island.counts();
        self.history.push(YearRecord { year, counts });
        let mut totals = PhaseOutcome::default();
        for phase in &phases {
            totals.absorb(&phase.outcome);
        }
        info!(
            year,
            herbivores = counts.herbivores,
            carnivores = counts.carnivores,
            births = totals.births,
            deaths = totals.deaths,
            "year complete"
        );
        Ok(YearSummary {
            year,
            phases,
            totals,
            counts,
        })
    }

    /// Runs `years` annual cycles. Years completed before a failure are kept.
    pub fn advance(&mut self, years: u32) -> Result<Vec<YearSummary>> {
        let mut summaries = Vec::new();
        for _ in 0..years {
            summaries.push(self.advance_one_year()?);
        }
        Ok(summaries)
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn num_animals(&self) -> usize {
        self.island.counts().total()
    }

    pub fn num_animals_per_species(&self) -> PopulationCounts {
        self.island.counts()
    }

    pub fn species_parameters(&self, species: Species) -> &SpeciesParameters {
        self.params.get(species)
    }

    pub fn landscape_parameters(&self) -> &LandscapeParameters {
        self.island.landscape_parameters()
    }

    pub fn island(&self) -> &Island {
        &self.island
    }

    pub fn cell_snapshots(&self) -> Vec<CellSnapshot> {
        self.island.cell_snapshots()
    }

    pub fn animal_snapshots(&self) -> Vec<AnimalSnapshot> {
        self.island.animal_snapshots()
    }

    pub fn distribution(&self, species: Species) -> Vec<Vec<usize>> {
        self.island.distribution(species)
    }

    /// Counts at the end of every completed year, oldest first.
    pub fn population_history(&self) -> &[YearRecord] {
        &self.history
    }

    pub fn snapshot(&self) -> IslandSnapshot {
        IslandSnapshot {
            year: self.year,
            counts: self.island.counts(),
            cells: self.island.cell_snapshots(),
            animals: self.island.animal_snapshots(),
        }
    }
}
