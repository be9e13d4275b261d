pub mod animal;
pub mod cell;
pub mod engine;
pub mod error;
pub mod island;
pub mod params;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod systems;

pub use animal::{Animal, AnimalId, AnimalSpec, Species};
pub use cell::{Cell, LandscapeType, Location};
pub use engine::{PhaseOutcome, PhaseReport, Simulation, SimulationBuilder, YearSummary};
pub use error::{BioSimError, ErrorKind};
pub use island::{Island, PopulationSpec};
pub use params::{LandscapeParameters, ParameterTable, SpeciesParameters};
pub use rng::RandomSource;
pub use scenario::{Scenario, ScenarioLoader};
pub use snapshot::{AnimalSnapshot, CellSnapshot, IslandSnapshot, PopulationCounts, YearRecord};
