//! Owned, read-only views of the engine state for plotting and reporting.
//!
//! Nothing here borrows from the island: every value is copied out, so a
//! consumer can hold snapshots while the simulation keeps advancing.

use serde::Serialize;

use crate::animal::{Animal, AnimalId, Species};
use crate::cell::{Cell, LandscapeType, Location};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PopulationCounts {
    pub herbivores: usize,
    pub carnivores: usize,
}

impl PopulationCounts {
    pub fn total(&self) -> usize {
        self.herbivores + self.carnivores
    }

    pub fn get(&self, species: Species) -> usize {
        match species {
            Species::Herbivore => self.herbivores,
            Species::Carnivore => self.carnivores,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimalSnapshot {
    pub id: AnimalId,
    pub species: Species,
    pub age: u32,
    pub weight: f64,
    pub fitness: f64,
    pub location: Location,
}

impl AnimalSnapshot {
    pub(crate) fn from_animal(animal: &Animal, location: Location) -> Self {
        Self {
            id: animal.id(),
            species: animal.species(),
            age: animal.age(),
            weight: animal.weight(),
            fitness: animal.fitness(),
            location,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellSnapshot {
    pub location: Location,
    pub landscape: LandscapeType,
    pub fodder: f64,
    pub herbivores: usize,
    pub carnivores: usize,
}

impl CellSnapshot {
    pub(crate) fn from_cell(cell: &Cell) -> Self {
        Self {
            location: cell.location(),
            landscape: cell.landscape(),
            fodder: cell.fodder(),
            herbivores: cell.count(Species::Herbivore),
            carnivores: cell.count(Species::Carnivore),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearRecord {
    pub year: u32,
    pub counts: PopulationCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IslandSnapshot {
    pub year: u32,
    pub counts: PopulationCounts,
    pub cells: Vec<CellSnapshot>,
    pub animals: Vec<AnimalSnapshot>,
}
