use serde::{Deserialize, Serialize};

use crate::animal::{draw_birth_weight, Animal, AnimalSpec, IdAllocator, Species};
use crate::cell::{Cell, LandscapeType, Location};
use crate::error::{BioSimError, Result};
use crate::params::{LandscapeParameters, ParameterTable};
use crate::rng::RandomSource;
use crate::snapshot::{AnimalSnapshot, CellSnapshot, PopulationCounts};

/// Animals to place in one cell: `{loc: [row, col], pop: [...]}`.
///
/// Coordinates are kept signed so a negative entry in a scenario file is
/// reported as an invalid location rather than a parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSpec {
    pub loc: (i64, i64),
    pub pop: Vec<AnimalSpec>,
}

impl PopulationSpec {
    pub fn new(location: impl Into<Location>, animals: Vec<AnimalSpec>) -> Self {
        let location = location.into();
        Self {
            loc: (signed(location.row), signed(location.col)),
            pop: animals,
        }
    }

    pub fn location(&self) -> Result<Location> {
        let (row, col) = self.loc;
        match (usize::try_from(row), usize::try_from(col)) {
            (Ok(r), Ok(c)) => Ok(Location::new(r, c)),
            _ => Err(BioSimError::InvalidLocation {
                row,
                col,
                reason: "coordinates must be non-negative".into(),
            }),
        }
    }
}

fn signed(coordinate: usize) -> i64 {
    i64::try_from(coordinate).unwrap_or(i64::MAX)
}

/// Rectangular, water-enclosed grid of cells stored row-major.
#[derive(Debug, Clone)]
pub struct Island {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    neighbours: Vec<Vec<usize>>,
    landscape: LandscapeParameters,
    ids: IdAllocator,
}

impl Island {
    /// Parses a whitespace-separated block of landscape codes.
    pub fn from_map(map: &str, landscape: LandscapeParameters) -> Result<Self> {
        landscape.validate()?;
        let lines: Vec<&str> = map.split_whitespace().collect();
        if lines.is_empty() {
            return Err(BioSimError::InvalidMap {
                row: 0,
                col: 0,
                reason: "map is empty".into(),
            });
        }

        let cols = lines[0].chars().count();
        let mut grid = Vec::with_capacity(lines.len() * cols);
        for (r, line) in lines.iter().enumerate() {
            let width = line.chars().count();
            if width != cols {
                return Err(BioSimError::InvalidMap {
                    row: r + 1,
                    col: width.min(cols) + 1,
                    reason: format!("row has {width} cells, expected {cols}"),
                });
            }
            for (c, code) in line.chars().enumerate() {
                let landscape = LandscapeType::from_code(code).ok_or_else(|| {
                    BioSimError::InvalidMap {
                        row: r + 1,
                        col: c + 1,
                        reason: format!("unknown landscape code '{code}'"),
                    }
                })?;
                grid.push(landscape);
            }
        }

        let rows = lines.len();
        for (index, landscape) in grid.iter().enumerate() {
            let (row, col) = (index / cols + 1, index % cols + 1);
            let on_border = row == 1 || row == rows || col == 1 || col == cols;
            if on_border && *landscape != LandscapeType::Water {
                return Err(BioSimError::InvalidMap {
                    row,
                    col,
                    reason: format!("border cell is {landscape}, expected Water"),
                });
            }
        }

        let cells = grid
            .iter()
            .enumerate()
            .map(|(index, &kind)| {
                Cell::new(
                    Location::new(index / cols + 1, index % cols + 1),
                    kind,
                    &landscape,
                )
            })
            .collect();
        let neighbours = (0..grid.len())
            .map(|index| passable_neighbours(&grid, rows, cols, index))
            .collect();

        Ok(Self {
            rows,
            cols,
            cells,
            neighbours,
            landscape,
            ids: IdAllocator::default(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, location: Location) -> Option<&Cell> {
        self.index_of(location).map(|index| &self.cells[index])
    }

    pub fn landscape_parameters(&self) -> &LandscapeParameters {
        &self.landscape
    }

    /// Passable neighbours of `location` in north, south, west, east order.
    pub fn passable_neighbours(&self, location: Location) -> Vec<Location> {
        self.index_of(location)
            .map(|index| {
                self.neighbours[index]
                    .iter()
                    .map(|&n| self.cells[n].location())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn index_of(&self, location: Location) -> Option<usize> {
        let in_bounds = (1..=self.rows).contains(&location.row)
            && (1..=self.cols).contains(&location.col);
        in_bounds.then(|| (location.row - 1) * self.cols + (location.col - 1))
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub(crate) fn cells_and_ids_mut(&mut self) -> (&mut [Cell], &mut IdAllocator) {
        (&mut self.cells, &mut self.ids)
    }

    /// Replaces the fodder table and resets every cell to its new annual amount.
    pub(crate) fn set_landscape_parameters(&mut self, landscape: LandscapeParameters) {
        self.landscape = landscape;
        for cell in &mut self.cells {
            cell.regrow(&landscape);
        }
    }

    /// Validates every entry before placing any animal, so a rejected payload
    /// leaves the island untouched. Returns the number of animals added.
    pub fn add_population(
        &mut self,
        populations: &[PopulationSpec],
        params: &ParameterTable,
        rng: &mut RandomSource,
    ) -> Result<usize> {
        let mut planned = Vec::with_capacity(populations.len());
        for entry in populations {
            let location = entry.location()?;
            let (row, col) = entry.loc;
            let index = self
                .index_of(location)
                .ok_or_else(|| BioSimError::InvalidLocation {
                    row,
                    col,
                    reason: format!("outside the {}x{} island", self.rows, self.cols),
                })?;
            if !self.cells[index].landscape().is_passable() {
                return Err(BioSimError::InvalidLocation {
                    row,
                    col,
                    reason: "animals cannot be placed in Water".into(),
                });
            }
            let animals = entry
                .pop
                .iter()
                .map(AnimalSpec::validate)
                .collect::<Result<Vec<_>>>()?;
            planned.push((index, animals));
        }

        let mut added = 0;
        for (index, animals) in planned {
            for (species, age, weight) in animals {
                let species_params = params.get(species);
                let weight = weight.unwrap_or_else(|| draw_birth_weight(species_params, rng));
                let animal = Animal::new(self.ids.allocate(), species, age, weight, species_params);
                self.cells[index].add_animal(animal);
                added += 1;
            }
        }
        Ok(added)
    }

    /// Two passes: every animal decides against the pre-migration grid, then
    /// all movers are removed from their cells and appended to their targets.
    /// Returns the number of animals that moved.
    pub(crate) fn migrate(&mut self, params: &ParameterTable, rng: &mut RandomSource) -> usize {
        let mut plans: Vec<(usize, Species, Vec<Option<usize>>)> = Vec::new();
        for (index, cell) in self.cells.iter().enumerate() {
            let neighbours = &self.neighbours[index];
            if neighbours.is_empty() {
                continue;
            }
            for species in Species::ALL {
                let species_params = params.get(species);
                let animals = cell.animals(species);
                let mut destinations = Vec::with_capacity(animals.len());
                let mut any_mover = false;
                for animal in animals {
                    let destination = if rng.chance(animal.migration_probability(species_params)) {
                        rng.choose_index(neighbours.len()).map(|i| neighbours[i])
                    } else {
                        None
                    };
                    any_mover |= destination.is_some();
                    destinations.push(destination);
                }
                if any_mover {
                    plans.push((index, species, destinations));
                }
            }
        }

        let mut arrivals = Vec::new();
        for (index, species, destinations) in plans {
            arrivals.extend(self.cells[index].depart(species, &destinations));
        }
        let moved = arrivals.len();
        for (target, animal) in arrivals {
            self.cells[target].add_animal(animal);
        }
        moved
    }

    /// Checks the structural invariants that must hold between years.
    pub(crate) fn check_invariants(&self) -> std::result::Result<(), String> {
        for cell in &self.cells {
            let landscape = cell.landscape();
            let max = self.landscape.fodder_max(landscape);
            if !(0.0..=max).contains(&cell.fodder()) {
                return Err(format!(
                    "{landscape} cell {} holds {} fodder, allowed range is [0, {max}]",
                    cell.location(),
                    cell.fodder()
                ));
            }
            if !landscape.is_passable() && cell.total_animals() > 0 {
                return Err(format!("Water cell {} holds animals", cell.location()));
            }
            let all = cell.herbivores().iter().chain(cell.carnivores());
            for animal in all {
                if animal.is_dead() {
                    return Err(format!(
                        "animal {} in cell {} survived with weight {}",
                        animal.id().raw(),
                        cell.location(),
                        animal.weight()
                    ));
                }
                if !(0.0..=1.0).contains(&animal.fitness()) {
                    return Err(format!(
                        "animal {} has fitness {} outside [0, 1]",
                        animal.id().raw(),
                        animal.fitness()
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn counts(&self) -> PopulationCounts {
        self.cells.iter().fold(PopulationCounts::default(), |acc, cell| {
            PopulationCounts {
                herbivores: acc.herbivores + cell.count(Species::Herbivore),
                carnivores: acc.carnivores + cell.count(Species::Carnivore),
            }
        })
    }

    pub fn cell_snapshots(&self) -> Vec<CellSnapshot> {
        self.cells.iter().map(CellSnapshot::from_cell).collect()
    }

    pub fn animal_snapshots(&self) -> Vec<AnimalSnapshot> {
        self.cells
            .iter()
            .flat_map(|cell| {
                cell.herbivores()
                    .iter()
                    .chain(cell.carnivores())
                    .map(move |animal| AnimalSnapshot::from_animal(animal, cell.location()))
            })
            .collect()
    }

    /// Row-major grid of `species` counts per cell.
    pub fn distribution(&self, species: Species) -> Vec<Vec<usize>> {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(|cell| cell.count(species)).collect())
            .collect()
    }
}

fn passable_neighbours(grid: &[LandscapeType], rows: usize, cols: usize, index: usize) -> Vec<usize> {
    let (row, col) = (index / cols, index % cols);
    let mut found = Vec::with_capacity(4);
    if row > 0 {
        found.push(index - cols);
    }
    if row + 1 < rows {
        found.push(index + cols);
    }
    if col > 0 {
        found.push(index - 1);
    }
    if col + 1 < cols {
        found.push(index + 1);
    }
    found.retain(|&n| grid[n].is_passable());
    found
}
