use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::animal::{kill_probability, Animal, IdAllocator, Species};
use crate::error::BioSimError;
use crate::params::{LandscapeParameters, ParameterTable, SpeciesParameters};
use crate::rng::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LandscapeType {
    Lowland,
    Highland,
    Desert,
    Water,
}

impl LandscapeType {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'L' => Some(LandscapeType::Lowland),
            'H' => Some(LandscapeType::Highland),
            'D' => Some(LandscapeType::Desert),
            'W' => Some(LandscapeType::Water),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            LandscapeType::Lowland => 'L',
            LandscapeType::Highland => 'H',
            LandscapeType::Desert => 'D',
            LandscapeType::Water => 'W',
        }
    }

    pub fn is_passable(self) -> bool {
        self != LandscapeType::Water
    }
}

impl fmt::Display for LandscapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LandscapeType::Lowland => "Lowland",
            LandscapeType::Highland => "Highland",
            LandscapeType::Desert => "Desert",
            LandscapeType::Water => "Water",
        };
        f.write_str(name)
    }
}

/// Accepts either the single-letter map code or the full name.
impl FromStr for LandscapeType {
    type Err = BioSimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        if let (Some(code), None) = (chars.next(), chars.next()) {
            if let Some(landscape) = LandscapeType::from_code(code) {
                return Ok(landscape);
            }
        }
        match trimmed {
            "Lowland" => Ok(LandscapeType::Lowland),
            "Highland" => Ok(LandscapeType::Highland),
            "Desert" => Ok(LandscapeType::Desert),
            "Water" => Ok(LandscapeType::Water),
            other => Err(BioSimError::InvalidParameters(format!(
                "unknown landscape type '{other}'"
            ))),
        }
    }
}

/// 1-based grid coordinate; `(1, 1)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub row: usize,
    pub col: usize,
}

impl Location {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for Location {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BirthOutcome {
    pub births: usize,
    pub parent_deaths: usize,
}

/// One landscape patch and the animals resident in it this year.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    location: Location,
    landscape: LandscapeType,
    fodder: f64,
    herbivores: Vec<Animal>,
    carnivores: Vec<Animal>,
}

impl Cell {
    pub(crate) fn new(
        location: Location,
        landscape: LandscapeType,
        landscape_params: &LandscapeParameters,
    ) -> Self {
        Self {
            location,
            landscape,
            fodder: landscape_params.fodder_max(landscape),
            herbivores: Vec::new(),
            carnivores: Vec::new(),
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn landscape(&self) -> LandscapeType {
        self.landscape
    }

    pub fn fodder(&self) -> f64 {
        self.fodder
    }

    pub fn herbivores(&self) -> &[Animal] {
        &self.herbivores
    }

    pub fn carnivores(&self) -> &[Animal] {
        &self.carnivores
    }

    pub fn animals(&self, species: Species) -> &[Animal] {
        match species {
            Species::Herbivore => &self.herbivores,
            Species::Carnivore => &self.carnivores,
        }
    }

    pub fn count(&self, species: Species) -> usize {
        self.animals(species).len()
    }

    pub fn total_animals(&self) -> usize {
        self.herbivores.len() + self.carnivores.len()
    }

    pub(crate) fn animals_mut(&mut self, species: Species) -> &mut Vec<Animal> {
        match species {
            Species::Herbivore => &mut self.herbivores,
            Species::Carnivore => &mut self.carnivores,
        }
    }

    pub(crate) fn add_animal(&mut self, animal: Animal) {
        self.animals_mut(animal.species()).push(animal);
    }

    /// Resets fodder to the landscape's annual amount; Desert and Water stay at zero.
    pub(crate) fn regrow(&mut self, landscape_params: &LandscapeParameters) {
        self.fodder = landscape_params.fodder_max(self.landscape);
    }

    /// Fittest herbivores eat first, each up to its appetite. Returns fodder consumed.
    pub(crate) fn feed_herbivores(
        &mut self,
        params: &SpeciesParameters,
        rng: &mut RandomSource,
    ) -> f64 {
        if self.herbivores.is_empty() {
            return 0.0;
        }
        order_by_fitness_desc(&mut self.herbivores, rng);
        let mut consumed = 0.0;
        for herbivore in self.herbivores.iter_mut() {
            if self.fodder <= 0.0 {
                break;
            }
            let intake = params.f.min(self.fodder);
            herbivore.feed(intake, params);
            self.fodder = (self.fodder - intake).max(0.0);
            consumed += intake;
        }
        consumed
    }

    /// Fittest carnivores hunt first, weakest herbivores are tried first.
    /// Killed prey is marked and compacted away once every carnivore has hunted.
    /// Returns the number of kills.
    pub(crate) fn feed_carnivores(
        &mut self,
        params: &SpeciesParameters,
        rng: &mut RandomSource,
    ) -> usize {
        if self.carnivores.is_empty() || self.herbivores.is_empty() {
            return 0;
        }
        order_by_fitness_desc(&mut self.carnivores, rng);
        self.herbivores.sort_by(|a, b| a.fitness().total_cmp(&b.fitness()));

        let max_advantage = params.max_kill_advantage();
        let mut killed = vec![false; self.herbivores.len()];
        let mut kills = 0;
        for carnivore in self.carnivores.iter_mut() {
            let mut eaten = 0.0;
            for (prey, taken) in self.herbivores.iter().zip(killed.iter_mut()) {
                if eaten >= params.f {
                    break;
                }
                if *taken {
                    continue;
                }
                let p = kill_probability(carnivore.fitness(), prey.fitness(), max_advantage);
                if p > 0.0 && rng.chance(p) {
                    *taken = true;
                    let meal = prey.weight().min(params.f - eaten);
                    carnivore.feed(meal, params);
                    eaten += meal;
                    kills += 1;
                }
            }
        }
        compact(&mut self.herbivores, killed);
        kills
    }

    /// Every parent decides against the population size at the start of the
    /// phase; newborns join the cell only after all parents have decided.
    pub(crate) fn reproduce(
        &mut self,
        species: Species,
        params: &SpeciesParameters,
        rng: &mut RandomSource,
        ids: &mut IdAllocator,
    ) -> BirthOutcome {
        let mut outcome = BirthOutcome::default();
        let population = self.count(species);
        if population < 2 {
            return outcome;
        }
        let animals = self.animals_mut(species);
        let mut deceased = vec![false; population];
        let mut newborns = Vec::new();
        for (parent, dead) in animals.iter_mut().zip(deceased.iter_mut()) {
            if !parent.can_attempt_birth(params) {
                continue;
            }
            if !rng.chance(parent.birth_probability(population, params)) {
                continue;
            }
            let newborn = Animal::newborn(ids.allocate(), species, params, rng);
            let cost = params.xi * newborn.weight();
            if cost >= parent.weight() {
                *dead = true;
                outcome.parent_deaths += 1;
                continue;
            }
            parent.lose_weight(cost, params);
            newborns.push(newborn);
        }
        compact(animals, deceased);
        outcome.births = newborns.len();
        animals.extend(newborns);
        outcome
    }

    pub(crate) fn age_animals(&mut self, table: &ParameterTable) {
        for species in Species::ALL {
            let params = table.get(species);
            for animal in self.animals_mut(species).iter_mut() {
                animal.grow_older(params);
            }
        }
    }

    /// Annual weight loss followed by starvation and random death. Returns deaths.
    pub(crate) fn lose_weight_and_cull(
        &mut self,
        table: &ParameterTable,
        rng: &mut RandomSource,
    ) -> usize {
        let mut deaths = 0;
        for species in Species::ALL {
            let params = table.get(species);
            let animals = self.animals_mut(species);
            let mut doomed = Vec::with_capacity(animals.len());
            for animal in animals.iter_mut() {
                animal.annual_weight_loss(params);
                let dies = animal.is_dead() || rng.chance(animal.death_probability(params));
                doomed.push(dies);
            }
            deaths += doomed.iter().filter(|&&d| d).count();
            compact(animals, doomed);
        }
        deaths
    }

    /// Removes the animals with a destination and returns them paired with it.
    pub(crate) fn depart(
        &mut self,
        species: Species,
        destinations: &[Option<usize>],
    ) -> Vec<(usize, Animal)> {
        let residents = std::mem::take(self.animals_mut(species));
        let mut staying = Vec::with_capacity(residents.len());
        let mut leaving = Vec::new();
        for (index, animal) in residents.into_iter().enumerate() {
            match destinations.get(index).copied().flatten() {
                Some(target) => leaving.push((target, animal)),
                None => staying.push(animal),
            }
        }
        *self.animals_mut(species) = staying;
        leaving
    }
}

/// Shuffle first so equal fitness does not favour earlier residents, then a
/// stable sort puts the fittest first.
fn order_by_fitness_desc(animals: &mut [Animal], rng: &mut RandomSource) {
    rng.shuffle(animals);
    animals.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
}

fn compact(animals: &mut Vec<Animal>, removed: Vec<bool>) {
    let mut marks = removed.into_iter();
    animals.retain(|_| !marks.next().unwrap_or(false));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lowland() -> Cell {
        Cell::new(
            Location::new(2, 2),
            LandscapeType::Lowland,
            &LandscapeParameters::default(),
        )
    }

    fn populate(cell: &mut Cell, ids: &mut IdAllocator, species: Species, specs: &[(u32, f64)]) {
        let table = ParameterTable::default();
        for &(age, weight) in specs {
            cell.add_animal(Animal::new(
                ids.allocate(),
                species,
                age,
                weight,
                table.get(species),
            ));
        }
    }

    #[test]
    fn landscape_codes_round_trip() {
        for code in ['L', 'H', 'D', 'W'] {
            let landscape = LandscapeType::from_code(code).unwrap();
            assert_eq!(landscape.code(), code);
        }
        assert_eq!(LandscapeType::from_code('X'), None);
        assert_eq!("Highland".parse::<LandscapeType>().unwrap(), LandscapeType::Highland);
        assert_eq!("D".parse::<LandscapeType>().unwrap(), LandscapeType::Desert);
        assert!(!LandscapeType::Water.is_passable());
    }

    #[test]
    fn fodder_starts_at_annual_amount() {
        let params = LandscapeParameters::default();
        for (landscape, expected) in [
            (LandscapeType::Lowland, 800.0),
            (LandscapeType::Highland, 300.0),
            (LandscapeType::Desert, 0.0),
            (LandscapeType::Water, 0.0),
        ] {
            let cell = Cell::new(Location::new(1, 1), landscape, &params);
            assert_eq!(cell.fodder(), expected);
        }
    }

    #[test]
    fn herbivores_eat_until_fodder_runs_out() {
        let table = ParameterTable::default();
        let mut rng = RandomSource::new(1);
        let mut ids = IdAllocator::default();
        let mut cell = lowland();
        populate(&mut cell, &mut ids, Species::Herbivore, &[(5, 20.0); 100]);
        let consumed = cell.feed_herbivores(&table.herbivore, &mut rng);
        assert_eq!(consumed, 800.0);
        assert_eq!(cell.fodder(), 0.0);
        let fed = cell
            .herbivores()
            .iter()
            .filter(|h| h.weight() > 20.0)
            .count();
        assert_eq!(fed, 80);
    }

    #[test]
    fn fittest_herbivore_eats_first() {
        let table = ParameterTable::default();
        let mut rng = RandomSource::new(2);
        let mut ids = IdAllocator::default();
        let mut cell = Cell::new(
            Location::new(2, 2),
            LandscapeType::Highland,
            &LandscapeParameters {
                lowland_f_max: 800.0,
                highland_f_max: 10.0,
            },
        );
        populate(&mut cell, &mut ids, Species::Herbivore, &[(5, 5.0), (5, 40.0)]);
        cell.feed_herbivores(&table.herbivore, &mut rng);
        let heavy = cell
            .herbivores()
            .iter()
            .find(|h| h.weight() > 40.0)
            .expect("fittest herbivore fed");
        assert!((heavy.weight() - 49.0).abs() < 1e-9);
        assert!(cell.herbivores().iter().any(|h| h.weight() == 5.0));
    }

    #[test]
    fn no_predation_without_advantage() {
        let table = ParameterTable::default();
        let mut rng = RandomSource::new(3);
        let mut ids = IdAllocator::default();
        let mut cell = lowland();
        populate(&mut cell, &mut ids, Species::Herbivore, &[(5, 60.0); 5]);
        populate(&mut cell, &mut ids, Species::Carnivore, &[(80, 2.0); 3]);
        let kills = cell.feed_carnivores(&table.carnivore, &mut rng);
        assert_eq!(kills, 0);
        assert_eq!(cell.count(Species::Herbivore), 5);
    }

    #[test]
    fn certain_kills_respect_appetite() {
        let mut table = ParameterTable::default();
        table.carnivore.delta_phi_max = Some(0.01);
        let mut rng = RandomSource::new(4);
        let mut ids = IdAllocator::default();
        let mut cell = lowland();
        populate(&mut cell, &mut ids, Species::Herbivore, &[(90, 20.0); 10]);
        populate(&mut cell, &mut ids, Species::Carnivore, &[(5, 30.0)]);
        let kills = cell.feed_carnivores(&table.carnivore, &mut rng);
        // appetite 50 is met after three 20 kg herbivores
        assert_eq!(kills, 3);
        assert_eq!(cell.count(Species::Herbivore), 7);
        let carnivore = &cell.carnivores()[0];
        assert!((carnivore.weight() - (30.0 + 0.75 * 50.0)).abs() < 1e-9);
    }

    #[test]
    fn weakest_prey_is_taken_first() {
        let mut table = ParameterTable::default();
        table.carnivore.delta_phi_max = Some(1e-9);
        table.carnivore.f = 1.0;
        let mut rng = RandomSource::new(12);
        let mut ids = IdAllocator::default();
        let mut cell = Cell::new(
            Location::new(2, 2),
            LandscapeType::Desert,
            &LandscapeParameters::default(),
        );
        populate(
            &mut cell,
            &mut ids,
            Species::Herbivore,
            &[(5, 30.0), (5, 2.0), (5, 15.0)],
        );
        populate(&mut cell, &mut ids, Species::Carnivore, &[(5, 30.0)]);
        let kills = cell.feed_carnivores(&table.carnivore, &mut rng);
        assert_eq!(kills, 1);
        let mut survivors: Vec<f64> = cell.herbivores().iter().map(|h| h.weight()).collect();
        survivors.sort_by(f64::total_cmp);
        assert_eq!(survivors, vec![15.0, 30.0]);
        assert!((cell.carnivores()[0].weight() - 30.75).abs() < 1e-9);
    }

    #[test]
    fn fittest_carnivore_hunts_first() {
        let mut table = ParameterTable::default();
        table.carnivore.delta_phi_max = Some(1e-9);
        let mut rng = RandomSource::new(13);
        let mut ids = IdAllocator::default();
        let mut cell = lowland();
        populate(&mut cell, &mut ids, Species::Herbivore, &[(5, 20.0)]);
        // weaker hunter is resident first
        populate(&mut cell, &mut ids, Species::Carnivore, &[(5, 8.0), (5, 30.0)]);
        let weak = cell.carnivores()[0].fitness();
        let strong = cell.carnivores()[1].fitness();
        assert!(strong > weak);
        assert!(weak > cell.herbivores()[0].fitness());

        let kills = cell.feed_carnivores(&table.carnivore, &mut rng);
        assert_eq!(kills, 1);
        assert_eq!(cell.count(Species::Herbivore), 0);
        let mut weights: Vec<f64> = cell.carnivores().iter().map(|c| c.weight()).collect();
        weights.sort_by(f64::total_cmp);
        assert_eq!(weights[0], 8.0);
        assert!((weights[1] - (30.0 + 0.75 * 20.0)).abs() < 1e-9);
    }

    #[test]
    fn underweight_parents_never_give_birth() {
        let mut table = ParameterTable::default();
        table.herbivore.gamma = 10.0;
        table.herbivore.sigma_birth = 0.0;
        let mut rng = RandomSource::new(5);
        let mut ids = IdAllocator::default();
        let mut cell = lowland();
        populate(&mut cell, &mut ids, Species::Herbivore, &[(3, 0.1), (3, 100.0)]);
        let outcome = cell.reproduce(Species::Herbivore, &table.herbivore, &mut rng, &mut ids);
        assert_eq!(outcome.births, 1);
        assert_eq!(cell.count(Species::Herbivore), 3);
        let light = cell
            .herbivores()
            .iter()
            .find(|h| h.age() == 3 && h.weight() < 1.0)
            .unwrap();
        assert_eq!(light.weight(), 0.1);
        let heavy = cell
            .herbivores()
            .iter()
            .find(|h| h.age() == 3 && h.weight() > 1.0)
            .unwrap();
        assert!((heavy.weight() - (100.0 - 1.2 * 8.0)).abs() < 1e-9);
    }

    #[test]
    fn lone_animal_never_reproduces() {
        let mut table = ParameterTable::default();
        table.herbivore.gamma = 10.0;
        let mut rng = RandomSource::new(6);
        let mut ids = IdAllocator::default();
        let mut cell = lowland();
        populate(&mut cell, &mut ids, Species::Herbivore, &[(3, 100.0)]);
        let outcome = cell.reproduce(Species::Herbivore, &table.herbivore, &mut rng, &mut ids);
        assert_eq!(outcome, BirthOutcome::default());
    }

    #[test]
    fn parent_dies_when_birth_cost_exceeds_weight() {
        let mut table = ParameterTable::default();
        table.herbivore.gamma = 10.0;
        table.herbivore.sigma_birth = 0.0;
        table.herbivore.zeta = 0.0;
        table.herbivore.xi = 100.0;
        let mut rng = RandomSource::new(7);
        let mut ids = IdAllocator::default();
        let mut cell = lowland();
        populate(&mut cell, &mut ids, Species::Herbivore, &[(3, 50.0), (3, 50.0)]);
        let outcome = cell.reproduce(Species::Herbivore, &table.herbivore, &mut rng, &mut ids);
        assert_eq!(outcome.births, 0);
        assert_eq!(outcome.parent_deaths, 2);
        assert_eq!(cell.count(Species::Herbivore), 0);
    }

    #[test]
    fn aging_and_weight_loss() {
        let mut table = ParameterTable::default();
        table.herbivore.omega = 0.0;
        let mut rng = RandomSource::new(8);
        let mut ids = IdAllocator::default();
        let mut cell = lowland();
        populate(&mut cell, &mut ids, Species::Herbivore, &[(3, 20.0)]);
        cell.age_animals(&table);
        let deaths = cell.lose_weight_and_cull(&table, &mut rng);
        assert_eq!(deaths, 0);
        let herbivore = &cell.herbivores()[0];
        assert_eq!(herbivore.age(), 4);
        assert!((herbivore.weight() - 19.0).abs() < 1e-9);
    }

    #[test]
    fn total_weight_loss_kills() {
        let mut table = ParameterTable::default();
        table.carnivore.eta = 1.0;
        table.carnivore.omega = 0.0;
        let mut rng = RandomSource::new(9);
        let mut ids = IdAllocator::default();
        let mut cell = lowland();
        populate(&mut cell, &mut ids, Species::Carnivore, &[(3, 20.0), (4, 8.0)]);
        assert_eq!(cell.lose_weight_and_cull(&table, &mut rng), 2);
        assert_eq!(cell.total_animals(), 0);
    }

    #[test]
    fn depart_keeps_residents_in_order() {
        let mut ids = IdAllocator::default();
        let mut cell = lowland();
        populate(&mut cell, &mut ids, Species::Herbivore, &[(1, 10.0), (2, 10.0), (3, 10.0)]);
        let leaving = cell.depart(Species::Herbivore, &[None, Some(7), None]);
        assert_eq!(leaving.len(), 1);
        assert_eq!(leaving[0].0, 7);
        assert_eq!(leaving[0].1.age(), 2);
        let ages: Vec<u32> = cell.herbivores().iter().map(|h| h.age()).collect();
        assert_eq!(ages, vec![1, 3]);
    }
}
