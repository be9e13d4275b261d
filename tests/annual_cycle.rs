use std::collections::BTreeMap;

use biosim::{
    engine::{System, SystemContext},
    systems::{MigrationSystem, ReproductionSystem},
    AnimalSpec, Island, LandscapeParameters, LandscapeType, Location, ParameterTable,
    PopulationSpec, RandomSource, Simulation, Species,
};

const ISLAND: &str = "WWWWWWW
                      WLLHHDW
                      WLLLHDW
                      WDLLLLW
                      WWWWWWW";

fn overrides(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn herbivores(count: usize, age: i64, weight: f64) -> Vec<AnimalSpec> {
    (0..count).map(|_| AnimalSpec::herbivore(age, weight)).collect()
}

fn carnivores(count: usize, age: i64, weight: f64) -> Vec<AnimalSpec> {
    (0..count).map(|_| AnimalSpec::carnivore(age, weight)).collect()
}

fn mixed_simulation(seed: u64) -> Simulation {
    Simulation::builder(ISLAND)
        .seed(seed)
        .population(PopulationSpec::new((2, 2), herbivores(60, 5, 20.0)))
        .population(PopulationSpec::new((3, 4), herbivores(40, 3, 15.0)))
        .population(PopulationSpec::new((4, 5), carnivores(15, 5, 20.0)))
        .build()
        .expect("valid simulation")
}

#[test]
fn empty_island_stays_empty() {
    let mut sim = Simulation::new(ISLAND, 1).unwrap();
    let summaries = sim.advance(25).unwrap();
    assert_eq!(summaries.len(), 25);
    assert_eq!(sim.year(), 25);
    assert_eq!(sim.num_animals(), 0);
    assert!(sim
        .population_history()
        .iter()
        .all(|record| record.counts.total() == 0));
}

#[test]
fn isolated_lowland_feeds_without_migration() {
    let mut sim = Simulation::builder("WWW\nWLW\nWWW")
        .seed(8)
        .population(PopulationSpec::new((2, 2), herbivores(50, 5, 20.0)))
        .build()
        .unwrap();
    let summary = sim.advance_one_year().unwrap();

    let cell = &sim.cell_snapshots()[4];
    assert_eq!(cell.landscape, LandscapeType::Lowland);
    assert_eq!(cell.fodder, 800.0 - 50.0 * 10.0);
    assert_eq!(summary.totals.moves, 0);
    assert_eq!(summary.totals.kills, 0);
    assert_eq!(
        summary.counts.herbivores,
        50 + summary.totals.births - summary.totals.deaths
    );
    assert_eq!(sim.num_animals_per_species().carnivores, 0);
}

#[test]
fn only_heavy_parent_reproduces() {
    let mut params = ParameterTable::default();
    params
        .apply_overrides(
            Species::Herbivore,
            &overrides(&[("gamma", 10.0), ("sigma_birth", 0.0)]),
        )
        .unwrap();
    let mut island = Island::from_map("WWW\nWLW\nWWW", LandscapeParameters::default()).unwrap();
    let mut rng = RandomSource::new(21);
    island
        .add_population(
            &[PopulationSpec::new(
                (2, 2),
                vec![AnimalSpec::herbivore(4, 0.1), AnimalSpec::herbivore(4, 100.0)],
            )],
            &params,
            &mut rng,
        )
        .unwrap();

    let ctx = SystemContext {
        year: 1,
        params: &params,
    };
    let outcome = ReproductionSystem::new()
        .run(&ctx, &mut island, &mut rng)
        .unwrap();
    assert_eq!(outcome.births, 1);

    let cell = island.cell(Location::new(2, 2)).unwrap();
    let newborns: Vec<_> = cell.herbivores().iter().filter(|h| h.age() == 0).collect();
    assert_eq!(newborns.len(), 1);
    assert_eq!(newborns[0].weight(), 8.0);
    let light = cell
        .herbivores()
        .iter()
        .find(|h| h.age() == 4 && h.weight() < 1.0)
        .expect("light parent survives");
    assert_eq!(light.weight(), 0.1);
}

#[test]
fn migration_moves_one_step_onto_land() {
    let mut params = ParameterTable::default();
    params
        .apply_overrides(Species::Herbivore, &overrides(&[("mu", 1.0)]))
        .unwrap();
    params
        .apply_overrides(Species::Carnivore, &overrides(&[("mu", 1.0)]))
        .unwrap();
    let mut island = Island::from_map(ISLAND, LandscapeParameters::default()).unwrap();
    let mut rng = RandomSource::new(99);
    island
        .add_population(
            &[
                PopulationSpec::new((2, 2), herbivores(30, 2, 60.0)),
                PopulationSpec::new((3, 3), carnivores(30, 2, 40.0)),
                PopulationSpec::new((4, 6), herbivores(10, 2, 60.0)),
            ],
            &params,
            &mut rng,
        )
        .unwrap();
    let before = island.animal_snapshots();

    let ctx = SystemContext {
        year: 1,
        params: &params,
    };
    let outcome = MigrationSystem::new()
        .run(&ctx, &mut island, &mut rng)
        .unwrap();
    assert!(outcome.moves > 0);

    let after = island.animal_snapshots();
    assert_eq!(before.len(), after.len());
    let mut moved = 0;
    for old in &before {
        let new = after.iter().find(|a| a.id == old.id).expect("animal kept");
        if new.location != old.location {
            moved += 1;
            assert!(island
                .passable_neighbours(old.location)
                .contains(&new.location));
        }
        assert_ne!(
            island.cell(new.location).unwrap().landscape(),
            LandscapeType::Water
        );
    }
    assert_eq!(moved, outcome.moves);
}

#[test]
fn invariants_hold_every_year() {
    let mut sim = mixed_simulation(2024);
    let landscape = *sim.landscape_parameters();
    for _ in 0..30 {
        sim.advance_one_year().unwrap();
        for cell in sim.cell_snapshots() {
            let max = landscape.fodder_max(cell.landscape);
            assert!(cell.fodder >= 0.0 && cell.fodder <= max);
            if matches!(cell.landscape, LandscapeType::Desert | LandscapeType::Water) {
                assert_eq!(cell.fodder, 0.0);
            }
            if cell.landscape == LandscapeType::Water {
                assert_eq!(cell.herbivores + cell.carnivores, 0);
            }
        }
        for animal in sim.animal_snapshots() {
            assert!(animal.weight > 0.0);
            assert!((0.0..=1.0).contains(&animal.fitness));
        }
    }
}

#[test]
fn absent_species_stays_absent() {
    let mut herbivores_only = Simulation::builder(ISLAND)
        .seed(5)
        .population(PopulationSpec::new((2, 2), herbivores(40, 5, 20.0)))
        .build()
        .unwrap();
    for summary in herbivores_only.advance(15).unwrap() {
        assert_eq!(summary.totals.kills, 0);
        assert_eq!(summary.counts.carnivores, 0);
    }

    let mut carnivores_only = Simulation::builder(ISLAND)
        .seed(5)
        .population(PopulationSpec::new((2, 2), carnivores(20, 5, 20.0)))
        .build()
        .unwrap();
    for summary in carnivores_only.advance(15).unwrap() {
        assert_eq!(summary.totals.kills, 0);
        assert_eq!(summary.counts.herbivores, 0);
    }
}

#[test]
fn ages_advance_by_one_per_year() {
    let mut sim = Simulation::builder(ISLAND)
        .seed(17)
        .species_parameters(
            Species::Herbivore,
            overrides(&[("omega", 0.0), ("gamma", 0.0), ("mu", 0.0)]),
        )
        .population(PopulationSpec::new((2, 2), herbivores(5, 7, 30.0)))
        .build()
        .unwrap();
    sim.advance(3).unwrap();
    let animals = sim.animal_snapshots();
    assert_eq!(animals.len(), 5);
    assert!(animals.iter().all(|a| a.age == 10));
    assert!(animals.iter().all(|a| a.location == Location::new(2, 2)));
}

#[test]
fn distribution_matches_counts() {
    let mut sim = mixed_simulation(31);
    sim.advance(5).unwrap();
    let counts = sim.num_animals_per_species();
    for species in Species::ALL {
        let total: usize = sim.distribution(species).iter().flatten().sum();
        assert_eq!(total, counts.get(species));
    }
}

#[test]
fn oldest_representable_age_survives_a_year() {
    let mut sim = Simulation::builder("WWW\nWLW\nWWW")
        .seed(4)
        .species_parameters(Species::Herbivore, overrides(&[("omega", 0.0)]))
        .population(PopulationSpec::new(
            (2, 2),
            vec![AnimalSpec::herbivore(u32::MAX as i64, 20.0)],
        ))
        .build()
        .unwrap();
    sim.advance_one_year().unwrap();
    let animals = sim.animal_snapshots();
    assert_eq!(animals.len(), 1);
    assert_eq!(animals[0].age, u32::MAX);
    assert_eq!(animals[0].fitness, 0.0);
}
