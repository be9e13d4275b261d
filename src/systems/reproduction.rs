use tracing::debug;

use crate::{
    animal::Species,
    engine::{PhaseOutcome, System, SystemContext},
    error::Result,
    island::Island,
    rng::RandomSource,
};

pub struct ReproductionSystem;

impl ReproductionSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ReproductionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for ReproductionSystem {
    fn name(&self) -> &'static str {
        "reproduction"
    }

    fn run(
        &mut self,
        ctx: &SystemContext<'_>,
        island: &mut Island,
        rng: &mut RandomSource,
    ) -> Result<PhaseOutcome> {
        let mut outcome = PhaseOutcome::default();
        let (cells, ids) = island.cells_and_ids_mut();
        for cell in cells.iter_mut() {
            for species in Species::ALL {
                let births = cell.reproduce(species, ctx.params.get(species), rng, ids);
                outcome.births += births.births;
                outcome.deaths += births.parent_deaths;
            }
        }
        debug!(
            year = ctx.year,
            births = outcome.births,
            parent_deaths = outcome.deaths,
            "reproduction done"
        );
        Ok(outcome)
    }
}
