use tracing::debug;

use crate::{
    engine::{PhaseOutcome, System, SystemContext},
    error::Result,
    island::Island,
    rng::RandomSource,
};

/// Annual weight loss, starvation and random death.
pub struct MortalitySystem;

impl MortalitySystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MortalitySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MortalitySystem {
    fn name(&self) -> &'static str {
        "mortality"
    }

    fn run(
        &mut self,
        ctx: &SystemContext<'_>,
        island: &mut Island,
        rng: &mut RandomSource,
    ) -> Result<PhaseOutcome> {
        let mut outcome = PhaseOutcome::default();
        for cell in island.cells_mut() {
            outcome.deaths += cell.lose_weight_and_cull(ctx.params, rng);
        }
        debug!(year = ctx.year, deaths = outcome.deaths, "mortality done");
        Ok(outcome)
    }
}
