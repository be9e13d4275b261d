use tracing::debug;

use crate::{
    engine::{PhaseOutcome, System, SystemContext},
    error::Result,
    island::Island,
    rng::RandomSource,
};

/// Herbivores graze, then carnivores hunt, cell by cell.
pub struct FeedingSystem;

impl FeedingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FeedingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for FeedingSystem {
    fn name(&self) -> &'static str {
        "feeding"
    }

    fn run(
        &mut self,
        ctx: &SystemContext<'_>,
        island: &mut Island,
        rng: &mut RandomSource,
    ) -> Result<PhaseOutcome> {
        let mut outcome = PhaseOutcome::default();
        for cell in island.cells_mut() {
            outcome.fodder_eaten += cell.feed_herbivores(&ctx.params.herbivore, rng);
            outcome.kills += cell.feed_carnivores(&ctx.params.carnivore, rng);
        }
        debug!(
            year = ctx.year,
            fodder_eaten = outcome.fodder_eaten,
            kills = outcome.kills,
            "feeding done"
        );
        Ok(outcome)
    }
}
