use tracing::debug;

use crate::{
    engine::{PhaseOutcome, System, SystemContext},
    error::Result,
    island::Island,
    rng::RandomSource,
};

pub struct MigrationSystem;

impl MigrationSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MigrationSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MigrationSystem {
    fn name(&self) -> &'static str {
        "migration"
    }

    fn run(
        &mut self,
        ctx: &SystemContext<'_>,
        island: &mut Island,
        rng: &mut RandomSource,
    ) -> Result<PhaseOutcome> {
        let moves = island.migrate(ctx.params, rng);
        debug!(year = ctx.year, moves, "migration done");
        Ok(PhaseOutcome {
            moves,
            ..PhaseOutcome::default()
        })
    }
}
