use crate::{
    engine::{PhaseOutcome, System, SystemContext},
    error::Result,
    island::Island,
    rng::RandomSource,
};

pub struct AgingSystem;

impl AgingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AgingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for AgingSystem {
    fn name(&self) -> &'static str {
        "aging"
    }

    fn run(
        &mut self,
        ctx: &SystemContext<'_>,
        island: &mut Island,
        _rng: &mut RandomSource,
    ) -> Result<PhaseOutcome> {
        for cell in island.cells_mut() {
            cell.age_animals(ctx.params);
        }
        Ok(PhaseOutcome::default())
    }
}
