use crate::{
    engine::{PhaseOutcome, System, SystemContext},
    error::Result,
    island::Island,
    rng::RandomSource,
};

pub struct RegrowthSystem;

impl RegrowthSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RegrowthSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for RegrowthSystem {
    fn name(&self) -> &'static str {
        "regrowth"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext<'_>,
        island: &mut Island,
        _rng: &mut RandomSource,
    ) -> Result<PhaseOutcome> {
        let landscape = *island.landscape_parameters();
        for cell in island.cells_mut() {
            cell.regrow(&landscape);
        }
        Ok(PhaseOutcome::default())
    }
}
