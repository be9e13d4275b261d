mod aging;
mod feeding;
mod migration;
mod mortality;
mod regrowth;
mod reproduction;

pub use aging::AgingSystem;
pub use feeding::FeedingSystem;
pub use migration::MigrationSystem;
pub use mortality::MortalitySystem;
pub use regrowth::RegrowthSystem;
pub use reproduction::ReproductionSystem;
