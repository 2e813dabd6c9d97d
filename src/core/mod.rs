mod allocation;
mod cache;
mod engine;
mod error;
mod types;

pub use allocation::{AllocationBreakdown, AllocationSlice, asset_mix, country_exposure};
pub use cache::{DEFAULT_MAX_ENTRIES, SimulationCache, SimulationKey};
pub use engine::{
    DEFAULT_INITIAL_PRINCIPAL, DEFAULT_SEED, PeriodOutcome, default_horizon, period_tax,
    seeded_rng, simulate, simulate_portfolio, simulate_with_rng, step, year_boundaries,
};
pub use error::SimulationError;
pub use types::{RiskProfile, SimulationPoint, SimulationSeries, TaxRule};
