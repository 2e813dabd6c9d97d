use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use tracing::debug;

use super::engine::simulate;
use super::error::SimulationError;
use super::types::{RiskProfile, SimulationSeries, TaxRule};

/// Everything a simulation depends on. Floats are keyed by bit pattern.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SimulationKey {
    risk_profile: RiskProfile,
    horizon_start: NaiveDate,
    horizon_end: NaiveDate,
    principal_bits: u64,
    rate_bits: u64,
    exemption_bits: u64,
    fx_bits: u64,
}

impl SimulationKey {
    pub fn new(
        risk_profile: RiskProfile,
        horizon_start: NaiveDate,
        horizon_end: NaiveDate,
        initial_principal: f64,
        tax_rule: &TaxRule,
    ) -> Self {
        Self {
            risk_profile,
            horizon_start,
            horizon_end,
            principal_bits: initial_principal.to_bits(),
            rate_bits: tax_rule.rate.to_bits(),
            exemption_bits: tax_rule.exemption_local_currency.to_bits(),
            fx_bits: tax_rule.fx_rate_to_sim_currency.to_bits(),
        }
    }
}

pub const DEFAULT_MAX_ENTRIES: usize = 64;

/// Read-through cache of simulated series.
///
/// The lock is held while a missing entry is computed, so concurrent callers
/// asking for the same key never simulate it twice. Simulations are small
/// enough that serializing misses costs nothing noticeable. Once
/// `max_entries` keys are stored, further misses are computed but not kept.
#[derive(Debug)]
pub struct SimulationCache {
    entries: Mutex<HashMap<SimulationKey, Arc<SimulationSeries>>>,
    max_entries: usize,
}

impl Default for SimulationCache {
    fn default() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }
}

impl SimulationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries,
        }
    }

    pub fn get_or_simulate(
        &self,
        risk_profile: RiskProfile,
        horizon_start: NaiveDate,
        horizon_end: NaiveDate,
        initial_principal: f64,
        tax_rule: &TaxRule,
    ) -> Result<Arc<SimulationSeries>, SimulationError> {
        let key = SimulationKey::new(
            risk_profile,
            horizon_start,
            horizon_end,
            initial_principal,
            tax_rule,
        );
        // A poisoned map still holds only complete series.
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(series) = entries.get(&key) {
            debug!(profile = %risk_profile, "simulation cache hit");
            return Ok(Arc::clone(series));
        }

        debug!(profile = %risk_profile, "simulation cache miss");
        let series = Arc::new(simulate(
            risk_profile,
            horizon_start,
            horizon_end,
            initial_principal,
            tax_rule,
        )?);
        if entries.len() < self.max_entries {
            entries.insert(key, Arc::clone(&series));
        } else {
            debug!(max_entries = self.max_entries, "simulation cache full, not storing");
        }
        Ok(series)
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::{DEFAULT_INITIAL_PRINCIPAL, default_horizon, simulate_portfolio};
    use std::thread;

    fn cached(cache: &SimulationCache, profile: RiskProfile) -> Arc<SimulationSeries> {
        let (start, end) = default_horizon();
        cache
            .get_or_simulate(
                profile,
                start,
                end,
                DEFAULT_INITIAL_PRINCIPAL,
                &TaxRule::india_ltcg(),
            )
            .expect("valid defaults")
    }

    #[test]
    fn hit_returns_same_series_instance() {
        let cache = SimulationCache::new();
        let first = cached(&cache, RiskProfile::High);
        let second = cached(&cache, RiskProfile::High);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cached_output_matches_direct_simulation() {
        let cache = SimulationCache::new();
        for profile in RiskProfile::ALL {
            let direct = simulate_portfolio(profile).expect("valid defaults");
            assert_eq!(*cached(&cache, profile), direct);
        }
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn different_principal_is_a_different_entry() {
        let cache = SimulationCache::new();
        let (start, end) = default_horizon();
        let rule = TaxRule::india_ltcg();
        let a = cache
            .get_or_simulate(RiskProfile::Low, start, end, 36_500.0, &rule)
            .expect("valid inputs");
        let b = cache
            .get_or_simulate(RiskProfile::Low, start, end, 50_000.0, &rule)
            .expect("valid inputs");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = SimulationCache::new();
        let (start, end) = default_horizon();
        let err = cache
            .get_or_simulate(
                RiskProfile::Low,
                end,
                start,
                36_500.0,
                &TaxRule::india_ltcg(),
            )
            .expect_err("inverted range");
        assert!(matches!(err, SimulationError::InvalidRange { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_callers_share_one_entry() {
        let cache = Arc::new(SimulationCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cached(&cache, RiskProfile::Medium))
            })
            .collect();
        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .collect();
        for series in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], series));
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn full_cache_still_simulates_but_stops_growing() {
        let cache = SimulationCache::with_max_entries(2);
        let (start, end) = default_horizon();
        let rule = TaxRule::india_ltcg();
        for i in 0..5u32 {
            let principal = 10_000.0 + f64::from(i);
            let series = cache
                .get_or_simulate(RiskProfile::Low, start, end, principal, &rule)
                .expect("valid inputs");
            assert_eq!(series.points[0].sheltered_value, principal);
        }
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = SimulationCache::new();
        cached(&cache, RiskProfile::Low);
        cache.clear();
        assert!(cache.is_empty());
    }
}
