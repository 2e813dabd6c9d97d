use chrono::{Months, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use tracing::debug;

use super::error::SimulationError;
use super::types::{RiskProfile, SimulationPoint, SimulationSeries, TaxRule};

/// Seed shared by every profile. All profiles scale the same standard-normal
/// draws, so their return paths are correlated.
pub const DEFAULT_SEED: u64 = 0;

/// Roughly USD 10,000 expressed in QAR.
pub const DEFAULT_INITIAL_PRINCIPAL: f64 = 36_500.0;

pub fn default_horizon() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2015, 1, 1).expect("valid date"),
        NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date"),
    )
}

pub fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(DEFAULT_SEED)
}

/// Simulates the default dashboard scenario for a profile.
pub fn simulate_portfolio(risk_profile: RiskProfile) -> Result<SimulationSeries, SimulationError> {
    let (start, end) = default_horizon();
    simulate(
        risk_profile,
        start,
        end,
        DEFAULT_INITIAL_PRINCIPAL,
        &TaxRule::india_ltcg(),
    )
}

pub fn simulate(
    risk_profile: RiskProfile,
    horizon_start: NaiveDate,
    horizon_end: NaiveDate,
    initial_principal: f64,
    tax_rule: &TaxRule,
) -> Result<SimulationSeries, SimulationError> {
    simulate_with_rng(
        risk_profile,
        horizon_start,
        horizon_end,
        initial_principal,
        tax_rule,
        &mut seeded_rng(),
    )
}

pub fn simulate_with_rng<R: Rng + ?Sized>(
    risk_profile: RiskProfile,
    horizon_start: NaiveDate,
    horizon_end: NaiveDate,
    initial_principal: f64,
    tax_rule: &TaxRule,
    rng: &mut R,
) -> Result<SimulationSeries, SimulationError> {
    validate_inputs(horizon_start, horizon_end, initial_principal, tax_rule)?;

    let years = year_boundaries(horizon_start, horizon_end);
    let returns = draw_returns(risk_profile, years.len().saturating_sub(1), rng);

    let mut points = Vec::with_capacity(years.len());
    points.push(SimulationPoint {
        year: years[0],
        sheltered_value: initial_principal,
        taxed_value: initial_principal,
        annual_return: 0.0,
        tax_paid: 0.0,
    });

    for (year, r) in years.iter().skip(1).zip(returns) {
        let prev = points[points.len() - 1];
        let outcome = step(prev.sheltered_value, prev.taxed_value, r, tax_rule);
        points.push(SimulationPoint {
            year: *year,
            sheltered_value: outcome.sheltered_value,
            taxed_value: outcome.taxed_value,
            annual_return: r,
            tax_paid: outcome.tax_paid,
        });
    }

    debug!(
        profile = %risk_profile,
        points = points.len(),
        "portfolio simulation complete"
    );

    Ok(SimulationSeries {
        risk_profile,
        points,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodOutcome {
    pub sheltered_value: f64,
    pub taxed_value: f64,
    pub tax_paid: f64,
}

/// Advances both series by one period with the same return `r`.
pub fn step(prev_sheltered: f64, prev_taxed: f64, r: f64, tax_rule: &TaxRule) -> PeriodOutcome {
    let tax_paid = period_tax(prev_taxed, r, tax_rule);
    PeriodOutcome {
        sheltered_value: prev_sheltered * (1.0 + r),
        taxed_value: prev_taxed * (1.0 + r) - tax_paid,
        tax_paid,
    }
}

/// Tax owed on one period's gain. The exemption applies to each period on
/// its own and is never carried forward.
pub fn period_tax(prev: f64, r: f64, tax_rule: &TaxRule) -> f64 {
    let gain = prev * (1.0 + r) - prev;
    let taxable_gain = (gain - tax_rule.exemption_in_sim_currency()).max(0.0);
    taxable_gain * tax_rule.rate
}

/// Annual boundaries from `start`, inclusive of `end` when it falls on one.
pub fn year_boundaries(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut years = Vec::new();
    let mut offset = 0u32;
    while let Some(date) = start.checked_add_months(Months::new(12 * offset)) {
        if date > end {
            break;
        }
        years.push(date);
        offset += 1;
    }
    years
}

fn validate_inputs(
    horizon_start: NaiveDate,
    horizon_end: NaiveDate,
    initial_principal: f64,
    tax_rule: &TaxRule,
) -> Result<(), SimulationError> {
    if horizon_start >= horizon_end {
        return Err(SimulationError::InvalidRange {
            start: horizon_start,
            end: horizon_end,
        });
    }
    if !initial_principal.is_finite() || initial_principal <= 0.0 {
        return Err(SimulationError::InvalidPrincipal(initial_principal));
    }
    tax_rule.validate()
}

fn draw_returns<R: Rng + ?Sized>(risk_profile: RiskProfile, count: usize, rng: &mut R) -> Vec<f64> {
    let mean = risk_profile.return_mean();
    let vol = risk_profile.return_vol();
    (0..count)
        .map(|_| {
            let z: f64 = StandardNormal.sample(rng);
            mean + vol * z
        })
        .collect()
}
