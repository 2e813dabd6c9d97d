use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use super::error::SimulationError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Low,
    Medium,
    High,
}

impl RiskProfile {
    pub const ALL: [RiskProfile; 3] = [RiskProfile::High, RiskProfile::Medium, RiskProfile::Low];

    /// Annual expected return used as the mean of the return distribution.
    pub fn return_mean(self) -> f64 {
        match self {
            RiskProfile::Low => 0.05,
            RiskProfile::Medium => 0.08,
            RiskProfile::High => 0.12,
        }
    }

    /// Annual return volatility (standard deviation).
    pub fn return_vol(self) -> f64 {
        match self {
            RiskProfile::Low => 0.08,
            RiskProfile::Medium => 0.15,
            RiskProfile::High => 0.25,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskProfile::Low => "Low Risk",
            RiskProfile::Medium => "Medium Risk",
            RiskProfile::High => "High Risk",
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RiskProfile {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let key = normalized
            .strip_suffix(" risk")
            .or_else(|| normalized.strip_suffix("-risk"))
            .unwrap_or(&normalized);
        match key {
            "low" => Ok(RiskProfile::Low),
            "medium" => Ok(RiskProfile::Medium),
            "high" => Ok(RiskProfile::High),
            _ => Err(SimulationError::InvalidProfile(s.to_string())),
        }
    }
}

/// Long-term capital gains regime applied to the taxed series.
///
/// The exemption is authored in the local (home-country) currency and is
/// converted into the simulation currency with a fixed rate.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRule {
    pub rate: f64,
    pub exemption_local_currency: f64,
    pub fx_rate_to_sim_currency: f64,
}

impl TaxRule {
    /// Indian LTCG as of 2025: 12.5% above INR 125,000, simulated in QAR.
    pub fn india_ltcg() -> Self {
        Self {
            rate: 0.125,
            exemption_local_currency: 125_000.0,
            fx_rate_to_sim_currency: 22.8,
        }
    }

    pub fn exemption_in_sim_currency(&self) -> f64 {
        self.exemption_local_currency / self.fx_rate_to_sim_currency
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if !self.rate.is_finite() || !(0.0..=1.0).contains(&self.rate) {
            return Err(SimulationError::InvalidTaxRule(format!(
                "rate must be between 0 and 1, got {}",
                self.rate
            )));
        }
        if !self.exemption_local_currency.is_finite() || self.exemption_local_currency <= 0.0 {
            return Err(SimulationError::InvalidTaxRule(format!(
                "exemption must be > 0, got {}",
                self.exemption_local_currency
            )));
        }
        if !self.fx_rate_to_sim_currency.is_finite() || self.fx_rate_to_sim_currency <= 0.0 {
            return Err(SimulationError::InvalidTaxRule(format!(
                "fx rate must be > 0, got {}",
                self.fx_rate_to_sim_currency
            )));
        }
        Ok(())
    }
}

impl Default for TaxRule {
    fn default() -> Self {
        Self::india_ltcg()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationPoint {
    pub year: NaiveDate,
    pub sheltered_value: f64,
    pub taxed_value: f64,
    pub annual_return: f64,
    pub tax_paid: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSeries {
    pub risk_profile: RiskProfile,
    pub points: Vec<SimulationPoint>,
}

impl SimulationSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn final_point(&self) -> Option<&SimulationPoint> {
        self.points.last()
    }

    pub fn total_tax_paid(&self) -> f64 {
        self.points.iter().map(|p| p.tax_paid).sum()
    }

    /// Value lost to tax by the end of the horizon.
    pub fn tax_drag(&self) -> f64 {
        self.final_point()
            .map(|p| p.sheltered_value - p.taxed_value)
            .unwrap_or(0.0)
    }
}
