//! Static asset-mix and geographic-exposure tables per risk profile.

use serde::Serialize;

use super::types::RiskProfile;

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct AllocationSlice {
    pub label: &'static str,
    pub percentage: f64,
}

const fn slice(label: &'static str, percentage: f64) -> AllocationSlice {
    AllocationSlice { label, percentage }
}

const LOW_ASSET_MIX: [AllocationSlice; 3] = [
    slice("Equities", 20.0),
    slice("Bonds", 70.0),
    slice("Cash", 10.0),
];

const MEDIUM_ASSET_MIX: [AllocationSlice; 3] = [
    slice("Equities", 50.0),
    slice("Bonds", 45.0),
    slice("Cash", 5.0),
];

const HIGH_ASSET_MIX: [AllocationSlice; 3] = [
    slice("Equities", 75.0),
    slice("Bonds", 15.0),
    slice("Alternatives", 10.0),
];

const LOW_COUNTRY_EXPOSURE: [AllocationSlice; 4] = [
    slice("USA", 45.0),
    slice("Developed Markets (Ex-USA)", 30.0),
    slice("Qatar/GCC", 15.0),
    slice("India", 10.0),
];

const MEDIUM_COUNTRY_EXPOSURE: [AllocationSlice; 4] = [
    slice("USA", 40.0),
    slice("India", 30.0),
    slice("Developed Markets (Ex-USA)", 20.0),
    slice("Qatar/GCC", 10.0),
];

const HIGH_COUNTRY_EXPOSURE: [AllocationSlice; 4] = [
    slice("India", 40.0),
    slice("USA", 30.0),
    slice("Emerging Markets (Ex-India)", 25.0),
    slice("Qatar/GCC", 5.0),
];

pub fn asset_mix(risk_profile: RiskProfile) -> &'static [AllocationSlice] {
    match risk_profile {
        RiskProfile::Low => &LOW_ASSET_MIX,
        RiskProfile::Medium => &MEDIUM_ASSET_MIX,
        RiskProfile::High => &HIGH_ASSET_MIX,
    }
}

pub fn country_exposure(risk_profile: RiskProfile) -> &'static [AllocationSlice] {
    match risk_profile {
        RiskProfile::Low => &LOW_COUNTRY_EXPOSURE,
        RiskProfile::Medium => &MEDIUM_COUNTRY_EXPOSURE,
        RiskProfile::High => &HIGH_COUNTRY_EXPOSURE,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationBreakdown {
    pub risk_profile: RiskProfile,
    pub asset_mix: &'static [AllocationSlice],
    pub country_exposure: &'static [AllocationSlice],
}

impl AllocationBreakdown {
    pub fn for_profile(risk_profile: RiskProfile) -> Self {
        Self {
            risk_profile,
            asset_mix: asset_mix(risk_profile),
            country_exposure: country_exposure(risk_profile),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(slices: &[AllocationSlice]) -> Vec<&'static str> {
        slices.iter().map(|s| s.label).collect()
    }

    #[test]
    fn percentages_are_non_negative_and_sum_to_hundred() {
        for profile in RiskProfile::ALL {
            for table in [asset_mix(profile), country_exposure(profile)] {
                assert!(table.iter().all(|s| s.percentage >= 0.0));
                let total: f64 = table.iter().map(|s| s.percentage).sum();
                assert_eq!(total, 100.0, "{profile} table does not sum to 100");
            }
        }
    }

    #[test]
    fn labels_are_stable_across_calls() {
        for profile in RiskProfile::ALL {
            assert_eq!(labels(asset_mix(profile)), labels(asset_mix(profile)));
            assert_eq!(
                labels(country_exposure(profile)),
                labels(country_exposure(profile))
            );
        }
    }

    #[test]
    fn tables_keep_authored_order() {
        assert_eq!(
            labels(asset_mix(RiskProfile::High)),
            vec!["Equities", "Bonds", "Alternatives"]
        );
        assert_eq!(
            labels(country_exposure(RiskProfile::Medium)),
            vec!["USA", "India", "Developed Markets (Ex-USA)", "Qatar/GCC"]
        );
        assert_eq!(country_exposure(RiskProfile::High)[0].percentage, 40.0);
    }

    #[test]
    fn breakdown_bundles_both_tables() {
        let breakdown = AllocationBreakdown::for_profile(RiskProfile::Low);
        assert_eq!(breakdown.asset_mix, asset_mix(RiskProfile::Low));
        assert_eq!(
            breakdown.country_exposure,
            country_exposure(RiskProfile::Low)
        );
    }
}
