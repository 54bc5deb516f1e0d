//! Sulfur rate for SO4 pelletized gypsum, plus AMS sizing against a sulfur target.

use crate::crop::Crop;
use crate::units::rate_from_pct;
use serde::{Deserialize, Serialize};

/// Percent S in SO4 pelletized gypsum.
pub const SO4_SULFUR_PCT: f64 = 17.0;
pub const OM_COEFFICIENT: f64 = 3.0;

/// Per-unit yield coefficient (bu/ac, or tons/ac for alfalfa).
pub fn yield_coefficient(crop: Crop) -> f64 {
    match crop {
        Crop::Corn => 0.22,
        Crop::Soybean => 0.29,
        Crop::Wheat => 0.35,
        Crop::Alfalfa => 6.3,
    }
}

/// Soil-test sulfate credit for `sulfur_ppm`.
pub fn sulfur_term(crop: Crop, sulfur_ppm: f64) -> f64 {
    match crop {
        Crop::Alfalfa => sulfur_ppm * 0.2 * 2.0,
        _ => sulfur_ppm * 0.3 * 8.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SulfurRateInput {
    pub crop: Crop,
    pub yield_goal: f64,
    pub sulfur_ppm: f64,
    pub organic_matter_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SulfurBreakdown {
    pub yield_term: f64,
    pub sulfur_term: f64,
    pub om_term: f64,
    /// `yield_term - sulfur_term - om_term`, lb S/ac.
    pub pre_conversion: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SulfurRateOutput {
    pub rate_lbs_per_ac: f64,
    pub breakdown: SulfurBreakdown,
}

pub fn run_sulfur_rate(input: &SulfurRateInput) -> SulfurRateOutput {
    let yield_term = input.yield_goal * yield_coefficient(input.crop);
    let sulfur_term = sulfur_term(input.crop, input.sulfur_ppm);
    let om_term = input.organic_matter_pct * OM_COEFFICIENT;
    let pre_conversion = yield_term - sulfur_term - om_term;

    let rate = (pre_conversion * 100.0 / SO4_SULFUR_PCT).max(0.0);

    SulfurRateOutput {
        rate_lbs_per_ac: if rate.is_finite() { rate } else { 0.0 },
        breakdown: SulfurBreakdown {
            yield_term,
            sulfur_term,
            om_term,
            pre_conversion,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmsAnalysis {
    pub n_pct: f64,
    pub s_pct: f64,
}

impl Default for AmsAnalysis {
    /// 21-0-0-24.
    fn default() -> Self {
        Self {
            n_pct: 21.0,
            s_pct: 24.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmsInput {
    pub target_s_lb_ac: f64,
    #[serde(default)]
    pub analysis: AmsAnalysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmsOutput {
    pub ams_required_lb_ac: f64,
    pub n_credit_lb_ac: f64,
}

pub fn run_ams_sulfur(input: &AmsInput) -> AmsOutput {
    let ams_required_lb_ac = rate_from_pct(input.analysis.s_pct, input.target_s_lb_ac.max(0.0));
    AmsOutput {
        ams_required_lb_ac,
        n_credit_lb_ac: ams_required_lb_ac * (input.analysis.n_pct.max(0.0) / 100.0),
    }
}
