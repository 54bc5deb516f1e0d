//! SO4 (pelletized gypsum) rates for high-magnesium and sodic soils.

use crate::units::{clamp_non_negative, tons_to_lbs};
use serde::{Deserialize, Serialize};

/// ppm Mg held by 1 cmolc/kg of exchange capacity.
pub const MG_PPM_PER_CMOLC: f64 = 120.4;
/// Tons of SO4 per meq of Mg displaced.
pub const MG_DISPLACEMENT_TONS_PER_MEQ: f64 = 0.68;

/// ppm Na per meq/100 g, used for percent base saturation.
pub const NA_PPM_PER_MEQ_100G: f64 = 230.0;
/// mg Na per meq, used for meq/L.
pub const NA_MG_PER_MEQ: f64 = 23.0;
/// Tons of SO4 per meq Na/100 g.
pub const NA_DISPLACEMENT_TONS_PER_MEQ: f64 = 1.7;

const CEC_NOTE: &str = "CEC must be > 0; returned 0 recommendation.";

/// Percent Mg base saturation from a ppm soil test.
pub fn mg_pct_from_ppm(ppm: f64, cec: f64) -> f64 {
    if cec <= 0.0 {
        return 0.0;
    }
    (ppm / MG_PPM_PER_CMOLC / cec) * 100.0
}

pub fn mg_ppm_from_pct(pct: f64, cec: f64) -> f64 {
    if cec <= 0.0 {
        return 0.0;
    }
    pct / 100.0 * cec * MG_PPM_PER_CMOLC
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MgBasis {
    Percent,
    Ppm,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HighMgInput {
    /// CEC, cmolc/kg.
    pub cec: f64,
    /// Units of both `current_mg` and `desired_mg`.
    pub basis: MgBasis,
    pub current_mg: f64,
    pub desired_mg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HighMgDetails {
    pub meq_mg: f64,
    pub pct_to_lower: f64,
    pub fraction_of_current: f64,
    pub meq_to_displace: f64,
    pub factor_ton_per_meq: f64,
    pub current_mg_pct: f64,
    pub desired_mg_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighMgOutput {
    pub rate_ton_ac: f64,
    pub rate_lbs_ac: f64,
    pub details: HighMgDetails,
    pub notes: Vec<String>,
}

pub fn run_so4_high_mg(input: &HighMgInput) -> HighMgOutput {
    let cec = input.cec;
    if !cec.is_finite() || cec <= 0.0 {
        return HighMgOutput {
            rate_ton_ac: 0.0,
            rate_lbs_ac: 0.0,
            details: HighMgDetails {
                factor_ton_per_meq: MG_DISPLACEMENT_TONS_PER_MEQ,
                ..HighMgDetails::default()
            },
            notes: vec![CEC_NOTE.to_string()],
        };
    }

    let to_pct = |value: f64| {
        let value = value.max(0.0);
        match input.basis {
            MgBasis::Percent => value,
            MgBasis::Ppm => mg_pct_from_ppm(value, cec),
        }
    };
    let current_mg_pct = to_pct(input.current_mg);
    let desired_mg_pct = to_pct(input.desired_mg);

    let meq_mg = cec * (current_mg_pct.clamp(0.0, 100.0) / 100.0);
    let pct_to_lower = (current_mg_pct - desired_mg_pct).max(0.0);
    let fraction_of_current = if current_mg_pct > 0.0 {
        (pct_to_lower / current_mg_pct).min(1.0)
    } else {
        0.0
    };
    let meq_to_displace = meq_mg * fraction_of_current;
    let rate_ton_ac = clamp_non_negative(meq_to_displace * MG_DISPLACEMENT_TONS_PER_MEQ);

    HighMgOutput {
        rate_ton_ac,
        rate_lbs_ac: tons_to_lbs(rate_ton_ac),
        details: HighMgDetails {
            meq_mg,
            pct_to_lower,
            fraction_of_current,
            meq_to_displace,
            factor_ton_per_meq: MG_DISPLACEMENT_TONS_PER_MEQ,
            current_mg_pct,
            desired_mg_pct,
        },
        notes: Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SodicInput {
    /// CEC, meq/100 g.
    pub cec: f64,
    #[serde(default)]
    pub sodium_ppm: Option<f64>,
    /// Percent Na base saturation; wins over ppm when both are given.
    #[serde(default)]
    pub base_sat_na_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SodicOutput {
    /// Percent Na base saturation used for the rate.
    pub base_sat_na_pct: f64,
    /// Provided or derived.
    pub sodium_ppm: f64,
    pub na_meq_per_l: f64,
    pub na_meq_per_100g: f64,
    /// Exchangeable sodium percentage as a 0..1 fraction.
    pub esp: f64,
    pub rate_tons_per_ac: f64,
    pub rate_lbs_so4_per_ac: f64,
    pub notes: Vec<String>,
}

fn finite_non_negative(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite()).map(|v| v.max(0.0))
}

pub fn run_so4_sodic(input: &SodicInput) -> SodicOutput {
    let provided_ppm = finite_non_negative(input.sodium_ppm);
    let provided_pct = finite_non_negative(input.base_sat_na_pct);

    if !input.cec.is_finite() {
        return SodicOutput {
            notes: vec!["Non-finite CEC input.".to_string()],
            ..SodicOutput::default()
        };
    }
    let cec = input.cec.max(0.0);

    if cec <= 0.0 {
        // meq/L only needs ppm, so it is still reported.
        let sodium_ppm = provided_ppm.unwrap_or(0.0);
        return SodicOutput {
            sodium_ppm,
            na_meq_per_l: sodium_ppm / NA_MG_PER_MEQ,
            notes: vec![CEC_NOTE.to_string()],
            ..SodicOutput::default()
        };
    }

    let mut notes = Vec::new();
    let base_sat_na_pct = match (provided_pct, provided_ppm) {
        (Some(pct), _) => pct,
        (None, Some(ppm)) => {
            notes.push("Base saturation %Na was derived from ppm.".to_string());
            (ppm / NA_PPM_PER_MEQ_100G / cec) * 100.0
        }
        (None, None) => {
            return SodicOutput {
                notes: vec!["Provide either sodium_ppm or base_sat_na_pct.".to_string()],
                ..SodicOutput::default()
            };
        }
    };

    let sodium_ppm =
        provided_ppm.unwrap_or_else(|| base_sat_na_pct / 100.0 * cec * NA_PPM_PER_MEQ_100G);
    let na_meq_per_100g = cec * (base_sat_na_pct / 100.0);
    let rate_tons_per_ac = clamp_non_negative(na_meq_per_100g * NA_DISPLACEMENT_TONS_PER_MEQ);

    SodicOutput {
        base_sat_na_pct,
        sodium_ppm,
        na_meq_per_l: sodium_ppm / NA_MG_PER_MEQ,
        na_meq_per_100g,
        esp: base_sat_na_pct / 100.0,
        rate_tons_per_ac,
        rate_lbs_so4_per_ac: clamp_non_negative(tons_to_lbs(rate_tons_per_ac)),
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn high_mg_percent_basis() {
        let out = run_so4_high_mg(&HighMgInput {
            cec: 20.0,
            basis: MgBasis::Percent,
            current_mg: 25.0,
            desired_mg: 15.0,
        });
        assert_close(out.details.meq_mg, 5.0);
        assert_close(out.details.pct_to_lower, 10.0);
        assert_close(out.details.fraction_of_current, 0.4);
        assert_close(out.details.meq_to_displace, 2.0);
        assert_close(out.rate_ton_ac, 1.36);
        assert_close(out.rate_lbs_ac, 2720.0);
        assert!(out.notes.is_empty());
    }

    #[test]
    fn high_mg_ppm_basis_converts_first() {
        let cec = 20.0;
        let out = run_so4_high_mg(&HighMgInput {
            cec,
            basis: MgBasis::Ppm,
            current_mg: mg_ppm_from_pct(25.0, cec),
            desired_mg: mg_ppm_from_pct(15.0, cec),
        });
        assert_close(out.details.current_mg_pct, 25.0);
        assert_close(out.details.desired_mg_pct, 15.0);
        assert_close(out.rate_ton_ac, 1.36);
    }

    #[test]
    fn high_mg_already_below_target_needs_nothing() {
        let out = run_so4_high_mg(&HighMgInput {
            cec: 20.0,
            basis: MgBasis::Percent,
            current_mg: 10.0,
            desired_mg: 15.0,
        });
        assert_eq!(out.details.pct_to_lower, 0.0);
        assert_eq!(out.rate_ton_ac, 0.0);
        assert_eq!(out.rate_lbs_ac, 0.0);
    }

    #[test]
    fn high_mg_zero_current_avoids_division() {
        let out = run_so4_high_mg(&HighMgInput {
            cec: 20.0,
            basis: MgBasis::Percent,
            current_mg: 0.0,
            desired_mg: 0.0,
        });
        assert_eq!(out.details.fraction_of_current, 0.0);
        assert_eq!(out.rate_ton_ac, 0.0);
    }

    #[test]
    fn high_mg_invalid_cec_returns_zero_with_note() {
        let out = run_so4_high_mg(&HighMgInput {
            cec: 0.0,
            basis: MgBasis::Percent,
            current_mg: 25.0,
            desired_mg: 15.0,
        });
        assert_eq!(out.rate_ton_ac, 0.0);
        assert_eq!(out.notes.len(), 1);
    }

    #[test]
    fn sodic_from_ppm() {
        let out = run_so4_sodic(&SodicInput {
            cec: 10.0,
            sodium_ppm: Some(230.0),
            base_sat_na_pct: None,
        });
        assert_close(out.base_sat_na_pct, 10.0);
        assert_close(out.na_meq_per_100g, 1.0);
        assert_close(out.esp, 0.1);
        assert_close(out.na_meq_per_l, 10.0);
        assert_close(out.rate_tons_per_ac, 1.7);
        assert_close(out.rate_lbs_so4_per_ac, 3400.0);
        assert_eq!(out.notes.len(), 1);
    }

    #[test]
    fn sodic_percent_takes_precedence() {
        let out = run_so4_sodic(&SodicInput {
            cec: 10.0,
            sodium_ppm: Some(230.0),
            base_sat_na_pct: Some(20.0),
        });
        assert_close(out.base_sat_na_pct, 20.0);
        assert_close(out.sodium_ppm, 230.0);
        assert_close(out.rate_tons_per_ac, 3.4);
        assert!(out.notes.is_empty());

        let derived = run_so4_sodic(&SodicInput {
            cec: 10.0,
            sodium_ppm: None,
            base_sat_na_pct: Some(10.0),
        });
        assert_close(derived.sodium_ppm, 230.0);
    }

    #[test]
    fn sodic_invalid_cec_returns_zero_with_note() {
        let out = run_so4_sodic(&SodicInput {
            cec: 0.0,
            sodium_ppm: Some(46.0),
            base_sat_na_pct: None,
        });
        assert_eq!(out.rate_tons_per_ac, 0.0);
        assert_eq!(out.rate_lbs_so4_per_ac, 0.0);
        assert_close(out.na_meq_per_l, 2.0);
        assert_eq!(out.notes, vec![CEC_NOTE.to_string()]);
    }

    #[test]
    fn sodic_without_sodium_input_explains() {
        let out = run_so4_sodic(&SodicInput {
            cec: 10.0,
            sodium_ppm: None,
            base_sat_na_pct: None,
        });
        assert_eq!(out.rate_tons_per_ac, 0.0);
        assert_eq!(out.notes.len(), 1);
    }
}
