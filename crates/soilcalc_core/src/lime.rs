//! Lime rate recommendations for 98G and Aglime, plus per-product economics.

use crate::equations::{EquationTable, Institution, Material, Tillage, UseCase};
use crate::error::{CalcError, CalcResult};
use crate::units::{clamp_non_negative, lbs_to_tons, round_dp, round_to_step, tons_to_lbs};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimeSettings {
    /// Fixed 98G maintenance rate, lb/ac.
    pub maintenance_lbs_ac: f64,
    /// Step the displayed lb/ac value is rounded to.
    pub display_step_lbs: f64,
}

impl Default for LimeSettings {
    fn default() -> Self {
        Self {
            maintenance_lbs_ac: 250.0,
            display_step_lbs: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimeSelection {
    pub material: Material,
    pub institution: Institution,
    pub tillage: Tillage,
    pub use_case: UseCase,
    /// Water pH (`WpH`).
    pub soil_ph: f64,
    /// Buffer pH (`BpH`).
    pub buffer_ph: f64,
    pub target_ph: f64,
    /// ECCE / neutralizing index of the Aglime, percent. Ignored for 98G.
    #[serde(default)]
    pub ecce_percent: Option<f64>,
}

/// A rate in both units. `lbs_ac` is always `tons_ac * 2000`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimeRate {
    pub tons_ac: f64,
    pub lbs_ac: f64,
    pub tons_ac_display: f64,
    pub lbs_ac_display: f64,
}

impl LimeRate {
    fn from_tons(tons: f64, settings: &LimeSettings) -> Self {
        let tons_ac = clamp_non_negative(tons);
        let lbs_ac = tons_to_lbs(tons_ac);
        Self {
            tons_ac,
            lbs_ac,
            tons_ac_display: round_dp(tons_ac, 2),
            lbs_ac_display: round_to_step(lbs_ac, settings.display_step_lbs),
        }
    }

    fn from_lbs(lbs: f64, settings: &LimeSettings) -> Self {
        Self::from_tons(lbs_to_tons(lbs), settings)
    }
}

pub fn calculate_lime_rate(selection: &LimeSelection) -> CalcResult<LimeRate> {
    calculate_lime_rate_with(EquationTable::builtin()?, selection, &LimeSettings::default())
}

pub fn calculate_lime_rate_with(
    table: &EquationTable,
    selection: &LimeSelection,
    settings: &LimeSettings,
) -> CalcResult<LimeRate> {
    if selection.material == Material::NinetyEightG && selection.use_case == UseCase::Maintenance
    {
        return Ok(LimeRate::from_lbs(settings.maintenance_lbs_ac, settings));
    }

    let entry = table
        .find(
            selection.material,
            selection.institution,
            selection.tillage,
            selection.use_case,
            selection.target_ph,
        )
        .ok_or_else(|| CalcError::NoMatchingEquation {
            material: selection.material.to_string(),
            institution: selection.institution.to_string(),
            tillage: selection.tillage.to_string(),
            use_case: selection.use_case.to_string(),
            target_ph: selection.target_ph,
        })?;

    let raw = clamp_non_negative(
        entry
            .formula
            .evaluate(selection.buffer_ph, selection.soil_ph)?,
    );

    let rate = match selection.material {
        Material::NinetyEightG => LimeRate::from_lbs(raw, settings),
        Material::Aglime => {
            // Lower ECCE means more product for the same neutralizing power.
            let adjusted = match selection.ecce_percent {
                Some(ecce) if ecce > 0.0 => raw / (ecce / 100.0),
                _ => raw,
            };
            LimeRate::from_tons(adjusted, settings)
        }
    };
    Ok(rate)
}

/// Target pH values available for the combination, ascending and distinct.
pub fn list_target_phs(
    material: Material,
    institution: Institution,
    tillage: Tillage,
) -> CalcResult<Vec<f64>> {
    Ok(EquationTable::builtin()?.target_phs(material, institution, tillage))
}

/// Union of target pH values across every institution.
pub fn list_target_phs_any_institution(
    material: Material,
    tillage: Tillage,
) -> CalcResult<Vec<f64>> {
    let table = EquationTable::builtin()?;
    let mut values: Vec<f64> = Institution::ALL
        .iter()
        .flat_map(|&institution| table.target_phs(material, institution, tillage))
        .collect();
    values.sort_by(f64::total_cmp);
    values.dedup();
    Ok(values)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Economics {
    pub cost_per_ac: f64,
    /// Value of the yield increase.
    pub roi: f64,
    /// `cost_per_ac - roi`: positive when the treatment costs more than it
    /// returns. The forms display this sign as-is.
    pub net: f64,
}

pub fn economics(
    rate_ton_ac: f64,
    cost_per_ton: f64,
    yield_increase: f64,
    price_per_unit: f64,
) -> Economics {
    let cost_per_ac = rate_ton_ac * cost_per_ton;
    let roi = yield_increase * price_per_unit;
    Economics {
        cost_per_ac,
        roi,
        net: cost_per_ac - roi,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimeComparisonInput {
    pub use_case: UseCase,
    pub institution: Institution,
    pub tillage: Tillage,
    pub soil_ph: f64,
    pub buffer_ph: f64,
    #[serde(default)]
    pub target_ph_98g: Option<f64>,
    #[serde(default)]
    pub target_ph_aglime: Option<f64>,
    pub ecce_percent: f64,
    pub cost_98g_per_ton: f64,
    pub cost_aglime_per_ton: f64,
    pub yield_increase_98g: f64,
    pub yield_increase_aglime: f64,
    pub price_per_unit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductOutcome {
    pub rate: Option<LimeRate>,
    /// Institution whose equation produced the rate, if one was used.
    pub institution: Option<Institution>,
    pub economics: Economics,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimeComparison {
    pub lime_98g: ProductOutcome,
    pub aglime: ProductOutcome,
}

/// Side-by-side 98G and Aglime recommendations for one soil test.
///
/// 98G correction tries the selected institution and then the other one,
/// since 98G equations are not published by every institution. Aglime always
/// uses its correction equations. A product without a usable equation gets no
/// rate and zero-ton economics; data errors in a matched equation propagate.
pub fn compare_lime_products(input: &LimeComparisonInput) -> CalcResult<LimeComparison> {
    let table = EquationTable::builtin()?;
    let settings = LimeSettings::default();

    let lime_98g = match (input.use_case, input.target_ph_98g) {
        (UseCase::Maintenance, target) => {
            let selection = LimeSelection {
                material: Material::NinetyEightG,
                institution: input.institution,
                tillage: input.tillage,
                use_case: UseCase::Maintenance,
                soil_ph: input.soil_ph,
                buffer_ph: input.buffer_ph,
                target_ph: target.unwrap_or_default(),
                ecce_percent: None,
            };
            let rate = calculate_lime_rate_with(table, &selection, &settings)?;
            outcome(Some((rate, None)), None, input.cost_98g_per_ton, input.yield_increase_98g, input.price_per_unit)
        }
        (UseCase::Correction, None) => outcome(
            None,
            Some("Choose a 98G target pH.".to_string()),
            input.cost_98g_per_ton,
            input.yield_increase_98g,
            input.price_per_unit,
        ),
        (UseCase::Correction, Some(target_ph)) => {
            let mut found = None;
            let mut last_error = None;
            for institution in [input.institution, input.institution.other()] {
                let selection = LimeSelection {
                    material: Material::NinetyEightG,
                    institution,
                    tillage: input.tillage,
                    use_case: UseCase::Correction,
                    soil_ph: input.soil_ph,
                    buffer_ph: input.buffer_ph,
                    target_ph,
                    ecce_percent: None,
                };
                match calculate_lime_rate_with(table, &selection, &settings) {
                    Ok(rate) => {
                        found = Some((rate, Some(institution)));
                        break;
                    }
                    Err(err @ CalcError::NoMatchingEquation { .. }) => last_error = Some(err),
                    Err(err) => return Err(err),
                }
            }
            let note = if found.is_none() {
                last_error.map(|err| err.to_string())
            } else {
                None
            };
            outcome(found, note, input.cost_98g_per_ton, input.yield_increase_98g, input.price_per_unit)
        }
    };

    let aglime = match input.target_ph_aglime {
        None => outcome(
            None,
            Some("Choose an Aglime target pH.".to_string()),
            input.cost_aglime_per_ton,
            input.yield_increase_aglime,
            input.price_per_unit,
        ),
        Some(target_ph) => {
            let selection = LimeSelection {
                material: Material::Aglime,
                institution: input.institution,
                tillage: input.tillage,
                use_case: UseCase::Correction,
                soil_ph: input.soil_ph,
                buffer_ph: input.buffer_ph,
                target_ph,
                ecce_percent: Some(input.ecce_percent),
            };
            match calculate_lime_rate_with(table, &selection, &settings) {
                Ok(rate) => outcome(
                    Some((rate, Some(input.institution))),
                    None,
                    input.cost_aglime_per_ton,
                    input.yield_increase_aglime,
                    input.price_per_unit,
                ),
                Err(err @ CalcError::NoMatchingEquation { .. }) => outcome(
                    None,
                    Some(err.to_string()),
                    input.cost_aglime_per_ton,
                    input.yield_increase_aglime,
                    input.price_per_unit,
                ),
                Err(err) => return Err(err),
            }
        }
    };

    Ok(LimeComparison { lime_98g, aglime })
}

fn outcome(
    found: Option<(LimeRate, Option<Institution>)>,
    note: Option<String>,
    cost_per_ton: f64,
    yield_increase: f64,
    price_per_unit: f64,
) -> ProductOutcome {
    let tons = found.map(|(rate, _)| rate.tons_ac).unwrap_or(0.0);
    ProductOutcome {
        rate: found.map(|(rate, _)| rate),
        institution: found.and_then(|(_, institution)| institution),
        economics: economics(tons, cost_per_ton, yield_increase, price_per_unit),
        note,
    }
}
