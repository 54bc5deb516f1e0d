//! Lime rate, target pH listings and product comparison exports.

use crate::shared::{js_error, parse_choice, run_calculator, to_js};
use js_sys::Float64Array;
use soilcalc_core::equations::{Institution, Material, Tillage};
use soilcalc_core::lime::{self, economics};
use soilcalc_core::traits::{LimeComparisonCalculator, LimeRateCalculator};
use wasm_bindgen::prelude::*;

/// `{tons_ac, lbs_ac, tons_ac_display, lbs_ac_display}` for one lime selection.
#[wasm_bindgen(js_name = calculateLimeRate)]
pub fn calculate_lime_rate(input: JsValue) -> Result<JsValue, JsValue> {
    run_calculator::<LimeRateCalculator>(input)
}

pub(crate) fn target_phs(material: &str, institution: &str, tillage: &str) -> anyhow::Result<Vec<f64>> {
    let material: Material = parse_choice("material", material)?;
    let institution: Institution = parse_choice("institution", institution)?;
    let tillage: Tillage = parse_choice("tillage", tillage)?;
    Ok(lime::list_target_phs(material, institution, tillage)?)
}

pub(crate) fn target_phs_any_institution(material: &str, tillage: &str) -> anyhow::Result<Vec<f64>> {
    let material: Material = parse_choice("material", material)?;
    let tillage: Tillage = parse_choice("tillage", tillage)?;
    Ok(lime::list_target_phs_any_institution(material, tillage)?)
}

#[wasm_bindgen(js_name = listTargetPHs)]
pub fn list_target_phs(material: &str, institution: &str, tillage: &str) -> Result<Float64Array, JsValue> {
    console_error_panic_hook::set_once();
    let values = target_phs(material, institution, tillage).map_err(js_error)?;
    Ok(Float64Array::from(values.as_slice()))
}

#[wasm_bindgen(js_name = listTargetPHsAnyInstitution)]
pub fn list_target_phs_any_institution(material: &str, tillage: &str) -> Result<Float64Array, JsValue> {
    console_error_panic_hook::set_once();
    let values = target_phs_any_institution(material, tillage).map_err(js_error)?;
    Ok(Float64Array::from(values.as_slice()))
}

#[wasm_bindgen(js_name = limeEconomics)]
pub fn lime_economics(
    rate_ton_ac: f64,
    cost_per_ton: f64,
    yield_increase: f64,
    price_per_unit: f64,
) -> Result<JsValue, JsValue> {
    to_js(&economics(rate_ton_ac, cost_per_ton, yield_increase, price_per_unit))
}

#[wasm_bindgen(js_name = compareLimeProducts)]
pub fn compare_lime_products(input: JsValue) -> Result<JsValue, JsValue> {
    run_calculator::<LimeComparisonCalculator>(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_phs_are_ascending() {
        let values = target_phs("98G", "UW", "Conventional").expect("target pHs");
        assert!(!values.is_empty());
        assert!(values.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn any_institution_covers_each_institution() {
        let union = target_phs_any_institution("Aglime", "No-Till").expect("union");
        for institution in ["UW", "ISU"] {
            for value in target_phs("Aglime", institution, "No-Till").expect("target pHs") {
                assert!(union.contains(&value));
            }
        }
    }

    #[test]
    fn unknown_tillage_is_rejected() {
        let err = target_phs("98G", "UW", "Strip-Till").unwrap_err();
        assert!(err.to_string().contains("tillage"));
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use serde_wasm_bindgen::{from_value, to_value};
    use soilcalc_core::lime::{LimeRate, LimeSelection};
    use soilcalc_core::equations::UseCase;
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn maintenance_98g_round_trips_through_js() {
        let selection = LimeSelection {
            material: Material::NinetyEightG,
            institution: Institution::Uw,
            tillage: Tillage::Conventional,
            use_case: UseCase::Maintenance,
            soil_ph: 6.0,
            buffer_ph: 6.5,
            target_ph: 6.5,
            ecce_percent: None,
        };
        let value = calculate_lime_rate(to_value(&selection).expect("input")).expect("rate");
        let rate: LimeRate = from_value(value).expect("output");
        assert_eq!(rate.lbs_ac, 250.0);
    }

    #[wasm_bindgen_test]
    fn unsupported_target_reports_error_string() {
        let selection = LimeSelection {
            material: Material::Aglime,
            institution: Institution::Isu,
            tillage: Tillage::NoTill,
            use_case: UseCase::Correction,
            soil_ph: 5.5,
            buffer_ph: 6.2,
            target_ph: 9.9,
            ecce_percent: Some(80.0),
        };
        let message = calculate_lime_rate(to_value(&selection).expect("input"))
            .err()
            .and_then(|err| err.as_string())
            .unwrap_or_default();
        assert!(!message.is_empty());
    }

    #[wasm_bindgen_test]
    fn list_target_phs_returns_float64_array() {
        let array = list_target_phs("98G", "UW", "Conventional").expect("array");
        assert!(array.length() > 0);
    }
}
