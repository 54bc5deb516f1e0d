//! Fertilizer acidity and pH efficiency exports, with their menu listings.

use crate::shared::{js_error, parse_choice, run_calculator, to_js};
use js_sys::Float64Array;
use soilcalc_core::crop::Nutrient;
use soilcalc_core::fertilizer_acidity;
use soilcalc_core::ph_efficiency::{self, FertilizerOption, ALLOWED_PHS};
use soilcalc_core::traits::{FertilizerAcidityCalculator, PhEfficiencyCalculator};
use std::collections::BTreeMap;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(js_name = runFertilizerAcidity)]
pub fn run_fertilizer_acidity(input: JsValue) -> Result<JsValue, JsValue> {
    run_calculator::<FertilizerAcidityCalculator>(input)
}

#[wasm_bindgen(js_name = listAcidifiers)]
pub fn list_acidifiers() -> Result<JsValue, JsValue> {
    to_js(fertilizer_acidity::list_acidifiers())
}

#[wasm_bindgen(js_name = runPhEfficiency)]
pub fn run_ph_efficiency(input: JsValue) -> Result<JsValue, JsValue> {
    run_calculator::<PhEfficiencyCalculator>(input)
}

pub(crate) fn fertilizers_for(nutrient: &str) -> anyhow::Result<Vec<FertilizerOption>> {
    let nutrient: Nutrient = parse_choice("nutrient", nutrient)?;
    Ok(ph_efficiency::list_fertilizers_for(nutrient))
}

/// Product id to default $/ton.
pub(crate) fn default_price_map() -> BTreeMap<&'static str, f64> {
    ph_efficiency::default_prices().into_iter().collect()
}

#[wasm_bindgen(js_name = listFertilizersFor)]
pub fn list_fertilizers_for(nutrient: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let options = fertilizers_for(nutrient).map_err(js_error)?;
    to_js(&options)
}

#[wasm_bindgen(js_name = defaultPrices)]
pub fn default_prices() -> Result<JsValue, JsValue> {
    to_js(&default_price_map())
}

#[wasm_bindgen(js_name = allowedPHs)]
pub fn allowed_phs() -> Float64Array {
    Float64Array::from(&ALLOWED_PHS[..])
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use serde_wasm_bindgen::{from_value, to_value};
    use soilcalc_core::fertilizer_acidity::{AcidityInput, AcidityOutput, AcidityRowInput};
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn elemental_sulfur_row_through_js() {
        let input = AcidityInput {
            rows: vec![AcidityRowInput {
                fertilizer_id: "ES".to_string(),
                units_n_lb_ac: None,
                units_s_lb_ac: Some(100.0),
                product_rate_lb_ac: None,
            }],
            neutralizing_power_fraction: 0.94,
        };
        let value = run_fertilizer_acidity(to_value(&input).expect("input")).expect("output");
        let output: AcidityOutput = from_value(value).expect("decode");
        assert_eq!(output.total_lbs_needed, 319.0);
    }

    #[wasm_bindgen_test]
    fn allowed_phs_has_every_bucket() {
        assert_eq!(allowed_phs().length() as usize, ALLOWED_PHS.len());
    }

    #[wasm_bindgen_test]
    fn malformed_efficiency_input_is_an_error() {
        let result = run_ph_efficiency(JsValue::from_str("not an object"));
        assert!(result.is_err());
    }
}
