//! SO4 gypsum and sulfur exports.

use crate::shared::run_calculator;
use soilcalc_core::traits::{
    AmsSulfurCalculator, So4HighMgCalculator, So4SodicCalculator, So4SulfurCalculator,
};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(js_name = runSo4HighMg)]
pub fn run_so4_high_mg(input: JsValue) -> Result<JsValue, JsValue> {
    run_calculator::<So4HighMgCalculator>(input)
}

#[wasm_bindgen(js_name = runSo4Sodic)]
pub fn run_so4_sodic(input: JsValue) -> Result<JsValue, JsValue> {
    run_calculator::<So4SodicCalculator>(input)
}

#[wasm_bindgen(js_name = runSo4Sulfur)]
pub fn run_so4_sulfur(input: JsValue) -> Result<JsValue, JsValue> {
    run_calculator::<So4SulfurCalculator>(input)
}

#[wasm_bindgen(js_name = runAmsSulfur)]
pub fn run_ams_sulfur(input: JsValue) -> Result<JsValue, JsValue> {
    run_calculator::<AmsSulfurCalculator>(input)
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use serde_wasm_bindgen::{from_value, to_value};
    use soilcalc_core::crop::Crop;
    use soilcalc_core::gypsum::{HighMgInput, HighMgOutput, MgBasis, SodicInput, SodicOutput};
    use soilcalc_core::sulfur::{SulfurRateInput, SulfurRateOutput};
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn high_mg_through_js() {
        let input = HighMgInput {
            cec: 20.0,
            basis: MgBasis::Percent,
            current_mg: 25.0,
            desired_mg: 15.0,
        };
        let value = run_so4_high_mg(to_value(&input).expect("input")).expect("output");
        let output: HighMgOutput = from_value(value).expect("decode");
        assert!((output.rate_lbs_ac - 2720.0).abs() < 1e-9);
    }

    #[wasm_bindgen_test]
    fn sodic_zero_cec_keeps_note() {
        let input = SodicInput {
            cec: 0.0,
            sodium_ppm: Some(230.0),
            base_sat_na_pct: None,
        };
        let value = run_so4_sodic(to_value(&input).expect("input")).expect("output");
        let output: SodicOutput = from_value(value).expect("decode");
        assert_eq!(output.rate_tons_per_ac, 0.0);
        assert_eq!(output.notes.len(), 1);
    }

    #[wasm_bindgen_test]
    fn sulfur_rate_through_js() {
        let input = SulfurRateInput {
            crop: Crop::Corn,
            yield_goal: 200.0,
            sulfur_ppm: 10.0,
            organic_matter_pct: 3.0,
        };
        let value = run_so4_sulfur(to_value(&input).expect("input")).expect("output");
        let output: SulfurRateOutput = from_value(value).expect("decode");
        assert!((output.rate_lbs_per_ac - 64.705_882_352_941_18).abs() < 1e-9);
    }
}
