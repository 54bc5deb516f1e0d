//! Conversions shared by every export.

use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, Serializer};
use soilcalc_core::traits::Calculator;
use std::fmt::Display;
use wasm_bindgen::prelude::*;

pub(crate) fn js_error(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Plain objects rather than ES `Map`s, so the forms can read fields directly.
pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Deserializes the form payload, runs `C` and serializes its output.
pub(crate) fn run_calculator<C: Calculator>(input: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let input: C::Input = from_value(input)
        .map_err(|e| JsValue::from_str(&format!("Invalid {} input: {}", C::NAME, e)))?;
    let output = C::calculate(&input).map_err(js_error)?;
    to_js(&output)
}

/// Parses a form value such as `"98G"` or `"No-Till"` into its enum.
pub(crate) fn parse_choice<T: DeserializeOwned>(kind: &str, value: &str) -> anyhow::Result<T> {
    T::deserialize(StrDeserializer::<ValueError>::new(value))
        .map_err(|_| anyhow::anyhow!("Unknown {}: {}", kind, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use soilcalc_core::crop::{Crop, Nutrient};
    use soilcalc_core::equations::{Material, Tillage};

    #[test]
    fn parse_choice_uses_form_values() {
        let material: Material = parse_choice("material", "98G").unwrap();
        assert_eq!(material, Material::NinetyEightG);
        let tillage: Tillage = parse_choice("tillage", "No-Till").unwrap();
        assert_eq!(tillage, Tillage::NoTill);
        let crop: Crop = parse_choice("crop", "Corn Grain").unwrap();
        assert_eq!(crop, Crop::Corn);
        let nutrient: Nutrient = parse_choice("nutrient", "P2O5").unwrap();
        assert_eq!(nutrient, Nutrient::P2O5);
    }

    #[test]
    fn parse_choice_reports_unknown_values() {
        let err = parse_choice::<Material>("material", "Dolomite").unwrap_err();
        assert_eq!(err.to_string(), "Unknown material: Dolomite");
    }
}
