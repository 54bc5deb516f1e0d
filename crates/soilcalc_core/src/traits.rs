use crate::error::CalcResult;
use crate::{fertilizer_acidity, gypsum, lime, ph_efficiency, sulfur};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A stateless calculator: one typed input, one typed output.
///
/// Every form in the app maps onto one implementor, which lets hosts drive
/// them generically (the WASM bridge deserializes `Input`, calls
/// `calculate`, and serializes `Output`).
pub trait Calculator {
    type Input: DeserializeOwned;
    type Output: Serialize;

    /// Short name used in logs and error messages.
    const NAME: &'static str;

    fn calculate(input: &Self::Input) -> CalcResult<Self::Output>;
}

pub struct LimeRateCalculator;
pub struct LimeComparisonCalculator;
pub struct FertilizerAcidityCalculator;
pub struct PhEfficiencyCalculator;
pub struct So4HighMgCalculator;
pub struct So4SodicCalculator;
pub struct So4SulfurCalculator;
pub struct AmsSulfurCalculator;

impl Calculator for LimeRateCalculator {
    type Input = lime::LimeSelection;
    type Output = lime::LimeRate;
    const NAME: &'static str = "lime_rate";

    fn calculate(input: &Self::Input) -> CalcResult<Self::Output> {
        lime::calculate_lime_rate(input)
    }
}

impl Calculator for LimeComparisonCalculator {
    type Input = lime::LimeComparisonInput;
    type Output = lime::LimeComparison;
    const NAME: &'static str = "lime_comparison";

    fn calculate(input: &Self::Input) -> CalcResult<Self::Output> {
        lime::compare_lime_products(input)
    }
}

impl Calculator for FertilizerAcidityCalculator {
    type Input = fertilizer_acidity::AcidityInput;
    type Output = fertilizer_acidity::AcidityOutput;
    const NAME: &'static str = "fertilizer_acidity";

    fn calculate(input: &Self::Input) -> CalcResult<Self::Output> {
        Ok(fertilizer_acidity::run_fertilizer_acidity(input))
    }
}

impl Calculator for PhEfficiencyCalculator {
    type Input = ph_efficiency::EfficiencyInput;
    type Output = ph_efficiency::EfficiencyOutput;
    const NAME: &'static str = "ph_efficiency";

    fn calculate(input: &Self::Input) -> CalcResult<Self::Output> {
        Ok(ph_efficiency::run_ph_efficiency(input))
    }
}

impl Calculator for So4HighMgCalculator {
    type Input = gypsum::HighMgInput;
    type Output = gypsum::HighMgOutput;
    const NAME: &'static str = "so4_high_mg";

    fn calculate(input: &Self::Input) -> CalcResult<Self::Output> {
        Ok(gypsum::run_so4_high_mg(input))
    }
}

impl Calculator for So4SodicCalculator {
    type Input = gypsum::SodicInput;
    type Output = gypsum::SodicOutput;
    const NAME: &'static str = "so4_sodic";

    fn calculate(input: &Self::Input) -> CalcResult<Self::Output> {
        Ok(gypsum::run_so4_sodic(input))
    }
}

impl Calculator for So4SulfurCalculator {
    type Input = sulfur::SulfurRateInput;
    type Output = sulfur::SulfurRateOutput;
    const NAME: &'static str = "so4_sulfur";

    fn calculate(input: &Self::Input) -> CalcResult<Self::Output> {
        Ok(sulfur::run_sulfur_rate(input))
    }
}

impl Calculator for AmsSulfurCalculator {
    type Input = sulfur::AmsInput;
    type Output = sulfur::AmsOutput;
    const NAME: &'static str = "ams_sulfur";

    fn calculate(input: &Self::Input) -> CalcResult<Self::Output> {
        Ok(sulfur::run_ams_sulfur(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_json<C: Calculator>(json: &str) -> String {
        let input: C::Input = serde_json::from_str(json).unwrap();
        let output = C::calculate(&input).unwrap();
        serde_json::to_string(&output).unwrap()
    }

    #[test]
    fn calculators_are_idempotent() {
        let json = r#"{"crop":"Corn Grain","yield_goal":200,"sulfur_ppm":10,"organic_matter_pct":3}"#;
        assert_eq!(
            run_json::<So4SulfurCalculator>(json),
            run_json::<So4SulfurCalculator>(json)
        );

        let json = r#"{"cec":10,"sodium_ppm":230}"#;
        let out: serde_json::Value =
            serde_json::from_str(&run_json::<So4SodicCalculator>(json)).unwrap();
        assert_eq!(out["rate_lbs_so4_per_ac"], 3400.0);
    }

    #[test]
    fn lime_errors_pass_through() {
        let json = r#"{"material":"98G","institution":"UW","tillage":"No-Till",
            "use_case":"Correction","soil_ph":5.5,"buffer_ph":6.2,"target_ph":9.9}"#;
        let input: lime::LimeSelection = serde_json::from_str(json).unwrap();
        assert!(LimeRateCalculator::calculate(&input).is_err());
    }

    #[test]
    fn names_are_unique() {
        let mut names = vec![
            LimeRateCalculator::NAME,
            LimeComparisonCalculator::NAME,
            FertilizerAcidityCalculator::NAME,
            PhEfficiencyCalculator::NAME,
            So4HighMgCalculator::NAME,
            So4SodicCalculator::NAME,
            So4SulfurCalculator::NAME,
            AmsSulfurCalculator::NAME,
        ];
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 8);
    }
}
