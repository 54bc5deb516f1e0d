use thiserror::Error;

/// Failures a single calculator invocation can report.
///
/// Conditions the calculators degrade through gracefully (unknown products in a
/// batch, zero-content divisors, non-positive CEC) are not represented here; they
/// show up as skipped rows, zero rates or notes on the output instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error(
        "No {material} equation for {institution} ({tillage}, {use_case}) at target pH {target_ph}"
    )]
    NoMatchingEquation {
        material: String,
        institution: String,
        tillage: String,
        use_case: String,
        target_ph: f64,
    },

    #[error("Equation `{expression}` is not allowed: {reason}")]
    UnsafeExpression { expression: String, reason: String },

    #[error("Equation `{expression}` evaluated to a non-finite value")]
    NonFiniteResult { expression: String },

    #[error("Unknown fertilizer: {0}")]
    UnknownFertilizer(String),
}

pub type CalcResult<T> = Result<T, CalcError>;
