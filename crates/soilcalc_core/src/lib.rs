//! The `soilcalc_core` crate implements the agronomic calculators behind the
//! soil amendment web forms. Every calculator is a pure function over a typed
//! input; static tables are compiled in.
//!
//! Key components:
//! - **Equation Engine**: tokenizer, parser and bytecode VM for the lime equation strings.
//! - **Equations**: the lime equation table, compiled once on first use.
//! - **Lime**: 98G / Aglime rates, target pH listings, economics and product comparison.
//! - **Fertilizer Acidity**: lb of 98G needed to offset acidifying N and S sources.
//! - **pH Efficiency**: nutrient cost and dollars at risk by soil pH.
//! - **Gypsum / Sulfur**: SO4 rates for high-Mg and sodic soils, sulfur rate and AMS sizing.
//! - **Traits**: `Calculator`, the seam hosts use to drive any calculator generically.
pub mod crop;
pub mod equation_engine;
pub mod equations;
pub mod error;
pub mod fertilizer_acidity;
pub mod gypsum;
pub mod lime;
pub mod ph_efficiency;
pub mod sulfur;
pub mod traits;
pub mod units;
