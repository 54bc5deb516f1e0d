//! Lime requirement equation table.
//!
//! Each row maps (material, institution, tillage, target pH) to a formula over
//! the buffer pH (`BpH`) and water pH (`WpH`) of a soil test. 98G rows evaluate
//! to lb/ac, Aglime rows to tons/ac before the ECCE adjustment. Maintenance
//! rates are fixed in code, so only correction rows are tabulated.

use crate::equation_engine::Formula;
use crate::error::CalcResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Material {
    #[serde(rename = "98G")]
    NinetyEightG,
    Aglime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Institution {
    #[serde(rename = "UW")]
    Uw,
    #[serde(rename = "ISU")]
    Isu,
}

impl Institution {
    pub const ALL: [Institution; 2] = [Institution::Uw, Institution::Isu];

    pub fn other(self) -> Self {
        match self {
            Institution::Uw => Institution::Isu,
            Institution::Isu => Institution::Uw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tillage {
    Conventional,
    #[serde(rename = "No-Till")]
    NoTill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UseCase {
    Correction,
    Maintenance,
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Material::NinetyEightG => "98G",
            Material::Aglime => "Aglime",
        })
    }
}

impl fmt::Display for Institution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Institution::Uw => "UW",
            Institution::Isu => "ISU",
        })
    }
}

impl fmt::Display for Tillage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tillage::Conventional => "Conventional",
            Tillage::NoTill => "No-Till",
        })
    }
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UseCase::Correction => "Correction",
            UseCase::Maintenance => "Maintenance",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquationRow {
    pub use_case: UseCase,
    pub material: Material,
    pub institution: Institution,
    pub tillage: Tillage,
    pub target_ph: f64,
    pub equation: &'static str,
}

const fn row(
    material: Material,
    institution: Institution,
    tillage: Tillage,
    target_ph: f64,
    equation: &'static str,
) -> EquationRow {
    EquationRow {
        use_case: UseCase::Correction,
        material,
        institution,
        tillage,
        target_ph,
        equation,
    }
}

pub static EQUATIONS: [EquationRow; 42] = [
    row(Material::Aglime, Institution::Isu, Tillage::Conventional, 6.0, "((38619 - (5915 * BpH)) * (6 * 0.167)) / 2000"),
    row(Material::Aglime, Institution::Isu, Tillage::Conventional, 6.5, "((49886 - (7245 * BpH)) * (6 * 0.167)) / 2000"),
    row(Material::Aglime, Institution::Isu, Tillage::Conventional, 6.8, "((58776 - (8244 * BpH)) * (6 * 0.167)) / 2000"),
    row(Material::Aglime, Institution::Isu, Tillage::NoTill, 6.0, "((38619 - (5915 * BpH)) * (3 * 0.167)) / 2000"),
    row(Material::Aglime, Institution::Isu, Tillage::NoTill, 6.5, "((49886 - (7245 * BpH)) * (3 * 0.167)) / 2000"),
    row(Material::Aglime, Institution::Isu, Tillage::NoTill, 6.8, "((58776 - (8244 * BpH)) * (3 * 0.167)) / 2000"),
    row(Material::Aglime, Institution::Uw, Tillage::Conventional, 5.2, "(36.1 - (3.29 * BpH) - (2.67 * WpH))"),
    row(Material::Aglime, Institution::Uw, Tillage::Conventional, 5.4, "(48.2 - (4.84 * BpH) - (3.03 * WpH))"),
    row(Material::Aglime, Institution::Uw, Tillage::Conventional, 5.6, "(51 - (5.4 * BpH) - (2.67 * WpH))"),
    row(Material::Aglime, Institution::Uw, Tillage::Conventional, 5.8, "(57.2 - (5.55 * BpH) - (3.5 * WpH))"),
    row(Material::Aglime, Institution::Uw, Tillage::Conventional, 6.0, "(72.7 - (7.59 * BpH) - (3.78 * WpH))"),
    row(Material::Aglime, Institution::Uw, Tillage::Conventional, 6.3, "(103 - (12.6 * BpH) - (3.18 * WpH))"),
    row(Material::Aglime, Institution::Uw, Tillage::Conventional, 6.5, "(134 - (17.2 * BpH) - (2.73 * WpH))"),
    row(Material::Aglime, Institution::Uw, Tillage::Conventional, 6.6, "(152 - (20.3 * BpH) - (2.17 * WpH))"),
    row(Material::Aglime, Institution::Uw, Tillage::Conventional, 6.8, "(195 - (28.4 * BpH) + (0.144 * WpH))"),
    row(Material::Aglime, Institution::Uw, Tillage::NoTill, 5.2, "(36.1 - (3.29 * BpH) - (2.67 * WpH)) * 0.5"),
    row(Material::Aglime, Institution::Uw, Tillage::NoTill, 5.4, "(48.2 - (4.84 * BpH) - (3.03 * WpH)) * 0.5"),
    row(Material::Aglime, Institution::Uw, Tillage::NoTill, 5.6, "(51 - (5.4 * BpH) - (2.67 * WpH)) * 0.5"),
    row(Material::Aglime, Institution::Uw, Tillage::NoTill, 5.8, "(57.2 - (5.55 * BpH) - (3.5 * WpH)) * 0.5"),
    row(Material::Aglime, Institution::Uw, Tillage::NoTill, 6.0, "(72.7 - (7.59 * BpH) - (3.78 * WpH)) * 0.5"),
    row(Material::Aglime, Institution::Uw, Tillage::NoTill, 6.3, "(103 - (12.6 * BpH) - (3.18 * WpH)) * 0.5"),
    row(Material::Aglime, Institution::Uw, Tillage::NoTill, 6.5, "(134 - (17.2 * BpH) - (2.73 * WpH)) * 0.5"),
    row(Material::Aglime, Institution::Uw, Tillage::NoTill, 6.6, "(152 - (20.3 * BpH) - (2.17 * WpH)) * 0.5"),
    row(Material::Aglime, Institution::Uw, Tillage::NoTill, 6.8, "(195 - (28.4 * BpH) + (0.144 * WpH)) * 0.5"),
    row(Material::NinetyEightG, Institution::Uw, Tillage::Conventional, 5.2, "(36.1 - (3.29 * BpH) - (2.67 * WpH)) * 2000 * 0.18"),
    row(Material::NinetyEightG, Institution::Uw, Tillage::Conventional, 5.4, "(48.2 - (4.84 * BpH) - (3.03 * WpH)) * 2000 * 0.18"),
    row(Material::NinetyEightG, Institution::Uw, Tillage::Conventional, 5.6, "(51 - (5.4 * BpH) - (2.67 * WpH)) * 2000 * 0.18"),
    row(Material::NinetyEightG, Institution::Uw, Tillage::Conventional, 5.8, "(57.2 - (5.55 * BpH) - (3.5 * WpH)) * 2000 * 0.18"),
    row(Material::NinetyEightG, Institution::Uw, Tillage::Conventional, 6.0, "(72.7 - (7.59 * BpH) - (3.78 * WpH)) * 2000 * 0.18"),
    row(Material::NinetyEightG, Institution::Uw, Tillage::Conventional, 6.3, "(103 - (12.6 * BpH) - (3.18 * WpH)) * 2000 * 0.18"),
    row(Material::NinetyEightG, Institution::Uw, Tillage::Conventional, 6.5, "(134 - (17.2 * BpH) - (2.73 * WpH)) * 2000 * 0.18"),
    row(Material::NinetyEightG, Institution::Uw, Tillage::Conventional, 6.6, "(152 - (20.3 * BpH) - (2.17 * WpH)) * 2000 * 0.18"),
    row(Material::NinetyEightG, Institution::Uw, Tillage::Conventional, 6.8, "(195 - (28.4 * BpH) + (0.144 * WpH)) * 2000 * 0.18"),
    row(Material::NinetyEightG, Institution::Uw, Tillage::NoTill, 5.2, "(36.1 - (3.29 * BpH) - (2.67 * WpH)) * 2000 * 0.1"),
    row(Material::NinetyEightG, Institution::Uw, Tillage::NoTill, 5.4, "(48.2 - (4.84 * BpH) - (3.03 * WpH)) * 2000 * 0.1"),
    row(Material::NinetyEightG, Institution::Uw, Tillage::NoTill, 5.6, "(51 - (5.4 * BpH) - (2.67 * WpH)) * 2000 * 0.1"),
    row(Material::NinetyEightG, Institution::Uw, Tillage::NoTill, 5.8, "(57.2 - (5.55 * BpH) - (3.5 * WpH)) * 2000 * 0.1"),
    row(Material::NinetyEightG, Institution::Uw, Tillage::NoTill, 6.0, "(72.7 - (7.59 * BpH) - (3.78 * WpH)) * 2000 * 0.1"),
    row(Material::NinetyEightG, Institution::Uw, Tillage::NoTill, 6.3, "(103 - (12.6 * BpH) - (3.18 * WpH)) * 2000 * 0.1"),
    row(Material::NinetyEightG, Institution::Uw, Tillage::NoTill, 6.5, "(134 - (17.2 * BpH) - (2.73 * WpH)) * 2000 * 0.1"),
    row(Material::NinetyEightG, Institution::Uw, Tillage::NoTill, 6.6, "(152 - (20.3 * BpH) - (2.17 * WpH)) * 2000 * 0.1"),
    row(Material::NinetyEightG, Institution::Uw, Tillage::NoTill, 6.8, "(195 - (28.4 * BpH) + (0.144 * WpH)) * 2000 * 0.1"),
];

/// An equation row together with its compiled formula.
#[derive(Debug, Clone)]
pub struct CompiledEquation {
    pub row: EquationRow,
    pub formula: Formula,
}

/// The equation table with every formula compiled up front, so a malformed
/// row fails when the table loads rather than when a user hits it.
#[derive(Debug, Clone)]
pub struct EquationTable {
    entries: Vec<CompiledEquation>,
}

impl EquationTable {
    pub fn compile(rows: &[EquationRow]) -> CalcResult<Self> {
        let entries = rows
            .iter()
            .map(|row| {
                Ok(CompiledEquation {
                    row: *row,
                    formula: Formula::compile(row.equation)?,
                })
            })
            .collect::<CalcResult<Vec<_>>>()?;
        tracing::debug!(rows = entries.len(), "compiled lime equation table");
        Ok(Self { entries })
    }

    /// The built-in table, compiled on first use.
    pub fn builtin() -> CalcResult<&'static EquationTable> {
        static TABLE: OnceLock<CalcResult<EquationTable>> = OnceLock::new();
        TABLE
            .get_or_init(|| EquationTable::compile(&EQUATIONS))
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn entries(&self) -> &[CompiledEquation] {
        &self.entries
    }

    pub fn find(
        &self,
        material: Material,
        institution: Institution,
        tillage: Tillage,
        use_case: UseCase,
        target_ph: f64,
    ) -> Option<&CompiledEquation> {
        self.entries.iter().find(|entry| {
            let row = &entry.row;
            row.material == material
                && row.institution == institution
                && row.tillage == tillage
                && row.use_case == use_case
                && row.target_ph == target_ph
        })
    }

    /// Sorted, distinct correction target pH values for the combination.
    pub fn target_phs(&self, material: Material, institution: Institution, tillage: Tillage) -> Vec<f64> {
        let mut values: Vec<f64> = self
            .entries
            .iter()
            .map(|entry| &entry.row)
            .filter(|row| {
                row.material == material
                    && row.institution == institution
                    && row.tillage == tillage
                    && row.use_case == UseCase::Correction
            })
            .map(|row| row.target_ph)
            .collect();
        values.sort_by(f64::total_cmp);
        values.dedup();
        values
    }
}
