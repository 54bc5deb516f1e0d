//! Lime (98G) needed to offset the acidity of nitrogen and sulfur fertilizers.
//!
//! lbs 98G = (CaCO3 need from N + CaCO3 need from S) / neutralizing power
//!
//! MicroEssentials products carry half their labeled sulfur as elemental S,
//! and only that half acidifies. Elemental sulfur acidifies in full.

use crate::units::{clamp_non_negative, round_half_up};
use serde::{Deserialize, Serialize};

pub const DEFAULT_NEUTRALIZING_POWER: f64 = 0.94;

/// Share of MicroEssentials sulfur that is elemental (acidifying).
const ELEMENTAL_S_FRACTION: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcidifierClass {
    StandardN,
    /// N product that also supplies partly elemental sulfur.
    SulfurBearingN,
    ElementalSulfur,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Acidifier {
    pub id: &'static str,
    pub label: &'static str,
    pub class: AcidifierClass,
    /// lb CaCO3 per lb N applied.
    pub coefficient_n: Option<f64>,
    /// lb CaCO3 per lb acidifying S applied.
    pub coefficient_s: Option<f64>,
    /// Label N and S percent, used to derive sulfur from a product rate.
    pub n_pct: f64,
    pub s_pct: f64,
}

const fn standard_n(id: &'static str, label: &'static str, coefficient_n: f64) -> Acidifier {
    Acidifier {
        id,
        label,
        class: AcidifierClass::StandardN,
        coefficient_n: Some(coefficient_n),
        coefficient_s: None,
        n_pct: 0.0,
        s_pct: 0.0,
    }
}

const fn microessentials(id: &'static str, label: &'static str, n_pct: f64, s_pct: f64) -> Acidifier {
    Acidifier {
        id,
        label,
        class: AcidifierClass::SulfurBearingN,
        coefficient_n: Some(5.4),
        coefficient_s: Some(3.0),
        n_pct,
        s_pct,
    }
}

pub static ACIDIFIERS: [Acidifier; 11] = [
    standard_n("AA", "Anhydrous Ammonia (AA)", 1.8),
    standard_n("Urea", "Urea", 1.8),
    standard_n("AMS", "Ammonium Sulfate (AMS)", 5.4),
    standard_n("MAP", "Monoammonium Phosphate (MAP)", 5.4),
    standard_n("DAP", "Diammonium Phosphate (DAP)", 3.6),
    standard_n("AN", "Ammonium Nitrate (AN)", 1.8),
    standard_n("UAN", "Urea Ammonium Nitrate (UAN)", 1.8),
    microessentials("MES-SZ", "MicroEssentials SZ (MES-SZ)", 12.0, 10.0),
    microessentials("MES-S10", "MicroEssentials S10 (MES-S10)", 12.0, 10.0),
    microessentials("MES-S15", "MicroEssentials S15 (MES-S15)", 13.0, 15.0),
    Acidifier {
        id: "ES",
        label: "Elemental Sulfur (ES)",
        class: AcidifierClass::ElementalSulfur,
        coefficient_n: None,
        coefficient_s: Some(3.0),
        n_pct: 0.0,
        s_pct: 100.0,
    },
];

/// Looks a product up by id, or by its full label.
pub fn find_acidifier(key: &str) -> Option<&'static Acidifier> {
    ACIDIFIERS
        .iter()
        .find(|entry| entry.id == key || entry.label == key)
}

pub fn list_acidifiers() -> &'static [Acidifier] {
    &ACIDIFIERS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcidityRowInput {
    pub fertilizer_id: String,
    /// lb N/ac applied.
    #[serde(default)]
    pub units_n_lb_ac: Option<f64>,
    /// lb S/ac applied (elemental sulfur only).
    #[serde(default)]
    pub units_s_lb_ac: Option<f64>,
    /// Product rate, lb/ac (MicroEssentials only). Takes precedence over N units
    /// when deriving sulfur.
    #[serde(default)]
    pub product_rate_lb_ac: Option<f64>,
}

fn default_neutralizing_power() -> f64 {
    DEFAULT_NEUTRALIZING_POWER
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcidityInput {
    pub rows: Vec<AcidityRowInput>,
    #[serde(default = "default_neutralizing_power")]
    pub neutralizing_power_fraction: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SulfurDetail {
    /// Product rate derived from N units, when no explicit rate was given.
    pub derived_product_rate_lb_ac: Option<f64>,
    pub total_s_units: f64,
    pub elemental_s_units: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcidityRowOutput {
    pub fertilizer_id: String,
    /// Rounded lb 98G/ac.
    pub total_lbs_needed: f64,
    pub n_contribution: Option<f64>,
    pub s_contribution: Option<f64>,
    pub sulfur_detail: Option<SulfurDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcidityOutput {
    /// Sum of the rounded row totals.
    pub total_lbs_needed: f64,
    pub rows: Vec<AcidityRowOutput>,
    /// Fertilizer ids that were not recognised and were left out.
    pub skipped: Vec<String>,
}

pub fn run_fertilizer_acidity(input: &AcidityInput) -> AcidityOutput {
    let enp = if input.neutralizing_power_fraction > 0.0 {
        input.neutralizing_power_fraction
    } else {
        1.0
    };

    let mut rows = Vec::with_capacity(input.rows.len());
    let mut skipped = Vec::new();
    let mut total = 0.0;

    for row in &input.rows {
        let Some(product) = find_acidifier(&row.fertilizer_id) else {
            tracing::warn!(fertilizer = %row.fertilizer_id, "skipping unknown fertilizer");
            skipped.push(row.fertilizer_id.clone());
            continue;
        };
        let out = acidity_row(product, row, enp);
        total += out.total_lbs_needed;
        rows.push(out);
    }

    AcidityOutput {
        total_lbs_needed: total,
        rows,
        skipped,
    }
}

fn acidity_row(product: &Acidifier, row: &AcidityRowInput, enp: f64) -> AcidityRowOutput {
    let units_n = row.units_n_lb_ac.map(clamp_non_negative);

    let need_n = match (units_n, product.coefficient_n) {
        (Some(units), Some(coefficient)) => units * coefficient,
        _ => 0.0,
    };

    let mut need_s = 0.0;
    let mut sulfur_detail = None;
    match (product.class, product.coefficient_s) {
        (AcidifierClass::ElementalSulfur, Some(coefficient)) => {
            if let Some(units_s) = row.units_s_lb_ac {
                need_s = clamp_non_negative(units_s) * coefficient;
            }
        }
        (AcidifierClass::SulfurBearingN, Some(coefficient)) => {
            let explicit_rate = row.product_rate_lb_ac.map(clamp_non_negative);
            let rate = match (explicit_rate, units_n) {
                (Some(rate), _) => rate,
                (None, Some(units)) if product.n_pct > 0.0 => units / (product.n_pct / 100.0),
                _ => 0.0,
            };
            if rate > 0.0 {
                let total_s_units = rate * (product.s_pct / 100.0);
                let elemental_s_units = total_s_units * ELEMENTAL_S_FRACTION;
                need_s = elemental_s_units * coefficient;
                tracing::debug!(
                    fertilizer = product.id,
                    rate,
                    total_s_units,
                    elemental_s_units,
                    "sulfur-bearing N product"
                );
                sulfur_detail = Some(SulfurDetail {
                    derived_product_rate_lb_ac: explicit_rate.is_none().then_some(rate),
                    total_s_units,
                    elemental_s_units,
                });
            }
        }
        _ => {}
    }

    let nonzero_rounded = |need: f64| (need != 0.0).then(|| round_half_up(need / enp));

    AcidityRowOutput {
        fertilizer_id: product.id.to_string(),
        total_lbs_needed: round_half_up((need_n + need_s) / enp),
        n_contribution: nonzero_rounded(need_n),
        s_contribution: nonzero_rounded(need_s),
        sulfur_detail,
    }
}
