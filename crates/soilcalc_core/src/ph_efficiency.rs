//! Nutrient dollars at risk versus soil pH.
//!
//! Product rates are sized to replace crop removal. The N product is sized
//! after crediting the N carried by the chosen P, K and S products. Two cost
//! views are produced: per-row cost charged wholly to the row's nutrient, and
//! summary cards that split each product's cost across every nutrient it
//! carries by analysis share.

use crate::crop::{Analysis, Crop, Nutrient};
use crate::units::{clamp_non_negative, dollars_per_acre, rate_from_pct, round_dp};
use serde::{Deserialize, Serialize};

/// Supported soil pH buckets, ascending.
pub const ALLOWED_PHS: [f64; 9] = [5.0, 5.2, 5.4, 5.6, 5.8, 6.0, 6.3, 6.5, 6.8];

/// Utilization fraction per bucket, in `Nutrient::ALL` order.
const UTILIZATION: [[f64; 4]; 9] = [
    [0.53, 0.34, 0.52, 0.85],
    [0.58, 0.40, 0.55, 0.86],
    [0.63, 0.48, 0.58, 0.88],
    [0.68, 0.57, 0.63, 0.90],
    [0.73, 0.66, 0.70, 0.92],
    [0.78, 0.75, 0.78, 0.95],
    [0.85, 0.86, 0.88, 0.98],
    [0.90, 0.92, 0.93, 1.00],
    [0.95, 0.96, 0.96, 1.00],
];

/// lb nutrient removed per unit of yield (bu, or tons for alfalfa).
pub fn crop_removal(crop: Crop) -> Analysis {
    match crop {
        Crop::Corn => Analysis::new(1.00, 0.32, 0.22, 0.08),
        Crop::Soybean => Analysis::new(0.00, 0.80, 1.40, 0.10),
        Crop::Wheat => Analysis::new(1.20, 0.60, 0.35, 0.08),
        Crop::Alfalfa => Analysis::new(0.00, 1.30, 5.50, 0.25),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FertilizerEntry {
    pub id: &'static str,
    pub label: &'static str,
    pub analysis: Analysis,
    /// Nutrient menus that list this product.
    pub primary: &'static [Nutrient],
    /// $/ton.
    pub default_price: f64,
}

const fn entry(
    id: &'static str,
    label: &'static str,
    analysis: Analysis,
    primary: &'static [Nutrient],
    default_price: f64,
) -> FertilizerEntry {
    FertilizerEntry {
        id,
        label,
        analysis,
        primary,
        default_price,
    }
}

const N_MENU: &[Nutrient] = &[Nutrient::N];
const P_MENU: &[Nutrient] = &[Nutrient::P2O5];
const K_MENU: &[Nutrient] = &[Nutrient::K2O];
const S_MENU: &[Nutrient] = &[Nutrient::S];

pub static FERTILIZERS: [FertilizerEntry; 25] = [
    entry("NH3", "Anhydrous Ammonia (82-0-0)", Analysis::new(82.0, 0.0, 0.0, 0.0), N_MENU, 550.0),
    entry("Urea46", "Urea (46-0-0)", Analysis::new(46.0, 0.0, 0.0, 0.0), N_MENU, 500.0),
    entry("UAN32", "32 % UAN (32-0-0)", Analysis::new(32.0, 0.0, 0.0, 0.0), N_MENU, 350.0),
    entry("UAN28", "28 % UAN (28-0-0)", Analysis::new(28.0, 0.0, 0.0, 0.0), N_MENU, 330.0),
    entry("AN34", "Ammonium Nitrate (34-0-0)", Analysis::new(34.0, 0.0, 0.0, 0.0), N_MENU, 520.0),
    entry("MAP11-52", "Monoammonium Phosphate (MAP 11-52-0)", Analysis::new(11.0, 52.0, 0.0, 0.0), P_MENU, 850.0),
    entry("DAP18-46", "Diammonium Phosphate (DAP 18-46-0)", Analysis::new(18.0, 46.0, 0.0, 0.0), P_MENU, 820.0),
    entry("APP-10-34-0", "Ammonium Polyphosphate (10-34-0)", Analysis::new(10.0, 34.0, 0.0, 0.0), P_MENU, 780.0),
    entry("MES-S10", "MicroEssentials S10 (12-40-0-10S)", Analysis::new(12.0, 40.0, 0.0, 10.0), P_MENU, 900.0),
    entry("MES-S15", "MicroEssentials S15 (13-33-0-15S)", Analysis::new(13.0, 33.0, 0.0, 15.0), P_MENU, 900.0),
    entry("MES-SZ", "MicroEssentials SZ (12-40-0-10S)", Analysis::new(12.0, 40.0, 0.0, 10.0), P_MENU, 900.0),
    entry("FortyRock", "40 Rock (0-28-0)", Analysis::new(0.0, 28.0, 0.0, 0.0), P_MENU, 500.0),
    entry("SSP", "Single Superphosphate (0-20-0-12S)", Analysis::new(0.0, 20.0, 0.0, 12.0), P_MENU, 520.0),
    entry("TSP", "Triple Superphosphate (0-46-0)", Analysis::new(0.0, 46.0, 0.0, 0.0), P_MENU, 780.0),
    entry("Croplex-12-40-0", "Croplex 12-40-0", Analysis::new(12.0, 40.0, 0.0, 0.0), P_MENU, 880.0),
    entry("Croplex-13-33-0", "Croplex 13-33-0", Analysis::new(13.0, 33.0, 0.0, 0.0), P_MENU, 870.0),
    entry("KCl60", "Potassium Chloride 60 %", Analysis::new(0.0, 0.0, 60.0, 0.0), K_MENU, 400.0),
    entry("KCl62", "Potassium Chloride 62 %", Analysis::new(0.0, 0.0, 62.0, 0.0), K_MENU, 420.0),
    entry("K2SO4-50", "Potassium Sulfate (0-0-50-18S)", Analysis::new(0.0, 0.0, 50.0, 18.0), K_MENU, 600.0),
    entry("KTS-0-0-25-17S", "Potassium Thiosulfate (0-0-25-17S)", Analysis::new(0.0, 0.0, 25.0, 17.0), K_MENU, 580.0),
    entry("AMS-21-24S", "Ammonium Sulfate (21-0-0-24S)", Analysis::new(21.0, 0.0, 0.0, 24.0), S_MENU, 550.0),
    entry("ATS-12-0-0-26S", "Ammonium Thiosulfate (12-0-0-26S)", Analysis::new(12.0, 0.0, 0.0, 26.0), S_MENU, 520.0),
    entry("SO4-17S", "SO\u{2084} Pelletized Gypsum (0-0-0-17S)", Analysis::new(0.0, 0.0, 0.0, 17.0), S_MENU, 150.0),
    entry("ElemS-90", "Elemental Sulfur 90 %", Analysis::new(0.0, 0.0, 0.0, 90.0), S_MENU, 400.0),
    entry("ElemS-85", "Elemental Sulfur 85 %", Analysis::new(0.0, 0.0, 0.0, 85.0), S_MENU, 380.0),
];

pub fn find_fertilizer(id: &str) -> Option<&'static FertilizerEntry> {
    FERTILIZERS.iter().find(|entry| entry.id == id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FertilizerOption {
    pub id: String,
    pub label: String,
}

/// Products listed in a nutrient's menu, in catalog order.
pub fn list_fertilizers_for(nutrient: Nutrient) -> Vec<FertilizerOption> {
    FERTILIZERS
        .iter()
        .filter(|entry| entry.primary.contains(&nutrient))
        .map(|entry| FertilizerOption {
            id: entry.id.to_string(),
            label: entry.label.to_string(),
        })
        .collect()
}

pub fn default_price(id: &str) -> Option<f64> {
    find_fertilizer(id).map(|entry| entry.default_price)
}

pub fn default_prices() -> Vec<(&'static str, f64)> {
    FERTILIZERS
        .iter()
        .map(|entry| (entry.id, entry.default_price))
        .collect()
}

/// Snaps `value` to the nearest bucket. On an exact tie the bucket seen first
/// in the ascending scan (the lower one) wins.
fn snap_to_bucket(value: f64, buckets: &[f64]) -> usize {
    let mut best = 0;
    let mut best_distance = (value - buckets[0]).abs();
    for (idx, bucket) in buckets.iter().enumerate().skip(1) {
        let distance = (value - bucket).abs();
        if distance < best_distance {
            best = idx;
            best_distance = distance;
        }
    }
    best
}

pub fn snap_ph(soil_ph: f64) -> f64 {
    ALLOWED_PHS[snap_to_bucket(soil_ph, &ALLOWED_PHS)]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertChoice {
    pub id: String,
    pub price_per_ton: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyInput {
    pub crop: Crop,
    pub yield_goal: f64,
    pub soil_ph: f64,
    pub n: FertChoice,
    pub p: FertChoice,
    pub k: FertChoice,
    pub s: FertChoice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyRow {
    pub nutrient: Nutrient,
    pub needed_lb_ac: f64,
    pub utilization_frac: f64,
    /// Product rate to meet removal, after N credits for the N row.
    pub rate_lb_ac: f64,
    pub cost_per_ac: f64,
    /// `cost_per_ac * (1 - utilization)`.
    pub at_risk_per_ac: f64,
    pub fertilizer: String,
    pub analysis_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientCard {
    pub util: f64,
    pub at_risk: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyCards {
    pub n: NutrientCard,
    pub p: NutrientCard,
    pub k: NutrientCard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyOutput {
    pub snapped_ph: f64,
    /// N, P2O5, K2O, S order; a nutrient with an unknown product is absent.
    pub rows: Vec<EfficiencyRow>,
    pub total_cost_per_ac: f64,
    /// N, P2O5 and K2O rows only; sulfur risk stays on its own row.
    pub total_at_risk_per_ac: f64,
    pub cards: EfficiencyCards,
    pub skipped: Vec<String>,
}

pub fn run_ph_efficiency(input: &EfficiencyInput) -> EfficiencyOutput {
    let bucket = snap_to_bucket(input.soil_ph, &ALLOWED_PHS);
    let util = UTILIZATION[bucket];
    let removal = crop_removal(input.crop);
    let yield_goal = clamp_non_negative(input.yield_goal);

    let choices = [&input.n, &input.p, &input.k, &input.s];
    let mut skipped = Vec::new();
    let products: Vec<Option<&'static FertilizerEntry>> = choices
        .iter()
        .map(|choice| {
            let product = find_fertilizer(&choice.id);
            if product.is_none() {
                tracing::warn!(fertilizer = %choice.id, "skipping unknown fertilizer");
                skipped.push(choice.id.clone());
            }
            product
        })
        .collect();

    let needed: [f64; 4] = Nutrient::ALL.map(|nutrient| removal.pct(nutrient) * yield_goal);

    let mut rates = [0.0; 4];
    for nutrient in [Nutrient::P2O5, Nutrient::K2O, Nutrient::S] {
        let idx = nutrient.index();
        if let Some(product) = products[idx] {
            rates[idx] = rate_from_pct(product.analysis.pct(nutrient), needed[idx]);
        }
    }

    let n_credit: f64 = [Nutrient::P2O5, Nutrient::K2O, Nutrient::S]
        .iter()
        .filter_map(|nutrient| {
            let idx = nutrient.index();
            products[idx].map(|product| rates[idx] * (product.analysis.n / 100.0))
        })
        .sum();
    let n_idx = Nutrient::N.index();
    if let Some(product) = products[n_idx] {
        let n_needed = (needed[n_idx] - n_credit).max(0.0);
        rates[n_idx] = rate_from_pct(product.analysis.n, n_needed);
    }

    let product_costs: [f64; 4] =
        std::array::from_fn(|idx| dollars_per_acre(rates[idx], choices[idx].price_per_ton));

    let rows: Vec<EfficiencyRow> = Nutrient::ALL
        .iter()
        .filter_map(|&nutrient| {
            let idx = nutrient.index();
            let product = products[idx]?;
            let cost = product_costs[idx];
            Some(EfficiencyRow {
                nutrient,
                needed_lb_ac: round_dp(needed[idx], 1),
                utilization_frac: util[idx],
                rate_lb_ac: round_dp(rates[idx], 1),
                cost_per_ac: round_dp(cost, 2),
                at_risk_per_ac: round_dp(cost * (1.0 - util[idx]), 2),
                fertilizer: product.id.to_string(),
                analysis_pct: product.analysis.pct(nutrient),
            })
        })
        .collect();

    let total_cost_per_ac = round_dp(rows.iter().map(|row| row.cost_per_ac).sum(), 2);
    let total_at_risk_per_ac = round_dp(
        rows.iter()
            .filter(|row| row.nutrient != Nutrient::S)
            .map(|row| row.at_risk_per_ac)
            .sum(),
        2,
    );

    let mut allocated = [0.0; 4];
    for (idx, product) in products.iter().enumerate() {
        let Some(product) = product else { continue };
        for nutrient in Nutrient::ALL {
            allocated[nutrient.index()] += product_costs[idx] * product.analysis.share(nutrient);
        }
    }
    let card = |nutrient: Nutrient| {
        let idx = nutrient.index();
        NutrientCard {
            util: util[idx],
            at_risk: round_dp(allocated[idx] * (1.0 - util[idx]), 2),
        }
    };

    EfficiencyOutput {
        snapped_ph: ALLOWED_PHS[bucket],
        rows,
        total_cost_per_ac,
        total_at_risk_per_ac,
        cards: EfficiencyCards {
            n: card(Nutrient::N),
            p: card(Nutrient::P2O5),
            k: card(Nutrient::K2O),
        },
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() < tol,
            "expected {expected}, got {actual}"
        );
    }

    fn choice(id: &str) -> FertChoice {
        FertChoice {
            id: id.to_string(),
            price_per_ton: default_price(id).unwrap_or(0.0),
        }
    }

    fn corn_input(soil_ph: f64) -> EfficiencyInput {
        EfficiencyInput {
            crop: Crop::Corn,
            yield_goal: 200.0,
            soil_ph,
            n: choice("Urea46"),
            p: choice("MAP11-52"),
            k: choice("KCl60"),
            s: choice("SO4-17S"),
        }
    }

    #[test]
    fn snaps_to_nearest_bucket() {
        assert_eq!(snap_ph(5.3), 5.2);
        assert_eq!(snap_ph(5.1), 5.0);
        assert_eq!(snap_ph(4.0), 5.0);
        assert_eq!(snap_ph(7.5), 6.8);
        assert_eq!(snap_ph(6.2), 6.3);
        assert_eq!(snap_ph(6.0), 6.0);
    }

    #[test]
    fn exact_ties_keep_the_lower_bucket() {
        assert_eq!(snap_to_bucket(1.5, &[1.0, 2.0]), 0);
        assert_eq!(snap_to_bucket(2.5, &[1.0, 2.0, 3.0]), 1);
    }

    #[test]
    fn n_product_is_sized_after_credits() {
        let out = run_ph_efficiency(&corn_input(6.0));
        assert_eq!(out.snapped_ph, 6.0);
        assert!(out.skipped.is_empty());
        let [n, p, k, s] = [&out.rows[0], &out.rows[1], &out.rows[2], &out.rows[3]];

        // P2O5: 0.32 * 200 = 64 lb => 64 / 0.52 = 123.08 lb MAP, carrying 13.54 lb N.
        assert_close(p.needed_lb_ac, 64.0, 1e-9);
        assert_close(p.rate_lb_ac, 123.1, 1e-9);
        // N: 200 - 13.54 = 186.46 lb => 405.35 lb urea.
        assert_close(n.needed_lb_ac, 200.0, 1e-9);
        assert_close(n.rate_lb_ac, 405.4, 1e-9);
        assert_close(k.rate_lb_ac, 73.3, 1e-9);
        assert_close(s.rate_lb_ac, 94.1, 1e-9);

        assert_close(n.cost_per_ac, 101.34, 1e-9);
        assert_close(n.at_risk_per_ac, 22.29, 1e-9);
        assert_eq!(n.utilization_frac, 0.78);
    }

    #[test]
    fn total_at_risk_excludes_sulfur() {
        let out = run_ph_efficiency(&corn_input(5.0));
        let npk: f64 = out.rows[..3].iter().map(|row| row.at_risk_per_ac).sum();
        assert_close(out.total_at_risk_per_ac, round_dp(npk, 2), 1e-9);
        assert!(out.rows[3].at_risk_per_ac > 0.0);
        let all: f64 = out.rows.iter().map(|row| row.cost_per_ac).sum();
        assert_close(out.total_cost_per_ac, round_dp(all, 2), 1e-9);
    }

    #[test]
    fn cards_allocate_product_cost_by_analysis_share() {
        let out = run_ph_efficiency(&corn_input(6.0));
        let map_cost = dollars_per_acre(64.0 / 0.52, 850.0);
        let urea_cost = dollars_per_acre((200.0 - 64.0 / 0.52 * 0.11) / 0.46, 500.0);
        let n_alloc = urea_cost + map_cost * (11.0 / 63.0);
        let p_alloc = map_cost * (52.0 / 63.0);
        assert_close(out.cards.n.at_risk, round_dp(n_alloc * (1.0 - 0.78), 2), 1e-9);
        assert_close(out.cards.p.at_risk, round_dp(p_alloc * (1.0 - 0.75), 2), 1e-9);
        // The simple row view charges all of MAP to P.
        assert!(out.rows[1].at_risk_per_ac > out.cards.p.at_risk);
    }

    #[test]
    fn soybean_needs_no_n_product() {
        let mut input = corn_input(6.5);
        input.crop = Crop::Soybean;
        let out = run_ph_efficiency(&input);
        assert_eq!(out.rows[0].needed_lb_ac, 0.0);
        assert_eq!(out.rows[0].rate_lb_ac, 0.0);
        assert_eq!(out.rows[0].cost_per_ac, 0.0);
    }

    #[test]
    fn zero_content_product_sizes_to_zero() {
        let mut input = corn_input(6.0);
        input.s = choice("KCl60");
        let out = run_ph_efficiency(&input);
        assert_eq!(out.rows[3].rate_lb_ac, 0.0);
        assert_eq!(out.rows[3].analysis_pct, 0.0);
    }

    #[test]
    fn unknown_product_drops_its_row() {
        let mut input = corn_input(6.0);
        input.p = FertChoice {
            id: "Mystery".to_string(),
            price_per_ton: 100.0,
        };
        let out = run_ph_efficiency(&input);
        assert_eq!(out.skipped, vec!["Mystery".to_string()]);
        assert_eq!(out.rows.len(), 3);
        assert!(out.rows.iter().all(|row| row.nutrient != Nutrient::P2O5));
        // Without the MAP credit urea covers all 200 lb N.
        assert_close(out.rows[0].rate_lb_ac, round_dp(200.0 / 0.46, 1), 1e-9);
    }

    #[test]
    fn menus_filter_by_primary_nutrient() {
        let n_menu = list_fertilizers_for(Nutrient::N);
        assert_eq!(n_menu.len(), 5);
        assert_eq!(n_menu[0].id, "NH3");
        let s_ids: Vec<String> = list_fertilizers_for(Nutrient::S)
            .into_iter()
            .map(|option| option.id)
            .collect();
        assert!(s_ids.contains(&"AMS-21-24S".to_string()));
        assert!(!s_ids.contains(&"MES-S15".to_string()));
        assert_eq!(default_prices().len(), FERTILIZERS.len());
    }

    #[test]
    fn repeated_runs_are_identical() {
        let input = corn_input(5.7);
        assert_eq!(run_ph_efficiency(&input), run_ph_efficiency(&input));
    }
}
