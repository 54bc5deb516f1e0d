//! WASM bridge for `soilcalc_core`.
//!
//! Every export takes and returns plain JS values; calculator errors surface
//! as rejected strings. Listings that are plain numbers come back as
//! `Float64Array`.

mod amendments;
mod lime;
mod nutrients;
mod shared;

pub use amendments::{run_ams_sulfur, run_so4_high_mg, run_so4_sodic, run_so4_sulfur};
pub use lime::{
    calculate_lime_rate, compare_lime_products, lime_economics, list_target_phs,
    list_target_phs_any_institution,
};
pub use nutrients::{
    allowed_phs, default_prices, list_acidifiers, list_fertilizers_for, run_fertilizer_acidity,
    run_ph_efficiency,
};
