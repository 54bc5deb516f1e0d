//! Unit conversions and rounding shared by the calculators.

pub const LBS_PER_TON: f64 = 2000.0;

/// Floors a value at zero. Non-finite inputs also collapse to zero.
pub fn clamp_non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Rounds half-way cases toward positive infinity, like the forms do.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

pub fn round_dp(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    round_half_up(value * scale) / scale
}

pub fn round_to_step(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return value;
    }
    round_half_up(value / step) * step
}

pub fn tons_to_lbs(tons: f64) -> f64 {
    tons * LBS_PER_TON
}

pub fn lbs_to_tons(lbs: f64) -> f64 {
    lbs / LBS_PER_TON
}

/// Product rate (lb/ac) needed to supply `units_lb` of a nutrient from a
/// product carrying `pct` percent of it. Products without the nutrient supply
/// nothing, so a non-positive percent yields a zero rate.
pub fn rate_from_pct(pct: f64, units_lb: f64) -> f64 {
    if pct <= 0.0 {
        return 0.0;
    }
    units_lb / (pct / 100.0)
}

/// Dollars per acre for a product applied at `rate_lb_ac` and priced per ton.
pub fn dollars_per_acre(rate_lb_ac: f64, price_per_ton: f64) -> f64 {
    lbs_to_tons(rate_lb_ac) * price_per_ton
}
