use serde::{Deserialize, Serialize};
use std::fmt;

/// Crops supported by the sulfur and pH-efficiency calculators.
///
/// Yield goals are bushels per acre, except alfalfa which is tons per acre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crop {
    #[serde(alias = "Corn Grain")]
    Corn,
    Soybean,
    Wheat,
    Alfalfa,
}

impl Crop {
    pub const ALL: [Crop; 4] = [Crop::Corn, Crop::Soybean, Crop::Wheat, Crop::Alfalfa];
}

impl fmt::Display for Crop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Crop::Corn => "Corn",
            Crop::Soybean => "Soybean",
            Crop::Wheat => "Wheat",
            Crop::Alfalfa => "Alfalfa",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nutrient {
    N,
    P2O5,
    K2O,
    S,
}

impl Nutrient {
    /// Table order used by every per-nutrient array in this crate.
    pub const ALL: [Nutrient; 4] = [Nutrient::N, Nutrient::P2O5, Nutrient::K2O, Nutrient::S];

    pub fn index(self) -> usize {
        match self {
            Nutrient::N => 0,
            Nutrient::P2O5 => 1,
            Nutrient::K2O => 2,
            Nutrient::S => 3,
        }
    }
}

/// Percent-by-weight guaranteed analysis (N-P2O5-K2O-S).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub n: f64,
    pub p2o5: f64,
    pub k2o: f64,
    pub s: f64,
}

impl Analysis {
    pub const fn new(n: f64, p2o5: f64, k2o: f64, s: f64) -> Self {
        Self { n, p2o5, k2o, s }
    }

    pub fn pct(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::N => self.n,
            Nutrient::P2O5 => self.p2o5,
            Nutrient::K2O => self.k2o,
            Nutrient::S => self.s,
        }
    }

    pub fn total(&self) -> f64 {
        self.n + self.p2o5 + self.k2o + self.s
    }

    /// Fraction of the analysis made up by `nutrient`, 0 for an empty analysis.
    pub fn share(&self, nutrient: Nutrient) -> f64 {
        let total = self.total();
        if total > 0.0 {
            self.pct(nutrient) / total
        } else {
            0.0
        }
    }
}
