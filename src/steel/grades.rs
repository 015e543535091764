//! Steel grade table: S235-S460 yield/ultimate strengths per NEN-EN
//! 1993-1-1 NL, built once as a read-only constant table.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SteelGrade {
    S235,
    S275,
    S355,
    S460,
}

impl SteelGrade {
    /// Yield strength `f_y`, Pa, for the thinnest thickness class
    /// (`t <= 40 mm`) — thickness-dependent reduction is out of scope.
    pub fn fy(&self) -> f64 {
        match self {
            SteelGrade::S235 => 235e6,
            SteelGrade::S275 => 275e6,
            SteelGrade::S355 => 355e6,
            SteelGrade::S460 => 460e6,
        }
    }

    pub fn fu(&self) -> f64 {
        match self {
            SteelGrade::S235 => 360e6,
            SteelGrade::S275 => 430e6,
            SteelGrade::S355 => 490e6,
            SteelGrade::S460 => 540e6,
        }
    }
}

/// Buckling curve imperfection factors, Table 6.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucklingCurve {
    A,
    B,
    C,
    D,
}

impl BucklingCurve {
    pub fn alpha(&self) -> f64 {
        match self {
            BucklingCurve::A => 0.21,
            BucklingCurve::B => 0.34,
            BucklingCurve::C => 0.49,
            BucklingCurve::D => 0.76,
        }
    }
}
