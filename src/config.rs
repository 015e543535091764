//! Engine-wide defaults and analysis settings.
//!
//! Mirrors `AnalysisSettings` from the solver layer of the predecessor
//! engine: a single plain-data struct constructed once (`Default`) and
//! threaded by value through solve/check/optimize calls, rather than global
//! mutable state.

use serde::{Deserialize, Serialize};

/// Partial safety factors per NEN-EN 1993-1-1 NL.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartialFactors {
    pub gamma_m0: f64,
    pub gamma_m1: f64,
    pub gamma_m2: f64,
}

impl Default for PartialFactors {
    fn default() -> Self {
        Self {
            gamma_m0: 1.0,
            gamma_m1: 1.0,
            gamma_m2: 1.25,
        }
    }
}

/// NEN-EN 1990 6.10a/b combination factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombinationFactors {
    pub gamma_g_favourable: f64,
    pub gamma_g_unfavourable: f64,
    pub gamma_q: f64,
}

impl Default for CombinationFactors {
    fn default() -> Self {
        Self {
            gamma_g_favourable: 1.2,
            gamma_g_unfavourable: 1.35,
            gamma_q: 1.5,
        }
    }
}

/// Settings shared across assembly, solve, and check operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Equilibrium / relative-residual tolerance for the direct solver.
    pub tolerance: f64,
    /// Cap on the tension/compression-only contact outer loop (§9: fixed at 20).
    pub max_contact_iterations: usize,
    /// Minimum number of force-recovery stations sampled per beam.
    pub min_stations: usize,
    /// Default SLS deflection limit divisor (L / divisor).
    pub deflection_limit_divisor: f64,
    /// Penalty multiplier applied to `max(diag K)` for restrained DOFs.
    pub penalty_factor: f64,
    pub partial_factors: PartialFactors,
    pub combination_factors: CombinationFactors,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_contact_iterations: 20,
            min_stations: 21,
            deflection_limit_divisor: 250.0,
            penalty_factor: 1e12,
            partial_factors: PartialFactors::default(),
            combination_factors: CombinationFactors::default(),
        }
    }
}
