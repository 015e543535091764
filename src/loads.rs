//! Load definitions: point/distributed/thermal actions, load cases and the
//! combination rules used to factor them for a solve.
//!
//! Structured the way the predecessor engine's load layer is: small typed
//! load variants collected into named cases, combined through named
//! combinations rather than ad hoc factor lists threaded through the
//! solver.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{FeaError, Result};

/// A trapezoidal (possibly partial-span) distributed load on a beam,
/// specified over `[t0, t1]` of the member's local length with intensity
/// varying linearly from `w0` to `w1`. A full-span uniform load is the
/// common case `t0 = 0.0, t1 = 1.0, w0 == w1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributedLoad {
    /// Start fraction of member length, in `[0, 1)`.
    pub t0: f64,
    /// End fraction of member length, in `(t0, 1]`.
    pub t1: f64,
    /// Intensity at `t0`, N/m, positive in the direction of `frame`.
    pub w0: f64,
    /// Intensity at `t1`, N/m.
    pub w1: f64,
    pub frame: LoadFrame,
}

/// Whether a distributed load's intensity acts along global or the
/// member's local transverse/axial axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadFrame {
    Local,
    Global,
}

impl DistributedLoad {
    pub fn uniform(w: f64, frame: LoadFrame) -> Self {
        Self {
            t0: 0.0,
            t1: 1.0,
            w0: w,
            w1: w,
            frame,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.t0) || !(0.0..=1.0).contains(&self.t1) || self.t0 >= self.t1
        {
            return Err(FeaError::InvalidInput(format!(
                "distributed load range [{}, {}] is not a valid partial span",
                self.t0, self.t1
            )));
        }
        Ok(())
    }

    /// Intensity at local fraction `t` within `[t0, t1]`, zero outside it.
    pub fn intensity_at(&self, t: f64) -> f64 {
        if t < self.t0 || t > self.t1 {
            return 0.0;
        }
        let span = self.t1 - self.t0;
        if span <= 0.0 {
            return self.w0;
        }
        let frac = (t - self.t0) / span;
        self.w0 + frac * (self.w1 - self.w0)
    }
}

/// A concentrated force/moment applied at an explicit point along a beam's
/// local length (as opposed to a nodal load, which lives on [`crate::model::Node`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLoad {
    /// Fraction of member length, in `(0, 1)`.
    pub t: f64,
    pub fx: f64,
    pub fy: f64,
    pub mz: f64,
}

/// A uniform temperature change applied to a beam, producing a free axial
/// strain `alpha * delta_t` resisted according to the member's end releases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalLoad {
    pub alpha: f64,
    pub delta_t: f64,
}

/// One named, independently-solvable load pattern: a set of beam point
/// loads and thermal loads keyed by beam id (nodal loads and full-span
/// distributed loads instead live directly on [`crate::model::Node`] and
/// [`crate::model::Beam`], since a model typically has only one governing
/// arrangement of those).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadCase {
    pub name: String,
    pub point_loads: HashMap<u64, Vec<PointLoad>>,
    pub thermal_loads: HashMap<u64, ThermalLoad>,
}

impl LoadCase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            point_loads: HashMap::new(),
            thermal_loads: HashMap::new(),
        }
    }

    pub fn add_point_load(&mut self, beam_id: u64, load: PointLoad) {
        self.point_loads.entry(beam_id).or_default().push(load);
    }

    pub fn set_thermal_load(&mut self, beam_id: u64, load: ThermalLoad) {
        self.thermal_loads.insert(beam_id, load);
    }
}

/// The limit-state family a combination targets, governing which check
/// consumes its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitState {
    Uls,
    Sls,
}

/// A linear combination of named load cases with scalar factors, per
/// NEN-EN 1990 6.10 for ULS or unfactored (characteristic) for SLS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadCombination {
    pub name: String,
    pub limit_state: LimitState,
    pub factors: Vec<(String, f64)>,
}

impl LoadCombination {
    pub fn new(name: impl Into<String>, limit_state: LimitState) -> Self {
        Self {
            name: name.into(),
            limit_state,
            factors: Vec::new(),
        }
    }

    pub fn with_factor(mut self, case: impl Into<String>, factor: f64) -> Self {
        self.add_case(case.into(), factor);
        self
    }

    pub fn add_case(&mut self, case_name: String, factor: f64) {
        if let Some(existing) = self.factors.iter_mut().find(|(name, _)| *name == case_name) {
            existing.1 = factor;
        } else {
            self.factors.push((case_name, factor));
        }
    }

    pub fn factor_for(&self, case_name: &str) -> f64 {
        self.factors
            .iter()
            .find(|(name, _)| name == case_name)
            .map(|(_, f)| *f)
            .unwrap_or(0.0)
    }

    /// NEN-EN 1990 6.10, single governing combination: `gamma_g*G + gamma_q*Q`
    /// for each named dead/live case, per [`crate::config::CombinationFactors`].
    pub fn uls(
        name: impl Into<String>,
        dead_cases: &[&str],
        live_cases: &[&str],
        gamma_g: f64,
        gamma_q: f64,
    ) -> Self {
        let mut combo = Self::new(name, LimitState::Uls);
        for case in dead_cases {
            combo.add_case((*case).to_string(), gamma_g);
        }
        for case in live_cases {
            combo.add_case((*case).to_string(), gamma_q);
        }
        combo
    }

    pub fn sls_characteristic(name: impl Into<String>, cases: &[&str]) -> Self {
        let mut combo = Self::new(name, LimitState::Sls);
        for case in cases {
            combo.add_case((*case).to_string(), 1.0);
        }
        combo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distributed_load_intensity_interpolates() {
        let load = DistributedLoad {
            t0: 0.0,
            t1: 1.0,
            w0: 0.0,
            w1: 10.0,
            frame: LoadFrame::Local,
        };
        assert!((load.intensity_at(0.5) - 5.0).abs() < 1e-9);
        assert_eq!(load.intensity_at(1.5), 0.0);
    }

    #[test]
    fn combination_factor_lookup() {
        let combo = LoadCombination::uls("ULS1", &["dead"], &["live"], 1.35, 1.5);
        assert!((combo.factor_for("dead") - 1.35).abs() < 1e-9);
        assert!((combo.factor_for("live") - 1.5).abs() < 1e-9);
        assert_eq!(combo.factor_for("wind"), 0.0);
    }

    #[test]
    fn invalid_partial_span_rejected() {
        let load = DistributedLoad {
            t0: 0.6,
            t1: 0.4,
            w0: 1.0,
            w1: 1.0,
            frame: LoadFrame::Local,
        };
        assert!(load.validate().is_err());
    }
}
