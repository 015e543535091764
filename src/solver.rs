//! The static solver: assembly, boundary conditions, direct solve,
//! tension/compression-only contact iteration, and result post-processing.
//!
//! `Solver` is kept from the predecessor crate's `solvers::Solver` trait
//! shape (`solve`/`validate_model`); `ModalSolver`/`TimeHistorySolver` have
//! no counterpart here since dynamic analysis is out of scope.

use log::{info, warn};
use nalgebra::DVector;

use crate::config::AnalysisSettings;
use crate::error::{FeaError, Result};
use crate::loads::LoadCase;
use crate::model::{EndRelease, Model};
use crate::{assembly, results};
use crate::results::SolverResult;

pub trait Solver {
    fn solve(&self, model: &Model, load_case: &LoadCase, settings: &AnalysisSettings) -> Result<SolverResult>;
    fn validate_model(&self, model: &Model) -> Result<()>;
}

pub struct StaticSolver;

impl StaticSolver {
    pub fn new() -> Self {
        Self
    }

    fn contact_beams(model: &Model) -> Vec<u64> {
        let mut ids: Vec<u64> = model
            .beams
            .iter()
            .filter(|(_, b)| b.releases.start_axial.is_contact() || b.releases.end_axial.is_contact())
            .map(|(&id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for StaticSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for StaticSolver {
    fn validate_model(&self, model: &Model) -> Result<()> {
        if model.nodes.is_empty() {
            return Err(FeaError::InvalidInput("model has no nodes".into()));
        }
        for beam in model.beams.values() {
            if beam.releases.is_mechanism() {
                return Err(FeaError::IncompatibleReleases(format!(
                    "beam {} has no internal force path",
                    beam.id
                )));
            }
        }
        Ok(())
    }

    fn solve(&self, model: &Model, load_case: &LoadCase, settings: &AnalysisSettings) -> Result<SolverResult> {
        self.validate_model(model)?;

        let contact_beams = Self::contact_beams(model);
        let mut inactive: Vec<u64> = Vec::new();

        let (system, u, k_unpenalised) = {
            let mut last = None;
            for iteration in 0..=settings.max_contact_iterations {
                info!("assembling system, contact iteration {iteration}");
                let system = assembly::assemble(model, load_case, &inactive)?;
                let (u, k_unpenalised) = assembly::solve_with_constraints(&system, model, settings)?;

                let mut newly_inactive = Vec::new();
                for &id in &contact_beams {
                    if inactive.contains(&id) {
                        continue;
                    }
                    let beam = &model.beams[&id];
                    let start = &model.nodes[&beam.start_node];
                    let end = &model.nodes[&beam.end_node];
                    let dofs = system.dof_map.beam_dofs(beam.start_node, beam.end_node);
                    let axial = axial_force_sign(&u, &dofs, start, end);

                    let violates = match (beam.releases.start_axial, beam.releases.end_axial) {
                        (EndRelease::TensionOnly, _) | (_, EndRelease::TensionOnly) => axial < 0.0,
                        (EndRelease::CompressionOnly, _) | (_, EndRelease::CompressionOnly) => axial > 0.0,
                        _ => false,
                    };
                    if violates {
                        newly_inactive.push(id);
                    }
                }

                if newly_inactive.is_empty() {
                    last = Some((system, u, k_unpenalised));
                    break;
                }
                inactive.extend(newly_inactive);

                if iteration == settings.max_contact_iterations {
                    return Err(FeaError::ContactNonconvergent(settings.max_contact_iterations));
                }
            }
            last.ok_or(FeaError::ContactNonconvergent(settings.max_contact_iterations))?
        };

        let reactions = assembly::recover_reactions(&k_unpenalised, &u, &system.f);
        let restrained = assembly::restrained_dofs(model, &system.dof_map);
        let mut reaction_vector = DVector::zeros(reactions.len());
        for &dof in &restrained {
            reaction_vector[dof] = reactions[dof];
        }

        let residual = results::equilibrium_residual(&reaction_vector, &system.f);
        let tolerance = (system.f.norm() * settings.tolerance).max(1e-3);
        let warning = if residual > tolerance {
            warn!("equilibrium residual {residual} exceeds tolerance {tolerance}");
            Some(format!(
                "equilibrium residual {residual:.6} exceeds tolerance {tolerance:.6}"
            ))
        } else {
            None
        };

        let beam_forces = results::sample_beam_forces(model, load_case, &system, &u, settings);
        let plate_forces = results::sample_plate_forces(model, &system.dof_map, &u);

        Ok(SolverResult {
            displacements: u.iter().copied().collect(),
            reactions: reaction_vector.iter().copied().collect(),
            beam_forces,
            plate_forces,
            inactive_beams: inactive,
            equilibrium_residual: residual,
            warning,
        })
    }
}

fn axial_force_sign(u: &DVector<f64>, dofs: &[usize], start: &crate::model::Node, end: &crate::model::Node) -> f64 {
    let l = ((end.x - start.x).powi(2) + (end.y - start.y).powi(2)).sqrt();
    let c = (end.x - start.x) / l;
    let s = (end.y - start.y) / l;
    let u1 = u[dofs[0]] * c + u[dofs[1]] * s;
    let idx2 = if dofs.len() == 6 { 3 } else { 2 };
    let u2 = u[dofs[idx2]] * c + u[dofs[idx2 + 1]] * s;
    u2 - u1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Section, Support};

    fn simply_supported_udl() -> (Model, LoadCase) {
        let mut model = Model::new();
        let n1 = model.add_node(0.0, 0.0).unwrap();
        let n2 = model.add_node(6.0, 0.0).unwrap();
        model.set_support(n1, Support::pinned()).unwrap();
        model.set_support(n2, Support::roller_y()).unwrap();
        let mat = model.add_material(210e9, 0.3, 7850.0).unwrap();
        let section = Section {
            area: 2.85e-3,
            iy: 1.943e-5,
            iz: 1.42e-6,
            wel_y: 1.94e-4,
            wel_z: 4.41e-5,
            wpl_y: 2.21e-4,
            wpl_z: 7.6e-5,
            h: 0.2,
            b: Some(0.1),
            tw: Some(0.0056),
            tf: Some(0.0085),
        };
        let beam = model.add_beam(n1, n2, mat, section).unwrap();
        model
            .set_distributed_load(
                beam,
                Some(crate::loads::DistributedLoad::uniform(-10_000.0, crate::loads::LoadFrame::Global)),
            )
            .unwrap();
        (model, LoadCase::new("dead"))
    }

    #[test]
    fn s1_simply_supported_udl_matches_analytical_values() {
        let (model, case) = simply_supported_udl();
        let settings = AnalysisSettings::default();
        let solver = StaticSolver::new();
        let result = solver.solve(&model, &case, &settings).unwrap();

        let beam_id = *model.beams.keys().next().unwrap();
        let forces = &result.beam_forces[&beam_id];
        assert!((forces.max_abs_moment() - 45_000.0).abs() / 45_000.0 < 0.01);

        let total_reaction: f64 = result.reactions.iter().filter(|v| v.abs() > 1.0).map(|v| v.abs()).sum();
        assert!((total_reaction - 60_000.0).abs() / 60_000.0 < 0.01);
    }
}
