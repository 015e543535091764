//! Global assembly: DOF numbering, stiffness/load assembly, boundary
//! condition application, and reaction recovery.
//!
//! DOF numbering corrects the predecessor crate's `StaticSolver`, which
//! numbered compact 2D DOFs in `HashMap`/`Vec` iteration order; here the
//! node index is always the node's rank in the ascending-sorted id
//! sequence, stable across calls for a given model revision.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::config::AnalysisSettings;
use crate::elements::beam::BeamElement;
use crate::elements::ElementStiffness;
use crate::error::{FeaError, Result};
use crate::loads::{LoadCase, PointLoad};
use crate::model::Model;

/// Maps node id -> DOF rank and exposes `dofs_per_node`, built once per
/// assembly call from the model's ascending-sorted node-id sequence.
pub struct DofMap {
    pub node_rank: HashMap<u64, usize>,
    pub dofs_per_node: usize,
    pub num_dofs: usize,
}

impl DofMap {
    pub fn build(model: &Model) -> Self {
        let ordered = model.ordered_node_ids();
        let dofs_per_node = model.dofs_per_node();
        let node_rank: HashMap<u64, usize> =
            ordered.iter().enumerate().map(|(rank, &id)| (id, rank)).collect();
        let num_dofs = ordered.len() * dofs_per_node;
        Self {
            node_rank,
            dofs_per_node,
            num_dofs,
        }
    }

    pub fn global_dof(&self, node_id: u64, local_dof: usize) -> usize {
        self.node_rank[&node_id] * self.dofs_per_node + local_dof
    }

    pub fn beam_dofs(&self, start: u64, end: u64) -> Vec<usize> {
        if self.dofs_per_node == 3 {
            vec![
                self.global_dof(start, 0),
                self.global_dof(start, 1),
                self.global_dof(start, 2),
                self.global_dof(end, 0),
                self.global_dof(end, 1),
                self.global_dof(end, 2),
            ]
        } else {
            vec![
                self.global_dof(start, 0),
                self.global_dof(start, 1),
                self.global_dof(end, 0),
                self.global_dof(end, 1),
            ]
        }
    }
}

/// A beam marked inactive by the tension/compression-only contact loop has
/// its stiffness and fixed-end load contribution excluded from assembly.
pub struct AssembledSystem {
    pub k: DMatrix<f64>,
    pub f: DVector<f64>,
    pub dof_map: DofMap,
    pub fixed_end_loads: HashMap<u64, DVector<f64>>,
}

/// Assemble global K and F for the given load case, excluding beams whose
/// id is in `inactive_beams` (contact loop bookkeeping).
pub fn assemble(
    model: &Model,
    load_case: &LoadCase,
    inactive_beams: &[u64],
) -> Result<AssembledSystem> {
    if model.nodes.is_empty() {
        return Err(FeaError::InvalidInput("model has no nodes".into()));
    }

    let dof_map = DofMap::build(model);
    let mut k = DMatrix::zeros(dof_map.num_dofs, dof_map.num_dofs);
    let mut f = DVector::zeros(dof_map.num_dofs);
    let mut fixed_end_loads = HashMap::new();

    let mut beam_ids: Vec<u64> = model.beams.keys().copied().collect();
    beam_ids.sort_unstable();

    let contributions: Vec<(u64, Vec<usize>, DMatrix<f64>, DVector<f64>)> = beam_ids
        .par_iter()
        .filter(|id| !inactive_beams.contains(id))
        .map(|&id| {
            let beam = &model.beams[&id];
            if beam.releases.is_mechanism() {
                return Err(FeaError::IncompatibleReleases(format!(
                    "beam {id} has no internal force path"
                )));
            }
            let start = &model.nodes[&beam.start_node];
            let end = &model.nodes[&beam.end_node];
            let material = &model.materials[&beam.material_id];
            let element = BeamElement::new(beam, start, end, material);

            let point_loads: Vec<PointLoad> = load_case
                .point_loads
                .get(&id)
                .cloned()
                .unwrap_or_default();

            let k_local = element.condensed_local_stiffness();
            let t = element.transformation();
            let k_global = t.transpose() * &k_local * &t;

            let f_local = element.equivalent_nodal_loads(&point_loads);
            let f_global = t.transpose() * &f_local;

            let dofs = dof_map.beam_dofs(beam.start_node, beam.end_node);
            Ok((id, dofs, k_global, f_global))
        })
        .collect::<Result<Vec<_>>>()?;

    for (id, dofs, k_global, f_global) in contributions {
        crate::linalg::add_local_into_global(&mut k, &k_global, &dofs);
        for (i, &gi) in dofs.iter().enumerate() {
            f[gi] -= f_global[i];
        }
        fixed_end_loads.insert(id, f_global);
    }

    let mut node_ids: Vec<u64> = model.nodes.keys().copied().collect();
    node_ids.sort_unstable();
    for id in node_ids {
        let node = &model.nodes[&id];
        if let Some(load) = node.load {
            f[dof_map.global_dof(id, 0)] += load.fx;
            f[dof_map.global_dof(id, 1)] += load.fy;
            if dof_map.dofs_per_node == 3 {
                f[dof_map.global_dof(id, 2)] += load.mz;
            }
        }
    }

    Ok(AssembledSystem {
        k,
        f,
        dof_map,
        fixed_end_loads,
    })
}

pub fn restrained_dofs(model: &Model, dof_map: &DofMap) -> Vec<usize> {
    let mut dofs = Vec::new();
    let mut ids: Vec<u64> = model.nodes.keys().copied().collect();
    ids.sort_unstable();
    for id in ids {
        let node = &model.nodes[&id];
        for local in node.support.restrained_local_dofs() {
            if local < dof_map.dofs_per_node {
                dofs.push(dof_map.global_dof(id, local));
            }
        }
    }
    dofs
}

/// Apply restrained DOFs, solve, and return the displacement vector plus
/// the un-penalised `K` needed for reaction recovery.
pub fn solve_with_constraints(
    system: &AssembledSystem,
    model: &Model,
    settings: &AnalysisSettings,
) -> Result<(DVector<f64>, DMatrix<f64>)> {
    let k_unpenalised = system.k.clone();
    let mut k = system.k.clone();
    let mut f = system.f.clone();
    let restrained = restrained_dofs(model, &system.dof_map);

    crate::linalg::apply_penalty_constraints(&mut k, &mut f, &restrained, settings.penalty_factor);

    let u = crate::linalg::solve_linear_system(&k, &f).map_err(|_| {
        FeaError::MechanismDetected(find_vanishing_pivot(&k))
    })?;

    Ok((u, k_unpenalised))
}

fn find_vanishing_pivot(k: &DMatrix<f64>) -> usize {
    for i in 0..k.nrows() {
        if k[(i, i)].abs() < 1e-9 {
            return i;
        }
    }
    0
}

/// `R = K_full * u - f_applied` on restrained DOFs.
pub fn recover_reactions(
    k_unpenalised: &DMatrix<f64>,
    u: &DVector<f64>,
    f_applied: &DVector<f64>,
) -> DVector<f64> {
    k_unpenalised * u - f_applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loads::LoadCase;
    use crate::model::{Section, Support};

    fn simple_beam_model() -> Model {
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
        model.add_beam(n1, n2, mat, section).unwrap();
        model
    }

    #[test]
    fn dof_numbering_is_ascending_rank_regardless_of_insertion_order() {
        let mut model = Model::new();
        let hi = model.add_node(1.0, 0.0).unwrap();
        let lo = model.add_node(0.0, 0.0).unwrap();
        let dof_map = DofMap::build(&model);
        assert!(dof_map.node_rank[&lo] < dof_map.node_rank[&hi]);
    }

    #[test]
    fn assembled_stiffness_is_symmetric() {
        let model = simple_beam_model();
        let case = LoadCase::new("dead");
        let system = assemble(&model, &case, &[]).unwrap();
        assert!((system.k.clone() - system.k.transpose()).norm() < 1e-3);
    }
}
