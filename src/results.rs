//! Result post-processing: per-beam force diagrams sampled along the
//! member, plate moments/shears, and whole-model summaries.

use std::collections::HashMap;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::assembly::{AssembledSystem, DofMap};
use crate::config::AnalysisSettings;
use crate::elements::beam::BeamElement;
use crate::elements::plate::PlateElement;
use crate::error::Result;
use crate::loads::{LoadCase, PointLoad};
use crate::model::Model;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamStations {
    pub t: Vec<f64>,
    pub normal_force: Vec<f64>,
    pub shear_force: Vec<f64>,
    pub bending_moment: Vec<f64>,
    pub n1: f64,
    pub n2: f64,
    pub v1: f64,
    pub v2: f64,
    pub m1: f64,
    pub m2: f64,
}

impl BeamStations {
    pub fn max_abs_moment(&self) -> f64 {
        self.bending_moment.iter().fold(0.0_f64, |acc, &m| acc.max(m.abs()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateForces {
    pub m_x: f64,
    pub m_y: f64,
    pub m_xy: f64,
    pub v_x: f64,
    pub v_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverResult {
    pub displacements: Vec<f64>,
    pub reactions: Vec<f64>,
    pub beam_forces: HashMap<u64, BeamStations>,
    pub plate_forces: HashMap<u64, PlateForces>,
    pub inactive_beams: Vec<u64>,
    pub equilibrium_residual: f64,
    pub warning: Option<String>,
}

impl SolverResult {
    pub fn max_displacement(&self) -> f64 {
        self.displacements.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()))
    }

    pub fn max_reaction(&self) -> f64 {
        self.reactions.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()))
    }

    pub fn displacement_at(&self, dof: usize) -> f64 {
        self.displacements.get(dof).copied().unwrap_or(0.0)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn sample_beam_forces(
    model: &Model,
    load_case: &LoadCase,
    system: &AssembledSystem,
    u: &DVector<f64>,
    settings: &AnalysisSettings,
) -> HashMap<u64, BeamStations> {
    let mut out = HashMap::new();
    for (&id, beam) in &model.beams {
        let start = &model.nodes[&beam.start_node];
        let end = &model.nodes[&beam.end_node];
        let material = &model.materials[&beam.material_id];
        let element = BeamElement::new(beam, start, end, material);

        let point_loads: Vec<PointLoad> = load_case.point_loads.get(&id).cloned().unwrap_or_default();
        let fixed_end = system
            .fixed_end_loads
            .get(&id)
            .cloned()
            .unwrap_or_else(|| DVector::zeros(6));

        let dofs = system.dof_map.beam_dofs(beam.start_node, beam.end_node);
        let u_local: DVector<f64> = DVector::from_iterator(dofs.len(), dofs.iter().map(|&d| u[d]));

        let stations = element.stations(&point_loads, settings.min_stations);
        let mut n = Vec::with_capacity(stations.len());
        let mut v = Vec::with_capacity(stations.len());
        let mut m = Vec::with_capacity(stations.len());
        for &t in &stations {
            let (ni, vi, mi) = element.internal_forces_at(&u_local, &fixed_end, &point_loads, t);
            n.push(ni);
            v.push(vi);
            m.push(mi);
        }

        let n1 = *n.first().unwrap_or(&0.0);
        let n2 = *n.last().unwrap_or(&0.0);
        let v1 = *v.first().unwrap_or(&0.0);
        let v2 = *v.last().unwrap_or(&0.0);
        let m1 = *m.first().unwrap_or(&0.0);
        let m2 = *m.last().unwrap_or(&0.0);

        out.insert(
            id,
            BeamStations {
                t: stations,
                normal_force: n,
                shear_force: v,
                bending_moment: m,
                n1,
                n2,
                v1,
                v2,
                m1,
                m2,
            },
        );
    }
    out
}

pub fn sample_plate_forces(
    model: &Model,
    dof_map: &DofMap,
    u: &DVector<f64>,
) -> HashMap<u64, PlateForces> {
    let mut out = HashMap::new();
    if dof_map.dofs_per_node < 3 {
        return out;
    }
    for (&id, plate) in &model.plates {
        let nodes = [
            &model.nodes[&plate.nodes[0]],
            &model.nodes[&plate.nodes[1]],
            &model.nodes[&plate.nodes[2]],
        ];
        let material = &model.materials[&plate.material_id];
        let element = PlateElement::new(plate, nodes, material);

        let mut u_local = DVector::zeros(9);
        for (i, &node_id) in plate.nodes.iter().enumerate() {
            for local in 0..3 {
                u_local[i * 3 + local] = u[dof_map.global_dof(node_id, local)];
            }
        }

        let gauss_moments = element.moments_at_gauss_points(&u_local);
        let (vx, vy) = element.shear_from_moments(&gauss_moments);
        let avg = gauss_moments.iter().fold(nalgebra::Vector3::zeros(), |acc, m| acc + m)
            / gauss_moments.len() as f64;

        out.insert(
            id,
            PlateForces {
                m_x: avg.x,
                m_y: avg.y,
                m_xy: avg.z,
                v_x: vx,
                v_y: vy,
            },
        );
    }
    out
}

pub fn equilibrium_residual(reactions: &DVector<f64>, applied: &DVector<f64>) -> f64 {
    (reactions + applied).norm()
}
