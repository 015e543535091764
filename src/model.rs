//! Mesh & model data: the arena-owned entities behind every analysis.
//!
//! The store owns nodes, beams, plate triangles, and materials exclusively;
//! everything else (loads, the solver, the checks) carries numeric ids and
//! borrows from the store only for the duration of a single call, following
//! the arena-plus-stable-id pattern this engine's predecessor already used
//! for its `HashMap<usize, Node>` tables.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{FeaError, Result, Validate};
use crate::loads::DistributedLoad;

/// Per-node support mask. `true` means the DOF is restrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Support {
    pub restrain_x: bool,
    pub restrain_y: bool,
    pub restrain_rotation: bool,
}

impl Support {
    pub fn free() -> Self {
        Self::default()
    }

    pub fn pinned() -> Self {
        Self {
            restrain_x: true,
            restrain_y: true,
            restrain_rotation: false,
        }
    }

    pub fn fixed() -> Self {
        Self {
            restrain_x: true,
            restrain_y: true,
            restrain_rotation: true,
        }
    }

    pub fn roller_y() -> Self {
        Self {
            restrain_x: false,
            restrain_y: true,
            restrain_rotation: false,
        }
    }

    pub fn restrained_local_dofs(&self) -> Vec<usize> {
        let mut dofs = Vec::new();
        if self.restrain_x {
            dofs.push(0);
        }
        if self.restrain_y {
            dofs.push(1);
        }
        if self.restrain_rotation {
            dofs.push(2);
        }
        dofs
    }

    pub fn is_restrained(&self) -> bool {
        self.restrain_x || self.restrain_y || self.restrain_rotation
    }
}

/// Concentrated load applied directly at a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodalLoad {
    pub fx: f64,
    pub fy: f64,
    pub mz: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub support: Support,
    pub load: Option<NodalLoad>,
}

impl Node {
    pub fn new(id: u64, x: f64, y: f64) -> Self {
        Self {
            id,
            x,
            y,
            support: Support::default(),
            load: None,
        }
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

impl Validate for Node {
    fn validate(&self) -> Result<()> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(FeaError::InvalidInput(format!(
                "node {} has non-finite coordinates",
                self.id
            )));
        }
        Ok(())
    }
}

/// The kinematic condition of one end-of-beam DOF.
///
/// Replaces the reference's four independent booleans with a tagged
/// variant per end/action: static condensation is derived from the
/// variant directly (`Fixed`/`Hinge`), while `TensionOnly`/`CompressionOnly`
/// are resolved by the solver's outer contact loop rather than by
/// condensation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndRelease {
    Fixed,
    Hinge,
    TensionOnly,
    CompressionOnly,
}

impl EndRelease {
    pub fn is_condensed(&self) -> bool {
        matches!(self, EndRelease::Hinge)
    }

    pub fn is_contact(&self) -> bool {
        matches!(self, EndRelease::TensionOnly | EndRelease::CompressionOnly)
    }
}

impl Default for EndRelease {
    fn default() -> Self {
        EndRelease::Fixed
    }
}

/// Per-end connection state for a beam: moment release governs the
/// rotational DOF, axial release the translational-along-axis DOF.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BeamReleases {
    pub start_moment: EndRelease,
    pub end_moment: EndRelease,
    pub start_axial: EndRelease,
    pub end_axial: EndRelease,
}

impl BeamReleases {
    pub fn rigid() -> Self {
        Self::default()
    }

    pub fn pinned_both_ends() -> Self {
        Self {
            start_moment: EndRelease::Hinge,
            end_moment: EndRelease::Hinge,
            start_axial: EndRelease::Fixed,
            end_axial: EndRelease::Fixed,
        }
    }

    pub fn start_hinge() -> Self {
        Self {
            start_moment: EndRelease::Hinge,
            ..Self::default()
        }
    }

    pub fn end_hinge() -> Self {
        Self {
            end_moment: EndRelease::Hinge,
            ..Self::default()
        }
    }

    /// A member carries no internal force path when both moments are
    /// hinged and both axial DOFs are released in the same breath -
    /// rejected at assembly as an `IncompatibleReleases` error.
    pub fn is_mechanism(&self) -> bool {
        let both_moments_hinged =
            self.start_moment == EndRelease::Hinge && self.end_moment == EndRelease::Hinge;
        let both_axial_released =
            self.start_axial != EndRelease::Fixed && self.end_axial != EndRelease::Fixed;
        both_moments_hinged && both_axial_released
    }

    /// 12 local-DOF-style flags are unnecessary here; the six local beam
    /// DOFs that can be condensed are (θ1, θ2) for moment hinges and
    /// (u1, u2) for axial-only releases used by tension/compression-only
    /// members once they are confirmed inactive, in local order
    /// `(u1, v1, θ1, u2, v2, θ2)`.
    pub fn condensed_local_dofs(&self) -> Vec<usize> {
        let mut dofs = Vec::new();
        if self.start_moment.is_condensed() {
            dofs.push(2);
        }
        if self.end_moment.is_condensed() {
            dofs.push(5);
        }
        dofs
    }
}

/// Cross-section properties. Either authored directly or copied from a
/// catalog profile via [`crate::section::SteelCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub area: f64,
    pub iy: f64,
    pub iz: f64,
    pub wel_y: f64,
    pub wel_z: f64,
    pub wpl_y: f64,
    pub wpl_z: f64,
    pub h: f64,
    pub b: Option<f64>,
    pub tw: Option<f64>,
    pub tf: Option<f64>,
}

impl Section {
    /// Shear area for an I-section, `h_w * t_w`; falls back to `0.6 * A`
    /// per 6.2.6 when web/flange thicknesses are not known.
    pub fn shear_area(&self) -> f64 {
        match (self.tw, self.tf) {
            (Some(tw), Some(tf)) => {
                let hw = (self.h - 2.0 * tf).max(0.0);
                hw * tw
            }
            _ => 0.6 * self.area,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: u64,
    pub e: f64,
    pub nu: f64,
    pub rho: f64,
}

impl Material {
    pub fn new(id: u64, e: f64, nu: f64, rho: f64) -> Self {
        Self { id, e, nu, rho }
    }

    pub fn shear_modulus(&self) -> f64 {
        self.e / (2.0 * (1.0 + self.nu))
    }
}

impl Validate for Material {
    fn validate(&self) -> Result<()> {
        if self.e <= 0.0 {
            return Err(FeaError::InvalidInput("Young's modulus must be positive".into()));
        }
        if self.nu <= -1.0 || self.nu >= 0.5 {
            return Err(FeaError::InvalidInput("Poisson's ratio out of range".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beam {
    pub id: u64,
    pub start_node: u64,
    pub end_node: u64,
    pub material_id: u64,
    pub section: Section,
    pub profile_name: Option<String>,
    pub releases: BeamReleases,
    pub distributed_load: Option<DistributedLoad>,
}

impl Beam {
    pub fn length(&self, start: &Node, end: &Node) -> f64 {
        ((end.x - start.x).powi(2) + (end.y - start.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateTriangle {
    pub id: u64,
    pub nodes: [u64; 3],
    pub material_id: u64,
    pub thickness: f64,
}

impl PlateTriangle {
    /// Twice the signed area, CCW winding required (positive).
    pub fn signed_area_x2(&self, p: &[(f64, f64); 3]) -> f64 {
        (p[1].0 - p[0].0) * (p[2].1 - p[0].1) - (p[2].0 - p[0].0) * (p[1].1 - p[0].1)
    }
}

/// The mesh store. Owns all entities; every other module addresses them by
/// `u64` id. `revision` increments on every mutating call so downstream
/// caches (sampled diagrams, assembled matrices) know when to invalidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    pub nodes: HashMap<u64, Node>,
    pub beams: HashMap<u64, Beam>,
    pub plates: HashMap<u64, PlateTriangle>,
    pub materials: HashMap<u64, Material>,
    next_id: u64,
    revision: u64,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump(&mut self) {
        self.revision += 1;
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn add_node(&mut self, x: f64, y: f64) -> Result<u64> {
        let node = Node::new(0, x, y);
        node.validate()?;
        let id = self.allocate_id();
        self.nodes.insert(id, Node { id, ..node });
        self.bump();
        Ok(id)
    }

    pub fn set_support(&mut self, id: u64, support: Support) -> Result<()> {
        let node = self.nodes.get_mut(&id).ok_or(FeaError::NodeNotFound(id))?;
        node.support = support;
        self.bump();
        Ok(())
    }

    pub fn set_nodal_load(&mut self, id: u64, fx: f64, fy: f64, mz: f64) -> Result<()> {
        let node = self.nodes.get_mut(&id).ok_or(FeaError::NodeNotFound(id))?;
        node.load = Some(NodalLoad { fx, fy, mz });
        self.bump();
        Ok(())
    }

    pub fn add_material(&mut self, e: f64, nu: f64, rho: f64) -> Result<u64> {
        let id = self.allocate_id();
        let material = Material::new(id, e, nu, rho);
        material.validate()?;
        self.materials.insert(id, material);
        self.bump();
        Ok(id)
    }

    pub fn add_beam(
        &mut self,
        start_node: u64,
        end_node: u64,
        material_id: u64,
        section: Section,
    ) -> Result<u64> {
        self.validate_beam_refs(start_node, end_node, material_id)?;
        let start = &self.nodes[&start_node];
        let end = &self.nodes[&end_node];
        let length = ((end.x - start.x).powi(2) + (end.y - start.y).powi(2)).sqrt();
        if length < 1e-9 {
            return Err(FeaError::InvalidInput("beam has zero length".into()));
        }

        let id = self.allocate_id();
        let beam = Beam {
            id,
            start_node,
            end_node,
            material_id,
            section,
            profile_name: None,
            releases: BeamReleases::default(),
            distributed_load: None,
        };
        self.beams.insert(id, beam);
        self.bump();
        Ok(id)
    }

    pub fn update_beam_releases(&mut self, id: u64, releases: BeamReleases) -> Result<()> {
        if releases.is_mechanism() {
            return Err(FeaError::IncompatibleReleases(format!(
                "beam {id}: both moments hinged and both axial DOFs released leaves no internal \
                 force path"
            )));
        }
        let beam = self.beams.get_mut(&id).ok_or(FeaError::BeamNotFound(id))?;
        beam.releases = releases;
        self.bump();
        Ok(())
    }

    pub fn set_distributed_load(&mut self, id: u64, load: Option<DistributedLoad>) -> Result<()> {
        let beam = self.beams.get_mut(&id).ok_or(FeaError::BeamNotFound(id))?;
        beam.distributed_load = load;
        self.bump();
        Ok(())
    }

    pub fn add_plate(
        &mut self,
        n1: u64,
        n2: u64,
        n3: u64,
        material_id: u64,
        thickness: f64,
    ) -> Result<u64> {
        for n in [n1, n2, n3] {
            if !self.nodes.contains_key(&n) {
                return Err(FeaError::NodeNotFound(n));
            }
        }
        if !self.materials.contains_key(&material_id) {
            return Err(FeaError::MaterialNotFound(material_id));
        }
        let p: Vec<(f64, f64)> = [n1, n2, n3].iter().map(|id| self.nodes[id].position()).collect();
        let area_x2 = (p[1].0 - p[0].0) * (p[2].1 - p[0].1) - (p[2].0 - p[0].0) * (p[1].1 - p[0].1);
        if area_x2.abs() < 1e-12 {
            return Err(FeaError::InvalidInput("plate triangle has zero area".into()));
        }

        let id = self.allocate_id();
        self.plates.insert(
            id,
            PlateTriangle {
                id,
                nodes: [n1, n2, n3],
                material_id,
                thickness,
            },
        );
        self.bump();
        Ok(id)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.beams.clear();
        self.plates.clear();
        self.materials.clear();
        self.bump();
    }

    pub fn get_node(&self, id: u64) -> Result<&Node> {
        self.nodes.get(&id).ok_or(FeaError::NodeNotFound(id))
    }

    pub fn get_beam(&self, id: u64) -> Result<&Beam> {
        self.beams.get(&id).ok_or(FeaError::BeamNotFound(id))
    }

    pub fn get_material(&self, id: u64) -> Result<&Material> {
        self.materials.get(&id).ok_or(FeaError::MaterialNotFound(id))
    }

    /// The ascending-sorted node-id sequence; its rank defines every DOF
    /// index downstream. Stable across calls for a given revision.
    pub fn ordered_node_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// DOFs per node: 3 (u, v, θ) once any beam is present, 2 for a pure
    /// truss/membrane-only model (every beam end effectively axial-pinned).
    pub fn dofs_per_node(&self) -> usize {
        if self.beams.is_empty() {
            return 2;
        }
        let all_pinned = self.beams.values().all(|b| {
            b.releases.start_moment == EndRelease::Hinge
                && b.releases.end_moment == EndRelease::Hinge
        });
        if all_pinned {
            2
        } else {
            3
        }
    }

    fn validate_beam_refs(&self, start: u64, end: u64, material_id: u64) -> Result<()> {
        if start == end {
            return Err(FeaError::InvalidInput("beam start and end node must differ".into()));
        }
        self.get_node(start)?;
        self.get_node(end)?;
        self.get_material(material_id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_node_bumps_revision() {
        let mut model = Model::new();
        let r0 = model.revision();
        model.add_node(0.0, 0.0).unwrap();
        assert!(model.revision() > r0);
    }

    #[test]
    fn ordered_node_ids_is_sorted_regardless_of_insertion_order() {
        let mut model = Model::new();
        let a = model.add_node(3.0, 0.0).unwrap();
        let b = model.add_node(1.0, 0.0).unwrap();
        let c = model.add_node(2.0, 0.0).unwrap();
        let ordered = model.ordered_node_ids();
        let mut expected = vec![a, b, c];
        expected.sort_unstable();
        assert_eq!(ordered, expected);
    }

    #[test]
    fn mechanism_releases_rejected() {
        let mut model = Model::new();
        let n1 = model.add_node(0.0, 0.0).unwrap();
        let n2 = model.add_node(1.0, 0.0).unwrap();
        let mat = model.add_material(210e9, 0.3, 7850.0).unwrap();
        let section = Section {
            area: 1e-3,
            iy: 1e-6,
            iz: 1e-6,
            wel_y: 1e-4,
            wel_z: 1e-4,
            wpl_y: 1e-4,
            wpl_z: 1e-4,
            h: 0.2,
            b: None,
            tw: None,
            tf: None,
        };
        let beam = model.add_beam(n1, n2, mat, section).unwrap();
        let bad = BeamReleases {
            start_moment: EndRelease::Hinge,
            end_moment: EndRelease::Hinge,
            start_axial: EndRelease::TensionOnly,
            end_axial: EndRelease::TensionOnly,
        };
        assert!(model.update_beam_releases(beam, bad).is_err());
    }

    #[test]
    fn zero_length_beam_rejected() {
        let mut model = Model::new();
        let n1 = model.add_node(0.0, 0.0).unwrap();
        let n2 = model.add_node(0.0, 0.0).unwrap();
        let mat = model.add_material(210e9, 0.3, 7850.0).unwrap();
        let section = Section {
            area: 1e-3,
            iy: 1e-6,
            iz: 1e-6,
            wel_y: 1e-4,
            wel_z: 1e-4,
            wpl_y: 1e-4,
            wpl_z: 1e-4,
            h: 0.2,
            b: None,
            tw: None,
            tf: None,
        };
        assert!(model.add_beam(n1, n2, mat, section).is_err());
    }
}
