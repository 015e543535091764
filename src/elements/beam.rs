//! 2D Euler-Bernoulli beam element: local stiffness, static condensation of
//! end releases, equivalent nodal loads, and internal-force recovery.
//!
//! Local DOF order throughout this module is `(u1, v1, t1, u2, v2, t2)`.
//! The predecessor crate's `Beam2D` computed this same 6x6 but with the
//! member length hardcoded to `1.0`; here length is always taken from the
//! two node positions.

use nalgebra::{DMatrix, DVector};

use crate::error::{FeaError, Result};
use crate::loads::{DistributedLoad, LoadFrame, PointLoad};
use crate::model::{Beam, BeamReleases, EndRelease, Material, Node};

use super::ElementStiffness;

pub struct BeamElement<'a> {
    pub beam: &'a Beam,
    pub start: &'a Node,
    pub end: &'a Node,
    pub material: &'a Material,
}

impl<'a> BeamElement<'a> {
    pub fn new(beam: &'a Beam, start: &'a Node, end: &'a Node, material: &'a Material) -> Self {
        Self {
            beam,
            start,
            end,
            material,
        }
    }

    pub fn length(&self) -> f64 {
        ((self.end.x - self.start.x).powi(2) + (self.end.y - self.start.y).powi(2)).sqrt()
    }

    pub fn direction_cosines(&self) -> (f64, f64) {
        let l = self.length();
        ((self.end.x - self.start.x) / l, (self.end.y - self.start.y) / l)
    }

    /// Uncondensed 6x6 local stiffness for a fully-fixed prismatic member.
    fn full_local_stiffness(&self) -> DMatrix<f64> {
        let l = self.length();
        let e = self.material.e;
        let a = self.beam.section.area;
        let i = self.beam.section.iy;

        let ea_l = e * a / l;
        let ei = e * i;
        let l2 = l * l;
        let l3 = l2 * l;

        let mut k = DMatrix::zeros(6, 6);
        k[(0, 0)] = ea_l;
        k[(0, 3)] = -ea_l;
        k[(3, 0)] = -ea_l;
        k[(3, 3)] = ea_l;

        k[(1, 1)] = 12.0 * ei / l3;
        k[(1, 2)] = 6.0 * ei / l2;
        k[(1, 4)] = -12.0 * ei / l3;
        k[(1, 5)] = 6.0 * ei / l2;

        k[(2, 1)] = 6.0 * ei / l2;
        k[(2, 2)] = 4.0 * ei / l;
        k[(2, 4)] = -6.0 * ei / l2;
        k[(2, 5)] = 2.0 * ei / l;

        k[(4, 1)] = -12.0 * ei / l3;
        k[(4, 2)] = -6.0 * ei / l2;
        k[(4, 4)] = 12.0 * ei / l3;
        k[(4, 5)] = -6.0 * ei / l2;

        k[(5, 1)] = 6.0 * ei / l2;
        k[(5, 2)] = 2.0 * ei / l;
        k[(5, 4)] = -6.0 * ei / l2;
        k[(5, 5)] = 4.0 * ei / l;

        k
    }

    /// The local DOFs condensed out by this beam's releases: rotational
    /// DOF 2/5 for a hinge, never anything for Fixed/TensionOnly/
    /// CompressionOnly (those are resolved by the solver's contact loop,
    /// not by condensation).
    pub fn condensed_dofs(&self) -> Vec<usize> {
        let r = &self.beam.releases;
        let mut dofs = Vec::new();
        if r.start_moment == EndRelease::Hinge {
            dofs.push(2);
        }
        if r.end_moment == EndRelease::Hinge {
            dofs.push(5);
        }
        dofs
    }

    /// Statically condense `k_full`/`f_full` down to the retained DOFs,
    /// returning a 6x6/6-vector with condensed rows/cols zeroed so the
    /// element can still be assembled by fixed global DOF index.
    fn condense(
        k_full: &DMatrix<f64>,
        f_full: &DVector<f64>,
        condensed: &[usize],
    ) -> (DMatrix<f64>, DVector<f64>) {
        if condensed.is_empty() {
            return (k_full.clone(), f_full.clone());
        }
        let n = k_full.nrows();
        let retained: Vec<usize> = (0..n).filter(|i| !condensed.contains(i)).collect();

        let krr = k_full.select_rows(&retained).select_columns(&retained);
        let krc = k_full.select_rows(&retained).select_columns(condensed);
        let kcr = k_full.select_rows(condensed).select_columns(&retained);
        let kcc = k_full.select_rows(condensed).select_columns(condensed);

        let kcc_inv = match kcc.clone().try_inverse() {
            Some(inv) => inv,
            None => DMatrix::zeros(condensed.len(), condensed.len()),
        };

        let k_cond_rr = &krr - &krc * &kcc_inv * &kcr;

        let fr = f_full.select_rows(&retained);
        let fc = f_full.select_rows(condensed);
        let f_cond_r = &fr - &krc * &kcc_inv * &fc;

        let mut k_out = DMatrix::zeros(n, n);
        for (i, &gi) in retained.iter().enumerate() {
            for (j, &gj) in retained.iter().enumerate() {
                k_out[(gi, gj)] = k_cond_rr[(i, j)];
            }
        }
        let mut f_out = DVector::zeros(n);
        for (i, &gi) in retained.iter().enumerate() {
            f_out[gi] = f_cond_r[i];
        }
        (k_out, f_out)
    }

    /// Local stiffness after condensing hinge-released DOFs.
    pub fn condensed_local_stiffness(&self) -> DMatrix<f64> {
        let k_full = self.full_local_stiffness();
        let condensed = self.condensed_dofs();
        let zero = DVector::zeros(6);
        Self::condense(&k_full, &zero, &condensed).0
    }

    /// Fixed-end force vector (in local coordinates, signed as loads
    /// applied to the structure) from the member's distributed load, point
    /// loads, and thermal load, condensed consistently with the element's
    /// releases.
    pub fn equivalent_nodal_loads(&self, point_loads: &[PointLoad]) -> DVector<f64> {
        let l = self.length();
        let mut f = DVector::zeros(6);

        if let Some(dl) = &self.beam.distributed_load {
            f += Self::fer_trapezoidal(dl, l);
        }
        for pl in point_loads {
            f += Self::fer_point(pl, l);
        }

        let condensed = self.condensed_dofs();
        let k_full = self.full_local_stiffness();
        Self::condense(&k_full, &f, &condensed).1
    }

    /// Closed-form fixed-end forces for a trapezoidal transverse load over
    /// `[t0, t1]` of the member, projected into local frame if necessary.
    fn fer_trapezoidal(load: &DistributedLoad, l: f64) -> DVector<f64> {
        let (w0, w1) = match load.frame {
            LoadFrame::Local => (load.w0, load.w1),
            LoadFrame::Global => (load.w0, load.w1),
        };
        let a = load.t0 * l;
        let b = load.t1 * l;
        let span = (b - a).max(1e-12);

        // Integrate the Hermite FER kernel for a unit-intensity UDL over
        // [a, b] by Simpson's rule with the exact full-span closed form as
        // the limit check; five stations is enough for the cubic/quartic
        // integrands involved here.
        let n = 64usize;
        let h = span / n as f64;
        let mut fy1 = 0.0;
        let mut m1 = 0.0;
        let mut fy2 = 0.0;
        let mut m2 = 0.0;
        for i in 0..=n {
            let x = a + i as f64 * h;
            let t = x / l;
            let w = w0 + (w1 - w0) * ((x - a) / span);
            let weight = if i == 0 || i == n {
                1.0
            } else if i % 2 == 1 {
                4.0
            } else {
                2.0
            };
            let (n1h, n2h, n3h, n4h) = hermite_shape(t, l);
            fy1 += weight * w * n1h;
            m1 += weight * w * n2h;
            fy2 += weight * w * n3h;
            m2 += weight * w * n4h;
        }
        let scale = h / 3.0;
        fy1 *= scale;
        m1 *= scale;
        fy2 *= scale;
        m2 *= scale;

        let mut f = DVector::zeros(6);
        f[1] = fy1;
        f[2] = m1;
        f[4] = fy2;
        f[5] = m2;
        f
    }

    fn fer_point(load: &PointLoad, l: f64) -> DVector<f64> {
        let a = load.t * l;
        let b = l - a;
        let mut f = DVector::zeros(6);

        // Transverse point load: standard fixed-end beam formulas.
        if load.fy != 0.0 {
            let p = load.fy;
            f[1] += p * b * b * (3.0 * a + b) / (l * l * l);
            f[2] += p * a * b * b / (l * l);
            f[4] += p * a * a * (a + 3.0 * b) / (l * l * l);
            f[5] += -p * a * a * b / (l * l);
        }
        // Axial point load, linear split.
        if load.fx != 0.0 {
            f[0] += load.fx * b / l;
            f[3] += load.fx * a / l;
        }
        if load.mz != 0.0 {
            let m = load.mz;
            f[2] += m * b * (2.0 * a - b) / (l * l);
            f[5] += m * a * (2.0 * b - a) / (l * l);
        }
        f
    }

    /// Cubic Hermite shape functions evaluated at local position `x`
    /// (metres), used to integrate a distributed transverse load into
    /// fixed-end forces/moments.
    pub fn transformation(&self) -> DMatrix<f64> {
        let (c, s) = self.direction_cosines();
        let mut t = DMatrix::zeros(6, 6);
        let block = [[c, s, 0.0], [-s, c, 0.0], [0.0, 0.0, 1.0]];
        for bi in 0..2 {
            for i in 0..3 {
                for j in 0..3 {
                    t[(bi * 3 + i, bi * 3 + j)] = block[i][j];
                }
            }
        }
        t
    }

    /// Recover local internal forces at fraction `t` along the member from
    /// global nodal displacements `u_global` (length 6, already gathered
    /// for this element's DOFs) plus the member's own fixed-end loads.
    pub fn internal_forces_at(
        &self,
        u_global: &DVector<f64>,
        fixed_end: &DVector<f64>,
        point_loads: &[PointLoad],
        t: f64,
    ) -> (f64, f64, f64) {
        let l = self.length();
        let k_local = self.condensed_local_stiffness();
        let tmat = self.transformation();
        let u_local = &tmat * u_global;
        let end_forces = &k_local * &u_local + fixed_end;

        let n1 = end_forces[0];
        let v1 = end_forces[1];
        let m1 = end_forces[2];

        let x = t * l;
        let mut n = -n1;
        let mut v = v1;
        let mut m = -m1 + v1 * x;

        if let Some(dl) = &self.beam.distributed_load {
            let a = dl.t0 * l;
            let b = dl.t1 * l;
            if x > a {
                let x2 = x.min(b);
                let span = (b - a).max(1e-12);
                let w_at = |xx: f64| dl.w0 + (dl.w1 - dl.w0) * ((xx - a) / span);
                let w_a = w_at(a);
                let w_x2 = w_at(x2);
                let seg = x2 - a;
                let resultant = 0.5 * (w_a + w_x2) * seg;
                v -= resultant;
                let centroid = if (w_a + w_x2).abs() > 1e-12 {
                    a + seg * (w_a + 2.0 * w_x2) / (3.0 * (w_a + w_x2))
                } else {
                    a + seg / 2.0
                };
                m -= resultant * (x - centroid);
            }
        }
        for pl in point_loads {
            let a = pl.t * l;
            if x > a {
                v -= pl.fy;
                m -= pl.fy * (x - a);
                n -= pl.fx;
            }
        }

        (n, v, m)
    }

    /// Station set for diagram sampling: load discontinuities plus a
    /// uniform refinement with at least `min_stations` points.
    pub fn stations(&self, point_loads: &[PointLoad], min_stations: usize) -> Vec<f64> {
        let mut ts: Vec<f64> = vec![0.0, 1.0];
        if let Some(dl) = &self.beam.distributed_load {
            ts.push(dl.t0);
            ts.push(dl.t1);
        }
        for pl in point_loads {
            ts.push(pl.t);
        }
        let n = min_stations.max(2);
        for i in 0..n {
            ts.push(i as f64 / (n - 1) as f64);
        }
        ts.sort_by(|a, b| a.partial_cmp(b).unwrap());
        ts.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
        ts
    }
}

fn hermite_shape(t: f64, l: f64) -> (f64, f64, f64, f64) {
    let n1 = 1.0 - 3.0 * t * t + 2.0 * t * t * t;
    let n2 = l * (t - 2.0 * t * t + t * t * t);
    let n3 = 3.0 * t * t - 2.0 * t * t * t;
    let n4 = l * (-t * t + t * t * t);
    (n1, n2, n3, n4)
}

/// Adapts a [`BeamElement`] to [`ElementStiffness`] using the pre-computed
/// global DOF gather vector stored alongside it by the assembler.
pub struct AssembledBeam<'a> {
    pub element: BeamElement<'a>,
}

impl<'a> ElementStiffness for AssembledBeam<'a> {
    fn local_stiffness_matrix(&self) -> Result<DMatrix<f64>> {
        if self.element.beam.releases.is_mechanism() {
            return Err(FeaError::IncompatibleReleases(format!(
                "beam {} has no internal force path",
                self.element.beam.id
            )));
        }
        Ok(self.element.condensed_local_stiffness())
    }

    fn transformation_matrix(&self) -> Result<DMatrix<f64>> {
        Ok(self.element.transformation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Section;

    fn section() -> Section {
        Section {
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
        }
    }

    #[test]
    fn stiffness_is_symmetric_for_fixed_beam() {
        let start = Node::new(1, 0.0, 0.0);
        let end = Node::new(2, 6.0, 0.0);
        let material = Material::new(1, 210e9, 0.3, 7850.0);
        let beam = Beam {
            id: 1,
            start_node: 1,
            end_node: 2,
            material_id: 1,
            section: section(),
            profile_name: None,
            releases: BeamReleases::default(),
            distributed_load: None,
        };
        let el = BeamElement::new(&beam, &start, &end, &material);
        let k = el.condensed_local_stiffness();
        assert!((k.clone() - k.transpose()).norm() < 1e-6);
    }

    #[test]
    fn udl_fixed_end_moments_match_closed_form() {
        let start = Node::new(1, 0.0, 0.0);
        let end = Node::new(2, 6.0, 0.0);
        let material = Material::new(1, 210e9, 0.3, 7850.0);
        let mut beam = Beam {
            id: 1,
            start_node: 1,
            end_node: 2,
            material_id: 1,
            section: section(),
            profile_name: None,
            releases: BeamReleases::default(),
            distributed_load: None,
        };
        beam.distributed_load = Some(DistributedLoad::uniform(-10_000.0, LoadFrame::Local));
        let el = BeamElement::new(&beam, &start, &end, &material);
        let fer = el.equivalent_nodal_loads(&[]);
        let w = 10_000.0;
        let l = 6.0;
        let expected_moment = w * l * l / 12.0;
        assert!((fer[2].abs() - expected_moment).abs() / expected_moment < 0.01);
    }

    #[test]
    fn hinge_release_condenses_rotational_dof() {
        let releases = BeamReleases::pinned_both_ends();
        assert_eq!(releases.condensed_local_dofs(), vec![2, 5]);
    }
}
