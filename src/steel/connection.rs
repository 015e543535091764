//! Bolted end-plate moment connection design via the component method,
//! NEN-EN 1993-1-8.
//!
//! `tension_demand_per_row` resolves open question (a) of this engine's
//! design notes by deriving `F_t,Ed,i` from first principles rather than
//! reproducing the reference tool's unit-inflated `sumH2 * 1000` /
//! `M_Ed * 1e6` pattern: `M_Ed` stays in N*m and `h_r` in m throughout, so
//! the result is in N without any scale correction.

use serde::{Deserialize, Serialize};

use crate::config::PartialFactors;
use crate::steel::grades::SteelGrade;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoltRow {
    /// Distance from the centre of compression, m.
    pub h_r: f64,
    pub f_t_rd_bolt: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TStubGeometry {
    pub m: f64,
    pub n: f64,
    pub ell_eff_circular: f64,
    pub ell_eff_noncircular: f64,
    pub pitch: f64,
    pub t_f: f64,
    pub f_y: f64,
}

impl TStubGeometry {
    pub fn effective_length(&self) -> f64 {
        self.ell_eff_circular.min(self.ell_eff_noncircular).min(self.pitch)
    }

    pub fn plastic_moment_resistance(&self, factors: &PartialFactors) -> f64 {
        0.25 * self.effective_length() * self.t_f.powi(2) * self.f_y / factors.gamma_m0
    }
}

/// T-stub resistance per row: `min(F_T1, F_T2, F_T3)`.
pub fn t_stub_resistance(geometry: &TStubGeometry, sum_f_t_rd: f64, factors: &PartialFactors) -> f64 {
    let m_pl = geometry.plastic_moment_resistance(factors);
    let n = geometry.n.min(1.25 * geometry.m);

    let f_t1 = 4.0 * m_pl / geometry.m;
    let f_t2 = (2.0 * m_pl + n * sum_f_t_rd) / (geometry.m + n);
    let f_t3 = sum_f_t_rd;

    f_t1.min(f_t2).min(f_t3)
}

/// Column web panel shear, 6.2.6.1: `V_wp,Rd = 0.9 f_y A_vc / (sqrt(3) gamma_M0)`.
pub fn column_web_panel_shear(a_vc: f64, grade: SteelGrade, factors: &PartialFactors) -> f64 {
    0.9 * grade.fy() * a_vc / (3f64.sqrt() * factors.gamma_m0)
}

/// Column web in tension, 6.2.6.3: `F_t,wc,Rd = omega b_eff t_w f_y / gamma_M0`,
/// `omega = 1 / sqrt(1 + 1.3 (b_eff t_w / A_vc)^2)`.
pub fn column_web_tension(
    b_eff: f64,
    t_w: f64,
    a_vc: f64,
    grade: SteelGrade,
    factors: &PartialFactors,
) -> f64 {
    let ratio = b_eff * t_w / a_vc;
    let omega = 1.0 / (1.0 + 1.3 * ratio * ratio).sqrt();
    omega * b_eff * t_w * grade.fy() / factors.gamma_m0
}

/// `F_t,Ed,i = M_Ed * h_r,i / sum(h_r,j^2)`, SI units throughout.
pub fn tension_demand_per_row(m_ed: f64, rows: &[BoltRow]) -> Vec<f64> {
    let sum_h2: f64 = rows.iter().map(|r| r.h_r * r.h_r).sum();
    if sum_h2 <= 0.0 {
        return vec![0.0; rows.len()];
    }
    rows.iter().map(|r| m_ed * r.h_r / sum_h2).collect()
}

/// Moment resistance, 6.2.7.2: iterate bolt rows from the top (assumed
/// pre-sorted by descending `h_r`), `F_tr = min(F_tr,Rd, C_Rd - sum_above)`.
pub fn moment_resistance(rows_top_down: &[(f64, f64)], column_resistance: f64) -> f64 {
    let mut consumed = 0.0;
    let mut m_jrd = 0.0;
    for &(h_r, f_tr_rd) in rows_top_down {
        let available = (column_resistance - consumed).max(0.0);
        let f_tr = f_tr_rd.min(available);
        m_jrd += f_tr * h_r;
        consumed += f_tr;
    }
    m_jrd
}

/// Rotational stiffness, 6.3.1: `S_j,ini = E z^2 / sum(1/k_i)`.
pub fn initial_rotational_stiffness(e: f64, z: f64, component_stiffnesses: &[f64]) -> f64 {
    let sum_inv: f64 = component_stiffnesses.iter().map(|k| 1.0 / k).sum();
    if sum_inv <= 0.0 {
        return f64::INFINITY;
    }
    e * z * z / sum_inv
}

/// Secant stiffness factor eta: 1 for mu <= 2/3, `(1.5 mu)^psi` otherwise,
/// psi = 2.7 for bolted end-plates.
pub fn secant_stiffness_factor(m_ed: f64, m_j_rd: f64) -> f64 {
    let mu = m_ed / m_j_rd;
    if mu <= 2.0 / 3.0 {
        1.0
    } else {
        (1.5 * mu).powf(2.7)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JointClassification {
    Rigid,
    SemiRigid,
    Pinned,
}

/// Classification, 5.2.2: compare `S_j,ini` against `25 E I_b / L_b`
/// (rigid bound) and `0.5 E I_b / L_b` (pinned bound).
pub fn classify_joint(s_j_ini: f64, e: f64, i_b: f64, l_b: f64) -> JointClassification {
    let rigid_bound = 25.0 * e * i_b / l_b;
    let pinned_bound = 0.5 * e * i_b / l_b;
    if s_j_ini >= rigid_bound {
        JointClassification::Rigid
    } else if s_j_ini <= pinned_bound {
        JointClassification::Pinned
    } else {
        JointClassification::SemiRigid
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionResult {
    pub m_j_rd: f64,
    pub s_j_ini: f64,
    pub classification: JointClassification,
    pub governing_row_demands: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tension_demand_distributes_proportionally_to_lever_arm() {
        let rows = vec![
            BoltRow { h_r: 0.3, f_t_rd_bolt: 100e3 },
            BoltRow { h_r: 0.1, f_t_rd_bolt: 100e3 },
        ];
        let demands = tension_demand_per_row(50_000.0, &rows);
        assert!(demands[0] > demands[1]);
    }

    #[test]
    fn tension_demand_is_not_unit_inflated() {
        // Per open question (a): result must be in N, not inflated by 1e3.
        let rows = vec![BoltRow { h_r: 0.2, f_t_rd_bolt: 100e3 }];
        let demands = tension_demand_per_row(20_000.0, &rows);
        let expected = 20_000.0 * 0.2 / (0.2 * 0.2);
        assert!((demands[0] - expected).abs() / expected < 1e-9);
    }

    #[test]
    fn classification_rigid_bound() {
        let e = 210e9;
        let i_b = 1.943e-5;
        let l_b = 6.0;
        let rigid_bound = 25.0 * e * i_b / l_b;
        assert_eq!(classify_joint(rigid_bound * 2.0, e, i_b, l_b), JointClassification::Rigid);
    }
}
