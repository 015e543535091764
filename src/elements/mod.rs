//! Element formulations: local stiffness, local→global transform, and
//! equivalent nodal loads for beams and plate triangles.
//!
//! `ElementStiffness` is kept from the predecessor crate's element layer
//! (the same local/transform/global split, with a default
//! `global_stiffness_matrix` built from the other two), generalized to the
//! two element kinds this engine actually implements.

pub mod beam;
pub mod plate;

use nalgebra::DMatrix;

use crate::error::Result;

pub trait ElementStiffness {
    fn local_stiffness_matrix(&self) -> Result<DMatrix<f64>>;
    fn transformation_matrix(&self) -> Result<DMatrix<f64>>;

    fn global_stiffness_matrix(&self) -> Result<DMatrix<f64>> {
        let k_local = self.local_stiffness_matrix()?;
        let t = self.transformation_matrix()?;
        Ok(t.transpose() * k_local * t)
    }
}
