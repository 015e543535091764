//! # eurostatic
//!
//! A 2D structural finite-element engine for frame/truss/plate analysis to
//! Eurocode (NEN-EN 1993-1-1 / 1993-1-8). Given a planar mesh of nodes,
//! Euler-Bernoulli beam elements and Kirchhoff (DKT) plate elements, with
//! user-defined load cases and combinations, the engine assembles the
//! global stiffness system, solves for displacements, recovers member
//! internal forces along each beam, and performs cross-section and
//! connection verifications.
//!
//! ## Example
//!
//! ```rust
//! use eurostatic::prelude::*;
//!
//! let mut model = Model::new();
//! let n1 = model.add_node(0.0, 0.0).unwrap();
//! let n2 = model.add_node(6.0, 0.0).unwrap();
//! model.set_support(n1, Support::pinned()).unwrap();
//! model.set_support(n2, Support::roller_y()).unwrap();
//! ```

pub mod assembly;
pub mod config;
pub mod elements;
pub mod error;
pub mod linalg;
pub mod loads;
pub mod model;
pub mod persistence;
pub mod prelude;
pub mod results;
pub mod section;
pub mod solver;
pub mod steel;

pub use error::{FeaError, Result};
pub use model::Model;

pub use nalgebra as na;
