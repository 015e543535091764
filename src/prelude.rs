//! Prelude module for convenient imports

pub use crate::config::AnalysisSettings;
pub use crate::error::{FeaError, Result};
pub use crate::loads::{DistributedLoad, LoadCase, LoadCombination, LoadFrame, PointLoad};
pub use crate::model::{Beam, BeamReleases, EndRelease, Material, Model, Node, PlateTriangle, Section, Support};
pub use crate::section::SteelCatalog;
pub use crate::solver::{Solver, StaticSolver};
pub use crate::steel::grades::SteelGrade;
pub use nalgebra as na;
