//! Error types for the analysis engine

use thiserror::Error;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum FeaError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("node {0} not found")]
    NodeNotFound(u64),

    #[error("beam {0} not found")]
    BeamNotFound(u64),

    #[error("plate {0} not found")]
    PlateNotFound(u64),

    #[error("material {0} not found")]
    MaterialNotFound(u64),

    #[error("load case {0} not found")]
    LoadCaseNotFound(u64),

    #[error("mechanism detected: pivot vanished at DOF rank {0}")]
    MechanismDetected(usize),

    #[error("incompatible end releases: {0}")]
    IncompatibleReleases(String),

    #[error("unknown steel profile: {0}")]
    CatalogMiss(String),

    #[error("tension/compression-only contact iteration did not converge after {0} iterations")]
    ContactNonconvergent(usize),

    #[error("numerical warning: {0}")]
    NumericalWarning(String),

    #[error("matrix error: {0}")]
    Matrix(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, FeaError>;

/// Validation trait for domain objects, checked on mutation and before solve.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}
