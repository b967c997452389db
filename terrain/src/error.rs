use dem::C;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerrainError {
    #[error("missing or invalid parameter '{0}'")]
    Builder(&'static str),

    #[error("path has zero length")]
    DegenerateLine,

    #[error("only {found} samples resolved, need at least {required}")]
    InsufficientCoverage { found: usize, required: usize },

    #[error("best-fit plane is degenerate (determinant {determinant})")]
    DegenerateFit { determinant: C },

    #[error("fixed elevation method requires an elevation")]
    MissingFixedElevation,

    #[error("unknown base plane method '{0}'")]
    UnknownMethod(String),
}
