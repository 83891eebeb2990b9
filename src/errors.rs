use num_dual::linalg::LinAlgError;
use std::fmt;
use std::io;
use thiserror::Error;

/// The solver stage an error originates from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    Equilibrium,
    Throat,
    Exit,
    Temperature,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equilibrium => write!(f, "equilibrium"),
            Self::Throat => write!(f, "throat"),
            Self::Exit => write!(f, "exit"),
            Self::Temperature => write!(f, "temperature"),
        }
    }
}

/// Error type for improperly defined cases and convergence problems.
#[derive(Error, Debug)]
pub enum CeqError {
    #[error("{0}")]
    Error(String),

    // errors related to algorithms
    #[error("the {0} iteration did not converge within the maximum number of iterations")]
    NotConverged(Stage),
    #[error("the number of {0} exceeds the maximum of {1}")]
    CapacityExceeded(&'static str, usize),
    #[error("the iteration matrix is singular and no recovery is possible")]
    Singular,
    #[error("area ratio {0} is not reachable in this nozzle regime")]
    AreaRatioOutOfRange(f64),
    #[error("the chamber state is not an equilibrium")]
    NoEquilibrium,

    // errors related to database handling
    #[error("unknown element symbol `{0}`")]
    UnknownElement(String),
    #[error("invalid record `{0}`: {1}")]
    InvalidRecord(String, String),

    // errors related to file handling
    #[error(transparent)]
    FileIO(#[from] io::Error),

    // json errors
    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    // other errors
    #[error(transparent)]
    LinAlgError(#[from] LinAlgError),
}

/// Convenience type for `Result<T, CeqError>`.
pub type CeqResult<T> = Result<T, CeqError>;
