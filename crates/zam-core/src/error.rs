use thiserror::Error;

/// Upstream data that does not match any known shape.
///
/// Callers decide whether this is fatal: the AN per-item loop records the
/// amendement as errored, a malformed Sénat line aborts the whole run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("could not parse subdivision {0:?}")]
    Subdivision(String),

    #[error("unsupported article range {0:?}")]
    Range(String),

    #[error("cannot parse amendement number {0:?}")]
    AmendementNum(String),

    #[error("could not extract matricule from {0:?}")]
    Matricule(String),

    #[error("invalid date {0:?}")]
    Date(String),

    #[error("{0}")]
    Other(String),
}
