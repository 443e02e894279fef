use thiserror::Error;

/// Errors raised while building, validating or driving a packed reaction buffer.
///
/// Numeric trouble (NaN rate constants, division by a zero concentration) is not
/// represented here: it propagates into the solver outputs and is left to the
/// solver's own error control.
#[derive(Debug, Error)]
pub enum RxnError {
    #[error("unknown reaction kind tag {tag} at int offset {offset}")]
    UnknownKind { tag: usize, offset: usize },
    #[error("malformed reaction record at int offset {offset}: {reason}")]
    MalformedRecord { offset: usize, reason: String },
    #[error("reaction must have at least one reactant")]
    NoReactants,
    #[error("species index {index} out of range for {n_species} species")]
    SpeciesOutOfRange { index: usize, n_species: usize },
    #[error("{n_prod} products but {n_yields} yields")]
    YieldCountMismatch { n_prod: usize, n_yields: usize },
    #[error("invalid rate parameters: {0}")]
    InvalidParameters(String),
    #[error("{what} has size {found}, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: String,
        found: String,
    },
    #[error("no reaction record {index}, buffer holds {n_rxn}")]
    NoSuchRecord { index: usize, n_rxn: usize },
    #[error("reaction buffer is not ready: {0}")]
    NotReady(&'static str),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("logger initialisation failed: {0}")]
    Logger(#[from] log::SetLoggerError),
}
