//! Top-level error type for the harness.

use thiserror::Error;

use crate::adapter::AdapterError;
use crate::corpus::CorpusError;
use crate::outcome::codec::DecodeError;

/// Any error a conformance run can raise.
///
/// Whether an error is fatal depends on where it occurs: during setup or
/// corpus scanning it aborts the run (exit code 2); inside a worker it is
/// converted into a failed comparison for that single test case.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Corpus(#[from] CorpusError),
}
