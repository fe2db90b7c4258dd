use thiserror::Error;

use crate::fees::FeeError;
use crate::ledger::LedgerError;
use crate::puzzles::PuzzleError;
use crate::store::StoreError;
use crate::types::{Bytes32, PoolState};

/// Failure taxonomy for singleton resolution and absorption.
///
/// `RecordUnavailable` may be transient and carries the last state the walk
/// decoded before losing track of the chain, so cache-holding callers can
/// purge or retry. `InvalidStructure` means the history is untrustworthy and
/// must not be silently accepted.
#[derive(Debug, Error)]
pub enum SingletonError {
    #[error("ledger record unavailable for launcher {}", hex::encode(.launcher_id))]
    RecordUnavailable {
        launcher_id: Bytes32,
        last_state: Option<PoolState>,
    },
    #[error("invalid singleton structure: {0}")]
    InvalidStructure(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Puzzle(#[from] PuzzleError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Fee(#[from] FeeError),
}

pub type SingletonResult<T> = Result<T, SingletonError>;
