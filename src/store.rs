use std::collections::HashMap;

use anyhow::Error as AnyError;
use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use crate::types::{Bytes32, ParticipantRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("participant store error: {0}")]
    Backend(#[from] AnyError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Keyed lookup over cached participant records, consumed as an external
/// collaborator. Persistence lives with the embedding application.
#[async_trait]
pub trait ParticipantStore: Send + Sync {
    /// Returns the participants whose pay-to-singleton puzzle hash matches
    /// any of the given hashes.
    async fn participants_for_puzzle_hashes(
        &self,
        puzzle_hashes: &[Bytes32],
    ) -> StoreResult<Vec<ParticipantRecord>>;
}

/// In-memory participant store used in tests and local harnesses.
#[derive(Default)]
pub struct MemoryParticipantStore {
    participants: RwLock<HashMap<Bytes32, ParticipantRecord>>,
}

impl MemoryParticipantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_participant(self, record: ParticipantRecord) -> Self {
        self.insert(record);
        self
    }

    /// Inserts or replaces a participant, keyed by its pay-to-singleton
    /// puzzle hash.
    pub fn insert(&self, record: ParticipantRecord) {
        self.participants
            .write()
            .insert(record.p2_singleton_puzzle_hash, record);
    }
}

#[async_trait]
impl ParticipantStore for MemoryParticipantStore {
    async fn participants_for_puzzle_hashes(
        &self,
        puzzle_hashes: &[Bytes32],
    ) -> StoreResult<Vec<ParticipantRecord>> {
        let participants = self.participants.read();
        Ok(puzzle_hashes
            .iter()
            .filter_map(|hash| participants.get(hash).cloned())
            .collect())
    }
}
