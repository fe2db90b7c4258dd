use std::collections::HashMap;

use anyhow::Error as AnyError;
use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use crate::types::{Bytes32, CoinRecord, CoinSpend};

/// Failures surfaced by the ledger query port. Transport covers networking
/// errors, RPC timeouts, and any other condition where the ledger could not
/// be asked; a missing entity is an `Ok(None)`, not an error.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger transport error: {0}")]
    Transport(#[from] AnyError),
}

impl LedgerError {
    pub fn transport(error: impl Into<AnyError>) -> Self {
        Self::Transport(error.into())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Read-only view of the remote ledger consumed by the tracker.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Fetches the record for a coin by its derived id.
    async fn get_coin_record_by_name(&self, name: &Bytes32) -> LedgerResult<Option<CoinRecord>>;

    /// Fetches the puzzle reveal and solution that spent a coin at the given
    /// height.
    async fn get_puzzle_and_solution(
        &self,
        coin_id: &Bytes32,
        spent_height: u32,
    ) -> LedgerResult<Option<CoinSpend>>;

    /// Lists coin records owned by any of the given puzzle hashes within the
    /// inclusive height range.
    async fn get_coin_records_by_puzzle_hashes(
        &self,
        puzzle_hashes: &[Bytes32],
        include_spent: bool,
        start_height: u32,
        end_height: u32,
    ) -> LedgerResult<Vec<CoinRecord>>;
}

#[derive(Default)]
struct MemoryLedgerInner {
    records: HashMap<Bytes32, CoinRecord>,
    spends: HashMap<Bytes32, CoinSpend>,
}

/// In-memory ledger used in tests and local development harnesses.
#[derive(Default)]
pub struct MemoryLedger {
    inner: RwLock<MemoryLedgerInner>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, record: CoinRecord) -> Self {
        self.insert_record(record);
        self
    }

    pub fn with_spend(self, spend: CoinSpend) -> Self {
        self.insert_spend(spend);
        self
    }

    pub fn insert_record(&self, record: CoinRecord) {
        self.inner.write().records.insert(record.name(), record);
    }

    pub fn insert_spend(&self, spend: CoinSpend) {
        self.inner.write().spends.insert(spend.coin.coin_id(), spend);
    }

    /// Drops a record, simulating an entity the ledger can no longer serve.
    pub fn remove_record(&self, name: &Bytes32) {
        self.inner.write().records.remove(name);
    }
}

#[async_trait]
impl LedgerClient for MemoryLedger {
    async fn get_coin_record_by_name(&self, name: &Bytes32) -> LedgerResult<Option<CoinRecord>> {
        Ok(self.inner.read().records.get(name).copied())
    }

    async fn get_puzzle_and_solution(
        &self,
        coin_id: &Bytes32,
        _spent_height: u32,
    ) -> LedgerResult<Option<CoinSpend>> {
        let inner = self.inner.read();
        match inner.records.get(coin_id) {
            Some(record) if record.spent => Ok(inner.spends.get(coin_id).cloned()),
            _ => Ok(None),
        }
    }

    async fn get_coin_records_by_puzzle_hashes(
        &self,
        puzzle_hashes: &[Bytes32],
        include_spent: bool,
        start_height: u32,
        end_height: u32,
    ) -> LedgerResult<Vec<CoinRecord>> {
        let inner = self.inner.read();
        let mut records: Vec<CoinRecord> = inner
            .records
            .values()
            .filter(|record| puzzle_hashes.contains(&record.coin.puzzle_hash))
            .filter(|record| include_spent || !record.spent)
            .filter(|record| {
                record.confirmed_block_index >= start_height
                    && record.confirmed_block_index <= end_height
            })
            .copied()
            .collect();
        records.sort_by_key(|record| record.confirmed_block_index);
        Ok(records)
    }
}
