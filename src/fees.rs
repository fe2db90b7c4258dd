use anyhow::Error as AnyError;
use async_trait::async_trait;
use thiserror::Error;

use crate::types::{CoinSpend, SpendBundle};

#[derive(Debug, Error)]
pub enum FeeError {
    #[error("fee builder error: {0}")]
    Build(#[from] AnyError),
}

pub type FeeResult<T> = Result<T, FeeError>;

/// Optional collaborator that wraps an accumulated spend batch into a
/// transaction paying a fee from external funds.
#[async_trait]
pub trait FeeBuilder: Send + Sync {
    async fn spend_with_fee(&self, spends: Vec<CoinSpend>) -> FeeResult<SpendBundle>;
}

/// Fee builder for tests: wraps the batch unchanged but stamps a marker
/// signature so callers can tell the fee path ran.
#[derive(Clone, Copy, Debug, Default)]
pub struct StubFeeBuilder;

impl StubFeeBuilder {
    pub const MARKER_SIGNATURE: [u8; 96] = [0xfe; 96];
}

#[async_trait]
impl FeeBuilder for StubFeeBuilder {
    async fn spend_with_fee(&self, spends: Vec<CoinSpend>) -> FeeResult<SpendBundle> {
        Ok(SpendBundle {
            coin_spends: spends,
            aggregated_signature: Self::MARKER_SIGNATURE,
        })
    }
}
