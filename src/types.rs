use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// 32-byte identifier used for coin ids, puzzle hashes, and challenges.
pub type Bytes32 = [u8; 32];

/// Immutable ledger entity. A coin is fully determined by its parent, its
/// puzzle hash, and its amount; the coin id is derived from those three.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub parent_coin_info: Bytes32,
    pub puzzle_hash: Bytes32,
    pub amount: u64,
}

impl Coin {
    pub fn new(parent_coin_info: Bytes32, puzzle_hash: Bytes32, amount: u64) -> Self {
        Self {
            parent_coin_info,
            puzzle_hash,
            amount,
        }
    }

    /// Derived content identifier: SHA-256 over parent, puzzle hash, and the
    /// canonical minimal encoding of the amount.
    pub fn coin_id(&self) -> Bytes32 {
        let mut hasher = Sha256::new();
        hasher.update(self.parent_coin_info);
        hasher.update(self.puzzle_hash);
        hasher.update(amount_bytes(self.amount));
        hasher.finalize().into()
    }
}

/// Minimal two's-complement big-endian encoding of a coin amount. Zero
/// encodes to the empty string; a leading byte with the high bit set gains a
/// zero prefix so the value stays non-negative.
fn amount_bytes(amount: u64) -> Vec<u8> {
    if amount == 0 {
        return Vec::new();
    }
    let be = amount.to_be_bytes();
    let mut start = 0;
    while start < be.len() - 1 && be[start] == 0 {
        start += 1;
    }
    let mut out = Vec::with_capacity(be.len() - start + 1);
    if be[start] & 0x80 != 0 {
        out.push(0);
    }
    out.extend_from_slice(&be[start..]);
    out
}

/// Queryable envelope around a [`Coin`] as reported by the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinRecord {
    pub coin: Coin,
    pub confirmed_block_index: u32,
    pub spent_block_index: u32,
    pub spent: bool,
    pub coinbase: bool,
}

impl CoinRecord {
    pub fn name(&self) -> Bytes32 {
        self.coin.coin_id()
    }
}

/// Historical event consuming a coin. The puzzle reveal and solution are
/// opaque blobs here; only the puzzle engine interprets them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinSpend {
    pub coin: Coin,
    pub puzzle_reveal: Vec<u8>,
    pub solution: Vec<u8>,
}

/// Membership mode carried by a pool state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolMembership {
    /// The member farms to their own wallet; rewards never route through
    /// the pool.
    SelfPooling,
    /// The member farms to the pool's target puzzle hash.
    FarmingToPool,
}

/// Versioned descriptor of a member's pool configuration. States form a
/// linear history per singleton; a spend may preserve or replace the prior
/// state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    pub version: u8,
    pub membership: PoolMembership,
    pub target_puzzle_hash: Bytes32,
    pub pool_url: Option<String>,
    pub relative_lock_height: u32,
}

/// Immutable identity triple fixed at launch. Together with the current
/// pool state it determines the expected puzzle hash at any point in the
/// singleton's history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingletonIdentity {
    pub launcher_id: Bytes32,
    pub delay_time: u64,
    pub delay_puzzle_hash: Bytes32,
}

/// Cached last-known tip for a member's singleton, avoiding a re-walk from
/// genesis on every resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub identity: SingletonIdentity,
    pub p2_singleton_puzzle_hash: Bytes32,
    pub singleton_tip: CoinSpend,
    pub singleton_tip_state: PoolState,
}

/// Placeholder aggregate for a bundle that has not been signed yet.
pub const EMPTY_AGGREGATE_SIGNATURE: [u8; 96] = [0u8; 96];

/// Ordered spend batch plus an aggregate signature slot, ready for external
/// signing and broadcast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpendBundle {
    pub coin_spends: Vec<CoinSpend>,
    pub aggregated_signature: [u8; 96],
}

impl SpendBundle {
    pub fn unsigned(coin_spends: Vec<CoinSpend>) -> Self {
        Self {
            coin_spends,
            aggregated_signature: EMPTY_AGGREGATE_SIGNATURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_encoding_is_minimal() {
        assert!(amount_bytes(0).is_empty());
        assert_eq!(amount_bytes(1), vec![1]);
        assert_eq!(amount_bytes(0x7f), vec![0x7f]);
        assert_eq!(amount_bytes(0x80), vec![0x00, 0x80]);
        assert_eq!(amount_bytes(0xff), vec![0x00, 0xff]);
        assert_eq!(amount_bytes(0x0100), vec![0x01, 0x00]);
        assert_eq!(
            amount_bytes(u64::MAX),
            vec![0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn coin_id_depends_on_all_fields() {
        let base = Coin::new([1u8; 32], [2u8; 32], 100);
        assert_eq!(base.coin_id(), base.coin_id());
        let other_parent = Coin::new([3u8; 32], [2u8; 32], 100);
        let other_amount = Coin::new([1u8; 32], [2u8; 32], 101);
        assert_ne!(base.coin_id(), other_parent.coin_id());
        assert_ne!(base.coin_id(), other_amount.coin_id());
    }
}
