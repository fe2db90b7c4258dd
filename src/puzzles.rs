use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::rewards::pool_parent_id;
use crate::types::{Bytes32, Coin, CoinSpend, PoolState, SingletonIdentity};

/// Raised when a spend cannot be interpreted by the puzzle engine. A
/// malformed historical record must surface here rather than panic, so a
/// batch operation spanning many singletons can skip the broken one.
#[derive(Debug, Error)]
#[error("puzzle engine error: {0}")]
pub struct PuzzleError(pub String);

impl PuzzleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Cryptographic puzzle construction and decoding, consumed as an external
/// collaborator. Implementations wrap the actual puzzle/program library;
/// this crate only chains their outputs.
pub trait PuzzleEngine: Send + Sync {
    /// Derives the inner puzzle hash committing to a pool state under the
    /// given identity.
    fn inner_puzzle_hash(
        &self,
        state: &PoolState,
        identity: &SingletonIdentity,
        genesis_challenge: &Bytes32,
    ) -> Result<Bytes32, PuzzleError>;

    /// Wraps an inner puzzle hash into the full singleton puzzle hash for a
    /// launcher.
    fn full_puzzle_hash(
        &self,
        inner_puzzle_hash: &Bytes32,
        launcher_id: &Bytes32,
    ) -> Result<Bytes32, PuzzleError>;

    /// Decodes the pool state carried by a spend's solution, if any. Spends
    /// made purely to absorb rewards carry no state.
    fn solution_to_pool_state(&self, spend: &CoinSpend) -> Result<Option<PoolState>, PuzzleError>;

    /// Decodes the successor singleton coin produced by a spend. `None`
    /// means the spend did not recreate the singleton and the history is
    /// malformed.
    fn most_recent_singleton_coin(&self, spend: &CoinSpend) -> Result<Option<Coin>, PuzzleError>;

    /// Extracts the time-delay parameters committed by the launch spend.
    fn delayed_puzzle_info(&self, launcher_spend: &CoinSpend) -> Result<(u64, Bytes32), PuzzleError>;

    /// Builds the chained spends that advance the singleton tip and claim
    /// the reward farmed at `reward_height`. The first spend of the batch is
    /// the singleton spend; its successor is the new tip.
    #[allow(clippy::too_many_arguments)]
    fn create_absorb_spend(
        &self,
        last_spend: &CoinSpend,
        state: &PoolState,
        launcher_coin: &Coin,
        reward_height: u32,
        genesis_challenge: &Bytes32,
        delay_time: u64,
        delay_puzzle_hash: &Bytes32,
    ) -> Result<Vec<CoinSpend>, PuzzleError>;
}

/// Payload format understood by [`StubPuzzleEngine`]. Real solutions are
/// CLVM programs; the stub stores the decoded facts directly.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct StubSolution {
    successor: Option<Coin>,
    state: Option<PoolState>,
    delay: Option<(u64, Bytes32)>,
}

/// Deterministic puzzle engine for tests and local harnesses. Spends encode
/// their decoded form as JSON in the solution blob, and puzzle hashes are
/// SHA-256 commitments over the state and identity, so tip validation
/// behaves exactly like the production engine without any CLVM.
#[derive(Clone, Copy, Debug, Default)]
pub struct StubPuzzleEngine;

impl StubPuzzleEngine {
    pub fn new() -> Self {
        Self
    }

    /// Encodes a spend of `coin` that produces `successor` and optionally
    /// rewrites the pool state.
    pub fn encode_spend(coin: Coin, successor: Option<Coin>, state: Option<PoolState>) -> CoinSpend {
        Self::encode(coin, successor, state, None)
    }

    /// Encodes a launch spend carrying the delay parameters alongside the
    /// initial state.
    pub fn encode_launcher_spend(
        coin: Coin,
        successor: Coin,
        state: PoolState,
        delay_time: u64,
        delay_puzzle_hash: Bytes32,
    ) -> CoinSpend {
        Self::encode(
            coin,
            Some(successor),
            Some(state),
            Some((delay_time, delay_puzzle_hash)),
        )
    }

    fn encode(
        coin: Coin,
        successor: Option<Coin>,
        state: Option<PoolState>,
        delay: Option<(u64, Bytes32)>,
    ) -> CoinSpend {
        let solution = StubSolution {
            successor,
            state,
            delay,
        };
        CoinSpend {
            coin,
            puzzle_reveal: Vec::new(),
            solution: serde_json::to_vec(&solution).expect("stub solution serializes"),
        }
    }

    fn decode(spend: &CoinSpend) -> Result<StubSolution, PuzzleError> {
        serde_json::from_slice(&spend.solution)
            .map_err(|err| PuzzleError::new(format!("undecodable stub solution: {err}")))
    }
}

impl PuzzleEngine for StubPuzzleEngine {
    fn inner_puzzle_hash(
        &self,
        state: &PoolState,
        identity: &SingletonIdentity,
        genesis_challenge: &Bytes32,
    ) -> Result<Bytes32, PuzzleError> {
        let encoded = serde_json::to_vec(state)
            .map_err(|err| PuzzleError::new(format!("unencodable pool state: {err}")))?;
        let mut hasher = Sha256::new();
        hasher.update(genesis_challenge);
        hasher.update(identity.launcher_id);
        hasher.update(identity.delay_time.to_be_bytes());
        hasher.update(identity.delay_puzzle_hash);
        hasher.update(&encoded);
        Ok(hasher.finalize().into())
    }

    fn full_puzzle_hash(
        &self,
        inner_puzzle_hash: &Bytes32,
        launcher_id: &Bytes32,
    ) -> Result<Bytes32, PuzzleError> {
        let mut hasher = Sha256::new();
        hasher.update(inner_puzzle_hash);
        hasher.update(launcher_id);
        Ok(hasher.finalize().into())
    }

    fn solution_to_pool_state(&self, spend: &CoinSpend) -> Result<Option<PoolState>, PuzzleError> {
        Ok(Self::decode(spend)?.state)
    }

    fn most_recent_singleton_coin(&self, spend: &CoinSpend) -> Result<Option<Coin>, PuzzleError> {
        Ok(Self::decode(spend)?.successor)
    }

    fn delayed_puzzle_info(
        &self,
        launcher_spend: &CoinSpend,
    ) -> Result<(u64, Bytes32), PuzzleError> {
        Self::decode(launcher_spend)?
            .delay
            .ok_or_else(|| PuzzleError::new("launch spend carries no delay parameters"))
    }

    fn create_absorb_spend(
        &self,
        last_spend: &CoinSpend,
        _state: &PoolState,
        _launcher_coin: &Coin,
        reward_height: u32,
        genesis_challenge: &Bytes32,
        _delay_time: u64,
        delay_puzzle_hash: &Bytes32,
    ) -> Result<Vec<CoinSpend>, PuzzleError> {
        let tip = Self::decode(last_spend)?
            .successor
            .ok_or_else(|| PuzzleError::new("last spend has no successor to absorb from"))?;
        let next = Coin::new(tip.coin_id(), tip.puzzle_hash, tip.amount);
        let singleton_spend = Self::encode_spend(tip, Some(next), None);
        let reward_coin = Coin::new(
            pool_parent_id(reward_height, genesis_challenge),
            *delay_puzzle_hash,
            875_000_000_000,
        );
        let reward_spend = Self::encode_spend(reward_coin, None, None);
        Ok(vec![singleton_spend, reward_spend])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PoolMembership;

    fn state(url: &str) -> PoolState {
        PoolState {
            version: 1,
            membership: PoolMembership::FarmingToPool,
            target_puzzle_hash: [3u8; 32],
            pool_url: Some(url.to_owned()),
            relative_lock_height: 100,
        }
    }

    fn identity() -> SingletonIdentity {
        SingletonIdentity {
            launcher_id: [7u8; 32],
            delay_time: 604_800,
            delay_puzzle_hash: [8u8; 32],
        }
    }

    #[test]
    fn stub_round_trips_state_and_successor() {
        let engine = StubPuzzleEngine::new();
        let coin = Coin::new([1u8; 32], [2u8; 32], 1);
        let successor = Coin::new(coin.coin_id(), [2u8; 32], 1);
        let spend = StubPuzzleEngine::encode_spend(coin, Some(successor), Some(state("pool.example")));
        assert_eq!(
            engine.most_recent_singleton_coin(&spend).unwrap(),
            Some(successor)
        );
        assert_eq!(
            engine.solution_to_pool_state(&spend).unwrap(),
            Some(state("pool.example"))
        );
        assert!(engine.delayed_puzzle_info(&spend).is_err());
    }

    #[test]
    fn puzzle_hash_commits_to_state_and_identity() {
        let engine = StubPuzzleEngine::new();
        let genesis = [0xcc; 32];
        let a = engine
            .inner_puzzle_hash(&state("a.example"), &identity(), &genesis)
            .unwrap();
        let b = engine
            .inner_puzzle_hash(&state("b.example"), &identity(), &genesis)
            .unwrap();
        assert_ne!(a, b);

        let full_a = engine.full_puzzle_hash(&a, &identity().launcher_id).unwrap();
        let full_other = engine.full_puzzle_hash(&a, &[9u8; 32]).unwrap();
        assert_ne!(full_a, full_other);
    }

    #[test]
    fn undecodable_solution_is_an_error_not_a_panic() {
        let engine = StubPuzzleEngine::new();
        let spend = CoinSpend {
            coin: Coin::new([1u8; 32], [2u8; 32], 1),
            puzzle_reveal: Vec::new(),
            solution: b"not json".to_vec(),
        };
        assert!(engine.solution_to_pool_state(&spend).is_err());
        assert!(engine.most_recent_singleton_coin(&spend).is_err());
    }

    #[test]
    fn absorb_batch_chains_off_the_current_tip() {
        let engine = StubPuzzleEngine::new();
        let genesis = [0xcc; 32];
        let coin = Coin::new([1u8; 32], [2u8; 32], 1);
        let tip = Coin::new(coin.coin_id(), [2u8; 32], 1);
        let last_spend = StubPuzzleEngine::encode_spend(coin, Some(tip), None);

        let batch = engine
            .create_absorb_spend(
                &last_spend,
                &state("pool.example"),
                &Coin::new([0u8; 32], [1u8; 32], 1),
                120,
                &genesis,
                604_800,
                &[8u8; 32],
            )
            .unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].coin, tip);
        let new_tip = engine.most_recent_singleton_coin(&batch[0]).unwrap().unwrap();
        assert_eq!(new_tip.parent_coin_info, tip.coin_id());
        assert_eq!(batch[1].coin.parent_coin_info, pool_parent_id(120, &genesis));
    }
}
