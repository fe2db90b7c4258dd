use tracing::debug;

use crate::errors::SingletonResult;
use crate::ledger::LedgerClient;
use crate::puzzles::PuzzleEngine;
use crate::store::ParticipantStore;
use crate::types::{Bytes32, CoinRecord, ParticipantRecord};
use crate::walker::SingletonTracker;

/// Blocks scanned backwards from the target coin's confirmation height when
/// searching for candidate reward coins.
pub const LOCATOR_SCAN_WINDOW: u32 = 1000;

/// Parent links followed from a candidate's singleton tip before giving up
/// on that candidate.
pub const LOCATOR_PARENT_HOPS: usize = 10;

/// Result of a reverse lookup: the reward coin that pointed at the owner,
/// the singleton chain coin that matched, and the owning participant.
#[derive(Clone, Debug)]
pub struct LocatedSingleton {
    pub reward_record: CoinRecord,
    pub singleton_record: CoinRecord,
    pub participant: ParticipantRecord,
}

impl<L: LedgerClient, P: PuzzleEngine> SingletonTracker<L, P> {
    /// Finds which known participant's singleton chain produced `target` by
    /// scanning recent reward coins paying to the candidate puzzle hashes
    /// and walking each owner's singleton tip backwards through parent
    /// links. Returns the first match, newest candidate first.
    pub async fn find_singleton_from_coin<S>(
        &self,
        store: &S,
        target: &CoinRecord,
        scan_puzzle_hashes: &[Bytes32],
    ) -> SingletonResult<Option<LocatedSingleton>>
    where
        S: ParticipantStore + ?Sized,
    {
        let end_height = target.confirmed_block_index;
        let start_height = end_height.saturating_sub(LOCATOR_SCAN_WINDOW);
        let mut candidates = self
            .ledger()
            .get_coin_records_by_puzzle_hashes(scan_puzzle_hashes, true, start_height, end_height)
            .await?;
        candidates.sort_by(|a, b| b.confirmed_block_index.cmp(&a.confirmed_block_index));

        let singleton_name = target.coin.parent_coin_info;
        for candidate in candidates {
            if !candidate.coinbase || !candidate.spent {
                continue;
            }
            let Some(participant) = store
                .participants_for_puzzle_hashes(&[candidate.coin.puzzle_hash])
                .await?
                .into_iter()
                .next()
            else {
                continue;
            };
            let Some(tip) = self
                .puzzles()
                .most_recent_singleton_coin(&participant.singleton_tip)?
            else {
                continue;
            };

            let mut record = self.ledger().get_coin_record_by_name(&tip.coin_id()).await?;
            for hop in 0..LOCATOR_PARENT_HOPS {
                let Some(current) = record else {
                    break;
                };
                if current.name() == singleton_name {
                    debug!(
                        launcher = %hex::encode(participant.identity.launcher_id),
                        hop,
                        "matched singleton ancestor"
                    );
                    return Ok(Some(LocatedSingleton {
                        reward_record: candidate,
                        singleton_record: current,
                        participant,
                    }));
                }
                record = self
                    .ledger()
                    .get_coin_record_by_name(&current.coin.parent_coin_info)
                    .await?;
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::pool_parent_id;
    use crate::store::MemoryParticipantStore;
    use crate::types::Coin;
    use crate::walker::tests::{build_chain, pool_state, TestChain, GENESIS};

    const P2_PUZZLE_HASH: Bytes32 = [5u8; 32];

    fn participant(chain: &TestChain) -> ParticipantRecord {
        ParticipantRecord {
            identity: chain.identity,
            p2_singleton_puzzle_hash: P2_PUZZLE_HASH,
            singleton_tip: chain.spends.last().expect("chain has spends").clone(),
            singleton_tip_state: chain.latest_state.clone(),
        }
    }

    fn seed_reward_candidate(chain: &TestChain, confirmed: u32) {
        chain.ledger.insert_record(CoinRecord {
            coin: Coin::new(
                pool_parent_id(confirmed, &GENESIS),
                P2_PUZZLE_HASH,
                875_000_000_000,
            ),
            confirmed_block_index: confirmed,
            spent_block_index: confirmed + 1,
            spent: true,
            coinbase: true,
        });
    }

    /// Builds a chain of `steps` singleton spends; the coin `hops` parent
    /// links behind the tip becomes the target's declared parent.
    fn chain_and_target(steps: u32, hops: u32) -> (TestChain, CoinRecord) {
        let step_list: Vec<(u32, Option<crate::types::PoolState>)> =
            (0..steps).map(|i| (10 + i, None)).collect();
        let chain = build_chain(pool_state("pool.example"), &step_list, None);

        // Walk back from the tip to pick the ancestor.
        let mut ancestor = chain.tip;
        for _ in 0..hops {
            let parent = ancestor.parent_coin_info;
            ancestor = chain
                .spends
                .iter()
                .map(|spend| spend.coin)
                .find(|coin| coin.coin_id() == parent)
                .expect("ancestor within chain");
        }
        let target = CoinRecord {
            coin: Coin::new(ancestor.coin_id(), [7u8; 32], 1_750_000_000_000),
            confirmed_block_index: 500,
            spent_block_index: 0,
            spent: false,
            coinbase: false,
        };
        (chain, target)
    }

    #[tokio::test]
    async fn finds_an_ancestor_within_the_hop_bound() {
        let (chain, target) = chain_and_target(6, 4);
        seed_reward_candidate(&chain, 400);
        let store = MemoryParticipantStore::new().with_participant(participant(&chain));
        let tracker = chain.tracker();

        let located = tracker
            .find_singleton_from_coin(&store, &target, &[P2_PUZZLE_HASH])
            .await
            .unwrap()
            .expect("ancestor within bound");
        assert_eq!(located.singleton_record.name(), target.coin.parent_coin_info);
        assert_eq!(located.participant.p2_singleton_puzzle_hash, P2_PUZZLE_HASH);
        assert!(located.reward_record.coinbase);

        // Repeated calls are read-only and return the same match.
        let again = tracker
            .find_singleton_from_coin(&store, &target, &[P2_PUZZLE_HASH])
            .await
            .unwrap()
            .expect("repeat lookup");
        assert_eq!(again.singleton_record, located.singleton_record);
    }

    #[tokio::test]
    async fn ancestor_beyond_the_hop_bound_is_missed() {
        let (chain, target) = chain_and_target(13, 11);
        seed_reward_candidate(&chain, 400);
        let store = MemoryParticipantStore::new().with_participant(participant(&chain));
        let tracker = chain.tracker();

        let located = tracker
            .find_singleton_from_coin(&store, &target, &[P2_PUZZLE_HASH])
            .await
            .unwrap();
        assert!(located.is_none());
    }

    #[tokio::test]
    async fn candidates_without_a_known_participant_are_skipped() {
        let (chain, target) = chain_and_target(6, 4);
        seed_reward_candidate(&chain, 400);
        let store = MemoryParticipantStore::new();
        let tracker = chain.tracker();

        let located = tracker
            .find_singleton_from_coin(&store, &target, &[P2_PUZZLE_HASH])
            .await
            .unwrap();
        assert!(located.is_none());
    }

    #[tokio::test]
    async fn unspent_or_non_reward_candidates_are_skipped() {
        let (chain, target) = chain_and_target(6, 4);
        // Same puzzle hash, but not a coinbase coin.
        chain.ledger.insert_record(CoinRecord {
            coin: Coin::new([8u8; 32], P2_PUZZLE_HASH, 1),
            confirmed_block_index: 400,
            spent_block_index: 401,
            spent: true,
            coinbase: false,
        });
        // A reward, but unspent.
        chain.ledger.insert_record(CoinRecord {
            coin: Coin::new(pool_parent_id(410, &GENESIS), P2_PUZZLE_HASH, 1),
            confirmed_block_index: 410,
            spent_block_index: 0,
            spent: false,
            coinbase: true,
        });
        let store = MemoryParticipantStore::new().with_participant(participant(&chain));
        let tracker = chain.tracker();

        let located = tracker
            .find_singleton_from_coin(&store, &target, &[P2_PUZZLE_HASH])
            .await
            .unwrap();
        assert!(located.is_none());
    }

    #[tokio::test]
    async fn candidates_outside_the_scan_window_are_ignored() {
        let (chain, mut target) = chain_and_target(6, 4);
        target.confirmed_block_index = 2000;
        // Candidate confirmed 1001 blocks before the target.
        seed_reward_candidate(&chain, 999);
        let store = MemoryParticipantStore::new().with_participant(participant(&chain));
        let tracker = chain.tracker();

        let located = tracker
            .find_singleton_from_coin(&store, &target, &[P2_PUZZLE_HASH])
            .await
            .unwrap();
        assert!(located.is_none());
    }
}
