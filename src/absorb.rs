use tracing::{debug, info};

use crate::errors::{SingletonError, SingletonResult};
use crate::fees::FeeBuilder;
use crate::ledger::LedgerClient;
use crate::puzzles::PuzzleEngine;
use crate::rewards::farmed_height;
use crate::types::{CoinRecord, ParticipantRecord, PoolMembership, SpendBundle};
use crate::walker::{Resolution, SingletonTracker};

impl<L: LedgerClient, P: PuzzleEngine> SingletonTracker<L, P> {
    /// Builds one combined bundle claiming every qualifying reward for a
    /// participant, chaining an absorb batch per reward off the advancing
    /// singleton tip. Returns `Ok(None)` when there is nothing to do: the
    /// singleton did not resolve, the member self-pools, or no reward
    /// qualified.
    pub async fn create_absorb_bundle(
        &self,
        participant: &ParticipantRecord,
        peak_height: u32,
        reward_records: &[CoinRecord],
        fee_builder: Option<&dyn FeeBuilder>,
    ) -> SingletonResult<Option<SpendBundle>> {
        let launcher_id = participant.identity.launcher_id;

        // Absorption must act on the current tip, not a stale buried state,
        // so the walk runs with threshold zero and buried == latest.
        let resolved = match self
            .resolve_state(launcher_id, Some(participant), peak_height, 0)
            .await
        {
            Resolution::Resolved(resolved) => resolved,
            Resolution::Unavailable { .. } | Resolution::Invalid { .. } => {
                info!(
                    launcher = %hex::encode(launcher_id),
                    "skipping absorb for unresolved singleton"
                );
                return Ok(None);
            }
        };
        debug_assert_eq!(resolved.buried_state, resolved.latest_state);

        if resolved.latest_state.membership == PoolMembership::SelfPooling {
            info!(
                launcher = %hex::encode(launcher_id),
                "not absorbing for a self-pooling member"
            );
            return Ok(None);
        }

        let launcher_record = self
            .ledger()
            .get_coin_record_by_name(&launcher_id)
            .await?
            .ok_or_else(|| SingletonError::RecordUnavailable {
                launcher_id,
                last_state: Some(resolved.latest_state.clone()),
            })?;

        let state = resolved.buried_state;
        let mut last_spend = resolved.buried_spend;
        let mut all_spends = Vec::new();
        for record in reward_records {
            let Some(height) = farmed_height(record, &self.config().genesis_challenge) else {
                // The puzzle refuses to absorb coins that are not a reward.
                info!(
                    launcher = %hex::encode(launcher_id),
                    coin = %hex::encode(record.name()),
                    "reward coin is not a pool reward"
                );
                continue;
            };
            let batch = self.puzzles().create_absorb_spend(
                &last_spend,
                &state,
                &launcher_record.coin,
                height,
                &self.config().genesis_challenge,
                participant.identity.delay_time,
                &participant.identity.delay_puzzle_hash,
            )?;
            if let Some(singleton_spend) = batch.first() {
                last_spend = singleton_spend.clone();
            }
            all_spends.extend(batch);
        }

        if all_spends.is_empty() {
            return Ok(None);
        }
        debug!(
            launcher = %hex::encode(launcher_id),
            spends = all_spends.len(),
            "assembled absorb bundle"
        );

        match fee_builder {
            Some(builder) => Ok(Some(builder.spend_with_fee(all_spends).await?)),
            None => Ok(Some(SpendBundle::unsigned(all_spends))),
        }
    }
}
