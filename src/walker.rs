use tracing::{error, info, warn};

use crate::config::TrackerConfig;
use crate::errors::{SingletonError, SingletonResult};
use crate::ledger::LedgerClient;
use crate::puzzles::PuzzleEngine;
use crate::types::{Bytes32, CoinRecord, CoinSpend, ParticipantRecord, PoolState, SingletonIdentity};

/// Outcome of a singleton state resolution. Callers select handling by
/// pattern matching instead of a raise-vs-return flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The walk reached a validated tip.
    Resolved(ResolvedState),
    /// A referenced ledger entity could not currently be found. Possibly
    /// transient; carries the last state decoded before the walk lost the
    /// chain so cache-holding callers can purge.
    Unavailable { last_state: Option<PoolState> },
    /// The decoded history is malformed or the tip's recomputed puzzle hash
    /// disagrees with the ledger. Must not be trusted.
    Invalid { reason: String },
}

/// Successful resolution: the deepest sufficiently-buried spend/state pair
/// plus the newest state known, buried or not.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedState {
    pub buried_spend: CoinSpend,
    pub buried_state: PoolState,
    pub latest_state: PoolState,
}

/// Two-phase tracker threaded through the walk. `latest` follows every
/// decoded state immediately (provisional); `buried` only advances once the
/// confirming spend sits at least `threshold` blocks behind the peak. The
/// confirmation invariant lives entirely in [`ConfirmationCursor::observe`].
struct ConfirmationCursor {
    buried_spend: CoinSpend,
    buried_state: PoolState,
    latest_state: PoolState,
}

impl ConfirmationCursor {
    fn new(spend: CoinSpend, state: PoolState) -> Self {
        Self {
            buried_spend: spend,
            buried_state: state.clone(),
            latest_state: state,
        }
    }

    fn latest(&self) -> &PoolState {
        &self.latest_state
    }

    fn observe(
        &mut self,
        spend: &CoinSpend,
        decoded_state: Option<PoolState>,
        spent_height: u32,
        peak_height: u32,
        threshold: u32,
    ) {
        if let Some(state) = decoded_state {
            self.latest_state = state;
        }
        let buried = peak_height
            .checked_sub(threshold)
            .is_some_and(|depth| depth >= spent_height);
        if buried {
            self.buried_spend = spend.clone();
            self.buried_state = self.latest_state.clone();
        }
    }

    fn into_resolved(self) -> ResolvedState {
        ResolvedState {
            buried_spend: self.buried_spend,
            buried_state: self.buried_state,
            latest_state: self.latest_state,
        }
    }
}

/// Resolves singleton histories against a remote ledger and constructs
/// reward absorption bundles on top of the resolved state.
pub struct SingletonTracker<L, P> {
    ledger: L,
    puzzles: P,
    config: TrackerConfig,
}

impl<L: LedgerClient, P: PuzzleEngine> SingletonTracker<L, P> {
    pub fn new(ledger: L, puzzles: P, config: TrackerConfig) -> Self {
        Self {
            ledger,
            puzzles,
            config,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub(crate) fn ledger(&self) -> &L {
        &self.ledger
    }

    pub(crate) fn puzzles(&self) -> &P {
        &self.puzzles
    }

    /// Resolves the singleton for `launcher_id` using the configured
    /// confirmation threshold.
    pub async fn resolve_confirmed_state(
        &self,
        launcher_id: Bytes32,
        cached: Option<&ParticipantRecord>,
        peak_height: u32,
    ) -> Resolution {
        self.resolve_state(
            launcher_id,
            cached,
            peak_height,
            self.config.confirmation_threshold,
        )
        .await
    }

    /// Walks the singleton's chain of spends from the cached tip (or from
    /// the launch event when no cache is supplied) to the current unspent
    /// tip, validating the tip's puzzle hash and tracking the deepest state
    /// buried at least `confirmation_threshold` blocks behind `peak_height`.
    ///
    /// All failures fold into the returned [`Resolution`]; this never
    /// panics on malformed history and never propagates transport errors.
    pub async fn resolve_state(
        &self,
        launcher_id: Bytes32,
        cached: Option<&ParticipantRecord>,
        peak_height: u32,
        confirmation_threshold: u32,
    ) -> Resolution {
        match self
            .walk(launcher_id, cached, peak_height, confirmation_threshold)
            .await
        {
            Ok(resolved) => Resolution::Resolved(resolved),
            Err(SingletonError::RecordUnavailable { last_state, .. }) => {
                info!(
                    launcher = %hex::encode(launcher_id),
                    "singleton record unavailable"
                );
                if let Some(state) = &last_state {
                    info!(pool_url = ?state.pool_url, "last known pool state");
                }
                Resolution::Unavailable { last_state }
            }
            Err(SingletonError::InvalidStructure(reason)) => {
                warn!(
                    launcher = %hex::encode(launcher_id),
                    %reason,
                    "invalid singleton history"
                );
                Resolution::Invalid { reason }
            }
            Err(err) => {
                error!(
                    launcher = %hex::encode(launcher_id),
                    error = %err,
                    "singleton resolution failed"
                );
                Resolution::Unavailable { last_state: None }
            }
        }
    }

    async fn walk(
        &self,
        launcher_id: Bytes32,
        cached: Option<&ParticipantRecord>,
        peak_height: u32,
        confirmation_threshold: u32,
    ) -> SingletonResult<ResolvedState> {
        let (mut last_spend, initial_state, identity) = match cached {
            Some(record) => (
                record.singleton_tip.clone(),
                record.singleton_tip_state.clone(),
                record.identity,
            ),
            None => self.launch_event(launcher_id).await?,
        };
        let mut cursor = ConfirmationCursor::new(last_spend.clone(), initial_state);

        // The coin consumed by the cached tip spend must still be known to
        // the ledger; a miss means the cache is stale or the ledger view is
        // incomplete.
        let last_record = self
            .ledger
            .get_coin_record_by_name(&last_spend.coin.coin_id())
            .await?;
        if last_record.is_none() {
            return Err(SingletonError::RecordUnavailable {
                launcher_id,
                last_state: Some(cursor.latest().clone()),
            });
        }

        loop {
            let next_coin = self
                .puzzles
                .most_recent_singleton_coin(&last_spend)?
                .ok_or_else(|| {
                    SingletonError::InvalidStructure(
                        "spend produced no successor singleton".into(),
                    )
                })?;
            let next_record = self
                .ledger
                .get_coin_record_by_name(&next_coin.coin_id())
                .await?
                .ok_or_else(|| SingletonError::RecordUnavailable {
                    launcher_id,
                    last_state: Some(cursor.latest().clone()),
                })?;

            if !next_record.spent {
                self.validate_tip(&next_record, cursor.latest(), &identity)?;
                break;
            }

            let spend = self
                .ledger
                .get_puzzle_and_solution(&next_coin.coin_id(), next_record.spent_block_index)
                .await?
                .ok_or_else(|| SingletonError::RecordUnavailable {
                    launcher_id,
                    last_state: Some(cursor.latest().clone()),
                })?;
            // A spend without an embedded state carries the previous state
            // forward; absorbs and fee re-chains look like this.
            let decoded_state = self.puzzles.solution_to_pool_state(&spend)?;
            cursor.observe(
                &spend,
                decoded_state,
                next_record.spent_block_index,
                peak_height,
                confirmation_threshold,
            );
            last_spend = spend;
        }

        Ok(cursor.into_resolved())
    }

    /// Fetches the launch event and derives the initial spend, state, and
    /// identity parameters from it.
    async fn launch_event(
        &self,
        launcher_id: Bytes32,
    ) -> SingletonResult<(CoinSpend, PoolState, SingletonIdentity)> {
        let launcher = self
            .ledger
            .get_coin_record_by_name(&launcher_id)
            .await?
            .ok_or(SingletonError::RecordUnavailable {
                launcher_id,
                last_state: None,
            })?;
        if !launcher.spent {
            warn!(
                launcher = %hex::encode(launcher_id),
                "launch coin has not been spent"
            );
            return Err(SingletonError::RecordUnavailable {
                launcher_id,
                last_state: None,
            });
        }
        let spend =
            self.spend_for(&launcher)
                .await?
                .ok_or(SingletonError::RecordUnavailable {
                    launcher_id,
                    last_state: None,
                })?;
        let (delay_time, delay_puzzle_hash) = self.puzzles.delayed_puzzle_info(&spend)?;
        let state = self
            .puzzles
            .solution_to_pool_state(&spend)?
            .ok_or_else(|| {
                SingletonError::InvalidStructure("launch spend carries no pool state".into())
            })?;
        let identity = SingletonIdentity {
            launcher_id,
            delay_time,
            delay_puzzle_hash,
        };
        Ok((spend, state, identity))
    }

    /// Recomputes the expected puzzle hash of an unspent tip from the latest
    /// known state and compares it with the coin's actual puzzle hash.
    fn validate_tip(
        &self,
        tip: &CoinRecord,
        latest_state: &PoolState,
        identity: &SingletonIdentity,
    ) -> SingletonResult<()> {
        let inner = self.puzzles.inner_puzzle_hash(
            latest_state,
            identity,
            &self.config.genesis_challenge,
        )?;
        let expected = self
            .puzzles
            .full_puzzle_hash(&inner, &identity.launcher_id)?;
        if expected != tip.coin.puzzle_hash {
            return Err(SingletonError::InvalidStructure(format!(
                "puzzle hash mismatch at tip {}",
                hex::encode(tip.name())
            )));
        }
        Ok(())
    }

    /// Fetches the spend consuming a coin, or `None` when the record is
    /// still unspent.
    pub(crate) async fn spend_for(
        &self,
        record: &CoinRecord,
    ) -> SingletonResult<Option<CoinSpend>> {
        if !record.spent {
            return Ok(None);
        }
        Ok(self
            .ledger
            .get_puzzle_and_solution(&record.name(), record.spent_block_index)
            .await?)
    }
}
