//! Singleton lifecycle tracking for pool reward absorption.
//!
//! The crate follows a member's singleton through its chain of spends on a
//! remote UTXO ledger, resolves the reorg-safe ("buried") state alongside
//! the newest known state, and uses the resolved tip to build chained spend
//! batches claiming pool rewards. The ledger, the puzzle library, the fee
//! builder, and the participant store are all consumed through traits so the
//! crate stays free of transport, CLVM, and persistence concerns.
//!
//! Applications typically construct a [`walker::SingletonTracker`] from a
//! [`ledger::LedgerClient`], a [`puzzles::PuzzleEngine`], and a
//! [`config::TrackerConfig`], then drive it with
//! [`walker::SingletonTracker::resolve_state`] and
//! [`walker::SingletonTracker::create_absorb_bundle`].

pub mod absorb;
pub mod config;
pub mod errors;
pub mod fees;
pub mod ledger;
pub mod locator;
pub mod puzzles;
pub mod rewards;
pub mod store;
pub mod types;
pub mod walker;

pub use config::{TrackerConfig, DEFAULT_CONFIRMATION_THRESHOLD};
pub use errors::{SingletonError, SingletonResult};
pub use locator::{LocatedSingleton, LOCATOR_PARENT_HOPS, LOCATOR_SCAN_WINDOW};
pub use rewards::{farmed_height, pool_parent_id, REWARD_SCAN_WINDOW};
pub use types::{
    Bytes32, Coin, CoinRecord, CoinSpend, ParticipantRecord, PoolMembership, PoolState,
    SingletonIdentity, SpendBundle,
};
pub use walker::{Resolution, ResolvedState, SingletonTracker};
