use serde::{Deserialize, Serialize};

use crate::types::Bytes32;

/// Default confirmation depth before a resolved state is trusted against
/// reorganisation.
pub const DEFAULT_CONFIRMATION_THRESHOLD: u32 = 6;

/// Deployment-level settings for the tracker. The backward-scan bounds used
/// by reward matching and reverse lookup are consensus-derived and stay as
/// module constants instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Genesis challenge of the ledger the tracker follows.
    pub genesis_challenge: Bytes32,
    /// Blocks a state transition must be buried under before it is trusted.
    pub confirmation_threshold: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            genesis_challenge: [0u8; 32],
            confirmation_threshold: DEFAULT_CONFIRMATION_THRESHOLD,
        }
    }
}

impl TrackerConfig {
    pub fn new(genesis_challenge: Bytes32) -> Self {
        Self {
            genesis_challenge,
            ..Self::default()
        }
    }

    pub fn with_confirmation_threshold(mut self, confirmation_threshold: u32) -> Self {
        self.confirmation_threshold = confirmation_threshold;
        self
    }
}
