use crate::types::{Bytes32, CoinRecord};

/// Number of heights scanned backwards when matching a reward coin to the
/// height it was farmed at. Reward coins reference their producing height
/// only indirectly, and the scan must never run unbounded.
pub const REWARD_SCAN_WINDOW: u32 = 128;

/// Deterministic parent id of the pool portion of the reward issued at a
/// given height: the first half of the genesis challenge followed by the
/// height as a big-endian 128-bit integer.
pub fn pool_parent_id(block_height: u32, genesis_challenge: &Bytes32) -> Bytes32 {
    let mut parent = [0u8; 32];
    parent[..16].copy_from_slice(&genesis_challenge[..16]);
    parent[16..].copy_from_slice(&u128::from(block_height).to_be_bytes());
    parent
}

/// Returns the height a reward coin was farmed at, or `None` if the record
/// is not a qualifying pool reward. Scans [`REWARD_SCAN_WINDOW`] candidate
/// heights downward from the confirmation height and returns the first
/// (highest) match against the coin's declared parent.
pub fn farmed_height(record: &CoinRecord, genesis_challenge: &Bytes32) -> Option<u32> {
    if !record.coinbase {
        return None;
    }
    let top = record.confirmed_block_index;
    let bottom = top.saturating_sub(REWARD_SCAN_WINDOW - 1);
    (bottom..=top)
        .rev()
        .find(|height| pool_parent_id(*height, genesis_challenge) == record.coin.parent_coin_info)
}
