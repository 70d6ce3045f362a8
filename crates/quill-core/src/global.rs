//! Chain-wide singleton state: `DynamicGlobalProperties` (the header block
//! of everything housekeeping touches) and `RewardFund` (the pool content
//! rewards are paid out of).

use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::types::{BlockNum, Timestamp};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DynamicGlobalProperties {
    pub head_block_number: BlockNum,
    pub time: Timestamp,
    pub current_witness: Option<crate::types::AccountName>,

    pub current_supply: Asset,
    pub current_dollar_supply: Asset,
    pub total_vesting_fund: Asset,
    pub total_vesting_shares: Asset,
    pub total_reward_fund: Asset,

    pub dollar_interest_rate: u16,
    pub dollar_print_rate: u16,

    pub average_block_size: u32,
    pub maximum_block_size: u32,

    pub num_pow_witnesses: u32,
    pub last_irreversible_block_num: BlockNum,

    pub vote_power_reserve_rate: u32,
}

impl DynamicGlobalProperties {
    /// Vesting-share price implied by the fund: `total_vesting_fund /
    /// total_vesting_shares`, used to convert VESTS to LIQUID and back.
    pub fn vesting_share_price(&self) -> crate::asset::Price {
        if self.total_vesting_shares.amount == 0 {
            crate::asset::Price::new(
                Asset::new(1_000, crate::asset::Symbol::Liquid),
                Asset::new(1_000_000, crate::asset::Symbol::Vests),
            )
        } else {
            crate::asset::Price::new(self.total_vesting_fund, self.total_vesting_shares)
        }
    }

    /// Total supply expressed in LIQUID terms: circulating LIQUID plus the
    /// VESTS pool converted at the current vesting-share price. Used to
    /// gauge the DOLLAR market cap against the print-rate thresholds.
    pub fn virtual_supply(&self) -> crate::asset::Asset {
        let vesting_in_liquid = self
            .vesting_share_price()
            .multiply(&self.total_vesting_shares)
            .unwrap_or(Asset::zero(crate::asset::Symbol::Liquid));
        self.current_supply
            .checked_add(&vesting_in_liquid)
            .unwrap_or(self.current_supply)
    }
}

/// A named pool of undistributed content rewards and its recent-claims
/// decay accumulator, keyed by reward-curve kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RewardFund {
    pub name: String,
    pub reward_balance: Asset,
    pub recent_claims: u128,
    pub last_update: Timestamp,
    pub content_constant: u128,
    pub author_reward_curve: RewardCurve,
    pub curation_reward_curve: RewardCurve,
    pub percent_curation_rewards: u16,
}

/// The shape of the reward curve applied to a post's `claimed_rshares`
/// relative to the fund's `recent_claims` decay accumulator.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum RewardCurve {
    /// `(rshares + content_constant)^2 - content_constant^2`
    Quadratic,
    /// `rshares`
    Linear,
    /// `rshares * power_factor / 10000`
    Power { power_factor: u32 },
}
