//! Witness registration, the active witness schedule, and the rolling
//! price-feed history used to derive the DOLLAR peg.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::asset::{Asset, Price};
use crate::authority::PublicKeyId;
use crate::types::{AccountName, ObjectId, Timestamp};

pub struct WitnessTag;
pub type WitnessId = ObjectId<WitnessTag>;

/// Chain properties a witness proposes; the median across all active
/// witnesses' proposals becomes the effective value in
/// `DynamicGlobalProperties`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChainProperties {
    pub account_creation_fee: Asset,
    pub max_block_size: u32,
    pub dollar_interest_rate: u16,
    pub account_subsidy_limit: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Witness {
    pub id: WitnessId,
    pub owner: AccountName,
    pub created: Timestamp,
    pub url: String,
    pub total_missed: u32,
    pub last_confirmed_block_num: u32,
    pub signing_key: PublicKeyId,
    pub props: ChainProperties,
    pub dollar_exchange_rate: Price,
    pub last_dollar_exchange_update: Timestamp,
    pub votes: u64,
    pub virtual_last_update: u128,
    pub virtual_position: u128,
    pub virtual_scheduled_time: u128,
    pub running_version: String,
}

/// The currently active, ordered witness block-production schedule.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WitnessSchedule {
    pub current_shuffled_witnesses: Vec<AccountName>,
    pub next_shuffle_block_num: u32,
    pub num_scheduled_witnesses: u8,
    pub median_props: ChainProperties,
}

impl Default for WitnessSchedule {
    fn default() -> Self {
        Self {
            current_shuffled_witnesses: Vec::new(),
            next_shuffle_block_num: 0,
            num_scheduled_witnesses: 0,
            median_props: ChainProperties {
                account_creation_fee: Asset::new(0, crate::asset::Symbol::Liquid),
                max_block_size: 2 * 1024 * 1024,
                dollar_interest_rate: 0,
                account_subsidy_limit: 0,
            },
        }
    }
}

/// Rolling history of witness-submitted feed prices; `current_median_history`
/// is recomputed each time a new entry is pushed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedHistory {
    pub current_median_history: Price,
    pub price_history: VecDeque<Price>,
    pub current_dollar_supply: Asset,
    pub print_rate: u16,
}
