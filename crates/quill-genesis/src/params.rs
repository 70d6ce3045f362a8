//! Deployer-supplied inputs to `build_genesis_state`.
//!
//! Mirrors the shape of the teacher's `chronx-genesis::params::GenesisParams`
//! (a small, `serde`-derived struct a deployer writes by hand or generates
//! via a key ceremony) but carries this chain's opening consensus
//! parameters and founder allocation instead of a fixed token-distribution
//! schedule.

use serde::{Deserialize, Serialize};

use quill_core::asset::Asset;
use quill_core::authority::PublicKeyId;
use quill_core::types::{AccountName, Timestamp};

/// One witness seeded directly into the genesis witness schedule, standing
/// in for the real witness-vote-driven schedule until enough stake has
/// accumulated to replace it through ordinary `account_witness_vote`
/// operations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InitialWitness {
    pub owner: AccountName,
    pub signing_key: PublicKeyId,
    pub url: String,
}

/// Parameters a deployer supplies to build a fresh genesis state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisParams {
    pub genesis_time: Timestamp,

    /// Name of the single funded founder account created at genesis. Every
    /// other account is created afterward by ordinary `account_create`
    /// operations against this one.
    pub founder_name: AccountName,
    pub founder_owner_key: PublicKeyId,
    pub founder_active_key: PublicKeyId,
    pub founder_posting_key: PublicKeyId,
    pub founder_memo_key: PublicKeyId,

    /// LIQUID credited directly to the founder's spendable balance.
    pub founder_liquid_balance: Asset,
    /// LIQUID seeded into the vesting pool and converted to VESTS for the
    /// founder at the degenerate 1:1 genesis price (spec.md §4.3).
    pub founder_vesting_liquid: Asset,

    /// The witnesses that produce blocks until real witness votes
    /// accumulate.
    pub initial_witnesses: Vec<InitialWitness>,

    pub initial_account_creation_fee: Asset,
    pub initial_max_block_size: u32,
    pub initial_dollar_interest_rate: u16,
    pub initial_account_subsidy_limit: u32,
    pub initial_vote_power_reserve_rate: u32,
}
