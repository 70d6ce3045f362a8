//! The `Account` object and its satellite state: owner-authority history,
//! pending account-recovery requests, and vesting-withdraw routes.
//!
//! Generalizes the teacher's `Account`/`RecoveryState` split: the recovery
//! state here tracks an owner-key takeover workflow (one witness-less
//! timelock, no verifier voting) rather than the teacher's bonded
//! verifier-committee recovery, since this chain's recovery model is a
//! simple "designated recovery account + timelock" scheme.

use serde::{Deserialize, Serialize};

use crate::asset::{Asset, Symbol};
use crate::authority::AccountAuthority;
use crate::types::{AccountName, ObjectId, Timestamp};

pub struct AccountTag;
pub type AccountId = ObjectId<AccountTag>;

/// Full on-chain account state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: AccountName,
    pub authority: AccountAuthority,
    pub created: Timestamp,
    pub recovery_account: AccountName,
    pub last_owner_update: Timestamp,

    // ── Balances ───────────────────────────────────────────────────────────
    pub liquid_balance: Asset,
    pub dollar_balance: Asset,
    pub savings_liquid_balance: Asset,
    pub savings_dollar_balance: Asset,
    pub savings_withdraw_requests: u8,

    /// Timestamp DOLLAR interest was last compounded into `dollar_balance`.
    pub last_interest_payment: Timestamp,
    /// Timestamp DOLLAR interest was last compounded into
    /// `savings_dollar_balance`.
    pub savings_last_interest_payment: Timestamp,

    // ── Vesting ────────────────────────────────────────────────────────────
    pub vesting_shares: Asset,
    pub delegated_vesting_shares: Asset,
    pub received_vesting_shares: Asset,
    pub vesting_withdraw_rate: Asset,
    pub next_vesting_withdrawal: Option<Timestamp>,
    pub to_withdraw: i64,
    pub withdrawn: i64,
    pub withdraw_routes: u16,

    // ── Voting power ───────────────────────────────────────────────────────
    pub voting_power: u16,
    pub last_vote_time: Timestamp,
    pub downvote_power: u16,
    pub last_post: Timestamp,
    pub last_root_post: Timestamp,
    pub post_count: u32,

    // ── Curation / rewards accounting ─────────────────────────────────────
    pub curation_rewards: i64,
    pub posting_rewards: i64,
    pub reward_liquid_balance: Asset,
    pub reward_dollar_balance: Asset,
    pub reward_vesting_balance: Asset,
    pub reward_vesting_balance_in_liquid: Asset,

    // ── Witness voting ─────────────────────────────────────────────────────
    pub proxy: Option<AccountName>,
    pub witness_votes: Vec<AccountName>,
    pub witnesses_voted_for: u16,

    // ── Misc ───────────────────────────────────────────────────────────────
    pub json_metadata: String,
    pub can_vote: bool,
    pub mined: bool,
    /// Accounts claimed via `claim_account` (fee paid, name not yet chosen)
    /// waiting to be materialized by `create_claimed_account`.
    pub pending_claimed_accounts: i64,
}

impl Account {
    pub fn new(id: AccountId, name: AccountName, authority: AccountAuthority, created: Timestamp) -> Self {
        let recovery_account = name.clone();
        Self {
            id,
            name,
            authority,
            created,
            recovery_account,
            last_owner_update: 0,
            liquid_balance: Asset::zero(Symbol::Liquid),
            dollar_balance: Asset::zero(Symbol::Dollar),
            savings_liquid_balance: Asset::zero(Symbol::Liquid),
            savings_dollar_balance: Asset::zero(Symbol::Dollar),
            savings_withdraw_requests: 0,
            vesting_shares: Asset::zero(Symbol::Vests),
            delegated_vesting_shares: Asset::zero(Symbol::Vests),
            received_vesting_shares: Asset::zero(Symbol::Vests),
            vesting_withdraw_rate: Asset::zero(Symbol::Vests),
            next_vesting_withdrawal: None,
            to_withdraw: 0,
            withdrawn: 0,
            withdraw_routes: 0,
            voting_power: 10_000,
            last_vote_time: created,
            downvote_power: 10_000,
            last_post: created,
            last_root_post: created,
            post_count: 0,
            curation_rewards: 0,
            posting_rewards: 0,
            reward_liquid_balance: Asset::zero(Symbol::Liquid),
            reward_dollar_balance: Asset::zero(Symbol::Dollar),
            reward_vesting_balance: Asset::zero(Symbol::Vests),
            reward_vesting_balance_in_liquid: Asset::zero(Symbol::Liquid),
            proxy: None,
            witness_votes: Vec::new(),
            witnesses_voted_for: 0,
            json_metadata: String::new(),
            can_vote: true,
            mined: false,
            pending_claimed_accounts: 0,
        }
    }

    /// Vesting shares actually controllable by this account: owned plus
    /// received via delegation, minus delegated away. Used everywhere a
    /// vote's rshares or a bandwidth allotment needs effective stake.
    pub fn effective_vesting_shares(&self) -> Asset {
        self.vesting_shares + self.received_vesting_shares - self.delegated_vesting_shares
    }
}

// ── OwnerAuthorityHistory ──────────────────────────────────────────────────────

pub struct OwnerHistoryTag;
pub type OwnerHistoryId = ObjectId<OwnerHistoryTag>;

/// Archive of a previous owner authority, kept so `recover_account` can
/// validate a `recent_owner_authority` argument against what the account
/// actually used to be signed by.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OwnerAuthorityHistory {
    pub id: OwnerHistoryId,
    pub account: AccountName,
    pub previous_owner_authority: crate::authority::Authority,
    pub last_valid_time: Timestamp,
}

// ── AccountRecoveryRequest ─────────────────────────────────────────────────────

pub struct RecoveryRequestTag;
pub type RecoveryRequestId = ObjectId<RecoveryRequestTag>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountRecoveryRequest {
    pub id: RecoveryRequestId,
    pub account_to_recover: AccountName,
    pub new_owner_authority: crate::authority::Authority,
    pub expires: Timestamp,
}

// ── ChangeRecoveryAccountRequest ───────────────────────────────────────────────

pub struct ChangeRecoveryRequestTag;
pub type ChangeRecoveryRequestId = ObjectId<ChangeRecoveryRequestTag>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChangeRecoveryAccountRequest {
    pub id: ChangeRecoveryRequestId,
    pub account_to_recover: AccountName,
    pub recovery_account: AccountName,
    pub effective_on: Timestamp,
}

// ── DeclineVotingRightsRequest ─────────────────────────────────────────────────

pub struct DeclineVotingRequestTag;
pub type DeclineVotingRequestId = ObjectId<DeclineVotingRequestTag>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeclineVotingRightsRequest {
    pub id: DeclineVotingRequestId,
    pub account: AccountName,
    pub effective_on: Timestamp,
}

// ── WithdrawVestingRoute ───────────────────────────────────────────────────────

pub struct WithdrawRouteTag;
pub type WithdrawRouteId = ObjectId<WithdrawRouteTag>;

/// Redirects a fraction of an account's vesting-withdrawal installments to
/// another account, optionally auto-converting them to that account's
/// liquid vesting shares immediately rather than leaving them as VESTS.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WithdrawVestingRoute {
    pub id: WithdrawRouteId,
    pub from_account: AccountName,
    pub to_account: AccountName,
    pub percent: u16,
    pub auto_vest: bool,
}
