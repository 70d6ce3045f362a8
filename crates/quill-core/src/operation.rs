//! The externally-visible operation tagged union. Generalizes the
//! teacher's `Action` enum (single match over a flat set of variants) to
//! the ~36 operations this chain's evaluators dispatch on. Serialization is
//! explicit (derive(Serialize, Deserialize) with bincode's default
//! enum-tag encoding) rather than reflection-based, per the design note
//! this chain's engine follows.

use serde::{Deserialize, Serialize};

use crate::asset::{Asset, Price};
use crate::authority::{Authority, PublicKeyId};
use crate::content::Beneficiary;
use crate::types::{AccountName, Permlink, Timestamp};

/// Every state-changing operation this chain accepts, one evaluator per
/// variant in `quill_state::evaluators`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Operation {
    // ── Accounts ───────────────────────────────────────────────────────────
    AccountCreate {
        fee: Asset,
        creator: AccountName,
        new_account_name: AccountName,
        owner: Authority,
        active: Authority,
        posting: Authority,
        memo_key: PublicKeyId,
        json_metadata: String,
    },
    AccountCreateWithDelegation {
        fee: Asset,
        delegation: Asset,
        creator: AccountName,
        new_account_name: AccountName,
        owner: Authority,
        active: Authority,
        posting: Authority,
        memo_key: PublicKeyId,
        json_metadata: String,
    },
    AccountUpdate {
        account: AccountName,
        owner: Option<Authority>,
        active: Option<Authority>,
        posting: Option<Authority>,
        memo_key: Option<PublicKeyId>,
        json_metadata: String,
    },
    RequestAccountRecovery {
        recovery_account: AccountName,
        account_to_recover: AccountName,
        new_owner_authority: Authority,
    },
    RecoverAccount {
        account_to_recover: AccountName,
        new_owner_authority: Authority,
        recent_owner_authority: Authority,
    },
    ChangeRecoveryAccount {
        account_to_recover: AccountName,
        new_recovery_account: AccountName,
    },
    DeclineVotingRights {
        account: AccountName,
        decline: bool,
    },
    ClaimAccount {
        creator: AccountName,
        fee: Asset,
    },
    CreateClaimedAccount {
        creator: AccountName,
        new_account_name: AccountName,
        owner: Authority,
        active: Authority,
        posting: Authority,
        memo_key: PublicKeyId,
        json_metadata: String,
    },
    ResetAccount {
        reset_account: AccountName,
        account_to_reset: AccountName,
        new_owner_authority: Authority,
    },
    SetResetAccount {
        account: AccountName,
        current_reset_account: AccountName,
        reset_account: AccountName,
    },

    // ── Transfers / vesting ────────────────────────────────────────────────
    Transfer {
        from: AccountName,
        to: AccountName,
        amount: Asset,
        memo: String,
    },
    TransferToVesting {
        from: AccountName,
        to: AccountName,
        amount: Asset,
    },
    WithdrawVesting {
        account: AccountName,
        vesting_shares: Asset,
    },
    SetWithdrawVestingRoute {
        from_account: AccountName,
        to_account: AccountName,
        percent: u16,
        auto_vest: bool,
    },
    DelegateVestingShares {
        delegator: AccountName,
        delegatee: AccountName,
        vesting_shares: Asset,
    },
    TransferToSavings {
        from: AccountName,
        to: AccountName,
        amount: Asset,
        memo: String,
    },
    TransferFromSavings {
        from: AccountName,
        request_id: u32,
        to: AccountName,
        amount: Asset,
        memo: String,
    },
    CancelTransferFromSavings {
        from: AccountName,
        request_id: u32,
    },
    ClaimRewardBalance {
        account: AccountName,
        reward_liquid: Asset,
        reward_dollar: Asset,
        reward_vests: Asset,
    },

    // ── Content ────────────────────────────────────────────────────────────
    Comment {
        parent_author: Option<AccountName>,
        parent_permlink: Permlink,
        author: AccountName,
        permlink: Permlink,
        title: String,
        body: String,
        json_metadata: String,
    },
    CommentOptions {
        author: AccountName,
        permlink: Permlink,
        max_accepted_payout: Asset,
        percent_dollar: u16,
        allow_curation_rewards: bool,
        beneficiaries: Vec<Beneficiary>,
    },
    DeleteComment {
        author: AccountName,
        permlink: Permlink,
    },
    Vote {
        voter: AccountName,
        author: AccountName,
        permlink: Permlink,
        weight: i16,
    },

    // ── Market ─────────────────────────────────────────────────────────────
    LimitOrderCreate {
        owner: AccountName,
        order_id: u32,
        amount_to_sell: Asset,
        min_to_receive: Asset,
        fill_or_kill: bool,
        expiration: Timestamp,
    },
    LimitOrderCreate2 {
        owner: AccountName,
        order_id: u32,
        amount_to_sell: Asset,
        exchange_rate: Price,
        fill_or_kill: bool,
        expiration: Timestamp,
    },
    LimitOrderCancel {
        owner: AccountName,
        order_id: u32,
    },
    Convert {
        owner: AccountName,
        request_id: u32,
        amount: Asset,
    },

    // ── Escrow ─────────────────────────────────────────────────────────────
    EscrowTransfer {
        from: AccountName,
        to: AccountName,
        agent: AccountName,
        escrow_id: u32,
        liquid_amount: Asset,
        dollar_amount: Asset,
        fee: Asset,
        ratification_deadline: Timestamp,
        escrow_expiration: Timestamp,
        json_meta: String,
    },
    EscrowApprove {
        from: AccountName,
        to: AccountName,
        agent: AccountName,
        who: AccountName,
        escrow_id: u32,
        approve: bool,
    },
    EscrowDispute {
        from: AccountName,
        to: AccountName,
        agent: AccountName,
        who: AccountName,
        escrow_id: u32,
    },
    EscrowRelease {
        from: AccountName,
        to: AccountName,
        agent: AccountName,
        who: AccountName,
        receiver: AccountName,
        escrow_id: u32,
        liquid_amount: Asset,
        dollar_amount: Asset,
    },

    // ── Witness ────────────────────────────────────────────────────────────
    WitnessUpdate {
        owner: AccountName,
        url: String,
        block_signing_key: Option<PublicKeyId>,
        props: crate::witness::ChainProperties,
    },
    /// Generalized witness property update: only the keys present in `props`
    /// are changed, the rest of the witness record is left untouched. Keys
    /// recognized: `account_creation_fee`, `maximum_block_size`,
    /// `dollar_interest_rate`, `account_subsidy_limit`, `new_signing_key`,
    /// `dollar_exchange_rate`, `url`.
    WitnessSetProperties {
        owner: AccountName,
        props: std::collections::BTreeMap<String, Vec<u8>>,
    },
    AccountWitnessVote {
        account: AccountName,
        witness: AccountName,
        approve: bool,
    },
    AccountWitnessProxy {
        account: AccountName,
        proxy: AccountName,
    },
    FeedPublish {
        publisher: AccountName,
        exchange_rate: Price,
    },
    /// Deprecated pre-DPoS miner slashing report; retained only for
    /// serialization compatibility (spec §6). Always a no-op.
    ReportOverProduction {
        reporter: AccountName,
        first_block: Vec<u8>,
        second_block: Vec<u8>,
    },

    // ── Free-form / pass-through ───────────────────────────────────────────
    Custom {
        required_auths: Vec<AccountName>,
        id: u16,
        data: Vec<u8>,
    },
    CustomJson {
        required_auths: Vec<AccountName>,
        required_posting_auths: Vec<AccountName>,
        id: String,
        json: String,
    },
    CustomBinary {
        required_owner_auths: Vec<AccountName>,
        required_active_auths: Vec<AccountName>,
        required_posting_auths: Vec<AccountName>,
        id: String,
        data: Vec<u8>,
    },
}

/// A fully-formed transaction: one or more operations plus the signing-key
/// set recovered from its signatures. Signature *verification* is an
/// outer-layer concern (see `quill-crypto`); by the time an evaluator sees a
/// `TransactionContext`, `signing_keys` is already the verified set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub operations: Vec<Operation>,
    pub expiration: Timestamp,
}

/// Per-application context threaded through every evaluator: the current
/// chain time, the hardfork level active at this block, and the signing
/// keys that authorized the enclosing transaction. Hardfork level is
/// passed as plain data rather than read from global mutable state, so
/// evaluators stay pure functions of `(state, context, operation)`.
pub struct TransactionContext<'a> {
    pub head_block_time: Timestamp,
    pub hardfork: u32,
    pub signing_keys: &'a [PublicKeyId],
    /// True while this context represents block production (vs. a
    /// pre-production/relay check); governs `custom_binary`'s deprecation.
    pub is_producing: bool,
}
