use thiserror::Error;

use crate::asset::Symbol;

/// Every error an evaluator can return. Grouped by the evaluator family that
/// raises it, the same way the account/content/market/escrow evaluators are
/// grouped in the state engine. Each variant corresponds to an assertion in
/// the original chain's evaluator code; housekeeping failures are not
/// represented here because they are consensus-fatal invariant violations,
/// not recoverable per-transaction errors.
#[derive(Debug, Error)]
pub enum QuillError {
    // ── Authority ─────────────────────────────────────────────────────────
    #[error("missing required authority for account {0}")]
    MissingAuthority(String),

    #[error("authority weight threshold not met: need {need}, got {got}")]
    AuthorityThresholdNotMet { need: u32, got: u32 },

    #[error("authority recursion exceeds max depth {max}")]
    AuthorityRecursionTooDeep { max: u8 },

    #[error("authority references too many accounts: max {max}")]
    TooManyAuthorityAccounts { max: usize },

    #[error("authority has too many members: max {max}")]
    AuthorityTooLarge { max: usize },

    #[error("authority account self-reference not allowed")]
    AuthoritySelfReference,

    // ── Accounts ───────────────────────────────────────────────────────────
    #[error("invalid account name: {0}")]
    InvalidAccountName(String),

    #[error("account already exists: {0}")]
    AccountAlreadyExists(String),

    #[error("unknown account: {0}")]
    UnknownAccount(String),

    #[error("account creation fee too small: need {need}, got {got}")]
    InsufficientAccountCreationFee { need: String, got: String },

    #[error("owner authority was updated too recently")]
    OwnerUpdateTooSoon,

    #[error("no active account-recovery request for {0}")]
    NoActiveRecoveryRequest(String),

    #[error("account-recovery request has expired")]
    RecoveryRequestExpired,

    #[error("recent owner authority not found in history")]
    RecentOwnerAuthorityNotFound,

    #[error("this operation is permanently disabled")]
    OperationDisabled,

    // ── Assets ─────────────────────────────────────────────────────────────
    #[error("asset amount out of representable range")]
    AssetOverflow,

    #[error("asset symbol mismatch: expected {rhs}, got {lhs}")]
    AssetSymbolMismatch { lhs: Symbol, rhs: Symbol },

    #[error("division by a zero-amount price")]
    PriceDivisionByZero,

    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: String, have: String },

    #[error("amount must be greater than zero")]
    ZeroAmount,

    // ── Vesting ────────────────────────────────────────────────────────────
    #[error("insufficient vesting shares for delegation")]
    InsufficientVestingShares,

    #[error("cannot delegate to self")]
    SelfDelegation,

    #[error("delegation decrease must wait out the return period")]
    DelegationDecreaseTooSoon,

    #[error("too many withdraw-vesting routes: max {max}")]
    TooManyWithdrawRoutes { max: u16 },

    #[error("withdraw route percentages exceed 100%")]
    WithdrawRoutePercentExceeded,

    // ── Content ────────────────────────────────────────────────────────────
    #[error("permlink exceeds maximum length")]
    PermlinkTooLong,

    #[error("comment not found: {author}/{permlink}")]
    CommentNotFound { author: String, permlink: String },

    #[error("comment already exists: {author}/{permlink}")]
    CommentAlreadyExists { author: String, permlink: String },

    #[error("comment depth exceeds maximum")]
    CommentDepthExceeded,

    #[error("cannot edit a comment that has completed its cashout window")]
    CommentCashoutWindowClosed,

    #[error("vote weight must be between -10000 and 10000")]
    InvalidVoteWeight,

    #[error("duplicate vote with identical weight")]
    DuplicateVote,

    #[error("vote has insufficient effective power and would be a no-op")]
    VoteRejectedZeroRshares,

    #[error("too many beneficiary routes: max {max}")]
    TooManyBeneficiaries { max: usize },

    #[error("beneficiaries may only be set before the first vote")]
    BeneficiariesLocked,

    // ── Market ─────────────────────────────────────────────────────────────
    #[error("order not found: {0}")]
    OrderNotFound(u64),

    #[error("limit order expiration exceeds maximum")]
    OrderExpirationTooFar,

    #[error("fill-or-kill order could not be fully filled")]
    FillOrKillNotFilled,

    #[error("order price deviates too far from the feed price")]
    OrderPriceDeviation,

    #[error("conversion request not found: {0}")]
    ConversionRequestNotFound(u64),

    // ── Escrow ─────────────────────────────────────────────────────────────
    #[error("escrow not found: {0}")]
    EscrowNotFound(u32),

    #[error("escrow already ratified")]
    EscrowAlreadyRatified,

    #[error("escrow is not yet ratified by both parties")]
    EscrowNotRatified,

    #[error("escrow has expired")]
    EscrowExpired,

    #[error("escrow has not expired")]
    EscrowNotExpired,

    #[error("escrow is already disputed")]
    EscrowAlreadyDisputed,

    #[error("escrow release amount exceeds remaining balance")]
    EscrowInsufficientBalance,

    #[error("only escrow parties may dispute it")]
    EscrowDisputeNotAuthorized,

    // ── Savings ────────────────────────────────────────────────────────────
    #[error("savings withdraw request not found: {0}")]
    SavingsWithdrawNotFound(u32),

    // ── Witness / global ───────────────────────────────────────────────────
    #[error("witness not found: {0}")]
    WitnessNotFound(String),

    #[error("block signing key is empty")]
    EmptyBlockSigningKey,

    #[error("too many witness votes: max {max}")]
    TooManyWitnessVotes { max: usize },

    #[error("already voted for this witness")]
    DuplicateWitnessVote,

    #[error("no vote exists for this witness")]
    WitnessVoteNotFound,

    #[error("proxy recursion exceeds max depth {max}")]
    ProxyRecursionTooDeep { max: u8 },

    #[error("cannot proxy to self")]
    SelfProxy,

    #[error("proxy chain would revisit an account already in it")]
    ProxyChainCycle,

    // ── Rate limits / content detail ────────────────────────────────────────
    #[error("a top-level post must wait {need}s between posts")]
    RootCommentIntervalTooSoon { need: i64 },

    #[error("a reply must wait {need}s between posts")]
    ReplyIntervalTooSoon { need: i64 },

    #[error("vote changed too many times: max {max}")]
    MaxVoteChangesExceeded { max: i32 },

    #[error("vote interval too short")]
    VoteIntervalTooShort,

    #[error("voter holds insufficient vesting shares to vote")]
    InsufficientVoteVestingShares,

    #[error("a positive vote this close to cashout would not change payout")]
    UpvoteLockout,

    #[error("comment options may only move toward tighter limits")]
    CommentOptionsWidened,

    #[error("json_metadata is not valid JSON")]
    InvalidJsonMetadata,

    #[error("body/title/metadata is not valid UTF-8")]
    InvalidUtf8,

    #[error("comment may not be deleted: it has replies or a positive payout")]
    CommentNotDeletable,

    // ── Misc precondition ────────────────────────────────────────────────────
    #[error("withdraw route not found")]
    WithdrawRouteNotFound,

    #[error("too many savings withdraw requests outstanding: max {max}")]
    TooManySavingsRequests { max: u8 },

    #[error("feed price is null (zero amount)")]
    NullFeedPrice,

    #[error("pending claimed accounts counter would overflow")]
    PendingClaimedAccountsOverflow,

    #[error("no pending claimed accounts available")]
    NoPendingClaimedAccounts,

    #[error("unrecognized or malformed witness property {0}")]
    InvalidWitnessProperty(String),

    #[error("witness_set_properties \"key\" entry does not match the current signing key")]
    WitnessPropertiesKeyMismatch,

    // ── Serialization / storage ────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("{0}")]
    Other(String),
}
