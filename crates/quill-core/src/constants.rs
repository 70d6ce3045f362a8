//! ─── Protocol constants ──────────────────────────────────────────────────────
//!
//! Authoritative values for the chain's three native assets and the
//! consensus parameters that govern vesting, content rewards, market
//! matching, escrow timers, and witness scheduling.

// ── Asset precision ──────────────────────────────────────────────────────────

/// LIQUID (the transferable native token) precision: 3 decimal places.
pub const LIQUID_PRECISION: u8 = 3;
/// DOLLAR (the USD-pegged token) precision: 3 decimal places.
pub const DOLLAR_PRECISION: u8 = 3;
/// VESTS (the non-transferable stake token) precision: 6 decimal places.
pub const VESTS_PRECISION: u8 = 6;

/// Largest representable fixed-point amount (matches the original chain's
/// `MAX_SATOSHIS`, i.e. `int64` max for a decimal amount).
pub const MAX_SHARE_SUPPLY: i64 = 1_000_000_000_000_000;

// ── Time ──────────────────────────────────────────────────────────────────────

pub const BLOCK_INTERVAL_SECS: u32 = 3;
pub const BLOCKS_PER_YEAR: u32 = 365 * 24 * 3600 / BLOCK_INTERVAL_SECS;
pub const BLOCKS_PER_DAY: u32 = 24 * 3600 / BLOCK_INTERVAL_SECS;
pub const BLOCKS_PER_HOUR: u32 = 3600 / BLOCK_INTERVAL_SECS;

// ── Vesting ───────────────────────────────────────────────────────────────────

/// Withdrawals are paid out in this many installments.
pub const VESTING_WITHDRAW_INTERVALS: u32 = 13;
/// Seconds between successive vesting-withdrawal installments (1 week).
pub const VESTING_WITHDRAW_INTERVAL_SECS: i64 = 7 * 24 * 3600;
/// A delegation may not be revoked faster than the withdraw period.
pub const DELEGATION_RETURN_PERIOD_SECS: i64 = VESTING_WITHDRAW_INTERVAL_SECS;
/// Maximum number of concurrent withdraw-vesting routes per account.
pub const MAX_WITHDRAW_ROUTES: u16 = 10;

// ── Content / voting ──────────────────────────────────────────────────────────

/// Window after creation during which a post/comment accrues rewards.
pub const CASHOUT_WINDOW_SECS: i64 = 7 * 24 * 3600;
/// A post may not be cashed out again within this window of its last payout
/// when it receives a late vote (the "second cashout" window).
pub const SECOND_CASHOUT_WINDOW_SECS: i64 = 30 * 24 * 3600;
/// Upvote/downvote power fully regenerates over this many seconds.
pub const VOTE_REGENERATION_SECS: i64 = 5 * 24 * 3600;
/// A single vote may use at most this fraction of regenerated power
/// (in the original chain's terms: 1 / (vote_regeneration_seconds / power)).
pub const VOTE_POWER_MAX_PERCENT: u16 = 10_000; // 100.00%
/// Minimum seconds between two votes by the same account on the same
/// content before the second is not considered a "fresh" revote for
/// curation-weight purposes.
pub const MIN_VOTE_INTERVAL_SECS: i64 = 3;
/// Reverse-auction window: curation weight ramps linearly to full value
/// over this many seconds after a post is created.
pub const REVERSE_AUCTION_WINDOW_SECS: i64 = 30 * 60;
/// Maximum comment nesting depth.
pub const MAX_COMMENT_DEPTH: u16 = 0xFFFF;
/// Minimum time between two top-level posts by the same account.
pub const MIN_ROOT_COMMENT_INTERVAL_SECS: i64 = 5 * 60;
/// Minimum time between two replies by the same account.
pub const MIN_REPLY_INTERVAL_SECS: i64 = 3;
/// A vote record may be changed at most this many times before it is
/// rejected outright.
pub const MAX_VOTE_CHANGES: i32 = 5;
/// Minimum effective vesting shares (VESTS) a voter must hold for a vote to
/// be accepted.
pub const MIN_VOTE_VESTING_SHARES: i64 = 1_000_000;
/// Subtracted from a vote's computed `abs_rshares` to keep dust votes from
/// moving payout.
pub const VOTE_DUST_THRESHOLD: i64 = 1_000;
/// A positive vote inside this window before `cashout_time` is rejected;
/// negative (downvoting) votes remain allowed.
pub const UPVOTE_LOCKOUT_SECS: i64 = 12 * 3600;
/// Seconds per day, used in the voting-power consumption formula.
pub const SECONDS_PER_DAY: i64 = 24 * 3600;
/// Percent (basis points out of 10000) of the author reward that is paid in
/// VESTS rather than LIQUID/DOLLAR, when the author has not opted for 100%
/// DOLLAR or 100% LIQUID payout.
pub const DEFAULT_VESTING_SHARE_PERCENT: u16 = 5_000;
/// Curation rewards are this percent (basis points) of the total content
/// reward pool for a post; the remainder goes to the author.
pub const CURATION_REWARD_PERCENT: u16 = 2_500;

// ── Reward curve ──────────────────────────────────────────────────────────────

/// recent_claims decays by this fraction every full day (expressed as
/// numerator over 2^64, matching the original's fixed-point decay).
pub const RECENT_RSHARES_DECAY_SECS: i64 = 15 * 24 * 3600;
/// Content-reward fund percent (basis points) of total inflation distributed
/// to `RewardFund` per block, the remainder goes to vesting/witness pay.
pub const CONTENT_REWARD_PERCENT: u16 = 7_500;

// ── Market ────────────────────────────────────────────────────────────────────

/// Maximum lifetime for a limit order (28 days).
pub const MAX_LIMIT_ORDER_EXPIRATION_SECS: i64 = 28 * 24 * 3600;
/// Conversion requests (DOLLAR -> LIQUID) settle after this delay (3.5 days).
pub const CONVERSION_DELAY_SECS: i64 = 302_400;
/// Maximum permitted deviation (basis points) between the feed price and a
/// limit order's implied price before the order is rejected as a market
/// deviation (`ZATTERA_MAX_LIMIT_ORDER_EXPIRATION`-adjacent sanity bound).
pub const MAX_FEED_DEVIATION_BPS: u32 = 10_000;
/// A published feed price older than this is ignored by the median
/// computation.
pub const MAX_FEED_AGE_SECS: i64 = 7 * 24 * 3600;
/// At least this many live witness feeds are required to compute a median;
/// below it, `FeedHistory` keeps its previous median unchanged.
pub const MIN_FEEDS: usize = MAX_WITNESSES / 3;
/// Length (in published-feed entries) of the feed-history ring buffer.
pub const FEED_HISTORY_RING_LEN: usize = 12 * 7;

// ── Feed / print rate ─────────────────────────────────────────────────────────

pub const FEED_HISTORY_WINDOW: u32 = 24; // hours, 1 feed/hour assumed
pub const FEED_INTERVAL_SECS: i64 = 3600;
/// Below this DOLLAR/LIQUID market-cap percent, the print rate ramps to 100%.
pub const DOLLAR_START_PERCENT: u16 = 200; // 2.00%
/// Above this percent, printing DOLLAR is fully suspended.
pub const DOLLAR_STOP_PERCENT: u16 = 500; // 5.00%

// ── Escrow ────────────────────────────────────────────────────────────────────

pub const MAX_ESCROW_MEMO_BYTES: usize = 2048;

// ── Savings ───────────────────────────────────────────────────────────────────

pub const SAVINGS_WITHDRAW_DELAY_SECS: i64 = 3 * 24 * 3600;
/// Maximum concurrent pending withdrawals per owner account.
pub const SAVINGS_WITHDRAW_REQUEST_LIMIT: u8 = 100;

// ── Recovery ──────────────────────────────────────────────────────────────────

/// Window during which an account-recovery request remains valid.
pub const ACCOUNT_RECOVERY_REQUEST_EXPIRATION_SECS: i64 = 24 * 3600;
/// Owner authority changes are archived for this long for recovery lookups.
pub const OWNER_AUTH_RECOVERY_PERIOD_SECS: i64 = 30 * 24 * 3600;
/// Minimum time between two owner-key updates on the same account.
pub const OWNER_UPDATE_LIMIT_SECS: i64 = 60 * 60;
/// Restriction window applied to an account immediately after recovery.
pub const OWNER_AUTH_HISTORY_TRACKING_PERIOD_SECS: i64 = OWNER_AUTH_RECOVERY_PERIOD_SECS;

// ── Account creation / authority limits ───────────────────────────────────────

pub const MAX_SIG_CHECK_DEPTH: u8 = 2;
pub const MAX_SIG_CHECK_ACCOUNTS: usize = 125;
pub const MAX_AUTHORITY_MEMBERSHIP: usize = 40;
pub const MAX_ACCOUNT_NAME_LENGTH: usize = 16;
pub const MAX_ACCOUNT_WITNESS_VOTES: usize = 30;
pub const MAX_PROXY_RECURSION_DEPTH: u8 = 4;

/// Minimum fee (LIQUID) required to create a new account, subject to the
/// witness-voted median in `DynamicGlobalProperties`.
pub const MIN_ACCOUNT_CREATION_FEE: i64 = 0;
/// `account_create_with_delegation`'s fee-to-delegation conversion modifier.
pub const CREATE_ACCOUNT_WITH_MODIFIER: i64 = 30;
/// `account_create_with_delegation`'s required delegation-to-fee ratio.
pub const CREATE_ACCOUNT_DELEGATION_RATIO: i64 = 5;
/// A vesting delegation created alongside account creation cannot be
/// withdrawn for this long.
pub const CREATE_ACCOUNT_DELEGATION_TIME_SECS: i64 = 30 * 24 * 3600;
/// Owner authority changes must be separated by at least this long.
pub const OWNER_UPDATE_LIMIT: i64 = OWNER_UPDATE_LIMIT_SECS;
/// Maximum time a submitted transaction may be valid for, measured from
/// `head_block_time`.
pub const MAX_TIME_UNTIL_EXPIRATION_SECS: i64 = 3600;

// ── Witness schedule ──────────────────────────────────────────────────────────

pub const MAX_WITNESSES: usize = 21;
pub const MAX_VOTED_WITNESSES: usize = 20;
pub const MAX_RUNNER_WITNESSES: usize = 1;
pub const MAX_MINER_WITNESSES: usize = 0;
pub const WITNESS_MISSED_BLOCKS_THRESHOLD: u32 = 200;
/// Floor on `maximum_block_size` witnesses may propose.
pub const MIN_BLOCK_SIZE_LIMIT: u32 = 115 * 1024;
/// Ceiling `witness_update` enforces while consensus is active.
pub const SOFT_MAX_BLOCK_SIZE: u32 = 2 * 1024 * 1024;

// ── Memo / string limits ──────────────────────────────────────────────────────

pub const MAX_MEMO_BYTES: usize = 2048;
pub const MAX_PERMLINK_BYTES: usize = 256;
pub const MAX_JSON_METADATA_BYTES: usize = 8192;
pub const MAX_CUSTOM_JSON_BYTES: usize = 8192;
pub const MAX_BENEFICIARIES: usize = 8;
/// 100% expressed in the basis-point scale used throughout reward splits,
/// vote weights, and witness-property percentages.
pub const PCT_100: u16 = 10_000;

// ── Reserved accounts ─────────────────────────────────────────────────────────

/// Balances sent here are burned: supply is debited but never re-credited.
pub const NULL_ACCOUNT: &str = "null";
/// The distinguished creator whose new accounts get no default recovery
/// partner (the top-voted witness stands in until one is chosen).
pub const TEMP_ACCOUNT: &str = "temp";
