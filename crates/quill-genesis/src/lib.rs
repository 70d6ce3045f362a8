//! Builds the genesis `Store` this chain starts from.
//!
//! Grounded on the teacher's `chronx-genesis::apply_genesis` shape (a single
//! entry point that writes state directly, bypassing the normal evaluator
//! path, and asserts the result balances before handing it back) but
//! rebuilt to emit this spec's singletons: `DynamicGlobalProperties`,
//! `WitnessSchedule`, `FeedHistory`, the `post`/`comment` `RewardFund`s, the
//! two reserved accounts, a funded founder account, and the initial witness
//! set. There is no token-distribution time-lock schedule here — vesting is
//! ordinary `create_vesting` accounting (spec.md §4.3) applied once, at
//! genesis time, to the founder's allocation.

pub mod params;

pub use params::{GenesisParams, InitialWitness};

use std::collections::VecDeque;

use quill_core::account::Account;
use quill_core::asset::{Asset, Price, Symbol};
use quill_core::authority::{AccountAuthority, Authority, PublicKeyId};
use quill_core::constants::{CURATION_REWARD_PERCENT, MAX_WITNESSES, NULL_ACCOUNT, PCT_100, TEMP_ACCOUNT};
use quill_core::error::QuillError;
use quill_core::global::{DynamicGlobalProperties, RewardCurve, RewardFund};
use quill_core::types::AccountName;
use quill_core::witness::{ChainProperties, FeedHistory, Witness, WitnessSchedule};
use quill_state::Store;
use tracing::info;

/// The standard `content_constant` used by both reward funds, matching the
/// original chain's `SBD_PRINT_RATE`-unrelated post/comment constant used to
/// flatten the quadratic reward curve near zero rshares.
const DEFAULT_CONTENT_CONSTANT: u128 = 2_000_000_000_000;

/// Build a fresh `Store` from `params`. This is the one and only place
/// tokens and VESTS are created without going through an evaluator — every
/// other mutation in the chain's lifetime flows through
/// `quill_state::apply_operation`.
pub fn build_genesis_state(params: &GenesisParams) -> Result<Store, QuillError> {
    info!(founder = %params.founder_name, "building genesis state");

    validate_params(params)?;

    let median_props = ChainProperties {
        account_creation_fee: params.initial_account_creation_fee,
        max_block_size: params.initial_max_block_size,
        dollar_interest_rate: params.initial_dollar_interest_rate,
        account_subsidy_limit: params.initial_account_subsidy_limit,
    };

    let global = DynamicGlobalProperties {
        head_block_number: 0,
        time: params.genesis_time,
        current_witness: params.initial_witnesses.first().map(|w| w.owner.clone()),
        current_supply: Asset::zero(Symbol::Liquid),
        current_dollar_supply: Asset::zero(Symbol::Dollar),
        total_vesting_fund: Asset::zero(Symbol::Liquid),
        total_vesting_shares: Asset::zero(Symbol::Vests),
        total_reward_fund: Asset::zero(Symbol::Liquid),
        dollar_interest_rate: params.initial_dollar_interest_rate,
        dollar_print_rate: PCT_100,
        average_block_size: 0,
        maximum_block_size: params.initial_max_block_size,
        num_pow_witnesses: 0,
        last_irreversible_block_num: 0,
        vote_power_reserve_rate: params.initial_vote_power_reserve_rate,
    };

    let witness_schedule = WitnessSchedule {
        current_shuffled_witnesses: Vec::new(),
        next_shuffle_block_num: 0,
        num_scheduled_witnesses: 0,
        median_props,
    };

    let feed_history = FeedHistory {
        current_median_history: Price::new(Asset::zero(Symbol::Dollar), Asset::zero(Symbol::Liquid)),
        price_history: VecDeque::new(),
        current_dollar_supply: Asset::zero(Symbol::Dollar),
        print_rate: PCT_100,
    };

    let mut store = Store::new(global, witness_schedule, feed_history);

    seed_reward_funds(&mut store, params.genesis_time);
    seed_reserved_accounts(&mut store, params.genesis_time);
    seed_founder(&mut store, params)?;
    seed_witnesses(&mut store, params)?;

    verify_genesis_invariants(&store)?;

    info!(
        current_supply = %store.global().current_supply,
        total_vesting_shares = %store.global().total_vesting_shares,
        witnesses = store.iter_witnesses().count(),
        "genesis state built"
    );
    Ok(store)
}

fn validate_params(params: &GenesisParams) -> Result<(), QuillError> {
    if params.founder_liquid_balance.symbol != Symbol::Liquid || params.founder_liquid_balance.amount < 0 {
        return Err(QuillError::Other("founder_liquid_balance must be a non-negative LIQUID amount".into()));
    }
    if params.founder_vesting_liquid.symbol != Symbol::Liquid || params.founder_vesting_liquid.amount < 0 {
        return Err(QuillError::Other("founder_vesting_liquid must be a non-negative LIQUID amount".into()));
    }
    if params.initial_account_creation_fee.symbol != Symbol::Liquid {
        return Err(QuillError::Other("initial_account_creation_fee must be denominated in LIQUID".into()));
    }
    if params.initial_dollar_interest_rate > PCT_100 {
        return Err(QuillError::Other("initial_dollar_interest_rate exceeds 100%".into()));
    }
    if params.initial_witnesses.len() > MAX_WITNESSES {
        return Err(QuillError::Other(format!(
            "initial_witnesses exceeds MAX_WITNESSES ({MAX_WITNESSES})"
        )));
    }
    Ok(())
}

/// `post` pays top-level posts, `comment` pays replies (spec.md §4.4's
/// `fund_name_for`). Both start with an empty balance; inflation funds them
/// over time outside the scope of this core (spec.md §1 — block production
/// is an external collaborator).
fn seed_reward_funds(store: &mut Store, genesis_time: quill_core::types::Timestamp) {
    let fund = |name: &str| RewardFund {
        name: name.to_string(),
        reward_balance: Asset::zero(Symbol::Liquid),
        recent_claims: 0,
        last_update: genesis_time,
        content_constant: DEFAULT_CONTENT_CONSTANT,
        author_reward_curve: RewardCurve::Quadratic,
        curation_reward_curve: RewardCurve::Quadratic,
        percent_curation_rewards: CURATION_REWARD_PERCENT,
    };
    store.insert_reward_fund(fund("post"));
    store.insert_reward_fund(fund("comment"));
}

/// `null` burns anything transferred to it; `temp` is the distinguished
/// creator whose new accounts get no default recovery partner (spec.md
/// §4.2). Neither is ever signed for: both get a `weight_threshold` no key
/// or account combination can satisfy.
fn seed_reserved_accounts(store: &mut Store, genesis_time: quill_core::types::Timestamp) {
    let impossible = Authority::new(1);
    for reserved in [NULL_ACCOUNT, TEMP_ACCOUNT] {
        let name = AccountName::new(reserved).expect("reserved account names are valid");
        let id = store.next_account_id();
        let authority = AccountAuthority {
            owner: impossible.clone(),
            active: impossible.clone(),
            posting: impossible.clone(),
            memo_key: PublicKeyId([0u8; 32]),
        };
        let mut account = Account::new(id, name, authority, genesis_time);
        account.can_vote = false;
        store.insert_account(account);
    }
}

fn seed_founder(store: &mut Store, params: &GenesisParams) -> Result<(), QuillError> {
    let id = store.next_account_id();
    let authority = AccountAuthority {
        owner: Authority::new(1).with_key(params.founder_owner_key.clone(), 1),
        active: Authority::new(1).with_key(params.founder_active_key.clone(), 1),
        posting: Authority::new(1).with_key(params.founder_posting_key.clone(), 1),
        memo_key: params.founder_memo_key.clone(),
    };
    let mut founder = Account::new(id, params.founder_name.clone(), authority, params.genesis_time);
    founder.liquid_balance = params.founder_liquid_balance;
    store.insert_account(founder);
    let new_supply = store.global().current_supply.checked_add(&params.founder_liquid_balance)?;
    store.modify_global(|g| g.current_supply = new_supply);

    if params.founder_vesting_liquid.amount > 0 {
        // Degenerate seed price: the pool is empty, so the first deposit
        // mints VESTS 1:1 with the LIQUID amount (spec.md §4.3), exactly as
        // `create_vesting`'s empty-pool branch does.
        let new_vests = Asset::new(params.founder_vesting_liquid.amount, Symbol::Vests);
        let new_vesting_fund = store.global().total_vesting_fund.checked_add(&params.founder_vesting_liquid)?;
        let new_vesting_shares = store.global().total_vesting_shares.checked_add(&new_vests)?;
        store.modify_global(|g| {
            g.total_vesting_fund = new_vesting_fund;
            g.total_vesting_shares = new_vesting_shares;
        });
        store.modify_account_by_name(&params.founder_name, |a| {
            a.vesting_shares = a.vesting_shares.checked_add(&new_vests).expect("just minted, cannot overflow");
        })?;
    }
    Ok(())
}

fn seed_witnesses(store: &mut Store, params: &GenesisParams) -> Result<(), QuillError> {
    let median_props = store.witness_schedule().median_props.clone();

    for (i, w) in params.initial_witnesses.iter().enumerate() {
        if !store.account_exists(&w.owner) {
            // A witness with no prior account gets a minimal one, signed by
            // its own witness key at all three authority levels — good
            // enough to bootstrap block production, not meant to hold funds.
            let id = store.next_account_id();
            let authority = AccountAuthority {
                owner: Authority::new(1).with_key(w.signing_key.clone(), 1),
                active: Authority::new(1).with_key(w.signing_key.clone(), 1),
                posting: Authority::new(1).with_key(w.signing_key.clone(), 1),
                memo_key: w.signing_key.clone(),
            };
            store.insert_account(Account::new(id, w.owner.clone(), authority, params.genesis_time));
        }

        let witness = Witness {
            id: quill_core::witness::WitnessId::new(0),
            owner: w.owner.clone(),
            created: params.genesis_time,
            url: w.url.clone(),
            total_missed: 0,
            last_confirmed_block_num: 0,
            signing_key: w.signing_key.clone(),
            props: median_props.clone(),
            dollar_exchange_rate: Price::new(Asset::zero(Symbol::Dollar), Asset::zero(Symbol::Liquid)),
            last_dollar_exchange_update: params.genesis_time,
            votes: 0,
            virtual_last_update: 0,
            virtual_position: 0,
            virtual_scheduled_time: i as u128,
            running_version: env!("CARGO_PKG_VERSION").to_string(),
        };
        store.insert_witness(witness);
    }

    let mut shuffled: Vec<AccountName> = params.initial_witnesses.iter().map(|w| w.owner.clone()).collect();
    shuffled.sort();
    shuffled.truncate(MAX_WITNESSES);
    let num_scheduled_witnesses = shuffled.len() as u8;
    store.modify_witness_schedule(|w| {
        w.num_scheduled_witnesses = num_scheduled_witnesses;
        w.current_shuffled_witnesses = shuffled;
    });
    Ok(())
}

/// Re-derives the supply invariants of spec.md §8 item 1 from the objects
/// just inserted, so a broken genesis fails loudly instead of silently
/// diverging every node that loads it.
fn verify_genesis_invariants(store: &Store) -> Result<(), QuillError> {
    let mut liquid_sum = Asset::zero(Symbol::Liquid);
    let mut dollar_sum = Asset::zero(Symbol::Dollar);
    let mut vests_sum = Asset::zero(Symbol::Vests);
    for account in store.iter_accounts() {
        liquid_sum = liquid_sum.checked_add(&account.liquid_balance)?;
        dollar_sum = dollar_sum.checked_add(&account.dollar_balance)?;
        vests_sum = vests_sum.checked_add(&account.vesting_shares)?;
    }
    if liquid_sum.amount != store.global().current_supply.amount {
        return Err(QuillError::Other(format!(
            "genesis LIQUID invariant broken: accounts sum {liquid_sum} != current_supply {}",
            store.global().current_supply
        )));
    }
    if dollar_sum.amount != store.global().current_dollar_supply.amount {
        return Err(QuillError::Other(format!(
            "genesis DOLLAR invariant broken: accounts sum {dollar_sum} != current_dollar_supply {}",
            store.global().current_dollar_supply
        )));
    }
    if vests_sum.amount != store.global().total_vesting_shares.amount {
        return Err(QuillError::Other(format!(
            "genesis VESTS invariant broken: accounts sum {vests_sum} != total_vesting_shares {}",
            store.global().total_vesting_shares
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> PublicKeyId {
        PublicKeyId([byte; 32])
    }

    fn test_params() -> GenesisParams {
        GenesisParams {
            genesis_time: 1_700_000_000,
            founder_name: AccountName::new("founder1").unwrap(),
            founder_owner_key: key(1),
            founder_active_key: key(2),
            founder_posting_key: key(3),
            founder_memo_key: key(4),
            founder_liquid_balance: Asset::new(1_000_000_000, Symbol::Liquid),
            founder_vesting_liquid: Asset::new(500_000_000, Symbol::Liquid),
            initial_witnesses: vec![
                InitialWitness {
                    owner: AccountName::new("witness-a").unwrap(),
                    signing_key: key(10),
                    url: "https://example.test/a".to_string(),
                },
                InitialWitness {
                    owner: AccountName::new("witness-b").unwrap(),
                    signing_key: key(11),
                    url: "https://example.test/b".to_string(),
                },
            ],
            initial_account_creation_fee: Asset::new(1_000, Symbol::Liquid),
            initial_max_block_size: 2 * 1024 * 1024,
            initial_dollar_interest_rate: 0,
            initial_account_subsidy_limit: 0,
            initial_vote_power_reserve_rate: 10,
        }
    }

    #[test]
    fn builds_reserved_accounts_with_impossible_authority() {
        let store = build_genesis_state(&test_params()).unwrap();
        for reserved in [NULL_ACCOUNT, TEMP_ACCOUNT] {
            let name = AccountName::new(reserved).unwrap();
            let account = store.get_account_by_name(&name).unwrap();
            assert!(account.authority.owner.is_impossible());
            assert!(account.authority.active.is_impossible());
            assert!(account.authority.posting.is_impossible());
        }
    }

    #[test]
    fn founder_receives_balance_and_vesting() {
        let params = test_params();
        let store = build_genesis_state(&params).unwrap();
        let founder = store.get_account_by_name(&params.founder_name).unwrap();
        assert_eq!(founder.liquid_balance, params.founder_liquid_balance);
        assert_eq!(founder.vesting_shares.amount, params.founder_vesting_liquid.amount);
        assert_eq!(store.global().current_supply, params.founder_liquid_balance);
        assert_eq!(store.global().total_vesting_fund, params.founder_vesting_liquid);
    }

    #[test]
    fn witness_schedule_is_populated_and_sorted() {
        let store = build_genesis_state(&test_params()).unwrap();
        assert_eq!(store.witness_schedule().num_scheduled_witnesses, 2);
        assert_eq!(
            store.witness_schedule().current_shuffled_witnesses,
            vec![AccountName::new("witness-a").unwrap(), AccountName::new("witness-b").unwrap()]
        );
        assert!(store.get_witness(&AccountName::new("witness-a").unwrap()).is_some());
    }

    #[test]
    fn rejects_negative_founder_balance() {
        let mut params = test_params();
        params.founder_liquid_balance = Asset::new(-1, Symbol::Liquid);
        assert!(build_genesis_state(&params).is_err());
    }

    #[test]
    fn rejects_too_many_initial_witnesses() {
        let mut params = test_params();
        params.initial_witnesses = (0..(MAX_WITNESSES + 1))
            .map(|i| InitialWitness {
                owner: AccountName::new(format!("witness{i:02}")).unwrap(),
                signing_key: key(i as u8),
                url: "https://example.test".to_string(),
            })
            .collect();
        assert!(build_genesis_state(&params).is_err());
    }
}
