//! The in-memory multi-index object store.
//!
//! Persistent on-disk storage is out of scope for this core (the teacher's
//! `chronx-state::db::StateDb` persists every object to `sled`; this store
//! keeps everything in memory instead, per the design note that only a
//! transactional in-memory store with save-points is required here). Each
//! object family is a `Table` plus whatever secondary ordered indexes its
//! evaluators need to look it up by something other than its id.
//!
//! Undo works by closure: every mutating accessor, while a save-point is
//! active, pushes a `Box<dyn FnOnce(&mut Store)>` onto the current
//! checkpoint's undo log that restores the previous state. Rolling back a
//! save-point replays its undo log in reverse order; committing one just
//! discards the log (and, if a parent save-point is still open, does
//! nothing further — the mutation remains visible, exactly as in a normal
//! nested-transaction commit).

use std::collections::BTreeMap;

use quill_core::account::{
    AccountRecoveryRequest, ChangeRecoveryAccountRequest, ChangeRecoveryRequestId,
    DeclineVotingRequestId, DeclineVotingRightsRequest, OwnerAuthorityHistory, OwnerHistoryId,
    RecoveryRequestId, WithdrawRouteId, WithdrawVestingRoute,
};
use quill_core::asset::{Price, Symbol};
use quill_core::content::{CommentId, CommentVoteId};
use quill_core::error::QuillError;
use quill_core::escrow::{Escrow, EscrowId};
use quill_core::global::{DynamicGlobalProperties, RewardFund};
use quill_core::market::{ConvertRequest, ConvertRequestId, LimitOrder, OrderId};
use quill_core::savings::{SavingsWithdraw, SavingsWithdrawId};
use quill_core::types::AuthorPermlink;
use quill_core::vesting::{
    DelegationExpirationId, DelegationId, VestingDelegation, VestingDelegationExpiration,
};
use quill_core::virtual_ops::VirtualOp;
use quill_core::witness::{FeedHistory, Witness, WitnessId, WitnessSchedule};
use quill_core::{Account, AccountId, AccountName, Comment, CommentVote};

use crate::table::Table;

type Undo = Box<dyn FnOnce(&mut Store)>;

#[derive(Default)]
struct Checkpoint {
    undo: Vec<Undo>,
}

pub struct Store {
    global: DynamicGlobalProperties,
    witness_schedule: WitnessSchedule,
    feed_history: FeedHistory,
    reward_funds: BTreeMap<String, RewardFund>,
    pub virtual_ops: Vec<VirtualOp>,

    accounts: Table<AccountId, Account>,
    accounts_by_name: BTreeMap<AccountName, AccountId>,

    comments: Table<CommentId, Comment>,
    comments_by_author_permlink: BTreeMap<AuthorPermlink, CommentId>,

    votes: Table<CommentVoteId, CommentVote>,
    votes_by_voter_comment: BTreeMap<(AccountName, CommentId), CommentVoteId>,

    orders: Table<OrderId, LimitOrder>,
    orders_by_owner_order_id: BTreeMap<(AccountName, u32), OrderId>,

    convert_requests: Table<ConvertRequestId, ConvertRequest>,

    escrows: Table<EscrowId, Escrow>,
    escrows_by_from_id: BTreeMap<(AccountName, u32), EscrowId>,

    savings_withdraws: Table<SavingsWithdrawId, SavingsWithdraw>,

    delegations: Table<DelegationId, VestingDelegation>,
    delegations_by_pair: BTreeMap<(AccountName, AccountName), DelegationId>,

    delegation_expirations: Table<DelegationExpirationId, VestingDelegationExpiration>,

    withdraw_routes: Table<WithdrawRouteId, WithdrawVestingRoute>,
    withdraw_routes_by_pair: BTreeMap<(AccountName, AccountName), WithdrawRouteId>,

    witnesses: Table<WitnessId, Witness>,
    witnesses_by_name: BTreeMap<AccountName, WitnessId>,

    owner_history: Table<OwnerHistoryId, OwnerAuthorityHistory>,

    recovery_requests: Table<RecoveryRequestId, AccountRecoveryRequest>,
    recovery_requests_by_account: BTreeMap<AccountName, RecoveryRequestId>,

    change_recovery_requests: Table<ChangeRecoveryRequestId, ChangeRecoveryAccountRequest>,
    change_recovery_requests_by_account: BTreeMap<AccountName, ChangeRecoveryRequestId>,

    decline_voting_requests: Table<DeclineVotingRequestId, DeclineVotingRightsRequest>,
    decline_voting_requests_by_account: BTreeMap<AccountName, DeclineVotingRequestId>,

    checkpoints: Vec<Checkpoint>,
}

impl Store {
    pub fn new(global: DynamicGlobalProperties, witness_schedule: WitnessSchedule, feed_history: FeedHistory) -> Self {
        Self {
            global,
            witness_schedule,
            feed_history,
            reward_funds: BTreeMap::new(),
            virtual_ops: Vec::new(),
            accounts: Table::default(),
            accounts_by_name: BTreeMap::new(),
            comments: Table::default(),
            comments_by_author_permlink: BTreeMap::new(),
            votes: Table::default(),
            votes_by_voter_comment: BTreeMap::new(),
            orders: Table::default(),
            orders_by_owner_order_id: BTreeMap::new(),
            convert_requests: Table::default(),
            escrows: Table::default(),
            escrows_by_from_id: BTreeMap::new(),
            savings_withdraws: Table::default(),
            delegations: Table::default(),
            delegations_by_pair: BTreeMap::new(),
            delegation_expirations: Table::default(),
            withdraw_routes: Table::default(),
            withdraw_routes_by_pair: BTreeMap::new(),
            witnesses: Table::default(),
            witnesses_by_name: BTreeMap::new(),
            owner_history: Table::default(),
            recovery_requests: Table::default(),
            recovery_requests_by_account: BTreeMap::new(),
            change_recovery_requests: Table::default(),
            change_recovery_requests_by_account: BTreeMap::new(),
            decline_voting_requests: Table::default(),
            decline_voting_requests_by_account: BTreeMap::new(),
            checkpoints: Vec::new(),
        }
    }

    // ── Save-points ─────────────────────────────────────────────────────────

    pub fn push_savepoint(&mut self) {
        self.checkpoints.push(Checkpoint::default());
    }

    /// Keep every mutation made since the matching `push_savepoint`.
    pub fn commit_savepoint(&mut self) {
        self.checkpoints.pop();
    }

    /// Undo every mutation made since the matching `push_savepoint`, in
    /// reverse order.
    pub fn rollback_savepoint(&mut self) {
        if let Some(checkpoint) = self.checkpoints.pop() {
            for undo in checkpoint.undo.into_iter().rev() {
                undo(self);
            }
        }
    }

    fn record_undo(&mut self, undo: Undo) {
        if let Some(checkpoint) = self.checkpoints.last_mut() {
            checkpoint.undo.push(undo);
        }
    }

    pub fn emit(&mut self, op: VirtualOp) {
        self.virtual_ops.push(op);
    }

    // ── Global singletons ────────────────────────────────────────────────────
    //
    // `global`, `witness_schedule`, `feed_history`, and `reward_funds` back
    // chain-wide invariants (the supply counters spec.md §8 item 1 checks),
    // so their writes must undo exactly like a `Table` entry's: through
    // `modify_*` closures that `record_undo` a restoring snapshot, never by
    // assigning through a public field.

    pub fn global(&self) -> &DynamicGlobalProperties {
        &self.global
    }

    pub fn modify_global<F>(&mut self, f: F)
    where
        F: FnOnce(&mut DynamicGlobalProperties),
    {
        let old = self.global.clone();
        f(&mut self.global);
        self.record_undo(Box::new(move |s| s.global = old));
    }

    pub fn witness_schedule(&self) -> &WitnessSchedule {
        &self.witness_schedule
    }

    pub fn modify_witness_schedule<F>(&mut self, f: F)
    where
        F: FnOnce(&mut WitnessSchedule),
    {
        let old = self.witness_schedule.clone();
        f(&mut self.witness_schedule);
        self.record_undo(Box::new(move |s| s.witness_schedule = old));
    }

    pub fn feed_history(&self) -> &FeedHistory {
        &self.feed_history
    }

    pub fn modify_feed_history<F>(&mut self, f: F)
    where
        F: FnOnce(&mut FeedHistory),
    {
        let old = self.feed_history.clone();
        f(&mut self.feed_history);
        self.record_undo(Box::new(move |s| s.feed_history = old));
    }

    pub fn reward_fund(&self, name: &str) -> Option<&RewardFund> {
        self.reward_funds.get(name)
    }

    /// Inserts or overwrites a reward fund outright. Used by genesis/test
    /// fixtures building a fresh `Store`, where no save-point is open.
    pub fn insert_reward_fund(&mut self, fund: RewardFund) {
        let name = fund.name.clone();
        let old = self.reward_funds.insert(name.clone(), fund);
        self.record_undo(Box::new(move |s| match &old {
            Some(prev) => {
                s.reward_funds.insert(name, prev.clone());
            }
            None => {
                s.reward_funds.remove(&name);
            }
        }));
    }

    pub fn modify_reward_fund<F>(&mut self, name: &str, f: F) -> Result<(), QuillError>
    where
        F: FnOnce(&mut RewardFund),
    {
        let old = self
            .reward_funds
            .get(name)
            .cloned()
            .ok_or_else(|| QuillError::Other(format!("unknown reward fund {name}")))?;
        let entry = self.reward_funds.get_mut(name).expect("checked above");
        f(entry);
        let name = name.to_string();
        self.record_undo(Box::new(move |s| {
            s.reward_funds.insert(name, old);
        }));
        Ok(())
    }

    // ── Accounts ───────────────────────────────────────────────────────────

    pub fn next_account_id(&mut self) -> AccountId {
        self.accounts.next_id()
    }

    pub fn get_account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn get_account_by_name(&self, name: &AccountName) -> Option<&Account> {
        self.accounts_by_name.get(name).and_then(|&id| self.accounts.get(id))
    }

    pub fn account_id_by_name(&self, name: &AccountName) -> Option<AccountId> {
        self.accounts_by_name.get(name).copied()
    }

    pub fn account_exists(&self, name: &AccountName) -> bool {
        self.accounts_by_name.contains_key(name)
    }

    pub fn insert_account(&mut self, account: Account) -> AccountId {
        let id = account.id;
        let name = account.name.clone();
        self.accounts.insert(id, account);
        self.accounts_by_name.insert(name.clone(), id);
        self.record_undo(Box::new(move |s| {
            s.accounts.remove(id);
            s.accounts_by_name.remove(&name);
        }));
        id
    }

    pub fn modify_account<F>(&mut self, id: AccountId, f: F) -> Result<(), QuillError>
    where
        F: FnOnce(&mut Account),
    {
        let old = self
            .accounts
            .get(id)
            .cloned()
            .ok_or_else(|| QuillError::UnknownAccount(format!("{:?}", id)))?;
        let entry = self.accounts.get_mut(id).expect("checked above");
        f(entry);
        self.record_undo(Box::new(move |s| {
            s.accounts.insert(id, old);
        }));
        Ok(())
    }

    pub fn modify_account_by_name<F>(&mut self, name: &AccountName, f: F) -> Result<(), QuillError>
    where
        F: FnOnce(&mut Account),
    {
        let id = self
            .account_id_by_name(name)
            .ok_or_else(|| QuillError::UnknownAccount(name.to_string()))?;
        self.modify_account(id, f)
    }

    pub fn iter_accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    // ── Comments ───────────────────────────────────────────────────────────

    pub fn next_comment_id(&mut self) -> CommentId {
        self.comments.next_id()
    }

    pub fn get_comment(&self, id: CommentId) -> Option<&Comment> {
        self.comments.get(id)
    }

    pub fn get_comment_by_key(&self, key: &AuthorPermlink) -> Option<&Comment> {
        self.comments_by_author_permlink.get(key).and_then(|&id| self.comments.get(id))
    }

    pub fn comment_id_by_key(&self, key: &AuthorPermlink) -> Option<CommentId> {
        self.comments_by_author_permlink.get(key).copied()
    }

    pub fn insert_comment(&mut self, comment: Comment) -> CommentId {
        let id = comment.id;
        let key = AuthorPermlink {
            author: comment.author.clone(),
            permlink: comment.permlink.clone(),
        };
        self.comments.insert(id, comment);
        self.comments_by_author_permlink.insert(key.clone(), id);
        self.record_undo(Box::new(move |s| {
            s.comments.remove(id);
            s.comments_by_author_permlink.remove(&key);
        }));
        id
    }

    pub fn modify_comment<F>(&mut self, id: CommentId, f: F) -> Result<(), QuillError>
    where
        F: FnOnce(&mut Comment),
    {
        let old = self
            .comments
            .get(id)
            .cloned()
            .ok_or_else(|| QuillError::Other("comment not found".into()))?;
        let entry = self.comments.get_mut(id).expect("checked above");
        f(entry);
        self.record_undo(Box::new(move |s| {
            s.comments.insert(id, old);
        }));
        Ok(())
    }

    pub fn remove_comment(&mut self, id: CommentId) -> Option<Comment> {
        let removed = self.comments.remove(id)?;
        let key = AuthorPermlink {
            author: removed.author.clone(),
            permlink: removed.permlink.clone(),
        };
        self.comments_by_author_permlink.remove(&key);
        let restore = removed.clone();
        self.record_undo(Box::new(move |s| {
            s.comments.insert(id, restore.clone());
            s.comments_by_author_permlink.insert(
                AuthorPermlink {
                    author: restore.author.clone(),
                    permlink: restore.permlink.clone(),
                },
                id,
            );
        }));
        Some(removed)
    }

    pub fn iter_comments(&self) -> impl Iterator<Item = &Comment> {
        self.comments.iter()
    }

    // ── Votes ──────────────────────────────────────────────────────────────

    pub fn get_vote(&self, voter: &AccountName, comment: CommentId) -> Option<&CommentVote> {
        self.votes_by_voter_comment
            .get(&(voter.clone(), comment))
            .and_then(|&id| self.votes.get(id))
    }

    pub fn insert_vote(&mut self, vote: CommentVote) -> CommentVoteId {
        let id = self.votes.next_id();
        let key = (vote.voter.clone(), vote.comment);
        let mut vote = vote;
        vote.id = id;
        self.votes.insert(id, vote);
        self.votes_by_voter_comment.insert(key.clone(), id);
        self.record_undo(Box::new(move |s| {
            s.votes.remove(id);
            s.votes_by_voter_comment.remove(&key);
        }));
        id
    }

    pub fn modify_vote<F>(&mut self, id: CommentVoteId, f: F) -> Result<(), QuillError>
    where
        F: FnOnce(&mut CommentVote),
    {
        let old = self
            .votes
            .get(id)
            .cloned()
            .ok_or_else(|| QuillError::Other("vote not found".into()))?;
        let entry = self.votes.get_mut(id).expect("checked above");
        f(entry);
        self.record_undo(Box::new(move |s| {
            s.votes.insert(id, old);
        }));
        Ok(())
    }

    pub fn votes_for_comment(&self, comment: CommentId) -> impl Iterator<Item = &CommentVote> {
        self.votes.iter().filter(move |v| v.comment == comment)
    }

    // ── Limit orders ───────────────────────────────────────────────────────

    pub fn get_order(&self, id: OrderId) -> Option<&LimitOrder> {
        self.orders.get(id)
    }

    pub fn order_by_owner(&self, owner: &AccountName, order_id: u32) -> Option<&LimitOrder> {
        self.orders_by_owner_order_id
            .get(&(owner.clone(), order_id))
            .and_then(|&id| self.orders.get(id))
    }

    pub fn insert_order(&mut self, mut order: LimitOrder) -> OrderId {
        let id = self.orders.next_id();
        order.id = id;
        let key = (order.owner.clone(), order.order_id);
        self.orders.insert(id, order);
        self.orders_by_owner_order_id.insert(key.clone(), id);
        self.record_undo(Box::new(move |s| {
            s.orders.remove(id);
            s.orders_by_owner_order_id.remove(&key);
        }));
        id
    }

    pub fn modify_order<F>(&mut self, id: OrderId, f: F) -> Result<(), QuillError>
    where
        F: FnOnce(&mut LimitOrder),
    {
        let old = self.orders.get(id).cloned().ok_or(QuillError::OrderNotFound(id.get()))?;
        let entry = self.orders.get_mut(id).expect("checked above");
        f(entry);
        self.record_undo(Box::new(move |s| {
            s.orders.insert(id, old);
        }));
        Ok(())
    }

    pub fn remove_order(&mut self, id: OrderId) -> Option<LimitOrder> {
        let removed = self.orders.remove(id)?;
        let key = (removed.owner.clone(), removed.order_id);
        self.orders_by_owner_order_id.remove(&key);
        let restore = removed.clone();
        self.record_undo(Box::new(move |s| {
            s.orders.insert(id, restore.clone());
            s.orders_by_owner_order_id.insert((restore.owner.clone(), restore.order_id), id);
        }));
        Some(removed)
    }

    /// Orders in `market`'s book, cheapest-for-the-taker first (ascending
    /// sell price), ties broken by creation order — mirrors the original
    /// book's `greater<price>, less<id>` composite index for the opposing
    /// side of a match.
    pub fn iter_orders(&self) -> impl Iterator<Item = &LimitOrder> {
        self.orders.iter()
    }

    pub fn orders_in_market(&self, market: (Symbol, Symbol)) -> Vec<&LimitOrder> {
        let mut out: Vec<&LimitOrder> = self
            .orders
            .iter()
            .filter(|o| o.sell_price.market_pair() == market)
            .collect();
        out.sort_by(|a, b| a.sell_price.cmp(&b.sell_price).then(a.id.cmp(&b.id)));
        out
    }

    // ── Convert requests ───────────────────────────────────────────────────

    pub fn insert_convert_request(&mut self, mut req: ConvertRequest) -> ConvertRequestId {
        let id = self.convert_requests.next_id();
        req.id = id;
        self.convert_requests.insert(id, req);
        self.record_undo(Box::new(move |s| {
            s.convert_requests.remove(id);
        }));
        id
    }

    pub fn remove_convert_request(&mut self, id: ConvertRequestId) -> Option<ConvertRequest> {
        let removed = self.convert_requests.remove(id)?;
        let restore = removed.clone();
        self.record_undo(Box::new(move |s| {
            s.convert_requests.insert(id, restore.clone());
        }));
        Some(removed)
    }

    pub fn iter_convert_requests(&self) -> impl Iterator<Item = &ConvertRequest> {
        self.convert_requests.iter()
    }

    // ── Escrow ─────────────────────────────────────────────────────────────

    pub fn get_escrow(&self, from: &AccountName, escrow_id: u32) -> Option<&Escrow> {
        self.escrows_by_from_id
            .get(&(from.clone(), escrow_id))
            .and_then(|&id| self.escrows.get(id))
    }

    pub fn insert_escrow(&mut self, mut escrow: Escrow) -> EscrowId {
        let id = self.escrows.next_id();
        escrow.id = id;
        let key = (escrow.from.clone(), escrow.escrow_id);
        self.escrows.insert(id, escrow);
        self.escrows_by_from_id.insert(key.clone(), id);
        self.record_undo(Box::new(move |s| {
            s.escrows.remove(id);
            s.escrows_by_from_id.remove(&key);
        }));
        id
    }

    pub fn modify_escrow<F>(&mut self, from: &AccountName, escrow_id: u32, f: F) -> Result<(), QuillError>
    where
        F: FnOnce(&mut Escrow),
    {
        let id = self
            .escrows_by_from_id
            .get(&(from.clone(), escrow_id))
            .copied()
            .ok_or(QuillError::EscrowNotFound(escrow_id))?;
        let old = self.escrows.get(id).cloned().unwrap();
        let entry = self.escrows.get_mut(id).unwrap();
        f(entry);
        self.record_undo(Box::new(move |s| {
            s.escrows.insert(id, old);
        }));
        Ok(())
    }

    pub fn iter_escrows(&self) -> impl Iterator<Item = &Escrow> {
        self.escrows.iter()
    }

    pub fn remove_escrow(&mut self, from: &AccountName, escrow_id: u32) -> Option<Escrow> {
        let id = self.escrows_by_from_id.remove(&(from.clone(), escrow_id))?;
        let removed = self.escrows.remove(id)?;
        let restore = removed.clone();
        self.record_undo(Box::new(move |s| {
            s.escrows.insert(id, restore.clone());
            s.escrows_by_from_id.insert((restore.from.clone(), restore.escrow_id), id);
        }));
        Some(removed)
    }

    // ── Savings ────────────────────────────────────────────────────────────

    pub fn insert_savings_withdraw(&mut self, mut w: SavingsWithdraw) -> SavingsWithdrawId {
        let id = self.savings_withdraws.next_id();
        w.id = id;
        self.savings_withdraws.insert(id, w);
        self.record_undo(Box::new(move |s| {
            s.savings_withdraws.remove(id);
        }));
        id
    }

    pub fn savings_withdraw_by_request(&self, from: &AccountName, request_id: u32) -> Option<(SavingsWithdrawId, &SavingsWithdraw)> {
        self.savings_withdraws
            .iter()
            .find(|w| &w.from == from && w.request_id == request_id)
            .map(|w| (w.id, w))
    }

    pub fn remove_savings_withdraw(&mut self, id: SavingsWithdrawId) -> Option<SavingsWithdraw> {
        let removed = self.savings_withdraws.remove(id)?;
        let restore = removed.clone();
        self.record_undo(Box::new(move |s| {
            s.savings_withdraws.insert(id, restore.clone());
        }));
        Some(removed)
    }

    pub fn iter_savings_withdraws(&self) -> impl Iterator<Item = &SavingsWithdraw> {
        self.savings_withdraws.iter()
    }

    // ── Vesting delegation ─────────────────────────────────────────────────

    pub fn get_delegation(&self, delegator: &AccountName, delegatee: &AccountName) -> Option<&VestingDelegation> {
        self.delegations_by_pair
            .get(&(delegator.clone(), delegatee.clone()))
            .and_then(|&id| self.delegations.get(id))
    }

    pub fn insert_delegation(&mut self, mut d: VestingDelegation) -> DelegationId {
        let id = self.delegations.next_id();
        d.id = id;
        let key = (d.delegator.clone(), d.delegatee.clone());
        self.delegations.insert(id, d);
        self.delegations_by_pair.insert(key.clone(), id);
        self.record_undo(Box::new(move |s| {
            s.delegations.remove(id);
            s.delegations_by_pair.remove(&key);
        }));
        id
    }

    pub fn modify_delegation<F>(&mut self, delegator: &AccountName, delegatee: &AccountName, f: F) -> Result<(), QuillError>
    where
        F: FnOnce(&mut VestingDelegation),
    {
        let id = self
            .delegations_by_pair
            .get(&(delegator.clone(), delegatee.clone()))
            .copied()
            .ok_or_else(|| QuillError::Other("delegation not found".into()))?;
        let old = self.delegations.get(id).cloned().unwrap();
        f(self.delegations.get_mut(id).unwrap());
        self.record_undo(Box::new(move |s| {
            s.delegations.insert(id, old);
        }));
        Ok(())
    }

    pub fn remove_delegation(&mut self, delegator: &AccountName, delegatee: &AccountName) -> Option<VestingDelegation> {
        let id = self.delegations_by_pair.remove(&(delegator.clone(), delegatee.clone()))?;
        let removed = self.delegations.remove(id)?;
        let restore = removed.clone();
        self.record_undo(Box::new(move |s| {
            s.delegations.insert(id, restore.clone());
            s.delegations_by_pair.insert((restore.delegator.clone(), restore.delegatee.clone()), id);
        }));
        Some(removed)
    }

    pub fn insert_delegation_expiration(&mut self, mut e: VestingDelegationExpiration) -> DelegationExpirationId {
        let id = self.delegation_expirations.next_id();
        e.id = id;
        self.delegation_expirations.insert(id, e);
        self.record_undo(Box::new(move |s| {
            s.delegation_expirations.remove(id);
        }));
        id
    }

    pub fn remove_delegation_expiration(&mut self, id: DelegationExpirationId) -> Option<VestingDelegationExpiration> {
        let removed = self.delegation_expirations.remove(id)?;
        let restore = removed.clone();
        self.record_undo(Box::new(move |s| {
            s.delegation_expirations.insert(id, restore.clone());
        }));
        Some(removed)
    }

    pub fn iter_delegation_expirations(&self) -> impl Iterator<Item = &VestingDelegationExpiration> {
        self.delegation_expirations.iter()
    }

    // ── Withdraw routes ────────────────────────────────────────────────────

    pub fn withdraw_routes_from(&self, from: &AccountName) -> Vec<&WithdrawVestingRoute> {
        self.withdraw_routes.iter().filter(|r| &r.from_account == from).collect()
    }

    pub fn insert_withdraw_route(&mut self, mut r: WithdrawVestingRoute) -> WithdrawRouteId {
        let id = self.withdraw_routes.next_id();
        r.id = id;
        let key = (r.from_account.clone(), r.to_account.clone());
        self.withdraw_routes.insert(id, r);
        self.withdraw_routes_by_pair.insert(key.clone(), id);
        self.record_undo(Box::new(move |s| {
            s.withdraw_routes.remove(id);
            s.withdraw_routes_by_pair.remove(&key);
        }));
        id
    }

    pub fn route_exists(&self, from: &AccountName, to: &AccountName) -> bool {
        self.withdraw_routes_by_pair.contains_key(&(from.clone(), to.clone()))
    }

    pub fn modify_withdraw_route<F>(&mut self, from: &AccountName, to: &AccountName, f: F) -> Result<(), QuillError>
    where
        F: FnOnce(&mut WithdrawVestingRoute),
    {
        let id = self
            .withdraw_routes_by_pair
            .get(&(from.clone(), to.clone()))
            .copied()
            .ok_or_else(|| QuillError::Other("withdraw route not found".into()))?;
        let old = self.withdraw_routes.get(id).cloned().unwrap();
        f(self.withdraw_routes.get_mut(id).unwrap());
        self.record_undo(Box::new(move |s| {
            s.withdraw_routes.insert(id, old);
        }));
        Ok(())
    }

    pub fn remove_withdraw_route(&mut self, from: &AccountName, to: &AccountName) -> Option<WithdrawVestingRoute> {
        let id = self.withdraw_routes_by_pair.remove(&(from.clone(), to.clone()))?;
        let removed = self.withdraw_routes.remove(id)?;
        let restore = removed.clone();
        self.record_undo(Box::new(move |s| {
            s.withdraw_routes.insert(id, restore.clone());
            s.withdraw_routes_by_pair.insert((restore.from_account.clone(), restore.to_account.clone()), id);
        }));
        Some(removed)
    }

    // ── Witnesses ──────────────────────────────────────────────────────────

    pub fn get_witness(&self, name: &AccountName) -> Option<&Witness> {
        self.witnesses_by_name.get(name).and_then(|&id| self.witnesses.get(id))
    }

    pub fn insert_witness(&mut self, mut w: Witness) -> WitnessId {
        let id = self.witnesses.next_id();
        w.id = id;
        let name = w.owner.clone();
        self.witnesses.insert(id, w);
        self.witnesses_by_name.insert(name.clone(), id);
        self.record_undo(Box::new(move |s| {
            s.witnesses.remove(id);
            s.witnesses_by_name.remove(&name);
        }));
        id
    }

    pub fn modify_witness<F>(&mut self, name: &AccountName, f: F) -> Result<(), QuillError>
    where
        F: FnOnce(&mut Witness),
    {
        let id = self
            .witnesses_by_name
            .get(name)
            .copied()
            .ok_or_else(|| QuillError::WitnessNotFound(name.to_string()))?;
        let old = self.witnesses.get(id).cloned().unwrap();
        f(self.witnesses.get_mut(id).unwrap());
        self.record_undo(Box::new(move |s| {
            s.witnesses.insert(id, old);
        }));
        Ok(())
    }

    pub fn iter_witnesses(&self) -> impl Iterator<Item = &Witness> {
        self.witnesses.iter()
    }

    // ── Owner authority history ────────────────────────────────────────────

    pub fn insert_owner_history(&mut self, mut h: OwnerAuthorityHistory) -> OwnerHistoryId {
        let id = self.owner_history.next_id();
        h.id = id;
        self.owner_history.insert(id, h);
        self.record_undo(Box::new(move |s| {
            s.owner_history.remove(id);
        }));
        id
    }

    pub fn owner_history_for(&self, account: &AccountName) -> Vec<&OwnerAuthorityHistory> {
        self.owner_history.iter().filter(|h| &h.account == account).collect()
    }

    // ── Account recovery requests ─────────────────────────────────────────

    pub fn get_recovery_request(&self, account: &AccountName) -> Option<&AccountRecoveryRequest> {
        self.recovery_requests_by_account
            .get(account)
            .and_then(|&id| self.recovery_requests.get(id))
    }

    pub fn upsert_recovery_request(&mut self, req: AccountRecoveryRequest) {
        if let Some(&id) = self.recovery_requests_by_account.get(&req.account_to_recover) {
            let old = self.recovery_requests.get(id).cloned().unwrap();
            self.recovery_requests.insert(id, req);
            self.record_undo(Box::new(move |s| {
                s.recovery_requests.insert(id, old);
            }));
        } else {
            let id = self.recovery_requests.next_id();
            let mut req = req;
            req.id = id;
            let account = req.account_to_recover.clone();
            self.recovery_requests.insert(id, req);
            self.recovery_requests_by_account.insert(account.clone(), id);
            self.record_undo(Box::new(move |s| {
                s.recovery_requests.remove(id);
                s.recovery_requests_by_account.remove(&account);
            }));
        }
    }

    pub fn iter_recovery_requests(&self) -> impl Iterator<Item = &AccountRecoveryRequest> {
        self.recovery_requests.iter()
    }

    pub fn remove_recovery_request(&mut self, account: &AccountName) -> Option<AccountRecoveryRequest> {
        let id = self.recovery_requests_by_account.remove(account)?;
        let removed = self.recovery_requests.remove(id)?;
        let restore = removed.clone();
        self.record_undo(Box::new(move |s| {
            s.recovery_requests.insert(id, restore.clone());
            s.recovery_requests_by_account.insert(restore.account_to_recover.clone(), id);
        }));
        Some(removed)
    }

    // ── Change-recovery-account requests ──────────────────────────────────

    pub fn get_change_recovery_request(&self, account: &AccountName) -> Option<&ChangeRecoveryAccountRequest> {
        self.change_recovery_requests_by_account
            .get(account)
            .and_then(|&id| self.change_recovery_requests.get(id))
    }

    pub fn upsert_change_recovery_request(&mut self, req: ChangeRecoveryAccountRequest) {
        if let Some(&id) = self.change_recovery_requests_by_account.get(&req.account_to_recover) {
            let old = self.change_recovery_requests.get(id).cloned().unwrap();
            self.change_recovery_requests.insert(id, req);
            self.record_undo(Box::new(move |s| {
                s.change_recovery_requests.insert(id, old);
            }));
        } else {
            let id = self.change_recovery_requests.next_id();
            let mut req = req;
            req.id = id;
            let account = req.account_to_recover.clone();
            self.change_recovery_requests.insert(id, req);
            self.change_recovery_requests_by_account.insert(account.clone(), id);
            self.record_undo(Box::new(move |s| {
                s.change_recovery_requests.remove(id);
                s.change_recovery_requests_by_account.remove(&account);
            }));
        }
    }

    pub fn remove_change_recovery_request(&mut self, account: &AccountName) -> Option<ChangeRecoveryAccountRequest> {
        let id = self.change_recovery_requests_by_account.remove(account)?;
        let removed = self.change_recovery_requests.remove(id)?;
        let restore = removed.clone();
        self.record_undo(Box::new(move |s| {
            s.change_recovery_requests.insert(id, restore.clone());
            s.change_recovery_requests_by_account.insert(restore.account_to_recover.clone(), id);
        }));
        Some(removed)
    }

    pub fn iter_change_recovery_requests(&self) -> impl Iterator<Item = &ChangeRecoveryAccountRequest> {
        self.change_recovery_requests.iter()
    }

    // ── Decline voting rights requests ────────────────────────────────────

    pub fn get_decline_voting_request(&self, account: &AccountName) -> Option<&DeclineVotingRightsRequest> {
        self.decline_voting_requests_by_account
            .get(account)
            .and_then(|&id| self.decline_voting_requests.get(id))
    }

    pub fn insert_decline_voting_request(&mut self, mut r: DeclineVotingRightsRequest) -> DeclineVotingRequestId {
        let id = self.decline_voting_requests.next_id();
        r.id = id;
        let account = r.account.clone();
        self.decline_voting_requests.insert(id, r);
        self.decline_voting_requests_by_account.insert(account.clone(), id);
        self.record_undo(Box::new(move |s| {
            s.decline_voting_requests.remove(id);
            s.decline_voting_requests_by_account.remove(&account);
        }));
        id
    }

    pub fn remove_decline_voting_request(&mut self, account: &AccountName) -> Option<DeclineVotingRightsRequest> {
        let id = self.decline_voting_requests_by_account.remove(account)?;
        let removed = self.decline_voting_requests.remove(id)?;
        let restore = removed.clone();
        self.record_undo(Box::new(move |s| {
            s.decline_voting_requests.insert(id, restore.clone());
            s.decline_voting_requests_by_account.insert(restore.account.clone(), id);
        }));
        Some(removed)
    }

    pub fn iter_decline_voting_requests(&self) -> impl Iterator<Item = &DeclineVotingRightsRequest> {
        self.decline_voting_requests.iter()
    }
}
