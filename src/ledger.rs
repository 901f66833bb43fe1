//! Ledger Store
//!
//! Single source of truth for user balances and bet records.
//! - All state lives behind one `RwLock`; readers share it, writers are exclusive
//! - Every read-modify-write (debit, credit, status transition, find-or-create)
//!   runs inside one write guard, so no partial effect is ever observable
//! - Bets are indexed by event for settlement lookup

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{validate_wager, Bet, BetStatus, User};

/// Starting balance for users created without an explicit one
pub const DEFAULT_STARTING_BALANCE: Decimal = dec!(1000);

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Default)]
struct LedgerState {
    users: HashMap<String, User>,
    bets: HashMap<String, Bet>,
    /// event_id -> bet ids, in placement order
    bets_by_event: HashMap<String, Vec<String>>,
}

impl LedgerState {
    fn has_open_bets(&self, user_id: &str) -> bool {
        self.bets
            .values()
            .any(|b| b.user_id == user_id && b.status == BetStatus::Placed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerStats {
    pub users: usize,
    pub bets: usize,
    pub open_bets: usize,
    pub won_bets: usize,
    pub lost_bets: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub open_stake: Decimal,
}

// ============================================================================
// LEDGER STORE
// ============================================================================

#[derive(Debug)]
pub struct LedgerStore {
    state: RwLock<LedgerState>,
    default_balance: Decimal,
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::with_default_balance(DEFAULT_STARTING_BALANCE)
    }

    pub fn with_default_balance(default_balance: Decimal) -> Self {
        info!("📒 Ledger store initialized (default balance: {})", default_balance);
        Self {
            state: RwLock::new(LedgerState::default()),
            default_balance,
        }
    }

    pub fn default_balance(&self) -> Decimal {
        self.default_balance
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerState>> {
        Ok(self.state.read()?)
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerState>> {
        Ok(self.state.write()?)
    }

    // ===== BETS =====

    /// Debit the stake and record a new `placed` bet, atomically.
    /// The user must already exist.
    pub fn place_bet(&self, user_id: &str, event_id: &str, odds: Decimal, stake: Decimal) -> LedgerResult<Bet> {
        validate_wager(odds, stake)?;

        let mut state = self.write()?;

        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::not_found("User", user_id))?;

        if user.balance < stake {
            warn!("🚫 Bet rejected for {}: balance {} < stake {}", user_id, user.balance, stake);
            return Err(LedgerError::insufficient_funds(user.balance, stake));
        }

        let remaining = user.balance - stake;
        let fits = stake
            .checked_mul(odds)
            .and_then(|payout| remaining.checked_add(payout))
            .is_some();
        if !fits {
            warn!("🚫 Bet rejected for {}: payout of {} @ {} exceeds ledger range", user_id, stake, odds);
            return Err(LedgerError::BadRequest(format!(
                "potential payout of stake {} at odds {} is too large",
                stake, odds
            )));
        }

        user.balance = remaining;
        user.touch();

        let bet = Bet::new(user_id, event_id, odds, stake);
        state
            .bets_by_event
            .entry(event_id.to_string())
            .or_default()
            .push(bet.id.clone());
        state.bets.insert(bet.id.clone(), bet.clone());

        info!("🎯 Bet {}: {} wagered {} on {} @ {}", bet.id, user_id, stake, event_id, odds);
        Ok(bet)
    }

    pub fn get_bet(&self, bet_id: &str) -> LedgerResult<Bet> {
        self.read()?
            .bets
            .get(bet_id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("Bet", bet_id))
    }

    /// Open (`placed`) bets for an event. Unknown events yield an empty list.
    pub fn find_bets_by_event(&self, event_id: &str) -> LedgerResult<Vec<Bet>> {
        let state = self.read()?;
        let bets = match state.bets_by_event.get(event_id) {
            Some(ids) => ids
                .iter()
                .filter_map(|id| state.bets.get(id))
                .filter(|b| b.status == BetStatus::Placed)
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        Ok(bets)
    }

    /// All bets owned by a user, newest first
    pub fn list_bets_for_user(&self, user_id: &str) -> LedgerResult<Vec<Bet>> {
        let state = self.read()?;
        if !state.users.contains_key(user_id) {
            return Err(LedgerError::not_found("User", user_id));
        }
        let mut bets: Vec<Bet> = state
            .bets
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bets)
    }

    /// Move a `placed` bet to `won` or `lost`; a win credits `stake * odds`
    /// in the same critical section. A bet that is already settled is a `Conflict`.
    pub fn settle_bet(&self, bet_id: &str, status: BetStatus) -> LedgerResult<Bet> {
        if status == BetStatus::Placed {
            return Err(LedgerError::BadRequest(format!(
                "bet {} cannot be settled to status {}",
                bet_id, status
            )));
        }

        let mut state = self.write()?;
        let state = &mut *state;

        let bet = state
            .bets
            .get_mut(bet_id)
            .ok_or_else(|| LedgerError::not_found("Bet", bet_id))?;

        if bet.status.is_settled() {
            return Err(LedgerError::Conflict(format!(
                "bet {} already settled with status {}",
                bet_id, bet.status
            )));
        }

        // Resolve the owner and the new balance before touching the bet,
        // so a failure leaves both untouched
        if status == BetStatus::Won {
            let user = state.users.get_mut(&bet.user_id).ok_or_else(|| {
                error!("❌ User {} missing for winning bet {}", bet.user_id, bet_id);
                LedgerError::Internal(format!(
                    "user {} not found for winning bet {}",
                    bet.user_id, bet_id
                ))
            })?;
            let (payout, credited) = bet
                .payout()
                .and_then(|p| user.balance.checked_add(p).map(|credited| (p, credited)))
                .ok_or_else(|| {
                    error!("❌ Payout overflow crediting {} for bet {}", user.id, bet_id);
                    LedgerError::Internal(format!(
                        "payout for bet {} overflows balance of user {}",
                        bet_id, user.id
                    ))
                })?;
            user.balance = credited;
            user.touch();
            info!("🏆 Payout: {} won {} on bet {}", user.id, payout, bet_id);
        }

        bet.status = status;
        bet.settled_at = Some(Utc::now());
        debug!("Bet {} settled as {}", bet_id, status);

        Ok(bet.clone())
    }

    // ===== USERS =====

    pub fn create_user(&self, user_id: &str, initial_balance: Option<Decimal>) -> LedgerResult<User> {
        if user_id.trim().is_empty() {
            return Err(LedgerError::BadRequest("user ID cannot be empty".into()));
        }
        let balance = initial_balance.unwrap_or(self.default_balance);
        if balance < Decimal::ZERO {
            return Err(LedgerError::BadRequest(format!(
                "initial balance cannot be negative, got {}",
                balance
            )));
        }

        let mut state = self.write()?;
        if state.users.contains_key(user_id) {
            return Err(LedgerError::Conflict(format!("user with ID '{}' already exists", user_id)));
        }

        let user = User::new(user_id, balance);
        state.users.insert(user_id.to_string(), user.clone());

        info!("👤 Registered {} with {}", user_id, balance);
        Ok(user)
    }

    pub fn get_user(&self, user_id: &str) -> LedgerResult<User> {
        self.read()?
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("User", user_id))
    }

    pub fn list_users(&self) -> LedgerResult<Vec<User>> {
        let mut users: Vec<User> = self.read()?.users.values().cloned().collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }

    /// Refreshes the modification timestamp
    pub fn update_user(&self, user_id: &str) -> LedgerResult<User> {
        let mut state = self.write()?;
        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::not_found("User", user_id))?;
        user.touch();
        Ok(user.clone())
    }

    /// Users owning open bets cannot be deleted
    pub fn delete_user(&self, user_id: &str) -> LedgerResult<()> {
        let mut state = self.write()?;
        if !state.users.contains_key(user_id) {
            return Err(LedgerError::not_found("User", user_id));
        }
        if state.has_open_bets(user_id) {
            return Err(LedgerError::Conflict(format!(
                "user '{}' has open bets and cannot be deleted",
                user_id
            )));
        }
        state.users.remove(user_id);
        info!("🗑️  Deleted user {}", user_id);
        Ok(())
    }

    /// Return the existing user or insert one with the default balance.
    /// Insert-or-get happens under a single write guard, so concurrent
    /// callers for the same id all observe the same record.
    pub fn find_or_create_user(&self, user_id: &str) -> LedgerResult<User> {
        if user_id.trim().is_empty() {
            return Err(LedgerError::BadRequest("user ID cannot be empty".into()));
        }
        if let Some(user) = self.read()?.users.get(user_id) {
            return Ok(user.clone());
        }

        let mut state = self.write()?;
        let default_balance = self.default_balance;
        let user = state.users.entry(user_id.to_string()).or_insert_with(|| {
            info!("🆕 New user {} created with {}", user_id, default_balance);
            User::new(user_id, default_balance)
        });
        Ok(user.clone())
    }

    /// User record and all of their bets, read under one guard
    pub fn get_account(&self, user_id: &str) -> LedgerResult<(User, Vec<Bet>)> {
        let state = self.read()?;
        let user = state
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("User", user_id))?;
        let bets = state
            .bets
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        Ok((user, bets))
    }

    pub fn get_user_balance(&self, user_id: &str) -> LedgerResult<Decimal> {
        self.read()?
            .users
            .get(user_id)
            .map(|u| u.balance)
            .ok_or_else(|| LedgerError::not_found("User", user_id))
    }

    pub fn stats(&self) -> LedgerResult<LedgerStats> {
        let state = self.read()?;
        let mut stats = LedgerStats {
            users: state.users.len(),
            bets: state.bets.len(),
            open_bets: 0,
            won_bets: 0,
            lost_bets: 0,
            open_stake: Decimal::ZERO,
        };
        for bet in state.bets.values() {
            match bet.status {
                BetStatus::Placed => {
                    stats.open_bets += 1;
                    stats.open_stake = stats.open_stake.saturating_add(bet.stake);
                }
                BetStatus::Won => stats.won_bets += 1,
                BetStatus::Lost => stats.lost_bets += 1,
            }
        }
        Ok(stats)
    }

    /// Drops a user while bypassing the open-bet check
    #[cfg(test)]
    pub(crate) fn remove_user_unchecked(&self, user_id: &str) {
        self.state.write().unwrap().users.remove(user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_user(balance: Decimal) -> LedgerStore {
        let store = LedgerStore::new();
        store.create_user("u1", Some(balance)).unwrap();
        store
    }

    #[test]
    fn test_place_bet_debits_stake() {
        let store = store_with_user(dec!(1000));

        let bet = store.place_bet("u1", "e1", dec!(2.0), dec!(100)).unwrap();
        assert_eq!(bet.status, BetStatus::Placed);
        assert_eq!(store.get_user_balance("u1").unwrap(), dec!(900));
        assert_eq!(store.get_bet(&bet.id).unwrap(), bet);
    }

    #[test]
    fn test_place_bet_insufficient_funds_leaves_balance() {
        let store = store_with_user(dec!(50));

        let err = store.place_bet("u1", "e1", dec!(2.0), dec!(50.01)).unwrap_err();
        assert!(matches!(err, LedgerError::BadRequest(ref m) if m.contains("insufficient")));
        assert_eq!(store.get_user_balance("u1").unwrap(), dec!(50));
        assert!(store.find_bets_by_event("e1").unwrap().is_empty());
    }

    #[test]
    fn test_place_bet_unknown_user() {
        let store = LedgerStore::new();
        let err = store.place_bet("ghost", "e1", dec!(2.0), dec!(10)).unwrap_err();
        assert_eq!(err, LedgerError::not_found("User", "ghost"));
    }

    #[test]
    fn test_place_bet_rejects_bad_wager() {
        let store = store_with_user(dec!(100));
        assert!(matches!(
            store.place_bet("u1", "e1", dec!(1.0), dec!(10)),
            Err(LedgerError::BadRequest(_))
        ));
        assert!(matches!(
            store.place_bet("u1", "e1", dec!(3.0), dec!(0)),
            Err(LedgerError::BadRequest(_))
        ));
        assert_eq!(store.get_user_balance("u1").unwrap(), dec!(100));
    }

    #[test]
    fn test_settle_twice_conflicts_and_credits_once() {
        let store = store_with_user(dec!(1000));
        let bet = store.place_bet("u1", "e1", dec!(2.0), dec!(100)).unwrap();

        let settled = store.settle_bet(&bet.id, BetStatus::Won).unwrap();
        assert_eq!(settled.status, BetStatus::Won);
        assert!(settled.settled_at.is_some());
        assert_eq!(store.get_user_balance("u1").unwrap(), dec!(1100));

        let err = store.settle_bet(&bet.id, BetStatus::Won).unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));
        assert_eq!(store.get_user_balance("u1").unwrap(), dec!(1100));

        // a settled bet is immutable in either direction
        assert!(matches!(store.settle_bet(&bet.id, BetStatus::Lost), Err(LedgerError::Conflict(_))));
    }

    #[test]
    fn test_oversized_wager_is_rejected_without_poisoning() {
        let store = store_with_user(dec!(50000000000000000000000000000));
        store.create_user("bystander", Some(dec!(10))).unwrap();

        let err = store
            .place_bet("u1", "e1", dec!(2.0), dec!(50000000000000000000000000000))
            .unwrap_err();
        assert!(matches!(err, LedgerError::BadRequest(ref m) if m.contains("too large")));
        assert_eq!(store.get_user_balance("u1").unwrap(), dec!(50000000000000000000000000000));
        assert!(store.find_bets_by_event("e1").unwrap().is_empty());
        assert_eq!(store.get_user_balance("bystander").unwrap(), dec!(10));
    }

    #[test]
    fn test_overflowing_credit_is_internal_and_leaves_bet_open() {
        let store = store_with_user(dec!(40000000000000000000000000000));
        let first = store.place_bet("u1", "e1", dec!(4), dec!(10000000000000000000000000000)).unwrap();
        let second = store.place_bet("u1", "e2", dec!(4), dec!(10000000000000000000000000000)).unwrap();

        store.settle_bet(&first.id, BetStatus::Won).unwrap();
        assert_eq!(store.get_user_balance("u1").unwrap(), dec!(60000000000000000000000000000));

        let err = store.settle_bet(&second.id, BetStatus::Won).unwrap_err();
        assert!(matches!(err, LedgerError::Internal(_)));
        assert_eq!(store.get_bet(&second.id).unwrap().status, BetStatus::Placed);
        assert_eq!(store.get_user_balance("u1").unwrap(), dec!(60000000000000000000000000000));

        // lock still healthy; the bet can still be settled as lost
        store.create_user("bystander", None).unwrap();
        store.settle_bet(&second.id, BetStatus::Lost).unwrap();
    }

    #[test]
    fn test_settle_lost_keeps_balance() {
        let store = store_with_user(dec!(1000));
        let bet = store.place_bet("u1", "e1", dec!(3.5), dec!(200)).unwrap();

        store.settle_bet(&bet.id, BetStatus::Lost).unwrap();
        assert_eq!(store.get_user_balance("u1").unwrap(), dec!(800));
        assert_eq!(store.get_bet(&bet.id).unwrap().status, BetStatus::Lost);
    }

    #[test]
    fn test_settle_to_placed_is_rejected() {
        let store = store_with_user(dec!(1000));
        let bet = store.place_bet("u1", "e1", dec!(2.0), dec!(10)).unwrap();
        assert!(matches!(store.settle_bet(&bet.id, BetStatus::Placed), Err(LedgerError::BadRequest(_))));
        assert!(matches!(store.settle_bet("bet_missing", BetStatus::Won), Err(LedgerError::NotFound { .. })));
    }

    #[test]
    fn test_winning_bet_without_owner_is_internal_and_untouched() {
        let store = store_with_user(dec!(1000));
        let bet = store.place_bet("u1", "e1", dec!(2.0), dec!(10)).unwrap();
        store.remove_user_unchecked("u1");

        let err = store.settle_bet(&bet.id, BetStatus::Won).unwrap_err();
        assert!(matches!(err, LedgerError::Internal(_)));
        assert_eq!(store.get_bet(&bet.id).unwrap().status, BetStatus::Placed);
    }

    #[test]
    fn test_find_bets_by_event_only_open() {
        let store = store_with_user(dec!(1000));
        let a = store.place_bet("u1", "e1", dec!(2.0), dec!(10)).unwrap();
        let b = store.place_bet("u1", "e1", dec!(2.0), dec!(20)).unwrap();
        store.place_bet("u1", "e2", dec!(2.0), dec!(30)).unwrap();

        store.settle_bet(&a.id, BetStatus::Lost).unwrap();

        let open = store.find_bets_by_event("e1").unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, b.id);
        assert!(store.find_bets_by_event("unknown").unwrap().is_empty());
    }

    #[test]
    fn test_create_user_defaults_and_conflict() {
        let store = LedgerStore::new();
        let user = store.create_user("alice", None).unwrap();
        assert_eq!(user.balance, DEFAULT_STARTING_BALANCE);

        assert!(matches!(store.create_user("alice", Some(dec!(5))), Err(LedgerError::Conflict(_))));
        assert!(matches!(store.create_user("", None), Err(LedgerError::BadRequest(_))));
        assert!(matches!(store.create_user("bob", Some(dec!(-1))), Err(LedgerError::BadRequest(_))));
    }

    #[test]
    fn test_update_user_refreshes_timestamp() {
        let store = store_with_user(dec!(10));
        let before = store.get_user("u1").unwrap();
        let after = store.update_user("u1").unwrap();
        assert!(after.updated_at >= before.updated_at);
        assert_eq!(after.balance, before.balance);
        assert!(matches!(store.update_user("nobody"), Err(LedgerError::NotFound { .. })));
    }

    #[test]
    fn test_delete_user_with_open_bets_conflicts() {
        let store = store_with_user(dec!(100));
        let bet = store.place_bet("u1", "e1", dec!(2.0), dec!(10)).unwrap();

        assert!(matches!(store.delete_user("u1"), Err(LedgerError::Conflict(_))));

        store.settle_bet(&bet.id, BetStatus::Lost).unwrap();
        store.delete_user("u1").unwrap();
        assert!(matches!(store.get_user("u1"), Err(LedgerError::NotFound { .. })));
        assert!(matches!(store.delete_user("u1"), Err(LedgerError::NotFound { .. })));
    }

    #[test]
    fn test_find_or_create_returns_existing() {
        let store = store_with_user(dec!(42));
        let found = store.find_or_create_user("u1").unwrap();
        assert_eq!(found.balance, dec!(42));

        let created = store.find_or_create_user("u2").unwrap();
        assert_eq!(created.balance, DEFAULT_STARTING_BALANCE);
        assert_eq!(store.list_users().unwrap().len(), 2);
    }

    #[test]
    fn test_get_account_matches_bets() {
        let store = store_with_user(dec!(100));
        store.place_bet("u1", "e1", dec!(2.0), dec!(30)).unwrap();
        let (user, bets) = store.get_account("u1").unwrap();
        assert_eq!(user.balance, dec!(70));
        assert_eq!(bets.len(), 1);
        assert!(store.get_account("nobody").is_err());
    }

    #[test]
    fn test_list_bets_for_user_and_stats() {
        let store = store_with_user(dec!(1000));
        let a = store.place_bet("u1", "e1", dec!(2.0), dec!(10)).unwrap();
        store.place_bet("u1", "e2", dec!(2.0), dec!(15)).unwrap();
        store.settle_bet(&a.id, BetStatus::Won).unwrap();

        assert_eq!(store.list_bets_for_user("u1").unwrap().len(), 2);
        assert!(store.list_bets_for_user("nobody").is_err());

        let stats = store.stats().unwrap();
        assert_eq!(stats.users, 1);
        assert_eq!(stats.bets, 2);
        assert_eq!(stats.open_bets, 1);
        assert_eq!(stats.won_bets, 1);
        assert_eq!(stats.open_stake, dec!(15));
    }
}
