//! Per-lender deposit ledger.
//!
//! Each deposit is an entry with its own lock window. Withdrawals consume
//! entries strictly oldest-first starting at the account cursor: a locked
//! entry at the cursor blocks the withdrawal even when newer entries are
//! already unlocked.
//!
//! Entries are read through [`EntrySource`] one index at a time, starting at
//! the cursor, so consumed history is never loaded again. Nothing here writes
//! storage; callers persist the account and the returned [`Withdrawal`] only
//! when the operation succeeded.

use soroban_sdk::{log, Env, Vec};

use crate::types::{DepositEntry, LenderAccount, PoolError};

/// Indexed read access to one lender's entries.
pub trait EntrySource {
    fn entry(&self, index: u32) -> Option<DepositEntry>;
}

impl EntrySource for Vec<DepositEntry> {
    fn entry(&self, index: u32) -> Option<DepositEntry> {
        self.get(index)
    }
}

/// Entries changed by a withdrawal, contiguous from `first_index`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Withdrawal {
    pub first_index: u32,
    pub updated: Vec<DepositEntry>,
}

/// Timestamp from which `entry` may be withdrawn.
pub fn unlocks_at(entry: &DepositEntry, lock_seconds: u64) -> u64 {
    entry.deposited_at.saturating_add(lock_seconds)
}

pub fn is_locked(entry: &DepositEntry, now: u64, lock_seconds: u64) -> bool {
    now < unlocks_at(entry, lock_seconds)
}

/// Remaining balance: deposits minus withdrawals.
pub fn balance(account: &LenderAccount) -> i128 {
    account.total_deposited - account.total_withdrawn
}

/// Creates the next entry at the tail and returns it with its index.
/// Existing entries are never touched.
pub fn deposit(
    account: &mut LenderAccount,
    amount: i128,
    now: u64,
) -> Result<(u32, DepositEntry), PoolError> {
    if amount <= 0 {
        return Err(PoolError::InvalidAmount);
    }
    account.total_deposited = account
        .total_deposited
        .checked_add(amount)
        .ok_or(PoolError::Overflow)?;
    let index = account.entry_count;
    account.entry_count = index.checked_add(1).ok_or(PoolError::Overflow)?;
    Ok((
        index,
        DepositEntry {
            amount,
            deposited_at: now,
        },
    ))
}

/// Consumes `amount` from the entries starting at the cursor.
///
/// On error `account` may be partially modified and must be discarded.
pub fn withdraw(
    env: &Env,
    account: &mut LenderAccount,
    entries: &impl EntrySource,
    amount: i128,
    now: u64,
    lock_seconds: u64,
) -> Result<Withdrawal, PoolError> {
    if amount <= 0 {
        return Err(PoolError::InvalidAmount);
    }

    let first_index = account.cursor;
    let mut updated = Vec::new(env);
    let mut remaining = amount;
    let mut cursor = account.cursor;
    while remaining > 0 {
        if cursor >= account.entry_count {
            return Err(PoolError::EntriesExhausted);
        }
        let mut entry = entries.entry(cursor).ok_or(PoolError::EntriesExhausted)?;
        if entry.amount == 0 {
            // Entries behind the cursor are emptied before it moves past them.
            log!(env, "depleted entry at cursor", cursor);
            return Err(PoolError::DepletedEntry);
        }
        if is_locked(&entry, now, lock_seconds) {
            return Err(PoolError::DepositLocked);
        }

        let take = remaining.min(entry.amount);
        entry.amount -= take;
        remaining -= take;
        let emptied = entry.amount == 0;
        updated.push_back(entry);
        if emptied {
            cursor += 1;
        }
    }

    account.cursor = cursor;
    account.total_withdrawn = account
        .total_withdrawn
        .checked_add(amount)
        .ok_or(PoolError::Overflow)?;
    Ok(Withdrawal {
        first_index,
        updated,
    })
}

/// Amount `withdraw` would accept right now: the unlocked prefix of the
/// entries from the cursor, stopping at the first locked one.
pub fn preview_withdraw(
    account: &LenderAccount,
    entries: &impl EntrySource,
    now: u64,
    lock_seconds: u64,
) -> i128 {
    let mut total: i128 = 0;
    for index in account.cursor..account.entry_count {
        let Some(entry) = entries.entry(index) else {
            break;
        };
        if entry.amount == 0 {
            continue;
        }
        if is_locked(&entry, now, lock_seconds) {
            break;
        }
        total = total.saturating_add(entry.amount);
    }
    total
}

#[cfg(test)]
mod test {
    use super::*;

    struct Ledger {
        account: LenderAccount,
        entries: Vec<DepositEntry>,
    }

    impl Ledger {
        fn new(env: &Env) -> Self {
            Ledger {
                account: LenderAccount {
                    entry_count: 0,
                    cursor: 0,
                    total_deposited: 0,
                    total_withdrawn: 0,
                },
                entries: Vec::new(env),
            }
        }

        fn deposit(&mut self, amount: i128, now: u64) -> Result<(), PoolError> {
            let (index, entry) = deposit(&mut self.account, amount, now)?;
            assert_eq!(index, self.entries.len());
            self.entries.push_back(entry);
            Ok(())
        }

        fn withdraw(&mut self, env: &Env, amount: i128, now: u64, lock: u64) -> Result<(), PoolError> {
            let mut account = self.account.clone();
            let withdrawal = withdraw(env, &mut account, &self.entries, amount, now, lock)?;
            for (offset, entry) in withdrawal.updated.iter().enumerate() {
                self.entries.set(withdrawal.first_index + offset as u32, entry);
            }
            self.account = account;
            Ok(())
        }

        fn preview(&self, now: u64, lock: u64) -> i128 {
            preview_withdraw(&self.account, &self.entries, now, lock)
        }

        fn set_amount(&mut self, index: u32, amount: i128) {
            let mut entry = self.entries.get(index).unwrap();
            entry.amount = amount;
            self.entries.set(index, entry);
        }

        fn assert_conserved(&self) {
            let sum: i128 = self.entries.iter().map(|e| e.amount).sum();
            assert_eq!(balance(&self.account), sum);
            assert_eq!(self.account.entry_count, self.entries.len());
            for i in 0..self.account.cursor {
                assert_eq!(self.entries.get(i).unwrap().amount, 0);
            }
        }
    }

    #[test]
    fn deposit_appends_entry_and_credits_total() {
        let env = Env::default();
        let mut ledger = Ledger::new(&env);
        ledger.deposit(300, 10).unwrap();
        ledger.deposit(200, 20).unwrap();
        assert_eq!(ledger.account.entry_count, 2);
        assert_eq!(
            ledger.entries.get(1).unwrap(),
            DepositEntry {
                amount: 200,
                deposited_at: 20
            }
        );
        assert_eq!(ledger.account.total_deposited, 500);
        ledger.assert_conserved();
    }

    #[test]
    fn deposit_rejects_non_positive_amount() {
        let env = Env::default();
        let mut ledger = Ledger::new(&env);
        assert_eq!(ledger.deposit(0, 0), Err(PoolError::InvalidAmount));
        assert_eq!(ledger.deposit(-5, 0), Err(PoolError::InvalidAmount));
        assert_eq!(ledger.account.entry_count, 0);
    }

    #[test]
    fn withdraw_spans_entries_and_advances_cursor() {
        let env = Env::default();
        let mut ledger = Ledger::new(&env);
        for _ in 0..3 {
            ledger.deposit(100, 0).unwrap();
        }

        ledger.withdraw(&env, 150, 10, 5).unwrap();
        assert_eq!(ledger.account.cursor, 1);
        assert_eq!(ledger.entries.get(1).unwrap().amount, 50);
        ledger.assert_conserved();

        ledger.withdraw(&env, 50, 10, 5).unwrap();
        assert_eq!(ledger.account.cursor, 2);
        assert_eq!(ledger.account.total_withdrawn, 200);
        ledger.assert_conserved();
    }

    #[test]
    fn withdraw_reports_only_entries_it_touched() {
        let env = Env::default();
        let mut ledger = Ledger::new(&env);
        for _ in 0..4 {
            ledger.deposit(100, 0).unwrap();
        }
        ledger.withdraw(&env, 100, 10, 0).unwrap();

        let mut account = ledger.account.clone();
        let withdrawal = withdraw(&env, &mut account, &ledger.entries, 130, 10, 0).unwrap();
        assert_eq!(withdrawal.first_index, 1);
        assert_eq!(withdrawal.updated.len(), 2);
        assert_eq!(withdrawal.updated.get(0).unwrap().amount, 0);
        assert_eq!(withdrawal.updated.get(1).unwrap().amount, 70);
        assert_eq!(account.cursor, 2);
    }

    #[test]
    fn withdraw_blocked_by_locked_head_even_if_later_unlocked() {
        let env = Env::default();
        let mut ledger = Ledger::new(&env);
        // Out-of-order timestamps: the head is locked, the tail is not.
        ledger.deposit(100, 50).unwrap();
        ledger.deposit(100, 0).unwrap();
        assert_eq!(
            ledger.withdraw(&env, 10, 60, 20),
            Err(PoolError::DepositLocked)
        );
        assert_eq!(ledger.preview(60, 20), 0);
        assert_eq!(ledger.account.total_withdrawn, 0);
    }

    #[test]
    fn withdraw_past_last_entry_is_exhausted() {
        let env = Env::default();
        let mut ledger = Ledger::new(&env);
        ledger.deposit(100, 0).unwrap();
        assert_eq!(
            ledger.withdraw(&env, 101, 10, 0),
            Err(PoolError::EntriesExhausted)
        );
        ledger.assert_conserved();
    }

    #[test]
    fn withdraw_on_empty_account_is_exhausted() {
        let env = Env::default();
        let mut ledger = Ledger::new(&env);
        assert_eq!(
            ledger.withdraw(&env, 1, 10, 0),
            Err(PoolError::EntriesExhausted)
        );
    }

    #[test]
    fn depleted_entry_at_cursor_is_rejected() {
        let env = Env::default();
        let mut ledger = Ledger::new(&env);
        ledger.deposit(100, 0).unwrap();
        // Corrupt bookkeeping: empty the head without moving the cursor.
        ledger.set_amount(0, 0);
        assert_eq!(
            ledger.withdraw(&env, 1, 10, 0),
            Err(PoolError::DepletedEntry)
        );
    }

    #[test]
    fn withdraw_never_leaves_empty_entry_at_cursor() {
        let env = Env::default();
        let mut ledger = Ledger::new(&env);
        for t in 0..5u64 {
            ledger.deposit(40, t).unwrap();
        }
        for amount in [40, 15, 25, 80, 40] {
            ledger.withdraw(&env, amount, 100, 10).unwrap();
            ledger.assert_conserved();
            if let Some(head) = ledger.entries.get(ledger.account.cursor) {
                assert!(head.amount > 0);
            }
        }
        assert_eq!(balance(&ledger.account), 0);
        assert_eq!(ledger.account.cursor, 5);
    }

    #[test]
    fn preview_matches_withdraw_boundary() {
        let env = Env::default();
        let mut ledger = Ledger::new(&env);
        ledger.deposit(70, 0).unwrap();
        ledger.deposit(30, 5).unwrap();
        ledger.deposit(50, 40).unwrap();
        let (now, lock) = (30, 20);
        let preview = ledger.preview(now, lock);
        assert_eq!(preview, 100);

        let mut account = ledger.account.clone();
        assert_eq!(
            withdraw(&env, &mut account, &ledger.entries, preview + 1, now, lock),
            Err(PoolError::DepositLocked)
        );
        ledger.withdraw(&env, preview, now, lock).unwrap();
        assert_eq!(ledger.preview(now, lock), 0);
    }

    #[test]
    fn preview_skips_empty_entries() {
        let env = Env::default();
        let mut ledger = Ledger::new(&env);
        ledger.deposit(10, 0).unwrap();
        ledger.deposit(20, 0).unwrap();
        ledger.set_amount(0, 0);
        assert_eq!(ledger.preview(100, 0), 20);
    }

    #[test]
    fn unlock_time_saturates() {
        let entry = DepositEntry {
            amount: 1,
            deposited_at: u64::MAX - 1,
        };
        assert_eq!(unlocks_at(&entry, 10), u64::MAX);
        assert!(is_locked(&entry, u64::MAX - 1, 10));
    }
}
