//! Storage keys and accessors.
//!
//! Pool-wide settings live in instance storage; per-lender and per-borrower
//! records live in persistent storage and have their TTL bumped on write.
//! A lender's deposit entries are kept one per key so that an operation only
//! loads the entries it actually visits.

use soroban_sdk::{contracttype, log, token, Address, Env, Vec};

use crate::ledger::{EntrySource, Withdrawal};
use crate::types::{DepositEntry, LenderAccount, Loan, PoolConfig, PoolError};

pub(crate) const DAY_IN_LEDGERS: u32 = 17280;
pub(crate) const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
pub(crate) const INSTANCE_LIFETIME_THRESHOLD: u32 = INSTANCE_BUMP_AMOUNT - DAY_IN_LEDGERS;

pub(crate) const RECORD_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
pub(crate) const RECORD_LIFETIME_THRESHOLD: u32 = RECORD_BUMP_AMOUNT - DAY_IN_LEDGERS;

#[derive(Clone)]
#[contracttype]
pub enum DataKey {
    Admin,
    Token,
    Config,
    /// Sum of every deposit ever made into the pool.
    TotalPoolDeposits,
    Reentrancy,
    Lender(Address),
    /// One deposit entry of a lender, by position in its history.
    Entry(Address, u32),
    Loan(Address),
    Banned(Address),
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Admin)
}

pub fn require_initialized(env: &Env) -> Result<(), PoolError> {
    if !is_initialized(env) {
        return Err(PoolError::NotInitialized);
    }
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
    Ok(())
}

pub fn read_admin(env: &Env) -> Result<Address, PoolError> {
    env.storage()
        .instance()
        .get(&DataKey::Admin)
        .ok_or(PoolError::NotInitialized)
}

pub fn require_admin_auth(env: &Env) -> Result<Address, PoolError> {
    let admin = read_admin(env)?;
    admin.require_auth();
    Ok(admin)
}

pub fn read_token(env: &Env) -> Result<Address, PoolError> {
    env.storage()
        .instance()
        .get(&DataKey::Token)
        .ok_or(PoolError::NotInitialized)
}

pub fn read_config(env: &Env) -> Result<PoolConfig, PoolError> {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(PoolError::NotInitialized)
}

pub fn write_config(env: &Env, config: &PoolConfig) {
    env.storage().instance().set(&DataKey::Config, config);
}

pub fn read_total_pool_deposits(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::TotalPoolDeposits)
        .unwrap_or(0)
}

pub fn write_total_pool_deposits(env: &Env, total: i128) {
    env.storage()
        .instance()
        .set(&DataKey::TotalPoolDeposits, &total);
}

/// Returns the stored account, or an empty one for a lender who never deposited.
pub fn read_lender(env: &Env, lender: &Address) -> LenderAccount {
    let key = DataKey::Lender(lender.clone());
    match env.storage().persistent().get(&key) {
        Some(account) => {
            env.storage()
                .persistent()
                .extend_ttl(&key, RECORD_LIFETIME_THRESHOLD, RECORD_BUMP_AMOUNT);
            account
        }
        None => LenderAccount {
            entry_count: 0,
            cursor: 0,
            total_deposited: 0,
            total_withdrawn: 0,
        },
    }
}

pub fn write_lender(env: &Env, lender: &Address, account: &LenderAccount) {
    let key = DataKey::Lender(lender.clone());
    env.storage().persistent().set(&key, account);
    env.storage()
        .persistent()
        .extend_ttl(&key, RECORD_LIFETIME_THRESHOLD, RECORD_BUMP_AMOUNT);
}

pub fn read_entry(env: &Env, lender: &Address, index: u32) -> Option<DepositEntry> {
    let key = DataKey::Entry(lender.clone(), index);
    let entry = env.storage().persistent().get(&key)?;
    env.storage()
        .persistent()
        .extend_ttl(&key, RECORD_LIFETIME_THRESHOLD, RECORD_BUMP_AMOUNT);
    Some(entry)
}

pub fn write_entry(env: &Env, lender: &Address, index: u32, entry: &DepositEntry) {
    let key = DataKey::Entry(lender.clone(), index);
    env.storage().persistent().set(&key, entry);
    env.storage()
        .persistent()
        .extend_ttl(&key, RECORD_LIFETIME_THRESHOLD, RECORD_BUMP_AMOUNT);
}

/// Persists the entries a withdrawal changed.
pub fn write_withdrawal(env: &Env, lender: &Address, withdrawal: &Withdrawal) {
    for (offset, entry) in withdrawal.updated.iter().enumerate() {
        write_entry(env, lender, withdrawal.first_index + offset as u32, &entry);
    }
}

/// Every entry of `lender`, oldest first. Cost grows with the full history.
pub fn read_all_entries(env: &Env, lender: &Address, entry_count: u32) -> Vec<DepositEntry> {
    let mut entries = Vec::new(env);
    for index in 0..entry_count {
        if let Some(entry) = read_entry(env, lender, index) {
            entries.push_back(entry);
        }
    }
    entries
}

/// A lender's entries as they sit in persistent storage, read on demand.
pub struct StoredEntries<'a> {
    env: &'a Env,
    lender: &'a Address,
}

impl<'a> StoredEntries<'a> {
    pub fn new(env: &'a Env, lender: &'a Address) -> Self {
        StoredEntries { env, lender }
    }
}

impl EntrySource for StoredEntries<'_> {
    fn entry(&self, index: u32) -> Option<DepositEntry> {
        read_entry(self.env, self.lender, index)
    }
}

pub fn read_loan(env: &Env, borrower: &Address) -> Option<Loan> {
    env.storage()
        .persistent()
        .get(&DataKey::Loan(borrower.clone()))
}

pub fn write_loan(env: &Env, borrower: &Address, loan: &Loan) {
    let key = DataKey::Loan(borrower.clone());
    env.storage().persistent().set(&key, loan);
    env.storage()
        .persistent()
        .extend_ttl(&key, RECORD_LIFETIME_THRESHOLD, RECORD_BUMP_AMOUNT);
}

pub fn is_banned(env: &Env, borrower: &Address) -> bool {
    env.storage()
        .persistent()
        .get(&DataKey::Banned(borrower.clone()))
        .unwrap_or(false)
}

pub fn set_banned(env: &Env, borrower: &Address, banned: bool) {
    let key = DataKey::Banned(borrower.clone());
    if banned {
        env.storage().persistent().set(&key, &true);
        env.storage()
            .persistent()
            .extend_ttl(&key, RECORD_LIFETIME_THRESHOLD, RECORD_BUMP_AMOUNT);
    } else {
        env.storage().persistent().remove(&key);
    }
}

/// The pool's current holdings of the stable asset.
pub fn available_liquidity(env: &Env) -> Result<i128, PoolError> {
    let token_client = token::Client::new(env, &read_token(env)?);
    Ok(token_client.balance(&env.current_contract_address()))
}

/// Moves `amount` of the pool token, surfacing a failed transfer as
/// [`PoolError::TransferFailed`] instead of trapping.
pub fn transfer(env: &Env, from: &Address, to: &Address, amount: i128) -> Result<(), PoolError> {
    let token_client = token::Client::new(env, &read_token(env)?);
    match token_client.try_transfer(from, to, &amount) {
        Ok(Ok(())) => Ok(()),
        _ => {
            log!(env, "token transfer failed", amount);
            Err(PoolError::TransferFailed)
        }
    }
}

/// Runs `f` with the reentrancy flag held. A nested entry while the flag is
/// set fails with [`PoolError::Reentrancy`].
pub fn with_reentrancy_guard<T>(
    env: &Env,
    f: impl FnOnce() -> Result<T, PoolError>,
) -> Result<T, PoolError> {
    let held: bool = env
        .storage()
        .instance()
        .get(&DataKey::Reentrancy)
        .unwrap_or(false);
    if held {
        log!(env, "reentrant call rejected");
        return Err(PoolError::Reentrancy);
    }
    env.storage().instance().set(&DataKey::Reentrancy, &true);
    let result = f();
    env.storage().instance().set(&DataKey::Reentrancy, &false);
    result
}
