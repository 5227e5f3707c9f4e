//! Event types and topic constants for the lending pool contract.
//! Stable event schemas for indexers and dashboards.

use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

use crate::types::PoolConfig;

const POOL: Symbol = symbol_short!("pool");

/// Emitted when a lender deposits; `entry_index` is the new entry's position.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DepositEvent {
    pub lender: Address,
    pub amount: i128,
    pub entry_index: u32,
    pub timestamp: u64,
}

/// Emitted when a lender withdraws. `cursor` is the account cursor afterwards.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawEvent {
    pub lender: Address,
    pub amount: i128,
    pub cursor: u32,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoanOpenedEvent {
    pub borrower: Address,
    pub principal: i128,
    pub start_time: u64,
    pub due_time: u64,
}

/// Emitted when a borrower repays (borrower, amount, remaining outstanding, timestamp).
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RepaymentEvent {
    pub borrower: Address,
    pub amount: i128,
    pub remaining: i128,
    pub timestamp: u64,
}

/// Emitted on ban (default detected) and on admin unban.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BanEvent {
    pub borrower: Address,
    pub banned: bool,
    pub timestamp: u64,
}

/// Emitted after any configuration change, carrying the full new record.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigUpdatedEvent {
    pub field: Symbol,
    pub config: PoolConfig,
}

pub fn publish_deposit(env: &Env, event: DepositEvent) {
    env.events()
        .publish((POOL, symbol_short!("deposit")), event);
}

pub fn publish_withdraw(env: &Env, event: WithdrawEvent) {
    env.events()
        .publish((POOL, symbol_short!("withdraw")), event);
}

pub fn publish_loan_opened(env: &Env, event: LoanOpenedEvent) {
    env.events()
        .publish((POOL, symbol_short!("loan_open")), event);
}

pub fn publish_repayment(env: &Env, event: RepaymentEvent) {
    env.events().publish((POOL, symbol_short!("repay")), event);
}

pub fn publish_ban(env: &Env, event: BanEvent) {
    let topic = if event.banned {
        symbol_short!("ban")
    } else {
        symbol_short!("unban")
    };
    env.events().publish((POOL, topic), event);
}

pub fn publish_config_updated(env: &Env, event: ConfigUpdatedEvent) {
    env.events()
        .publish((POOL, symbol_short!("config")), event);
}
