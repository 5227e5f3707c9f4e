//! Core data types for the lending pool contract.

use soroban_sdk::{contracttype, Address, Symbol};

/// How `repay` treats a payment smaller than the outstanding balance.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RepaymentPolicy {
    /// Any amount up to `outstanding`; the loan closes when it reaches zero.
    Partial = 0,
    /// The payment must equal `outstanding` exactly.
    FullSettlement = 1,
}

#[soroban_sdk::contracterror]
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum PoolError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    InvalidAmount = 3,
    InvalidTerm = 4,
    AmountExceedsOutstanding = 5,
    RepaymentMustSettleInFull = 6,
    NoActiveLoan = 7,
    NotBanned = 8,
    LoanAlreadyActive = 9,
    InsufficientLiquidity = 10,
    EntriesExhausted = 11,
    DepositLocked = 12,
    DepletedEntry = 13,
    Banned = 14,
    NoCredential = 15,
    InvalidScore = 16,
    ScoreTooLow = 17,
    Reentrancy = 18,
    Overflow = 19,
    TransferFailed = 20,
}

/// One discrete deposit. Only `amount` ever changes, and only downward.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DepositEntry {
    /// Remaining, not yet withdrawn.
    pub amount: i128,
    /// Ledger timestamp of the deposit; the lock window starts here.
    pub deposited_at: u64,
}

/// A lender's withdrawal cursor and totals. The entries themselves are stored
/// one per key, indexed `0..entry_count`.
///
/// `total_deposited - total_withdrawn` always equals the sum of the
/// remaining entry amounts, and every entry before `cursor` is empty.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LenderAccount {
    pub entry_count: u32,
    pub cursor: u32,
    pub total_deposited: i128,
    pub total_withdrawn: i128,
}

/// Stored loan for a borrower. Overwritten on each new issuance.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Loan {
    pub principal: i128,
    pub outstanding: i128,
    pub start_time: u64,
    pub due_time: u64,
    pub active: bool,
}

/// Process-wide settings, read once at the start of each operation.
///
/// * `credential_gate` – `None` disables credential gating entirely.
/// * `version` – starts at 1, bumped on every admin change.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolConfig {
    pub credential_gate: Option<Address>,
    pub min_score: u32,
    pub deposit_lock_seconds: u64,
    pub repayment_policy: RepaymentPolicy,
    pub version: u32,
}

/// Loan view combined with the borrower's ban flag.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoanStatus {
    pub active: bool,
    pub principal: i128,
    pub outstanding: i128,
    pub start_time: u64,
    pub due_time: u64,
    pub banned: bool,
}

/// Aggregate lender view; `unlockable` is what `preview_withdraw` reports.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LenderStatus {
    pub total_deposited: i128,
    pub total_withdrawn: i128,
    pub balance: i128,
    pub unlockable: i128,
    pub cursor: u32,
}

/// Outcome of a loan eligibility preview.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Eligibility {
    pub allowed: bool,
    pub reason: Symbol,
}
