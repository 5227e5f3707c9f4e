#![no_std]

//! Lending pool contract: FIFO-locked lender deposits, credential-gated loans,
//! repayment deadlines and bans on default.
//!
//! # Reentrancy
//! Every entry point that moves tokens (`deposit`, `withdraw`, `open_loan`,
//! `repay`) writes all ledger and loan state before the transfer and runs under
//! an instance-storage reentrancy guard. The credential gate is consulted
//! before any state is written. The Soroban host already rejects contract
//! re-entry; the guard keeps the invariant local to this contract.
//!
//! # Atomicity
//! Every mutating function returns `Result<_, PoolError>`. A returned error
//! rolls back the whole invocation, so no partial mutation is ever visible.

mod events;
mod gate;
mod ledger;
mod loans;
mod storage;
mod types;

use soroban_sdk::{contract, contractimpl, symbol_short, Address, Env, Symbol, Vec};

use events::{
    publish_ban, publish_config_updated, publish_deposit, publish_loan_opened, publish_repayment,
    publish_withdraw, BanEvent, ConfigUpdatedEvent, DepositEvent, LoanOpenedEvent,
    RepaymentEvent, WithdrawEvent,
};
use storage::{DataKey, StoredEntries};

pub use gate::{CredentialGate, CredentialGateClient, ScoreRecord};
pub use types::{
    DepositEntry, Eligibility, LenderAccount, LenderStatus, Loan, LoanStatus, PoolConfig,
    PoolError, RepaymentPolicy,
};

fn update_config(
    env: &Env,
    field: Symbol,
    apply: impl FnOnce(&mut PoolConfig),
) -> Result<(), PoolError> {
    storage::require_initialized(env)?;
    storage::require_admin_auth(env)?;

    let mut config = storage::read_config(env)?;
    apply(&mut config);
    config.version = config.version.checked_add(1).ok_or(PoolError::Overflow)?;
    storage::write_config(env, &config);

    publish_config_updated(env, ConfigUpdatedEvent { field, config });
    Ok(())
}

#[contract]
pub struct LendingPool;

#[contractimpl]
impl LendingPool {
    /// Initialize the pool with its admin, stable-asset token and configuration.
    ///
    /// # Errors
    /// * `AlreadyInitialized` – called a second time
    pub fn init(
        env: Env,
        admin: Address,
        token: Address,
        credential_gate: Option<Address>,
        min_score: u32,
        deposit_lock_seconds: u64,
        repayment_policy: RepaymentPolicy,
    ) -> Result<(), PoolError> {
        if storage::is_initialized(&env) {
            return Err(PoolError::AlreadyInitialized);
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Token, &token);
        storage::write_config(
            &env,
            &PoolConfig {
                credential_gate,
                min_score,
                deposit_lock_seconds,
                repayment_policy,
                version: 1,
            },
        );
        storage::write_total_pool_deposits(&env, 0);
        Ok(())
    }

    // ── lenders ──────────────────────────────────────────────────────────────

    /// Deposit `amount` of the pool token. Appends a new ledger entry that
    /// unlocks `deposit_lock_seconds` after now.
    ///
    /// # Errors
    /// * `InvalidAmount` – `amount` <= 0
    /// * `TransferFailed` – the lender could not fund the deposit
    /// * `Reentrancy` – nested call
    pub fn deposit(env: Env, lender: Address, amount: i128) -> Result<(), PoolError> {
        storage::require_initialized(&env)?;
        lender.require_auth();

        storage::with_reentrancy_guard(&env, || {
            let now = env.ledger().timestamp();
            let mut account = storage::read_lender(&env, &lender);
            let (entry_index, entry) = ledger::deposit(&mut account, amount, now)?;
            let pool_total = storage::read_total_pool_deposits(&env)
                .checked_add(amount)
                .ok_or(PoolError::Overflow)?;

            storage::write_entry(&env, &lender, entry_index, &entry);
            storage::write_lender(&env, &lender, &account);
            storage::write_total_pool_deposits(&env, pool_total);

            storage::transfer(&env, &lender, &env.current_contract_address(), amount)?;

            publish_deposit(
                &env,
                DepositEvent {
                    lender: lender.clone(),
                    amount,
                    entry_index,
                    timestamp: now,
                },
            );
            Ok(())
        })
    }

    /// Withdraw `amount`, consuming deposit entries oldest-first.
    ///
    /// # Errors
    /// * `InvalidAmount` – `amount` <= 0
    /// * `DepositLocked` – the oldest remaining entry is still in its lock window
    /// * `EntriesExhausted` – the lender's deposits do not cover `amount`
    /// * `DepletedEntry` – ledger bookkeeping is inconsistent
    /// * `InsufficientLiquidity` – the pool cannot pay `amount` right now
    /// * `TransferFailed`, `Reentrancy`
    pub fn withdraw(env: Env, lender: Address, amount: i128) -> Result<(), PoolError> {
        storage::require_initialized(&env)?;
        lender.require_auth();

        storage::with_reentrancy_guard(&env, || {
            let config = storage::read_config(&env)?;
            let now = env.ledger().timestamp();

            let mut account = storage::read_lender(&env, &lender);
            let withdrawal = ledger::withdraw(
                &env,
                &mut account,
                &StoredEntries::new(&env, &lender),
                amount,
                now,
                config.deposit_lock_seconds,
            )?;
            if storage::available_liquidity(&env)? < amount {
                return Err(PoolError::InsufficientLiquidity);
            }

            // Checks-effects-interactions: persist the ledger before paying out
            storage::write_withdrawal(&env, &lender, &withdrawal);
            storage::write_lender(&env, &lender, &account);
            storage::transfer(&env, &env.current_contract_address(), &lender, amount)?;

            publish_withdraw(
                &env,
                WithdrawEvent {
                    lender: lender.clone(),
                    amount,
                    cursor: account.cursor,
                    timestamp: now,
                },
            );
            Ok(())
        })
    }

    // ── borrowers ────────────────────────────────────────────────────────────

    /// Issue a loan and pay out `principal` (admin only).
    ///
    /// Checks run in order and the first failure wins: ban, principal, term,
    /// liquidity, credential, existing unpaid loan.
    ///
    /// # Errors
    /// * `Banned`, `InvalidAmount`, `InvalidTerm`, `InsufficientLiquidity`
    /// * `NoCredential`, `InvalidScore`, `ScoreTooLow` – gating enabled and
    ///   the borrower does not qualify
    /// * `LoanAlreadyActive` – the borrower still owes on a previous loan
    /// * `TransferFailed`, `Reentrancy`
    pub fn open_loan(
        env: Env,
        borrower: Address,
        principal: i128,
        term_seconds: u64,
    ) -> Result<(), PoolError> {
        storage::require_initialized(&env)?;
        storage::require_admin_auth(&env)?;

        storage::with_reentrancy_guard(&env, || {
            let config = storage::read_config(&env)?;
            loans::check_eligibility(&env, &config, &borrower, principal, Some(term_seconds))?;

            let now = env.ledger().timestamp();
            let loan = loans::new_loan(principal, now, term_seconds)?;
            storage::write_loan(&env, &borrower, &loan);

            storage::transfer(&env, &env.current_contract_address(), &borrower, principal)?;

            publish_loan_opened(
                &env,
                LoanOpenedEvent {
                    borrower: borrower.clone(),
                    principal,
                    start_time: loan.start_time,
                    due_time: loan.due_time,
                },
            );
            Ok(())
        })
    }

    /// Repay `amount` of the borrower's active loan. The configured
    /// [`RepaymentPolicy`] decides whether partial payments are accepted.
    /// Repaying does not lift a ban.
    ///
    /// # Errors
    /// * `NoActiveLoan`, `InvalidAmount`, `AmountExceedsOutstanding`
    /// * `RepaymentMustSettleInFull` – full-settlement policy and `amount` != outstanding
    /// * `TransferFailed`, `Reentrancy`
    pub fn repay(env: Env, borrower: Address, amount: i128) -> Result<(), PoolError> {
        storage::require_initialized(&env)?;
        borrower.require_auth();

        storage::with_reentrancy_guard(&env, || {
            let config = storage::read_config(&env)?;
            let mut loan = storage::read_loan(&env, &borrower).ok_or(PoolError::NoActiveLoan)?;
            loans::apply_repayment(&mut loan, amount, config.repayment_policy)?;
            storage::write_loan(&env, &borrower, &loan);

            storage::transfer(&env, &borrower, &env.current_contract_address(), amount)?;

            publish_repayment(
                &env,
                RepaymentEvent {
                    borrower: borrower.clone(),
                    amount,
                    remaining: loan.outstanding,
                    timestamp: env.ledger().timestamp(),
                },
            );
            Ok(())
        })
    }

    /// Ban the borrower if their loan is overdue and unpaid. Anyone may call.
    ///
    /// Returns `true` when a new ban was recorded; `false` (no-op) otherwise,
    /// including when the borrower is already banned.
    pub fn check_default_and_ban(env: Env, borrower: Address) -> Result<bool, PoolError> {
        storage::require_initialized(&env)?;

        if storage::is_banned(&env, &borrower) {
            return Ok(false);
        }
        let now = env.ledger().timestamp();
        let in_default = storage::read_loan(&env, &borrower)
            .map(|loan| loans::is_in_default(&loan, now))
            .unwrap_or(false);
        if !in_default {
            return Ok(false);
        }

        storage::set_banned(&env, &borrower, true);
        publish_ban(
            &env,
            BanEvent {
                borrower,
                banned: true,
                timestamp: now,
            },
        );
        Ok(true)
    }

    /// Clear a borrower's ban (admin only). Repayment history is not re-checked.
    ///
    /// # Errors
    /// * `NotBanned` – the borrower is not currently banned
    pub fn unban(env: Env, borrower: Address) -> Result<(), PoolError> {
        storage::require_initialized(&env)?;
        storage::require_admin_auth(&env)?;

        if !storage::is_banned(&env, &borrower) {
            return Err(PoolError::NotBanned);
        }
        storage::set_banned(&env, &borrower, false);

        publish_ban(
            &env,
            BanEvent {
                borrower,
                banned: false,
                timestamp: env.ledger().timestamp(),
            },
        );
        Ok(())
    }

    // ── configuration (admin only) ───────────────────────────────────────────

    /// Set the credential gate; `None` disables gating.
    pub fn set_credential_gate(env: Env, gate: Option<Address>) -> Result<(), PoolError> {
        update_config(&env, symbol_short!("gate"), |config| {
            config.credential_gate = gate
        })
    }

    /// Set the minimum credential score a gated borrower needs.
    pub fn set_min_score(env: Env, min_score: u32) -> Result<(), PoolError> {
        update_config(&env, symbol_short!("min_score"), |config| {
            config.min_score = min_score
        })
    }

    /// Set the lock window. Applies to every entry, including existing ones,
    /// from the next withdrawal on.
    pub fn set_deposit_lock_seconds(env: Env, seconds: u64) -> Result<(), PoolError> {
        update_config(&env, symbol_short!("lock"), |config| {
            config.deposit_lock_seconds = seconds
        })
    }

    /// Switch between partial and full-settlement repayment.
    pub fn set_repayment_policy(env: Env, policy: RepaymentPolicy) -> Result<(), PoolError> {
        update_config(&env, symbol_short!("repay_pol"), |config| {
            config.repayment_policy = policy
        })
    }

    // ── views ────────────────────────────────────────────────────────────────

    /// Net balance: total deposited minus total withdrawn.
    pub fn lender_balance(env: Env, lender: Address) -> i128 {
        ledger::balance(&storage::read_lender(&env, &lender))
    }

    /// Full entry history of a lender, oldest first, consumed entries
    /// included. Reads one storage key per entry ever made.
    pub fn deposit_entries(env: Env, lender: Address) -> Vec<DepositEntry> {
        let account = storage::read_lender(&env, &lender);
        storage::read_all_entries(&env, &lender, account.entry_count)
    }

    pub fn deposit_entry(env: Env, lender: Address, index: u32) -> Option<DepositEntry> {
        storage::read_entry(&env, &lender, index)
    }

    /// Largest amount `withdraw` would accept at the current ledger time.
    pub fn preview_withdraw(env: Env, lender: Address) -> Result<i128, PoolError> {
        let config = storage::read_config(&env)?;
        let account = storage::read_lender(&env, &lender);
        Ok(ledger::preview_withdraw(
            &account,
            &StoredEntries::new(&env, &lender),
            env.ledger().timestamp(),
            config.deposit_lock_seconds,
        ))
    }

    /// Totals, cursor and the currently withdrawable amount of a lender.
    pub fn lender_status(env: Env, lender: Address) -> Result<LenderStatus, PoolError> {
        let config = storage::read_config(&env)?;
        let account = storage::read_lender(&env, &lender);
        Ok(LenderStatus {
            total_deposited: account.total_deposited,
            total_withdrawn: account.total_withdrawn,
            balance: ledger::balance(&account),
            unlockable: ledger::preview_withdraw(
                &account,
                &StoredEntries::new(&env, &lender),
                env.ledger().timestamp(),
                config.deposit_lock_seconds,
            ),
            cursor: account.cursor,
        })
    }

    /// The borrower's most recent loan, if one was ever issued.
    pub fn get_loan(env: Env, borrower: Address) -> Option<Loan> {
        storage::read_loan(&env, &borrower)
    }

    /// Loan fields plus the ban flag; zeroed fields when no loan was ever issued.
    pub fn loan_status(env: Env, borrower: Address) -> LoanStatus {
        let banned = storage::is_banned(&env, &borrower);
        match storage::read_loan(&env, &borrower) {
            Some(loan) => LoanStatus {
                active: loan.active,
                principal: loan.principal,
                outstanding: loan.outstanding,
                start_time: loan.start_time,
                due_time: loan.due_time,
                banned,
            },
            None => LoanStatus {
                active: false,
                principal: 0,
                outstanding: 0,
                start_time: 0,
                due_time: 0,
                banned,
            },
        }
    }

    pub fn is_banned(env: Env, borrower: Address) -> bool {
        storage::is_banned(&env, &borrower)
    }

    /// The pool's token balance, which bounds withdrawals and new loans.
    pub fn available_liquidity(env: Env) -> Result<i128, PoolError> {
        storage::available_liquidity(&env)
    }

    pub fn total_pool_deposits(env: Env) -> i128 {
        storage::read_total_pool_deposits(&env)
    }

    /// Would `open_loan(borrower, principal, _)` pass its checks right now?
    /// Evaluated in the same order as `open_loan`, without the term check.
    pub fn can_open_loan(
        env: Env,
        borrower: Address,
        principal: i128,
    ) -> Result<Eligibility, PoolError> {
        let config = storage::read_config(&env)?;
        let result = loans::check_eligibility(&env, &config, &borrower, principal, None);
        Ok(Eligibility {
            allowed: result.is_ok(),
            reason: loans::reason_code(&result),
        })
    }

    pub fn get_config(env: Env) -> Result<PoolConfig, PoolError> {
        storage::read_config(&env)
    }

    pub fn get_admin(env: Env) -> Result<Address, PoolError> {
        storage::read_admin(&env)
    }

    pub fn get_token(env: Env) -> Result<Address, PoolError> {
        storage::read_token(&env)
    }
}
