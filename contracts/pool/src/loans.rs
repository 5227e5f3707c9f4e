//! Loan lifecycle rules: eligibility, repayment and default detection.

use soroban_sdk::{symbol_short, Address, Env, Symbol};

use crate::gate;
use crate::storage;
use crate::types::{Loan, PoolConfig, PoolError, RepaymentPolicy};

/// True while the loan blocks a new issuance for the same borrower.
pub fn is_unpaid(loan: &Loan) -> bool {
    loan.active && loan.outstanding > 0
}

/// Active, unpaid and past its due time.
pub fn is_in_default(loan: &Loan, now: u64) -> bool {
    is_unpaid(loan) && now > loan.due_time
}

/// Runs the issuance checks in order; the first failure wins.
///
/// `term_seconds` is `None` for the eligibility preview, which has no term.
pub fn check_eligibility(
    env: &Env,
    config: &PoolConfig,
    borrower: &Address,
    principal: i128,
    term_seconds: Option<u64>,
) -> Result<(), PoolError> {
    if storage::is_banned(env, borrower) {
        return Err(PoolError::Banned);
    }
    if principal <= 0 {
        return Err(PoolError::InvalidAmount);
    }
    if term_seconds == Some(0) {
        return Err(PoolError::InvalidTerm);
    }
    if storage::available_liquidity(env)? < principal {
        return Err(PoolError::InsufficientLiquidity);
    }
    if let Some(gate_address) = &config.credential_gate {
        gate::check_credential(env, gate_address, borrower, config.min_score)?;
    }
    if let Some(existing) = storage::read_loan(env, borrower) {
        if is_unpaid(&existing) {
            return Err(PoolError::LoanAlreadyActive);
        }
    }
    Ok(())
}

/// Builds the record that replaces any previous loan of the borrower.
pub fn new_loan(principal: i128, now: u64, term_seconds: u64) -> Result<Loan, PoolError> {
    let due_time = now.checked_add(term_seconds).ok_or(PoolError::Overflow)?;
    Ok(Loan {
        principal,
        outstanding: principal,
        start_time: now,
        due_time,
        active: true,
    })
}

/// Applies a repayment under `policy`. Leaves `loan` untouched on error.
pub fn apply_repayment(
    loan: &mut Loan,
    amount: i128,
    policy: RepaymentPolicy,
) -> Result<(), PoolError> {
    if !loan.active {
        return Err(PoolError::NoActiveLoan);
    }
    if amount <= 0 {
        return Err(PoolError::InvalidAmount);
    }
    if amount > loan.outstanding {
        return Err(PoolError::AmountExceedsOutstanding);
    }
    if policy == RepaymentPolicy::FullSettlement && amount != loan.outstanding {
        return Err(PoolError::RepaymentMustSettleInFull);
    }

    loan.outstanding -= amount;
    if loan.outstanding == 0 {
        loan.active = false;
    }
    Ok(())
}

/// Short reason code reported by the eligibility preview. The preview takes
/// no term, so only the checks it can fail have their own code; anything
/// else reports `error`.
pub fn reason_code(result: &Result<(), PoolError>) -> Symbol {
    match result {
        Ok(()) => symbol_short!("ok"),
        Err(PoolError::Banned) => symbol_short!("banned"),
        Err(PoolError::InvalidAmount) => symbol_short!("zero_amt"),
        Err(PoolError::InsufficientLiquidity) => symbol_short!("no_liq"),
        Err(PoolError::NoCredential) => symbol_short!("no_cred"),
        Err(PoolError::InvalidScore) => symbol_short!("bad_score"),
        Err(PoolError::ScoreTooLow) => symbol_short!("low_score"),
        Err(PoolError::LoanAlreadyActive) => symbol_short!("has_loan"),
        Err(_) => symbol_short!("error"),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn loan(outstanding: i128) -> Loan {
        Loan {
            principal: 1_000,
            outstanding,
            start_time: 0,
            due_time: 100,
            active: outstanding > 0,
        }
    }

    #[test]
    fn partial_repayment_reduces_outstanding() {
        let mut l = loan(1_000);
        apply_repayment(&mut l, 400, RepaymentPolicy::Partial).unwrap();
        assert_eq!(l.outstanding, 600);
        assert!(l.active);
        apply_repayment(&mut l, 600, RepaymentPolicy::Partial).unwrap();
        assert_eq!(l.outstanding, 0);
        assert!(!l.active);
    }

    #[test]
    fn over_repayment_leaves_loan_untouched() {
        let mut l = loan(300);
        let before = l.clone();
        assert_eq!(
            apply_repayment(&mut l, 301, RepaymentPolicy::Partial),
            Err(PoolError::AmountExceedsOutstanding)
        );
        assert_eq!(l, before);
    }

    #[test]
    fn full_settlement_rejects_partial_amount() {
        let mut l = loan(500);
        assert_eq!(
            apply_repayment(&mut l, 200, RepaymentPolicy::FullSettlement),
            Err(PoolError::RepaymentMustSettleInFull)
        );
        apply_repayment(&mut l, 500, RepaymentPolicy::FullSettlement).unwrap();
        assert!(!l.active);
        assert_eq!(l.outstanding, 0);
    }

    #[test]
    fn repayment_checks_run_in_order() {
        let mut closed = loan(0);
        assert_eq!(
            apply_repayment(&mut closed, 0, RepaymentPolicy::Partial),
            Err(PoolError::NoActiveLoan)
        );
        let mut open = loan(10);
        assert_eq!(
            apply_repayment(&mut open, 0, RepaymentPolicy::Partial),
            Err(PoolError::InvalidAmount)
        );
    }

    #[test]
    fn default_requires_strictly_past_due() {
        let l = loan(1);
        assert!(!is_in_default(&l, 100));
        assert!(is_in_default(&l, 101));
        assert!(!is_in_default(&loan(0), 101));
    }

    #[test]
    fn new_loan_due_time_overflow() {
        assert_eq!(new_loan(1, u64::MAX, 1), Err(PoolError::Overflow));
        let l = new_loan(50, 10, 20).unwrap();
        assert_eq!((l.outstanding, l.due_time, l.active), (50, 30, true));
    }

    #[test]
    fn reason_codes_for_preview_failures() {
        assert_eq!(reason_code(&Ok(())), symbol_short!("ok"));
        assert_eq!(reason_code(&Err(PoolError::Banned)), symbol_short!("banned"));
        assert_eq!(
            reason_code(&Err(PoolError::ScoreTooLow)),
            symbol_short!("low_score")
        );
        assert_eq!(
            reason_code(&Err(PoolError::InvalidTerm)),
            symbol_short!("error")
        );
    }
}
