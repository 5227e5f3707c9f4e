//! Boundary to the external credential gate.
//!
//! The gate is read-only from the pool's point of view. A gate call that
//! traps or returns an undecodable value counts as "not eligible", never as a
//! pool failure.

use soroban_sdk::{contractclient, contracttype, Address, Env};

use crate::types::PoolError;

/// Score record as reported by the gate.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScoreRecord {
    pub score: u32,
    pub issued_at: u64,
    pub valid: bool,
}

#[contractclient(name = "CredentialGateClient")]
pub trait CredentialGate {
    fn has_credential(env: Env, holder: Address) -> bool;
    fn get_score(env: Env, holder: Address) -> ScoreRecord;
}

/// Checks possession, score validity and the score floor, in that order.
pub fn check_credential(
    env: &Env,
    gate: &Address,
    holder: &Address,
    min_score: u32,
) -> Result<(), PoolError> {
    let client = CredentialGateClient::new(env, gate);

    if !matches!(client.try_has_credential(holder), Ok(Ok(true))) {
        return Err(PoolError::NoCredential);
    }

    let record = match client.try_get_score(holder) {
        Ok(Ok(record)) => record,
        _ => return Err(PoolError::InvalidScore),
    };
    if !record.valid {
        return Err(PoolError::InvalidScore);
    }
    if record.score < min_score {
        return Err(PoolError::ScoreTooLow);
    }
    Ok(())
}
