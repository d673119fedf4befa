//! Occupancy PIN derivation.
//!
//! The PIN is an argon2id hash of `"{number}{plate}"` with a fresh random
//! salt. Only the PHC string is ever stored.

use argon2::{Algorithm, Argon2, Params, Version};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use serde::{Deserialize, Serialize};

use crate::error::SlotError;

/// argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PinParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl PinParams {
    /// Reject parameter combinations argon2 refuses.
    pub fn validate(&self) -> Result<(), SlotError> {
        self.to_argon2().map(|_| ())
    }

    fn to_argon2(self) -> Result<Params, SlotError> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| SlotError::PinHash(format!("invalid argon2 parameters: {e}")))
    }
}

#[derive(Clone)]
pub struct PinHasher {
    argon2: Argon2<'static>,
}

impl PinHasher {
    pub fn new(params: PinParams) -> Result<Self, SlotError> {
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params.to_argon2()?),
        })
    }

    /// Hash the PIN for `plate` parked in slot `number`.
    pub fn hash(&self, number: u32, plate: &str) -> Result<String, SlotError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(secret(number, plate).as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| SlotError::PinHash(e.to_string()))
    }

    /// Check a candidate `(number, plate)` against a stored PIN hash.
    pub fn verify(&self, number: u32, plate: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(secret(number, plate).as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

fn secret(number: u32, plate: &str) -> String {
    format!("{number}{plate}")
}

/// Cheap parameters so tests don't spend seconds in argon2.
#[cfg(test)]
pub(crate) fn test_hasher() -> PinHasher {
    PinHasher::new(PinParams {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}
