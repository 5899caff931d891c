//! One-way password hashing and verification.
//!
//! Passwords are stored as method-tagged credential strings so that records
//! written under either scheme keep verifying:
//!
//! - `argon2$<PHC string>` — the preferred adaptive salted hash,
//! - `pbkdf2$<salt>$<digest hex>` — HMAC-SHA-256 key derivation with an
//!   explicit random salt and a fixed iteration count.
//!
//! The scheme used for new credentials is chosen once, at process start.
//! [`verify`] is total: malformed strings, unknown method tags, and
//! mismatches all simply verify as `false`.

use std::fmt::Write as _;

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::{OsRng, RngCore},
    },
};
use sha2::Sha256;

const ARGON2_TAG: &str = "argon2";
const PBKDF2_TAG: &str = "pbkdf2";
const PBKDF2_ROUNDS: u32 = 100_000;
const PBKDF2_OUTPUT_BYTES: usize = 32;
const SALT_BYTES: usize = 16;

/// The hashing scheme used for newly created credentials.
///
/// Resolved once at process start. Verification is independent of this
/// choice: credentials created under either scheme always verify.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scheme {
    /// Adaptive salted hashing with Argon2, stored as a PHC string.
    #[default]
    Argon2,
    /// PBKDF2-HMAC-SHA-256 with a random salt and a fixed iteration count.
    Pbkdf2,
}

/// The password could not be hashed.
#[derive(Debug, thiserror::Error)]
#[error("failed to hash password: {0}")]
pub struct Error(argon2::password_hash::Error);

/// Hashes a password into a method-tagged credential string.
///
/// # Errors
///
/// Returns an error if the underlying hash function rejects its input. This
/// does not happen for ordinary passwords.
pub fn hash(scheme: Scheme, password: &str) -> Result<String, Error> {
    match scheme {
        Scheme::Argon2 => {
            let salt = SaltString::generate(&mut OsRng);
            let phc = Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map_err(Error)?;
            Ok(format!("{ARGON2_TAG}${phc}"))
        }
        Scheme::Pbkdf2 => {
            let mut salt = [0u8; SALT_BYTES];
            OsRng.fill_bytes(&mut salt);
            let salt = hex(&salt);
            let digest = derive(password, salt.as_bytes());
            Ok(format!("{PBKDF2_TAG}${salt}${}", hex(&digest)))
        }
    }
}

/// Checks a password against a stored credential string.
///
/// Returns `false` for a wrong password, a malformed credential string, or an
/// unsupported method tag; the caller learns nothing beyond the boolean.
#[must_use]
pub fn verify(password: &str, stored: &str) -> bool {
    let Some((method, payload)) = stored.split_once('$') else {
        tracing::debug!("credential string carries no method tag");
        return false;
    };

    match method {
        ARGON2_TAG => PasswordHash::new(payload).is_ok_and(|phc| {
            Argon2::default()
                .verify_password(password.as_bytes(), &phc)
                .is_ok()
        }),
        PBKDF2_TAG => {
            let Some((salt, digest)) = payload.split_once('$') else {
                return false;
            };
            hex(&derive(password, salt.as_bytes())) == digest
        }
        other => {
            tracing::debug!("unsupported credential method {other:?}");
            false
        }
    }
}

fn derive(password: &str, salt: &[u8]) -> [u8; PBKDF2_OUTPUT_BYTES] {
    let mut out = [0u8; PBKDF2_OUTPUT_BYTES];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut out);
    out
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(
        String::with_capacity(bytes.len() * 2),
        |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        },
    )
}
