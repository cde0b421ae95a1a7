use pbkdf2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Params, Pbkdf2,
};

/// Iteration count for newly hashed passwords.
pub const DEFAULT_ROUNDS: u32 = 600_000;

const OUTPUT_LENGTH: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),
}

/// Salted one-way password hashing with PBKDF2-HMAC-SHA256.
///
/// Hashes are PHC strings (`$pbkdf2-sha256$i=<rounds>,l=32$<salt>$<hash>`),
/// so the algorithm and iteration count travel with the stored value and
/// verification never depends on the hasher's current `rounds`.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    rounds: u32,
}

impl PasswordHasher {
    pub fn new(rounds: u32) -> Self {
        Self {
            rounds: rounds.max(1),
        }
    }

    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let params = Params {
            rounds: self.rounds,
            output_length: OUTPUT_LENGTH,
        };

        Pbkdf2
            .hash_password_customized(password.as_bytes(), None, None, params, salt.as_salt())
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    /// Returns `false` for a wrong password and for any stored value that is
    /// not a parseable PBKDF2 hash.
    pub fn verify(&self, password: &str, password_hash: &str) -> bool {
        match PasswordHash::new(password_hash) {
            Ok(parsed_hash) => Pbkdf2
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
            Err(_) => false,
        }
    }
}
