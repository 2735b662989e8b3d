//! Argon2id secret encoder

use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use rand::Rng;

use crate::domain::secret::SALT_LEN;
use crate::domain::Argon2Params;
use crate::ports::{SecretEncoder, SecretError};

/// Salts with random bytes (base64) and hashes with Argon2id (hex)
pub struct Argon2SecretEncoder {
    params: Argon2Params,
}

impl Argon2SecretEncoder {
    pub fn new(params: Argon2Params) -> Self {
        Self { params }
    }

    fn hasher(&self) -> Result<Argon2<'static>, SecretError> {
        let params = Params::new(
            self.params.memory_cost,
            self.params.time_cost,
            self.params.parallelism,
            Some(self.params.hash_len as usize),
        )
        .map_err(|e| SecretError::Hash(format!("Invalid argon2 params: {}", e)))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2SecretEncoder {
    fn default() -> Self {
        Self::new(Argon2Params::default())
    }
}

impl SecretEncoder for Argon2SecretEncoder {
    fn salt(&self) -> String {
        let salt: [u8; SALT_LEN] = rand::thread_rng().gen();
        base64::engine::general_purpose::STANDARD.encode(salt)
    }

    fn encode(&self, secret: &str, salt: &str) -> Result<String, SecretError> {
        let salt = base64::engine::general_purpose::STANDARD
            .decode(salt)
            .map_err(|e| SecretError::InvalidSalt(e.to_string()))?;

        let mut hash = vec![0u8; self.params.hash_len as usize];
        self.hasher()?
            .hash_password_into(secret.as_bytes(), &salt, &mut hash)
            .map_err(|e| SecretError::Hash(e.to_string()))?;

        Ok(hex::encode(hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> Argon2SecretEncoder {
        Argon2SecretEncoder::new(Argon2Params::minimal())
    }

    #[test]
    fn test_salt_is_random_base64() {
        let encoder = encoder();
        let first = encoder.salt();
        let second = encoder.salt();

        assert_ne!(first, second);
        let decoded = base64::engine::general_purpose::STANDARD.decode(&first).unwrap();
        assert_eq!(decoded.len(), SALT_LEN);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let encoder = encoder();
        let salt = encoder.salt();

        let first = encoder.encode("s3cret", &salt).unwrap();
        let second = encoder.encode("s3cret", &salt).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert_ne!(first, "s3cret");
    }

    #[test]
    fn test_salt_changes_hash() {
        let encoder = encoder();
        let first = encoder.encode("s3cret", &encoder.salt()).unwrap();
        let second = encoder.encode("s3cret", &encoder.salt()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_invalid_salt() {
        let err = encoder().encode("s3cret", "not base64!").unwrap_err();
        assert!(matches!(err, SecretError::InvalidSalt(_)));
    }

    #[test]
    fn test_short_salt_is_rejected_by_argon2() {
        // 4 bytes, below the argon2 minimum of 8
        let err = encoder().encode("s3cret", "AAAAAA==").unwrap_err();
        assert!(matches!(err, SecretError::Hash(_)));
    }
}
