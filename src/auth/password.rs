use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::{ParkingError, ParkingResult};

/// Hash a plaintext password into a PHC string with a fresh random salt.
pub fn hash_password(plain: &str) -> ParkingResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            ParkingError::Internal(anyhow::anyhow!("password hashing failed: {e}"))
        })
}

/// Check a login attempt against a stored hash.
///
/// A stored hash that cannot be parsed is an internal error, not a failed
/// login: it means the users table holds something this service never wrote.
pub fn verify_password(plain: &str, stored: &str) -> ParkingResult<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        ParkingError::Internal(anyhow::anyhow!("stored password hash is malformed: {e}"))
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_same_password() {
        let hash = hash_password("s3cret-lot-key").expect("hash");
        assert!(verify_password("s3cret-lot-key", &hash).expect("verify"));
        assert!(!verify_password("s3cret-lot-kez", &hash).expect("verify"));
    }

    #[test]
    fn salts_every_hash() {
        let a = hash_password("admin").expect("hash");
        let b = hash_password("admin").expect("hash");
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_is_internal_error() {
        let err = verify_password("anything", "plaintext-password").unwrap_err();
        assert!(matches!(err, ParkingError::Internal(_)));
    }
}
