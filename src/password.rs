//! Password utilities

use argon2::Argon2;
use argon2::password_hash;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;

/// Generate a new random password
pub fn generate() -> String {
    SaltString::generate(&mut OsRng).to_string()
}

/// Hash a given password with a fresh salt
///
/// # Errors
///
/// Will return `Err` when Argon2 rejects the password or its parameters
pub fn hash(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);

    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Verify a given password against a given hash
///
/// A hash that can not be parsed never verifies
pub fn verify(hashed_password: &str, password: &str) -> bool {
    PasswordHash::new(hashed_password).is_ok_and(|parsed_hash| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = generate();
        let hashed_password = hash(&password).unwrap();

        assert!(verify(&hashed_password, &password));
        assert!(!verify(&hashed_password, "wrong"));
        assert!(!verify("not-a-hash", &password));
    }

    #[test]
    fn test_hash_empty_and_long_passwords() {
        let empty = hash("").unwrap();
        assert!(verify(&empty, ""));

        let long = "x".repeat(1024);
        let hashed_long = hash(&long).unwrap();
        assert!(verify(&hashed_long, &long));
        assert!(!verify(&hashed_long, &long[1..]));
    }

    #[test]
    fn test_hash_uses_fresh_salt() {
        let first = hash("verysecret").unwrap();
        let second = hash("verysecret").unwrap();

        assert_ne!(first, second);
    }
}
