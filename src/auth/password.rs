use tracing::warn;

use crate::error::ApiResult;

pub const HASH_COST: u32 = 10;

pub fn hash_password(plain: &str) -> ApiResult<String> {
    Ok(bcrypt::hash(plain, HASH_COST)?)
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(plain: &str, hashed: &str) -> bool {
    match bcrypt::verify(plain, hashed) {
        Ok(matches) => matches,
        Err(e) => {
            warn!(error = %e, "stored password hash could not be checked");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_salted_and_verifiable() {
        let first = hash_password("pass123").unwrap();
        let second = hash_password("pass123").unwrap();
        assert_ne!(first, second);
        assert_ne!(first, "pass123");
        assert!(verify_password("pass123", &first));
        assert!(verify_password("pass123", &second));
        assert!(!verify_password("pass124", &first));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("pass123", "not-a-bcrypt-hash"));
    }
}
