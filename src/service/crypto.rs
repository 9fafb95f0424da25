use sha3::{Digest, Sha3_256};

pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha3_256::default();
    hasher.update(password.as_bytes());
    format!("{:X}", hasher.finalize())
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    hash_password(password) == stored_hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_verifiable() {
        let hash = hash_password("password123");
        assert!(verify_password("password123", &hash));
        assert!(!verify_password("password124", &hash));
    }
}
