use anyhow::{anyhow, Result};

pub fn hash_password(plain: &str, cost: u32) -> Result<String> {
    bcrypt::hash(plain, cost).map_err(|e| anyhow!("Failed to hash password: {}", e))
}

pub fn verify_password(plain: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(plain, hash).map_err(|e| anyhow!("Password verification failed: {}", e))
}
