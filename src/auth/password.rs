use bcrypt::BcryptError;

/// One-way hash with a per-call random salt. Cost 12 keeps verification in
/// the hundreds-of-milliseconds range as a brute-force throttle.
pub fn hash_password(password: &str, cost: u32) -> Result<String, BcryptError> {
    bcrypt::hash(password, cost)
}

/// Verify a candidate password against a stored hash. Comparison happens
/// inside the hashing primitive, which compares full digests rather than
/// short-circuiting on a prefix mismatch.
pub fn verify_password(password: &str, hashed: &str) -> Result<bool, BcryptError> {
    bcrypt::verify(password, hashed)
}
