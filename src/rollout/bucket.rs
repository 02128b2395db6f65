//! Deterministic percentage bucketing.

/// Number of buckets a user can land in.
pub const BUCKET_COUNT: u64 = 100;

/// Map `(user_id, flag_name, salt)` to a bucket in `[0, 100)`.
///
/// Fields are length-prefixed before hashing so that `("ab", "c")` and `("a", "bc")`
/// never collide.
pub fn compute_bucket(user_id: &str, flag_name: &str, salt: &str) -> u8 {
    let mut hasher = blake3::Hasher::new();
    for part in [salt, flag_name, user_id] {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    (u64::from_le_bytes(head) % BUCKET_COUNT) as u8
}

/// True when the user's bucket falls under the rollout percentage.
pub fn in_rollout(user_id: &str, flag_name: &str, salt: &str, rollout_percentage: u8) -> bool {
    compute_bucket(user_id, flag_name, salt) < rollout_percentage
}
