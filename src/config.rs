/// Generation attempts before giving up on finding an id outside the
/// exclusion list. A fixed policy constant, not derived from the pattern's
/// keyspace.
pub const MAX_ATTEMPTS: usize = 20;

/// The only generation method implemented so far.
pub const METHOD_RANDOM_ID: &str = "random-id";
