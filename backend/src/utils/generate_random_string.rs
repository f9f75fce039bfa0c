use rand::{Rng, distributions::Alphanumeric};

/// Generates a random alphanumeric string of the specified length.
///
/// Characters are drawn independently (with replacement) from `A-Z`, `a-z`
/// and `0-9` using the thread-local CSPRNG, so the string carries
/// `length * log2(62)` bits of entropy. Used for verification codes and
/// session tokens.
///
/// # Examples
///
/// ```ignore
/// let code = generate_random_string(32);
/// assert_eq!(code.len(), 32);
/// ```
pub fn generate_random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
