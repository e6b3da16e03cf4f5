use rand::Rng;

/// Minimum number of random characters appended to a prefix.
const MIN_SUFFIX_LEN: usize = 5;

/// Builds a throwaway resource name: `prefix` followed by random digits,
/// `max_len` characters long at most.
///
/// When the prefix leaves no room for [`MIN_SUFFIX_LEN`] random characters it
/// is shortened instead of the suffix.
pub fn random_resource_name(prefix: &str, max_len: usize) -> String {
    let max_len = max_len.max(MIN_SUFFIX_LEN);
    let prefix_len = prefix.chars().count().min(max_len - MIN_SUFFIX_LEN);
    let mut name: String = prefix.chars().take(prefix_len).collect();

    let mut rng = rand::thread_rng();
    while name.chars().count() < max_len {
        name.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }
    name
}
