//! Unique identifiers for test isolation.

use ulid::Ulid;

/// Unique string in the form `{prefix}-{ulid}`.
///
/// ```
/// use api_test_support::unique_helpers::unique_str;
///
/// let a = unique_str("user");
/// let b = unique_str("user");
/// assert_ne!(a, b);
/// assert!(a.starts_with("user-"));
/// ```
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Ulid::new())
}

/// Unique numeric subject id, suitable for routes with `{user_id}` placeholders.
pub fn unique_subject_id() -> String {
    // Low 48 bits of the ULID random part keep ids short and digit-only.
    let n = Ulid::new().random() & 0xFFFF_FFFF_FFFF;
    format!("{}", n.max(1))
}
