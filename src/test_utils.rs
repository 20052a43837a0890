//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    /// Generate a project identifier (lowercase with underscores)
    pub fn identity() -> impl Strategy<Value = String> {
        "[a-z][a-z_]{0,8}"
    }

    /// Generate a relative directory as path segments, e.g. `["a", "bc"]`
    pub fn relative_dir() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-d]{1,2}", 1..4)
    }

    /// Generate an absolute prefix-path entry such as `/opt/ros`
    pub fn prefix_entry() -> impl Strategy<Value = String> {
        "/[a-z]{1,8}(/[a-z]{1,8}){0,2}"
    }

    /// Generate a dotted version string
    pub fn version() -> impl Strategy<Value = String> {
        (0u32..20, 0u32..50, 0u32..100)
            .prop_map(|(major, minor, patch)| format!("{major}.{minor}.{patch}"))
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_identity_generator(name in identity()) {
            prop_assert!(!name.is_empty());
            prop_assert!(name.chars().all(|c| c.is_ascii_lowercase() || c == '_'));
        }

        #[test]
        fn test_relative_dir_generator(parts in relative_dir()) {
            prop_assert!(!parts.is_empty());
            prop_assert!(parts.iter().all(|p| !p.starts_with('.')));
        }

        #[test]
        fn test_prefix_entry_generator(entry in prefix_entry()) {
            prop_assert!(entry.starts_with('/'));
            prop_assert!(!entry.contains(';'));
        }

        #[test]
        fn test_version_generator(v in version()) {
            prop_assert_eq!(v.split('.').count(), 3);
        }
    }
}
