//! Component selection
//!
//! An inclusion specification is a delimited identity list (`,`, `;` or
//! whitespace). Matching is exact set membership unless the legacy
//! substring mode is configured, in which case an identity is included when
//! it occurs anywhere in the raw specification string.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::component::Component;

/// How identities are matched against an inclusion specification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Identity must be one of the listed names
    #[default]
    Exact,
    /// Identity must occur somewhere in the raw specification
    Substring,
}

/// A parsed inclusion specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    raw: String,
    names: BTreeSet<String>,
    mode: MatchMode,
}

impl Selection {
    /// Parse an inclusion specification
    pub fn parse(spec: &str, mode: MatchMode) -> Self {
        let names = spec
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Self {
            raw: spec.trim().to_string(),
            names,
            mode,
        }
    }

    /// Check if nothing was listed
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Listed names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Matching mode
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Check if an identity is selected
    pub fn includes(&self, identity: &str) -> bool {
        match self.mode {
            MatchMode::Exact => self.names.contains(identity),
            MatchMode::Substring => self.raw.contains(identity),
        }
    }

    /// Check if the selection names exactly one identity, `identity`
    pub fn is_exactly(&self, identity: &str) -> bool {
        self.names.len() == 1 && self.names.contains(identity)
    }
}

/// Narrow `components` to the selection, logging each skip
///
/// Without a selection every component is returned in order.
pub fn select(components: &[Component], selection: Option<&Selection>) -> Vec<Component> {
    let Some(selection) = selection else {
        return components.to_vec();
    };

    components
        .iter()
        .filter(|component| {
            let keep = selection.includes(&component.identity);
            if !keep {
                tracing::info!("Skipping {} (not selected)", component.identity);
            }
            keep
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use crate::test_utils::generators::identity;
    use std::path::PathBuf;

    fn component(identity: &str) -> Component {
        Component {
            path: PathBuf::from(format!("/ws/src/{identity}")),
            identity: identity.to_string(),
            name: identity.to_string(),
            version: "0.1.0".to_string(),
        }
    }

    // ============================================
    // Unit Tests
    // ============================================

    #[test]
    fn test_parse_accepts_mixed_delimiters() {
        let selection = Selection::parse("nav_core, planner;  driver\tviz", MatchMode::Exact);
        let names: Vec<_> = selection.names().collect();
        assert_eq!(names, vec!["driver", "nav_core", "planner", "viz"]);
    }

    #[test]
    fn test_exact_rejects_substring_false_positive() {
        let selection = Selection::parse("nav_core_extras", MatchMode::Exact);
        assert!(!selection.includes("nav_core"));
        assert!(selection.includes("nav_core_extras"));
    }

    #[test]
    fn test_substring_mode_reproduces_false_positive() {
        let selection = Selection::parse("nav_core_extras", MatchMode::Substring);
        assert!(selection.includes("nav_core"));
        assert!(selection.includes("core"));
    }

    #[test]
    fn test_is_exactly() {
        assert!(Selection::parse("bringup", MatchMode::Exact).is_exactly("bringup"));
        assert!(!Selection::parse("bringup,nav", MatchMode::Exact).is_exactly("bringup"));
        assert!(!Selection::parse("bringup_sim", MatchMode::Substring).is_exactly("bringup"));
    }

    #[test]
    fn test_select_without_selection_is_identity() {
        let all = vec![component("a"), component("b")];
        assert_eq!(select(&all, None), all);
    }

    #[test]
    fn test_select_keeps_order() {
        let all = vec![component("a"), component("b"), component("c")];
        let selection = Selection::parse("c,a", MatchMode::Exact);
        let chosen: Vec<_> = select(&all, Some(&selection))
            .into_iter()
            .map(|c| c.identity)
            .collect();
        assert_eq!(chosen, vec!["a", "c"]);
    }

    // ============================================
    // Property Tests
    // ============================================

    fn mode() -> impl Strategy<Value = MatchMode> {
        prop_oneof![Just(MatchMode::Exact), Just(MatchMode::Substring)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Filtered output is a subset of the input
        #[test]
        fn prop_select_is_subset(
            ids in prop::collection::vec(identity(), 0..10),
            spec in "[a-z_, ]{0,30}",
            mode in mode(),
        ) {
            let all: Vec<_> = ids.iter().map(|id| component(id)).collect();
            let selection = Selection::parse(&spec, mode);
            let chosen = select(&all, Some(&selection));

            prop_assert!(chosen.len() <= all.len());
            for c in &chosen {
                prop_assert!(all.contains(c));
            }
        }

        /// Every exactly-listed identity is selected in both modes
        #[test]
        fn prop_listed_identity_is_included(ids in prop::collection::vec(identity(), 1..6), mode in mode()) {
            let spec = ids.join(",");
            let selection = Selection::parse(&spec, mode);
            for id in &ids {
                prop_assert!(selection.includes(id));
            }
        }
    }
}
