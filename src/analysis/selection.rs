use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{Identity, OverviewRecord};

/// The identifiers currently included in analysis.
///
/// Values are immutable: every change returns a new set, so a set handed to a
/// graph or highlighter never changes underneath it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InclusionSet {
    users: BTreeSet<String>,
}

impl InclusionSet {
    pub fn from_identifiers<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            users: identifiers.into_iter().map(Into::into).collect(),
        }
    }

    /// Every contributor of the population.
    pub fn all_of(population: &[OverviewRecord]) -> Self {
        Self::from_identifiers(population.iter().map(|record| record.identifier.clone()))
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.users.contains(identifier)
    }

    /// Identities without an identifier are never selected.
    pub fn contains_identity(&self, identity: &Identity) -> bool {
        identity.identifier().is_some_and(|id| self.contains(id))
    }

    pub fn with_user(&self, identifier: &str, selected: bool) -> Self {
        let mut users = self.users.clone();
        if selected {
            users.insert(identifier.to_string());
        } else {
            users.remove(identifier);
        }
        Self { users }
    }

    pub fn toggled(&self, identifier: &str) -> Self {
        self.with_user(identifier, !self.contains(identifier))
    }

    pub fn selected_count(&self) -> usize {
        self.users.len()
    }

    pub fn is_all_selected(&self, population_size: usize) -> bool {
        self.selected_count() == population_size
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.users.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for InclusionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_identifiers(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_changes_leave_original_untouched() {
        let original = InclusionSet::from_identifiers(["a", "b"]);
        let without_a = original.with_user("a", false);
        let with_c = original.toggled("c");

        assert!(original.contains("a"));
        assert!(!without_a.contains("a"));
        assert!(with_c.contains("c"));
        assert_eq!(original.selected_count(), 2);
        assert_eq!(with_c.selected_count(), 3);
    }

    #[test]
    fn test_all_of_population() {
        let population = vec![
            OverviewRecord {
                identifier: "a".to_string(),
                ..Default::default()
            },
            OverviewRecord {
                identifier: "b".to_string(),
                ..Default::default()
            },
        ];
        let set = InclusionSet::all_of(&population);

        assert!(set.is_all_selected(population.len()));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(InclusionSet::none().is_empty());
    }

    #[test]
    fn test_identity_without_identifier_is_not_selected() {
        let set: InclusionSet = ["a"].into_iter().collect();
        let legacy = Identity {
            email: "a@example.com".to_string(),
            ..Default::default()
        };
        assert!(!set.contains_identity(&legacy));
    }
}
