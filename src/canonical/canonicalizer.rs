//! Array to keyed-map canonicalization and back.
//!
//! Backend arrays are exposed to configuration as maps keyed by a natural key
//! so that reordering or inserting an unrelated element does not shift every
//! element's identity. The reverse direction sorts deterministically, and
//! places fallback-keyed elements last in ordinal order so that the next
//! canonicalization hands out exactly the same fallback keys.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::diagnostics::{AttributePath, DiagnosticKind, Diagnostics};
use crate::value::Scalar;

use super::strategy::{CollectionProfile, KeyedElement};

/// Why an element received its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOrigin {
    /// The element's own natural key.
    Natural,
    /// The natural key was empty or missing.
    EmptyKey,
    /// The natural key was already claimed by an earlier element.
    DuplicateKey(String),
}

/// A key assigned to one element of an array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedKey {
    /// The map key.
    pub key: String,
    /// How the key was chosen.
    pub origin: KeyOrigin,
}

impl AssignedKey {
    /// Returns true if the key is a fallback.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.origin != KeyOrigin::Natural
    }
}

/// Converts one collection type between array and keyed-map form.
#[derive(Debug, Clone, Copy)]
pub struct CollectionCanonicalizer<'a> {
    profile: &'a CollectionProfile,
}

impl<'a> CollectionCanonicalizer<'a> {
    /// Creates a canonicalizer for one collection profile.
    #[must_use]
    pub const fn new(profile: &'a CollectionProfile) -> Self {
        Self { profile }
    }

    /// Chooses a unique key for every element, in array order.
    ///
    /// The first element carrying a natural key claims it. Elements whose key
    /// is empty, or already claimed, receive `<prefix>-<n>` with the smallest
    /// `n` not colliding with any natural key or earlier fallback.
    pub fn assign_keys<E: KeyedElement>(&self, elements: &[E]) -> Vec<AssignedKey> {
        let natural: Vec<Option<String>> = elements
            .iter()
            .map(|element| self.profile.key.extract(element))
            .collect();
        let reserved: BTreeSet<&str> = natural.iter().flatten().map(String::as_str).collect();

        let mut used: BTreeSet<String> = BTreeSet::new();
        let mut ordinal = 0_usize;
        let mut assigned = Vec::with_capacity(elements.len());

        for key in natural.iter().cloned() {
            if let Some(key) = key.as_ref().filter(|k| !used.contains(k.as_str())) {
                used.insert(key.clone());
                assigned.push(AssignedKey {
                    key: key.clone(),
                    origin: KeyOrigin::Natural,
                });
                continue;
            }

            let fallback = loop {
                ordinal += 1;
                let candidate = self.fallback_key(ordinal);
                if !reserved.contains(candidate.as_str()) && !used.contains(&candidate) {
                    break candidate;
                }
            };
            used.insert(fallback.clone());
            assigned.push(AssignedKey {
                key: fallback,
                origin: key.map_or(KeyOrigin::EmptyKey, KeyOrigin::DuplicateKey),
            });
        }

        assigned
    }

    /// Converts an array into a map ordered by key.
    ///
    /// Every fallback assignment is recorded as an
    /// [`DiagnosticKind::AmbiguousCollectionKey`] warning at the element's index.
    pub fn canonicalize<E: KeyedElement>(
        &self,
        elements: Vec<E>,
        path: &AttributePath,
        diagnostics: &mut Diagnostics,
    ) -> BTreeMap<String, E> {
        let keys = self.assign_keys(&elements);
        report_fallbacks(&keys, path, diagnostics);
        keys.into_iter().map(|k| k.key).zip(elements).collect()
    }

    /// Converts a keyed map into an array in deterministic order.
    ///
    /// Entries whose natural key equals their map key come first, ordered by
    /// the profile's sort field and then by key. The remaining entries, the
    /// fallback-keyed ones, follow in fallback ordinal order.
    pub fn decanonicalize<K, E>(&self, entries: impl IntoIterator<Item = (K, E)>) -> Vec<(K, E)>
    where
        K: AsRef<str>,
        E: KeyedElement,
    {
        let mut ranked: Vec<(SortRank, K, E)> = entries
            .into_iter()
            .map(|(key, element)| (self.rank(key.as_ref(), &element), key, element))
            .collect();
        ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.as_ref().cmp(b.1.as_ref())));
        debug!(
            "Decanonicalized {} element(s) with prefix {}",
            ranked.len(),
            self.profile.fallback_prefix
        );
        ranked.into_iter().map(|(_, key, element)| (key, element)).collect()
    }

    /// Parses the ordinal out of a fallback key of this profile.
    #[must_use]
    pub fn fallback_ordinal(&self, key: &str) -> Option<usize> {
        key.strip_prefix(self.profile.fallback_prefix.as_str())?
            .strip_prefix('-')?
            .parse()
            .ok()
    }

    fn fallback_key(&self, ordinal: usize) -> String {
        format!("{}-{ordinal}", self.profile.fallback_prefix)
    }

    fn rank<E: KeyedElement>(&self, key: &str, element: &E) -> SortRank {
        let natural = self.profile.key.extract(element);
        if natural.as_deref() == Some(key) {
            SortRank::Natural(
                self.profile
                    .sort_field
                    .as_deref()
                    .and_then(|field| element.scalar_attribute(field)),
            )
        } else {
            SortRank::Fallback(self.fallback_ordinal(key).unwrap_or(usize::MAX))
        }
    }
}

/// Sort position of one entry during decanonicalization.
#[derive(Debug)]
enum SortRank {
    Natural(Option<Scalar>),
    Fallback(usize),
}

impl SortRank {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Natural(a), Self::Natural(b)) => match (a, b) {
                (Some(a), Some(b)) => a.sort_cmp(b),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            (Self::Natural(_), Self::Fallback(_)) => Ordering::Less,
            (Self::Fallback(_), Self::Natural(_)) => Ordering::Greater,
            (Self::Fallback(a), Self::Fallback(b)) => a.cmp(b),
        }
    }
}

fn report_fallbacks(keys: &[AssignedKey], path: &AttributePath, diagnostics: &mut Diagnostics) {
    for (index, assigned) in keys.iter().enumerate() {
        let message = match &assigned.origin {
            KeyOrigin::Natural => continue,
            KeyOrigin::EmptyKey => format!(
                "element has an empty natural key; assigned fallback key \"{}\"",
                assigned.key
            ),
            KeyOrigin::DuplicateKey(natural) => format!(
                "natural key \"{natural}\" is already used by another element; assigned fallback key \"{}\"",
                assigned.key
            ),
        };
        warn!("{}: {message}", path.index(index));
        diagnostics.warning(DiagnosticKind::AmbiguousCollectionKey, path.index(index), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::KeyStrategy;
    use crate::value::ConfigNode;

    fn toleration_profile() -> CollectionProfile {
        CollectionProfile::new(KeyStrategy::field("key"), "toleration").sorted_by("key")
    }

    fn toleration(key: &str, effect: &str) -> ConfigNode {
        ConfigNode::object([
            ("key", ConfigNode::scalar(key)),
            ("effect", ConfigNode::scalar(effect)),
        ])
    }

    fn keys_of<E>(entries: &[(String, E)]) -> Vec<&str> {
        entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn test_three_tolerations_with_empty_key() {
        let profile = toleration_profile();
        let canonicalizer = CollectionCanonicalizer::new(&profile);
        let path = AttributePath::from_dotted("spec.system_components_placement.tolerations");
        let mut diagnostics = Diagnostics::new();

        let backend = vec![
            toleration("gpu", "NoSchedule"),
            toleration("", "NoExecute"),
            toleration("node-role", "NoSchedule"),
        ];
        let map = canonicalizer.canonicalize(backend, &path, &mut diagnostics);

        assert_eq!(
            map.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["gpu", "node-role", "toleration-1"]
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(!diagnostics.has_error());
        assert_eq!(
            diagnostics.iter().next().map(|d| d.path.to_string()),
            Some(String::from("spec.system_components_placement.tolerations[1]"))
        );

        let array = canonicalizer.decanonicalize(map);
        assert_eq!(keys_of(&array), vec!["gpu", "node-role", "toleration-1"]);
        assert_eq!(array[2].1, toleration("", "NoExecute"));
    }

    #[test]
    fn test_duplicates_never_overwrite() {
        let profile = toleration_profile();
        let canonicalizer = CollectionCanonicalizer::new(&profile);
        let mut diagnostics = Diagnostics::new();

        let map = canonicalizer.canonicalize(
            vec![toleration("gpu", "NoSchedule"), toleration("gpu", "NoExecute")],
            &AttributePath::from_dotted("tolerations"),
            &mut diagnostics,
        );

        assert_eq!(map.len(), 2);
        assert_eq!(map["gpu"], toleration("gpu", "NoSchedule"));
        assert_eq!(map["toleration-1"], toleration("gpu", "NoExecute"));
        assert!(diagnostics.contains_kind(DiagnosticKind::AmbiguousCollectionKey));
    }

    #[test]
    fn test_fallback_skips_keys_claimed_naturally() {
        let profile = toleration_profile();
        let canonicalizer = CollectionCanonicalizer::new(&profile);

        let keys = canonicalizer.assign_keys(&[
            toleration("", "NoSchedule"),
            toleration("toleration-1", "NoSchedule"),
            toleration("", "NoExecute"),
        ]);
        let names: Vec<_> = keys.iter().map(|k| k.key.as_str()).collect();
        assert_eq!(names, vec!["toleration-2", "toleration-1", "toleration-3"]);
        assert!(keys[0].is_fallback());
        assert!(!keys[1].is_fallback());
    }

    #[test]
    fn test_fallback_keys_survive_repeated_round_trips() {
        let profile = toleration_profile();
        let canonicalizer = CollectionCanonicalizer::new(&profile);
        let path = AttributePath::from_dotted("tolerations");

        let backend = vec![
            toleration("", "NoExecute"),
            toleration("zone", "NoSchedule"),
            toleration("", "NoSchedule"),
            toleration("zone", "PreferNoSchedule"),
        ];
        let first = canonicalizer.canonicalize(backend, &path, &mut Diagnostics::new());
        let first_keys: Vec<String> = first.keys().cloned().collect();

        let mut current = first.clone();
        for _ in 0..2 {
            let array: Vec<ConfigNode> = canonicalizer
                .decanonicalize(current)
                .into_iter()
                .map(|(_, element)| element)
                .collect();
            current = canonicalizer.canonicalize(array, &path, &mut Diagnostics::new());
            assert_eq!(current, first);
        }
        assert_eq!(first_keys, vec!["toleration-1", "toleration-2", "toleration-3", "zone"]);
    }

    #[test]
    fn test_reordered_entries_decanonicalize_identically() {
        let profile = CollectionProfile::new(KeyStrategy::field("name"), "node-group").sorted_by("name");
        let canonicalizer = CollectionCanonicalizer::new(&profile);
        let group = |name: &str| ConfigNode::object([("name", ConfigNode::scalar(name))]);

        let written_one_way = vec![("ng-b", group("ng-b")), ("ng-a", group("ng-a"))];
        let written_other_way = vec![("ng-a", group("ng-a")), ("ng-b", group("ng-b"))];

        assert_eq!(
            canonicalizer.decanonicalize(written_one_way),
            canonicalizer.decanonicalize(written_other_way)
        );
    }

    #[test]
    fn test_sort_field_orders_before_key() {
        let profile = CollectionProfile::new(KeyStrategy::field("name"), "node").sorted_by("weight");
        let canonicalizer = CollectionCanonicalizer::new(&profile);
        let node = |name: &str, weight: i64| {
            ConfigNode::object([
                ("name", ConfigNode::scalar(name)),
                ("weight", ConfigNode::scalar(weight)),
            ])
        };

        let ordered = canonicalizer.decanonicalize([
            ("a", node("a", 10)),
            ("b", node("b", 2)),
            ("c", node("c", 2)),
        ]);
        let keys: Vec<_> = ordered.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_fallback_ordinal_parsing() {
        let profile = toleration_profile();
        let canonicalizer = CollectionCanonicalizer::new(&profile);
        assert_eq!(canonicalizer.fallback_ordinal("toleration-12"), Some(12));
        assert_eq!(canonicalizer.fallback_ordinal("toleration-x"), None);
        assert_eq!(canonicalizer.fallback_ordinal("taint-1"), None);
    }
}
