//! Diff-stable canonicalization of repeated collections.
//!
//! A repeated field is an array on the backend and a map keyed by a natural
//! key in configuration. This module holds the key extraction strategies, the
//! per-collection-type table that names them, and the canonicalizer that
//! converts between the two forms.

mod strategy;
mod canonicalizer;

pub use strategy::{CollectionProfile, GraphElement, KeyStrategy, KeyStrategyTable, KeyedElement};
pub use canonicalizer::{AssignedKey, CollectionCanonicalizer, KeyOrigin};
