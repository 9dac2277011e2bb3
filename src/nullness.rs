//! Nullness policy: how tri-state values map onto backend presence.
//!
//! Expand direction, for one attribute:
//!
//! 1. `Unknown` cannot be resolved; the caller skips the subtree.
//! 2. `Null` and `Absent` inject the declared default, if any. Otherwise the
//!    backend field is left unset, never set to a zero value.
//! 3. `Present(v)` passes through, including `""`, `[]` and `{}`.
//!
//! Flatten direction reverses this without inventing values: a backend value
//! equal to the declared default reads back as the prior `Null`/`Absent`
//! rather than `Present(default)`.

use crate::schema::FieldDescriptor;
use crate::value::{ConfigNode, ConfigValue, Scalar, TriState};

/// Outcome of resolving one configuration node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    /// Value not known until apply.
    Unknown,
    /// Not specified and no default declared.
    Missing {
        /// `true` for `Null`, `false` for `Absent`.
        explicit_null: bool,
    },
    /// Not specified; the declared default stands in.
    Defaulted(&'a Scalar),
    /// Specified by the configuration.
    Present(&'a ConfigValue),
}

impl Resolution<'_> {
    /// The `present` flag of the resolution: true only for specified values.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Returns true when the backend field should be left unset.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }
}

/// Stateless policy applied to every attribute during a walk.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullnessPolicy;

impl NullnessPolicy {
    /// Creates the policy.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolves a configuration node against its descriptor.
    #[must_use]
    pub fn resolve<'a>(&self, field: &'a FieldDescriptor, node: &'a ConfigNode) -> Resolution<'a> {
        match node {
            TriState::Unknown => Resolution::Unknown,
            TriState::Present(value) => Resolution::Present(value),
            TriState::Null | TriState::Absent => field.default.as_ref().map_or(
                Resolution::Missing {
                    explicit_null: matches!(node, TriState::Null),
                },
                Resolution::Defaulted,
            ),
        }
    }

    /// Rebuilds a scalar configuration node from a decoded backend value.
    ///
    /// `prior` is the node previously stored for this attribute, if known.
    #[must_use]
    pub fn restore(
        &self,
        field: &FieldDescriptor,
        backend: Option<Scalar>,
        prior: Option<&ConfigNode>,
    ) -> ConfigNode {
        let Some(value) = backend else {
            return self.unset(prior);
        };

        let prior_unspecified = prior.is_none_or(TriState::is_null_like);
        if prior_unspecified && field.default.as_ref().is_some_and(|d| d.same_value(&value)) {
            return self.unset(prior);
        }

        // A float written as an integer reads back in the prior's spelling.
        if let Some(TriState::Present(ConfigValue::Scalar(written))) = prior {
            if written.same_value(&value) {
                return ConfigNode::Present(ConfigValue::Scalar(written.clone()));
            }
        }

        ConfigNode::Present(ConfigValue::Scalar(value))
    }

    /// Node for an attribute the backend left unset: `Absent` when the prior
    /// configuration never wrote it, `Null` otherwise.
    #[must_use]
    pub fn unset(&self, prior: Option<&ConfigNode>) -> ConfigNode {
        match prior {
            Some(TriState::Absent) => TriState::Absent,
            _ => TriState::Null,
        }
    }
}
