//! Attribute paths used to locate diagnostics.

use serde::{Serialize, Serializer};
use std::fmt;

/// One step of an [`AttributePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// Named attribute of an object.
    Attribute(String),
    /// Entry of a keyed collection or dictionary.
    Key(String),
    /// Position in a list or backend array.
    Index(usize),
}

/// Location of a node, rendered as `spec.tolerations["gpu"].effect`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AttributePath {
    steps: Vec<PathStep>,
}

impl AttributePath {
    /// The empty path, pointing at the root.
    #[must_use]
    pub const fn root() -> Self {
        Self { steps: Vec::new() }
    }

    /// Parses a dotted attribute path such as `spec.config`.
    #[must_use]
    pub fn from_dotted(dotted: &str) -> Self {
        Self {
            steps: dotted
                .split('.')
                .filter(|s| !s.is_empty())
                .map(|s| PathStep::Attribute(s.to_string()))
                .collect(),
        }
    }

    /// Returns a copy extended by a named attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Self {
        self.push(PathStep::Attribute(name.to_string()))
    }

    /// Returns a copy extended by a collection key.
    #[must_use]
    pub fn key(&self, key: &str) -> Self {
        self.push(PathStep::Key(key.to_string()))
    }

    /// Returns a copy extended by an index.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        self.push(PathStep::Index(index))
    }

    fn push(&self, step: PathStep) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }

    /// The steps of the path.
    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Returns true for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns true when `self` equals `other` or lies underneath it.
    #[must_use]
    pub fn starts_with(&self, other: &Self) -> bool {
        self.steps.starts_with(&other.steps)
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return write!(f, "<root>");
        }
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                PathStep::Attribute(name) if i == 0 => write!(f, "{name}")?,
                PathStep::Attribute(name) => write!(f, ".{name}")?,
                PathStep::Key(key) => write!(f, "[{key:?}]")?,
                PathStep::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl Serialize for AttributePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mixes_attributes_keys_and_indices() {
        let path = AttributePath::root()
            .attribute("spec")
            .attribute("system_components_placement")
            .attribute("tolerations")
            .key("gpu")
            .attribute("effect");
        assert_eq!(
            path.to_string(),
            r#"spec.system_components_placement.tolerations["gpu"].effect"#
        );

        let indexed = AttributePath::from_dotted("spec.config.nodes").index(0);
        assert_eq!(indexed.to_string(), "spec.config.nodes[0]");
        assert_eq!(AttributePath::root().to_string(), "<root>");
    }

    #[test]
    fn test_starts_with() {
        let parent = AttributePath::from_dotted("spec.blueprint");
        assert!(parent.attribute("name").starts_with(&parent));
        assert!(!AttributePath::from_dotted("spec").starts_with(&parent));
    }
}
