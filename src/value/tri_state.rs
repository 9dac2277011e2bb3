//! The four-way presence model shared by every configuration value.

/// A configuration value that may be absent, null, unknown or present.
///
/// `Absent` means the attribute was never written; `Null` means it was written
/// as `null`. Both resolve the same way on expand, but they are kept apart so
/// a persisted tree reproduces exactly what the user wrote. `Unknown` is a
/// value that will only be decided after apply.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TriState<T> {
    /// Not written in the configuration.
    #[default]
    Absent,
    /// Explicitly set to null.
    Null,
    /// Known only after apply.
    Unknown,
    /// A concrete value.
    Present(T),
}

impl<T> TriState<T> {
    /// Returns true unless the value is [`TriState::Unknown`].
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Returns true for [`TriState::Unknown`].
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Returns true for [`TriState::Present`].
    #[must_use]
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Returns true for [`TriState::Absent`].
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns true for `Absent` or `Null`, the two "not specified" states.
    #[must_use]
    pub const fn is_null_like(&self) -> bool {
        matches!(self, Self::Absent | Self::Null)
    }

    /// Borrows the concrete value, if any.
    #[must_use]
    pub const fn as_present(&self) -> Option<&T> {
        match self {
            Self::Present(value) => Some(value),
            _ => None,
        }
    }

    /// Converts from `&TriState<T>` to `TriState<&T>`.
    #[must_use]
    pub const fn as_ref(&self) -> TriState<&T> {
        match self {
            Self::Absent => TriState::Absent,
            Self::Null => TriState::Null,
            Self::Unknown => TriState::Unknown,
            Self::Present(value) => TriState::Present(value),
        }
    }

    /// Maps the concrete value, keeping the other states unchanged.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TriState<U> {
        match self {
            Self::Absent => TriState::Absent,
            Self::Null => TriState::Null,
            Self::Unknown => TriState::Unknown,
            Self::Present(value) => TriState::Present(f(value)),
        }
    }

    /// Builds a value from an option, treating `None` as `Null`.
    #[must_use]
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(Self::Null, Self::Present)
    }

    /// Short name of the state, used in diagnostics.
    #[must_use]
    pub const fn state_name(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Null => "null",
            Self::Unknown => "unknown",
            Self::Present(_) => "present",
        }
    }
}

impl<T> From<T> for TriState<T> {
    fn from(value: T) -> Self {
        Self::Present(value)
    }
}
