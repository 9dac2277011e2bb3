//! Leaf marshaling between configuration scalars and backend values.

use thiserror::Error;

use crate::schema::FieldDescriptor;
use crate::value::{Scalar, ScalarType};

/// A leaf value the backend side cannot represent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CodecError {
    /// Description of the failure.
    pub message: String,
}

impl CodecError {
    /// Creates a codec error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Converts single leaf values to and from the backend's native types.
///
/// The engine has already checked the value against the declared
/// [`ScalarType`]; a codec rejects what the backend cannot hold.
#[cfg_attr(test, mockall::automock)]
pub trait LeafCodec {
    /// Configuration value to backend value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot represent the value.
    fn encode(&self, field: &FieldDescriptor, value: &Scalar) -> Result<Scalar, CodecError>;

    /// Backend value to configuration value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend value does not fit the attribute.
    fn decode(&self, field: &FieldDescriptor, value: &Scalar) -> Result<Scalar, CodecError>;
}

/// Codec enforcing the declared scalar types, including 32-bit ranges.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypedCodec;

impl TypedCodec {
    /// Creates the codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn check(field: &FieldDescriptor, value: &Scalar) -> Result<Scalar, CodecError> {
        if !value.matches(field.scalar_type) {
            return Err(CodecError::new(format!(
                "{} value {value} cannot be stored in {} attribute {}",
                value.type_name(),
                field.scalar_type,
                field.name
            )));
        }

        if let (ScalarType::Int32, Scalar::Int(i)) = (field.scalar_type, value) {
            if i32::try_from(*i).is_err() {
                return Err(CodecError::new(format!(
                    "value {i} does not fit in a 32-bit integer"
                )));
            }
        }

        Ok(value.clone())
    }
}

impl LeafCodec for TypedCodec {
    fn encode(&self, field: &FieldDescriptor, value: &Scalar) -> Result<Scalar, CodecError> {
        match (field.scalar_type, Self::check(field, value)?) {
            #[allow(clippy::cast_precision_loss)]
            (ScalarType::Float, Scalar::Int(i)) => Ok(Scalar::Float(i as f64)),
            (_, checked) => Ok(checked),
        }
    }

    fn decode(&self, field: &FieldDescriptor, value: &Scalar) -> Result<Scalar, CodecError> {
        Self::check(field, value)
    }
}
