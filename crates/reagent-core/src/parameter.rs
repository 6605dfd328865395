//! Bounded, described parameters owned by a single reactor instance
//!
//! A [`ParameterSet`] is fully built and validated before the reactor that
//! owns it exists. Building it is fallible as a whole, so a set with a bad
//! declaration never escapes to the caller.

use crate::error::{Error, Result, ValidationError};
use crate::value::{ParamType, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Description and bounds attached to a parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMetadata<T> {
    pub description: String,
    pub min: T,
    pub max: T,
}

impl<T: ParamType> ParameterMetadata<T> {
    /// Create metadata with an inclusive `[min, max]` range
    pub fn new(description: impl Into<String>, min: T, max: T) -> Self {
        Self {
            description: description.into(),
            min,
            max,
        }
    }
}

/// A registered parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: Value,
    pub description: String,
    pub min: Value,
    pub max: Value,
}

impl Parameter {
    /// Read the value back as `T`
    pub fn get<T: ParamType>(&self) -> Result<T> {
        T::from_value(&self.value).ok_or_else(|| Error::ParameterTypeMismatch {
            name: self.name.clone(),
            expected: T::TYPE_NAME,
            got: self.value.type_name(),
        })
    }

    /// Re-check bounds of a parameter that did not come through
    /// [`ParameterSet::add`]
    fn check_bounds(&self) -> std::result::Result<(), ValidationError> {
        match (self.value, self.min, self.max) {
            (Value::Int(value), Value::Int(min), Value::Int(max)) => validate_bounds(
                &self.name,
                value,
                &ParameterMetadata::new(self.description.as_str(), min, max),
            ),
            (Value::Float(value), Value::Float(min), Value::Float(max)) => validate_bounds(
                &self.name,
                value,
                &ParameterMetadata::new(self.description.as_str(), min, max),
            ),
            // Bounds of another type than the value can never hold it
            _ => Err(ValidationError::InvalidBounds {
                name: self.name.clone(),
                min: self.min.to_string(),
                max: self.max.to_string(),
            }),
        }
    }
}

/// A typed parameter block that can declare itself into a [`ParameterSet`]
pub trait Parameters {
    /// Add every field of this block to `set`
    fn declare(&self, set: &mut ParameterSet) -> Result<()>;
}

/// Ordered registry of a reactor's parameters
///
/// Deserializing re-runs the same checks as [`ParameterSet::add`], so a set
/// read back from disk holds the same guarantees as one built in code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParameterSet")]
pub struct ParameterSet {
    owner: String,
    params: IndexMap<String, Parameter>,
}

/// Unchecked serialized form of a [`ParameterSet`]
#[derive(Deserialize)]
struct RawParameterSet {
    owner: String,
    params: IndexMap<String, Parameter>,
}

impl TryFrom<RawParameterSet> for ParameterSet {
    type Error = ValidationError;

    fn try_from(raw: RawParameterSet) -> std::result::Result<Self, Self::Error> {
        let mut set = ParameterSet::new(raw.owner);
        for param in raw.params.into_values() {
            if set.params.contains_key(&param.name) {
                return Err(ValidationError::DuplicateParameter {
                    owner: set.owner,
                    name: param.name,
                });
            }
            param.check_bounds()?;
            set.params.insert(param.name.clone(), param);
        }
        Ok(set)
    }
}

impl ParameterSet {
    /// Create an empty set for the reactor named `owner`
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            params: IndexMap::new(),
        }
    }

    /// Build a complete set from a typed parameter block
    pub fn from_parameters<P: Parameters>(owner: impl Into<String>, params: &P) -> Result<Self> {
        let mut set = Self::new(owner);
        params.declare(&mut set)?;
        Ok(set)
    }

    /// Name of the reactor this set belongs to
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Register a parameter and return the validated value
    ///
    /// Nothing is inserted unless the name is unused and
    /// `min <= value <= max`.
    pub fn add<T: ParamType>(
        &mut self,
        name: impl Into<String>,
        value: T,
        metadata: ParameterMetadata<T>,
    ) -> Result<T> {
        let name = name.into();

        if self.params.contains_key(&name) {
            return Err(ValidationError::DuplicateParameter {
                owner: self.owner.clone(),
                name,
            }
            .into());
        }
        validate_bounds(&name, value, &metadata)?;

        tracing::trace!(owner = %self.owner, parameter = %name, %value, "parameter declared");
        self.params.insert(
            name.clone(),
            Parameter {
                name,
                value: value.into(),
                description: metadata.description,
                min: metadata.min.into(),
                max: metadata.max.into(),
            },
        );
        Ok(value)
    }

    /// Get a parameter's value as `T`
    pub fn get<T: ParamType>(&self, name: &str) -> Result<T> {
        self.params
            .get(name)
            .ok_or_else(|| Error::ParameterNotFound(format!("{}.{}", self.owner, name)))?
            .get()
    }

    /// Get a parameter with its metadata
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.params.get(name)
    }

    /// Check if a parameter exists
    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Iterate parameters in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.values()
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if no parameters are declared
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[allow(clippy::neg_cmp_op_on_partial_ord)]
fn validate_bounds<T: ParamType>(
    name: &str,
    value: T,
    metadata: &ParameterMetadata<T>,
) -> std::result::Result<(), ValidationError> {
    // NaN compares false both ways, so these are written as "not within"
    if !(metadata.min <= metadata.max) {
        return Err(ValidationError::InvalidBounds {
            name: name.to_string(),
            min: metadata.min.to_string(),
            max: metadata.max.to_string(),
        });
    }
    if !(metadata.min <= value && value <= metadata.max) {
        return Err(ValidationError::OutOfBounds {
            name: name.to_string(),
            value: value.to_string(),
            min: metadata.min.to_string(),
            max: metadata.max.to_string(),
        });
    }
    Ok(())
}
