//! Identity types for reactor instances and their reactions

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between names in a fully-qualified name
pub const FQN_SEPARATOR: char = '.';

/// Characters a reactor name may not contain: the fqn separator and the
/// brackets of a bank member's `name[i]` segment
pub const RESERVED_NAME_CHARS: [char; 3] = [FQN_SEPARATOR, '[', ']'];

/// Check that `name` can be used as a reactor name
///
/// Excluding the reserved characters keeps fqns unique: no singleton can be
/// named like a bank member's segment, and no name can span two levels.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() || name.contains(RESERVED_NAME_CHARS) {
        return Err(ValidationError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Handle of a reactor instance inside its environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReactorId(pub u32);

impl ReactorId {
    /// Create a new reactor ID
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u32 {
        self.0
    }

    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ReactorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reactor:{}", self.0)
    }
}

/// Position of a reaction within its reactor (declaration order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReactionId(pub usize);

impl fmt::Display for ReactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reaction:{}", self.0)
    }
}

/// Name, parent link, bank index and fully-qualified name of an instance
///
/// The parent is a back-reference into the environment's arena, not an
/// ownership edge. The fqn is computed once at construction since names never
/// change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactorIdentity {
    name: String,
    parent: Option<ReactorId>,
    bank: Option<usize>,
    fqn: String,
}

impl ReactorIdentity {
    /// Identity of a reactor attached directly to the environment
    ///
    /// The fqn is the name itself, except for a root-level bank member whose
    /// fqn is its `name[i]` segment.
    pub fn root(name: impl Into<String>, bank: Option<usize>) -> Self {
        let name = name.into();
        let fqn = segment(&name, bank);
        Self {
            name,
            parent: None,
            bank,
            fqn,
        }
    }

    /// Identity of a reactor nested under `parent`
    pub fn nested(
        name: impl Into<String>,
        parent: ReactorId,
        parent_fqn: &str,
        bank: Option<usize>,
    ) -> Self {
        let name = name.into();
        let fqn = format!("{}{}{}", parent_fqn, FQN_SEPARATOR, segment(&name, bank));
        Self {
            name,
            parent: Some(parent),
            bank,
            fqn,
        }
    }

    /// The instance's own name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The containing reactor, `None` for a root
    pub fn parent(&self) -> Option<ReactorId> {
        self.parent
    }

    /// Position in a bank, 0 for a singleton
    pub fn bank_index(&self) -> usize {
        self.bank.unwrap_or(0)
    }

    /// Check if this instance is a member of a bank
    pub fn is_bank_member(&self) -> bool {
        self.bank.is_some()
    }

    /// Names from the root to this instance joined by [`FQN_SEPARATOR`]
    pub fn fqn(&self) -> &str {
        &self.fqn
    }

    pub(crate) fn bank(&self) -> Option<usize> {
        self.bank
    }
}

impl fmt::Display for ReactorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fqn)
    }
}

fn segment(name: &str, bank: Option<usize>) -> String {
    match bank {
        Some(index) => format!("{}[{}]", name, index),
        None => name.to_string(),
    }
}
