//! Serializable snapshot of an environment's reactor graph
//!
//! Used to render the hierarchy when visualization is requested, and by
//! tooling that wants to inspect parameters and their bounds.

use crate::error::{Error, Result};
use crate::identity::ReactorId;
use crate::parameter::Parameter;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// All reactors of an environment in construction order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub reactors: Vec<ReactorTopology>,
}

/// One reactor instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactorTopology {
    pub id: ReactorId,
    pub name: String,
    pub fqn: String,
    pub parent: Option<ReactorId>,
    pub bank_index: Option<usize>,
    pub parameters: Vec<Parameter>,
    pub timers: Vec<TimerTopology>,
    pub outputs: Vec<String>,
    pub reactions: Vec<ReactionTopology>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerTopology {
    pub name: String,
    pub offset: Duration,
    pub period: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionTopology {
    pub label: String,
    pub triggers: Vec<String>,
    pub outputs: Vec<String>,
}

impl Topology {
    /// Look up a reactor by fully-qualified name
    pub fn find(&self, fqn: &str) -> Option<&ReactorTopology> {
        self.reactors.iter().find(|r| r.fqn == fqn)
    }

    /// Direct children of `parent`, or the roots when `parent` is `None`
    pub fn children(&self, parent: Option<ReactorId>) -> impl Iterator<Item = &ReactorTopology> {
        self.reactors.iter().filter(move |r| r.parent == parent)
    }

    /// Render as pretty-printed RON
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Parse a topology previously rendered with [`Topology::to_ron`]
    pub fn from_ron(s: &str) -> Result<Self> {
        ron::from_str(s).map_err(|e| Error::Serialization(e.to_string()))
    }
}
