//! Result shapes for the three operations.
//!
//! Every operation result is either *simple* (one instance's state, emitted
//! directly) or *full* (the instance's name, type and metadata wrapped
//! around a `result` that is itself a simple result or an array of further
//! full results, as produced by group and adapter resources).

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Operation a result document answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Read current state
    Get,
    /// Apply desired state
    Set,
    /// Compare desired and current state
    Test,
}

impl OperationKind {
    /// Lowercase identifier, as used on the provider command line.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A simple result shape decodable from JSON.
pub trait SimpleShape: DeserializeOwned + Serialize {
    /// Operation this shape belongs to.
    const OPERATION: OperationKind;
}

/// Simple result of a get.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSimpleResult {
    /// Current state of the instance
    pub actual_state: Value,
}

impl SimpleShape for GetSimpleResult {
    const OPERATION: OperationKind = OperationKind::Get;
}

/// Simple result of a set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSimpleResult {
    /// State before the change
    pub before_state: Value,
    /// State after the change
    pub after_state: Value,
    /// Properties the set changed
    pub changed_properties: Vec<String>,
}

impl SimpleShape for SetSimpleResult {
    const OPERATION: OperationKind = OperationKind::Set;
}

/// Simple result of a test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSimpleResult {
    /// State that was asked for
    pub desired_state: Value,
    /// State that was found
    pub actual_state: Value,
    /// Whether the instance is in the desired state
    pub in_desired_state: bool,
    /// Properties whose actual value differs from the desired one
    pub differing_properties: Vec<String>,
}

impl SimpleShape for TestSimpleResult {
    const OPERATION: OperationKind = OperationKind::Test;
}

/// A full result record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullResult<S> {
    /// Provider metadata, if emitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Instance name
    pub name: String,
    /// Resource type
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Leaf or nested members
    pub result: FullPayload<S>,
}

/// Payload of a full result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FullPayload<S> {
    /// A single simple result
    Leaf(S),
    /// Results of the members of a group
    Group(Vec<FullResult<S>>),
}

/// A parsed result document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultDocument<S> {
    /// Root had no `name`
    Simple(S),
    /// Root had a `name`
    Full(FullResult<S>),
}

/// Parsed result of a get.
pub type GetResult = ResultDocument<GetSimpleResult>;
/// Parsed result of a set.
pub type SetResult = ResultDocument<SetSimpleResult>;
/// Parsed result of a test.
pub type TestResult = ResultDocument<TestSimpleResult>;

impl<S> FullResult<S> {
    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a S>) {
        match &self.result {
            FullPayload::Leaf(leaf) => out.push(leaf),
            FullPayload::Group(members) => {
                for member in members {
                    member.collect_leaves(out);
                }
            }
        }
    }
}

impl<S: SimpleShape> ResultDocument<S> {
    /// Every simple result in the document, depth first.
    pub fn leaves(&self) -> Vec<&S> {
        match self {
            Self::Simple(simple) => vec![simple],
            Self::Full(full) => {
                let mut out = Vec::new();
                full.collect_leaves(&mut out);
                out
            }
        }
    }

    /// Whether this is a full result.
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }

    /// Instance name of a full result.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Simple(_) => None,
            Self::Full(full) => Some(&full.name),
        }
    }

    /// Resource type of a full result.
    pub fn resource_type(&self) -> Option<&str> {
        match self {
            Self::Simple(_) => None,
            Self::Full(full) => Some(&full.resource_type),
        }
    }

    /// The single leaf of a non-group document.
    ///
    /// Groups are not flattened for get and set.
    pub fn single(&self) -> Result<&S> {
        match self {
            Self::Simple(simple) => Ok(simple),
            Self::Full(FullResult {
                result: FullPayload::Leaf(leaf),
                ..
            }) => Ok(leaf),
            Self::Full(full) => Err(Error::UnsupportedGroupAggregation {
                operation: S::OPERATION,
                name: full.name.clone(),
                resource_type: full.resource_type.clone(),
            }),
        }
    }
}

impl GetResult {
    /// Current state of the instance.
    pub fn actual_state(&self) -> Result<&Value> {
        self.single().map(|leaf| &leaf.actual_state)
    }
}

impl SetResult {
    /// State before the change.
    pub fn before_state(&self) -> Result<&Value> {
        self.single().map(|leaf| &leaf.before_state)
    }

    /// State after the change.
    pub fn after_state(&self) -> Result<&Value> {
        self.single().map(|leaf| &leaf.after_state)
    }

    /// Properties the set changed.
    pub fn changed_properties(&self) -> Result<&[String]> {
        self.single().map(|leaf| leaf.changed_properties.as_slice())
    }
}

impl TestResult {
    /// Whether every leaf is in the desired state.
    pub fn in_desired_state(&self) -> bool {
        self.leaves().iter().all(|leaf| leaf.in_desired_state)
    }

    /// Union of the differing properties of every leaf, in first-seen order.
    pub fn differing_properties(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for leaf in self.leaves() {
            for property in &leaf.differing_properties {
                if !out.contains(property) {
                    out.push(property.clone());
                }
            }
        }
        out
    }
}

/// A parsed result of any operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OperationResult {
    /// Result of a get
    Get(GetResult),
    /// Result of a set
    Set(SetResult),
    /// Result of a test
    Test(TestResult),
}

impl OperationResult {
    /// Operation this result answers.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Get(_) => OperationKind::Get,
            Self::Set(_) => OperationKind::Set,
            Self::Test(_) => OperationKind::Test,
        }
    }
}
