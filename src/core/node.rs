//! Declarative step tree

use crate::core::error::FlowError;
use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_yaml::Value;
use std::fmt;

/// A node of the flow tree
///
/// In YAML a string is a leaf, a list is a sequence and a list holding exactly
/// one list (`[[a, b]]`) is a loop over that inner list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepNode {
    /// A named step, resolved through the registry
    Leaf(String),
    /// Children run once, in order
    Sequence(Vec<StepNode>),
    /// Children run in order, repeatedly, until a break is requested
    Loop(Vec<StepNode>),
}

impl StepNode {
    pub fn leaf(name: impl Into<String>) -> Self {
        StepNode::Leaf(name.into())
    }

    pub fn sequence(children: Vec<StepNode>) -> Self {
        StepNode::Sequence(children)
    }

    pub fn looped(children: Vec<StepNode>) -> Self {
        StepNode::Loop(children)
    }

    /// Validate and convert a YAML value into a tree
    pub fn from_yaml(value: &Value) -> Result<Self, FlowError> {
        match value {
            Value::String(name) => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(FlowError::InvalidShape("empty step name".to_string()));
                }
                Ok(StepNode::Leaf(name.to_string()))
            }
            Value::Sequence(items) => {
                if let [Value::Sequence(body)] = items.as_slice() {
                    if body.is_empty() {
                        return Err(FlowError::InvalidShape("loop with an empty body".to_string()));
                    }
                    let children = body.iter().map(Self::from_yaml).collect::<Result<_, _>>()?;
                    return Ok(StepNode::Loop(children));
                }
                let children = items.iter().map(Self::from_yaml).collect::<Result<_, _>>()?;
                Ok(StepNode::Sequence(children))
            }
            Value::Tagged(tagged) => Self::from_yaml(&tagged.value),
            other => Err(FlowError::InvalidShape(format!(
                "expected a step name or a list, found {}",
                describe(other)
            ))),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, FlowError> {
        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| FlowError::InvalidShape(e.to_string()))?;
        Self::from_yaml(&value)
    }

    /// Names of every leaf, in declaration order
    pub fn leaf_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_leaves(&mut names);
        names
    }

    fn collect_leaves<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            StepNode::Leaf(name) => names.push(name),
            StepNode::Sequence(children) | StepNode::Loop(children) => {
                for child in children {
                    child.collect_leaves(names);
                }
            }
        }
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

struct Children<'a>(&'a [StepNode]);

impl Serialize for Children<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for child in self.0 {
            seq.serialize_element(child)?;
        }
        seq.end()
    }
}

impl Serialize for StepNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StepNode::Leaf(name) => serializer.serialize_str(name),
            StepNode::Sequence(children) => Children(children).serialize(serializer),
            StepNode::Loop(children) => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(&Children(children))?;
                seq.end()
            }
        }
    }
}

impl fmt::Display for StepNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_list(f: &mut fmt::Formatter<'_>, children: &[StepNode]) -> fmt::Result {
            write!(f, "[")?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", child)?;
            }
            write!(f, "]")
        }

        match self {
            StepNode::Leaf(name) => write!(f, "{}", name),
            StepNode::Sequence(children) => write_list(f, children),
            StepNode::Loop(children) => {
                write!(f, "[")?;
                write_list(f, children)?;
                write!(f, "]")
            }
        }
    }
}
