use std::path::Path;

use serde_yaml::Value;

use crate::errors::PerceiverError;

/// Accessibility snapshot tree.
///
/// Mapping keys are `role "accessible name"` summaries or plain role
/// tokens, nesting encodes containment and lists hold siblings. Mapping
/// order follows the document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SnapshotNode {
    Map(Vec<(String, SnapshotNode)>),
    List(Vec<SnapshotNode>),
    Text(String),
    Empty,
}

impl SnapshotNode {
    /// Visits every mapping key and string leaf together with its top-level
    /// ancestor key and immediate parent key.
    pub fn walk<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&'a str, Option<&'a str>, Option<&'a str>),
    {
        walk_node(self, None, None, visit);
    }
}

fn walk_node<'a, F>(
    node: &'a SnapshotNode,
    root_parent: Option<&'a str>,
    current_parent: Option<&'a str>,
    visit: &mut F,
) where
    F: FnMut(&'a str, Option<&'a str>, Option<&'a str>),
{
    match node {
        SnapshotNode::Map(entries) => {
            for (key, value) in entries {
                let root = root_parent.or(Some(key.as_str()));
                visit(key.as_str(), root, current_parent);
                walk_node(value, root, Some(key.as_str()), visit);
            }
        }
        SnapshotNode::List(items) => {
            for item in items {
                walk_node(item, root_parent, current_parent, visit);
            }
        }
        SnapshotNode::Text(text) => visit(text.as_str(), root_parent, current_parent),
        SnapshotNode::Empty => {}
    }
}

impl From<Value> for SnapshotNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => SnapshotNode::Empty,
            Value::Bool(flag) => SnapshotNode::Text(flag.to_string()),
            Value::Number(number) => SnapshotNode::Text(number.to_string()),
            Value::String(text) => SnapshotNode::Text(text),
            Value::Sequence(items) => {
                SnapshotNode::List(items.into_iter().map(SnapshotNode::from).collect())
            }
            Value::Mapping(mapping) => SnapshotNode::Map(
                mapping
                    .into_iter()
                    .map(|(key, value)| (key_to_string(key), SnapshotNode::from(value)))
                    .collect(),
            ),
            Value::Tagged(tagged) => SnapshotNode::from(tagged.value),
        }
    }
}

fn key_to_string(key: Value) -> String {
    match key {
        Value::String(text) => text,
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(&other)
            .map(|raw| raw.trim().to_string())
            .unwrap_or_default(),
    }
}

pub fn parse_snapshot(raw: &str) -> Result<SnapshotNode, PerceiverError> {
    let value: Value =
        serde_yaml::from_str(raw).map_err(|err| PerceiverError::Parse(format!("{}", err)))?;
    Ok(SnapshotNode::from(value))
}

pub async fn load_snapshot(path: &Path) -> Result<SnapshotNode, PerceiverError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| PerceiverError::Io(format!("{}: {}", path.display(), err)))?;
    parse_snapshot(&raw)
}
