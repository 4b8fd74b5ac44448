//! Owned configuration tree.
//!
//! A tree is a nested mapping of string keys to nodes. Mapping nodes carry
//! an extensible flag deciding whether structural overlays may introduce new
//! keys beneath them; leaves hold any non-mapping JSON value. The public
//! surface is read-only: every accessor takes `&self` and the backing
//! storage is private, so the tree can only change through the overlay
//! operations on [`crate::Configuration`].

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::ops::Index;

use serde_json::{Map, Value};

use crate::error::{ConfigError, ConfigResult};

/// A single node in the configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A non-mapping value: string, number, boolean, null or array.
    Leaf(Value),
    /// A nested mapping.
    Map(MapNode),
}

impl Node {
    /// Convert a JSON value into a node. Objects become mapping nodes (not
    /// extensible), everything else becomes a leaf.
    pub(crate) fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Node::Map(MapNode::from_object(map)),
            other => Node::Leaf(other),
        }
    }

    /// Convert the node back into a plain JSON value.
    ///
    /// Extensible markers are schema metadata, not data, and do not survive
    /// the round trip.
    pub fn to_value(&self) -> Value {
        match self {
            Node::Leaf(value) => value.clone(),
            Node::Map(map) => map.to_value(),
        }
    }

    /// The leaf value, if this node is a leaf.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Node::Leaf(value) => Some(value),
            Node::Map(_) => None,
        }
    }

    /// The mapping, if this node is a mapping.
    pub fn as_map(&self) -> Option<&MapNode> {
        match self {
            Node::Leaf(_) => None,
            Node::Map(map) => Some(map),
        }
    }
}

/// Key lookup on a mapping node.
///
/// Panics on leaves and on absent keys; [`Node::as_map`] and
/// [`MapNode::get`] are the non-panicking equivalents.
impl Index<&str> for Node {
    type Output = Node;

    fn index(&self, key: &str) -> &Node {
        match self {
            Node::Map(map) => &map[key],
            Node::Leaf(value) => panic!("cannot index non-mapping value {} with key '{}'", value, key),
        }
    }
}

/// Element lookup on a leaf holding an array.
///
/// Delegates to [`serde_json::Value`] indexing; panics on mapping nodes.
impl Index<usize> for Node {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        match self {
            Node::Leaf(value) => &value[index],
            Node::Map(_) => panic!("cannot index a mapping with element index {}", index),
        }
    }
}

/// Compare a node against a plain JSON value, mapping nodes included.
impl PartialEq<Value> for Node {
    fn eq(&self, other: &Value) -> bool {
        match self {
            Node::Leaf(value) => value == other,
            Node::Map(map) => matches!(other, Value::Object(_)) && map.to_value() == *other,
        }
    }
}

/// A mapping node: ordered keys to child nodes, plus the extensible flag.
#[derive(Debug, Clone, PartialEq)]
pub struct MapNode {
    entries: BTreeMap<String, Node>,
    extensible: bool,
}

impl MapNode {
    pub(crate) fn from_object(map: Map<String, Value>) -> Self {
        let entries = map
            .into_iter()
            .map(|(key, value)| (key, Node::from_value(value)))
            .collect();
        Self {
            entries,
            extensible: false,
        }
    }

    /// Convert the mapping back into a [`Value::Object`].
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(key, node)| (key.clone(), node.to_value()))
                .collect(),
        )
    }

    /// Whether structural overlays may introduce new keys under this node.
    pub fn is_extensible(&self) -> bool {
        self.extensible
    }

    pub(crate) fn set_extensible(&mut self) {
        self.extensible = true;
    }

    /// Look up a direct child by key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    /// Look up a direct child by key, returning `fallback` when absent.
    pub fn get_or(&self, key: &str, fallback: Value) -> Value {
        self.entries.get(key).map(Node::to_value).unwrap_or(fallback)
    }

    /// Whether `key` is a direct child of this node.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate the direct child keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate the direct child nodes in key order.
    pub fn values(&self) -> impl Iterator<Item = &Node> {
        self.entries.values()
    }

    /// Iterate the direct `(key, node)` entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this node has no children.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entry(&mut self, key: String) -> btree_map::Entry<'_, String, Node> {
        self.entries.entry(key)
    }

    /// Descend to the node slot addressed by `path` and hand it out mutably.
    ///
    /// Returns `None` when a path component is absent or the chain passes
    /// through a leaf. The final slot is returned whatever it currently
    /// holds; overlays may legitimately replace a leaf with a mapping.
    pub(crate) fn slot_mut(&mut self, path: &[String]) -> Option<&mut Node> {
        match path {
            [] => None,
            [leaf] => self.entries.get_mut(leaf),
            [head, rest @ ..] => match self.entries.get_mut(head)? {
                Node::Map(child) => child.slot_mut(rest),
                Node::Leaf(_) => None,
            },
        }
    }

    /// Descend to the mapping node addressed by `path`. An empty path is
    /// this node itself.
    pub(crate) fn map_node_mut(&mut self, path: &[&str]) -> ConfigResult<&mut MapNode> {
        match path {
            [] => Ok(self),
            [head, rest @ ..] => match self.entries.get_mut(*head) {
                Some(Node::Map(child)) => child.map_node_mut(rest),
                Some(Node::Leaf(_)) => Err(ConfigError::NotAMapping((*head).to_string())),
                None => Err(ConfigError::UnknownKey((*head).to_string())),
            },
        }
    }
}

/// Key lookup, panicking on absent keys. [`MapNode::get`] is the
/// non-panicking equivalent.
impl Index<&str> for MapNode {
    type Output = Node;

    fn index(&self, key: &str) -> &Node {
        self.get(key)
            .unwrap_or_else(|| panic!("unknown configuration key: '{}'", key))
    }
}
