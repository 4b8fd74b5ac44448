//! Recursive structural merge of overlay mappings into the owned tree.
//!
//! Implements key-by-key merging where overlay values override base values.
//! Arrays are replaced entirely, not concatenated.

use std::collections::btree_map::Entry;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{ConfigError, ConfigResult};
use crate::tree::{MapNode, Node};

/// Policy for overlay keys that have no counterpart in the base tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeyPolicy {
    /// Reject the overlay with [`ConfigError::UnknownKey`]. Keys merged
    /// before the offending one stay merged; there is no rollback.
    #[default]
    Strict,
    /// Log a warning, skip the key and continue with the rest.
    Lenient,
}

/// Merge `overlay` into `base`, key by key.
///
/// - Keys present on both sides merge recursively when both values are
///   mappings and are replaced wholesale otherwise
/// - Keys absent from `base` are inserted when `base` is extensible and
///   handled per `policy` when it is not
///
/// `overlay` is never mutated; values are cloned into the tree.
pub(crate) fn merge_into(
    base: &mut MapNode,
    overlay: &Map<String, Value>,
    policy: UnknownKeyPolicy,
) -> ConfigResult<()> {
    for (key, value) in overlay {
        let extensible = base.is_extensible();
        match base.entry(key.clone()) {
            Entry::Occupied(mut slot) => match (slot.get_mut(), value) {
                (Node::Map(child), Value::Object(overlay_child)) => {
                    merge_into(child, overlay_child, policy)?;
                }
                (node, value) => *node = Node::from_value(value.clone()),
            },
            Entry::Vacant(slot) => {
                if extensible {
                    slot.insert(Node::from_value(value.clone()));
                } else if policy == UnknownKeyPolicy::Strict {
                    return Err(ConfigError::UnknownKey(key.clone()));
                } else {
                    warn!("ignoring unknown configuration key: '{}'", key);
                }
            }
        }
    }
    Ok(())
}
