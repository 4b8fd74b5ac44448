//! Configuration container and overlay operations.
//!
//! [`Configuration`] owns a tree built from a base mapping and mutates it
//! through three overlay strategies: structural mappings ([`Configuration::apply`]),
//! flat delimiter-joined keys ([`Configuration::apply_flat`]) and the public
//! fields of serializable objects ([`Configuration::apply_object`]). Reads go
//! through a mapping-style interface; there is no public write access to
//! individual keys.

use std::collections::HashMap;
use std::ops::Index;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::index::FlatIndex;
use crate::merge::{UnknownKeyPolicy, merge_into};
use crate::tree::{MapNode, Node};

/// Separator used by [`Configuration::apply_flat`] between path components
/// of a flat key.
pub const DEFAULT_SEPARATOR: &str = "_";

/// A configuration tree with overlay-based mutation.
///
/// The base mapping passed to [`Configuration::new`] fixes the schema: by
/// default an overlay may only touch keys the base already has. Mapping
/// nodes marked extensible through [`Configuration::builder`] accept new
/// keys beneath them.
///
/// ```
/// use conflayer::{Configuration, UnknownKeyPolicy};
/// use serde_json::json;
///
/// let mut config = Configuration::new(json!({
///     "host": "localhost",
///     "port": 8080
/// }))?;
/// config.apply(&json!({ "port": 9000 }), UnknownKeyPolicy::Strict)?;
/// assert_eq!(config["port"], json!(9000));
/// # Ok::<(), conflayer::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Configuration {
    root: MapNode,
    flat_index: Option<FlatIndex>,
}

impl Configuration {
    /// Create a configuration from a base mapping.
    ///
    /// Returns [`ConfigError::NotAMapping`] when `base` is not a JSON
    /// object.
    pub fn new(base: Value) -> ConfigResult<Self> {
        Ok(Self {
            root: root_from_value(base)?,
            flat_index: None,
        })
    }

    /// Start building a configuration with extensible mapping nodes.
    pub fn builder(base: Value) -> ConfigResult<ConfigurationBuilder> {
        Ok(ConfigurationBuilder {
            root: root_from_value(base)?,
        })
    }

    /// Merge a structural overlay into the tree.
    ///
    /// `overlay` must be a JSON object mirroring (part of) the tree's
    /// shape. Keys unknown to the base are errors under
    /// [`UnknownKeyPolicy::Strict`] and logged warnings under
    /// [`UnknownKeyPolicy::Lenient`], unless the containing node is
    /// extensible. On a strict failure, keys merged before the offending
    /// one stay merged.
    pub fn apply(&mut self, overlay: &Value, policy: UnknownKeyPolicy) -> ConfigResult<()> {
        let Value::Object(overlay) = overlay else {
            return Err(ConfigError::NotAMapping("overlay root".to_string()));
        };
        merge_into(&mut self.root, overlay, policy)
    }

    /// Merge a flat key-value overlay using [`DEFAULT_SEPARATOR`] and no
    /// prefix. See [`Configuration::apply_flat_with`].
    pub fn apply_flat(&mut self, overlay: &HashMap<String, Value>) {
        self.apply_flat_with(overlay, DEFAULT_SEPARATOR, "");
    }

    /// Merge a flat key-value overlay into the tree.
    ///
    /// Each leaf path in the tree is joined with `separator` and prepended
    /// with `prefix` to form its flat key. Overlay entries whose key exactly
    /// matches a leaf's flat key overwrite that leaf, all others are
    /// silently ignored. This makes the operation safe to point at an
    /// entire process environment, case-normalized by the caller:
    ///
    /// ```
    /// use std::collections::HashMap;
    ///
    /// use conflayer::Configuration;
    /// use serde_json::{Value, json};
    ///
    /// let mut config = Configuration::new(json!({
    ///     "logging": { "level": "info" }
    /// }))?;
    ///
    /// let environment: HashMap<String, Value> = std::env::vars()
    ///     .map(|(key, value)| (key.to_lowercase(), Value::String(value)))
    ///     .collect();
    /// config.apply_flat_with(&environment, "_", "app_");
    /// // Only APP_LOGGING_LEVEL can change anything.
    /// # Ok::<(), conflayer::ConfigError>(())
    /// ```
    ///
    /// The set of addressable leaves is indexed once, on the first flat or
    /// object overlay, and reused afterwards. Leaves introduced by later
    /// extensible structural overlays are not picked up by the index and
    /// stay invisible to this operation.
    pub fn apply_flat_with(
        &mut self,
        overlay: &HashMap<String, Value>,
        separator: &str,
        prefix: &str,
    ) {
        let index = ensured_index(&mut self.flat_index, &self.root);
        let mut writes: Vec<(Vec<String>, Value)> = Vec::new();
        for path in index.paths() {
            let flat_key = format!("{}{}", prefix, path.join(separator));
            if let Some(value) = overlay.get(&flat_key) {
                writes.push((path.to_vec(), value.clone()));
            }
        }

        for (path, value) in writes {
            write_leaf(&mut self.root, &path, value);
        }
    }

    /// Merge the public fields of a serializable object into the tree root.
    /// See [`Configuration::apply_object_at`].
    pub fn apply_object<S: Serialize>(&mut self, source: &S) -> ConfigResult<()> {
        self.apply_object_at(source, &[])
    }

    /// Merge the public fields of a serializable object into the subtree at
    /// `prefix`.
    ///
    /// `source` is serialized to a mapping; each of its entries whose key
    /// matches a leaf under `prefix` overwrites that leaf. Entries with a
    /// `null` value and entries matching no leaf are ignored, so parsed
    /// command-line arguments can be applied wholesale:
    ///
    /// ```
    /// use conflayer::Configuration;
    /// use serde::Serialize;
    /// use serde_json::json;
    ///
    /// #[derive(Serialize)]
    /// struct Args {
    ///     level: Option<String>,
    ///     unrelated_flag: bool,
    /// }
    ///
    /// let mut config = Configuration::new(json!({
    ///     "logging": { "level": "info" }
    /// }))?;
    /// let args = Args { level: Some("debug".to_string()), unrelated_flag: true };
    /// config.apply_object_at(&args, &["logging"])?;
    /// assert_eq!(config["logging"]["level"], json!("debug"));
    /// # Ok::<(), conflayer::ConfigError>(())
    /// ```
    ///
    /// Returns [`ConfigError::NotAMapping`] when `source` does not
    /// serialize to a mapping, and [`ConfigError::Serialize`] when
    /// serialization itself fails. Uses the same cached leaf index as
    /// [`Configuration::apply_flat`].
    pub fn apply_object_at<S: Serialize>(
        &mut self,
        source: &S,
        prefix: &[&str],
    ) -> ConfigResult<()> {
        let Value::Object(fields) = serde_json::to_value(source)? else {
            return Err(ConfigError::NotAMapping("object overlay source".to_string()));
        };

        let index = ensured_index(&mut self.flat_index, &self.root);
        let mut writes: Vec<(Vec<String>, Value)> = Vec::new();
        for (field, value) in &fields {
            if value.is_null() {
                continue;
            }
            let path: Vec<String> = prefix
                .iter()
                .map(|component| (*component).to_string())
                .chain(std::iter::once(field.clone()))
                .collect();
            if index.contains(&path) {
                writes.push((path, value.clone()));
            }
        }

        for (path, value) in writes {
            write_leaf(&mut self.root, &path, value);
        }
        Ok(())
    }

    /// Look up a top-level entry.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.root.get(key)
    }

    /// Look up a top-level entry, returning `fallback` when absent.
    pub fn get_or(&self, key: &str, fallback: Value) -> Value {
        self.root.get_or(key, fallback)
    }

    /// Whether `key` is a top-level entry.
    pub fn contains_key(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    /// Iterate the top-level keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.root.keys()
    }

    /// Iterate the top-level nodes in key order.
    pub fn values(&self) -> impl Iterator<Item = &Node> {
        self.root.values()
    }

    /// Iterate the top-level `(key, node)` entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.root.iter()
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.root.len()
    }

    /// Whether the configuration has no top-level entries.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Snapshot the current tree as a plain JSON object.
    pub fn to_value(&self) -> Value {
        self.root.to_value()
    }

    /// Deserialize the current tree into a typed configuration struct.
    pub fn extract<T: DeserializeOwned>(&self) -> ConfigResult<T> {
        Ok(serde_json::from_value(self.to_value())?)
    }
}

/// Key lookup on the tree root.
///
/// Panics on absent keys; [`Configuration::get`] is the non-panicking
/// equivalent.
impl Index<&str> for Configuration {
    type Output = Node;

    fn index(&self, key: &str) -> &Node {
        &self.root[key]
    }
}

/// Builder that marks mapping nodes extensible before the configuration is
/// first used.
///
/// ```
/// use conflayer::{Configuration, UnknownKeyPolicy};
/// use serde_json::json;
///
/// let mut config = Configuration::builder(json!({
///     "logging": { "handlers": {} }
/// }))?
/// .extensible(&["logging", "handlers"])?
/// .build();
///
/// config.apply(
///     &json!({ "logging": { "handlers": { "console": { "level": "info" } } } }),
///     UnknownKeyPolicy::Strict,
/// )?;
/// # Ok::<(), conflayer::ConfigError>(())
/// ```
#[derive(Debug)]
pub struct ConfigurationBuilder {
    root: MapNode,
}

impl ConfigurationBuilder {
    /// Mark the mapping node at `path` extensible. An empty path marks the
    /// root itself.
    ///
    /// Returns [`ConfigError::UnknownKey`] when a path component is absent
    /// and [`ConfigError::NotAMapping`] when the path lands on a leaf.
    pub fn extensible(mut self, path: &[&str]) -> ConfigResult<Self> {
        self.root.map_node_mut(path)?.set_extensible();
        Ok(self)
    }

    /// Finish building.
    pub fn build(self) -> Configuration {
        Configuration {
            root: self.root,
            flat_index: None,
        }
    }
}

fn root_from_value(base: Value) -> ConfigResult<MapNode> {
    match Node::from_value(base) {
        Node::Map(root) => Ok(root),
        Node::Leaf(_) => Err(ConfigError::NotAMapping("configuration base".to_string())),
    }
}

/// Hand out the cached flat index, building it on first use.
///
/// Free function over the two fields so the caller keeps `&mut` access to
/// the rest of the tree while holding the index borrow.
fn ensured_index<'a>(index: &'a mut Option<FlatIndex>, root: &MapNode) -> &'a FlatIndex {
    index.get_or_insert_with(|| FlatIndex::build(root))
}

/// Overwrite the leaf at `path` with `value`.
///
/// Indexed paths can go stale when a structural overlay replaces an
/// ancestor mapping with a scalar; such writes are skipped.
fn write_leaf(root: &mut MapNode, path: &[String], value: Value) {
    match root.slot_mut(path) {
        Some(slot) => *slot = Node::from_value(value),
        None => debug!("skipping write to stale configuration path {:?}", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_must_be_a_mapping() {
        let err = Configuration::new(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ConfigError::NotAMapping(what) if what == "configuration base"));
        let err = Configuration::builder(json!("scalar")).unwrap_err();
        assert!(matches!(err, ConfigError::NotAMapping(what) if what == "configuration base"));
    }

    #[test]
    fn test_overlay_must_be_a_mapping() {
        let mut config = Configuration::new(json!({ "key": 1 })).unwrap();
        let err = config
            .apply(&json!([1, 2]), UnknownKeyPolicy::Strict)
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotAMapping(what) if what == "overlay root"));
    }

    #[test]
    fn test_builder_validates_extensible_paths() {
        let builder = Configuration::builder(json!({ "a": { "b": 1 } })).unwrap();
        let err = builder.extensible(&["a", "missing"]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey(key) if key == "missing"));

        let builder = Configuration::builder(json!({ "a": { "b": 1 } })).unwrap();
        let err = builder.extensible(&["a", "b"]).unwrap_err();
        assert!(matches!(err, ConfigError::NotAMapping(key) if key == "b"));
    }

    #[test]
    fn test_extensible_root_accepts_any_top_level_key() {
        let mut config = Configuration::builder(json!({}))
            .unwrap()
            .extensible(&[])
            .unwrap()
            .build();
        config
            .apply(&json!({ "anything": 1 }), UnknownKeyPolicy::Strict)
            .unwrap();
        assert_eq!(config["anything"], json!(1));
    }

    #[test]
    fn test_object_source_must_serialize_to_a_mapping() {
        let mut config = Configuration::new(json!({ "key": 1 })).unwrap();
        let err = config.apply_object(&vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, ConfigError::NotAMapping(what) if what == "object overlay source"));
    }

    #[test]
    fn test_to_value_snapshots_current_state() {
        let mut config = Configuration::new(json!({ "count": 1 })).unwrap();
        let before = config.to_value();
        config
            .apply(&json!({ "count": 2 }), UnknownKeyPolicy::Strict)
            .unwrap();
        assert_eq!(before, json!({ "count": 1 }));
        assert_eq!(config.to_value(), json!({ "count": 2 }));
    }
}
