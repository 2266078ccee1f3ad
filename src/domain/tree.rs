//! Generic value tree: entities own ordered children, leaves hold values.
//!
//! A [`Node`] is explicitly tagged as either a leaf or a branch; nothing is
//! inferred from structure. Flattening walks the tree depth-first, pre-order,
//! and emits one entry per leaf keyed by its full [`TreePath`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::error::DomainError;
use crate::domain::value::Value;

/// Order in which children are visited while flattening or writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalOrder {
    /// Order in which child names were first assigned.
    #[default]
    Declaration,
    /// Children sorted by name at every level.
    Alphabetical,
}

/// Address of a node below the root, e.g. `wing.area`.
///
/// Parsing accepts `.` and `/` as separators; display always uses `.`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TreePath(Vec<String>);

impl TreePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Self(segments)
    }

    /// Last segment, `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Path with `/` separators, as used by optimization engines.
    pub fn to_slash_string(&self) -> String {
        self.0.join("/")
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for TreePath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<String> = s
            .split(|c| c == '.' || c == '/')
            .map(str::trim)
            .map(String::from)
            .collect();
        if s.trim().is_empty() || segments.iter().any(String::is_empty) {
            return Err(DomainError::InvalidInput(format!("invalid path: {:?}", s)));
        }
        Ok(Self(segments))
    }
}

impl<S: Into<String>> FromIterator<S> for TreePath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// A node is a leaf value or a nested entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf(Value),
    Entity(Entity),
}

impl Node {
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Leaf(v) => v.kind(),
            Node::Entity(_) => "branch",
        }
    }

    pub fn as_leaf(&self) -> Option<&Value> {
        match self {
            Node::Leaf(v) => Some(v),
            Node::Entity(_) => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Node::Entity(e) => Some(e),
            Node::Leaf(_) => None,
        }
    }
}

impl From<Value> for Node {
    fn from(v: Value) -> Self {
        Node::Leaf(v)
    }
}

impl From<Entity> for Node {
    fn from(e: Entity) -> Self {
        Node::Entity(e)
    }
}

/// Named branch owning an ordered list of children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entity {
    pub name: String,
    children: Vec<(String, Node)>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Assign a child. Re-assigning an existing name keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, node: impl Into<Node>) {
        let name = name.into();
        let node = node.into();
        match self.children.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = node,
            None => self.children.push((name, node)),
        }
    }

    pub fn with_leaf(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, Node::Leaf(value.into()));
        self
    }

    pub fn with_branch(mut self, entity: Entity) -> Self {
        let name = entity.name.clone();
        self.insert(name, Node::Entity(entity));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    /// Node at `path` below this entity; the empty path is not addressable.
    pub fn node_at(&self, path: &TreePath) -> Option<&Node> {
        let (first, rest) = path.segments().split_first()?;
        let mut node = self.get(first)?;
        for segment in rest {
            node = node.as_entity()?.get(segment)?;
        }
        Some(node)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Children in the requested traversal order.
    pub fn ordered_children(&self, order: TraversalOrder) -> Vec<(&str, &Node)> {
        let mut children: Vec<_> = self.children().collect();
        if order == TraversalOrder::Alphabetical {
            children.sort_by(|a, b| a.0.cmp(b.0));
        }
        children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Number of leaves in the whole subtree.
    pub fn leaf_count(&self) -> usize {
        self.children
            .iter()
            .map(|(_, c)| match c {
                Node::Leaf(_) => 1,
                Node::Entity(e) => e.leaf_count(),
            })
            .sum()
    }

    /// Project the subtree onto a path-keyed mapping, one entry per leaf.
    #[instrument(level = "trace", skip(self), fields(entity = %self.name))]
    pub fn flatten(&self, order: TraversalOrder) -> FlatMap {
        let mut flat = FlatMap::default();
        self.flatten_into(&TreePath::root(), order, &mut flat);
        flat
    }

    fn flatten_into(&self, prefix: &TreePath, order: TraversalOrder, flat: &mut FlatMap) {
        for (name, node) in self.ordered_children(order) {
            let path = prefix.child(name);
            match node {
                Node::Leaf(v) => flat.insert(path, v.clone()),
                Node::Entity(e) => e.flatten_into(&path, order, flat),
            }
        }
    }

    /// Rebuild a nested entity from a flat mapping, creating branches as needed.
    pub fn from_flat(name: impl Into<String>, flat: &FlatMap) -> Self {
        let mut root = Entity::new(name);
        for (path, value) in flat.iter() {
            root.insert_path(path.segments(), value.clone());
        }
        root
    }

    fn insert_path(&mut self, segments: &[String], value: Value) {
        match segments {
            [] => {}
            [leaf] => self.insert(leaf.clone(), Node::Leaf(value)),
            [branch, rest @ ..] => {
                if !matches!(self.get(branch), Some(Node::Entity(_))) {
                    self.insert(branch.clone(), Node::Entity(Entity::new(branch.clone())));
                }
                if let Some(Node::Entity(child)) = self.get_mut(branch) {
                    child.insert_path(rest, value);
                }
            }
        }
    }
}

/// Path-keyed projection of a tree, in traversal order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlatMap {
    entries: Vec<(TreePath, Value)>,
}

impl FlatMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; replacing keeps the original position.
    pub fn insert(&mut self, path: TreePath, value: Value) {
        match self.entries.iter_mut().find(|(p, _)| *p == path) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((path, value)),
        }
    }

    pub fn get(&self, path: &TreePath) -> Option<&Value> {
        self.entries.iter().find(|(p, _)| p == path).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &TreePath> {
        self.entries.iter().map(|(p, _)| p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TreePath, &Value)> {
        self.entries.iter().map(|(p, v)| (p, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Paths whose values differ between `self` and `other`, including paths
    /// present on one side only.
    pub fn diff(&self, other: &FlatMap) -> Vec<TreePath> {
        let mut changed: Vec<TreePath> = self
            .iter()
            .filter(|(p, v)| other.get(p) != Some(*v))
            .map(|(p, _)| p.clone())
            .collect();
        changed.extend(
            other
                .keys()
                .filter(|p| self.get(p).is_none())
                .cloned(),
        );
        changed
    }
}

impl FromIterator<(TreePath, Value)> for FlatMap {
    fn from_iter<I: IntoIterator<Item = (TreePath, Value)>>(iter: I) -> Self {
        let mut flat = FlatMap::new();
        for (p, v) in iter {
            flat.insert(p, v);
        }
        flat
    }
}

impl IntoIterator for FlatMap {
    type Item = (TreePath, Value);
    type IntoIter = std::vec::IntoIter<(TreePath, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Flatten `tree` in the given order.
pub fn flatten(tree: &Entity, order: TraversalOrder) -> FlatMap {
    tree.flatten(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Entity {
        Entity::new("Aircraft")
            .with_branch(
                Entity::new("wing")
                    .with_leaf("span", 34.1)
                    .with_leaf("area", 122.0),
            )
            .with_branch(
                Entity::new("engine")
                    .with_leaf("n_engine", 2_i64)
                    .with_leaf("rating_factor", Value::floats(&[1.0, 0.8])),
            )
    }

    #[test]
    fn given_tree_when_flattening_in_declaration_order_then_follows_insertion() {
        let keys: Vec<String> = sample()
            .flatten(TraversalOrder::Declaration)
            .keys()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            keys,
            vec!["wing.span", "wing.area", "engine.n_engine", "engine.rating_factor"]
        );
    }

    #[test]
    fn given_tree_when_flattening_alphabetically_then_keys_are_sorted() {
        let flat = sample().flatten(TraversalOrder::Alphabetical);
        let keys: Vec<TreePath> = flat.keys().cloned().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys[0].to_string(), "engine.n_engine");
    }

    #[test]
    fn given_tuple_leaf_when_flattening_then_stays_single_entry() {
        let flat = sample().flatten(TraversalOrder::Declaration);
        let path: TreePath = "engine.rating_factor".parse().unwrap();
        assert_eq!(flat.get(&path), Some(&Value::floats(&[1.0, 0.8])));
        assert_eq!(flat.len(), 4);
    }

    #[test]
    fn given_reassigned_child_when_inserting_then_position_is_kept() {
        let mut e = sample();
        e.insert("wing", Entity::new("wing").with_leaf("area", 1.0));
        let names: Vec<&str> = e.children().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["wing", "engine"]);
    }

    #[test]
    fn given_flat_map_when_rebuilding_entity_then_equals_original() {
        let original = sample();
        let rebuilt = Entity::from_flat("Aircraft", &original.flatten(TraversalOrder::Declaration));
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn given_slash_and_dot_paths_when_parsing_then_equal() {
        let a: TreePath = "wing/area".parse().unwrap();
        let b: TreePath = "wing.area".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_slash_string(), "wing/area");
        assert!("wing..area".parse::<TreePath>().is_err());
        assert!("".parse::<TreePath>().is_err());
    }
}
