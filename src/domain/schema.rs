//! Static schemas: typed branches that convert to and from the value tree.
//!
//! Every branch type declares its ordered field list at definition time via
//! [`data_branch!`](crate::data_branch). Leaf fields are plain Rust values
//! implementing [`TreeField`]; branch fields are other `data_branch!` types.
//! The generic [`Entity`] implements the same traits, so every operation
//! here works on typed and untyped trees alike.

use tracing::{debug, warn};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::tree::{Entity, FlatMap, Node, TraversalOrder, TreePath};
use crate::domain::value::Value;

/// A slot in a branch: either a leaf value or a nested branch.
pub trait TreeField {
    /// Snapshot of this field as a tree node.
    fn to_node(&self, name: &str) -> Node;

    /// Overwrite this field from `node`. `path` locates the field for errors.
    fn assign(&mut self, path: &TreePath, node: &Node, report: &mut Reconstruction) -> DomainResult<()>;

    fn as_branch(&self) -> Option<&dyn Branch> {
        None
    }

    fn as_branch_mut(&mut self) -> Option<&mut dyn Branch> {
        None
    }
}

/// A node with named, ordered children.
pub trait Branch {
    /// Child names in declaration order.
    fn child_names(&self) -> Vec<&str>;

    fn child(&self, name: &str) -> Option<&dyn TreeField>;

    fn child_mut(&mut self, name: &str) -> Option<&mut dyn TreeField>;

    fn to_entity(&self, name: &str) -> Entity {
        let mut entity = Entity::new(name);
        for child_name in self.child_names() {
            if let Some(field) = self.child(child_name) {
                entity.insert(child_name, field.to_node(child_name));
            }
        }
        entity
    }

    fn flatten(&self, order: TraversalOrder) -> FlatMap {
        self.to_entity("").flatten(order)
    }
}

/// Summary of a bulk reconstruction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconstruction {
    /// Number of leaves written.
    pub applied: usize,
    /// Paths with no matching location in the tree (skipped).
    pub missing: Vec<TreePath>,
}

impl Reconstruction {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    fn skip(&mut self, path: TreePath) {
        warn!("{}", DomainError::KeyNotFound(path.to_string()));
        self.missing.push(path);
    }
}

/// Locate the field at `path` for reading.
pub fn field_at<'a>(tree: &'a dyn Branch, path: &TreePath) -> Option<&'a dyn TreeField> {
    let (first, rest) = path.segments().split_first()?;
    let mut field = tree.child(first)?;
    for segment in rest {
        field = field.as_branch()?.child(segment)?;
    }
    Some(field)
}

/// Locate the field at `path` for writing.
pub fn field_at_mut<'a>(tree: &'a mut dyn Branch, path: &TreePath) -> Option<&'a mut dyn TreeField> {
    fn descend<'b>(tree: &'b mut dyn Branch, segments: &[String]) -> Option<&'b mut dyn TreeField> {
        let (first, rest) = segments.split_first()?;
        let field = tree.child_mut(first)?;
        if rest.is_empty() {
            Some(field)
        } else {
            descend(field.as_branch_mut()?, rest)
        }
    }
    descend(tree, path.segments())
}

/// Write every entry of `flat` into `tree`.
///
/// Unknown paths are logged as `KeyNotFound` warnings and skipped; all known
/// paths are still applied. A kind mismatch aborts with `SchemaMismatch`.
pub fn reconstruct(flat: &FlatMap, tree: &mut dyn Branch) -> DomainResult<Reconstruction> {
    let mut report = Reconstruction::default();
    for (path, value) in flat.iter() {
        match field_at_mut(tree, path) {
            Some(field) => {
                field.assign(path, &Node::Leaf(value.clone()), &mut report)?;
            }
            None => report.skip(path.clone()),
        }
    }
    debug!(
        applied = report.applied,
        missing = report.missing.len(),
        "reconstructed tree from flat mapping"
    );
    Ok(report)
}

/// Write a nested mapping into `tree`, recursing into matching branches.
pub fn apply_entity(source: &Entity, tree: &mut dyn Branch) -> DomainResult<Reconstruction> {
    let mut report = Reconstruction::default();
    assign_children(&TreePath::root(), source, tree, &mut report)?;
    Ok(report)
}

fn assign_children(
    prefix: &TreePath,
    source: &Entity,
    tree: &mut dyn Branch,
    report: &mut Reconstruction,
) -> DomainResult<()> {
    for (name, node) in source.children() {
        let path = prefix.child(name);
        match tree.child_mut(name) {
            Some(field) => field.assign(&path, node, report)?,
            None => report.skip(path),
        }
    }
    Ok(())
}

fn expect_leaf<'n>(path: &TreePath, node: &'n Node, expected: &str) -> DomainResult<&'n Value> {
    node.as_leaf()
        .ok_or_else(|| DomainError::mismatch(path.to_string(), expected, node.kind()))
}

// ============================================================
// Leaf field types
// ============================================================

impl TreeField for f64 {
    fn to_node(&self, _name: &str) -> Node {
        Node::Leaf(Value::Float(*self))
    }

    fn assign(&mut self, path: &TreePath, node: &Node, report: &mut Reconstruction) -> DomainResult<()> {
        let value = expect_leaf(path, node, "float")?;
        *self = value
            .as_f64()
            .ok_or_else(|| DomainError::mismatch(path.to_string(), "float", value.kind()))?;
        report.applied += 1;
        Ok(())
    }
}

impl TreeField for i64 {
    fn to_node(&self, _name: &str) -> Node {
        Node::Leaf(Value::Int(*self))
    }

    fn assign(&mut self, path: &TreePath, node: &Node, report: &mut Reconstruction) -> DomainResult<()> {
        let value = expect_leaf(path, node, "int")?;
        *self = value
            .as_i64()
            .ok_or_else(|| DomainError::mismatch(path.to_string(), "int", value.kind()))?;
        report.applied += 1;
        Ok(())
    }
}

impl TreeField for String {
    fn to_node(&self, _name: &str) -> Node {
        Node::Leaf(Value::Str(self.clone()))
    }

    fn assign(&mut self, path: &TreePath, node: &Node, report: &mut Reconstruction) -> DomainResult<()> {
        let value = expect_leaf(path, node, "string")?;
        *self = match value {
            Value::Str(s) => s.clone(),
            // bare numbers in a text file still name a string field
            Value::Int(_) | Value::Float(_) => value.to_string(),
            Value::Tuple(_) => {
                return Err(DomainError::mismatch(path.to_string(), "string", value.kind()))
            }
        };
        report.applied += 1;
        Ok(())
    }
}

impl<const N: usize> TreeField for [f64; N] {
    fn to_node(&self, _name: &str) -> Node {
        Node::Leaf(Value::floats(self))
    }

    fn assign(&mut self, path: &TreePath, node: &Node, report: &mut Reconstruction) -> DomainResult<()> {
        let expected = format!("tuple of {} floats", N);
        let value = expect_leaf(path, node, &expected)?;
        let items = match value {
            Value::Tuple(items) if items.len() == N => items,
            other => {
                return Err(DomainError::mismatch(
                    path.to_string(),
                    expected,
                    match other {
                        Value::Tuple(items) => format!("tuple of {}", items.len()),
                        v => v.kind().to_string(),
                    },
                ))
            }
        };
        let mut next = [0.0; N];
        for (slot, item) in next.iter_mut().zip(items) {
            *slot = item
                .as_f64()
                .ok_or_else(|| DomainError::mismatch(path.to_string(), "float", item.kind()))?;
        }
        *self = next;
        report.applied += 1;
        Ok(())
    }
}

// ============================================================
// Untyped trees
// ============================================================

impl TreeField for Node {
    fn to_node(&self, _name: &str) -> Node {
        self.clone()
    }

    fn assign(&mut self, path: &TreePath, node: &Node, report: &mut Reconstruction) -> DomainResult<()> {
        match (self, node) {
            (Node::Leaf(current), Node::Leaf(incoming)) => {
                *current = coerce(path, current, incoming)?;
                report.applied += 1;
                Ok(())
            }
            (Node::Entity(current), Node::Entity(incoming)) => {
                assign_children(path, incoming, current, report)
            }
            (current, incoming) => Err(DomainError::mismatch(
                path.to_string(),
                current.kind(),
                incoming.kind(),
            )),
        }
    }

    fn as_branch(&self) -> Option<&dyn Branch> {
        match self {
            Node::Entity(e) => Some(e),
            Node::Leaf(_) => None,
        }
    }

    fn as_branch_mut(&mut self) -> Option<&mut dyn Branch> {
        match self {
            Node::Entity(e) => Some(e),
            Node::Leaf(_) => None,
        }
    }
}

/// Accept `incoming` in place of `current` if the kinds agree.
fn coerce(path: &TreePath, current: &Value, incoming: &Value) -> DomainResult<Value> {
    match (current, incoming) {
        (Value::Float(_), Value::Int(i)) => Ok(Value::Float(*i as f64)),
        (Value::Tuple(a), Value::Tuple(b)) if a.len() == b.len() => Ok(incoming.clone()),
        (Value::Tuple(a), Value::Tuple(b)) => Err(DomainError::mismatch(
            path.to_string(),
            format!("tuple of {}", a.len()),
            format!("tuple of {}", b.len()),
        )),
        (a, b) if a.kind() == b.kind() => Ok(incoming.clone()),
        (a, b) => Err(DomainError::mismatch(path.to_string(), a.kind(), b.kind())),
    }
}

impl Branch for Entity {
    fn child_names(&self) -> Vec<&str> {
        self.children().map(|(n, _)| n).collect()
    }

    fn child(&self, name: &str) -> Option<&dyn TreeField> {
        self.get(name).map(|n| n as &dyn TreeField)
    }

    fn child_mut(&mut self, name: &str) -> Option<&mut dyn TreeField> {
        self.get_mut(name).map(|n| n as &mut dyn TreeField)
    }

    fn to_entity(&self, name: &str) -> Entity {
        let mut entity = self.clone();
        entity.name = name.to_string();
        entity
    }
}

/// Declare a typed branch with an ordered schema.
///
/// ```ignore
/// data_branch! {
///     /// Main wing
///     pub struct Wing {
///         /// Reference area (m2)
///         area: f64 = 122.0,
///         n_panels: i64 = 2,
///     }
/// }
/// ```
///
/// Generates the struct with public fields, a `Default` impl from the given
/// values, and the [`Branch`]/[`TreeField`] impls. Fields are visited in the
/// order written.
#[macro_export]
macro_rules! data_branch {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $field:ident : $ty:ty = $default:expr
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                pub $field: $ty,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $( $field: $default, )*
                }
            }
        }

        impl $crate::domain::schema::Branch for $name {
            fn child_names(&self) -> Vec<&str> {
                vec![$( stringify!($field) ),*]
            }

            fn child(&self, name: &str) -> Option<&dyn $crate::domain::schema::TreeField> {
                match name {
                    $( stringify!($field) => Some(&self.$field), )*
                    _ => None,
                }
            }

            fn child_mut(&mut self, name: &str) -> Option<&mut dyn $crate::domain::schema::TreeField> {
                match name {
                    $( stringify!($field) => Some(&mut self.$field), )*
                    _ => None,
                }
            }
        }

        impl $crate::domain::schema::TreeField for $name {
            fn to_node(&self, name: &str) -> $crate::domain::tree::Node {
                $crate::domain::tree::Node::Entity(
                    $crate::domain::schema::Branch::to_entity(self, name),
                )
            }

            fn assign(
                &mut self,
                path: &$crate::domain::tree::TreePath,
                node: &$crate::domain::tree::Node,
                report: &mut $crate::domain::schema::Reconstruction,
            ) -> $crate::domain::error::DomainResult<()> {
                $crate::domain::schema::assign_branch(self, path, node, report)
            }

            fn as_branch(&self) -> Option<&dyn $crate::domain::schema::Branch> {
                Some(self)
            }

            fn as_branch_mut(&mut self) -> Option<&mut dyn $crate::domain::schema::Branch> {
                Some(self)
            }
        }
    };
}

/// [`TreeField::assign`] for typed branches: only an entity can replace a branch.
#[doc(hidden)]
pub fn assign_branch(
    branch: &mut dyn Branch,
    path: &TreePath,
    node: &Node,
    report: &mut Reconstruction,
) -> DomainResult<()> {
    match node {
        Node::Entity(source) => assign_children(path, source, branch, report),
        Node::Leaf(v) => Err(DomainError::mismatch(path.to_string(), "branch", v.kind())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::data_branch! {
        struct Panel {
            area: f64 = 10.0,
            count: i64 = 2,
        }
    }

    crate::data_branch! {
        struct Frame {
            label: String = "demo".to_string(),
            panel: Panel = Panel::default(),
            factors: [f64; 2] = [1.0, 0.5],
        }
    }

    fn path(s: &str) -> TreePath {
        s.parse().unwrap()
    }

    #[test]
    fn given_typed_branch_when_flattening_then_uses_declared_order() {
        let keys: Vec<String> = Frame::default()
            .flatten(TraversalOrder::Declaration)
            .keys()
            .map(ToString::to_string)
            .collect();
        assert_eq!(keys, vec!["label", "panel.area", "panel.count", "factors"]);
    }

    #[test]
    fn given_flat_map_when_reconstructing_then_round_trips() {
        let mut source = Frame::default();
        source.panel.area = 42.5;
        source.factors = [0.25, 0.75];
        for order in [TraversalOrder::Declaration, TraversalOrder::Alphabetical] {
            let mut target = Frame::default();
            let report = reconstruct(&source.flatten(order), &mut target).unwrap();
            assert_eq!(target, source);
            assert_eq!(report.applied, 4);
            assert!(report.is_complete());
        }
    }

    #[test]
    fn given_unknown_key_when_reconstructing_then_skips_and_applies_rest() {
        let flat: FlatMap = [
            (path("panel.area"), Value::Float(3.0)),
            (path("panel.missing"), Value::Float(1.0)),
        ]
        .into_iter()
        .collect();
        let mut target = Frame::default();
        let report = reconstruct(&flat, &mut target).unwrap();
        assert_eq!(target.panel.area, 3.0);
        assert_eq!(report.missing, vec![path("panel.missing")]);
    }

    #[test]
    fn given_wrong_kind_when_reconstructing_then_schema_mismatch() {
        let flat: FlatMap = [(path("panel.count"), Value::Str("two".into()))]
            .into_iter()
            .collect();
        let err = reconstruct(&flat, &mut Frame::default()).unwrap_err();
        assert!(matches!(err, DomainError::SchemaMismatch { .. }));

        let flat: FlatMap = [(path("panel"), Value::Float(1.0))].into_iter().collect();
        let err = reconstruct(&flat, &mut Frame::default()).unwrap_err();
        assert!(matches!(err, DomainError::SchemaMismatch { .. }));
    }

    #[test]
    fn given_integer_for_float_leaf_when_reconstructing_then_widens() {
        let flat: FlatMap = [(path("panel.area"), Value::Int(12))].into_iter().collect();
        let mut target = Frame::default();
        reconstruct(&flat, &mut target).unwrap();
        assert_eq!(target.panel.area, 12.0);
    }

    #[test]
    fn given_nested_entity_when_applying_then_recurses_into_branches() {
        let source = Entity::new("Frame")
            .with_branch(Entity::new("panel").with_leaf("count", 5_i64))
            .with_leaf("label", "patched");
        let mut target = Frame::default();
        let report = apply_entity(&source, &mut target).unwrap();
        assert_eq!(target.panel.count, 5);
        assert_eq!(target.label, "patched");
        assert_eq!(report.applied, 2);
    }

    #[test]
    fn given_untyped_entity_when_reconstructing_then_behaves_like_typed() {
        let typed = Frame::default();
        let mut untyped = typed.to_entity("Frame");
        let flat: FlatMap = [(path("panel.area"), Value::Float(1.5))].into_iter().collect();
        reconstruct(&flat, &mut untyped).unwrap();
        assert_eq!(
            untyped.node_at(&path("panel.area")),
            Some(&Node::Leaf(Value::Float(1.5)))
        );
    }
}
