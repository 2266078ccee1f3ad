//! Terminal tree rendering of entities.

use termtree::Tree;
use tracing::instrument;

use crate::domain::aircraft::Aircraft;
use crate::domain::render::render;
use crate::domain::tree::{Entity, Node, TraversalOrder};

pub trait TreeNodeConvert {
    fn to_tree_string(&self, order: TraversalOrder) -> Tree<String>;
}

impl TreeNodeConvert for Entity {
    #[instrument(level = "trace", skip(self), fields(entity = %self.name))]
    fn to_tree_string(&self, order: TraversalOrder) -> Tree<String> {
        let leaves: Vec<_> = self
            .ordered_children(order)
            .into_iter()
            .map(|(name, node)| match node {
                Node::Leaf(v) => Tree::new(format!("{} = {}", name, render(v))),
                Node::Entity(e) => e.to_tree_string(order),
            })
            .collect();

        Tree::new(self.name.clone()).with_leaves(leaves)
    }
}

impl TreeNodeConvert for Aircraft {
    fn to_tree_string(&self, order: TraversalOrder) -> Tree<String> {
        self.to_tree().to_tree_string(order)
    }
}
