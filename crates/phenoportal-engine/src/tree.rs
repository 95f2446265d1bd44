//! Taxonomy tree reconstruction
//!
//! A taxonomy is loaded once into an arena of nodes in depth-first pre-order
//! with a `code -> index` map built alongside. Counts are applied to nodes by
//! code, rolled up so every node counts itself plus its descendants, and the
//! arena is then rendered either as a nested tree or as a flat code map.

use indexmap::IndexMap;
use phenoportal_model::{AggregateRow, FlatTreeNode, NestedTreeNode, RawTreeNode, key_text};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Node {
    code: String,
    label: String,
    selectable: bool,
    count: u64,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Arena-backed taxonomy tree
#[derive(Debug, Clone, Default)]
pub struct TaxonomyTree {
    nodes: Vec<Node>,
    roots: Vec<usize>,
    index: HashMap<String, usize>,
}

impl TaxonomyTree {
    /// Build the arena; when a code occurs twice the first pre-order
    /// occurrence owns the index entry
    pub fn from_raw(roots: &[RawTreeNode]) -> Self {
        let mut tree = Self::default();
        for root in roots {
            let idx = tree.push(root, None);
            tree.roots.push(idx);
        }
        tree
    }

    fn push(&mut self, raw: &RawTreeNode, parent: Option<usize>) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node {
            code: raw.coding.clone(),
            label: raw.meaning.clone(),
            selectable: raw.selectable,
            count: 0,
            parent,
            children: Vec::with_capacity(raw.children.len()),
        });
        self.index.entry(raw.coding.clone()).or_insert(idx);
        for child in &raw.children {
            let child_idx = self.push(child, Some(idx));
            self.nodes[idx].children.push(child_idx);
        }
        idx
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add each row's count to the node with the row's code; returns the
    /// number of rows that matched no node
    pub fn apply_counts(&mut self, rows: &[AggregateRow]) -> usize {
        let mut unmatched = 0;
        for row in rows {
            let code = key_text(&row.key);
            match self.index.get(&*code) {
                Some(&idx) => self.nodes[idx].count += row.count,
                None => unmatched += 1,
            }
        }
        unmatched
    }

    /// Make every node count itself plus all its descendants
    pub fn roll_up(&mut self) {
        // Pre-order puts every child after its parent.
        for idx in (0..self.nodes.len()).rev() {
            let below: u64 = self.nodes[idx]
                .children
                .iter()
                .map(|&child| self.nodes[child].count)
                .sum();
            self.nodes[idx].count += below;
        }
    }

    pub fn count_of(&self, code: &str) -> Option<u64> {
        self.index.get(code).map(|&idx| self.nodes[idx].count)
    }

    pub fn render_nested(&self, total: u64) -> Vec<NestedTreeNode> {
        self.roots
            .iter()
            .map(|&idx| self.nested_node(idx, total))
            .collect()
    }

    fn nested_node(&self, idx: usize, total: u64) -> NestedTreeNode {
        let node = &self.nodes[idx];
        NestedTreeNode {
            code: node.code.clone(),
            label: node.label.clone(),
            count: node.count,
            total,
            selectable: node.selectable,
            children: node
                .children
                .iter()
                .map(|&child| self.nested_node(child, total))
                .collect(),
            parent_code: self.parent_code(node),
        }
    }

    /// Flat `code -> node` map in pre-order
    pub fn render_flat(&self, total: u64) -> IndexMap<String, FlatTreeNode> {
        let mut flat = IndexMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            flat.entry(node.code.clone()).or_insert_with(|| FlatTreeNode {
                code: node.code.clone(),
                label: node.label.clone(),
                count: node.count,
                total,
                selectable: node.selectable,
                children: node
                    .children
                    .iter()
                    .map(|&child| self.nodes[child].code.clone())
                    .collect(),
                parent_code: self.parent_code(node),
            });
        }
        flat
    }

    fn parent_code(&self, node: &Node) -> Option<String> {
        node.parent.map(|p| self.nodes[p].code.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn taxonomy() -> Vec<RawTreeNode> {
        vec![
            RawTreeNode::new("A", "Chapter A").unselectable().with_children(vec![
                RawTreeNode::new("A1", "Block A1").with_children(vec![
                    RawTreeNode::new("A1.1", "Leaf A1.1"),
                    RawTreeNode::new("A1.2", "Leaf A1.2"),
                ]),
                RawTreeNode::new("A2", "Block A2"),
            ]),
            RawTreeNode::new("B", "Chapter B"),
        ]
    }

    #[test]
    fn test_roll_up_sums_descendants() {
        let mut tree = TaxonomyTree::from_raw(&taxonomy());
        let unmatched = tree.apply_counts(&[
            AggregateRow::new("A1.1", 2),
            AggregateRow::new("A1.2", 3),
            AggregateRow::new("A2", 1),
            AggregateRow::new("Z9", 7),
        ]);
        tree.roll_up();

        assert_eq!(unmatched, 1);
        assert_eq!(tree.count_of("A1"), Some(5));
        assert_eq!(tree.count_of("A"), Some(6));
        assert_eq!(tree.count_of("B"), Some(0));
    }

    #[test]
    fn test_first_occurrence_owns_code() {
        let raw = vec![
            RawTreeNode::new("X", "First"),
            RawTreeNode::new("Y", "Parent").with_children(vec![RawTreeNode::new("X", "Second")]),
        ];
        let mut tree = TaxonomyTree::from_raw(&raw);
        tree.apply_counts(&[AggregateRow::new("X", 4)]);
        tree.roll_up();

        assert_eq!(tree.count_of("X"), Some(4));
        assert_eq!(tree.count_of("Y"), Some(0));
        assert_eq!(tree.render_flat(4)["X"].label, "First");
    }

    #[test]
    fn test_render_nested() {
        let mut tree = TaxonomyTree::from_raw(&taxonomy());
        tree.apply_counts(&[AggregateRow::new("A1.2", 3)]);
        tree.roll_up();

        let nested = tree.render_nested(3);
        assert_eq!(nested.len(), 2);
        assert!(!nested[0].selectable);
        assert_eq!(nested[0].parent_code, None);
        let block = &nested[0].children[0];
        assert_eq!(block.count, 3);
        assert_eq!(block.parent_code.as_deref(), Some("A"));
        assert_eq!(block.children[1].total, 3);
    }

    #[test]
    fn test_render_flat() {
        let tree = TaxonomyTree::from_raw(&taxonomy());
        let flat = tree.render_flat(0);
        let codes: Vec<&str> = flat.keys().map(String::as_str).collect();
        assert_eq!(codes, vec!["A", "A1", "A1.1", "A1.2", "A2", "B"]);
        assert_eq!(flat["A"].children, vec!["A1".to_string(), "A2".to_string()]);
        assert_eq!(flat["A1.2"].parent_code.as_deref(), Some("A1"));
    }
}
