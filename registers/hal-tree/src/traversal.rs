// Licensed under the Apache-2.0 license

//! Presence-filtered, array-unrolling, bus-skipping tree traversal.
//!
//! A [`NodeRef`] is a view of one arena node together with the state a visit
//! derives for it: the concrete array index when the node was reached through
//! unrolling, and the bus offset folded into it when one or more bus addrmaps
//! above it were skipped. That state is handed down explicitly by each
//! traversal call and is never written back into the tree, so every traversal
//! can be restarted and run any number of times.
//!
//! All iterators are lazy; nothing below a node is visited until the caller
//! pulls from the iterator.

use crate::error::{HalError, HalResult};
use crate::types::{AllNode, HalNode, HalTree, NodeIdx, NodeKind};

/// Traversal options.
///
/// Defaults match the common case: arrays are not unrolled, absent nodes are
/// skipped, buses are kept, and descendants come in pre-order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Traversal {
    /// Expand array nodes into one node per index tuple.
    pub unroll: bool,
    /// Skip nodes whose `ispresent` property is false.
    pub skip_absent: bool,
    /// Replace bus addrmaps by their children, folding the bus offset into them.
    pub skip_buses: bool,
    /// Yield descendants after their own subtree instead of before.
    pub post_order: bool,
}

impl Default for Traversal {
    fn default() -> Self {
        Self {
            unroll: false,
            skip_absent: true,
            skip_buses: false,
            post_order: false,
        }
    }
}

impl Traversal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unroll(mut self, unroll: bool) -> Self {
        self.unroll = unroll;
        self
    }

    pub fn skip_absent(mut self, skip: bool) -> Self {
        self.skip_absent = skip;
        self
    }

    pub fn skip_buses(mut self, skip: bool) -> Self {
        self.skip_buses = skip;
        self
    }

    pub fn post_order(mut self, post_order: bool) -> Self {
        self.post_order = post_order;
        self
    }
}

/// Iterates over all index tuples of an array, last dimension fastest.
#[derive(Clone, Debug)]
pub struct IndexIter {
    dimensions: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl IndexIter {
    pub fn new(dimensions: &[usize]) -> Self {
        let next = if dimensions.iter().any(|d| *d == 0) {
            None
        } else {
            Some(vec![0; dimensions.len()])
        };
        Self {
            dimensions: dimensions.to_vec(),
            next,
        }
    }
}

impl Iterator for IndexIter {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;
        let mut following = current.clone();
        for dim in (0..following.len()).rev() {
            following[dim] += 1;
            if following[dim] < self.dimensions[dim] {
                self.next = Some(following);
                break;
            }
            following[dim] = 0;
        }
        Some(current)
    }
}

/// Row-major flat position of `index` within `dimensions`.
pub fn flat_index(dimensions: &[usize], index: &[usize]) -> usize {
    dimensions
        .iter()
        .zip(index)
        .fold(0, |flat, (dim, idx)| flat * dim + idx)
}

/// Lazy sequence of node visits.
pub type Nodes<'t> = Box<dyn Iterator<Item = NodeRef<'t>> + 't>;

/// One visit of a tree node.
#[derive(Clone)]
pub struct NodeRef<'t> {
    tree: &'t HalTree,
    idx: NodeIdx,
    current_index: Option<Vec<usize>>,
    bus_offset: u64,
    /// Parent in the hierarchy this visit came from: the arena parent, or the
    /// nearest kept ancestor when buses in between were folded.
    emitted_parent: Option<NodeIdx>,
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree)
            && self.idx == other.idx
            && self.current_index == other.current_index
            && self.bus_offset == other.bus_offset
            && self.emitted_parent == other.emitted_parent
    }
}

impl Eq for NodeRef<'_> {}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "NodeRef {{ path: {}, kind: {}, bus_offset: {:#x} }}",
            self.path(),
            self.kind(),
            self.bus_offset
        )
    }
}

impl<'t> NodeRef<'t> {
    /// View of an arena node, as an unresolved node without bus offset whose
    /// emitted parent is its arena parent.
    pub fn new(tree: &'t HalTree, idx: NodeIdx) -> Self {
        Self {
            tree,
            idx,
            current_index: None,
            bus_offset: 0,
            emitted_parent: tree.node(idx).parent,
        }
    }

    /// View of the tree's top node.
    pub fn top(tree: &'t HalTree) -> Self {
        Self::new(tree, tree.top())
    }

    pub fn tree(&self) -> &'t HalTree {
        self.tree
    }

    pub fn idx(&self) -> NodeIdx {
        self.idx
    }

    pub fn node(&self) -> &'t HalNode {
        self.tree.node(self.idx)
    }

    pub fn kind(&self) -> NodeKind {
        self.node().kind()
    }

    pub fn inst_name(&self) -> &'t str {
        &self.node().inst_name
    }

    pub fn orig_type_name(&self) -> &'t str {
        &self.node().orig_type_name
    }

    pub fn type_name(&self) -> &'t str {
        &self.node().type_name
    }

    pub fn array_dimensions(&self) -> &'t [usize] {
        &self.node().array_dimensions
    }

    pub fn is_array(&self) -> bool {
        self.node().is_array()
    }

    /// Index tuple of this instance, if it was reached through unrolling.
    pub fn current_index(&self) -> Option<&[usize]> {
        self.current_index.as_deref()
    }

    /// An array node that was not unrolled has no single address.
    pub fn is_resolved(&self) -> bool {
        !self.is_array() || self.current_index.is_some()
    }

    pub fn bus_offset(&self) -> u64 {
        self.bus_offset
    }

    pub fn is_present(&self) -> bool {
        self.node().present
    }

    pub fn desc(&self) -> Option<&'t str> {
        self.node().desc.as_deref()
    }

    /// The node's parent in the elaborated hierarchy, unresolved.
    pub fn parent(&self) -> Option<NodeRef<'t>> {
        self.node().parent.map(|p| NodeRef::new(self.tree, p))
    }

    /// Hierarchical path, with this instance's index appended when unrolled.
    pub fn path(&self) -> String {
        let mut path = self.tree.path(self.idx);
        if let Some(index) = &self.current_index {
            for i in index {
                path += &format!("[{i}]");
            }
        }
        path
    }

    /// Register width in bits: one past the highest bit of any present field.
    ///
    /// Fields report their own width.
    pub fn width(&self) -> HalResult<usize> {
        match &self.node().body {
            AllNode::Field(field) => Ok(field.msb + 1 - field.lsb),
            AllNode::Reg(_) => self
                .children_of_type(NodeKind::Field, Traversal::new())
                .filter_map(|f| f.node().body.as_field().map(|f| f.msb))
                .max()
                .map(|high| high + 1)
                .ok_or_else(|| HalError::EmptyRegister { path: self.path() }),
            _ => Ok(0),
        }
    }

    /// Expand this node into its array instances.
    ///
    /// A resolved node (not an array, or already an instance) yields itself.
    pub fn unrolled(&self) -> Nodes<'t> {
        if self.is_resolved() {
            return Box::new(std::iter::once(self.clone()));
        }
        let (tree, idx, bus_offset) = (self.tree, self.idx, self.bus_offset);
        let emitted_parent = self.emitted_parent;
        Box::new(
            IndexIter::new(self.array_dimensions()).map(move |index| NodeRef {
                tree,
                idx,
                current_index: Some(index),
                bus_offset,
                emitted_parent,
            }),
        )
    }

    /// Direct children in elaboration order. `skip_buses` is not applied here,
    /// see [`NodeRef::children_of_type`].
    pub fn children(&self, opts: Traversal) -> Nodes<'t> {
        child_refs(self.tree, self.idx, opts, 0, self.idx)
    }

    /// Direct children of one kind.
    ///
    /// With `skip_buses`, a bus child is never yielded. Its own children are
    /// searched instead, with the bus's address folded into their bus offset.
    pub fn children_of_type(&self, kind: NodeKind, opts: Traversal) -> Nodes<'t> {
        children_of_type_from(self.tree, self.idx, kind, opts, 0, self.idx)
    }

    /// All descendants, pre-order unless `post_order` is set.
    pub fn descendants(&self, opts: Traversal) -> Nodes<'t> {
        descendants_from(self.tree, self.idx, None, opts, 0, self.idx)
    }

    /// All descendants of one kind. The whole subtree is searched, including
    /// below nodes of other kinds.
    pub fn descendants_of_type(&self, kind: NodeKind, opts: Traversal) -> Nodes<'t> {
        descendants_from(self.tree, self.idx, Some(kind), opts, 0, self.idx)
    }

    /// Bus offset to hand to the children of this node when it is skipped.
    ///
    /// Only concrete bus instances are folded: an array bus that was not
    /// unrolled has no single address and stays in the result.
    pub(crate) fn folded_offset(&self, opts: Traversal) -> Option<u64> {
        if opts.skip_buses && self.is_bus() {
            self.resolved_offset()
        } else {
            None
        }
    }

    pub(crate) fn emitted_parent_idx(&self) -> Option<NodeIdx> {
        self.emitted_parent
    }
}

/// Visits of the direct children of `idx`, each carrying `bus_offset` and
/// `parent` as their emitted parent.
fn child_refs<'t>(
    tree: &'t HalTree,
    idx: NodeIdx,
    opts: Traversal,
    bus_offset: u64,
    parent: NodeIdx,
) -> Nodes<'t> {
    Box::new(
        tree.node(idx)
            .children
            .iter()
            .copied()
            .filter(move |c| !opts.skip_absent || tree.node(*c).present)
            .flat_map(move |c| -> Nodes<'t> {
                let child = NodeRef {
                    tree,
                    idx: c,
                    current_index: None,
                    bus_offset,
                    emitted_parent: Some(parent),
                };
                if opts.unroll {
                    child.unrolled()
                } else {
                    Box::new(std::iter::once(child))
                }
            }),
    )
}

fn children_of_type_from<'t>(
    tree: &'t HalTree,
    idx: NodeIdx,
    kind: NodeKind,
    opts: Traversal,
    bus_offset: u64,
    parent: NodeIdx,
) -> Nodes<'t> {
    Box::new(
        child_refs(tree, idx, opts, bus_offset, parent).flat_map(move |child| -> Nodes<'t> {
            if let Some(folded) = child.folded_offset(opts) {
                children_of_type_from(tree, child.idx, kind, opts, folded, parent)
            } else if child.kind() == kind {
                Box::new(std::iter::once(child))
            } else {
                Box::new(std::iter::empty())
            }
        }),
    )
}

fn descendants_from<'t>(
    tree: &'t HalTree,
    idx: NodeIdx,
    kind: Option<NodeKind>,
    opts: Traversal,
    bus_offset: u64,
    parent: NodeIdx,
) -> Nodes<'t> {
    Box::new(
        child_refs(tree, idx, opts, bus_offset, parent).flat_map(move |child| -> Nodes<'t> {
            let folded = child.folded_offset(opts);
            let below = match folded {
                Some(offset) => descendants_from(tree, child.idx, kind, opts, offset, parent),
                None => descendants_from(tree, child.idx, kind, opts, 0, child.idx),
            };
            let yielded = match folded {
                Some(_) => None,
                None if kind.map_or(true, |k| k == child.kind()) => Some(child),
                None => None,
            };
            if opts.post_order {
                Box::new(below.chain(yielded))
            } else {
                Box::new(yielded.into_iter().chain(below))
            }
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elaborated::ElabNode;

    fn names(nodes: Nodes<'_>) -> Vec<String> {
        nodes.map(|n| n.path()).collect()
    }

    fn tree() -> HalTree {
        HalTree::build(&ElabNode::addrmap("top", 0).with_children(vec![
            ElabNode::reg("a", 0x0).with_children(vec![
                ElabNode::field("lo", 0, 3).sw(true, true),
                ElabNode::field("hi", 4, 7).sw(true, true),
            ]),
            ElabNode::reg("b", 0x4)
                .present(false)
                .with_children(vec![ElabNode::field("x", 0, 0).sw(true, false)]),
            ElabNode::regfile("rf", 0x10).array(&[2], 0x8).with_children(vec![
                ElabNode::reg("c", 0x0)
                    .with_children(vec![ElabNode::field("y", 0, 0).sw(true, false)]),
            ]),
        ]))
        .unwrap()
    }

    #[test]
    fn test_index_iter_row_major() {
        let all: Vec<_> = IndexIter::new(&[2, 3]).collect();
        assert_eq!(
            all,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2]
            ]
        );
        assert_eq!(IndexIter::new(&[4]).count(), 4);
        assert_eq!(IndexIter::new(&[2, 0]).count(), 0);
        assert_eq!(flat_index(&[2, 3], &[1, 2]), 5);
        assert_eq!(flat_index(&[2, 3], &[0, 1]), 1);
    }

    #[test]
    fn test_children_skip_absent() {
        let tree = tree();
        let top = NodeRef::top(&tree);
        assert_eq!(names(top.children(Traversal::new())), ["top.a", "top.rf"]);
        assert_eq!(
            names(top.children(Traversal::new().skip_absent(false))),
            ["top.a", "top.b", "top.rf"]
        );
    }

    #[test]
    fn test_children_unroll() {
        let tree = tree();
        let top = NodeRef::top(&tree);
        assert_eq!(
            names(top.children(Traversal::new().unroll(true))),
            ["top.a", "top.rf[0]", "top.rf[1]"]
        );
    }

    #[test]
    fn test_descendants_order() {
        let tree = tree();
        let top = NodeRef::top(&tree);
        assert_eq!(
            names(top.descendants(Traversal::new())),
            ["top.a", "top.a.lo", "top.a.hi", "top.rf", "top.rf.c", "top.rf.c.y"]
        );
        assert_eq!(
            names(top.descendants(Traversal::new().post_order(true))),
            ["top.a.lo", "top.a.hi", "top.a", "top.rf.c.y", "top.rf.c", "top.rf"]
        );
    }

    #[test]
    fn test_descendants_of_type_searches_whole_subtree() {
        let tree = tree();
        let top = NodeRef::top(&tree);
        let regs: Vec<_> = top
            .descendants_of_type(NodeKind::Reg, Traversal::new().unroll(true))
            .map(|r| (r.inst_name(), r.parent().map(|p| p.inst_name())))
            .collect();
        assert_eq!(
            regs,
            vec![("a", Some("top")), ("c", Some("rf")), ("c", Some("rf"))]
        );
    }

    #[test]
    fn test_traversal_is_restartable() {
        let tree = tree();
        let top = NodeRef::top(&tree);
        let opts = Traversal::new().unroll(true);
        let first: Vec<_> = top.descendants(opts).collect();
        let second: Vec<_> = top.descendants(opts).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_register_width() {
        let tree = HalTree::build(&ElabNode::addrmap("top", 0).with_children(vec![
            ElabNode::reg("r", 0).with_children(vec![
                ElabNode::field("a", 0, 3).sw(true, true),
                ElabNode::field("b", 4, 7).sw(true, true),
                ElabNode::field("c", 8, 15).sw(true, true),
            ]),
            ElabNode::reg("empty", 4),
            ElabNode::reg("ghost", 8)
                .with_children(vec![ElabNode::field("g", 0, 31).sw(true, true).present(false)]),
        ]))
        .unwrap();
        let reg = |name: &str| NodeRef::new(&tree, tree.find(name).unwrap());
        assert_eq!(reg("top.r").width().unwrap(), 16);
        assert_eq!(reg("top.r.c").width().unwrap(), 8);
        assert_eq!(
            reg("top.empty").width(),
            Err(HalError::EmptyRegister {
                path: "top.empty".to_string()
            })
        );
        assert!(reg("top.ghost").width().is_err());
    }

    #[test]
    fn test_unrolled_resolved_node_yields_itself() {
        let tree = tree();
        let a = NodeRef::new(&tree, tree.find("top.a").unwrap());
        assert_eq!(a.unrolled().count(), 1);
        let rf = NodeRef::new(&tree, tree.find("top.rf").unwrap());
        let indices: Vec<_> = rf
            .unrolled()
            .map(|n| n.current_index().map(|i| i.to_vec()))
            .collect();
        assert_eq!(indices, vec![Some(vec![0]), Some(vec![1])]);
    }
}
