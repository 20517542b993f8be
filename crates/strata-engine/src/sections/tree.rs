use std::collections::BTreeMap;

use strata_syntax::Span;

use super::{SectionInterval, SectionKey};

/// Index of a node in the [`SectionTree`] that produced it.
///
/// Ids are only meaningful for the tree they came from and are invalidated
/// by a reparse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

/// One section of the outline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierNode {
    /// Byte offset where the section begins.
    pub start: usize,
    /// Exclusive end offset.
    pub stop: usize,
    /// Zero-based line on which the section opens.
    pub line_number: usize,
    key: Option<SectionKey>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    named_children: BTreeMap<String, Vec<NodeId>>,
}

impl HierNode {
    /// Key under which the parent registered this node; `None` for the root.
    pub fn key(&self) -> Option<&SectionKey> {
        self.key.as_ref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.stop)
    }

    /// Named children as `(name, id)` in name order. A name that occurs more
    /// than once yields each child in insertion order.
    pub fn named_children(&self) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        self.named_children
            .iter()
            .flat_map(|(name, ids)| ids.iter().map(move |id| (name.as_str(), *id)))
    }

    /// Distinct child names, sorted.
    pub fn child_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.named_children.keys().map(String::as_str)
    }
}

/// Result of the neighbour queries; either side may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeNeighbors {
    pub previous: Option<NodeId>,
    pub next: Option<NodeId>,
}

/// Arena holding the outline. Parent links and named-child entries are
/// indices into the arena; every stored node is reachable from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionTree {
    nodes: Vec<HierNode>,
    root: NodeId,
}

enum Step {
    Found(Option<NodeId>),
    Climb,
}

impl SectionTree {
    pub(crate) fn with_root(start: usize, stop: usize, line_number: usize) -> Self {
        Self {
            nodes: vec![HierNode {
                start,
                stop,
                line_number,
                ..HierNode::default()
            }],
            root: NodeId(0),
        }
    }

    pub(crate) fn alloc(&mut self, start: usize, stop: usize, line_number: usize) -> NodeId {
        self.nodes.push(HierNode {
            start,
            stop,
            line_number,
            ..HierNode::default()
        });
        NodeId(self.nodes.len() - 1)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut HierNode {
        &mut self.nodes[id.0]
    }

    /// Registers `child` as the last child of `parent`, and under its name
    /// when the key is a name.
    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId, key: SectionKey) {
        if let SectionKey::Name(name) = &key {
            self.nodes[parent.0]
                .named_children
                .entry(name.clone())
                .or_default()
                .push(child);
        }
        let node = &mut self.nodes[child.0];
        node.parent = Some(parent);
        node.key = Some(key);
        self.nodes[parent.0].children.push(child);
    }

    /// Detaches every descendant of `id`. The detached nodes stay in the
    /// arena until the next [`SectionTree::compacted`].
    pub(crate) fn clear_children(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0];
        node.children.clear();
        node.named_children.clear();
    }

    pub(crate) fn for_each_node_mut(&mut self, mut f: impl FnMut(&mut HierNode)) {
        self.nodes.iter_mut().for_each(|node| f(node));
    }

    /// Copies the subtree under `new_root` into a fresh arena in pre-order,
    /// dropping unreachable nodes. The new root has no key and no parent.
    pub(crate) fn compacted(&self, new_root: NodeId) -> SectionTree {
        let old = &self.nodes[new_root.0];
        let mut tree = SectionTree::with_root(old.start, old.stop, old.line_number);
        let root = tree.root;
        tree.copy_children(root, self, new_root);
        tree
    }

    /// Copies `src_id` and its descendants from `src` under `dst_parent`.
    pub(crate) fn copy_subtree(
        &mut self,
        dst_parent: NodeId,
        src: &SectionTree,
        src_id: NodeId,
        key: SectionKey,
    ) -> NodeId {
        let node = &src.nodes[src_id.0];
        let copy = self.alloc(node.start, node.stop, node.line_number);
        self.attach(dst_parent, copy, key);
        self.copy_children(copy, src, src_id);
        copy
    }

    fn copy_children(&mut self, dst: NodeId, src: &SectionTree, src_id: NodeId) {
        let mut stack: Vec<(NodeId, NodeId)> = src.nodes[src_id.0]
            .children
            .iter()
            .rev()
            .map(|child| (*child, dst))
            .collect();

        while let Some((old_id, new_parent)) = stack.pop() {
            let old = &src.nodes[old_id.0];
            let new_id = self.alloc(old.start, old.stop, old.line_number);
            let key = old.key.clone().unwrap_or(SectionKey::Index(0));
            self.attach(new_parent, new_id, key);
            stack.extend(old.children.iter().rev().map(|child| (*child, new_id)));
        }
    }

    /// Orders the children of `id` by start offset and renumbers the
    /// unnamed ones by their new position.
    pub(crate) fn sort_children(&mut self, id: NodeId) {
        let mut children = std::mem::take(&mut self.nodes[id.0].children);
        children.sort_by_key(|child| self.nodes[child.0].start);
        for (index, child) in children.iter().enumerate() {
            let node = &mut self.nodes[child.0];
            if matches!(node.key, Some(SectionKey::Index(_))) {
                node.key = Some(SectionKey::Index(index));
            }
        }
        self.nodes[id.0].children = children;
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The node for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this tree.
    pub fn node(&self, id: NodeId) -> &HierNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&HierNode> {
        self.nodes.get(id.0)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Child by name (first registered wins) or by position.
    pub fn lookup_child(&self, id: NodeId, key: &SectionKey) -> Option<NodeId> {
        let node = self.get(id)?;
        match key {
            SectionKey::Name(name) => node
                .named_children
                .get(name)
                .and_then(|ids| ids.first().copied()),
            SectionKey::Index(index) => node.children.get(*index).copied(),
        }
    }

    /// Follows `path` from `id`, stopping at the first miss.
    pub fn lookup_path(&self, id: NodeId, path: &[SectionKey]) -> Option<NodeId> {
        path.iter()
            .try_fold(id, |current, key| self.lookup_child(current, key))
    }

    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.get(parent)?
            .children
            .iter()
            .position(|id| *id == child)
    }

    pub fn find_line_number(&self, id: NodeId, key: &SectionKey) -> Option<usize> {
        self.lookup_child(id, key)
            .map(|child| self.nodes[child.0].line_number)
    }

    /// True when every child of `id` is registered under a name.
    pub fn is_named_only(&self, id: NodeId) -> bool {
        let node = &self.nodes[id.0];
        let named: usize = node.named_children.values().map(Vec::len).sum();
        node.children.len() == named
    }

    /// Pre-order walk from `id`: each node once, parents before children,
    /// children in document order.
    pub fn iter_depth_first(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = vec![id];
        std::iter::from_fn(move || {
            let current = stack.pop()?;
            stack.extend(self.nodes[current.0].children.iter().rev().copied());
            Some(current)
        })
    }

    pub fn depth_first(&self, id: NodeId, mut visitor: impl FnMut(NodeId, &HierNode)) {
        for current in self.iter_depth_first(id) {
            visitor(current, &self.nodes[current.0]);
        }
    }

    /// Keys from the root down to `id`.
    pub fn path_of(&self, id: NodeId) -> Vec<SectionKey> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current.map(|id| &self.nodes[id.0]) {
            if let Some(key) = &node.key {
                path.push(key.clone());
            }
            current = node.parent;
        }
        path.reverse();
        path
    }

    /// Children of `id` overlapping `span`; an empty span is a point query.
    pub fn children_overlapping(&self, id: NodeId, span: Span) -> Vec<NodeId> {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(|child| self.nodes[child.0].span().overlaps(span))
            .collect()
    }

    /// One interval per non-root node, in pre-order.
    pub fn intervals(&self) -> Vec<SectionInterval> {
        self.iter_depth_first(self.root)
            .filter_map(|id| {
                let node = &self.nodes[id.0];
                node.key.as_ref().map(|key| SectionInterval {
                    start: node.start,
                    stop: node.stop,
                    key: key.clone(),
                })
            })
            .collect()
    }

    /// Last child opening at or before `line` and first child opening after
    /// it. `None` when `id` has no children.
    pub fn line_neighbors(&self, id: NodeId, line: usize) -> Option<NodeNeighbors> {
        let node = self.get(id)?;
        if node.children.is_empty() {
            return None;
        }

        let mut neighbors = NodeNeighbors::default();
        for child in &node.children {
            if self.nodes[child.0].line_number > line {
                neighbors.next = Some(*child);
                break;
            }
            neighbors.previous = Some(*child);
        }
        Some(neighbors)
    }

    /// Sections to jump to from `child` (a child of `parent`) when moving
    /// backwards or forwards from `offset`.
    ///
    /// A sibling on the line right next to `child` is not a useful jump, so
    /// the search climbs to the parent's neighbours instead. At the top
    /// level the first section's previous is itself and the last section's
    /// next is its first child starting after `offset`.
    pub fn child_neighbors(
        &self,
        parent: NodeId,
        child: NodeId,
        offset: usize,
    ) -> Option<NodeNeighbors> {
        self.child_index(parent, child)?;

        Some(NodeNeighbors {
            previous: self.climb(parent, child, |tree, p, c| tree.previous_step(p, c)),
            next: self.climb(parent, child, |tree, p, c| tree.next_step(p, c, offset)),
        })
    }

    fn climb(
        &self,
        mut parent: NodeId,
        mut child: NodeId,
        step: impl Fn(&Self, NodeId, NodeId) -> Step,
    ) -> Option<NodeId> {
        loop {
            match step(self, parent, child) {
                Step::Found(found) => return found,
                Step::Climb => {
                    child = parent;
                    parent = self.nodes[parent.0].parent?;
                }
            }
        }
    }

    fn previous_step(&self, parent: NodeId, child: NodeId) -> Step {
        let Some(index) = self.child_index(parent, child) else {
            return Step::Found(None);
        };
        let parent_node = &self.nodes[parent.0];
        let has_grandparent = parent_node.parent.is_some();

        if index == 0 {
            return if has_grandparent {
                Step::Climb
            } else {
                Step::Found(Some(child))
            };
        }

        let previous = parent_node.children[index - 1];
        let line = self.nodes[child.0].line_number;
        if line == 0 || line_gap(self.nodes[previous.0].line_number, line) {
            Step::Found(Some(previous))
        } else if has_grandparent {
            Step::Climb
        } else {
            Step::Found(None)
        }
    }

    fn next_step(&self, parent: NodeId, child: NodeId, offset: usize) -> Step {
        let Some(index) = self.child_index(parent, child) else {
            return Step::Found(None);
        };
        let parent_node = &self.nodes[parent.0];
        let has_grandparent = parent_node.parent.is_some();
        let child_node = &self.nodes[child.0];

        if index + 1 == parent_node.children.len() {
            return if has_grandparent {
                Step::Climb
            } else {
                Step::Found(
                    child_node
                        .children
                        .iter()
                        .copied()
                        .find(|grandchild| self.nodes[grandchild.0].start > offset),
                )
            };
        }

        let next = parent_node.children[index + 1];
        let next_node = &self.nodes[next.0];
        if next_node.start > offset
            && (child_node.line_number == 0
                || line_gap(child_node.line_number, next_node.line_number))
        {
            Step::Found(Some(next))
        } else if has_grandparent {
            Step::Climb
        } else {
            Step::Found(None)
        }
    }
}

/// More than one line between `earlier` and `later`, or out of order.
fn line_gap(earlier: usize, later: usize) -> bool {
    later.checked_sub(earlier).is_none_or(|gap| gap > 1)
}
