use std::collections::BTreeSet;

use strata_syntax::{Span, TextFormat};

use super::{HierNode, NodeId, SectionInterval, SectionKey, SectionTree, TypeInterval};

/// Everything one discovery run found in a text.
///
/// Immutable once built; a reparse produces a new value. The interval list
/// is derived from the tree, one entry per non-root node in pre-order, so
/// the two views always agree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    intervals: Vec<SectionInterval>,
    tree: Option<SectionTree>,
    type_intervals: Vec<TypeInterval>,
    indents: BTreeSet<usize>,
    text_format: TextFormat,
}

impl Metadata {
    pub(crate) fn new(
        tree: Option<SectionTree>,
        type_intervals: Vec<TypeInterval>,
        indents: BTreeSet<usize>,
        text_format: TextFormat,
    ) -> Self {
        let intervals = tree.as_ref().map(SectionTree::intervals).unwrap_or_default();
        Self {
            intervals,
            tree,
            type_intervals,
            indents,
            text_format,
        }
    }

    /// Empty result for text that was not scanned.
    pub fn empty(text_format: TextFormat) -> Self {
        Self {
            text_format,
            ..Self::default()
        }
    }

    pub fn intervals(&self) -> &[SectionInterval] {
        &self.intervals
    }

    /// The outline, `None` when no structure was found.
    pub fn tree(&self) -> Option<&SectionTree> {
        self.tree.as_ref()
    }

    pub fn root(&self) -> Option<&HierNode> {
        self.tree.as_ref().map(|tree| tree.node(tree.root()))
    }

    pub fn type_intervals(&self) -> &[TypeInterval] {
        &self.type_intervals
    }

    /// Columns at which indentation guides can be drawn.
    pub fn indents(&self) -> &BTreeSet<usize> {
        &self.indents
    }

    pub fn text_format(&self) -> TextFormat {
        self.text_format
    }

    pub fn lookup_path(&self, path: &[SectionKey]) -> Option<NodeId> {
        let tree = self.tree.as_ref()?;
        tree.lookup_path(tree.root(), path)
    }

    /// Keys of the sections enclosing `[start, stop)`, outermost first.
    ///
    /// The walk stops where no child overlaps the range. When more than one
    /// child overlaps at any level the range has no single owner and the
    /// result is empty.
    pub fn path_for_range(&self, start: usize, stop: usize) -> Vec<SectionKey> {
        self.node_for_range(start, stop)
            .and_then(|id| self.tree.as_ref().map(|tree| tree.path_of(id)))
            .unwrap_or_default()
    }

    /// The innermost node owning `[start, stop)`; the root when no section
    /// does. `None` when there is no tree or the range is shared by
    /// several sections.
    pub fn node_for_range(&self, start: usize, stop: usize) -> Option<NodeId> {
        let tree = self.tree.as_ref()?;
        let span = Span::new(start, stop.max(start));
        let mut current = tree.root();
        loop {
            match tree.children_overlapping(current, span).as_slice() {
                [] => return Some(current),
                [only] => current = *only,
                _ => return None,
            }
        }
    }

    /// Names a breadcrumb at `path` could switch to: the distinct names of
    /// the named siblings of the node at `path`, sorted.
    pub fn possibility_provider(&self, path: &[SectionKey]) -> Vec<String> {
        let Some(tree) = self.tree.as_ref() else {
            return Vec::new();
        };
        tree.lookup_path(tree.root(), path)
            .and_then(|id| tree.node(id).parent())
            .map(|parent| tree.node(parent).child_names().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Intervals overlapping `span`, in pre-order.
    pub fn intervals_overlapping(&self, span: Span) -> impl Iterator<Item = &SectionInterval> + '_ {
        self.intervals
            .iter()
            .filter(move |iv| Span::new(iv.start, iv.stop).overlaps(span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// root [0, 100)
    /// ├── a [0, 40)
    /// │   ├── 0 [10, 20)
    /// │   └── x [30, 40)
    /// └── b [50, 60)
    fn sample() -> Metadata {
        let mut tree = SectionTree::with_root(0, 100, 0);
        let root = tree.root();
        let a = tree.alloc(0, 40, 0);
        tree.attach(root, a, "a".into());
        let a0 = tree.alloc(10, 20, 1);
        tree.attach(a, a0, 0.into());
        let x = tree.alloc(30, 40, 3);
        tree.attach(a, x, "x".into());
        let b = tree.alloc(50, 60, 5);
        tree.attach(root, b, "b".into());
        Metadata::new(Some(tree), Vec::new(), BTreeSet::new(), TextFormat::Json)
    }

    #[test]
    fn intervals_come_from_the_tree() {
        let meta = sample();
        let keys: Vec<_> = meta.intervals().iter().map(|iv| iv.key.to_string()).collect();
        assert_eq!(keys, vec!["a", "0", "x", "b"]);
    }

    #[test]
    fn path_for_point_descends_to_innermost() {
        let meta = sample();
        assert_eq!(
            meta.path_for_range(12, 12),
            vec![SectionKey::from("a"), SectionKey::Index(0)]
        );
        assert_eq!(meta.path_for_range(25, 25), vec![SectionKey::from("a")]);
        assert!(meta.path_for_range(45, 45).is_empty());
    }

    #[test]
    fn path_for_range_shared_by_siblings_is_empty() {
        let meta = sample();
        assert!(meta.path_for_range(15, 35).is_empty());
        assert!(meta.path_for_range(30, 55).is_empty());
    }

    #[test]
    fn possibilities_are_sibling_names() {
        let meta = sample();
        assert_eq!(meta.possibility_provider(&["a".into()]), vec!["a", "b"]);
        assert_eq!(meta.possibility_provider(&["a".into(), 0.into()]), vec!["x"]);
        assert!(meta.possibility_provider(&[]).is_empty());
        assert!(meta.possibility_provider(&["missing".into()]).is_empty());
    }

    #[test]
    fn overlapping_intervals() {
        let meta = sample();
        let keys: Vec<_> = meta
            .intervals_overlapping(Span::new(35, 55))
            .map(|iv| iv.key.to_string())
            .collect();
        assert_eq!(keys, vec!["a", "x", "b"]);
    }

    #[test]
    fn empty_metadata_has_no_tree() {
        let meta = Metadata::empty(TextFormat::Binary);
        assert!(meta.tree().is_none());
        assert!(meta.lookup_path(&[]).is_none());
        assert!(meta.path_for_range(0, 10).is_empty());
        assert_eq!(meta.text_format(), TextFormat::Binary);
    }
}
