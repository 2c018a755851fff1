//! Row flattening.
//!
//! Converts a row forest into the linear sequence the body renders, honoring
//! expand/collapse state. Traversal is an explicit-stack depth-first
//! pre-order walk; an [`ExpansionPolicy`] decides which subtrees are entered.
//!
//! Flattened rows never own row values. Each [`FlatRow`] carries the child
//! index path of its row inside the forest and index-based links to its
//! parent, so the sequence can be rebuilt wholesale on every pass.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::TreeConfig;
use crate::traits::{KeyAccessor, RowKey, RowValue};

/// One row of the flattened sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    pub key: RowKey,
    /// Child index path from the forest roots to this row.
    pub path: Box<[usize]>,
    pub depth: usize,
    pub parent_key: Option<RowKey>,
    /// Index of the parent row in the same flattened sequence.
    pub parent_index: Option<usize>,
    pub index: usize,
    pub has_children: bool,
    pub is_expanded: bool,
    /// Number of flattened rows belonging to this row's visible subtree
    /// (excluding itself). They follow it contiguously.
    pub descendant_count: usize,
}

/// Decides whether traversal enters a row's children.
pub trait ExpansionPolicy {
    fn descend_into(&self, key: &RowKey, depth: usize) -> bool;
}

/// Enters only rows whose key is in the expanded set.
pub struct ExpandedKeys<'a>(pub &'a HashSet<RowKey>);

impl ExpansionPolicy for ExpandedKeys<'_> {
    fn descend_into(&self, key: &RowKey, _depth: usize) -> bool {
        self.0.contains(key)
    }
}

/// Enters every row.
pub struct ExpandAll;

impl ExpansionPolicy for ExpandAll {
    fn descend_into(&self, _key: &RowKey, _depth: usize) -> bool {
        true
    }
}

/// Source of [`FlatRows::generation`] values.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Flattened row sequence with a key → index lookup.
#[derive(Debug, Clone, Default)]
pub struct FlatRows {
    rows: Vec<FlatRow>,
    positions: HashMap<RowKey, usize>,
    malformed: usize,
    /// Distinct per traversal; 0 for the empty default
    generation: u64,
}

impl PartialEq for FlatRows {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows && self.malformed == other.malformed
    }
}

impl Eq for FlatRows {}

impl FlatRows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FlatRow> {
        self.rows.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FlatRow> {
        self.rows.iter()
    }

    /// Identifies the traversal that built this sequence. Derived data keyed
    /// by flattened index is valid only for the generation it was built from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Index of the first row carrying `key`.
    pub fn index_of(&self, key: &RowKey) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn contains_key(&self, key: &RowKey) -> bool {
        self.positions.contains_key(key)
    }

    pub fn key_at(&self, index: usize) -> Option<&RowKey> {
        self.rows.get(index).map(|row| &row.key)
    }

    /// Number of rows whose `children` attribute was not a sequence.
    pub fn malformed_count(&self) -> usize {
        self.malformed
    }

    /// Indices of the direct children of `index` present in the sequence.
    pub fn child_indices(&self, index: usize) -> ChildIndices<'_> {
        let end = self
            .rows
            .get(index)
            .map(|row| index + 1 + row.descendant_count)
            .unwrap_or(index);
        ChildIndices { rows: &self.rows, next: index + 1, end }
    }

    /// Indices of every flattened descendant of `index`.
    pub fn descendant_indices(&self, index: usize) -> std::ops::Range<usize> {
        match self.rows.get(index) {
            Some(row) => index + 1..index + 1 + row.descendant_count,
            None => index..index,
        }
    }

    /// Indices of the ancestors of `index`, nearest first.
    pub fn ancestor_indices(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.rows.get(index).and_then(|row| row.parent_index), move |&i| {
            self.rows[i].parent_index
        })
    }

    /// Resolves the row value of `index` inside `forest`.
    pub fn value<'a, R: RowValue>(&self, forest: &'a [R], index: usize) -> Option<&'a R> {
        resolve_path(forest, &self.rows.get(index)?.path)
    }
}

/// Iterator over the direct children of a flattened row.
pub struct ChildIndices<'a> {
    rows: &'a [FlatRow],
    next: usize,
    end: usize,
}

impl Iterator for ChildIndices<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next >= self.end {
            return None;
        }
        let current = self.next;
        self.next += 1 + self.rows[current].descendant_count;
        Some(current)
    }
}

/// Follows a child index path through the forest.
pub fn resolve_path<'a, R: RowValue>(forest: &'a [R], path: &[usize]) -> Option<&'a R> {
    let (&first, rest) = path.split_first()?;
    let mut row = forest.get(first)?;
    for &i in rest {
        row = row.children()?.get(i)?;
    }
    Some(row)
}

/// Flattens `rows` according to the tree configuration and expanded keys.
///
/// - `TreeConfig::Flat`: one row per root, depth 0, `children` ignored.
/// - `TreeConfig::Tree { collapsible: true }`: children follow their parent
///   only while the parent's key is in `expanded`.
/// - `TreeConfig::Tree { collapsible: false }`: every subtree is shown.
///
/// Pure: identical inputs always produce an identical sequence.
pub fn flatten<R: RowValue>(
    rows: &[R],
    expanded: &HashSet<RowKey>,
    tree: TreeConfig,
    keys: &KeyAccessor,
) -> FlatRows {
    match tree {
        TreeConfig::Flat => traverse(rows, keys, &ExpandedKeys(expanded), false),
        TreeConfig::Tree { collapsible: true } => {
            traverse(rows, keys, &ExpandedKeys(expanded), true)
        }
        TreeConfig::Tree { collapsible: false } => traverse(rows, keys, &ExpandAll, true),
    }
}

/// Flattens the whole forest regardless of expansion state.
///
/// Used to answer "does this key exist at all", e.g. for selection pruning.
pub fn index_forest<R: RowValue>(rows: &[R], tree: TreeConfig, keys: &KeyAccessor) -> FlatRows {
    traverse(rows, keys, &ExpandAll, tree.is_tree())
}

/// Stack frame for iterative depth-first traversal.
struct Frame<'r, R> {
    row: &'r R,
    path: Vec<usize>,
    depth: usize,
    parent_index: Option<usize>,
}

/// Unified traversal producing the flattened sequence for a policy.
pub fn traverse<R, P>(rows: &[R], keys: &KeyAccessor, policy: &P, enable_tree: bool) -> FlatRows
where
    R: RowValue,
    P: ExpansionPolicy + ?Sized,
{
    let mut out: Vec<FlatRow> = Vec::with_capacity(rows.len());
    let mut malformed = 0;

    // Reverse for LIFO stack order
    let mut stack: Vec<Frame<'_, R>> = rows
        .iter()
        .enumerate()
        .rev()
        .map(|(i, row)| Frame { row, path: vec![i], depth: 0, parent_index: None })
        .collect();

    while let Some(frame) = stack.pop() {
        let key = keys.key_for(frame.row, &frame.path);
        let children = if enable_tree {
            if frame.row.has_malformed_children() {
                malformed += 1;
            }
            frame.row.children().unwrap_or(&[])
        } else {
            &[]
        };
        let has_children = !children.is_empty();
        let is_expanded = has_children && policy.descend_into(&key, frame.depth);
        let index = out.len();

        if is_expanded {
            for (i, child) in children.iter().enumerate().rev() {
                let mut path = frame.path.clone();
                path.push(i);
                stack.push(Frame {
                    row: child,
                    path,
                    depth: frame.depth + 1,
                    parent_index: Some(index),
                });
            }
        }

        let parent_key = frame.parent_index.map(|p| out[p].key.clone());
        out.push(FlatRow {
            key,
            path: frame.path.into_boxed_slice(),
            depth: frame.depth,
            parent_key,
            parent_index: frame.parent_index,
            index,
            has_children,
            is_expanded,
            descendant_count: 0,
        });
    }

    // Children always follow their parent, so a reverse sweep sees every
    // subtree complete before its parent.
    for i in (0..out.len()).rev() {
        if let Some(parent) = out[i].parent_index {
            out[parent].descendant_count += 1 + out[i].descendant_count;
        }
    }

    let mut positions = HashMap::with_capacity(out.len());
    for row in &out {
        positions.entry(row.key.clone()).or_insert(row.index);
    }

    let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
    FlatRows { rows: out, positions, malformed, generation }
}
