//! Copy-on-write B-tree over [`Record`]s with a configurable degree.
//!
//! Nodes sit behind `Arc`, so cloning a tree is O(1) and a write copies only
//! the nodes on its path that are still shared (`Arc::make_mut`). Search can
//! be steered by a [`PathHint`] that remembers the index taken at each level.
//!
//! A node holds at most `2 * degree - 1` items and, except for the root, at
//! least `degree - 1`.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::candidate::PathHint;
use crate::dataset::{Key, Record};

const MIN_DEGREE: usize = 2;
/// Largest degree whose node indices still fit a `PathHint` slot.
const MAX_DEGREE: usize = 1 << 15;

#[derive(Clone, Debug, Default)]
struct Node {
    items: Vec<Record>,
    /// Empty for leaves, `items.len() + 1` entries otherwise.
    children: Vec<Arc<Node>>,
}

impl Node {
    fn leaf(record: Record) -> Self {
        Self {
            items: vec![record],
            children: Vec::new(),
        }
    }

    #[inline]
    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    #[inline]
    fn search(&self, key: &Key) -> Result<usize, usize> {
        self.items.binary_search_by(|r| r.key.cmp(key))
    }

    /// Like [`Node::search`], but starts from the index remembered at `depth`.
    fn find(&self, key: &Key, hint: Option<&mut PathHint>, depth: usize) -> Result<usize, usize> {
        let Some(hint) = hint else {
            return self.search(key);
        };

        let n = self.items.len();
        let result = match hint.slot(depth) {
            Some(i) if i < n => match self.items[i].key.cmp(key) {
                Ordering::Equal => Ok(i),
                Ordering::Greater => self.items[..i].binary_search_by(|r| r.key.cmp(key)),
                Ordering::Less => match self.items.get(i + 1).map(|r| r.key.cmp(key)) {
                    None | Some(Ordering::Greater) => Err(i + 1),
                    Some(Ordering::Equal) => Ok(i + 1),
                    Some(Ordering::Less) => self.items[i + 1..]
                        .binary_search_by(|r| r.key.cmp(key))
                        .map(|j| j + i + 1)
                        .map_err(|j| j + i + 1),
                },
            },
            Some(_) if n > 0 && self.items[n - 1].key < *key => Err(n),
            _ => self.search(key),
        };

        let (Ok(i) | Err(i)) = result;
        hint.remember(depth, i);
        result
    }

    /// Move `children[idx]`'s upper half into a new right sibling.
    fn split_child(&mut self, idx: usize) {
        let child = Arc::make_mut(&mut self.children[idx]);
        let mid = child.items.len() / 2;
        let right_items = child.items.split_off(mid + 1);
        let median = child.items.remove(mid);
        let right_children = if child.is_leaf() {
            Vec::new()
        } else {
            child.children.split_off(mid + 1)
        };

        self.items.insert(idx, median);
        self.children.insert(
            idx + 1,
            Arc::new(Node {
                items: right_items,
                children: right_children,
            }),
        );
    }

    /// Restore the minimum occupancy of `children[idx]` after a removal.
    fn rebalance(&mut self, idx: usize, min: usize) {
        if self.children[idx].items.len() >= min {
            return;
        }

        if idx > 0 && self.children[idx - 1].items.len() > min {
            let left = Arc::make_mut(&mut self.children[idx - 1]);
            let (Some(item), moved) = (left.items.pop(), left.children.pop()) else {
                return;
            };
            let sep = std::mem::replace(&mut self.items[idx - 1], item);
            let child = Arc::make_mut(&mut self.children[idx]);
            child.items.insert(0, sep);
            if let Some(moved) = moved {
                child.children.insert(0, moved);
            }
            return;
        }

        if idx + 1 < self.children.len() && self.children[idx + 1].items.len() > min {
            let right = Arc::make_mut(&mut self.children[idx + 1]);
            let item = right.items.remove(0);
            let moved = (!right.is_leaf()).then(|| right.children.remove(0));
            let sep = std::mem::replace(&mut self.items[idx], item);
            let child = Arc::make_mut(&mut self.children[idx]);
            child.items.push(sep);
            if let Some(moved) = moved {
                child.children.push(moved);
            }
            return;
        }

        let left_idx = if idx > 0 { idx - 1 } else { idx };
        if left_idx + 1 < self.children.len() {
            self.merge(left_idx);
        }
    }

    /// Fold `children[idx + 1]` and separator `items[idx]` into `children[idx]`.
    fn merge(&mut self, idx: usize) {
        let sep = self.items.remove(idx);
        let right = Arc::unwrap_or_clone(self.children.remove(idx + 1));
        let left = Arc::make_mut(&mut self.children[idx]);
        left.items.push(sep);
        left.items.extend(right.items);
        left.children.extend(right.children);
    }
}

fn insert_into(
    node: &mut Node,
    record: Record,
    max: usize,
    mut hint: Option<&mut PathHint>,
    depth: usize,
) -> Option<Record> {
    let idx = match node.find(&record.key, hint.as_deref_mut(), depth) {
        Ok(i) => return Some(std::mem::replace(&mut node.items[i], record)),
        Err(i) => i,
    };
    if node.is_leaf() {
        node.items.insert(idx, record);
        return None;
    }

    let child = Arc::make_mut(&mut node.children[idx]);
    let prev = insert_into(child, record, max, hint, depth + 1);
    if node.children[idx].items.len() > max {
        node.split_child(idx);
    }
    prev
}

fn remove_from(node: &mut Node, key: &Key, min: usize) -> Option<Record> {
    match node.search(key) {
        Ok(i) if node.is_leaf() => Some(node.items.remove(i)),
        Err(_) if node.is_leaf() => None,
        Ok(i) => {
            let child = Arc::make_mut(&mut node.children[i]);
            let pred = pop_max(child, min)?;
            let removed = std::mem::replace(&mut node.items[i], pred);
            node.rebalance(i, min);
            Some(removed)
        }
        Err(i) => {
            let child = Arc::make_mut(&mut node.children[i]);
            let removed = remove_from(child, key, min)?;
            node.rebalance(i, min);
            Some(removed)
        }
    }
}

fn pop_max(node: &mut Node, min: usize) -> Option<Record> {
    if node.is_leaf() {
        return node.items.pop();
    }
    let last = node.children.len() - 1;
    let child = Arc::make_mut(&mut node.children[last]);
    let record = pop_max(child, min)?;
    node.rebalance(last, min);
    Some(record)
}

fn ascend<F: FnMut(&Record) -> bool>(
    node: &Node,
    pivot: Option<&Key>,
    mut hint: Option<&mut PathHint>,
    depth: usize,
    visit: &mut F,
) -> bool {
    let (mut i, exact) = match pivot {
        None => (0, false),
        Some(key) => match node.find(key, hint.as_deref_mut(), depth) {
            Ok(i) => (i, true),
            Err(i) => (i, false),
        },
    };

    if !node.is_leaf() && !exact && !ascend(&node.children[i], pivot, hint, depth + 1, visit) {
        return false;
    }
    while i < node.items.len() {
        if !visit(&node.items[i]) {
            return false;
        }
        i += 1;
        if !node.is_leaf() && !ascend(&node.children[i], None, None, depth + 1, visit) {
            return false;
        }
    }
    true
}

fn descend<F: FnMut(&Record) -> bool>(
    node: &Node,
    pivot: Option<&Key>,
    mut hint: Option<&mut PathHint>,
    depth: usize,
    visit: &mut F,
) -> bool {
    let leaf = node.is_leaf();
    let mut i = match pivot {
        None => {
            let n = node.items.len();
            if !leaf && !descend(&node.children[n], None, None, depth + 1, visit) {
                return false;
            }
            n
        }
        Some(key) => match node.find(key, hint.as_deref_mut(), depth) {
            Ok(i) => {
                if !visit(&node.items[i]) {
                    return false;
                }
                if !leaf && !descend(&node.children[i], None, None, depth + 1, visit) {
                    return false;
                }
                i
            }
            Err(i) => {
                if !leaf && !descend(&node.children[i], pivot, hint, depth + 1, visit) {
                    return false;
                }
                i
            }
        },
    };

    while i > 0 {
        i -= 1;
        if !visit(&node.items[i]) {
            return false;
        }
        if !leaf && !descend(&node.children[i], None, None, depth + 1, visit) {
            return false;
        }
    }
    true
}

/// Ordered map from [`Key`] to [`Record`] with `Arc`-shared nodes.
#[derive(Clone, Debug)]
pub struct BTree {
    root: Option<Arc<Node>>,
    len: usize,
    degree: usize,
}

impl BTree {
    /// Empty tree; the degree is clamped to `2..=32768`.
    pub fn new(degree: usize) -> Self {
        Self {
            root: None,
            len: 0,
            degree: degree.clamp(MIN_DEGREE, MAX_DEGREE),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn max_items(&self) -> usize {
        self.degree * 2 - 1
    }

    #[inline]
    fn min_items(&self) -> usize {
        self.degree - 1
    }

    /// Insert or replace; returns the replaced record.
    pub fn insert(&mut self, record: Record, hint: Option<&mut PathHint>) -> Option<Record> {
        let max = self.max_items();
        let Some(root) = self.root.as_mut() else {
            self.root = Some(Arc::new(Node::leaf(record)));
            self.len = 1;
            return None;
        };

        let prev = insert_into(Arc::make_mut(root), record, max, hint, 0);
        if root.items.len() > max {
            let old = std::mem::take(root);
            let top = Arc::make_mut(root);
            top.children.push(old);
            top.split_child(0);
        }
        if prev.is_none() {
            self.len += 1;
        }
        prev
    }

    /// Append path for ascending input.
    ///
    /// While the incoming key is above the current maximum and the rightmost
    /// leaf has room, the record is pushed onto that leaf without a search.
    /// Anything else takes the ordinary insert path.
    pub fn load(&mut self, record: Record) -> Option<Record> {
        let max = self.max_items();
        if let Some(root) = self.root.as_mut() {
            let mut node = Arc::make_mut(root);
            while !node.is_leaf() {
                let last = node.children.len() - 1;
                node = Arc::make_mut(&mut node.children[last]);
            }
            let above_max = node.items.last().is_some_and(|r| r.key < record.key);
            if above_max && node.items.len() < max {
                node.items.push(record);
                self.len += 1;
                return None;
            }
        }
        self.insert(record, None)
    }

    pub fn get(&self, key: &Key, mut hint: Option<&mut PathHint>) -> Option<&Record> {
        let mut node = self.root.as_deref()?;
        let mut depth = 0;
        loop {
            match node.find(key, hint.as_deref_mut(), depth) {
                Ok(i) => return Some(&node.items[i]),
                Err(_) if node.is_leaf() => return None,
                Err(i) => node = &node.children[i],
            }
            depth += 1;
        }
    }

    pub fn remove(&mut self, key: &Key) -> Option<Record> {
        let min = self.min_items();
        let root = self.root.as_mut()?;
        let removed = remove_from(Arc::make_mut(root), key, min)?;
        self.len -= 1;

        if root.items.is_empty() {
            let next = root.children.first().cloned();
            self.root = next;
        }
        Some(removed)
    }

    /// Visit records with key >= `pivot` in ascending order.
    pub fn ascend<F: FnMut(&Record) -> bool>(
        &self,
        pivot: Option<&Key>,
        hint: Option<&mut PathHint>,
        mut visit: F,
    ) {
        if let Some(root) = self.root.as_deref() {
            ascend(root, pivot, hint, 0, &mut visit);
        }
    }

    /// Visit records with key <= `pivot` in descending order.
    pub fn descend<F: FnMut(&Record) -> bool>(
        &self,
        pivot: Option<&Key>,
        hint: Option<&mut PathHint>,
        mut visit: F,
    ) {
        if let Some(root) = self.root.as_deref() {
            descend(root, pivot, hint, 0, &mut visit);
        }
    }

    pub fn first(&self) -> Option<&Record> {
        let mut node = self.root.as_deref()?;
        while !node.is_leaf() {
            node = &node.children[0];
        }
        node.items.first()
    }
}
