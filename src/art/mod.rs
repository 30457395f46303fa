//! Adaptive radix tree over fixed-width byte keys.
//!
//! Based on "The Adaptive Radix Tree: ARTful Indexing for Main-Memory
//! Databases" by Leis et al., 2013: adaptive node sizes (4, 16, 48, 256
//! children) and path compression for shared prefixes. Children are visited
//! in byte order, so traversal yields keys in lexicographic order.

mod node;

use std::cmp::Ordering;

pub use node::{Node, NodeType, Prefix};

use crate::dataset::{RawKey, Record, Value};

/// Node census, for inspecting layout choices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtStats {
    pub leaves: usize,
    pub node4: usize,
    pub node16: usize,
    pub node48: usize,
    pub node256: usize,
}

#[derive(Clone, Debug, Default)]
pub struct Art {
    root: Option<Box<Node>>,
    len: usize,
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn insert_into(slot: &mut Box<Node>, record: Record, depth: usize) -> Option<Value> {
    let key = *record.key.as_raw();

    if let Node::Leaf(existing) = &mut **slot {
        if existing.key == record.key {
            return Some(std::mem::replace(&mut existing.value, record.value));
        }
        let theirs = existing.key.as_raw();
        let split = depth + common_prefix(&theirs[depth..], &key[depth..]);
        let their_byte = theirs[split];

        let old = std::mem::replace(slot, Box::new(Node::new_node4(&key[depth..split])));
        slot.add_child(their_byte, old);
        slot.add_child(key[split], Box::new(Node::Leaf(record)));
        return None;
    }

    let prefix = slot.prefix();
    let prefix_len = prefix.len();
    let matched = common_prefix(prefix, &key[depth..]);
    if matched < prefix_len {
        // Split the compressed path where the new key leaves it.
        let their_byte = prefix[matched];
        let rest = Prefix::from_slice(&prefix[matched + 1..]);
        let inner = Node::new_node4(&prefix[..matched]);

        let mut old = std::mem::replace(slot, Box::new(inner));
        old.set_prefix(rest);
        slot.add_child(their_byte, old);
        slot.add_child(key[depth + matched], Box::new(Node::Leaf(record)));
        return None;
    }

    let depth = depth + prefix_len;
    let byte = key[depth];
    match slot.find_child_mut(byte) {
        Some(child) => insert_into(child, record, depth + 1),
        None => {
            slot.add_child(byte, Box::new(Node::Leaf(record)));
            None
        }
    }
}

fn remove_from(slot: &mut Box<Node>, key: &RawKey, depth: usize) -> Option<Value> {
    let prefix_len = slot.prefix().len();
    if !key.get(depth..)?.starts_with(slot.prefix()) {
        return None;
    }
    let depth = depth + prefix_len;
    let byte = *key.get(depth)?;

    let child = slot.find_child_mut(byte)?;
    let value = if let Node::Leaf(record) = &**child {
        if record.key.as_raw() != key {
            return None;
        }
        let value = record.value;
        slot.remove_child(byte);
        value
    } else {
        remove_from(child, key, depth + 1)?
    };

    collapse(slot);
    Some(value)
}

/// Replace a fanout-one inner node with its child, folding the paths.
fn collapse(slot: &mut Box<Node>) {
    let mut path = Prefix::from_slice(slot.prefix());
    let Some((byte, mut child)) = slot.take_only_child() else {
        return;
    };
    if !matches!(*child, Node::Leaf(_)) {
        path.push(byte);
        path.extend_from_slice(child.prefix());
        child.set_prefix(path);
    }
    *slot = child;
}

fn ascend<F: FnMut(&Record) -> bool>(
    node: &Node,
    depth: usize,
    pivot: Option<&RawKey>,
    visit: &mut F,
) -> bool {
    if let Node::Leaf(record) = node {
        if pivot.is_some_and(|p| record.key.as_raw() < p) {
            return true;
        }
        return visit(record);
    }

    let prefix = node.prefix();
    let mut pivot = pivot;
    let mut start = 0u8;
    if let Some(p) = pivot {
        match prefix.cmp(&p[depth..depth + prefix.len()]) {
            Ordering::Less => return true,
            Ordering::Greater => pivot = None,
            Ordering::Equal => start = p[depth + prefix.len()],
        }
    }

    let depth = depth + prefix.len() + 1;
    let mut next = Some(start);
    while let Some(from) = next {
        let Some((byte, child)) = node.child_at_or_after(from) else {
            break;
        };
        let bound = pivot.filter(|_| byte == start);
        if !ascend(child, depth, bound, visit) {
            return false;
        }
        next = byte.checked_add(1);
    }
    true
}

fn descend<F: FnMut(&Record) -> bool>(
    node: &Node,
    depth: usize,
    pivot: Option<&RawKey>,
    visit: &mut F,
) -> bool {
    if let Node::Leaf(record) = node {
        if pivot.is_some_and(|p| record.key.as_raw() > p) {
            return true;
        }
        return visit(record);
    }

    let prefix = node.prefix();
    let mut pivot = pivot;
    let mut start = u8::MAX;
    if let Some(p) = pivot {
        match prefix.cmp(&p[depth..depth + prefix.len()]) {
            Ordering::Greater => return true,
            Ordering::Less => pivot = None,
            Ordering::Equal => start = p[depth + prefix.len()],
        }
    }

    let depth = depth + prefix.len() + 1;
    let mut next = Some(start);
    while let Some(from) = next {
        let Some((byte, child)) = node.child_at_or_before(from) else {
            break;
        };
        let bound = pivot.filter(|_| byte == start);
        if !descend(child, depth, bound, visit) {
            return false;
        }
        next = byte.checked_sub(1);
    }
    true
}

fn census(node: &Node, stats: &mut ArtStats) {
    match node.node_type() {
        NodeType::Leaf => {
            stats.leaves += 1;
            return;
        }
        NodeType::Node4 => stats.node4 += 1,
        NodeType::Node16 => stats.node16 += 1,
        NodeType::Node48 => stats.node48 += 1,
        NodeType::Node256 => stats.node256 += 1,
    }
    let mut next = Some(0u8);
    while let Some(from) = next {
        let Some((byte, child)) = node.child_at_or_after(from) else {
            break;
        };
        census(child, stats);
        next = byte.checked_add(1);
    }
}

impl Art {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert or replace; returns the previous value.
    pub fn insert(&mut self, key: &RawKey, value: Value) -> Option<Value> {
        let record = Record::from_raw(*key, value);
        let prev = match self.root.as_mut() {
            Some(root) => insert_into(root, record, 0),
            None => {
                self.root = Some(Box::new(Node::Leaf(record)));
                None
            }
        };
        if prev.is_none() {
            self.len += 1;
        }
        prev
    }

    pub fn get(&self, key: &RawKey) -> Option<Value> {
        let mut node = self.root.as_deref()?;
        let mut depth = 0;
        loop {
            if let Node::Leaf(record) = node {
                return (record.key.as_raw() == key).then_some(record.value);
            }
            let prefix = node.prefix();
            if !key.get(depth..)?.starts_with(prefix) {
                return None;
            }
            depth += prefix.len();
            node = node.find_child(*key.get(depth)?)?;
            depth += 1;
        }
    }

    pub fn remove(&mut self, key: &RawKey) -> Option<Value> {
        let root = self.root.as_mut()?;
        let value = if let Node::Leaf(record) = &**root {
            if record.key.as_raw() != key {
                return None;
            }
            let value = record.value;
            self.root = None;
            value
        } else {
            remove_from(root, key, 0)?
        };
        self.len -= 1;
        Some(value)
    }

    /// Visit records with key >= `pivot` in ascending order.
    pub fn ascend<F: FnMut(&Record) -> bool>(&self, pivot: Option<&RawKey>, mut visit: F) {
        if let Some(root) = self.root.as_deref() {
            ascend(root, 0, pivot, &mut visit);
        }
    }

    /// Visit records with key <= `pivot` in descending order.
    pub fn descend<F: FnMut(&Record) -> bool>(&self, pivot: Option<&RawKey>, mut visit: F) {
        if let Some(root) = self.root.as_deref() {
            descend(root, 0, pivot, &mut visit);
        }
    }

    pub fn stats(&self) -> ArtStats {
        let mut stats = ArtStats::default();
        if let Some(root) = self.root.as_deref() {
            census(root, &mut stats);
        }
        stats
    }
}
