//! ART node layouts.
//!
//! A node takes the smallest layout that fits its fanout:
//!
//! - Node4: up to 4 children, sorted key bytes
//! - Node16: 5-16 children, sorted key bytes
//! - Node48: 17-48 children behind a 256-entry byte index
//! - Node256: 49-256 children indexed directly by byte
//!
//! Keys are fixed width, so no key is a prefix of another and every record
//! lives in a leaf.

use std::mem;

use smallvec::SmallVec;

use crate::dataset::Record;

/// Compressed path segment stored on inner nodes.
pub type Prefix = SmallVec<[u8; 8]>;

/// Unused entry in a Node48 byte index.
const EMPTY: u8 = u8::MAX;

/// Fanout at or below which a node drops to the next smaller layout.
const SHRINK_16: usize = 3;
const SHRINK_48: usize = 12;
const SHRINK_256: usize = 37;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Leaf,
    Node4,
    Node16,
    Node48,
    Node256,
}

#[derive(Clone)]
pub enum Node {
    Leaf(Record),

    Node4 {
        prefix: Prefix,
        /// Sorted; the first `children.len()` entries are live.
        keys: [u8; 4],
        children: Vec<Box<Node>>,
    },

    Node16 {
        prefix: Prefix,
        keys: [u8; 16],
        children: Vec<Box<Node>>,
    },

    Node48 {
        prefix: Prefix,
        len: u8,
        /// Byte to slot in `children`, or [`EMPTY`].
        child_index: Box<[u8; 256]>,
        children: Vec<Option<Box<Node>>>,
    },

    Node256 {
        prefix: Prefix,
        len: u16,
        children: Box<[Option<Box<Node>>; 256]>,
    },
}

fn insert_sorted(keys: &mut [u8], children: &mut Vec<Box<Node>>, byte: u8, child: Box<Node>) {
    let n = children.len();
    let pos = keys[..n].iter().position(|&k| k > byte).unwrap_or(n);
    keys.copy_within(pos..n, pos + 1);
    keys[pos] = byte;
    children.insert(pos, child);
}

fn remove_sorted(keys: &mut [u8], children: &mut Vec<Box<Node>>, byte: u8) -> Option<Box<Node>> {
    let n = children.len();
    let pos = keys[..n].iter().position(|&k| k == byte)?;
    keys.copy_within(pos + 1..n, pos);
    Some(children.remove(pos))
}

impl Node {
    pub fn new_node4(prefix: &[u8]) -> Self {
        Node::Node4 {
            prefix: Prefix::from_slice(prefix),
            keys: [0; 4],
            children: Vec::with_capacity(4),
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Leaf(_) => NodeType::Leaf,
            Node::Node4 { .. } => NodeType::Node4,
            Node::Node16 { .. } => NodeType::Node16,
            Node::Node48 { .. } => NodeType::Node48,
            Node::Node256 { .. } => NodeType::Node256,
        }
    }

    pub fn num_children(&self) -> usize {
        match self {
            Node::Leaf(_) => 0,
            Node::Node4 { children, .. } | Node::Node16 { children, .. } => children.len(),
            Node::Node48 { len, .. } => *len as usize,
            Node::Node256 { len, .. } => *len as usize,
        }
    }

    pub fn prefix(&self) -> &[u8] {
        match self {
            Node::Leaf(_) => &[],
            Node::Node4 { prefix, .. }
            | Node::Node16 { prefix, .. }
            | Node::Node48 { prefix, .. }
            | Node::Node256 { prefix, .. } => prefix,
        }
    }

    pub fn set_prefix(&mut self, new_prefix: Prefix) {
        match self {
            Node::Leaf(_) => {}
            Node::Node4 { prefix, .. }
            | Node::Node16 { prefix, .. }
            | Node::Node48 { prefix, .. }
            | Node::Node256 { prefix, .. } => *prefix = new_prefix,
        }
    }

    pub fn find_child(&self, byte: u8) -> Option<&Node> {
        match self {
            Node::Leaf(_) => None,
            Node::Node4 { keys, children, .. } => {
                let i = keys[..children.len()].iter().position(|&k| k == byte)?;
                Some(&children[i])
            }
            Node::Node16 { keys, children, .. } => {
                let i = keys[..children.len()].iter().position(|&k| k == byte)?;
                Some(&children[i])
            }
            Node::Node48 {
                child_index,
                children,
                ..
            } => match child_index[byte as usize] {
                EMPTY => None,
                slot => children.get(slot as usize)?.as_deref(),
            },
            Node::Node256 { children, .. } => children[byte as usize].as_deref(),
        }
    }

    pub fn find_child_mut(&mut self, byte: u8) -> Option<&mut Box<Node>> {
        match self {
            Node::Leaf(_) => None,
            Node::Node4 { keys, children, .. } => {
                let i = keys[..children.len()].iter().position(|&k| k == byte)?;
                Some(&mut children[i])
            }
            Node::Node16 { keys, children, .. } => {
                let i = keys[..children.len()].iter().position(|&k| k == byte)?;
                Some(&mut children[i])
            }
            Node::Node48 {
                child_index,
                children,
                ..
            } => match child_index[byte as usize] {
                EMPTY => None,
                slot => children.get_mut(slot as usize)?.as_mut(),
            },
            Node::Node256 { children, .. } => children[byte as usize].as_mut(),
        }
    }

    /// Add a child under a byte not yet present, growing the node if full.
    pub fn add_child(&mut self, byte: u8, child: Box<Node>) {
        debug_assert!(self.find_child(byte).is_none(), "duplicate child byte {byte}");
        match self {
            Node::Leaf(_) => unreachable!("leaves have no children"),

            Node::Node4 { keys, children, .. } if children.len() < 4 => {
                insert_sorted(keys, children, byte, child)
            }

            Node::Node16 { keys, children, .. } if children.len() < 16 => {
                insert_sorted(keys, children, byte, child)
            }

            Node::Node48 {
                len,
                child_index,
                children,
                ..
            } if (*len as usize) < 48 => {
                let slot = match children.iter().position(Option::is_none) {
                    Some(free) => {
                        children[free] = Some(child);
                        free
                    }
                    None => {
                        children.push(Some(child));
                        children.len() - 1
                    }
                };
                child_index[byte as usize] = slot as u8;
                *len += 1;
            }

            Node::Node256 { len, children, .. } => {
                if children[byte as usize].replace(child).is_none() {
                    *len += 1;
                }
            }

            _ => {
                self.grow();
                self.add_child(byte, child);
            }
        }
    }

    /// Remove the child under `byte`, shrinking the node when it gets sparse.
    pub fn remove_child(&mut self, byte: u8) -> Option<Box<Node>> {
        let removed = match self {
            Node::Leaf(_) => None,
            Node::Node4 { keys, children, .. } => remove_sorted(keys, children, byte),
            Node::Node16 { keys, children, .. } => remove_sorted(keys, children, byte),
            Node::Node48 {
                len,
                child_index,
                children,
                ..
            } => match mem::replace(&mut child_index[byte as usize], EMPTY) {
                EMPTY => None,
                slot => {
                    *len -= 1;
                    children.get_mut(slot as usize).and_then(Option::take)
                }
            },
            Node::Node256 { len, children, .. } => {
                let child = children[byte as usize].take();
                if child.is_some() {
                    *len -= 1;
                }
                child
            }
        };
        if removed.is_some() {
            self.shrink();
        }
        removed
    }

    /// Detach the sole child of a node with fanout one.
    pub fn take_only_child(&mut self) -> Option<(u8, Box<Node>)> {
        if self.num_children() != 1 {
            return None;
        }
        let (byte, _) = self.child_at_or_after(0)?;
        let child = self.remove_child(byte)?;
        Some((byte, child))
    }

    /// Lowest child whose byte is >= `from`.
    pub fn child_at_or_after(&self, from: u8) -> Option<(u8, &Node)> {
        match self {
            Node::Leaf(_) => None,
            Node::Node4 { keys, children, .. } => {
                let i = keys[..children.len()].iter().position(|&k| k >= from)?;
                Some((keys[i], &children[i]))
            }
            Node::Node16 { keys, children, .. } => {
                let i = keys[..children.len()].iter().position(|&k| k >= from)?;
                Some((keys[i], &children[i]))
            }
            Node::Node48 {
                child_index,
                children,
                ..
            } => (from..=u8::MAX).find_map(|b| match child_index[b as usize] {
                EMPTY => None,
                slot => children.get(slot as usize)?.as_deref().map(|c| (b, c)),
            }),
            Node::Node256 { children, .. } => {
                (from..=u8::MAX).find_map(|b| children[b as usize].as_deref().map(|c| (b, c)))
            }
        }
    }

    /// Highest child whose byte is <= `from`.
    pub fn child_at_or_before(&self, from: u8) -> Option<(u8, &Node)> {
        match self {
            Node::Leaf(_) => None,
            Node::Node4 { keys, children, .. } => {
                let i = keys[..children.len()].iter().rposition(|&k| k <= from)?;
                Some((keys[i], &children[i]))
            }
            Node::Node16 { keys, children, .. } => {
                let i = keys[..children.len()].iter().rposition(|&k| k <= from)?;
                Some((keys[i], &children[i]))
            }
            Node::Node48 {
                child_index,
                children,
                ..
            } => (0..=from).rev().find_map(|b| match child_index[b as usize] {
                EMPTY => None,
                slot => children.get(slot as usize)?.as_deref().map(|c| (b, c)),
            }),
            Node::Node256 { children, .. } => (0..=from)
                .rev()
                .find_map(|b| children[b as usize].as_deref().map(|c| (b, c))),
        }
    }

    fn grow(&mut self) {
        let grown = match self {
            Node::Node4 {
                prefix,
                keys,
                children,
            } => {
                let mut wide = [0u8; 16];
                wide[..4].copy_from_slice(&keys[..]);
                Node::Node16 {
                    prefix: mem::take(prefix),
                    keys: wide,
                    children: mem::take(children),
                }
            }

            Node::Node16 {
                prefix,
                keys,
                children,
            } => {
                let mut child_index = Box::new([EMPTY; 256]);
                let mut slots = Vec::with_capacity(48);
                for (i, child) in mem::take(children).into_iter().enumerate() {
                    child_index[keys[i] as usize] = i as u8;
                    slots.push(Some(child));
                }
                Node::Node48 {
                    prefix: mem::take(prefix),
                    len: slots.len() as u8,
                    child_index,
                    children: slots,
                }
            }

            Node::Node48 {
                prefix,
                len,
                child_index,
                children,
            } => {
                let mut direct: Box<[Option<Box<Node>>; 256]> =
                    Box::new(std::array::from_fn(|_| None));
                for (byte, &slot) in child_index.iter().enumerate() {
                    if slot != EMPTY {
                        direct[byte] = children.get_mut(slot as usize).and_then(Option::take);
                    }
                }
                Node::Node256 {
                    prefix: mem::take(prefix),
                    len: *len as u16,
                    children: direct,
                }
            }

            Node::Leaf(_) | Node::Node256 { .. } => return,
        };
        *self = grown;
    }

    fn shrink(&mut self) {
        let shrunk = match self {
            Node::Node16 {
                prefix,
                keys,
                children,
            } if children.len() <= SHRINK_16 => {
                let n = children.len();
                let mut narrow = [0u8; 4];
                narrow[..n].copy_from_slice(&keys[..n]);
                Node::Node4 {
                    prefix: mem::take(prefix),
                    keys: narrow,
                    children: mem::take(children),
                }
            }

            Node::Node48 {
                prefix,
                len,
                child_index,
                children,
            } if (*len as usize) <= SHRINK_48 => {
                let mut keys = [0u8; 16];
                let mut packed = Vec::with_capacity(16);
                for (byte, &slot) in child_index.iter().enumerate() {
                    if slot == EMPTY {
                        continue;
                    }
                    if let Some(child) = children.get_mut(slot as usize).and_then(Option::take) {
                        keys[packed.len()] = byte as u8;
                        packed.push(child);
                    }
                }
                Node::Node16 {
                    prefix: mem::take(prefix),
                    keys,
                    children: packed,
                }
            }

            Node::Node256 {
                prefix,
                len,
                children,
            } if (*len as usize) <= SHRINK_256 => {
                let mut child_index = Box::new([EMPTY; 256]);
                let mut slots = Vec::with_capacity(48);
                for (byte, child) in children.iter_mut().enumerate() {
                    if let Some(child) = child.take() {
                        child_index[byte] = slots.len() as u8;
                        slots.push(Some(child));
                    }
                }
                Node::Node48 {
                    prefix: mem::take(prefix),
                    len: slots.len() as u8,
                    child_index,
                    children: slots,
                }
            }

            _ => return,
        };
        *self = shrunk;
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Leaf(record) => f.debug_tuple("Leaf").field(&record.key).finish(),
            _ => f
                .debug_struct("Inner")
                .field("type", &self.node_type())
                .field("prefix", &String::from_utf8_lossy(self.prefix()))
                .field("num_children", &self.num_children())
                .finish(),
        }
    }
}
