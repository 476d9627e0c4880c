//! Order-statistic treap
//!
//! An arena-allocated randomized treap where every node tracks the size of
//! its subtree. Rank, select and positional range walks are O(log n)
//! expected; no operation scans the tree linearly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::{Ordering, Reverse};

use crate::types::{MemberId, Score};

/// Sort key: score descending, then member id ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SortKey {
    score: Reverse<Score>,
    id: MemberId,
}

impl SortKey {
    pub fn new(id: MemberId, score: Score) -> Self {
        Self {
            score: Reverse(score),
            id,
        }
    }

    pub fn id(&self) -> MemberId {
        self.id
    }

    pub fn score(&self) -> Score {
        self.score.0
    }
}

type Link = Option<usize>;

#[derive(Debug, Clone)]
struct Node {
    key: SortKey,
    priority: u64,
    size: usize,
    left: Link,
    right: Link,
}

/// Ordered multiset-free container of [`SortKey`]s with positional access.
#[derive(Debug)]
pub struct OrderStatTree {
    nodes: Vec<Node>,
    free: Vec<usize>,
    root: Link,
    rng: StdRng,
}

impl OrderStatTree {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic priorities, for reproducible tests
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.size(self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
    }

    /// Insert `key`. Returns `false` if it was already present.
    pub fn insert(&mut self, key: SortKey) -> bool {
        if self.rank(&key).is_some() {
            return false;
        }
        let node = self.alloc(key);
        let (left, right) = self.split(self.root, &key, false);
        let merged = self.merge(left, Some(node));
        self.root = self.merge(merged, right);
        true
    }

    /// Remove `key`. Returns `false` if it was not present.
    pub fn remove(&mut self, key: &SortKey) -> bool {
        let (left, rest) = self.split(self.root, key, false);
        let (found, right) = self.split(rest, key, true);
        self.root = self.merge(left, right);
        match found {
            Some(index) => {
                self.free.push(index);
                true
            }
            None => false,
        }
    }

    /// 0-based position of `key` in sorted order
    pub fn rank(&self, key: &SortKey) -> Option<usize> {
        let mut position = 0;
        let mut cursor = self.root;
        while let Some(index) = cursor {
            let node = &self.nodes[index];
            match key.cmp(&node.key) {
                Ordering::Less => cursor = node.left,
                Ordering::Equal => return Some(position + self.size(node.left)),
                Ordering::Greater => {
                    position += self.size(node.left) + 1;
                    cursor = node.right;
                }
            }
        }
        None
    }

    /// Key at 0-based position `k`
    pub fn select(&self, k: usize) -> Option<SortKey> {
        let mut k = k;
        let mut cursor = self.root;
        while let Some(index) = cursor {
            let node = &self.nodes[index];
            let left = self.size(node.left);
            match k.cmp(&left) {
                Ordering::Less => cursor = node.left,
                Ordering::Equal => return Some(node.key),
                Ordering::Greater => {
                    k -= left + 1;
                    cursor = node.right;
                }
            }
        }
        None
    }

    /// In-order iterator starting at 0-based position `k`
    pub fn iter_from(&self, k: usize) -> Iter<'_> {
        let mut stack = Vec::new();
        let mut k = k;
        let mut cursor = self.root;
        while let Some(index) = cursor {
            let node = &self.nodes[index];
            let left = self.size(node.left);
            match k.cmp(&left) {
                Ordering::Less => {
                    stack.push(index);
                    cursor = node.left;
                }
                Ordering::Equal => {
                    stack.push(index);
                    break;
                }
                Ordering::Greater => {
                    k -= left + 1;
                    cursor = node.right;
                }
            }
        }
        Iter { tree: self, stack }
    }

    fn size(&self, link: Link) -> usize {
        link.map_or(0, |index| self.nodes[index].size)
    }

    fn update(&mut self, index: usize) {
        let node = &self.nodes[index];
        let size = 1 + self.size(node.left) + self.size(node.right);
        self.nodes[index].size = size;
    }

    fn alloc(&mut self, key: SortKey) -> usize {
        let node = Node {
            key,
            priority: self.rng.gen(),
            size: 1,
            left: None,
            right: None,
        };
        match self.free.pop() {
            Some(index) => {
                self.nodes[index] = node;
                index
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Split into (< key, >= key), or (<= key, > key) when `inclusive`.
    fn split(&mut self, link: Link, key: &SortKey, inclusive: bool) -> (Link, Link) {
        let Some(index) = link else {
            return (None, None);
        };
        let node_key = self.nodes[index].key;
        let goes_left = node_key < *key || (inclusive && node_key == *key);
        if goes_left {
            let (left, right) = self.split(self.nodes[index].right, key, inclusive);
            self.nodes[index].right = left;
            self.update(index);
            (Some(index), right)
        } else {
            let (left, right) = self.split(self.nodes[index].left, key, inclusive);
            self.nodes[index].left = right;
            self.update(index);
            (left, Some(index))
        }
    }

    /// Merge two treaps where every key in `left` sorts before every key in `right`.
    fn merge(&mut self, left: Link, right: Link) -> Link {
        match (left, right) {
            (None, other) | (other, None) => other,
            (Some(l), Some(r)) => {
                if self.nodes[l].priority > self.nodes[r].priority {
                    let merged = self.merge(self.nodes[l].right, Some(r));
                    self.nodes[l].right = merged;
                    self.update(l);
                    Some(l)
                } else {
                    let merged = self.merge(Some(l), self.nodes[r].left);
                    self.nodes[r].left = merged;
                    self.update(r);
                    Some(r)
                }
            }
        }
    }
}

impl Default for OrderStatTree {
    fn default() -> Self {
        Self::new()
    }
}

/// In-order walk; each step is amortized O(1)
pub struct Iter<'a> {
    tree: &'a OrderStatTree,
    stack: Vec<usize>,
}

impl Iterator for Iter<'_> {
    type Item = SortKey;

    fn next(&mut self) -> Option<SortKey> {
        let index = self.stack.pop()?;
        let node = &self.tree.nodes[index];
        let mut cursor = node.right;
        while let Some(child) = cursor {
            self.stack.push(child);
            cursor = self.tree.nodes[child].left;
        }
        Some(node.key)
    }
}
