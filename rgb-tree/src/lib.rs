use bytemuck::{Pod, Zeroable};
use node_allocator::{NodeAllocator, ZeroCopy, SENTINEL};
use std::ops::{Index, IndexMut};

// Register aliases
pub const LEFT: u32 = 0;
pub const RIGHT: u32 = 1;
pub const PARENT: u32 = 2;
pub const COLOR: u32 = 3;

#[inline(always)]
fn opposite(dir: u32) -> u32 {
    1 - dir
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RgbTreeError {
    #[error("a child's parent link does not point back to its actual parent")]
    InvalidParent,
    #[error("a non-zero node has a child whose color is not strictly smaller")]
    InvalidDecrease,
    #[error("a subtree violates binary-search-tree key ordering")]
    InvalidOrder,
    #[error("the two subtrees of a node disagree on zero-height")]
    InvalidBalance,
}

#[repr(C)]
#[derive(Default, Copy, Clone)]
pub struct RgbNode<
    K: PartialOrd + Copy + Clone + Default + Pod + Zeroable,
    V: Default + Copy + Clone + Pod + Zeroable,
> {
    pub key: K,
    pub value: V,
}

unsafe impl<
        K: PartialOrd + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
    > Zeroable for RgbNode<K, V>
{
}
unsafe impl<
        K: PartialOrd + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
    > Pod for RgbNode<K, V>
{
}

impl<
        K: PartialOrd + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
    > RgbNode<K, V>
{
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

/// Leaner standalone companion to the workspace's `rgb_tree` module: no
/// iterators, no `pretty_print`, raw register constants instead of an enum.
/// `N` is the tree's order; colors range over `0..=N` and `N = 1` recovers
/// a classic red-black tree.
#[derive(Copy, Clone)]
pub struct RgbTree<
    const MAX_SIZE: usize,
    const N: usize,
    K: PartialOrd + Copy + Clone + Default + Pod + Zeroable,
    V: Default + Copy + Clone + Pod + Zeroable,
> {
    pub sequence_number: u64,
    pub root: u32,
    pub allocator: NodeAllocator<MAX_SIZE, 4, RgbNode<K, V>>,
}

unsafe impl<
        const MAX_SIZE: usize,
        const N: usize,
        K: PartialOrd + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
    > Zeroable for RgbTree<MAX_SIZE, N, K, V>
{
}
unsafe impl<
        const MAX_SIZE: usize,
        const N: usize,
        K: PartialOrd + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
    > Pod for RgbTree<MAX_SIZE, N, K, V>
{
}

impl<
        const MAX_SIZE: usize,
        const N: usize,
        K: PartialOrd + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
    > ZeroCopy for RgbTree<MAX_SIZE, N, K, V>
{
}

impl<
        const MAX_SIZE: usize,
        const N: usize,
        K: PartialOrd + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
    > Default for RgbTree<MAX_SIZE, N, K, V>
{
    fn default() -> Self {
        assert!(N >= 1, "RGB tree order N must be at least 1");
        RgbTree {
            sequence_number: 0,
            root: SENTINEL,
            allocator: NodeAllocator::<MAX_SIZE, 4, RgbNode<K, V>>::default(),
        }
    }
}

impl<
        const MAX_SIZE: usize,
        const N: usize,
        K: PartialOrd + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
    > RgbTree<MAX_SIZE, N, K, V>
{
    pub fn size(&self) -> usize {
        self.allocator.size as usize
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_from_slice(slice: &mut [u8]) -> &mut Self {
        assert!(N >= 1, "RGB tree order N must be at least 1");
        let tree = Self::load_mut_bytes(slice).unwrap();
        tree.allocator.init_default();
        tree
    }

    pub fn get_node(&self, node: u32) -> &RgbNode<K, V> {
        self.allocator.get(node).get_value()
    }

    fn get_node_mut(&mut self, node: u32) -> &mut RgbNode<K, V> {
        self.allocator.get_mut(node).get_value_mut()
    }

    #[inline(always)]
    fn set_color(&mut self, node: u32, color: u32) {
        if node != SENTINEL {
            self.allocator.set_register(node, color, COLOR);
        }
    }

    #[inline(always)]
    pub fn get_color(&self, node: u32) -> u32 {
        self.allocator.get_register(node, COLOR)
    }

    #[inline(always)]
    fn get_child(&self, node: u32, dir: u32) -> u32 {
        self.allocator.get_register(node, dir)
    }

    #[inline(always)]
    pub fn is_leaf(&self, node: u32) -> bool {
        self.get_left(node) == SENTINEL && self.get_right(node) == SENTINEL
    }

    #[inline(always)]
    pub fn get_left(&self, node: u32) -> u32 {
        self.allocator.get_register(node, LEFT)
    }

    #[inline(always)]
    pub fn get_right(&self, node: u32) -> u32 {
        self.allocator.get_register(node, RIGHT)
    }

    #[inline(always)]
    pub fn get_parent(&self, node: u32) -> u32 {
        self.allocator.get_register(node, PARENT)
    }

    #[inline(always)]
    fn child_dir(&self, parent: u32, child: u32) -> u32 {
        let left = self.get_left(parent);
        let right = self.get_right(parent);
        if child == left {
            assert!(self.get_parent(child) == parent);
            LEFT
        } else if child == right {
            assert!(self.get_parent(child) == parent);
            RIGHT
        } else {
            panic!("Nodes are not connected");
        }
    }

    fn replace_child(&mut self, parent: u32, old: u32, new: u32) {
        if parent == SENTINEL {
            self.root = new;
            self.allocator.set_register(new, SENTINEL, PARENT);
        } else {
            let dir = self.child_dir(parent, old);
            self.allocator.connect(parent, new, dir, PARENT);
        }
    }

    /// Rotation with a color swap between the rotated node and its
    /// replacement, so the repair loops can restore the color invariants
    /// without a separate recolor pass.
    fn rotate(&mut self, dir: u32, v: u32) -> u32 {
        let grandparent = self.get_parent(v);
        let p = self.get_child(v, opposite(dir));
        let c = self.get_child(p, dir);
        self.allocator.connect(v, c, opposite(dir), PARENT);
        self.allocator.connect(p, v, dir, PARENT);

        let v_color = self.get_color(v);
        let p_color = self.get_color(p);
        self.set_color(v, p_color);
        self.set_color(p, v_color);

        if grandparent == SENTINEL {
            self.root = p;
            self.allocator.clear_register(p, PARENT);
        } else {
            let gdir = self.child_dir(grandparent, v);
            self.allocator.connect(grandparent, p, gdir, PARENT);
        }
        p
    }

    fn set_color_from_parent(&mut self, node: u32, parent: u32) -> bool {
        let parent_color = self.get_color(parent);
        if parent_color == 0 {
            self.set_color(node, N as u32);
            false
        } else if parent_color == 1 {
            self.set_color(node, 1);
            true
        } else {
            self.set_color(node, parent_color - 1);
            false
        }
    }

    fn repair_color_violation(&mut self, mut d: u32, mut link: u32) {
        loop {
            let parent = self.get_parent(link);
            if parent == SENTINEL {
                self.set_color(link, 0);
                return;
            }
            let ld = self.child_dir(parent, link);
            let sibling = self.get_child(parent, opposite(ld));
            let can_rotate = sibling == SENTINEL || self.get_color(sibling) < self.get_color(link);

            if can_rotate {
                if ld == d {
                    self.rotate(opposite(ld), parent);
                } else {
                    self.rotate(opposite(d), link);
                    self.rotate(opposite(ld), parent);
                }
                return;
            }

            let link_color = self.get_color(link);
            if link_color < N as u32 {
                self.set_color(link, link_color + 1);
                if self.get_color(link) != self.get_color(parent) {
                    return;
                }
                let grandparent = self.get_parent(parent);
                if grandparent == SENTINEL {
                    link = parent;
                    continue;
                }
                d = self.child_dir(grandparent, parent);
                link = parent;
            } else {
                self.set_color(link, 0);
                self.set_color(sibling, 0);
                let grandparent = self.get_parent(parent);
                if grandparent == SENTINEL {
                    self.set_color(parent, 0);
                    return;
                }
                let pd = self.child_dir(grandparent, parent);
                let needs_repair = self.set_color_from_parent(parent, grandparent);
                if !needs_repair {
                    return;
                }
                d = pd;
                link = parent;
            }
        }
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<u32> {
        let new_node = RgbNode::<K, V>::new(key, value);
        if self.root == SENTINEL {
            self.sequence_number += 1;
            let node_index = self.allocator.add_node(new_node);
            self.set_color(node_index, 0);
            self.root = node_index;
            return Some(node_index);
        }
        let mut reference_node = self.root;
        loop {
            let ref_key = self.allocator.get(reference_node).get_value().key;
            let dir = if key <= ref_key { LEFT } else { RIGHT };
            let target = self.get_child(reference_node, dir);
            if target == SENTINEL {
                if self.size() >= MAX_SIZE - 1 {
                    return None;
                }
                self.sequence_number += 1;
                let node_index = self.allocator.add_node(new_node);
                self.allocator.connect(reference_node, node_index, dir, PARENT);
                let needs_repair = self.set_color_from_parent(node_index, reference_node);
                if needs_repair {
                    self.repair_color_violation(dir, reference_node);
                }
                return Some(node_index);
            }
            reference_node = target;
        }
    }

    fn repair_zero_imbalance(&mut self, mut link: u32, mut d: u32) {
        loop {
            let shrunk = self.get_child(link, d);
            if shrunk != SENTINEL && self.get_color(shrunk) != 0 {
                self.set_color(shrunk, 0);
                return;
            }

            let other = self.get_child(link, opposite(d));
            if self.get_color(other) == 0 {
                let outer = self.get_child(other, opposite(d));
                let inner = self.get_child(other, d);
                let outer_allowed = outer == SENTINEL || self.get_color(outer) < N as u32;
                let inner_allowed = inner == SENTINEL || self.get_color(inner) < N as u32;

                if outer_allowed && inner_allowed {
                    self.set_color(other, N as u32);
                    if self.get_color(link) > 0 {
                        self.set_color(link, 0);
                        return;
                    }
                    let parent = self.get_parent(link);
                    if parent == SENTINEL {
                        return;
                    }
                    let nd = self.child_dir(parent, link);
                    link = parent;
                    d = nd;
                } else if !outer_allowed {
                    self.set_color(outer, 0);
                    self.rotate(d, link);
                    return;
                } else {
                    self.set_color(inner, 0);
                    self.rotate(opposite(d), other);
                    self.rotate(d, link);
                    return;
                }
            } else {
                self.rotate(d, link);
            }
        }
    }

    fn splice_and_repair(&mut self, link: u32, replacement: u32) {
        let parent = self.get_parent(link);
        let color = self.get_color(link);
        let dir = if parent != SENTINEL {
            self.child_dir(parent, link)
        } else {
            0
        };
        self.replace_child(parent, link, replacement);
        if parent != SENTINEL && color == 0 {
            self.repair_zero_imbalance(parent, dir);
        }
    }

    fn remove_node(&mut self, node: u32) {
        self.allocator.clear_register(node, PARENT);
        self.allocator.clear_register(node, COLOR);
        self.allocator.clear_register(node, LEFT);
        self.allocator.clear_register(node, RIGHT);
        self.allocator.remove_node(node);
    }

    /// Detaches and returns the value of a specific node address.
    pub fn remove_link(&mut self, link: u32) -> Option<V> {
        if link == SENTINEL {
            return None;
        }
        let value = self.get_node(link).value;
        let left = self.get_left(link);
        let right = self.get_right(link);

        if left == SENTINEL {
            self.splice_and_repair(link, right);
        } else if right == SENTINEL {
            self.splice_and_repair(link, left);
        } else {
            let succ = self.find_min(right);
            if succ == right {
                let succ_old_color = self.get_color(succ);
                let link_color = self.get_color(link);
                let link_parent = self.get_parent(link);
                self.allocator.connect(succ, left, LEFT, PARENT);
                self.set_color(succ, link_color);
                self.replace_child(link_parent, link, succ);
                if succ_old_color == 0 {
                    self.repair_zero_imbalance(succ, RIGHT);
                }
            } else {
                let succ_right = self.get_right(succ);
                self.splice_and_repair(succ, succ_right);
                let left = self.get_left(link);
                let right = self.get_right(link);
                let color = self.get_color(link);
                let parent = self.get_parent(link);
                self.allocator.connect(succ, left, LEFT, PARENT);
                self.allocator.connect(succ, right, RIGHT, PARENT);
                self.set_color(succ, color);
                self.replace_child(parent, link, succ);
            }
        }
        self.sequence_number += 1;
        self.remove_node(link);
        Some(value)
    }

    /// Removes the shallowest node matching `key`, if present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let addr = self.find(key)?;
        self.remove_link(addr)
    }

    pub fn find(&self, key: &K) -> Option<u32> {
        let mut node = self.root;
        while node != SENTINEL {
            let node_key = self.get_node(node).key;
            if *key == node_key {
                return Some(node);
            } else if *key < node_key {
                node = self.get_left(node);
            } else {
                node = self.get_right(node);
            }
        }
        None
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|addr| &self.get_node(addr).value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let addr = self.find(key)?;
        Some(&mut self.get_node_mut(addr).value)
    }

    pub fn find_min(&self, index: u32) -> u32 {
        let mut node = index;
        while self.get_left(node) != SENTINEL {
            node = self.get_left(node);
        }
        node
    }

    pub fn find_max(&self, index: u32) -> u32 {
        let mut node = index;
        while self.get_right(node) != SENTINEL {
            node = self.get_right(node);
        }
        node
    }

    pub fn inorder_traversal(&self) -> Vec<(K, V)> {
        let mut stack = vec![];
        let mut curr = self.root;
        let mut nodes = vec![];
        while !stack.is_empty() || curr != SENTINEL {
            if curr != SENTINEL {
                stack.push(curr);
                curr = self.get_left(curr);
            } else {
                curr = stack.pop().unwrap();
                let node = self.get_node(curr);
                nodes.push((node.key, node.value));
                curr = self.get_right(curr);
            }
        }
        nodes
    }

    /// Checks I1-I4 over the whole tree.
    pub fn validate(&self) -> Result<(), RgbTreeError> {
        self.validate_subtree(self.root).map(|_| ())
    }

    fn validate_subtree(&self, node: u32) -> Result<u32, RgbTreeError> {
        if node == SENTINEL {
            return Ok(0);
        }
        let color = self.get_color(node);
        let left = self.get_left(node);
        let right = self.get_right(node);

        if left != SENTINEL && self.get_parent(left) != node {
            return Err(RgbTreeError::InvalidParent);
        }
        if right != SENTINEL && self.get_parent(right) != node {
            return Err(RgbTreeError::InvalidParent);
        }

        if color > 0 {
            if left != SENTINEL && self.get_color(left) >= color {
                return Err(RgbTreeError::InvalidDecrease);
            }
            if right != SENTINEL && self.get_color(right) >= color {
                return Err(RgbTreeError::InvalidDecrease);
            }
        }

        let key = self.get_node(node).key;
        if left != SENTINEL && self.get_node(left).key > key {
            return Err(RgbTreeError::InvalidOrder);
        }
        if right != SENTINEL && self.get_node(right).key < key {
            return Err(RgbTreeError::InvalidOrder);
        }

        let left_height = self.validate_subtree(left)?;
        let right_height = self.validate_subtree(right)?;
        if left_height != right_height {
            return Err(RgbTreeError::InvalidBalance);
        }
        Ok(left_height + (color == 0) as u32)
    }
}

impl<
        const MAX_SIZE: usize,
        const N: usize,
        K: PartialOrd + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
    > Index<&K> for RgbTree<MAX_SIZE, N, K, V>
{
    type Output = V;

    fn index(&self, index: &K) -> &Self::Output {
        self.get(index).unwrap()
    }
}

impl<
        const MAX_SIZE: usize,
        const N: usize,
        K: PartialOrd + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
    > IndexMut<&K> for RgbTree<MAX_SIZE, N, K, V>
{
    fn index_mut(&mut self, index: &K) -> &mut Self::Output {
        self.get_mut(index).unwrap()
    }
}
