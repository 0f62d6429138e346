use bytemuck::{Pod, Zeroable};
use std::ops::{Index, IndexMut};

use crate::node_allocator::{
    FromSlice, NodeAllocator, NodeAllocatorMap, OrderedNodeAllocatorMap, TreeField as Field,
    ZeroCopy, SENTINEL,
};

pub const ALIGNMENT: u32 = 8;

/// Register alias: color shares the slot the allocator otherwise uses for an
/// out-of-line value pointer, since the RGB tree keeps its payload inline.
pub const COLOR: u32 = Field::Value as u32;

/// An RGB tree of order `N` admits colors `0..=N`. `N = 1` is exactly a
/// red-black tree (color 0 = black, color 1 = red).
#[inline(always)]
fn opposite(dir: u32) -> u32 {
    1 - dir
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
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
    K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
    V: Default + Copy + Clone + Pod + Zeroable,
> {
    pub key: K,
    pub value: V,
}

unsafe impl<
        K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
    > Zeroable for RgbNode<K, V>
{
}
unsafe impl<
        K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
    > Pod for RgbNode<K, V>
{
}

impl<
        K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
    > RgbNode<K, V>
{
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

/// An RGB tree: a BST generalizing the red-black tree to `N + 1` colors
/// (`0..=N`), trading query depth for fewer structural changes per mutation
/// as `N` grows. Keys may repeat; equal keys accrete to the left of an
/// existing match rather than overwriting it.
#[derive(Copy, Clone)]
pub struct RgbTree<
    K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
    V: Default + Copy + Clone + Pod + Zeroable,
    const MAX_SIZE: usize,
    const N: usize,
> {
    pub root: u64,
    _padding: u64,
    allocator: NodeAllocator<RgbNode<K, V>, MAX_SIZE, 4>,
}

unsafe impl<
        K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
        const MAX_SIZE: usize,
        const N: usize,
    > Zeroable for RgbTree<K, V, MAX_SIZE, N>
{
}
unsafe impl<
        K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
        const MAX_SIZE: usize,
        const N: usize,
    > Pod for RgbTree<K, V, MAX_SIZE, N>
{
}

impl<
        K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
        const MAX_SIZE: usize,
        const N: usize,
    > ZeroCopy for RgbTree<K, V, MAX_SIZE, N>
{
}

impl<
        K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
        const MAX_SIZE: usize,
        const N: usize,
    > Default for RgbTree<K, V, MAX_SIZE, N>
{
    fn default() -> Self {
        Self::assert_valid_order();
        Self::assert_proper_alignment();
        RgbTree {
            root: SENTINEL as u64,
            _padding: 0,
            allocator: NodeAllocator::<RgbNode<K, V>, MAX_SIZE, 4>::default(),
        }
    }
}

impl<
        K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
        const MAX_SIZE: usize,
        const N: usize,
    > FromSlice for RgbTree<K, V, MAX_SIZE, N>
{
    fn new_from_slice(slice: &mut [u8]) -> &mut Self {
        Self::assert_valid_order();
        Self::assert_proper_alignment();
        let tree = Self::load_mut_bytes(slice).unwrap();
        tree.initialize();
        tree
    }
}

impl<
        K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
        const MAX_SIZE: usize,
        const N: usize,
    > NodeAllocatorMap<K, V> for RgbTree<K, V, MAX_SIZE, N>
{
    /// Unlike the other maps in this workspace, this never upserts: the RGB
    /// tree permits duplicate keys (they accrete to the left), so inserting
    /// an already-present key always attaches a new node rather than
    /// overwriting the existing one's value.
    fn insert(&mut self, key: K, value: V) -> Option<u32> {
        self._insert(key, value)
    }

    /// Removes the shallowest node matching `key`, if any. With duplicate
    /// keys present this says nothing about *which* equal-keyed record is
    /// removed beyond "the shallowest" — see spec Open Questions.
    fn remove(&mut self, key: &K) -> Option<V> {
        let addr = self.find(key)?;
        self.remove_link(addr)
    }

    fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|addr| &self.get_node(addr).value)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let addr = self.find(key)?;
        Some(&mut self.get_node_mut(addr).value)
    }

    fn size(&self) -> usize {
        self.allocator.size as usize
    }

    fn len(&self) -> usize {
        self.allocator.size as usize
    }

    fn capacity(&self) -> usize {
        MAX_SIZE
    }

    fn iter(&self) -> Box<dyn DoubleEndedIterator<Item = (&K, &V)> + '_> {
        Box::new(self._iter())
    }

    fn iter_mut(&mut self) -> Box<dyn DoubleEndedIterator<Item = (&K, &mut V)> + '_> {
        Box::new(self._iter_mut())
    }
}

impl<
        K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
        const MAX_SIZE: usize,
        const N: usize,
    > OrderedNodeAllocatorMap<K, V> for RgbTree<K, V, MAX_SIZE, N>
{
    fn get_min_index(&mut self) -> u32 {
        match self.first() {
            Some(addr) => addr,
            None => SENTINEL,
        }
    }

    fn get_max_index(&mut self) -> u32 {
        let root = self.root as u32;
        if root == SENTINEL {
            SENTINEL
        } else {
            self.rightmost(root)
        }
    }

    fn get_min(&mut self) -> Option<(K, V)> {
        match self.get_min_index() {
            SENTINEL => None,
            i => {
                let node = self.get_node(i);
                Some((node.key, node.value))
            }
        }
    }

    fn get_max(&mut self) -> Option<(K, V)> {
        match self.get_max_index() {
            SENTINEL => None,
            i => {
                let node = self.get_node(i);
                Some((node.key, node.value))
            }
        }
    }
}

impl<
        K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
        const MAX_SIZE: usize,
        const N: usize,
    > RgbTree<K, V, MAX_SIZE, N>
{
    fn assert_valid_order() {
        assert!(N >= 1, "RGB tree order N must be at least 1");
    }

    fn assert_proper_alignment() {
        assert!(std::mem::size_of::<V>() % std::mem::align_of::<K>() == 0);
        assert!(std::mem::size_of::<RgbNode<K, V>>() % std::mem::align_of::<RgbNode<K, V>>() == 0);
        assert!(std::mem::size_of::<RgbNode<K, V>>() % 8_usize == 0);
    }

    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn initialize(&mut self) {
        self.allocator.initialize();
    }

    pub fn get_node(&self, node: u32) -> &RgbNode<K, V> {
        self.allocator.get(node).get_value()
    }

    pub fn get_node_mut(&mut self, node: u32) -> &mut RgbNode<K, V> {
        self.allocator.get_mut(node).get_value_mut()
    }

    #[inline(always)]
    fn set_color(&mut self, node: u32, color: u32) {
        self.allocator.set_register(node, color, COLOR);
    }

    #[inline(always)]
    pub fn get_color(&self, node: u32) -> u32 {
        self.allocator.get_register(node, COLOR)
    }

    #[inline(always)]
    pub fn is_zero(&self, node: u32) -> bool {
        self.get_color(node) == 0
    }

    #[inline(always)]
    fn get_child(&self, node: u32, dir: u32) -> u32 {
        self.allocator.get_register(node, dir)
    }

    #[inline(always)]
    pub fn get_left(&self, node: u32) -> u32 {
        self.allocator.get_register(node, Field::Left as u32)
    }

    #[inline(always)]
    pub fn get_right(&self, node: u32) -> u32 {
        self.allocator.get_register(node, Field::Right as u32)
    }

    #[inline(always)]
    pub fn get_parent(&self, node: u32) -> u32 {
        self.allocator.get_register(node, Field::Parent as u32)
    }

    #[inline(always)]
    pub fn is_leaf(&self, node: u32) -> bool {
        self.get_left(node) == SENTINEL && self.get_right(node) == SENTINEL
    }

    /// The spec's `dirOf`: the direction under which `child` sits in `parent`.
    #[inline(always)]
    fn child_dir(&self, parent: u32, child: u32) -> u32 {
        if child == self.get_left(parent) {
            Field::Left as u32
        } else if child == self.get_right(parent) {
            Field::Right as u32
        } else {
            panic!("nodes are not connected");
        }
    }

    #[inline(always)]
    fn connect(&mut self, parent: u32, child: u32, dir: u32) {
        self.allocator
            .connect(parent, child, dir, Field::Parent as u32);
    }

    /// The spec's `replaceChild`: reslots `old` for `new` under `parent`, or
    /// rewrites the tree's root pointer when `parent` is absent.
    fn replace_child(&mut self, parent: u32, old: u32, new: u32) {
        if parent == SENTINEL {
            self.root = new as u64;
            self.allocator.set_register(new, SENTINEL, Field::Parent as u32);
        } else {
            let dir = self.child_dir(parent, old);
            self.connect(parent, new, dir);
        }
    }

    /// The spec's `replaceLink`: `subst` adopts `head`'s children, color, and
    /// slot in its former parent.
    fn replace_link(&mut self, head: u32, subst: u32) {
        let left = self.get_left(head);
        let right = self.get_right(head);
        let color = self.get_color(head);
        let parent = self.get_parent(head);
        self.connect(subst, left, Field::Left as u32);
        self.connect(subst, right, Field::Right as u32);
        self.set_color(subst, color);
        self.replace_child(parent, head, subst);
    }

    fn remove_node(&mut self, node: u32) {
        self.allocator.clear_register(node, Field::Parent as u32);
        self.allocator.clear_register(node, COLOR);
        self.allocator.clear_register(node, Field::Left as u32);
        self.allocator.clear_register(node, Field::Right as u32);
        self.allocator.remove_node(node);
    }

    /// A single rotation of `v` in direction `d`. The color swap between `v`
    /// and its replacement is deliberate (spec §4.2): it is what lets the
    /// repair algorithms restore I3 locally without a separate recolor step.
    fn rotate(&mut self, d: u32, v: u32) -> u32 {
        let grandparent = self.get_parent(v);
        let p = self.get_child(v, opposite(d));
        debug_assert!(p != SENTINEL, "rotate requires a non-null pivot child");
        let c = self.get_child(p, d);
        self.connect(v, c, opposite(d));
        self.connect(p, v, d);

        let v_color = self.get_color(v);
        let p_color = self.get_color(p);
        self.set_color(v, p_color);
        self.set_color(p, v_color);

        if grandparent == SENTINEL {
            self.root = p as u64;
            self.allocator.clear_register(p, Field::Parent as u32);
        } else {
            let dir = self.child_dir(grandparent, v);
            self.connect(grandparent, p, dir);
        }
        p
    }

    /// Colors a freshly attached `node` based on `parent`'s color (spec
    /// §4.5). Returns `true` if the chosen color immediately violates I3
    /// (only possible when `parent.color == 1`), in which case the caller
    /// must run `repair_color_violation`.
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

    /// Post-insert repair (spec §4.6). Precondition: `link.color > 0` and
    /// `link.children[d]` shares `link`'s color (the "hot child").
    fn repair_color_violation(&mut self, mut d: u32, mut link: u32) {
        loop {
            let parent = self.get_parent(link);
            if parent == SENTINEL {
                // Violation at the root: promote to a fresh base level.
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
                // The violation moved up to `parent`.
                let grandparent = self.get_parent(parent);
                if grandparent == SENTINEL {
                    link = parent;
                    continue;
                }
                d = self.child_dir(grandparent, parent);
                link = parent;
            } else {
                // Case C: push-down. `parent` must be color 0 here, since I3
                // under a non-zero parent would have forced `sibling` below
                // `link`'s maximal color, making Case A available instead.
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

    fn _insert(&mut self, key: K, value: V) -> Option<u32> {
        let new_node = RgbNode::<K, V>::new(key, value);
        if self.root as u32 == SENTINEL {
            let node_index = self.allocator.add_node(new_node);
            self.set_color(node_index, 0);
            self.root = node_index as u64;
            return Some(node_index);
        }
        let mut reference_node = self.root as u32;
        loop {
            let ref_key = self.get_node(reference_node).key;
            // Equal keys accrete to the left of an existing match.
            let dir = if key <= ref_key {
                Field::Left as u32
            } else {
                Field::Right as u32
            };
            let target = self.get_child(reference_node, dir);
            if target == SENTINEL {
                if self.size() >= MAX_SIZE - 1 {
                    return None;
                }
                let node_index = self.allocator.add_node(new_node);
                self.connect(reference_node, node_index, dir);
                let needs_repair = self.set_color_from_parent(node_index, reference_node);
                if needs_repair {
                    self.repair_color_violation(dir, reference_node);
                }
                return Some(node_index);
            }
            reference_node = target;
        }
    }

    /// Post-remove repair (spec §4.8). Called on `(link, d)` meaning the
    /// path through `link.children[d]` has one fewer zero-colored node than
    /// the path through `link.children[opposite(d)]`.
    fn repair_zero_imbalance(&mut self, mut link: u32, mut d: u32) {
        loop {
            let shrunk = self.get_child(link, d);
            if shrunk != SENTINEL && self.get_color(shrunk) != 0 {
                self.set_color(shrunk, 0);
                return;
            }

            let other = self.get_child(link, opposite(d));
            debug_assert!(
                other != SENTINEL,
                "zero-imbalance repair invoked with no node on the long side"
            );

            if self.get_color(other) == 0 {
                let outer = self.get_child(other, opposite(d));
                let inner = self.get_child(other, d);
                let outer_allowed = outer == SENTINEL || self.get_color(outer) < N as u32;
                let inner_allowed = inner == SENTINEL || self.get_color(inner) < N as u32;

                if outer_allowed && inner_allowed {
                    // Z1
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
                    // Z2
                    self.set_color(outer, 0);
                    self.rotate(d, link);
                    return;
                } else {
                    // Z3
                    self.set_color(inner, 0);
                    self.rotate(opposite(d), other);
                    self.rotate(d, link);
                    return;
                }
            } else {
                // Z4
                self.rotate(d, link);
                // `link` keeps the same identity; its new sibling on `d`'s
                // opposite side is shallower, strictly decreasing the color
                // ceiling on the problematic side, so this terminates.
            }
        }
    }

    /// Detaches `link` (the spec's `remove(link)`), which must currently be
    /// in the tree. Detaching an address not in the tree is a precondition
    /// violation.
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

    /// Detaches and returns the value at a specific node address. This is
    /// the spec's `remove(link)` primitive: unlike `NodeAllocatorMap::remove`
    /// (which goes by key and only ever hits the shallowest match), this
    /// lets a caller holding a specific duplicate's address remove exactly
    /// that one. `link` must currently be a live node in this tree.
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
            let succ = self.leftmost(right);
            if succ == right {
                // `succ` is `link`'s immediate right child; it keeps its own
                // right subtree, it just gains `link`'s left subtree, color,
                // and slot. Its old color is being discarded, so if it was
                // zero, its (unchanged) right subtree lost a zero-node.
                let succ_old_color = self.get_color(succ);
                let link_color = self.get_color(link);
                let link_parent = self.get_parent(link);
                self.connect(succ, left, Field::Left as u32);
                self.set_color(succ, link_color);
                self.replace_child(link_parent, link, succ);
                if succ_old_color == 0 {
                    self.repair_zero_imbalance(succ, Field::Right as u32);
                }
            } else {
                // `succ` has no left child by construction; splice it out of
                // its own position first (may repair rooted at its former
                // parent), then transplant it into `link`'s position,
                // inheriting `link`'s color and both children.
                let succ_right = self.get_right(succ);
                self.splice_and_repair(succ, succ_right);
                self.replace_link(link, succ);
            }
        }
        self.remove_node(link);
        Some(value)
    }

    pub fn find(&self, key: &K) -> Option<u32> {
        let mut node = self.root as u32;
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

    fn leftmost(&self, node: u32) -> u32 {
        let mut n = node;
        while self.get_left(n) != SENTINEL {
            n = self.get_left(n);
        }
        n
    }

    fn rightmost(&self, node: u32) -> u32 {
        let mut n = node;
        while self.get_right(n) != SENTINEL {
            n = self.get_right(n);
        }
        n
    }

    pub fn first(&self) -> Option<u32> {
        let root = self.root as u32;
        if root == SENTINEL {
            None
        } else {
            Some(self.leftmost(root))
        }
    }

    pub fn last(&self) -> Option<u32> {
        let root = self.root as u32;
        if root == SENTINEL {
            None
        } else {
            Some(self.rightmost(root))
        }
    }

    pub fn next(&self, node: u32) -> Option<u32> {
        let right = self.get_right(node);
        if right != SENTINEL {
            return Some(self.leftmost(right));
        }
        let mut child = node;
        let mut parent = self.get_parent(child);
        while parent != SENTINEL && self.get_right(parent) == child {
            child = parent;
            parent = self.get_parent(parent);
        }
        if parent == SENTINEL {
            None
        } else {
            Some(parent)
        }
    }

    pub fn prev(&self, node: u32) -> Option<u32> {
        let left = self.get_left(node);
        if left != SENTINEL {
            return Some(self.rightmost(left));
        }
        let mut child = node;
        let mut parent = self.get_parent(child);
        while parent != SENTINEL && self.get_left(parent) == child {
            child = parent;
            parent = self.get_parent(parent);
        }
        if parent == SENTINEL {
            None
        } else {
            Some(parent)
        }
    }

    /// Checks I1–I4 over the whole tree. Returns the first invariant
    /// violation encountered, if any.
    pub fn validate(&self) -> Result<(), RgbTreeError> {
        self.validate_subtree(self.root as u32).map(|_| ())
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

    fn _iter(&self) -> RgbTreeIterator<'_, K, V, MAX_SIZE, N> {
        RgbTreeIterator {
            tree: self,
            stack: vec![],
            rev_stack: vec![],
            node: self.root as u32,
        }
    }

    fn _iter_mut(&mut self) -> RgbTreeIteratorMut<'_, K, V, MAX_SIZE, N> {
        let node = self.root as u32;
        RgbTreeIteratorMut {
            tree: self,
            stack: vec![],
            rev_stack: vec![],
            node,
        }
    }
}

impl<
        'a,
        K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
        const MAX_SIZE: usize,
        const N: usize,
    > IntoIterator for &'a RgbTree<K, V, MAX_SIZE, N>
{
    type Item = (&'a K, &'a V);
    type IntoIter = RgbTreeIterator<'a, K, V, MAX_SIZE, N>;
    fn into_iter(self) -> Self::IntoIter {
        self._iter()
    }
}

impl<
        'a,
        K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
        const MAX_SIZE: usize,
        const N: usize,
    > IntoIterator for &'a mut RgbTree<K, V, MAX_SIZE, N>
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = RgbTreeIteratorMut<'a, K, V, MAX_SIZE, N>;
    fn into_iter(self) -> Self::IntoIter {
        self._iter_mut()
    }
}

pub struct RgbTreeIterator<
    'a,
    K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
    V: Default + Copy + Clone + Pod + Zeroable,
    const MAX_SIZE: usize,
    const N: usize,
> {
    tree: &'a RgbTree<K, V, MAX_SIZE, N>,
    stack: Vec<u32>,
    rev_stack: Vec<u32>,
    node: u32,
}

impl<
        'a,
        K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
        const MAX_SIZE: usize,
        const N: usize,
    > Iterator for RgbTreeIterator<'a, K, V, MAX_SIZE, N>
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while !self.stack.is_empty() || self.node != SENTINEL {
            if self.node != SENTINEL {
                self.stack.push(self.node);
                self.node = self.tree.get_left(self.node);
            } else {
                self.node = self.stack.pop().unwrap();
                let node = self.tree.get_node(self.node);
                self.node = self.tree.get_right(self.node);
                return Some((&node.key, &node.value));
            }
        }
        None
    }
}

impl<
        'a,
        K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
        const MAX_SIZE: usize,
        const N: usize,
    > DoubleEndedIterator for RgbTreeIterator<'a, K, V, MAX_SIZE, N>
{
    fn next_back(&mut self) -> Option<Self::Item> {
        while !self.rev_stack.is_empty() || self.node != SENTINEL {
            if self.node != SENTINEL {
                self.rev_stack.push(self.node);
                self.node = self.tree.get_right(self.node);
            } else {
                self.node = self.rev_stack.pop().unwrap();
                let node = self.tree.get_node(self.node);
                self.node = self.tree.get_left(self.node);
                return Some((&node.key, &node.value));
            }
        }
        None
    }
}

pub struct RgbTreeIteratorMut<
    'a,
    K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
    V: Default + Copy + Clone + Pod + Zeroable,
    const MAX_SIZE: usize,
    const N: usize,
> {
    tree: &'a mut RgbTree<K, V, MAX_SIZE, N>,
    stack: Vec<u32>,
    rev_stack: Vec<u32>,
    node: u32,
}

impl<
        'a,
        K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
        const MAX_SIZE: usize,
        const N: usize,
    > Iterator for RgbTreeIteratorMut<'a, K, V, MAX_SIZE, N>
{
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        while !self.stack.is_empty() || self.node != SENTINEL {
            if self.node != SENTINEL {
                self.stack.push(self.node);
                self.node = self.tree.get_left(self.node);
            } else {
                self.node = self.stack.pop().unwrap();
                let ptr = self.node;
                self.node = self.tree.get_right(ptr);
                // SAFETY: each yielded index is visited exactly once across
                // the lifetime of the iterator, so the mutable borrows
                // handed out here never alias.
                unsafe {
                    let node = (*self.tree.allocator.nodes.as_mut_ptr().add(ptr as usize))
                        .get_value_mut();
                    return Some((&node.key, &mut node.value));
                }
            }
        }
        None
    }
}

impl<
        'a,
        K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
        const MAX_SIZE: usize,
        const N: usize,
    > DoubleEndedIterator for RgbTreeIteratorMut<'a, K, V, MAX_SIZE, N>
{
    fn next_back(&mut self) -> Option<Self::Item> {
        while !self.rev_stack.is_empty() || self.node != SENTINEL {
            if self.node != SENTINEL {
                self.rev_stack.push(self.node);
                self.node = self.tree.get_right(self.node);
            } else {
                self.node = self.rev_stack.pop().unwrap();
                let ptr = self.node;
                self.node = self.tree.get_left(ptr);
                // SAFETY: see `next` above.
                unsafe {
                    let node = (*self.tree.allocator.nodes.as_mut_ptr().add(ptr as usize))
                        .get_value_mut();
                    return Some((&node.key, &mut node.value));
                }
            }
        }
        None
    }
}

impl<
        K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
        const MAX_SIZE: usize,
        const N: usize,
    > Index<&K> for RgbTree<K, V, MAX_SIZE, N>
{
    type Output = V;

    fn index(&self, index: &K) -> &Self::Output {
        self.get(index).unwrap()
    }
}

impl<
        K: PartialOrd + Ord + Copy + Clone + Default + Pod + Zeroable,
        V: Default + Copy + Clone + Pod + Zeroable,
        const MAX_SIZE: usize,
        const N: usize,
    > IndexMut<&K> for RgbTree<K, V, MAX_SIZE, N>
{
    fn index_mut(&mut self, index: &K) -> &mut Self::Output {
        self.get_mut(index).unwrap()
    }
}
