use std::{
    borrow::Borrow,
    cmp::{Ord, Ordering},
    fmt,
    ops::{Deref, DerefMut},
};

use log::{debug, warn};

use crate::depth::Depth;
use crate::error::Error;

// Initial capacity of the iterator's path stack, tree height rarely
// goes beyond this for in-memory sizes.
const ITER_PATH_CAPACITY: usize = 64;

/// Llrb manage a single instance of in-memory ordered map using
/// [left-leaning-red-black][llrb] tree.
///
/// [llrb]: https://en.wikipedia.org/wiki/Left-leaning_red-black_tree
#[derive(Clone)]
pub struct Llrb<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    name: String,
    root: Option<Box<Node<K, V>>>,
    n_count: usize, // number of entries in the tree.
}

impl<K, V> Default for Llrb<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    fn default() -> Self {
        Llrb::new("")
    }
}

/// Different ways to construct a new Llrb instance.
impl<K, V> Llrb<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Create an empty instance of Llrb, identified by `name`.
    /// Applications can choose unique names.
    pub fn new<S>(name: S) -> Llrb<K, V>
    where
        S: AsRef<str>,
    {
        Llrb {
            name: name.as_ref().to_string(),
            root: Default::default(),
            n_count: Default::default(),
        }
    }

    /// Create a new instance of Llrb tree and load it with entries
    /// from `iter`, in iteration order. Keys must be unique, a
    /// repeated key fails the load with [`Error::DuplicateKey`].
    pub fn load_from<S, I>(name: S, iter: I) -> Result<Llrb<K, V>, Error<K>>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut llrb = Llrb::new(name);
        for (key, value) in iter {
            llrb.insert(key, value)?;
        }
        debug!("{}: loaded {} entries", llrb.name, llrb.n_count);
        Ok(llrb)
    }
}

/// Maintenance API.
impl<K, V> Llrb<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Identify this instance. Applications can choose unique names while
    /// creating Llrb instances.
    #[inline]
    pub fn id(&self) -> String {
        self.name.clone()
    }

    /// Return number of entries in this instance.
    #[inline]
    pub fn len(&self) -> usize {
        self.n_count
    }

    /// Check whether this index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_count == 0
    }
}

type Insert<K, V> = (Box<Node<K, V>>, Option<Error<K>>);

type Delete<K, V> = (Option<Box<Node<K, V>>>, Option<V>);

type Delmin<K, V> = (Option<Box<Node<K, V>>>, Option<Box<Node<K, V>>>);

/// Write operations on Llrb instance.
impl<K, V> Llrb<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Insert a new {key, value} entry in the index. If key is already
    /// present return [`Error::DuplicateKey`] and leave the index as is.
    /// There is no overwrite, to replace an entry delete it first.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), Error<K>> {
        let (mut root, error) = Llrb::do_insert(self.root.take(), key, value);
        root.set_black();
        self.root = Some(root);
        match error {
            Some(err) => Err(err),
            None => {
                self.n_count += 1;
                Ok(())
            }
        }
    }

    /// Delete key from this instance and return its value. If key is
    /// not present return [`Error::KeyNotFound`] and leave the index
    /// as is.
    pub fn delete<Q>(&mut self, key: &Q) -> Result<V, Error<K>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        // deletion restructures the tree on its way down, make sure
        // there is something to delete before touching it.
        if !self.contains_key(key) {
            return Err(Error::KeyNotFound);
        }

        let (root, old_value) = match Llrb::do_delete(self.root.take(), key) {
            (None, old_value) => (None, old_value),
            (Some(mut root), old_value) => {
                root.set_black();
                (Some(root), old_value)
            }
        };
        self.root = root;
        match old_value {
            Some(value) => {
                self.n_count -= 1;
                Ok(value)
            }
            None => panic!("delete(): fatal logic, call the programmer"),
        }
    }

    /// Validate LLRB tree with following rules:
    ///
    /// * Root node is always black.
    /// * No right leaning red links.
    /// * From root to any leaf, no consecutive reds allowed in its path.
    /// * Number of blacks should be same under left child and right child.
    /// * Make sure keys are in sorted order.
    /// * Number of reachable nodes match the entry count.
    ///
    /// Additionally return black height and leaf depths of the tree,
    /// refer to [`Stats`].
    pub fn validate(&self) -> Result<Stats, Error<K>>
    where
        K: fmt::Debug,
    {
        let root = self.root.as_ref().map(Deref::deref);
        let mut walk = Walk::default();

        let res = if is_red(root) {
            Err(Error::RedRoot)
        } else {
            Llrb::validate_tree(root, false, 0, 0, (None, None), &mut walk).and_then(
                |blacks| match walk.nodes {
                    n if n == self.n_count => Ok(blacks),
                    n => Err(Error::CountMismatch(self.n_count, n)),
                },
            )
        };

        match res {
            Ok(blacks) => {
                debug!("{}: validated {} entries", self.name, self.n_count);
                Ok(Stats {
                    entries: self.n_count,
                    blacks,
                    depths: walk.depths,
                })
            }
            Err(err) => {
                warn!("{}: invalid tree, {}", self.name, err);
                Err(err)
            }
        }
    }
}

/// Read operations on Llrb instance.
impl<K, V> Llrb<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Get the value for key. If key is not present return
    /// [`Error::KeyNotFound`].
    pub fn get<Q>(&self, key: &Q) -> Result<V, Error<K>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.try_get(key).ok_or(Error::KeyNotFound)
    }

    /// Get the value for key, if present.
    pub fn try_get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|node| node.value.clone())
    }

    /// Check whether key is present in this index.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Return an iterator over all entries in this instance, in
    /// sort order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut paths = Vec::with_capacity(ITER_PATH_CAPACITY);
        build_iter(self.root.as_ref().map(Deref::deref), &mut paths);
        Iter { paths }
    }

    fn find<Q>(&self, key: &Q) -> Option<&Node<K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = self.root.as_ref().map(Deref::deref);
        while let Some(nref) = node {
            node = match nref.key.borrow().cmp(key) {
                Ordering::Less => nref.right_deref(),
                Ordering::Greater => nref.left_deref(),
                Ordering::Equal => return Some(nref),
            };
        }
        None
    }
}

impl<'a, K, V> IntoIterator for &'a Llrb<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

// Accumulator for validate_tree().
#[derive(Default)]
struct Walk {
    depths: Depth,
    nodes: usize,
}

impl<K, V> Llrb<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    fn do_insert(node: Option<Box<Node<K, V>>>, key: K, value: V) -> Insert<K, V> {
        let mut node = match node {
            // new entries always join the tree as red.
            None => return (Node::new(key, value, false /*black*/), None),
            Some(node) => node,
        };

        match node.key.cmp(&key) {
            Ordering::Greater => {
                let (left, e) = Llrb::do_insert(node.left.take(), key, value);
                node.left = Some(left);
                match e {
                    None => (Llrb::walkuprot_23(node), None),
                    e @ Some(_) => (node, e),
                }
            }
            Ordering::Less => {
                let (right, e) = Llrb::do_insert(node.right.take(), key, value);
                node.right = Some(right);
                match e {
                    None => (Llrb::walkuprot_23(node), None),
                    e @ Some(_) => (node, e),
                }
            }
            Ordering::Equal => (node, Some(Error::DuplicateKey(key))),
        }
    }

    fn do_delete<Q>(node: Option<Box<Node<K, V>>>, key: &Q) -> Delete<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = match node {
            None => return (None, None),
            Some(node) => node,
        };

        if node.key.borrow().gt(key) {
            if node.left.is_none() {
                return (Some(node), None);
            }
            let left = node.left_deref();
            if !is_red(left) && !is_red(left.and_then(Node::left_deref)) {
                node = Llrb::move_red_left(node);
            }
            let (left, old_value) = Llrb::do_delete(node.left.take(), key);
            node.left = left;
            (Some(Llrb::fixup(node)), old_value)
        } else {
            if is_red(node.left_deref()) {
                node = Llrb::rotate_right(node);
            }

            if !node.key.borrow().lt(key) && node.right.is_none() {
                // a black leaf with no right child has no left child
                // either, drop it.
                return (None, Some(node.value));
            }

            let right = node.right_deref();
            let ok = right.is_some() && !is_red(right);
            if ok && !is_red(right.and_then(Node::left_deref)) {
                node = Llrb::move_red_right(node);
            }

            if !node.key.borrow().lt(key) {
                // node == key, splice the in-order successor in its place.
                let (right, successor) = Llrb::delete_min(node.right.take());
                node.right = right;
                let mut successor = match successor {
                    Some(successor) => successor,
                    None => panic!("do_delete(): fatal logic, call the programmer"),
                };
                successor.left = node.left.take();
                successor.right = node.right.take();
                successor.black = node.black;
                (Some(Llrb::fixup(successor)), Some(node.value))
            } else {
                let (right, old_value) = Llrb::do_delete(node.right.take(), key);
                node.right = right;
                (Some(Llrb::fixup(node)), old_value)
            }
        }
    }

    // detach the minimum node from the sub-tree.
    fn delete_min(node: Option<Box<Node<K, V>>>) -> Delmin<K, V> {
        let mut node = match node {
            None => return (None, None),
            Some(node) => node,
        };
        if node.left.is_none() {
            return (None, Some(node));
        }
        let left = node.left_deref();
        if !is_red(left) && !is_red(left.and_then(Node::left_deref)) {
            node = Llrb::move_red_left(node);
        }
        let (left, old_node) = Llrb::delete_min(node.left.take());
        node.left = left;
        (Some(Llrb::fixup(node)), old_node)
    }

    fn validate_tree(
        node: Option<&Node<K, V>>,
        fromred: bool,
        mut nb: usize,
        depth: usize,
        (low, high): (Option<&K>, Option<&K>),
        walk: &mut Walk,
    ) -> Result<usize, Error<K>> {
        let node = match node {
            None => {
                walk.depths.sample(depth);
                return Ok(nb);
            }
            Some(node) => node,
        };
        walk.nodes += 1;

        let red = !node.is_black();
        if fromred && red {
            return Err(Error::ConsecutiveReds);
        }
        if is_red(node.right_deref()) {
            return Err(Error::RightLeaningRed);
        }
        if !red {
            nb += 1;
        }
        if let Some(low) = low.filter(|low| node.key.le(*low)) {
            return Err(Error::SortError(node.key.clone(), low.clone()));
        }
        if let Some(high) = high.filter(|high| node.key.ge(*high)) {
            return Err(Error::SortError(node.key.clone(), high.clone()));
        }

        let (left, right) = (node.left_deref(), node.right_deref());
        let lbounds = (low, Some(&node.key));
        let rbounds = (Some(&node.key), high);
        let lblacks = Llrb::validate_tree(left, red, nb, depth + 1, lbounds, walk)?;
        let rblacks = Llrb::validate_tree(right, red, nb, depth + 1, rbounds, walk)?;
        if lblacks != rblacks {
            let err = format!("left: {} right: {}", lblacks, rblacks);
            return Err(Error::UnbalancedBlacks(err));
        }
        Ok(lblacks)
    }

    //--------- rotation routines for 2-3 algorithm ----------------

    // order of the checks is significant, each one can set up the next.
    fn walkuprot_23(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        if is_red(node.right_deref()) && !is_red(node.left_deref()) {
            node = Llrb::rotate_left(node);
        }
        let left = node.left_deref();
        if is_red(left) && is_red(left.and_then(Node::left_deref)) {
            node = Llrb::rotate_right(node);
        }
        if is_red(node.left_deref()) && is_red(node.right_deref()) {
            Llrb::flip(node.deref_mut())
        }
        node
    }

    //              (i)                       (i)
    //               |                         |
    //              node                       x
    //              /  \                      / \
    //             /    (r)                 (r)  \
    //            /       \                 /     \
    //          left       x             node      xr
    //                    / \            /  \
    //                  xl   xr       left   xl
    //
    fn rotate_left(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        let mut x = match node.right.take() {
            Some(x) if !x.is_black() => x,
            _ => panic!("rotate_left(): rotating a black link ? Call the programmer"),
        };
        node.right = x.left.take();
        x.black = node.black;
        node.set_red();
        x.left = Some(node);
        x
    }

    //              (i)                       (i)
    //               |                         |
    //              node                       x
    //              /  \                      / \
    //            (r)   \                   (r)  \
    //           /       \                 /      \
    //          x       right             xl      node
    //         / \                                / \
    //       xl   xr                             xr  right
    //
    fn rotate_right(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        let mut x = match node.left.take() {
            Some(x) if !x.is_black() => x,
            _ => panic!("rotate_right(): rotating a black link ? Call the programmer"),
        };
        node.left = x.right.take();
        x.black = node.black;
        node.set_red();
        x.right = Some(node);
        x
    }

    //        (x)                   (!x)
    //         |                     |
    //        node                  node
    //        / \                   / \
    //      (y) (z)              (!y) (!z)
    //     /      \              /      \
    //   left    right         left    right
    //
    fn flip(node: &mut Node<K, V>) {
        if let Some(left) = node.left.as_mut() {
            left.toggle_link();
        }
        if let Some(right) = node.right.as_mut() {
            right.toggle_link();
        }
        node.toggle_link();
    }

    fn fixup(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        if is_red(node.right_deref()) {
            node = Llrb::rotate_left(node);
        }
        let left = node.left_deref();
        if is_red(left) && is_red(left.and_then(Node::left_deref)) {
            node = Llrb::rotate_right(node);
        }
        if is_red(node.left_deref()) && is_red(node.right_deref()) {
            Llrb::flip(node.deref_mut());
        }
        node
    }

    fn move_red_left(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        Llrb::flip(node.deref_mut());
        let right = node.right_deref();
        if is_red(right.and_then(Node::left_deref)) {
            node.right = node.right.take().map(Llrb::rotate_right);
            node = Llrb::rotate_left(node);
            Llrb::flip(node.deref_mut());
        }
        node
    }

    fn move_red_right(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        Llrb::flip(node.deref_mut());
        let left = node.left_deref();
        if is_red(left.and_then(Node::left_deref)) {
            node = Llrb::rotate_right(node);
            Llrb::flip(node.deref_mut());
        }
        node
    }
}

#[cfg(test)]
impl<K, V> Llrb<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    // pre-order snapshot of (key, black, depth), to compare tree shapes.
    pub(crate) fn shape(&self) -> Vec<(K, bool, usize)> {
        let mut acc = vec![];
        let mut stack = vec![];
        if let Some(root) = self.root.as_ref() {
            stack.push((root.deref(), 0));
        }
        while let Some((node, depth)) = stack.pop() {
            acc.push((node.key.clone(), node.black, depth));
            if let Some(right) = node.right_deref() {
                stack.push((right, depth + 1));
            }
            if let Some(left) = node.left_deref() {
                stack.push((left, depth + 1));
            }
        }
        acc
    }

    pub(crate) fn is_root_black(&self) -> bool {
        !is_red(self.root.as_ref().map(Deref::deref))
    }
}

fn is_red<K, V>(node: Option<&Node<K, V>>) -> bool
where
    K: Clone + Ord,
    V: Clone,
{
    node.map_or(false, |node| !node.is_black())
}

/// Iterator over [`Llrb`] entries, in sort order.
pub struct Iter<'a, K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    paths: Vec<Fragment<'a, K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let path = self.paths.last_mut()?;
            match path.flag {
                IFlag::Left => {
                    path.flag = IFlag::Center;
                    let node = path.node;
                    break Some((&node.key, &node.value));
                }
                IFlag::Center => {
                    path.flag = IFlag::Right;
                    let node = path.node;
                    build_iter(node.right_deref(), &mut self.paths)
                }
                IFlag::Right => {
                    self.paths.pop();
                }
            }
        }
    }
}

#[derive(Copy, Clone)]
enum IFlag {
    Left,
    Center,
    Right,
}

struct Fragment<'a, K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    flag: IFlag,
    node: &'a Node<K, V>,
}

// push the left spine of node, the last pushed node is the next in order.
fn build_iter<'a, K, V>(mut node: Option<&'a Node<K, V>>, paths: &mut Vec<Fragment<'a, K, V>>)
where
    K: Clone + Ord,
    V: Clone,
{
    while let Some(nref) = node {
        paths.push(Fragment {
            flag: IFlag::Left,
            node: nref,
        });
        node = nref.left_deref();
    }
}

/// Node corresponds to a single entry in Llrb instance.
#[derive(Clone)]
pub struct Node<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    key: K,
    value: V,
    black: bool,                    // store: black or red
    left: Option<Box<Node<K, V>>>,  // store: left child
    right: Option<Box<Node<K, V>>>, // store: right child
}

// Primary operations on a single node.
impl<K, V> Node<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    // CREATE operation
    fn new(key: K, value: V, black: bool) -> Box<Node<K, V>> {
        Box::new(Node {
            key,
            value,
            black,
            left: None,
            right: None,
        })
    }

    #[inline]
    fn left_deref(&self) -> Option<&Node<K, V>> {
        self.left.as_ref().map(Deref::deref)
    }

    #[inline]
    fn right_deref(&self) -> Option<&Node<K, V>> {
        self.right.as_ref().map(Deref::deref)
    }

    #[inline]
    fn set_red(&mut self) {
        self.black = false
    }

    #[inline]
    fn set_black(&mut self) {
        self.black = true
    }

    #[inline]
    fn toggle_link(&mut self) {
        self.black = !self.black
    }

    #[inline]
    fn is_black(&self) -> bool {
        self.black
    }
}

/// Statistics gathered by [`Llrb::validate`] while walking the tree.
#[derive(Debug)]
pub struct Stats {
    entries: usize,
    blacks: usize,
    depths: Depth,
}

impl Stats {
    /// Return number entries in [`Llrb`] instance.
    #[inline]
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Return number of black nodes on any path from root to leaf.
    #[inline]
    pub fn blacks(&self) -> usize {
        self.blacks
    }

    /// Return leaf depths, [`Depth::max`] is the height of the tree.
    #[inline]
    pub fn depths(&self) -> &Depth {
        &self.depths
    }
}
