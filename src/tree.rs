use std::alloc::{self, Layout};
use std::cmp::{self, Ordering};
use std::fmt;
use std::mem;
use std::ptr::NonNull;

use crate::error::InsertError;

mod iter;
pub use iter::Iter;

/// Comparator of trees created with [`Tree::new`].
pub type OrdComparator<T> = fn(&T, &T) -> Ordering;

/// An ordered container implemented with an AVL tree.
///
/// Payloads are ordered by the comparator given at creation. Equal payloads
/// are never stored twice: inserting one hands it back as
/// [`InsertError::Duplicate`] after passing the stored payload to the
/// duplicate hook.
///
/// ```
/// use avlt::Tree;
/// let mut tree = Tree::with_comparator(|a: &&str, b: &&str| a.len().cmp(&b.len()));
/// tree.insert("three").unwrap();
/// tree.insert("two").unwrap();
/// assert!(tree.insert("six").is_err());
/// assert_eq!(tree.get(&"one"), Some(&"two"));
/// assert_eq!(tree.remove(&"seven"), Some("three"));
/// ```
pub struct Tree<T, C = OrdComparator<T>> {
    root: Link<T>,
    num_nodes: usize,
    compare: C,
}

struct Node<T> {
    payload: T,
    left: Link<T>,
    right: Link<T>,
    height: isize,
}

type NodePtr<T> = NonNull<Node<T>>;
type Link<T> = Option<NodePtr<T>>;

impl<T: Ord> Tree<T> {
    /// Creates an empty tree ordered by `Ord`.
    /// No memory is allocated until the first payload is inserted.
    pub fn new() -> Self {
        Self {
            root: None,
            num_nodes: 0,
            compare: T::cmp,
        }
    }
}

impl<T, C> Tree<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    /// Creates an empty tree ordered by `compare`.
    /// The comparator must be a total order and is fixed for the lifetime of the tree.
    pub fn with_comparator(compare: C) -> Self {
        Self {
            root: None,
            num_nodes: 0,
            compare,
        }
    }

    /// Returns a reference to the stored payload that compares equal to `key`.
    pub fn get(&self, key: &T) -> Option<&T> {
        self.find(key).map(|node_ptr| unsafe { &(*node_ptr.as_ptr()).payload })
    }

    /// Returns true if a payload equal to `key` is stored.
    pub fn contains(&self, key: &T) -> bool {
        self.find(key).is_some()
    }

    /// Inserts a payload, ignoring duplicates.
    pub fn insert(&mut self, payload: T) -> Result<(), InsertError<T>> {
        self.insert_with(payload, |_| {})
    }

    /// Inserts a payload.
    ///
    /// If an equal payload is already stored, `on_duplicate` is called once with
    /// the stored payload and the new one is returned as [`InsertError::Duplicate`].
    /// If no node can be allocated, the payload is returned as
    /// [`InsertError::Overflow`]. The tree is balanced after every outcome.
    pub fn insert_with<F>(&mut self, payload: T, on_duplicate: F) -> Result<(), InsertError<T>>
    where
        F: FnOnce(&mut T),
    {
        unsafe { Self::insert_node(&mut self.root, payload, &self.compare, on_duplicate)? };
        self.num_nodes += 1;
        Ok(())
    }

    /// Removes the payload equal to `key` and returns it.
    pub fn remove(&mut self, key: &T) -> Option<T> {
        let payload = unsafe { Self::remove_node(&mut self.root, key, &self.compare) }?;
        debug_assert!(self.num_nodes >= 1);
        self.num_nodes -= 1;
        Some(payload)
    }

    /// Asserts that the internal tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        let (num_nodes, height) = unsafe { self.check_subtree(self.root) };
        assert_eq!(num_nodes, self.num_nodes);
        assert_eq!(height, self.height());

        // Child links only order neighbours, in-order walk orders everything
        let mut iter = self.iter();
        if let Some(mut prev) = iter.next() {
            for payload in iter {
                assert_eq!((self.compare)(prev, payload), Ordering::Less);
                prev = payload;
            }
        }
        assert_eq!(self.iter().count(), self.num_nodes);
    }

    /// Returns number of nodes and height of the subtree.
    #[cfg(any(test, feature = "consistency_check"))]
    unsafe fn check_subtree(&self, link: Link<T>) -> (usize, isize) {
        match link {
            None => (0, -1),
            Some(node_ptr) => {
                let node = node_ptr.as_ref();
                if let Some(left_ptr) = node.left {
                    let order = (self.compare)(&left_ptr.as_ref().payload, &node.payload);
                    assert_eq!(order, Ordering::Less);
                }
                if let Some(right_ptr) = node.right {
                    let order = (self.compare)(&right_ptr.as_ref().payload, &node.payload);
                    assert_eq!(order, Ordering::Greater);
                }

                let (left_nodes, left_height) = self.check_subtree(node.left);
                let (right_nodes, right_height) = self.check_subtree(node.right);

                // Check height
                assert_eq!(node.height, 1 + cmp::max(left_height, right_height));

                // Check AVL condition (nearly balance)
                assert!(left_height <= right_height + 1);
                assert!(right_height <= left_height + 1);

                (left_nodes + right_nodes + 1, node.height)
            }
        }
    }

    fn find(&self, key: &T) -> Link<T> {
        let mut current = self.root;
        while let Some(node_ptr) = current {
            current = unsafe {
                match (self.compare)(key, &node_ptr.as_ref().payload) {
                    Ordering::Equal => break,
                    Ordering::Less => node_ptr.as_ref().left,
                    Ordering::Greater => node_ptr.as_ref().right,
                }
            }
        }
        current
    }

    /// Inserts below `link` and rebalances every node on the way back up.
    /// Returns the new node.
    unsafe fn insert_node<F>(
        link: &mut Link<T>,
        payload: T,
        compare: &C,
        on_duplicate: F,
    ) -> Result<NodePtr<T>, InsertError<T>>
    where
        F: FnOnce(&mut T),
    {
        let mut node_ptr = match *link {
            Some(node_ptr) => node_ptr,
            None => {
                let new_ptr = Node::create(payload).map_err(InsertError::Overflow)?;
                *link = Some(new_ptr);
                return Ok(new_ptr);
            }
        };

        let node = node_ptr.as_mut();
        let new_ptr = match compare(&payload, &node.payload) {
            Ordering::Less => Self::insert_node(&mut node.left, payload, compare, on_duplicate)?,
            Ordering::Greater => {
                Self::insert_node(&mut node.right, payload, compare, on_duplicate)?
            }
            Ordering::Equal => {
                on_duplicate(&mut node.payload);
                return Err(InsertError::Duplicate(payload));
            }
        };

        *link = Some(Self::rebalance_inserted(node_ptr, new_ptr, compare));
        Ok(new_ptr)
    }

    /// Restores balance at `node_ptr` after `new_ptr` was inserted below it.
    /// The rotation case is chosen by where the new payload went, not by child heights.
    /// Returns the new subtree root.
    unsafe fn rebalance_inserted(
        mut node_ptr: NodePtr<T>,
        new_ptr: NodePtr<T>,
        compare: &C,
    ) -> NodePtr<T> {
        Node::adjust_height(node_ptr);
        let balance = Node::balance(node_ptr);
        if balance > 1 {
            if let Some(left_ptr) = node_ptr.as_ref().left {
                // New node may be the grandchild moved by the rotations below,
                // so no reference into it outlives this comparison
                let order = compare(&new_ptr.as_ref().payload, &left_ptr.as_ref().payload);
                if order == Ordering::Greater {
                    // LR
                    node_ptr.as_mut().left = Some(Node::rotate_left(left_ptr));
                }
                return Node::rotate_right(node_ptr);
            }
        } else if balance < -1 {
            if let Some(right_ptr) = node_ptr.as_ref().right {
                let order = compare(&new_ptr.as_ref().payload, &right_ptr.as_ref().payload);
                if order == Ordering::Less {
                    // RL
                    node_ptr.as_mut().right = Some(Node::rotate_right(right_ptr));
                }
                return Node::rotate_left(node_ptr);
            }
        }
        node_ptr
    }

    /// Removes the payload equal to `key` below `link`, rebalancing every
    /// visited node on the way back up whether or not the key was found.
    unsafe fn remove_node(link: &mut Link<T>, key: &T, compare: &C) -> Option<T> {
        let mut node_ptr = (*link)?;
        let removed = match compare(key, &node_ptr.as_ref().payload) {
            Ordering::Less => Self::remove_node(&mut node_ptr.as_mut().left, key, compare),
            Ordering::Greater => Self::remove_node(&mut node_ptr.as_mut().right, key, compare),
            Ordering::Equal => {
                let node = node_ptr.as_mut();
                match (node.left, node.right) {
                    (Some(_), Some(_)) => {
                        // Successor takes the place of the removed payload
                        Node::remove_min(&mut node.right)
                            .map(|successor| mem::replace(&mut node.payload, successor))
                    }
                    (child, None) | (None, child) => {
                        // Stem or leaf, surviving child is already balanced
                        *link = child;
                        return Some(Node::destroy(node_ptr).payload);
                    }
                }
            }
        };
        *link = Some(Node::rebalance(node_ptr));
        removed
    }
}

impl<T, C> Tree<T, C> {
    /// Returns true if the tree contains no payloads.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of payloads in the tree.
    pub fn len(&self) -> usize {
        self.num_nodes
    }

    /// Returns the height of the root node: 0 for a single node, -1 if empty.
    pub fn height(&self) -> isize {
        Node::height_of(self.root)
    }

    /// Returns the smallest payload.
    pub fn first(&self) -> Option<&T> {
        let mut node_ptr = self.root?;
        unsafe {
            while let Some(left_ptr) = node_ptr.as_ref().left {
                node_ptr = left_ptr;
            }
            Some(&(*node_ptr.as_ptr()).payload)
        }
    }

    /// Returns the largest payload.
    pub fn last(&self) -> Option<&T> {
        let mut node_ptr = self.root?;
        unsafe {
            while let Some(right_ptr) = node_ptr.as_ref().right {
                node_ptr = right_ptr;
            }
            Some(&(*node_ptr.as_ptr()).payload)
        }
    }

    /// Gets an iterator over the payloads in ascending order.
    /// Use `iter().rev()` for descending order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Calls `visit` on every payload in ascending order.
    pub fn traverse_ascending<F: FnMut(&T)>(&self, visit: F) {
        self.iter().for_each(visit);
    }

    /// Calls `visit` on every payload in descending order.
    pub fn traverse_descending<F: FnMut(&T)>(&self, visit: F) {
        self.iter().rev().for_each(visit);
    }

    /// Writes the tree shape, one node per line, right subtree first.
    /// Each line is indented by one tab per level of depth and ends with a newline;
    /// `write_label` writes the payload itself.
    ///
    /// ```
    /// use std::fmt::Write;
    /// use avlt::Tree;
    ///
    /// let tree: Tree<_> = (1..=3).collect();
    /// let mut out = String::new();
    /// tree.pretty_print(&mut out, |out, n| write!(out, "{}", n)).unwrap();
    /// assert_eq!(out, "\t3\n2\n\t1\n");
    /// ```
    pub fn pretty_print<W, F>(&self, out: &mut W, mut write_label: F) -> fmt::Result
    where
        W: fmt::Write,
        F: FnMut(&mut W, &T) -> fmt::Result,
    {
        unsafe { Node::print_subtree(self.root, 0, out, &mut write_label) }
    }

    /// Clears the tree, dropping all payloads and deallocating all memory.
    pub fn clear(&mut self) {
        let root = self.root.take();
        self.num_nodes = 0;
        unsafe { Node::destroy_subtree(root, &mut drop::<T>) };
    }

    /// Consumes the tree, handing every payload to `release` exactly once.
    /// Payloads are released in post-order.
    pub fn destroy<F: FnMut(T)>(mut self, mut release: F) {
        let root = self.root.take();
        self.num_nodes = 0;
        unsafe { Node::destroy_subtree(root, &mut release) };
    }
}

impl<T, C> Drop for Tree<T, C> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: Ord> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, C: Clone> Clone for Tree<T, C> {
    fn clone(&self) -> Self {
        Self {
            root: unsafe { Node::clone_subtree(self.root) },
            num_nodes: self.num_nodes,
            compare: self.compare.clone(),
        }
    }
}

impl<T: fmt::Debug, C> fmt::Debug for Tree<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, T, C> IntoIterator for &'a Tree<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Duplicate payloads are dropped.
/// If a node cannot be allocated, the rejected payload is dropped and
/// the rest of the iterator is left unconsumed.
impl<T, C> Extend<T> for Tree<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for payload in iter {
            match self.insert(payload) {
                Ok(()) | Err(InsertError::Duplicate(_)) => {}
                Err(InsertError::Overflow(_)) => break,
            }
        }
    }
}

impl<T: Ord> FromIterator<T> for Tree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<T> Node<T> {
    /// Allocates a leaf node.
    /// Hands the payload back if memory is exhausted.
    fn create(payload: T) -> Result<NodePtr<T>, T> {
        // Never zero-sized, a node always holds its height
        let layout = Layout::new::<Node<T>>();
        let raw = unsafe { alloc::alloc(layout) } as *mut Node<T>;
        match NonNull::new(raw) {
            None => Err(payload),
            Some(node_ptr) => {
                unsafe {
                    node_ptr.as_ptr().write(Node {
                        payload,
                        left: None,
                        right: None,
                        height: 0,
                    })
                };
                Ok(node_ptr)
            }
        }
    }

    /// Deallocates the node and returns its contents.
    /// Child links are returned as they are, not freed.
    unsafe fn destroy(node_ptr: NodePtr<T>) -> Node<T> {
        // Global allocator with the layout of Node<T>, same as Box
        *Box::from_raw(node_ptr.as_ptr())
    }

    unsafe fn destroy_subtree<F: FnMut(T)>(link: Link<T>, release: &mut F) {
        if let Some(node_ptr) = link {
            let node = Self::destroy(node_ptr);
            Self::destroy_subtree(node.left, release);
            Self::destroy_subtree(node.right, release);
            release(node.payload);
        }
    }

    unsafe fn clone_subtree(link: Link<T>) -> Link<T>
    where
        T: Clone,
    {
        link.map(|node_ptr| {
            let node = node_ptr.as_ref();
            let boxed = Box::new(Node {
                payload: node.payload.clone(),
                left: Self::clone_subtree(node.left),
                right: Self::clone_subtree(node.right),
                height: node.height,
            });
            NodePtr::new_unchecked(Box::into_raw(boxed))
        })
    }

    fn height_of(link: Link<T>) -> isize {
        match link {
            None => -1,
            Some(node_ptr) => unsafe { node_ptr.as_ref().height },
        }
    }

    /// Height of the left subtree minus height of the right subtree.
    fn balance(node_ptr: NodePtr<T>) -> isize {
        unsafe {
            Self::height_of(node_ptr.as_ref().left) - Self::height_of(node_ptr.as_ref().right)
        }
    }

    fn adjust_height(mut node_ptr: NodePtr<T>) {
        unsafe {
            node_ptr.as_mut().height = 1 + cmp::max(
                Self::height_of(node_ptr.as_ref().left),
                Self::height_of(node_ptr.as_ref().right),
            );
        }
    }

    /// Returns the new subtree root, which is the former right child.
    unsafe fn rotate_left(mut node_ptr: NodePtr<T>) -> NodePtr<T> {
        match node_ptr.as_ref().right {
            None => node_ptr,
            Some(mut right_ptr) => {
                node_ptr.as_mut().right = right_ptr.as_ref().left;
                right_ptr.as_mut().left = Some(node_ptr);

                Self::adjust_height(node_ptr);
                Self::adjust_height(right_ptr);
                right_ptr
            }
        }
    }

    /// Returns the new subtree root, which is the former left child.
    unsafe fn rotate_right(mut node_ptr: NodePtr<T>) -> NodePtr<T> {
        match node_ptr.as_ref().left {
            None => node_ptr,
            Some(mut left_ptr) => {
                node_ptr.as_mut().left = left_ptr.as_ref().right;
                left_ptr.as_mut().right = Some(node_ptr);

                Self::adjust_height(node_ptr);
                Self::adjust_height(left_ptr);
                left_ptr
            }
        }
    }

    /// Restores AVL condition (balance) at given node if necessary and adjusts height.
    /// Single or double rotation is chosen by the heights of the grandchildren;
    /// equally high grandchildren take the single rotation.
    /// Initial balance must not exceed +2 or -2, which always holds after a single update.
    /// Returns the new subtree root.
    unsafe fn rebalance(mut node_ptr: NodePtr<T>) -> NodePtr<T> {
        Self::adjust_height(node_ptr);
        let balance = Self::balance(node_ptr);
        debug_assert!((-2..=2).contains(&balance));
        if balance > 1 {
            if let Some(left_ptr) = node_ptr.as_ref().left {
                if Self::balance(left_ptr) < 0 {
                    node_ptr.as_mut().left = Some(Self::rotate_left(left_ptr));
                }
                return Self::rotate_right(node_ptr);
            }
        } else if balance < -1 {
            if let Some(right_ptr) = node_ptr.as_ref().right {
                if Self::balance(right_ptr) > 0 {
                    node_ptr.as_mut().right = Some(Self::rotate_right(right_ptr));
                }
                return Self::rotate_left(node_ptr);
            }
        }
        node_ptr
    }

    /// Unlinks the leftmost node below `link` and returns its payload,
    /// rebalancing the nodes on the path.
    unsafe fn remove_min(link: &mut Link<T>) -> Option<T> {
        let mut node_ptr = (*link)?;
        if node_ptr.as_ref().left.is_none() {
            *link = node_ptr.as_ref().right;
            return Some(Self::destroy(node_ptr).payload);
        }
        let min = Self::remove_min(&mut node_ptr.as_mut().left);
        *link = Some(Self::rebalance(node_ptr));
        min
    }

    unsafe fn print_subtree<W, F>(
        link: Link<T>,
        depth: usize,
        out: &mut W,
        write_label: &mut F,
    ) -> fmt::Result
    where
        W: fmt::Write,
        F: FnMut(&mut W, &T) -> fmt::Result,
    {
        if let Some(node_ptr) = link {
            let node = node_ptr.as_ref();
            Self::print_subtree(node.right, depth + 1, out, write_label)?;
            for _ in 0..depth {
                out.write_char('\t')?;
            }
            write_label(out, &node.payload)?;
            out.write_char('\n')?;
            Self::print_subtree(node.left, depth + 1, out, write_label)?;
        }
        Ok(())
    }
}
