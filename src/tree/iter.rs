use std::iter::FusedIterator;

use super::{Link, Node, Tree};

/// An iterator over the payloads of a tree in ascending order.
///
/// Double-ended, `rev()` walks the payloads in descending order.
/// The tree is borrowed for the whole pass, so it cannot change underneath.
pub struct Iter<'a, T> {
    // Left spine of the unvisited part, next smallest on top
    front: Vec<&'a Node<T>>,
    // Right spine of the unvisited part, next largest on top
    back: Vec<&'a Node<T>>,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(super) fn new<C>(tree: &'a Tree<T, C>) -> Self {
        let mut iter = Self {
            front: Vec::new(),
            back: Vec::new(),
            remaining: tree.num_nodes,
        };
        iter.push_left_spine(tree.root);
        iter.push_right_spine(tree.root);
        iter
    }

    fn push_left_spine(&mut self, mut link: Link<T>) {
        while let Some(node_ptr) = link {
            let node: &'a Node<T> = unsafe { &*node_ptr.as_ptr() };
            self.front.push(node);
            link = node.left;
        }
    }

    fn push_right_spine(&mut self, mut link: Link<T>) {
        while let Some(node_ptr) = link {
            let node: &'a Node<T> = unsafe { &*node_ptr.as_ptr() };
            self.back.push(node);
            link = node.right;
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        // Both ends share the count, so they stop where they meet
        if self.remaining == 0 {
            return None;
        }
        let node = self.front.pop()?;
        self.push_left_spine(node.right);
        self.remaining -= 1;
        Some(&node.payload)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.back.pop()?;
        self.push_right_spine(node.left);
        self.remaining -= 1;
        Some(&node.payload)
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {}

impl<'a, T> FusedIterator for Iter<'a, T> {}

impl<'a, T> Clone for Iter<'a, T> {
    fn clone(&self) -> Self {
        Self {
            front: self.front.clone(),
            back: self.back.clone(),
            remaining: self.remaining,
        }
    }
}
