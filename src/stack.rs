//! A simple LIFO stack
//!
//! `Stack` is a thin wrapper around a `Vec` that presents its contents
//! top-first. The includer uses it as the work-stack for depth-first
//! expansion.
//!
//! # Examples
//!
//! ```
//! use includer::stack::Stack;
//!
//! let mut stack = Stack::new();
//! stack.push(1).push(2).push(3);
//! assert_eq!(stack.to_vec(), vec![3, 2, 1]);
//! assert_eq!(stack.pop(), Some(3));
//! assert_eq!(stack.len(), 2);
//! ```

use thiserror::Error;

/// Returned by [`Stack::try_pop`] when the stack is empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("stack underflow")]
pub struct StackUnderflow;

/// A last-in, first-out container
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stack<T> {
    items: Vec<T>,
}

impl<T> Stack<T> {
    /// Create an empty stack
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Push an element onto the top of the stack
    pub fn push(&mut self, element: T) -> &mut Self {
        self.items.push(element);
        self
    }

    /// Push every element in order; the last one ends up on top
    pub fn push_all(&mut self, elements: impl IntoIterator<Item = T>) -> &mut Self {
        self.items.extend(elements);
        self
    }

    /// Remove and return the top element, or `None` if empty
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Remove and return the top element, failing if empty
    pub fn try_pop(&mut self) -> Result<T, StackUnderflow> {
        self.items.pop().ok_or(StackUnderflow)
    }

    /// Borrow the top element without removing it
    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    /// Empty the stack, returning its former contents top-first
    pub fn pop_all(&mut self) -> Vec<T> {
        let mut all = std::mem::take(&mut self.items);
        all.reverse();
        all
    }

    /// Number of elements on the stack
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the stack holds no elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove every element
    pub fn clear(&mut self) -> &mut Self {
        self.items.clear();
        self
    }

    /// Iterate from the top of the stack down
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter().rev()
    }
}

impl<T: Clone> Stack<T> {
    /// Copy the contents into a `Vec`, top element first
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for Stack<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> Extend<T> for Stack<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}
