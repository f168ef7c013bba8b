//! An ordered container implemented with an AVL tree.
//!
//! Payloads are ordered by a comparator fixed when the tree is created, or by
//! `Ord` for [`Tree::new`]. Search, insert and remove run in O(log n).
//!
//! ```
//! use avlt::{InsertError, Tree};
//!
//! #[derive(Debug)]
//! struct Word {
//!     word: String,
//!     freq: usize,
//! }
//!
//! let mut tree = Tree::with_comparator(|a: &Word, b: &Word| a.word.cmp(&b.word));
//! for word in "the cat saw the dog".split_whitespace() {
//!     let word = Word { word: word.to_string(), freq: 1 };
//!     if let Err(InsertError::Duplicate(_)) = tree.insert_with(word, |w| w.freq += 1) {
//!         // rejected payload is dropped here
//!     }
//! }
//! assert_eq!(tree.len(), 4);
//!
//! let key = Word { word: "the".to_string(), freq: 0 };
//! assert_eq!(tree.get(&key).map(|w| w.freq), Some(2));
//!
//! let words: Vec<&str> = tree.iter().map(|w| w.word.as_str()).collect();
//! assert_eq!(words, ["cat", "dog", "saw", "the"]);
//! ```

mod error;
mod tree;

pub use error::InsertError;
pub use tree::{Iter, OrdComparator, Tree};
