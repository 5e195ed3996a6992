//! Ordered key-value map implemented as a [left-leaning-red-black][llrb]
//! tree.
//!
//! - Each entry in [`Llrb`] instance correspond to a {Key, Value} pair.
//! - Keys are unique, inserting an existing key is an error.
//! - Insert, get, delete in O(log n), balanced after every mutation.
//! - No Durability guarantee.
//! - Not thread safe, callers must serialize mutation.
//!
//! ```
//! use llrb_tree::{Error, Llrb};
//!
//! let mut index: Llrb<u64, String> = Llrb::new("myinstance");
//! index.insert(10, "ten".to_string()).unwrap();
//! index.insert(20, "twenty".to_string()).unwrap();
//!
//! assert_eq!(index.get(&10), Ok("ten".to_string()));
//! assert_eq!(index.insert(10, "dup".to_string()), Err(Error::DuplicateKey(10)));
//! assert_eq!(index.delete(&20), Ok("twenty".to_string()));
//! assert_eq!(index.try_get(&20), None);
//! assert_eq!(index.len(), 1);
//! ```
//!
//! [llrb]: https://en.wikipedia.org/wiki/Left-leaning_red-black_tree

mod depth;
mod error;
mod llrb;

pub use crate::depth::Depth;
pub use crate::error::Error;
pub use crate::llrb::{Iter, Llrb, Node, Stats};

#[cfg(test)]
mod proptests;
