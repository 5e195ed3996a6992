use thiserror::Error as ThisError;

/// Error enumerates over all possible errors that this package
/// shall return.
///
/// `DuplicateKey` and `KeyNotFound` are the only errors returned by the
/// read/write API. The remaining variants are reported by
/// [`Llrb::validate`](crate::Llrb::validate) and indicate a broken tree.
#[derive(Debug, PartialEq, ThisError)]
pub enum Error<K> {
    /// Returned by insert() when key is already present. The rejected
    /// key is handed back to the caller.
    #[error("duplicate key {0:?}")]
    DuplicateKey(K),
    /// Returned by get() and delete() when key is not present.
    #[error("key not found")]
    KeyNotFound,
    /// Fatal case, a red node has a red child.
    #[error("consecutive red links")]
    ConsecutiveReds,
    /// Fatal case, a node has a red right child.
    #[error("right leaning red link")]
    RightLeaningRed,
    /// Fatal case, root of a non-empty tree is red.
    #[error("root is red")]
    RedRoot,
    /// Fatal case, breaking black balance. The String component of
    /// this variant can be used for debugging.
    #[error("unbalanced blacks, {0}")]
    UnbalancedBlacks(String),
    /// Fatal case, index entries are not in sort-order.
    #[error("sort error, {0:?} against {1:?}")]
    SortError(K, K),
    /// Fatal case, (counted entries, reachable nodes) differ.
    #[error("entry count {0} does not match {1} nodes")]
    CountMismatch(usize, usize),
}
