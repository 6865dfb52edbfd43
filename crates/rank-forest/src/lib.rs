//! Order-statistics tree: an AVL tree over integer keys where every node
//! carries a weight and caches the total weight of its subtree.
//!
//! The one query everything else exists for is [`RankTree::count_less_than`]:
//! the summed weight of all nodes with a key strictly below the given one, in
//! O(log n). A list differ uses it to compensate the source indices of move
//! operations — each emitted move shifts the positions of the elements still
//! to its right, and the tree accumulates those shifts.
//!
//! Instead of heap nodes and pointers, all links are `Option<u32>` indices
//! into a `Vec` arena owned by the tree. Freed slots are kept on a free list
//! and reused by later inserts.

pub mod node;
pub mod tree;

pub use node::RankNode;
pub use tree::RankTree;
