/// A single slot in the tree arena.
///
/// `sum` and `height` are caches over the subtree rooted here; the tree
/// refreshes them on every structural mutation.
#[derive(Clone, Debug)]
pub struct RankNode {
    pub key: isize,
    /// Weight of this node alone.
    pub count: isize,
    /// Total weight of the subtree rooted at this node.
    pub sum: isize,
    /// Height of the subtree rooted at this node; a leaf has height 1.
    pub height: i32,
    pub l: Option<u32>,
    pub r: Option<u32>,
}

impl RankNode {
    pub fn new(key: isize, count: isize) -> Self {
        Self {
            key,
            count,
            sum: count,
            height: 1,
            l: None,
            r: None,
        }
    }
}
