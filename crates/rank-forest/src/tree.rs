use crate::node::RankNode;

/// AVL tree over `(key, weight)` pairs with cached subtree weight sums.
///
/// Keys are expected to be unique; inserting an equal key places it in the
/// right subtree, which keeps the tree well-formed but makes `remove` target
/// whichever duplicate it finds first.
#[derive(Debug, Default)]
pub struct RankTree {
    arena: Vec<RankNode>,
    free: Vec<u32>,
    root: Option<u32>,
    len: usize,
}

impl RankTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Root slot, for inspection in tests.
    pub fn root(&self) -> Option<u32> {
        self.root
    }

    /// Reads the node in the given arena slot.
    pub fn node(&self, handle: u32) -> &RankNode {
        &self.arena[handle as usize]
    }

    /// Inserts `key` with the given weight and returns the slot handle of the
    /// new node. The handle stays valid until a `remove` touches that key:
    /// deleting a two-child node swaps payloads between slots, so a handle
    /// identifies a key, not an address.
    pub fn insert(&mut self, key: isize, count: isize) -> u32 {
        let idx = self.alloc(key, count);
        self.root = Some(self.insert_at(self.root, idx));
        self.len += 1;
        idx
    }

    /// Inserts `key` at weight 1.
    pub fn insert_key(&mut self, key: isize) -> u32 {
        self.insert(key, 1)
    }

    /// Removes the node with the given key. Returns `false` when the key is
    /// not present.
    pub fn remove(&mut self, key: isize) -> bool {
        let before = self.len;
        self.root = self.remove_at(self.root, key);
        self.len < before
    }

    /// Smallest key in the tree, or 0 when empty.
    pub fn min(&self) -> isize {
        let mut cur = self.root;
        let mut key = 0;
        while let Some(i) = cur {
            key = self.arena[i as usize].key;
            cur = self.arena[i as usize].l;
        }
        key
    }

    /// Largest key in the tree, or 0 when empty.
    pub fn max(&self) -> isize {
        let mut cur = self.root;
        let mut key = 0;
        while let Some(i) = cur {
            key = self.arena[i as usize].key;
            cur = self.arena[i as usize].r;
        }
        key
    }

    /// Total weight of all nodes.
    pub fn sum(&self) -> isize {
        self.root
            .map(|i| self.arena[i as usize].sum)
            .unwrap_or(0)
    }

    /// Height of the tree; 0 when empty.
    pub fn height(&self) -> i32 {
        self.root
            .map(|i| self.arena[i as usize].height)
            .unwrap_or(0)
    }

    /// Summed weight of all nodes whose key is strictly less than `key`.
    pub fn count_less_than(&self, key: isize) -> isize {
        let mut acc = 0;
        let mut cur = self.root;
        while let Some(i) = cur {
            let n = &self.arena[i as usize];
            if key <= n.key {
                cur = n.l;
            } else {
                acc += n.count + self.sum_of(n.l);
                cur = n.r;
            }
        }
        acc
    }

    /// Recursively checks the ordering, the AVL height invariant, and the
    /// cached subtree sums.
    pub fn assert_valid(&self) -> Result<(), String> {
        self.check(self.root).map(|_| ())
    }

    fn check(&self, node: Option<u32>) -> Result<(i32, isize), String> {
        let Some(i) = node else {
            return Ok((0, 0));
        };
        let n = &self.arena[i as usize];
        if let Some(l) = n.l {
            if self.arena[l as usize].key > n.key {
                return Err(format!("node order violated at key {}", n.key));
            }
        }
        if let Some(r) = n.r {
            if self.arena[r as usize].key < n.key {
                return Err(format!("node order violated at key {}", n.key));
            }
        }
        let (lh, ls) = self.check(n.l)?;
        let (rh, rs) = self.check(n.r)?;
        let height = 1 + lh.max(rh);
        if n.height != height {
            return Err(format!(
                "height cache mismatch at key {}: expected {height}, got {}",
                n.key, n.height
            ));
        }
        let bf = lh - rh;
        if !(-1..=1).contains(&bf) {
            return Err(format!("AVL balance violated at key {}: bf={bf}", n.key));
        }
        let sum = n.count + ls + rs;
        if n.sum != sum {
            return Err(format!(
                "subtree sum mismatch at key {}: expected {sum}, got {}",
                n.key, n.sum
            ));
        }
        Ok((height, sum))
    }

    fn alloc(&mut self, key: isize, count: isize) -> u32 {
        match self.free.pop() {
            Some(i) => {
                self.arena[i as usize] = RankNode::new(key, count);
                i
            }
            None => {
                self.arena.push(RankNode::new(key, count));
                (self.arena.len() - 1) as u32
            }
        }
    }

    fn release(&mut self, idx: u32) {
        self.free.push(idx);
        self.len -= 1;
    }

    fn insert_at(&mut self, node: Option<u32>, idx: u32) -> u32 {
        let Some(cur) = node else {
            return idx;
        };
        let cu = cur as usize;
        if self.arena[idx as usize].key < self.arena[cu].key {
            let l = self.insert_at(self.arena[cu].l, idx);
            self.arena[cu].l = Some(l);
        } else {
            let r = self.insert_at(self.arena[cu].r, idx);
            self.arena[cu].r = Some(r);
        }
        self.rebalance(cur)
    }

    fn remove_at(&mut self, node: Option<u32>, key: isize) -> Option<u32> {
        let cur = node?;
        let cu = cur as usize;
        if key < self.arena[cu].key {
            let l = self.remove_at(self.arena[cu].l, key);
            self.arena[cu].l = l;
        } else if key > self.arena[cu].key {
            let r = self.remove_at(self.arena[cu].r, key);
            self.arena[cu].r = r;
        } else {
            match (self.arena[cu].l, self.arena[cu].r) {
                (None, None) => {
                    self.release(cur);
                    return None;
                }
                (Some(l), None) => {
                    self.release(cur);
                    return Some(l);
                }
                (None, Some(r)) => {
                    self.release(cur);
                    return Some(r);
                }
                (Some(_), Some(r)) => {
                    // Swap in the in-order successor's payload, then delete
                    // the successor from the right subtree.
                    let succ = self.leftmost(r);
                    let (k, c) = {
                        let s = &self.arena[succ as usize];
                        (s.key, s.count)
                    };
                    self.arena[cu].key = k;
                    self.arena[cu].count = c;
                    let nr = self.remove_at(Some(r), k);
                    self.arena[cu].r = nr;
                }
            }
        }
        Some(self.rebalance(cur))
    }

    fn leftmost(&self, mut i: u32) -> u32 {
        while let Some(l) = self.arena[i as usize].l {
            i = l;
        }
        i
    }

    fn height_of(&self, node: Option<u32>) -> i32 {
        node.map(|i| self.arena[i as usize].height).unwrap_or(0)
    }

    fn sum_of(&self, node: Option<u32>) -> isize {
        node.map(|i| self.arena[i as usize].sum).unwrap_or(0)
    }

    fn balance(&self, i: u32) -> i32 {
        let n = &self.arena[i as usize];
        self.height_of(n.l) - self.height_of(n.r)
    }

    fn refresh(&mut self, i: u32) {
        let (l, r) = {
            let n = &self.arena[i as usize];
            (n.l, n.r)
        };
        let height = 1 + self.height_of(l).max(self.height_of(r));
        let sum = self.arena[i as usize].count + self.sum_of(l) + self.sum_of(r);
        let n = &mut self.arena[i as usize];
        n.height = height;
        n.sum = sum;
    }

    fn rebalance(&mut self, cur: u32) -> u32 {
        self.refresh(cur);
        let bf = self.balance(cur);
        if bf > 1 {
            let l = self.arena[cur as usize].l.expect("left child exists");
            if self.balance(l) < 0 {
                let nl = self.rotate_left(l);
                self.arena[cur as usize].l = Some(nl);
            }
            self.rotate_right(cur)
        } else if bf < -1 {
            let r = self.arena[cur as usize].r.expect("right child exists");
            if self.balance(r) > 0 {
                let nr = self.rotate_right(r);
                self.arena[cur as usize].r = Some(nr);
            }
            self.rotate_left(cur)
        } else {
            cur
        }
    }

    fn rotate_left(&mut self, n: u32) -> u32 {
        let r = self.arena[n as usize].r.expect("right child exists");
        let rl = self.arena[r as usize].l;
        self.arena[n as usize].r = rl;
        self.arena[r as usize].l = Some(n);
        self.refresh(n);
        self.refresh(r);
        r
    }

    fn rotate_right(&mut self, n: u32) -> u32 {
        let l = self.arena[n as usize].l.expect("left child exists");
        let lr = self.arena[l as usize].r;
        self.arena[n as usize].l = lr;
        self.arena[l as usize].r = Some(n);
        self.refresh(n);
        self.refresh(l);
        l
    }
}
