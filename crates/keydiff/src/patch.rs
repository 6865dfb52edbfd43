use serde_json::{Map, Value};

/// Discriminant of a [`Patch`], mostly useful for assertions and dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchKind {
    Insert,
    Remove,
    Move,
    Update,
}

/// One edit operation in a patch script.
///
/// A script is applied strictly in order; every operation addresses the list
/// as left by the operations before it. Structural operations (`Insert`,
/// `Remove`, `Move`) always precede `Update`s in a script produced by the
/// differ, so update indices address the final list.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Insert `data` so that it occupies indices `from..=to`.
    Insert {
        from: isize,
        to: isize,
        data: Vec<Map<String, Value>>,
    },
    /// Remove the records at indices `from..=to`.
    Remove { from: isize, to: isize },
    /// Extract `count` records starting at `from` and reinsert them at `to`.
    Move {
        from: isize,
        to: isize,
        count: isize,
    },
    /// Merge the changed fields into the record at `index`. A `Null` field
    /// value marks a key that disappeared.
    Update {
        index: isize,
        data: Map<String, Value>,
    },
}

impl Patch {
    /// Insert patch covering `from..from + data.len()`.
    pub fn insert(from: isize, data: Vec<Map<String, Value>>) -> Self {
        let to = from + data.len() as isize - 1;
        Patch::Insert { from, to, data }
    }

    pub fn remove(from: isize, to: isize) -> Self {
        Patch::Remove { from, to }
    }

    pub fn update(index: isize, data: Map<String, Value>) -> Self {
        Patch::Update { index, data }
    }

    pub fn kind(&self) -> PatchKind {
        match self {
            Patch::Insert { .. } => PatchKind::Insert,
            Patch::Remove { .. } => PatchKind::Remove,
            Patch::Move { .. } => PatchKind::Move,
            Patch::Update { .. } => PatchKind::Update,
        }
    }

    pub fn is_structural(&self) -> bool {
        !matches!(self, Patch::Update { .. })
    }

    /// Number of records the operation touches.
    pub fn count(&self) -> isize {
        match self {
            Patch::Insert { from, to, .. } | Patch::Remove { from, to } => to - from + 1,
            Patch::Move { count, .. } => *count,
            Patch::Update { .. } => 1,
        }
    }

    /// True when `next` can be collapsed into this patch so that one patch
    /// describes the union of their work. Only same-kind structural pairs
    /// ever merge:
    ///
    /// - removes covering adjacent ranges (from either side);
    /// - inserts continuing at `to + 1`, or at the same `from`;
    /// - moves whose source and destination both continue where this one
    ///   ends.
    ///
    /// Not commutative for inserts and moves; callers pass patches in
    /// forward order.
    pub fn can_merge(&self, next: &Patch) -> bool {
        match (self, next) {
            (Patch::Remove { from, to }, Patch::Remove { from: nf, to: nt }) => {
                *to + 1 == *nf || *from == *nt + 1
            }
            (Patch::Insert { from, to, .. }, Patch::Insert { from: nf, .. }) => {
                *nf == *from || *nf == *to + 1
            }
            (
                Patch::Move { from, to, count },
                Patch::Move {
                    from: nf, to: nt, ..
                },
            ) => *from + *count == *nf && *to + *count == *nt,
            _ => false,
        }
    }

    /// Collapses `next` into this patch. Assumes [`Patch::can_merge`];
    /// behavior is unspecified otherwise.
    pub fn merge(&mut self, next: Patch) {
        match (self, next) {
            (Patch::Remove { from, to }, Patch::Remove { from: nf, to: nt }) => {
                *from = (*from).min(nf);
                *to = (*to).max(nt);
            }
            (Patch::Insert { to, data, .. }, Patch::Insert { data: next_data, .. }) => {
                *to += next_data.len() as isize;
                data.extend(next_data);
            }
            (Patch::Move { count, .. }, Patch::Move { count: next_count, .. }) => {
                *count += next_count;
            }
            _ => {}
        }
    }

    /// Non-destructive merge; `None` where the patches do not merge.
    pub fn merged(&self, next: &Patch) -> Option<Patch> {
        if !self.can_merge(next) {
            return None;
        }
        let mut res = self.clone();
        res.merge(next.clone());
        Some(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("id".to_string(), json!(id));
        map
    }

    #[test]
    fn cross_kind_pairs_never_merge() {
        let mv = Patch::Move {
            from: 0,
            to: 1,
            count: 1,
        };
        let ins = Patch::insert(0, vec![record("a")]);
        assert!(!mv.can_merge(&ins));
        assert!(!ins.can_merge(&mv));
        assert!(mv.merged(&ins).is_none());
    }

    #[test]
    fn adjacent_removes_merge_from_either_side() {
        let a = Patch::remove(0, 0);
        let b = Patch::remove(1, 1);

        assert!(a.can_merge(&b));
        assert!(b.can_merge(&a));

        let ab = a.merged(&b).unwrap();
        let ba = b.merged(&a).unwrap();
        assert_eq!(ab, Patch::remove(0, 1));
        assert_eq!(ab, ba);

        let c = Patch::remove(2, 2);
        assert!(!a.can_merge(&c));
        assert!(!c.can_merge(&a));
    }

    #[test]
    fn parallel_adjacent_moves_merge_forward_only() {
        let a = Patch::Move {
            from: 1,
            to: 0,
            count: 1,
        };
        let b = Patch::Move {
            from: 2,
            to: 1,
            count: 1,
        };

        assert!(a.can_merge(&b));
        assert!(!b.can_merge(&a));
        assert!(b.merged(&a).is_none());

        assert_eq!(
            a.merged(&b).unwrap(),
            Patch::Move {
                from: 1,
                to: 0,
                count: 2,
            }
        );
    }

    #[test]
    fn insert_runs_extend_and_concatenate_data() {
        let a = Patch::insert(0, vec![record("a")]);
        let b = Patch::insert(1, vec![record("b")]);
        let c = Patch::insert(2, vec![record("c")]);

        assert!(a.can_merge(&b));
        assert!(!b.can_merge(&a));

        let mut ab = a.merged(&b).unwrap();
        assert_eq!(
            ab,
            Patch::Insert {
                from: 0,
                to: 1,
                data: vec![record("a"), record("b")],
            }
        );

        assert!(ab.can_merge(&c));
        ab.merge(c);
        assert_eq!(ab.count(), 3);
        assert_eq!(
            ab,
            Patch::Insert {
                from: 0,
                to: 2,
                data: vec![record("a"), record("b"), record("c")],
            }
        );
    }

    #[test]
    fn inserts_at_the_same_point_merge() {
        let a = Patch::insert(0, vec![record("a")]);
        let b = Patch::insert(0, vec![record("b")]);

        assert!(a.can_merge(&b));
        assert!(b.can_merge(&a));

        let merged = a.merged(&b).unwrap();
        assert_eq!(
            merged,
            Patch::Insert {
                from: 0,
                to: 1,
                data: vec![record("a"), record("b")],
            }
        );
    }

    #[test]
    fn updates_never_merge() {
        let a = Patch::update(0, record("a"));
        let b = Patch::update(1, record("b"));
        assert!(!a.can_merge(&b));
    }
}
