use std::collections::HashMap;

use rank_forest::RankTree;
use serde_json::{Map, Value};
use tracing::warn;

use crate::item::{Item, VariantItem};
use crate::map_diff::diff_maps;
use crate::patch::Patch;

/// Converts a record and its list index into a field map, overriding the
/// adapter's `to_map`.
pub type Converter<T> = Box<dyn Fn(&T, usize) -> Map<String, Value>>;

/// Keyed list differ.
///
/// Holds only configuration — the record adapter and an optional map
/// converter. All per-comparison state lives inside [`DiffRunner::compare`],
/// so the borrow of the input slices ends when the call returns; concurrent
/// comparisons still want one runner each.
pub struct DiffRunner<T, I> {
    item: I,
    converter: Option<Converter<T>>,
}

impl DiffRunner<Value, VariantItem> {
    /// Runner over `serde_json::Value` records keyed by the given field.
    pub fn with_key_field(name: impl Into<String>) -> Self {
        Self::new(VariantItem::with_key_field(name))
    }

    pub fn set_key_field(&mut self, name: impl Into<String>) {
        self.item.set_key_field(name);
    }
}

impl<T, I: Item<T>> DiffRunner<T, I> {
    pub fn new(item: I) -> Self {
        Self {
            item,
            converter: None,
        }
    }

    /// Overrides how records become field maps for insert payloads and
    /// update diffs. The default is the adapter's `to_map`.
    pub fn set_converter(&mut self, f: impl Fn(&T, usize) -> Map<String, Value> + 'static) {
        self.converter = Some(Box::new(f));
    }

    /// Computes the patch script that transforms `from` into `to`.
    ///
    /// Always returns a well-formed script. Structural patches come first,
    /// in to-list walk order, followed by all field updates. Lists sharing
    /// the same backing slice compare equal without any work.
    pub fn compare(&self, from: &[T], to: &[T]) -> Vec<Patch> {
        if std::ptr::eq(from, to) {
            return Vec::new();
        }
        Walk {
            item: &self.item,
            converter: self.converter.as_ref(),
            from,
            to,
            hash: HashMap::new(),
            patches: Vec::new(),
            update_patches: Vec::new(),
            remove_start: -1,
            removing: 0,
            insert_start: -1,
            skipped: 0,
            index_f: -1,
            index_t: -1,
            key_f: String::new(),
            key_t: String::new(),
            pending_move: None,
            tree: RankTree::new(),
        }
        .run()
    }
}

/// Classification of a record during the dual-cursor walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Insert,
    Remove,
    Move,
    NoMove,
}

/// Per-key positions in both lists; −1 means not present. Written back into
/// the hash as the cursors advance.
#[derive(Debug, Clone, Copy)]
struct State {
    pos_f: isize,
    pos_t: isize,
    is_moved: bool,
}

impl Default for State {
    fn default() -> Self {
        Self {
            pos_f: -1,
            pos_t: -1,
            is_moved: false,
        }
    }
}

/// A run of adjacent single-record moves, buffered until it stops growing.
#[derive(Debug, Clone, Copy)]
struct MoveOp {
    pos_f: isize,
    from: isize,
    to: isize,
    count: isize,
}

impl MoveOp {
    fn can_merge(&self, next: &MoveOp) -> bool {
        self.pos_f + self.count == next.pos_f && self.to + self.count == next.to
    }

    fn merge(&mut self, next: &MoveOp) {
        self.count += next.count;
    }
}

/// All state of one comparison; built at the top of `compare` and dropped at
/// return.
struct Walk<'a, T, I> {
    item: &'a I,
    converter: Option<&'a Converter<T>>,
    from: &'a [T],
    to: &'a [T],
    hash: HashMap<String, State>,
    /// Structural patches, in to-list walk order.
    patches: Vec<Patch>,
    /// Field updates, appended after the structural patches by `combine`.
    update_patches: Vec<Patch>,
    remove_start: isize,
    removing: isize,
    insert_start: isize,
    skipped: usize,
    index_f: isize,
    index_t: isize,
    key_f: String,
    key_t: String,
    pending_move: Option<MoveOp>,
    tree: RankTree,
}

impl<'a, T, I: Item<T>> Walk<'a, T, I> {
    fn run(mut self) -> Vec<Patch> {
        if !self.item.has_key() {
            return self.compare_without_key();
        }

        self.preprocess();

        if self.skipped >= self.from.len() && self.skipped >= self.to.len() {
            return self.combine();
        }

        if !self.build_hash_table() {
            // Duplicate or missing keys make the keyed walk unsafe.
            self.patches.clear();
            self.update_patches.clear();
            return self.compare_without_key();
        }

        let item = self.item;
        let from = self.from;
        let to = self.to;
        let from_size = from.len() as isize;
        let to_size = to.len() as isize;

        self.index_f = self.skipped as isize;
        self.index_t = self.skipped as isize;

        while self.index_f < from_size || self.index_t < to_size {
            self.key_f.clear();

            // Advance over the from-list until a record that keeps its
            // position is found.
            while self.index_f < from_size {
                let item_f = &from[self.index_f as usize];
                self.key_f = item.key(item_f);
                let state = self.hash[self.key_f.as_str()];

                if state.pos_t < 0 {
                    self.mark_item_at_from_list(Mark::Remove, state);
                    self.index_f += 1;
                } else if state.is_moved {
                    self.mark_item_at_from_list(Mark::Move, state);
                    self.index_f += 1;
                } else {
                    self.mark_item_at_from_list(Mark::NoMove, state);
                    break;
                }
            }

            if self.index_f >= from_size && self.index_t < to_size {
                // Everything left in the to-list is new.
                let patch = self.create_insert_patch(self.index_t, to_size - 1);
                self.append_patch(patch, false);
                return self.combine();
            }

            // Advance over the to-list until the record matching the
            // from-cursor is reached.
            while self.index_t < to_size {
                let item_t = &to[self.index_t as usize];
                self.key_t = item.key(item_t);
                let state = self.hash[self.key_t.as_str()];

                if state.pos_f < 0 {
                    self.mark_item_at_to_list(Mark::Insert, state);
                    self.index_t += 1;
                } else if self.key_t != self.key_f {
                    self.mark_item_at_to_list(Mark::Move, state);
                    self.index_t += 1;
                } else {
                    self.mark_item_at_to_list(Mark::NoMove, state);
                    self.index_t += 1;
                    self.index_f += 1;
                    break;
                }
            }
        }

        // Flush whatever run is still open.
        self.key_t.clear();
        self.key_f.clear();
        self.mark_item_at_to_list(Mark::NoMove, State::default());
        self.mark_item_at_from_list(Mark::NoMove, State::default());

        self.combine()
    }

    /// Positional compare; backs both the no-key configuration and the
    /// duplicate-key fallback.
    fn compare_without_key(&mut self) -> Vec<Patch> {
        let max = self.from.len().max(self.to.len());
        let mut patches = Vec::new();

        for i in 0..max {
            if i >= self.from.len() {
                let data = vec![self.map_of(&self.to[i], i)];
                patches.push(Patch::insert(i as isize, data));
            } else if i >= self.to.len() {
                patches.push(Patch::remove(i as isize, i as isize));
            } else {
                let diff = self.fast_diff(i as isize, i as isize);
                if !diff.is_empty() {
                    patches.push(Patch::update(i as isize, diff));
                }
            }
        }

        patches
    }

    /// Walks the common prefix, emitting updates for same-key records whose
    /// payloads differ, and short-circuits the pure append / pure truncate
    /// shapes.
    fn preprocess(&mut self) {
        let min = self.from.len().min(self.to.len());
        let mut index = 0;

        while index < min {
            let f = &self.from[index];
            let t = &self.to[index];

            if self.item.is_shared(f, t) {
                index += 1;
                continue;
            }

            if self.item.key(f) != self.item.key(t) {
                break;
            }

            let diff = self.fast_diff(index as isize, index as isize);
            if !diff.is_empty() {
                self.update_patches.push(Patch::update(index as isize, diff));
            }
            index += 1;
        }

        if self.from.len() == index && self.to.len() > index {
            // Records were appended to the end.
            self.skipped = self.to.len();
            let patch = self.create_insert_patch(index as isize, self.to.len() as isize - 1);
            self.append_patch(patch, true);
            return;
        }

        if self.to.len() == index && self.from.len() > index {
            // Records were removed from the end.
            let patch = Patch::remove(index as isize, self.from.len() as isize - 1);
            self.append_patch(patch, true);
            self.skipped = self.from.len();
            return;
        }

        self.skipped = index;
    }

    /// Builds the key → position map over both unskipped tails. Returns
    /// `false` when a duplicate or missing key makes the keyed walk unsafe.
    fn build_hash_table(&mut self) -> bool {
        let reserve = (self.from.len().max(self.to.len()) - self.skipped) * 2 + 100;
        self.hash.reserve(reserve);

        for i in self.skipped..self.from.len() {
            let key = self.item.key(&self.from[i]);
            if key.is_empty() || self.hash.contains_key(&key) {
                warn!(key = %key, "duplicated or missing key, falling back to positional compare");
                return false;
            }
            self.hash.insert(
                key,
                State {
                    pos_f: i as isize,
                    pos_t: -1,
                    is_moved: false,
                },
            );
        }

        for i in self.skipped..self.to.len() {
            let key = self.item.key(&self.to[i]);
            match self.hash.get_mut(&key) {
                Some(state) if state.pos_t >= 0 => {
                    warn!(key = %key, "duplicated or missing key, falling back to positional compare");
                    return false;
                }
                Some(state) => state.pos_t = i as isize,
                None => {
                    if key.is_empty() {
                        warn!("duplicated or missing key, falling back to positional compare");
                        return false;
                    }
                    self.hash.insert(
                        key,
                        State {
                            pos_f: -1,
                            pos_t: i as isize,
                            is_moved: false,
                        },
                    );
                }
            }
        }

        true
    }

    fn mark_item_at_from_list(&mut self, mark: Mark, mut state: State) {
        if self.remove_start >= 0 && mark != Mark::Remove {
            self.append_remove_patches();
        }

        if mark == Mark::Remove {
            if self.remove_start < 0 {
                self.remove_start = self.index_f;
            }
            self.removing += 1;

            if self.index_f == self.from.len() as isize - 1 {
                // Last from-record; the run cannot grow further.
                self.append_remove_patches();
            }
        }

        if mark == Mark::Move {
            self.prune_tree();
        }

        state.pos_f = self.index_f;
        if !self.key_f.is_empty() {
            self.hash.insert(self.key_f.clone(), state);
        }
    }

    fn mark_item_at_to_list(&mut self, mark: Mark, mut state: State) {
        if self.insert_start >= 0 && mark != Mark::Insert {
            let patch = self.create_insert_patch(self.insert_start, self.index_t - 1);
            self.append_patch(patch, false);
            self.insert_start = -1;
        }

        if mark == Mark::Insert && self.insert_start < 0 {
            self.insert_start = self.index_t;
        }

        if mark == Mark::Move {
            let change = MoveOp {
                pos_f: state.pos_f,
                from: self.index_t + state.pos_f - self.index_f,
                to: self.index_t,
                count: 1,
            };

            if let Some(mut pending) = self.pending_move {
                if pending.can_merge(&change) {
                    pending.merge(&change);
                    self.pending_move = Some(pending);
                } else {
                    self.append_move_patch(pending);
                    self.pending_move = Some(change);
                }
            } else {
                self.pending_move = Some(change);
            }

            state.is_moved = true;
            if !self.key_t.is_empty() {
                self.hash.insert(self.key_t.clone(), state);
            }
        } else if let Some(pending) = self.pending_move.take() {
            self.append_move_patch(pending);
        }

        if self.index_t < self.to.len() as isize && (mark == Mark::Move || mark == Mark::NoMove) {
            let diff = self.fast_diff(state.pos_f, self.index_t);
            if !diff.is_empty() {
                self.update_patches.push(Patch::update(self.index_t, diff));
            }
        }
    }

    fn create_insert_patch(&self, from: isize, to: isize) -> Patch {
        let mut data = Vec::with_capacity((to - from + 1) as usize);
        for i in from..=to {
            data.push(self.map_of(&self.to[i as usize], i as usize));
        }
        Patch::insert(from, data)
    }

    fn append_patch(&mut self, patch: Patch, merge: bool) {
        if merge {
            if let Some(last) = self.patches.last_mut() {
                if last.can_merge(&patch) {
                    last.merge(patch);
                    return;
                }
            }
        }
        self.patches.push(patch);
    }

    fn append_move_patch(&mut self, move_op: MoveOp) {
        self.tree.insert(move_op.pos_f, move_op.count);
        // Sources already moved out from the left of this one shift its
        // source index down.
        let offset = self.tree.count_less_than(move_op.pos_f);

        let patch = Patch::Move {
            from: move_op.from - offset,
            to: move_op.to,
            count: move_op.count,
        };
        self.append_patch(patch, true);
    }

    fn append_remove_patches(&mut self) {
        // Removes are reported where the to-cursor stands: the coordinate
        // system after every patch emitted so far.
        let patch = Patch::remove(self.index_t, self.index_t + self.removing - 1);
        self.append_patch(patch, false);

        self.remove_start = -1;
        self.removing = 0;
    }

    /// Drops move sources the from-cursor has caught up with; their shift is
    /// now part of the cursor position itself.
    fn prune_tree(&mut self) {
        while !self.tree.is_empty() && self.tree.min() <= self.index_f {
            let min = self.tree.min();
            self.tree.remove(min);
        }
    }

    fn fast_diff(&self, f: isize, t: isize) -> Map<String, Value> {
        let item_f = &self.from[f as usize];
        let item_t = &self.to[t as usize];
        if self.item.is_shared(item_f, item_t) {
            return Map::new();
        }
        diff_maps(
            &self.map_of(item_f, f as usize),
            &self.map_of(item_t, t as usize),
        )
    }

    fn map_of(&self, record: &T, index: usize) -> Map<String, Value> {
        match self.converter {
            Some(convert) => convert(record, index),
            None => self.item.to_map(record),
        }
    }

    fn combine(mut self) -> Vec<Patch> {
        self.patches.append(&mut self.update_patches);
        self.patches
    }
}
