//! Keyed list differencing.
//!
//! Compares two lists of records and produces a patch script — batched
//! [`Patch::Insert`], [`Patch::Remove`], [`Patch::Move`] operations followed
//! by per-record field [`Patch::Update`]s — that transforms the first list
//! into the second when applied in order.
//!
//! The differ is heuristic rather than minimal-edit-distance: it runs in
//! O(n) expected time over a key → position hash and favors the common
//! shapes (append, truncate, contiguous moves). Records are matched by a
//! configurable key; unkeyed lists degrade to a positional compare.
//!
//! ```
//! use keydiff::{apply, DiffRunner};
//! use serde_json::json;
//!
//! let runner = DiffRunner::with_key_field("id");
//! let from = vec![json!({"id": "a"}), json!({"id": "b"})];
//! let to = vec![json!({"id": "b"}), json!({"id": "a"})];
//!
//! let patches = runner.compare(&from, &to);
//! let mut synced = from.clone();
//! apply(&mut synced, &patches).unwrap();
//! assert_eq!(synced, to);
//! ```

pub mod apply;
pub mod item;
pub mod map_diff;
pub mod patch;
pub mod runner;

pub use apply::{apply, ApplyError};
pub use item::{Item, VariantItem};
pub use map_diff::diff_maps;
pub use patch::{Patch, PatchKind};
pub use runner::DiffRunner;
