use serde_json::Value;
use thiserror::Error;

use crate::patch::Patch;

#[derive(Debug, Error, PartialEq)]
pub enum ApplyError {
    #[error("patch range {from}..={to} out of bounds for list of {len}")]
    OutOfRange { from: isize, to: isize, len: usize },
    #[error("update target at {index} is not an object")]
    NotAnObject { index: isize },
}

/// Applies a patch script in order, transforming `items` in place.
///
/// Each patch addresses the list as left by the patches before it, which is
/// the coordinate system the differ emits. Update field maps are merged into
/// the target object; a `Null` field value removes the key.
pub fn apply(items: &mut Vec<Value>, patches: &[Patch]) -> Result<(), ApplyError> {
    for patch in patches {
        apply_one(items, patch)?;
    }
    Ok(())
}

fn apply_one(items: &mut Vec<Value>, patch: &Patch) -> Result<(), ApplyError> {
    match patch {
        Patch::Insert { from, to, data } => {
            let at = checked_index(*from, *to, items.len(), true)?;
            items.splice(
                at..at,
                data.iter().map(|map| Value::Object(map.clone())),
            );
        }
        Patch::Remove { from, to } => {
            if *from > *to {
                return Err(ApplyError::OutOfRange {
                    from: *from,
                    to: *to,
                    len: items.len(),
                });
            }
            let lo = checked_index(*from, *to, items.len(), false)?;
            let hi = checked_index(*to, *to, items.len(), false)?;
            items.drain(lo..=hi);
        }
        Patch::Move { from, to, count } => {
            let lo = checked_index(*from, *to, items.len(), false)?;
            if *count < 1 || lo + *count as usize > items.len() {
                return Err(ApplyError::OutOfRange {
                    from: *from,
                    to: *from + *count - 1,
                    len: items.len(),
                });
            }
            let hi = lo + *count as usize;
            let moved: Vec<Value> = items.drain(lo..hi).collect();
            let at = checked_index(*to, *to, items.len(), true)?;
            items.splice(at..at, moved);
        }
        Patch::Update { index, data } => {
            let at = checked_index(*index, *index, items.len(), false)?;
            let target = items[at]
                .as_object_mut()
                .ok_or(ApplyError::NotAnObject { index: *index })?;
            for (key, value) in data {
                if value.is_null() {
                    target.remove(key);
                } else {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
    }
    Ok(())
}

// An index equal to `len` is a valid insertion point but not a valid element.
fn checked_index(
    index: isize,
    range_end: isize,
    len: usize,
    insertion: bool,
) -> Result<usize, ApplyError> {
    let limit = if insertion { len as isize } else { len as isize - 1 };
    if index < 0 || index > limit {
        return Err(ApplyError::OutOfRange {
            from: index,
            to: range_end,
            len,
        });
    }
    Ok(index as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::Patch;
    use serde_json::{json, Map, Value};

    fn record(id: &str) -> Value {
        json!({"id": id})
    }

    fn record_map(id: &str) -> Map<String, Value> {
        match record(id) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn insert_splices_at_position() {
        let mut items = vec![record("a"), record("d")];
        let patch = Patch::insert(1, vec![record_map("b"), record_map("c")]);
        apply(&mut items, &[patch]).unwrap();
        assert_eq!(
            items,
            vec![record("a"), record("b"), record("c"), record("d")]
        );
    }

    #[test]
    fn remove_drains_the_range() {
        let mut items = vec![record("a"), record("b"), record("c"), record("d")];
        apply(&mut items, &[Patch::remove(1, 2)]).unwrap();
        assert_eq!(items, vec![record("a"), record("d")]);
    }

    #[test]
    fn move_extracts_and_reinserts() {
        let mut items = vec![record("a"), record("b"), record("c"), record("d")];
        let patch = Patch::Move {
            from: 2,
            to: 0,
            count: 2,
        };
        apply(&mut items, &[patch]).unwrap();
        assert_eq!(
            items,
            vec![record("c"), record("d"), record("a"), record("b")]
        );
    }

    #[test]
    fn update_merges_fields_and_removes_null_markers() {
        let mut items = vec![json!({"id": "a", "old": 1, "kept": true})];
        let mut data = Map::new();
        data.insert("old".to_string(), Value::Null);
        data.insert("fresh".to_string(), json!(2));
        apply(&mut items, &[Patch::update(0, data)]).unwrap();
        assert_eq!(items, vec![json!({"id": "a", "kept": true, "fresh": 2})]);
    }

    #[test]
    fn out_of_range_remove_is_an_error() {
        let mut items = vec![record("a")];
        let err = apply(&mut items, &[Patch::remove(0, 1)]).unwrap_err();
        assert_eq!(
            err,
            ApplyError::OutOfRange {
                from: 1,
                to: 1,
                len: 1
            }
        );
    }

    #[test]
    fn update_of_scalar_is_an_error() {
        let mut items = vec![json!(1)];
        let err = apply(&mut items, &[Patch::update(0, record_map("a"))]).unwrap_err();
        assert_eq!(err, ApplyError::NotAnObject { index: 0 });
    }
}
