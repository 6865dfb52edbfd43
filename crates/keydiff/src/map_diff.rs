use serde_json::{Map, Value};

/// Field-level difference from `a` to `b`.
///
/// Returns every entry of `b` whose value differs from the one in `a`, plus
/// a `Null` marker for every key present in `a` only. Empty when the maps
/// are equal.
pub fn diff_maps(a: &Map<String, Value>, b: &Map<String, Value>) -> Map<String, Value> {
    let mut res = Map::new();
    for (key, value) in b {
        if a.get(key) != Some(value) {
            res.insert(key.clone(), value.clone());
        }
    }
    for key in a.keys() {
        if !b.contains_key(key) {
            res.insert(key.clone(), Value::Null);
        }
    }
    res
}
