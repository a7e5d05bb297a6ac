//! Structural diffs between serialized entities
//!
//! The snapshot service serializes every entity to JSON and, for each
//! viewer, sends only what changed since that viewer's previous snapshot.
//! A change is a list of patches against one entity:
//!
//! - scalar fields and structured arrays are replaced whole
//! - nested objects recurse, producing dotted paths like `art.tint`
//! - arrays of entity ids are treated as sets: elements only ever leave
//!   by index and arrive by append, so a reorder-free array (ours are
//!   kept in ascending id order) reconstructs exactly
//!
//! [`apply_patches`] is the receiving side, shared by tests and the
//! replay viewer. Applying a patch that does not fit the target means
//! the two sides have diverged, which is corruption, not bad input.

use crate::game::patch_path::{self, PathSegment};
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchOp {
    Replace,
    Add,
    Remove,
}

/// One structural edit against one entity's serialized form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub op: PatchOp,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Patch {
    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Patch {
            op: PatchOp::Replace,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Patch {
            op: PatchOp::Add,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Patch {
            op: PatchOp::Remove,
            path: path.into(),
            value: None,
        }
    }
}

/// Diff two serialized entities. Returns the patches that transform
/// `prev` into `next`; empty when they are equal.
pub fn diff_entity(prev: &Value, next: &Value) -> Vec<Patch> {
    let mut patches = Vec::new();
    match (prev.as_object(), next.as_object()) {
        (Some(prev), Some(next)) => diff_object("", prev, next, &mut patches),
        // Entities always serialize to objects; anything else is a
        // whole-value swap.
        _ => {
            if prev != next {
                patches.push(Patch::replace("", next.clone()));
            }
        }
    }
    patches
}

fn diff_object(prefix: &str, prev: &Map<String, Value>, next: &Map<String, Value>, out: &mut Vec<Patch>) {
    for (key, next_value) in next {
        let path = join(prefix, key);
        match prev.get(key) {
            None => out.push(Patch::add(path, next_value.clone())),
            Some(prev_value) if prev_value == next_value => {}
            Some(prev_value) => diff_field(&path, prev_value, next_value, out),
        }
    }
    for key in prev.keys() {
        if !next.contains_key(key) {
            out.push(Patch::remove(join(prefix, key)));
        }
    }
}

fn diff_field(path: &str, prev: &Value, next: &Value, out: &mut Vec<Patch>) {
    match (prev, next) {
        (Value::Object(prev), Value::Object(next)) => diff_object(path, prev, next, out),
        (Value::Array(prev), Value::Array(next))
            if is_id_array(prev) && is_id_array(next) =>
        {
            diff_id_array(path, prev, next, out)
        }
        _ => out.push(Patch::replace(path, next.clone())),
    }
}

/// Set-difference patches for an id array: removals by descending index
/// so earlier removals never shift later ones, then appends. Order is
/// preserved exactly because new ids are always allocated above old
/// ones and the engine keeps these arrays id-sorted.
fn diff_id_array(path: &str, prev: &[Value], next: &[Value], out: &mut Vec<Patch>) {
    for (i, id) in prev.iter().enumerate().rev() {
        if !next.contains(id) {
            out.push(Patch::remove(format!("{path}[{i}]")));
        }
    }
    for id in next {
        if !prev.contains(id) {
            out.push(Patch::add(format!("{path}[-]"), id.clone()));
        }
    }
}

fn is_id_array(values: &[Value]) -> bool {
    values.iter().all(Value::is_u64)
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Apply patches in order, mutating `target` in place
pub fn apply_patches(target: &mut Value, patches: &[Patch]) -> Result<()> {
    for patch in patches {
        apply_patch(target, patch)?;
    }
    Ok(())
}

pub fn apply_patch(target: &mut Value, patch: &Patch) -> Result<()> {
    let segments = patch_path::parse(&patch.path)?;
    let (last, walk) = segments
        .split_last()
        .ok_or_else(|| mismatch(patch, "empty path"))?;

    let mut cursor = target;
    for segment in walk {
        cursor = match segment {
            PathSegment::Field(name) => cursor
                .get_mut(name.as_str())
                .ok_or_else(|| mismatch(patch, "missing field on path"))?,
            PathSegment::Index(i) => cursor
                .get_mut(*i)
                .ok_or_else(|| mismatch(patch, "index out of bounds on path"))?,
            PathSegment::Append => return Err(mismatch(patch, "append mid-path")),
        };
    }

    match patch.op {
        PatchOp::Replace => {
            let value = required_value(patch)?;
            match last {
                PathSegment::Field(name) => {
                    let slot = cursor
                        .get_mut(name.as_str())
                        .ok_or_else(|| mismatch(patch, "replacing a missing field"))?;
                    *slot = value;
                }
                PathSegment::Index(i) => {
                    let slot = cursor
                        .get_mut(*i)
                        .ok_or_else(|| mismatch(patch, "replacing past the end"))?;
                    *slot = value;
                }
                PathSegment::Append => return Err(mismatch(patch, "replace at append")),
            }
        }
        PatchOp::Add => {
            let value = required_value(patch)?;
            match last {
                PathSegment::Field(name) => {
                    let obj = cursor
                        .as_object_mut()
                        .ok_or_else(|| mismatch(patch, "adding a field to a non-object"))?;
                    obj.insert(name.clone(), value);
                }
                PathSegment::Index(i) => {
                    let arr = cursor
                        .as_array_mut()
                        .ok_or_else(|| mismatch(patch, "inserting into a non-array"))?;
                    if *i > arr.len() {
                        return Err(mismatch(patch, "insert index out of bounds"));
                    }
                    arr.insert(*i, value);
                }
                PathSegment::Append => {
                    let arr = cursor
                        .as_array_mut()
                        .ok_or_else(|| mismatch(patch, "appending to a non-array"))?;
                    arr.push(value);
                }
            }
        }
        PatchOp::Remove => match last {
            PathSegment::Field(name) => {
                let obj = cursor
                    .as_object_mut()
                    .ok_or_else(|| mismatch(patch, "removing a field from a non-object"))?;
                if obj.remove(name).is_none() {
                    return Err(mismatch(patch, "removing a missing field"));
                }
            }
            PathSegment::Index(i) => {
                let arr = cursor
                    .as_array_mut()
                    .ok_or_else(|| mismatch(patch, "removing from a non-array"))?;
                if *i >= arr.len() {
                    return Err(mismatch(patch, "remove index out of bounds"));
                }
                arr.remove(*i);
            }
            PathSegment::Append => return Err(mismatch(patch, "remove at append")),
        },
    }
    Ok(())
}

fn required_value(patch: &Patch) -> Result<Value> {
    patch
        .value
        .clone()
        .ok_or_else(|| mismatch(patch, "missing value"))
}

fn mismatch(patch: &Patch, why: &str) -> EngineError {
    EngineError::CorruptState(format!("patch {:?} {} does not apply: {}", patch.op, patch.path, why))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn round_trip(prev: &Value, next: &Value) -> Vec<Patch> {
        let patches = diff_entity(prev, next);
        let mut applied = prev.clone();
        apply_patches(&mut applied, &patches).unwrap();
        assert_eq!(&applied, next, "patches do not reconstruct the target");
        patches
    }

    #[test]
    fn test_equal_entities_produce_no_patches() {
        let entity = json!({ "power": 2, "modifiers": [1, 2] });
        assert!(diff_entity(&entity, &entity).is_empty());
    }

    #[test]
    fn test_scalar_change_is_one_replace() {
        let prev = json!({ "power": 2, "hp": 3 });
        let next = json!({ "power": 5, "hp": 3 });
        let patches = round_trip(&prev, &next);
        assert_eq!(patches, vec![Patch::replace("power", json!(5))]);
    }

    #[test]
    fn test_nested_field_gets_dotted_path() {
        let prev = json!({ "art": { "frame": "gold", "tint": "red" } });
        let next = json!({ "art": { "frame": "gold", "tint": "blue" } });
        let patches = round_trip(&prev, &next);
        assert_eq!(patches, vec![Patch::replace("art.tint", json!("blue"))]);
    }

    #[test]
    fn test_id_array_uses_set_difference() {
        let prev = json!({ "modifiers": [1, 4, 6] });
        let next = json!({ "modifiers": [1, 6, 9] });
        let patches = round_trip(&prev, &next);
        assert_eq!(
            patches,
            vec![
                Patch::remove("modifiers[1]"),
                Patch::add("modifiers[-]", json!(9)),
            ]
        );
    }

    #[test]
    fn test_id_array_multiple_removals_do_not_shift() {
        let prev = json!({ "modifiers": [3, 5, 8, 13] });
        let next = json!({ "modifiers": [5, 21] });
        round_trip(&prev, &next);
    }

    #[test]
    fn test_structured_array_replaced_whole() {
        let prev = json!({ "entries": [{ "kind": "a" }, { "kind": "b" }] });
        let next = json!({ "entries": [{ "kind": "a" }] });
        let patches = round_trip(&prev, &next);
        assert_eq!(
            patches,
            vec![Patch::replace("entries", json!([{ "kind": "a" }]))]
        );
    }

    #[test]
    fn test_field_appears_and_disappears() {
        let prev = json!({ "hp": 3, "stale": true });
        let next = json!({ "hp": 3, "fresh": 1 });
        let patches = round_trip(&prev, &next);
        assert!(patches.contains(&Patch::add("fresh", json!(1))));
        assert!(patches.contains(&Patch::remove("stale")));
    }

    #[test]
    fn test_card_shaped_entity_round_trips() {
        let prev = json!({
            "id": 7,
            "name": "Ember Whelp",
            "power": 2,
            "hp": 2,
            "damage": 0,
            "exhausted": false,
            "art": { "frame": "plain", "tint": "ash" },
            "modifiers": [11],
        });
        let next = json!({
            "id": 7,
            "name": "Ember Whelp",
            "power": 2,
            "hp": 2,
            "damage": 1,
            "exhausted": true,
            "art": { "frame": "plain", "tint": "ember" },
            "modifiers": [11, 14],
        });
        let patches = round_trip(&prev, &next);
        assert_eq!(
            patches,
            vec![
                Patch::replace("art.tint", json!("ember")),
                Patch::replace("damage", json!(1)),
                Patch::replace("exhausted", json!(true)),
                Patch::add("modifiers[-]", json!(14)),
            ]
        );
    }

    #[test]
    fn test_empty_array_transitions() {
        round_trip(&json!({ "modifiers": [] }), &json!({ "modifiers": [4] }));
        round_trip(&json!({ "modifiers": [4] }), &json!({ "modifiers": [] }));
    }

    #[test]
    fn test_patch_against_wrong_shape_is_corruption() {
        let mut target = json!({ "power": 2 });
        let err = apply_patch(&mut target, &Patch::replace("hp", json!(4))).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(target, json!({ "power": 2 }));

        let mut target = json!({ "modifiers": [1] });
        let err = apply_patch(&mut target, &Patch::remove("modifiers[3]")).unwrap_err();
        assert!(err.is_fatal());
    }
}
