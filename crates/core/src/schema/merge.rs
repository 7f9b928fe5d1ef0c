//! Deep merge of declarative descriptions.
//!
//! A private description is laid over a public one key by key. The overlay is
//! turned into an explicit [`Patch`] first, so "leave this key alone" and
//! "remove this key" are distinct values rather than two readings of a missing
//! entry.

use serde_json::{Map, Value};

use super::types::{OPTIONAL_KEY, REQUIRED_KEY, TypeName};

/// Change to apply to one value.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Leave the target as it is.
    Keep,
    /// Remove the target key.
    Delete,
    /// Replace the target wholesale.
    Override(Value),
    /// Merge key by key into a container target.
    Merge(PatchMap),
}

/// Keyed patches for a container. Arrays are keyed by their indices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatchMap {
    entries: Vec<(String, Patch)>,
    sequence: bool,
}

impl PatchMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the patch for `key`.
    pub fn set(mut self, key: impl Into<String>, patch: Patch) -> Self {
        let key = key.into();
        self.entries.retain(|(k, _)| *k != key);
        self.entries.push((key, patch));
        self
    }

    fn get(&self, key: &str) -> Option<&Patch> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, p)| p)
    }
}

impl Patch {
    /// Patch described by an overlay value.
    ///
    /// Objects and arrays merge into the target, `null` deletes the key it
    /// sits under, anything else overrides. A `null` overlay as a whole leaves
    /// the target untouched.
    pub fn from_overlay(overlay: &Value) -> Self {
        match overlay {
            Value::Null => Patch::Keep,
            other => Self::from_value(other),
        }
    }

    fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Patch::Delete,
            Value::Object(map) => Patch::Merge(PatchMap {
                entries: map.iter().map(|(k, v)| (k.clone(), Self::from_value(v))).collect(),
                sequence: false,
            }),
            Value::Array(items) => Patch::Merge(PatchMap {
                entries: items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), Self::from_value(v)))
                    .collect(),
                sequence: true,
            }),
            scalar => Patch::Override(scalar.clone()),
        }
    }

    /// The value this patch produces when there is nothing to merge into.
    fn materialize(&self) -> Option<Value> {
        match self {
            Patch::Keep | Patch::Delete => None,
            Patch::Override(value) => Some(value.clone()),
            Patch::Merge(map) => {
                let entries = map.entries.iter().filter_map(|(k, p)| p.materialize().map(|v| (k.clone(), v)));
                if map.sequence {
                    Some(Value::Array(entries.map(|(_, v)| v).collect()))
                } else {
                    Some(Value::Object(entries.collect()))
                }
            }
        }
    }
}

/// Apply `patch` to `target`. `None` means the key is deleted.
///
/// Containers merge recursively and keep the target's kind: an array target
/// stays an array, an object target stays an object. Non-container targets are
/// replaced by the patch.
pub fn deep_assign(target: &Value, patch: &Patch) -> Option<Value> {
    match patch {
        Patch::Keep => Some(target.clone()),
        Patch::Delete => None,
        Patch::Override(value) => Some(value.clone()),
        Patch::Merge(map) => match target {
            Value::Object(obj) => {
                let keys = obj.keys().cloned().collect::<Vec<_>>();
                Some(Value::Object(merge_entries(keys, |k| obj.get(k), map)))
            }
            Value::Array(items) => {
                let keys = (0..items.len()).map(|i| i.to_string()).collect::<Vec<_>>();
                let merged = merge_entries(keys, |k| k.parse::<usize>().ok().and_then(|i| items.get(i)), map);
                let mut indexed: Vec<(usize, Value)> = merged
                    .into_iter()
                    .filter_map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, v)))
                    .collect();
                indexed.sort_by_key(|(i, _)| *i);
                Some(Value::Array(indexed.into_iter().map(|(_, v)| v).collect()))
            }
            _ => patch.materialize(),
        },
    }
}

fn merge_entries<'a>(
    target_keys: Vec<String>,
    lookup: impl Fn(&str) -> Option<&'a Value>,
    patches: &PatchMap,
) -> Map<String, Value> {
    let mut keys = target_keys;
    for (k, _) in &patches.entries {
        if !keys.contains(k) {
            keys.push(k.clone());
        }
    }

    let mut out = Map::new();
    for key in keys {
        let patch = patches.get(&key).unwrap_or(&Patch::Keep);
        let merged = match lookup(&key) {
            Some(existing) => deep_assign(existing, patch),
            None => patch.materialize(),
        };
        if let Some(value) = merged {
            out.insert(key, value);
        }
    }
    out
}

/// Lay `overlay` over `base` (see [`Patch::from_overlay`]).
pub fn merge_values(base: &Value, overlay: &Value) -> Value {
    deep_assign(base, &Patch::from_overlay(overlay)).unwrap_or(Value::Null)
}

/// Lay a private declarative description over a public one.
///
/// A field the private side declares is first moved, in the public side, to
/// the same `required`/`optional` half and type key, so the private placement
/// wins regardless of key order. Moving within one type keeps the public
/// options under the private ones. A change of type drops the public
/// declaration. Nested object declarations are handled the same way.
pub fn merge_collections(public: &Value, private: &Value) -> Value {
    let mut public = public.clone();
    if let (Value::Object(base), Value::Object(overlay)) = (&mut public, private) {
        relocate_fields(base, overlay);
    }
    merge_values(&public, private)
}

fn relocate_fields(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for half in [REQUIRED_KEY, OPTIONAL_KEY] {
        let Some(Value::Object(groups)) = overlay.get(half) else { continue };
        for (type_key, fields) in groups {
            let Value::Object(fields) = fields else { continue };
            for (name, declaration) in fields {
                if declaration.is_null() {
                    continue;
                }
                if let Some(moved) = take_misplaced(base, half, type_key, name) {
                    tracing::debug!(field = %name, half, type_key = %type_key, "moved public declaration");
                    if let Some(slot) = group_mut(base, half, type_key)
                        && !slot.contains_key(name)
                    {
                        slot.insert(name.clone(), moved);
                    }
                }
                if type_key == TypeName::Object.as_str()
                    && let Value::Object(nested_overlay) = declaration
                    && let Some(Value::Object(nested_base)) =
                        group_mut(base, half, type_key).and_then(|slot| slot.get_mut(name))
                {
                    relocate_fields(nested_base, nested_overlay);
                }
            }
        }
    }
}

/// Remove `name` from every slot of `base` other than `half`/`type_key`.
/// Returns the removed declaration when it had the same type.
fn take_misplaced(base: &mut Map<String, Value>, half: &str, type_key: &str, name: &str) -> Option<Value> {
    let mut same_type = None;
    for other_half in [REQUIRED_KEY, OPTIONAL_KEY] {
        let Some(Value::Object(groups)) = base.get_mut(other_half) else { continue };
        for (other_type, fields) in groups.iter_mut() {
            if other_half == half && other_type == type_key {
                continue;
            }
            let Value::Object(fields) = fields else { continue };
            if let Some(removed) = fields.shift_remove(name)
                && other_type == type_key
            {
                same_type = Some(removed);
            }
        }
    }
    same_type
}

/// The field map under `half`/`type_key`, created when missing.
fn group_mut<'a>(base: &'a mut Map<String, Value>, half: &str, type_key: &str) -> Option<&'a mut Map<String, Value>> {
    let groups = base.entry(half).or_insert_with(|| Value::Object(Map::new())).as_object_mut()?;
    groups.entry(type_key).or_insert_with(|| Value::Object(Map::new())).as_object_mut()
}
