//! Dropping children of `Dict`/`Tuple` spaces and of the values that belong to them.
//!
//! A `bool` argument on a composite child keeps (`true`) or drops (`false`) that child whatever
//! its kind; a nested argument tree filters inside it. Children without an argument are kept.

use std::sync::Arc;

use super::{ArgTree, Level, index_path, key_path, level};
use crate::core::{GymError, Result};
use crate::spaces::{DictSpace, DynSpace, TupleSpace, Value};

/// What happens to one child.
enum Keep<'a> {
    All,
    Drop,
    Nested(&'a ArgTree<bool>),
}

fn keep(arg: Option<&ArgTree<bool>>) -> Keep<'_> {
    match arg {
        None | Some(ArgTree::Unset) | Some(ArgTree::Leaf(true)) => Keep::All,
        Some(ArgTree::Leaf(false)) => Keep::Drop,
        Some(nested) => Keep::Nested(nested),
    }
}

fn root_leaf(space: &DynSpace, args: &ArgTree<bool>) -> Result<bool> {
    match args {
        ArgTree::Unset | ArgTree::Leaf(true) => Ok(true),
        ArgTree::Leaf(false) => Err(GymError::InvalidSpaceOperation(format!(
            "filtering would remove the whole {} space",
            space.kind()
        ))),
        _ => Ok(false),
    }
}

/// Filter the children of `space`.
pub fn filter_space(space: &DynSpace, args: &ArgTree<bool>) -> Result<DynSpace> {
    if root_leaf(space, args)? {
        return Ok(space.clone());
    }
    filter_space_at(space, args, "root")
}

fn filter_space_at(space: &DynSpace, args: &ArgTree<bool>, path: &str) -> Result<DynSpace> {
    match level(space, args, path)? {
        Level::Unset | Level::Leaf(_) => Ok(space.clone()),
        Level::Dict(dict, per_key) => {
            let mut children = Vec::with_capacity(dict.len());
            for ((k, child), arg) in dict.iter_shared().zip(per_key) {
                match keep(arg) {
                    Keep::All => children.push((k.to_string(), Arc::clone(child))),
                    Keep::Drop => {}
                    Keep::Nested(nested) => {
                        let sub = filter_space_at(child, nested, &key_path(path, k))?;
                        children.push((k.to_string(), Arc::new(sub)));
                    }
                }
            }
            Ok(DictSpace::from_shared(children).into())
        }
        Level::Tuple(tuple, per_index) => {
            let mut children = Vec::with_capacity(tuple.len());
            for (i, (child, arg)) in tuple.iter_shared().zip(per_index).enumerate() {
                match keep(Some(arg)) {
                    Keep::All => children.push(Arc::clone(child)),
                    Keep::Drop => {}
                    Keep::Nested(nested) => {
                        children.push(Arc::new(filter_space_at(child, nested, &index_path(path, i))?));
                    }
                }
            }
            Ok(TupleSpace::from_shared(children).into())
        }
    }
}

/// Filter a value of `space` with the same arguments given to [`filter_space`].
pub fn filter_value(space: &DynSpace, value: Value, args: &ArgTree<bool>) -> Result<Value> {
    if root_leaf(space, args)? {
        return Ok(value);
    }
    filter_value_at(space, value, args, "root")
}

fn filter_value_at(space: &DynSpace, value: Value, args: &ArgTree<bool>, path: &str) -> Result<Value> {
    match (level(space, args, path)?, value) {
        (Level::Unset | Level::Leaf(_), value) => Ok(value),
        (Level::Dict(dict, per_key), Value::Dict(mut entries)) => {
            let mut out = Vec::with_capacity(entries.len());
            for ((k, child), arg) in dict.iter().zip(per_key) {
                let pos = entries.iter().position(|(key, _)| key == k).ok_or_else(|| {
                    GymError::InvalidValue(format!("value at {path} has no key `{k}`"))
                })?;
                let (key, v) = entries.swap_remove(pos);
                match keep(arg) {
                    Keep::All => out.push((key, v)),
                    Keep::Drop => {}
                    Keep::Nested(nested) => {
                        let sub = filter_value_at(child, v, nested, &key_path(path, k))?;
                        out.push((key, sub));
                    }
                }
            }
            Ok(Value::Dict(out))
        }
        (Level::Tuple(tuple, per_index), Value::Tuple(items)) => {
            if items.len() != tuple.len() {
                return Err(GymError::InvalidValue(format!(
                    "value at {path} has {} items, expected {}",
                    items.len(),
                    tuple.len()
                )));
            }
            let mut out = Vec::with_capacity(items.len());
            for (i, ((child, arg), v)) in tuple.iter().zip(per_index).zip(items).enumerate() {
                match keep(Some(arg)) {
                    Keep::All => out.push(v),
                    Keep::Drop => {}
                    Keep::Nested(nested) => out.push(filter_value_at(child, v, nested, &index_path(path, i))?),
                }
            }
            Ok(Value::Tuple(out))
        }
        (_, other) => Err(GymError::InvalidValue(format!(
            "value of kind {} at {path} does not match space {space}",
            other.kind()
        ))),
    }
}
