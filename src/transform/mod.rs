//! Recursive space transformation over nested `Dict`/`Tuple` spaces.
//!
//! A transform pairs a space with an [`ArgTree`]: a partial overlay shaped like the space.
//! Both are walked in lock-step, one level per call. Subtrees whose argument is unset are kept
//! as they are (shared, not copied); leaves with an argument go through a kind-specific leaf
//! transformer such as [`bounds::transform_space_bounds`] or [`reshape::reshape_space`].

pub mod bounds;
pub mod dtype;
pub mod filter;
pub mod grayscale;
pub mod reshape;
pub mod resize;

use std::sync::Arc;

use crate::core::{GymError, Result};
use crate::spaces::{DictSpace, DynSpace, TupleSpace};

pub use bounds::{Bounds, RescaleArgs, extend_args, transform_space_bounds};
pub use dtype::dtype_space;
pub use filter::{filter_space, filter_value};
pub use grayscale::grayscale_space;
pub use reshape::reshape_space;
pub use resize::resize_space;

/// Partial, space-shaped arguments for a transform.
///
/// `Unset` anywhere means "leave this subtree unchanged". Dict entries may cover a subset of the
/// space's keys; tuple entries must cover every position (use `Unset` to skip one).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArgTree<L> {
    #[default]
    Unset,
    Leaf(L),
    Dict(Vec<(String, ArgTree<L>)>),
    Tuple(Vec<ArgTree<L>>),
}

impl<L> ArgTree<L> {
    pub fn leaf(arg: L) -> Self { ArgTree::Leaf(arg) }

    pub fn dict<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ArgTree<L>)>,
    {
        ArgTree::Dict(entries.into_iter().map(|(k, a)| (k.into(), a)).collect())
    }

    pub fn tuple<I: IntoIterator<Item = ArgTree<L>>>(items: I) -> Self {
        ArgTree::Tuple(items.into_iter().collect())
    }

    pub fn is_unset(&self) -> bool { matches!(self, ArgTree::Unset) }

    pub fn as_leaf(&self) -> Option<&L> {
        match self {
            ArgTree::Leaf(l) => Some(l),
            _ => None,
        }
    }

    /// Entry of a dict tree; `None` when absent or when this is not a dict.
    pub fn get(&self, key: &str) -> Option<&ArgTree<L>> {
        match self {
            ArgTree::Dict(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, a)| a),
            _ => None,
        }
    }

    /// Entry of a tuple tree; `None` when out of range or when this is not a tuple.
    pub fn index(&self, i: usize) -> Option<&ArgTree<L>> {
        match self {
            ArgTree::Tuple(items) => items.get(i),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ArgTree::Unset => "unset",
            ArgTree::Leaf(_) => "leaf",
            ArgTree::Dict(_) => "dict",
            ArgTree::Tuple(_) => "tuple",
        }
    }
}

/// Per-level view of an argument tree against a space, after structural checks.
pub(crate) enum Level<'a, L> {
    /// Nothing to do below this point.
    Unset,
    /// Leaf space with its argument.
    Leaf(&'a L),
    /// Dict space; one optional argument per space key, in space order.
    Dict(&'a DictSpace, Vec<Option<&'a ArgTree<L>>>),
    /// Tuple space; one argument per position.
    Tuple(&'a TupleSpace, Vec<&'a ArgTree<L>>),
}

/// Match one level of `args` against `space`.
///
/// Fails with `ShapeMismatch` when dict args name a key the space lacks, when tuple args and
/// space differ in length, or when a composite argument meets a leaf (or the reverse).
pub(crate) fn level<'a, L>(space: &'a DynSpace, args: &'a ArgTree<L>, path: &str) -> Result<Level<'a, L>> {
    match (space, args) {
        (_, ArgTree::Unset) => Ok(Level::Unset),
        (DynSpace::Dict(dict), ArgTree::Dict(entries)) => {
            if let Some((k, _)) = entries.iter().find(|(k, _)| !dict.contains_key(k)) {
                return Err(GymError::ShapeMismatch(format!(
                    "argument key `{k}` at {path} does not exist in space {space}"
                )));
            }
            let per_key = dict.keys().map(|k| args.get(k)).collect();
            Ok(Level::Dict(dict, per_key))
        }
        (DynSpace::Tuple(tuple), ArgTree::Tuple(items)) => {
            if items.len() != tuple.len() {
                return Err(GymError::ShapeMismatch(format!(
                    "expected {} arguments at {path}, got {}",
                    tuple.len(),
                    items.len()
                )));
            }
            Ok(Level::Tuple(tuple, items.iter().collect()))
        }
        (DynSpace::Dict(_) | DynSpace::Tuple(_), _) | (_, ArgTree::Dict(_) | ArgTree::Tuple(_)) => {
            Err(GymError::ShapeMismatch(format!(
                "{} argument at {path} does not match space {space}",
                args.kind()
            )))
        }
        (_, ArgTree::Leaf(arg)) => Ok(Level::Leaf(arg)),
    }
}

pub(crate) fn key_path(path: &str, key: &str) -> String { format!("{path}.{key}") }

pub(crate) fn index_path(path: &str, i: usize) -> String { format!("{path}[{i}]") }

/// Transform `space` with `args`, calling `leaf_fn` on every leaf that has an argument.
///
/// The result has the same keys and length as `space` at every level; untouched children are
/// shared with the input.
pub fn transform_space<L, F>(space: &DynSpace, args: &ArgTree<L>, leaf_fn: &F) -> Result<DynSpace>
where
    F: Fn(&DynSpace, &L) -> Result<DynSpace>,
{
    match walk(space, args, leaf_fn, "root")? {
        Some(new) => Ok(new),
        None => Ok(space.clone()),
    }
}

/// Returns `None` when the subtree is unchanged so the caller can keep sharing it.
fn walk<L, F>(space: &DynSpace, args: &ArgTree<L>, leaf_fn: &F, path: &str) -> Result<Option<DynSpace>>
where
    F: Fn(&DynSpace, &L) -> Result<DynSpace>,
{
    match level(space, args, path)? {
        Level::Unset => Ok(None),
        Level::Leaf(arg) => leaf_fn(space, arg).map(Some),
        Level::Dict(dict, per_key) => {
            let children = dict
                .iter_shared()
                .zip(per_key)
                .map(|((k, child), arg)| {
                    let new = match arg {
                        Some(arg) => walk(child, arg, leaf_fn, &key_path(path, k))?,
                        None => None,
                    };
                    Ok((k.to_string(), share_or_wrap(child, new)))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(DynSpace::Dict(DictSpace::from_shared(children))))
        }
        Level::Tuple(tuple, per_index) => {
            let children = tuple
                .iter_shared()
                .zip(per_index)
                .enumerate()
                .map(|(i, (child, arg))| {
                    let new = walk(child, arg, leaf_fn, &index_path(path, i))?;
                    Ok(share_or_wrap(child, new))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(DynSpace::Tuple(TupleSpace::from_shared(children))))
        }
    }
}

fn share_or_wrap(old: &Arc<DynSpace>, new: Option<DynSpace>) -> Arc<DynSpace> {
    match new {
        Some(space) => Arc::new(space),
        None => Arc::clone(old),
    }
}

/// Rebuild an argument tree leaf by leaf against `space`, keeping its structure.
///
/// Used by pre-passes that need information from the original space at every leaf, such as
/// [`extend_args`]. Unset subtrees stay unset.
pub fn map_args<L, M, F>(space: &DynSpace, args: &ArgTree<L>, leaf_fn: &F) -> Result<ArgTree<M>>
where
    F: Fn(&DynSpace, &L) -> Result<M>,
{
    map_args_at(space, args, leaf_fn, "root")
}

fn map_args_at<L, M, F>(space: &DynSpace, args: &ArgTree<L>, leaf_fn: &F, path: &str) -> Result<ArgTree<M>>
where
    F: Fn(&DynSpace, &L) -> Result<M>,
{
    match level(space, args, path)? {
        Level::Unset => Ok(ArgTree::Unset),
        Level::Leaf(arg) => leaf_fn(space, arg).map(ArgTree::Leaf),
        Level::Dict(dict, per_key) => {
            // Only keys present in the input tree are carried over.
            let entries = dict
                .iter()
                .zip(per_key)
                .filter_map(|((k, child), arg)| arg.map(|arg| (k, child, arg)))
                .map(|(k, child, arg)| Ok((k.to_string(), map_args_at(child, arg, leaf_fn, &key_path(path, k))?)))
                .collect::<Result<Vec<_>>>()?;
            Ok(ArgTree::Dict(entries))
        }
        Level::Tuple(tuple, per_index) => {
            let items = tuple
                .iter()
                .zip(per_index)
                .enumerate()
                .map(|(i, (child, arg))| map_args_at(child, arg, leaf_fn, &index_path(path, i)))
                .collect::<Result<Vec<_>>>()?;
            Ok(ArgTree::Tuple(items))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spaces::{BoxSpace, Discrete};

    fn nested() -> DynSpace {
        DictSpace::new([
            ("box", DynSpace::from(BoxSpace::uniform(0.0, 1.0, &[1]))),
            ("discrete", DynSpace::from(Discrete::new(5))),
            (
                "nested",
                DynSpace::from(DictSpace::new([("nested", BoxSpace::uniform(0.0, 1.0, &[1]))])),
            ),
        ])
        .into()
    }

    fn double_n(space: &DynSpace, k: &u64) -> Result<DynSpace> {
        match space {
            DynSpace::Discrete(d) => Ok(Discrete::new(d.n() * k).into()),
            other => Err(GymError::InvalidSpaceOperation(other.kind().into())),
        }
    }

    #[test]
    fn unset_args_are_identity() {
        let space = nested();
        assert_eq!(transform_space(&space, &ArgTree::Unset, &double_n).unwrap(), space);
        assert_eq!(transform_space(&space, &ArgTree::dict::<&str, _>([]), &double_n).unwrap(), space);
    }

    #[test]
    fn untouched_children_are_shared() {
        let space = nested();
        let args = ArgTree::dict([("discrete", ArgTree::leaf(2))]);
        let out = transform_space(&space, &args, &double_n).unwrap();
        assert_eq!(out.get("discrete"), Some(&DynSpace::from(Discrete::new(10))));
        let before = space.as_dict().unwrap().get_shared("nested").unwrap();
        let after = out.as_dict().unwrap().get_shared("nested").unwrap();
        assert!(Arc::ptr_eq(before, after));
    }

    #[test]
    fn unknown_key_is_shape_mismatch() {
        let args = ArgTree::dict([("missing", ArgTree::leaf(2))]);
        let err = transform_space(&nested(), &args, &double_n).unwrap_err();
        assert!(matches!(err, GymError::ShapeMismatch(_)));
    }

    #[test]
    fn tuple_length_must_match() {
        let space: DynSpace = TupleSpace::new([Discrete::new(2), Discrete::new(3)]).into();
        let short = ArgTree::tuple([ArgTree::leaf(2)]);
        let long = ArgTree::tuple([ArgTree::Unset, ArgTree::Unset, ArgTree::leaf(2)]);
        assert!(matches!(transform_space(&space, &short, &double_n), Err(GymError::ShapeMismatch(_))));
        assert!(matches!(transform_space(&space, &long, &double_n), Err(GymError::ShapeMismatch(_))));

        let ok = ArgTree::tuple([ArgTree::Unset, ArgTree::leaf(2)]);
        let out = transform_space(&space, &ok, &double_n).unwrap();
        assert_eq!(out.index(0), Some(&DynSpace::from(Discrete::new(2))));
        assert_eq!(out.index(1), Some(&DynSpace::from(Discrete::new(6))));
    }

    #[test]
    fn composite_arg_on_leaf_is_shape_mismatch() {
        let args = ArgTree::dict([("discrete", ArgTree::dict([("x", ArgTree::leaf(2))]))]);
        assert!(matches!(transform_space(&nested(), &args, &double_n), Err(GymError::ShapeMismatch(_))));
        let leaf_on_dict = ArgTree::dict([("nested", ArgTree::leaf(2))]);
        assert!(matches!(transform_space(&nested(), &leaf_on_dict, &double_n), Err(GymError::ShapeMismatch(_))));
    }

    #[test]
    fn leaf_errors_propagate() {
        let args = ArgTree::dict([("box", ArgTree::leaf(2))]);
        let err = transform_space(&nested(), &args, &double_n).unwrap_err();
        assert!(matches!(err, GymError::InvalidSpaceOperation(_)));
    }

    #[test]
    fn map_args_keeps_only_given_keys() {
        let args = ArgTree::dict([("nested", ArgTree::dict([("nested", ArgTree::leaf(1u64))]))]);
        let mapped = map_args(&nested(), &args, &|space: &DynSpace, k: &u64| Ok(format!("{}x{k}", space.kind()))).unwrap();
        assert_eq!(
            mapped,
            ArgTree::dict([("nested", ArgTree::dict([("nested", ArgTree::leaf("Boxx1".to_string()))]))])
        );
    }
}
