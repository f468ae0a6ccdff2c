//! Composite spaces: `Dict` (named children, insertion ordered) and `Tuple` (positional children).
//!
//! Children are shared through `Arc`, so a transformed composite reuses every child it did not
//! touch instead of deep-copying it.

use std::sync::Arc;

use rand::Rng;

use super::{DynSpace, Space, Value};

/// A dictionary of named sub-spaces. Keys are unique and keep insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DictSpace {
    spaces: Vec<(String, Arc<DynSpace>)>,
}

impl DictSpace {
    /// Create from `(key, space)` pairs. Panics on duplicate keys.
    pub fn new<K, S, I>(entries: I) -> Self
    where
        K: Into<String>,
        S: Into<DynSpace>,
        I: IntoIterator<Item = (K, S)>,
    {
        Self::from_shared(entries.into_iter().map(|(k, s)| (k.into(), Arc::new(s.into()))).collect())
    }

    /// Create from already shared children. Panics on duplicate keys.
    pub fn from_shared(spaces: Vec<(String, Arc<DynSpace>)>) -> Self {
        for (i, (k, _)) in spaces.iter().enumerate() {
            assert!(
                !spaces[..i].iter().any(|(kk, _)| kk == k),
                "duplicate key `{k}` in Dict space"
            );
        }
        Self { spaces }
    }

    pub fn get(&self, key: &str) -> Option<&DynSpace> { self.get_shared(key).map(|s| s.as_ref()) }

    pub fn get_shared(&self, key: &str) -> Option<&Arc<DynSpace>> {
        self.spaces.iter().find(|(k, _)| k == key).map(|(_, s)| s)
    }

    pub fn contains_key(&self, key: &str) -> bool { self.get_shared(key).is_some() }

    pub fn keys(&self) -> impl Iterator<Item = &str> { self.spaces.iter().map(|(k, _)| k.as_str()) }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DynSpace)> {
        self.spaces.iter().map(|(k, s)| (k.as_str(), s.as_ref()))
    }

    pub fn iter_shared(&self) -> impl Iterator<Item = (&str, &Arc<DynSpace>)> {
        self.spaces.iter().map(|(k, s)| (k.as_str(), s))
    }

    pub fn len(&self) -> usize { self.spaces.len() }

    pub fn is_empty(&self) -> bool { self.spaces.is_empty() }
}

impl Space for DictSpace {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        Value::Dict(self.spaces.iter().map(|(k, s)| (k.clone(), s.sample(rng))).collect())
    }

    fn contains(&self, value: &Value) -> bool {
        let Value::Dict(entries) = value else { return false };
        entries.len() == self.spaces.len()
            && self.spaces.iter().all(|(k, s)| value.get(k).is_some_and(|v| s.contains(v)))
    }
}

/// An ordered, fixed-length sequence of sub-spaces.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TupleSpace {
    spaces: Vec<Arc<DynSpace>>,
}

impl TupleSpace {
    pub fn new<S, I>(spaces: I) -> Self
    where
        S: Into<DynSpace>,
        I: IntoIterator<Item = S>,
    {
        Self::from_shared(spaces.into_iter().map(|s| Arc::new(s.into())).collect())
    }

    pub fn from_shared(spaces: Vec<Arc<DynSpace>>) -> Self { Self { spaces } }

    pub fn get(&self, i: usize) -> Option<&DynSpace> { self.spaces.get(i).map(|s| s.as_ref()) }

    pub fn get_shared(&self, i: usize) -> Option<&Arc<DynSpace>> { self.spaces.get(i) }

    pub fn iter(&self) -> impl Iterator<Item = &DynSpace> { self.spaces.iter().map(|s| s.as_ref()) }

    pub fn iter_shared(&self) -> impl Iterator<Item = &Arc<DynSpace>> { self.spaces.iter() }

    pub fn len(&self) -> usize { self.spaces.len() }

    pub fn is_empty(&self) -> bool { self.spaces.is_empty() }
}

impl Space for TupleSpace {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        Value::Tuple(self.spaces.iter().map(|s| s.sample(rng)).collect())
    }

    fn contains(&self, value: &Value) -> bool {
        let Value::Tuple(items) = value else { return false };
        items.len() == self.spaces.len()
            && self.spaces.iter().zip(items.iter()).all(|(s, v)| s.contains(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spaces::{BoxSpace, Discrete};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn arm_space() -> DictSpace {
        DictSpace::new([
            ("left_arm", DynSpace::from(Discrete::new(4))),
            ("right_arm", DynSpace::from(BoxSpace::uniform(0.0, 5.0, &[1]))),
        ])
    }

    #[test]
    fn dict_keeps_insertion_order() {
        let d = DictSpace::new([
            ("z", DynSpace::from(Discrete::new(2))),
            ("a", DynSpace::from(Discrete::new(3))),
        ]);
        assert_eq!(d.keys().collect::<Vec<_>>(), vec!["z", "a"]);
        assert_eq!(d.get("a"), Some(&DynSpace::from(Discrete::new(3))));
        assert!(d.get("unknown").is_none());
    }

    #[test]
    #[should_panic(expected = "duplicate key")]
    fn dict_rejects_duplicate_keys() {
        DictSpace::new([("a", Discrete::new(2)), ("a", Discrete::new(3))]);
    }

    #[test]
    fn dict_sample_is_contained() {
        let mut rng = StdRng::seed_from_u64(3);
        let d = arm_space();
        for _ in 0..20 {
            assert!(d.contains(&d.sample(&mut rng)));
        }
        let missing = Value::dict([("left_arm", Value::Discrete(1))]);
        assert!(!d.contains(&missing));
    }

    #[test]
    fn tuple_sample_is_contained() {
        let mut rng = StdRng::seed_from_u64(4);
        let t = TupleSpace::new([DynSpace::from(arm_space()), DynSpace::from(Discrete::new(3))]);
        for _ in 0..20 {
            assert!(t.contains(&t.sample(&mut rng)));
        }
        assert!(!t.contains(&Value::tuple([Value::Discrete(0)])));
    }
}
