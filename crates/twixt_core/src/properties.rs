//! Tween targets
//!
//! A [`Properties`] map is the object a tween animates: named `f64` fields in
//! insertion order. The caller owns it and shares it with tweens through a
//! [`SharedProperties`] handle. Tweens only ever read and write fields by name.

use crate::error::{CoreError, Result};
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Target object shared between its owner and the tweens animating it
pub type SharedProperties = Arc<Mutex<Properties>>;

/// Lock a shared target.
///
/// A panic inside another holder cannot leave plain numbers half-written, so
/// a poisoned lock is recovered rather than propagated.
pub fn lock_properties(target: &SharedProperties) -> MutexGuard<'_, Properties> {
    target.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ordered mapping from field name to numeric value
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties {
    fields: IndexMap<String, f64>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a target from loose values, coercing each with prefix semantics
    /// (`"12px"` becomes `12`, garbage becomes NaN)
    pub fn from_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        values
            .into_iter()
            .map(|(field, value)| (field.into(), value.into().parse_float()))
            .collect()
    }

    /// Build end values from loose input, coercing each with whole-string
    /// semantics (`"12px"` becomes NaN)
    pub fn from_targets<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        values
            .into_iter()
            .map(|(field, value)| (field.into(), value.into().to_number()))
            .collect()
    }

    /// Parse a `name=value` assignment as written on a command line
    pub fn parse_assignment(input: &str) -> Result<(String, Value)> {
        let (name, value) = input
            .split_once('=')
            .ok_or_else(|| CoreError::InvalidAssignment(input.to_string()))?;

        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::EmptyField(input.to_string()));
        }

        Ok((name.to_string(), Value::Text(value.trim().to_string())))
    }

    /// Builder: set a field
    pub fn with(mut self, field: impl Into<String>, value: f64) -> Self {
        self.set(field, value);
        self
    }

    /// Wrap into a shared target handle
    pub fn into_shared(self) -> SharedProperties {
        Arc::new(Mutex::new(self))
    }

    pub fn get(&self, field: &str) -> Option<f64> {
        self.fields.get(field).copied()
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut f64> {
        self.fields.get_mut(field)
    }

    /// Set a field, appending it if new
    pub fn set(&mut self, field: impl Into<String>, value: f64) {
        self.fields.insert(field.into(), value);
    }

    /// Remove a field, keeping the order of the rest
    pub fn remove(&mut self, field: &str) -> Option<f64> {
        self.fields.shift_remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Iterate fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Iterate fields mutably in insertion order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut f64)> {
        self.fields.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Field names in insertion order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<K: Into<String>> Extend<(K, f64)> for Properties {
    fn extend<I: IntoIterator<Item = (K, f64)>>(&mut self, iter: I) {
        self.fields
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v)));
    }
}

impl IntoIterator for Properties {
    type Item = (String, f64);
    type IntoIter = indexmap::map::IntoIter<String, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let props = Properties::new().with("y", 1.0).with("x", 2.0).with("z", 3.0);
        let fields: Vec<&str> = props.fields().collect();
        assert_eq!(fields, vec!["y", "x", "z"]);

        // Overwriting keeps the first slot
        let mut props = props;
        props.set("y", 10.0);
        assert_eq!(props.iter().next(), Some(("y", 10.0)));
    }

    #[test]
    fn test_from_values_uses_prefix_coercion() {
        let props = Properties::from_values([("left", Value::from("12px")), ("top", "oops".into())]);
        assert_eq!(props.get("left"), Some(12.0));
        assert!(props.get("top").unwrap().is_nan());
    }

    #[test]
    fn test_from_targets_uses_whole_string_coercion() {
        let props = Properties::from_targets([("x", Value::from(5)), ("y", "12px".into())]);
        assert_eq!(props.get("x"), Some(5.0));
        assert!(props.get("y").unwrap().is_nan());
    }

    #[test]
    fn test_parse_assignment() {
        let (name, value) = Properties::parse_assignment(" x = 42 ").unwrap();
        assert_eq!(name, "x");
        assert_eq!(value.to_number(), 42.0);

        assert_eq!(
            Properties::parse_assignment("x42"),
            Err(CoreError::InvalidAssignment("x42".into()))
        );
        assert_eq!(
            Properties::parse_assignment("=1"),
            Err(CoreError::EmptyField("=1".into()))
        );
    }

    #[test]
    fn test_shared_target_roundtrip() {
        let target = Properties::new().with("opacity", 1.0).into_shared();
        lock_properties(&target).set("opacity", 0.25);
        assert_eq!(lock_properties(&target).get("opacity"), Some(0.25));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut props = Properties::new().with("a", 1.0).with("b", 2.0).with("c", 3.0);
        assert_eq!(props.remove("a"), Some(1.0));
        assert_eq!(props.fields().collect::<Vec<_>>(), vec!["b", "c"]);
        assert_eq!(props.remove("missing"), None);
    }
}
