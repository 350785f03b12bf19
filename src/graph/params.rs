//! Params (§3, §6): an insertion-ordered multimap from key to a list of
//! typed primitive values, with a chained defaults parent and a freeze gate.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::temporal::ElapsedTime;

/// The restricted value domain `Params` carries — narrower than the RPN
/// VM/`PointValue` dynamic union (§4.4), matching §3's "typed primitive
/// values (string, number, boolean, elapsed time, reference)".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Elapsed(ElapsedTime),
    Reference(Uuid),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_elapsed(&self) -> Option<ElapsedTime> {
        match self {
            ParamValue::Elapsed(e) => Some(*e),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<Uuid> {
        match self {
            ParamValue::Reference(u) => Some(*u),
            _ => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::String(s.to_string())
    }
}
impl From<f64> for ParamValue {
    fn from(n: f64) -> Self {
        ParamValue::Number(n)
    }
}
impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Boolean(b)
    }
}
impl From<ElapsedTime> for ParamValue {
    fn from(e: ElapsedTime) -> Self {
        ParamValue::Elapsed(e)
    }
}

/// Insertion-ordered multimap with an optional defaults parent. Lookups
/// that miss the child fall through to the parent (§3). Freezing makes
/// any further mutation an error, matching metadata's load-then-immutable
/// lifecycle (§3 Lifecycles).
#[derive(Debug, Clone, Default)]
pub struct Params {
    keys_in_order: Vec<String>,
    entries: HashMap<String, Vec<ParamValue>>,
    defaults: Option<Arc<Params>>,
    frozen: bool,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: Arc<Params>) -> Self {
        Self { defaults: Some(defaults), ..Self::default() }
    }

    /// Appends `value` under `key`, preserving insertion order of keys.
    pub fn add(&mut self, key: impl Into<String>, value: ParamValue) -> Result<()> {
        if self.frozen {
            return Err(Error::MetadataInvalid {
                reason: "attempted to mutate a frozen Params".to_string(),
            });
        }
        let key = key.into();
        if !self.entries.contains_key(&key) {
            self.keys_in_order.push(key.clone());
        }
        self.entries.entry(key).or_default().push(value);
        Ok(())
    }

    /// All values for `key` in this `Params`, ignoring defaults.
    pub fn own_values(&self, key: &str) -> Option<&[ParamValue]> {
        self.entries.get(key).map(|v| v.as_slice())
    }

    /// All values for `key`, falling through the defaults chain if absent.
    pub fn values(&self, key: &str) -> Option<&[ParamValue]> {
        self.entries
            .get(key)
            .map(|v| v.as_slice())
            .or_else(|| self.defaults.as_ref().and_then(|d| d.values(key)))
    }

    /// The first value for `key`, falling through defaults.
    pub fn value(&self, key: &str) -> Option<&ParamValue> {
        self.values(key).and_then(|v| v.first())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values(key).is_some()
    }

    /// Keys present directly on this `Params`, in insertion order (does not
    /// include defaults-only keys).
    pub fn own_keys(&self) -> &[String] {
        &self.keys_in_order
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_falls_through_defaults_chain() {
        let mut base = Params::new();
        base.add("STEP_SIZE", ParamValue::from(1.0)).unwrap();
        let base = Arc::new(base);

        let child = Params::with_defaults(base);
        assert_eq!(child.value("STEP_SIZE").and_then(|v| v.as_f64()), Some(1.0));
    }

    #[test]
    fn child_value_shadows_default() {
        let mut base = Params::new();
        base.add("STEP_SIZE", ParamValue::from(1.0)).unwrap();
        let base = Arc::new(base);

        let mut child = Params::with_defaults(base);
        child.add("STEP_SIZE", ParamValue::from(2.0)).unwrap();
        assert_eq!(child.value("STEP_SIZE").and_then(|v| v.as_f64()), Some(2.0));
    }

    #[test]
    fn frozen_params_reject_mutation() {
        let mut p = Params::new();
        p.freeze();
        assert!(p.add("X", ParamValue::from(true)).is_err());
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut p = Params::new();
        p.add("B", ParamValue::from(1.0)).unwrap();
        p.add("A", ParamValue::from(2.0)).unwrap();
        assert_eq!(p.own_keys(), &["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn multimap_accumulates_values_under_one_key() {
        let mut p = Params::new();
        p.add("TAG", ParamValue::from("a")).unwrap();
        p.add("TAG", ParamValue::from("b")).unwrap();
        assert_eq!(p.values("TAG").unwrap().len(), 2);
    }
}
