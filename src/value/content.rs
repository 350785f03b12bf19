//! Content codec (§3, §4.4): four pure functions translating a
//! `PointValue` between its external wire representation, its internal
//! normalized representation, and back. Encoding is required to
//! round-trip the output of decoding; decoding is permitted to be
//! lenient (§3). The catalog of concrete codecs is out of scope (§1
//! Non-goals: "it does not own... the content catalog itself") — this
//! module only defines the interface shape and a no-op reference impl.

use std::fmt;

use crate::error::Result;
use crate::value::point_value::PointValue;

/// A point's codec. Implementations must be `Send + Sync` since a
/// `Point` shares its codec across batch-engine worker invocations via
/// `Arc<dyn Content>`.
pub trait Content: fmt::Debug + Send + Sync {
    fn decode(&self, value: &PointValue) -> Result<PointValue>;
    fn encode(&self, value: &PointValue) -> Result<PointValue>;
    fn normalize(&self, value: &PointValue) -> Result<PointValue>;
    fn denormalize(&self, value: &PointValue) -> Result<PointValue>;
}

/// The identity codec: every operation passes the value through
/// unchanged. Useful for raw points with no unit conversion, and as the
/// default when a point's metadata names no content reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityContent;

impl Content for IdentityContent {
    fn decode(&self, value: &PointValue) -> Result<PointValue> {
        Ok(value.clone())
    }

    fn encode(&self, value: &PointValue) -> Result<PointValue> {
        Ok(value.clone())
    }

    fn normalize(&self, value: &PointValue) -> Result<PointValue> {
        Ok(value.clone())
    }

    fn denormalize(&self, value: &PointValue) -> Result<PointValue> {
        Ok(value.clone())
    }
}

/// Scales a numeric (`Long`/`Double`) value by a fixed linear factor plus
/// offset on normalize, and inverts on denormalize — the simplest
/// non-trivial unit-conversion codec, grounded in the common case the
/// distilled spec gestures at ("unit conversion to internal") without
/// naming a catalog.
#[derive(Debug, Clone, Copy)]
pub struct LinearScaleContent {
    pub factor: f64,
    pub offset: f64,
}

impl LinearScaleContent {
    pub fn new(factor: f64, offset: f64) -> Self {
        Self { factor, offset }
    }

    fn map_numeric(value: &PointValue, f: impl Fn(f64) -> f64) -> PointValue {
        use crate::value::tagged::Value;
        let mapped = match value.value() {
            Some(Value::Long(l)) => Some(Value::Double(f(*l as f64))),
            Some(Value::Double(d)) => Some(Value::Double(f(*d))),
            other => other.cloned(),
        };
        PointValue::new(value.point(), value.stamp(), mapped)
    }
}

impl Content for LinearScaleContent {
    fn decode(&self, value: &PointValue) -> Result<PointValue> {
        Ok(value.clone())
    }

    fn encode(&self, value: &PointValue) -> Result<PointValue> {
        Ok(value.clone())
    }

    fn normalize(&self, value: &PointValue) -> Result<PointValue> {
        Ok(Self::map_numeric(value, |v| v * self.factor + self.offset))
    }

    fn denormalize(&self, value: &PointValue) -> Result<PointValue> {
        Ok(Self::map_numeric(value, |v| (v - self.offset) / self.factor))
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::temporal::Timestamp;
    use crate::value::tagged::Value;

    #[test]
    fn identity_content_passes_through() {
        let pv = PointValue::new(Uuid::new_v4(), Timestamp::from_raw(0), Some(Value::Long(7)));
        let codec = IdentityContent;
        assert_eq!(codec.normalize(&pv).unwrap().value(), Some(&Value::Long(7)));
    }

    #[test]
    fn linear_scale_round_trips() {
        let pv = PointValue::new(Uuid::new_v4(), Timestamp::from_raw(0), Some(Value::Double(10.0)));
        let codec = LinearScaleContent::new(2.0, 1.0);
        let normalized = codec.normalize(&pv).unwrap();
        assert_eq!(normalized.value(), Some(&Value::Double(21.0)));
        let denormalized = codec.denormalize(&normalized).unwrap();
        assert_eq!(denormalized.value(), Some(&Value::Double(10.0)));
    }
}
