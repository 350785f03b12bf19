//! Notices (§4.6 "Inputs"): "one of: a new/updated `PointValue`, a
//! `RecalcTrigger(point, stamp)`, a clock event (midnight), a NULL flush,
//! or a service signal."

use uuid::Uuid;

use crate::temporal::Timestamp;
use crate::value::point_value::PointValue;

#[derive(Debug, Clone)]
pub enum Notice {
    /// A new or updated raw input value.
    Value(PointValue),
    /// An explicit request to recompute one point at one timestamp.
    Recalc { point: Uuid, stamp: Timestamp },
    /// A clock tick (e.g. midnight) against which every sync is checked.
    Clock(Timestamp),
    /// The sentinel boundary marker (§3, §6): drain the pending set and commit.
    Null,
    /// An out-of-band control message (reload, resync request, ...);
    /// acknowledged but not acted on by the core (§1 external collaborators
    /// own the service layer this would originate from).
    Service(String),
}

/// Source the batch engine pulls notices from. The `cli`-feature
/// `messaging::Receiver` is one concrete source (via `ReceiverSource`);
/// `RecalcTrigger`/clock notices more commonly come from an in-process
/// scheduler calling `BatchEngine::trigger_recalc`/`trigger_clock`
/// directly rather than traveling over the wire (§4.6, §5).
pub trait NoticeSource: Send + Sync {
    fn next_notice(&self, timeout_ms: u64) -> crate::error::Result<Option<Notice>>;
}

/// Adapts a `messaging::Receiver` into a `NoticeSource`: a received
/// `PointValue` becomes `Notice::Value`, the sentinel NULL becomes
/// `Notice::Null`, and a receive timeout becomes `None`.
#[derive(Debug)]
pub struct ReceiverSource<R> {
    receiver: R,
}

impl<R: crate::batch::messaging::Receiver> ReceiverSource<R> {
    pub fn new(receiver: R) -> Self {
        Self { receiver }
    }
}

impl<R: crate::batch::messaging::Receiver> NoticeSource for ReceiverSource<R> {
    fn next_notice(&self, timeout_ms: u64) -> crate::error::Result<Option<Notice>> {
        match self.receiver.receive(timeout_ms)? {
            None => Ok(None),
            Some(pv) if pv.is_sentinel_null() => Ok(Some(Notice::Null)),
            Some(pv) => Ok(Some(Notice::Value(pv))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::Timestamp;
    use crate::value::tagged::Value;

    #[derive(Debug)]
    struct FixedReceiver(std::sync::Mutex<Vec<PointValue>>);

    impl crate::batch::messaging::Receiver for FixedReceiver {
        fn receive(&self, _timeout_ms: u64) -> crate::error::Result<Option<PointValue>> {
            Ok(self.0.lock().unwrap().pop())
        }
        fn commit(&self) -> crate::error::Result<()> {
            Ok(())
        }
        fn purge(&self) -> crate::error::Result<usize> {
            Ok(0)
        }
    }

    #[test]
    fn sentinel_null_becomes_notice_null() {
        let receiver = FixedReceiver(std::sync::Mutex::new(vec![PointValue::sentinel_null()]));
        let source = ReceiverSource::new(receiver);
        assert!(matches!(source.next_notice(10).unwrap(), Some(Notice::Null)));
    }

    #[test]
    fn ordinary_value_becomes_notice_value() {
        let pv = PointValue::new(Uuid::new_v4(), Timestamp::from_raw(1), Some(Value::Long(1)));
        let receiver = FixedReceiver(std::sync::Mutex::new(vec![pv]));
        let source = ReceiverSource::new(receiver);
        assert!(matches!(source.next_notice(10).unwrap(), Some(Notice::Value(_))));
    }
}
