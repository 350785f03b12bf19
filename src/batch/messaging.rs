//! Messaging collaborator (§1, §6): "queue/topic senders and receivers
//! carrying notices between processor and store." Out of scope as an
//! implementation — the core only depends on these traits — but the
//! `cli` feature ships a `crossbeam-channel`-backed pair so the demo
//! binary and integration tests can drive the batch engine end to end.

use std::fmt;

use crate::error::Result;
use crate::value::point_value::PointValue;

/// `Sender.send(values[])`, `Sender.commit()`, `Sender.close()` (§6).
pub trait Sender: fmt::Debug + Send + Sync {
    fn send(&self, values: &[PointValue]) -> Result<()>;
    fn commit(&self) -> Result<()>;
    fn close(&self) -> Result<()>;
}

/// `Receiver.receive(timeoutMs) -> value?`, `Receiver.commit()`,
/// `Receiver.purge() -> count` (§6). `None` on timeout.
pub trait Receiver: fmt::Debug + Send + Sync {
    fn receive(&self, timeout_ms: u64) -> Result<Option<PointValue>>;
    fn commit(&self) -> Result<()>;
    fn purge(&self) -> Result<usize>;
}

#[cfg(feature = "cli")]
pub mod channel {
    //! `crossbeam_channel`-backed `Sender`/`Receiver` pair (§10 Ambient
    //! Stack), used by the demo binary to stand in for a real message bus.

    use std::time::Duration;

    use crossbeam_channel::{Receiver as ChanRx, Sender as ChanTx};

    use super::*;

    #[derive(Debug)]
    pub struct ChannelSender {
        tx: ChanTx<PointValue>,
    }

    impl Sender for ChannelSender {
        fn send(&self, values: &[PointValue]) -> Result<()> {
            for value in values {
                let _ = self.tx.send(value.clone());
            }
            Ok(())
        }

        fn commit(&self) -> Result<()> {
            Ok(())
        }

        fn close(&self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Debug)]
    pub struct ChannelReceiver {
        rx: ChanRx<PointValue>,
    }

    impl Receiver for ChannelReceiver {
        fn receive(&self, timeout_ms: u64) -> Result<Option<PointValue>> {
            match self.rx.recv_timeout(Duration::from_millis(timeout_ms)) {
                Ok(value) => Ok(Some(value)),
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => Ok(None),
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => Ok(None),
            }
        }

        fn commit(&self) -> Result<()> {
            Ok(())
        }

        fn purge(&self) -> Result<usize> {
            let mut n = 0;
            while self.rx.try_recv().is_ok() {
                n += 1;
            }
            Ok(n)
        }
    }

    /// Builds a bounded `crossbeam_channel` pair wired to `Sender`/`Receiver`.
    pub fn channel_messaging(capacity: usize) -> (ChannelSender, ChannelReceiver) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (ChannelSender { tx }, ChannelReceiver { rx })
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::temporal::Timestamp;
        use crate::value::tagged::Value;
        use uuid::Uuid;

        #[test]
        fn send_then_receive_round_trips() {
            let (sender, receiver) = channel_messaging(8);
            let pv = PointValue::new(Uuid::new_v4(), Timestamp::from_raw(1), Some(Value::Long(7)));
            sender.send(&[pv.clone()]).unwrap();
            let received = receiver.receive(100).unwrap().unwrap();
            assert_eq!(received, pv);
        }

        #[test]
        fn receive_times_out_on_an_empty_channel() {
            let (_sender, receiver) = channel_messaging(8);
            assert!(receiver.receive(10).unwrap().is_none());
        }
    }
}
