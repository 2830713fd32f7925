//! Gesture events and the bus that fans them out to subscribers.

use serde::Serialize;
use std::{
    cell::RefCell,
    rc::Rc,
    sync::mpsc::{self, Receiver, Sender},
};

use crate::hand_zone::HandZone;
use crate::labels::{GestureClass, ShakeTag, SwipeDirection};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", content = "value")]
pub enum GestureEvent {
    WristFlickLeft,
    WristFlickRight,
    WristShake,
    HandZoneChanged(HandZone),
    HandInversionChanged(bool),
    /// One-shot debounced activation.
    Extension(GestureClass),
    ExtensionReleased,
    Hold(GestureClass),
    HoldReleased(GestureClass),
    Click(GestureClass),
    DoubleClick,
    LockChanged(bool),
    Swipe(GestureClass, SwipeDirection),
    DeviceShake(ShakeTag),
}

/// An event and the logical time it took effect.
///
/// Timer-driven events (holds, clicks) carry their deadline, which can be earlier than the call
/// that delivered them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stamped {
    pub at_ms: u64,
    pub event: GestureEvent,
}

/// Multicast publisher.
///
/// Each [`Subscription`] owns the receiving end of a channel; dropping it unsubscribes, and the
/// dead sender is pruned on the next publish.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Rc<RefCell<Vec<Sender<Stamped>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel();
        self.subscribers.borrow_mut().push(tx);
        Subscription { rx }
    }

    pub fn publish(&self, at_ms: u64, event: GestureEvent) {
        let stamped = Stamped { at_ms, event };
        self.subscribers
            .borrow_mut()
            .retain(|tx| tx.send(stamped).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

#[derive(Debug)]
pub struct Subscription {
    rx: Receiver<Stamped>,
}

impl Subscription {
    /// Everything published since the last drain, without timestamps.
    pub fn drain(&self) -> Vec<GestureEvent> {
        self.rx.try_iter().map(|s| s.event).collect()
    }

    pub fn drain_stamped(&self) -> Vec<Stamped> {
        self.rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_sees_every_event() {
        let bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();
        bus.publish(0, GestureEvent::WristShake);
        bus.publish(5, GestureEvent::Click(GestureClass::Hand));

        assert_eq!(
            a.drain(),
            vec![GestureEvent::WristShake, GestureEvent::Click(GestureClass::Hand)]
        );
        assert_eq!(
            b.drain_stamped(),
            vec![
                Stamped {
                    at_ms: 0,
                    event: GestureEvent::WristShake
                },
                Stamped {
                    at_ms: 5,
                    event: GestureEvent::Click(GestureClass::Hand)
                },
            ]
        );
        assert!(a.drain().is_empty());
    }

    #[test]
    fn dropped_subscription_is_pruned() {
        let bus = EventBus::new();
        let keep = bus.subscribe();
        {
            let _gone = bus.subscribe();
            assert_eq!(bus.subscriber_count(), 2);
        }
        bus.publish(10, GestureEvent::DoubleClick);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(keep.drain(), vec![GestureEvent::DoubleClick]);
    }

    #[test]
    fn serializes_as_tagged_json() {
        let v = serde_json::to_value(GestureEvent::Hold(GestureClass::Index)).unwrap();
        assert_eq!(v, serde_json::json!({"event": "Hold", "value": "INDEX"}));
        let v = serde_json::to_value(GestureEvent::WristFlickLeft).unwrap();
        assert_eq!(v, serde_json::json!({"event": "WristFlickLeft"}));
    }
}
