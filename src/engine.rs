//! Wiring of the detectors onto one sensor feed and one event bus.

use log::{debug, info};

use crate::config::Profile;
use crate::debounce::ExtensionDebouncer;
use crate::error::EngineError;
use crate::events::{EventBus, GestureEvent};
use crate::hand_zone::{HandZone, HandZoneDetector};
use crate::labels::{ExtensionTag, GestureClass, Label, ShakeTag, SwipeDirection};
use crate::sensor::SensorFeed;
use crate::sequencer::HoldClickSequencer;
use crate::wrist::{WristFlickDetector, WristShakeDetector};

#[derive(Debug)]
pub struct EngineBuilder {
    profile: Profile,
    feed: Option<SensorFeed>,
    bus: Option<EventBus>,
}

impl EngineBuilder {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            feed: None,
            bus: None,
        }
    }

    pub fn sensor_feed(mut self, feed: SensorFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn build(self) -> Result<GestureEngine, EngineError> {
        let feed = self.feed.ok_or(EngineError::MissingSensorFeed)?;
        let bus = self.bus.ok_or(EngineError::MissingEventBus)?;
        let p = self.profile;
        Ok(GestureEngine {
            feed,
            bus,
            connected: true,
            flick: WristFlickDetector::new(p.wrist),
            shake: WristShakeDetector::new(p.wrist),
            zone: HandZoneDetector::new(p.hand_zone),
            debouncer: ExtensionDebouncer::new(),
            sequencer: HoldClickSequencer::new(p.extension.clone()),
            scratch: Vec::new(),
        })
    }
}

/// All classifiers driven from one logical thread.
///
/// [`GestureEngine::tick`] samples the feed once and runs the IMU detectors; the `push_*` calls
/// deliver discrete labels as they arrive. Both first fire any timers due at `now_ms`, so a tag
/// and a tick landing on the same timestamp can come in either order. Timer output is published
/// ahead of the call's own events and stamped with its deadline.
#[derive(Debug)]
pub struct GestureEngine {
    feed: SensorFeed,
    bus: EventBus,
    connected: bool,
    flick: WristFlickDetector,
    shake: WristShakeDetector,
    zone: HandZoneDetector,
    debouncer: ExtensionDebouncer,
    sequencer: HoldClickSequencer,
    scratch: Vec<GestureEvent>,
}

impl GestureEngine {
    pub fn feed(&self) -> &SensorFeed {
        &self.feed
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn hand_zone(&self) -> HandZone {
        self.zone.zone()
    }

    pub fn is_hand_inverted(&self) -> bool {
        self.zone.is_hand_inverted()
    }

    pub fn is_locked(&self) -> bool {
        self.sequencer.is_locked()
    }

    pub fn held(&self) -> Option<GestureClass> {
        self.sequencer.held()
    }

    /// Classifiers only run while the device is connected.
    pub fn set_connected(&mut self, connected: bool) {
        if self.connected != connected {
            info!(
                "device {}; classifiers {}",
                if connected { "connected" } else { "disconnected" },
                if connected { "running" } else { "paused" }
            );
        }
        self.connected = connected;
    }

    /// Swap thresholds in place; detector state carries over.
    pub fn apply_profile(&mut self, profile: &Profile) {
        self.flick.set_thresholds(profile.wrist);
        self.shake.set_thresholds(profile.wrist);
        self.zone.set_thresholds(profile.hand_zone);
        self.sequencer.set_settings(profile.extension.clone());
    }

    pub fn tick(&mut self, now_ms: u64) {
        if !self.connected {
            return;
        }
        self.fire_due(now_ms);

        let s = self.feed.latest();
        if let Some(ev) = self.flick.update(now_ms, s.gyroscope.y) {
            self.scratch.push(ev);
        }
        if let Some(ev) = self.shake.update(now_ms, s.gyroscope.z) {
            self.scratch.push(ev);
        }
        self.zone
            .update(s.accelerometer.y, s.accelerometer.z, &mut self.scratch);
        self.flush(now_ms);
    }

    pub fn push_extension(&mut self, now_ms: u64, tag: ExtensionTag) {
        if !self.connected {
            return;
        }
        self.fire_due(now_ms);
        if let Some(ev) = self.debouncer.on_tag(tag) {
            self.scratch.push(ev);
        }
        self.sequencer.on_tag(now_ms, tag, &mut self.scratch);
        self.flush(now_ms);
    }

    pub fn push_swipe(&mut self, now_ms: u64, class: GestureClass, dir: SwipeDirection) {
        if !self.connected {
            return;
        }
        self.fire_due(now_ms);
        self.sequencer.on_other(now_ms, &mut self.scratch);
        self.scratch.push(GestureEvent::Swipe(class, dir));
        self.flush(now_ms);
    }

    pub fn push_shake(&mut self, now_ms: u64, tag: ShakeTag) {
        if !self.connected {
            return;
        }
        self.fire_due(now_ms);
        self.scratch.push(GestureEvent::DeviceShake(tag));
        self.flush(now_ms);
    }

    pub fn push_label(&mut self, now_ms: u64, label: Label) {
        match label {
            Label::Extension(tag) => self.push_extension(now_ms, tag),
            Label::Swipe(class, dir) => self.push_swipe(now_ms, class, dir),
            Label::Shake(tag) => self.push_shake(now_ms, tag),
        }
    }

    /// Sequencer timers due by `now_ms`, one deadline at a time.
    fn fire_due(&mut self, now_ms: u64) {
        while let Some(due) = self.sequencer.next_deadline().filter(|&d| d <= now_ms) {
            self.sequencer.advance(due, &mut self.scratch);
            self.flush(due);
        }
    }

    fn flush(&mut self, at_ms: u64) {
        for ev in self.scratch.drain(..) {
            debug!("gesture {ev:?} at {at_ms} ms");
            self.bus.publish(at_ms, ev);
        }
    }
}
