//! Hand zone and inversion from the accelerometer.

use serde::{Deserialize, Serialize};

use crate::config::HandZoneThresholds;
use crate::events::GestureEvent;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandZone {
    #[default]
    Normal,
    HandUp,
    HandDown,
}

#[derive(Debug)]
pub struct HandZoneDetector {
    th: HandZoneThresholds,
    zone: HandZone,
    inverted: bool,
}

impl HandZoneDetector {
    pub fn new(th: HandZoneThresholds) -> Self {
        Self {
            th,
            zone: HandZone::Normal,
            inverted: false,
        }
    }

    pub fn set_thresholds(&mut self, th: HandZoneThresholds) {
        self.th = th;
    }

    pub fn zone(&self) -> HandZone {
        self.zone
    }

    pub fn is_hand_inverted(&self) -> bool {
        self.inverted
    }

    /// `accel_y` is the pitch proxy, `accel_z` the roll proxy.
    pub fn update(&mut self, accel_y: f32, accel_z: f32, out: &mut Vec<GestureEvent>) {
        let thr = self.th.inverted_threshold;
        if self.inverted {
            if accel_z >= thr {
                self.set_inverted(false, out);
            }
        } else if accel_z < thr {
            self.set_inverted(true, out);
        }
        // Recomputed unconditionally. Only differs from the branch above for NaN, where the
        // flag drops to false without an event.
        self.inverted = accel_z < thr;

        let [lo, hi] = self.th.normal_zone;
        let zone = if accel_y <= lo {
            HandZone::HandDown
        } else if accel_y >= hi {
            HandZone::HandUp
        } else {
            HandZone::Normal
        };
        if zone != self.zone {
            self.zone = zone;
            out.push(GestureEvent::HandZoneChanged(zone));
        }
    }

    fn set_inverted(&mut self, inverted: bool, out: &mut Vec<GestureEvent>) {
        self.inverted = inverted;
        out.push(GestureEvent::HandInversionChanged(inverted));
    }
}
