//! Latest IMU snapshot shared between the transport and the classifiers.

use serde::{Deserialize, Serialize};
use std::{cell::Cell, rc::Rc};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

impl From<[f32; 4]> for Quat {
    fn from(v: [f32; 4]) -> Self {
        Self {
            x: v[0],
            y: v[1],
            z: v[2],
            w: v[3],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub gyroscope: Vec3,
    pub accelerometer: Vec3,
    pub euler_angles: Vec3,
    pub quaternion: Quat,
}

/// Handle onto the most recent [`SensorSnapshot`].
///
/// The transport side calls [`SensorFeed::publish`] once per device frame; every classifier
/// holding a clone reads the same value through [`SensorFeed::latest`]. Everything runs on one
/// logical thread, so a plain `Rc<Cell<_>>` is enough.
#[derive(Debug, Clone, Default)]
pub struct SensorFeed {
    inner: Rc<Cell<SensorSnapshot>>,
}

impl SensorFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, snapshot: SensorSnapshot) {
        self.inner.set(snapshot);
    }

    /// Update only the IMU vectors, keeping orientation as last reported.
    pub fn publish_imu(&self, accelerometer: Vec3, gyroscope: Vec3) {
        let mut s = self.inner.get();
        s.accelerometer = accelerometer;
        s.gyroscope = gyroscope;
        self.inner.set(s);
    }

    pub fn latest(&self) -> SensorSnapshot {
        self.inner.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_observe_the_same_snapshot() {
        let writer = SensorFeed::new();
        let reader = writer.clone();
        assert_eq!(reader.latest(), SensorSnapshot::default());

        writer.publish(SensorSnapshot {
            gyroscope: Vec3::new(1.0, 2.0, 3.0),
            ..Default::default()
        });
        assert_eq!(reader.latest().gyroscope.y, 2.0);
    }

    #[test]
    fn publish_imu_keeps_orientation() {
        let feed = SensorFeed::new();
        feed.publish(SensorSnapshot {
            quaternion: Quat::from([0.5, 0.5, 0.5, 0.5]),
            ..Default::default()
        });
        feed.publish_imu(Vec3::new(0.0, -5.0, 0.0), Vec3::new(0.0, 0.0, 9.0));
        let s = feed.latest();
        assert_eq!(s.quaternion.w, 0.5);
        assert_eq!(s.accelerometer.y, -5.0);
        assert_eq!(s.gyroscope.z, 9.0);
    }
}
