//! Recorded / live session driver: JSON lines in, one JSON line per gesture event out.
//!
//! ```text
//! {"t":0,"kind":"sample","gyro":[0,600,0],"accel":[0,0,-9.8]}
//! {"t":0,"kind":"tick"}
//! {"t":5,"kind":"extension","label":"[ \"DEBOUNCE_LDA_INEH\" ]"}
//! {"kind":"connection","connected":false}
//! ```
//! Records without `t` are stamped with wall-clock milliseconds since the pipeline started.

use anyhow::{Result, anyhow};
use log::warn;
use serde::Deserialize;
use std::{
    io::{BufRead, Write},
    time::Instant,
};

use crate::config::Profile;
use crate::engine::{EngineBuilder, GestureEngine};
use crate::events::{EventBus, Subscription};
use crate::labels::Label;
use crate::sensor::{Quat, SensorFeed, SensorSnapshot, Vec3};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecordKind {
    Sample {
        gyro: [f32; 3],
        accel: [f32; 3],
        #[serde(default)]
        euler: Option<[f32; 3]>,
        #[serde(default)]
        quat: Option<[f32; 4]>,
    },
    Tick,
    #[serde(alias = "extension", alias = "shake", alias = "swipe")]
    Label {
        label: String,
    },
    Connection {
        connected: bool,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub t: Option<u64>,
    #[serde(flatten)]
    pub kind: RecordKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub lines: usize,
    pub skipped: usize,
    pub events: usize,
}

pub struct Pipeline {
    engine: GestureEngine,
    events: Subscription,
    clock: Instant,
    last_t: u64,
}

impl Pipeline {
    pub fn new(profile: Profile) -> Result<Self> {
        let bus = EventBus::new();
        let events = bus.subscribe();
        let engine = EngineBuilder::new(profile)
            .sensor_feed(SensorFeed::new())
            .event_bus(bus)
            .build()?;
        Ok(Self {
            engine,
            events,
            clock: Instant::now(),
            last_t: 0,
        })
    }

    pub fn engine(&self) -> &GestureEngine {
        &self.engine
    }

    fn stamp(&mut self, t: Option<u64>) -> u64 {
        let t = t.unwrap_or_else(|| self.clock.elapsed().as_millis() as u64);
        if t < self.last_t {
            warn!("timestamp {t} ms went backwards, holding at {} ms", self.last_t);
            return self.last_t;
        }
        self.last_t = t;
        t
    }

    /// Feed one record; returns the events it produced, each tagged with the time it took effect.
    /// An overdue hold or click carries its deadline, not the record's `t`.
    pub fn apply(&mut self, rec: Record) -> Result<Vec<serde_json::Value>> {
        let now = self.stamp(rec.t);
        match rec.kind {
            RecordKind::Sample {
                gyro,
                accel,
                euler,
                quat,
            } => {
                let prev = self.engine.feed().latest();
                self.engine.feed().publish(SensorSnapshot {
                    gyroscope: Vec3::from(gyro),
                    accelerometer: Vec3::from(accel),
                    euler_angles: euler.map(Vec3::from).unwrap_or(prev.euler_angles),
                    quaternion: quat.map(Quat::from).unwrap_or(prev.quaternion),
                });
            }
            RecordKind::Tick => self.engine.tick(now),
            RecordKind::Label { label } => {
                let label = Label::parse(&label)?;
                self.engine.push_label(now, label);
            }
            RecordKind::Connection { connected } => self.engine.set_connected(connected),
        }

        self.events
            .drain_stamped()
            .into_iter()
            .map(|s| -> Result<serde_json::Value> {
                let mut v = serde_json::to_value(s.event)?;
                v["t"] = serde_json::json!(s.at_ms);
                Ok(v)
            })
            .collect()
    }

    pub fn apply_line(&mut self, line: &str) -> Result<Vec<serde_json::Value>> {
        let rec: Record =
            serde_json::from_str(line).map_err(|e| anyhow!("bad record: {e}"))?;
        self.apply(rec)
    }

    /// Drive the whole input. `between` runs before every line (profile hot-reload hook).
    pub fn run<R, W, F>(&mut self, input: R, mut out: W, mut between: F) -> Result<RunStats>
    where
        R: BufRead,
        W: Write,
        F: FnMut(&mut GestureEngine),
    {
        let mut stats = RunStats::default();
        for (no, line) in input.lines().enumerate() {
            let line = line?;
            between(&mut self.engine);
            if line.trim().is_empty() {
                continue;
            }
            stats.lines += 1;
            match self.apply_line(&line) {
                Ok(events) => {
                    for ev in events {
                        writeln!(out, "{ev}")?;
                        stats.events += 1;
                    }
                    out.flush()?;
                }
                Err(e) => {
                    warn!("line {}: {e}", no + 1);
                    stats.skipped += 1;
                }
            }
        }
        Ok(stats)
    }
}
