//! Wrist flick and wrist shake detection from the gyroscope.
//!
//! Both detectors are sampled once per tick. A NaN sample never crosses a threshold because every
//! test is a plain `<`/`>` comparison.

use log::debug;

use crate::config::WristThresholds;
use crate::events::GestureEvent;
use crate::timer::TimerQueue;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlickState {
    #[default]
    None,
    ArmedLeft,
    ArmedRight,
}

/// Flick detector on gyro.y.
///
/// A flick is an excursion past one threshold followed by a swing past the opposite one. The
/// emitted direction is the direction the flick was *armed* in: arming left (negative swing) and
/// completing positive fires `WristFlickLeft`; arming right and completing negative fires
/// `WristFlickRight`. Afterwards the detector is held in `None` for `flick_cooldown_ms`.
#[derive(Debug)]
pub struct WristFlickDetector {
    th: WristThresholds,
    state: FlickState,
    armed_at_ms: Option<u64>,
    cooling: bool,
    generation: u64,
    timers: TimerQueue<u64>,
}

impl WristFlickDetector {
    pub fn new(th: WristThresholds) -> Self {
        Self {
            th,
            state: FlickState::None,
            armed_at_ms: None,
            cooling: false,
            generation: 0,
            timers: TimerQueue::new(),
        }
    }

    pub fn set_thresholds(&mut self, th: WristThresholds) {
        self.th = th;
    }

    pub fn state(&self) -> FlickState {
        self.state
    }

    pub fn in_cooldown(&self) -> bool {
        self.cooling
    }

    fn advance(&mut self, now_ms: u64) {
        while let Some((_, generation)) = self.timers.pop_due(now_ms) {
            if generation == self.generation {
                self.cooling = false;
                self.state = FlickState::None;
            }
        }
    }

    pub fn update(&mut self, now_ms: u64, gyro_y: f32) -> Option<GestureEvent> {
        self.advance(now_ms);
        if self.cooling {
            self.state = FlickState::None;
            return None;
        }

        match self.state {
            FlickState::None => {
                // both checks run; if both hold (negative left threshold) the later one wins
                if gyro_y > self.th.right_flick_threshold.abs() {
                    self.arm(now_ms, FlickState::ArmedRight);
                }
                if gyro_y < -self.th.left_flick_threshold {
                    self.arm(now_ms, FlickState::ArmedLeft);
                }
                None
            }
            FlickState::ArmedLeft => {
                (gyro_y > self.th.right_flick_threshold).then(|| self.complete(now_ms))
            }
            FlickState::ArmedRight => {
                (gyro_y < -self.th.left_flick_threshold).then(|| self.complete(now_ms))
            }
        }
    }

    fn arm(&mut self, now_ms: u64, state: FlickState) {
        self.state = state;
        self.armed_at_ms = Some(now_ms);
    }

    fn complete(&mut self, now_ms: u64) -> GestureEvent {
        let event = match self.state {
            FlickState::ArmedRight => GestureEvent::WristFlickRight,
            _ => GestureEvent::WristFlickLeft,
        };
        if let Some(t0) = self.armed_at_ms.take() {
            debug!("{event:?} after {} ms", now_ms.saturating_sub(t0));
        }

        self.state = FlickState::None;
        self.cooling = true;
        self.generation += 1;
        self.timers
            .schedule(now_ms, self.th.flick_cooldown_ms, self.generation);
        event
    }
}

/// Arm flags of an in-progress shake.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShakeWindow {
    pub right_armed: bool,
    pub left_armed: bool,
    pub armed_at_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShakeSide {
    Right,
    Left,
}

/// Shake detector on gyro.z: positive crossing, then negative crossing while the positive arm is
/// still live. Each arm flag expires on its own after `shake_expire_ms`.
#[derive(Debug)]
pub struct WristShakeDetector {
    th: WristThresholds,
    window: ShakeWindow,
    right_gen: u64,
    left_gen: u64,
    timers: TimerQueue<(ShakeSide, u64)>,
}

impl WristShakeDetector {
    pub fn new(th: WristThresholds) -> Self {
        Self {
            th,
            window: ShakeWindow::default(),
            right_gen: 0,
            left_gen: 0,
            timers: TimerQueue::new(),
        }
    }

    pub fn set_thresholds(&mut self, th: WristThresholds) {
        self.th = th;
    }

    pub fn window(&self) -> ShakeWindow {
        self.window
    }

    fn advance(&mut self, now_ms: u64) {
        while let Some((_, (side, generation))) = self.timers.pop_due(now_ms) {
            match side {
                ShakeSide::Right if generation == self.right_gen => {
                    self.window.right_armed = false;
                    self.window.armed_at_ms = None;
                }
                ShakeSide::Left if generation == self.left_gen => self.window.left_armed = false,
                _ => {}
            }
        }
    }

    pub fn update(&mut self, now_ms: u64, gyro_z: f32) -> Option<GestureEvent> {
        self.advance(now_ms);
        let thr = self.th.shake_threshold;

        if gyro_z > thr && !self.window.right_armed && !self.window.left_armed {
            self.right_gen += 1;
            self.window.right_armed = true;
            self.window.armed_at_ms = Some(now_ms);
            self.timers
                .schedule(now_ms, self.th.shake_expire_ms, (ShakeSide::Right, self.right_gen));
        }

        if gyro_z < -thr && self.window.right_armed && !self.window.left_armed {
            self.left_gen += 1;
            self.window.left_armed = true;
            self.timers
                .schedule(now_ms, self.th.shake_expire_ms, (ShakeSide::Left, self.left_gen));
        }

        if self.window.right_armed && self.window.left_armed {
            if let Some(t0) = self.window.armed_at_ms {
                debug!("WristShake after {} ms", now_ms.saturating_sub(t0));
            }
            // bump both generations so the pending expiries cannot touch a later window
            self.right_gen += 1;
            self.left_gen += 1;
            self.window = ShakeWindow::default();
            return Some(GestureEvent::WristShake);
        }
        None
    }
}
