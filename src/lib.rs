//! Wrist gesture classification for an IMU + extension-label armband.
//!
//! A transport pushes sensor snapshots into a [`sensor::SensorFeed`] and discrete labels into a
//! [`engine::GestureEngine`]; the engine runs the flick, shake, hand-zone, debounce and
//! hold/click state machines and publishes [`events::GestureEvent`]s on an
//! [`events::EventBus`].

pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod events;
pub mod hand_zone;
pub mod labels;
pub mod pipeline;
pub mod sensor;
pub mod sequencer;
pub mod timer;
pub mod wrist;
