use thiserror::Error;

/// Wiring failures reported by [`crate::engine::EngineBuilder::build`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no sensor feed attached; the tick-driven detectors would never see a sample")]
    MissingSensorFeed,
    #[error("no event bus attached; gesture events would be dropped")]
    MissingEventBus,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LabelError {
    #[error("empty label")]
    Empty,
    #[error("unknown label '{0}'")]
    Unknown(String),
}
