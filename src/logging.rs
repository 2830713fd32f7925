use env_logger::{Builder, Env};

/// `RUST_LOG` overrides the default `info` level. Logs go to stderr; stdout carries events.
pub fn init() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}
