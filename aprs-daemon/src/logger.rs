//! Log setup for the daemon.
//!
//! Uses env_logger, so verbosity is controlled with `RUST_LOG`
//! (default `info`).

use env_logger::{Builder, Env};
use log::Level;
use std::io::Write;

pub fn init() {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} {} {} - {}",
            buf.timestamp_millis(),
            level_to_string(record.level()),
            record.target(),
            record.args()
        )
    });
    builder.init();
}

fn level_to_string(level: Level) -> &'static str {
    match level {
        Level::Error => "E",
        Level::Warn => "W",
        Level::Info => "I",
        Level::Debug => "D",
        Level::Trace => "T",
    }
}
