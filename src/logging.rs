//! Console logging for the MIX tools.
//!
//! Status lines (`info!`) print bare to stdout so they read like normal
//! tool output; warnings and errors go to stderr with a level prefix.
//! The tools map their `-q`/`-v` switches onto the level filter.

use log::{Level, LevelFilter, Log, Metadata, Record};

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Info => println!("{}", record.args()),
            level => eprintln!("{}: {}", level, record.args()),
        }
    }

    fn flush(&self) {}
}

/// Install the console logger with the given level cap. Safe to call more
/// than once; later calls only adjust the level.
pub fn init(max_level: LevelFilter) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(max_level);
}
