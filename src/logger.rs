use crate::error;
use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::prelude::*;
use web_sys::console;

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => console::error_1(&line),
            Level::Warn => console::warn_1(&line),
            Level::Info => console::info_1(&line),
            Level::Debug => console::debug_1(&line),
            Level::Trace => console::log_1(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Route `log` records to the browser console at `level` ("off", "error", ... "trace").
/// Calling it again only changes the level.
#[wasm_bindgen]
pub fn init_logging(level: &str) -> JsValue {
    let filter: LevelFilter = match level.parse() {
        Ok(f) => f,
        Err(_) => return error::invalid_options("log level", format!("unknown level '{}'", level)),
    };
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(filter);
    error::ok(JsValue::from_str(&filter.to_string()))
}

#[wasm_bindgen]
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}
