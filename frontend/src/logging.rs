use log::LevelFilter;

#[cfg(target_arch = "wasm32")]
mod console {
    use log::{Level, Log, Metadata, Record};
    use wasm_bindgen::JsValue;

    pub struct ConsoleLogger;

    impl Log for ConsoleLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= log::max_level()
        }

        fn log(&self, record: &Record) {
            if !self.enabled(record.metadata()) {
                return;
            }

            let line = format!("{} | {}", record.target(), record.args());
            match record.level() {
                Level::Error => web_sys::console::error_1(&JsValue::from_str(&line)),
                Level::Warn => web_sys::console::warn_1(&JsValue::from_str(&line)),
                _ => crate::log(&line),
            }
        }

        fn flush(&self) {}
    }

    pub static LOGGER: ConsoleLogger = ConsoleLogger;
}

/// Routes `log` records to the browser console. Safe to call more than
/// once; only the first call installs the logger.
#[cfg(target_arch = "wasm32")]
pub fn init_logger(level: LevelFilter) {
    if log::set_logger(&console::LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn init_logger(level: LevelFilter) {
    use std::io::Write;

    let _ = env_logger::builder()
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .try_init();
}
