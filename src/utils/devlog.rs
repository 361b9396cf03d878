//! Developer bench lines (`dev6!`) with an opt-in thread-local capture buffer,
//! so tests can assert on what a query emitted without racing the global logger.

use std::cell::RefCell;

thread_local! {
    static CAPTURE: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

/// Stops capturing on the current thread when dropped.
pub struct CaptureGuard;

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        CAPTURE.with(|c| *c.borrow_mut() = None);
    }
}

/// Starts capturing `dev6!` lines emitted on the current thread.
#[must_use]
pub fn capture() -> CaptureGuard {
    CAPTURE.with(|c| *c.borrow_mut() = Some(Vec::new()));
    CaptureGuard
}

#[doc(hidden)]
pub fn record(line: &str) {
    CAPTURE.with(|c| {
        if let Some(buf) = c.borrow_mut().as_mut() {
            buf.push(line.to_owned());
        }
    });
}

/// Takes every captured line, leaving the buffer empty.
pub fn drain() -> Vec<String> {
    CAPTURE.with(|c| c.borrow_mut().as_mut().map(std::mem::take).unwrap_or_default())
}

/// Captured lines that are JSON bench records for the given operation.
pub fn bench_lines(op: &str) -> Vec<serde_json::Value> {
    drain()
        .iter()
        .filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
        .filter(|v| v.get("op").and_then(|o| o.as_str()) == Some(op))
        .collect()
}

/// Emits a developer bench line: captured when enabled and routed to the
/// `nexus_query::dev6` log target at trace level.
#[macro_export]
macro_rules! dev6 {
    ($($arg:tt)*) => {{
        let __line = format!($($arg)*);
        $crate::utils::devlog::record(&__line);
        log::log!(target: $crate::logger::DEV6_TARGET, log::Level::Trace, "{}", __line);
    }};
}
