//! Scope-based timing markers for the external debug/profile sidecar (§6).
//!
//! The core never depends on what a sidecar does with these — in a release build they
//! compile down to nothing. A CLI that wants timing breakdowns installs a [`Sink`] before
//! calling [`crate::generate`]; without one, [`span`] is a cheap no-op.

use std::sync::OnceLock;
use std::time::Instant;

/// Receives `(name, elapsed_us, elapsed_cycles)` for each instrumented scope.
///
/// `elapsed_cycles` is left at `0` — the core has no portable cycle counter and isn't
/// going to reach for inline asm just to feed a sidecar that's a no-op by default.
pub trait Sink: Send + Sync {
    fn record(&self, name: &'static str, elapsed_us: u64, elapsed_cycles: u64);
}

static SINK: OnceLock<Box<dyn Sink>> = OnceLock::new();

/// Installs the process-wide sidecar. Only the first call wins; later calls are ignored.
/// Never required — the generator runs identically with no sink installed.
pub fn install(sink: Box<dyn Sink>) {
    let _ = SINK.set(sink);
}

/// A scope guard that reports its own lifetime to the installed sink, if any, on drop.
pub struct Span {
    name: &'static str,
    start: Instant,
}

/// Starts a named scope. Cheap (one `Instant::now()`) even with no sink installed.
pub fn span(name: &'static str) -> Span {
    Span {
        name,
        start: Instant::now(),
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        if let Some(sink) = SINK.get() {
            let elapsed = self.start.elapsed();
            sink.record(self.name, elapsed.as_micros() as u64, 0);
        }
    }
}
