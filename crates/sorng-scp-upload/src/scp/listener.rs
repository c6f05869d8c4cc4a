// ── Log listener – caller-supplied sink for transfer events ──────────────────

use log::Level;

/// Receives progress and diagnostic messages for an upload.
///
/// Shared between concurrently running uploads, hence `Send + Sync`.
pub trait ScpLogListener: Send + Sync {
    fn log(&self, level: Level, message: &str);
}

/// Default listener; discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogListener;

impl ScpLogListener for NoopLogListener {
    fn log(&self, _level: Level, _message: &str) {}
}

/// Forwards listener events into the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct FacadeLogListener;

impl ScpLogListener for FacadeLogListener {
    fn log(&self, level: Level, message: &str) {
        log::log!(target: "sorng_scp_upload::listener", level, "{}", message);
    }
}

impl<F> ScpLogListener for F
where
    F: Fn(Level, &str) + Send + Sync,
{
    fn log(&self, level: Level, message: &str) {
        self(level, message)
    }
}
