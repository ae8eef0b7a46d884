use tracing::warn;

/// Blocking user notification; `alert` returns once the message is delivered.
pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
}

impl<F> Notifier for F
where
    F: Fn(&str) + Send + Sync,
{
    fn alert(&self, message: &str) {
        self(message)
    }
}

/// Notifier for headless hosts: messages go to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        warn!(target: "study_calendar::alert", "{message}");
    }
}
