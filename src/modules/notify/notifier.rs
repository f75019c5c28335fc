use std::fmt;

/// Visual weight of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Success => "success",
            Severity::Info => "info",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

/// Fire-and-forget message sink.
///
/// Display and dismissal belong to the implementation; callers never wait on it.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Notifier for headless use: every message becomes a log line
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => tracing::warn!(target: "notify", "{}", message),
            _ => tracing::info!(target: "notify", severity = %severity, "{}", message),
        }
    }
}
