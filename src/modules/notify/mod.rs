//! User-facing transient notifications

mod notifier;

pub use notifier::{Notifier, Severity, TracingNotifier};
