//! Notification sink for user-facing store messages.

use tracing::{error, info};

/// Receives toast-worthy messages from stores.
pub trait Notifier: Send + Sync {
  fn error(&self, message: &str);
  fn success(&self, message: &str);
}

/// Routes notifications to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
  fn error(&self, message: &str) {
    error!(target: "fintrack::notify", "{}", message);
  }

  fn success(&self, message: &str) {
    info!(target: "fintrack::notify", "{}", message);
  }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
  fn error(&self, _message: &str) {}
  fn success(&self, _message: &str) {}
}
