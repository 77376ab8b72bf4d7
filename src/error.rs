//! Error taxonomy shared by gateways and stores.

use thiserror::Error;

/// Failure reported by a gateway or detected by a store.
///
/// Gateways produce `Transport`, `Rejected` and `Decode`. Stores add
/// `NotFound` for identifiers absent from their snapshot. `Validation` is
/// reserved for input rejected before dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
  #[error("transport failure: {0}")]
  Transport(String),

  #[error("server rejected the request{}: {}", status_suffix(.status), .message.as_deref().unwrap_or("no message"))]
  Rejected {
    status: Option<u16>,
    code: Option<String>,
    message: Option<String>,
  },

  #[error("validation failed: {0}")]
  Validation(String),

  #[error("{entity} {id} not found")]
  NotFound { entity: &'static str, id: String },

  #[error("failed to decode response: {0}")]
  Decode(String),
}

fn status_suffix(status: &Option<u16>) -> String {
  status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

impl StoreError {
  /// Rejection carrying only a message, as produced by envelope responses.
  pub fn rejected(message: impl Into<String>) -> Self {
    StoreError::Rejected {
      status: None,
      code: None,
      message: Some(message.into()),
    }
  }

  /// Message suitable for display to the user.
  ///
  /// Structured backend messages win; everything else falls back to
  /// `fallback`.
  pub fn user_message(&self, fallback: &str) -> String {
    match self {
      StoreError::Rejected {
        message: Some(message),
        ..
      } if !message.trim().is_empty() => message.clone(),
      StoreError::Validation(message) if !message.trim().is_empty() => message.clone(),
      _ => fallback.to_string(),
    }
  }

  pub fn is_transport(&self) -> bool {
    matches!(self, StoreError::Transport(_))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_user_message_prefers_backend_message() {
    let err = StoreError::Rejected {
      status: Some(409),
      code: Some("DUPLICATE".to_string()),
      message: Some("An account with that name already exists".to_string()),
    };
    assert_eq!(
      err.user_message("Could not create account."),
      "An account with that name already exists"
    );
  }

  #[test]
  fn test_user_message_falls_back() {
    let err = StoreError::Transport("connection refused".to_string());
    assert_eq!(err.user_message("Could not load."), "Could not load.");

    let blank = StoreError::rejected("   ");
    assert_eq!(blank.user_message("fallback"), "fallback");
  }

  #[test]
  fn test_display_includes_status() {
    let err = StoreError::Rejected {
      status: Some(500),
      code: None,
      message: None,
    };
    assert_eq!(
      err.to_string(),
      "server rejected the request (HTTP 500): no message"
    );
  }
}
