//! Serde types for the backend's response shapes.
//!
//! Endpoints answer in one of two shapes: the raw payload, or a `Result`
//! envelope (`isSuccess` / `value` / `error`). Both are normalized into
//! `Result<T, StoreError>` here so stores never branch on the shape.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;

// ============================================================================
// Envelope
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApiError {
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
  pub is_success: bool,
  pub value: Option<T>,
  #[serde(default)]
  pub error: Option<ApiError>,
}

impl<T> Envelope<T> {
  pub fn success(value: T) -> Self {
    Self {
      is_success: true,
      value: Some(value),
      error: None,
    }
  }
}

/// A gateway reply in either shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Response<T> {
  Raw(T),
  Envelope(Envelope<T>),
}

impl<T> Response<T> {
  pub fn into_result(self) -> Result<T, StoreError> {
    match self {
      Response::Raw(value) => Ok(value),
      Response::Envelope(envelope) if envelope.is_success => envelope
        .value
        .ok_or_else(|| StoreError::Decode("successful envelope without a value".to_string())),
      Response::Envelope(envelope) => {
        let error = envelope.error.unwrap_or_default();
        Err(StoreError::Rejected {
          status: None,
          code: error.code,
          message: error.message,
        })
      }
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
    match self {
      Response::Raw(value) => Response::Raw(f(value)),
      Response::Envelope(envelope) => Response::Envelope(Envelope {
        is_success: envelope.is_success,
        value: envelope.value.map(f),
        error: envelope.error,
      }),
    }
  }
}

impl<T: DeserializeOwned> Response<T> {
  /// Detect the shape of a JSON body and decode it.
  pub fn from_json(value: Value) -> Result<Self, StoreError> {
    if is_envelope(&value) {
      let envelope: Envelope<T> =
        serde_json::from_value(value).map_err(|e| StoreError::Decode(e.to_string()))?;
      Ok(Response::Envelope(envelope))
    } else {
      let raw: T = serde_json::from_value(value).map_err(|e| StoreError::Decode(e.to_string()))?;
      Ok(Response::Raw(raw))
    }
  }
}

fn is_envelope(value: &Value) -> bool {
  value
    .as_object()
    .map(|obj| obj.get("isSuccess").map(Value::is_boolean).unwrap_or(false))
    .unwrap_or(false)
}

// ============================================================================
// Payloads
// ============================================================================

/// Search results arrive either as a bare list or wrapped in `items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchPayload<R> {
  List(Vec<R>),
  Paged { items: Vec<R> },
}

impl<R> SearchPayload<R> {
  pub fn into_items(self) -> Vec<R> {
    match self {
      SearchPayload::List(items) => items,
      SearchPayload::Paged { items } => items,
    }
  }
}

/// Identifier returned by create/update: a string, a number, or `{ "id": .. }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IdPayload {
  Text(String),
  Number(i64),
  Object { id: IdValue },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
  Text(String),
  Number(i64),
}

impl From<IdPayload> for String {
  fn from(payload: IdPayload) -> Self {
    match payload {
      IdPayload::Text(s) | IdPayload::Object { id: IdValue::Text(s) } => s,
      IdPayload::Number(n) | IdPayload::Object { id: IdValue::Number(n) } => n.to_string(),
    }
  }
}

/// Structured error body of a non-2xx response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
  #[serde(default)]
  pub user_message: Option<String>,
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub detail: Option<String>,
  #[serde(default)]
  pub code: Option<String>,
  /// Some endpoints wrap the failure in an envelope instead
  #[serde(default)]
  pub error: Option<ApiError>,
}

impl ApiErrorBody {
  pub fn into_error(self, status: u16) -> StoreError {
    let nested = self.error.unwrap_or_default();
    StoreError::Rejected {
      status: Some(status),
      code: self.code.or(nested.code),
      message: self
        .user_message
        .or(self.message)
        .or(self.detail)
        .or(nested.message),
    }
  }
}
