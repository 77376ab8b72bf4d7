//! Remote data gateways: the store's only boundary to the backend.

mod envelope;
mod memory;
mod rest;

pub use envelope::{
  ApiError, ApiErrorBody, Envelope, IdPayload, IdValue, Response, SearchPayload,
};
pub use memory::{Call, InMemoryGateway};
pub use rest::RestGateway;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::query::{Filters, Page, QueryDescriptor};
use crate::record::Record;

/// Backend access for one resource.
///
/// Mutations and lookups may answer with either response shape; stores call
/// `Response::into_result` to normalize.
#[async_trait]
pub trait Gateway<R: Record>: Send + Sync {
  async fn list(&self, query: &QueryDescriptor) -> Result<Page<R>, StoreError>;

  /// Returns the server-assigned identifier.
  async fn create(&self, input: &R::Input) -> Result<Response<String>, StoreError>;

  async fn update(&self, id: &str, patch: &R::Patch) -> Result<Response<String>, StoreError>;

  async fn delete(&self, id: &str) -> Result<(), StoreError>;

  async fn search(
    &self,
    term: &str,
    limit: usize,
    filters: &Filters,
  ) -> Result<Response<SearchPayload<R>>, StoreError>;

  async fn recent(&self, limit: usize) -> Result<Response<SearchPayload<R>>, StoreError>;
}
