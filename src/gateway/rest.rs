use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::envelope::{ApiErrorBody, IdPayload, Response, SearchPayload};
use super::Gateway;
use crate::error::StoreError;
use crate::query::{Filters, Page, QueryDescriptor};
use crate::record::Record;

/// Gateway speaking JSON over HTTP to `{base}/{resource}`.
pub struct RestGateway<R> {
  client: Client,
  base: Url,
  _record: PhantomData<fn() -> R>,
}

impl<R> Clone for RestGateway<R> {
  fn clone(&self) -> Self {
    Self {
      client: self.client.clone(),
      base: self.base.clone(),
      _record: PhantomData,
    }
  }
}

impl<R: Record> RestGateway<R> {
  /// `client` carries timeouts and default headers; `base` is the API root.
  pub fn new(client: Client, base: Url) -> Self {
    Self {
      client,
      base,
      _record: PhantomData,
    }
  }

  /// `{base}/{resource}/{segments..}` with each segment percent-encoded.
  fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
    let mut url = self.base.clone();
    {
      let mut path = url
        .path_segments_mut()
        .map_err(|_| StoreError::Validation(format!("{} cannot be used as a base URL", self.base)))?;
      path.pop_if_empty().push(R::resource()).extend(segments);
    }
    Ok(url)
  }

  async fn send(&self, request: RequestBuilder) -> Result<Value, StoreError> {
    let response = request
      .send()
      .await
      .map_err(|e| StoreError::Transport(e.to_string()))?;

    let status = response.status();
    let bytes = response
      .bytes()
      .await
      .map_err(|e| StoreError::Transport(e.to_string()))?;

    if !status.is_success() {
      // Non-JSON error bodies still produce a rejection, just without a message
      let body: ApiErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
      return Err(body.into_error(status.as_u16()));
    }

    if bytes.is_empty() {
      return Ok(Value::Null);
    }

    serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(e.to_string()))
  }
}

#[async_trait]
impl<R: Record> Gateway<R> for RestGateway<R> {
  async fn list(&self, query: &QueryDescriptor) -> Result<Page<R>, StoreError> {
    let mut url = self.url(&[])?;
    {
      let mut pairs = url.query_pairs_mut();
      pairs
        .append_pair("page", &query.page.to_string())
        .append_pair("pageSize", &query.page_size.to_string());
      if !query.search.is_empty() {
        pairs.append_pair("search", &query.search);
      }
      if let Some(sort) = &query.sort {
        pairs
          .append_pair("sortBy", &sort.column)
          .append_pair("sortDir", sort.direction.as_str());
      }
    }

    debug!(resource = R::resource(), %url, "GET page");
    let body = self.send(self.client.get(url)).await?;
    Response::<Page<R>>::from_json(body)?.into_result()
  }

  async fn create(&self, input: &R::Input) -> Result<Response<String>, StoreError> {
    let url = self.url(&[])?;
    debug!(resource = R::resource(), %url, "POST");
    let body = self.send(self.client.post(url).json(input)).await?;
    created_id(body)
  }

  async fn update(&self, id: &str, patch: &R::Patch) -> Result<Response<String>, StoreError> {
    let url = self.url(&[id])?;
    debug!(resource = R::resource(), %url, "PUT");
    let body = self.send(self.client.put(url).json(patch)).await?;
    if body.is_null() {
      // Some endpoints answer 204; the identifier is unchanged
      return Ok(Response::Raw(id.to_string()));
    }
    Ok(Response::<IdPayload>::from_json(body)?.map(String::from))
  }

  async fn delete(&self, id: &str) -> Result<(), StoreError> {
    let url = self.url(&[id])?;
    debug!(resource = R::resource(), %url, "DELETE");
    let body = self.send(self.client.delete(url)).await?;

    if let Ok(Response::Envelope(envelope)) = Response::<Value>::from_json(body) {
      if !envelope.is_success {
        return Response::Envelope(envelope).into_result().map(|_| ());
      }
    }
    Ok(())
  }

  async fn search(
    &self,
    term: &str,
    limit: usize,
    filters: &Filters,
  ) -> Result<Response<SearchPayload<R>>, StoreError> {
    let mut url = self.url(&["search"])?;
    {
      let mut pairs = url.query_pairs_mut();
      pairs
        .append_pair("term", term)
        .append_pair("limit", &limit.to_string());
      for (key, value) in filters {
        pairs.append_pair(key, value);
      }
    }

    debug!(resource = R::resource(), %url, "GET search");
    let body = self.send(self.client.get(url)).await?;
    Response::from_json(body)
  }

  async fn recent(&self, limit: usize) -> Result<Response<SearchPayload<R>>, StoreError> {
    let mut url = self.url(&["recent"])?;
    url
      .query_pairs_mut()
      .append_pair("limit", &limit.to_string());

    debug!(resource = R::resource(), %url, "GET recent");
    let body = self.send(self.client.get(url)).await?;
    Response::from_json(body)
  }
}

/// Identifier of a freshly created record. Unlike updates there is no id to
/// fall back on, so an empty 2xx body is a decode failure.
fn created_id(body: Value) -> Result<Response<String>, StoreError> {
  if body.is_null() {
    return Err(StoreError::Decode(
      "create response carried no identifier".to_string(),
    ));
  }
  Ok(Response::<IdPayload>::from_json(body)?.map(String::from))
}
