//! Generic per-entity remote adapter.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::marker::PhantomData;

use super::client::ApiClient;
use super::error::ApiError;

/// Remote CRUD adapter for one entity collection.
///
/// Repositories hold one of these per entity and expose only the
/// operations their entity actually supports.
pub struct Endpoint<T> {
  client: ApiClient,
  path: &'static str,
  _marker: PhantomData<T>,
}

impl<T> Endpoint<T>
where
  T: Serialize + DeserializeOwned,
{
  /// Adapter for the collection at `/{path}`.
  pub fn new(client: ApiClient, path: &'static str) -> Self {
    Self {
      client,
      path,
      _marker: PhantomData,
    }
  }

  fn item_path(&self, id: i64) -> String {
    format!("{}/{}", self.path, id)
  }

  /// GET the full collection.
  pub async fn list(&self) -> Result<Vec<T>, ApiError> {
    self.client.get_json(self.path).await
  }

  /// GET one record. A backend 404 is an authoritative absence and maps to
  /// `Ok(None)`.
  pub async fn fetch(&self, id: i64) -> Result<Option<T>, ApiError> {
    match self.client.get_json(&self.item_path(id)).await {
      Ok(record) => Ok(Some(record)),
      Err(ApiError::NotFound) => Ok(None),
      Err(err) => Err(err),
    }
  }

  /// POST a new record; the response carries the backend-assigned id.
  pub async fn create(&self, record: &T) -> Result<T, ApiError> {
    self.client.post_json(self.path, record).await
  }

  /// PUT a full record.
  pub async fn update(&self, id: i64, record: &T) -> Result<T, ApiError> {
    self.client.put_json(&self.item_path(id), record).await
  }

  /// PUT a partial field map; the response carries the full updated record.
  pub async fn update_fields(&self, id: i64, fields: &Map<String, Value>) -> Result<T, ApiError> {
    self.client.put_json(&self.item_path(id), fields).await
  }

  /// DELETE one record.
  pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
    self.client.delete(&self.item_path(id)).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{ApiConfig, CacheConfig, Config};
  use crate::model::{Address, User};
  use crate::session::SessionStore;
  use mockito::Matcher;
  use serde_json::json;

  fn endpoint<T: Serialize + DeserializeOwned>(base_url: &str, path: &'static str) -> Endpoint<T> {
    let config = Config {
      api: ApiConfig {
        base_url: base_url.to_string(),
        timeout_secs: 5,
      },
      cache: CacheConfig::default(),
    };
    let session_path = std::env::temp_dir().join(format!(
      "raidsync-test-{}-endpoint-{}",
      std::process::id(),
      path
    ));
    let _ = std::fs::remove_file(&session_path);
    let client = ApiClient::new(&config, SessionStore::at_path(session_path)).expect("client");
    Endpoint::new(client, path)
  }

  #[tokio::test]
  async fn test_fetch_maps_not_found_to_none() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("GET", "/users/9")
      .with_status(404)
      .create_async()
      .await;

    let endpoint: Endpoint<User> = endpoint(&server.url(), "users");
    let found = endpoint.fetch(9).await.unwrap();

    assert!(found.is_none());
  }

  #[tokio::test]
  async fn test_create_sends_no_id_and_returns_server_copy() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/addresses")
      .match_body(Matcher::Json(json!({
        "street": "2 rue des Volcans",
        "city": "Clermont-Ferrand",
        "postal_code": "63000"
      })))
      .with_status(201)
      .with_body(
        r#"{"data": {"id": 42, "street": "2 rue des Volcans", "city": "Clermont-Ferrand", "postal_code": "63000"}}"#,
      )
      .create_async()
      .await;

    let endpoint: Endpoint<Address> = endpoint(&server.url(), "addresses");
    let candidate = Address {
      id: None,
      street: "2 rue des Volcans".to_string(),
      city: "Clermont-Ferrand".to_string(),
      postal_code: "63000".to_string(),
      country: None,
    };

    let created = endpoint.create(&candidate).await.unwrap();
    assert_eq!(created.id, Some(42));
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_update_fields_sends_partial_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("PUT", "/users/9")
      .match_body(Matcher::Json(json!({"first_name": "Ana"})))
      .with_status(200)
      .with_body(r#"{"id": 9, "email": "ana@example.org", "first_name": "Ana", "last_name": "Brito"}"#)
      .create_async()
      .await;

    let endpoint: Endpoint<User> = endpoint(&server.url(), "users");
    let mut fields = Map::new();
    fields.insert("first_name".to_string(), Value::String("Ana".to_string()));

    let updated = endpoint.update_fields(9, &fields).await.unwrap();
    assert_eq!(updated.first_name, "Ana");
    assert_eq!(updated.email, "ana@example.org");
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_delete_accepts_an_empty_response() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("DELETE", "/users/9")
      .with_status(204)
      .create_async()
      .await;

    let endpoint: Endpoint<User> = endpoint(&server.url(), "users");
    endpoint.delete(9).await.unwrap();

    mock.assert_async().await;
  }
}
