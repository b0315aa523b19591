//! HTTP client for the raid backend.
//!
//! One client is shared by every remote adapter. Success bodies are
//! accepted either bare or wrapped in a `{"data": ...}` envelope; failures
//! are classified into [`ApiError`] kinds.

use color_eyre::{eyre::eyre, Result};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use super::error::ApiError;
use crate::config::Config;
use crate::session::SessionStore;

/// Client for the raid backend REST API.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: String,
  session: SessionStore,
}

impl ApiClient {
  /// Build a client from configuration.
  ///
  /// The uniform CRUD timeout from `api.timeout_secs` applies to every
  /// request made through this client; the availability probe sets its own
  /// shorter per-request timeout.
  pub fn new(config: &Config, session: SessionStore) -> Result<Self> {
    let base_url = url::Url::parse(&config.api.base_url)
      .map_err(|e| eyre!("Invalid api.base_url '{}': {}", config.api.base_url, e))?;

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.api.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url: base_url.as_str().trim_end_matches('/').to_string(),
      session,
    })
  }

  /// The underlying HTTP client, for sharing a connection pool.
  pub fn http(&self) -> reqwest::Client {
    self.http.clone()
  }

  /// The validated base URL, without a trailing slash.
  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// Build a request with the session token attached when one exists.
  ///
  /// The token is looked up on every call: a token saved, changed, or
  /// cleared after client construction is picked up at the next request.
  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
    let mut request = self.http.request(method, url);
    if let Some(token) = self.session.current_token() {
      request = request.bearer_auth(token);
    }
    request
  }

  pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
    self.dispatch(self.request(Method::GET, path)).await
  }

  pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    self.dispatch(self.request(Method::POST, path).json(body)).await
  }

  pub async fn put_json<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    self.dispatch(self.request(Method::PUT, path).json(body)).await
  }

  pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
    let response = self.request(Method::DELETE, path).send().await?;
    check_status(response).await?;
    Ok(())
  }

  /// Send a request and decode the success body.
  async fn dispatch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
    let response = request.send().await?;
    let response = check_status(response).await?;

    let status = response.status().as_u16();
    let text = response.text().await?;

    let value = if text.trim().is_empty() {
      Value::Null
    } else {
      serde_json::from_str(&text).map_err(|err| ApiError::Server {
        status,
        message: format!("unparseable response body: {err}"),
      })?
    };

    serde_json::from_value(unwrap_envelope(value)).map_err(|err| ApiError::Server {
      status,
      message: format!("unexpected response shape: {err}"),
    })
  }
}

/// Classify a non-success status into an `ApiError`.
async fn check_status(response: Response) -> Result<Response, ApiError> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }

  Err(match status {
    StatusCode::NOT_FOUND => ApiError::NotFound,
    StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
    StatusCode::FORBIDDEN => ApiError::Forbidden,
    StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation {
      errors: validation_errors(&response.text().await.unwrap_or_default()),
    },
    other => ApiError::Server {
      status: other.as_u16(),
      message: response.text().await.unwrap_or_default(),
    },
  })
}

/// Accept either a bare JSON value or a single-key `{"data": ...}` envelope.
fn unwrap_envelope(value: Value) -> Value {
  match value {
    Value::Object(mut map) if map.len() == 1 && map.contains_key("data") => {
      map.remove("data").unwrap_or(Value::Null)
    }
    other => other,
  }
}

/// Per-field messages from a 422 body shaped `{"errors": {"field": ...}}`,
/// where each field maps to one message or a list of them. Anything else
/// yields an empty map.
fn validation_errors(body: &str) -> BTreeMap<String, Vec<String>> {
  #[derive(serde::Deserialize)]
  struct ValidationBody {
    #[serde(default)]
    errors: BTreeMap<String, FieldMessages>,
  }

  #[derive(serde::Deserialize)]
  #[serde(untagged)]
  enum FieldMessages {
    One(String),
    Many(Vec<String>),
  }

  let parsed: ValidationBody = match serde_json::from_str(body) {
    Ok(parsed) => parsed,
    Err(_) => return BTreeMap::new(),
  };

  parsed
    .errors
    .into_iter()
    .map(|(field, messages)| {
      let messages = match messages {
        FieldMessages::One(message) => vec![message],
        FieldMessages::Many(messages) => messages,
      };
      (field, messages)
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{ApiConfig, CacheConfig, Config};
  use crate::model::User;

  fn config(base_url: &str) -> Config {
    Config {
      api: ApiConfig {
        base_url: base_url.to_string(),
        timeout_secs: 5,
      },
      cache: CacheConfig::default(),
    }
  }

  fn temp_session(name: &str) -> SessionStore {
    let path = std::env::temp_dir().join(format!("raidsync-test-{}-{}", std::process::id(), name));
    let _ = std::fs::remove_file(&path);
    SessionStore::at_path(path)
  }

  fn client(base_url: &str, session: SessionStore) -> ApiClient {
    ApiClient::new(&config(base_url), session).expect("client")
  }

  fn user_body() -> &'static str {
    r#"[{"id": 1, "email": "ana@example.org", "first_name": "Ana", "last_name": "Brito"}]"#
  }

  #[tokio::test]
  async fn test_bare_body_is_accepted() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/users")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(user_body())
      .create_async()
      .await;

    let client = client(&server.url(), temp_session("bare"));
    let users: Vec<User> = client.get_json("/users").await.unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].email, "ana@example.org");
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_data_envelope_is_unwrapped() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/users")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(format!(r#"{{"data": {}}}"#, user_body()))
      .create_async()
      .await;

    let client = client(&server.url(), temp_session("envelope"));
    let users: Vec<User> = client.get_json("/users").await.unwrap();

    assert_eq!(users.len(), 1);
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_bearer_header_attached_when_token_present() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/users")
      .match_header("authorization", "Bearer t-123")
      .with_status(200)
      .with_body(user_body())
      .create_async()
      .await;

    let session = temp_session("bearer");
    session.save("t-123").unwrap();

    let client = client(&server.url(), session);
    let _users: Vec<User> = client.get_json("/users").await.unwrap();

    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_no_bearer_header_without_token() {
    std::env::remove_var("RAIDSYNC_TOKEN");

    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/users")
      .match_header("authorization", mockito::Matcher::Missing)
      .with_status(200)
      .with_body(user_body())
      .create_async()
      .await;

    let client = client(&server.url(), temp_session("no-bearer"));
    let _users: Vec<User> = client.get_json("/users").await.unwrap();

    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_unauthorized_is_classified() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("GET", "/users")
      .with_status(401)
      .create_async()
      .await;

    let client = client(&server.url(), temp_session("401"));
    let result: Result<Vec<User>, _> = client.get_json("/users").await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
  }

  #[tokio::test]
  async fn test_forbidden_is_classified() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("GET", "/users")
      .with_status(403)
      .create_async()
      .await;

    let client = client(&server.url(), temp_session("403"));
    let result: Result<Vec<User>, _> = client.get_json("/users").await;

    assert!(matches!(result, Err(ApiError::Forbidden)));
  }

  #[tokio::test]
  async fn test_validation_messages_are_parsed() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", "/users")
      .with_status(422)
      .with_body(r#"{"errors": {"email": ["is taken"], "last_name": "must not be blank"}}"#)
      .create_async()
      .await;

    let client = client(&server.url(), temp_session("422"));
    let result: Result<User, _> =
      client.post_json("/users", &serde_json::json!({"email": "x"})).await;

    match result {
      Err(ApiError::Validation { errors }) => {
        assert_eq!(errors["email"], vec!["is taken".to_string()]);
        assert_eq!(errors["last_name"], vec!["must not be blank".to_string()]);
      }
      other => panic!("expected a validation failure, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn test_other_statuses_are_server_failures() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("GET", "/users")
      .with_status(500)
      .with_body("boom")
      .create_async()
      .await;

    let client = client(&server.url(), temp_session("500"));
    let result: Result<Vec<User>, _> = client.get_json("/users").await;

    match result {
      Err(ApiError::Server { status, message }) => {
        assert_eq!(status, 500);
        assert_eq!(message, "boom");
      }
      other => panic!("expected a server failure, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn test_unreachable_backend_is_a_network_failure() {
    let client = client("http://127.0.0.1:1", temp_session("unreachable"));
    let result: Result<Vec<User>, _> = client.get_json("/users").await;

    assert!(matches!(result, Err(ApiError::Network(_))));
  }

  #[tokio::test]
  async fn test_malformed_success_body_is_a_server_failure() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("GET", "/users")
      .with_status(200)
      .with_body("not json at all")
      .create_async()
      .await;

    let client = client(&server.url(), temp_session("malformed"));
    let result: Result<Vec<User>, _> = client.get_json("/users").await;

    assert!(matches!(result, Err(ApiError::Server { status: 200, .. })));
  }
}
