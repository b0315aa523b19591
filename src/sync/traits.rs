//! Core traits and types shared across the synchronization layer.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Trait for entities the synchronization layer can store and reconcile.
///
/// Identifiers are stable integers once known: positive ids are assigned by
/// the backend, negative ids are local placeholders for records the backend
/// has not confirmed yet.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned {
  /// The identifier of this record, if one has been assigned.
  fn record_id(&self) -> Option<i64>;

  /// Assign an identifier, placeholder or backend-confirmed.
  fn set_record_id(&mut self, id: i64);

  /// Entity kind name the store organizes records under (e.g. "raid").
  fn kind() -> &'static str;
}

/// Data returned by a repository operation, tagged with the tier that
/// answered.
#[derive(Debug, Clone, PartialEq)]
pub struct Synced<T> {
  pub data: T,
  pub source: DataSource,
}

impl<T> Synced<T> {
  /// Data confirmed by the remote backend.
  pub fn remote(data: T) -> Self {
    Self { data, source: DataSource::Remote }
  }

  /// Data served from the local store after a remote failure.
  pub fn fallback(data: T) -> Self {
    Self { data, source: DataSource::LocalFallback }
  }

  /// Data persisted locally and still awaiting remote confirmation.
  pub fn local_only(data: T) -> Self {
    Self { data, source: DataSource::LocalOnly }
  }
}

/// Which tier answered a repository operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
  /// The remote backend answered; the local store mirrors the result.
  Remote,
  /// The remote backend failed; the local store answered instead.
  LocalFallback,
  /// A local write the remote backend has not confirmed yet.
  LocalOnly,
}
