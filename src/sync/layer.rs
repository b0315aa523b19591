//! Synchronization layer between the remote backend and the local store.
//!
//! Remote calls are injected per operation as future-returning closures, so
//! the layer stays generic over transport and entity. Policy in one line:
//! reads are remote-first with local fallback, creates are locally durable,
//! updates and deletes are remote-authoritative.

use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use super::store::{RecordStore, StoreError};
use super::traits::{Record, Synced};
use crate::api::ApiError;

/// Failure of a repository operation, classified by the tier that failed.
#[derive(Debug, Error)]
pub enum SyncError {
  #[error(transparent)]
  Remote(#[from] ApiError),

  #[error(transparent)]
  Store(#[from] StoreError),
}

/// Policy core shared by every entity repository.
pub struct SyncLayer<S: RecordStore> {
  store: Arc<S>,
}

impl<S: RecordStore> SyncLayer<S> {
  /// Create a new synchronization layer over the given store.
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  /// Fetch the full remote listing, read-through style.
  ///
  /// 1. Attempt the remote listing
  /// 2. On success, atomically replace the local extent and return the
  ///    remote records
  /// 3. On any remote failure, fall back to the local extent
  /// 4. If the local read fails too, return an empty listing
  ///
  /// Listings degrade, they never error.
  pub async fn list_through<T, F, Fut>(&self, fetch: F) -> Synced<Vec<T>>
  where
    T: Record,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>, ApiError>>,
  {
    match fetch().await {
      Ok(records) => {
        if let Err(err) = self.store.replace_all(&records) {
          warn!(kind = T::kind(), error = %err, "failed to mirror remote listing locally");
        }
        Synced::remote(records)
      }
      Err(err) => {
        debug!(kind = T::kind(), error = %err, "remote listing failed, serving local records");
        self.list_local()
      }
    }
  }

  /// The local extent without a remote attempt, empty if the store fails.
  pub fn list_local<T: Record>(&self) -> Synced<Vec<T>> {
    match self.store.list_all() {
      Ok(records) => Synced::fallback(records),
      Err(err) => {
        warn!(kind = T::kind(), error = %err, "local store read failed, serving an empty listing");
        Synced::fallback(Vec::new())
      }
    }
  }

  /// Fetch one record by id, read-through style.
  ///
  /// A remote `None` is an authoritative absence (the backend answered 404)
  /// and comes back as `Ok(None)` without consulting the store. On a remote
  /// failure the store answers instead; a store miss propagates the remote
  /// failure, a store error propagates as its own failure.
  pub async fn get_through<T, F, Fut>(
    &self,
    id: i64,
    fetch: F,
  ) -> Result<Option<Synced<T>>, SyncError>
  where
    T: Record,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<T>, ApiError>>,
  {
    match fetch().await {
      Ok(Some(record)) => {
        if let Err(err) = self.store.upsert_one(&record) {
          warn!(kind = T::kind(), id, error = %err, "failed to mirror remote record locally");
        }
        Ok(Some(Synced::remote(record)))
      }
      Ok(None) => Ok(None),
      Err(err) => {
        debug!(kind = T::kind(), id, error = %err, "remote read failed, trying the local store");
        match self.store.get_by_id(id) {
          Ok(Some(record)) => Ok(Some(Synced::fallback(record))),
          Ok(None) => Err(SyncError::Remote(err)),
          Err(store_err) => Err(SyncError::Store(store_err)),
        }
      }
    }
  }

  /// Create a record with local durability.
  ///
  /// 1. Persist the candidate locally first, under a fresh negative
  ///    placeholder id when it has none, so a remote failure never loses
  ///    the write
  /// 2. Attempt the remote create with the caller's candidate (the backend
  ///    assigns the real id)
  /// 3. On success, promote the local row to the confirmed copy and return
  ///    it
  /// 4. On failure, keep and return the local copy; the remote error is
  ///    logged, not surfaced
  ///
  /// Only a failure of the durability write in step 1 errors.
  pub async fn create_through<T, F, Fut>(&self, record: T, push: F) -> Result<Synced<T>, SyncError>
  where
    T: Record,
    F: FnOnce(T) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
  {
    let mut local = record.clone();
    let local_id = match local.record_id() {
      Some(id) => id,
      None => {
        let id = self.store.allocate_placeholder::<T>()?;
        local.set_record_id(id);
        id
      }
    };
    self.store.upsert_one(&local)?;

    match push(record).await {
      Ok(confirmed) => {
        if let Err(err) = self.store.promote(local_id, &confirmed) {
          warn!(kind = T::kind(), error = %err, "failed to mirror confirmed record locally");
        }
        Ok(Synced::remote(confirmed))
      }
      Err(err) => {
        warn!(
          kind = T::kind(),
          id = local_id,
          error = %err,
          "remote create failed, record kept locally until the backend confirms it"
        );
        Ok(Synced::local_only(local))
      }
    }
  }

  /// Update a record, remote-authoritative.
  ///
  /// The remote call must succeed; any classified failure propagates
  /// unchanged and the store is left untouched. On success the local copy
  /// is replaced with the backend's.
  pub async fn update_through<T, F, Fut>(&self, push: F) -> Result<T, SyncError>
  where
    T: Record,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
  {
    let confirmed = push().await?;
    if let Err(err) = self.store.upsert_one(&confirmed) {
      warn!(kind = T::kind(), error = %err, "failed to mirror updated record locally");
    }
    Ok(confirmed)
  }

  /// Delete a record, remote-authoritative.
  ///
  /// Same contract as updates: failures propagate unchanged, and the local
  /// row is evicted only after the backend confirms the delete.
  pub async fn delete_through<T, F, Fut>(&self, id: i64, push: F) -> Result<(), SyncError>
  where
    T: Record,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), ApiError>>,
  {
    push().await?;
    if let Err(err) = self.store.evict::<T>(id) {
      warn!(kind = T::kind(), id, error = %err, "failed to evict deleted record locally");
    }
    Ok(())
  }
}

impl<S: RecordStore> Clone for SyncLayer<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
    }
  }
}
