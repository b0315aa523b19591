//! User repository. Accounts are provisioned by the backend; this client
//! only reads them and edits profile fields.

use serde_json::{Map, Value};

use crate::api::{ApiClient, Endpoint};
use crate::model::User;
use crate::sync::{RecordStore, SyncError, SyncLayer, Synced};

pub struct UserRepository<S: RecordStore> {
  remote: Endpoint<User>,
  sync: SyncLayer<S>,
}

impl<S: RecordStore> UserRepository<S> {
  pub fn new(client: ApiClient, sync: SyncLayer<S>) -> Self {
    Self {
      remote: Endpoint::new(client, "users"),
      sync,
    }
  }

  pub async fn list(&self) -> Synced<Vec<User>> {
    self.sync.list_through(|| self.remote.list()).await
  }

  pub async fn get(&self, id: i64) -> Result<Option<Synced<User>>, SyncError> {
    self.sync.get_through(id, || self.remote.fetch(id)).await
  }

  /// Update selected profile fields, remote-authoritative.
  pub async fn update_fields(&self, id: i64, fields: Map<String, Value>) -> Result<User, SyncError> {
    self
      .sync
      .update_through(|| async move { self.remote.update_fields(id, &fields).await })
      .await
  }
}
