//! Club repository.

use serde_json::{Map, Value};

use crate::api::{ApiClient, Endpoint};
use crate::model::Club;
use crate::sync::{RecordStore, SyncError, SyncLayer, Synced};

pub struct ClubRepository<S: RecordStore> {
  remote: Endpoint<Club>,
  sync: SyncLayer<S>,
}

impl<S: RecordStore> ClubRepository<S> {
  pub fn new(client: ApiClient, sync: SyncLayer<S>) -> Self {
    Self {
      remote: Endpoint::new(client, "clubs"),
      sync,
    }
  }

  pub async fn list(&self) -> Synced<Vec<Club>> {
    self.sync.list_through(|| self.remote.list()).await
  }

  pub async fn get(&self, id: i64) -> Result<Option<Synced<Club>>, SyncError> {
    self.sync.get_through(id, || self.remote.fetch(id)).await
  }

  pub async fn create(&self, club: Club) -> Result<Synced<Club>, SyncError> {
    self
      .sync
      .create_through(club, |candidate| async move {
        self.remote.create(&candidate).await
      })
      .await
  }

  /// Update selected fields of a club, remote-authoritative.
  pub async fn update_fields(&self, id: i64, fields: Map<String, Value>) -> Result<Club, SyncError> {
    self
      .sync
      .update_through(|| async move { self.remote.update_fields(id, &fields).await })
      .await
  }

  /// Delete a club, remote-authoritative.
  pub async fn delete(&self, id: i64) -> Result<(), SyncError> {
    self
      .sync
      .delete_through::<Club, _, _>(id, || self.remote.delete(id))
      .await
  }
}
