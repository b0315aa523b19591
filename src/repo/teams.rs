//! Team repository.

use serde_json::{Map, Value};

use crate::api::{ApiClient, Endpoint};
use crate::model::Team;
use crate::sync::{RecordStore, SyncError, SyncLayer, Synced};

pub struct TeamRepository<S: RecordStore> {
  remote: Endpoint<Team>,
  sync: SyncLayer<S>,
}

impl<S: RecordStore> TeamRepository<S> {
  pub fn new(client: ApiClient, sync: SyncLayer<S>) -> Self {
    Self {
      remote: Endpoint::new(client, "teams"),
      sync,
    }
  }

  pub async fn list(&self) -> Synced<Vec<Team>> {
    self.sync.list_through(|| self.remote.list()).await
  }

  pub async fn get(&self, id: i64) -> Result<Option<Synced<Team>>, SyncError> {
    self.sync.get_through(id, || self.remote.fetch(id)).await
  }

  pub async fn create(&self, team: Team) -> Result<Synced<Team>, SyncError> {
    self
      .sync
      .create_through(team, |candidate| async move {
        self.remote.create(&candidate).await
      })
      .await
  }

  pub async fn update_fields(&self, id: i64, fields: Map<String, Value>) -> Result<Team, SyncError> {
    self
      .sync
      .update_through(|| async move { self.remote.update_fields(id, &fields).await })
      .await
  }

  pub async fn delete(&self, id: i64) -> Result<(), SyncError> {
    self
      .sync
      .delete_through::<Team, _, _>(id, || self.remote.delete(id))
      .await
  }
}
