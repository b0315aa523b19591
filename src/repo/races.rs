//! Race repository.
//!
//! The backend only exposes the full race collection, so narrowing to one
//! raid happens client-side after the sync.

use serde_json::{Map, Value};

use crate::api::{ApiClient, Endpoint};
use crate::model::Race;
use crate::sync::{RecordStore, SyncError, SyncLayer, Synced};

pub struct RaceRepository<S: RecordStore> {
  remote: Endpoint<Race>,
  sync: SyncLayer<S>,
}

impl<S: RecordStore> RaceRepository<S> {
  pub fn new(client: ApiClient, sync: SyncLayer<S>) -> Self {
    Self {
      remote: Endpoint::new(client, "races"),
      sync,
    }
  }

  /// All races, remote-first with local fallback.
  pub async fn list(&self) -> Synced<Vec<Race>> {
    self.sync.list_through(|| self.remote.list()).await
  }

  /// The races of one raid, filtered from the synced listing.
  pub async fn list_for_raid(&self, raid_id: i64) -> Synced<Vec<Race>> {
    let mut listing = self.list().await;
    listing.data.retain(|race| race.raid_id == raid_id);
    listing
  }

  /// One race by id. A backend 404 is an authoritative absence.
  pub async fn get(&self, id: i64) -> Result<Option<Synced<Race>>, SyncError> {
    self.sync.get_through(id, || self.remote.fetch(id)).await
  }

  /// Create a race; kept locally when the backend cannot confirm it.
  pub async fn create(&self, race: Race) -> Result<Synced<Race>, SyncError> {
    self
      .sync
      .create_through(race, |candidate| async move {
        self.remote.create(&candidate).await
      })
      .await
  }

  /// Update selected fields of a race, remote-authoritative.
  pub async fn update_fields(&self, id: i64, fields: Map<String, Value>) -> Result<Race, SyncError> {
    self
      .sync
      .update_through(|| async move { self.remote.update_fields(id, &fields).await })
      .await
  }

  /// Delete a race, remote-authoritative.
  pub async fn delete(&self, id: i64) -> Result<(), SyncError> {
    self
      .sync
      .delete_through::<Race, _, _>(id, || self.remote.delete(id))
      .await
  }
}
