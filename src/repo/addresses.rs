//! Address repository. Addresses are created and read, never edited or
//! deleted through this client.

use crate::api::{ApiClient, Endpoint};
use crate::model::Address;
use crate::sync::{RecordStore, SyncError, SyncLayer, Synced};

pub struct AddressRepository<S: RecordStore> {
  remote: Endpoint<Address>,
  sync: SyncLayer<S>,
}

impl<S: RecordStore> AddressRepository<S> {
  pub fn new(client: ApiClient, sync: SyncLayer<S>) -> Self {
    Self {
      remote: Endpoint::new(client, "addresses"),
      sync,
    }
  }

  pub async fn list(&self) -> Synced<Vec<Address>> {
    self.sync.list_through(|| self.remote.list()).await
  }

  pub async fn get(&self, id: i64) -> Result<Option<Synced<Address>>, SyncError> {
    self.sync.get_through(id, || self.remote.fetch(id)).await
  }

  pub async fn create(&self, address: Address) -> Result<Synced<Address>, SyncError> {
    self
      .sync
      .create_through(address, |candidate| async move {
        self.remote.create(&candidate).await
      })
      .await
  }
}
