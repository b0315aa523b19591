//! Raid repository.
//!
//! Raids are the high-traffic entity, so their listing consults the
//! availability monitor first: when the backend is known to be down the
//! remote attempt is skipped outright and the local store answers. Every
//! other operation relies on the ordinary failure-driven fallback.

use std::sync::Arc;

use crate::api::{ApiClient, Endpoint};
use crate::model::Raid;
use crate::monitor::AvailabilityMonitor;
use crate::sync::{DataSource, RecordStore, SyncError, SyncLayer, Synced};

pub struct RaidRepository<S: RecordStore> {
  remote: Endpoint<Raid>,
  sync: SyncLayer<S>,
  monitor: Arc<AvailabilityMonitor>,
}

impl<S: RecordStore> RaidRepository<S> {
  pub fn new(client: ApiClient, sync: SyncLayer<S>, monitor: Arc<AvailabilityMonitor>) -> Self {
    Self {
      remote: Endpoint::new(client, "raids"),
      sync,
      monitor,
    }
  }

  /// All raids, remote-first with local fallback.
  pub async fn list(&self) -> Synced<Vec<Raid>> {
    if !self.monitor.check_availability().await {
      return self.sync.list_local();
    }

    let listing = self.sync.list_through(|| self.remote.list()).await;
    if listing.source == DataSource::LocalFallback {
      // The verdict said available but the listing still failed remotely;
      // don't trust it for the next call.
      self.monitor.reset_cache();
    }
    listing
  }

  /// One raid by id. A backend 404 is an authoritative absence.
  pub async fn get(&self, id: i64) -> Result<Option<Synced<Raid>>, SyncError> {
    self.sync.get_through(id, || self.remote.fetch(id)).await
  }

  /// Create a raid; kept locally when the backend cannot confirm it.
  pub async fn create(&self, raid: Raid) -> Result<Synced<Raid>, SyncError> {
    self
      .sync
      .create_through(raid, |candidate| async move {
        self.remote.create(&candidate).await
      })
      .await
  }

  /// Replace a raid with a full record, remote-authoritative.
  pub async fn update(&self, id: i64, raid: Raid) -> Result<Raid, SyncError> {
    self
      .sync
      .update_through(|| async move { self.remote.update(id, &raid).await })
      .await
  }

  /// Delete a raid, remote-authoritative.
  pub async fn delete(&self, id: i64) -> Result<(), SyncError> {
    self
      .sync
      .delete_through::<Raid, _, _>(id, || self.remote.delete(id))
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{ApiConfig, CacheConfig, Config};
  use crate::session::SessionStore;
  use crate::sync::SqliteStore;

  fn raid(id: i64, name: &str) -> Raid {
    Raid {
      id: Some(id),
      name: name.to_string(),
      description: None,
      start_date: "2026-06-12".to_string(),
      end_date: None,
      address_id: None,
      manager_id: None,
    }
  }

  fn repo(
    server: &mockito::ServerGuard,
  ) -> (RaidRepository<SqliteStore>, Arc<SqliteStore>, Arc<AvailabilityMonitor>) {
    let config = Config {
      api: ApiConfig {
        base_url: server.url(),
        timeout_secs: 5,
      },
      cache: CacheConfig::default(),
    };
    let session_path =
      std::env::temp_dir().join(format!("raidsync-test-{}-raids", std::process::id()));
    let _ = std::fs::remove_file(&session_path);

    let client = ApiClient::new(&config, SessionStore::at_path(session_path)).expect("client");
    let store = Arc::new(SqliteStore::in_memory().expect("store"));
    let sync = SyncLayer::new(Arc::clone(&store));
    let monitor = Arc::new(AvailabilityMonitor::new(client.http(), client.base_url()));

    (
      RaidRepository::new(client, sync, Arc::clone(&monitor)),
      store,
      monitor,
    )
  }

  #[tokio::test]
  async fn test_list_skips_remote_when_backend_is_down() {
    let mut server = mockito::Server::new_async().await;
    let health = server
      .mock("GET", "/health")
      .with_status(503)
      .expect(1)
      .create_async()
      .await;
    let listing = server.mock("GET", "/raids").expect(0).create_async().await;

    let (repo, store, _monitor) = repo(&server);
    store.replace_all(&[raid(1, "Raid des Volcans")]).unwrap();

    let raids = repo.list().await;

    assert_eq!(raids.source, DataSource::LocalFallback);
    assert_eq!(raids.data.len(), 1);
    health.assert_async().await;
    listing.assert_async().await;
  }

  #[tokio::test]
  async fn test_list_reads_through_when_backend_is_up() {
    let mut server = mockito::Server::new_async().await;
    let _health = server
      .mock("GET", "/health")
      .with_status(200)
      .create_async()
      .await;
    let _listing = server
      .mock("GET", "/raids")
      .with_status(200)
      .with_body(r#"[{"id": 1, "name": "Raid des Volcans", "start_date": "2026-06-12"}]"#)
      .create_async()
      .await;

    let (repo, store, _monitor) = repo(&server);
    let raids = repo.list().await;

    assert_eq!(raids.source, DataSource::Remote);
    assert_eq!(raids.data.len(), 1);

    let mirrored: Vec<Raid> = store.list_all().unwrap();
    assert_eq!(mirrored.len(), 1);
  }

  #[tokio::test]
  async fn test_failed_listing_despite_up_verdict_resets_the_monitor() {
    let mut server = mockito::Server::new_async().await;
    let health = server
      .mock("GET", "/health")
      .with_status(200)
      .expect(2)
      .create_async()
      .await;
    let _listing = server
      .mock("GET", "/raids")
      .with_status(500)
      .create_async()
      .await;

    let (repo, _store, monitor) = repo(&server);

    let raids = repo.list().await;
    assert_eq!(raids.source, DataSource::LocalFallback);

    // The fallback dropped the verdict, so this probes again.
    assert!(monitor.check_availability().await);
    health.assert_async().await;
  }

  #[tokio::test]
  async fn test_create_keeps_the_raid_locally_when_backend_fails() {
    let mut server = mockito::Server::new_async().await;
    let _create = server
      .mock("POST", "/raids")
      .with_status(500)
      .create_async()
      .await;

    let (repo, store, _monitor) = repo(&server);
    let mut candidate = raid(0, "Raid des Volcans");
    candidate.id = None;

    let created = repo.create(candidate).await.unwrap();

    assert_eq!(created.source, DataSource::LocalOnly);
    assert_eq!(created.data.id, Some(-1));

    let kept: Option<Raid> = store.get_by_id(-1).unwrap();
    assert!(kept.is_some());
  }
}
