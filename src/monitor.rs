//! Backend availability probing with a TTL-cached verdict.

use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration as StdDuration;
use tracing::debug;

/// How long a verdict is trusted before the next call probes again.
const DEFAULT_VERDICT_TTL_MINUTES: i64 = 5;

/// Probes are cheap liveness checks and get a short timeout of their own,
/// independent of the CRUD timeout.
const PROBE_TIMEOUT: StdDuration = StdDuration::from_secs(3);

/// Outcome of the last health probe.
#[derive(Debug, Clone, Copy)]
struct Verdict {
  available: bool,
  checked_at: DateTime<Utc>,
}

/// Probes whether the remote backend is reachable and caches the verdict.
///
/// The monitor is advisory: repositories may consult it to skip a doomed
/// remote call, but the failure-driven fallback works without it. Both
/// verdicts are cached, so a down backend is not hammered with probes and
/// an up backend is not re-probed on every read.
pub struct AvailabilityMonitor {
  http: reqwest::Client,
  probe_url: String,
  ttl: Duration,
  verdict: Mutex<Option<Verdict>>,
}

impl AvailabilityMonitor {
  /// Monitor for the backend at `base_url`, probing `GET {base_url}/health`.
  pub fn new(http: reqwest::Client, base_url: &str) -> Self {
    Self {
      http,
      probe_url: format!("{}/health", base_url.trim_end_matches('/')),
      ttl: Duration::minutes(DEFAULT_VERDICT_TTL_MINUTES),
      verdict: Mutex::new(None),
    }
  }

  /// Override how long a verdict is trusted.
  #[allow(dead_code)]
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  /// Whether the backend is reachable, probing only when the cached verdict
  /// has expired. Any probe failure is an "unavailable" verdict, cached
  /// like any other.
  pub async fn check_availability(&self) -> bool {
    if let Some(available) = self.cached_verdict() {
      return available;
    }

    let available = self.probe().await;
    *self.lock() = Some(Verdict {
      available,
      checked_at: Utc::now(),
    });

    available
  }

  /// Drop the cached verdict so the next call probes again. For callers
  /// that have reason to distrust the current verdict.
  pub fn reset_cache(&self) {
    *self.lock() = None;
  }

  fn cached_verdict(&self) -> Option<bool> {
    let verdict = (*self.lock())?;
    if Utc::now() - verdict.checked_at < self.ttl {
      Some(verdict.available)
    } else {
      None
    }
  }

  /// One GET against the health endpoint; only a plain 200 counts as up.
  async fn probe(&self) -> bool {
    let response = self
      .http
      .get(&self.probe_url)
      .timeout(PROBE_TIMEOUT)
      .send()
      .await;

    match response {
      Ok(response) => {
        let available = response.status() == StatusCode::OK;
        debug!(status = %response.status(), available, "health probe answered");
        available
      }
      Err(err) => {
        debug!(error = %err, "health probe failed");
        false
      }
    }
  }

  fn lock(&self) -> MutexGuard<'_, Option<Verdict>> {
    // A poisoned verdict cache is still usable; the monitor never errors.
    match self.verdict.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn monitor(base_url: &str) -> AvailabilityMonitor {
    AvailabilityMonitor::new(reqwest::Client::new(), base_url)
  }

  #[tokio::test]
  async fn test_available_verdict_is_cached() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/health")
      .with_status(200)
      .expect(1)
      .create_async()
      .await;

    let monitor = monitor(&server.url());
    assert!(monitor.check_availability().await);
    assert!(monitor.check_availability().await);

    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_unavailable_verdict_is_cached_too() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/health")
      .with_status(500)
      .expect(1)
      .create_async()
      .await;

    let monitor = monitor(&server.url());
    assert!(!monitor.check_availability().await);
    assert!(!monitor.check_availability().await);

    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_expired_verdict_probes_again() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/health")
      .with_status(200)
      .expect(2)
      .create_async()
      .await;

    let monitor = monitor(&server.url()).with_ttl(Duration::zero());
    assert!(monitor.check_availability().await);
    assert!(monitor.check_availability().await);

    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_reset_cache_forces_a_probe() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/health")
      .with_status(200)
      .expect(2)
      .create_async()
      .await;

    let monitor = monitor(&server.url());
    assert!(monitor.check_availability().await);
    monitor.reset_cache();
    assert!(monitor.check_availability().await);

    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_unreachable_backend_is_unavailable() {
    let monitor = monitor("http://127.0.0.1:1");
    assert!(!monitor.check_availability().await);
  }
}
