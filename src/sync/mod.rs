//! Synchronization core: the local record store and the policy layer that
//! reconciles it with the remote backend.

mod layer;
mod store;
mod traits;

pub use layer::{SyncError, SyncLayer};
pub use store::{RecordStore, SqliteStore, StoreError};
pub use traits::{DataSource, Record, Synced};
