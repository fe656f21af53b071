//! # Storage Layer
//!
//! Persistence and plumbing behind the finance store:
//!
//! - [`traits`] - the repository, snapshot, change feed and session seams
//! - [`local`] - offline repository and demo session
//! - [`remote`] - hosted backend over its REST API
//! - [`snapshot`] - JSON file mirror of the working set
//! - [`change_feed`] - per-(table, user) change notifications

pub mod change_feed;
pub mod local;
pub mod remote;
pub mod sample_data;
pub mod snapshot;
pub mod traits;

#[cfg(test)]
pub mod test_utils;

pub use change_feed::BroadcastChangeFeed;
pub use local::{DemoSession, LocalRepository, DEMO_USER_EMAIL, DEMO_USER_ID};
pub use remote::{RemoteRepository, SupabaseAuth, SupabaseClient};
pub use snapshot::{JsonFileSnapshotStorage, StoreSnapshot};
pub use traits::*;
