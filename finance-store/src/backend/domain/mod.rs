//! # Domain Layer
//!
//! The finance store and the workflows built on it. Storage details stay
//! behind the repository trait; this layer owns the rules.

pub mod error;
pub mod goal_service;
pub mod profile_service;
pub mod report_service;
pub mod session;
pub mod stats;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use goal_service::GoalService;
pub use profile_service::ProfileService;
pub use session::{bootstrap, SessionStatus};
pub use store::{FinanceStore, StoreState, SyncOutcome};
