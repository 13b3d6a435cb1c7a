//! Run lifecycle domain
//!
//! A run is one asynchronous execution of the decision workflow. Its
//! persisted record moves queued → running → completed/failed and is the
//! only state shared between the background executor and polling callers.

pub mod entity;
pub mod error;
pub mod repository;

pub use entity::{MAX_ID_LENGTH, RunId, RunRecord, RunStatus, validate_run_id};
pub use error::RunError;
pub use repository::RunRepository;
