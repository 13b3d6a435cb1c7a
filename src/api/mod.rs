//! HTTP API layer
//!
//! A thin translation between HTTP and the run manager; all decisions about
//! workflow behavior and persistence live below this layer.

pub mod decisions;
pub mod error;
pub mod health;
pub mod router;
pub mod state;

pub use error::{ApiError, ApiErrorResponse};
pub use router::create_router;
pub use state::AppState;
