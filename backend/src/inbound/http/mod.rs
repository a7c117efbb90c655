//! HTTP inbound adapters.

pub mod error;
pub mod health;
pub mod state;
pub mod trips;

pub use self::error::{ApiError, ApiResult};
