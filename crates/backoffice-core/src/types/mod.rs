//! Core request, response and identity types.
//!
//! These types enforce invariants at construction time, so the pipeline can
//! treat them as already valid.

mod api_url;
mod request;
mod user;

pub use api_url::ApiUrl;
pub use request::{ApiRequest, ApiResponse, Method};
pub use user::{Pagination, UserIdentity};
