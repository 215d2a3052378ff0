//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the orchestration core and an
//! external system (time, HTTP). Implementations live in `src/adapters/`.

pub mod clock;
pub mod http;

pub use clock::{Clock, SleepFuture};
pub use http::{HttpClient, HttpError, HttpFuture, HttpMethod, HttpRequest, HttpResponse};
