//! Service shell around `trendwatch-core`: HTTP reader, daemon wiring and
//! settings administration.

pub mod admin;
pub mod daemon;
pub mod http;
pub mod tracing_setup;

pub use daemon::{run_daemon, PostInput};
pub use http::{router, HttpState};
