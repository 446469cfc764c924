//! Adapters layer: Concrete implementations of ports.
//!
//! - `http`: reqwest client for the remote bilirubin threshold service
//! - `sanitize`: PHI redaction for log output

pub mod http;
pub mod sanitize;

pub use http::HttpThresholdService;
