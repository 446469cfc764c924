//! Application layer: Use cases and services.
//!
//! This module orchestrates the pure domain calculations with the threshold
//! service port.

mod bili;
mod eos;
mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use bili::{calculate_bili_local, BiliService, DEFAULT_REMOTE_TIMEOUT};
pub use eos::{calculate_eos, EosService};
pub use session::{BiliSession, GenerationCounter, RequestGeneration};
