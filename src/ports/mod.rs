//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (the remote threshold service).

mod threshold_service;

pub use threshold_service::{
    RiskParam, ThresholdQuery, ThresholdResponse, ThresholdService, ThresholdServiceError,
};
