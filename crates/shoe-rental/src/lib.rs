//! Discount decisions for the bowling shoe rental service.
//!
//! The hosted text model proposes a discount; the rule catalog answers whenever the model
//! cannot, and doubles as the reference the model is audited against.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
