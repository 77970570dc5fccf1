//! # Services
//!
//! Operations that span several repository calls.
//!
//! - [`checkout`] - the Checkout Orchestrator
//! - [`reports`] - report and dashboard assembly

pub mod checkout;
pub mod reports;
