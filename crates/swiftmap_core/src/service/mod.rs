//! Use-case services layered over the adapter.
//!
//! # Responsibility
//! - Offer scheme-bound entry points so callers do not repeat the scheme on
//!   every call.
//! - Keep callers decoupled from statement and driver details.

pub mod resource_service;
