//! Orchard Core - Shared types library.
//!
//! This crate provides common types used across all Orchard components:
//! - `client` - Client core (cart, basket, resilient API access)
//! - `cli` - Command-line frontend for the client core
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and product data

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
