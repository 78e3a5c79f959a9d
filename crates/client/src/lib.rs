//! Orchard Client - Client core for the Orchard storefront.
//!
//! This crate implements the state and network layer the storefront UI sits
//! on:
//!
//! - [`api`] - HTTP client with a store-through response cache and
//!   fallback-on-failure offline behavior
//! - [`cart`] - Cart store with guest (device-local) and authenticated
//!   (server-synced) modes
//! - [`basket`] - Category-scoped local basket with a domain guard on adds
//! - [`session`] - Bearer credential handling and signed-out notification
//! - [`storage`] - Persistent key-value storage (JSON values by string key)
//! - [`history`] - Best-effort persisted search history
//! - [`state`] - Wiring: one [`state::ClientState`] constructed at startup
//!   and passed to whatever needs it
//!
//! # Architecture
//!
//! All network traffic flows through [`api::ApiClient`]. Successful GET
//! responses are written through to the response cache; when a later
//! identical request fails transiently, the cached payload is served instead
//! of an error. The cart store sits above the client: guest mutations go
//! straight to device storage, authenticated mutations go to the server and
//! then re-fetch the canonical cart.
//!
//! # Example
//!
//! ```rust,ignore
//! use orchard_client::config::ClientConfig;
//! use orchard_client::state::ClientState;
//!
//! let config = ClientConfig::from_env()?;
//! let state = ClientState::new(config)?;
//!
//! let products = state.api().get("products", &[("limit", "6")]).await?;
//! state.cart().add(&snapshot, 1).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod basket;
pub mod cart;
pub mod config;
pub mod diagnostics;
pub mod history;
pub mod session;
pub mod state;
pub mod storage;
pub mod subscription;

pub use api::{ApiClient, ApiError};
pub use basket::{BasketError, BasketStore};
pub use cart::{CartError, CartStore};
pub use config::{ClientConfig, ConfigError};
pub use diagnostics::DiagnosticSink;
pub use session::Session;
pub use state::ClientState;
pub use storage::{Storage, StorageError};
pub use subscription::SubscriptionId;
