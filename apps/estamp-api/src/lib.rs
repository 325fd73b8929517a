//! # estamp-api: HTTP API for E-Stamp Orders
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐    ┌──────────┐
//! │   handlers   │───►│ OrderService │───►│  estamp-db   │───►│  SQLite  │
//! │   (salvo)    │    │              │    └──────────────┘    └──────────┘
//! └──────────────┘    │              │───► estamp-core (pricing, promo,
//!                     │              │     state machine, signatures)
//!                     │              │───► PaymentGateway (Razorpay)
//!                     └──────────────┘───► Notifier
//! ```
//!
//! Every failure leaves the handlers as an [`error::ApiError`] with a stable
//! `code`; see [`error::ErrorCode`] for the status mapping.

pub mod config;
pub mod error;
pub mod gateway;
pub mod notifier;
pub mod router;
pub mod service;
pub mod shutdown;
pub mod state;

pub(crate) mod extensions;
pub(crate) mod handlers;

#[cfg(test)]
mod test_helpers;

pub use config::{AppConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use router::app_router;
pub use state::State;
