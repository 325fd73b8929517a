//! # estamp-db: Database Layer for E-Stamp Orders
//!
//! SQLite storage for templates, promo codes and orders, using sqlx for
//! async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        E-Stamp Data Flow                                │
//! │                                                                         │
//! │  HTTP handler (POST /orders/{id}/payment)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     estamp-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ TemplateRepo  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ PromoCodeRepo │    │ 001_init.sql │  │   │
//! │  │   │               │    │ OrderRepo     │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (estamp.db, or :memory: in tests)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use estamp_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./estamp.db")).await?;
//! let templates = db.templates().list_active().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::order::OrderRepository;
pub use repository::promo::PromoCodeRepository;
pub use repository::template::TemplateRepository;
