//! # Repository Module
//!
//! Database repository implementations for the e-stamp order flow.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderService (estamp-api)                                             │
//! │       │                                                                 │
//! │       │  db.templates().lookup("Karnataka", "Rental Agreement")         │
//! │       ▼                                                                 │
//! │  TemplateRepository   lookup, list_active, insert, update              │
//! │  PromoCodeRepository  get_by_code, insert, deactivate, redeem          │
//! │  OrderRepository      insert, get_by_id, update (CAS), sweep           │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod order;
pub mod promo;
pub mod template;
