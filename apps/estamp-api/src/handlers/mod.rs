//! HTTP handlers, one module per resource.

pub(crate) mod admin;
pub(crate) mod generation;
pub(crate) mod health;
pub(crate) mod orders;
pub(crate) mod payment;
pub(crate) mod promo;
pub(crate) mod templates;
