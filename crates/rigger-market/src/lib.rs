//! Rigger recipes for the perpetual-market protocol.
//!
//! `recipe` holds the three pipelines (base, per-market, wiring) and the
//! async runs that drive them through a [`rigger_core::Session`]. Contract
//! kinds and role ids live in `kinds` and `roles`; register a factory for
//! every entry of [`kinds::ALL`] before building the session.

mod error;
mod market;

pub mod kinds;
pub mod recipe;
pub mod roles;

pub use error::MarketError;
pub use market::{MarketParams, MarketSpec};
pub use recipe::{deploy_all, deploy_base, deploy_market, wire_market};
