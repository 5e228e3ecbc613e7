//! ARMETA kernel.
//!
//! Review and forum REST backend built around a list query engine: one
//! parameterised listing path that filters, aggregates, orders, paginates
//! and redacts items for a given viewer.

pub mod config;
pub mod db;
pub mod error;
pub mod listing;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
