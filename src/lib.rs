//! Storefront Core Library
//!
//! This library provides the core of a watch, accessory and bag storefront:
//! a persisted cart with derived totals, a debounced filter-selection
//! pipeline, a short-lived response cache and the HTTP surface over them.

// Domain modules
pub mod cart;
pub mod catalog;
pub mod filters;

// Infrastructure
pub mod cache;
pub mod config;
pub mod error;
pub mod router;
pub mod state;
pub mod telemetry;
