//! End-to-end scenarios against stub and in-memory providers.

pub mod fixtures;

mod caching;
mod configuration;
mod resilience;
mod subscriptions;
mod writes;
