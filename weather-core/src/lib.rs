//! Core library for the `weather-api` service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Weather provider strategies tried in a fixed fallback order
//! - An owned cache and the aggregator that degrades from fresh cache to
//!   providers to stale cache
//! - The HTTP router exposing the aggregated result
//!
//! It is used by `weather-api`, but can also be mounted into other services.

pub mod aggregator;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod provider;

pub use aggregator::WeatherAggregator;
pub use cache::{CacheEntry, CacheSlot, WeatherCache};
pub use config::{Config, LocationConfig, ProviderConfig};
pub use error::WeatherError;
pub use model::{ErrorPayload, WeatherPayload, WeatherSnapshot};
pub use provider::{ProviderId, WeatherProvider};
