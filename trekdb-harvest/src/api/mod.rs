//! HTTP API handlers for trekdb-harvest
//!
//! Read-only views over the harvested caches, plus on-demand enrichment
//! and the image proxy.

pub mod characters;
pub mod health;
pub mod image_proxy;
pub mod params;
pub mod series;

pub use characters::character_routes;
pub use health::health_routes;
pub use image_proxy::image_proxy_routes;
pub use series::series_routes;
