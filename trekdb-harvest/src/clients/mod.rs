//! Upstream HTTP clients

pub mod stapi_client;
pub mod wiki_client;

pub use stapi_client::StapiClient;
pub use wiki_client::{WikiClient, WikiContent, WikiLookup};
