//! Record models shared by the harvester, the caches and the API
//!
//! Field names serialize as camelCase to stay compatible with the STAPI
//! payloads the site was originally written against.

pub mod character;
pub mod filter;
pub mod page;
pub mod series;

pub use character::{CharacterRecord, SpeciesRef};
pub use filter::{CharacterFilter, SeriesFilter};
pub use page::{PageInfo, PageRequest, SortInfo};
pub use series::{CastMember, EpisodeRecord, SeasonRef, SeriesRecord};
