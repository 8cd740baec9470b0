//! M3U playlist editing core: parsing, classification, group management,
//! filtered views, stream probing and AI-assisted cleanup.

pub mod ai;
pub mod classifier;
pub mod collection;
pub mod config;
pub mod error;
pub mod m3u_parser;
pub mod models;
pub mod prober;
pub mod query;
pub mod sources;

pub use collection::Collection;
pub use error::{Error, Result};
pub use models::{Category, Entry, EntryId, SortOption, StreamStatus};
