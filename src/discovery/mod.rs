//! # Discovery
//!
//! The fetching half of a crawl:
//!
//! 1. [`artists::ArtistCache`] - which artists does the user follow right now
//! 2. [`albums::discover_releases`] - what did those artists publish
//! 3. [`tracks::resolve_tracks`] - which tracks belong to the releases that
//!    survived the filters
//!
//! All remote calls go through the [`crate::spotify::Gateway`]; the per-artist
//! and per-album fan-out runs on the [`crate::executor::FetchExecutor`].

pub mod albums;
pub mod artists;
pub mod tracks;

pub use albums::discover_releases;
pub use artists::ArtistCache;
pub use tracks::resolve_tracks;
