//! Everything that modifies the managed playlists.
//!
//! - [`writer`] - capacity-aware insertion with circular eviction
//! - [`notifier`] - the "new content" marker in title and description
//! - [`purge`] - removal of items older than a configured age

pub mod notifier;
pub mod purge;
pub mod writer;

pub use notifier::Notifier;
pub use purge::purge_expired;
pub use writer::{PLAYLIST_CAPACITY, PlaylistWriter, WriteOutcome};
