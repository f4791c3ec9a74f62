mod artist;
mod auth;
mod playlist;
mod release;
mod state;
mod writer;

pub use artist::ArtistStore;
pub use auth::TokenManager;
pub use playlist::{PlaylistState, PlaylistStore, targets_from};
pub use release::ReleaseStore;
pub use state::StateFile;
pub use writer::{CacheWrite, CacheWriter};
