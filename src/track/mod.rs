//! Track views: reference state, classified hits and truth association.

mod cache;
pub mod hits;
mod view;

pub use cache::ClusterCache;
pub use hits::{FtHit, Hit, UtHit, VpChannelId, VpHit};
pub use view::{reference_location, TrackView};
