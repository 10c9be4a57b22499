//! Event data model and the event-store boundary.
//!
//! Reconstruction is an upstream oracle: the analysis only ever sees its
//! output through [`EventStore`]. [`MemoryEventStore`] replays events from a
//! JSON Lines dump, one [`EventRecord`] per line.

mod memory;
mod types;

pub use memory::MemoryEventStore;
pub use types::{
    ChargedCandidate, Cluster, EventHeader, EventRecord, McParticle, PrimaryVertex, RawTrack,
    State, StateCovariance, StateLocation, TrackType, TruthLink,
};

use crate::error::StoreError;

/// Sequential access to reconstructed events.
///
/// Accessors describe the current event; before the first successful
/// [`advance`](EventStore::advance) and after the end of the stream they
/// return empty data.
pub trait EventStore {
    /// Loads the next event. `Ok(None)` signals the end of the stream.
    fn advance(&mut self) -> Result<Option<EventHeader>, StoreError>;

    fn header(&self) -> Option<EventHeader>;

    fn clusters(&self) -> &[Cluster];

    fn tracks(&self) -> &[RawTrack];

    /// Keys of the truth particles linked to a track.
    fn truth_links(&self, track_key: u32) -> &[u32];

    fn mc_particle(&self, key: u32) -> Option<&McParticle>;

    fn primary_vertices(&self) -> &[PrimaryVertex];

    /// Pre-selected pion candidates.
    fn pions(&self) -> &[ChargedCandidate];

    /// Pre-selected kaon candidates.
    fn kaons(&self) -> &[ChargedCandidate];
}
